// media-providers/src/registry.rs
// ============================================================================
// Module: Provider Registry
// Description: Holds configured provider adapters and applies the §4.1
//              provider-selection rule (deny subtracts, then allow intersects).
// Purpose: Resolve, for one ingestion target, the ordered set of providers to
//          query.
// Dependencies: media-core
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use media_core::ProviderAdapter;

/// Per-query provider allow/deny configuration, already sanitized
/// (trimmed, lowercased, deduped, capped) by the caller.
#[derive(Debug, Clone, Default)]
pub struct ProviderAccessPolicy {
    /// When non-empty, only these provider ids are eligible.
    pub allow: Vec<String>,
    /// Provider ids excluded regardless of `allow`.
    pub deny: Vec<String>,
}

impl ProviderAccessPolicy {
    /// Applies the selection rule: start from `universe`, remove anything in
    /// `deny`, then intersect with `allow` when `allow` is non-empty.
    /// An empty result means the target is skipped by the caller, not an error.
    #[must_use]
    pub fn select<'a>(&self, universe: &'a [String]) -> Vec<&'a str> {
        universe
            .iter()
            .map(String::as_str)
            .filter(|id| !self.deny.iter().any(|d| d == id))
            .filter(|id| self.allow.is_empty() || self.allow.iter().any(|a| a == id))
            .collect()
    }
}

/// Registry of configured provider adapters, keyed by provider id.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { adapters: HashMap::new() }
    }

    /// Registers an adapter, keyed by its own `provider_id()`.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider_id().to_string(), adapter);
    }

    /// All registered provider ids, in arbitrary order.
    #[must_use]
    pub fn provider_ids(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    /// Resolves the ordered adapters to query for one target, applying
    /// `policy` against the registered universe.
    #[must_use]
    pub fn resolve(&self, policy: &ProviderAccessPolicy) -> Vec<Arc<dyn ProviderAdapter>> {
        let universe = self.provider_ids();
        policy
            .select(&universe)
            .into_iter()
            .filter_map(|id| self.adapters.get(id).cloned())
            .collect()
    }

    /// Looks up a single adapter by id.
    #[must_use]
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(provider_id).cloned()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::ProviderAccessPolicy;

    fn universe() -> Vec<String> {
        vec!["reuters".to_string(), "ap".to_string(), "local-news".to_string()]
    }

    #[test]
    fn empty_policy_selects_everything() {
        let policy = ProviderAccessPolicy::default();
        assert_eq!(policy.select(&universe()), vec!["reuters", "ap", "local-news"]);
    }

    #[test]
    fn deny_subtracts_from_universe() {
        let policy = ProviderAccessPolicy { allow: vec![], deny: vec!["ap".to_string()] };
        assert_eq!(policy.select(&universe()), vec!["reuters", "local-news"]);
    }

    #[test]
    fn allow_intersects_after_deny() {
        let policy = ProviderAccessPolicy {
            allow: vec!["reuters".to_string(), "ap".to_string()],
            deny: vec!["ap".to_string()],
        };
        assert_eq!(policy.select(&universe()), vec!["reuters"]);
    }

    #[test]
    fn allow_of_unknown_provider_yields_empty_selection() {
        let policy = ProviderAccessPolicy { allow: vec!["unknown".to_string()], deny: vec![] };
        assert!(policy.select(&universe()).is_empty());
    }
}
