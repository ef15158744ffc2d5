// media-ingestion/src/targets.rs
// ============================================================================
// Module: Target Resolution
// Description: Builds the deduplicated set of query targets for one run.
// Purpose: Implement the four-step fallback chain from §4.3.
// Dependencies: media-core
// ============================================================================

use media_core::StoreError;
use media_core::interfaces::Store;

use crate::dispatch::IngestionDispatch;

/// One target the pipeline will fetch against.
#[derive(Debug, Clone)]
pub enum IngestionTarget {
    /// A saved tracked query.
    Tracked(media_core::core::query::TrackedQuery),
    /// A manual, unsaved term promoted to a target; persisted lazily on first match.
    AdHoc {
        /// Free-string term name.
        name: String,
        /// Language the term applies to.
        language: String,
    },
}

impl IngestionTarget {
    /// The dedupe key from §4.3: `id` when the target is already tracked,
    /// otherwise `lower(name)::lower(language)`.
    #[must_use]
    pub fn dedupe_key(&self) -> String {
        match self {
            Self::Tracked(query) => query.id.as_str().to_string(),
            Self::AdHoc { name, language } => {
                format!("{}::{}", name.to_lowercase(), language.to_lowercase())
            }
        }
    }

    /// The display name used in logs and raw-snapshot keys.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tracked(query) => &query.name,
            Self::AdHoc { name, .. } => name,
        }
    }

    /// The language this target should be fetched in.
    #[must_use]
    pub fn language(&self) -> &str {
        match self {
            Self::Tracked(query) => &query.language,
            Self::AdHoc { language, .. } => language,
        }
    }
}

/// Resolves the deduplicated target list for one dispatch, per the four-step
/// fallback chain: manual terms, then `termIds`, then (if still empty) active
/// tracked queries, then (if still empty) the configured env default.
///
/// # Errors
/// Propagates [`StoreError`] from resolving `termIds` or listing active queries.
pub async fn resolve_targets(
    store: &dyn Store,
    dispatch: &IngestionDispatch,
    default_language: &str,
    env_default_terms: &[String],
) -> Result<Vec<IngestionTarget>, StoreError> {
    let language = dispatch.language.as_deref().unwrap_or(default_language);
    let mut targets = Vec::new();

    for term in &dispatch.terms {
        targets.push(IngestionTarget::AdHoc { name: term.clone(), language: language.to_string() });
    }

    for term_id in &dispatch.term_ids {
        let query = store.get_tracked_query(term_id).await?;
        targets.push(IngestionTarget::Tracked(query));
    }

    if targets.is_empty() {
        let active = store.list_active_tracked_queries(50).await?;
        targets.extend(active.into_iter().map(IngestionTarget::Tracked));
    }

    if targets.is_empty() {
        targets.extend(env_default_terms.iter().map(|term| IngestionTarget::AdHoc {
            name: term.clone(),
            language: language.to_string(),
        }));
    }

    let mut seen = std::collections::HashSet::new();
    targets.retain(|target| seen.insert(target.dedupe_key()));
    Ok(targets)
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::IngestionTarget;

    #[test]
    fn tracked_dedupe_key_uses_id() {
        let query = media_core::core::query::TrackedQuery {
            id: "q1".into(),
            name: "Claro".to_string(),
            language: "es".to_string(),
            scope: media_core::core::incident::Scope::Claro,
            is_active: true,
            max_articles_per_run: 10,
            definition: media_core::core::query::QueryDefinition { include: vec![], any: vec![], exclude: vec![] },
            execution: media_core::core::query::ExecutionConfig {
                providers_allow: vec![],
                providers_deny: vec![],
                domains_allow: vec![],
                domains_deny: vec![],
                countries_allow: vec![],
                countries_deny: vec![],
            },
            compiled_provider_query: String::new(),
            current_revision: 0,
            updated_at: time::OffsetDateTime::from_unix_timestamp(0).unwrap(),
        };
        assert_eq!(IngestionTarget::Tracked(query).dedupe_key(), "q1");
    }

    #[test]
    fn adhoc_dedupe_key_is_name_and_language() {
        let target = IngestionTarget::AdHoc { name: "Claro Outage".to_string(), language: "ES".to_string() };
        assert_eq!(target.dedupe_key(), "claro outage::es");
    }
}
