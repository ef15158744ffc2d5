// media-core/src/core/query.rs
// ============================================================================
// Module: Tracked Query Domain Types
// Description: Saved searches, their definitions, and revision history.
// Purpose: Persistence-shape types for the Query Engine and Ingestion Worker.
// Dependencies: media-logic, serde, time
// ============================================================================

use media_logic::TermExpr;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::identifiers::TermId;
use crate::core::identifiers::UserId;
use crate::core::incident::Scope;

/// A boolean tree of terms plus the raw lists it was built from.
///
/// `include` terms are implicitly AND-ed, `any` terms are OR-ed (vacuously
/// true when empty), and `exclude` terms negate a match when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefinition {
    /// Required terms; all must match.
    pub include: Vec<media_logic::Term>,
    /// Optional alternatives; at least one must match unless this list is empty.
    pub any: Vec<media_logic::Term>,
    /// Negative terms; none may match.
    pub exclude: Vec<media_logic::Term>,
}

impl QueryDefinition {
    /// Builds the evaluable boolean tree from the include/any/exclude lists.
    #[must_use]
    pub fn compile_tree(&self) -> TermExpr {
        let mut parts = Vec::with_capacity(3);
        parts.push(TermExpr::And(
            self.include.iter().cloned().map(TermExpr::Leaf).collect(),
        ));
        parts.push(TermExpr::Or(self.any.iter().cloned().map(TermExpr::Leaf).collect()));
        if !self.exclude.is_empty() {
            parts.push(TermExpr::Not(Box::new(TermExpr::Or(
                self.exclude.iter().cloned().map(TermExpr::Leaf).collect(),
            ))));
        }
        TermExpr::And(parts)
    }

    /// Compiles the provider query string: include joined with spaces, any
    /// joined by ` OR ` in parentheses when non-empty, exclude as `-term`.
    #[must_use]
    pub fn compile_provider_query(&self) -> String {
        let mut segments: Vec<String> = Vec::new();
        for term in &self.include {
            segments.push(term.text().to_string());
        }
        if !self.any.is_empty() {
            let joined = self
                .any
                .iter()
                .map(media_logic::Term::text)
                .collect::<Vec<_>>()
                .join(" OR ");
            segments.push(format!("({joined})"));
        }
        for term in &self.exclude {
            segments.push(format!("-{}", term.text()));
        }
        segments.join(" ")
    }
}

/// Allow/deny sanitized execution configuration for a tracked query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Provider identifiers required to be used.
    pub providers_allow: Vec<String>,
    /// Provider identifiers forbidden from being used.
    pub providers_deny: Vec<String>,
    /// Canonical hosts required to be present.
    pub domains_allow: Vec<String>,
    /// Canonical hosts forbidden from being present.
    pub domains_deny: Vec<String>,
    /// ISO country codes required to be present.
    pub countries_allow: Vec<String>,
    /// ISO country codes forbidden from being present.
    pub countries_deny: Vec<String>,
}

/// Maximum entries retained per execution-config list after sanitization.
pub const MAX_EXECUTION_LIST_ENTRIES: usize = 50;

impl ExecutionConfig {
    /// Trims, lower-cases, dedupes (preserving first-seen order), and caps
    /// every list at [`MAX_EXECUTION_LIST_ENTRIES`] entries.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            providers_allow: sanitize_list(&self.providers_allow),
            providers_deny: sanitize_list(&self.providers_deny),
            domains_allow: sanitize_list(&self.domains_allow),
            domains_deny: sanitize_list(&self.domains_deny),
            countries_allow: sanitize_list(&self.countries_allow),
            countries_deny: sanitize_list(&self.countries_deny),
        }
    }
}

/// Trims, lowercases, dedupes, and truncates `entries` to `MAX_EXECUTION_LIST_ENTRIES`.
fn sanitize_list(entries: &[String]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for entry in entries {
        let normalized = entry.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            out.push(normalized);
        }
        if out.len() == MAX_EXECUTION_LIST_ENTRIES {
            break;
        }
    }
    out
}

/// A saved search tracked by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedQuery {
    /// Stable identifier.
    pub id: TermId,
    /// Unique together with `language`.
    pub name: String,
    /// ISO-639-1-ish language code, lower-case, at most 8 chars.
    pub language: String,
    /// Analytical scope this query belongs to.
    pub scope: Scope,
    /// Whether the query is active and eligible for ingestion.
    pub is_active: bool,
    /// Maximum articles fetched per ingestion run, 1..=500.
    pub max_articles_per_run: u32,
    /// The structured boolean definition.
    pub definition: QueryDefinition,
    /// Sanitized execution configuration.
    pub execution: ExecutionConfig,
    /// Precomputed provider query string and evaluator, cached from `definition`.
    pub compiled_provider_query: String,
    /// Monotonically incrementing revision counter.
    pub current_revision: u32,
    /// Last update timestamp.
    pub updated_at: OffsetDateTime,
}

/// A snapshot of a [`TrackedQuery`] taken immediately before an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedQueryRevision {
    /// Owning query.
    pub tracked_query_id: TermId,
    /// Revision number this snapshot represents (the prior `currentRevision`).
    pub revision: u32,
    /// Prior definition.
    pub definition: QueryDefinition,
    /// Prior execution configuration.
    pub execution: ExecutionConfig,
    /// Prior compiled provider query string.
    pub compiled_provider_query: String,
    /// Human-readable reason for the change.
    pub change_reason: String,
    /// Actor who made the change.
    pub actor: UserId,
    /// When the revision was recorded.
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::ExecutionConfig;
    use super::QueryDefinition;
    use media_logic::Term;

    #[test]
    fn compiles_provider_query_with_include_any_exclude() {
        let def = QueryDefinition {
            include: vec![Term::Literal { value: "claro".to_string() }],
            any: vec![
                Term::Literal { value: "outage".to_string() },
                Term::Literal { value: "fraude".to_string() },
            ],
            exclude: vec![Term::Literal { value: "drill".to_string() }],
        };
        assert_eq!(def.compile_provider_query(), "claro (outage OR fraude) -drill");
    }

    #[test]
    fn sanitized_dedupes_trims_lowercases_and_caps() {
        let config = ExecutionConfig {
            providers_allow: vec![" Reuters ".to_string(), "reuters".to_string(), "AP".to_string()],
            providers_deny: vec![],
            domains_allow: vec![],
            domains_deny: vec![],
            countries_allow: vec![],
            countries_deny: vec![],
        };
        let sanitized = config.sanitized();
        assert_eq!(sanitized.providers_allow, vec!["reuters".to_string(), "ap".to_string()]);
    }
}
