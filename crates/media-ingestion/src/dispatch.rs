// media-ingestion/src/dispatch.rs
// ============================================================================
// Module: Dispatch Message
// Description: The ingestion queue message shape (§6) and its validation.
// Purpose: Decode and sanitize one dispatch before the worker acts on it.
// Dependencies: media-core, serde, uuid
// ============================================================================

use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::RunId;
use media_core::core::identifiers::TermId;
use media_core::core::ingestion::NEWS_MAX_ARTICLES_PER_TERM;
use media_core::core::ingestion::TriggerType;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// Queue message dispatched to the ingestion worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionDispatch {
    /// Run identifier; generated if absent.
    #[serde(default)]
    pub run_id: Option<RunId>,
    /// What initiated this run.
    pub trigger_type: TriggerType,
    /// Language filter applied to target resolution.
    #[serde(default)]
    pub language: Option<String>,
    /// Requested per-term article cap; clamped per §4.3.
    #[serde(default)]
    pub max_articles_per_term: Option<u32>,
    /// Tracked query ids to resolve as targets.
    #[serde(default)]
    pub term_ids: Vec<TermId>,
    /// Free-string manual terms, promoted to ad-hoc targets.
    #[serde(default)]
    pub terms: Vec<String>,
    /// Correlates this run across logs and audit entries.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// When the dispatch was requested; defaults to the worker's clock.
    #[serde(default)]
    pub requested_at: Option<OffsetDateTime>,
    /// Runs target resolution, provider fan-out, and filtering, but writes
    /// nothing: no content upsert, no run-item row, no raw snapshot. Lets an
    /// operator validate a new tracked query before activating it.
    #[serde(default)]
    pub dry_run: bool,
}

impl IngestionDispatch {
    /// Resolves (or mints) the run id for this dispatch.
    #[must_use]
    pub fn resolve_run_id(&self) -> RunId {
        self.run_id.clone().unwrap_or_else(|| RunId::from(uuid::Uuid::new_v4().to_string()))
    }

    /// Clamps the requested per-term cap: `NEWS_MAX_ARTICLES_PER_TERM` for news
    /// ingestion, regardless of what was requested.
    #[must_use]
    pub fn effective_max_articles_per_term(&self) -> u32 {
        NEWS_MAX_ARTICLES_PER_TERM
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::IngestionDispatch;
    use media_core::core::ingestion::TriggerType;

    fn base() -> IngestionDispatch {
        IngestionDispatch {
            run_id: None,
            trigger_type: TriggerType::Manual,
            language: None,
            max_articles_per_term: Some(500),
            term_ids: vec![],
            terms: vec![],
            request_id: None,
            requested_at: None,
            dry_run: false,
        }
    }

    #[test]
    fn news_cap_is_always_two_regardless_of_request() {
        assert_eq!(base().effective_max_articles_per_term(), 2);
    }

    #[test]
    fn run_id_is_minted_when_absent() {
        let dispatch = base();
        assert!(!dispatch.resolve_run_id().as_str().is_empty());
    }

    #[test]
    fn dry_run_defaults_to_false_when_absent_from_json() {
        let json = r#"{"trigger_type":"manual"}"#;
        let dispatch: IngestionDispatch = serde_json::from_str(json).unwrap();
        assert!(!dispatch.dry_run);
    }

    #[test]
    fn dry_run_round_trips_through_json() {
        let mut dispatch = base();
        dispatch.dry_run = true;
        let json = serde_json::to_string(&dispatch).unwrap();
        let back: IngestionDispatch = serde_json::from_str(&json).unwrap();
        assert!(back.dry_run);
    }
}
