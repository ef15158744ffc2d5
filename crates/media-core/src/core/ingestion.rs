// media-core/src/core/ingestion.rs
// ============================================================================
// Module: Ingestion Domain Types
// Description: Ingestion runs, per-provider run items, and content links.
// Purpose: Persistence-shape types for the Ingestion Worker.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::ContentItemId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TermId;

/// A run is considered stale (re-claimable) after this long in `Running`.
pub const STALE_RUN_AGE_MINUTES: i64 = 10;

/// News ingestion caps `maxArticlesPerTerm` at this value regardless of request.
pub const NEWS_MAX_ARTICLES_PER_TERM: u32 = 2;

/// Lifecycle status of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Dispatched, not yet claimed.
    Queued,
    /// Claimed and in flight.
    Running,
    /// Finished successfully (possibly with partial per-provider failures).
    Completed,
    /// Finished with an unhandled error.
    Failed,
}

/// What initiated a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Initiated by the scheduler.
    Scheduled,
    /// Initiated by an operator or API call.
    Manual,
}

/// One fan-out over a set of tracked queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRun {
    /// Stable identifier, supplied by the dispatcher (UUIDv4).
    pub id: RunId,
    /// Current status.
    pub status: RunStatus,
    /// What initiated this run.
    pub trigger_type: TriggerType,
    /// Language filter applied to target resolution, if any.
    pub language: Option<String>,
    /// Effective per-term article cap actually used (already clamped for news).
    pub effective_max_articles_per_term: u32,
    /// Correlates this run across logs and audit entries.
    pub request_id: Option<RequestId>,
    /// When the run was claimed.
    pub started_at: OffsetDateTime,
    /// When the run reached a terminal state.
    pub finished_at: Option<OffsetDateTime>,
    /// Aggregate counts and per-term summaries.
    pub metrics: Value,
    /// Truncated error message (at most 1000 chars), set only on failure.
    pub error_message: Option<String>,
}

impl IngestionRun {
    /// True once `started_at` is more than [`STALE_RUN_AGE_MINUTES`] in the past.
    #[must_use]
    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        now - self.started_at > time::Duration::minutes(STALE_RUN_AGE_MINUTES)
    }
}

/// Outcome of one provider within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunItemStatus {
    /// The provider fetch succeeded (possibly with zero results).
    Completed,
    /// The provider fetch failed; the run still completes.
    Failed,
}

/// Per-provider, per-run outcome. Replaced wholesale at the end of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRunItem {
    /// Owning run.
    pub run_id: RunId,
    /// Provider identifier.
    pub provider: String,
    /// Term the provider was queried for.
    pub term: String,
    /// Count of raw articles the provider returned.
    pub fetched_count: u32,
    /// Count of distinct canonical URLs newly linked to this run for this provider.
    pub persisted_count: u32,
    /// Wall-clock duration of the fetch.
    pub latency_ms: u64,
    /// Outcome of this provider's fetch.
    pub status: RunItemStatus,
    /// Error message, present only when `status == Failed`.
    pub error_message: Option<String>,
}

/// Links one newly-ingested content item to the run and provider that found it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRunContentLink {
    /// Owning run.
    pub run_id: RunId,
    /// Linked content item.
    pub content_item_id: ContentItemId,
    /// Canonical URL of the linked content item (denormalized for dedupe counting).
    pub canonical_url: String,
    /// Provider that returned this item.
    pub provider: String,
    /// Tracked query term the item was found under.
    pub term_id: TermId,
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::IngestionRun;
    use super::RunStatus;
    use super::TriggerType;
    use serde_json::json;
    use time::OffsetDateTime;

    #[test]
    fn stale_after_configured_window() {
        let started = OffsetDateTime::from_unix_timestamp(0).unwrap();
        let run = IngestionRun {
            id: "r1".into(),
            status: RunStatus::Running,
            trigger_type: TriggerType::Scheduled,
            language: None,
            effective_max_articles_per_term: 2,
            request_id: None,
            started_at: started,
            finished_at: None,
            metrics: json!({}),
            error_message: None,
        };
        let just_under = started + time::Duration::minutes(9);
        let just_over = started + time::Duration::minutes(11);
        assert!(!run.is_stale(just_under));
        assert!(run.is_stale(just_over));
    }
}
