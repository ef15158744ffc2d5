// media-core/src/core/events.rs
// ============================================================================
// Module: Worker Event Payloads
// Description: Structured, serializable events emitted at the end of each
//              unit of work.
// Purpose: Observability without a hard logging-framework dependency; see
//          `EventSink` in `crate::interfaces`.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! No member of this workspace's dependency stack provides structured
//! logging; instead each worker builds one event struct per unit of work and
//! hands it to an injected [`crate::EventSink`]. This mirrors how audit
//! events are emitted: a plain, serializable payload routed through a small
//! trait so hosts can wire their own pipeline without a redesign.

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::identifiers::ContentItemId;
use crate::core::identifiers::IncidentEvaluationRunId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::ReportRunId;
use crate::core::identifiers::RunId;
use crate::core::incident::Scope;

/// Outcome classification shared by every worker event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// The unit of work completed successfully.
    Completed,
    /// The unit of work completed with partial failures (e.g. one provider down).
    Partial,
    /// The unit of work was skipped (already completed, deduped, overridden).
    Skipped,
    /// The unit of work failed.
    Failed,
}

/// Emitted at the end of an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRunEvent {
    /// Run this event describes.
    pub run_id: RunId,
    /// Correlation id, if supplied on dispatch.
    pub request_id: Option<RequestId>,
    /// Outcome of the run.
    pub outcome: EventOutcome,
    /// Normalized skip/error reason, if not `Completed`.
    pub reason: Option<&'static str>,
    /// Count of content items newly linked to this run.
    pub persisted_count: u32,
    /// When the event was recorded.
    pub at: OffsetDateTime,
}

/// Emitted at the end of one classification job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationJobEvent {
    /// Content item the job classified.
    pub content_item_id: ContentItemId,
    /// Correlation id, if supplied on dispatch.
    pub request_id: Option<RequestId>,
    /// Outcome of the job.
    pub outcome: EventOutcome,
    /// Normalized skip/error reason, if not `Completed`.
    pub reason: Option<String>,
    /// When the event was recorded.
    pub at: OffsetDateTime,
}

/// Emitted at the end of one incident evaluator pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentEvaluationEvent {
    /// Evaluator pass this event describes.
    pub evaluation_run_id: IncidentEvaluationRunId,
    /// Scope this portion of the pass covered.
    pub scope: Scope,
    /// Outcome of this scope's evaluation.
    pub outcome: EventOutcome,
    /// State-machine branch taken (`created`, `escalated`, `deduped`, `refreshed`, `skipped_sev4`).
    pub branch: &'static str,
    /// When the event was recorded.
    pub at: OffsetDateTime,
}

/// Emitted at the end of one report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRunEvent {
    /// Report run this event describes.
    pub report_run_id: ReportRunId,
    /// Correlation id, if supplied on dispatch.
    pub request_id: Option<RequestId>,
    /// Outcome of the run.
    pub outcome: EventOutcome,
    /// Computed confidence, if reached.
    pub confidence: Option<f64>,
    /// When the event was recorded.
    pub at: OffsetDateTime,
}

/// Emitted at the end of one social-channel ingestion pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialIngestionEvent {
    /// Channel identifier processed.
    pub channel: String,
    /// Outcome of the pass.
    pub outcome: EventOutcome,
    /// Count of newly processed objects.
    pub processed_objects: u32,
    /// Reconciliation status for this channel's window (`ok`, `warning`, `error`).
    pub reconciliation_status: &'static str,
    /// When the event was recorded.
    pub at: OffsetDateTime,
}
