// media-core/src/core/report.rs
// ============================================================================
// Module: Report Domain Types
// Description: Templates, schedules, report runs, and export jobs.
// Purpose: Persistence-shape types for the Report Worker.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::ExportJobId;
use crate::core::identifiers::ReportRunId;
use crate::core::identifiers::ReportScheduleId;
use crate::core::identifiers::ReportTemplateId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;

/// Confidence threshold used when a template's own threshold is unset (`<= 0`).
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;

/// Version tag of the deterministic confidence formula.
pub const CONFIDENCE_FORMULA_VERSION: &str = "report-v1-deterministic";

/// A named report definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTemplate {
    /// Stable identifier.
    pub id: ReportTemplateId,
    /// Display name.
    pub name: String,
    /// Section identifiers to render, in order.
    pub sections: Vec<String>,
    /// Content filters applied when aggregating.
    pub filters: Value,
    /// Threshold in `(0,1]`; `<= 0` means "use the environment default".
    pub confidence_threshold: f64,
    /// Whether the template is eligible for scheduling.
    pub is_active: bool,
}

/// How often a [`ReportSchedule`] fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportScheduleFrequency {
    /// Fires once a day.
    Daily,
    /// Fires once a week, on `day_of_week`.
    Weekly,
}

/// A schedule that materializes a template on a cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSchedule {
    /// Stable identifier.
    pub id: ReportScheduleId,
    /// Template this schedule materializes.
    pub template_id: ReportTemplateId,
    /// Cadence.
    pub frequency: ReportScheduleFrequency,
    /// Required when `frequency == Weekly`; 0 (Sunday) through 6.
    pub day_of_week: Option<u8>,
    /// Local fire time, `HH:mm`.
    pub time_local: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Unique, lower-cased recipient emails, at most 50.
    pub recipients: Vec<String>,
    /// Next scheduled fire time in UTC.
    pub next_run_at: OffsetDateTime,
    /// Last fire time, if any.
    pub last_run_at: Option<OffsetDateTime>,
    /// Whether the schedule is active.
    pub enabled: bool,
}

/// Lifecycle status of a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportRunStatus {
    /// Dispatched, not yet claimed.
    Queued,
    /// Claimed and in flight.
    Running,
    /// Finished with confidence at or above threshold.
    Completed,
    /// Finished with an unhandled error.
    Failed,
    /// Finished below confidence threshold; held for analyst review.
    PendingReview,
}

/// A materialization of a template over a 7-day window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRun {
    /// Stable identifier.
    pub id: ReportRunId,
    /// Template this run materializes.
    pub template_id: ReportTemplateId,
    /// Schedule that enqueued this run, if any.
    pub schedule_id: Option<ReportScheduleId>,
    /// Current status.
    pub status: ReportRunStatus,
    /// Computed confidence score, rounded to 3 decimals.
    pub confidence: Option<f64>,
    /// Narrative summary.
    pub summary: Option<String>,
    /// Deterministic recommendation lines, at most 6.
    pub recommendations: Vec<String>,
    /// Reason the run was held for review, if any.
    pub blocked_reason: Option<String>,
    /// Export job created for this run's filters, if any.
    pub export_job_id: Option<ExportJobId>,
    /// Idempotency key; schedule-driven runs use `schedule:{id}:{slotISO}`.
    pub idempotency_key: String,
    /// Correlates this run across logs and audit entries.
    pub request_id: Option<RequestId>,
    /// Actor who requested this run, if manual.
    pub requested_by_user_id: Option<UserId>,
    /// When the run was claimed.
    pub started_at: Option<OffsetDateTime>,
    /// When the run reached a terminal state.
    pub finished_at: Option<OffsetDateTime>,
}

/// Lifecycle status of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportJobStatus {
    /// Dispatched, not yet processed.
    Queued,
    /// Rendering in progress.
    Running,
    /// Rendered successfully.
    Completed,
    /// Rendering failed.
    Failed,
}

/// An async CSV render request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Stable identifier.
    pub id: ExportJobId,
    /// Content filters, restricted to the allowed field set.
    pub filters: Value,
    /// Current status.
    pub status: ExportJobStatus,
    /// Row count once rendered.
    pub row_count: Option<u64>,
    /// Object-store key of the rendered CSV, once available.
    pub s3_key: Option<String>,
    /// Actor who requested the export, if any.
    pub requested_by_user_id: Option<UserId>,
}

/// Fields an export job's filters may restrict on.
pub const EXPORT_FILTER_FIELDS: [&str; 9] =
    ["source_type", "state", "from", "to", "provider", "category", "sentimiento", "term_id", "q"];
