// media-report/src/worker.rs
// ============================================================================
// Module: Report Worker
// Description: Orchestrates claim, aggregate, confidence scoring, threshold
//              branching, export fan-out, and verified-recipient email
//              (§4.6).
// Purpose: The single entry point the report queue consumer (media-cli)
//          invokes.
// Dependencies: media-core, serde_json, time
// ============================================================================

//! ## Overview
//! [`run_report`] is the only public entry point: it claims the run, loads
//! its template and schedule, aggregates KPIs/incidents/top content, scores
//! confidence, branches on the threshold, fans out an export job, writes the
//! terminal state, and emails the schedule's recipients when completed.
//! Everything it reports goes through [`media_core::EventSink`], matching
//! the rest of this workspace's workers.

use media_core::EventSink;
use media_core::StoreError;
use media_core::core::report::ReportRun;
use media_core::core::report::ReportRunStatus;
use media_core::core::report::EXPORT_FILTER_FIELDS;
use media_core::interfaces::Store;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;

use crate::confidence;
use crate::confidence::MonitorSignals;
use crate::dispatch::ReportDispatch;
use crate::email::EmailSender;
use crate::email::send_report_email;
use crate::recommendations;

/// Error truncation budget applied before writing a failure into `blockedReason`.
const MAX_ERROR_MESSAGE_LEN: usize = 1000;

/// Cap on top-content rows aggregated per run (§4.6 step 3).
const TOP_CONTENT_LIMIT: u32 = 12;

/// Errors that abort a dispatch before it reaches a terminal run state.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while processing an already-claimed run.
#[derive(Debug, Error)]
enum ProcessError {
    /// The run's template (or the run itself) disappeared after claim.
    #[error("report run not found after claim")]
    NotFoundAfterClaim,
    /// Any other store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProcessError {
    /// Maps a template/run lookup's `StoreError` to [`Self::NotFoundAfterClaim`]
    /// on a not-found, passing every other error through unchanged.
    fn from_template_load(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFoundAfterClaim,
            other => Self::Store(other),
        }
    }
}

/// Outcome of handling one dispatch.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    /// A retry or redelivery of an already-claimed run; nothing was done.
    SkippedDuplicate,
    /// The run reached a terminal state.
    Finished {
        /// Final status, as written to `ReportRun.status`.
        status: ReportRunStatus,
        /// Computed confidence, if the run reached scoring.
        confidence: Option<f64>,
    },
}

/// Handles one report dispatch end to end.
///
/// # Errors
/// Returns [`WorkerError`] only for failures before or after the run reaches
/// a terminal write; once claimed, failures during processing are captured
/// in the run's terminal `failed` state and this function still returns `Ok`.
pub async fn run_report(
    store: &dyn Store,
    email: &dyn EmailSender,
    events: &dyn EventSink,
    default_confidence_threshold: f64,
    email_sender: Option<&str>,
    dispatch: &ReportDispatch,
) -> Result<WorkerOutcome, WorkerError> {
    let now = OffsetDateTime::now_utc();
    let claim = store.claim_report_run(&dispatch.report_run_id, now).await?;

    let Some(run) = claim else {
        events.emit(&json!({"event": "report.skipped", "reason": "duplicate_delivery", "reportRunId": dispatch.report_run_id.as_str()}));
        return Ok(WorkerOutcome::SkippedDuplicate);
    };

    match process_claimed_run(store, email, events, default_confidence_threshold, email_sender, &run).await {
        Ok((status, confidence)) => Ok(WorkerOutcome::Finished { status, confidence }),
        Err(ProcessError::NotFoundAfterClaim) => {
            events.emit(&json!({"event": "report.failed", "runId": run.id.as_str(), "reason": "report_run_not_found_after_claim"}));
            store
                .finish_report_run(
                    &run.id,
                    ReportRunStatus::Failed,
                    None,
                    None,
                    Vec::new(),
                    Some("report_run_not_found_after_claim".to_string()),
                    None,
                    OffsetDateTime::now_utc(),
                )
                .await?;
            Ok(WorkerOutcome::Finished { status: ReportRunStatus::Failed, confidence: None })
        }
        Err(ProcessError::Store(err)) => {
            let message: String = err.to_string().chars().take(MAX_ERROR_MESSAGE_LEN).collect();
            events.emit(&json!({"event": "report.failed", "runId": run.id.as_str(), "error": message}));
            store
                .finish_report_run(
                    &run.id,
                    ReportRunStatus::Failed,
                    None,
                    None,
                    Vec::new(),
                    Some(message),
                    None,
                    OffsetDateTime::now_utc(),
                )
                .await?;
            Ok(WorkerOutcome::Finished { status: ReportRunStatus::Failed, confidence: None })
        }
    }
}

async fn process_claimed_run(
    store: &dyn Store,
    email: &dyn EmailSender,
    events: &dyn EventSink,
    default_confidence_threshold: f64,
    email_sender: Option<&str>,
    run: &ReportRun,
) -> Result<(ReportRunStatus, Option<f64>), ProcessError> {
    let (template, schedule) = store.load_report_template(&run.id).await.map_err(ProcessError::from_template_load)?;

    let kpis = store.aggregate_monitor_kpis(&template.filters).await?;
    let active_incidents = store.list_active_incidents().await?;
    let top_content = store.list_top_content(&template.filters, TOP_CONTENT_LIMIT).await?;

    let signals = MonitorSignals::from_kpis(&kpis, &active_incidents);
    let confidence_value = confidence::score(&signals, top_content.len(), active_incidents.len());
    let threshold = if template.confidence_threshold > 0.0 { template.confidence_threshold } else { default_confidence_threshold };

    let recommendation_lines = recommendations::build(&signals, active_incidents.len(), top_content.len());

    let export_filters = restrict_export_filters(&template.filters);
    let export_job_id =
        store.create_export_job(export_filters, run.requested_by_user_id.as_ref(), run.request_id.as_ref()).await?;
    events.emit(&json!({"event": "report.export_fanned_out", "runId": run.id.as_str(), "exportJobId": export_job_id.as_str()}));

    let (status, blocked_reason) = if confidence_value < threshold {
        (ReportRunStatus::PendingReview, Some("confidence_below_threshold".to_string()))
    } else {
        (ReportRunStatus::Completed, None)
    };

    let summary = build_summary(&signals, confidence_value);

    store
        .finish_report_run(
            &run.id,
            status,
            Some(confidence_value),
            Some(summary.clone()),
            recommendation_lines.clone(),
            blocked_reason,
            Some(export_job_id),
            OffsetDateTime::now_utc(),
        )
        .await?;

    events.emit(&json!({
        "event": "report.finished",
        "runId": run.id.as_str(),
        "status": status_label(status),
        "confidence": confidence_value,
    }));

    if status == ReportRunStatus::Completed {
        if let Some(schedule) = schedule {
            send_report_email(email, events, email_sender, &schedule.recipients, &template.name, &summary).await;
        }
    }

    Ok((status, Some(confidence_value)))
}

/// Restricts a template's filters to the fields an export job may carry.
fn restrict_export_filters(filters: &Value) -> Value {
    let Some(map) = filters.as_object() else {
        return json!({});
    };
    let restricted: serde_json::Map<String, Value> =
        map.iter().filter(|(key, _)| EXPORT_FILTER_FIELDS.contains(&key.as_str())).map(|(k, v)| (k.clone(), v.clone())).collect();
    Value::Object(restricted)
}

/// Builds the narrative summary persisted alongside the confidence score.
fn build_summary(signals: &MonitorSignals, confidence_value: f64) -> String {
    format!(
        "Window covered {} items ({} classified); brand-health score {:.1}, active risk {:.1}, claro share of voice {:.1}%. Confidence {confidence_value:.3}.",
        signals.items, signals.classified_items, signals.bhs, signals.riesgo_activo, signals.sov_claro
    )
}

/// Snake-case label for a report run status, used in emitted events.
fn status_label(status: ReportRunStatus) -> &'static str {
    match status {
        ReportRunStatus::Queued => "queued",
        ReportRunStatus::Running => "running",
        ReportRunStatus::Completed => "completed",
        ReportRunStatus::Failed => "failed",
        ReportRunStatus::PendingReview => "pending_review",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use media_core::interfaces::NullEventSink;

    use super::restrict_export_filters;
    use super::run_report;
    use crate::dispatch::ReportDispatch;
    use crate::test_support::FakeEmailSender;
    use crate::test_support::FakeStore;

    #[test]
    fn restrict_export_filters_drops_unlisted_fields() {
        let filters = serde_json::json!({"source_type": "news", "scope": "claro", "q": "5g"});
        let restricted = restrict_export_filters(&filters);
        let obj = restricted.as_object().unwrap();
        assert!(obj.contains_key("source_type"));
        assert!(obj.contains_key("q"));
        assert!(!obj.contains_key("scope"));
    }

    #[tokio::test]
    async fn a_high_confidence_run_completes_and_sends_email() {
        let store = FakeStore::high_confidence();
        let email = FakeEmailSender::all_verified();
        let dispatch = ReportDispatch {
            report_run_id: store.report_run_id(),
            request_id: None,
            requested_by_user_id: None,
        };
        let outcome = run_report(&store, &email, &NullEventSink, 0.65, Some("reports@example.com"), &dispatch).await.unwrap();
        match outcome {
            super::WorkerOutcome::Finished { status, .. } => {
                assert_eq!(status, media_core::core::report::ReportRunStatus::Completed);
            }
            super::WorkerOutcome::SkippedDuplicate => panic!("expected a finished outcome"),
        }
        assert_eq!(email.sent_count(), 1);
    }

    #[tokio::test]
    async fn a_low_confidence_run_is_held_for_review_without_email() {
        let store = FakeStore::low_confidence();
        let email = FakeEmailSender::all_verified();
        let dispatch = ReportDispatch {
            report_run_id: store.report_run_id(),
            request_id: None,
            requested_by_user_id: None,
        };
        let outcome = run_report(&store, &email, &NullEventSink, 0.65, Some("reports@example.com"), &dispatch).await.unwrap();
        match outcome {
            super::WorkerOutcome::Finished { status, .. } => {
                assert_eq!(status, media_core::core::report::ReportRunStatus::PendingReview);
            }
            super::WorkerOutcome::SkippedDuplicate => panic!("expected a finished outcome"),
        }
        assert_eq!(email.sent_count(), 0);
    }

    #[tokio::test]
    async fn a_duplicate_delivery_is_skipped() {
        let store = FakeStore::already_claimed();
        let email = FakeEmailSender::all_verified();
        let dispatch = ReportDispatch {
            report_run_id: store.report_run_id(),
            request_id: None,
            requested_by_user_id: None,
        };
        let outcome = run_report(&store, &email, &NullEventSink, 0.65, Some("reports@example.com"), &dispatch).await.unwrap();
        assert!(matches!(outcome, super::WorkerOutcome::SkippedDuplicate));
    }
}
