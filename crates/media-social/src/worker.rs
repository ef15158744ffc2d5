// media-social/src/worker.rs
// ============================================================================
// Module: Social Ingestion Worker
// Description: Runs one channel's ingestion pass end to end (§10).
// Purpose: The single entry point the queue consumer invokes per channel.
// Dependencies: media-core, media-incident, serde_json, time
// ============================================================================

//! ## Overview
//! [`run_social_ingestion`] lists a channel's unclaimed objects oldest
//! first, claims and parses each one, upserts every well-formed row,
//! reconciles the channel's rolling window, and finally checks the window's
//! negative-sentiment share against the configured threshold, escalating an
//! incident through [`media_incident::state_machine::apply_scope`] when it
//! is crossed. Nothing here ever aborts the remainder of a pass: a
//! malformed row is counted and skipped, and a reconciliation shortfall is
//! recorded rather than retried.

use media_core::EventSink;
use media_core::StoreError;
use media_core::core::identifiers::RequestId;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::Scope;
use media_core::core::social::SocialReconciliationSnapshot;
use media_core::core::social::SocialReconciliationStatus;
use media_core::interfaces::Store;
use media_incident::aggregate::ScopeSignal;
use media_incident::state_machine::Decision;
use media_incident::state_machine::apply_scope;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;

use crate::csv_parser::parse_channel_csv;
use crate::dispatch::SocialIngestionDispatch;
use crate::object_source::ObjectSource;
use crate::object_source::ObjectSourceError;

/// Signal version stamped on incidents this worker creates or refreshes.
pub const SOCIAL_SIGNAL_VERSION: &str = "social-v1";
/// Width of the rolling window reconciled and scanned for the sentiment check.
pub const WINDOW_DAYS: i64 = 7;

/// Failures running one channel's ingestion pass.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The store returned an error loading or persisting state.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Listing or fetching a channel object failed.
    #[error(transparent)]
    ObjectSource(#[from] ObjectSourceError),
}

/// Outcome of one channel ingestion pass.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// Number of objects newly claimed and processed this pass.
    pub processed_objects: u32,
    /// Rows successfully parsed across every processed object.
    pub parsed_row_count: u32,
    /// Rows skipped for being malformed across every processed object.
    pub malformed_row_count: u32,
    /// Rows actually persisted (inserted or updated) across every processed object.
    pub persisted_row_count: u32,
    /// Reconciliation status recorded for this pass's window.
    pub reconciliation_status: SocialReconciliationStatus,
    /// Whether an incident was created or refreshed off this pass's totals.
    pub incident_triggered: bool,
}

/// Runs one channel's ingestion dispatch end to end.
///
/// # Errors
/// Returns [`WorkerError`] when listing, fetching, or persisting fails.
pub async fn run_social_ingestion(
    store: &dyn Store,
    objects: &dyn ObjectSource,
    events: &dyn EventSink,
    negative_sentiment_threshold: f64,
    cooldown_minutes: u32,
    dispatch: &SocialIngestionDispatch,
) -> Result<WorkerOutcome, WorkerError> {
    let channel = dispatch.channel.as_str();
    let now = OffsetDateTime::now_utc();
    let window_start = now - time::Duration::days(WINDOW_DAYS);

    let candidates = objects.list_channel_objects(channel).await?;

    let mut processed_objects: u32 = 0;
    let mut parsed_row_count: u32 = 0;
    let mut malformed_row_count: u32 = 0;
    let mut persisted_row_count: u32 = 0;

    for object in &candidates {
        let claimed = store
            .claim_social_object(channel, &object.bucket, &object.key, &object.e_tag, object.last_modified, now)
            .await?;
        if !claimed {
            continue;
        }
        processed_objects += 1;

        let body = objects.get(object).await?;
        let parsed = parse_channel_csv(&body);
        parsed_row_count += saturating_u32(parsed.items.len());
        malformed_row_count += parsed.malformed_row_count;

        for item in &parsed.items {
            let outcome = store.upsert_content_item(item, dispatch.request_id.as_ref()).await?;
            let _ = outcome.content_item_id;
            persisted_row_count += 1;
        }

        events.emit(&json!({
            "event": "social_ingestion.object_processed",
            "channel": channel,
            "key": object.key,
            "parsedRows": parsed.items.len(),
            "malformedRows": parsed.malformed_row_count,
        }));
    }

    let status = SocialReconciliationSnapshot::status_for(parsed_row_count, persisted_row_count);
    let snapshot = SocialReconciliationSnapshot {
        channel: channel.to_string(),
        window_start,
        window_end: now,
        expected_count: parsed_row_count,
        observed_count: persisted_row_count,
        status,
        created_at: now,
    };
    store.write_social_reconciliation_snapshot(&snapshot, dispatch.request_id.as_ref()).await?;

    let totals = store.aggregate_social_channel_totals(channel, window_start).await?;

    let incident_triggered =
        maybe_trigger_incident(store, &totals, negative_sentiment_threshold, cooldown_minutes, dispatch.request_id.as_ref(), now).await?;

    events.emit(&json!({
        "event": "social_ingestion.completed",
        "channel": channel,
        "processedObjects": processed_objects,
        "reconciliationStatus": status.as_str(),
        "incidentTriggered": incident_triggered,
    }));

    Ok(WorkerOutcome {
        processed_objects,
        parsed_row_count,
        malformed_row_count,
        persisted_row_count,
        reconciliation_status: status,
        incident_triggered,
    })
}

async fn maybe_trigger_incident(
    store: &dyn Store,
    totals: &Value,
    negative_sentiment_threshold: f64,
    cooldown_minutes: u32,
    request_id: Option<&RequestId>,
    now: OffsetDateTime,
) -> Result<bool, StoreError> {
    let post_count = saturating_u32_from_value(totals, "postCount");
    let negative_count = saturating_u32_from_value(totals, "negativeCount");
    if post_count == 0 {
        return Ok(false);
    }
    let negative_share = f64::from(negative_count) / f64::from(post_count);
    if negative_share < negative_sentiment_threshold {
        return Ok(false);
    }

    let signal = ScopeSignal {
        classified_items: post_count,
        classified_weight: f64::from(post_count),
        negative_weight: f64::from(negative_count),
        positive_count: 0,
        negative_count,
        neutral_count: post_count.saturating_sub(negative_count),
        unclassified_count: 0,
    };
    let new_severity = IncidentSeverity::from_risk_weighted(signal.risk_weighted());

    let decision =
        apply_scope(store, Scope::Claro, &signal, new_severity, cooldown_minutes, SOCIAL_SIGNAL_VERSION, now, request_id).await?;
    Ok(!matches!(decision, Decision::SkipSev4OrEmpty))
}

/// Saturating `usize` to `u32` conversion.
fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Reads an integer field from a JSON object, saturating to `u32` and defaulting to 0.
fn saturating_u32_from_value(value: &Value, field: &str) -> u32 {
    value.get(field).and_then(Value::as_i64).and_then(|raw| u32::try_from(raw).ok()).unwrap_or(0)
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::run_social_ingestion;
    use crate::dispatch::SocialIngestionDispatch;
    use crate::object_source::ObjectSource;
    use crate::object_source::ObjectSourceError;
    use crate::object_source::SocialObjectRef;
    use crate::test_support::FakeStore;
    use async_trait::async_trait;
    use media_core::interfaces::NullEventSink;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    struct FakeObjectSource {
        objects: Vec<SocialObjectRef>,
        bodies: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ObjectSource for FakeObjectSource {
        async fn list_channel_objects(&self, _channel: &str) -> Result<Vec<SocialObjectRef>, ObjectSourceError> {
            Ok(self.objects.clone())
        }

        async fn get(&self, object: &SocialObjectRef) -> Result<Vec<u8>, ObjectSourceError> {
            Ok(self.bodies.get(&object.key).cloned().unwrap_or_default())
        }
    }

    fn object(key: &str) -> SocialObjectRef {
        SocialObjectRef {
            bucket: "social-raw".to_string(),
            key: key.to_string(),
            e_tag: "etag-1".to_string(),
            last_modified: OffsetDateTime::from_unix_timestamp(0).unwrap(),
        }
    }

    fn dispatch() -> SocialIngestionDispatch {
        SocialIngestionDispatch { channel: "twitter".to_string(), request_id: None, requested_by_user_id: None, requested_at: None }
    }

    #[tokio::test]
    async fn processes_new_objects_and_persists_rows() {
        let body = "post_id,channel,author,posted_at,text\np1,twitter,@a,2026-07-20T10:00:00Z,hi\n";
        let source = FakeObjectSource { objects: vec![object("twitter/1.csv")], bodies: HashMap::from([("twitter/1.csv".to_string(), body.as_bytes().to_vec())]) };
        let store = FakeStore { claim_result: Mutex::new(true), totals: json_totals(1, 0), ..Default::default() };

        let outcome = run_social_ingestion(&store, &source, &NullEventSink, 0.5, 60, &dispatch()).await.unwrap();
        assert_eq!(outcome.processed_objects, 1);
        assert_eq!(outcome.persisted_row_count, 1);
        assert_eq!(outcome.malformed_row_count, 0);
        assert!(!outcome.incident_triggered);
    }

    #[tokio::test]
    async fn skips_objects_already_claimed() {
        let source = FakeObjectSource { objects: vec![object("twitter/1.csv")], bodies: HashMap::new() };
        let store = FakeStore { claim_result: Mutex::new(false), totals: json_totals(0, 0), ..Default::default() };

        let outcome = run_social_ingestion(&store, &source, &NullEventSink, 0.5, 60, &dispatch()).await.unwrap();
        assert_eq!(outcome.processed_objects, 0);
        assert_eq!(outcome.persisted_row_count, 0);
    }

    #[tokio::test]
    async fn triggers_an_incident_when_negative_share_crosses_the_threshold() {
        let source = FakeObjectSource { objects: vec![], bodies: HashMap::new() };
        let store = FakeStore { claim_result: Mutex::new(true), totals: json_totals(10, 8), ..Default::default() };

        let outcome = run_social_ingestion(&store, &source, &NullEventSink, 0.5, 60, &dispatch()).await.unwrap();
        assert!(outcome.incident_triggered);
    }

    #[tokio::test]
    async fn does_not_trigger_an_incident_below_the_threshold() {
        let source = FakeObjectSource { objects: vec![], bodies: HashMap::new() };
        let store = FakeStore { claim_result: Mutex::new(true), totals: json_totals(10, 1), ..Default::default() };

        let outcome = run_social_ingestion(&store, &source, &NullEventSink, 0.5, 60, &dispatch()).await.unwrap();
        assert!(!outcome.incident_triggered);
    }

    fn json_totals(post_count: i64, negative_count: i64) -> serde_json::Value {
        serde_json::json!({"postCount": post_count, "negativeCount": negative_count})
    }
}
