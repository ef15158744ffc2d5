// media-social/src/test_support.rs
// ============================================================================
// Module: Test Support
// Description: A minimal in-memory Store double covering every trait method
//              with an `unreachable!` default, overridable per scenario.
// Purpose: Let worker tests exercise one code path without a database.
// Dependencies: media-core
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only scaffolding.")]
#![cfg(test)]

use async_trait::async_trait;
use media_core::StoreError;
use media_core::core::content::Classification;
use media_core::core::content::ContentItem;
use media_core::core::identifiers::ClassificationId;
use media_core::core::identifiers::ContentItemId;
use media_core::core::identifiers::ExportJobId;
use media_core::core::identifiers::IncidentEvaluationRunId;
use media_core::core::identifiers::ReportRunId;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::RunId;
use media_core::core::identifiers::TermId;
use media_core::core::identifiers::UserId;
use media_core::core::incident::Incident;
use media_core::core::incident::IncidentDecision;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::Scope;
use media_core::core::incident::decide_incident_action;
use media_core::core::ingestion::IngestionRunContentLink;
use media_core::core::ingestion::IngestionRunItem;
use media_core::core::ingestion::TriggerType;
use media_core::core::query::TrackedQuery;
use media_core::core::report::ReportRun;
use media_core::core::report::ReportRunStatus;
use media_core::core::report::ReportSchedule;
use media_core::core::report::ReportTemplate;
use media_core::core::social::SocialReconciliationSnapshot;
use media_core::interfaces::ClassifiedWindowEntry;
use media_core::interfaces::ContentItemUpsert;
use media_core::interfaces::ContentItemUpsertOutcome;
use media_core::interfaces::RunClaim;
use media_core::interfaces::Store;
use serde_json::Value;
use std::sync::Mutex;
use time::OffsetDateTime;

/// In-memory [`Store`] double; every method panics unless primed by a
/// field or `with_*` builder, so a test failure points straight at the
/// untested path.
pub struct FakeStore {
    pub claim_result: Mutex<bool>,
    pub totals: Value,
    pub upserted_count: Mutex<u32>,
    pub snapshots: Mutex<Vec<SocialReconciliationSnapshot>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self { claim_result: Mutex::new(true), totals: serde_json::json!({"postCount": 0, "negativeCount": 0}), upserted_count: Mutex::new(0), snapshots: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
#[allow(unused_variables, clippy::too_many_arguments)]
impl Store for FakeStore {
    async fn get_tracked_query(&self, id: &TermId) -> Result<TrackedQuery, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn find_tracked_query_by_name(&self, name: &str, language: &str) -> Result<Option<TrackedQuery>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn list_active_tracked_queries(&self, limit: u32) -> Result<Vec<TrackedQuery>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn append_tracked_query_revision(
        &self,
        query_id: &TermId,
        change_reason: &str,
        actor: &UserId,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn claim_ingestion_run(
        &self,
        run_id: &RunId,
        trigger_type: TriggerType,
        language: Option<&str>,
        effective_max_articles_per_term: u32,
        request_id: Option<&RequestId>,
        now: OffsetDateTime,
    ) -> Result<RunClaim, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn ensure_adhoc_tracked_query(
        &self,
        name: &str,
        language: &str,
        actor: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<TermId, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn upsert_content_item(&self, upsert: &ContentItemUpsert, request_id: Option<&RequestId>) -> Result<ContentItemUpsertOutcome, StoreError> {
        let mut count = self.upserted_count.lock().expect("lock poisoned");
        *count += 1;
        Ok(ContentItemUpsertOutcome { content_item_id: ContentItemId::new(format!("social-item-{count}")), newly_inserted: true })
    }

    async fn insert_run_content_links(&self, links: &[IngestionRunContentLink]) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn replace_run_items(&self, run_id: &RunId, items: &[IngestionRunItem]) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn finish_ingestion_run(&self, run_id: &RunId, metrics: Value, error_message: Option<String>, now: OffsetDateTime) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn select_pending_classification_targets(
        &self,
        window_start: OffsetDateTime,
        prompt_version: &str,
        model_id: &str,
        limit: u32,
    ) -> Result<Vec<ContentItemId>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn get_content_item(&self, id: &ContentItemId) -> Result<ContentItem, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn find_override_classification(&self, content_item_id: &ContentItemId) -> Result<Option<Classification>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn upsert_auto_classification(&self, classification: &Classification, request_id: Option<&RequestId>) -> Result<ClassificationId, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn load_classified_window(&self, scope: Scope, window_start: OffsetDateTime) -> Result<Vec<ClassifiedWindowEntry>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn apply_incident_decision(
        &self,
        scope: Scope,
        risk_score: f64,
        classified_items: u32,
        new_severity: IncidentSeverity,
        cooldown_minutes: u32,
        signal_version: &str,
        payload: Value,
        now: OffsetDateTime,
        request_id: Option<&RequestId>,
    ) -> Result<IncidentDecision, StoreError> {
        Ok(decide_incident_action(classified_items, new_severity, None, now))
    }

    async fn start_incident_evaluation_run(&self, trigger_type: TriggerType, request_id: Option<&RequestId>, now: OffsetDateTime) -> Result<IncidentEvaluationRunId, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn finish_incident_evaluation_run(&self, id: &IncidentEvaluationRunId, metrics: Value, error_message: Option<String>, now: OffsetDateTime) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn claim_report_run(&self, id: &ReportRunId, now: OffsetDateTime) -> Result<Option<ReportRun>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn load_report_template(&self, id: &ReportRunId) -> Result<(ReportTemplate, Option<ReportSchedule>), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn aggregate_monitor_kpis(&self, filters: &Value) -> Result<Value, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn list_active_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn list_top_content(&self, filters: &Value, limit: u32) -> Result<Vec<ContentItem>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn create_export_job(&self, filters: Value, requested_by_user_id: Option<&UserId>, request_id: Option<&RequestId>) -> Result<ExportJobId, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn finish_report_run(
        &self,
        id: &ReportRunId,
        status: ReportRunStatus,
        confidence: Option<f64>,
        summary: Option<String>,
        recommendations: Vec<String>,
        blocked_reason: Option<String>,
        export_job_id: Option<ExportJobId>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn enqueue_due_report_schedules(&self, now: OffsetDateTime) -> Result<Vec<ReportRunId>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn append_audit_log(
        &self,
        action: &'static str,
        resource_type: &'static str,
        resource_id: &str,
        actor_user_id: Option<&UserId>,
        request_id: Option<&RequestId>,
        before: Option<Value>,
        after: Value,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn claim_social_object(
        &self,
        channel: &str,
        bucket: &str,
        key: &str,
        e_tag: &str,
        last_modified: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        Ok(*self.claim_result.lock().expect("lock poisoned"))
    }

    async fn aggregate_social_channel_totals(&self, channel: &str, window_start: OffsetDateTime) -> Result<Value, StoreError> {
        Ok(self.totals.clone())
    }

    async fn write_social_reconciliation_snapshot(&self, snapshot: &SocialReconciliationSnapshot, request_id: Option<&RequestId>) -> Result<(), StoreError> {
        self.snapshots.lock().expect("lock poisoned").push(snapshot.clone());
        Ok(())
    }
}
