// media-store/src/trait_impl.rs
// ============================================================================
// Module: Store Trait Implementation
// Description: Delegates every `media_core::Store` method to the inherent
//              `*_impl` methods defined across this crate's other modules.
// Purpose: Keep the trait surface a thin, uniform dispatch layer.
// Dependencies: media-core
// ============================================================================

use media_core::StoreError;
use media_core::Store;
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
use media_core::core::ingestion::IngestionRunContentLink;
use media_core::core::ingestion::IngestionRunItem;
use media_core::core::ingestion::TriggerType;
use media_core::core::query::TrackedQuery;
use media_core::core::report::ReportRun;
use media_core::core::report::ReportRunStatus;
use media_core::core::report::ReportSchedule;
use media_core::core::report::ReportTemplate;
use media_core::interfaces::ClassifiedWindowEntry;
use media_core::interfaces::ContentItemUpsert;
use media_core::interfaces::ContentItemUpsertOutcome;
use media_core::interfaces::RunClaim;
use serde_json::Value;
use time::OffsetDateTime;

use crate::PostgresStore;

#[async_trait::async_trait]
impl Store for PostgresStore {
    async fn get_tracked_query(&self, id: &TermId) -> Result<TrackedQuery, StoreError> {
        self.get_tracked_query_impl(id).await
    }

    async fn find_tracked_query_by_name(
        &self,
        name: &str,
        language: &str,
    ) -> Result<Option<TrackedQuery>, StoreError> {
        self.find_tracked_query_by_name_impl(name, language).await
    }

    async fn list_active_tracked_queries(&self, limit: u32) -> Result<Vec<TrackedQuery>, StoreError> {
        self.list_active_tracked_queries_impl(limit).await
    }

    async fn append_tracked_query_revision(
        &self,
        query_id: &TermId,
        change_reason: &str,
        actor: &UserId,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError> {
        self.append_tracked_query_revision_impl(query_id, change_reason, actor, request_id).await
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
        self.claim_ingestion_run_impl(
            run_id,
            trigger_type,
            language,
            effective_max_articles_per_term,
            request_id,
            now,
        )
        .await
    }

    async fn ensure_adhoc_tracked_query(
        &self,
        name: &str,
        language: &str,
        actor: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<TermId, StoreError> {
        self.ensure_adhoc_tracked_query_impl(name, language, actor, request_id).await
    }

    async fn upsert_content_item(
        &self,
        upsert: &ContentItemUpsert,
        request_id: Option<&RequestId>,
    ) -> Result<ContentItemUpsertOutcome, StoreError> {
        self.upsert_content_item_impl(upsert, request_id).await
    }

    async fn insert_run_content_links(
        &self,
        links: &[IngestionRunContentLink],
    ) -> Result<(), StoreError> {
        self.insert_run_content_links_impl(links).await
    }

    async fn replace_run_items(
        &self,
        run_id: &RunId,
        items: &[IngestionRunItem],
    ) -> Result<(), StoreError> {
        self.replace_run_items_impl(run_id, items).await
    }

    async fn finish_ingestion_run(
        &self,
        run_id: &RunId,
        metrics: Value,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.finish_ingestion_run_impl(run_id, metrics, error_message, now).await
    }

    async fn select_pending_classification_targets(
        &self,
        window_start: OffsetDateTime,
        prompt_version: &str,
        model_id: &str,
        limit: u32,
    ) -> Result<Vec<ContentItemId>, StoreError> {
        self.select_pending_classification_targets_impl(window_start, prompt_version, model_id, limit)
            .await
    }

    async fn get_content_item(&self, id: &ContentItemId) -> Result<ContentItem, StoreError> {
        self.get_content_item_impl(id).await
    }

    async fn find_override_classification(
        &self,
        content_item_id: &ContentItemId,
    ) -> Result<Option<Classification>, StoreError> {
        self.find_override_classification_impl(content_item_id).await
    }

    async fn upsert_auto_classification(
        &self,
        classification: &Classification,
        request_id: Option<&RequestId>,
    ) -> Result<ClassificationId, StoreError> {
        self.upsert_auto_classification_impl(classification, request_id).await
    }

    async fn load_classified_window(
        &self,
        scope: Scope,
        window_start: OffsetDateTime,
    ) -> Result<Vec<ClassifiedWindowEntry>, StoreError> {
        self.load_classified_window_impl(scope, window_start).await
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
        self.apply_incident_decision_impl(
            scope,
            risk_score,
            classified_items,
            new_severity,
            cooldown_minutes,
            signal_version,
            payload,
            now,
            request_id,
        )
        .await
    }

    async fn start_incident_evaluation_run(
        &self,
        trigger_type: TriggerType,
        request_id: Option<&RequestId>,
        now: OffsetDateTime,
    ) -> Result<IncidentEvaluationRunId, StoreError> {
        self.start_incident_evaluation_run_impl(trigger_type, request_id, now).await
    }

    async fn finish_incident_evaluation_run(
        &self,
        id: &IncidentEvaluationRunId,
        metrics: Value,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.finish_incident_evaluation_run_impl(id, metrics, error_message, now).await
    }

    async fn claim_report_run(
        &self,
        id: &ReportRunId,
        now: OffsetDateTime,
    ) -> Result<Option<ReportRun>, StoreError> {
        self.claim_report_run_impl(id, now).await
    }

    async fn load_report_template(
        &self,
        id: &ReportRunId,
    ) -> Result<(ReportTemplate, Option<ReportSchedule>), StoreError> {
        self.load_report_template_impl(id).await
    }

    async fn aggregate_monitor_kpis(&self, filters: &Value) -> Result<Value, StoreError> {
        self.aggregate_monitor_kpis_impl(filters).await
    }

    async fn list_active_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        self.list_active_incidents_impl().await
    }

    async fn list_top_content(&self, filters: &Value, limit: u32) -> Result<Vec<ContentItem>, StoreError> {
        self.list_top_content_impl(filters, limit).await
    }

    async fn create_export_job(
        &self,
        filters: Value,
        requested_by_user_id: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<ExportJobId, StoreError> {
        self.create_export_job_impl(filters, requested_by_user_id, request_id).await
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
        self.finish_report_run_impl(
            id,
            status,
            confidence,
            summary,
            recommendations,
            blocked_reason,
            export_job_id,
            now,
        )
        .await
    }

    async fn enqueue_due_report_schedules(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<ReportRunId>, StoreError> {
        self.enqueue_due_report_schedules_impl(now).await
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
        self.append_audit_log_impl(
            action,
            resource_type,
            resource_id,
            actor_user_id,
            request_id,
            before,
            after,
            now,
        )
        .await
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
        self.claim_social_object_impl(channel, bucket, key, e_tag, last_modified, now).await
    }

    async fn aggregate_social_channel_totals(
        &self,
        channel: &str,
        window_start: OffsetDateTime,
    ) -> Result<Value, StoreError> {
        self.aggregate_social_channel_totals_impl(channel, window_start).await
    }

    async fn write_social_reconciliation_snapshot(
        &self,
        snapshot: &media_core::core::social::SocialReconciliationSnapshot,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError> {
        self.write_social_reconciliation_snapshot_impl(snapshot, request_id).await
    }
}
