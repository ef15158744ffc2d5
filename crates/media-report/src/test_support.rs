// media-report/src/test_support.rs
// ============================================================================
// Module: Test Support
// Description: A minimal in-memory Store double and a fake EmailSender,
//              covering just the report worker's code paths.
// Purpose: Let worker tests exercise one scenario end to end without a
//          database or SES.
// Dependencies: media-core
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only scaffolding.")]
#![cfg(test)]

use std::sync::Mutex;

use async_trait::async_trait;
use media_core::StoreError;
use media_core::core::content::Classification;
use media_core::core::content::ContentItem;
use media_core::core::content::ContentState;
use media_core::core::content::SourceType;
use media_core::core::identifiers::ClassificationId;
use media_core::core::identifiers::ContentItemId;
use media_core::core::identifiers::ExportJobId;
use media_core::core::identifiers::IncidentEvaluationRunId;
use media_core::core::identifiers::IncidentId;
use media_core::core::identifiers::ReportRunId;
use media_core::core::identifiers::ReportScheduleId;
use media_core::core::identifiers::ReportTemplateId;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::RunId;
use media_core::core::identifiers::TermId;
use media_core::core::identifiers::UserId;
use media_core::core::incident::Incident;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::IncidentStatus;
use media_core::core::incident::Scope;
use media_core::core::ingestion::IngestionRunContentLink;
use media_core::core::ingestion::IngestionRunItem;
use media_core::core::ingestion::TriggerType;
use media_core::core::query::TrackedQuery;
use media_core::core::report::ReportRun;
use media_core::core::report::ReportRunStatus;
use media_core::core::report::ReportSchedule;
use media_core::core::report::ReportScheduleFrequency;
use media_core::core::report::ReportTemplate;
use media_core::interfaces::ClassifiedWindowEntry;
use media_core::interfaces::ContentItemUpsert;
use media_core::interfaces::ContentItemUpsertOutcome;
use media_core::interfaces::RunClaim;
use media_core::interfaces::Store;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;

use crate::email::EmailSender;
use crate::email::EmailSenderError;

fn sample_content_item(id: &str) -> ContentItem {
    ContentItem {
        id: ContentItemId::new(id),
        canonical_url: format!("https://example.com/{id}"),
        source_type: SourceType::News,
        term_id: None,
        provider: "example-news".to_string(),
        source_name: Some("Example Daily".to_string()),
        source_id: None,
        title: "Sample headline".to_string(),
        summary: None,
        content: None,
        image_url: None,
        language: Some("es".to_string()),
        category: None,
        published_at: None,
        source_score: Some(0.8),
        raw_payload_s3_key: None,
        state: ContentState::Active,
        categoria: None,
        sentimiento: None,
        metadata: json!({}),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn sample_incident(risk_score: f64) -> Incident {
    Incident {
        id: IncidentId::new("22222222-2222-2222-2222-222222222222"),
        scope: Scope::Claro,
        status: IncidentStatus::Open,
        severity: IncidentSeverity::Sev1,
        risk_score,
        classified_items: 40,
        owner_user_id: None,
        sla_due_at: OffsetDateTime::UNIX_EPOCH,
        cooldown_until: OffsetDateTime::UNIX_EPOCH,
        signal_version: "alert-v1-weighted".to_string(),
        payload: json!({}),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
        resolved_at: None,
    }
}

fn sample_template() -> ReportTemplate {
    ReportTemplate {
        id: ReportTemplateId::new("33333333-3333-3333-3333-333333333333"),
        name: "Weekly brand monitor".to_string(),
        sections: vec!["overview".to_string()],
        filters: json!({"source_type": "news", "scope": "claro"}),
        confidence_threshold: 0.0,
        is_active: true,
    }
}

fn sample_schedule(recipients: Vec<String>) -> ReportSchedule {
    ReportSchedule {
        id: ReportScheduleId::new("44444444-4444-4444-4444-444444444444"),
        template_id: ReportTemplateId::new("33333333-3333-3333-3333-333333333333"),
        frequency: ReportScheduleFrequency::Weekly,
        day_of_week: Some(1),
        time_local: "08:00".to_string(),
        timezone: "America/Bogota".to_string(),
        recipients,
        next_run_at: OffsetDateTime::UNIX_EPOCH,
        last_run_at: None,
        enabled: true,
    }
}

fn sample_run(id: ReportRunId, status: ReportRunStatus) -> ReportRun {
    ReportRun {
        id,
        template_id: ReportTemplateId::new("33333333-3333-3333-3333-333333333333"),
        schedule_id: None,
        status,
        confidence: None,
        summary: None,
        recommendations: Vec::new(),
        blocked_reason: None,
        export_job_id: None,
        idempotency_key: "schedule:44444444-4444-4444-4444-444444444444:2026-07-27T08:00:00Z".to_string(),
        request_id: None,
        requested_by_user_id: None,
        started_at: Some(OffsetDateTime::UNIX_EPOCH),
        finished_at: None,
    }
}

/// In-memory [`Store`] double; every method panics unless primed by this
/// scenario, so a test failure points straight at the untested path.
pub struct FakeStore {
    report_run_id: ReportRunId,
    claim_result: Option<ReportRun>,
    kpis: Value,
    active_incidents: Vec<Incident>,
    top_content: Vec<ContentItem>,
    schedule: Option<ReportSchedule>,
    finished: Mutex<Vec<(ReportRunStatus, Option<f64>, Option<String>)>>,
}

impl FakeStore {
    /// A run whose window is fully covered and risk-free; scores above the
    /// default threshold.
    #[must_use]
    pub fn high_confidence() -> Self {
        let id = ReportRunId::new("55555555-5555-5555-5555-555555555555");
        Self {
            claim_result: Some(sample_run(id.clone(), ReportRunStatus::Running)),
            kpis: json!({
                "totalContentItems": 180,
                "classifiedItems": 120,
                "bySentimiento": {"positivo": 120, "negativo": 0},
                "byScope": {"claro": 100, "competencia": 20},
            }),
            active_incidents: Vec::new(),
            top_content: (0..8).map(|n| sample_content_item(&format!("item-{n}"))).collect(),
            schedule: Some(sample_schedule(vec!["analyst@example.com".to_string()])),
            report_run_id: id,
            finished: Mutex::new(Vec::new()),
        }
    }

    /// A run with an empty window and elevated active risk; scores below the
    /// default threshold.
    #[must_use]
    pub fn low_confidence() -> Self {
        let id = ReportRunId::new("66666666-6666-6666-6666-666666666666");
        Self {
            claim_result: Some(sample_run(id.clone(), ReportRunStatus::Running)),
            kpis: json!({
                "totalContentItems": 0,
                "classifiedItems": 0,
                "bySentimiento": {},
                "byScope": {},
            }),
            active_incidents: (0..6).map(|_| sample_incident(100.0)).collect(),
            top_content: Vec::new(),
            schedule: Some(sample_schedule(vec!["analyst@example.com".to_string()])),
            report_run_id: id,
            finished: Mutex::new(Vec::new()),
        }
    }

    /// A run whose claim has already been taken by another delivery.
    #[must_use]
    pub fn already_claimed() -> Self {
        Self {
            report_run_id: ReportRunId::new("77777777-7777-7777-7777-777777777777"),
            claim_result: None,
            kpis: json!({}),
            active_incidents: Vec::new(),
            top_content: Vec::new(),
            schedule: None,
            finished: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn report_run_id(&self) -> ReportRunId {
        self.report_run_id.clone()
    }
}

#[async_trait]
#[allow(unused_variables, clippy::too_many_arguments)]
impl Store for FakeStore {
    async fn get_tracked_query(&self, _id: &TermId) -> Result<TrackedQuery, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn find_tracked_query_by_name(&self, _name: &str, _language: &str) -> Result<Option<TrackedQuery>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn list_active_tracked_queries(&self, _limit: u32) -> Result<Vec<TrackedQuery>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn append_tracked_query_revision(&self, _id: &TermId, _reason: &str, _actor: &UserId, _request_id: Option<&RequestId>) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn claim_ingestion_run(&self, _run_id: &RunId, _trigger_type: TriggerType, _language: Option<&str>, _max_articles: u32, _request_id: Option<&RequestId>, _now: OffsetDateTime) -> Result<RunClaim, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn ensure_adhoc_tracked_query(&self, _name: &str, _language: &str, _actor: Option<&UserId>, _request_id: Option<&RequestId>) -> Result<TermId, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn upsert_content_item(&self, _upsert: &ContentItemUpsert, _request_id: Option<&RequestId>) -> Result<ContentItemUpsertOutcome, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn insert_run_content_links(&self, _links: &[IngestionRunContentLink]) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn replace_run_items(&self, _run_id: &RunId, _items: &[IngestionRunItem]) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn finish_ingestion_run(&self, _run_id: &RunId, _metrics: Value, _error_message: Option<String>, _now: OffsetDateTime) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn select_pending_classification_targets(&self, _window_start: OffsetDateTime, _prompt_version: &str, _model_id: &str, _limit: u32) -> Result<Vec<ContentItemId>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn get_content_item(&self, _id: &ContentItemId) -> Result<ContentItem, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn find_override_classification(&self, _content_item_id: &ContentItemId) -> Result<Option<Classification>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn upsert_auto_classification(&self, _classification: &Classification, _request_id: Option<&RequestId>) -> Result<ClassificationId, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn load_classified_window(&self, _scope: Scope, _window_start: OffsetDateTime) -> Result<Vec<ClassifiedWindowEntry>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn apply_incident_decision(
        &self,
        _scope: Scope,
        _risk_score: f64,
        _classified_items: u32,
        _new_severity: IncidentSeverity,
        _cooldown_minutes: u32,
        _signal_version: &str,
        _payload: Value,
        _now: OffsetDateTime,
        _request_id: Option<&RequestId>,
    ) -> Result<media_core::core::incident::IncidentDecision, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn start_incident_evaluation_run(&self, _trigger_type: TriggerType, _request_id: Option<&RequestId>, _now: OffsetDateTime) -> Result<IncidentEvaluationRunId, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn finish_incident_evaluation_run(&self, _id: &IncidentEvaluationRunId, _metrics: Value, _error_message: Option<String>, _now: OffsetDateTime) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }

    async fn claim_report_run(&self, _id: &ReportRunId, _now: OffsetDateTime) -> Result<Option<ReportRun>, StoreError> {
        Ok(self.claim_result.clone())
    }
    async fn load_report_template(&self, _id: &ReportRunId) -> Result<(ReportTemplate, Option<ReportSchedule>), StoreError> {
        Ok((sample_template(), self.schedule.clone()))
    }
    async fn aggregate_monitor_kpis(&self, _filters: &Value) -> Result<Value, StoreError> {
        Ok(self.kpis.clone())
    }
    async fn list_active_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        Ok(self.active_incidents.clone())
    }
    async fn list_top_content(&self, _filters: &Value, _limit: u32) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.top_content.clone())
    }
    async fn create_export_job(&self, _filters: Value, _requested_by_user_id: Option<&UserId>, _request_id: Option<&RequestId>) -> Result<ExportJobId, StoreError> {
        Ok(ExportJobId::new("88888888-8888-8888-8888-888888888888"))
    }
    #[allow(clippy::too_many_arguments)]
    async fn finish_report_run(&self, _id: &ReportRunId, status: ReportRunStatus, confidence: Option<f64>, _summary: Option<String>, _recommendations: Vec<String>, blocked_reason: Option<String>, _export_job_id: Option<ExportJobId>, _now: OffsetDateTime) -> Result<(), StoreError> {
        self.finished.lock().expect("lock poisoned").push((status, confidence, blocked_reason));
        Ok(())
    }
    async fn enqueue_due_report_schedules(&self, _now: OffsetDateTime) -> Result<Vec<ReportRunId>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn append_audit_log(&self, _action: &'static str, _resource_type: &'static str, _resource_id: &str, _actor_user_id: Option<&UserId>, _request_id: Option<&RequestId>, _before: Option<Value>, _after: Value, _now: OffsetDateTime) -> Result<(), StoreError> {
        Ok(())
    }

    async fn claim_social_object(&self, _channel: &str, _bucket: &str, _key: &str, _e_tag: &str, _last_modified: OffsetDateTime, _now: OffsetDateTime) -> Result<bool, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn aggregate_social_channel_totals(&self, _channel: &str, _window_start: OffsetDateTime) -> Result<Value, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn write_social_reconciliation_snapshot(&self, _snapshot: &media_core::core::social::SocialReconciliationSnapshot, _request_id: Option<&RequestId>) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
}

/// In-memory [`EmailSender`] double that treats every identity as verified or
/// unverified uniformly, and records each send attempted.
pub struct FakeEmailSender {
    verified: bool,
    sent: Mutex<Vec<String>>,
}

impl FakeEmailSender {
    /// Every identity checked is reported verified.
    #[must_use]
    pub fn all_verified() -> Self {
        Self { verified: true, sent: Mutex::new(Vec::new()) }
    }

    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl EmailSender for FakeEmailSender {
    async fn is_verified(&self, _identity: &str) -> Result<bool, EmailSenderError> {
        Ok(self.verified)
    }
    async fn send(&self, _sender: &str, recipient: &str, _subject: &str, _body_text: &str) -> Result<(), EmailSenderError> {
        self.sent.lock().expect("lock poisoned").push(recipient.to_string());
        Ok(())
    }
}

