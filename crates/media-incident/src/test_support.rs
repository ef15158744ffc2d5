// media-incident/src/test_support.rs
// ============================================================================
// Module: Test Support
// Description: A minimal in-memory Store double covering every trait method
//              with an `unreachable!` default, overridable per scenario.
// Purpose: Let evaluator/state-machine tests exercise one code path without
//          a database.
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
use media_core::core::identifiers::IncidentId;
use media_core::core::identifiers::ReportRunId;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::RunId;
use media_core::core::identifiers::TermId;
use media_core::core::identifiers::UserId;
use media_core::core::incident::Incident;
use media_core::core::incident::IncidentDecision;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::IncidentStatus;
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
use media_core::interfaces::ClassifiedWindowEntry;
use media_core::interfaces::ContentItemUpsert;
use media_core::interfaces::ContentItemUpsertOutcome;
use media_core::interfaces::RunClaim;
use media_core::interfaces::Store;
use serde_json::Value;
use std::sync::Mutex;
use time::OffsetDateTime;

/// In-memory [`Store`] double; every method panics unless primed by a
/// `with_*` builder or recorded via a `*_calls` log, so a test failure points
/// straight at the untested path.
#[derive(Default)]
pub struct FakeStore {
    pub window_entries: std::collections::HashMap<&'static str, Vec<ClassifiedWindowEntry>>,
    pub active_incidents: Mutex<std::collections::HashMap<&'static str, Incident>>,
    pub inserted: Mutex<Vec<Incident>>,
    pub escalated: Mutex<Vec<(IncidentId, IncidentSeverity, Value)>>,
    pub refreshed: Mutex<Vec<(IncidentId, f64, u32, OffsetDateTime, Value)>>,
}

fn scope_key(scope: Scope) -> &'static str {
    match scope {
        Scope::Claro => "claro",
        Scope::Competencia => "competencia",
    }
}

impl FakeStore {
    #[must_use]
    pub fn with_window(mut self, scope: Scope, entries: Vec<ClassifiedWindowEntry>) -> Self {
        self.window_entries.insert(scope_key(scope), entries);
        self
    }

    #[must_use]
    pub fn with_active_incident(self, scope: Scope, incident: Incident) -> Self {
        self.active_incidents.lock().expect("lock poisoned").insert(scope_key(scope), incident);
        self
    }
}

#[async_trait]
#[allow(unused_variables, clippy::too_many_arguments)]
impl Store for FakeStore {
    async fn get_tracked_query(&self, _id: &TermId) -> Result<TrackedQuery, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn find_tracked_query_by_name(&self, _scope: &str, _name: &str) -> Result<Option<TrackedQuery>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn list_active_tracked_queries(&self, _limit: u32) -> Result<Vec<TrackedQuery>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn append_tracked_query_revision(&self, _id: &TermId, _reason: &str, _user_id: &UserId, _request_id: Option<&RequestId>) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn claim_ingestion_run(&self, _run_id: &RunId, _trigger_type: TriggerType, _term: Option<&str>, _max_articles: u32, _request_id: Option<&RequestId>, _now: OffsetDateTime) -> Result<RunClaim, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn ensure_adhoc_tracked_query(&self, _scope: &str, _term: &str, _user_id: Option<&UserId>, _request_id: Option<&RequestId>) -> Result<TermId, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn upsert_content_item(&self, _item: &ContentItemUpsert, _request_id: Option<&RequestId>) -> Result<ContentItemUpsertOutcome, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn insert_run_content_links(&self, _links: &[IngestionRunContentLink]) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn replace_run_items(&self, _run_id: &RunId, _items: &[IngestionRunItem]) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn finish_ingestion_run(&self, _run_id: &RunId, _summary: Value, _error_message: Option<String>, _now: OffsetDateTime) -> Result<(), StoreError> {
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

    async fn load_classified_window(&self, scope: Scope, _window_start: OffsetDateTime) -> Result<Vec<ClassifiedWindowEntry>, StoreError> {
        Ok(self.window_entries.get(scope_key(scope)).cloned().unwrap_or_default())
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
        _request_id: Option<&RequestId>,
    ) -> Result<IncidentDecision, StoreError> {
        let mut incidents = self.active_incidents.lock().expect("lock poisoned");
        let key = scope_key(scope);
        let active = incidents.get(key).cloned();
        let decision = decide_incident_action(classified_items, new_severity, active.as_ref(), now);
        let cooldown_until = now + time::Duration::minutes(i64::from(cooldown_minutes));

        match decision {
            IncidentDecision::SkipSev4OrEmpty | IncidentDecision::Deduped => {}
            IncidentDecision::Created => {
                let incident = Incident {
                    id: IncidentId::new(uuid::Uuid::new_v4().to_string()),
                    scope,
                    status: IncidentStatus::Open,
                    severity: new_severity,
                    risk_score,
                    classified_items,
                    owner_user_id: None,
                    sla_due_at: now + new_severity.sla_duration(),
                    cooldown_until,
                    signal_version: signal_version.to_string(),
                    payload,
                    created_at: now,
                    updated_at: now,
                    resolved_at: None,
                };
                self.inserted.lock().expect("lock poisoned").push(incident.clone());
                incidents.insert(key, incident);
            }
            IncidentDecision::Escalated => {
                if let Some(mut incident) = active {
                    self.escalated.lock().expect("lock poisoned").push((incident.id.clone(), new_severity, payload.clone()));
                    incident.severity = new_severity;
                    incident.risk_score = risk_score;
                    incident.classified_items = classified_items;
                    incident.cooldown_until = cooldown_until;
                    incident.payload = payload;
                    incident.sla_due_at = now + new_severity.sla_duration();
                    incident.updated_at = now;
                    incident.resolved_at = None;
                    incidents.insert(key, incident);
                }
            }
            IncidentDecision::Refreshed => {
                if let Some(mut incident) = active {
                    self.refreshed.lock().expect("lock poisoned").push((
                        incident.id.clone(),
                        risk_score,
                        classified_items,
                        cooldown_until,
                        payload.clone(),
                    ));
                    incident.risk_score = risk_score;
                    incident.classified_items = classified_items;
                    incident.cooldown_until = cooldown_until;
                    incident.payload = payload;
                    incident.updated_at = now;
                    incidents.insert(key, incident);
                }
            }
        }

        Ok(decision)
    }
    async fn start_incident_evaluation_run(&self, _trigger_type: TriggerType, _request_id: Option<&RequestId>, _now: OffsetDateTime) -> Result<IncidentEvaluationRunId, StoreError> {
        Ok(IncidentEvaluationRunId::new("11111111-1111-1111-1111-111111111111"))
    }
    async fn finish_incident_evaluation_run(&self, _id: &IncidentEvaluationRunId, _metrics: Value, _error_message: Option<String>, _now: OffsetDateTime) -> Result<(), StoreError> {
        Ok(())
    }

    async fn claim_report_run(&self, _id: &ReportRunId, _now: OffsetDateTime) -> Result<Option<ReportRun>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn load_report_template(&self, _id: &ReportRunId) -> Result<(ReportTemplate, Option<ReportSchedule>), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn aggregate_monitor_kpis(&self, _filters: &Value) -> Result<Value, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn list_active_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn list_top_content(&self, _filters: &Value, _limit: u32) -> Result<Vec<ContentItem>, StoreError> {
        unreachable!("not primed for this test")
    }
    async fn create_export_job(&self, _payload: Value, _user_id: Option<&UserId>, _request_id: Option<&RequestId>) -> Result<ExportJobId, StoreError> {
        unreachable!("not primed for this test")
    }
    #[allow(clippy::too_many_arguments)]
    async fn finish_report_run(&self, _id: &ReportRunId, _status: ReportRunStatus, _confidence: Option<f64>, _error_message: Option<String>, _recommendations: Vec<String>, _rendered_summary: Option<String>, _export_job_id: Option<ExportJobId>, _now: OffsetDateTime) -> Result<(), StoreError> {
        unreachable!("not primed for this test")
    }
    async fn enqueue_due_report_schedules(&self, _now: OffsetDateTime) -> Result<Vec<ReportRunId>, StoreError> {
        unreachable!("not primed for this test")
    }

    async fn append_audit_log(&self, _action: &'static str, _entity_type: &'static str, _entity_id: &str, _user_id: Option<&UserId>, _request_id: Option<&RequestId>, _before: Option<Value>, _after: Value, _now: OffsetDateTime) -> Result<(), StoreError> {
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
