// media-incident/src/evaluator.rs
// ============================================================================
// Module: Incident Evaluator
// Description: Runs one evaluator pass across both scopes end to end
//              (§4.5 Evaluation run record).
// Purpose: The single entry point the scheduler/CLI invokes.
// Dependencies: media-core, serde_json, time
// ============================================================================

//! ## Overview
//! [`run_evaluation`] starts a `running` evaluation-run record, scans and
//! aggregates the classified window for each [`Scope`], applies
//! [`crate::state_machine::apply_scope`], and writes the completed metrics
//! (or a truncated failure) back to the run record. Everything it reports
//! also goes through [`EventSink`], matching the rest of this workspace's
//! workers.

use media_core::EventSink;
use media_core::StoreError;
use media_core::core::identifiers::RequestId;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::Scope;
use media_core::core::ingestion::TriggerType;
use media_core::interfaces::Store;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;

use crate::aggregate::aggregate_scope;
use crate::state_machine::Decision;
use crate::state_machine::apply_scope;

/// Truncation budget applied to the evaluation run's error message.
const MAX_ERROR_MESSAGE_LEN: usize = 1000;

/// Parameters for one evaluator pass, sourced from configuration.
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    /// Minutes a scope stays in cooldown after a write, clamped to `[1,1440]`.
    pub cooldown_minutes: u32,
    /// Version tag stamped onto every incident payload this pass produces.
    pub signal_version: String,
    /// Start of the rolling classified-content window.
    pub window_start: OffsetDateTime,
}

/// Errors aborting a pass before it reaches a terminal run state.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs one evaluator pass across both scopes.
///
/// # Errors
/// Returns [`EvaluatorError`] only when starting or finishing the run record
/// itself fails; a failure mid-scan is instead recorded on the run as
/// `failed` and this function returns `Ok`.
pub async fn run_evaluation(
    store: &dyn Store,
    events: &dyn EventSink,
    trigger_type: TriggerType,
    request_id: Option<&RequestId>,
    settings: &EvaluatorSettings,
) -> Result<(), EvaluatorError> {
    let started_at = OffsetDateTime::now_utc();
    let run_id = store.start_incident_evaluation_run(trigger_type, request_id, started_at).await?;
    events.emit(&json!({"event": "incident_evaluation.started", "runId": run_id.as_str()}));

    match evaluate_scopes(store, events, settings, request_id).await {
        Ok(metrics) => {
            let finished_at = OffsetDateTime::now_utc();
            store.finish_incident_evaluation_run(&run_id, metrics, None, finished_at).await?;
            events.emit(&json!({"event": "incident_evaluation.completed", "runId": run_id.as_str()}));
        }
        Err(err) => {
            let finished_at = OffsetDateTime::now_utc();
            let mut message = err.to_string();
            message.truncate(MAX_ERROR_MESSAGE_LEN);
            store.finish_incident_evaluation_run(&run_id, json!({}), Some(message), finished_at).await?;
            events.emit(&json!({"event": "incident_evaluation.failed", "runId": run_id.as_str()}));
        }
    }

    Ok(())
}

async fn evaluate_scopes(
    store: &dyn Store,
    events: &dyn EventSink,
    settings: &EvaluatorSettings,
    request_id: Option<&RequestId>,
) -> Result<Value, StoreError> {
    let mut created_count: u32 = 0;
    let mut escalated_count: u32 = 0;
    let mut deduped_count: u32 = 0;
    let mut skipped_sev4_count: u32 = 0;
    let mut per_scope = serde_json::Map::new();

    for scope in Scope::ALL {
        let entries = store.load_classified_window(scope, settings.window_start).await?;
        let signal = aggregate_scope(&entries);
        let new_severity = IncidentSeverity::from_risk_weighted(signal.risk_weighted());

        let decision = apply_scope(
            store,
            scope,
            &signal,
            new_severity,
            settings.cooldown_minutes,
            &settings.signal_version,
            OffsetDateTime::now_utc(),
            request_id,
        )
        .await?;

        match decision {
            Decision::Created => created_count += 1,
            Decision::Escalated => escalated_count += 1,
            Decision::Deduped => deduped_count += 1,
            Decision::SkipSev4OrEmpty => skipped_sev4_count += 1,
            Decision::Refreshed => {}
        }

        events.emit(&json!({
            "event": "incident_evaluation.scope_evaluated",
            "scope": scope,
            "decision": format!("{decision:?}"),
            "riskWeighted": signal.risk_weighted(),
        }));

        per_scope.insert(
            scope_key(scope).to_string(),
            json!({
                "classifiedItems": signal.classified_items,
                "classifiedWeight": signal.classified_weight,
                "negativeWeight": signal.negative_weight,
                "riskWeighted": signal.risk_weighted(),
                "severity": new_severity,
                "decision": format!("{decision:?}"),
            }),
        );
    }

    Ok(json!({
        "createdCount": created_count,
        "escalatedCount": escalated_count,
        "dedupedCount": deduped_count,
        "skippedSev4Count": skipped_sev4_count,
        "cooldownMinutes": settings.cooldown_minutes,
        "signalVersion": settings.signal_version,
        "scopes": Value::Object(per_scope),
    }))
}

/// Snake-case key for a scope, used in emitted events.
fn scope_key(scope: Scope) -> &'static str {
    match scope {
        Scope::Claro => "claro",
        Scope::Competencia => "competencia",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::run_evaluation;
    use super::EvaluatorSettings;
    use crate::test_support::FakeStore;
    use media_core::core::content::Classification;
    use media_core::core::content::Sentimiento;
    use media_core::core::identifiers::ClassificationId;
    use media_core::core::incident::Scope;
    use media_core::core::ingestion::TriggerType;
    use media_core::interfaces::ClassifiedWindowEntry;
    use media_core::interfaces::NullEventSink;
    use time::OffsetDateTime;

    fn classification(sentimiento: Sentimiento) -> Classification {
        let now = OffsetDateTime::from_unix_timestamp(0).unwrap();
        Classification {
            id: ClassificationId::new("11111111-1111-1111-1111-111111111111"),
            content_item_id: "c1".into(),
            prompt_version: "classification-v1".to_string(),
            model_id: "anthropic.claude".to_string(),
            categoria: "outage".to_string(),
            sentimiento,
            etiquetas: vec![],
            confianza: 0.9,
            resumen: None,
            is_override: false,
            overridden_by_user_id: None,
            override_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn negative_entry(id: &str) -> ClassifiedWindowEntry {
        ClassifiedWindowEntry {
            content_item_id: id.into(),
            provider: "reuters".to_string(),
            source_name: None,
            source_score: Some(1.0),
            classification: Some(classification(Sentimiento::Negativo)),
        }
    }

    #[tokio::test]
    async fn a_clean_window_creates_no_incidents_and_still_completes() {
        let store = FakeStore::default();
        let settings = EvaluatorSettings {
            cooldown_minutes: 60,
            signal_version: "alert-v1-weighted".to_string(),
            window_start: OffsetDateTime::from_unix_timestamp(0).unwrap(),
        };
        let result = run_evaluation(&store, &NullEventSink, TriggerType::Scheduled, None, &settings).await;
        assert!(result.is_ok());
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_fully_negative_window_creates_a_sev1_incident() {
        let store = FakeStore::default().with_window(Scope::Claro, vec![negative_entry("c1")]);
        let settings = EvaluatorSettings {
            cooldown_minutes: 60,
            signal_version: "alert-v1-weighted".to_string(),
            window_start: OffsetDateTime::from_unix_timestamp(0).unwrap(),
        };
        run_evaluation(&store, &NullEventSink, TriggerType::Scheduled, None, &settings).await.unwrap();
        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].scope, Scope::Claro);
    }
}
