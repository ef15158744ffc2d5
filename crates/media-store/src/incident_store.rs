// media-store/src/incident_store.rs
// ============================================================================
// Module: Incident Store Methods
// Description: Classified-window scan, incident state-machine writes, and
//              evaluator-pass bookkeeping.
// Purpose: Back the Incident Evaluator.
// Dependencies: media-core, postgres
// ============================================================================

use media_core::StoreError;
use media_core::core::content::Classification;
use media_core::core::content::Sentimiento;
use media_core::core::identifiers::ClassificationId;
use media_core::core::identifiers::ContentItemId;
use media_core::core::identifiers::IncidentEvaluationRunId;
use media_core::core::identifiers::RequestId;
use media_core::core::incident::IncidentDecision;
use media_core::core::incident::IncidentEvaluationStatus;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::IncidentStatus;
use media_core::core::incident::Scope;
use media_core::core::ingestion::TriggerType;
use media_core::interfaces::ClassifiedWindowEntry;
use serde_json::Value;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;
use crate::mapping::INCIDENT_COLUMNS;
use crate::mapping::enum_to_text;
use crate::mapping::row_to_incident;

/// Maps one joined content/classification row to a [`ClassifiedWindowEntry`].
fn row_to_classified_window_entry(row: &postgres::Row) -> Result<ClassifiedWindowEntry, StoreError> {
    let classification_id: Option<String> = row.get("c_id");
    let classification = classification_id
        .map(|id| -> Result<Classification, StoreError> {
            let sentimiento_text: String = row.get("c_sentimiento");
            let etiquetas_json: Value = row.get("c_etiquetas_json");
            let overridden_by: Option<String> = row.get("c_overridden_by_user_id");
            Ok(Classification {
                id: ClassificationId::from(id),
                content_item_id: row.get::<_, String>("id").into(),
                prompt_version: row.get("c_prompt_version"),
                model_id: row.get("c_model_id"),
                categoria: row.get("c_categoria"),
                sentimiento: crate::mapping::enum_from_text::<Sentimiento>(&sentimiento_text)?,
                etiquetas: serde_json::from_value(etiquetas_json)
                    .map_err(|err| StoreError::Internal(err.to_string()))?,
                confianza: row.get("c_confianza"),
                resumen: row.get("c_resumen"),
                is_override: row.get("c_is_override"),
                overridden_by_user_id: overridden_by.map(Into::into),
                override_reason: row.get("c_override_reason"),
                created_at: row.get("c_created_at"),
                updated_at: row.get("c_updated_at"),
            })
        })
        .transpose()?;
    Ok(ClassifiedWindowEntry {
        content_item_id: row.get::<_, String>("id").into(),
        provider: row.get("provider"),
        source_name: row.get("source_name"),
        source_score: row.get("source_score"),
        classification,
    })
}

impl PostgresStore {
    pub(crate) async fn load_classified_window_impl(
        &self,
        scope: Scope,
        window_start: OffsetDateTime,
    ) -> Result<Vec<ClassifiedWindowEntry>, StoreError> {
        let scope_text = enum_to_text(&scope)?;
        self.with_conn(move |conn| {
            let rows = conn
                .query(
                    "SELECT ci.id, ci.provider, ci.source_name, ci.source_score, c.id AS \
                     c_id, c.prompt_version AS c_prompt_version, c.model_id AS c_model_id, \
                     c.categoria AS c_categoria, c.sentimiento AS c_sentimiento, \
                     c.etiquetas_json AS c_etiquetas_json, c.confianza AS c_confianza, \
                     c.resumen AS c_resumen, c.is_override AS c_is_override, \
                     c.overridden_by_user_id AS c_overridden_by_user_id, c.override_reason AS \
                     c_override_reason, c.created_at AS c_created_at, c.updated_at AS \
                     c_updated_at FROM content_items ci LEFT JOIN tracked_queries tq ON \
                     ci.term_id = tq.id LEFT JOIN LATERAL (SELECT * FROM classifications cl \
                     WHERE cl.content_item_id = ci.id ORDER BY cl.is_override DESC, \
                     cl.created_at DESC LIMIT 1) c ON true WHERE ci.source_type = 'news' AND \
                     ci.state = 'active' AND COALESCE(ci.published_at, ci.created_at) >= $2 \
                     AND (tq.scope = $1 OR (ci.term_id IS NULL AND ci.metadata_json ->> \
                     'scope' = $1))",
                    &[&scope_text, &window_start],
                )
                .map_err(map_pg_err)?;
            rows.iter().map(row_to_classified_window_entry).collect()
        })
        .await
    }

    /// Reads the scope's active incident under `FOR UPDATE`, decides the
    /// state-machine action, and applies the write, all in one transaction.
    #[allow(clippy::too_many_arguments, reason = "Mirrors the Store trait's own incident-decision inputs.")]
    pub(crate) async fn apply_incident_decision_impl(
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
        let scope_text = enum_to_text(&scope)?;
        let signal_version = signal_version.to_string();
        let request_id = request_id.map(|value| value.as_str().to_string());
        let cooldown_until = now + time::Duration::minutes(i64::from(cooldown_minutes));
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let active_statuses: Vec<String> = IncidentStatus::ACTIVE
                .iter()
                .map(enum_to_text)
                .collect::<Result<_, _>>()?;
            let select_sql = format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE scope = $1 AND status = \
                 ANY($2) ORDER BY updated_at DESC LIMIT 1 FOR UPDATE"
            );
            let active = tx
                .query_opt(&select_sql, &[&scope_text, &active_statuses])
                .map_err(map_pg_err)?
                .as_ref()
                .map(row_to_incident)
                .transpose()?;

            let decision = media_core::core::incident::decide_incident_action(
                classified_items,
                new_severity,
                active.as_ref(),
                now,
            );
            let classified_items_i32 = i32::try_from(classified_items).unwrap_or(i32::MAX);

            match decision {
                IncidentDecision::SkipSev4OrEmpty | IncidentDecision::Deduped => {
                    tx.commit().map_err(map_pg_err)?;
                }
                IncidentDecision::Created => {
                    let id = uuid::Uuid::new_v4().to_string();
                    let status_text = enum_to_text(&IncidentStatus::Open)?;
                    let severity_text = enum_to_text(&new_severity)?;
                    let sla_due_at = now + new_severity.sla_duration();
                    tx.execute(
                        "INSERT INTO incidents (id, scope, status, severity, risk_score, \
                         classified_items, owner_user_id, sla_due_at, cooldown_until, \
                         signal_version, payload_json, created_at, updated_at, resolved_at) \
                         VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $8, $9, $10, $11, $11, NULL)",
                        &[
                            &id,
                            &scope_text,
                            &status_text,
                            &severity_text,
                            &risk_score,
                            &classified_items_i32,
                            &sla_due_at,
                            &cooldown_until,
                            &signal_version,
                            &payload,
                            &now,
                        ],
                    )
                    .map_err(map_pg_err)?;
                    crate::audit_store::insert_audit_log_tx(
                        &mut tx,
                        &uuid::Uuid::new_v4().to_string(),
                        None,
                        "incident_created",
                        "incident",
                        &id,
                        request_id.as_deref(),
                        None,
                        serde_json::json!({"scope": scope_text, "severity": severity_text}),
                        now,
                    )?;
                    tx.commit().map_err(map_pg_err)?;
                }
                IncidentDecision::Escalated => {
                    let Some(active) = active else {
                        tx.commit().map_err(map_pg_err)?;
                        return Ok(IncidentDecision::SkipSev4OrEmpty);
                    };
                    let incident_id = active.id.as_str().to_string();
                    let severity_text = enum_to_text(&new_severity)?;
                    let sla_due_at = now + new_severity.sla_duration();
                    tx.execute(
                        "UPDATE incidents SET severity = $2, sla_due_at = $3, risk_score = \
                         $4, classified_items = $5, cooldown_until = $6, payload_json = $7, \
                         updated_at = $8, resolved_at = NULL WHERE id = $1",
                        &[
                            &incident_id,
                            &severity_text,
                            &sla_due_at,
                            &risk_score,
                            &classified_items_i32,
                            &cooldown_until,
                            &payload,
                            &now,
                        ],
                    )
                    .map_err(map_pg_err)?;
                    crate::audit_store::insert_audit_log_tx(
                        &mut tx,
                        &uuid::Uuid::new_v4().to_string(),
                        None,
                        "incident_auto_escalated",
                        "incident",
                        &incident_id,
                        request_id.as_deref(),
                        None,
                        serde_json::json!({"newSeverity": severity_text}),
                        now,
                    )?;
                    tx.commit().map_err(map_pg_err)?;
                }
                IncidentDecision::Refreshed => {
                    let Some(active) = active else {
                        tx.commit().map_err(map_pg_err)?;
                        return Ok(IncidentDecision::SkipSev4OrEmpty);
                    };
                    let incident_id = active.id.as_str().to_string();
                    tx.execute(
                        "UPDATE incidents SET risk_score = $2, classified_items = $3, \
                         cooldown_until = $4, payload_json = $5, updated_at = $6 WHERE id = $1",
                        &[&incident_id, &risk_score, &classified_items_i32, &cooldown_until, &payload, &now],
                    )
                    .map_err(map_pg_err)?;
                    tx.commit().map_err(map_pg_err)?;
                }
            }

            Ok(decision)
        })
        .await
    }

    pub(crate) async fn start_incident_evaluation_run_impl(
        &self,
        trigger_type: TriggerType,
        request_id: Option<&RequestId>,
        now: OffsetDateTime,
    ) -> Result<IncidentEvaluationRunId, StoreError> {
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let trigger_text = enum_to_text(&trigger_type)?;
            let status_text = enum_to_text(&IncidentEvaluationStatus::Running)?;
            conn.execute(
                "INSERT INTO incident_evaluation_runs (id, trigger_type, request_id, status, \
                 metrics_json, error_message, started_at, finished_at) VALUES ($1, $2, $3, \
                 $4, $5, NULL, $6, NULL)",
                &[&id, &trigger_text, &request_id, &status_text, &serde_json::json!({}), &now],
            )
            .map_err(map_pg_err)?;
            Ok(IncidentEvaluationRunId::from(id))
        })
        .await
    }

    pub(crate) async fn finish_incident_evaluation_run_impl(
        &self,
        id: &IncidentEvaluationRunId,
        metrics: Value,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let id = id.as_str().to_string();
        let truncated_error = error_message.map(|message| crate::truncate_error_message(&message));
        self.with_conn(move |conn| {
            let status = if truncated_error.is_some() {
                IncidentEvaluationStatus::Failed
            } else {
                IncidentEvaluationStatus::Completed
            };
            let status_text = enum_to_text(&status)?;
            conn.execute(
                "UPDATE incident_evaluation_runs SET status = $2, metrics_json = $3, \
                 error_message = $4, finished_at = $5 WHERE id = $1",
                &[&id, &status_text, &metrics, &truncated_error, &now],
            )
            .map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use media_core::core::incident::Scope;

    use crate::mapping::enum_to_text;

    #[test]
    fn scope_round_trips_through_enum_to_text() {
        assert_eq!(enum_to_text(&Scope::Claro).unwrap(), "claro");
        assert_eq!(enum_to_text(&Scope::Competencia).unwrap(), "competencia");
    }
}
