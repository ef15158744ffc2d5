// media-store/src/report_store.rs
// ============================================================================
// Module: Report Store Methods
// Description: Run claim, KPI aggregation, top-content listing, export job
//              creation, terminal writes, and schedule-slot enqueueing.
// Purpose: Back the Report Worker.
// Dependencies: media-core, postgres, time
// ============================================================================

use media_core::StoreError;
use media_core::core::content::ContentItem;
use media_core::core::identifiers::ExportJobId;
use media_core::core::identifiers::ReportRunId;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::UserId;
use media_core::core::incident::Incident;
use media_core::core::incident::IncidentStatus;
use media_core::core::report::ReportRun;
use media_core::core::report::ReportRunStatus;
use media_core::core::report::ReportSchedule;
use media_core::core::report::ReportTemplate;
use postgres::types::ToSql;
use serde_json::Value;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;
use crate::mapping::CONTENT_ITEM_COLUMNS;
use crate::mapping::INCIDENT_COLUMNS;
use crate::mapping::REPORT_RUN_COLUMNS;
use crate::mapping::REPORT_SCHEDULE_COLUMNS;
use crate::mapping::REPORT_TEMPLATE_COLUMNS;
use crate::mapping::enum_to_text;
use crate::mapping::row_to_content_item;
use crate::mapping::row_to_incident;
use crate::mapping::row_to_report_run;
use crate::mapping::row_to_report_schedule;
use crate::mapping::row_to_report_template;

/// Known content-item filter fields, matching `EXPORT_FILTER_FIELDS` minus
/// the full-text `q` field, which this store maps onto a `title ILIKE` scan.
fn push_content_filters(
    filters: &Value,
    params: &mut Vec<Box<dyn ToSql + Sync>>,
) -> Result<Vec<String>, StoreError> {
    let mut conditions = Vec::new();
    let mut push_text = |column: &str, conditions: &mut Vec<String>| {
        if let Some(value) = filters.get(column).and_then(Value::as_str) {
            params.push(Box::new(value.to_string()));
            conditions.push(format!("{column} = ${}", params.len()));
        }
    };
    push_text("source_type", &mut conditions);
    push_text("state", &mut conditions);
    push_text("provider", &mut conditions);
    push_text("category", &mut conditions);
    push_text("sentimiento", &mut conditions);
    push_text("term_id", &mut conditions);
    if let Some(value) = filters.get("q").and_then(Value::as_str) {
        params.push(Box::new(format!("%{value}%")));
        conditions.push(format!("title ILIKE ${}", params.len()));
    }
    if let Some(value) = filters.get("from").and_then(Value::as_str) {
        let parsed = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
            .map_err(|err| StoreError::Internal(format!("invalid from filter: {err}")))?;
        params.push(Box::new(parsed));
        conditions.push(format!("COALESCE(published_at, created_at) >= ${}", params.len()));
    }
    if let Some(value) = filters.get("to").and_then(Value::as_str) {
        let parsed = OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339)
            .map_err(|err| StoreError::Internal(format!("invalid to filter: {err}")))?;
        params.push(Box::new(parsed));
        conditions.push(format!("COALESCE(published_at, created_at) <= ${}", params.len()));
    }
    Ok(conditions)
}

impl PostgresStore {
    pub(crate) async fn claim_report_run_impl(
        &self,
        id: &ReportRunId,
        now: OffsetDateTime,
    ) -> Result<Option<ReportRun>, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let status_text = enum_to_text(&ReportRunStatus::Running)?;
            let queued_text = enum_to_text(&ReportRunStatus::Queued)?;
            let sql = format!(
                "UPDATE report_runs SET status = $2, started_at = $3 WHERE id = $1 AND \
                 status = $4 RETURNING {REPORT_RUN_COLUMNS}"
            );
            let claimed = tx
                .query_opt(&sql, &[&id, &status_text, &now, &queued_text])
                .map_err(map_pg_err)?
                .as_ref()
                .map(row_to_report_run)
                .transpose()?;
            if claimed.is_some() {
                crate::audit_store::insert_audit_log_tx(
                    &mut tx,
                    &uuid::Uuid::new_v4().to_string(),
                    None,
                    "report_run_claimed",
                    "report_run",
                    &id,
                    None,
                    None,
                    serde_json::json!({"status": status_text}),
                    now,
                )?;
            }
            tx.commit().map_err(map_pg_err)?;
            Ok(claimed)
        })
        .await
    }

    pub(crate) async fn load_report_template_impl(
        &self,
        id: &ReportRunId,
    ) -> Result<(ReportTemplate, Option<ReportSchedule>), StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let run_row = conn
                .query_opt("SELECT template_id, schedule_id FROM report_runs WHERE id = $1", &[&id])
                .map_err(map_pg_err)?
                .ok_or_else(|| StoreError::NotFound(format!("report run {id}")))?;
            let template_id: String = run_row.get(0);
            let schedule_id: Option<String> = run_row.get(1);
            let template_sql =
                format!("SELECT {REPORT_TEMPLATE_COLUMNS} FROM report_templates WHERE id = $1");
            let template_row = conn
                .query_opt(&template_sql, &[&template_id])
                .map_err(map_pg_err)?
                .ok_or_else(|| StoreError::NotFound(format!("report template {template_id}")))?;
            let template = row_to_report_template(&template_row)?;
            let schedule = schedule_id
                .map(|schedule_id| -> Result<ReportSchedule, StoreError> {
                    let schedule_sql = format!(
                        "SELECT {REPORT_SCHEDULE_COLUMNS} FROM report_schedules WHERE id = $1"
                    );
                    let row = conn
                        .query_opt(&schedule_sql, &[&schedule_id])
                        .map_err(map_pg_err)?
                        .ok_or_else(|| StoreError::NotFound(format!("report schedule {schedule_id}")))?;
                    row_to_report_schedule(&row)
                })
                .transpose()?;
            Ok((template, schedule))
        })
        .await
    }

    pub(crate) async fn aggregate_monitor_kpis_impl(&self, filters: &Value) -> Result<Value, StoreError> {
        let filters = filters.clone();
        self.with_conn(move |conn| {
            let window_start = OffsetDateTime::now_utc() - time::Duration::days(7);
            let mut params: Vec<Box<dyn ToSql + Sync>> = vec![Box::new(window_start)];
            let mut conditions = push_content_filters(&filters, &mut params)?;
            conditions.insert(0, "COALESCE(published_at, created_at) >= $1".to_string());
            let where_clause = conditions.join(" AND ");
            let refs: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|boxed| boxed.as_ref()).collect();
            let total_sql = format!("SELECT COUNT(*) FROM content_items WHERE {where_clause}");
            let total: i64 = conn.query_one(&total_sql, &refs).map_err(map_pg_err)?.get(0);
            let sentiment_sql = format!(
                "SELECT sentimiento, COUNT(*) FROM content_items WHERE {where_clause} AND \
                 sentimiento IS NOT NULL GROUP BY sentimiento"
            );
            let sentiment_rows = conn.query(&sentiment_sql, &refs).map_err(map_pg_err)?;
            let by_sentimiento: serde_json::Map<String, Value> = sentiment_rows
                .iter()
                .map(|row| {
                    let label: String = row.get(0);
                    let count: i64 = row.get(1);
                    (label, Value::from(count))
                })
                .collect();
            let category_sql = format!(
                "SELECT categoria, COUNT(*) FROM content_items WHERE {where_clause} AND \
                 categoria IS NOT NULL GROUP BY categoria ORDER BY COUNT(*) DESC LIMIT 10"
            );
            let category_rows = conn.query(&category_sql, &refs).map_err(map_pg_err)?;
            let by_categoria: Vec<Value> = category_rows
                .iter()
                .map(|row| {
                    let label: String = row.get(0);
                    let count: i64 = row.get(1);
                    serde_json::json!({"categoria": label, "count": count})
                })
                .collect();
            let classified: i64 = by_sentimiento.values().filter_map(Value::as_i64).sum();
            let scope_sql = format!(
                "SELECT COALESCE(tq.scope, ci.metadata_json ->> 'scope') AS scope, \
                 COUNT(*) FROM content_items ci LEFT JOIN tracked_queries tq ON ci.term_id = \
                 tq.id WHERE {where_clause} GROUP BY scope"
            );
            let scope_rows = conn.query(&scope_sql, &refs).map_err(map_pg_err)?;
            let by_scope: serde_json::Map<String, Value> = scope_rows
                .iter()
                .filter_map(|row| {
                    let scope: Option<String> = row.get(0);
                    let count: i64 = row.get(1);
                    scope.map(|scope| (scope, Value::from(count)))
                })
                .collect();
            Ok(serde_json::json!({
                "windowStart": window_start,
                "totalContentItems": total,
                "classifiedItems": classified,
                "bySentimiento": by_sentimiento,
                "byScope": by_scope,
                "topCategorias": by_categoria,
            }))
        })
        .await
    }

    pub(crate) async fn list_active_incidents_impl(&self) -> Result<Vec<Incident>, StoreError> {
        self.with_conn(move |conn| {
            let active_statuses: Vec<String> =
                IncidentStatus::ACTIVE.iter().map(enum_to_text).collect::<Result<_, _>>()?;
            let sql = format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE status = ANY($1) ORDER BY \
                 severity ASC, updated_at DESC"
            );
            conn.query(&sql, &[&active_statuses]).map_err(map_pg_err)?.iter().map(row_to_incident).collect()
        })
        .await
    }

    pub(crate) async fn list_top_content_impl(
        &self,
        filters: &Value,
        limit: u32,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let filters = filters.clone();
        let limit = i64::from(limit);
        self.with_conn(move |conn| {
            let mut params: Vec<Box<dyn ToSql + Sync>> = Vec::new();
            let conditions = push_content_filters(&filters, &mut params)?;
            let where_clause =
                if conditions.is_empty() { "TRUE".to_string() } else { conditions.join(" AND ") };
            params.push(Box::new(limit));
            let limit_index = params.len();
            let refs: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|boxed| boxed.as_ref()).collect();
            let sql = format!(
                "SELECT {CONTENT_ITEM_COLUMNS} FROM content_items WHERE {where_clause} ORDER \
                 BY COALESCE(published_at, created_at) DESC LIMIT ${limit_index}"
            );
            conn.query(&sql, &refs).map_err(map_pg_err)?.iter().map(row_to_content_item).collect()
        })
        .await
    }

    pub(crate) async fn create_export_job_impl(
        &self,
        filters: Value,
        requested_by_user_id: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<ExportJobId, StoreError> {
        let requested_by = requested_by_user_id.map(|value| value.as_str().to_string());
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let id = uuid::Uuid::new_v4().to_string();
            let status_text = enum_to_text(&media_core::core::report::ExportJobStatus::Queued)?;
            tx.execute(
                "INSERT INTO export_jobs (id, filters_json, status, row_count, s3_key, \
                 requested_by_user_id) VALUES ($1, $2, $3, NULL, NULL, $4)",
                &[&id, &filters, &status_text, &requested_by],
            )
            .map_err(map_pg_err)?;
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                requested_by.as_deref(),
                "export_job_created",
                "export_job",
                &id,
                request_id.as_deref(),
                None,
                filters.clone(),
                OffsetDateTime::now_utc(),
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(ExportJobId::from(id))
        })
        .await
    }

    #[allow(clippy::too_many_arguments, reason = "mirrors the trait's finish_report_run signature")]
    pub(crate) async fn finish_report_run_impl(
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
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let status_text = enum_to_text(&status)?;
            let recommendations_json = serde_json::to_value(&recommendations)
                .map_err(|err| StoreError::Internal(err.to_string()))?;
            let export_job_id_str = export_job_id.as_ref().map(|value| value.as_str().to_string());
            tx.execute(
                "UPDATE report_runs SET status = $2, confidence = $3, summary = $4, \
                 recommendations_json = $5, blocked_reason = $6, export_job_id = $7, \
                 finished_at = $8 WHERE id = $1",
                &[
                    &id,
                    &status_text,
                    &confidence,
                    &summary,
                    &recommendations_json,
                    &blocked_reason,
                    &export_job_id_str,
                    &now,
                ],
            )
            .map_err(map_pg_err)?;
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                None,
                "report_run_finished",
                "report_run",
                &id,
                None,
                None,
                serde_json::json!({"status": status_text}),
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn enqueue_due_report_schedules_impl(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<ReportRunId>, StoreError> {
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let sql = format!(
                "SELECT {REPORT_SCHEDULE_COLUMNS} FROM report_schedules WHERE enabled AND \
                 next_run_at <= $1 FOR UPDATE"
            );
            let rows = tx.query(&sql, &[&now]).map_err(map_pg_err)?;
            let mut inserted = Vec::new();
            for row in &rows {
                let schedule = row_to_report_schedule(row)?;
                let slot = schedule
                    .next_run_at
                    .format(&time::format_description::well_known::Rfc3339)
                    .map_err(|err| StoreError::Internal(err.to_string()))?;
                let idempotency_key = format!("schedule:{}:{}", schedule.id, slot);
                let run_id = uuid::Uuid::new_v4().to_string();
                let queued_text = enum_to_text(&ReportRunStatus::Queued)?;
                let inserted_row = tx
                    .query_opt(
                        "INSERT INTO report_runs (id, template_id, schedule_id, status, \
                         confidence, summary, recommendations_json, blocked_reason, \
                         export_job_id, idempotency_key, request_id, requested_by_user_id, \
                         started_at, finished_at) VALUES ($1, $2, $3, $4, NULL, NULL, $5, \
                         NULL, NULL, $6, NULL, NULL, NULL, NULL) ON CONFLICT (idempotency_key) \
                         DO NOTHING RETURNING id",
                        &[
                            &run_id,
                            &schedule.template_id.as_str(),
                            &schedule.id.as_str(),
                            &queued_text,
                            &serde_json::json!([]),
                            &idempotency_key,
                        ],
                    )
                    .map_err(map_pg_err)?;
                if let Some(inserted_row) = inserted_row {
                    let id: String = inserted_row.get(0);
                    crate::audit_store::insert_audit_log_tx(
                        &mut tx,
                        &uuid::Uuid::new_v4().to_string(),
                        None,
                        "report_schedule_run_enqueued",
                        "report_run",
                        &id,
                        None,
                        None,
                        serde_json::json!({"scheduleId": schedule.id.as_str(), "slot": slot}),
                        now,
                    )?;
                    inserted.push(ReportRunId::from(id));
                }
                let next_run_at = crate::schedule_time::next_run_at(&schedule)?;
                tx.execute(
                    "UPDATE report_schedules SET next_run_at = $2, last_run_at = $3 WHERE id = \
                     $1",
                    &[&schedule.id.as_str(), &next_run_at, &schedule.next_run_at],
                )
                .map_err(map_pg_err)?;
            }
            tx.commit().map_err(map_pg_err)?;
            Ok(inserted)
        })
        .await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::push_content_filters;

    #[test]
    fn push_content_filters_binds_known_fields() {
        let filters = json!({"source_type": "news", "q": "storm"});
        let mut params = Vec::new();
        let conditions = push_content_filters(&filters, &mut params).unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn push_content_filters_ignores_unknown_fields() {
        let filters = json!({"nonsense": "value"});
        let mut params = Vec::new();
        let conditions = push_content_filters(&filters, &mut params).unwrap();
        assert!(conditions.is_empty());
        assert!(params.is_empty());
    }
}
