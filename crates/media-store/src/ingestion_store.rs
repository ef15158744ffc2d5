// media-store/src/ingestion_store.rs
// ============================================================================
// Module: Ingestion Store Methods
// Description: Run claim/reclaim, content-item upsert, run item/link writes.
// Purpose: Back the Ingestion Worker's persistence ordering (§4.3).
// Dependencies: media-core, postgres, uuid
// ============================================================================

use media_core::StoreError;
use media_core::interfaces::ContentItemUpsert;
use media_core::interfaces::ContentItemUpsertOutcome;
use media_core::interfaces::RunClaim;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::RunId;
use media_core::core::ingestion::IngestionRun;
use media_core::core::ingestion::IngestionRunContentLink;
use media_core::core::ingestion::IngestionRunItem;
use media_core::core::ingestion::RunStatus;
use media_core::core::ingestion::TriggerType;
use serde_json::Value;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;
use crate::mapping::INGESTION_RUN_COLUMNS;
use crate::mapping::enum_to_text;
use crate::mapping::row_to_ingestion_run;
use crate::truncate_error_message;

impl PostgresStore {
    #[allow(clippy::too_many_arguments, reason = "mirrors the trait's claim_ingestion_run signature")]
    pub(crate) async fn claim_ingestion_run_impl(
        &self,
        run_id: &RunId,
        trigger_type: TriggerType,
        language: Option<&str>,
        effective_max_articles_per_term: u32,
        request_id: Option<&RequestId>,
        now: OffsetDateTime,
    ) -> Result<RunClaim, StoreError> {
        let run_id = run_id.as_str().to_string();
        let language = language.map(str::to_string);
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let select_sql =
                format!("SELECT {INGESTION_RUN_COLUMNS} FROM ingestion_runs WHERE id = $1 FOR UPDATE");
            let existing = tx.query_opt(&select_sql, &[&run_id]).map_err(map_pg_err)?;
            if let Some(row) = existing {
                let current = row_to_ingestion_run(&row)?;
                if matches!(current.status, RunStatus::Completed) {
                    tx.commit().map_err(map_pg_err)?;
                    return Ok(RunClaim::SkippedAlreadyCompleted);
                }
                if matches!(current.status, RunStatus::Running) && !current.is_stale(now) {
                    tx.commit().map_err(map_pg_err)?;
                    return Ok(RunClaim::SkippedAlreadyRunning);
                }
                let status_text = enum_to_text(&RunStatus::Running)?;
                tx.execute(
                    "UPDATE ingestion_runs SET status = $2, started_at = $3, finished_at = \
                     NULL, error_message = NULL WHERE id = $1",
                    &[&run_id, &status_text, &now],
                )
                .map_err(map_pg_err)?;
                let mut reclaimed = current;
                reclaimed.status = RunStatus::Running;
                reclaimed.started_at = now;
                reclaimed.finished_at = None;
                reclaimed.error_message = None;
                crate::audit_store::insert_audit_log_tx(
                    &mut tx,
                    &uuid::Uuid::new_v4().to_string(),
                    None,
                    "ingestion_run_reclaimed",
                    "ingestion_run",
                    &run_id,
                    request_id.as_deref(),
                    None,
                    serde_json::json!({"runId": run_id}),
                    now,
                )?;
                tx.commit().map_err(map_pg_err)?;
                return Ok(RunClaim::Proceed(reclaimed));
            }
            let trigger_text = enum_to_text(&trigger_type)?;
            let status_text = enum_to_text(&RunStatus::Running)?;
            tx.execute(
                "INSERT INTO ingestion_runs (id, status, trigger_type, language, \
                 effective_max_articles_per_term, request_id, started_at, finished_at, \
                 metrics_json, error_message) VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, \
                 NULL)",
                &[
                    &run_id,
                    &status_text,
                    &trigger_text,
                    &language,
                    &i32::try_from(effective_max_articles_per_term).unwrap_or(i32::MAX),
                    &request_id,
                    &now,
                    &serde_json::json!({}),
                ],
            )
            .map_err(map_pg_err)?;
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                None,
                "ingestion_run_claimed",
                "ingestion_run",
                &run_id,
                request_id.as_deref(),
                None,
                serde_json::json!({"runId": run_id}),
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(RunClaim::Proceed(IngestionRun {
                id: run_id.clone().into(),
                status: RunStatus::Running,
                trigger_type,
                language: language.clone(),
                effective_max_articles_per_term,
                request_id: request_id.clone().map(Into::into),
                started_at: now,
                finished_at: None,
                metrics: serde_json::json!({}),
                error_message: None,
            }))
        })
        .await
    }

    pub(crate) async fn upsert_content_item_impl(
        &self,
        upsert: &ContentItemUpsert,
        request_id: Option<&RequestId>,
    ) -> Result<ContentItemUpsertOutcome, StoreError> {
        let upsert = upsert.clone();
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let id = uuid::Uuid::new_v4().to_string();
            let now = OffsetDateTime::now_utc();
            let source_type_text = enum_to_text(&upsert.source_type)?;
            let term_id = upsert.term_id.as_ref().map(|value| value.as_str().to_string());
            let row = tx
                .query_one(
                    "INSERT INTO content_items (id, canonical_url, source_type, term_id, \
                     provider, source_name, source_id, title, summary, content, image_url, \
                     language, category, published_at, source_score, raw_payload_s3_key, \
                     state, categoria, sentimiento, metadata_json, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, 'active', NULL, NULL, $17, $18, $18) ON CONFLICT (canonical_url) DO \
                     UPDATE SET term_id = COALESCE(content_items.term_id, EXCLUDED.term_id), \
                     updated_at = $18 RETURNING id, (xmax = 0) AS newly_inserted",
                    &[
                        &id,
                        &upsert.canonical_url,
                        &source_type_text,
                        &term_id,
                        &upsert.provider,
                        &upsert.source_name,
                        &upsert.source_id,
                        &upsert.title,
                        &upsert.summary,
                        &upsert.content,
                        &upsert.image_url,
                        &upsert.language,
                        &upsert.category,
                        &upsert.published_at,
                        &upsert.source_score,
                        &upsert.raw_payload_s3_key,
                        &upsert.metadata,
                        &now,
                    ],
                )
                .map_err(map_pg_err)?;
            let content_item_id: String = row.get(0);
            let newly_inserted: bool = row.get(1);
            if newly_inserted {
                crate::audit_store::insert_audit_log_tx(
                    &mut tx,
                    &uuid::Uuid::new_v4().to_string(),
                    None,
                    "content_item_ingested",
                    "content_item",
                    &content_item_id,
                    request_id.as_deref(),
                    None,
                    serde_json::json!({"canonicalUrl": upsert.canonical_url}),
                    now,
                )?;
            }
            tx.commit().map_err(map_pg_err)?;
            Ok(ContentItemUpsertOutcome {
                content_item_id: content_item_id.into(),
                newly_inserted,
            })
        })
        .await
    }

    pub(crate) async fn insert_run_content_links_impl(
        &self,
        links: &[IngestionRunContentLink],
    ) -> Result<(), StoreError> {
        let links = links.to_vec();
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            for link in &links {
                tx.execute(
                    "INSERT INTO ingestion_run_content_links (run_id, content_item_id, \
                     canonical_url, provider, term_id) VALUES ($1, $2, $3, $4, $5) ON \
                     CONFLICT (run_id, content_item_id) DO NOTHING",
                    &[
                        &link.run_id.as_str(),
                        &link.content_item_id.as_str(),
                        &link.canonical_url,
                        &link.provider,
                        &link.term_id.as_str(),
                    ],
                )
                .map_err(map_pg_err)?;
            }
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn replace_run_items_impl(
        &self,
        run_id: &RunId,
        items: &[IngestionRunItem],
    ) -> Result<(), StoreError> {
        let run_id_str = run_id.as_str().to_string();
        let items = items.to_vec();
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            tx.execute("DELETE FROM ingestion_run_items WHERE run_id = $1", &[&run_id_str])
                .map_err(map_pg_err)?;
            for item in &items {
                let status_text = enum_to_text(&item.status)?;
                tx.execute(
                    "INSERT INTO ingestion_run_items (run_id, provider, term, fetched_count, \
                     persisted_count, latency_ms, status, error_message) VALUES ($1, $2, $3, \
                     $4, $5, $6, $7, $8)",
                    &[
                        &run_id_str,
                        &item.provider,
                        &item.term,
                        &i32::try_from(item.fetched_count).unwrap_or(i32::MAX),
                        &i32::try_from(item.persisted_count).unwrap_or(i32::MAX),
                        &i64::try_from(item.latency_ms).unwrap_or(i64::MAX),
                        &status_text,
                        &item.error_message,
                    ],
                )
                .map_err(map_pg_err)?;
            }
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn finish_ingestion_run_impl(
        &self,
        run_id: &RunId,
        metrics: Value,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let run_id_str = run_id.as_str().to_string();
        let truncated_error = error_message.map(|message| truncate_error_message(&message));
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let status = if truncated_error.is_some() { RunStatus::Failed } else { RunStatus::Completed };
            let status_text = enum_to_text(&status)?;
            tx.execute(
                "UPDATE ingestion_runs SET status = $2, finished_at = $3, metrics_json = $4, \
                 error_message = $5 WHERE id = $1",
                &[&run_id_str, &status_text, &now, &metrics, &truncated_error],
            )
            .map_err(map_pg_err)?;
            let action: &'static str =
                if truncated_error.is_some() { "ingestion_run_failed" } else { "ingestion_run_completed" };
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                None,
                action,
                "ingestion_run",
                &run_id_str,
                None,
                None,
                metrics.clone(),
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }
}
