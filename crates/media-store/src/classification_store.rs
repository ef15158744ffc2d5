// media-store/src/classification_store.rs
// ============================================================================
// Module: Classification Store Methods
// Description: Pending-target selection, override lookup, auto-classification
//              upsert, and the content-item projection it maintains.
// Purpose: Back the Classification Scheduler and Worker.
// Dependencies: media-core, postgres
// ============================================================================

use media_core::core::content::Classification;
use media_core::core::content::ContentItem;
use media_core::core::identifiers::ClassificationId;
use media_core::core::identifiers::ContentItemId;
use media_core::core::identifiers::RequestId;
use media_core::StoreError;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;
use crate::mapping::CLASSIFICATION_COLUMNS;
use crate::mapping::CONTENT_ITEM_COLUMNS;
use crate::mapping::enum_to_text;
use crate::mapping::row_to_classification;
use crate::mapping::row_to_content_item;

impl PostgresStore {
    pub(crate) async fn select_pending_classification_targets_impl(
        &self,
        window_start: OffsetDateTime,
        prompt_version: &str,
        model_id: &str,
        limit: u32,
    ) -> Result<Vec<ContentItemId>, StoreError> {
        let prompt_version = prompt_version.to_string();
        let model_id = model_id.to_string();
        let limit = i64::from(limit);
        self.with_conn(move |conn| {
            let rows = conn
                .query(
                    "SELECT ci.id FROM content_items ci WHERE ci.source_type = 'news' AND \
                     ci.state = 'active' AND COALESCE(ci.published_at, ci.created_at) >= $1 \
                     AND NOT EXISTS (SELECT 1 FROM classifications c WHERE \
                     c.content_item_id = ci.id AND c.prompt_version = $2 AND c.model_id = $3) \
                     ORDER BY ci.created_at ASC LIMIT $4",
                    &[&window_start, &prompt_version, &model_id, &limit],
                )
                .map_err(map_pg_err)?;
            Ok(rows.iter().map(|row| ContentItemId::from(row.get::<_, String>(0))).collect())
        })
        .await
    }

    pub(crate) async fn get_content_item_impl(
        &self,
        id: &ContentItemId,
    ) -> Result<ContentItem, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {CONTENT_ITEM_COLUMNS} FROM content_items WHERE id = $1");
            let row = conn
                .query_opt(&sql, &[&id])
                .map_err(map_pg_err)?
                .ok_or_else(|| StoreError::NotFound(format!("content item {id}")))?;
            row_to_content_item(&row)
        })
        .await
    }

    pub(crate) async fn find_override_classification_impl(
        &self,
        content_item_id: &ContentItemId,
    ) -> Result<Option<Classification>, StoreError> {
        let content_item_id = content_item_id.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {CLASSIFICATION_COLUMNS} FROM classifications WHERE content_item_id = \
                 $1 AND is_override"
            );
            conn.query_opt(&sql, &[&content_item_id])
                .map_err(map_pg_err)?
                .as_ref()
                .map(row_to_classification)
                .transpose()
        })
        .await
    }

    pub(crate) async fn upsert_auto_classification_impl(
        &self,
        classification: &Classification,
        request_id: Option<&RequestId>,
    ) -> Result<ClassificationId, StoreError> {
        let classification = classification.clone();
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let content_item_id = classification.content_item_id.as_str().to_string();
            let has_override = tx
                .query_opt(
                    "SELECT id FROM classifications WHERE content_item_id = $1 AND is_override",
                    &[&content_item_id],
                )
                .map_err(map_pg_err)?;
            if let Some(row) = has_override {
                let existing_id: String = row.get(0);
                tx.commit().map_err(map_pg_err)?;
                return Ok(ClassificationId::from(existing_id));
            }
            let now = OffsetDateTime::now_utc();
            let id = classification.id.as_str().to_string();
            let sentimiento_text = enum_to_text(&classification.sentimiento)?;
            let etiquetas_json = serde_json::to_value(&classification.etiquetas)
                .map_err(|err| StoreError::Internal(err.to_string()))?;
            let row = tx
                .query_one(
                    "INSERT INTO classifications (id, content_item_id, prompt_version, \
                     model_id, categoria, sentimiento, etiquetas_json, confianza, resumen, \
                     is_override, overridden_by_user_id, override_reason, created_at, \
                     updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, NULL, NULL, \
                     $10, $10) ON CONFLICT (content_item_id, prompt_version, model_id) DO \
                     UPDATE SET categoria = EXCLUDED.categoria, sentimiento = \
                     EXCLUDED.sentimiento, etiquetas_json = EXCLUDED.etiquetas_json, confianza \
                     = EXCLUDED.confianza, resumen = EXCLUDED.resumen, updated_at = $10 WHERE \
                     NOT classifications.is_override RETURNING id",
                    &[
                        &id,
                        &content_item_id,
                        &classification.prompt_version,
                        &classification.model_id,
                        &classification.categoria,
                        &sentimiento_text,
                        &etiquetas_json,
                        &classification.confianza,
                        &classification.resumen,
                        &now,
                    ],
                )
                .map_err(map_pg_err)?;
            let classification_id: String = row.get(0);
            tx.execute(
                "UPDATE content_items SET categoria = $2, sentimiento = $3, updated_at = $4 \
                 WHERE id = $1",
                &[&content_item_id, &classification.categoria, &sentimiento_text, &now],
            )
            .map_err(map_pg_err)?;
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                None,
                "classification_upserted",
                "content_item",
                &content_item_id,
                request_id.as_deref(),
                None,
                serde_json::json!({"categoria": classification.categoria}),
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(ClassificationId::from(classification_id))
        })
        .await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use media_core::core::content::Sentimiento;

    #[test]
    fn sentimiento_round_trips_through_enum_to_text() {
        let text = crate::mapping::enum_to_text(&Sentimiento::Negativo).unwrap();
        assert_eq!(text, "negativo");
        let back: Sentimiento = crate::mapping::enum_from_text(&text).unwrap();
        assert_eq!(back, Sentimiento::Negativo);
    }
}
