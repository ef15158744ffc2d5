// media-store/src/queries_store.rs
// ============================================================================
// Module: Tracked Query Store Methods
// Description: CRUD and revisioning for tracked queries.
// Purpose: Back the Query Engine's read surface and the ingestion worker's
//          ad-hoc term resolution.
// Dependencies: media-core, postgres, uuid
// ============================================================================

use media_core::StoreError;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::TermId;
use media_core::core::identifiers::UserId;
use media_core::core::incident::Scope;
use media_core::core::query::ExecutionConfig;
use media_core::core::query::QueryDefinition;
use media_core::core::query::TrackedQuery;
use media_logic::Term;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;
use crate::mapping::TRACKED_QUERY_COLUMNS;
use crate::mapping::row_to_tracked_query;

impl PostgresStore {
    pub(crate) async fn get_tracked_query_impl(&self, id: &TermId) -> Result<TrackedQuery, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {TRACKED_QUERY_COLUMNS} FROM tracked_queries WHERE id = $1");
            let row = conn
                .query_opt(&sql, &[&id])
                .map_err(map_pg_err)?
                .ok_or_else(|| StoreError::NotFound(format!("tracked query {id}")))?;
            row_to_tracked_query(&row)
        })
        .await
    }

    pub(crate) async fn find_tracked_query_by_name_impl(
        &self,
        name: &str,
        language: &str,
    ) -> Result<Option<TrackedQuery>, StoreError> {
        let name = name.to_string();
        let language = language.to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {TRACKED_QUERY_COLUMNS} FROM tracked_queries WHERE name = $1 AND language = $2"
            );
            conn.query_opt(&sql, &[&name, &language])
                .map_err(map_pg_err)?
                .as_ref()
                .map(row_to_tracked_query)
                .transpose()
        })
        .await
    }

    pub(crate) async fn list_active_tracked_queries_impl(
        &self,
        limit: u32,
    ) -> Result<Vec<TrackedQuery>, StoreError> {
        let limit = i64::from(limit);
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {TRACKED_QUERY_COLUMNS} FROM tracked_queries WHERE is_active \
                 ORDER BY updated_at DESC LIMIT $1"
            );
            conn.query(&sql, &[&limit])
                .map_err(map_pg_err)?
                .iter()
                .map(row_to_tracked_query)
                .collect()
        })
        .await
    }

    pub(crate) async fn append_tracked_query_revision_impl(
        &self,
        query_id: &TermId,
        change_reason: &str,
        actor: &UserId,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError> {
        let query_id = query_id.as_str().to_string();
        let change_reason = change_reason.to_string();
        let actor = actor.as_str().to_string();
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let select_sql =
                format!("SELECT {TRACKED_QUERY_COLUMNS} FROM tracked_queries WHERE id = $1 FOR UPDATE");
            let row = tx
                .query_opt(&select_sql, &[&query_id])
                .map_err(map_pg_err)?
                .ok_or_else(|| StoreError::NotFound(format!("tracked query {query_id}")))?;
            let current = row_to_tracked_query(&row)?;
            let definition_json = serde_json::to_value(&current.definition)
                .map_err(|err| StoreError::Internal(err.to_string()))?;
            let execution_json = serde_json::to_value(&current.execution)
                .map_err(|err| StoreError::Internal(err.to_string()))?;
            let now = OffsetDateTime::now_utc();
            tx.execute(
                "INSERT INTO tracked_query_revisions (tracked_query_id, revision, \
                 definition_json, execution_json, compiled_provider_query, change_reason, \
                 actor, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &query_id,
                    &i32::try_from(current.current_revision).unwrap_or(i32::MAX),
                    &definition_json,
                    &execution_json,
                    &current.compiled_provider_query,
                    &change_reason,
                    &actor,
                    &now,
                ],
            )
            .map_err(map_pg_err)?;
            tx.execute(
                "UPDATE tracked_queries SET current_revision = current_revision + 1, \
                 updated_at = $2 WHERE id = $1",
                &[&query_id, &now],
            )
            .map_err(map_pg_err)?;
            let request_id_ref = request_id.as_deref();
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                Some(&actor),
                "tracked_query_revised",
                "tracked_query",
                &query_id,
                request_id_ref,
                None,
                serde_json::json!({"changeReason": change_reason}),
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn ensure_adhoc_tracked_query_impl(
        &self,
        name: &str,
        language: &str,
        actor: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<TermId, StoreError> {
        let name = name.to_string();
        let language = language.to_string();
        let actor = actor.map(|value| value.as_str().to_string());
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            let existing = tx
                .query_opt(
                    "SELECT id FROM tracked_queries WHERE name = $1 AND language = $2",
                    &[&name, &language],
                )
                .map_err(map_pg_err)?;
            if let Some(row) = existing {
                let id: String = row.get(0);
                tx.commit().map_err(map_pg_err)?;
                return Ok(TermId::from(id));
            }
            let id = uuid::Uuid::new_v4().to_string();
            let now = OffsetDateTime::now_utc();
            let definition = QueryDefinition {
                include: vec![Term::Literal { value: name.clone() }],
                any: vec![],
                exclude: vec![],
            };
            let execution = ExecutionConfig {
                providers_allow: vec![],
                providers_deny: vec![],
                domains_allow: vec![],
                domains_deny: vec![],
                countries_allow: vec![],
                countries_deny: vec![],
            };
            let definition_json = serde_json::to_value(&definition)
                .map_err(|err| StoreError::Internal(err.to_string()))?;
            let execution_json = serde_json::to_value(&execution)
                .map_err(|err| StoreError::Internal(err.to_string()))?;
            let compiled = definition.compile_provider_query();
            let scope_text = crate::mapping::enum_to_text(&Scope::Claro)?;
            tx.execute(
                "INSERT INTO tracked_queries (id, name, language, scope, is_active, \
                 max_articles_per_run, definition_json, execution_json, \
                 compiled_provider_query, current_revision, updated_at) VALUES ($1, $2, $3, \
                 $4, false, $5, $6, $7, $8, 0, $9)",
                &[
                    &id,
                    &name,
                    &language,
                    &scope_text,
                    &i32::from(media_core::core::ingestion::NEWS_MAX_ARTICLES_PER_TERM),
                    &definition_json,
                    &execution_json,
                    &compiled,
                    &now,
                ],
            )
            .map_err(map_pg_err)?;
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                actor.as_deref(),
                "tracked_query_adhoc_created",
                "tracked_query",
                &id,
                request_id.as_deref(),
                None,
                serde_json::json!({"name": name, "language": language}),
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(TermId::from(id))
        })
        .await
    }
}
