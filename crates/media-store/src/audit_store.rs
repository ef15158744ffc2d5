// media-store/src/audit_store.rs
// ============================================================================
// Module: Audit Log Store Methods
// Description: Appends audit entries, standalone or inside a caller's
//              transaction.
// Purpose: Every mutating Store method pairs its state change with exactly
//          one audit_log row in the same transaction (§3, §8 invariant 5).
// Dependencies: media-core, postgres
// ============================================================================

use media_core::StoreError;
use serde_json::Value;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;

/// Inserts one audit row using an already-open transaction. Callers commit.
#[allow(clippy::too_many_arguments, reason = "mirrors the audit_log row shape directly")]
pub(crate) fn insert_audit_log_tx(
    tx: &mut postgres::Transaction<'_>,
    id: &str,
    actor_user_id: Option<&str>,
    action: &'static str,
    resource_type: &'static str,
    resource_id: &str,
    request_id: Option<&str>,
    before: Option<Value>,
    after: Value,
    now: OffsetDateTime,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO audit_log (id, actor_user_id, action, resource_type, resource_id, \
         request_id, before_json, after_json, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, \
         $8, $9)",
        &[
            &id,
            &actor_user_id,
            &action,
            &resource_type,
            &resource_id,
            &request_id,
            &before,
            &after,
            &now,
        ],
    )
    .map_err(map_pg_err)?;
    Ok(())
}

impl PostgresStore {
    #[allow(clippy::too_many_arguments, reason = "mirrors the trait's append_audit_log signature")]
    pub(crate) async fn append_audit_log_impl(
        &self,
        action: &'static str,
        resource_type: &'static str,
        resource_id: &str,
        actor_user_id: Option<&media_core::core::identifiers::UserId>,
        request_id: Option<&media_core::core::identifiers::RequestId>,
        before: Option<Value>,
        after: Value,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let resource_id = resource_id.to_string();
        let actor_user_id = actor_user_id.map(|value| value.as_str().to_string());
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            insert_audit_log_tx(
                &mut tx,
                &id,
                actor_user_id.as_deref(),
                action,
                resource_type,
                &resource_id,
                request_id.as_deref(),
                before,
                after,
                now,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }
}
