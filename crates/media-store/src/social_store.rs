// media-store/src/social_store.rs
// ============================================================================
// Module: Social Store Methods
// Description: Idempotent object marks and reconciliation snapshot writes.
// Purpose: Back the Social Ingestion worker.
// Dependencies: media-core, postgres, time
// ============================================================================

use media_core::StoreError;
use media_core::core::identifiers::RequestId;
use media_core::core::social::SocialReconciliationSnapshot;
use serde_json::Value;
use time::OffsetDateTime;

use crate::PostgresStore;
use crate::map_pg_err;
use crate::mapping::enum_to_text;

impl PostgresStore {
    pub(crate) async fn claim_social_object_impl(
        &self,
        channel: &str,
        bucket: &str,
        key: &str,
        e_tag: &str,
        last_modified: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let channel = channel.to_string();
        let bucket = bucket.to_string();
        let key = key.to_string();
        let e_tag = e_tag.to_string();
        self.with_conn(move |conn| {
            let rows = conn
                .execute(
                    "INSERT INTO social_object_marks (bucket, key, e_tag, channel, \
                     last_modified, processed_at) VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT \
                     (bucket, key, e_tag, last_modified) DO NOTHING",
                    &[&bucket, &key, &e_tag, &channel, &last_modified, &now],
                )
                .map_err(map_pg_err)?;
            Ok(rows == 1)
        })
        .await
    }

    pub(crate) async fn aggregate_social_channel_totals_impl(
        &self,
        channel: &str,
        window_start: OffsetDateTime,
    ) -> Result<Value, StoreError> {
        let channel = channel.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_one(
                    "SELECT COUNT(*), \
                     COALESCE(SUM((metadata_json ->> 'likes')::BIGINT), 0), \
                     COALESCE(SUM((metadata_json ->> 'shares')::BIGINT), 0), \
                     COALESCE(SUM((metadata_json ->> 'comments')::BIGINT), 0), \
                     COUNT(*) FILTER (WHERE sentimiento = 'negativo') FROM content_items WHERE \
                     source_type = 'social' AND provider = $1 AND COALESCE(published_at, \
                     created_at) >= $2",
                    &[&channel, &window_start],
                )
                .map_err(map_pg_err)?;
            let post_count: i64 = row.get(0);
            let likes: i64 = row.get(1);
            let shares: i64 = row.get(2);
            let comments: i64 = row.get(3);
            let negative_count: i64 = row.get(4);
            Ok(serde_json::json!({
                "channel": channel,
                "windowStart": window_start,
                "postCount": post_count,
                "likes": likes,
                "shares": shares,
                "comments": comments,
                "negativeCount": negative_count,
            }))
        })
        .await
    }

    pub(crate) async fn write_social_reconciliation_snapshot_impl(
        &self,
        snapshot: &SocialReconciliationSnapshot,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError> {
        let snapshot = snapshot.clone();
        let request_id = request_id.map(|value| value.as_str().to_string());
        self.with_conn(move |conn| {
            let id = uuid::Uuid::new_v4().to_string();
            let status_text = enum_to_text(&snapshot.status)?;
            let expected = i32::try_from(snapshot.expected_count).unwrap_or(i32::MAX);
            let observed = i32::try_from(snapshot.observed_count).unwrap_or(i32::MAX);
            let mut tx = conn.transaction().map_err(map_pg_err)?;
            tx.execute(
                "INSERT INTO social_reconciliation_snapshots (id, channel, window_start, \
                 window_end, expected_count, observed_count, status, created_at) VALUES ($1, \
                 $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &id,
                    &snapshot.channel,
                    &snapshot.window_start,
                    &snapshot.window_end,
                    &expected,
                    &observed,
                    &status_text,
                    &snapshot.created_at,
                ],
            )
            .map_err(map_pg_err)?;
            crate::audit_store::insert_audit_log_tx(
                &mut tx,
                &uuid::Uuid::new_v4().to_string(),
                None,
                "social_reconciliation_recorded",
                "social_reconciliation_snapshot",
                &id,
                request_id.as_deref(),
                None,
                serde_json::json!({
                    "channel": snapshot.channel,
                    "status": status_text,
                    "expectedCount": snapshot.expected_count,
                    "observedCount": snapshot.observed_count,
                }),
                snapshot.created_at,
            )?;
            tx.commit().map_err(map_pg_err)?;
            Ok(())
        })
        .await
    }
}
