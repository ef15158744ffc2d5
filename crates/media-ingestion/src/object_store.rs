// media-ingestion/src/object_store.rs
// ============================================================================
// Module: Raw Snapshot Object Store
// Description: Writes the raw provider-response snapshot for one ingestion
//              target to object storage.
// Purpose: Back persistence step 2 of the ingestion worker (§4.3).
// Dependencies: aws-sdk-s3, async_trait
// ============================================================================

//! ## Overview
//! One seam, [`RawSnapshotStore`], so the worker never depends on
//! `aws-sdk-s3` directly; [`S3RawSnapshotStore`] is the only production
//! implementation, grounded on the S3 client wiring used for runpack storage
//! elsewhere in this corpus but stripped of tar packaging: ingestion
//! snapshots are a single JSON blob per target, not a directory tree.

use async_trait::async_trait;
use thiserror::Error;

/// Errors writing a raw snapshot.
#[derive(Debug, Error)]
pub enum RawSnapshotStoreError {
    /// The underlying object-store call failed.
    #[error("raw snapshot store error: {0}")]
    Upstream(String),
}

/// Writes raw ingestion snapshots, keyed by the path scheme in §6.
#[async_trait]
pub trait RawSnapshotStore: Send + Sync {
    /// Writes `body` (already-serialized JSON bytes) at `key` and returns the
    /// key unchanged, so callers can chain it straight into persistence.
    ///
    /// # Errors
    /// Returns [`RawSnapshotStoreError`] when the underlying write fails.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, RawSnapshotStoreError>;
}

/// Builds the object key for one target's raw snapshot:
/// `ingestion/date=YYYY-MM-DD/run=<uuid>/trigger=<scheduled|manual>/term=<slug>/payload.json`.
#[must_use]
pub fn raw_snapshot_key(date: &str, run_id: &str, trigger: &str, term_slug: &str) -> String {
    format!("ingestion/date={date}/run={run_id}/trigger={trigger}/term={term_slug}/payload.json")
}

/// Lower-cases and replaces anything that isn't `[a-z0-9-]` with `-`, collapsing runs.
#[must_use]
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut last_was_dash = false;
    for ch in raw.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() { "term".to_string() } else { trimmed.to_string() }
}

/// S3-backed [`RawSnapshotStore`].
pub struct S3RawSnapshotStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3RawSnapshotStore {
    /// Builds a store over an already-configured S3 client and bucket.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl RawSnapshotStore for S3RawSnapshotStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, RawSnapshotStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|err| RawSnapshotStoreError::Upstream(err.to_string()))?;
        Ok(key.to_string())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::raw_snapshot_key;
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_collapses_separators() {
        assert_eq!(slugify("Claro  Outage!!"), "claro-outage");
        assert_eq!(slugify("***"), "term");
    }

    #[test]
    fn raw_snapshot_key_matches_documented_layout() {
        let key = raw_snapshot_key("2026-07-27", "11111111-1111-1111-1111-111111111111", "scheduled", "claro");
        assert_eq!(
            key,
            "ingestion/date=2026-07-27/run=11111111-1111-1111-1111-111111111111/trigger=scheduled/term=claro/payload.json"
        );
    }
}
