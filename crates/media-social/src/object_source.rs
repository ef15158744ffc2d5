// media-social/src/object_source.rs
// ============================================================================
// Module: Channel Object Source
// Description: Lists and fetches one channel's raw CSV objects.
// Purpose: Back the ingestion worker's object-discovery step (§10).
// Dependencies: aws-sdk-s3, async_trait
// ============================================================================

//! ## Overview
//! One seam, [`ObjectSource`], so the worker never depends on `aws-sdk-s3`
//! directly; [`S3ObjectSource`] is the only production implementation,
//! grounded the same way [`media_ingestion`]'s raw snapshot store grounds its
//! own S3 seam: list-then-fetch, with the worker owning dedupe and ordering.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors listing or fetching a channel's raw objects.
#[derive(Debug, Error)]
pub enum ObjectSourceError {
    /// The underlying object-store call failed.
    #[error("object source error: {0}")]
    Upstream(String),
}

/// One object discovered under a channel's prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialObjectRef {
    /// Bucket the object lives in.
    pub bucket: String,
    /// Full object key.
    pub key: String,
    /// The object's current `ETag`, used as part of the claim key.
    pub e_tag: String,
    /// The object's last-modified timestamp, used for ordering and the claim key.
    pub last_modified: OffsetDateTime,
}

/// Lists and fetches one channel's raw CSV objects, keyed by `{channel}/`.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Lists every object under the channel's prefix, oldest `last_modified` first.
    ///
    /// # Errors
    /// Returns [`ObjectSourceError`] when the underlying list call fails.
    async fn list_channel_objects(&self, channel: &str) -> Result<Vec<SocialObjectRef>, ObjectSourceError>;

    /// Fetches one object's full body.
    ///
    /// # Errors
    /// Returns [`ObjectSourceError`] when the underlying read fails.
    async fn get(&self, object: &SocialObjectRef) -> Result<Vec<u8>, ObjectSourceError>;
}

/// S3-backed [`ObjectSource`].
pub struct S3ObjectSource {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectSource {
    /// Builds a source over an already-configured S3 client and bucket.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectSource for S3ObjectSource {
    async fn list_channel_objects(&self, channel: &str) -> Result<Vec<SocialObjectRef>, ObjectSourceError> {
        let prefix = format!("{channel}/");
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket).prefix(&prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }
            let output = request.send().await.map_err(|err| ObjectSourceError::Upstream(err.to_string()))?;
            for object in output.contents.into_iter().flatten() {
                let (Some(key), Some(e_tag), Some(last_modified)) = (object.key, object.e_tag, object.last_modified)
                else {
                    continue;
                };
                let Ok(last_modified) = OffsetDateTime::from_unix_timestamp(last_modified.secs()) else {
                    continue;
                };
                objects.push(SocialObjectRef {
                    bucket: self.bucket.clone(),
                    key,
                    e_tag: e_tag.trim_matches('"').to_string(),
                    last_modified,
                });
            }
            continuation_token = output.next_continuation_token;
            if continuation_token.is_none() {
                break;
            }
        }
        objects.sort_by_key(|object| object.last_modified);
        Ok(objects)
    }

    async fn get(&self, object: &SocialObjectRef) -> Result<Vec<u8>, ObjectSourceError> {
        let output = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|err| ObjectSourceError::Upstream(err.to_string()))?;
        let bytes = output.body.collect().await.map_err(|err| ObjectSourceError::Upstream(err.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }
}
