// media-social/src/dispatch.rs
// ============================================================================
// Module: Dispatch Messages
// Description: The per-channel ingestion queue message (§10) the worker
//              consumes.
// Purpose: Decode the message shape this crate reacts to.
// Dependencies: media-core, serde
// ============================================================================

use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::UserId;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// One channel ingestion pass enqueued on the social queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SocialIngestionDispatch {
    pub channel: String,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub requested_by_user_id: Option<UserId>,
    #[serde(default)]
    pub requested_at: Option<OffsetDateTime>,
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::SocialIngestionDispatch;

    #[test]
    fn round_trips_through_json() {
        let dispatch = SocialIngestionDispatch {
            channel: "twitter".to_string(),
            request_id: None,
            requested_by_user_id: None,
            requested_at: None,
        };
        let json = serde_json::to_string(&dispatch).unwrap();
        let back: SocialIngestionDispatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.channel, dispatch.channel);
    }
}
