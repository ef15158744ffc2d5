// media-classification/src/dispatch.rs
// ============================================================================
// Module: Dispatch Messages
// Description: The scheduler trigger (§4.4 Scheduler) and the per-item
//              classification queue message (§6) the worker consumes.
// Purpose: Decode the two message shapes this crate reacts to.
// Dependencies: media-core, serde
// ============================================================================

use media_core::core::identifiers::ContentItemId;
use media_core::core::identifiers::RequestId;
use media_core::core::ingestion::TriggerType;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// Scheduler trigger payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationSchedulerTrigger {
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub requested_at: Option<OffsetDateTime>,
}

/// One item enqueued on the classification queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassificationDispatch {
    pub content_item_id: ContentItemId,
    pub prompt_version: String,
    pub model_id: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub requested_at: Option<OffsetDateTime>,
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::ClassificationDispatch;
    use media_core::core::ingestion::TriggerType;

    #[test]
    fn round_trips_through_json() {
        let dispatch = ClassificationDispatch {
            content_item_id: "c1".into(),
            prompt_version: "classification-v1".to_string(),
            model_id: "anthropic.claude".to_string(),
            trigger_type: TriggerType::Scheduled,
            request_id: None,
            requested_at: None,
        };
        let json = serde_json::to_string(&dispatch).unwrap();
        let back: ClassificationDispatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content_item_id, dispatch.content_item_id);
    }
}
