// media-classification/src/scheduler.rs
// ============================================================================
// Module: Classification Scheduler
// Description: Selects pending content items in a rolling window and builds
//              one dispatch per item (§4.4 Scheduler).
// Purpose: The entry point the classification trigger invokes.
// Dependencies: media-core, time
// ============================================================================

use media_core::StoreError;
use media_core::interfaces::Store;
use time::Duration;
use time::OffsetDateTime;

use crate::dispatch::ClassificationDispatch;
use crate::dispatch::ClassificationSchedulerTrigger;

/// Selects pending content items and builds the dispatch list the caller
/// should enqueue, one message per item.
///
/// # Errors
/// Propagates [`StoreError`] from the underlying selection query.
pub async fn select_classification_dispatches(
    store: &dyn Store,
    trigger: &ClassificationSchedulerTrigger,
    prompt_version: &str,
    model_id: &str,
    window_days: u32,
    limit: u32,
) -> Result<Vec<ClassificationDispatch>, StoreError> {
    let window_start = OffsetDateTime::now_utc() - Duration::hours(i64::from(window_days) * 24);
    let ids = store.select_pending_classification_targets(window_start, prompt_version, model_id, limit).await?;

    Ok(ids
        .into_iter()
        .map(|content_item_id| ClassificationDispatch {
            content_item_id,
            prompt_version: prompt_version.to_string(),
            model_id: model_id.to_string(),
            trigger_type: trigger.trigger_type,
            request_id: trigger.request_id.clone(),
            requested_at: trigger.requested_at,
        })
        .collect())
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::select_classification_dispatches;
    use crate::dispatch::ClassificationSchedulerTrigger;
    use crate::test_support::FakeStore;
    use media_core::core::identifiers::ContentItemId;
    use media_core::core::ingestion::TriggerType;

    #[tokio::test]
    async fn builds_one_dispatch_per_selected_id() {
        let ids: Vec<ContentItemId> = vec!["c1".into(), "c2".into()];
        let store = FakeStore::with_pending_classification_targets(ids);
        let trigger = ClassificationSchedulerTrigger { trigger_type: TriggerType::Scheduled, request_id: None, requested_at: None };
        let dispatches = select_classification_dispatches(&store, &trigger, "classification-v1", "anthropic.claude", 7, 120).await.unwrap();
        assert_eq!(dispatches.len(), 2);
        assert_eq!(dispatches[0].prompt_version, "classification-v1");
    }
}
