// media-classification/src/worker.rs
// ============================================================================
// Module: Classification Worker
// Description: Runs one classification message end to end (§4.4 Worker).
// Purpose: The single entry point the queue consumer invokes per content item.
// Dependencies: media-core, serde_json, time
// ============================================================================

//! ## Overview
//! [`run_classification`] checks for a manual override, loads and truncates
//! the content fields, renders the prompt, calls the model through
//! [`crate::llm::LlmClient`] with the documented retry contract, validates
//! the response through [`crate::validate`], and upserts the result. Every
//! step reports through [`EventSink`] as plain JSON, matching the rest of
//! this workspace's workers.

use media_core::EventSink;
use media_core::StoreError;
use media_core::core::content::Classification;
use media_core::core::identifiers::ClassificationId;
use media_core::interfaces::Store;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;

use crate::dispatch::ClassificationDispatch;
use crate::llm::LlmClient;
use crate::llm::invoke_with_retry;
use crate::prompt::render_prompt;
use crate::validate::parse_model_json;
use uuid::Uuid;
use crate::validate::validate_output;

/// Temperature passed to the model, per §4.4 step 4.
pub const MODEL_TEMPERATURE: f32 = 0.1;
/// Max output tokens requested from the model, per §4.4 step 4.
pub const MODEL_MAX_TOKENS: u32 = 800;

/// Failures running one classification message.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The store returned an error loading or persisting state.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The model call failed after exhausting retries, or failed non-retryably.
    #[error(transparent)]
    Llm(#[from] crate::llm::LlmError),
    /// The model's output failed validation.
    #[error(transparent)]
    Validation(#[from] crate::validate::ValidationError),
}

/// Outcome of one classification message.
#[derive(Debug, Clone)]
pub enum ClassificationOutcome {
    /// A manual override already exists; no model call was made.
    SkippedOverrideExists,
    /// The content was classified and the row was upserted.
    Classified(ClassificationId),
}

/// Runs one classification dispatch end to end.
///
/// # Errors
/// Returns [`WorkerError`] when loading content, calling the model, or
/// persisting the result fails.
pub async fn run_classification(
    store: &dyn Store,
    llm: &dyn LlmClient,
    events: &dyn EventSink,
    dispatch: &ClassificationDispatch,
) -> Result<ClassificationOutcome, WorkerError> {
    if store.find_override_classification(&dispatch.content_item_id).await?.is_some() {
        events.emit(&json!({
            "event": "classification_skipped_manual_override",
            "contentItemId": dispatch.content_item_id.as_str(),
        }));
        return Ok(ClassificationOutcome::SkippedOverrideExists);
    }

    let item = store.get_content_item(&dispatch.content_item_id).await?;
    let prompt = render_prompt(&item);

    let model_id = dispatch.model_id.clone();
    let raw_text = invoke_with_retry(|| llm.invoke(&model_id, &prompt, MODEL_TEMPERATURE, MODEL_MAX_TOKENS)).await?;

    let decoded = parse_model_json(&raw_text)?;
    let validated = validate_output(&decoded)?;

    let now = OffsetDateTime::now_utc();
    let classification = Classification {
        id: ClassificationId::new(Uuid::new_v4().to_string()),
        content_item_id: dispatch.content_item_id.clone(),
        prompt_version: dispatch.prompt_version.clone(),
        model_id: dispatch.model_id.clone(),
        categoria: validated.categoria,
        sentimiento: validated.sentimiento,
        etiquetas: validated.etiquetas,
        confianza: validated.confianza,
        resumen: validated.resumen,
        is_override: false,
        overridden_by_user_id: None,
        override_reason: None,
        created_at: now,
        updated_at: now,
    };

    let id = store.upsert_auto_classification(&classification, dispatch.request_id.as_ref()).await?;
    events.emit(&json!({
        "event": "classification.completed",
        "contentItemId": dispatch.content_item_id.as_str(),
        "sentimiento": classification.sentimiento,
    }));
    Ok(ClassificationOutcome::Classified(id))
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::run_classification;
    use super::ClassificationOutcome;
    use crate::dispatch::ClassificationDispatch;
    use crate::llm::LlmClient;
    use crate::llm::LlmError;
    use crate::test_support::FakeStore;
    use async_trait::async_trait;
    use media_core::interfaces::NullEventSink;
    use media_core::core::content::Classification;
    use media_core::core::content::ContentItem;
    use media_core::core::content::ContentState;
    use media_core::core::content::SourceType;
    use media_core::core::identifiers::ClassificationId;
    use media_core::core::ingestion::TriggerType;
    use time::OffsetDateTime;

    struct StubLlm {
        response: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(&self, _model_id: &str, _prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }
    }

    fn content_item(id: &str) -> ContentItem {
        let now = OffsetDateTime::from_unix_timestamp(0).unwrap();
        ContentItem {
            id: id.into(),
            canonical_url: format!("https://example.com/{id}"),
            source_type: SourceType::News,
            term_id: None,
            provider: "reuters".to_string(),
            source_name: None,
            source_id: None,
            title: "Claro outage reported".to_string(),
            summary: Some("Brief summary".to_string()),
            content: Some("Full article body".to_string()),
            image_url: None,
            language: Some("es".to_string()),
            category: None,
            published_at: None,
            source_score: None,
            raw_payload_s3_key: None,
            state: ContentState::Active,
            categoria: None,
            sentimiento: None,
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    fn dispatch(content_item_id: &str) -> ClassificationDispatch {
        ClassificationDispatch {
            content_item_id: content_item_id.into(),
            prompt_version: "classification-v1".to_string(),
            model_id: "anthropic.claude".to_string(),
            trigger_type: TriggerType::Scheduled,
            request_id: None,
            requested_at: None,
        }
    }

    #[tokio::test]
    async fn skips_when_override_exists() {
        let classification = Classification {
            id: ClassificationId::new("11111111-1111-1111-1111-111111111111"),
            content_item_id: "c1".into(),
            prompt_version: "classification-v1".to_string(),
            model_id: "anthropic.claude".to_string(),
            categoria: "finance".to_string(),
            sentimiento: media_core::core::content::Sentimiento::Neutro,
            etiquetas: vec![],
            confianza: 0.5,
            resumen: None,
            is_override: true,
            overridden_by_user_id: None,
            override_reason: Some("analyst correction".to_string()),
            created_at: OffsetDateTime::from_unix_timestamp(0).unwrap(),
            updated_at: OffsetDateTime::from_unix_timestamp(0).unwrap(),
        };
        let store = FakeStore::with_override("c1".into(), classification);
        let llm = StubLlm { response: String::new() };
        let outcome = run_classification(&store, &llm, &NullEventSink, &dispatch("c1")).await.unwrap();
        assert!(matches!(outcome, ClassificationOutcome::SkippedOverrideExists));
    }

    #[tokio::test]
    async fn classifies_and_upserts_on_valid_model_output() {
        let store = FakeStore::with_content_item(content_item("c1"));
        let llm = StubLlm {
            response: "```json\n{\"categoria\":\"outage\",\"sentimiento\":\"negative\",\"etiquetas\":[\"claro\"],\"confianza\":0.8}\n```".to_string(),
        };
        let outcome = run_classification(&store, &llm, &NullEventSink, &dispatch("c1")).await.unwrap();
        assert!(matches!(outcome, ClassificationOutcome::Classified(_)));
        let upserted = store.upserted_classifications.lock().unwrap();
        assert_eq!(upserted.len(), 1);
        assert_eq!(upserted[0].categoria, "outage");
        assert_eq!(upserted[0].sentimiento, media_core::core::content::Sentimiento::Negativo);
    }

    #[tokio::test]
    async fn propagates_validation_error_on_malformed_model_output() {
        let store = FakeStore::with_content_item(content_item("c1"));
        let llm = StubLlm { response: "not json".to_string() };
        let result = run_classification(&store, &llm, &NullEventSink, &dispatch("c1")).await;
        assert!(result.is_err());
    }
}
