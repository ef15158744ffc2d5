// media-classification/src/llm.rs
// ============================================================================
// Module: LLM Client
// Description: The seam between the classification worker and the model
//              endpoint, plus the retry contract from §4.4 step 5.
// Purpose: Invoke a model with a rendered prompt and return raw text.
// Dependencies: aws-sdk-bedrockruntime, rand, tokio
// ============================================================================

//! ## Overview
//! [`LlmClient`] is the only seam the worker depends on, grounded on the same
//! production/trait split used for the raw snapshot object store: one small
//! async trait, one real implementation ([`BedrockLlmClient`]) wrapping the
//! AWS client, so tests run against an in-memory double instead of a live
//! endpoint.

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

/// Maximum attempts per classification call.
pub const MAX_ATTEMPTS: u32 = 3;
/// Upper bound, in milliseconds, of the jitter added to each backoff.
pub const MAX_JITTER_MS: u64 = 250;
/// Per-attempt base backoff, in milliseconds; multiplied by the attempt number.
pub const BASE_BACKOFF_MS: u64 = 500;

/// Errors invoking the model endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport or endpoint failure whose message suggests a transient
    /// condition (throttling, timeout, service unavailable); retried.
    #[error("transient llm error: {0}")]
    Transient(String),
    /// Any other failure; not retried.
    #[error("llm error: {0}")]
    Other(String),
}

impl LlmError {
    /// True when the failure's code or message suggests the call should be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Classifies a raw error message against the §4.4 retry predicate:
/// "errors whose code or message contains throttling/timeout/service-unavailable".
#[must_use]
pub fn classify_llm_error(message: &str) -> LlmError {
    let lower = message.to_lowercase();
    if lower.contains("throttl") || lower.contains("timeout") || lower.contains("service unavailable") || lower.contains("service-unavailable") {
        LlmError::Transient(message.to_string())
    } else {
        LlmError::Other(message.to_string())
    }
}

/// Invokes a model with a rendered prompt and returns its raw text output.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Calls the model at `temperature`/`max_tokens` with `prompt` and
    /// returns the first text block of its response.
    ///
    /// # Errors
    /// Returns [`LlmError`] on transport, throttling, or decode failure.
    async fn invoke(&self, model_id: &str, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String, LlmError>;
}

/// Runs `call` up to [`MAX_ATTEMPTS`] times, retrying only on
/// [`LlmError::is_retryable`] failures, sleeping `attempt * 500 + rand(250)` ms
/// between attempts, per §4.4 step 5.
///
/// # Errors
/// Returns the last error once attempts are exhausted or a non-retryable
/// error occurs.
pub async fn invoke_with_retry<F, Fut>(mut call: F) -> Result<String, LlmError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String, LlmError>>,
{
    let mut last_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match call().await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
                let backoff = u64::from(attempt) * BASE_BACKOFF_MS + jitter;
                tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| LlmError::Other("retry loop exited without an attempt".to_string())))
}

/// Bedrock-backed [`LlmClient`], invoking the converse API with a single
/// user-turn prompt and no tool use.
pub struct BedrockLlmClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockLlmClient {
    /// Builds a client over an already-configured Bedrock runtime client.
    #[must_use]
    pub fn new(client: aws_sdk_bedrockruntime::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmClient for BedrockLlmClient {
    async fn invoke(&self, model_id: &str, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String, LlmError> {
        let message = aws_sdk_bedrockruntime::types::Message::builder()
            .role(aws_sdk_bedrockruntime::types::ConversationRole::User)
            .content(aws_sdk_bedrockruntime::types::ContentBlock::Text(prompt.to_string()))
            .build()
            .map_err(|err| LlmError::Other(err.to_string()))?;

        let config = aws_sdk_bedrockruntime::types::InferenceConfiguration::builder()
            .temperature(temperature)
            .max_tokens(i32::try_from(max_tokens).unwrap_or(i32::MAX))
            .build();

        let response = self
            .client
            .converse()
            .model_id(model_id)
            .messages(message)
            .inference_config(config)
            .send()
            .await
            .map_err(|err| classify_llm_error(&err.to_string()))?;

        let output = response.output.ok_or_else(|| LlmError::Other("bedrock_missing_text_output".to_string()))?;
        let assistant = output.as_message().map_err(|_| LlmError::Other("bedrock_missing_text_output".to_string()))?;
        for block in &assistant.content {
            if let aws_sdk_bedrockruntime::types::ContentBlock::Text(text) = block {
                return Ok(text.clone());
            }
        }
        Err(LlmError::Other("bedrock_missing_text_output".to_string()))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::classify_llm_error;
    use super::invoke_with_retry;
    use super::LlmError;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    #[test]
    fn classifies_throttling_as_retryable() {
        assert!(classify_llm_error("ThrottlingException: rate exceeded").is_retryable());
        assert!(classify_llm_error("request timeout").is_retryable());
        assert!(!classify_llm_error("ValidationException: bad model id").is_retryable());
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let result = invoke_with_retry(|| {
            let count = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(LlmError::Transient("throttled".to_string()))
                } else {
                    Ok("{}".to_string())
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_transient_errors() {
        let attempts = AtomicU32::new(0);
        let result = invoke_with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::Other("bad request".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
