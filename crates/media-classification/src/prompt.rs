// media-classification/src/prompt.rs
// ============================================================================
// Module: Prompt Rendering
// Description: Truncates content fields to budget and renders the model
//              prompt (§4.4 steps 2-3).
// Purpose: Turn a loaded content item into the text sent to the model.
// Dependencies: media-core
// ============================================================================

use media_core::core::content::ContentItem;

/// Maximum title length included in the prompt.
pub const TITLE_BUDGET: usize = 500;
/// Maximum summary length included in the prompt.
pub const SUMMARY_BUDGET: usize = 1200;
/// Maximum content body length included in the prompt.
pub const CONTENT_BUDGET: usize = 9000;

/// Truncates `value` to `max_len` Unicode scalar values.
#[must_use]
pub fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        value.to_string()
    } else {
        value.chars().take(max_len).collect()
    }
}

/// Renders the classification prompt for `item`, with the budget-truncated
/// fields and a trailing strict-JSON directive.
#[must_use]
pub fn render_prompt(item: &ContentItem) -> String {
    let title = truncate(&item.title, TITLE_BUDGET);
    let summary = truncate(item.summary.as_deref().unwrap_or_default(), SUMMARY_BUDGET);
    let content = truncate(item.content.as_deref().unwrap_or_default(), CONTENT_BUDGET);
    let provider = &item.provider;
    let language = item.language.as_deref().unwrap_or("unknown");

    format!(
        "You are a media-monitoring analyst classifying one article for a telecom operator.\n\
         Provider: {provider}\n\
         Language: {language}\n\
         Title: {title}\n\
         Summary: {summary}\n\
         Content: {content}\n\n\
         Classify this article. Respond with a JSON object with these exact fields:\n\
         \"categoria\" (short free-text category), \"sentimiento\" (positive, negative, neutral, or mixed), \
         \"etiquetas\" (array of up to 50 short topic labels), \"confianza\" (number between 0 and 1), \
         and optionally \"resumen\" (a summary of at most 1000 characters).\n\
         Respond with JSON only. Do not include any text before or after the JSON object."
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_counts_unicode_scalars_not_bytes() {
        let text: String = std::iter::repeat('é').take(10).collect();
        assert_eq!(truncate(&text, 3).chars().count(), 3);
    }

    #[test]
    fn truncate_is_noop_under_budget() {
        assert_eq!(truncate("short", 500), "short");
    }
}
