// media-classification/src/validate.rs
// ============================================================================
// Module: Model Output Validation
// Description: Extracts JSON from raw model text and validates/normalizes
//              it into a Classification row (§4.4 steps 4 and 6).
// Purpose: Turn untrusted model text into a typed, bounded Classification.
// Dependencies: media-core, serde_json
// ============================================================================

use media_core::core::content::Sentimiento;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of deduped labels kept.
pub const MAX_ETIQUETAS: usize = 50;
/// Maximum length of the optional summary field.
pub const MAX_RESUMEN_LEN: usize = 1000;

/// Specific, partitionable failure strings from §7.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The model returned no usable text at all.
    #[error("model_empty_response")]
    EmptyResponse,
    /// Neither direct parsing nor the brace-slice fallback produced valid JSON.
    #[error("model_invalid_json")]
    InvalidJson,
    /// A required field was absent, empty, or out of range. Also used for a
    /// `confianza` outside `[0,1]`, since that has no dedicated error string.
    #[error("model_missing_{0}")]
    MissingField(&'static str),
    /// The `sentimiento` field was present but blank.
    #[error("model_invalid_sentimiento")]
    InvalidSentimiento,
}

/// Fields extracted and validated from the model's JSON output, before the
/// caller attaches the identifying key and bookkeeping fields.
#[derive(Debug, Clone)]
pub struct ValidatedOutput {
    /// Free-text category label.
    pub categoria: String,
    /// Normalized sentiment.
    pub sentimiento: Sentimiento,
    /// Deduped labels, at most [`MAX_ETIQUETAS`].
    pub etiquetas: Vec<String>,
    /// Confidence in `[0,1]`.
    pub confianza: f64,
    /// Optional summary, truncated to [`MAX_RESUMEN_LEN`].
    pub resumen: Option<String>,
}

/// Strips ``` fences (with or without a language tag) from model output.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(without_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let without_lang = without_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let without_close = without_lang.strip_suffix("```").unwrap_or(without_lang);
    without_close.trim()
}

/// Parses `raw` as JSON, falling back to the first `{` .. last `}` slice when
/// direct parsing fails (§4.4 step 4).
///
/// # Errors
/// Returns [`ValidationError::EmptyResponse`] for blank input and
/// [`ValidationError::InvalidJson`] when neither strategy parses.
pub fn parse_model_json(raw: &str) -> Result<Value, ValidationError> {
    let fenced = strip_code_fences(raw);
    if fenced.is_empty() {
        return Err(ValidationError::EmptyResponse);
    }
    if let Ok(value) = serde_json::from_str::<Value>(fenced) {
        return Ok(value);
    }
    let start = fenced.find('{').ok_or(ValidationError::InvalidJson)?;
    let end = fenced.rfind('}').ok_or(ValidationError::InvalidJson)?;
    if end < start {
        return Err(ValidationError::InvalidJson);
    }
    serde_json::from_str::<Value>(&fenced[start..=end]).map_err(|_| ValidationError::InvalidJson)
}

/// Removes diacritics and non-letter characters, lower-cases, for sentiment
/// tokenization.
#[must_use]
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter_map(strip_diacritic)
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase()
}

/// Maps a Latin-accented letter to its unaccented ASCII form, dropping anything else.
fn strip_diacritic(c: char) -> Option<char> {
    let mapped = match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        other => other,
    };
    Some(mapped)
}

/// Normalizes a raw sentiment string per §4.4 step 6: ambiguous combinations
/// of positive and negative, and explicit "mixed", both collapse to neutral.
#[must_use]
pub fn normalize_sentimiento(raw: &str) -> Sentimiento {
    let token = normalize_token(raw);
    let has_positive = token.contains("positiv") || token.contains("positive");
    let has_negative = token.contains("negativ") || token.contains("negative");
    let is_mixed = token.contains("mixed") || token.contains("mixto") || token.contains("ambig");

    if is_mixed || (has_positive && has_negative) {
        Sentimiento::Neutro
    } else if has_positive {
        Sentimiento::Positivo
    } else if has_negative {
        Sentimiento::Negativo
    } else {
        Sentimiento::Neutro
    }
}

/// Validates and normalizes a decoded model JSON payload into a
/// [`ValidatedOutput`], per §4.4 step 6.
///
/// # Errors
/// Returns the specific [`ValidationError`] variant matching the field that
/// failed validation.
pub fn validate_output(value: &Value) -> Result<ValidatedOutput, ValidationError> {
    let categoria = value
        .get("categoria")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField("categoria"))?
        .to_string();

    let sentimiento_raw = value.get("sentimiento").and_then(Value::as_str).ok_or(ValidationError::MissingField("sentimiento"))?;
    if sentimiento_raw.trim().is_empty() {
        return Err(ValidationError::InvalidSentimiento);
    }
    let sentimiento = normalize_sentimiento(sentimiento_raw);

    let mut etiquetas: Vec<String> = Vec::new();
    if let Some(array) = value.get("etiquetas").and_then(Value::as_array) {
        let mut seen = std::collections::HashSet::new();
        for entry in array {
            if let Some(label) = entry.as_str() {
                let label = label.trim().to_string();
                if !label.is_empty() && seen.insert(label.clone()) {
                    etiquetas.push(label);
                }
                if etiquetas.len() >= MAX_ETIQUETAS {
                    break;
                }
            }
        }
    }

    let confianza = value.get("confianza").and_then(Value::as_f64).ok_or(ValidationError::MissingField("confianza"))?;
    if !(0.0..=1.0).contains(&confianza) {
        return Err(ValidationError::MissingField("confianza"));
    }

    let resumen = value
        .get("resumen")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| crate::prompt::truncate(s, MAX_RESUMEN_LEN));

    Ok(ValidatedOutput { categoria, sentimiento, etiquetas, confianza, resumen })
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::normalize_sentimiento;
    use super::parse_model_json;
    use super::validate_output;
    use super::ValidationError;
    use media_core::core::content::Sentimiento;

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"categoria\":\"finance\"}\n```";
        let value = parse_model_json(raw).unwrap();
        assert_eq!(value["categoria"], "finance");
    }

    #[test]
    fn falls_back_to_brace_slice_when_surrounded_by_prose() {
        let raw = "Sure, here you go: {\"categoria\":\"finance\"} hope that helps";
        let value = parse_model_json(raw).unwrap();
        assert_eq!(value["categoria"], "finance");
    }

    #[test]
    fn empty_response_is_reported_distinctly() {
        assert_eq!(parse_model_json("   ").unwrap_err(), ValidationError::EmptyResponse);
    }

    #[test]
    fn unparsable_text_is_invalid_json() {
        assert_eq!(parse_model_json("not json at all").unwrap_err(), ValidationError::InvalidJson);
    }

    #[test]
    fn ambiguous_positive_negative_normalizes_to_neutral() {
        assert_eq!(normalize_sentimiento("positive/negative"), Sentimiento::Neutro);
        assert_eq!(normalize_sentimiento("mixto"), Sentimiento::Neutro);
        assert_eq!(normalize_sentimiento("positivo"), Sentimiento::Positivo);
        assert_eq!(normalize_sentimiento("Negativo"), Sentimiento::Negativo);
    }

    #[test]
    fn validate_rejects_missing_categoria() {
        let value = serde_json::json!({"sentimiento": "neutral", "confianza": 0.5});
        assert_eq!(validate_output(&value).unwrap_err(), ValidationError::MissingField("categoria"));
    }

    #[test]
    fn validate_dedupes_and_caps_etiquetas() {
        let value = serde_json::json!({
            "categoria": "finance",
            "sentimiento": "neutral",
            "confianza": 0.5,
            "etiquetas": ["a", "a", "b"],
        });
        let output = validate_output(&value).unwrap();
        assert_eq!(output.etiquetas, vec!["a".to_string(), "b".to_string()]);
    }
}
