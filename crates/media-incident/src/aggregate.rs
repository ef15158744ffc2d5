// media-incident/src/aggregate.rs
// ============================================================================
// Module: Classified Window Aggregation
// Description: Folds one scope's classified-window scan into a weighted risk
//              score (§4.5 Window/Weighting).
// Purpose: Turn a raw row set into the numbers the state machine acts on.
// Dependencies: media-core
// ============================================================================

//! ## Overview
//! [`aggregate_scope`] walks a [`ClassifiedWindowEntry`] slice once and
//! produces a [`ScopeSignal`]: classified weight, negative weight, the
//! pos/neg/neutral counts, the unknown-sentiment count, and the final
//! `riskWeighted` figure used to pick a severity.

use media_core::core::content::Sentimiento;
use media_core::interfaces::ClassifiedWindowEntry;

/// Fallback weight applied when no source score is recorded.
pub const DEFAULT_SOURCE_WEIGHT: f64 = 0.5;

/// Per-scope accumulation produced by one evaluator pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScopeSignal {
    /// Number of content items with an applicable classification.
    pub classified_items: u32,
    /// Sum of weights across all classified items.
    pub classified_weight: f64,
    /// Sum of weights across negatively classified items.
    pub negative_weight: f64,
    /// Count of positively classified items.
    pub positive_count: u32,
    /// Count of negatively classified items.
    pub negative_count: u32,
    /// Count of neutrally classified items.
    pub neutral_count: u32,
    /// Count of items with no applicable classification at all.
    pub unclassified_count: u32,
}

impl ScopeSignal {
    /// Weighted risk in `[0,100]`: `100 * negativeWeight / max(classifiedWeight, 1e-4)`.
    #[must_use]
    pub fn risk_weighted(&self) -> f64 {
        100.0 * self.negative_weight / self.classified_weight.max(1e-4)
    }
}

/// Resolves one entry's weight: its source score, or [`DEFAULT_SOURCE_WEIGHT`]
/// when none is recorded. Source-weight lookups by provider/source name are an
/// external system this core does not model (see design notes); the recorded
/// per-item `source_score` is the only signal available here.
#[must_use]
pub fn entry_weight(entry: &ClassifiedWindowEntry) -> f64 {
    entry.source_score.unwrap_or(DEFAULT_SOURCE_WEIGHT)
}

/// Aggregates one scope's classified-window rows into a [`ScopeSignal`].
#[must_use]
pub fn aggregate_scope(entries: &[ClassifiedWindowEntry]) -> ScopeSignal {
    let mut signal = ScopeSignal::default();
    for entry in entries {
        let Some(classification) = entry.classification.as_ref() else {
            signal.unclassified_count += 1;
            continue;
        };
        let weight = entry_weight(entry);
        signal.classified_items += 1;
        signal.classified_weight += weight;
        match classification.sentimiento {
            Sentimiento::Positivo => signal.positive_count += 1,
            Sentimiento::Negativo => {
                signal.negative_count += 1;
                signal.negative_weight += weight;
            }
            Sentimiento::Neutro => signal.neutral_count += 1,
        }
    }
    signal
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::aggregate_scope;
    use media_core::core::content::Classification;
    use media_core::core::content::Sentimiento;
    use media_core::core::identifiers::ClassificationId;
    use media_core::interfaces::ClassifiedWindowEntry;
    use time::OffsetDateTime;

    fn classification(sentimiento: Sentimiento) -> Classification {
        let now = OffsetDateTime::from_unix_timestamp(0).unwrap();
        Classification {
            id: ClassificationId::new("11111111-1111-1111-1111-111111111111"),
            content_item_id: "c1".into(),
            prompt_version: "classification-v1".to_string(),
            model_id: "anthropic.claude".to_string(),
            categoria: "outage".to_string(),
            sentimiento,
            etiquetas: vec![],
            confianza: 0.9,
            resumen: None,
            is_override: false,
            overridden_by_user_id: None,
            override_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(id: &str, source_score: Option<f64>, sentimiento: Option<Sentimiento>) -> ClassifiedWindowEntry {
        ClassifiedWindowEntry {
            content_item_id: id.into(),
            provider: "reuters".to_string(),
            source_name: None,
            source_score,
            classification: sentimiento.map(classification),
        }
    }

    #[test]
    fn unclassified_entries_are_excluded_from_the_weighted_total() {
        let entries = vec![entry("c1", Some(0.8), None)];
        let signal = aggregate_scope(&entries);
        assert_eq!(signal.classified_items, 0);
        assert_eq!(signal.unclassified_count, 1);
        assert_eq!(signal.risk_weighted(), 0.0);
    }

    #[test]
    fn missing_source_score_falls_back_to_default_weight() {
        let entries = vec![entry("c1", None, Some(Sentimiento::Negativo))];
        let signal = aggregate_scope(&entries);
        assert_eq!(signal.classified_weight, 0.5);
        assert_eq!(signal.negative_weight, 0.5);
        assert_eq!(signal.risk_weighted(), 100.0);
    }

    #[test]
    fn risk_weighted_is_the_share_of_negative_weight() {
        let entries = vec![
            entry("c1", Some(1.0), Some(Sentimiento::Negativo)),
            entry("c2", Some(1.0), Some(Sentimiento::Positivo)),
            entry("c3", Some(1.0), Some(Sentimiento::Neutro)),
        ];
        let signal = aggregate_scope(&entries);
        assert_eq!(signal.classified_items, 3);
        assert_eq!(signal.positive_count, 1);
        assert_eq!(signal.negative_count, 1);
        assert_eq!(signal.neutral_count, 1);
        assert!((signal.risk_weighted() - (100.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_window_has_zero_risk_via_the_epsilon_floor() {
        let signal = aggregate_scope(&[]);
        assert_eq!(signal.risk_weighted(), 0.0);
    }
}
