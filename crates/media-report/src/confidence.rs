// media-report/src/confidence.rs
// ============================================================================
// Module: Confidence Scoring
// Description: Extracts the KPI figures the confidence formula needs from
//              the store's aggregate JSON and computes it (§4.6 step 4).
// Purpose: Deterministic, versioned scoring so two runs over the same data
//          always agree.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`MonitorSignals`] holds the handful of numbers the formula needs, pulled
//! out of the store's free-form KPI JSON by [`MonitorSignals::from_kpis`].
//! [`score`] applies the documented weights and clamps.

use media_core::core::incident::Incident;
use serde_json::Value;

/// Version tag of the formula [`score`] implements.
pub const FORMULA_VERSION: &str = "report-v1-deterministic";

/// The handful of figures the confidence formula consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSignals {
    /// Count of content items with an applicable classification.
    pub classified_items: u32,
    /// Count of content items in the window, classified or not.
    pub items: u32,
    /// Brand-health score in `[0,100]`, derived from sentiment balance.
    pub bhs: f64,
    /// Highest risk score among currently active incidents, or 0.
    pub riesgo_activo: f64,
    /// Share of window content attributable to the `claro` scope, in `[0,100]`.
    pub sov_claro: f64,
}

impl MonitorSignals {
    /// Extracts signals from the store's `aggregate_monitor_kpis` JSON and the
    /// currently active incidents.
    #[must_use]
    pub fn from_kpis(kpis: &Value, active_incidents: &[Incident]) -> Self {
        let items = saturating_u32(kpis.get("totalContentItems").and_then(Value::as_u64).unwrap_or(0));
        let classified_items = saturating_u32(kpis.get("classifiedItems").and_then(Value::as_u64).unwrap_or(0));

        let positivo = sentiment_count(kpis, "positivo");
        let negativo = sentiment_count(kpis, "negativo");
        let bhs = if classified_items == 0 {
            50.0
        } else {
            let balance = (positivo - negativo) as f64;
            (50.0 + 50.0 * balance / f64::from(classified_items)).clamp(0.0, 100.0)
        };

        let riesgo_activo = active_incidents.iter().map(|incident| incident.risk_score).fold(0.0, f64::max);

        let claro = kpis.get("byScope").and_then(|scope| scope.get("claro")).and_then(Value::as_u64).unwrap_or(0);
        let competencia =
            kpis.get("byScope").and_then(|scope| scope.get("competencia")).and_then(Value::as_u64).unwrap_or(0);
        let scoped_total = claro + competencia;
        let sov_claro = if scoped_total == 0 { 100.0 } else { 100.0 * claro as f64 / scoped_total as f64 };

        Self { classified_items, items, bhs, riesgo_activo, sov_claro }
    }
}

/// Reads one sentiment bucket's count from the aggregated KPI payload.
fn sentiment_count(kpis: &Value, key: &str) -> i64 {
    kpis.get("bySentimiento").and_then(|by| by.get(key)).and_then(Value::as_i64).unwrap_or(0)
}

/// Saturating `u64` to `u32` conversion.
fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Clamps `value` into `[0.0, 1.0]`.
fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Computes the deterministic confidence score for one report run, rounded
/// to 3 decimals.
#[must_use]
pub fn score(signals: &MonitorSignals, top_content_len: usize, active_incidents_count: usize) -> f64 {
    let coverage = clamp01(f64::from(signals.classified_items) / 120.0);
    let volume = clamp01(f64::from(signals.items) / 180.0);
    let bhs_quality = clamp01(signals.bhs / 100.0);
    let low_risk = 1.0 - clamp01(signals.riesgo_activo / 100.0);
    let content_signal = clamp01(top_content_len as f64 / 8.0);
    let incident_penalty = clamp01(active_incidents_count as f64 / 6.0);

    let value = 0.2 + coverage * 0.25 + volume * 0.20 + bhs_quality * 0.20 + low_risk * 0.10 + content_signal * 0.10
        - incident_penalty * 0.15;
    (value * 1000.0).round() / 1000.0
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::score;
    use super::MonitorSignals;

    #[test]
    fn full_coverage_and_volume_with_no_risk_scores_high() {
        let signals = MonitorSignals { classified_items: 120, items: 180, bhs: 100.0, riesgo_activo: 0.0, sov_claro: 100.0 };
        let value = score(&signals, 8, 0);
        assert!((value - 1.05).abs() < 1e-9);
    }

    #[test]
    fn no_data_at_all_scores_the_base_weight() {
        let signals = MonitorSignals { classified_items: 0, items: 0, bhs: 0.0, riesgo_activo: 0.0, sov_claro: 0.0 };
        let value = score(&signals, 0, 0);
        assert!((value - 0.3).abs() < 1e-9);
    }

    #[test]
    fn high_active_risk_and_incident_count_pulls_the_score_down() {
        let low_risk_signals = MonitorSignals { classified_items: 60, items: 90, bhs: 50.0, riesgo_activo: 0.0, sov_claro: 50.0 };
        let high_risk_signals = MonitorSignals { riesgo_activo: 100.0, ..low_risk_signals };
        assert!(score(&high_risk_signals, 4, 3) < score(&low_risk_signals, 4, 0));
    }

    #[test]
    fn from_kpis_derives_bhs_from_sentiment_balance() {
        let kpis = serde_json::json!({
            "totalContentItems": 10,
            "classifiedItems": 8,
            "bySentimiento": {"positivo": 6, "negativo": 2},
            "byScope": {"claro": 6, "competencia": 4},
        });
        let signals = MonitorSignals::from_kpis(&kpis, &[]);
        assert_eq!(signals.classified_items, 8);
        assert_eq!(signals.items, 10);
        assert!((signals.bhs - 75.0).abs() < 1e-9);
        assert!((signals.sov_claro - 60.0).abs() < 1e-9);
        assert_eq!(signals.riesgo_activo, 0.0);
    }
}
