// media-report/src/recommendations.rs
// ============================================================================
// Module: Recommendation Rules
// Description: The deterministic recommendation-line rule set (§4.6 step 6).
// Purpose: Turns the aggregated signals into up to 6 analyst-facing lines.
// Dependencies: none
// ============================================================================

//! ## Overview
//! [`build`] applies each rule in the documented order and stops once the
//! cap is reached; the default maintenance lines only appear when no other
//! rule fired, matching the "else two default maintenance lines" clause.

use crate::confidence::MonitorSignals;

/// Maximum number of recommendation lines a report run may carry.
pub const MAX_RECOMMENDATIONS: usize = 6;

/// Active-risk threshold above which the containment-escalation line fires.
const RISK_CONTAINMENT_THRESHOLD: f64 = 60.0;
/// Claro share-of-voice threshold below which the coverage-gap line fires.
const SOV_COVERAGE_THRESHOLD: f64 = 50.0;

/// Builds the recommendation lines for one report run.
#[must_use]
pub fn build(signals: &MonitorSignals, active_incidents_count: usize, top_content_len: usize) -> Vec<String> {
    let mut lines = Vec::new();

    if signals.riesgo_activo >= RISK_CONTAINMENT_THRESHOLD {
        lines.push(
            "Active risk is elevated; escalate containment messaging and brief frontline support teams.".to_string(),
        );
    }
    if signals.sov_claro < SOV_COVERAGE_THRESHOLD {
        lines.push("Share of voice trails the competition; push additional owned-channel coverage this week.".to_string());
    }
    if active_incidents_count > 0 {
        lines.push("One or more incidents remain open; triage and confirm ownership before the next run.".to_string());
    }
    if top_content_len == 0 {
        lines.push("No top content matched the current filters; revise tracked terms or widen the window.".to_string());
    }

    if lines.is_empty() {
        lines.push("No elevated signals this window; continue routine monitoring.".to_string());
        lines.push("Keep tracked terms and source weights under periodic review.".to_string());
    }

    lines.truncate(MAX_RECOMMENDATIONS);
    lines
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::build;
    use crate::confidence::MonitorSignals;

    fn signals(riesgo_activo: f64, sov_claro: f64) -> MonitorSignals {
        MonitorSignals { classified_items: 10, items: 10, bhs: 50.0, riesgo_activo, sov_claro }
    }

    #[test]
    fn high_risk_triggers_containment_line() {
        let lines = build(&signals(75.0, 80.0), 0, 4);
        assert!(lines.iter().any(|line| line.contains("containment")));
    }

    #[test]
    fn low_sov_triggers_coverage_line() {
        let lines = build(&signals(10.0, 30.0), 0, 4);
        assert!(lines.iter().any(|line| line.contains("voice")));
    }

    #[test]
    fn active_incidents_trigger_triage_line() {
        let lines = build(&signals(10.0, 80.0), 2, 4);
        assert!(lines.iter().any(|line| line.contains("Triage") || line.contains("triage")));
    }

    #[test]
    fn empty_top_content_triggers_revise_terms_line() {
        let lines = build(&signals(10.0, 80.0), 0, 0);
        assert!(lines.iter().any(|line| line.contains("revise") || line.contains("Revise")));
    }

    #[test]
    fn no_signals_yields_two_default_lines() {
        let lines = build(&signals(10.0, 80.0), 0, 4);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn recommendations_are_capped_at_six() {
        let lines = build(&signals(90.0, 10.0), 3, 0);
        assert!(lines.len() <= super::MAX_RECOMMENDATIONS);
    }
}
