// media-core/src/core/social.rs
// ============================================================================
// Module: Social Reconciliation
// Description: The observe-only snapshot written after each social channel
//              ingestion pass reconciles its rolling totals.
// Purpose: Lets an analyst see, after the fact, whether a channel's ingested
//          counts matched what was expected without blocking the next run.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// Result of comparing a channel's expected and observed counts for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialReconciliationStatus {
    /// Observed counts matched expected within tolerance.
    Ok,
    /// Observed counts drifted from expected beyond tolerance, but some data landed.
    Warning,
    /// No content was observed despite objects being expected.
    Error,
}

impl SocialReconciliationStatus {
    /// The lowercase label used in events and stored snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Tolerance below which an observed/expected shortfall is still `Ok`.
pub const RECONCILIATION_TOLERANCE: f64 = 0.05;

/// One channel's rolling 7-day reconciliation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialReconciliationSnapshot {
    /// Channel this snapshot covers.
    pub channel: String,
    /// Start of the rolling window.
    pub window_start: OffsetDateTime,
    /// End of the rolling window (the pass's `now`).
    pub window_end: OffsetDateTime,
    /// Rows successfully parsed from newly processed objects this pass.
    pub expected_count: u32,
    /// Rows actually persisted (post-dedupe) for the channel this pass.
    pub observed_count: u32,
    /// Reconciliation verdict derived from `expected_count` vs `observed_count`.
    pub status: SocialReconciliationStatus,
    /// When this snapshot was computed.
    pub created_at: OffsetDateTime,
}

impl SocialReconciliationSnapshot {
    /// Derives the reconciliation status from expected vs observed counts,
    /// tolerating a [`RECONCILIATION_TOLERANCE`] shortfall as still `Ok`.
    #[must_use]
    pub fn status_for(expected_count: u32, observed_count: u32) -> SocialReconciliationStatus {
        if expected_count == 0 {
            return SocialReconciliationStatus::Ok;
        }
        if observed_count == 0 {
            return SocialReconciliationStatus::Error;
        }
        let shortfall = 1.0 - f64::from(observed_count) / f64::from(expected_count);
        if shortfall > RECONCILIATION_TOLERANCE { SocialReconciliationStatus::Warning } else { SocialReconciliationStatus::Ok }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::SocialReconciliationSnapshot;
    use super::SocialReconciliationStatus;

    #[test]
    fn no_expected_rows_is_ok() {
        assert_eq!(SocialReconciliationSnapshot::status_for(0, 0), SocialReconciliationStatus::Ok);
    }

    #[test]
    fn zero_observed_against_nonzero_expected_is_error() {
        assert_eq!(SocialReconciliationSnapshot::status_for(40, 0), SocialReconciliationStatus::Error);
    }

    #[test]
    fn small_shortfall_within_tolerance_is_ok() {
        assert_eq!(SocialReconciliationSnapshot::status_for(100, 98), SocialReconciliationStatus::Ok);
    }

    #[test]
    fn large_shortfall_is_warning() {
        assert_eq!(SocialReconciliationSnapshot::status_for(100, 80), SocialReconciliationStatus::Warning);
    }

    #[test]
    fn full_match_is_ok() {
        assert_eq!(SocialReconciliationSnapshot::status_for(50, 50), SocialReconciliationStatus::Ok);
    }
}
