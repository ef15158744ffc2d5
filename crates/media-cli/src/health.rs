// media-cli/src/health.rs
// ============================================================================
// Module: Health Check
// Description: DB reachability and queue-configuration presence report.
// Purpose: Back every worker subcommand's `--health-check` mode and the
//          HTTP entry point's liveness route.
// Dependencies: media-core, serde_json
// ============================================================================

//! ## Overview
//! A health check never touches pipeline semantics: it runs one trivial
//! query against the store and checks that the queue URLs this process
//! needs are non-empty, reporting both independently so an operator can
//! tell a DB outage from a missing environment variable at a glance.

use media_core::interfaces::Store;
use serde::Serialize;
use serde_json::Value;

/// Result of one health check pass.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Whether the store answered a trivial query.
    pub db_reachable: bool,
    /// Queue/bucket configuration keys checked, and whether each is present.
    pub configured: Vec<ConfiguredCheck>,
}

/// One named configuration presence check.
#[derive(Debug, Clone, Serialize)]
pub struct ConfiguredCheck {
    /// The environment variable name being reported on.
    pub name: &'static str,
    /// Whether the value was non-empty.
    pub present: bool,
}

impl HealthReport {
    /// Whether every checked condition passed.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.db_reachable && self.configured.iter().all(|check| check.present)
    }
}

/// Runs the store reachability probe and reports presence for `checks`.
///
/// # Errors
/// Never returns an error; a failed probe is reflected in the report, not
/// propagated, so a health check always yields a payload to print or serve.
pub async fn run_health_check(store: &dyn Store, checks: &[(&'static str, &str)]) -> HealthReport {
    let db_reachable = store.aggregate_monitor_kpis(&Value::Object(serde_json::Map::new())).await.is_ok();
    let configured =
        checks.iter().map(|(name, value)| ConfiguredCheck { name, present: !value.trim().is_empty() }).collect();
    HealthReport { db_reachable, configured }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::ConfiguredCheck;
    use super::HealthReport;

    #[test]
    fn healthy_requires_db_and_every_configured_check() {
        let report = HealthReport {
            db_reachable: true,
            configured: vec![ConfiguredCheck { name: "X", present: true }],
        };
        assert!(report.is_healthy());

        let report = HealthReport {
            db_reachable: true,
            configured: vec![ConfiguredCheck { name: "X", present: false }],
        };
        assert!(!report.is_healthy());

        let report = HealthReport { db_reachable: false, configured: vec![] };
        assert!(!report.is_healthy());
    }
}
