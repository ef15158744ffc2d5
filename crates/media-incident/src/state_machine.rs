// media-incident/src/state_machine.rs
// ============================================================================
// Module: Incident State Machine
// Description: The per-scope create/escalate/dedupe/refresh decision and its
//              store writes (§4.5 State machine per scope).
// Purpose: Apply one scope's aggregated signal against the scope's current
//          active incident, if any.
// Dependencies: media-core
// ============================================================================

//! ## Overview
//! [`apply_scope`] takes one scope's [`ScopeSignal`] and decides, then
//! executes, exactly one of: skip, create, escalate, dedupe (no write), or
//! refresh. The decision itself ([`decide`]) is pure and unit-tested
//! independently of the store calls.

use media_core::StoreError;
use media_core::core::identifiers::RequestId;
use media_core::core::incident::Incident;
use media_core::core::incident::IncidentSeverity;
use media_core::core::incident::Scope;
use media_core::core::incident::decide_incident_action;
use media_core::interfaces::Store;
use serde_json::Value;
use time::OffsetDateTime;

use crate::aggregate::ScopeSignal;

/// What the state machine decided to do with one scope's signal.
pub use media_core::core::incident::IncidentDecision as Decision;

/// Decides the action for one scope given its signal, the current active
/// incident (if any), the new severity, and the current time. A thin
/// wrapper over [`decide_incident_action`] so unit tests here can exercise
/// the rule directly; the store applies the rule itself inside the same
/// transaction that locks `active`, so this function is not on the write
/// path.
#[must_use]
pub fn decide(signal: &ScopeSignal, new_severity: IncidentSeverity, active: Option<&Incident>, now: OffsetDateTime) -> Decision {
    decide_incident_action(signal.classified_items, new_severity, active, now)
}

/// Builds the JSON payload snapshot stamped onto every incident write.
#[must_use]
pub fn build_payload(signal: &ScopeSignal, signal_version: &str) -> Value {
    serde_json::json!({
        "signalVersion": signal_version,
        "classifiedItems": signal.classified_items,
        "classifiedWeight": signal.classified_weight,
        "negativeWeight": signal.negative_weight,
        "positiveCount": signal.positive_count,
        "negativeCount": signal.negative_count,
        "neutralCount": signal.neutral_count,
        "unclassifiedCount": signal.unclassified_count,
        "riskWeighted": signal.risk_weighted(),
    })
}

/// Applies the decided action for one scope.
///
/// Delegates the entire read-decide-write to [`Store::apply_incident_decision`],
/// which locks the scope's active incident row for the duration of the
/// decision so two concurrent evaluator passes can never both observe "no
/// active incident" and both create one.
///
/// # Errors
/// Returns [`StoreError`] when the underlying store call fails.
#[allow(clippy::too_many_arguments, reason = "Mirrors the store's own incident-decision inputs.")]
pub async fn apply_scope(
    store: &dyn Store,
    scope: Scope,
    signal: &ScopeSignal,
    new_severity: IncidentSeverity,
    cooldown_minutes: u32,
    signal_version: &str,
    now: OffsetDateTime,
    request_id: Option<&RequestId>,
) -> Result<Decision, StoreError> {
    let payload = build_payload(signal, signal_version);
    store
        .apply_incident_decision(
            scope,
            signal.risk_weighted(),
            signal.classified_items,
            new_severity,
            cooldown_minutes,
            signal_version,
            payload,
            now,
            request_id,
        )
        .await
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::decide;
    use super::Decision;
    use crate::aggregate::ScopeSignal;
    use media_core::core::identifiers::IncidentId;
    use media_core::core::incident::Incident;
    use media_core::core::incident::IncidentSeverity;
    use media_core::core::incident::IncidentStatus;
    use media_core::core::incident::Scope;
    use time::OffsetDateTime;

    fn signal(classified_items: u32) -> ScopeSignal {
        ScopeSignal { classified_items, ..ScopeSignal::default() }
    }

    fn incident(severity: IncidentSeverity, cooldown_until: OffsetDateTime) -> Incident {
        let now = OffsetDateTime::from_unix_timestamp(0).unwrap();
        Incident {
            id: IncidentId::new("11111111-1111-1111-1111-111111111111"),
            scope: Scope::Claro,
            status: IncidentStatus::Open,
            severity,
            risk_score: 50.0,
            classified_items: 3,
            owner_user_id: None,
            sla_due_at: now,
            cooldown_until,
            signal_version: "alert-v1-weighted".to_string(),
            payload: serde_json::json!({}),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn sev4_is_always_skipped() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        assert_eq!(decide(&signal(5), IncidentSeverity::Sev4, None, now), Decision::SkipSev4OrEmpty);
    }

    #[test]
    fn zero_classified_items_is_skipped_even_at_sev1() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        assert_eq!(decide(&signal(0), IncidentSeverity::Sev1, None, now), Decision::SkipSev4OrEmpty);
    }

    #[test]
    fn no_active_incident_creates() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        assert_eq!(decide(&signal(5), IncidentSeverity::Sev2, None, now), Decision::Created);
    }

    #[test]
    fn higher_severity_escalates() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        let active = incident(IncidentSeverity::Sev3, now + time::Duration::hours(1));
        assert_eq!(decide(&signal(5), IncidentSeverity::Sev1, Some(&active), now), Decision::Escalated);
    }

    #[test]
    fn same_severity_inside_cooldown_dedupes() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        let active = incident(IncidentSeverity::Sev2, now + time::Duration::hours(1));
        assert_eq!(decide(&signal(5), IncidentSeverity::Sev2, Some(&active), now), Decision::Deduped);
    }

    #[test]
    fn same_severity_past_cooldown_refreshes() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        let active = incident(IncidentSeverity::Sev2, now - time::Duration::hours(1));
        assert_eq!(decide(&signal(5), IncidentSeverity::Sev2, Some(&active), now), Decision::Refreshed);
    }

    #[test]
    fn lower_severity_than_active_also_refreshes_not_escalates() {
        let now = OffsetDateTime::from_unix_timestamp(1000).unwrap();
        let active = incident(IncidentSeverity::Sev1, now - time::Duration::hours(1));
        assert_eq!(decide(&signal(5), IncidentSeverity::Sev2, Some(&active), now), Decision::Refreshed);
    }
}
