// media-core/src/core/incident.rs
// ============================================================================
// Module: Incident Domain Types
// Description: Reputational incidents, notes, and evaluator run records.
// Purpose: Persistence-shape types for the Incident Evaluator.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::IncidentEvaluationRunId;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::IncidentNoteId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;
use crate::core::ingestion::TriggerType;

/// Analytical partition separating own-brand content from competitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Own-brand content.
    Claro,
    /// Competitor content.
    Competencia,
}

impl Scope {
    /// All scopes the evaluator sweeps per pass.
    pub const ALL: [Scope; 2] = [Scope::Claro, Scope::Competencia];
}

/// Incident severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentSeverity {
    /// Most severe: 30 minute SLA.
    Sev1,
    /// 4 hour SLA.
    Sev2,
    /// 24 hour SLA.
    Sev3,
    /// Least severe: 24 hour SLA, never auto-created (see evaluator skip rule).
    Sev4,
}

impl IncidentSeverity {
    /// Maps a weighted risk score in `[0,100]` to a severity level.
    #[must_use]
    pub fn from_risk_weighted(risk_weighted: f64) -> Self {
        if risk_weighted >= 80.0 {
            Self::Sev1
        } else if risk_weighted >= 60.0 {
            Self::Sev2
        } else if risk_weighted >= 40.0 {
            Self::Sev3
        } else {
            Self::Sev4
        }
    }

    /// SLA duration for this severity.
    #[must_use]
    pub fn sla_duration(self) -> time::Duration {
        match self {
            Self::Sev1 => time::Duration::minutes(30),
            Self::Sev2 => time::Duration::hours(4),
            Self::Sev3 | Self::Sev4 => time::Duration::hours(24),
        }
    }
}

/// Lifecycle status of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Newly created or escalated, unworked.
    Open,
    /// An analyst has acknowledged the incident.
    Acknowledged,
    /// An analyst is actively working the incident.
    InProgress,
    /// Terminal: resolved.
    Resolved,
    /// Terminal: dismissed without action.
    Dismissed,
}

impl IncidentStatus {
    /// Non-terminal statuses the state machine may act on.
    pub const ACTIVE: [IncidentStatus; 3] =
        [IncidentStatus::Open, IncidentStatus::Acknowledged, IncidentStatus::InProgress];

    /// Returns true when this status is one of the non-terminal states.
    #[must_use]
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

/// One reputational alert, at most one active per scope at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Stable identifier.
    pub id: IncidentId,
    /// Analytical scope the incident was raised in.
    pub scope: Scope,
    /// Current lifecycle status.
    pub status: IncidentStatus,
    /// Current severity.
    pub severity: IncidentSeverity,
    /// Weighted risk score in `[0,100]`, two decimal places.
    pub risk_score: f64,
    /// Count of classified items contributing to this computation.
    pub classified_items: u32,
    /// Analyst currently assigned, if any.
    pub owner_user_id: Option<UserId>,
    /// SLA deadline derived from severity.
    pub sla_due_at: OffsetDateTime,
    /// Earliest time a same-severity recomputation may create/escalate again.
    pub cooldown_until: OffsetDateTime,
    /// Version tag of the signal-computation algorithm that produced this row.
    pub signal_version: String,
    /// Snapshot of the computation that produced the current state.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
    /// Last update timestamp.
    pub updated_at: OffsetDateTime,
    /// Resolution timestamp, cleared on escalation.
    pub resolved_at: Option<OffsetDateTime>,
}

/// What the incident state machine decided to do with one scope's signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentDecision {
    /// `severity == Sev4` or no classified items at all.
    SkipSev4OrEmpty,
    /// No active incident existed; one was inserted.
    Created,
    /// An active incident existed at a lower severity rank; it was escalated.
    Escalated,
    /// An active incident existed at the same severity, still in cooldown.
    Deduped,
    /// An active incident existed at the same severity, past cooldown.
    Refreshed,
}

/// Decides the action for one scope given its classified-item count, the
/// newly computed severity, the scope's current active incident (if any),
/// and the current time. Pure: the store applies the write this implies
/// within the same transaction that read `active` under `FOR UPDATE`, so
/// the decision and the write never straddle two transactions.
#[must_use]
pub fn decide_incident_action(
    classified_items: u32,
    new_severity: IncidentSeverity,
    active: Option<&Incident>,
    now: OffsetDateTime,
) -> IncidentDecision {
    if new_severity == IncidentSeverity::Sev4 || classified_items == 0 {
        return IncidentDecision::SkipSev4OrEmpty;
    }
    let Some(active) = active else {
        return IncidentDecision::Created;
    };
    if new_severity < active.severity {
        IncidentDecision::Escalated
    } else if new_severity == active.severity && now < active.cooldown_until {
        IncidentDecision::Deduped
    } else {
        IncidentDecision::Refreshed
    }
}

/// An analyst note attached to an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentNote {
    /// Stable identifier.
    pub id: IncidentNoteId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Author of the note.
    pub author_user_id: UserId,
    /// Free-text note body.
    pub body: String,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// Status of one incident evaluator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentEvaluationStatus {
    /// In flight.
    Running,
    /// Finished without error.
    Completed,
    /// Finished with an unhandled error.
    Failed,
}

/// Record of one evaluator pass across both scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentEvaluationRun {
    /// Stable identifier.
    pub id: IncidentEvaluationRunId,
    /// What initiated this pass.
    pub trigger_type: TriggerType,
    /// Correlates this pass across logs and audit entries.
    pub request_id: Option<RequestId>,
    /// Current status.
    pub status: IncidentEvaluationStatus,
    /// Aggregate metrics, written on completion.
    pub metrics: Value,
    /// Truncated error message (at most 1000 chars), set only on failure.
    pub error_message: Option<String>,
    /// When the pass started.
    pub started_at: OffsetDateTime,
    /// When the pass finished, if it has.
    pub finished_at: Option<OffsetDateTime>,
}
