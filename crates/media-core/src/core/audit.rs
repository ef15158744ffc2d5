// media-core/src/core/audit.rs
// ============================================================================
// Module: Audit Log
// Description: Append-only record of administrative and pipeline decisions.
// Purpose: One entry per mutating operation, written in the state change's
//          own transaction.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::AuditLogId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;

/// An append-only audit entry.
///
/// Every mutating operation of the core appends exactly one entry inside the
/// same transaction as the state change it describes; see
/// [`crate::Store::append_audit_log`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Stable identifier.
    pub id: AuditLogId,
    /// Actor who performed the action, if the action was user-initiated.
    pub actor_user_id: Option<UserId>,
    /// Short machine-readable action name, e.g. `incident_auto_escalated`.
    pub action: &'static str,
    /// Kind of resource mutated, e.g. `incident`, `ingestion_run`, `report_run`.
    pub resource_type: &'static str,
    /// Identifier of the mutated resource.
    pub resource_id: String,
    /// Correlates this entry with the unit of work that produced it.
    pub request_id: Option<RequestId>,
    /// State snapshot before the mutation, when applicable.
    pub before: Option<Value>,
    /// State snapshot after the mutation.
    pub after: Value,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}
