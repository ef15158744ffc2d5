// media-report/src/dispatch.rs
// ============================================================================
// Module: Dispatch Message
// Description: The report queue message shape (§4.6) and its validation.
// Purpose: Decode one dispatch before the worker acts on it.
// Dependencies: media-core, serde
// ============================================================================

use media_core::core::identifiers::ReportRunId;
use media_core::core::identifiers::RequestId;
use media_core::core::identifiers::UserId;
use serde::Deserialize;
use serde::Serialize;

/// Queue message dispatched to the report worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDispatch {
    /// Run to claim and process; required.
    pub report_run_id: ReportRunId,
    /// Correlates this run across logs and audit entries.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    /// Actor who requested this run, if manual.
    #[serde(default)]
    pub requested_by_user_id: Option<UserId>,
}
