// media-report/src/lib.rs
// ============================================================================
// Module: Media Report Library
// Description: Confidence scoring, recommendation rules, verified-recipient
//              email, and the report worker that ties them together.
// Purpose: Public API surface consumed by media-cli's report subcommands.
// Dependencies: media-core, aws-sdk-sesv2
// ============================================================================

//! ## Overview
//! [`confidence`] extracts [`confidence::MonitorSignals`] from the store's
//! KPI JSON and scores them; [`recommendations`] applies the deterministic
//! rule set; [`email`] holds the [`email::EmailSender`] seam and the
//! verified-recipient delivery logic; [`worker`] is the single entry point
//! that claims a run and drives it to a terminal state.

pub mod confidence;
pub mod dispatch;
pub mod email;
pub mod recommendations;
pub mod worker;
#[cfg(test)]
mod test_support;

pub use confidence::MonitorSignals;
pub use dispatch::ReportDispatch;
pub use email::EmailSender;
pub use email::EmailSenderError;
pub use email::SesEmailSender;
pub use worker::WorkerError;
pub use worker::WorkerOutcome;
pub use worker::run_report;
