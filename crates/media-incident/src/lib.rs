// media-incident/src/lib.rs
// ============================================================================
// Module: Media Incident Library
// Description: The incident evaluator: window aggregation, the per-scope
//              state machine, and the evaluator pass orchestration.
// Purpose: Public API surface consumed by media-cli's incident subcommands.
// Dependencies: media-core
// ============================================================================

//! ## Overview
//! [`aggregate`] folds a scope's classified-window scan into a
//! [`aggregate::ScopeSignal`]; [`state_machine`] decides and applies exactly
//! one action (create/escalate/dedupe/refresh/skip) against the scope's
//! current active incident; [`evaluator`] runs both across one pass and
//! records the evaluation run.

pub mod aggregate;
pub mod evaluator;
pub mod state_machine;
#[cfg(test)]
mod test_support;

pub use aggregate::ScopeSignal;
pub use evaluator::EvaluatorError;
pub use evaluator::EvaluatorSettings;
pub use evaluator::run_evaluation;
pub use state_machine::Decision;
pub use state_machine::apply_scope;
pub use state_machine::decide;
