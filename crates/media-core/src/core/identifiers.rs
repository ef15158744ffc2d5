// media-core/src/core/identifiers.rs
// ============================================================================
// Module: Domain Identifiers
// Description: Opaque newtype wrappers over UUIDv4 strings.
// Purpose: Prevent accidental cross-entity id mixing at compile time.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every entity id in the domain model is a distinct newtype over a string
//! UUID rather than a bare `String`, so a `TermId` cannot be passed where a
//! `RunId` is expected. Ids are opaque: callers construct them from an
//! already-validated UUIDv4 string (the Store is responsible for generation
//! and validation) rather than parsing here.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! domain_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an already-validated identifier string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

domain_id!(TermId, "Identifies a tracked query (the `term` in provider/worker payloads).");
domain_id!(RunId, "Identifies an ingestion run.");
domain_id!(ContentItemId, "Identifies a content item (article or social post).");
domain_id!(ClassificationId, "Identifies one classification row.");
domain_id!(IncidentId, "Identifies one incident.");
domain_id!(IncidentNoteId, "Identifies one incident note.");
domain_id!(IncidentEvaluationRunId, "Identifies one incident evaluator pass.");
domain_id!(ReportTemplateId, "Identifies a report template.");
domain_id!(ReportScheduleId, "Identifies a report schedule.");
domain_id!(ReportRunId, "Identifies a report run.");
domain_id!(ExportJobId, "Identifies an export job.");
domain_id!(AuditLogId, "Identifies an audit log entry.");
domain_id!(UserId, "Identifies an actor user.");
domain_id!(RequestId, "Correlates a unit of work across logs and audit entries.");

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::RunId;

    #[test]
    fn round_trips_through_display_and_as_str() {
        let id = RunId::new("11111111-1111-1111-1111-111111111111");
        assert_eq!(id.as_str(), "11111111-1111-1111-1111-111111111111");
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn distinct_ids_are_not_interchangeable_types() {
        fn takes_run_id(_: RunId) {}
        let run = RunId::from("some-run".to_string());
        takes_run_id(run);
    }
}
