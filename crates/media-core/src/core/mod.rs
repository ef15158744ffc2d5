// media-core/src/core/mod.rs
// ============================================================================
// Module: Core Domain Types
// Description: Entities, identifiers, hashing, and event payloads.
// Purpose: Backend-agnostic domain model shared by every worker crate.
// Dependencies: serde, time, sha2, serde_jcs
// ============================================================================

pub mod content;
pub mod events;
pub mod hashing;
pub mod identifiers;
pub mod incident;
pub mod ingestion;
pub mod query;
pub mod report;
pub mod social;

pub use content::Classification;
pub use content::ContentItem;
pub use content::ContentState;
pub use content::ContentStateEvent;
pub use content::Sentimiento;
pub use content::SourceType;

pub use events::ClassificationJobEvent;
pub use events::IncidentEvaluationEvent;
pub use events::IngestionRunEvent;
pub use events::ReportRunEvent;
pub use events::SocialIngestionEvent;

pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::hash_bytes;
pub use hashing::hash_canonical_json;

pub use identifiers::AuditLogId;
pub use identifiers::ClassificationId;
pub use identifiers::ContentItemId;
pub use identifiers::ExportJobId;
pub use identifiers::IncidentEvaluationRunId;
pub use identifiers::IncidentId;
pub use identifiers::IncidentNoteId;
pub use identifiers::ReportRunId;
pub use identifiers::ReportScheduleId;
pub use identifiers::ReportTemplateId;
pub use identifiers::RequestId;
pub use identifiers::RunId;
pub use identifiers::TermId;
pub use identifiers::UserId;

pub use incident::Incident;
pub use incident::IncidentEvaluationRun;
pub use incident::IncidentNote;
pub use incident::IncidentSeverity;
pub use incident::IncidentStatus;
pub use incident::Scope;

pub use ingestion::IngestionRun;
pub use ingestion::IngestionRunContentLink;
pub use ingestion::IngestionRunItem;
pub use ingestion::RunItemStatus;
pub use ingestion::RunStatus;
pub use ingestion::TriggerType;

pub use query::ExecutionConfig;
pub use query::QueryDefinition;
pub use query::TrackedQuery;
pub use query::TrackedQueryRevision;

pub use report::ExportJob;
pub use report::ExportJobStatus;
pub use report::ReportRun;
pub use report::ReportRunStatus;
pub use report::ReportSchedule;
pub use report::ReportScheduleFrequency;
pub use report::ReportTemplate;

pub use social::RECONCILIATION_TOLERANCE;
pub use social::SocialReconciliationSnapshot;
pub use social::SocialReconciliationStatus;

pub use crate::core::audit::AuditLog;

pub mod audit;
