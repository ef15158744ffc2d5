// media-core/src/interfaces/mod.rs
// ============================================================================
// Module: Interfaces
// Description: Backend-agnostic traits the workers depend on.
// Purpose: Let media-store, media-providers, and the worker crates vary
//          independently behind a stable boundary.
// Dependencies: async_trait (re-exported via workers), serde_json, thiserror
// ============================================================================

//! ## Overview
//! Three seams: [`Store`] (the transactional persistence façade, §4.7),
//! [`ProviderAdapter`] (one per news provider, §4.2), and [`EventSink`] (the
//! observability seam, §4.8). Workers are generic over these traits, never
//! over a concrete database or HTTP client.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::content::ContentItem;
use crate::core::content::Classification;
use crate::core::identifiers::ClassificationId;
use crate::core::identifiers::ContentItemId;
use crate::core::identifiers::ExportJobId;
use crate::core::identifiers::IncidentEvaluationRunId;
use crate::core::identifiers::ReportRunId;
use crate::core::identifiers::ReportScheduleId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TermId;
use crate::core::identifiers::UserId;
use crate::core::incident::Incident;
use crate::core::incident::IncidentDecision;
use crate::core::incident::IncidentSeverity;
use crate::core::incident::Scope;
use crate::core::ingestion::IngestionRun;
use crate::core::ingestion::IngestionRunContentLink;
use crate::core::ingestion::IngestionRunItem;
use crate::core::ingestion::TriggerType;
use crate::core::query::TrackedQuery;
use crate::core::report::ReportRun;
use crate::core::report::ReportSchedule;
use crate::core::report::ReportTemplate;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Error taxonomy returned by the [`Store`], matching the core error design (§7).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed input from the caller; never retried.
    #[error("validation: {0}")]
    Validation(String),
    /// Missing referenced resource.
    #[error("not found: {0}")]
    NotFound(String),
    /// Unique-constraint violation or no-op update.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Role check failed.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Environment not wired correctly; fatal for the current message.
    #[error("misconfigured: {0}")]
    Misconfigured(String),
    /// Upstream database error classified as transient.
    #[error("transient upstream: {0}")]
    TransientUpstream(String),
    /// Catch-all; message is truncated to 1000 chars by callers before storage.
    #[error("internal: {0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Ingestion Store Surface
// ============================================================================

/// Result of attempting to claim an ingestion run.
#[derive(Debug, Clone)]
pub enum RunClaim {
    /// The run was claimed (or re-claimed after going stale) and is now `Running`.
    Proceed(IngestionRun),
    /// The run had already reached `Completed`.
    SkippedAlreadyCompleted,
    /// The run is `Running` and within the stale window.
    SkippedAlreadyRunning,
}

/// Fields needed to upsert a content item by canonical URL.
#[derive(Debug, Clone)]
pub struct ContentItemUpsert {
    /// Unique natural key.
    pub canonical_url: String,
    /// Origin of the item.
    pub source_type: crate::core::content::SourceType,
    /// Tracked query this item was found under, if any; COALESCEd against the existing row.
    pub term_id: Option<TermId>,
    /// Provider or channel identifier.
    pub provider: String,
    /// Human-readable source name, if known.
    pub source_name: Option<String>,
    /// Upstream identifier assigned by the source, if any.
    pub source_id: Option<String>,
    /// Normalized, length-capped title.
    pub title: String,
    /// Normalized, length-capped summary.
    pub summary: Option<String>,
    /// Normalized, length-capped body.
    pub content: Option<String>,
    /// Hero image URL, if any.
    pub image_url: Option<String>,
    /// Language of the item.
    pub language: Option<String>,
    /// Source-provided category label.
    pub category: Option<String>,
    /// When the source published the item.
    pub published_at: Option<OffsetDateTime>,
    /// Source-reliability score.
    pub source_score: Option<f64>,
    /// Object-store key of the raw payload snapshot.
    pub raw_payload_s3_key: Option<String>,
    /// Free-form metadata.
    pub metadata: Value,
}

/// Outcome of one content-item upsert.
#[derive(Debug, Clone)]
pub struct ContentItemUpsertOutcome {
    /// Identifier of the (possibly pre-existing) content item.
    pub content_item_id: ContentItemId,
    /// Whether this call inserted a brand-new row.
    pub newly_inserted: bool,
}

// ============================================================================
// SECTION: Store Trait
// ============================================================================

/// Transactional persistence façade over the relational store.
///
/// Every method that mutates state also appends exactly one [`crate::AuditLog`]
/// entry in the same transaction (§3, §8 invariant 5); implementations are
/// responsible for this pairing, not callers.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // -- Tracked queries --------------------------------------------------

    /// Loads a tracked query by id.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when no such query exists.
    async fn get_tracked_query(&self, id: &TermId) -> Result<TrackedQuery, StoreError>;

    /// Resolves a tracked query by its `(name, language)` unique key.
    async fn find_tracked_query_by_name(
        &self,
        name: &str,
        language: &str,
    ) -> Result<Option<TrackedQuery>, StoreError>;

    /// Lists active queries, most recently updated first, capped at `limit`.
    async fn list_active_tracked_queries(&self, limit: u32) -> Result<Vec<TrackedQuery>, StoreError>;

    /// Appends a revision snapshot and increments `current_revision`.
    async fn append_tracked_query_revision(
        &self,
        query_id: &TermId,
        change_reason: &str,
        actor: &UserId,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError>;

    // -- Ingestion ----------------------------------------------------------

    /// Claims (or reports the terminal state of) an ingestion run.
    async fn claim_ingestion_run(
        &self,
        run_id: &RunId,
        trigger_type: TriggerType,
        language: Option<&str>,
        effective_max_articles_per_term: u32,
        request_id: Option<&RequestId>,
        now: OffsetDateTime,
    ) -> Result<RunClaim, StoreError>;

    /// Ensures an ad-hoc (manual-term) tracked query row exists and returns its id.
    async fn ensure_adhoc_tracked_query(
        &self,
        name: &str,
        language: &str,
        actor: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<TermId, StoreError>;

    /// Upserts a content item by canonical URL.
    async fn upsert_content_item(
        &self,
        upsert: &ContentItemUpsert,
        request_id: Option<&RequestId>,
    ) -> Result<ContentItemUpsertOutcome, StoreError>;

    /// Inserts run-content links for items newly attributed to this run.
    async fn insert_run_content_links(
        &self,
        links: &[IngestionRunContentLink],
    ) -> Result<(), StoreError>;

    /// Replaces all `IngestionRunItem` rows for a run with the aggregated totals.
    async fn replace_run_items(
        &self,
        run_id: &RunId,
        items: &[IngestionRunItem],
    ) -> Result<(), StoreError>;

    /// Marks a run `Completed` with final metrics, or `Failed` with a truncated error.
    async fn finish_ingestion_run(
        &self,
        run_id: &RunId,
        metrics: Value,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError>;

    // -- Classification -------------------------------------------------------

    /// Selects up to `limit` active news content items published/created on or
    /// after `window_start` with no classification row for `(prompt_version, model_id)`.
    async fn select_pending_classification_targets(
        &self,
        window_start: OffsetDateTime,
        prompt_version: &str,
        model_id: &str,
        limit: u32,
    ) -> Result<Vec<ContentItemId>, StoreError>;

    /// Loads a content item's classification-relevant fields.
    async fn get_content_item(&self, id: &ContentItemId) -> Result<ContentItem, StoreError>;

    /// Returns the manual override classification for a content item, if any.
    async fn find_override_classification(
        &self,
        content_item_id: &ContentItemId,
    ) -> Result<Option<Classification>, StoreError>;

    /// Upserts an auto-classification row; never overwrites an override.
    async fn upsert_auto_classification(
        &self,
        classification: &Classification,
        request_id: Option<&RequestId>,
    ) -> Result<ClassificationId, StoreError>;

    // -- Incidents --------------------------------------------------------

    /// Loads `(content item, latest applicable classification, weight)` triples
    /// for the 7-day active-news window, per scope.
    async fn load_classified_window(
        &self,
        scope: Scope,
        window_start: OffsetDateTime,
    ) -> Result<Vec<ClassifiedWindowEntry>, StoreError>;

    /// Atomically reads the scope's active (non-terminal) incident under a
    /// row lock, decides the state-machine action via
    /// [`crate::core::incident::decide_incident_action`], and applies the
    /// resulting write (insert/escalate/refresh), all within one
    /// transaction, so two concurrent callers can never both observe "no
    /// active incident" and both insert.
    #[allow(clippy::too_many_arguments, reason = "Mirrors the state machine's own signal+severity+cooldown inputs.")]
    async fn apply_incident_decision(
        &self,
        scope: Scope,
        risk_score: f64,
        classified_items: u32,
        new_severity: IncidentSeverity,
        cooldown_minutes: u32,
        signal_version: &str,
        payload: Value,
        now: OffsetDateTime,
        request_id: Option<&RequestId>,
    ) -> Result<IncidentDecision, StoreError>;

    /// Starts a new evaluator pass record.
    async fn start_incident_evaluation_run(
        &self,
        trigger_type: TriggerType,
        request_id: Option<&RequestId>,
        now: OffsetDateTime,
    ) -> Result<IncidentEvaluationRunId, StoreError>;

    /// Finalizes an evaluator pass record.
    async fn finish_incident_evaluation_run(
        &self,
        id: &IncidentEvaluationRunId,
        metrics: Value,
        error_message: Option<String>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError>;

    // -- Reports ------------------------------------------------------------

    /// Conditionally updates a report run `queued -> running`. `None` means a duplicate delivery.
    async fn claim_report_run(
        &self,
        id: &ReportRunId,
        now: OffsetDateTime,
    ) -> Result<Option<ReportRun>, StoreError>;

    /// Loads a report run's template (and schedule, if any).
    async fn load_report_template(&self, id: &ReportRunId) -> Result<(ReportTemplate, Option<ReportSchedule>), StoreError>;

    /// Returns aggregated KPIs for the given scope/filters over a 7-day window.
    async fn aggregate_monitor_kpis(&self, filters: &Value) -> Result<Value, StoreError>;

    /// Lists incidents currently in a non-terminal status.
    async fn list_active_incidents(&self) -> Result<Vec<Incident>, StoreError>;

    /// Lists up to `limit` top content items matching the template's filters.
    async fn list_top_content(&self, filters: &Value, limit: u32) -> Result<Vec<ContentItem>, StoreError>;

    /// Creates a queued export job.
    async fn create_export_job(
        &self,
        filters: Value,
        requested_by_user_id: Option<&UserId>,
        request_id: Option<&RequestId>,
    ) -> Result<ExportJobId, StoreError>;

    /// Writes the terminal state of a report run in one update.
    #[allow(clippy::too_many_arguments, reason = "mirrors the single terminal-write transaction described in the report worker contract")]
    async fn finish_report_run(
        &self,
        id: &ReportRunId,
        status: crate::core::report::ReportRunStatus,
        confidence: Option<f64>,
        summary: Option<String>,
        recommendations: Vec<String>,
        blocked_reason: Option<String>,
        export_job_id: Option<ExportJobId>,
        now: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// Atomically selects due schedules, inserts a queued run per slot (collapsing
    /// duplicates via `idempotency_key`), and advances `next_run_at`.
    async fn enqueue_due_report_schedules(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<ReportRunId>, StoreError>;

    // -- Social ingestion -----------------------------------------------------

    /// Claims a social object identified by `(bucket, key, e_tag, last_modified)`
    /// for processing. Returns `false` without side effects if this exact mark
    /// was already recorded, so reprocessing the same object is a no-op.
    async fn claim_social_object(
        &self,
        channel: &str,
        bucket: &str,
        key: &str,
        e_tag: &str,
        last_modified: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    /// Sums post and engagement totals for a channel since `window_start`.
    async fn aggregate_social_channel_totals(
        &self,
        channel: &str,
        window_start: OffsetDateTime,
    ) -> Result<Value, StoreError>;

    /// Persists a channel's reconciliation snapshot for one ingestion pass.
    async fn write_social_reconciliation_snapshot(
        &self,
        snapshot: &crate::core::social::SocialReconciliationSnapshot,
        request_id: Option<&RequestId>,
    ) -> Result<(), StoreError>;

    // -- Audit --------------------------------------------------------------

    /// Appends an audit entry in the caller's current transaction.
    async fn append_audit_log(
        &self,
        action: &'static str,
        resource_type: &'static str,
        resource_id: &str,
        actor_user_id: Option<&UserId>,
        request_id: Option<&RequestId>,
        before: Option<Value>,
        after: Value,
        now: OffsetDateTime,
    ) -> Result<(), StoreError>;
}

/// One row of the incident evaluator's classified-window scan.
#[derive(Debug, Clone)]
pub struct ClassifiedWindowEntry {
    /// Content item this entry describes.
    pub content_item_id: ContentItemId,
    /// Provider that supplied the item.
    pub provider: String,
    /// Source name within the provider, if known.
    pub source_name: Option<String>,
    /// Fallback source-reliability score.
    pub source_score: Option<f64>,
    /// Most recent applicable classification (override first, else latest by createdAt).
    pub classification: Option<Classification>,
}

// ============================================================================
// SECTION: Provider Adapter
// ============================================================================

/// Error returned by a provider adapter fetch.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream returned HTTP 429.
    #[error("rate limited: {0}")]
    RateLimit(String),
    /// Upstream rejected credentials.
    #[error("auth failure: {0}")]
    Auth(String),
    /// The request exceeded its per-attempt deadline.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Upstream returned a 5xx.
    #[error("upstream 5xx: {0}")]
    Upstream5xx(String),
    /// Upstream response could not be parsed into the expected shape.
    #[error("schema error: {0}")]
    Schema(String),
    /// Anything else.
    #[error("unknown provider error: {0}")]
    Unknown(String),
}

/// One normalized article returned by a provider adapter.
#[derive(Debug, Clone)]
pub struct NormalizedArticle {
    /// Canonicalized URL, the dedupe key.
    pub canonical_url: String,
    /// Normalized, length-capped title.
    pub title: String,
    /// Human-readable source name, if known.
    pub source_name: Option<String>,
    /// Upstream identifier assigned by the source, if any.
    pub source_id: Option<String>,
    /// Byline, if any.
    pub author: Option<String>,
    /// Normalized, length-capped summary.
    pub summary: Option<String>,
    /// Normalized, length-capped body.
    pub content: Option<String>,
    /// Hero image URL, if any.
    pub image_url: Option<String>,
    /// ISO publication timestamp, if known.
    pub published_at: Option<OffsetDateTime>,
    /// Language of the article, if known.
    pub language: Option<String>,
    /// Source-provided category label, if any.
    pub category: Option<String>,
    /// Free-form metadata (country hints, etc.).
    pub metadata: BTreeMap<String, Value>,
}

/// Outcome of one adapter fetch for one term.
#[derive(Debug, Clone)]
pub struct ProviderFetchResult {
    /// Provider identifier.
    pub provider: String,
    /// Term queried.
    pub term: String,
    /// Normalized articles returned, before query/execution filtering.
    pub items: Vec<NormalizedArticle>,
    /// The request URL actually issued, for observability.
    pub request_url: String,
    /// Raw count returned by the upstream, before normalization drops invalid rows.
    pub raw_count: u32,
    /// Wall-clock fetch duration.
    pub duration_ms: u64,
    /// Classified error, if the fetch failed; `items` is empty in that case.
    pub error: Option<ProviderError>,
}

/// One adapter per news provider.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider identifier, e.g. `reuters`, `ap`.
    fn provider_id(&self) -> &str;

    /// Fetches up to `max_articles` normalized articles for `query`.
    async fn fetch(
        &self,
        query: &str,
        term: &str,
        max_articles: u32,
    ) -> ProviderFetchResult;
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Routes structured worker events to wherever the host wants them.
///
/// This workspace carries no `tracing`/`log` dependency; every event is a
/// plain serializable struct handed to a sink the host chooses.
pub trait EventSink: Send + Sync {
    /// Emits one event. Implementations must not panic or block indefinitely;
    /// a failing sink should drop the event rather than abort the caller.
    fn emit(&self, event: &Value);
}

/// An [`EventSink`] that discards every event; the default for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &Value) {}
}

/// An [`EventSink`] that appends one JSON line per event to a file.
///
/// Intentionally lightweight so a deployment can route events into its
/// preferred log-shipping pipeline without redesign: open the path, tail it.
pub struct FileEventSink {
    file: std::sync::Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens `path` in append mode, creating it if absent.
    ///
    /// # Errors
    /// Returns the underlying [`std::io::Error`] if the file cannot be opened.
    pub fn open(path: &std::path::Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: std::sync::Mutex::new(file) })
    }
}

impl EventSink for FileEventSink {
    fn emit(&self, event: &Value) {
        use std::io::Write;
        let Ok(payload) = serde_json::to_string(event) else { return };
        let Ok(mut file) = self.file.lock() else { return };
        let _ = writeln!(file, "{payload}");
        let _ = file.flush();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod event_sink_tests {
    use super::EventSink;
    use super::FileEventSink;
    use serde_json::json;

    #[test]
    fn appends_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::open(&path).unwrap();
        sink.emit(&json!({"event": "a"}));
        sink.emit(&json!({"event": "b"}));
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"a\""));
        assert!(lines[1].contains("\"b\""));
    }
}
