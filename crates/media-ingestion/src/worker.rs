// media-ingestion/src/worker.rs
// ============================================================================
// Module: Ingestion Worker
// Description: Orchestrates claim, target resolution, per-target fetch, and
//              the §4.3 persistence ordering for one dispatch.
// Purpose: The single entry point the queue consumer (media-cli) invokes.
// Dependencies: media-core, media-providers, serde_json, time
// ============================================================================

//! ## Overview
//! [`run_ingestion`] is the only public entry point: it claims the run,
//! resolves targets (§4.3 step 2), fetches each target through
//! [`crate::pipeline`], persists in the documented order, and finishes the
//! run. Everything it reports goes through [`media_core::EventSink`], never
//! a logging crate, matching the rest of this workspace's workers.

use std::collections::HashSet;
use std::sync::Arc;

use media_core::EventSink;
use media_core::StoreError;
use media_core::core::content::SourceType;
use media_core::core::identifiers::RunId;
use media_core::core::identifiers::TermId;
use media_core::core::ingestion::IngestionRunContentLink;
use media_core::core::ingestion::IngestionRunItem;
use media_core::core::ingestion::RunItemStatus;
use media_core::core::ingestion::TriggerType;
use media_core::core::query::ExecutionConfig;
use media_core::core::query::QueryDefinition;
use media_core::interfaces::ContentItemUpsert;
use media_core::interfaces::ProviderFetchResult;
use media_core::interfaces::RunClaim;
use media_core::interfaces::Store;
use media_providers::ProviderRegistry;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Semaphore;

use crate::dispatch::IngestionDispatch;
use crate::object_store::RawSnapshotStore;
use crate::object_store::raw_snapshot_key;
use crate::object_store::slugify;
use crate::pipeline;
use crate::targets::IngestionTarget;
use crate::targets::resolve_targets;

/// Error truncation budget applied before writing `IngestionRun.error_message`.
const MAX_ERROR_MESSAGE_LEN: usize = 1000;

/// Errors that abort a dispatch before it reaches a terminal run state.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while processing an already-claimed run; captured into the
/// run's terminal `failed` state rather than propagated.
#[derive(Debug, Error)]
enum ProcessError {
    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Writing the raw snapshot failed.
    #[error(transparent)]
    RawSnapshot(#[from] crate::object_store::RawSnapshotStoreError),
}

/// Outcome of handling one dispatch.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    /// The run was already completed; nothing was done.
    SkippedAlreadyCompleted,
    /// The run is already in flight within the stale window; nothing was done.
    SkippedAlreadyRunning,
    /// The run reached a terminal state; `metrics` mirrors what was persisted.
    Finished {
        /// Final aggregated metrics, as written to `IngestionRun.metrics`.
        metrics: Value,
    },
}

/// Handles one ingestion dispatch end to end.
///
/// # Errors
/// Returns [`WorkerError`] only for failures before a run is claimed; once
/// claimed, failures are captured in the run's terminal `failed` state and
/// this function still returns `Ok`.
#[allow(clippy::too_many_arguments, reason = "mirrors the single-pass worker entry point's parameter set")]
pub async fn run_ingestion(
    store: &dyn Store,
    registry: &ProviderRegistry,
    raw_store: &dyn RawSnapshotStore,
    events: &dyn EventSink,
    provider_concurrency: u32,
    default_language: &str,
    env_default_terms: &[String],
    dispatch: &IngestionDispatch,
) -> Result<WorkerOutcome, WorkerError> {
    let now = OffsetDateTime::now_utc();
    let run_id = dispatch.resolve_run_id();
    let effective_max = dispatch.effective_max_articles_per_term();

    let claim = store
        .claim_ingestion_run(
            &run_id,
            dispatch.trigger_type,
            dispatch.language.as_deref(),
            effective_max,
            dispatch.request_id.as_ref(),
            now,
        )
        .await?;

    let run = match claim {
        RunClaim::SkippedAlreadyCompleted => {
            events.emit(&json!({"event": "ingestion.skipped", "reason": "run_already_completed", "runId": run_id.as_str()}));
            return Ok(WorkerOutcome::SkippedAlreadyCompleted);
        }
        RunClaim::SkippedAlreadyRunning => {
            events.emit(&json!({"event": "ingestion.skipped", "reason": "run_already_running", "runId": run_id.as_str()}));
            return Ok(WorkerOutcome::SkippedAlreadyRunning);
        }
        RunClaim::Proceed(run) => run,
    };

    match process_claimed_run(
        store,
        registry,
        raw_store,
        events,
        provider_concurrency,
        default_language,
        env_default_terms,
        dispatch,
        &run.id,
        effective_max,
        run.trigger_type,
        dispatch.dry_run,
    )
    .await
    {
        Ok(metrics) => {
            store.finish_ingestion_run(&run.id, metrics.clone(), None, OffsetDateTime::now_utc()).await?;
            Ok(WorkerOutcome::Finished { metrics })
        }
        Err(err) => {
            let message = err.to_string();
            let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
            events.emit(&json!({"event": "ingestion.failed", "runId": run.id.as_str(), "error": truncated}));
            store
                .finish_ingestion_run(&run.id, json!({}), Some(truncated), OffsetDateTime::now_utc())
                .await?;
            Ok(WorkerOutcome::Finished { metrics: json!({}) })
        }
    }
}

#[allow(clippy::too_many_arguments, reason = "mirrors the single-pass worker entry point's parameter set")]
async fn process_claimed_run(
    store: &dyn Store,
    registry: &ProviderRegistry,
    raw_store: &dyn RawSnapshotStore,
    events: &dyn EventSink,
    provider_concurrency: u32,
    default_language: &str,
    env_default_terms: &[String],
    dispatch: &IngestionDispatch,
    run_id: &RunId,
    effective_max: u32,
    trigger_type: TriggerType,
    dry_run: bool,
) -> Result<Value, ProcessError> {
    let targets = resolve_targets(store, dispatch, default_language, env_default_terms).await?;
    let concurrency = Arc::new(Semaphore::new(provider_concurrency.max(1) as usize));
    let trigger_slug = match trigger_type {
        TriggerType::Scheduled => "scheduled",
        TriggerType::Manual => "manual",
    };
    let date = now_date_string();

    let mut run_items: Vec<IngestionRunItem> = Vec::new();
    let mut linked_urls: HashSet<String> = HashSet::new();
    let mut newly_linked_total: u32 = 0;
    let mut targets_skipped_no_providers = 0u32;

    for target in &targets {
        let (term_id, definition, execution, provider_query, target_max) =
            materialize_target(store, dispatch, target, effective_max, dry_run).await?;
        let m = pipeline::effective_cap(effective_max, target_max);
        let providers = pipeline::select_providers(registry, &execution);
        if providers.is_empty() {
            targets_skipped_no_providers += 1;
            events.emit(&json!({"event": "ingestion.target_skipped", "reason": "no_eligible_providers", "term": target.name()}));
            continue;
        }

        let outcome = pipeline::fetch_target(
            &providers,
            &concurrency,
            &provider_query,
            target.name(),
            &definition,
            &execution,
            m,
        )
        .await;

        let snapshot_key = raw_snapshot_key(&date, run_id.as_str(), trigger_slug, &slugify(target.name()));
        if !dry_run {
            let snapshot_body = serde_json::to_vec(&serializable_raw_results(&outcome.raw_results))
                .unwrap_or_default();
            raw_store.put(&snapshot_key, snapshot_body).await?;
        }

        let mut links_for_target = Vec::new();
        let mut persisted_by_provider: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
        for accepted in &outcome.accepted {
            if dry_run {
                if linked_urls.insert(accepted.article.canonical_url.clone()) {
                    newly_linked_total += 1;
                    *persisted_by_provider.entry(accepted.provider.clone()).or_insert(0) += 1;
                }
                continue;
            }

            let upsert = ContentItemUpsert {
                canonical_url: accepted.article.canonical_url.clone(),
                source_type: SourceType::News,
                term_id: Some(term_id.clone()),
                provider: accepted.provider.clone(),
                source_name: accepted.article.source_name.clone(),
                source_id: accepted.article.source_id.clone(),
                title: accepted.article.title.clone(),
                summary: accepted.article.summary.clone(),
                content: accepted.article.content.clone(),
                image_url: accepted.article.image_url.clone(),
                language: accepted.article.language.clone(),
                category: accepted.article.category.clone(),
                published_at: accepted.article.published_at,
                source_score: None,
                raw_payload_s3_key: Some(snapshot_key.clone()),
                metadata: Value::Object(
                    accepted.article.metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                ),
            };
            let upsert_outcome = store.upsert_content_item(&upsert, dispatch.request_id.as_ref()).await?;

            if linked_urls.insert(accepted.article.canonical_url.clone()) {
                links_for_target.push(IngestionRunContentLink {
                    run_id: run_id.clone(),
                    content_item_id: upsert_outcome.content_item_id,
                    canonical_url: accepted.article.canonical_url.clone(),
                    provider: accepted.provider.clone(),
                    term_id: term_id.clone(),
                });
                newly_linked_total += 1;
                *persisted_by_provider.entry(accepted.provider.clone()).or_insert(0) += 1;
            }
        }
        if !dry_run && !links_for_target.is_empty() {
            store.insert_run_content_links(&links_for_target).await?;
        }

        for raw in &outcome.raw_results {
            run_items.push(IngestionRunItem {
                run_id: run_id.clone(),
                provider: raw.provider.clone(),
                term: target.name().to_string(),
                fetched_count: raw.raw_count,
                persisted_count: persisted_by_provider.get(&raw.provider).copied().unwrap_or(0),
                latency_ms: raw.duration_ms,
                status: if raw.error.is_some() { RunItemStatus::Failed } else { RunItemStatus::Completed },
                error_message: raw.error.as_ref().map(std::string::ToString::to_string),
            });
        }
    }

    if !dry_run {
        store.replace_run_items(run_id, &run_items).await?;
    }

    Ok(json!({
        "targetsResolved": targets.len(),
        "targetsSkippedNoProviders": targets_skipped_no_providers,
        "providerResults": run_items.len(),
        "persistedCount": newly_linked_total,
        "dryRun": dry_run,
    }))
}

/// Ensures the tracked query row exists for a target (§4.3 persistence step 1)
/// and returns the fields the pipeline needs.
async fn materialize_target(
    store: &dyn Store,
    dispatch: &IngestionDispatch,
    target: &IngestionTarget,
    effective_max: u32,
    dry_run: bool,
) -> Result<(TermId, QueryDefinition, ExecutionConfig, String, u32), StoreError> {
    match target {
        IngestionTarget::Tracked(query) => Ok((
            query.id.clone(),
            query.definition.clone(),
            query.execution.clone(),
            query.compiled_provider_query.clone(),
            query.max_articles_per_run,
        )),
        IngestionTarget::AdHoc { name, language } => {
            let term_id = if dry_run {
                TermId::from(format!("dry-run:{name}"))
            } else {
                store
                    .ensure_adhoc_tracked_query(name, language, None, dispatch.request_id.as_ref())
                    .await?
            };
            let definition = QueryDefinition {
                include: vec![media_logic::Term::Phrase { value: name.clone() }],
                any: vec![],
                exclude: vec![],
            };
            let provider_query = definition.compile_provider_query();
            let execution = ExecutionConfig {
                providers_allow: vec![],
                providers_deny: vec![],
                domains_allow: vec![],
                domains_deny: vec![],
                countries_allow: vec![],
                countries_deny: vec![],
            };
            Ok((term_id, definition, execution, provider_query, effective_max))
        }
    }
}

/// Converts per-provider fetch results into the JSON array stored alongside
/// the raw snapshot.
fn serializable_raw_results(results: &[ProviderFetchResult]) -> Value {
    Value::Array(
        results
            .iter()
            .map(|result| {
                json!({
                    "provider": result.provider,
                    "term": result.term,
                    "requestUrl": result.request_url,
                    "rawCount": result.raw_count,
                    "durationMs": result.duration_ms,
                    "error": result.error.as_ref().map(std::string::ToString::to_string),
                    "itemCount": result.items.len(),
                })
            })
            .collect(),
    )
}

/// Today's date as `YYYY-MM-DD`, used as a raw snapshot key prefix.
fn now_date_string() -> String {
    let now = OffsetDateTime::now_utc();
    format!("{:04}-{:02}-{:02}", now.year(), u8::from(now.month()), now.day())
}
