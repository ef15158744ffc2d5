// media-cli/src/wiring.rs
// ============================================================================
// Module: Process Wiring
// Description: Builds every concrete adapter this process needs from
//              environment configuration.
// Purpose: Keep `main.rs`'s command bodies free of client-construction detail.
// Dependencies: aws-config, aws-sdk-*, media-config, media-core, media-store
// ============================================================================

//! ## Overview
//! [`load_config`] loads [`media_config::MediaConfig`] plus the one setting
//! it does not cover (the Postgres connection string, read from
//! `DATABASE_URL`; the Data-API triplet in `MediaConfig::db` targets a
//! managed proxy this workspace does not call directly). The `build_*`
//! functions each construct one concrete adapter; none of them touch
//! pipeline logic.

use std::sync::Arc;

use media_core::interfaces::EventSink;
use media_core::interfaces::FileEventSink;
use media_core::interfaces::NullEventSink;
use media_config::MediaConfig;
use media_config::MediaConfigError;
use media_providers::ProviderRegistry;
use media_store::PostgresStore;
use media_store::PostgresStoreConfig;
use media_store::PostgresStoreError;
use thiserror::Error;

/// Environment variable naming the Postgres connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable naming an optional event-log file path.
pub const ENV_EVENT_LOG_PATH: &str = "EVENT_LOG_PATH";

/// Failures constructing the process's concrete adapters.
#[derive(Debug, Error)]
pub enum WiringError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] MediaConfigError),
    /// The store could not be constructed.
    #[error(transparent)]
    Store(#[from] PostgresStoreError),
    /// `DATABASE_URL` was missing.
    #[error("missing required environment variable: {0}")]
    MissingDatabaseUrl(&'static str),
    /// The configured event log path could not be opened.
    #[error("failed to open event log: {0}")]
    EventLog(std::io::Error),
}

/// Loads process configuration from the environment.
///
/// # Errors
/// Returns [`WiringError`] when any required variable is missing or invalid.
pub fn load_config() -> Result<MediaConfig, WiringError> {
    Ok(MediaConfig::from_env()?)
}

/// Builds the Postgres-backed store, reading the connection string from
/// `DATABASE_URL` and pool sizing from `config.ingestion_provider_concurrency`
/// as a reasonable floor for the pool's max size.
///
/// # Errors
/// Returns [`WiringError`] when `DATABASE_URL` is absent or the pool cannot
/// be established.
pub fn build_store(config: &MediaConfig) -> Result<PostgresStore, WiringError> {
    let connection = std::env::var(ENV_DATABASE_URL).map_err(|_| WiringError::MissingDatabaseUrl(ENV_DATABASE_URL))?;
    let store_config = PostgresStoreConfig {
        connection,
        max_connections: config.ingestion_provider_concurrency.max(4),
        ..PostgresStoreConfig::default()
    };
    Ok(PostgresStore::new(&store_config)?)
}

/// Builds the provider registry. No concrete news-provider wiring is named
/// in the environment table this workspace validates; a deployment that
/// needs one registers `media_providers::HttpProviderAdapter` instances
/// against its own provider-specific secrets before handing the registry
/// to the ingestion worker. Empty is a legitimate default: an ingestion run
/// with no registered providers simply resolves zero targets per term.
#[must_use]
pub fn build_provider_registry() -> ProviderRegistry {
    ProviderRegistry::new()
}

/// Builds the raw-snapshot object store for the ingestion worker.
pub async fn build_raw_snapshot_store(config: &MediaConfig) -> media_ingestion::S3RawSnapshotStore {
    let aws_config = aws_config::load_from_env().await;
    let client = aws_sdk_s3::Client::new(&aws_config);
    media_ingestion::S3RawSnapshotStore::new(client, config.raw_bucket_name.clone())
}

/// Builds the channel object source for the social ingestion worker.
pub async fn build_social_object_source(config: &MediaConfig) -> media_social::S3ObjectSource {
    let aws_config = aws_config::load_from_env().await;
    let client = aws_sdk_s3::Client::new(&aws_config);
    media_social::S3ObjectSource::new(client, config.social_bucket_name.clone())
}

/// Builds the Bedrock-backed classification LLM client.
pub async fn build_llm_client() -> media_classification::BedrockLlmClient {
    let aws_config = aws_config::load_from_env().await;
    media_classification::BedrockLlmClient::new(aws_sdk_bedrockruntime::Client::new(&aws_config))
}

/// Builds the SES-backed report email sender.
pub async fn build_email_sender() -> media_report::SesEmailSender {
    let aws_config = aws_config::load_from_env().await;
    media_report::SesEmailSender::new(aws_sdk_sesv2::Client::new(&aws_config))
}

/// Builds the process event sink: a [`FileEventSink`] when `EVENT_LOG_PATH`
/// is set, otherwise [`NullEventSink`].
///
/// # Errors
/// Returns [`WiringError`] when the configured path cannot be opened.
pub fn build_event_sink() -> Result<Arc<dyn EventSink>, WiringError> {
    match std::env::var(ENV_EVENT_LOG_PATH) {
        Ok(path) if !path.trim().is_empty() => {
            let sink = FileEventSink::open(std::path::Path::new(&path)).map_err(WiringError::EventLog)?;
            Ok(Arc::new(sink))
        }
        _ => Ok(Arc::new(NullEventSink)),
    }
}
