// media-config/src/lib.rs
// ============================================================================
// Module: Media Config
// Description: Fail-closed environment configuration for every worker.
// Purpose: Load and validate the environment variable table (spec §6).
// Dependencies: media-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Every environment variable the core consumes is named as a constant here
//! and loaded through [`MediaConfig::from_env`], which fails closed: a
//! missing or invalid value is a [`MediaConfigError`], never a silently
//! applied default beyond the ones the specification itself names.

use std::collections::HashMap;
use std::env::VarError;
use std::sync::Mutex;
use std::sync::OnceLock;

use thiserror::Error;

// ============================================================================
// SECTION: Environment Variable Names
// ============================================================================

/// AWS region used by every AWS SDK client.
pub const ENV_AWS_REGION: &str = "AWS_REGION";
/// Relational-database resource ARN.
pub const ENV_DB_RESOURCE_ARN: &str = "DB_RESOURCE_ARN";
/// Relational-database secret ARN.
pub const ENV_DB_SECRET_ARN: &str = "DB_SECRET_ARN";
/// Relational-database name.
pub const ENV_DB_NAME: &str = "DB_NAME";
/// Bucket holding raw ingestion snapshots.
pub const ENV_RAW_BUCKET_NAME: &str = "RAW_BUCKET_NAME";
/// Bucket holding rendered CSV exports.
pub const ENV_EXPORT_BUCKET_NAME: &str = "EXPORT_BUCKET_NAME";
/// Queue URL the export worker consumes.
pub const ENV_EXPORT_QUEUE_URL: &str = "EXPORT_QUEUE_URL";
/// TTL in seconds for pre-signed export URLs.
pub const ENV_EXPORT_SIGNED_URL_SECONDS: &str = "EXPORT_SIGNED_URL_SECONDS";
/// Queue URL the report worker consumes.
pub const ENV_REPORT_QUEUE_URL: &str = "REPORT_QUEUE_URL";
/// Default confidence threshold used when a template leaves it unset.
pub const ENV_REPORT_CONFIDENCE_THRESHOLD: &str = "REPORT_CONFIDENCE_THRESHOLD";
/// Default IANA timezone for schedule arithmetic.
pub const ENV_REPORT_DEFAULT_TIMEZONE: &str = "REPORT_DEFAULT_TIMEZONE";
/// Verified sender identity used for report emails.
pub const ENV_REPORT_EMAIL_SENDER: &str = "REPORT_EMAIL_SENDER";
/// Queue URL the classification worker consumes.
pub const ENV_CLASSIFICATION_QUEUE_URL: &str = "CLASSIFICATION_QUEUE_URL";
/// Prompt template version used by the classification worker.
pub const ENV_CLASSIFICATION_PROMPT_VERSION: &str = "CLASSIFICATION_PROMPT_VERSION";
/// Rolling window, in days, the classification scheduler selects from.
pub const ENV_CLASSIFICATION_WINDOW_DAYS: &str = "CLASSIFICATION_WINDOW_DAYS";
/// Max content items the classification scheduler enqueues per pass.
pub const ENV_CLASSIFICATION_SCHEDULER_LIMIT: &str = "CLASSIFICATION_SCHEDULER_LIMIT";
/// LLM model identifier invoked by the classification worker.
pub const ENV_BEDROCK_MODEL_ID: &str = "BEDROCK_MODEL_ID";
/// Minutes a scope stays in cooldown after an incident write.
pub const ENV_ALERT_COOLDOWN_MINUTES: &str = "ALERT_COOLDOWN_MINUTES";
/// Version tag stamped onto incident payloads.
pub const ENV_ALERT_SIGNAL_VERSION: &str = "ALERT_SIGNAL_VERSION";
/// Comma-separated terms used when a dispatch resolves to no targets at all.
pub const ENV_INGESTION_DEFAULT_TERMS: &str = "INGESTION_DEFAULT_TERMS";
/// Queue URL the ingestion worker consumes.
pub const ENV_INGESTION_QUEUE_URL: &str = "INGESTION_QUEUE_URL";
/// Maximum number of concurrent provider fetches per ingestion target.
pub const ENV_INGESTION_PROVIDER_CONCURRENCY: &str = "INGESTION_PROVIDER_CONCURRENCY";
/// Queue URL the social ingestion worker consumes.
pub const ENV_SOCIAL_QUEUE_URL: &str = "SOCIAL_QUEUE_URL";
/// Bucket holding the channels' raw CSV objects.
pub const ENV_SOCIAL_BUCKET_NAME: &str = "SOCIAL_BUCKET_NAME";
/// Comma-separated list of configured social channel identifiers.
pub const ENV_SOCIAL_CHANNELS: &str = "SOCIAL_CHANNELS";
/// Negative-sentiment share, in `(0,1]`, that triggers an incident for a channel's window.
pub const ENV_SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD: &str = "SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD";

/// Default for [`ENV_EXPORT_SIGNED_URL_SECONDS`].
const DEFAULT_EXPORT_SIGNED_URL_SECONDS: u32 = 900;
/// Default for [`ENV_REPORT_CONFIDENCE_THRESHOLD`].
const DEFAULT_REPORT_CONFIDENCE_THRESHOLD: f64 = 0.65;
/// Default for [`ENV_REPORT_DEFAULT_TIMEZONE`].
const DEFAULT_REPORT_DEFAULT_TIMEZONE: &str = "America/Bogota";
/// Default for [`ENV_CLASSIFICATION_PROMPT_VERSION`].
const DEFAULT_CLASSIFICATION_PROMPT_VERSION: &str = "classification-v1";
/// Default for [`ENV_CLASSIFICATION_WINDOW_DAYS`].
const DEFAULT_CLASSIFICATION_WINDOW_DAYS: u32 = 7;
/// Default for [`ENV_CLASSIFICATION_SCHEDULER_LIMIT`].
const DEFAULT_CLASSIFICATION_SCHEDULER_LIMIT: u32 = 120;
/// Default for [`ENV_ALERT_COOLDOWN_MINUTES`].
const DEFAULT_ALERT_COOLDOWN_MINUTES: u32 = 60;
/// Default for [`ENV_ALERT_SIGNAL_VERSION`].
const DEFAULT_ALERT_SIGNAL_VERSION: &str = "alert-v1-weighted";
/// Default for [`ENV_INGESTION_PROVIDER_CONCURRENCY`].
const DEFAULT_INGESTION_PROVIDER_CONCURRENCY: u32 = 6;
/// Default for [`ENV_SOCIAL_CHANNELS`].
const DEFAULT_SOCIAL_CHANNELS: &str = "twitter,facebook,instagram,youtube";
/// Default for [`ENV_SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD`].
const DEFAULT_SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD: f64 = 0.35;

/// Lower bound accepted for [`ENV_ALERT_COOLDOWN_MINUTES`].
const MIN_ALERT_COOLDOWN_MINUTES: u32 = 1;
/// Upper bound accepted for [`ENV_ALERT_COOLDOWN_MINUTES`].
const MAX_ALERT_COOLDOWN_MINUTES: u32 = 1440;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading configuration. All are fatal to the process.
#[derive(Debug, Error)]
pub enum MediaConfigError {
    /// A required variable was not set.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    /// A variable was set but could not be parsed into its expected type.
    #[error("invalid value for {name}: {detail}")]
    Invalid {
        /// Name of the offending variable.
        name: &'static str,
        /// Human-readable parse failure detail.
        detail: String,
    },
    /// A variable parsed correctly but violated a documented bound.
    #[error("out of range value for {name}: {detail}")]
    OutOfRange {
        /// Name of the offending variable.
        name: &'static str,
        /// Human-readable bound violation detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Database connection triplet (the Data API-style credentials the core depends on).
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Data API resource ARN.
    pub resource_arn: String,
    /// Secrets-manager ARN holding DB credentials.
    pub secret_arn: String,
    /// Database name.
    pub database_name: String,
}

/// Fully loaded, validated process configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// AWS region for every AWS SDK client.
    pub aws_region: String,
    /// Database connection triplet.
    pub db: DbConfig,
    /// Bucket holding raw ingestion snapshots.
    pub raw_bucket_name: String,
    /// Bucket holding rendered CSV exports.
    pub export_bucket_name: String,
    /// Queue URL the export worker consumes.
    pub export_queue_url: String,
    /// TTL in seconds for pre-signed export URLs.
    pub export_signed_url_seconds: u32,
    /// Queue URL the report worker consumes.
    pub report_queue_url: String,
    /// Default confidence threshold used when a template leaves it unset, in `(0,1]`.
    pub report_confidence_threshold: f64,
    /// Default IANA timezone for schedule arithmetic.
    pub report_default_timezone: String,
    /// Verified sender identity used for report emails, if configured.
    pub report_email_sender: Option<String>,
    /// Queue URL the classification worker consumes.
    pub classification_queue_url: String,
    /// Prompt template version used by the classification worker.
    pub classification_prompt_version: String,
    /// Rolling window, in days, the classification scheduler selects from.
    pub classification_window_days: u32,
    /// Max content items the classification scheduler enqueues per pass.
    pub classification_scheduler_limit: u32,
    /// LLM model identifier invoked by the classification worker.
    pub bedrock_model_id: String,
    /// Minutes a scope stays in cooldown after an incident write, clamped to `[1,1440]`.
    pub alert_cooldown_minutes: u32,
    /// Version tag stamped onto incident payloads.
    pub alert_signal_version: String,
    /// Queue URL the ingestion worker consumes.
    pub ingestion_queue_url: String,
    /// Terms used when a dispatch resolves to no targets at all.
    pub ingestion_default_terms: Vec<String>,
    /// Maximum number of concurrent provider fetches per ingestion target.
    pub ingestion_provider_concurrency: u32,
    /// Queue URL the social ingestion worker consumes.
    pub social_queue_url: String,
    /// Bucket holding the channels' raw CSV objects.
    pub social_bucket_name: String,
    /// Configured social channel identifiers.
    pub social_channels: Vec<String>,
    /// Negative-sentiment share, in `(0,1]`, that triggers an incident for a channel's window.
    pub social_negative_sentiment_threshold: f64,
}

impl MediaConfig {
    /// Loads and validates every environment variable named in spec §6.
    ///
    /// # Errors
    /// Returns [`MediaConfigError`] on any missing, malformed, or out-of-bounds value.
    pub fn from_env() -> Result<Self, MediaConfigError> {
        Self::from_source(&EnvSource)
    }

    /// Loads configuration from an arbitrary [`ConfigSource`]; used by `from_env` and tests.
    ///
    /// # Errors
    /// Returns [`MediaConfigError`] on any missing, malformed, or out-of-bounds value.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, MediaConfigError> {
        let aws_region = require_string(source, ENV_AWS_REGION)?;
        let db = DbConfig {
            resource_arn: require_string(source, ENV_DB_RESOURCE_ARN)?,
            secret_arn: require_string(source, ENV_DB_SECRET_ARN)?,
            database_name: require_string(source, ENV_DB_NAME)?,
        };
        let raw_bucket_name = require_string(source, ENV_RAW_BUCKET_NAME)?;
        let export_bucket_name = require_string(source, ENV_EXPORT_BUCKET_NAME)?;
        let export_queue_url = require_string(source, ENV_EXPORT_QUEUE_URL)?;
        let export_signed_url_seconds = optional_u32(
            source,
            ENV_EXPORT_SIGNED_URL_SECONDS,
            DEFAULT_EXPORT_SIGNED_URL_SECONDS,
        )?;
        let report_queue_url = require_string(source, ENV_REPORT_QUEUE_URL)?;
        let report_confidence_threshold = optional_f64(
            source,
            ENV_REPORT_CONFIDENCE_THRESHOLD,
            DEFAULT_REPORT_CONFIDENCE_THRESHOLD,
        )?;
        if !(report_confidence_threshold > 0.0 && report_confidence_threshold <= 1.0) {
            return Err(MediaConfigError::OutOfRange {
                name: ENV_REPORT_CONFIDENCE_THRESHOLD,
                detail: "must be in (0,1]".to_string(),
            });
        }
        let report_default_timezone = optional_string(
            source,
            ENV_REPORT_DEFAULT_TIMEZONE,
            DEFAULT_REPORT_DEFAULT_TIMEZONE,
        );
        let report_email_sender = source.get(ENV_REPORT_EMAIL_SENDER).ok();
        let classification_queue_url = require_string(source, ENV_CLASSIFICATION_QUEUE_URL)?;
        let classification_prompt_version = optional_string(
            source,
            ENV_CLASSIFICATION_PROMPT_VERSION,
            DEFAULT_CLASSIFICATION_PROMPT_VERSION,
        );
        let classification_window_days = optional_u32(
            source,
            ENV_CLASSIFICATION_WINDOW_DAYS,
            DEFAULT_CLASSIFICATION_WINDOW_DAYS,
        )?;
        let classification_scheduler_limit = optional_u32(
            source,
            ENV_CLASSIFICATION_SCHEDULER_LIMIT,
            DEFAULT_CLASSIFICATION_SCHEDULER_LIMIT,
        )?;
        let bedrock_model_id = require_string(source, ENV_BEDROCK_MODEL_ID)?;
        let alert_cooldown_minutes = optional_u32(
            source,
            ENV_ALERT_COOLDOWN_MINUTES,
            DEFAULT_ALERT_COOLDOWN_MINUTES,
        )?
        .clamp(MIN_ALERT_COOLDOWN_MINUTES, MAX_ALERT_COOLDOWN_MINUTES);
        let alert_signal_version = optional_string(
            source,
            ENV_ALERT_SIGNAL_VERSION,
            DEFAULT_ALERT_SIGNAL_VERSION,
        );
        let ingestion_queue_url = require_string(source, ENV_INGESTION_QUEUE_URL)?;
        let ingestion_default_terms = optional_string(source, ENV_INGESTION_DEFAULT_TERMS, "")
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect();
        let ingestion_provider_concurrency = optional_u32(
            source,
            ENV_INGESTION_PROVIDER_CONCURRENCY,
            DEFAULT_INGESTION_PROVIDER_CONCURRENCY,
        )?;
        let social_queue_url = require_string(source, ENV_SOCIAL_QUEUE_URL)?;
        let social_bucket_name = require_string(source, ENV_SOCIAL_BUCKET_NAME)?;
        let social_channels = optional_string(source, ENV_SOCIAL_CHANNELS, DEFAULT_SOCIAL_CHANNELS)
            .split(',')
            .map(str::trim)
            .filter(|channel| !channel.is_empty())
            .map(str::to_string)
            .collect();
        let social_negative_sentiment_threshold = optional_f64(
            source,
            ENV_SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD,
            DEFAULT_SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD,
        )?;
        if !(social_negative_sentiment_threshold > 0.0 && social_negative_sentiment_threshold <= 1.0) {
            return Err(MediaConfigError::OutOfRange {
                name: ENV_SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD,
                detail: "must be in (0,1]".to_string(),
            });
        }

        Ok(Self {
            aws_region,
            db,
            raw_bucket_name,
            export_bucket_name,
            export_queue_url,
            export_signed_url_seconds,
            report_queue_url,
            report_confidence_threshold,
            report_default_timezone,
            report_email_sender,
            classification_queue_url,
            classification_prompt_version,
            classification_window_days,
            classification_scheduler_limit,
            bedrock_model_id,
            alert_cooldown_minutes,
            alert_signal_version,
            ingestion_queue_url,
            ingestion_default_terms,
            ingestion_provider_concurrency,
            social_queue_url,
            social_bucket_name,
            social_channels,
            social_negative_sentiment_threshold,
        })
    }
}

// ============================================================================
// SECTION: Config Source
// ============================================================================

/// Abstraction over "where environment variables come from", so tests can
/// substitute a fixed map instead of mutating process environment.
pub trait ConfigSource {
    /// Returns the raw value for `key`, or an error if unset.
    fn get(&self, key: &str) -> Result<String, VarError>;
}

/// Reads from the real process environment.
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

/// A fixed-map source, for tests.
pub struct MapSource(pub HashMap<String, String>);

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Result<String, VarError> {
        self.0.get(key).cloned().ok_or(VarError::NotPresent)
    }
}

/// Reads a required variable, mapping an absent value to [`MediaConfigError::Missing`].
fn require_string(source: &dyn ConfigSource, name: &'static str) -> Result<String, MediaConfigError> {
    source.get(name).map_err(|_| MediaConfigError::Missing(name))
}

/// Reads an optional variable, falling back to `default` when unset.
fn optional_string(source: &dyn ConfigSource, name: &'static str, default: &str) -> String {
    source.get(name).unwrap_or_else(|_| default.to_string())
}

/// Reads and parses an optional `u32` variable, falling back to `default` when unset.
fn optional_u32(source: &dyn ConfigSource, name: &'static str, default: u32) -> Result<u32, MediaConfigError> {
    match source.get(name) {
        Ok(raw) => raw.trim().parse::<u32>().map_err(|err| MediaConfigError::Invalid {
            name,
            detail: err.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Reads and parses an optional `f64` variable, falling back to `default` when unset.
fn optional_f64(source: &dyn ConfigSource, name: &'static str, default: f64) -> Result<f64, MediaConfigError> {
    match source.get(name) {
        Ok(raw) => raw.trim().parse::<f64>().map_err(|err| MediaConfigError::Invalid {
            name,
            detail: err.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parses a boolean environment value, accepting `{1,true,yes,on}` case-insensitively.
#[must_use]
pub fn parse_bool_env(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ============================================================================
// SECTION: Secret Cache
// ============================================================================

/// Memoized, process-wide secret access.
///
/// Runtime secrets (provider keys, DB credentials) must be fetched once per
/// process; `clear_cache` exists for rotation tests.
pub struct SecretCache {
    values: Mutex<HashMap<String, String>>,
}

/// Process-wide [`SecretCache`] instance.
static SECRET_CACHE: OnceLock<SecretCache> = OnceLock::new();

impl SecretCache {
    /// Returns the process-wide cache, initializing it on first access.
    fn global() -> &'static SecretCache {
        SECRET_CACHE.get_or_init(|| SecretCache {
            values: Mutex::new(HashMap::new()),
        })
    }

    /// Returns a cached secret, invoking `fetch` only on the first access for `key`.
    ///
    /// # Errors
    /// Propagates whatever `fetch` returns on a cache miss.
    pub fn get_or_fetch<E>(
        key: &str,
        fetch: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        let cache = Self::global();
        {
            let guard = cache.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(value) = guard.get(key) {
                return Ok(value.clone());
            }
        }
        let value = fetch()?;
        let mut guard = cache.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Clears every cached secret; intended for rotation tests.
    pub fn clear_cache() {
        let cache = Self::global();
        let mut guard = cache.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.clear();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::MapSource;
    use super::MediaConfig;
    use super::MediaConfigError;
    use super::SecretCache;
    use std::collections::HashMap;

    fn base_map() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("AWS_REGION".to_string(), "us-east-1".to_string());
        map.insert("DB_RESOURCE_ARN".to_string(), "arn:db".to_string());
        map.insert("DB_SECRET_ARN".to_string(), "arn:secret".to_string());
        map.insert("DB_NAME".to_string(), "media".to_string());
        map.insert("RAW_BUCKET_NAME".to_string(), "raw-bucket".to_string());
        map.insert("EXPORT_BUCKET_NAME".to_string(), "export-bucket".to_string());
        map.insert("EXPORT_QUEUE_URL".to_string(), "https://queue/export".to_string());
        map.insert("REPORT_QUEUE_URL".to_string(), "https://queue/report".to_string());
        map.insert("CLASSIFICATION_QUEUE_URL".to_string(), "https://queue/classify".to_string());
        map.insert("BEDROCK_MODEL_ID".to_string(), "anthropic.claude".to_string());
        map.insert("INGESTION_QUEUE_URL".to_string(), "https://queue/ingest".to_string());
        map.insert("SOCIAL_QUEUE_URL".to_string(), "https://queue/social".to_string());
        map.insert("SOCIAL_BUCKET_NAME".to_string(), "social-bucket".to_string());
        map
    }

    #[test]
    fn loads_defaults_when_optional_vars_are_absent() {
        let config = MediaConfig::from_source(&MapSource(base_map())).unwrap();
        assert_eq!(config.export_signed_url_seconds, 900);
        assert!((config.report_confidence_threshold - 0.65).abs() < f64::EPSILON);
        assert_eq!(config.alert_cooldown_minutes, 60);
    }

    #[test]
    fn fails_closed_on_missing_required_var() {
        let mut map = base_map();
        map.remove("DB_NAME");
        let err = MediaConfig::from_source(&MapSource(map)).unwrap_err();
        assert!(matches!(err, MediaConfigError::Missing("DB_NAME")));
    }

    #[test]
    fn rejects_confidence_threshold_outside_unit_interval() {
        let mut map = base_map();
        map.insert("REPORT_CONFIDENCE_THRESHOLD".to_string(), "1.5".to_string());
        let err = MediaConfig::from_source(&MapSource(map)).unwrap_err();
        assert!(matches!(err, MediaConfigError::OutOfRange { .. }));
    }

    #[test]
    fn clamps_alert_cooldown_minutes_into_bounds() {
        let mut map = base_map();
        map.insert("ALERT_COOLDOWN_MINUTES".to_string(), "999999".to_string());
        let config = MediaConfig::from_source(&MapSource(map)).unwrap();
        assert_eq!(config.alert_cooldown_minutes, 1440);
    }

    #[test]
    fn defaults_to_four_social_channels() {
        let config = MediaConfig::from_source(&MapSource(base_map())).unwrap();
        assert_eq!(config.social_channels, vec!["twitter", "facebook", "instagram", "youtube"]);
    }

    #[test]
    fn rejects_social_negative_sentiment_threshold_outside_unit_interval() {
        let mut map = base_map();
        map.insert("SOCIAL_NEGATIVE_SENTIMENT_THRESHOLD".to_string(), "0.0".to_string());
        let err = MediaConfig::from_source(&MapSource(map)).unwrap_err();
        assert!(matches!(err, MediaConfigError::OutOfRange { .. }));
    }

    #[test]
    fn secret_cache_fetches_once() {
        SecretCache::clear_cache();
        let mut calls = 0;
        let first = SecretCache::get_or_fetch::<std::convert::Infallible>("db-password", || {
            calls += 1;
            Ok("hunter2".to_string())
        });
        let second = SecretCache::get_or_fetch::<std::convert::Infallible>("db-password", || {
            calls += 1;
            Ok("should-not-be-called".to_string())
        });
        assert_eq!(first.unwrap(), "hunter2");
        assert_eq!(second.unwrap(), "hunter2");
        assert_eq!(calls, 1);
    }
}
