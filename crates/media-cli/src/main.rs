// media-cli/src/main.rs
// ============================================================================
// Module: Media CLI
// Description: Entry point exposing one subcommand per worker crate plus
//              the analyst-facing HTTP surface.
// Purpose: Wire concrete adapters from environment configuration and
//          dispatch to each worker crate's single entry point.
// Dependencies: clap, media-classification, media-config, media-core,
//               media-incident, media-ingestion, media-providers,
//               media-report, media-social, media-store, tokio
// ============================================================================

//! ## Overview
//! Every subcommand follows the same shape: load [`media_config::MediaConfig`],
//! build the concrete adapters the worker needs through [`wiring`], read one
//! dispatch message (from `--message <file>` or stdin) when the worker takes
//! one, and call the worker crate's public entry point. `serve` instead
//! starts the HTTP read/mutate surface in [`http`].

mod health;
mod http;
mod role;
mod wiring;

use std::io::Read as _;
use std::io::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use media_config::MediaConfig;
use media_core::core::identifiers::RequestId;
use media_core::core::ingestion::TriggerType;
use media_core::interfaces::Store;
use media_incident::EvaluatorSettings;
use thiserror::Error;
use time::Duration;
use time::OffsetDateTime;

/// Language applied to an ad-hoc ingestion target when no override is given.
const DEFAULT_LANGUAGE: &str = "es";

// ============================================================================
// SECTION: CLI Surface
// ============================================================================

/// Media intelligence pipeline command-line interface.
#[derive(Debug, Parser)]
#[command(name = "media-intel", version)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Starts the analyst-facing HTTP read/mutate surface.
    Serve(ServeArgs),
    /// Runs the ingestion worker.
    Ingestion {
        /// Selected ingestion subcommand.
        #[command(subcommand)]
        command: IngestionCommand,
    },
    /// Runs the classification scheduler and worker.
    Classification {
        /// Selected classification subcommand.
        #[command(subcommand)]
        command: ClassificationCommand,
    },
    /// Runs the incident evaluator.
    Incident {
        /// Selected incident subcommand.
        #[command(subcommand)]
        command: IncidentCommand,
    },
    /// Runs the report worker.
    Report {
        /// Selected report subcommand.
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Runs the social channel ingestion worker.
    Social {
        /// Selected social subcommand.
        #[command(subcommand)]
        command: SocialCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Debug, clap::Args)]
struct ServeArgs {
    /// Address the HTTP surface binds to.
    #[arg(long, value_name = "HOST:PORT", default_value = "0.0.0.0:8080")]
    bind: String,
}

/// A dispatch message source shared by every `run` subcommand: a file path,
/// or stdin when omitted.
#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Path to the JSON dispatch message; reads stdin when omitted.
    #[arg(long, value_name = "FILE")]
    message: Option<PathBuf>,
}

/// Ingestion subcommands.
#[derive(Debug, Subcommand)]
enum IngestionCommand {
    /// Runs one ingestion dispatch end to end.
    Run(RunArgs),
    /// Reports DB reachability and queue configuration presence.
    HealthCheck,
}

/// Classification subcommands.
#[derive(Debug, Subcommand)]
enum ClassificationCommand {
    /// Selects pending content and enqueues one dispatch per item.
    Schedule(ScheduleArgs),
    /// Runs one classification dispatch end to end.
    Run(RunArgs),
    /// Reports DB reachability and queue configuration presence.
    HealthCheck,
}

/// Configuration for the `classification schedule` command.
#[derive(Debug, clap::Args)]
struct ScheduleArgs {
    /// What initiated this scheduling pass.
    #[arg(long, value_enum, default_value_t = TriggerTypeArg::Scheduled)]
    trigger_type: TriggerTypeArg,
    /// Correlates this pass across logs and audit entries.
    #[arg(long)]
    request_id: Option<String>,
}

/// Incident subcommands.
#[derive(Debug, Subcommand)]
enum IncidentCommand {
    /// Runs one incident evaluation pass across every scope.
    Evaluate(EvaluateArgs),
    /// Reports DB reachability and queue configuration presence.
    HealthCheck,
}

/// Configuration for the `incident evaluate` command.
#[derive(Debug, clap::Args)]
struct EvaluateArgs {
    /// What initiated this evaluation pass.
    #[arg(long, value_enum, default_value_t = TriggerTypeArg::Scheduled)]
    trigger_type: TriggerTypeArg,
    /// Correlates this pass across logs and audit entries.
    #[arg(long)]
    request_id: Option<String>,
}

/// Report subcommands.
#[derive(Debug, Subcommand)]
enum ReportCommand {
    /// Runs one report dispatch end to end.
    Run(RunArgs),
    /// Reports DB reachability and queue configuration presence.
    HealthCheck,
}

/// Social subcommands.
#[derive(Debug, Subcommand)]
enum SocialCommand {
    /// Runs one channel's ingestion pass.
    Run(SocialRunArgs),
    /// Reports DB reachability and queue configuration presence.
    HealthCheck,
}

/// Configuration for the `social run` command.
#[derive(Debug, clap::Args)]
struct SocialRunArgs {
    /// Configured channel identifier to process, e.g. `twitter`.
    #[arg(long)]
    channel: String,
    /// Correlates this pass across logs and audit entries.
    #[arg(long)]
    request_id: Option<String>,
}

/// CLI-facing mirror of [`TriggerType`], since `clap::ValueEnum` cannot be
/// derived on a type this crate does not own.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TriggerTypeArg {
    /// Initiated by the scheduler.
    Scheduled,
    /// Initiated by an operator or API call.
    Manual,
}

impl std::fmt::Display for TriggerTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        })
    }
}

impl From<TriggerTypeArg> for TriggerType {
    fn from(value: TriggerTypeArg) -> Self {
        match value {
            TriggerTypeArg::Scheduled => TriggerType::Scheduled,
            TriggerTypeArg::Manual => TriggerType::Manual,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper; its `Display` is the message printed to stderr.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from any message-like value.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<wiring::WiringError> for CliError {
    fn from(err: wiring::WiringError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

/// Parses arguments and dispatches to the selected subcommand.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Ingestion { command } => command_ingestion(command).await,
        Commands::Classification { command } => command_classification(command).await,
        Commands::Incident { command } => command_incident(command).await,
        Commands::Report { command } => command_report(command).await,
        Commands::Social { command } => command_social(command).await,
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ServeArgs) -> CliResult<ExitCode> {
    let config = wiring::load_config()?;
    let store = wiring::build_store(&config)?;
    let state = http::AppState::new(Arc::new(store));
    let router = http::build_router(state);
    let addr: SocketAddr = args.bind.parse().map_err(|_| CliError::new(format!("invalid bind address: {}", args.bind)))?;
    http::serve(router, addr).await.map_err(CliError::new)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Ingestion Command
// ============================================================================

/// Executes an `ingestion` subcommand.
async fn command_ingestion(command: IngestionCommand) -> CliResult<ExitCode> {
    let config = wiring::load_config()?;
    match command {
        IngestionCommand::HealthCheck => {
            let store = wiring::build_store(&config)?;
            run_and_print_health(
                &store,
                &[("INGESTION_QUEUE_URL", &config.ingestion_queue_url), ("RAW_BUCKET_NAME", &config.raw_bucket_name)],
            )
            .await
        }
        IngestionCommand::Run(args) => {
            let dispatch: media_ingestion::IngestionDispatch = read_dispatch(args.message.as_deref())?;
            let store = wiring::build_store(&config)?;
            let registry = wiring::build_provider_registry();
            let raw_store = wiring::build_raw_snapshot_store(&config).await;
            let events = wiring::build_event_sink()?;
            let outcome = media_ingestion::run_ingestion(
                &store,
                &registry,
                &raw_store,
                events.as_ref(),
                config.ingestion_provider_concurrency,
                DEFAULT_LANGUAGE,
                &config.ingestion_default_terms,
                &dispatch,
            )
            .await
            .map_err(|err| CliError::new(err.to_string()))?;
            print_json(&outcome_summary("ingestion", &format!("{outcome:?}")));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Classification Command
// ============================================================================

/// Executes a `classification` subcommand.
async fn command_classification(command: ClassificationCommand) -> CliResult<ExitCode> {
    let config = wiring::load_config()?;
    match command {
        ClassificationCommand::HealthCheck => {
            let store = wiring::build_store(&config)?;
            run_and_print_health(
                &store,
                &[("CLASSIFICATION_QUEUE_URL", &config.classification_queue_url), ("BEDROCK_MODEL_ID", &config.bedrock_model_id)],
            )
            .await
        }
        ClassificationCommand::Schedule(args) => {
            let store = wiring::build_store(&config)?;
            let trigger = media_classification::ClassificationSchedulerTrigger {
                trigger_type: args.trigger_type.into(),
                request_id: args.request_id.map(RequestId::from),
                requested_at: None,
            };
            let dispatches = media_classification::select_classification_dispatches(
                &store,
                &trigger,
                &config.classification_prompt_version,
                &config.bedrock_model_id,
                config.classification_window_days,
                config.classification_scheduler_limit,
            )
            .await
            .map_err(|err| CliError::new(err.to_string()))?;
            print_json(&serde_json::json!({ "scheduled": dispatches.len() }));
            Ok(ExitCode::SUCCESS)
        }
        ClassificationCommand::Run(args) => {
            let dispatch: media_classification::ClassificationDispatch = read_dispatch(args.message.as_deref())?;
            let store = wiring::build_store(&config)?;
            let llm = wiring::build_llm_client().await;
            let events = wiring::build_event_sink()?;
            let outcome = media_classification::run_classification(&store, &llm, events.as_ref(), &dispatch)
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            print_json(&outcome_summary("classification", &format!("{outcome:?}")));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Incident Command
// ============================================================================

/// Executes an `incident` subcommand.
async fn command_incident(command: IncidentCommand) -> CliResult<ExitCode> {
    let config = wiring::load_config()?;
    match command {
        IncidentCommand::HealthCheck => {
            let store = wiring::build_store(&config)?;
            run_and_print_health(&store, &[("ALERT_SIGNAL_VERSION", &config.alert_signal_version)]).await
        }
        IncidentCommand::Evaluate(args) => {
            let store = wiring::build_store(&config)?;
            let events = wiring::build_event_sink()?;
            let request_id = args.request_id.map(RequestId::from);
            let window_start = OffsetDateTime::now_utc() - Duration::days(i64::from(config.classification_window_days));
            let settings = EvaluatorSettings {
                cooldown_minutes: config.alert_cooldown_minutes,
                signal_version: config.alert_signal_version.clone(),
                window_start,
            };
            media_incident::run_evaluation(&store, events.as_ref(), args.trigger_type.into(), request_id.as_ref(), &settings)
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            print_json(&serde_json::json!({ "event": "incident_evaluation.dispatched" }));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Report Command
// ============================================================================

/// Executes a `report` subcommand.
async fn command_report(command: ReportCommand) -> CliResult<ExitCode> {
    let config = wiring::load_config()?;
    match command {
        ReportCommand::HealthCheck => {
            let store = wiring::build_store(&config)?;
            run_and_print_health(&store, &[("REPORT_QUEUE_URL", &config.report_queue_url)]).await
        }
        ReportCommand::Run(args) => {
            let dispatch: media_report::ReportDispatch = read_dispatch(args.message.as_deref())?;
            let store = wiring::build_store(&config)?;
            let email = wiring::build_email_sender().await;
            let events = wiring::build_event_sink()?;
            let outcome = media_report::run_report(
                &store,
                &email,
                events.as_ref(),
                config.report_confidence_threshold,
                config.report_email_sender.as_deref(),
                &dispatch,
            )
            .await
            .map_err(|err| CliError::new(err.to_string()))?;
            print_json(&outcome_summary("report", &format!("{outcome:?}")));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Social Command
// ============================================================================

/// Executes a `social` subcommand.
async fn command_social(command: SocialCommand) -> CliResult<ExitCode> {
    let config = wiring::load_config()?;
    match command {
        SocialCommand::HealthCheck => {
            let store = wiring::build_store(&config)?;
            run_and_print_health(
                &store,
                &[("SOCIAL_QUEUE_URL", &config.social_queue_url), ("SOCIAL_BUCKET_NAME", &config.social_bucket_name)],
            )
            .await
        }
        SocialCommand::Run(args) => {
            let store = wiring::build_store(&config)?;
            let objects = wiring::build_social_object_source(&config).await;
            let events = wiring::build_event_sink()?;
            let dispatch = media_social::SocialIngestionDispatch {
                channel: args.channel,
                request_id: args.request_id.map(RequestId::from),
                requested_by_user_id: None,
                requested_at: None,
            };
            let outcome = media_social::run_social_ingestion(
                &store,
                &objects,
                events.as_ref(),
                config.social_negative_sentiment_threshold,
                config.alert_cooldown_minutes,
                &dispatch,
            )
            .await
            .map_err(|err| CliError::new(err.to_string()))?;
            print_json(&outcome_summary("social_ingestion", &format!("{outcome:?}")));
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Reads and deserializes one dispatch message from `path`, or stdin when absent.
fn read_dispatch<T: serde::de::DeserializeOwned>(path: Option<&std::path::Path>) -> CliResult<T> {
    let raw = match path {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(|err| CliError::new(format!("failed to read stdin: {err}")))?;
            buf
        }
    };
    serde_json::from_str(&raw).map_err(|err| CliError::new(format!("invalid dispatch message: {err}")))
}

/// Runs a health check, prints it as JSON, and maps it to an exit code.
async fn run_and_print_health(store: &dyn Store, checks: &[(&'static str, &str)]) -> CliResult<ExitCode> {
    let report = health::run_health_check(store, checks).await;
    let healthy = report.is_healthy();
    print_json(&report);
    Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Builds the small JSON summary printed after a worker run completes.
fn outcome_summary(worker: &str, outcome: &str) -> serde_json::Value {
    serde_json::json!({ "worker": worker, "outcome": outcome })
}

/// Serializes `value` as pretty JSON and writes it to stdout.
fn print_json(value: &impl serde::Serialize) {
    if let Ok(payload) = serde_json::to_string_pretty(value) {
        let _ = write_stdout_line(&payload);
    }
}
