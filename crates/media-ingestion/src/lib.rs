// media-ingestion/src/lib.rs
// ============================================================================
// Module: Media Ingestion Library
// Description: The ingestion worker: claim, target resolution, per-target
//              fetch, and persistence for one dispatch.
// Purpose: Public API surface consumed by media-cli's ingestion subcommand.
// Dependencies: media-core, media-logic, media-providers
// ============================================================================

//! ## Overview
//! One dispatch message in, one finished (or skipped) [`IngestionRun`] out.
//! [`dispatch`] defines the queue message shape, [`targets`] resolves the
//! four-step fallback chain, [`pipeline`] runs the bounded-concurrency
//! per-target fetch, [`object_store`] writes the raw snapshot, and
//! [`worker`] ties all of it together in the documented persistence order.
//!
//! [`IngestionRun`]: media_core::core::ingestion::IngestionRun

pub mod dispatch;
pub mod object_store;
pub mod pipeline;
pub mod targets;
pub mod worker;

pub use dispatch::IngestionDispatch;
pub use object_store::RawSnapshotStore;
pub use object_store::RawSnapshotStoreError;
pub use object_store::S3RawSnapshotStore;
pub use targets::IngestionTarget;
pub use worker::WorkerError;
pub use worker::WorkerOutcome;
pub use worker::run_ingestion;
