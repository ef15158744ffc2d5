// media-social/src/lib.rs
// ============================================================================
// Module: Media Social Library
// Description: The social channel ingestion worker.
// Purpose: Public API surface consumed by media-cli's social subcommands.
// Dependencies: media-core, media-incident
// ============================================================================

//! ## Overview
//! [`worker::run_social_ingestion`] lists a channel's unclaimed raw CSV
//! objects through [`object_source::ObjectSource`], parses each one with
//! [`csv_parser`], upserts every well-formed row, reconciles the pass
//! against what it parsed, and checks the channel's rolling window for a
//! negative-sentiment incident trigger.

pub mod csv_parser;
pub mod dispatch;
pub mod object_source;
#[cfg(test)]
mod test_support;
pub mod worker;

pub use csv_parser::ParsedCsv;
pub use csv_parser::parse_channel_csv;
pub use dispatch::SocialIngestionDispatch;
pub use object_source::ObjectSource;
pub use object_source::ObjectSourceError;
pub use object_source::S3ObjectSource;
pub use object_source::SocialObjectRef;
pub use worker::WorkerError;
pub use worker::WorkerOutcome;
pub use worker::run_social_ingestion;
