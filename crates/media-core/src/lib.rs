// media-core/src/lib.rs
// ============================================================================
// Module: Media Core Library
// Description: Public API surface for the media intelligence core.
// Purpose: Expose domain types, interfaces, and shared logic helpers.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Media core provides the domain model and backend-agnostic interfaces for
//! the media-intelligence pipeline: tracked queries, ingestion runs, content
//! items, classifications, incidents, and reports. It integrates through
//! explicit traits (`Store`, `ProviderAdapter`, `EventSink`) rather than
//! embedding any particular database, HTTP client, or queue library.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::EventSink;
pub use interfaces::ProviderAdapter;
pub use interfaces::ProviderError;
pub use interfaces::Store;
pub use interfaces::StoreError;
