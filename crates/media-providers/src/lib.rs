// media-providers/src/lib.rs
// ============================================================================
// Module: Media Providers Library
// Description: News provider adapters, URL canonicalization, and selection.
// Purpose: Implement `media_core::ProviderAdapter` over HTTP with retry.
// Dependencies: media-core, reqwest, rand, thiserror, url
// ============================================================================

//! ## Overview
//! One [`HttpProviderAdapter`] instance per news provider, a [`ProviderRegistry`]
//! implementing the §4.1 provider-selection rule, and [`canonicalize_url`] /
//! [`dedupe_by_canonical_url`] shared by the ingestion worker.

pub mod canonicalize;
pub mod http_adapter;
pub mod registry;
pub mod retry;

pub use canonicalize::canonicalize_url;
pub use canonicalize::dedupe_by_canonical_url;
pub use http_adapter::HttpProviderAdapter;
pub use http_adapter::HttpProviderConfig;
pub use registry::ProviderAccessPolicy;
pub use registry::ProviderRegistry;
pub use retry::RetryPolicy;
