// media-core/src/core/content.rs
// ============================================================================
// Module: Content Domain Types
// Description: Normalized content items, state events, and classifications.
// Purpose: Persistence-shape types shared by ingestion, classification,
//          incident, and report components.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::ClassificationId;
use crate::core::identifiers::ContentItemId;
use crate::core::identifiers::TermId;
use crate::core::identifiers::UserId;

/// Maximum title length after normalization.
pub const MAX_TITLE_LEN: usize = 500;
/// Maximum summary length after normalization.
pub const MAX_SUMMARY_LEN: usize = 2000;
/// Maximum content body length after normalization.
pub const MAX_CONTENT_LEN: usize = 16_000;
/// Maximum canonical URL length after normalization.
pub const MAX_URL_LEN: usize = 2048;

/// Origin of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A news article from a provider adapter.
    News,
    /// A social media post from a CSV dump.
    Social,
}

/// Analyst-facing triage state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    /// Visible and eligible for classification/incident evaluation.
    Active,
    /// Retained but excluded from active windows.
    Archived,
    /// Suppressed from analyst views.
    Hidden,
}

/// A normalized article or social post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable identifier.
    pub id: ContentItemId,
    /// Unique natural key.
    pub canonical_url: String,
    /// Origin of the item.
    pub source_type: SourceType,
    /// Tracked query this item was found under, if any.
    pub term_id: Option<TermId>,
    /// Provider identifier (news) or channel identifier (social).
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
    /// Source-reliability score used as a classification-weight fallback.
    pub source_score: Option<f64>,
    /// Object-store key of the raw payload snapshot this item was extracted from.
    pub raw_payload_s3_key: Option<String>,
    /// Analyst triage state.
    pub state: ContentState,
    /// Projected category from the most-recent applicable classification.
    pub categoria: Option<String>,
    /// Projected sentiment from the most-recent applicable classification.
    pub sentimiento: Option<Sentimiento>,
    /// Free-form metadata (country hints, etc.).
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
    /// Last update timestamp.
    pub updated_at: OffsetDateTime,
}

/// A triage transition recorded for a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStateEvent {
    /// Owning content item.
    pub content_item_id: ContentItemId,
    /// State transitioned to.
    pub to_state: ContentState,
    /// Actor who made the change.
    pub actor: UserId,
    /// Human-readable reason.
    pub reason: String,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// Normalized sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentimiento {
    /// Positive sentiment.
    Positivo,
    /// Neutral, mixed, or ambiguous sentiment.
    Neutro,
    /// Negative sentiment.
    Negativo,
}

/// Result of one LLM call or manual override, keyed by `(contentItemId, promptVersion, modelId)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Stable identifier.
    pub id: ClassificationId,
    /// Owning content item.
    pub content_item_id: ContentItemId,
    /// Prompt template version used.
    pub prompt_version: String,
    /// Model identifier used.
    pub model_id: String,
    /// Free-text category label.
    pub categoria: String,
    /// Normalized sentiment.
    pub sentimiento: Sentimiento,
    /// Deduped labels, at most 50.
    pub etiquetas: Vec<String>,
    /// Confidence in `[0,1]`.
    pub confianza: f64,
    /// Optional summary, at most 1000 chars.
    pub resumen: Option<String>,
    /// Whether this row is a manual override.
    pub is_override: bool,
    /// Analyst who supplied the override, if any.
    pub overridden_by_user_id: Option<UserId>,
    /// Reason given for the override, if any.
    pub override_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
    /// Last update timestamp.
    pub updated_at: OffsetDateTime,
}
