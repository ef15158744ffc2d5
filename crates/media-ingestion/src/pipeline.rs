// media-ingestion/src/pipeline.rs
// ============================================================================
// Module: Per-Target Fetch Pipeline
// Description: Fans out one target across providers, filters, dedupes, sorts.
// Purpose: Implement the §4.3 per-target pipeline.
// Dependencies: media-core, media-logic, media-providers, tokio
// ============================================================================

use std::sync::Arc;

use media_core::ProviderAdapter;
use media_core::core::ingestion::NEWS_MAX_ARTICLES_PER_TERM;
use media_core::core::query::ExecutionConfig;
use media_core::core::query::QueryDefinition;
use media_core::interfaces::NormalizedArticle;
use media_core::interfaces::ProviderFetchResult;
use media_providers::ProviderAccessPolicy;
use media_providers::ProviderRegistry;
use media_providers::canonicalize_url;
use media_providers::dedupe_by_canonical_url;
use tokio::sync::Semaphore;

/// One accepted article together with the provider that returned it, post filtering.
#[derive(Debug, Clone)]
pub struct AcceptedArticle {
    /// Provider that returned this article.
    pub provider: String,
    /// The normalized article.
    pub article: NormalizedArticle,
}

/// Outcome of fetching one target: the accepted, capped articles plus the
/// raw per-provider results (for run-item aggregation and raw snapshots).
#[derive(Debug, Clone)]
pub struct TargetFetchOutcome {
    /// Raw per-adapter results, before filtering.
    pub raw_results: Vec<ProviderFetchResult>,
    /// Accepted articles, filtered/deduped/sorted/capped to `m`.
    pub accepted: Vec<AcceptedArticle>,
}

/// Computes the effective per-target article cap: the smaller of the
/// requested max and the target's own limit, further clamped to
/// [`NEWS_MAX_ARTICLES_PER_TERM`] for news.
#[must_use]
pub fn effective_cap(requested_max: u32, target_max_articles_per_run: u32) -> u32 {
    requested_max.min(target_max_articles_per_run).min(NEWS_MAX_ARTICLES_PER_TERM)
}

/// Runs the bounded-concurrency fan-out across `providers` for one target and
/// returns the filtered, deduped, sorted, capped result.
pub async fn fetch_target(
    providers: &[Arc<dyn ProviderAdapter>],
    concurrency: &Arc<Semaphore>,
    provider_query: &str,
    term_name: &str,
    definition: &QueryDefinition,
    execution: &ExecutionConfig,
    m: u32,
) -> TargetFetchOutcome {
    let tree = definition.compile_tree();
    let mut joins = tokio::task::JoinSet::new();
    for adapter in providers {
        let adapter = Arc::clone(adapter);
        let query = provider_query.to_string();
        let term = term_name.to_string();
        let concurrency = concurrency.clone();
        joins.spawn(async move {
            let Ok(_permit) = concurrency.acquire_owned().await else {
                return ProviderFetchResult {
                    provider: adapter.provider_id().to_string(),
                    term,
                    items: vec![],
                    request_url: String::new(),
                    raw_count: 0,
                    duration_ms: 0,
                    error: Some(media_core::ProviderError::Unknown(
                        "concurrency limiter closed".to_string(),
                    )),
                };
            };
            adapter.fetch(&query, &term, m).await
        });
    }
    let mut raw_results = Vec::with_capacity(providers.len());
    while let Some(joined) = joins.join_next().await {
        if let Ok(result) = joined {
            raw_results.push(result);
        }
    }

    let mut candidates: Vec<AcceptedArticle> = Vec::new();
    for result in &raw_results {
        for article in &result.items {
            if !passes_query(&tree, &result.provider, article) {
                continue;
            }
            if !passes_execution_filters(execution, &result.provider, article) {
                continue;
            }
            candidates.push(AcceptedArticle { provider: result.provider.clone(), article: article.clone() });
        }
    }

    let urls: Vec<String> = candidates.iter().map(|c| c.article.canonical_url.clone()).collect();
    let kept_urls: std::collections::HashSet<String> = dedupe_by_canonical_url(&urls).into_iter().collect();
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|candidate| {
        let Ok(canonical) = canonicalize_url(&candidate.article.canonical_url) else {
            return false;
        };
        kept_urls.contains(&canonical) && seen.insert(canonical)
    });

    candidates.sort_by(|a, b| {
        b.article
            .published_at
            .cmp(&a.article.published_at)
            .then_with(|| a.article.canonical_url.cmp(&b.article.canonical_url))
    });
    candidates.truncate(m as usize);

    TargetFetchOutcome { raw_results, accepted: candidates }
}

/// Resolves the providers eligible under `execution`'s allow/deny lists.
#[must_use]
pub fn select_providers(
    registry: &ProviderRegistry,
    execution: &ExecutionConfig,
) -> Vec<Arc<dyn ProviderAdapter>> {
    let policy = ProviderAccessPolicy {
        allow: execution.providers_allow.clone(),
        deny: execution.providers_deny.clone(),
    };
    registry.resolve(&policy)
}

/// Lowercased host of the article's canonical URL, or empty when unparseable.
fn canonical_host(article: &NormalizedArticle) -> String {
    canonicalize_url(&article.canonical_url)
        .ok()
        .and_then(|url| url::Url::parse(&url).ok())
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Evaluates the tracked query's term tree against the article's combined text.
fn passes_query(tree: &media_logic::TermExpr, provider: &str, article: &NormalizedArticle) -> bool {
    let haystack = format!(
        "{} {} {} {} {}",
        provider,
        article.title,
        article.summary.as_deref().unwrap_or_default(),
        article.content.as_deref().unwrap_or_default(),
        canonical_host(article),
    )
    .to_lowercase();
    tree.evaluate(&haystack)
}

/// Applies the execution config's provider/domain/country allow and deny lists.
fn passes_execution_filters(execution: &ExecutionConfig, provider: &str, article: &NormalizedArticle) -> bool {
    let provider_lower = provider.to_lowercase();
    if execution.providers_deny.iter().any(|p| p == &provider_lower) {
        return false;
    }
    if !execution.providers_allow.is_empty() && !execution.providers_allow.iter().any(|p| p == &provider_lower) {
        return false;
    }

    let host = canonical_host(article);
    if execution.domains_deny.iter().any(|d| d == &host) {
        return false;
    }
    if !execution.domains_allow.is_empty() && !execution.domains_allow.iter().any(|d| d == &host) {
        return false;
    }

    let countries = country_candidates(article);
    if execution.countries_deny.iter().any(|c| countries.contains(c)) {
        return false;
    }
    if !execution.countries_allow.is_empty() && !execution.countries_allow.iter().any(|c| countries.contains(c)) {
        return false;
    }
    true
}

/// Reads country-code candidates from provider metadata: a single `"country"`
/// string or a `"countries"` array, both lower-cased.
fn country_candidates(article: &NormalizedArticle) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(value) = article.metadata.get("country").and_then(|v| v.as_str()) {
        out.push(value.to_lowercase());
    }
    if let Some(array) = article.metadata.get("countries").and_then(|v| v.as_array()) {
        for entry in array {
            if let Some(s) = entry.as_str() {
                out.push(s.to_lowercase());
            }
        }
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::effective_cap;

    #[test]
    fn news_cap_is_clamped_to_two_even_with_larger_requests() {
        assert_eq!(effective_cap(500, 500), 2);
        assert_eq!(effective_cap(1, 500), 1);
    }
}
