//! Per-request pipeline: cache lookup, target resolution, browser-driven
//! page acquisition, extraction, address backfill, fallback substitution,
//! cache store. One request is one sequential task end to end.

use anyhow::anyhow;
use scraper::Html;
use tracing::{info, warn};

use crate::api::{ApiError, AppState};
use crate::models::{Listing, SearchQuery};
use crate::scrapers::browser::fetch_rendered_html;
use crate::scrapers::fallback::fallback_listings;
use crate::scrapers::fields::backfill_address;
use crate::scrapers::target::resolve_target_url;
use crate::scrapers::traits::adapter_for;

pub enum SearchOutcome {
    /// Served from the cache; the pipeline never ran.
    Cached(Vec<Listing>),
    /// Freshly assembled, already stored in the cache.
    Fresh {
        results: Vec<Listing>,
        source: &'static str,
    },
}

pub async fn run_search(state: &AppState, query: &SearchQuery) -> Result<SearchOutcome, ApiError> {
    let key = query.cache_key();
    if let Some(hit) = state.cache.get(&key) {
        info!(key = %key, "cache hit");
        return Ok(SearchOutcome::Cached(hit));
    }

    if !query.has_location() {
        return Err(ApiError::MissingLocation);
    }

    // Holding the per-key flight lock across the scrape keeps concurrent
    // identical queries from racing to populate the same entry.
    let _flight = state.cache.begin_fetch(&key).await;
    if let Some(hit) = state.cache.get(&key) {
        info!(key = %key, "cache hit after flight wait");
        return Ok(SearchOutcome::Cached(hit));
    }

    let url = resolve_target_url(&state.http, query)
        .await
        .ok_or(ApiError::MissingLocation)?;

    let adapter = adapter_for(query.provider);
    let ready_selector = adapter.ready_selector();
    let session_cfg = state.session.clone();
    let limit = state.config.max_results;

    let permit = state
        .sessions
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Scrape(anyhow!("session gate closed")))?;
    let html = tokio::task::spawn_blocking(move || {
        fetch_rendered_html(&session_cfg, &url, ready_selector)
    })
    .await
    .map_err(|err| ApiError::Scrape(anyhow!(err)))?
    .map_err(ApiError::Scrape)?;
    drop(permit);

    let (results, source) = assemble_results(&html, query, limit);

    // Fallback substitutions are cached too; degraded answers stay stable
    // for the TTL window.
    state.cache.insert(key, results.clone());
    Ok(SearchOutcome::Fresh { results, source })
}

/// Post-fetch assembly: extraction, address backfill, and the fallback
/// substitution that keeps the result set non-empty when the page gave
/// nothing. Pure over the rendered markup, so the degraded path is
/// testable without a browser.
fn assemble_results(
    html: &str,
    query: &SearchQuery,
    limit: usize,
) -> (Vec<Listing>, &'static str) {
    let adapter = adapter_for(query.provider);
    let doc = Html::parse_document(html);
    let mut results = adapter.extract(&doc, limit);
    drop(doc);
    for listing in &mut results {
        backfill_address(listing);
    }

    if results.is_empty() {
        warn!(provider = query.provider.name(), "extraction found nothing; serving fallback");
        (fallback_listings(query), "fallback")
    } else {
        info!(
            provider = query.provider.name(),
            count = results.len(),
            "extraction complete"
        );
        (results, query.provider.name())
    }
}
