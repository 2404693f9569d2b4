//! Target resolution: one absolute provider URL per normalized query, or
//! `None` for an unresolvable (location-less) query. Redfin gets a region
//! autocomplete lookup before the heuristic template kicks in.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::models::{Provider, SearchQuery};

const REDFIN_AUTOCOMPLETE: &str = "https://www.redfin.com/stingray/do/location-autocomplete";
const LOOKUP_ATTEMPTS: usize = 2;

/// Resolve the query to exactly one absolute URL. `None` means the query
/// carries no location at all, which is a validation failure upstream,
/// never a scrape failure.
pub async fn resolve_target_url(client: &Client, query: &SearchQuery) -> Option<String> {
    if !query.has_location() {
        return None;
    }

    if query.provider == Provider::Redfin && query.zip.is_empty() {
        let location = if !query.city.is_empty() && !query.state.is_empty() {
            format!("{}, {}", query.city, query.state)
        } else {
            query.free_text.clone()
        };
        if let Some(url) = region_lookup(client, &location).await {
            debug!(url = %url, "redfin region lookup resolved target");
            return Some(url);
        }
    }

    heuristic_url(query)
}

/// Per-provider URL templates keyed by location precedence: zip, then
/// city-state, then free text. Every interpolated token is URL-encoded.
pub fn heuristic_url(query: &SearchQuery) -> Option<String> {
    let city = encode(&query.city);
    let state = encode(&query.state);
    let zip = encode(&query.zip);
    let q = encode(&query.free_text);

    let url = match query.provider {
        Provider::Zillow => {
            if !query.zip.is_empty() {
                format!("https://www.zillow.com/homes/{zip}_rb/")
            } else if !query.city.is_empty() && !query.state.is_empty() {
                format!("https://www.zillow.com/homes/{city}-{state}/")
            } else if !query.free_text.is_empty() {
                format!("https://www.zillow.com/homes/{q}/")
            } else {
                return None;
            }
        }
        Provider::Redfin => {
            if !query.zip.is_empty() {
                format!("https://www.redfin.com/zipcode/{zip}")
            } else if !query.city.is_empty() && !query.state.is_empty() {
                format!("https://www.redfin.com/city/{city}-{state}")
            } else if !query.free_text.is_empty() {
                format!("https://www.redfin.com/city/{q}")
            } else {
                return None;
            }
        }
        Provider::Realtor => {
            if !query.zip.is_empty() {
                format!("https://www.realtor.com/realestateandhomes-search/{zip}")
            } else if !query.city.is_empty() && !query.state.is_empty() {
                format!("https://www.realtor.com/realestateandhomes-search/{city}_{state}")
            } else if !query.free_text.is_empty() {
                format!("https://www.realtor.com/realestateandhomes-search/{q}")
            } else {
                return None;
            }
        }
    };
    Some(url)
}

/// Redfin region autocomplete. Every failure mode here (non-2xx, malformed
/// payload, no matching row, network error) degrades to the heuristic
/// template; nothing is surfaced to the caller.
async fn region_lookup(client: &Client, location: &str) -> Option<String> {
    for attempt in 1..=LOOKUP_ATTEMPTS {
        match client
            .get(REDFIN_AUTOCOMPLETE)
            .query(&[("location", location), ("v", "2")])
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.text().await.unwrap_or_default();
                match first_region_url(&body) {
                    Some(url) => return Some(url),
                    None => {
                        warn!(location, "region lookup returned no usable row");
                        return None;
                    }
                }
            }
            Ok(resp) => {
                warn!(location, status = %resp.status(), "region lookup rejected");
                return None;
            }
            Err(err) => {
                warn!(location, attempt, error = %err, "region lookup transport error");
            }
        }
    }
    None
}

/// Pull the first autocomplete row exposing both an `id` and a relative
/// `url` out of the payload's section/row nesting. The stingray endpoint
/// prefixes its JSON with a literal `{}&&` guard, so only that leading
/// guard is stripped; a `&&` inside a string value must not move the
/// parse anchor.
pub fn first_region_url(body: &str) -> Option<String> {
    let trimmed = body.trim();
    let json = trimmed.strip_prefix("{}&&").unwrap_or(trimmed);
    let payload: Value = serde_json::from_str(json).ok()?;

    let sections = payload.get("payload")?.get("sections")?.as_array()?;
    for section in sections {
        let rows = match section.get("rows").and_then(Value::as_array) {
            Some(rows) => rows,
            None => continue,
        };
        for row in rows {
            let id = row.get("id").and_then(Value::as_str);
            let url = row.get("url").and_then(Value::as_str);
            if let (Some(_id), Some(url)) = (id, url) {
                return Some(format!("https://www.redfin.com{url}"));
            }
        }
    }
    None
}
