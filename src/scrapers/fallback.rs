use crate::models::{Listing, SearchQuery};

/// Deterministic synthetic result set, substituted whenever extraction
/// yields nothing (blocked page, changed markup, genuinely empty result).
/// Parameterized only by the requested city/state; provenance is always
/// `fallback`, never a `-scraper` tag.
pub fn fallback_listings(query: &SearchQuery) -> Vec<Listing> {
    let city = if query.city.is_empty() {
        "Demo City"
    } else {
        &query.city
    };
    let state = if query.state.is_empty() { "ST" } else { &query.state };

    vec![Listing {
        id: "demo-scrape-1".to_string(),
        title: "Demo Scraped Listing".to_string(),
        price: 550_000,
        address: format!("123 Demo St, {city}, {state} 00000"),
        city: city.to_string(),
        state: state.to_string(),
        zip: "00000".to_string(),
        beds: 3,
        baths: 2.0,
        sqft: 1500,
        lot_sqft: 5000,
        year_built: 1999,
        stories: 1,
        garage_spaces: 2,
        has_rv_parking: true,
        has_fireplace: true,
        property_type: "Single Family".to_string(),
        tags: vec!["demo".to_string(), "fallback".to_string()],
        source: "fallback".to_string(),
        ..Default::default()
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn query(city: &str, state: &str) -> SearchQuery {
        SearchQuery {
            provider: Provider::Zillow,
            zip: String::new(),
            city: city.into(),
            state: state.into(),
            free_text: String::new(),
        }
    }

    #[test]
    fn fallback_is_never_empty_and_tagged() {
        let listings = fallback_listings(&query("", ""));
        assert!(!listings.is_empty());
        assert!(listings.iter().all(|l| l.source == "fallback"));
    }

    #[test]
    fn placeholder_location_when_none_given() {
        let listings = fallback_listings(&query("", ""));
        assert!(listings[0].address.contains("Demo City"));
        assert_eq!(listings[0].state, "ST");
    }

    #[test]
    fn requested_location_flows_through() {
        let listings = fallback_listings(&query("Austin", "TX"));
        assert_eq!(listings[0].city, "Austin");
        assert_eq!(listings[0].address, "123 Demo St, Austin, TX 00000");
    }

    #[test]
    fn deterministic_across_calls() {
        let q = query("Austin", "TX");
        let a = serde_json::to_string(&fallback_listings(&q)).unwrap();
        let b = serde_json::to_string(&fallback_listings(&q)).unwrap();
        assert_eq!(a, b);
    }
}
