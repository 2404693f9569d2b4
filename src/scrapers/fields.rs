//! Shared field parsing used by every extraction adapter: the numeric
//! strip-and-parse rule, bath token handling, id/image fallbacks, and the
//! comma-heuristic address backfill.

use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::Listing;

static DECIMAL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap());

/// Strip every character that is not a digit or decimal point, then parse.
/// Empty or unparseable input yields 0.
pub fn to_number(raw: &str) -> f64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse().unwrap_or(0.0)
}

/// First decimal-capable numeric token in the text, or 0. Baths use this
/// instead of `to_number` so "2.5 ba" does not collapse into 25.
pub fn first_decimal(raw: &str) -> f64 {
    DECIMAL_TOKEN
        .find(raw)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Random identifier for listings whose card exposes no usable link. Must
/// be non-empty; stability across runs is not required.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

/// Id derivation shared by all adapters: a provider pattern capture from
/// the detail link, else the raw link, else a random token.
pub fn derive_id(link: &str, pattern: &Regex) -> String {
    if let Some(caps) = pattern.captures(link) {
        if let Some(m) = caps.get(1) {
            return m.as_str().to_string();
        }
    }
    if !link.is_empty() {
        return link.to_string();
    }
    random_token()
}

/// Trimmed text content of the first descendant matching `sel`.
pub fn text_of(node: ElementRef<'_>, sel: &Selector) -> String {
    node.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// First `href` among descendants matching `sel`.
pub fn href_of(node: ElementRef<'_>, sel: &Selector) -> String {
    node.select(sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .unwrap_or("")
        .to_string()
}

/// Primary image source: `src`, falling back to the lazy-load `data-src`.
pub fn image_of(node: ElementRef<'_>, sel: &Selector) -> String {
    node.select(sel)
        .next()
        .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
        .unwrap_or("")
        .to_string()
}

/// Backfill city/state/zip from free-text address tokens. Only applies
/// when the address is present and the structured fields are empty;
/// best-effort, partial backfill is fine.
pub fn backfill_address(listing: &mut Listing) {
    if listing.address.is_empty()
        || !listing.city.is_empty()
        || !listing.state.is_empty()
        || !listing.zip.is_empty()
    {
        return;
    }
    let parts: Vec<&str> = listing.address.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return;
    }
    listing.city = parts[parts.len() - 2].to_string();
    let mut state_zip = parts[parts.len() - 1].split_whitespace();
    if let Some(state) = state_zip.next() {
        listing.state = state.to_string();
    }
    if let Some(zip) = state_zip.next() {
        listing.zip = zip.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn to_number_handles_empty_and_noise() {
        assert_eq!(to_number(""), 0.0);
        assert_eq!(to_number("n/a"), 0.0);
        assert_eq!(to_number("$1,234 sqft"), 1234.0);
        assert_eq!(to_number("3 bd"), 3.0);
    }

    #[test]
    fn first_decimal_keeps_half_baths() {
        assert_eq!(first_decimal("2.5 ba"), 2.5);
        assert_eq!(first_decimal("ba"), 0.0);
        assert_eq!(first_decimal("1 ba"), 1.0);
    }

    #[test]
    fn derive_id_prefers_pattern_then_link_then_token() {
        let pattern = Regex::new(r"/([0-9]+)_zpid").unwrap();
        assert_eq!(derive_id("/homedetails/x/4412_zpid/", &pattern), "4412");
        assert_eq!(derive_id("/some/other/link", &pattern), "/some/other/link");
        assert!(!derive_id("", &pattern).is_empty());
    }

    #[test]
    fn image_falls_back_to_lazy_source() {
        let sel = Selector::parse("img").unwrap();
        let doc = Html::parse_fragment(r#"<div><img data-src="https://x/lazy.jpg"></div>"#);
        let root = doc.root_element();
        assert_eq!(image_of(root, &sel), "https://x/lazy.jpg");

        let doc = Html::parse_fragment(r#"<div><img src="https://x/a.jpg" data-src="https://x/b.jpg"></div>"#);
        assert_eq!(image_of(doc.root_element(), &sel), "https://x/a.jpg");
    }

    #[test]
    fn backfill_splits_city_state_zip() {
        let mut listing = Listing {
            address: "123 Main St, Springfield, IL 62704".into(),
            ..Default::default()
        };
        backfill_address(&mut listing);
        assert_eq!(listing.city, "Springfield");
        assert_eq!(listing.state, "IL");
        assert_eq!(listing.zip, "62704");
    }

    #[test]
    fn backfill_tolerates_malformed_addresses() {
        let mut listing = Listing {
            address: "just a street".into(),
            ..Default::default()
        };
        backfill_address(&mut listing);
        assert_eq!(listing.city, "");

        let mut partial = Listing {
            address: "12 Shore Dr, Chicago, IL".into(),
            ..Default::default()
        };
        backfill_address(&mut partial);
        assert_eq!(partial.city, "Chicago");
        assert_eq!(partial.state, "IL");
        assert_eq!(partial.zip, "");
    }

    #[test]
    fn backfill_leaves_populated_listings_alone() {
        let mut listing = Listing {
            address: "1 A St, Portland, OR 97204".into(),
            city: "Salem".into(),
            ..Default::default()
        };
        backfill_address(&mut listing);
        assert_eq!(listing.city, "Salem");
    }
}
