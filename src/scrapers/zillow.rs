use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::models::{Listing, Provider};
use crate::scrapers::fields::{derive_id, first_decimal, href_of, image_of, text_of, to_number};
use crate::scrapers::traits::Extractor;

const CARD_SELECTOR: &str = r#"[data-testid="property-card"]"#;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse(CARD_SELECTOR).unwrap());
static PRICE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="property-card-price"]"#).unwrap());
static ADDR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="property-card-addr"]"#).unwrap());
static META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="property-card-meta-item"]"#).unwrap());
static LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[data-testid="property-card-link"]"#).unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static ZPID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([0-9]+)_zpid").unwrap());

/// Zillow search-result cards. Beds/baths/sqft arrive as an unordered list
/// of short meta strings and are classified by substring.
pub struct ZillowExtractor;

impl Extractor for ZillowExtractor {
    fn provider(&self) -> Provider {
        Provider::Zillow
    }

    fn ready_selector(&self) -> &'static str {
        CARD_SELECTOR
    }

    fn extract(&self, doc: &Html, limit: usize) -> Vec<Listing> {
        let mut listings = Vec::new();

        for node in doc.select(&CARD).take(limit) {
            let price_text = text_of(node, &PRICE);
            let address = text_of(node, &ADDR);
            let meta: Vec<String> = node
                .select(&META)
                .map(|m| m.text().collect::<String>().trim().to_string())
                .collect();

            let find_token = |needle: &str| {
                meta.iter()
                    .find(|m| m.to_lowercase().contains(needle))
                    .cloned()
                    .unwrap_or_default()
            };
            let beds = to_number(&find_token("bd")) as u32;
            let baths = first_decimal(&find_token("ba"));
            let sqft = to_number(&find_token("sqft")) as u32;

            let link = href_of(node, &LINK);
            debug!(address = %address, link = %link, "zillow card");

            listings.push(Listing {
                id: derive_id(&link, &ZPID),
                title: if price_text.is_empty() {
                    "Listing".to_string()
                } else {
                    price_text.clone()
                },
                price: to_number(&price_text) as u64,
                address,
                beds,
                baths,
                sqft,
                photo_url: image_of(node, &IMG),
                tags: meta,
                source: Provider::Zillow.scraper_source().to_string(),
                ..Default::default()
            });
        }

        listings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, price: &str, addr: &str, meta: &[&str]) -> String {
        let meta_html: String = meta
            .iter()
            .map(|m| format!(r#"<li data-testid="property-card-meta-item">{m}</li>"#))
            .collect();
        format!(
            r#"<article data-testid="property-card">
                 <a data-testid="property-card-link" href="/homedetails/1-demo-st/{id}_zpid/">
                   <img src="https://photos.example/{id}.jpg">
                 </a>
                 <span data-testid="property-card-price">{price}</span>
                 <address data-testid="property-card-addr">{addr}</address>
                 <ul>{meta_html}</ul>
               </article>"#
        )
    }

    fn page(cards: &[String]) -> Html {
        Html::parse_document(&format!("<html><body>{}</body></html>", cards.join("")))
    }

    #[test]
    fn extracts_full_card() {
        let doc = page(&[card(
            "4412",
            "$550,000",
            "123 Main St, Springfield, IL 62704",
            &["3 bd", "2.5 ba", "1,500 sqft"],
        )]);
        let listings = ZillowExtractor.extract(&doc, 10);
        assert_eq!(listings.len(), 1);

        let l = &listings[0];
        assert_eq!(l.id, "4412");
        assert_eq!(l.title, "$550,000");
        assert_eq!(l.price, 550_000);
        assert_eq!(l.address, "123 Main St, Springfield, IL 62704");
        assert_eq!(l.beds, 3);
        assert_eq!(l.baths, 2.5);
        assert_eq!(l.sqft, 1500);
        assert_eq!(l.photo_url, "https://photos.example/4412.jpg");
        assert_eq!(l.tags, vec!["3 bd", "2.5 ba", "1,500 sqft"]);
        assert_eq!(l.source, "zillow-scraper");
        // City/state/zip come from the backfill pass, not the card.
        assert_eq!(l.city, "");
    }

    #[test]
    fn truncates_to_limit() {
        let cards: Vec<String> = (0..5)
            .map(|i| card(&format!("{i}"), "$1", "1 A St", &[]))
            .collect();
        assert_eq!(ZillowExtractor.extract(&page(&cards), 2).len(), 2);
    }

    #[test]
    fn meta_order_is_preserved_as_tags() {
        let doc = page(&[card("1", "$1", "1 A St", &["1,500 sqft", "3 bd", "2 ba"])]);
        let listings = ZillowExtractor.extract(&doc, 10);
        assert_eq!(listings[0].tags, vec!["1,500 sqft", "3 bd", "2 ba"]);
        assert_eq!(listings[0].beds, 3);
        assert_eq!(listings[0].sqft, 1500);
    }

    #[test]
    fn missing_link_still_yields_nonempty_id() {
        let doc = page(&[
            r#"<article data-testid="property-card">
                 <span data-testid="property-card-price"></span>
               </article>"#
                .to_string(),
        ]);
        let listings = ZillowExtractor.extract(&doc, 10);
        assert_eq!(listings.len(), 1);
        assert!(!listings[0].id.is_empty());
        assert_eq!(listings[0].title, "Listing");
        assert_eq!(listings[0].price, 0);
    }
}
