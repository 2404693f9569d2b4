use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::models::{Listing, Provider};
use crate::scrapers::fields::{derive_id, first_decimal, href_of, image_of, text_of, to_number};
use crate::scrapers::traits::Extractor;

const CARD_SELECTOR: &str = r#"div[data-testid="rdc-property-card"]"#;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse(CARD_SELECTOR).unwrap());
static PRICE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="card-price"]"#).unwrap());
static ADDR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="card-address"]"#).unwrap());
static BEDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"li[data-testid="property-meta-beds"]"#).unwrap());
static BATHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"li[data-testid="property-meta-baths"]"#).unwrap());
static SQFT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"li[data-testid="property-meta-sqft"]"#).unwrap());
static LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/realestateandhomes-detail/"]"#).unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
// Realtor detail ids are opaque path segments, e.g. "1-Demo-St_Springfield_IL_62704_M1234-56789".
static DETAIL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/realestateandhomes-detail/([^/?#]+)").unwrap());

/// Realtor.com property cards.
pub struct RealtorExtractor;

impl Extractor for RealtorExtractor {
    fn provider(&self) -> Provider {
        Provider::Realtor
    }

    fn ready_selector(&self) -> &'static str {
        CARD_SELECTOR
    }

    fn extract(&self, doc: &Html, limit: usize) -> Vec<Listing> {
        let mut listings = Vec::new();

        for node in doc.select(&CARD).take(limit) {
            let price_text = text_of(node, &PRICE);
            let address = text_of(node, &ADDR);
            let beds_text = text_of(node, &BEDS);
            let baths_text = text_of(node, &BATHS);
            let sqft_text = text_of(node, &SQFT);

            let tags: Vec<String> = [&beds_text, &baths_text, &sqft_text]
                .into_iter()
                .filter(|t| !t.is_empty())
                .cloned()
                .collect();

            let link = href_of(node, &LINK);

            listings.push(Listing {
                id: derive_id(&link, &DETAIL_ID),
                title: if price_text.is_empty() {
                    "Listing".to_string()
                } else {
                    price_text.clone()
                },
                price: to_number(&price_text) as u64,
                address,
                beds: to_number(&beds_text) as u32,
                baths: first_decimal(&baths_text),
                sqft: to_number(&sqft_text) as u32,
                photo_url: image_of(node, &IMG),
                tags,
                source: Provider::Realtor.scraper_source().to_string(),
                ..Default::default()
            });
        }

        listings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, price: &str, addr: &str) -> String {
        format!(
            r#"<div data-testid="rdc-property-card">
                 <a href="/realestateandhomes-detail/{id}">
                   <img src="https://ap.rdcpix.example/{id}.jpg">
                 </a>
                 <div data-testid="card-price">{price}</div>
                 <div data-testid="card-address">{addr}</div>
                 <ul>
                   <li data-testid="property-meta-beds">3 bed</li>
                   <li data-testid="property-meta-baths">2 bath</li>
                   <li data-testid="property-meta-sqft">1,500 square feet</li>
                 </ul>
               </div>"#
        )
    }

    #[test]
    fn extracts_full_card() {
        let html = format!(
            "<html><body>{}</body></html>",
            card("22-Fern-St_Austin_TX_78704_M4321-09876", "$455,000", "22 Fern St, Austin, TX 78704")
        );
        let listings = RealtorExtractor.extract(&Html::parse_document(&html), 10);
        assert_eq!(listings.len(), 1);

        let l = &listings[0];
        assert_eq!(l.id, "22-Fern-St_Austin_TX_78704_M4321-09876");
        assert_eq!(l.price, 455_000);
        assert_eq!(l.beds, 3);
        assert_eq!(l.baths, 2.0);
        assert_eq!(l.sqft, 1500);
        assert_eq!(l.tags, vec!["3 bed", "2 bath", "1,500 square feet"]);
        assert_eq!(l.source, "realtor-scraper");
    }

    #[test]
    fn truncates_to_limit() {
        let cards: String = (0..6).map(|i| card(&format!("id-{i}"), "$1", "1 A St")).collect();
        let html = format!("<html><body>{cards}</body></html>");
        assert_eq!(RealtorExtractor.extract(&Html::parse_document(&html), 4).len(), 4);
    }
}
