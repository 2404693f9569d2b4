use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::models::{Listing, Provider};
use crate::scrapers::fields::{derive_id, first_decimal, href_of, image_of, text_of, to_number};
use crate::scrapers::traits::Extractor;

const CARD_SELECTOR: &str = "div.HomeCardContainer";

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse(CARD_SELECTOR).unwrap());
static PRICE: Lazy<Selector> = Lazy::new(|| Selector::parse(".bp-Homecard__Price--value").unwrap());
static ADDR: Lazy<Selector> = Lazy::new(|| Selector::parse(".bp-Homecard__Address").unwrap());
static BEDS: Lazy<Selector> = Lazy::new(|| Selector::parse(".bp-Homecard__Stats--beds").unwrap());
static BATHS: Lazy<Selector> = Lazy::new(|| Selector::parse(".bp-Homecard__Stats--baths").unwrap());
static SQFT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".bp-Homecard__LockedStat--value, .bp-Homecard__Stats--sqft").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="/home/"]"#).unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static HOME_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/home/([0-9]+)").unwrap());

/// Redfin home cards. Stats carry dedicated per-field classes, so no token
/// classification is needed; baths still keep the decimal rule.
pub struct RedfinExtractor;

impl Extractor for RedfinExtractor {
    fn provider(&self) -> Provider {
        Provider::Redfin
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
                id: derive_id(&link, &HOME_ID),
                title: if address.is_empty() {
                    "Listing".to_string()
                } else {
                    address.clone()
                },
                price: to_number(&price_text) as u64,
                address,
                beds: to_number(&beds_text) as u32,
                baths: first_decimal(&baths_text),
                sqft: to_number(&sqft_text) as u32,
                photo_url: image_of(node, &IMG),
                tags,
                source: Provider::Redfin.scraper_source().to_string(),
                ..Default::default()
            });
        }

        listings
    }
}
