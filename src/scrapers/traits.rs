use scraper::Html;

use crate::models::{Listing, Provider};
use crate::scrapers::realtor::RealtorExtractor;
use crate::scrapers::redfin::RedfinExtractor;
use crate::scrapers::zillow::ZillowExtractor;

/// Common trait for all provider extraction adapters.
///
/// Extraction is a pure function over an already-rendered document, so
/// every adapter is unit-testable without a browser. Adding a provider
/// means one adapter plus one URL template; shared components stay
/// untouched.
pub trait Extractor: Send + Sync {
    /// Provider this adapter handles.
    fn provider(&self) -> Provider;

    /// "Content ready" marker the session may wait for before handing the
    /// page over. The wait failing is non-fatal.
    fn ready_selector(&self) -> &'static str;

    /// Produce up to `limit` canonical listings from a rendered document.
    fn extract(&self, doc: &Html, limit: usize) -> Vec<Listing>;
}

static ZILLOW: ZillowExtractor = ZillowExtractor;
static REDFIN: RedfinExtractor = RedfinExtractor;
static REALTOR: RealtorExtractor = RealtorExtractor;

/// Adapter dispatch over the closed provider set. The match guarantees at
/// compile time that every provider has a registered adapter.
pub fn adapter_for(provider: Provider) -> &'static dyn Extractor {
    match provider {
        Provider::Zillow => &ZILLOW,
        Provider::Redfin => &REDFIN,
        Provider::Realtor => &REALTOR,
    }
}
