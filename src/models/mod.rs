use serde::{Deserialize, Serialize};

/// One external site this service knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Zillow,
    Redfin,
    Realtor,
}

impl Provider {
    /// Case-insensitive match against the known set; anything else falls
    /// back to the configured default.
    pub fn parse_or(raw: &str, default: Provider) -> Provider {
        match raw.trim().to_ascii_lowercase().as_str() {
            "zillow" => Provider::Zillow,
            "redfin" => Provider::Redfin,
            "realtor" => Provider::Realtor,
            _ => default,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Zillow => "zillow",
            Provider::Redfin => "redfin",
            Provider::Realtor => "realtor",
        }
    }

    /// Provenance tag stamped on listings genuinely extracted from this
    /// provider's pages.
    pub fn scraper_source(&self) -> &'static str {
        match self {
            Provider::Zillow => "zillow-scraper",
            Provider::Redfin => "redfin-scraper",
            Provider::Realtor => "realtor-scraper",
        }
    }
}

/// Canonical normalized property record produced by this service.
///
/// Numeric fields use `0` as the "unknown" sentinel. `baths` is fractional
/// because half-baths are common. `vision_tags` is reserved for derived
/// tags and stays empty at this stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: u64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub beds: u32,
    pub baths: f64,
    pub sqft: u32,
    pub lot_sqft: u64,
    pub year_built: u32,
    pub stories: u32,
    pub garage_spaces: u32,
    pub has_rv_parking: bool,
    pub has_pool: bool,
    pub has_waterfront: bool,
    pub has_view: bool,
    pub has_basement: bool,
    pub has_fireplace: bool,
    pub is_new_build: bool,
    pub is_fixer: bool,
    pub has_adu: bool,
    pub hoa_fee: u32,
    pub property_type: String,
    pub photo_url: String,
    pub tags: Vec<String>,
    pub vision_tags: Vec<String>,
    pub source: String,
}

/// Normalized search intent for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub provider: Provider,
    pub zip: String,
    pub city: String,
    pub state: String,
    pub free_text: String,
}

impl SearchQuery {
    /// Build a query from raw request parameters, trimming every field and
    /// resolving the provider tag. Pure; no side effects.
    pub fn normalize(
        provider: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        zip: Option<&str>,
        q: Option<&str>,
        default_provider: Provider,
    ) -> SearchQuery {
        let trim = |v: Option<&str>| v.unwrap_or("").trim().to_string();
        SearchQuery {
            provider: Provider::parse_or(provider.unwrap_or(""), default_provider),
            zip: trim(zip),
            city: trim(city),
            state: trim(state),
            free_text: trim(q),
        }
    }

    /// Location precedence is fixed: zip, then city+state, then free text.
    pub fn has_location(&self) -> bool {
        !self.zip.is_empty()
            || (!self.city.is_empty() && !self.state.is_empty())
            || !self.free_text.is_empty()
    }

    /// Canonical query key; used both for target resolution and as the
    /// cache key.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|zip={}|city={}|state={}|q={}",
            self.provider.name(),
            self.zip,
            self.city,
            self.state,
            self.free_text
        )
    }
}

/// Outbound proxy target; absent means direct connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub server_url: String,
    pub user: Option<String>,
    pub pass: Option<String>,
}
