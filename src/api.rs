//! HTTP surface: `/health` and `/search`, with a bearer-token gate in
//! front of everything except the health probe.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::cache::ResultCache;
use crate::config::Config;
use crate::models::{Listing, SearchQuery};
use crate::scrapers::browser::SessionConfig;
use crate::search::{run_search, SearchOutcome};

const CACHE_CAPACITY: usize = 100;
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<ResultCache>,
    pub session: SessionConfig,
    /// Admission gate bounding simultaneous browser sessions.
    pub sessions: Arc<Semaphore>,
    /// Shared client for the region lookup; carries the proxy and user
    /// agent the browser context uses.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(config.user_agent.clone());
        if let Some(proxy) = &config.proxy {
            let mut proxy_cfg = reqwest::Proxy::all(&proxy.server_url)?;
            if let (Some(user), Some(pass)) = (&proxy.user, &proxy.pass) {
                proxy_cfg = proxy_cfg.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy_cfg);
        }
        let http = builder.build()?;

        Ok(Self {
            session: SessionConfig::from(&config),
            sessions: Arc::new(Semaphore::new(config.max_sessions)),
            cache: Arc::new(ResultCache::new(CACHE_CAPACITY, CACHE_TTL)),
            config: Arc::new(config),
            http,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .route("/health", get(health))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// The request-level failure taxonomy. Lookup and selector-wait failures
/// never reach this; they degrade inside the pipeline.
#[derive(Debug)]
pub enum ApiError {
    MissingLocation,
    Unauthorized,
    Scrape(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingLocation => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "missing location (city/state or zip or q)" })),
            )
                .into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response(),
            ApiError::Scrape(err) => {
                error!(error = %err, "scrape failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "scrape failed", "detail": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// Shared-secret check; runs before any cache or scrape work. A blank
/// configured secret disables the gate.
async fn require_bearer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let secret = state.config.auth_token.as_str();
    if secret.is_empty() {
        return Ok(next.run(req).await);
    }
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    if presented == Some(secret) {
        Ok(next.run(req).await)
    } else {
        Err(ApiError::Unauthorized)
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    provider: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<Listing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<bool>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = SearchQuery::normalize(
        params.provider.as_deref(),
        params.city.as_deref(),
        params.state.as_deref(),
        params.zip.as_deref(),
        params.q.as_deref(),
        state.config.default_provider,
    );

    let response = match run_search(&state, &query).await? {
        SearchOutcome::Cached(results) => SearchResponse {
            results,
            source: None,
            cached: Some(true),
            proxy: None,
        },
        SearchOutcome::Fresh { results, source } => SearchResponse {
            results,
            source: Some(source),
            cached: None,
            proxy: Some(state.config.proxy.is_some()),
        },
    };
    Ok(Json(response))
}
