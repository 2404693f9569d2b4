//! Router-level tests driven through `tower::ServiceExt::oneshot`, no
//! listening socket and no browser. Everything exercised here resolves
//! before the scrape pipeline would launch a session: the health probe,
//! the bearer gate, location validation, and the cache-hit short circuit.

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use homefinder_scraper::models::{Listing, Provider, SearchQuery};
use homefinder_scraper::{create_router, AppState, Config};

fn app_with(config: Config) -> (Router, AppState) {
    let state = AppState::new(config).expect("state should build");
    (create_router(state.clone()), state)
}

async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let resp = app
        .clone()
        .oneshot(builder.body(Body::empty()).expect("request build"))
        .await
        .expect("router response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

#[tokio::test]
async fn health_is_open_and_ok() {
    let (app, _) = app_with(Config::default());
    let (status, body) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn health_ignores_the_bearer_gate() {
    let (app, _) = app_with(Config {
        auth_token: "s3cret".into(),
        ..Config::default()
    });
    let (status, _) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_without_token_is_unauthorized() {
    let (app, state) = app_with(Config {
        auth_token: "s3cret".into(),
        ..Config::default()
    });
    let (status, body) = get(&app, "/search?zip=12345", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    // Short-circuited before any cache work.
    let key = SearchQuery::normalize(None, None, None, Some("12345"), None, Provider::Zillow)
        .cache_key();
    assert!(state.cache.get(&key).is_none());
}

#[tokio::test]
async fn search_with_wrong_token_is_unauthorized() {
    let (app, _) = app_with(Config {
        auth_token: "s3cret".into(),
        ..Config::default()
    });
    let (status, _) = get(&app, "/search?zip=12345", Some("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_location_is_a_bad_request() {
    let (app, _) = app_with(Config::default());
    let (status, body) = get(&app, "/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing location (city/state or zip or q)");
}

#[tokio::test]
async fn missing_location_with_valid_token_is_still_bad_request() {
    let (app, _) = app_with(Config {
        auth_token: "s3cret".into(),
        ..Config::default()
    });
    let (status, _) = get(&app, "/search?provider=redfin", Some("s3cret")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cache_hit_short_circuits_the_pipeline() {
    let (app, state) = app_with(Config::default());

    let query =
        SearchQuery::normalize(None, None, None, Some("97204"), None, Provider::Zillow);
    state.cache.insert(
        query.cache_key(),
        vec![Listing {
            id: "zpid-1".into(),
            title: "$489,000".into(),
            price: 489_000,
            source: "zillow-scraper".into(),
            ..Default::default()
        }],
    );

    let (status, body) = get(&app, "/search?zip=97204", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(body["results"][0]["id"], "zpid-1");
    assert_eq!(body["results"][0]["price"], 489_000);
    // Cached responses omit the source tag.
    assert!(body.get("source").is_none());
}

#[tokio::test]
async fn cache_key_normalization_folds_equivalent_requests() {
    let (app, state) = app_with(Config::default());

    let query =
        SearchQuery::normalize(None, None, None, Some("12345"), None, Provider::Zillow);
    state
        .cache
        .insert(query.cache_key(), vec![Listing::default()]);

    // Different provider casing and whitespace, same canonical key.
    let (status, body) = get(&app, "/search?provider=ZILLOW&zip=%2012345%20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
}
