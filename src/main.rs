use tracing::info;
use tracing_subscriber::EnvFilter;

use homefinder_scraper::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(
        port = config.port,
        default_provider = config.default_provider.name(),
        max_results = config.max_results,
        headless = config.headless,
        proxy = config.proxy.is_some(),
        auth = !config.auth_token.is_empty(),
        "starting listing scraper"
    );

    let port = config.port;
    let state = AppState::new(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
