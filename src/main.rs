//! FundingBot - Hyperliquid Funding Arbitrage & AI Agents API
//! Mission: Surface the best-paying perp funding rates and answer
//! questions about them

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundingbot_backend::{
    agents::{AgentConfig, AgentRegistry},
    api::{create_router, AppState},
    arbitrage::FundingEngine,
    models::Config,
    scrapers::{hyperliquid::build_http_client, HyperliquidClient},
    storage::StatusStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("🚀 FundingBot API starting");

    let config = Config::from_env()?;
    let agent_config = AgentConfig::from_env();
    if agent_config.openrouter_api_key.is_none() {
        info!("⚠️  OPENROUTER_API_KEY not set - agent endpoints will report failures");
    }

    let http_client = build_http_client()?;

    let status_store = Arc::new(StatusStore::new(&config.status_db_path)?);

    let engine = Arc::new(FundingEngine::new(
        HyperliquidClient::new(http_client.clone()),
        config.min_usd_open_interest,
    ));

    // Agents are constructed lazily on first request; the registry only
    // holds the injected configuration until then.
    let agents = Arc::new(AgentRegistry::new(agent_config, http_client));

    let app_state = AppState {
        engine,
        agents,
        status_store,
    };

    let app = create_router(app_state).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filterable output
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundingbot_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
