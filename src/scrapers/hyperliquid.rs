//! Hyperliquid Info API Integration
//!
//! One-shot snapshot fetches against the public /info endpoint. The
//! funding pipeline is request-scoped, so there is deliberately no
//! retry loop and no response caching here.

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const INFO_API_URL: &str = "https://api.hyperliquid.xyz/info";

/// Failure talking to the exchange.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The exchange answered, but not with 200.
    #[error("hyperliquid info request failed with status {status}")]
    Status { status: u16 },
    /// The request never completed (DNS, TLS, timeout, ...).
    #[error("hyperliquid info request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct HyperliquidClient {
    client: reqwest::Client,
    info_url: String,
}

impl HyperliquidClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_info_url(client, INFO_API_URL)
    }

    /// Point the client at a non-default info endpoint.
    pub fn with_info_url(client: reqwest::Client, info_url: impl Into<String>) -> Self {
        Self {
            client,
            info_url: info_url.into(),
        }
    }

    /// Fetch the combined "universe + asset contexts" snapshot.
    ///
    /// Returns the raw JSON on HTTP 200. The shape is lenient on
    /// purpose: the parse stage owns all structural validation.
    pub async fn fetch_meta_and_asset_ctxs(&self) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(&self.info_url)
            .json(&serde_json::json!({ "type": "metaAndAssetCtxs" }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let snapshot = response.json::<Value>().await?;
        debug!("Fetched metaAndAssetCtxs snapshot from Hyperliquid");
        Ok(snapshot)
    }
}

/// Shared HTTP client for all outbound calls (Hyperliquid + OpenRouter).
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent("FundingBot/1.0 (Funding Arbitrage API)")
        .build()
        .context("Failed to build HTTP client")
}
