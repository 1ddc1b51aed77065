use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One perpetual market's snapshot, derived fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub mark_price: f64,
    pub funding_rate: f64,
    pub open_interest: f64,
    pub premium: f64,
    pub day_volume: f64,
    pub price_change_24h: f64,
}

impl MarketData {
    /// Notional exposure in dollar terms.
    pub fn usd_open_interest(&self) -> f64 {
        self.open_interest * self.mark_price
    }
}

/// A persisted status check (liveness ping from a client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_name,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub status_db_path: String,
    pub min_usd_open_interest: f64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let status_db_path = std::env::var("STATUS_DB_PATH")
            .unwrap_or_else(|_| "./fundingbot_status.db".to_string());

        let min_usd_open_interest = std::env::var("MIN_USD_OPEN_INTEREST")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v >= 0.0)
            .unwrap_or(crate::arbitrage::DEFAULT_MIN_USD_OPEN_INTEREST);

        Ok(Self {
            port,
            status_db_path,
            min_usd_open_interest,
        })
    }
}
