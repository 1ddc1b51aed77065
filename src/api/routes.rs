//! HTTP surface: funding arbitrage, agent dispatch, status checks.
//!
//! The funding/chat/search routes always answer 200 with a success-flag
//! envelope; only the status routes speak HTTP status codes. No upstream
//! or agent failure ever escapes as a raw transport error.

use axum::{
    extract::{Json as AxumJson, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::agents::{AgentKind, AgentRegistry};
use crate::arbitrage::{FundingEngine, FundingScan};
use crate::models::{MarketData, StatusCheck, StatusCheckCreate};
use crate::storage::StatusStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FundingEngine>,
    pub agents: Arc<AgentRegistry>,
    pub status_store: Arc<StatusStore>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/", get(root))
        .route(
            "/api/status",
            post(create_status_check).get(get_status_checks),
        )
        .route("/api/funding-arbitrage", get(get_funding_arbitrage))
        .route("/api/chat", post(chat_with_agent))
        .route("/api/search", post(search_and_summarize))
        .route("/api/agents/capabilities", get(get_agent_capabilities))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

async fn create_status_check(
    State(state): State<AppState>,
    AxumJson(input): AxumJson<StatusCheckCreate>,
) -> Result<Json<StatusCheck>, ApiError> {
    let check = StatusCheck::new(input.client_name);
    state.status_store.insert_status(&check)?;
    Ok(Json(check))
}

async fn get_status_checks(
    State(state): State<AppState>,
) -> Result<Json<Vec<StatusCheck>>, ApiError> {
    let checks = state.status_store.recent_statuses(1000)?;
    Ok(Json(checks))
}

/// Funding arbitrage scan: >$50M open-interest markets ranked by
/// funding rate.
async fn get_funding_arbitrage(
    State(state): State<AppState>,
) -> Json<FundingArbitrageResponse> {
    match state.engine.scan_opportunities().await {
        Ok(scan) => Json(FundingArbitrageResponse::from_scan(scan)),
        Err(e) => {
            error!("Error fetching funding arbitrage data: {}", e);
            Json(FundingArbitrageResponse::failure(e.to_string()))
        }
    }
}

/// Chat with one of the AI agents
async fn chat_with_agent(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<ChatRequest>,
) -> Json<ChatResponse> {
    let Some(kind) = AgentKind::parse(&request.agent_type) else {
        return Json(ChatResponse::failure(
            request.agent_type.clone(),
            format!("Unknown agent_type: {:?}", request.agent_type),
        ));
    };

    match state.agents.dispatch(kind, &request.message, false).await {
        Ok(dispatch) => Json(ChatResponse {
            success: true,
            response: dispatch.reply.content,
            agent_type: kind.as_str().to_string(),
            capabilities: dispatch.capabilities,
            metadata: dispatch.reply.metadata,
            error: None,
        }),
        Err(e) => {
            error!("Error in chat endpoint: {}", e);
            Json(ChatResponse::failure(
                kind.as_str().to_string(),
                e.to_string(),
            ))
        }
    }
}

/// Web search with AI summary
async fn search_and_summarize(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<SearchRequest>,
) -> Json<SearchResponse> {
    let mut prompt = format!(
        "Search for information about: {}. Provide a comprehensive summary with key findings.",
        request.query
    );
    if request.max_results > 0 {
        prompt.push_str(&format!(
            " Focus on the {} most relevant sources.",
            request.max_results
        ));
    }

    match state.agents.dispatch(AgentKind::Search, &prompt, true).await {
        Ok(dispatch) => {
            let sources_count = dispatch
                .reply
                .metadata
                .get("sources_count")
                .and_then(Value::as_u64)
                .unwrap_or(0);

            Json(SearchResponse {
                success: true,
                query: request.query,
                summary: dispatch.reply.content,
                search_results: Some(dispatch.reply.metadata),
                sources_count,
                error: None,
            })
        }
        Err(e) => {
            error!("Error in search endpoint: {}", e);
            Json(SearchResponse {
                success: false,
                query: request.query,
                summary: String::new(),
                search_results: None,
                sources_count: 0,
                error: Some(e.to_string()),
            })
        }
    }
}

/// Capability lists for both agent kinds
async fn get_agent_capabilities(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    let chat = state.agents.capabilities(AgentKind::Chat).await;
    let search = state.agents.capabilities(AgentKind::Search).await;

    match (chat, search) {
        (Ok(chat_agent), Ok(search_agent)) => Json(CapabilitiesResponse {
            success: true,
            capabilities: Some(AgentCapabilities {
                chat_agent,
                search_agent,
            }),
            error: None,
        }),
        (Err(e), _) | (_, Err(e)) => {
            error!("Error getting capabilities: {}", e);
            Json(CapabilitiesResponse {
                success: false,
                capabilities: None,
                error: Some(e.to_string()),
            })
        }
    }
}

// ===== Request/Response Types =====

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct FundingArbitrageResponse {
    pub success: bool,
    pub markets: Vec<MarketData>,
    pub total_markets: usize,
    pub filtered_markets: usize,
    pub highest_funding_rate: Option<MarketData>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FundingArbitrageResponse {
    fn from_scan(scan: FundingScan) -> Self {
        Self {
            success: true,
            markets: scan.markets,
            total_markets: scan.total_markets,
            filtered_markets: scan.filtered_markets,
            highest_funding_rate: scan.highest_funding_rate,
            last_updated: Utc::now(),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            success: false,
            markets: Vec::new(),
            total_markets: 0,
            filtered_markets: 0,
            highest_funding_rate: None,
            last_updated: Utc::now(),
            error: Some(error),
        }
    }
}

fn default_agent_type() -> String {
    "chat".to_string()
}

fn default_max_results() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    /// Accepted for wire compatibility; not yet interpreted.
    #[serde(default)]
    #[allow(dead_code)]
    pub context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub agent_type: String,
    pub capabilities: Vec<String>,
    pub metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    fn failure(agent_type: String, error: String) -> Self {
        Self {
            success: false,
            response: String::new(),
            agent_type,
            capabilities: Vec::new(),
            metadata: json!({}),
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Value>,
    pub sources_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AgentCapabilities {
    pub chat_agent: Vec<String>,
    pub search_agent: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CapabilitiesResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<AgentCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    Database(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(err) => {
                error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
