//! AI agent execution units and their lazy registry.
//!
//! Two agent kinds exist: a conversational chat agent and a
//! tool-augmented search agent. Both run on OpenRouter chat
//! completions; the registry constructs each at most once per process.

pub mod chat;
pub mod llm;
pub mod registry;
pub mod search;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use chat::ChatAgent;
pub use registry::{AgentDispatch, AgentRegistry};
pub use search::SearchAgent;

/// Supported agent kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Chat,
    Search,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Chat => "chat",
            AgentKind::Search => "search",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Some(Self::Chat),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

/// What an agent hands back for one executed message.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub content: String,
    pub metadata: Value,
}

/// An opaque, capability-reporting execution unit.
#[async_trait]
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Static capability list this agent advertises.
    fn capabilities(&self) -> Vec<String>;

    async fn execute(&self, message: &str, use_tools: bool) -> Result<AgentReply>;
}

/// Shared agent configuration, loaded once at startup and injected.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub openrouter_api_key: Option<String>,
    pub chat_model: String,
    pub search_model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let chat_model = std::env::var("AGENT_CHAT_MODEL")
            .unwrap_or_else(|_| "anthropic/claude-3.5-sonnet".to_string());

        let search_model = std::env::var("AGENT_SEARCH_MODEL")
            .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string());

        let max_tokens = std::env::var("AGENT_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(1024);

        let temperature = std::env::var("AGENT_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && (0.0..=2.0).contains(v))
            .unwrap_or(0.7);

        Self {
            openrouter_api_key,
            chat_model,
            search_model,
            max_tokens,
            temperature,
        }
    }

    pub(crate) fn require_api_key(&self) -> Result<&str> {
        self.openrouter_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("OPENROUTER_API_KEY missing (set env var)"))
    }
}
