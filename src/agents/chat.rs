//! Conversational agent: one plain chat completion per message.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::llm::OpenRouterClient;
use super::{Agent, AgentConfig, AgentKind, AgentReply};

const SYSTEM_PROMPT: &str = "You are a helpful assistant for a crypto funding-rate \
arbitrage service. Answer clearly and concisely; say so when you do not know.";

pub struct ChatAgent {
    llm: OpenRouterClient,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl ChatAgent {
    pub fn new(config: &AgentConfig, http: reqwest::Client) -> Result<Self> {
        let llm = OpenRouterClient::new(http, config.require_api_key()?)?;
        Ok(Self {
            llm,
            model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Agent for ChatAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Chat
    }

    fn capabilities(&self) -> Vec<String> {
        vec![
            "conversation".to_string(),
            "general_reasoning".to_string(),
            "context_memory".to_string(),
        ]
    }

    async fn execute(&self, message: &str, _use_tools: bool) -> Result<AgentReply> {
        let output = self
            .llm
            .chat_completion(
                &self.model,
                SYSTEM_PROMPT,
                message,
                self.max_tokens,
                self.temperature,
            )
            .await?;

        let metadata = json!({
            "model": output.model,
            "latency_ms": output.latency_ms,
            "usage": {
                "prompt_tokens": output.usage.prompt_tokens,
                "completion_tokens": output.usage.completion_tokens,
                "total_tokens": output.usage.total_tokens,
            },
        });

        Ok(AgentReply {
            content: output.content,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AgentConfig {
        AgentConfig {
            openrouter_api_key: Some("test-key".to_string()),
            chat_model: "anthropic/claude-3.5-sonnet".to_string(),
            search_model: "openai/gpt-4o-mini".to_string(),
            max_tokens: 256,
            temperature: 0.7,
        }
    }

    #[test]
    fn advertises_chat_capabilities() {
        let agent = ChatAgent::new(&test_config(), reqwest::Client::new()).unwrap();
        assert_eq!(agent.kind(), AgentKind::Chat);
        assert!(agent.capabilities().contains(&"conversation".to_string()));
    }

    // Integration test requires a real key, mark as ignored
    #[tokio::test]
    #[ignore = "requires OPENROUTER_API_KEY"]
    async fn executes_a_real_completion() {
        let config = AgentConfig::from_env();
        let agent = ChatAgent::new(&config, reqwest::Client::new()).unwrap();
        let reply = agent
            .execute("Say 'hello' and nothing else.", false)
            .await
            .unwrap();
        assert!(reply.content.to_lowercase().contains("hello"));
    }
}
