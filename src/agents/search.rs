//! Search agent: provider-side web search plus summarization.
//!
//! OpenRouter runs a web search pass for models with the `:online`
//! suffix and returns the pages it used as url_citation annotations, so
//! the "tool" lives upstream and this agent stays a single completion.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use super::llm::OpenRouterClient;
use super::{Agent, AgentConfig, AgentKind, AgentReply};

const SYSTEM_PROMPT: &str = "You are a research assistant. Search the web for the \
user's topic, then write a grounded summary of the key findings. Cite your sources.";

pub struct SearchAgent {
    llm: OpenRouterClient,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl SearchAgent {
    pub fn new(config: &AgentConfig, http: reqwest::Client) -> Result<Self> {
        let llm = OpenRouterClient::new(http, config.require_api_key()?)?;
        Ok(Self {
            llm,
            model: config.search_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn online_model(&self) -> String {
        if self.model.ends_with(":online") {
            self.model.clone()
        } else {
            format!("{}:online", self.model)
        }
    }
}

#[async_trait]
impl Agent for SearchAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Search
    }

    fn capabilities(&self) -> Vec<String> {
        vec![
            "web_search".to_string(),
            "summarization".to_string(),
            "source_citation".to_string(),
        ]
    }

    async fn execute(&self, message: &str, use_tools: bool) -> Result<AgentReply> {
        let model = if use_tools {
            self.online_model()
        } else {
            self.model.clone()
        };

        let output = self
            .llm
            .chat_completion(
                &model,
                SYSTEM_PROMPT,
                message,
                self.max_tokens,
                self.temperature,
            )
            .await?;

        let sources: Vec<_> = output
            .citations
            .iter()
            .map(|c| {
                json!({
                    "url": c.url,
                    "title": c.title,
                })
            })
            .collect();

        let metadata = json!({
            "model": output.model,
            "latency_ms": output.latency_ms,
            "usage": {
                "prompt_tokens": output.usage.prompt_tokens,
                "completion_tokens": output.usage.completion_tokens,
                "total_tokens": output.usage.total_tokens,
            },
            "sources_count": sources.len(),
            "sources": sources,
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
    fn online_suffix_added_once() {
        let agent = SearchAgent::new(&test_config(), reqwest::Client::new()).unwrap();
        assert_eq!(agent.online_model(), "openai/gpt-4o-mini:online");

        let mut config = test_config();
        config.search_model = "openai/gpt-4o-mini:online".to_string();
        let agent = SearchAgent::new(&config, reqwest::Client::new()).unwrap();
        assert_eq!(agent.online_model(), "openai/gpt-4o-mini:online");
    }

    #[test]
    fn advertises_search_capabilities() {
        let agent = SearchAgent::new(&test_config(), reqwest::Client::new()).unwrap();
        assert_eq!(agent.kind(), AgentKind::Search);
        assert!(agent.capabilities().contains(&"web_search".to_string()));
    }
}
