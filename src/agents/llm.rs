//! OpenRouter chat-completions client shared by both agents.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone, Default)]
pub struct LlmUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

/// A web source the provider cited while answering.
#[derive(Debug, Clone)]
pub struct Citation {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmCallOutput {
    pub model: String,
    pub content: String,
    pub usage: LlmUsage,
    pub citations: Vec<Citation>,
    pub latency_ms: u64,
}

#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(anyhow!("OpenRouter API key empty"));
        }
        Ok(Self { http, api_key })
    }

    pub async fn chat_completion(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<LlmCallOutput> {
        let start = Instant::now();

        let req = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        };

        let resp = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&req)
            .send()
            .await
            .context("openrouter request")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let snippet: String = body.chars().take(800).collect();
            return Err(anyhow!("openrouter {}: {}", status.as_u16(), snippet));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).context("openrouter json parse")?;

        let message = parsed.choices.into_iter().next().and_then(|c| c.message);
        let content = message
            .as_ref()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let citations = message
            .map(|m| {
                m.annotations
                    .into_iter()
                    .filter_map(|a| a.url_citation)
                    .map(|c| Citation {
                        url: c.url,
                        title: c.title,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(LlmCallOutput {
            model: model.to_string(),
            content,
            usage: LlmUsage {
                prompt_tokens: parsed.usage.as_ref().and_then(|u| u.prompt_tokens),
                completion_tokens: parsed.usage.as_ref().and_then(|u| u.completion_tokens),
                total_tokens: parsed.usage.as_ref().and_then(|u| u.total_tokens),
            },
            citations,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    pub message: Option<ChatMessageOut>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageOut {
    pub content: String,
    #[serde(default)]
    pub annotations: Vec<ChatAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatAnnotation {
    #[serde(default)]
    pub url_citation: Option<UrlCitation>,
}

#[derive(Debug, Clone, Deserialize)]
struct UrlCitation {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_rejected() {
        let http = reqwest::Client::new();
        assert!(OpenRouterClient::new(http, "  ").is_err());
    }

    #[test]
    fn response_parse_extracts_content_and_citations() {
        let body = r#"{
            "choices": [{
                "message": {
                    "content": "BTC funding is elevated.",
                    "annotations": [
                        { "url_citation": { "url": "https://example.com/a", "title": "A" } },
                        { "url_citation": { "url": "https://example.com/b" } }
                    ]
                }
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 40, "total_tokens": 52 }
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let message = parsed.choices[0].message.as_ref().unwrap();
        assert_eq!(message.content, "BTC funding is elevated.");
        assert_eq!(message.annotations.len(), 2);
        assert_eq!(parsed.usage.as_ref().unwrap().total_tokens, Some(52));
    }
}
