/// LLM Client: the single point of entry for all language-model calls in the coach.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Everything else depends on the `CompletionClient` trait so tests can swap in a stub.
///
/// One request per call. There is no retry or backoff: a coaching session makes a
/// handful of calls and every caller decides locally how to degrade on failure.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
#[cfg(test)]
pub mod stub;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all coaching calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A text-completion capability: prompt in, completion text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logs and the session view.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates every text block, trimmed. `None` if nothing but whitespace came back.
    pub fn text(&self) -> Option<String> {
        let joined: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }

    /// Makes a single raw call to the Messages API, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, prompts::COACH_SYSTEM).await?;
        response.text().ok_or(LlmError::EmptyContent)
    }

    fn model(&self) -> &str {
        MODEL
    }
}

/// Pulls the provider's message out of an error body, falling back to the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: &str, text: Option<&str>) -> ContentBlock {
        ContentBlock {
            block_type: kind.to_string(),
            text: text.map(String::from),
        }
    }

    fn response(blocks: Vec<ContentBlock>) -> LlmResponse {
        LlmResponse {
            content: blocks,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
        }
    }

    #[test]
    fn test_text_trims_single_block() {
        let r = response(vec![block("text", Some("\n  1. Tell me about a time...  \n"))]);
        assert_eq!(r.text().as_deref(), Some("1. Tell me about a time..."));
    }

    #[test]
    fn test_text_skips_non_text_blocks() {
        let r = response(vec![block("tool_use", None), block("text", Some("Score: 8/10"))]);
        assert_eq!(r.text().as_deref(), Some("Score: 8/10"));
    }

    #[test]
    fn test_text_blank_is_none() {
        let r = response(vec![block("text", Some("   "))]);
        assert!(r.text().is_none());
        assert!(response(vec![]).text().is_none());
    }

    #[test]
    fn test_api_error_message_parses_provider_body() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad key"}}"#;
        assert_eq!(api_error_message(body.to_string()), "bad key");
    }

    #[test]
    fn test_api_error_message_falls_back_to_raw_body() {
        assert_eq!(api_error_message("gateway down".to_string()), "gateway down");
    }

    #[test]
    fn test_response_deserializes_from_messages_api_shape() {
        let json = r#"{
            "id": "msg_1",
            "content": [{"type": "text", "text": "1. Question"}],
            "usage": {"input_tokens": 5, "output_tokens": 7}
        }"#;
        let r: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(r.usage.output_tokens, 7);
        assert_eq!(r.text().as_deref(), Some("1. Question"));
    }
}
