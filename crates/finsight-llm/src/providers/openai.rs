//! OpenAI provider implementation
//!
//! Implements [`LLMProvider`] against the chat-completions endpoint.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! Any OpenAI-compatible server (local llama.cpp, vLLM, Azure deployments)
//! works by pointing [`OpenAIConfig::api_base`] at it.
//!
//! ```no_run
//! use finsight_llm::{CompletionRequest, LLMProvider, Message};
//! use finsight_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAIProvider::with_config(OpenAIConfig::new("sk-...").with_timeout(30))?;
//!
//! let request = CompletionRequest::builder("gpt-4o")
//!     .add_message(Message::user("Hello!"))
//!     .max_tokens(100)
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.content);
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default endpoint base
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// OpenAI chat-completion provider
#[derive(Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "OpenAI API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(
        skip(self, request),
        fields(model = %request.model, api_base = %self.config.api_base)
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending chat completion request");

        let model = request.model.clone();
        let openai_request = build_openai_request(request);

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        into_completion_response(openai_response)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    n: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// System prompt goes first in the messages array
fn build_openai_request(request: CompletionRequest) -> OpenAIRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(system) = request.system {
        messages.push(OpenAIMessage {
            role: Role::System.as_str().to_string(),
            content: Some(system),
        });
    }

    messages.extend(request.messages.into_iter().map(|m| OpenAIMessage {
        role: m.role.as_str().to_string(),
        content: Some(m.content),
    }));

    OpenAIRequest {
        model: request.model,
        messages,
        max_tokens: request.max_tokens,
        n: 1,
        temperature: request.temperature,
    }
}

fn into_completion_response(response: OpenAIResponse) -> Result<CompletionResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let finish_reason = choice.finish_reason.unwrap_or_default();
    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    debug!(
        "Received response - stop_reason: {}, tokens: {}/{}",
        finish_reason, usage.input_tokens, usage.output_tokens
    );

    Ok(CompletionResponse {
        message: Message::assistant(choice.message.content.unwrap_or_default()),
        stop_reason: map_stop_reason(&finish_reason),
        usage,
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::with_config(OpenAIConfig::new("test-key")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config.api_key, "test-key");
        assert_eq!(provider.config.api_base, DEFAULT_OPENAI_API_BASE);
        assert_eq!(provider.config.timeout_secs, 30);
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = OpenAIProvider::with_config(OpenAIConfig::new("  "));
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_completions_url() {
        let config = OpenAIConfig::new("k").with_api_base("http://localhost:8000/v1/");
        assert_eq!(config.completions_url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_system_message_first() {
        let request = CompletionRequest::builder("gpt-4o")
            .system("You are a financial analyst.")
            .add_message(Message::user("Analyze"))
            .max_tokens(500)
            .temperature(0.7)
            .build();

        let wire = serde_json::to_value(build_openai_request(request)).unwrap();
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["messages"][0]["content"], "You are a financial analyst.");
        assert_eq!(wire["messages"][1]["role"], "user");
        assert_eq!(wire["max_tokens"], 500);
        assert_eq!(wire["n"], 1);
    }

    #[test]
    fn test_response_conversion() {
        let raw = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "  Healthy margins.  "},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30}
        });

        let response: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let completion = into_completion_response(response).unwrap();

        assert_eq!(completion.message.text(), Some("Healthy margins."));
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.total(), 150);
    }

    #[test]
    fn test_response_without_choices() {
        let response: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            into_completion_response(response),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::ContentFilter);
        assert_eq!(map_stop_reason("unknown"), StopReason::EndTurn);
    }
}
