//! Prose narration of a metric table via a chat-completion model
//!
//! Unlike the data path, narration never fails: any error from the remote
//! call is logged and replaced by [`NARRATION_FALLBACK`].

use finsight_llm::providers::{OpenAIConfig, OpenAIProvider};
use finsight_llm::{CompletionRequest, LLMProvider, Message, StopReason};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::InsightsConfig;
use crate::error::{InsightsError, Result};
use crate::metrics::MetricTable;

/// Message returned whenever the model cannot be reached or answers with nothing
pub const NARRATION_FALLBACK: &str =
    "Unable to generate insights at this time. Please check your API key and try again later.";

const SYSTEM_PROMPT: &str = "You are a financial analyst.";

const USER_PROMPT_TEMPLATE: &str = r"Analyze the following financial metrics and provide insights about the company's financial health:

{metrics}

Focus on aspects like profitability, liquidity, solvency, and efficiency. Metrics marked N/A could not be computed from the reported data; mention them only if their absence matters.";

/// Build the user prompt for a metric table
pub fn build_prompt(table: &MetricTable) -> String {
    USER_PROMPT_TEMPLATE.replace("{metrics}", &table.to_text())
}

/// Turns metric tables into prose
pub struct InsightNarrator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl std::fmt::Debug for InsightNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightNarrator")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl InsightNarrator {
    /// Create a narrator on top of any provider
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// Create a narrator backed by the OpenAI-compatible provider in `config`
    pub fn from_config(config: &InsightsConfig) -> Result<Self> {
        let api_key = config
            .llm_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                InsightsError::Config("LLM API key is required for narration".to_string())
            })?;

        let provider = OpenAIProvider::with_config(
            OpenAIConfig::new(api_key)
                .with_api_base(config.llm_api_base.clone())
                .with_timeout(config.request_timeout.as_secs().max(1)),
        )
        .map_err(|e| InsightsError::Config(e.to_string()))?;

        Ok(Self::new(
            Arc::new(provider),
            config.model.clone(),
            config.max_tokens,
            config.temperature,
        ))
    }

    /// Narrate a metric table, falling back to [`NARRATION_FALLBACK`] on any failure
    pub async fn narrate(&self, table: &MetricTable) -> String {
        let request = CompletionRequest::builder(&self.model)
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(build_prompt(table)))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        match self.provider.complete(request).await {
            Ok(response) if response.stop_reason == StopReason::ContentFilter => {
                warn!(provider = self.provider.name(), "Answer withheld by content filter");
                NARRATION_FALLBACK.to_string()
            }
            Ok(response) => match response.message.text() {
                Some(text) => {
                    if response.stop_reason == StopReason::MaxTokens {
                        warn!(
                            max_tokens = self.max_tokens,
                            "Insights truncated at the output token limit"
                        );
                    }
                    info!(
                        provider = self.provider.name(),
                        tokens = response.usage.total(),
                        "Generated insights"
                    );
                    text.to_string()
                }
                None => {
                    warn!(provider = self.provider.name(), "Model returned an empty answer");
                    NARRATION_FALLBACK.to_string()
                }
            },
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Narration failed");
                NARRATION_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_metrics;
    use crate::statements::{ReportFrequency, ReportPeriod};
    use async_trait::async_trait;
    use finsight_llm::{CompletionResponse, LLMError, StopReason, TokenUsage};
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers with a canned reply and remembers the last request
    struct StubProvider {
        reply: std::result::Result<String, ()>,
        stop_reason: StopReason,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl StubProvider {
        fn answering(text: &str) -> Self {
            Self::stopping(text, StopReason::EndTurn)
        }

        fn stopping(text: &str, stop_reason: StopReason) -> Self {
            Self {
                reply: Ok(text.to_string()),
                stop_reason,
                last_request: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                stop_reason: StopReason::EndTurn,
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for StubProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> finsight_llm::Result<CompletionResponse> {
            *self.last_request.lock().unwrap() = Some(request);
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: self.stop_reason,
                    usage: TokenUsage {
                        input_tokens: 10,
                        output_tokens: 5,
                    },
                }),
                Err(()) => Err(LLMError::RateLimitExceeded("quota exhausted".to_string())),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn table() -> MetricTable {
        let income = ReportPeriod::from_value(
            ReportFrequency::Annual,
            &json!({"totalRevenue": "1000", "costOfRevenue": "600", "netIncome": "100"}),
        )
        .unwrap();
        let empty = ReportPeriod::from_value(ReportFrequency::Annual, &json!({})).unwrap();
        compute_metrics(&income, &empty, &empty, None).unwrap()
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_prompt(&table());
        assert!(prompt.contains("Gross Profit Margin (%): 40.00"));
        assert!(prompt.contains("Current Ratio: N/A"));
        for topic in ["profitability", "liquidity", "solvency", "efficiency"] {
            assert!(prompt.contains(topic), "prompt should mention {topic}");
        }
    }

    #[tokio::test]
    async fn test_narrate_returns_model_text() {
        let provider = Arc::new(StubProvider::answering("  Margins are healthy.  "));
        let narrator = InsightNarrator::new(provider.clone(), "gpt-4o", 500, 0.7);

        let text = narrator.narrate(&table()).await;
        assert_eq!(text, "Margins are healthy.");

        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.system.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(request.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_narrate_failure_falls_back() {
        let narrator = InsightNarrator::new(Arc::new(StubProvider::failing()), "gpt-4o", 500, 0.7);
        assert_eq!(narrator.narrate(&table()).await, NARRATION_FALLBACK);
    }

    #[tokio::test]
    async fn test_narrate_filtered_answer_falls_back() {
        let provider = Arc::new(StubProvider::stopping("partial", StopReason::ContentFilter));
        let narrator = InsightNarrator::new(provider, "gpt-4o", 500, 0.7);
        assert_eq!(narrator.narrate(&table()).await, NARRATION_FALLBACK);
    }

    #[tokio::test]
    async fn test_narrate_keeps_truncated_answer() {
        let provider = Arc::new(StubProvider::stopping("Margins are", StopReason::MaxTokens));
        let narrator = InsightNarrator::new(provider, "gpt-4o", 500, 0.7);
        assert_eq!(narrator.narrate(&table()).await, "Margins are");
    }

    #[tokio::test]
    async fn test_narrate_empty_answer_falls_back() {
        let provider = Arc::new(StubProvider::answering("   "));
        let narrator = InsightNarrator::new(provider, "gpt-4o", 500, 0.7);
        assert_eq!(narrator.narrate(&table()).await, NARRATION_FALLBACK);
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = InsightsConfig::builder()
            .market_data_api_key("demo")
            .build()
            .unwrap();
        assert!(matches!(
            InsightNarrator::from_config(&config),
            Err(InsightsError::Config(_))
        ));

        let config = InsightsConfig::builder()
            .market_data_api_key("demo")
            .llm_api_key("sk-test")
            .model("gpt-4o-mini")
            .build()
            .unwrap();
        let narrator = InsightNarrator::from_config(&config).unwrap();
        assert_eq!(narrator.model, "gpt-4o-mini");
        assert_eq!(narrator.provider.name(), "openai");
    }

    #[tokio::test]
    async fn test_unreachable_model_falls_back() {
        let config = InsightsConfig::builder()
            .market_data_api_key("demo")
            .llm_api_key("sk-test")
            .llm_api_base("http://127.0.0.1:9/v1")
            .request_timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let narrator = InsightNarrator::from_config(&config).unwrap();
        assert_eq!(narrator.narrate(&table()).await, NARRATION_FALLBACK);
    }
}
