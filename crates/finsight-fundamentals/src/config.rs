//! Configuration for the fundamentals pipeline
//!
//! All credentials travel inside [`InsightsConfig`]; nothing in this crate
//! reads environment variables.

use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default market-data endpoint
pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Default chat-completion endpoint base
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for fetching, deriving and narrating fundamentals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Market-data API key
    #[serde(skip_serializing)]
    pub market_data_api_key: Option<String>,

    /// Market-data endpoint
    pub market_data_base_url: String,

    /// Timeout applied to every external call
    pub request_timeout: Duration,

    /// Market-data requests per minute
    pub rate_limit_per_minute: u32,

    /// Number of most recent periods kept in trend series
    pub trend_periods: usize,

    /// Whether to request a live quote alongside the statements
    pub fetch_quote: bool,

    /// Language-model API key (narration is unavailable without it)
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,

    /// Language-model endpoint base
    pub llm_api_base: String,

    /// Model used for narration
    pub model: String,

    /// Output token bound for narration
    pub max_tokens: usize,

    /// Sampling temperature for narration
    pub temperature: f32,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            market_data_api_key: None,
            market_data_base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            rate_limit_per_minute: 5, // free tier
            trend_periods: 5,
            fetch_quote: true,
            llm_api_key: None,
            llm_api_base: OPENAI_API_BASE.to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl InsightsConfig {
    /// Create a new configuration builder
    pub fn builder() -> InsightsConfigBuilder {
        InsightsConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self
            .market_data_api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            return Err(InsightsError::Config(
                "market data API key is required".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(InsightsError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(InsightsError::Config(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.trend_periods == 0 {
            return Err(InsightsError::Config(
                "trend_periods must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(InsightsError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(InsightsError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }

    /// Whether narration can be attempted
    pub fn narration_enabled(&self) -> bool {
        self.llm_api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Builder for InsightsConfig
#[derive(Debug, Default)]
pub struct InsightsConfigBuilder {
    market_data_api_key: Option<String>,
    market_data_base_url: Option<String>,
    request_timeout: Option<Duration>,
    rate_limit_per_minute: Option<u32>,
    trend_periods: Option<usize>,
    fetch_quote: Option<bool>,
    llm_api_key: Option<String>,
    llm_api_base: Option<String>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl InsightsConfigBuilder {
    /// Set the market-data API key
    pub fn market_data_api_key(mut self, key: impl Into<String>) -> Self {
        self.market_data_api_key = Some(key.into());
        self
    }

    /// Override the market-data endpoint
    pub fn market_data_base_url(mut self, url: impl Into<String>) -> Self {
        self.market_data_base_url = Some(url.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set market-data requests per minute
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set how many periods trend series keep
    pub fn trend_periods(mut self, periods: usize) -> Self {
        self.trend_periods = Some(periods);
        self
    }

    /// Enable or disable the live quote request
    pub fn fetch_quote(mut self, enabled: bool) -> Self {
        self.fetch_quote = Some(enabled);
        self
    }

    /// Set the language-model API key
    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    /// Override the language-model endpoint base
    pub fn llm_api_base(mut self, base: impl Into<String>) -> Self {
        self.llm_api_base = Some(base.into());
        self
    }

    /// Set the narration model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the narration output token bound
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the narration temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<InsightsConfig> {
        let defaults = InsightsConfig::default();

        let config = InsightsConfig {
            market_data_api_key: self.market_data_api_key,
            market_data_base_url: self
                .market_data_base_url
                .unwrap_or(defaults.market_data_base_url),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            trend_periods: self.trend_periods.unwrap_or(defaults.trend_periods),
            fetch_quote: self.fetch_quote.unwrap_or(defaults.fetch_quote),
            llm_api_key: self.llm_api_key,
            llm_api_base: self.llm_api_base.unwrap_or(defaults.llm_api_base),
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        };

        config.validate()?;
        Ok(config)
    }
}
