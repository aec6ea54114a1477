//! Alpha Vantage API client

use crate::config::{ALPHA_VANTAGE_BASE_URL, InsightsConfig};
use crate::error::{InsightsError, Result};
use crate::statements::{RawStatementBundle, StatementKind};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::StatementSource;

const PROVIDER: &str = "Alpha Vantage";
const QUOTE_FUNCTION: &str = "GLOBAL_QUOTE";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
    fetch_quote: bool,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageClient {
    /// Create a new client with API key and rate limit
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Result<Self> {
        Self::build(
            api_key.into(),
            ALPHA_VANTAGE_BASE_URL.to_string(),
            rate_limit,
            Duration::from_secs(30),
            true,
        )
    }

    /// Create a client from validated configuration
    pub fn from_config(config: &InsightsConfig) -> Result<Self> {
        let api_key = config
            .market_data_api_key
            .clone()
            .ok_or_else(|| InsightsError::Config("market data API key is required".to_string()))?;

        Self::build(
            api_key,
            config.market_data_base_url.clone(),
            config.rate_limit_per_minute,
            config.request_timeout,
            config.fetch_quote,
        )
    }

    fn build(
        api_key: String,
        base_url: String,
        rate_limit: u32,
        timeout: Duration,
        fetch_quote: bool,
    ) -> Result<Self> {
        let per_minute = NonZeroU32::new(rate_limit).ok_or_else(|| {
            InsightsError::Config("rate limit must be greater than 0".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InsightsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            fetch_quote,
            rate_limiter,
        })
    }

    /// Issue one query and return the JSON body
    ///
    /// `label` names the request in errors.
    async fn query(&self, function: &str, symbol: &str, label: &str) -> Result<Value> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        debug!(function, symbol, "Requesting {}", label);

        let params = [
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| InsightsError::fetch(label, describe_transport_error(&e)))?;

        if !response.status().is_success() {
            return Err(InsightsError::fetch(
                label,
                format!("HTTP error: {}", response.status()),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| InsightsError::fetch(label, format!("invalid response body: {e}")))
    }

    /// Fetch one financial statement
    pub async fn get_statement(&self, kind: StatementKind, symbol: &str) -> Result<Value> {
        let data = self.query(kind.function(), symbol, kind.as_str()).await?;
        check_api_response(kind.as_str(), symbol, &data)?;
        Ok(data)
    }

    /// Get global quote (current price data)
    pub async fn get_quote(&self, symbol: &str) -> Result<Value> {
        let data = self.query(QUOTE_FUNCTION, symbol, "quote").await?;
        check_api_response("quote", symbol, &data)?;
        Ok(data)
    }

    /// Fetch all three statements plus the optional quote, concurrently
    #[instrument(skip(self))]
    pub async fn fetch_bundle(&self, symbol: &str) -> Result<RawStatementBundle> {
        let quote = async {
            if self.fetch_quote {
                Some(self.get_quote(symbol).await)
            } else {
                None
            }
        };

        let (income_statement, balance_sheet, cash_flow, quote) = tokio::join!(
            self.get_statement(StatementKind::IncomeStatement, symbol),
            self.get_statement(StatementKind::BalanceSheet, symbol),
            self.get_statement(StatementKind::CashFlow, symbol),
            quote,
        );

        assemble_bundle(symbol, income_statement, balance_sheet, cash_flow, quote)
    }
}

/// Combine the outcomes of the concurrent requests into one bundle
///
/// Any failed statement fails the whole bundle. A failed quote is logged and
/// dropped; `None` means the quote was never requested.
fn assemble_bundle(
    symbol: &str,
    income_statement: Result<Value>,
    balance_sheet: Result<Value>,
    cash_flow: Result<Value>,
    quote: Option<Result<Value>>,
) -> Result<RawStatementBundle> {
    let income_statement = income_statement?;
    let balance_sheet = balance_sheet?;
    let cash_flow = cash_flow?;

    let quote = match quote {
        Some(Ok(body)) => Some(body),
        Some(Err(e)) => {
            warn!(symbol, error = %e, "Quote unavailable, continuing without it");
            None
        }
        None => None,
    };

    info!(symbol, has_quote = quote.is_some(), "Fetched financial statements");

    Ok(RawStatementBundle::new(
        symbol,
        income_statement,
        balance_sheet,
        cash_flow,
        quote,
    ))
}

#[async_trait]
impl StatementSource for AlphaVantageClient {
    async fn fetch(&self, symbol: &str) -> Result<RawStatementBundle> {
        self.fetch_bundle(symbol).await
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

/// Screen a 200 response for the provider's in-band error bodies
fn check_api_response(label: &str, symbol: &str, data: &Value) -> Result<()> {
    if let Some(error) = data.get("Error Message") {
        return Err(InsightsError::fetch(label, error_text(error)));
    }

    if data.get("Note").is_some() {
        return Err(InsightsError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
        });
    }

    // Used both for quota notices and for premium-only endpoints
    if let Some(info) = data.get("Information") {
        let text = error_text(info);
        if text.to_ascii_lowercase().contains("rate limit") {
            return Err(InsightsError::RateLimitExceeded {
                provider: PROVIDER.to_string(),
            });
        }
        return Err(InsightsError::fetch(label, text));
    }

    // Unknown symbols come back as an empty object
    if data.as_object().is_none_or(serde_json::Map::is_empty) {
        return Err(InsightsError::InvalidSymbol(symbol.to_string()));
    }

    Ok(())
}

fn error_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
}
