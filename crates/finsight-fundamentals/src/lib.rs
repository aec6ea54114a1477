//! Company fundamentals from financial statements
//!
//! This crate fetches a company's income statement, balance sheet and cash
//! flow statement from a market-data API, derives a fixed table of financial
//! ratios, builds multi-period trend series for charting, and can ask a
//! language model to narrate the result. It includes:
//!
//! - An Alpha Vantage client that fetches all statements concurrently
//! - Period selection (latest annual report, quarterly as fallback)
//! - Twelve independently nullable ratios (margins, liquidity, leverage,
//!   returns, per-share and cash-flow metrics)
//! - Revenue, margin, free-cash-flow and debt-to-EBITDA trend series
//! - Asset composition for the latest balance sheet
//! - LLM narration that degrades to a fixed message instead of failing
//!
//! # Example
//!
//! ```rust,no_run
//! use finsight_fundamentals::{FinancialInsights, InsightsConfig};
//!
//! # async fn run() -> finsight_fundamentals::Result<()> {
//! let config = InsightsConfig::builder()
//!     .market_data_api_key("demo")
//!     .build()?;
//!
//! let insights = FinancialInsights::from_config(&config)?;
//! let report = insights.analyze("IBM").await?;
//! println!("{}", report.metrics.to_text());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod composition;
pub mod config;
pub mod error;
pub mod fields;
pub mod metrics;
pub mod narrator;
pub mod pipeline;
pub mod statements;
pub mod trend;

// Re-export main types for convenience
pub use api::{AlphaVantageClient, StatementSource};
pub use composition::AssetComposition;
pub use config::InsightsConfig;
pub use error::{InsightsError, Result};
pub use metrics::{Metric, MetricRecord, MetricTable, compute_metrics};
pub use narrator::{InsightNarrator, NARRATION_FALLBACK};
pub use pipeline::{ConnectionCheck, FinancialInsights, FinancialReport};
pub use statements::{
    Quote, RawStatementBundle, ReportFrequency, ReportPeriod, StatementKind, normalize,
    parse_optional_float,
};
pub use trend::{TrendPoint, TrendSeries};
