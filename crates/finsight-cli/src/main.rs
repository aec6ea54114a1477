//! Command-line interface for finsight
//!
//! # Usage
//!
//! ```bash
//! export ALPHA_VANTAGE_API_KEY="..."
//! export OPENAI_API_KEY="..."   # only needed for --narrate
//!
//! finsight analyze AAPL --narrate
//! finsight analyze MSFT --periods 8 --json
//! finsight check
//! ```

mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use finsight_fundamentals::config::OPENAI_API_BASE;
use finsight_fundamentals::{FinancialInsights, InsightsConfig};
use finsight_utils::LogFormat;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(
    about = "Financial ratios, trends and insights from company statements",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Alpha Vantage API key
    #[arg(long, global = true, env = "ALPHA_VANTAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI (or compatible) API key, enables narration
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// OpenAI-compatible endpoint base
    #[arg(long, global = true, env = "OPENAI_API_BASE", default_value = OPENAI_API_BASE)]
    openai_api_base: String,

    /// Model used for narration
    #[arg(long, global = true, env = "FINSIGHT_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Timeout for each external request, in seconds
    #[arg(long, global = true, env = "FINSIGHT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Log output format (text or json)
    #[arg(long, global = true, env = "FINSIGHT_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch statements for a ticker and print ratios and trends
    Analyze {
        /// Ticker symbol, e.g. AAPL
        ticker: String,

        /// Number of periods in trend series
        #[arg(long, default_value_t = 5)]
        periods: usize,

        /// Ask the language model to narrate the metrics
        #[arg(long)]
        narrate: bool,

        /// Skip the live quote (P/E and FCF yield will be N/A)
        #[arg(long)]
        no_quote: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the whole pipeline against a known ticker to verify API access
    Check {
        #[arg(long, default_value = "AAPL")]
        ticker: String,
    },
}

impl Cli {
    fn config(&self, periods: usize, fetch_quote: bool) -> anyhow::Result<InsightsConfig> {
        let api_key = self
            .api_key
            .clone()
            .context("no Alpha Vantage API key: pass --api-key or set ALPHA_VANTAGE_API_KEY")?;

        let mut builder = InsightsConfig::builder()
            .market_data_api_key(api_key)
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .trend_periods(periods)
            .fetch_quote(fetch_quote)
            .llm_api_base(self.openai_api_base.clone())
            .model(self.model.clone());

        if let Some(key) = &self.openai_api_key {
            builder = builder.llm_api_key(key.clone());
        }

        Ok(builder.build()?)
    }
}

async fn analyze(
    cli: &Cli,
    ticker: &str,
    periods: usize,
    narrate: bool,
    no_quote: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = cli.config(periods, !no_quote)?;
    let insights = FinancialInsights::from_config(&config)?;

    if narrate && !insights.can_narrate() {
        anyhow::bail!("--narrate needs an LLM key: pass --openai-api-key or set OPENAI_API_KEY");
    }

    let report = insights
        .analyze(ticker)
        .await
        .with_context(|| format!("failed to analyze {ticker}"))?;

    let narration = if narrate {
        Some(insights.narrate(&report).await)
    } else {
        None
    };

    if json {
        let output = serde_json::json!({
            "report": report,
            "insights": narration,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render::render_report(&report));
        if let Some(text) = narration {
            println!("\nAI-Generated Insights\n{text}");
        }
    }

    Ok(())
}

async fn check(cli: &Cli, ticker: &str) -> anyhow::Result<()> {
    let config = cli.config(InsightsConfig::default().trend_periods, true)?;
    let insights = FinancialInsights::from_config(&config)?;

    let result = insights
        .check_connection(ticker)
        .await
        .with_context(|| format!("connection test with {ticker} failed"))?;

    println!(
        "OK: {} - {} metrics computed, {} revenue periods, quote {}",
        result.symbol,
        result.metrics_computed,
        result.revenue_periods,
        if result.quote_available { "available" } else { "unavailable" }
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    finsight_utils::init_tracing(cli.log_format);

    info!("Starting finsight");

    match &cli.command {
        Command::Analyze {
            ticker,
            periods,
            narrate,
            no_quote,
            json,
        } => analyze(&cli, ticker, *periods, *narrate, *no_quote, *json).await,
        Command::Check { ticker } => check(&cli, ticker).await,
    }
}
