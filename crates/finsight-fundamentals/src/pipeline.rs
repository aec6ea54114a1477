//! End-to-end pipeline: fetch, normalize, compute, build trends

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::{AlphaVantageClient, StatementSource};
use crate::composition::AssetComposition;
use crate::config::InsightsConfig;
use crate::error::{InsightsError, Result};
use crate::metrics::{MetricTable, compute_metrics};
use crate::narrator::{InsightNarrator, NARRATION_FALLBACK};
use crate::statements::{
    NormalizedStatements, Quote, RawStatementBundle, ReportFrequency, StatementKind, normalize,
};
use crate::trend::{
    TrendSeries, build_debt_to_ebitda_trend, build_free_cash_flow_trend,
    build_profit_margin_trend, build_revenue_trend,
};

/// Which granularity was selected for each statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedFrequencies {
    pub income_statement: ReportFrequency,
    pub balance_sheet: ReportFrequency,
    pub cash_flow: ReportFrequency,
}

impl From<&NormalizedStatements> for SelectedFrequencies {
    fn from(n: &NormalizedStatements) -> Self {
        Self {
            income_statement: n.income_statement.frequency(),
            balance_sheet: n.balance_sheet.frequency(),
            cash_flow: n.cash_flow.frequency(),
        }
    }
}

/// Everything derived for one ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub symbol: String,
    /// Period end date of the selected income statement
    pub fiscal_date_ending: Option<String>,
    pub frequencies: SelectedFrequencies,
    pub quote: Option<Quote>,
    pub metrics: MetricTable,
    pub revenue_trend: TrendSeries,
    pub profit_margin_trend: TrendSeries,
    pub free_cash_flow_trend: TrendSeries,
    pub debt_to_ebitda_trend: TrendSeries,
    pub asset_composition: Option<AssetComposition>,
}

impl FinancialReport {
    /// Derive a report from an already fetched bundle
    pub fn from_bundle(bundle: &RawStatementBundle, trend_periods: usize) -> Result<Self> {
        let statements = normalize(bundle)?;
        let quote = bundle.quote();

        let metrics = compute_metrics(
            &statements.income_statement,
            &statements.balance_sheet,
            &statements.cash_flow,
            quote.as_ref(),
        )?;

        let income = bundle.statement(StatementKind::IncomeStatement);
        let balance = bundle.statement(StatementKind::BalanceSheet);
        let cash_flow = bundle.statement(StatementKind::CashFlow);

        Ok(Self {
            symbol: bundle.symbol().to_string(),
            fiscal_date_ending: statements
                .income_statement
                .fiscal_date_ending()
                .map(str::to_string),
            frequencies: SelectedFrequencies::from(&statements),
            quote,
            metrics,
            revenue_trend: build_revenue_trend(income, trend_periods),
            profit_margin_trend: build_profit_margin_trend(income, trend_periods),
            free_cash_flow_trend: build_free_cash_flow_trend(cash_flow, trend_periods),
            debt_to_ebitda_trend: build_debt_to_ebitda_trend(balance, income, trend_periods),
            asset_composition: AssetComposition::from_balance_sheet(&statements.balance_sheet),
        })
    }

    /// All trend series, in display order
    pub fn trends(&self) -> [&TrendSeries; 4] {
        [
            &self.revenue_trend,
            &self.profit_margin_trend,
            &self.free_cash_flow_trend,
            &self.debt_to_ebitda_trend,
        ]
    }
}

/// Outcome of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCheck {
    pub symbol: String,
    pub metrics_computed: usize,
    pub revenue_periods: usize,
    pub quote_available: bool,
}

/// Trim and upper-case a ticker, rejecting anything that is not a symbol
pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let symbol = ticker.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    if valid {
        Ok(symbol)
    } else {
        Err(InsightsError::InvalidSymbol(ticker.to_string()))
    }
}

/// The fundamentals service
///
/// Holds no per-request state; every [`analyze`](Self::analyze) call starts
/// from a fresh fetch.
pub struct FinancialInsights {
    source: Arc<dyn StatementSource>,
    narrator: Option<InsightNarrator>,
    trend_periods: usize,
}

impl std::fmt::Debug for FinancialInsights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinancialInsights")
            .field("narrator", &self.narrator)
            .field("trend_periods", &self.trend_periods)
            .finish_non_exhaustive()
    }
}

impl FinancialInsights {
    /// Create a service over any statement source, without narration
    pub fn new(source: Arc<dyn StatementSource>, trend_periods: usize) -> Self {
        Self {
            source,
            narrator: None,
            trend_periods,
        }
    }

    /// Attach a narrator
    pub fn with_narrator(mut self, narrator: InsightNarrator) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Build the Alpha Vantage backed service described by `config`
    ///
    /// Narration is wired up only when the config carries an LLM key.
    pub fn from_config(config: &InsightsConfig) -> Result<Self> {
        config.validate()?;

        let source = Arc::new(AlphaVantageClient::from_config(config)?);
        let service = Self::new(source, config.trend_periods);

        if config.narration_enabled() {
            Ok(service.with_narrator(InsightNarrator::from_config(config)?))
        } else {
            Ok(service)
        }
    }

    /// Whether [`narrate`](Self::narrate) can reach a model
    pub fn can_narrate(&self) -> bool {
        self.narrator.is_some()
    }

    /// Fetch and derive the full report for a ticker
    #[instrument(skip(self))]
    pub async fn analyze(&self, ticker: &str) -> Result<FinancialReport> {
        let symbol = normalize_ticker(ticker)?;
        let bundle = self.source.fetch(&symbol).await?;
        let report = FinancialReport::from_bundle(&bundle, self.trend_periods)?;

        info!(
            symbol = %report.symbol,
            computed = report.metrics.computed_count(),
            total = report.metrics.len(),
            "Computed financial metrics"
        );

        Ok(report)
    }

    /// Narrate a report's metrics; never fails
    pub async fn narrate(&self, report: &FinancialReport) -> String {
        match &self.narrator {
            Some(narrator) => narrator.narrate(&report.metrics).await,
            None => {
                warn!("Narration requested without an LLM API key");
                NARRATION_FALLBACK.to_string()
            }
        }
    }

    /// Run the whole pipeline against a known ticker
    pub async fn check_connection(&self, ticker: &str) -> Result<ConnectionCheck> {
        info!(ticker, "Testing market data connection");
        let report = self.analyze(ticker).await?;

        let check = ConnectionCheck {
            symbol: report.symbol.clone(),
            metrics_computed: report.metrics.computed_count(),
            revenue_periods: report.revenue_trend.len(),
            quote_available: report.quote.is_some(),
        };
        info!(?check, "Connection test completed successfully");

        Ok(check)
    }
}
