//! Raw statement payloads and period selection
//!
//! The market-data API returns each statement as a JSON object with
//! `annualReports` and `quarterlyReports` arrays, most recent period first.
//! Every line item is a string (`"1000"`, or the literal `"None"` when the
//! provider has no value). This module turns those payloads into typed
//! [`ReportPeriod`]s and exposes [`parse_optional_float`], the single field
//! accessor every ratio formula goes through.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::error::{InsightsError, Result};

/// Field holding the period end date in every report
pub const FISCAL_DATE_ENDING: &str = "fiscalDateEnding";

/// The three mandatory financial statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    /// All mandatory statements, in fetch order
    pub const ALL: [Self; 3] = [Self::IncomeStatement, Self::BalanceSheet, Self::CashFlow];

    /// Key used for this statement in a bundle
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
        }
    }

    /// Value of the `function` query parameter for this statement
    pub fn function(self) -> &'static str {
        match self {
            Self::IncomeStatement => "INCOME_STATEMENT",
            Self::BalanceSheet => "BALANCE_SHEET",
            Self::CashFlow => "CASH_FLOW",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity of a report period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFrequency {
    Annual,
    Quarterly,
}

impl ReportFrequency {
    /// Preference order when selecting periods
    pub const PREFERENCE: [Self; 2] = [Self::Annual, Self::Quarterly];

    /// Array key holding reports of this frequency
    pub fn report_key(self) -> &'static str {
        match self {
            Self::Annual => "annualReports",
            Self::Quarterly => "quarterlyReports",
        }
    }
}

/// One reporting period of one statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPeriod {
    frequency: ReportFrequency,
    fields: Map<String, Value>,
}

impl ReportPeriod {
    /// Wrap a period object; `None` if the value is not a JSON object
    pub fn from_value(frequency: ReportFrequency, value: &Value) -> Option<Self> {
        value.as_object().map(|fields| Self {
            frequency,
            fields: fields.clone(),
        })
    }

    /// Whether this period came from the annual or quarterly array
    pub fn frequency(&self) -> ReportFrequency {
        self.frequency
    }

    /// Raw value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Numeric value of a field, see [`parse_optional_float`]
    pub fn number(&self, field: &str) -> Option<f64> {
        parse_optional_float(self, field)
    }

    /// First field in `fields` that has a numeric value
    pub fn first_number(&self, fields: &[&str]) -> Option<f64> {
        fields.iter().find_map(|field| self.number(field))
    }

    /// The `fiscalDateEnding` label, as reported
    pub fn fiscal_date_ending(&self) -> Option<&str> {
        self.get(FISCAL_DATE_ENDING).and_then(Value::as_str)
    }

    /// The `fiscalDateEnding` parsed as a calendar date
    pub fn fiscal_date(&self) -> Option<NaiveDate> {
        self.fiscal_date_ending()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    }
}

/// Read a field as a finite float
///
/// Missing fields, JSON nulls, the provider's `"None"` placeholder and any
/// other non-numeric text all come back as `None`.
pub fn parse_optional_float(period: &ReportPeriod, field: &str) -> Option<f64> {
    let parsed = match period.get(field)? {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Most recent `max_periods` reports of a raw statement, newest first
///
/// Annual reports are used when the statement has any, otherwise quarterly
/// ones. Returns `None` when neither array holds a period object.
pub fn select_reports(raw: &Value, max_periods: usize) -> Option<Vec<ReportPeriod>> {
    ReportFrequency::PREFERENCE.iter().find_map(|&frequency| {
        let periods: Vec<ReportPeriod> = raw
            .get(frequency.report_key())?
            .as_array()?
            .iter()
            .filter_map(|v| ReportPeriod::from_value(frequency, v))
            .take(max_periods)
            .collect();

        (!periods.is_empty()).then_some(periods)
    })
}

/// The most recent period of one statement
pub fn latest_period(raw: &Value, kind: StatementKind) -> Result<ReportPeriod> {
    select_reports(raw, 1)
        .and_then(|periods| periods.into_iter().next())
        .ok_or(InsightsError::NoReportData { statement: kind })
}

/// Parsed live quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price
    pub price: f64,
    /// Trading day the price belongs to
    pub latest_trading_day: Option<String>,
}

impl Quote {
    /// Parse a `GLOBAL_QUOTE` response body
    ///
    /// `None` unless the body carries a positive, parseable `05. price`.
    pub fn from_response(body: &Value) -> Option<Self> {
        let quote = body.get("Global Quote")?;
        let price = quote
            .get("05. price")?
            .as_str()?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)?;

        Some(Self {
            price,
            latest_trading_day: quote
                .get("07. latest trading day")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Raw response bodies for one ticker, keyed by statement
///
/// Only ever constructed with all three mandatory statements present; the
/// quote is optional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawStatementBundle {
    symbol: String,
    income_statement: Value,
    balance_sheet: Value,
    cash_flow: Value,
    quote: Option<Value>,
}

impl RawStatementBundle {
    /// Assemble a bundle from its parts
    pub fn new(
        symbol: impl Into<String>,
        income_statement: Value,
        balance_sheet: Value,
        cash_flow: Value,
        quote: Option<Value>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            income_statement,
            balance_sheet,
            cash_flow,
            quote,
        }
    }

    /// Ticker this bundle was fetched for
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Raw body of a statement
    pub fn statement(&self, kind: StatementKind) -> &Value {
        match kind {
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    /// Parsed quote, if fetched and usable
    pub fn quote(&self) -> Option<Quote> {
        self.quote.as_ref().and_then(Quote::from_response)
    }
}

/// The selected period of each mandatory statement
///
/// Each statement is resolved independently, so an annual income statement
/// can sit next to a quarterly balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedStatements {
    pub income_statement: ReportPeriod,
    pub balance_sheet: ReportPeriod,
    pub cash_flow: ReportPeriod,
}

/// Select the latest period of every mandatory statement
pub fn normalize(bundle: &RawStatementBundle) -> Result<NormalizedStatements> {
    let income_statement = latest_period(
        bundle.statement(StatementKind::IncomeStatement),
        StatementKind::IncomeStatement,
    )?;
    let balance_sheet = latest_period(
        bundle.statement(StatementKind::BalanceSheet),
        StatementKind::BalanceSheet,
    )?;
    let cash_flow = latest_period(
        bundle.statement(StatementKind::CashFlow),
        StatementKind::CashFlow,
    )?;

    debug!(
        symbol = bundle.symbol(),
        income = ?income_statement.frequency(),
        balance = ?balance_sheet.frequency(),
        cash_flow = ?cash_flow.frequency(),
        "Selected report periods"
    );

    Ok(NormalizedStatements {
        income_statement,
        balance_sheet,
        cash_flow,
    })
}
