//! Multi-period series for charting
//!
//! Series are built from the most recent periods of a raw statement (annual
//! preferred, quarterly as fallback) and returned oldest first. A period whose
//! `fiscalDateEnding` does not parse, or whose value cannot be derived, is
//! left out without affecting the rest of the series.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::fields;
use crate::metrics::{percent, ratio, round2, total_debt};
use crate::statements::{ReportPeriod, select_reports};

/// One point of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Period end date
    pub period: NaiveDate,
    pub value: f64,
}

/// A named, oldest-first sequence of period values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    name: String,
    points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Create a series from points already in chronological order
    pub fn new(name: impl Into<String>, points: Vec<TrendPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Series label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Points, oldest first
    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    /// Values only, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Build a series by applying `value_of` to each of the latest `max_periods`
pub fn build_series<F>(raw: &Value, max_periods: usize, name: &str, value_of: F) -> TrendSeries
where
    F: Fn(&ReportPeriod) -> Option<f64>,
{
    let periods = select_reports(raw, max_periods).unwrap_or_default();

    let points = periods
        .iter()
        .rev()
        .filter_map(|period| {
            let Some(date) = period.fiscal_date() else {
                debug!(
                    series = name,
                    label = ?period.fiscal_date_ending(),
                    "Skipping period with unparseable date"
                );
                return None;
            };
            let Some(value) = value_of(period) else {
                debug!(series = name, %date, "Skipping period without a value");
                return None;
            };
            Some(TrendPoint {
                period: date,
                value,
            })
        })
        .collect();

    TrendSeries::new(name, points)
}

/// Revenue per period
pub fn build_revenue_trend(raw_income_statement: &Value, max_periods: usize) -> TrendSeries {
    build_series(raw_income_statement, max_periods, "Revenue", |p| {
        p.number(fields::TOTAL_REVENUE)
    })
}

/// Net profit margin (%) per period
pub fn build_profit_margin_trend(raw_income_statement: &Value, max_periods: usize) -> TrendSeries {
    build_series(
        raw_income_statement,
        max_periods,
        "Net Profit Margin (%)",
        |p| {
            percent(p.number(fields::NET_INCOME), p.number(fields::TOTAL_REVENUE)).map(round2)
        },
    )
}

/// Operating cash flow less capital expenditures, per period
pub fn build_free_cash_flow_trend(raw_cash_flow: &Value, max_periods: usize) -> TrendSeries {
    build_series(raw_cash_flow, max_periods, "Free Cash Flow", |p| {
        Some(
            p.number(fields::OPERATING_CASHFLOW)?
                - p.number(fields::CAPITAL_EXPENDITURES).unwrap_or(0.0),
        )
    })
}

/// Inner join of two series on period date
///
/// Points are kept in `left` order; periods missing from either side are
/// dropped, as are periods where `combine` yields nothing.
pub fn align<F>(left: &TrendSeries, right: &TrendSeries, name: &str, combine: F) -> TrendSeries
where
    F: Fn(f64, f64) -> Option<f64>,
{
    let right_by_period: HashMap<NaiveDate, f64> =
        right.points().iter().map(|p| (p.period, p.value)).collect();

    let points = left
        .points()
        .iter()
        .filter_map(|l| {
            let r = right_by_period.get(&l.period)?;
            Some(TrendPoint {
                period: l.period,
                value: combine(l.value, *r)?,
            })
        })
        .collect();

    TrendSeries::new(name, points)
}

/// Balance-sheet total debt over income-statement EBITDA, aligned by period
pub fn build_debt_to_ebitda_trend(
    raw_balance_sheet: &Value,
    raw_income_statement: &Value,
    max_periods: usize,
) -> TrendSeries {
    let debt = build_series(raw_balance_sheet, max_periods, "Total Debt", total_debt);
    let ebitda = build_series(raw_income_statement, max_periods, "EBITDA", |p| {
        p.number(fields::EBITDA)
    });

    align(&debt, &ebitda, "Debt to EBITDA", |d, e| {
        ratio(Some(d), Some(e)).map(round2)
    })
}
