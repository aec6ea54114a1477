//! Derived financial ratios
//!
//! [`compute_metrics`] evaluates a fixed, ordered list of twelve metrics
//! against the selected period of each statement. Every metric is computed
//! on its own: a missing or non-numeric operand, or a zero denominator, nulls
//! exactly that metric and nothing else.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{InsightsError, Result};
use crate::fields;
use crate::statements::{Quote, ReportPeriod};

/// The derived metrics, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    GrossProfitMargin,
    NetProfitMargin,
    CurrentRatio,
    DebtToEquity,
    OperatingCashFlowMargin,
    ReturnOnAssets,
    ReturnOnEquity,
    EarningsPerShare,
    PriceToEarnings,
    DebtToEbitda,
    FreeCashFlow,
    FreeCashFlowYield,
}

impl Metric {
    /// Every metric, in the order the table lists them
    pub const ALL: [Self; 12] = [
        Self::GrossProfitMargin,
        Self::NetProfitMargin,
        Self::CurrentRatio,
        Self::DebtToEquity,
        Self::OperatingCashFlowMargin,
        Self::ReturnOnAssets,
        Self::ReturnOnEquity,
        Self::EarningsPerShare,
        Self::PriceToEarnings,
        Self::DebtToEbitda,
        Self::FreeCashFlow,
        Self::FreeCashFlowYield,
    ];

    /// Display name, including the unit suffix for percentages
    pub fn name(self) -> &'static str {
        match self {
            Self::GrossProfitMargin => "Gross Profit Margin (%)",
            Self::NetProfitMargin => "Net Profit Margin (%)",
            Self::CurrentRatio => "Current Ratio",
            Self::DebtToEquity => "Debt-to-Equity Ratio",
            Self::OperatingCashFlowMargin => "Operating Cash Flow Margin (%)",
            Self::ReturnOnAssets => "Return on Assets (%)",
            Self::ReturnOnEquity => "Return on Equity (%)",
            Self::EarningsPerShare => "Earnings Per Share",
            Self::PriceToEarnings => "Price-to-Earnings Ratio",
            Self::DebtToEbitda => "Debt to EBITDA",
            Self::FreeCashFlow => "Free Cash Flow",
            Self::FreeCashFlowYield => "Free Cash Flow Yield (%)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One row of the metric table; `value` is `None` when it could not be derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRecord {
    pub metric: Metric,
    pub value: Option<f64>,
}

/// Ordered metric rows, one per [`Metric::ALL`] entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricTable(Vec<MetricRecord>);

impl MetricTable {
    /// All rows, in table order
    pub fn records(&self) -> &[MetricRecord] {
        &self.0
    }

    /// Value of a metric, `None` if it is null
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0
            .iter()
            .find(|r| r.metric == metric)
            .and_then(|r| r.value)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rows holding a value
    pub fn computed_count(&self) -> usize {
        self.0.iter().filter(|r| r.value.is_some()).count()
    }

    /// Fixed text rendering, `name: value` one per line, `N/A` for nulls
    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .map(|r| match r.value {
                Some(v) => format!("{}: {v:.2}", r.metric),
                None => format!("{}: N/A", r.metric),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a MetricTable {
    type Item = &'a MetricRecord;
    type IntoIter = std::slice::Iter<'a, MetricRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Operands pulled out of the three periods, each independently optional
#[derive(Debug, Default)]
struct Inputs {
    revenue: Option<f64>,
    cost_of_revenue: Option<f64>,
    net_income: Option<f64>,
    ebitda: Option<f64>,
    current_assets: Option<f64>,
    current_liabilities: Option<f64>,
    total_assets: Option<f64>,
    total_liabilities: Option<f64>,
    equity: Option<f64>,
    shares: Option<f64>,
    total_debt: Option<f64>,
    operating_cash_flow: Option<f64>,
    capital_expenditures: Option<f64>,
    price: Option<f64>,
}

impl Inputs {
    fn extract(
        income: &ReportPeriod,
        balance: &ReportPeriod,
        cash_flow: &ReportPeriod,
        quote: Option<&Quote>,
    ) -> Self {
        Self {
            revenue: income.number(fields::TOTAL_REVENUE),
            cost_of_revenue: income.first_number(&[
                fields::COST_OF_REVENUE,
                fields::COST_OF_GOODS_AND_SERVICES_SOLD,
            ]),
            net_income: income.number(fields::NET_INCOME),
            ebitda: income.number(fields::EBITDA),
            current_assets: balance.number(fields::TOTAL_CURRENT_ASSETS),
            current_liabilities: balance.number(fields::TOTAL_CURRENT_LIABILITIES),
            total_assets: balance.number(fields::TOTAL_ASSETS),
            total_liabilities: balance.number(fields::TOTAL_LIABILITIES),
            equity: balance.number(fields::TOTAL_SHAREHOLDER_EQUITY),
            shares: balance.number(fields::COMMON_STOCK_SHARES_OUTSTANDING),
            total_debt: total_debt(balance),
            operating_cash_flow: cash_flow.number(fields::OPERATING_CASHFLOW),
            capital_expenditures: cash_flow.number(fields::CAPITAL_EXPENDITURES),
            price: quote.map(|q| q.price),
        }
    }

    fn market_cap(&self) -> Option<f64> {
        Some(self.price? * self.shares?)
    }

    fn free_cash_flow(&self) -> Option<f64> {
        // missing capex counts as none spent
        Some(self.operating_cash_flow? - self.capital_expenditures.unwrap_or(0.0))
    }

    fn earnings_per_share(&self) -> Option<f64> {
        ratio(self.net_income, self.shares)
    }

    fn compute(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::GrossProfitMargin => {
                let gross_profit = Some(self.revenue? - self.cost_of_revenue?);
                percent(gross_profit, self.revenue)
            }
            Metric::NetProfitMargin => percent(self.net_income, self.revenue),
            Metric::CurrentRatio => ratio(self.current_assets, self.current_liabilities),
            Metric::DebtToEquity => ratio(self.total_liabilities, self.equity),
            Metric::OperatingCashFlowMargin => percent(self.operating_cash_flow, self.revenue),
            Metric::ReturnOnAssets => percent(self.net_income, self.total_assets),
            Metric::ReturnOnEquity => percent(self.net_income, self.equity),
            Metric::EarningsPerShare => self.earnings_per_share(),
            Metric::PriceToEarnings => ratio(self.price, self.earnings_per_share()),
            Metric::DebtToEbitda => ratio(self.total_debt, self.ebitda),
            Metric::FreeCashFlow => self.free_cash_flow(),
            Metric::FreeCashFlowYield => percent(self.free_cash_flow(), self.market_cap()),
        }
    }
}

/// Total debt: the reported aggregate, else short plus long term
pub(crate) fn total_debt(balance: &ReportPeriod) -> Option<f64> {
    balance.number(fields::SHORT_LONG_TERM_DEBT_TOTAL).or_else(|| {
        Some(balance.number(fields::SHORT_TERM_DEBT)? + balance.number(fields::LONG_TERM_DEBT)?)
    })
}

/// `numerator / denominator`, null on a missing operand or zero denominator
pub(crate) fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d != 0.0)?;
    let value = numerator? / denominator;
    value.is_finite().then_some(value)
}

pub(crate) fn percent(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    ratio(numerator, denominator).map(|v| v * 100.0)
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the metric table for one set of selected periods
///
/// The table always has one row per [`Metric::ALL`] entry. If every row is
/// null the result is [`InsightsError::NoMetricsComputable`] instead, so
/// "no usable data" is distinguishable from "partial data".
pub fn compute_metrics(
    income: &ReportPeriod,
    balance: &ReportPeriod,
    cash_flow: &ReportPeriod,
    quote: Option<&Quote>,
) -> Result<MetricTable> {
    let inputs = Inputs::extract(income, balance, cash_flow, quote);

    let table = MetricTable(
        Metric::ALL
            .iter()
            .map(|&metric| MetricRecord {
                metric,
                value: inputs.compute(metric).map(round2),
            })
            .collect(),
    );

    if table.computed_count() == 0 {
        return Err(InsightsError::NoMetricsComputable);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::ReportFrequency;
    use serde_json::{Value, json};

    fn period(value: Value) -> ReportPeriod {
        ReportPeriod::from_value(ReportFrequency::Annual, &value).unwrap()
    }

    fn empty() -> ReportPeriod {
        period(json!({}))
    }

    fn full_income() -> ReportPeriod {
        period(json!({
            "fiscalDateEnding": "2023-12-31",
            "totalRevenue": "1000",
            "costOfRevenue": "600",
            "netIncome": "100",
            "ebitda": "250"
        }))
    }

    fn full_balance() -> ReportPeriod {
        period(json!({
            "fiscalDateEnding": "2023-12-31",
            "totalAssets": "2000",
            "totalCurrentAssets": "800",
            "totalCurrentLiabilities": "400",
            "totalLiabilities": "1200",
            "totalShareholderEquity": "800",
            "commonStockSharesOutstanding": "50",
            "shortLongTermDebtTotal": "500"
        }))
    }

    fn full_cash_flow() -> ReportPeriod {
        period(json!({
            "fiscalDateEnding": "2023-12-31",
            "operatingCashflow": "300",
            "capitalExpenditures": "120"
        }))
    }

    fn quote(price: f64) -> Quote {
        Quote {
            price,
            latest_trading_day: None,
        }
    }

    #[test]
    fn test_full_table() {
        let q = quote(40.0);
        let table =
            compute_metrics(&full_income(), &full_balance(), &full_cash_flow(), Some(&q)).unwrap();

        assert_eq!(table.len(), Metric::ALL.len());
        assert_eq!(table.get(Metric::GrossProfitMargin), Some(40.0));
        assert_eq!(table.get(Metric::NetProfitMargin), Some(10.0));
        assert_eq!(table.get(Metric::CurrentRatio), Some(2.0));
        assert_eq!(table.get(Metric::DebtToEquity), Some(1.5));
        assert_eq!(table.get(Metric::OperatingCashFlowMargin), Some(30.0));
        assert_eq!(table.get(Metric::ReturnOnAssets), Some(5.0));
        assert_eq!(table.get(Metric::ReturnOnEquity), Some(12.5));
        assert_eq!(table.get(Metric::EarningsPerShare), Some(2.0));
        assert_eq!(table.get(Metric::PriceToEarnings), Some(20.0));
        assert_eq!(table.get(Metric::DebtToEbitda), Some(2.0));
        assert_eq!(table.get(Metric::FreeCashFlow), Some(180.0));
        // market cap 40 * 50 = 2000
        assert_eq!(table.get(Metric::FreeCashFlowYield), Some(9.0));
        assert_eq!(table.computed_count(), 12);
    }

    #[test]
    fn test_order_is_fixed() {
        let table = compute_metrics(&full_income(), &empty(), &empty(), None).unwrap();
        let order: Vec<Metric> = table.records().iter().map(|r| r.metric).collect();
        assert_eq!(order, Metric::ALL.to_vec());
    }

    #[test]
    fn test_margin_example() {
        let income = period(json!({
            "totalRevenue": "1000",
            "costOfRevenue": "600",
            "netIncome": "100"
        }));
        let table = compute_metrics(&income, &empty(), &empty(), None).unwrap();

        assert_eq!(table.get(Metric::GrossProfitMargin), Some(40.0));
        assert_eq!(table.get(Metric::NetProfitMargin), Some(10.0));
        assert_eq!(table.len(), 12);
    }

    #[test]
    fn test_zero_equity_nulls_debt_to_equity() {
        let balance = period(json!({"totalLiabilities": "500", "totalShareholderEquity": "0"}));
        let table = compute_metrics(&full_income(), &balance, &full_cash_flow(), None).unwrap();

        assert_eq!(table.get(Metric::DebtToEquity), None);
        assert_eq!(table.get(Metric::ReturnOnEquity), None);
        assert_eq!(table.get(Metric::NetProfitMargin), Some(10.0));
    }

    #[test]
    fn test_zero_current_liabilities_isolated() {
        let baseline =
            compute_metrics(&full_income(), &full_balance(), &full_cash_flow(), None).unwrap();

        let balance = period(json!({
            "totalAssets": "2000",
            "totalCurrentAssets": "800",
            "totalCurrentLiabilities": "0",
            "totalLiabilities": "1200",
            "totalShareholderEquity": "800",
            "commonStockSharesOutstanding": "50",
            "shortLongTermDebtTotal": "500"
        }));
        let table = compute_metrics(&full_income(), &balance, &full_cash_flow(), None).unwrap();

        for (before, after) in baseline.records().iter().zip(table.records()) {
            if after.metric == Metric::CurrentRatio {
                assert_eq!(after.value, None);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_missing_revenue() {
        let income = period(json!({"costOfRevenue": "600", "netIncome": "100"}));
        let table = compute_metrics(&income, &full_balance(), &full_cash_flow(), None).unwrap();

        assert_eq!(table.get(Metric::GrossProfitMargin), None);
        assert_eq!(table.get(Metric::NetProfitMargin), None);
        assert_eq!(table.get(Metric::OperatingCashFlowMargin), None);
        assert_eq!(table.get(Metric::CurrentRatio), Some(2.0));
        assert_eq!(table.get(Metric::DebtToEquity), Some(1.5));
    }

    #[test]
    fn test_non_numeric_treated_as_missing() {
        let income = period(json!({
            "totalRevenue": "None",
            "netIncome": "abc",
            "costOfRevenue": "600"
        }));
        let table = compute_metrics(&income, &full_balance(), &full_cash_flow(), None).unwrap();

        assert_eq!(table.get(Metric::GrossProfitMargin), None);
        assert_eq!(table.get(Metric::ReturnOnAssets), None);
        assert_eq!(table.get(Metric::CurrentRatio), Some(2.0));
    }

    #[test]
    fn test_cost_of_goods_fallback() {
        let income = period(json!({"totalRevenue": "1000", "costofGoodsAndServicesSold": "750"}));
        let table = compute_metrics(&income, &empty(), &empty(), None).unwrap();
        assert_eq!(table.get(Metric::GrossProfitMargin), Some(25.0));
    }

    #[test]
    fn test_price_to_earnings_needs_quote() {
        let table =
            compute_metrics(&full_income(), &full_balance(), &full_cash_flow(), None).unwrap();
        assert_eq!(table.get(Metric::PriceToEarnings), None);
        assert_eq!(table.get(Metric::FreeCashFlowYield), None);
        assert_eq!(table.get(Metric::EarningsPerShare), Some(2.0));
    }

    #[test]
    fn test_zero_shares_nulls_per_share_metrics() {
        let income = period(json!({"totalRevenue": "1000", "netIncome": "100"}));
        let balance = period(json!({"commonStockSharesOutstanding": "0"}));
        let cash_flow = period(json!({"operatingCashflow": "300"}));
        let q = quote(40.0);
        let table = compute_metrics(&income, &balance, &cash_flow, Some(&q)).unwrap();

        assert_eq!(table.get(Metric::EarningsPerShare), None);
        assert_eq!(table.get(Metric::PriceToEarnings), None);
        // market cap is zero
        assert_eq!(table.get(Metric::FreeCashFlowYield), None);
        assert_eq!(table.get(Metric::NetProfitMargin), Some(10.0));
    }

    #[test]
    fn test_zero_net_income_nulls_price_to_earnings() {
        let income = period(json!({"totalRevenue": "1000", "netIncome": "0"}));
        let q = quote(40.0);
        let table =
            compute_metrics(&income, &full_balance(), &full_cash_flow(), Some(&q)).unwrap();

        assert_eq!(table.get(Metric::EarningsPerShare), Some(0.0));
        assert_eq!(table.get(Metric::PriceToEarnings), None);
    }

    #[test]
    fn test_debt_fallback_and_zero_ebitda() {
        let balance = period(json!({"shortTermDebt": "100", "longTermDebt": "400"}));
        let table = compute_metrics(&full_income(), &balance, &empty(), None).unwrap();
        assert_eq!(table.get(Metric::DebtToEbitda), Some(2.0));

        let income = period(json!({"totalRevenue": "1000", "ebitda": "0"}));
        let table = compute_metrics(&income, &balance, &empty(), None);
        assert!(matches!(table, Err(InsightsError::NoMetricsComputable)));
    }

    #[test]
    fn test_free_cash_flow_without_capex() {
        let cash_flow = period(json!({"operatingCashflow": "300", "capitalExpenditures": "None"}));
        let table = compute_metrics(&empty(), &empty(), &cash_flow, None).unwrap();
        assert_eq!(table.get(Metric::FreeCashFlow), Some(300.0));
        assert_eq!(table.computed_count(), 1);
    }

    #[test]
    fn test_rounding() {
        let income = period(json!({"totalRevenue": "3", "netIncome": "1", "costOfRevenue": "2"}));
        let table = compute_metrics(&income, &empty(), &empty(), None).unwrap();
        assert_eq!(table.get(Metric::NetProfitMargin), Some(33.33));
        assert_eq!(table.get(Metric::GrossProfitMargin), Some(33.33));
        assert_eq!(round2(2.005_1), 2.01);
    }

    #[test]
    fn test_all_null_is_an_error() {
        let result = compute_metrics(&empty(), &empty(), &empty(), Some(&quote(10.0)));
        assert!(matches!(result, Err(InsightsError::NoMetricsComputable)));
    }

    #[test]
    fn test_to_text() {
        let income = period(json!({
            "totalRevenue": "1000",
            "costOfRevenue": "600",
            "netIncome": "100"
        }));
        let table = compute_metrics(&income, &empty(), &empty(), None).unwrap();
        let text = table.to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "Gross Profit Margin (%): 40.00");
        assert_eq!(lines[2], "Current Ratio: N/A");
    }

    #[test]
    fn test_serialization() {
        let income = period(json!({"totalRevenue": "1000", "netIncome": "100"}));
        let table = compute_metrics(&income, &empty(), &empty(), None).unwrap();
        let json = serde_json::to_value(&table).unwrap();

        assert_eq!(json[1]["metric"], "Net Profit Margin (%)");
        assert_eq!(json[1]["value"], 10.0);
        assert!(json[0]["value"].is_null());
    }
}
