//! Terminal rendering of reports

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use finsight_fundamentals::{AssetComposition, FinancialReport, Metric, MetricTable, TrendSeries};

const NOT_AVAILABLE: &str = "N/A";

fn new_table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// Format a currency amount in human-readable form
pub fn format_amount(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if abs >= 1_000_000_000_000.0 {
        format!("{sign}${:.2}T", abs / 1_000_000_000_000.0)
    } else if abs >= 1_000_000_000.0 {
        format!("{sign}${:.2}B", abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{sign}${:.2}M", abs / 1_000_000.0)
    } else {
        format!("{sign}${abs:.2}")
    }
}

/// Format a metric value for display
pub fn format_metric(metric: Metric, value: Option<f64>) -> String {
    let Some(value) = value else {
        return NOT_AVAILABLE.to_string();
    };

    match metric {
        Metric::GrossProfitMargin
        | Metric::NetProfitMargin
        | Metric::OperatingCashFlowMargin
        | Metric::ReturnOnAssets
        | Metric::ReturnOnEquity
        | Metric::FreeCashFlowYield => format!("{value:.2}%"),
        Metric::FreeCashFlow => format_amount(value),
        Metric::EarningsPerShare => format!("${value:.2}"),
        Metric::CurrentRatio
        | Metric::DebtToEquity
        | Metric::PriceToEarnings
        | Metric::DebtToEbitda => format!("{value:.2}"),
    }
}

pub fn metrics_table(metrics: &MetricTable) -> Table {
    let mut table = new_table(["Metric", "Value"]);
    for record in metrics {
        table.add_row(vec![
            Cell::new(record.metric.name()),
            Cell::new(format_metric(record.metric, record.value))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn trend_table(series: &TrendSeries) -> Table {
    let is_percent = series.name().ends_with("(%)");
    let is_ratio = series.name() == "Debt to EBITDA";

    let mut table = new_table(["Period", series.name()]);
    for point in series.points() {
        let value = if is_percent {
            format!("{:.2}%", point.value)
        } else if is_ratio {
            format!("{:.2}", point.value)
        } else {
            format_amount(point.value)
        };
        table.add_row(vec![
            Cell::new(point.period.format("%Y-%m-%d")),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn composition_table(composition: &AssetComposition) -> Table {
    let shares = [composition.current_share(), composition.non_current_share()];

    let mut table = new_table(["Assets", "Amount"]);
    for ((label, amount), share) in composition.slices().into_iter().zip(shares) {
        let share = share.map_or_else(|| NOT_AVAILABLE.to_string(), |s| format!("{s:.2}%"));
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{} ({share})", format_amount(amount)))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Full text rendering of a report
pub fn render_report(report: &FinancialReport) -> String {
    let mut out = String::new();

    let period = report.fiscal_date_ending.as_deref().unwrap_or("unknown period");
    out.push_str(&format!("{} - fiscal period ending {period}\n", report.symbol));
    if let Some(quote) = &report.quote {
        out.push_str(&format!("Last price: ${:.2}\n", quote.price));
    }

    out.push_str("\nKey Financial Metrics\n");
    out.push_str(&metrics_table(&report.metrics).to_string());
    out.push('\n');

    for series in report.trends() {
        if series.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&trend_table(series).to_string());
        out.push('\n');
    }

    if let Some(composition) = &report.asset_composition {
        out.push_str("\nAsset Composition\n");
        out.push_str(&composition_table(composition).to_string());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_000_000_000.0), "$1.50T");
        assert_eq!(format_amount(50_000_000_000.0), "$50.00B");
        assert_eq!(format_amount(-250_000_000.0), "-$250.00M");
        assert_eq!(format_amount(180.0), "$180.00");
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Metric::GrossProfitMargin, Some(40.0)), "40.00%");
        assert_eq!(format_metric(Metric::CurrentRatio, Some(2.0)), "2.00");
        assert_eq!(format_metric(Metric::EarningsPerShare, Some(6.43)), "$6.43");
        assert_eq!(format_metric(Metric::FreeCashFlow, Some(2.5e9)), "$2.50B");
        assert_eq!(format_metric(Metric::DebtToEquity, None), "N/A");
    }

    #[test]
    fn test_composition_table() {
        let composition = AssetComposition {
            current: 250.0,
            non_current: 750.0,
        };
        let rendered = composition_table(&composition).to_string();
        assert!(rendered.contains("Current Assets"));
        assert!(rendered.contains("$750.00 (75.00%)"));
    }
}
