//! Line-item names used by the market-data API

// Income statement
pub const TOTAL_REVENUE: &str = "totalRevenue";
pub const COST_OF_REVENUE: &str = "costOfRevenue";
pub const COST_OF_GOODS_AND_SERVICES_SOLD: &str = "costofGoodsAndServicesSold";
pub const NET_INCOME: &str = "netIncome";
pub const EBITDA: &str = "ebitda";

// Balance sheet
pub const TOTAL_ASSETS: &str = "totalAssets";
pub const TOTAL_CURRENT_ASSETS: &str = "totalCurrentAssets";
pub const TOTAL_NON_CURRENT_ASSETS: &str = "totalNonCurrentAssets";
pub const TOTAL_CURRENT_LIABILITIES: &str = "totalCurrentLiabilities";
pub const TOTAL_LIABILITIES: &str = "totalLiabilities";
pub const TOTAL_SHAREHOLDER_EQUITY: &str = "totalShareholderEquity";
pub const COMMON_STOCK_SHARES_OUTSTANDING: &str = "commonStockSharesOutstanding";
pub const SHORT_LONG_TERM_DEBT_TOTAL: &str = "shortLongTermDebtTotal";
pub const SHORT_TERM_DEBT: &str = "shortTermDebt";
pub const LONG_TERM_DEBT: &str = "longTermDebt";

// Cash flow
pub const OPERATING_CASHFLOW: &str = "operatingCashflow";
pub const CAPITAL_EXPENDITURES: &str = "capitalExpenditures";
