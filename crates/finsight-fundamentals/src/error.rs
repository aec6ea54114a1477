//! Error types for the fundamentals pipeline

use thiserror::Error;

use crate::statements::StatementKind;

/// Errors surfaced by fetching and deriving fundamentals
///
/// Per-metric problems (missing field, zero denominator, non-numeric value)
/// never show up here; they only null out the affected metric. Narration
/// failures are not represented either, the narrator degrades to a fixed
/// message instead.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// Network or HTTP level failure (non-2xx status, timeout, provider error body)
    #[error("Failed to fetch {statement}: {reason}")]
    Fetch {
        statement: String,
        reason: String,
    },

    /// Provider quota notice
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        provider: String,
    },

    /// Statement fetched but it carries neither annual nor quarterly reports
    #[error("No report data available for {statement}")]
    NoReportData {
        statement: StatementKind,
    },

    /// Every metric in the table came out null
    #[error("No financial metrics could be computed from the reported data")]
    NoMetricsComputable,

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl InsightsError {
    /// Build a fetch failure for a named request
    pub fn fetch(statement: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            statement: statement.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, InsightsError>;
