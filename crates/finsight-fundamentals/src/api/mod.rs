//! Market-data API clients

pub mod alpha_vantage;

pub use alpha_vantage::AlphaVantageClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::statements::RawStatementBundle;

/// Anything that can produce the raw statements for a ticker
///
/// The pipeline only sees this trait; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatementSource: Send + Sync {
    /// Fetch every mandatory statement (and, best effort, a quote)
    ///
    /// Either all mandatory statements arrive or the call fails; a partial
    /// bundle is never returned.
    async fn fetch(&self, symbol: &str) -> Result<RawStatementBundle>;
}
