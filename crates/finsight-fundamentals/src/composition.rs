//! Split of total assets into current and non-current

use serde::Serialize;

use crate::fields;
use crate::metrics::{percent, round2};
use crate::statements::ReportPeriod;

/// Current versus non-current assets of one balance-sheet period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssetComposition {
    pub current: f64,
    pub non_current: f64,
}

impl AssetComposition {
    /// Derive from a balance-sheet period
    ///
    /// Non-current assets come from `totalNonCurrentAssets`, else from
    /// `totalAssets - totalCurrentAssets`, else are taken as zero. `None`
    /// when current assets are unknown.
    pub fn from_balance_sheet(balance: &ReportPeriod) -> Option<Self> {
        let current = balance.number(fields::TOTAL_CURRENT_ASSETS)?;
        let non_current = balance
            .number(fields::TOTAL_NON_CURRENT_ASSETS)
            .or_else(|| balance.number(fields::TOTAL_ASSETS).map(|total| total - current))
            .unwrap_or(0.0);

        Some(Self {
            current,
            non_current,
        })
    }

    pub fn total(&self) -> f64 {
        self.current + self.non_current
    }

    /// Current assets as a share of the total, rounded to 2 dp
    pub fn current_share(&self) -> Option<f64> {
        percent(Some(self.current), Some(self.total())).map(round2)
    }

    /// Non-current assets as a share of the total, rounded to 2 dp
    pub fn non_current_share(&self) -> Option<f64> {
        percent(Some(self.non_current), Some(self.total())).map(round2)
    }

    /// Labelled slices, the way a pie chart wants them
    pub fn slices(&self) -> [(&'static str, f64); 2] {
        [
            ("Current Assets", self.current),
            ("Non-Current Assets", self.non_current),
        ]
    }
}
