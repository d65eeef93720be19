//! Date-sequenced document numbers for transfers, dispatches and receipts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Document families that carry a human-readable, date-sequenced number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Transfer,
    Dispatch,
    Receiving,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Transfer => "TR",
            DocumentKind::Dispatch => "DS",
            DocumentKind::Receiving => "RS",
        }
    }

    /// Format: `<prefix>-YYYYMMDD-NNNN`, e.g. `TR-20250114-0007`
    pub fn format_number(&self, date: NaiveDate, sequence: i64) -> String {
        format!("{}-{}-{:04}", self.prefix(), date.format("%Y%m%d"), sequence)
    }
}
