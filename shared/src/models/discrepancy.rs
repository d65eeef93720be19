//! Stock discrepancy reporting types

use serde::{Deserialize, Serialize};

/// Workflow state of a reported discrepancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyStatus {
    Reported,
    Investigating,
    Resolved,
}

impl DiscrepancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyStatus::Reported => "REPORTED",
            DiscrepancyStatus::Investigating => "INVESTIGATING",
            DiscrepancyStatus::Resolved => "RESOLVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REPORTED" => Some(DiscrepancyStatus::Reported),
            "INVESTIGATING" => Some(DiscrepancyStatus::Investigating),
            "RESOLVED" => Some(DiscrepancyStatus::Resolved),
            _ => None,
        }
    }
}

/// Category of a stock discrepancy as assessed by the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    Overage,
    Shortage,
    Damaged,
    Lost,
    Other,
}

impl Default for DiscrepancyType {
    fn default() -> Self {
        DiscrepancyType::Other
    }
}

impl DiscrepancyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::Overage => "OVERAGE",
            DiscrepancyType::Shortage => "SHORTAGE",
            DiscrepancyType::Damaged => "DAMAGED",
            DiscrepancyType::Lost => "LOST",
            DiscrepancyType::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OVERAGE" => Some(DiscrepancyType::Overage),
            "SHORTAGE" => Some(DiscrepancyType::Shortage),
            "DAMAGED" => Some(DiscrepancyType::Damaged),
            "LOST" => Some(DiscrepancyType::Lost),
            "OTHER" => Some(DiscrepancyType::Other),
            _ => None,
        }
    }
}

/// Signed gap between the counted stock and the ledger's expectation
pub fn stock_difference(actual_stock: i32, expected_stock: i32) -> i32 {
    actual_stock - expected_stock
}
