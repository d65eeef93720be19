//! Receiving slip types

use serde::{Deserialize, Serialize};

/// Overall condition of a shipment on arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArrivalCondition {
    Good,
    Damaged,
    Partial,
}

impl Default for ArrivalCondition {
    fn default() -> Self {
        ArrivalCondition::Good
    }
}

impl ArrivalCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrivalCondition::Good => "GOOD",
            ArrivalCondition::Damaged => "DAMAGED",
            ArrivalCondition::Partial => "PARTIAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GOOD" => Some(ArrivalCondition::Good),
            "DAMAGED" => Some(ArrivalCondition::Damaged),
            "PARTIAL" => Some(ArrivalCondition::Partial),
            _ => None,
        }
    }
}
