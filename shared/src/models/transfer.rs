//! Transfer request lifecycle: states, priorities, and quantity ordering

use serde::{Deserialize, Serialize};

/// Lifecycle state of a transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    InTransit,
    Delivered,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Approved => "APPROVED",
            TransferStatus::Rejected => "REJECTED",
            TransferStatus::InTransit => "IN_TRANSIT",
            TransferStatus::Delivered => "DELIVERED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransferStatus::Pending),
            "APPROVED" => Some(TransferStatus::Approved),
            "REJECTED" => Some(TransferStatus::Rejected),
            "IN_TRANSIT" => Some(TransferStatus::InTransit),
            "DELIVERED" => Some(TransferStatus::Delivered),
            "CANCELLED" => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }

    /// REJECTED, DELIVERED and CANCELLED admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Rejected | TransferStatus::Delivered | TransferStatus::Cancelled
        )
    }

    /// Whether `next` is a legal successor of this state.
    ///
    /// PENDING -> APPROVED | REJECTED | CANCELLED
    /// APPROVED -> IN_TRANSIT | CANCELLED
    /// IN_TRANSIT -> DELIVERED
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        match (self, next) {
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) => true,
            (Approved, InTransit) | (Approved, Cancelled) => true,
            (InTransit, Delivered) => true,
            _ => false,
        }
    }
}

/// Urgency of a transfer request, used to order approval queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TransferPriority {
    fn default() -> Self {
        TransferPriority::Medium
    }
}

impl TransferPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPriority::Low => "LOW",
            TransferPriority::Medium => "MEDIUM",
            TransferPriority::High => "HIGH",
            TransferPriority::Urgent => "URGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(TransferPriority::Low),
            "MEDIUM" => Some(TransferPriority::Medium),
            "HIGH" => Some(TransferPriority::High),
            "URGENT" => Some(TransferPriority::Urgent),
            _ => None,
        }
    }

    /// Sort key for approval queues: URGENT first
    pub fn approval_rank(&self) -> i32 {
        match self {
            TransferPriority::Urgent => 1,
            TransferPriority::High => 2,
            TransferPriority::Medium => 3,
            TransferPriority::Low => 4,
        }
    }
}

/// Quantity ordering across a transfer line item's lifecycle.
///
/// Each stage may not exceed the one before it: approved <= requested,
/// dispatched <= approved, received <= dispatched. A later stage quantity
/// without its predecessor is inconsistent.
pub fn quantities_ordered(
    requested: i32,
    approved: Option<i32>,
    dispatched: Option<i32>,
    received: Option<i32>,
) -> bool {
    if requested <= 0 {
        return false;
    }
    let approved_ok = match approved {
        Some(a) => a >= 0 && a <= requested,
        None => dispatched.is_none() && received.is_none(),
    };
    if !approved_ok {
        return false;
    }
    let dispatched_ok = match (dispatched, approved) {
        (Some(d), Some(a)) => d >= 0 && d <= a,
        (Some(_), None) => false,
        (None, _) => received.is_none(),
    };
    if !dispatched_ok {
        return false;
    }
    match (received, dispatched) {
        (Some(r), Some(d)) => r >= 0 && r <= d,
        (Some(_), None) => false,
        (None, _) => true,
    }
}
