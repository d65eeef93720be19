//! Stock movement types and ledger arithmetic

use serde::{Deserialize, Serialize};

/// Type of a stock ledger movement. The type determines the direction of
/// the effect on the balance; adjustments carry their own sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    TransferIn,
    TransferOut,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::TransferIn => "TRANSFER_IN",
            MovementType::TransferOut => "TRANSFER_OUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(MovementType::In),
            "OUT" => Some(MovementType::Out),
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            "TRANSFER_IN" => Some(MovementType::TransferIn),
            "TRANSFER_OUT" => Some(MovementType::TransferOut),
            _ => None,
        }
    }

    /// True for movement types that remove stock from a branch
    pub fn is_outbound(&self) -> bool {
        matches!(self, MovementType::Out | MovementType::TransferOut)
    }

    /// Signed effect of a movement on the stock balance.
    ///
    /// IN-direction types always add, OUT-direction types always subtract,
    /// regardless of the sign the caller passed. Adjustments pass the
    /// caller's signed quantity through unchanged.
    pub fn signed_delta(&self, quantity: i32) -> i32 {
        match self {
            MovementType::In | MovementType::TransferIn => quantity.abs(),
            MovementType::Out | MovementType::TransferOut => -quantity.abs(),
            MovementType::Adjustment => quantity,
        }
    }
}

/// Business event category a movement refers back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Purchase,
    Sale,
    Transfer,
    Adjustment,
    Initial,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Purchase => "PURCHASE",
            ReferenceType::Sale => "SALE",
            ReferenceType::Transfer => "TRANSFER",
            ReferenceType::Adjustment => "ADJUSTMENT",
            ReferenceType::Initial => "INITIAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PURCHASE" => Some(ReferenceType::Purchase),
            "SALE" => Some(ReferenceType::Sale),
            "TRANSFER" => Some(ReferenceType::Transfer),
            "ADJUSTMENT" => Some(ReferenceType::Adjustment),
            "INITIAL" => Some(ReferenceType::Initial),
            _ => None,
        }
    }
}

/// Delta a stored movement contributes when the balance is rebuilt from
/// history. Quantities are stored unsigned, so adjustments must be replayed
/// from their balance snapshots rather than from the quantity column.
pub fn replay_delta(
    movement_type: MovementType,
    quantity: i32,
    previous_stock: i32,
    new_stock: i32,
) -> i32 {
    match movement_type {
        MovementType::Adjustment => new_stock - previous_stock,
        other => other.signed_delta(quantity),
    }
}
