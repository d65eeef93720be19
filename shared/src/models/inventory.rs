//! Inventory stock levels and status classification

use serde::{Deserialize, Serialize};

/// Stock health of an item at a branch, relative to its minimum level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Normal,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "OUT_OF_STOCK",
            StockStatus::LowStock => "LOW_STOCK",
            StockStatus::Normal => "NORMAL",
        }
    }
}

/// Classify availability against the item's minimum stock level
pub fn classify_stock_status(available_stock: i32, minimum_stock_level: i32) -> StockStatus {
    if available_stock <= 0 {
        StockStatus::OutOfStock
    } else if available_stock <= minimum_stock_level {
        StockStatus::LowStock
    } else {
        StockStatus::Normal
    }
}

/// Stock not held back by reservations
pub fn available_stock(current_stock: i32, reserved_stock: i32) -> i32 {
    current_stock - reserved_stock
}
