//! Inventory view tests
//!
//! Covers stock status classification, availability arithmetic, shortage
//! calculation, and valuation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{available_stock, classify_stock_status, StockStatus};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(classify_stock_status(0, 10), StockStatus::OutOfStock);
        assert_eq!(classify_stock_status(5, 10), StockStatus::LowStock);
        assert_eq!(classify_stock_status(10, 10), StockStatus::LowStock);
        assert_eq!(classify_stock_status(11, 10), StockStatus::Normal);
    }

    #[test]
    fn zero_available_is_out_of_stock_even_with_zero_minimum() {
        assert_eq!(classify_stock_status(0, 0), StockStatus::OutOfStock);
        assert_eq!(classify_stock_status(1, 0), StockStatus::Normal);
    }

    #[test]
    fn available_is_current_minus_reserved() {
        assert_eq!(available_stock(100, 30), 70);
        assert_eq!(available_stock(100, 100), 0);
        assert_eq!(available_stock(0, 0), 0);
    }

    #[test]
    fn shortage_against_minimum() {
        let minimum = 50;
        let available = 30;
        assert_eq!(minimum - available, 20);
    }

    #[test]
    fn valuation_is_stock_times_unit_price() {
        let current_stock = Decimal::from(40);
        let unit_price = dec("12.50");
        assert_eq!(current_stock * unit_price, dec("500.00"));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(StockStatus::OutOfStock.as_str(), "OUT_OF_STOCK");
        assert_eq!(StockStatus::LowStock.as_str(), "LOW_STOCK");
        assert_eq!(StockStatus::Normal.as_str(), "NORMAL");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Classification is total and consistent with its thresholds
        #[test]
        fn prop_classification_thresholds(available in -100i32..=1000, minimum in 0i32..=500) {
            let status = classify_stock_status(available, minimum);
            match status {
                StockStatus::OutOfStock => prop_assert!(available <= 0),
                StockStatus::LowStock => {
                    prop_assert!(available > 0 && available <= minimum)
                }
                StockStatus::Normal => prop_assert!(available > minimum),
            }
        }

        /// More availability never worsens the status
        #[test]
        fn prop_classification_monotonic(available in 0i32..=1000, minimum in 0i32..=500) {
            fn rank(status: StockStatus) -> i32 {
                match status {
                    StockStatus::OutOfStock => 0,
                    StockStatus::LowStock => 1,
                    StockStatus::Normal => 2,
                }
            }
            let here = rank(classify_stock_status(available, minimum));
            let better = rank(classify_stock_status(available + 1, minimum));
            prop_assert!(better >= here);
        }

        /// Valuation scales linearly with quantity
        #[test]
        fn prop_valuation_linear(stock in 0i32..=10_000, price_cents in 0i64..=1_000_00) {
            let unit_price = Decimal::new(price_cents, 2);
            let total = Decimal::from(stock) * unit_price;
            let doubled = Decimal::from(stock * 2) * unit_price;
            prop_assert_eq!(doubled, total * Decimal::from(2));
        }
    }
}
