//! Stock discrepancy workflow tests
//!
//! Covers difference computation, the report/investigate/resolve status
//! flow, and the corrective adjustment that brings the ledger to the
//! physically counted value.

use proptest::prelude::*;
use shared::models::{
    replay_delta, stock_difference, DiscrepancyStatus, DiscrepancyType, MovementType,
};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn difference_is_actual_minus_expected() {
        assert_eq!(stock_difference(95, 100), -5);
        assert_eq!(stock_difference(105, 100), 5);
        assert_eq!(stock_difference(100, 100), 0);
    }

    #[test]
    fn count_below_expectation_reads_as_shortage() {
        let difference = stock_difference(95, 100);
        assert!(difference < 0);
        // The reporter picks the category; SHORTAGE is the natural one here
        assert_eq!(DiscrepancyType::parse("SHORTAGE"), Some(DiscrepancyType::Shortage));
    }

    #[test]
    fn status_flow() {
        assert_eq!(
            DiscrepancyStatus::parse("REPORTED"),
            Some(DiscrepancyStatus::Reported)
        );
        assert_eq!(
            DiscrepancyStatus::parse("INVESTIGATING"),
            Some(DiscrepancyStatus::Investigating)
        );
        assert_eq!(
            DiscrepancyStatus::parse("RESOLVED"),
            Some(DiscrepancyStatus::Resolved)
        );
        assert_eq!(DiscrepancyStatus::parse("CLOSED"), None);
    }

    #[test]
    fn unknown_types_default_to_other() {
        assert_eq!(DiscrepancyType::default(), DiscrepancyType::Other);
        assert_eq!(DiscrepancyType::parse("MISPLACED"), None);
    }

    /// Resolving with the adjustment wired brings the balance to the
    /// counted value, recorded as a single ADJUSTMENT movement.
    #[test]
    fn resolution_adjustment_reaches_counted_stock() {
        let ledger_stock = 100;
        let counted = 95;

        let delta = counted - ledger_stock;
        assert_eq!(MovementType::Adjustment.signed_delta(delta), -5);

        let new_stock = ledger_stock + delta;
        assert_eq!(new_stock, counted);

        // The stored movement replays to the same delta
        assert_eq!(
            replay_delta(MovementType::Adjustment, delta.abs(), ledger_stock, new_stock),
            delta
        );
    }

    #[test]
    fn resolution_with_matching_count_needs_no_adjustment() {
        let delta = stock_difference(100, 100);
        assert_eq!(delta, 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// difference always equals actual - expected, for any counts
        #[test]
        fn prop_difference_definition(actual in 0i32..=10_000, expected in 0i32..=10_000) {
            prop_assert_eq!(stock_difference(actual, expected), actual - expected);
        }

        /// Applying the corrective adjustment always lands exactly on the
        /// counted value, regardless of where the ledger started.
        #[test]
        fn prop_adjustment_converges(ledger in 0i32..=10_000, counted in 0i32..=10_000) {
            let delta = counted - ledger;
            let new_stock = ledger + MovementType::Adjustment.signed_delta(delta);
            prop_assert_eq!(new_stock, counted);
        }

        /// A second resolution against an already-corrected balance is a
        /// no-op delta.
        #[test]
        fn prop_resolution_idempotent(ledger in 0i32..=10_000, counted in 0i32..=10_000) {
            let first = counted - ledger;
            let after_first = ledger + first;
            let second = counted - after_first;
            prop_assert_eq!(second, 0);
        }
    }
}
