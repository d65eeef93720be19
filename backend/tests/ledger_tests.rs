//! Stock ledger tests
//!
//! Covers the ledger arithmetic: signed movement deltas, balance snapshots,
//! reservation bounds, release clamping, and the replay invariant (the sum
//! of all movement deltas for a pair reproduces the materialized balance).

use proptest::prelude::*;
use shared::models::{replay_delta, MovementType};

// ============================================================================
// Simulation helpers (mirror the service arithmetic without a database)
// ============================================================================

/// One recorded movement: type, stored quantity, and balance snapshots
#[derive(Debug, Clone)]
struct SimMovement {
    movement_type: MovementType,
    quantity: i32,
    previous_stock: i32,
    new_stock: i32,
}

/// In-memory stand-in for one (item, branch) inventory row plus its
/// movement history
#[derive(Debug, Default)]
struct SimLedger {
    current: i32,
    reserved: i32,
    movements: Vec<SimMovement>,
}

impl SimLedger {
    fn post(&mut self, movement_type: MovementType, quantity: i32) -> Result<i32, &'static str> {
        match movement_type {
            MovementType::Adjustment => {
                if quantity == 0 {
                    return Err("adjustment delta must be non-zero");
                }
            }
            _ => {
                if quantity <= 0 {
                    return Err("quantity must be positive");
                }
            }
        }

        let delta = movement_type.signed_delta(quantity);
        let new_stock = self.current + delta;

        if new_stock < 0 {
            return Err("insufficient stock");
        }
        if movement_type.is_outbound() && new_stock < self.reserved {
            return Err("insufficient available stock");
        }

        self.movements.push(SimMovement {
            movement_type,
            quantity: delta.abs(),
            previous_stock: self.current,
            new_stock,
        });
        self.current = new_stock;
        Ok(new_stock)
    }

    fn set_level(&mut self, new_level: i32) -> Result<(), &'static str> {
        if new_level < 0 {
            return Err("level cannot be negative");
        }
        let delta = new_level - self.current;
        if delta == 0 {
            return Ok(());
        }
        self.post(MovementType::Adjustment, delta).map(|_| ())
    }

    fn reserve(&mut self, quantity: i32) -> Result<(), &'static str> {
        if quantity <= 0 {
            return Err("quantity must be positive");
        }
        if self.current - self.reserved < quantity {
            return Err("insufficient available stock");
        }
        self.reserved += quantity;
        Ok(())
    }

    fn release(&mut self, quantity: i32) {
        self.reserved = (self.reserved - quantity).max(0);
    }

    fn available(&self) -> i32 {
        self.current - self.reserved
    }

    /// Rebuild the balance from history alone
    fn replay(&self) -> i32 {
        self.movements
            .iter()
            .map(|m| replay_delta(m.movement_type, m.quantity, m.previous_stock, m.new_stock))
            .sum()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn inbound_types_add_regardless_of_sign() {
        assert_eq!(MovementType::In.signed_delta(5), 5);
        assert_eq!(MovementType::In.signed_delta(-5), 5);
        assert_eq!(MovementType::TransferIn.signed_delta(7), 7);
    }

    #[test]
    fn outbound_types_subtract_regardless_of_sign() {
        assert_eq!(MovementType::Out.signed_delta(5), -5);
        assert_eq!(MovementType::Out.signed_delta(-5), -5);
        assert_eq!(MovementType::TransferOut.signed_delta(3), -3);
    }

    #[test]
    fn adjustment_keeps_caller_sign() {
        assert_eq!(MovementType::Adjustment.signed_delta(4), 4);
        assert_eq!(MovementType::Adjustment.signed_delta(-4), -4);
    }

    #[test]
    fn adjustment_replays_from_snapshots() {
        // Quantities are stored unsigned, so a downward adjustment can only
        // be replayed from its snapshots.
        assert_eq!(replay_delta(MovementType::Adjustment, 5, 20, 15), -5);
        assert_eq!(replay_delta(MovementType::Adjustment, 5, 15, 20), 5);
        assert_eq!(replay_delta(MovementType::Out, 5, 20, 15), -5);
        assert_eq!(replay_delta(MovementType::In, 5, 15, 20), 5);
    }

    #[test]
    fn overdraw_fails_and_leaves_balance_unchanged() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 10).unwrap();

        // One more unit than is on hand
        let result = ledger.post(MovementType::Out, 11);
        assert!(result.is_err());
        assert_eq!(ledger.current, 10);
        assert_eq!(ledger.replay(), 10);
    }

    #[test]
    fn outbound_cannot_consume_reserved_stock() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 100).unwrap();
        ledger.reserve(80).unwrap();

        assert!(ledger.post(MovementType::Out, 50).is_err());
        assert!(ledger.post(MovementType::Out, 20).is_ok());
        assert_eq!(ledger.current, 80);
        assert_eq!(ledger.available(), 0);
    }

    #[test]
    fn adjustment_may_set_level_below_reserved() {
        // A physical count wins over reservations.
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 100).unwrap();
        ledger.reserve(60).unwrap();

        ledger.set_level(40).unwrap();
        assert_eq!(ledger.current, 40);
        assert_eq!(ledger.replay(), 40);
    }

    #[test]
    fn reserve_fails_past_available() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 10).unwrap();
        ledger.reserve(6).unwrap();

        // 4 available; reserving 5 must fail, not clamp
        assert!(ledger.reserve(5).is_err());
        assert_eq!(ledger.reserved, 6);
        assert!(ledger.reserve(4).is_ok());
        assert_eq!(ledger.available(), 0);
    }

    #[test]
    fn release_is_floored_at_zero() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 10).unwrap();
        ledger.reserve(5).unwrap();

        ledger.release(3);
        assert_eq!(ledger.reserved, 2);

        // Over-release from a retried operation is absorbed
        ledger.release(10);
        assert_eq!(ledger.reserved, 0);
        ledger.release(1);
        assert_eq!(ledger.reserved, 0);
    }

    #[test]
    fn zero_quantity_movements_are_rejected() {
        let mut ledger = SimLedger::default();
        assert!(ledger.post(MovementType::In, 0).is_err());
        assert!(ledger.post(MovementType::Adjustment, 0).is_err());
        assert!(ledger.movements.is_empty());
    }

    #[test]
    fn set_level_to_current_posts_nothing() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 25).unwrap();
        let before = ledger.movements.len();

        ledger.set_level(25).unwrap();
        assert_eq!(ledger.movements.len(), before);
    }

    #[test]
    fn replay_matches_balance_after_mixed_history() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 50).unwrap();
        ledger.post(MovementType::Out, 12).unwrap();
        ledger.post(MovementType::TransferIn, 8).unwrap();
        ledger.set_level(30).unwrap();
        ledger.post(MovementType::TransferOut, 5).unwrap();

        assert_eq!(ledger.current, 25);
        assert_eq!(ledger.replay(), ledger.current);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut ledger = SimLedger::default();
        ledger.post(MovementType::In, 40).unwrap();
        ledger.post(MovementType::Out, 15).unwrap();

        let first = ledger.replay();
        ledger.current = first;
        let second = ledger.replay();
        assert_eq!(first, second);
        assert_eq!(ledger.current, second);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Post(MovementType, i32),
        SetLevel(i32),
        Reserve(i32),
        Release(i32),
    }

    fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
        prop_oneof![
            Just(MovementType::In),
            Just(MovementType::Out),
            Just(MovementType::TransferIn),
            Just(MovementType::TransferOut),
        ]
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (movement_type_strategy(), 1i32..=50).prop_map(|(t, q)| Op::Post(t, q)),
            (-50i32..=50).prop_filter("non-zero", |d| *d != 0)
                .prop_map(|d| Op::Post(MovementType::Adjustment, d)),
            (0i32..=100).prop_map(Op::SetLevel),
            (1i32..=30).prop_map(Op::Reserve),
            (1i32..=30).prop_map(Op::Release),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// After any accepted sequence of operations, replaying the full
        /// movement history reproduces the materialized balance exactly.
        #[test]
        fn prop_replay_reproduces_balance(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut ledger = SimLedger::default();
            for op in ops {
                match op {
                    Op::Post(t, q) => { let _ = ledger.post(t, q); }
                    Op::SetLevel(l) => { let _ = ledger.set_level(l); }
                    Op::Reserve(q) => { let _ = ledger.reserve(q); }
                    Op::Release(q) => ledger.release(q),
                }
            }
            prop_assert_eq!(ledger.replay(), ledger.current);
        }

        /// Balances and reservation counters never go negative, no matter
        /// what sequence of operations is attempted.
        #[test]
        fn prop_counters_never_negative(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let mut ledger = SimLedger::default();
            for op in ops {
                match op {
                    Op::Post(t, q) => { let _ = ledger.post(t, q); }
                    Op::SetLevel(l) => { let _ = ledger.set_level(l); }
                    Op::Reserve(q) => { let _ = ledger.reserve(q); }
                    Op::Release(q) => ledger.release(q),
                }
                prop_assert!(ledger.current >= 0);
                prop_assert!(ledger.reserved >= 0);
            }
        }

        /// A reservation only succeeds when the full quantity is available,
        /// and success reduces availability by exactly that quantity.
        #[test]
        fn prop_reserve_is_all_or_nothing(
            stock in 0i32..=100,
            first in 1i32..=100,
            second in 1i32..=100,
        ) {
            let mut ledger = SimLedger::default();
            if stock > 0 {
                ledger.post(MovementType::In, stock).unwrap();
            }

            let available_before = ledger.available();
            let result = ledger.reserve(first);
            if first <= available_before {
                prop_assert!(result.is_ok());
                prop_assert_eq!(ledger.available(), available_before - first);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(ledger.available(), available_before);
            }

            // Second reservation sees the reduced availability
            let available_mid = ledger.available();
            let result = ledger.reserve(second);
            prop_assert_eq!(result.is_ok(), second <= available_mid);
        }

        /// Outbound movements never drive availability negative.
        #[test]
        fn prop_outbound_respects_reservations(
            stock in 1i32..=100,
            reserve in 1i32..=100,
            out in 1i32..=100,
        ) {
            let mut ledger = SimLedger::default();
            ledger.post(MovementType::In, stock).unwrap();
            let _ = ledger.reserve(reserve);

            let available = ledger.available();
            let result = ledger.post(MovementType::Out, out);
            prop_assert_eq!(result.is_ok(), out <= available);
            prop_assert!(ledger.available() >= 0);
        }

        /// Releasing any amount any number of times floors at zero.
        #[test]
        fn prop_release_floors_at_zero(
            stock in 1i32..=100,
            reserve in 1i32..=50,
            releases in prop::collection::vec(1i32..=40, 1..10),
        ) {
            let mut ledger = SimLedger::default();
            ledger.post(MovementType::In, stock).unwrap();
            let _ = ledger.reserve(reserve.min(stock));

            for quantity in releases {
                ledger.release(quantity);
                prop_assert!(ledger.reserved >= 0);
            }
        }
    }
}
