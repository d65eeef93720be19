//! Transfer lifecycle tests
//!
//! Covers the status state machine, quantity ordering across the lifecycle,
//! priority-ordered approval queues, document number formats, and the
//! end-to-end dispatch/receive arithmetic against the ledger.

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::models::{
    quantities_ordered, DocumentKind, MovementType, TransferPriority, TransferStatus,
};

use TransferStatus::*;

const ALL_STATUSES: [TransferStatus; 6] =
    [Pending, Approved, Rejected, InTransit, Delivered, Cancelled];

// ============================================================================
// State Machine
// ============================================================================

#[cfg(test)]
mod state_machine_tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(InTransit));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(InTransit.can_transition_to(Delivered));
    }

    #[test]
    fn transitions_form_a_dag_with_exactly_six_edges() {
        let edges: Vec<_> = ALL_STATUSES
            .iter()
            .flat_map(|from| {
                ALL_STATUSES
                    .iter()
                    .filter(move |to| from.can_transition_to(**to))
                    .map(move |to| (*from, *to))
            })
            .collect();
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for terminal in [Rejected, Delivered, Cancelled] {
            assert!(terminal.is_terminal());
            for next in ALL_STATUSES {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_state_transitions_to_itself() {
        for status in ALL_STATUSES {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn skipping_dispatch_is_rejected() {
        // PENDING cannot jump to IN_TRANSIT or DELIVERED
        assert!(!Pending.can_transition_to(InTransit));
        assert!(!Pending.can_transition_to(Delivered));
        // APPROVED cannot jump straight to DELIVERED
        assert!(!Approved.can_transition_to(Delivered));
        // IN_TRANSIT cannot be cancelled; the goods already left
        assert!(!InTransit.can_transition_to(Cancelled));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(TransferStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TransferStatus::parse("SHIPPED"), None);
    }
}

// ============================================================================
// Quantity Ordering
// ============================================================================

#[cfg(test)]
mod quantity_tests {
    use super::*;

    #[test]
    fn each_stage_bounded_by_the_previous() {
        assert!(quantities_ordered(10, Some(10), Some(10), Some(10)));
        assert!(quantities_ordered(10, Some(8), Some(8), Some(6)));
        assert!(quantities_ordered(10, Some(0), None, None));

        // approved > requested
        assert!(!quantities_ordered(10, Some(11), None, None));
        // dispatched > approved
        assert!(!quantities_ordered(10, Some(8), Some(9), None));
        // received > dispatched
        assert!(!quantities_ordered(10, Some(8), Some(8), Some(9)));
    }

    #[test]
    fn later_stages_require_earlier_ones() {
        assert!(!quantities_ordered(10, None, Some(5), None));
        assert!(!quantities_ordered(10, Some(8), None, Some(5)));
    }

    #[test]
    fn requested_must_be_positive() {
        assert!(!quantities_ordered(0, None, None, None));
        assert!(!quantities_ordered(-3, None, None, None));
    }

    proptest! {
        /// Quantities copied forward unchanged are always consistent
        #[test]
        fn prop_full_chain_with_shrinkage(
            requested in 1i32..=1000,
            approve_cut in 0i32..=1000,
            receive_cut in 0i32..=1000,
        ) {
            let approved = (requested - approve_cut).max(0);
            let dispatched = approved;
            let received = (dispatched - receive_cut).max(0);
            prop_assert!(quantities_ordered(
                requested,
                Some(approved),
                Some(dispatched),
                Some(received),
            ));
        }
    }
}

// ============================================================================
// Priorities and Document Numbers
// ============================================================================

#[cfg(test)]
mod ordering_tests {
    use super::*;

    #[test]
    fn urgent_sorts_before_low() {
        let mut priorities = [
            TransferPriority::Low,
            TransferPriority::Urgent,
            TransferPriority::Medium,
            TransferPriority::High,
        ];
        priorities.sort_by_key(|p| p.approval_rank());
        assert_eq!(
            priorities,
            [
                TransferPriority::Urgent,
                TransferPriority::High,
                TransferPriority::Medium,
                TransferPriority::Low,
            ]
        );
    }

    #[test]
    fn medium_is_the_default_priority() {
        assert_eq!(TransferPriority::default(), TransferPriority::Medium);
    }

    #[test]
    fn document_number_format() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert_eq!(
            DocumentKind::Transfer.format_number(date, 7),
            "TR-20250114-0007"
        );
        assert_eq!(
            DocumentKind::Dispatch.format_number(date, 42),
            "DS-20250114-0042"
        );
        assert_eq!(
            DocumentKind::Receiving.format_number(date, 12345),
            "RS-20250114-12345"
        );
    }

    proptest! {
        /// Same-day sequence values produce strictly distinct numbers
        #[test]
        fn prop_distinct_sequences_distinct_numbers(a in 1i64..=9999, b in 1i64..=9999) {
            prop_assume!(a != b);
            let date = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
            prop_assert_ne!(
                DocumentKind::Transfer.format_number(date, a),
                DocumentKind::Transfer.format_number(date, b)
            );
        }
    }
}

// ============================================================================
// End-to-End Lifecycle Arithmetic
// ============================================================================

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    /// Minimal two-branch ledger mirroring the dispatch/receive effects
    #[derive(Debug, Default)]
    struct BranchStock {
        current: i32,
        reserved: i32,
    }

    impl BranchStock {
        fn available(&self) -> i32 {
            self.current - self.reserved
        }
    }

    #[test]
    fn dispatch_then_receive_with_damage() {
        // Source holds 50 units; transfer of 10 is approved and dispatched,
        // 8 arrive intact and 2 are damaged in transit.
        let mut source = BranchStock {
            current: 50,
            reserved: 0,
        };
        let mut destination = BranchStock::default();

        let approved = 10;

        // Dispatch: reserve at the source only
        source.reserved += approved;
        assert_eq!(source.available(), 40);
        assert_eq!(source.current, 50);

        // Receive: 8 intact out of 10
        let received = 8;
        source.reserved = (source.reserved - received).max(0);
        source.current += MovementType::TransferOut.signed_delta(received);
        destination.current += MovementType::TransferIn.signed_delta(received);

        assert_eq!(destination.current, 8);
        assert_eq!(source.current, 42);
        // Only the received quantity is released; the 2 damaged units stay
        // reserved pending a discrepancy resolution.
        assert_eq!(source.reserved, 2);
        assert_eq!(source.available(), 40);
    }

    #[test]
    fn clean_receive_releases_everything() {
        let mut source = BranchStock {
            current: 20,
            reserved: 0,
        };
        let mut destination = BranchStock::default();

        source.reserved += 20;
        assert_eq!(source.available(), 0);

        let received = 20;
        source.reserved = (source.reserved - received).max(0);
        source.current -= received;
        destination.current += received;

        assert_eq!(source.current, 0);
        assert_eq!(source.reserved, 0);
        assert_eq!(destination.current, 20);
    }

    proptest! {
        /// Units are conserved across a transfer: whatever leaves the source
        /// arrives at the destination, and the unreceived remainder stays
        /// reserved at the source.
        #[test]
        fn prop_transfer_conserves_units(
            stock in 1i32..=500,
            approved in 1i32..=500,
            received in 0i32..=500,
        ) {
            prop_assume!(approved <= stock);
            let received = received.min(approved);

            let mut source = BranchStock { current: stock, reserved: 0 };
            let mut destination = BranchStock::default();

            source.reserved += approved;
            source.reserved = (source.reserved - received).max(0);
            source.current -= received;
            destination.current += received;

            prop_assert_eq!(source.current + destination.current, stock);
            prop_assert_eq!(source.reserved, approved - received);
            prop_assert!(source.available() >= 0);
        }
    }
}
