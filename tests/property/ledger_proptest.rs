//! Property-based tests for optimistic mutation ordering
//!
//! Mutation `n` speculatively writes `1000 + n`; the server's copy after it is
//! `2000 + n`. Whatever order the responses arrive in, the entity must settle on
//! the server copy of the newest successful mutation, or on the original value when
//! every mutation failed.

use pressroom::client::stores::{OptimisticLedger, Resolution};
use proptest::prelude::*;

const ORIGINAL: u32 = 7;

fn settle_all(outcomes: &[bool], order: &[usize]) -> (u32, usize) {
    let mut ledger: OptimisticLedger<&str, u32> = OptimisticLedger::new();
    let mut value = ORIGINAL;

    let tickets: Vec<_> = (0..outcomes.len())
        .map(|n| {
            let ticket = ledger.begin("post", value);
            value = 1000 + n as u32;
            ticket
        })
        .collect();

    for &n in order {
        let resolution = if outcomes[n] {
            ledger.confirm(&tickets[n], 2000 + n as u32)
        } else {
            ledger.fail(&tickets[n])
        };
        if let Resolution::Apply(settled) = resolution {
            value = settled;
        }
    }
    (value, ledger.pending_count())
}

fn mutations() -> impl Strategy<Value = (Vec<bool>, Vec<usize>)> {
    prop::collection::vec(any::<bool>(), 1..8).prop_flat_map(|outcomes| {
        let order = Just((0..outcomes.len()).collect::<Vec<_>>()).prop_shuffle();
        (Just(outcomes), order)
    })
}

proptest! {
    #[test]
    fn test_newest_success_wins_in_any_order((outcomes, order) in mutations()) {
        let (value, pending) = settle_all(&outcomes, &order);

        let expected = outcomes
            .iter()
            .rposition(|&succeeded| succeeded)
            .map_or(ORIGINAL, |n| 2000 + n as u32);
        prop_assert_eq!(value, expected);
        prop_assert_eq!(pending, 0);
    }

    #[test]
    fn test_all_failures_restore_original(len in 1usize..8, order_seed in any::<u64>()) {
        let outcomes = vec![false; len];
        let mut order: Vec<usize> = (0..len).collect();
        order.rotate_left((order_seed % len as u64) as usize);

        let (value, _) = settle_all(&outcomes, &order);
        prop_assert_eq!(value, ORIGINAL);
    }

    #[test]
    fn test_settling_twice_changes_nothing(outcomes in prop::collection::vec(any::<bool>(), 1..6)) {
        let mut ledger: OptimisticLedger<&str, u32> = OptimisticLedger::new();
        let tickets: Vec<_> = (0..outcomes.len()).map(|_| ledger.begin("post", ORIGINAL)).collect();
        for ticket in &tickets {
            ledger.fail(ticket);
        }
        for ticket in &tickets {
            prop_assert_eq!(ledger.fail(ticket), Resolution::Stale);
        }
        prop_assert!(!ledger.is_pending(&"post"));
    }
}
