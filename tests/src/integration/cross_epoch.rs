//! # Retargeting Across Branches
//!
//! Regtest epochs are eight blocks with a 4800 second target timespan.
//!
//! ```text
//!              epoch 0          │ epoch 1                │ epoch 2
//! G ─ 1 ─ 2 ─ 3 ─ 4 ─ A5 ─ A6 ─ A7 │ A8 ─ .. ─ A15          │ A16 ─ .. ─ A20
//!                   └─ B5 ─ B6 ─ B7 │ B8 ─ B9 ─ B10
//! ```
//!
//! Branch A spaces its blocks far apart and keeps the minimum target.
//! Branch B mines epoch 0 in seconds, so its epoch 1 target is a quarter
//! of A's and each B block carries four times the work. The relay must
//! compute each branch's schedule from its own ancestry and carry the
//! completed-epoch accumulator of whichever branch is canonical.

#[cfg(test)]
mod tests {
    use primitive_types::U256;
    use spv_header_relay::{bits_to_target, work, Hash, HeadUpdate, HeaderRelayApi};

    use crate::fixtures::{bootstrap, extend, grow, relay, TestRelay, EASY_BITS, GENESIS_TIME};

    const A: u8 = 0xA0;
    const B: u8 = 0xB0;
    const A_SPACING: u32 = 1_700;

    struct Branches {
        /// `shared[h]` is the block at height `h`, for `h` in `0..=4`
        shared: Vec<Hash>,
        /// `a[h - 5]` is A's block at height `h`, for `h` in `5..=16`
        a: Vec<Hash>,
    }

    fn a_time(height: u32) -> u32 {
        GENESIS_TIME + 4 + (height - 4) * A_SPACING
    }

    fn build_a(relay: &TestRelay) -> Branches {
        let genesis = bootstrap(relay);
        let mut shared = vec![genesis];
        shared.extend(grow(relay, &genesis, 0x11, (1..=4).map(|i| GENESIS_TIME + i)));
        let a = grow(relay, &shared[4], A, (5..=16).map(a_time));
        Branches { shared, a }
    }

    fn a_at(branches: &Branches, height: usize) -> Hash {
        branches.a[height - 5]
    }

    fn unit() -> U256 {
        work(bits_to_target(EASY_BITS))
    }

    #[test]
    fn test_slow_branch_keeps_minimum_target() {
        let relay = relay();
        let branches = build_a(&relay);

        assert_eq!(relay.mainchain_height().unwrap(), 16);
        assert_eq!(relay.next_required_bits(&a_at(&branches, 7)).unwrap(), EASY_BITS);
        assert_eq!(relay.next_required_bits(&a_at(&branches, 15)).unwrap(), EASY_BITS);
        assert_eq!(relay.chain_work(&a_at(&branches, 16)).unwrap(), unit() * U256::from(17));

        // Head A16 opens epoch 2; heights 0..=15 are completed work
        assert_eq!(
            relay.last_epoch_cumulative_work().unwrap(),
            relay.chain_work(&a_at(&branches, 15)).unwrap()
        );
    }

    #[test]
    fn test_fast_branch_gets_harder_target() {
        let relay = relay();
        let branches = build_a(&relay);
        let b = grow(&relay, &branches.shared[4], B, (5..=7).map(|i| GENESIS_TIME + i));

        // Timespan 7s clamps to a quarter of 4800s
        let b_bits = relay.next_required_bits(&b[2]).unwrap();
        assert!(bits_to_target(b_bits) < bits_to_target(EASY_BITS));
        assert_eq!(b_bits, 0x201fffff);
        assert_eq!(work(bits_to_target(b_bits)), unit() * U256::from(4));

        // The same height on A still requires the minimum target
        assert_eq!(relay.next_required_bits(&a_at(&branches, 7)).unwrap(), EASY_BITS);
    }

    #[test]
    fn test_reorg_across_epochs_swaps_accumulator() {
        let relay = relay();
        let branches = build_a(&relay);

        let a_accumulator = relay.last_epoch_cumulative_work().unwrap();
        let a16_work = relay.chain_work(&a_at(&branches, 16)).unwrap();

        let b = grow(&relay, &branches.shared[4], B, (5..=7).map(|i| GENESIS_TIME + i));
        let b8 = extend(&relay, &b[2], B, GENESIS_TIME + 8).unwrap();
        let b9 = extend(&relay, &b8.hash, B, GENESIS_TIME + 9).unwrap();
        assert_eq!(b8.head_update, HeadUpdate::Unchanged);
        assert_eq!(b9.head_update, HeadUpdate::Unchanged);
        assert!(relay.chain_work(&b9.hash).unwrap() < a16_work);

        let b10 = extend(&relay, &b9.hash, B, GENESIS_TIME + 10).unwrap();
        assert!(relay.chain_work(&b10.hash).unwrap() > a16_work);
        assert_eq!(
            b10.head_update,
            HeadUpdate::Reorganized {
                common_ancestor_height: 4,
                depth: 12,
            }
        );

        // B10 sits in epoch 1; completed work is B's epoch 0
        let b_accumulator = relay.last_epoch_cumulative_work().unwrap();
        assert_eq!(b_accumulator, relay.chain_work(&b[2]).unwrap());
        assert_ne!(b_accumulator, a_accumulator);

        assert_eq!(relay.mainchain_height().unwrap(), 10);
        assert_eq!(relay.hash_at_height(8).unwrap(), Some(b8.hash));
        for height in 11..=16 {
            assert_eq!(relay.hash_at_height(height).unwrap(), None);
        }
        assert_eq!(
            relay.chain_work(&b10.hash).unwrap(),
            relay.chain_work(&b[2]).unwrap() + unit() * U256::from(12)
        );
    }

    #[test]
    fn test_reorg_back_restores_accumulator() {
        let relay = relay();
        let branches = build_a(&relay);
        let a_accumulator = relay.last_epoch_cumulative_work().unwrap();

        let b = grow(&relay, &branches.shared[4], B, (5..=10).map(|i| GENESIS_TIME + i));
        let b10_work = relay.chain_work(&b[5]).unwrap();
        assert_eq!(relay.mainchain_head().unwrap(), b[5]);

        let a_ext = grow(&relay, &a_at(&branches, 16), A, (17..=19).map(a_time));
        assert_eq!(relay.mainchain_head().unwrap(), b[5]);
        assert_eq!(relay.chain_work(&a_ext[2]).unwrap(), b10_work);

        let a20 = extend(&relay, &a_ext[2], A, a_time(20)).unwrap();
        assert_eq!(
            a20.head_update,
            HeadUpdate::Reorganized {
                common_ancestor_height: 4,
                depth: 6,
            }
        );
        assert_eq!(relay.last_epoch_cumulative_work().unwrap(), a_accumulator);
        for height in 5..=16 {
            assert_eq!(relay.hash_at_height(height as u64).unwrap(), Some(a_at(&branches, height)));
        }
        assert_eq!(relay.hash_at_height(20).unwrap(), Some(a20.hash));
    }
}
