//! Property tests for rakeback tier lookup

use alloy_primitives::U256;
use ledger_submit::rakeback::{tier_for, RAKEBACK_THRESHOLDS};
use proptest::prelude::*;

const SCALE: u128 = 1_000_000_000_000_000_000;

fn balance(raw: u128) -> U256 {
    U256::from(raw)
}

#[test]
fn test_documented_examples() {
    assert_eq!(tier_for(U256::ZERO).get(), 0);
    assert_eq!(tier_for(balance(500 * SCALE)).get(), 1);
    assert_eq!(tier_for(balance(1_249_999 * SCALE)).get(), 9);
    assert_eq!(tier_for(balance(1_250_000 * SCALE)).get(), 10);
}

proptest! {
    #[test]
    fn prop_tier_is_monotonic(a in any::<u128>(), b in any::<u128>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(tier_for(balance(lo)) <= tier_for(balance(hi)));
    }

    #[test]
    fn prop_tier_brackets_balance(raw in 0u128..2_000_000 * SCALE) {
        let tier = tier_for(balance(raw));
        prop_assert!(tier.get() <= 10);
        prop_assert!(balance(raw) >= tier.threshold());

        let next = tier.get() as usize;
        if next < RAKEBACK_THRESHOLDS.len() {
            let next_threshold = U256::from(RAKEBACK_THRESHOLDS[next]) * U256::from(SCALE);
            prop_assert!(balance(raw) < next_threshold);
        }
    }
}
