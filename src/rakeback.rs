//! Rakeback tier lookup
//!
//! Maps a held balance (scaled by 1e18) onto one of eleven reward tiers.

use std::fmt;

use alloy_primitives::U256;

/// Whole-token thresholds at which tiers 1..=10 begin
pub const RAKEBACK_THRESHOLDS: [u64; 10] = [
    500, 2_500, 5_000, 12_500, 25_000, 50_000, 125_000, 250_000, 500_000, 1_250_000,
];

/// Token decimals the balance is scaled by
const SCALE: u64 = 1_000_000_000_000_000_000;

pub const MAX_TIER: u8 = RAKEBACK_THRESHOLDS.len() as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RakebackTier(u8);

impl RakebackTier {
    pub fn get(self) -> u8 {
        self.0
    }

    /// Scaled balance at which this tier begins; zero for tier 0
    pub fn threshold(self) -> U256 {
        match self.0 {
            0 => U256::ZERO,
            tier => scaled_threshold(usize::from(tier) - 1),
        }
    }
}

impl fmt::Display for RakebackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.0)
    }
}

fn scaled_threshold(index: usize) -> U256 {
    U256::from(RAKEBACK_THRESHOLDS[index]) * U256::from(SCALE)
}

/// Tier for a scaled balance: the highest `i` with `balance >= thresholds[i - 1]`
pub fn tier_for(balance: U256) -> RakebackTier {
    if balance < scaled_threshold(0) {
        return RakebackTier(0);
    }
    (1..=RAKEBACK_THRESHOLDS.len())
        .rev()
        .find(|&tier| balance >= scaled_threshold(tier - 1))
        .map(|tier| RakebackTier(tier as u8))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(whole: u64) -> U256 {
        U256::from(whole) * U256::from(SCALE)
    }

    #[test]
    fn test_below_first_threshold() {
        assert_eq!(tier_for(U256::ZERO).get(), 0);
        assert_eq!(tier_for(tokens(500) - U256::from(1u64)).get(), 0);
    }

    #[test]
    fn test_every_boundary() {
        for (i, threshold) in RAKEBACK_THRESHOLDS.iter().enumerate() {
            let tier = (i + 1) as u8;
            assert_eq!(tier_for(tokens(*threshold)).get(), tier, "at {}", threshold);
            assert_eq!(
                tier_for(tokens(*threshold) - U256::from(1u64)).get(),
                tier - 1,
                "just below {}",
                threshold
            );
        }
    }

    #[test]
    fn test_top_tier_is_open_ended() {
        assert_eq!(tier_for(tokens(1_250_000)).get(), MAX_TIER);
        assert_eq!(tier_for(U256::MAX).get(), MAX_TIER);
        assert_eq!(tier_for(tokens(1_249_999)).get(), 9);
    }

    #[test]
    fn test_threshold_roundtrips_through_tier_for() {
        for tier in 0..=MAX_TIER {
            let t = RakebackTier(tier);
            assert_eq!(tier_for(t.threshold()), t);
        }
        assert_eq!(RakebackTier(3).to_string(), "tier 3");
    }
}
