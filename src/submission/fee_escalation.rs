//! Fee escalation for resubmissions at an unchanged nonce
//!
//! Nodes refuse to replace a pending transaction unless the new fee clears
//! the old one by a margin, so a fresh oracle quote is never allowed to
//! lower the fee.

/// Fee to use when resubmitting after a confirmation timeout.
///
/// Returns `max(fresh, previous + previous * min_bump_percent / 100)`, and at
/// least `previous + 1` when a bump is requested.
pub fn escalate_fee(previous: u128, fresh: u128, min_bump_percent: u32) -> u128 {
    if min_bump_percent == 0 {
        return fresh.max(previous);
    }

    let bump = previous.saturating_mul(u128::from(min_bump_percent)) / 100;
    let floor = previous
        .saturating_add(bump)
        .max(previous.saturating_add(1));
    fresh.max(floor)
}
