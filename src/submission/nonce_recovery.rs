//! Nonce resolution and post-failure recovery
//!
//! Recovery re-derives the nonce from oracle counts instead of holding an
//! exclusive claim on it. Two submissions from the same account that fail
//! concurrently can therefore recover the same nonce; callers sharing an
//! account must serialise their `submit` calls.

use alloy_primitives::Address;
use tracing::debug;

use super::client::FeeNonceOracle;
use crate::rpc::RpcResult;

/// Nonce for a fresh attempt: the pending count, so locally queued but
/// unmined transactions are skipped.
pub async fn resolve_nonce(oracle: &dyn FeeNonceOracle, address: Address) -> RpcResult<u64> {
    let nonce = oracle.pending_sequence_number(address).await?;
    debug!(%address, nonce, "Resolved pending nonce");
    Ok(nonce)
}

/// Nonce after a failed attempt.
///
/// Uses the confirmed count when there is no gap between confirmed and
/// pending, the pending count otherwise.
pub async fn recover_nonce(oracle: &dyn FeeNonceOracle, address: Address) -> RpcResult<u64> {
    let confirmed = oracle.confirmed_sequence_number(address).await?;
    let pending = oracle.pending_sequence_number(address).await?;
    let nonce = select_recovered_nonce(confirmed, pending);
    debug!(%address, confirmed, pending, nonce, "Recovered nonce after failure");
    Ok(nonce)
}

pub fn select_recovered_nonce(confirmed: u64, pending: u64) -> u64 {
    if pending.saturating_sub(confirmed) == 0 {
        confirmed
    } else {
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLedger;

    #[test]
    fn test_no_gap_prefers_confirmed() {
        assert_eq!(select_recovered_nonce(4, 4), 4);
    }

    #[test]
    fn test_gap_prefers_pending() {
        assert_eq!(select_recovered_nonce(4, 6), 6);
    }

    #[test]
    fn test_pending_behind_confirmed_uses_confirmed() {
        // Lagging node reporting a stale pending pool
        assert_eq!(select_recovered_nonce(9, 7), 9);
    }

    #[tokio::test]
    async fn test_resolve_uses_pending_count() {
        let ledger = MockLedger::new();
        ledger.set_sequence_numbers(3, 5);

        let nonce = resolve_nonce(&ledger, Address::ZERO).await.unwrap();
        assert_eq!(nonce, 5);
        assert_eq!(ledger.pending_queries(), 1);
        assert_eq!(ledger.confirmed_queries(), 0);
    }

    #[tokio::test]
    async fn test_recover_queries_both_counts() {
        let ledger = MockLedger::new();
        ledger.set_sequence_numbers(8, 8);

        let nonce = recover_nonce(&ledger, Address::ZERO).await.unwrap();
        assert_eq!(nonce, 8);
        assert_eq!(ledger.pending_queries(), 1);
        assert_eq!(ledger.confirmed_queries(), 1);
    }
}
