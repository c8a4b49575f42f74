//! Test Utilities Module
//!
//! A scriptable in-memory ledger implementing both network seams, used to
//! drive the coordinator deterministically. Confirmation delays are real
//! tokio sleeps, so tests should run with paused time.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::rpc::{RpcError, RpcResult};
use crate::submission::{FeeNonceOracle, NetworkClient};
use crate::types::{Account, ActionRequest, CallEntryPoint, DeployEntryPoint, PendingTx, Receipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastKind {
    Deploy,
    Invoke,
}

/// A transaction the ledger accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBroadcast {
    pub kind: BroadcastKind,
    pub from: Address,
    pub nonce: Option<u64>,
    pub fee_per_unit: Option<u128>,
    pub hash: B256,
}

/// How a broadcast resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Mined successfully after the delay
    After(Duration),
    /// Mined with failed status after the delay
    RevertAfter(Duration),
    /// Never mined
    Never,
}

#[derive(Debug)]
struct LedgerState {
    confirmed: u64,
    pending: u64,
    fee_quotes: VecDeque<u128>,
    last_fee: u128,
    submit_failures: VecDeque<RpcError>,
    failures_at: HashMap<usize, RpcError>,
    oracle_failures: usize,
    inclusions: VecDeque<Inclusion>,
    scheduled: HashMap<B256, Inclusion>,
    broadcasts: Vec<RecordedBroadcast>,
    submit_calls: usize,
    pending_queries: usize,
    confirmed_queries: usize,
    fee_queries: usize,
}

/// Mock ledger for coordinator tests
#[derive(Debug)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    /// Ledger that accepts everything and mines immediately
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                confirmed: 0,
                pending: 0,
                fee_quotes: VecDeque::new(),
                last_fee: 1_000_000_000,
                submit_failures: VecDeque::new(),
                failures_at: HashMap::new(),
                oracle_failures: 0,
                inclusions: VecDeque::new(),
                scheduled: HashMap::new(),
                broadcasts: Vec::new(),
                submit_calls: 0,
                pending_queries: 0,
                confirmed_queries: 0,
                fee_queries: 0,
            }),
        }
    }

    pub fn set_sequence_numbers(&self, confirmed: u64, pending: u64) {
        let mut state = self.state.lock();
        state.confirmed = confirmed;
        state.pending = pending;
    }

    /// Fee quotes returned in order; the last one repeats once drained
    pub fn push_fee_quotes(&self, quotes: impl IntoIterator<Item = u128>) {
        self.state.lock().fee_quotes.extend(quotes);
    }

    /// Next broadcasts fail with these errors, in order
    pub fn fail_next_submissions(&self, errors: impl IntoIterator<Item = RpcError>) {
        self.state.lock().submit_failures.extend(errors);
    }

    /// The `call`-th deploy or invoke (1-based) fails with `err`
    pub fn fail_submission_at(&self, call: usize, err: RpcError) {
        self.state.lock().failures_at.insert(call, err);
    }

    /// Next `count` oracle queries of any kind fail
    pub fn fail_next_oracle_queries(&self, count: usize) {
        self.state.lock().oracle_failures = count;
    }

    /// Inclusion behaviour of the next accepted broadcasts, in order;
    /// immediate success once drained
    pub fn push_inclusions(&self, inclusions: impl IntoIterator<Item = Inclusion>) {
        self.state.lock().inclusions.extend(inclusions);
    }

    pub fn broadcasts(&self) -> Vec<RecordedBroadcast> {
        self.state.lock().broadcasts.clone()
    }

    /// Deploy and invoke calls, including rejected ones
    pub fn submit_calls(&self) -> usize {
        self.state.lock().submit_calls
    }

    pub fn pending_queries(&self) -> usize {
        self.state.lock().pending_queries
    }

    pub fn confirmed_queries(&self) -> usize {
        self.state.lock().confirmed_queries
    }

    pub fn fee_queries(&self) -> usize {
        self.state.lock().fee_queries
    }

    /// Address a deployment with this hash creates
    pub fn contract_address_for(hash: B256) -> Address {
        Address::from_word(hash)
    }

    fn take_oracle_failure(state: &mut LedgerState, method: &str) -> RpcResult<()> {
        if state.oracle_failures > 0 {
            state.oracle_failures -= 1;
            return Err(RpcError::Transport {
                endpoint: "mock".to_string(),
                message: format!("{} unavailable", method),
            });
        }
        Ok(())
    }

    fn broadcast(&self, kind: BroadcastKind, from: &Account, request: &ActionRequest) -> RpcResult<PendingTx> {
        let mut state = self.state.lock();
        state.submit_calls += 1;
        if let Some(err) = state.submit_failures.pop_front() {
            return Err(err);
        }
        let call = state.submit_calls;
        if let Some(err) = state.failures_at.remove(&call) {
            return Err(err);
        }

        let hash = B256::from(U256::from(state.submit_calls));
        let inclusion = state
            .inclusions
            .pop_front()
            .unwrap_or(Inclusion::After(Duration::ZERO));
        state.scheduled.insert(hash, inclusion);
        state.broadcasts.push(RecordedBroadcast {
            kind,
            from: from.address,
            nonce: request.overrides.nonce,
            fee_per_unit: request.overrides.fee_per_unit,
            hash,
        });
        Ok(PendingTx { hash })
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeeNonceOracle for MockLedger {
    async fn current_fee_per_unit(&self) -> RpcResult<u128> {
        let mut state = self.state.lock();
        state.fee_queries += 1;
        Self::take_oracle_failure(&mut state, "eth_gasPrice")?;
        if let Some(quote) = state.fee_quotes.pop_front() {
            state.last_fee = quote;
        }
        Ok(state.last_fee)
    }

    async fn pending_sequence_number(&self, _address: Address) -> RpcResult<u64> {
        let mut state = self.state.lock();
        state.pending_queries += 1;
        Self::take_oracle_failure(&mut state, "eth_getTransactionCount")?;
        Ok(state.pending)
    }

    async fn confirmed_sequence_number(&self, _address: Address) -> RpcResult<u64> {
        let mut state = self.state.lock();
        state.confirmed_queries += 1;
        Self::take_oracle_failure(&mut state, "eth_getTransactionCount")?;
        Ok(state.confirmed)
    }
}

#[async_trait]
impl NetworkClient for MockLedger {
    async fn deploy(
        &self,
        from: &Account,
        _target: &DeployEntryPoint,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx> {
        self.broadcast(BroadcastKind::Deploy, from, request)
    }

    async fn invoke(
        &self,
        from: &Account,
        _target: &CallEntryPoint,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx> {
        self.broadcast(BroadcastKind::Invoke, from, request)
    }

    async fn wait_for_receipt(&self, pending: &PendingTx) -> RpcResult<Receipt> {
        let (inclusion, kind) = {
            let state = self.state.lock();
            let inclusion = state
                .scheduled
                .get(&pending.hash)
                .copied()
                .unwrap_or(Inclusion::Never);
            let kind = state
                .broadcasts
                .iter()
                .find(|b| b.hash == pending.hash)
                .map(|b| b.kind);
            (inclusion, kind)
        };

        let (delay, status) = match inclusion {
            Inclusion::After(delay) => (delay, true),
            Inclusion::RevertAfter(delay) => (delay, false),
            Inclusion::Never => return std::future::pending().await,
        };
        tokio::time::sleep(delay).await;

        let contract_address = match (kind, status) {
            (Some(BroadcastKind::Deploy), true) => Some(Self::contract_address_for(pending.hash)),
            _ => None,
        };

        Ok(Receipt {
            transaction_hash: pending.hash,
            block_number: 1,
            status,
            contract_address,
            gas_used: 21_000,
        })
    }
}
