//! Network seams consumed by the coordinator
//!
//! Both traits are implemented over JSON-RPC by [`crate::rpc::JsonRpcClient`];
//! tests substitute the scriptable ledger from `test_utils`.

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::rpc::RpcResult;
use crate::types::{Account, ActionRequest, CallEntryPoint, DeployEntryPoint, PendingTx, Receipt};

/// Fee and sequence-number queries
#[async_trait]
pub trait FeeNonceOracle: Send + Sync + std::fmt::Debug {
    /// Recommended fee per unit of computation
    async fn current_fee_per_unit(&self) -> RpcResult<u128>;

    /// Next nonce counting transactions broadcast but not yet mined
    async fn pending_sequence_number(&self, address: Address) -> RpcResult<u64>;

    /// Next nonce counting only mined transactions
    async fn confirmed_sequence_number(&self, address: Address) -> RpcResult<u64>;
}

/// Transaction submission and inclusion tracking
#[async_trait]
pub trait NetworkClient: Send + Sync + std::fmt::Debug {
    /// Broadcast a contract creation
    async fn deploy(
        &self,
        from: &Account,
        target: &DeployEntryPoint,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx>;

    /// Broadcast a state-changing call
    async fn invoke(
        &self,
        from: &Account,
        target: &CallEntryPoint,
        request: &ActionRequest,
    ) -> RpcResult<PendingTx>;

    /// Resolves once the transaction is mined; pends for as long as it is not.
    ///
    /// Callers bound this with a timeout and drop the future to cancel it.
    async fn wait_for_receipt(&self, pending: &PendingTx) -> RpcResult<Receipt>;
}
