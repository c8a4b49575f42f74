//! Observability module for correlation and structured submission events

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID for tracking one `submit` call across its attempts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Structured logger for submission events
#[derive(Debug, Clone)]
pub struct SubmissionLogger {
    correlation_id: CorrelationId,
}

impl SubmissionLogger {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn log_invoke_broadcast(
        &self,
        selector: [u8; 4],
        recipient: Address,
        nonce: u64,
        fee_per_unit: u128,
        tx_hash: B256,
    ) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            selector = %hex::encode(selector),
            recipient = %recipient,
            nonce = nonce,
            fee_per_unit = %fee_per_unit,
            tx_hash = %tx_hash,
            "Invoke broadcast"
        );
    }

    pub fn log_deploy_broadcast(&self, contract: &str, nonce: u64, fee_per_unit: u128, tx_hash: B256) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            contract = %contract,
            nonce = nonce,
            fee_per_unit = %fee_per_unit,
            tx_hash = %tx_hash,
            "Deploy broadcast"
        );
    }

    pub fn log_fee_escalation(&self, nonce: u64, previous_fee: u128, next_fee: u128) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            nonce = nonce,
            previous_fee = %previous_fee,
            next_fee = %next_fee,
            "Confirmation timed out, resubmitting with higher fee"
        );
    }

    pub fn log_attempt_failure(&self, attempt: u32, max_attempts: u32, error: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            attempt = attempt,
            max_attempts = max_attempts,
            error = %error,
            "Submission attempt failed"
        );
    }

    pub fn log_confirmed(&self, tx_hash: B256, block_number: u64, broadcasts: usize) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            tx_hash = %tx_hash,
            block_number = block_number,
            broadcasts = broadcasts,
            "Transaction confirmed"
        );
    }

    pub fn log_exhausted(&self, attempts: u32, error: &str) {
        tracing::error!(
            correlation_id = %self.correlation_id,
            attempts = attempts,
            error = %error,
            "Submission exhausted"
        );
    }
}
