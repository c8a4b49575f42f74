use alloy_primitives::B256;
use thiserror::Error;

use crate::rpc::RpcError;

/// Errors raised while driving a submission
///
/// Only [`SubmissionError::Exhausted`] ever leaves `Coordinator::submit`; the
/// other variants are recovered internally and kept as the `last_error` of an
/// exhausted sequence.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmissionError {
    /// Node rejected or dropped the submission, or an oracle query failed
    #[error("Transient network failure: {message}")]
    TransientNetworkFailure { message: String },

    /// Transaction was mined but execution failed
    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },

    /// Deployment mined without creating a contract
    #[error("Deployment {tx_hash} produced no contract address")]
    MissingContractAddress { tx_hash: B256 },

    /// No inclusion within the confirmation window; drives fee escalation
    #[error("Confirmation timeout after {waited_secs}s (nonce {nonce}, fee {fee_per_unit})")]
    ConfirmationTimeout {
        nonce: u64,
        fee_per_unit: u128,
        waited_secs: u64,
    },

    /// Every outer attempt failed
    #[error("Submission exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl SubmissionError {
    /// Check if the outer retry loop may recover from this error
    pub fn is_transient(&self) -> bool {
        match self {
            SubmissionError::TransientNetworkFailure { .. } => true,
            SubmissionError::Reverted { .. } => true,
            SubmissionError::MissingContractAddress { .. } => true,
            SubmissionError::ConfirmationTimeout { .. } => true,
            SubmissionError::Exhausted { .. } => false,
        }
    }

    /// Error category for metrics labels
    pub fn category(&self) -> &'static str {
        match self {
            SubmissionError::TransientNetworkFailure { .. } => "network",
            SubmissionError::Reverted { .. } => "reverted",
            SubmissionError::MissingContractAddress { .. } => "deploy",
            SubmissionError::ConfirmationTimeout { .. } => "timeout",
            SubmissionError::Exhausted { .. } => "exhausted",
        }
    }

    pub fn exhausted(attempts: u32, last_error: &SubmissionError) -> Self {
        SubmissionError::Exhausted {
            attempts,
            last_error: last_error.to_string(),
        }
    }
}

impl From<RpcError> for SubmissionError {
    fn from(err: RpcError) -> Self {
        SubmissionError::TransientNetworkFailure {
            message: err.to_string(),
        }
    }
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;
