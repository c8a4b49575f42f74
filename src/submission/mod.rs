//! Submission Module
//!
//! Nonce handling, fee escalation and the retrying coordinator.

pub mod client;
pub mod coordinator;
pub mod fee_escalation;
pub mod nonce_recovery;
pub mod submission_errors;

// Re-exports for convenience
pub use client::{FeeNonceOracle, NetworkClient};
pub use coordinator::Coordinator;
pub use fee_escalation::escalate_fee;
pub use nonce_recovery::{recover_nonce, resolve_nonce, select_recovered_nonce};
pub use submission_errors::{SubmissionError, SubmissionResult};
