//! Ledger Submit Library
//!
//! Resilient transaction submission to an EVM JSON-RPC node, fixed-layout
//! report encoding and rakeback tier lookup.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod observability;
pub mod rakeback;
pub mod report;
pub mod rpc;
pub mod submission;
pub mod types;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use rakeback::{tier_for, RakebackTier};
pub use report::{encode_report, FeedId, Report, ReportError, ReportLayout};
pub use rpc::{JsonRpcClient, RpcError};
pub use submission::{Coordinator, FeeNonceOracle, NetworkClient, SubmissionError};
pub use types::{
    Account, Action, ActionRequest, CallEntryPoint, DeployEntryPoint, Receipt, SubmissionOutcome,
};
