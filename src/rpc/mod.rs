//! RPC Module
//!
//! JSON-RPC transport to the ledger node and its error taxonomy.

pub mod json_rpc;
pub mod rpc_errors;

// Re-exports for convenience
pub use json_rpc::JsonRpcClient;
pub use rpc_errors::{RpcError, RpcResult};
