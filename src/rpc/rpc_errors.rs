use thiserror::Error;

/// JSON-RPC client errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    /// Transport-level errors (network, connection, HTTP status)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// Request did not complete within the client timeout
    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Error object returned by the node
    #[error("RPC response error: {message} (code: {code})")]
    Response { code: i64, message: String },

    /// Response body could not be interpreted
    #[error("Decode error in {method}: {message}")]
    Decode { method: String, message: String },
}

impl RpcError {
    /// Check if retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport { .. } => true,
            RpcError::Timeout { .. } => true,
            // -32005 is the de-facto "limit exceeded" code; -32603 internal errors
            // are frequently transient on load-balanced providers
            RpcError::Response { code, .. } => matches!(code, -32005 | -32603),
            RpcError::Decode { .. } => false,
        }
    }

    /// Check whether the node reported a nonce conflict
    pub fn is_nonce_conflict(&self) -> bool {
        match self {
            RpcError::Response { message, .. } => {
                let message = message.to_lowercase();
                message.contains("nonce too low")
                    || message.contains("nonce too high")
                    || message.contains("already known")
                    || message.contains("replacement transaction underpriced")
            }
            _ => false,
        }
    }

    /// Build from a reqwest error with endpoint context
    pub fn from_reqwest(err: reqwest::Error, endpoint: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            RpcError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms,
            }
        } else if err.is_decode() {
            RpcError::Decode {
                method: "<response>".to_string(),
                message: err.to_string(),
            }
        } else {
            RpcError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn decode(method: &str, message: impl Into<String>) -> Self {
        RpcError::Decode {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

pub type RpcResult<T> = Result<T, RpcError>;
