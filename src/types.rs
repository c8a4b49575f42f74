//! Core types for ledger submissions
//!
//! Actions are an explicit tagged union: a deployment produces a new
//! contract instance, an invocation calls a state-changing entry point on an
//! existing one. Nonce and fee metadata live in [`Overrides`] next to the ABI
//! arguments instead of being mixed into them.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation entry point of a contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployEntryPoint {
    /// Contract name, used for diagnostics only
    pub contract: String,
    /// Creation bytecode; constructor arguments are appended ABI-encoded
    pub bytecode: Bytes,
}

impl DeployEntryPoint {
    pub fn new(contract: impl Into<String>, bytecode: impl Into<Bytes>) -> Self {
        Self {
            contract: contract.into(),
            bytecode: bytecode.into(),
        }
    }
}

/// State-changing function on a deployed contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEntryPoint {
    /// Target contract
    pub contract: Address,
    /// Canonical function signature, e.g. `setPrice(uint256)`
    pub signature: String,
}

impl CallEntryPoint {
    pub fn new(contract: Address, signature: impl Into<String>) -> Self {
        Self {
            contract,
            signature: signature.into(),
        }
    }

    /// First four bytes of the keccak-256 hash of the signature
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }
}

/// Operation handed to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Deploy(DeployEntryPoint),
    Invoke(CallEntryPoint),
}

impl Action {
    /// Short label for logs and metrics
    pub fn label(&self) -> String {
        match self {
            Action::Deploy(target) => format!("deploy:{}", target.contract),
            Action::Invoke(target) => format!("invoke:{}@{}", target.signature, target.contract),
        }
    }
}

/// Submission metadata the coordinator may inject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub nonce: Option<u64>,
    pub fee_per_unit: Option<u128>,
    /// Passed through untouched
    pub gas_limit: Option<u64>,
}

/// ABI-ready arguments plus submission metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRequest {
    pub args: Vec<DynSolValue>,
    pub overrides: Overrides,
}

impl ActionRequest {
    pub fn new(args: Vec<DynSolValue>) -> Self {
        Self {
            args,
            overrides: Overrides::default(),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.overrides.nonce = Some(nonce);
        self
    }

    pub fn with_fee_per_unit(mut self, fee_per_unit: u128) -> Self {
        self.overrides.fee_per_unit = Some(fee_per_unit);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.overrides.gas_limit = Some(gas_limit);
        self
    }

    /// ABI-encode the arguments as a parameter list (no selector)
    pub fn encoded_args(&self) -> Vec<u8> {
        if self.args.is_empty() {
            return Vec::new();
        }
        DynSolValue::Tuple(self.args.clone()).abi_encode_params()
    }
}

/// Signer identity the coordinator submits from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Transaction accepted by the node but not yet mined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingTx {
    pub hash: B256,
}

/// Inclusion receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `false` when execution reverted
    pub status: bool,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
}

/// Newly created contract instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub receipt: Receipt,
}

/// Successful result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Deployed(DeployedContract),
    Confirmed(Receipt),
}

impl SubmissionOutcome {
    pub fn receipt(&self) -> &Receipt {
        match self {
            SubmissionOutcome::Deployed(deployed) => &deployed.receipt,
            SubmissionOutcome::Confirmed(receipt) => receipt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Confirmed,
    TimedOut,
    Rejected,
}

/// One try within a single `submit` call; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    pub nonce: u64,
    pub fee_per_unit: u128,
    pub tx_hash: Option<B256>,
    pub outcome: AttemptOutcome,
    pub submitted_at: DateTime<Utc>,
}
