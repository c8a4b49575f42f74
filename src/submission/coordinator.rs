//! Resilient transaction submission
//!
//! `submit` runs a bounded outer loop over submission failures and, for
//! invocations, an unbounded inner loop over confirmation timeouts:
//!
//! - outer: nonce resolution, fee injection, one deploy or invoke sequence;
//!   on error a fixed cool-down, nonce recovery, next attempt
//! - inner (invoke only): broadcast, race the receipt against the
//!   confirmation timeout, resubmit at the same nonce with an escalated fee
//!
//! Deployments are broadcast once per outer attempt and awaited without a
//! timeout.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn, Instrument};

use super::client::{FeeNonceOracle, NetworkClient};
use super::fee_escalation::escalate_fee;
use super::nonce_recovery::{recover_nonce, resolve_nonce};
use super::submission_errors::{SubmissionError, SubmissionResult};
use crate::config::{Config, SubmissionConfig};
use crate::metrics::{metrics, Timer};
use crate::observability::{CorrelationId, SubmissionLogger};
use crate::rpc::JsonRpcClient;
use crate::types::{
    Account, Action, ActionRequest, AttemptOutcome, CallEntryPoint, DeployEntryPoint,
    DeployedContract, PendingTx, SubmissionAttempt, SubmissionOutcome,
};

/// Submits actions from a single account
#[derive(Debug, Clone)]
pub struct Coordinator {
    account: Account,
    network: Arc<dyn NetworkClient>,
    oracle: Arc<dyn FeeNonceOracle>,
    config: SubmissionConfig,
}

/// Per-call attempt trail, dropped when `submit` returns
#[derive(Debug, Default)]
struct AttemptLog {
    entries: Vec<SubmissionAttempt>,
}

impl AttemptLog {
    fn record(&mut self, nonce: u64, fee_per_unit: u128, pending: Option<&PendingTx>, outcome: AttemptOutcome) {
        self.entries.push(SubmissionAttempt {
            nonce,
            fee_per_unit,
            tx_hash: pending.map(|p| p.hash),
            outcome,
            submitted_at: Utc::now(),
        });
    }

    fn broadcasts(&self) -> usize {
        self.entries.iter().filter(|a| a.tx_hash.is_some()).count()
    }
}

impl Coordinator {
    pub fn new(
        account: Account,
        network: Arc<dyn NetworkClient>,
        oracle: Arc<dyn FeeNonceOracle>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            account,
            network,
            oracle,
            config,
        }
    }

    /// Coordinator over a JSON-RPC node.
    ///
    /// Uses the configured account, or the first account the node manages.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let client = Arc::new(JsonRpcClient::from_config(&config.rpc)?);
        let account = match config.account.parsed_address()? {
            Some(address) => Account::new(address),
            None => client.default_account().await?,
        };
        tracing::info!(rpc = %client.url(), account = %account, "Coordinator connected");

        Ok(Self::new(account, client.clone(), client, config.submission.clone()))
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Submit `action` and wait until it is mined.
    ///
    /// Timeouts and up to `max_attempts - 1` submission failures are handled
    /// internally; the only error returned is [`SubmissionError::Exhausted`].
    pub async fn submit(
        &self,
        action: &Action,
        request: ActionRequest,
    ) -> SubmissionResult<SubmissionOutcome> {
        let logger = SubmissionLogger::new(CorrelationId::new());
        let span = tracing::info_span!(
            "submission",
            correlation_id = %logger.correlation_id(),
            action = %action.label(),
            from = %self.account.address,
        );
        self.run(action, request, &logger).instrument(span).await
    }

    async fn run(
        &self,
        action: &Action,
        mut request: ActionRequest,
        logger: &SubmissionLogger,
    ) -> SubmissionResult<SubmissionOutcome> {
        let m = metrics();
        m.submissions_total.inc();

        let max_attempts = self.config.max_attempts.max(1);
        // A caller-supplied nonce counts as already resolved
        let mut nonce = request.overrides.nonce;
        let mut log = AttemptLog::default();
        let mut attempts_made = 0;
        let mut last_error = SubmissionError::TransientNetworkFailure {
            message: "no attempt made".to_string(),
        };

        for attempt in 1..=max_attempts {
            attempts_made = attempt;
            let result = self
                .attempt(action, &mut request, &mut nonce, attempt, &mut log, logger)
                .await;

            match result {
                Ok(outcome) => {
                    m.submissions_confirmed.inc();
                    logger.log_confirmed(
                        outcome.receipt().transaction_hash,
                        outcome.receipt().block_number,
                        log.broadcasts(),
                    );
                    return Ok(outcome);
                }
                Err(err) => {
                    logger.log_attempt_failure(attempt, max_attempts, &err.to_string());
                    m.record_failure(err.category());

                    if !err.is_transient() {
                        warn!(error = %err, "Permanent submission error, not retrying");
                        last_error = err;
                        break;
                    }
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.failure_cooldown()).await;
                        nonce = match recover_nonce(self.oracle.as_ref(), self.account.address).await {
                            Ok(recovered) => Some(recovered),
                            Err(recovery_err) => {
                                warn!(error = %recovery_err, "Nonce recovery failed, will re-query pending nonce");
                                None
                            }
                        };
                    }
                    last_error = err;
                }
            }
        }

        debug!(attempts = ?log.entries, "Attempt trail");
        m.submissions_exhausted.inc();
        let exhausted = SubmissionError::exhausted(attempts_made, &last_error);
        logger.log_exhausted(attempts_made, &last_error.to_string());
        Err(exhausted)
    }

    /// One outer attempt: prepare nonce and fee, then run the action
    async fn attempt(
        &self,
        action: &Action,
        request: &mut ActionRequest,
        nonce: &mut Option<u64>,
        attempt: u32,
        log: &mut AttemptLog,
        logger: &SubmissionLogger,
    ) -> SubmissionResult<SubmissionOutcome> {
        let resolved = match *nonce {
            Some(n) => n,
            None => {
                let n = resolve_nonce(self.oracle.as_ref(), self.account.address).await?;
                *nonce = Some(n);
                n
            }
        };
        request.overrides.nonce = Some(resolved);

        let fee = match request.overrides.fee_per_unit {
            None => self.oracle.current_fee_per_unit().await?,
            // Caller-supplied fee on the first attempt
            Some(existing) if attempt == 1 => existing,
            Some(existing) => self.oracle.current_fee_per_unit().await?.max(existing),
        };
        request.overrides.fee_per_unit = Some(fee);

        match action {
            Action::Deploy(target) => self.deploy_once(target, request, log, logger).await,
            Action::Invoke(target) => self.invoke_until_mined(target, request, log, logger).await,
        }
    }

    async fn deploy_once(
        &self,
        target: &DeployEntryPoint,
        request: &ActionRequest,
        log: &mut AttemptLog,
        logger: &SubmissionLogger,
    ) -> SubmissionResult<SubmissionOutcome> {
        let (nonce, fee) = current_overrides(request);

        let pending = match self.network.deploy(&self.account, target, request).await {
            Ok(pending) => pending,
            Err(err) => {
                log.record(nonce, fee, None, AttemptOutcome::Rejected);
                return Err(err.into());
            }
        };
        metrics().broadcasts_total.inc();
        logger.log_deploy_broadcast(&target.contract, nonce, fee, pending.hash);

        let timer = Timer::new();
        let receipt = match self.network.wait_for_receipt(&pending).await {
            Ok(receipt) => receipt,
            Err(err) => {
                log.record(nonce, fee, Some(&pending), AttemptOutcome::Rejected);
                return Err(err.into());
            }
        };
        timer.observe_duration(&metrics().confirmation_latency);

        if !receipt.status {
            log.record(nonce, fee, Some(&pending), AttemptOutcome::Rejected);
            return Err(SubmissionError::Reverted {
                tx_hash: receipt.transaction_hash,
            });
        }
        let Some(address) = receipt.contract_address else {
            log.record(nonce, fee, Some(&pending), AttemptOutcome::Rejected);
            return Err(SubmissionError::MissingContractAddress {
                tx_hash: receipt.transaction_hash,
            });
        };

        log.record(nonce, fee, Some(&pending), AttemptOutcome::Confirmed);
        Ok(SubmissionOutcome::Deployed(DeployedContract { address, receipt }))
    }

    async fn invoke_until_mined(
        &self,
        target: &CallEntryPoint,
        request: &mut ActionRequest,
        log: &mut AttemptLog,
        logger: &SubmissionLogger,
    ) -> SubmissionResult<SubmissionOutcome> {
        let confirmation_timeout = self.config.confirmation_timeout();
        let selector = target.selector();
        let timer = Timer::new();

        loop {
            let (nonce, fee) = current_overrides(request);
            debug!(
                selector = %hex::encode(selector),
                recipient = %target.contract,
                nonce,
                fee_per_unit = %fee,
                "Broadcasting invoke"
            );

            let pending = match self.network.invoke(&self.account, target, request).await {
                Ok(pending) => pending,
                Err(err) => {
                    log.record(nonce, fee, None, AttemptOutcome::Rejected);
                    return Err(err.into());
                }
            };
            metrics().broadcasts_total.inc();
            logger.log_invoke_broadcast(selector, target.contract, nonce, fee, pending.hash);

            // Dropping the wait on timeout cancels it
            match timeout(confirmation_timeout, self.network.wait_for_receipt(&pending)).await {
                Ok(Ok(receipt)) => {
                    if !receipt.status {
                        log.record(nonce, fee, Some(&pending), AttemptOutcome::Rejected);
                        return Err(SubmissionError::Reverted {
                            tx_hash: receipt.transaction_hash,
                        });
                    }
                    log.record(nonce, fee, Some(&pending), AttemptOutcome::Confirmed);
                    timer.observe_duration(&metrics().confirmation_latency);
                    return Ok(SubmissionOutcome::Confirmed(receipt));
                }
                Ok(Err(err)) => {
                    log.record(nonce, fee, Some(&pending), AttemptOutcome::Rejected);
                    return Err(err.into());
                }
                Err(_elapsed) => {
                    log.record(nonce, fee, Some(&pending), AttemptOutcome::TimedOut);
                    let timed_out = SubmissionError::ConfirmationTimeout {
                        nonce,
                        fee_per_unit: fee,
                        waited_secs: confirmation_timeout.as_secs(),
                    };
                    debug!(error = %timed_out, tx_hash = %pending.hash, "Escalating");

                    let fresh = self.oracle.current_fee_per_unit().await?;
                    let next = escalate_fee(fee, fresh, self.config.min_fee_bump_percent);
                    logger.log_fee_escalation(nonce, fee, next);
                    metrics().fee_escalations.inc();
                    request.overrides.fee_per_unit = Some(next);
                }
            }
        }
    }
}

fn current_overrides(request: &ActionRequest) -> (u64, u128) {
    (
        request.overrides.nonce.unwrap_or_default(),
        request.overrides.fee_per_unit.unwrap_or_default(),
    )
}
