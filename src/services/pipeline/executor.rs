// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::{ErrorKind, PipelineError};
use crate::network::chain::{CallRequest, ChainClient, ChainError};
use crate::network::gas::{GasPolicy, GasQuote};
use crate::services::pipeline::call::PreparedCall;
use crate::services::pipeline::gate::SignatureGate;
use crate::services::pipeline::state::{PipelineEvent, PipelineState, StateTracker};
use alloy::primitives::{Address, B256};
use dashmap::DashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub gas: GasQuote,
    pub summary: Option<String>,
    /// Every state the submission passed through, ending in `Idle`.
    pub states: Vec<PipelineState>,
}

/// Marks an account busy until dropped.
struct InFlightGuard {
    set: Arc<DashSet<Address>>,
    account: Address,
}

impl InFlightGuard {
    fn acquire(set: &Arc<DashSet<Address>>, account: Address) -> Option<Self> {
        set.insert(account).then(|| Self {
            set: Arc::clone(set),
            account,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.account);
    }
}

/// estimate -> margin -> simulate -> sign -> broadcast -> confirm.
///
/// Not reentrant per account: a second `submit` for an account with a
/// submission in flight fails with `Busy` instead of interleaving nonces.
#[derive(Clone)]
pub struct TxPipeline {
    chain: Arc<dyn ChainClient>,
    gate: Arc<dyn SignatureGate>,
    gas: GasPolicy,
    in_flight: Arc<DashSet<Address>>,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl TxPipeline {
    pub fn new(chain: Arc<dyn ChainClient>, gate: Arc<dyn SignatureGate>, gas: GasPolicy) -> Self {
        Self {
            chain,
            gate,
            gas,
            in_flight: Arc::new(DashSet::new()),
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn gas_policy(&self) -> GasPolicy {
        self.gas
    }

    pub fn is_busy(&self, account: Address) -> bool {
        self.in_flight.contains(&account)
    }

    pub async fn submit(
        &self,
        account: Address,
        call: PreparedCall,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, account) else {
            let err = PipelineError::new(
                ErrorKind::Busy,
                format!("a submission for {account:#x} is already in flight"),
            )
            .with_call(call.name, call.args_digest());
            tracing::warn!(target: "pipeline", error = %err, "Rejected concurrent submission");
            return Err(err);
        };

        tracing::info!(
            target: "pipeline",
            call = call.name,
            to = %call.to,
            args = %call.args_digest(),
            "Starting submission"
        );

        let mut tracker = StateTracker::new(self.events.clone());
        let result = match self.drive(&mut tracker, account, &call, cancel).await {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                let err = err.with_call(call.name, call.args_digest());
                tracker.advance(PipelineState::Failed);
                tracker.emit(PipelineEvent::Failed {
                    kind: err.kind,
                    message: err.user_message(),
                });
                tracing::warn!(target: "pipeline", error = %err, "Submission failed");
                Err(err)
            }
        };
        tracker.advance(PipelineState::Idle);

        result.map(|mut receipt| {
            receipt.states = tracker.history().to_vec();
            receipt
        })
    }

    async fn drive(
        &self,
        tracker: &mut StateTracker,
        account: Address,
        call: &PreparedCall,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let mut req = CallRequest {
            from: account,
            to: call.to,
            input: call.input.clone(),
            value: call.value,
            gas_price: self.gas.gas_price(),
            gas_limit: None,
        };

        tracker.advance(PipelineState::Estimating);
        let estimated = until_cancelled(cancel, self.chain.estimate_gas(&req))
            .await?
            .map_err(|e| chain_failure(e, ErrorKind::EstimationReverted))?;
        let gas = self.gas.quote(estimated);
        req.gas_limit = Some(gas.gas_limit);
        tracker.emit(PipelineEvent::GasQuoted {
            estimated,
            gas_limit: gas.gas_limit,
        });
        tracing::debug!(target: "pipeline", estimated, gas_limit = gas.gas_limit, "Gas quoted");

        tracker.advance(PipelineState::Simulating);
        until_cancelled(cancel, self.chain.simulate(&req))
            .await?
            .map_err(|e| chain_failure(e, ErrorKind::SimulationReverted))?;

        tracker.advance(PipelineState::AwaitingSignature);
        let approved = until_cancelled(cancel, self.gate.approve(call, &gas)).await?;
        if !approved {
            return Err(PipelineError::new(
                ErrorKind::UserRejected,
                "signature declined",
            ));
        }

        // Past this point the transaction may be on the wire; no more cancellation.
        let hash = self
            .chain
            .broadcast(&req)
            .await
            .map_err(|e| chain_failure(e, ErrorKind::ExecutionReverted))?;
        tracker.advance(PipelineState::Submitted);
        tracker.emit(PipelineEvent::Broadcast { hash });
        tracing::info!(target: "pipeline", hash = %format!("{hash:#x}"), "Transaction broadcast");

        let mined = self.chain.wait_for_receipt(hash).await.map_err(|e| match e {
            ChainError::Network(msg) => PipelineError::new(
                ErrorKind::NetworkFailure,
                format!("{hash:#x} broadcast but not confirmed: {msg}"),
            ),
            ChainError::Reverted(reason) => PipelineError::new(ErrorKind::ExecutionReverted, reason),
        })?;
        if !mined.success {
            return Err(PipelineError::new(
                ErrorKind::ExecutionReverted,
                format!("{hash:#x} reverted on-chain (state changed after simulation)"),
            ));
        }

        tracker.advance(PipelineState::Confirmed);
        tracing::info!(
            target: "pipeline",
            hash = %format!("{hash:#x}"),
            block = mined.block_number.unwrap_or_default(),
            gas_used = mined.gas_used,
            summary = call.summary.as_deref().unwrap_or(""),
            "Transaction confirmed"
        );
        Ok(SubmissionReceipt {
            hash,
            block_number: mined.block_number,
            gas_used: mined.gas_used,
            gas,
            summary: call.summary.clone(),
            states: Vec::new(),
        })
    }
}

fn chain_failure(err: ChainError, reverted: ErrorKind) -> PipelineError {
    match err {
        ChainError::Reverted(reason) => PipelineError::new(reverted, reason),
        ChainError::Network(msg) => PipelineError::new(ErrorKind::NetworkFailure, msg),
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::new(
            ErrorKind::UserRejected,
            "cancelled before broadcast",
        )),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::chain::MinedReceipt;
    use crate::services::pipeline::gate::AutoApprove;
    use alloy::primitives::{Bytes, U256};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedChain {
        estimate: Option<Result<u64, ChainError>>,
        mined_ok: bool,
        calls: Mutex<Vec<&'static str>>,
        seen_gas_limit: Mutex<Option<u64>>,
    }

    #[async_trait]
    impl ChainClient for ScriptedChain {
        async fn estimate_gas(&self, _req: &CallRequest) -> Result<u64, ChainError> {
            self.calls.lock().unwrap().push("estimate");
            self.estimate.clone().unwrap_or(Ok(100_000))
        }

        async fn simulate(&self, req: &CallRequest) -> Result<Bytes, ChainError> {
            self.calls.lock().unwrap().push("simulate");
            *self.seen_gas_limit.lock().unwrap() = req.gas_limit;
            Ok(Bytes::new())
        }

        async fn broadcast(&self, _req: &CallRequest) -> Result<B256, ChainError> {
            self.calls.lock().unwrap().push("broadcast");
            Ok(B256::repeat_byte(0xab))
        }

        async fn wait_for_receipt(&self, hash: B256) -> Result<MinedReceipt, ChainError> {
            self.calls.lock().unwrap().push("receipt");
            Ok(MinedReceipt {
                hash,
                block_number: Some(1),
                gas_used: 90_000,
                success: self.mined_ok,
            })
        }
    }

    fn call() -> PreparedCall {
        PreparedCall {
            to: Address::repeat_byte(0x11),
            name: "batchRecycle(uint256[][],uint256[])",
            input: Bytes::from(vec![0u8; 36]),
            value: U256::ZERO,
            summary: Some("charged 1 assets for 7 days, recycled 7 assets".into()),
        }
    }

    #[tokio::test]
    async fn simulation_uses_margined_gas_limit() {
        let chain = Arc::new(ScriptedChain {
            mined_ok: true,
            ..Default::default()
        });
        let pipeline = TxPipeline::new(chain.clone(), Arc::new(AutoApprove), GasPolicy::default());
        let receipt = pipeline
            .submit(Address::ZERO, call(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(*chain.seen_gas_limit.lock().unwrap(), Some(110_000));
        assert_eq!(receipt.gas.gas_limit, 110_000);
        assert_eq!(receipt.states.last(), Some(&PipelineState::Idle));
        assert!(!pipeline.is_busy(Address::ZERO));
    }

    #[tokio::test]
    async fn estimation_revert_stops_before_simulation() {
        let chain = Arc::new(ScriptedChain {
            estimate: Some(Err(ChainError::Reverted("not owner".into()))),
            ..Default::default()
        });
        let pipeline = TxPipeline::new(chain.clone(), Arc::new(AutoApprove), GasPolicy::default());
        let err = pipeline
            .submit(Address::ZERO, call(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EstimationReverted);
        assert_eq!(err.reason, "not owner");
        assert_eq!(err.call.as_deref(), Some("batchRecycle(uint256[][],uint256[])"));
        assert_eq!(*chain.calls.lock().unwrap(), vec!["estimate"]);
    }

    #[tokio::test]
    async fn mined_revert_is_execution_reverted() {
        let chain = Arc::new(ScriptedChain::default());
        let pipeline = TxPipeline::new(chain, Arc::new(AutoApprove), GasPolicy::default());
        let err = pipeline
            .submit(Address::ZERO, call(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecutionReverted);
    }

    #[tokio::test]
    async fn guard_is_released_after_failure() {
        let chain = Arc::new(ScriptedChain {
            estimate: Some(Err(ChainError::Network("timeout".into()))),
            ..Default::default()
        });
        let pipeline = TxPipeline::new(chain, Arc::new(AutoApprove), GasPolicy::default());
        let err = pipeline
            .submit(Address::ZERO, call(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NetworkFailure);
        assert!(!pipeline.is_busy(Address::ZERO));
    }
}
