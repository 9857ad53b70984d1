// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod allocator;
pub mod classifier;
pub mod session;

pub use session::Session;

use crate::data::contracts::RecycleCharge;
use crate::domain::error::PipelineError;
use crate::domain::types::BatchPlan;
use crate::network::factory_api::InventorySource;
use crate::services::pipeline::{PreparedCall, SubmissionReceipt, TxPipeline};
use alloy::primitives::{Address, U256};
use tokio_util::sync::CancellationToken;

/// `batchRecycle(plan.recycle_groups, plan.charge_targets)`, non-payable.
pub fn recycle_call(contract: Address, plan: &BatchPlan) -> PreparedCall {
    let (recycle_array, charge_ids) = plan.to_call_args();
    PreparedCall::new(
        contract,
        &RecycleCharge::batchRecycleCall {
            recycle_array,
            charge_ids,
        },
        U256::ZERO,
    )
    .with_summary(plan.summary())
}

/// Fetch, classify, allocate and submit one recycle batch for the session owner.
pub async fn recharge(
    session: &mut Session,
    inventory: &dyn InventorySource,
    pipeline: &TxPipeline,
    contract: Address,
    cancel: &CancellationToken,
) -> Result<SubmissionReceipt, PipelineError> {
    session.refresh(inventory).await?;
    let plan = session.plan()?;
    tracing::info!(
        target: "pipeline",
        owner = %session.owner(),
        summary = %plan.summary(),
        "Submitting recycle batch"
    );
    pipeline
        .submit(session.owner(), recycle_call(contract, &plan), cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ChargeRatio;
    use alloy_sol_types::SolCall;

    #[test]
    fn recycle_call_encodes_plan_groups() {
        let destroyable: Vec<u64> = (1..=6).collect();
        let plan = allocator::allocate(&destroyable, &[50, 51], ChargeRatio::new(3).unwrap(), 100)
            .unwrap();
        let call = recycle_call(Address::repeat_byte(0x22), &plan);

        assert_eq!(call.value, U256::ZERO);
        assert_eq!(call.summary.as_deref(), Some("charged 2 assets for 3 days, recycled 6 assets"));
        let decoded = RecycleCharge::batchRecycleCall::abi_decode(&call.input).unwrap();
        assert_eq!(decoded.recycle_array[1], vec![U256::from(4u64), U256::from(5u64), U256::from(6u64)]);
        assert_eq!(decoded.charge_ids, vec![U256::from(50u64), U256::from(51u64)]);
    }
}
