// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::data::contracts::CellFactory;
use crate::domain::constants::BPS_DENOMINATOR;
use crate::domain::error::PipelineError;
use crate::services::pipeline::{PreparedCall, SubmissionReceipt, TxPipeline};
use alloy::primitives::{Address, U256};
use alloy::primitives::utils::format_ether;
use tokio_util::sync::CancellationToken;

/// A single-gene mint uses the gene for both parent slots.
pub fn gene_pairs(gene_id: u64) -> Vec<Vec<U256>> {
    vec![
        vec![U256::from(gene_id), U256::from(1u64)],
        vec![U256::from(gene_id), U256::from(2u64)],
    ]
}

/// `unit_price * quantity`, scaled by `multiplier_bps` and rounded down.
/// The factory refunds whatever the mint did not consume.
pub fn mint_value(unit_price: U256, quantity: u64, multiplier_bps: u64) -> U256 {
    unit_price
        .saturating_mul(U256::from(quantity))
        .saturating_mul(U256::from(multiplier_bps))
        / U256::from(BPS_DENOMINATOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintOrder {
    pub gene_id: u64,
    pub unit_price: U256,
    pub quantity: u64,
}

impl MintOrder {
    /// Quantity is clamped to at least one.
    pub fn new(gene_id: u64, unit_price: U256, quantity: u64) -> Self {
        Self {
            gene_id,
            unit_price,
            quantity: quantity.max(1),
        }
    }

    pub fn to_call(&self, contract: Address, multiplier_bps: u64) -> PreparedCall {
        let value = mint_value(self.unit_price, self.quantity, multiplier_bps);
        PreparedCall::new(
            contract,
            &CellFactory::batchCreationBySingleGeneCall {
                gene: gene_pairs(self.gene_id),
                quantity: U256::from(self.quantity),
            },
            value,
        )
        .with_summary(format!(
            "minted {} of gene {} for up to {} BNB",
            self.quantity,
            self.gene_id,
            format_ether(value)
        ))
    }
}

pub async fn mint(
    pipeline: &TxPipeline,
    account: Address,
    contract: Address,
    order: MintOrder,
    multiplier_bps: u64,
    cancel: &CancellationToken,
) -> Result<SubmissionReceipt, PipelineError> {
    let call = order.to_call(contract, multiplier_bps);
    tracing::info!(
        target: "pipeline",
        gene = order.gene_id,
        quantity = order.quantity,
        value = %format_ether(call.value),
        "Submitting mint"
    );
    pipeline.submit(account, call, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::DEFAULT_MINT_VALUE_MULTIPLIER_BPS;
    use alloy::primitives::utils::parse_ether;
    use alloy_sol_types::SolCall;

    #[test]
    fn value_carries_forty_two_percent_headroom() {
        let price = parse_ether("0.01").unwrap();
        assert_eq!(
            mint_value(price, 100, DEFAULT_MINT_VALUE_MULTIPLIER_BPS),
            parse_ether("1.42").unwrap()
        );
    }

    #[test]
    fn zero_quantity_is_clamped_to_one() {
        assert_eq!(MintOrder::new(3, U256::from(1u64), 0).quantity, 1);
    }

    #[test]
    fn call_encodes_gene_pairs_and_is_payable() {
        let order = MintOrder::new(42, parse_ether("0.5").unwrap(), 2);
        let call = order.to_call(Address::repeat_byte(0x33), DEFAULT_MINT_VALUE_MULTIPLIER_BPS);
        assert_eq!(call.value, parse_ether("1.42").unwrap());

        let decoded = CellFactory::batchCreationBySingleGeneCall::abi_decode(&call.input).unwrap();
        assert_eq!(decoded.gene, gene_pairs(42));
        assert_eq!(decoded.gene[1][1], U256::from(2u64));
        assert_eq!(decoded.quantity, U256::from(2u64));
    }
}
