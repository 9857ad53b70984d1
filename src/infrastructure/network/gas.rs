// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{
    BPS_DENOMINATOR, DEFAULT_GAS_LIMIT_MULTIPLIER_BPS, DEFAULT_GAS_PRICE_GWEI,
};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Gas parameters pinned by policy rather than sampled from the chain.
///
/// The gas *price* is fixed so wallets cannot inflate it; the gas *limit* is
/// the node's estimate plus a safety margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    gas_price_wei: u128,
    limit_multiplier_bps: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub estimated: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl GasQuote {
    /// Upper bound on the fee paid, in wei.
    pub fn max_fee_wei(&self) -> u128 {
        (self.gas_limit as u128).saturating_mul(self.gas_price)
    }
}

impl GasPolicy {
    pub fn new(gas_price_gwei: u64, limit_multiplier_bps: u64) -> Self {
        Self {
            gas_price_wei: (gas_price_gwei as u128).saturating_mul(WEI_PER_GWEI),
            // Never shrink the estimate.
            limit_multiplier_bps: limit_multiplier_bps.max(BPS_DENOMINATOR),
        }
    }

    pub fn gas_price(&self) -> u128 {
        self.gas_price_wei
    }

    pub fn limit_multiplier_bps(&self) -> u64 {
        self.limit_multiplier_bps
    }

    /// Apply the safety margin, rounding up.
    pub fn gas_limit(&self, estimate: u64) -> u64 {
        let scaled = (estimate as u128)
            .saturating_mul(self.limit_multiplier_bps as u128)
            .div_ceil(BPS_DENOMINATOR as u128);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    pub fn quote(&self, estimate: u64) -> GasQuote {
        GasQuote {
            estimated: estimate,
            gas_limit: self.gas_limit(estimate),
            gas_price: self.gas_price_wei,
        }
    }
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_PRICE_GWEI, DEFAULT_GAS_LIMIT_MULTIPLIER_BPS)
    }
}
