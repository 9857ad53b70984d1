// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::short_hex;
use alloy::primitives::{Address, Bytes, U256, keccak256};
use alloy_sol_types::SolCall;

/// A fully encoded contract call plus the context needed to report on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub to: Address,
    /// Canonical signature, e.g. `batchRecycle(uint256[][],uint256[])`.
    pub name: &'static str,
    pub input: Bytes,
    pub value: U256,
    /// Human summary reported on confirmation.
    pub summary: Option<String>,
}

impl PreparedCall {
    pub fn new<C: SolCall>(to: Address, call: &C, value: U256) -> Self {
        Self {
            to,
            name: C::SIGNATURE,
            input: call.abi_encode().into(),
            value,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Short keccak of the argument payload, stable across runs for the same plan.
    pub fn args_digest(&self) -> String {
        let args = self.input.get(4..).unwrap_or_default();
        short_hex(keccak256(args).as_slice(), 8)
    }
}
