// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Closed set of outcomes a single submission attempt can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The inventory collaborator could not be reached or answered garbage.
    InventoryUnavailable,
    /// The allocator produced an empty plan; nothing was sent.
    InsufficientInventory,
    /// `eth_estimateGas` reverted for the exact call.
    EstimationReverted,
    /// The dry-run `eth_call` reverted with the computed gas parameters.
    SimulationReverted,
    /// The signature prompt was declined or cancelled.
    UserRejected,
    /// RPC or transport failure at any step.
    NetworkFailure,
    /// Mined, but reverted on-chain. State moved between simulate and submit.
    ExecutionReverted,
    /// Another submission for the same account is still in flight.
    Busy,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InventoryUnavailable => "inventory_unavailable",
            ErrorKind::InsufficientInventory => "insufficient_inventory",
            ErrorKind::EstimationReverted => "estimation_reverted",
            ErrorKind::SimulationReverted => "simulation_reverted",
            ErrorKind::UserRejected => "user_rejected",
            ErrorKind::NetworkFailure => "network_failure",
            ErrorKind::ExecutionReverted => "execution_reverted",
            ErrorKind::Busy => "busy",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one planning or submission attempt.
///
/// `Display` is meant for logs (kind, call, args digest, raw reason);
/// [`PipelineError::user_message`] is the single line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub call: Option<String>,
    pub args_digest: Option<String>,
    pub reason: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            call: None,
            args_digest: None,
            reason: reason.into(),
        }
    }

    pub fn with_call(mut self, call: impl Into<String>, args_digest: impl Into<String>) -> Self {
        self.call = Some(call.into());
        self.args_digest = Some(args_digest.into());
        self
    }

    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::InventoryUnavailable => {
                format!("Could not load your assets, try again later ({})", self.reason)
            }
            ErrorKind::InsufficientInventory => {
                format!("Not enough assets to build a batch: {}", self.reason)
            }
            ErrorKind::EstimationReverted => {
                format!("The transaction would fail on-chain: {}", self.reason)
            }
            ErrorKind::SimulationReverted => {
                format!("Simulation of the transaction failed: {}", self.reason)
            }
            ErrorKind::UserRejected => "The transaction was not signed.".to_string(),
            ErrorKind::NetworkFailure => format!("Network error: {}", self.reason),
            ErrorKind::ExecutionReverted => {
                format!("The transaction was mined but reverted: {}", self.reason)
            }
            ErrorKind::Busy => {
                "Another transaction for this account is still in progress.".to_string()
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(call) = &self.call {
            write!(f, " in {call}")?;
        }
        if let Some(digest) = &self.args_digest {
            write!(f, " [args {digest}]")?;
        }
        write!(f, ": {}", self.reason)
    }
}

impl std::error::Error for PipelineError {}
