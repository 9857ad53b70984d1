// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::ErrorKind;
use alloy::primitives::B256;
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Estimating,
    Simulating,
    AwaitingSignature,
    Submitted,
    Confirmed,
    Failed,
}

impl PipelineState {
    /// Legal edges of the submission state machine. Any active state may fail;
    /// terminal states only go back to `Idle`.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Estimating)
                | (Estimating, Simulating)
                | (Simulating, AwaitingSignature)
                | (AwaitingSignature, Submitted)
                | (Submitted, Confirmed)
                | (Estimating | Simulating | AwaitingSignature | Submitted, Failed)
                | (Confirmed | Failed, Idle)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Confirmed | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Estimating => "estimating",
            PipelineState::Simulating => "simulating",
            PipelineState::AwaitingSignature => "awaiting_signature",
            PipelineState::Submitted => "submitted",
            PipelineState::Confirmed => "confirmed",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Progress notification published to the caller's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Transition {
        from: PipelineState,
        to: PipelineState,
    },
    GasQuoted {
        estimated: u64,
        gas_limit: u64,
    },
    Broadcast {
        hash: B256,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

/// Walks the state machine for one submission and reports every move.
pub(crate) struct StateTracker {
    state: PipelineState,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
    history: Vec<PipelineState>,
}

impl StateTracker {
    pub(crate) fn new(events: Option<mpsc::UnboundedSender<PipelineEvent>>) -> Self {
        Self {
            state: PipelineState::Idle,
            events,
            history: vec![PipelineState::Idle],
        }
    }

    pub(crate) fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub(crate) fn advance(&mut self, next: PipelineState) {
        if !self.state.can_transition_to(next) {
            tracing::error!(target: "pipeline", from = %self.state, to = %next, "Illegal pipeline transition");
            debug_assert!(false, "illegal transition {} -> {}", self.state, next);
        }
        tracing::debug!(target: "pipeline", from = %self.state, to = %next, "Pipeline transition");
        self.emit(PipelineEvent::Transition {
            from: self.state,
            to: next,
        });
        self.state = next;
        self.history.push(next);
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            // Receiver may be gone.
            let _ = tx.send(event);
        }
    }
}
