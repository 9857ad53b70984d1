// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod call;
pub mod executor;
pub mod gate;
pub mod state;

pub use call::PreparedCall;
pub use executor::{SubmissionReceipt, TxPipeline};
pub use gate::{AutoApprove, PromptGate, SignatureGate};
pub use state::{PipelineEvent, PipelineState};
