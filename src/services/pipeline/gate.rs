// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::network::gas::GasQuote;
use crate::services::pipeline::call::PreparedCall;
use alloy::primitives::utils::format_ether;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;

/// Decision point between a successful simulation and the broadcast.
#[async_trait]
pub trait SignatureGate: Send + Sync {
    /// `true` to sign and broadcast, `false` to decline.
    async fn approve(&self, call: &PreparedCall, gas: &GasQuote) -> bool;
}

/// Signs without asking (`--yes`).
pub struct AutoApprove;

#[async_trait]
impl SignatureGate for AutoApprove {
    async fn approve(&self, _call: &PreparedCall, _gas: &GasQuote) -> bool {
        true
    }
}

/// Asks on the terminal and waits for `y`.
pub struct PromptGate;

pub(crate) fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Runs a blocking line read on its own thread. Dropping the receiver abandons
/// the read; the runtime can shut down while the thread is still blocked.
pub(crate) fn read_line_detached<F>(read: F) -> Option<oneshot::Receiver<String>>
where
    F: FnOnce() -> std::io::Result<String> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("signature-prompt".into())
        .spawn(move || {
            if let Ok(line) = read() {
                let _ = tx.send(line);
            }
        })
        .ok()?;
    Some(rx)
}

#[async_trait]
impl SignatureGate for PromptGate {
    async fn approve(&self, call: &PreparedCall, gas: &GasQuote) -> bool {
        let prompt = format!(
            "\n{}\n  to:        {:#x}\n  value:     {} BNB\n  gas limit: {}\n  max fee:   {} BNB\n{}Sign and send? [y/N] ",
            call.name,
            call.to,
            format_ether(call.value),
            gas.gas_limit,
            format_ether(gas.max_fee_wei()),
            call.summary
                .as_deref()
                .map(|s| format!("  plan:      {s}\n"))
                .unwrap_or_default(),
        );
        let mut stdout = tokio::io::stdout();
        if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let Some(answer) = read_line_detached(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok(line)
        }) else {
            return false;
        };
        match answer.await {
            Ok(line) => is_affirmative(&line),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn only_explicit_yes_approves() {
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }

    #[tokio::test]
    async fn detached_read_delivers_the_line() {
        let answer = read_line_detached(|| Ok("yes\n".to_string())).unwrap();
        assert!(is_affirmative(&answer.await.unwrap()));
    }

    #[test]
    fn unanswered_prompt_does_not_hold_the_runtime_open() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let (release, blocked) = std::sync::mpsc::channel::<()>();
        let answer = read_line_detached(move || {
            let _ = blocked.recv();
            Ok("y\n".to_string())
        })
        .unwrap();

        let outcome =
            rt.block_on(async { tokio::time::timeout(Duration::from_millis(50), answer).await });
        assert!(outcome.is_err());

        let started = Instant::now();
        drop(rt);
        assert!(started.elapsed() < Duration::from_secs(1));
        drop(release);
    }
}
