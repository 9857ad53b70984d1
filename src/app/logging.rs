// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// HTTP and RPC plumbing that floods `debug`.
const QUIET_MODULES: &[&str] = &[
    "h2=info",
    "hyper=info",
    "hyper_util=info",
    "reqwest=info",
    "rustls=info",
    "alloy_transport_http=info",
    "alloy_rpc_client=info",
];

/// A bare level ("debug") gets the quiet-module defaults appended; a full
/// directive string ("info,pipeline=trace") is used as given.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return "info".to_string();
    }
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{},{}", normalized, QUIET_MODULES.join(","))
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    // A second call is a no-op.
    let installed = if json_format {
        subscriber
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
            .is_ok()
    } else {
        subscriber
            .with(fmt::layer().with_target(true).compact())
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(
            target: "config",
            filter = %spec,
            format = if json_format { "json" } else { "compact" },
            "Logging initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_gets_quiet_defaults() {
        let spec = filter_spec("debug");
        assert!(spec.starts_with("debug,"));
        assert!(spec.contains("hyper=info"));
    }

    #[test]
    fn directive_strings_are_kept() {
        assert_eq!(filter_spec(" info,pipeline=trace "), "info,pipeline=trace");
        assert_eq!(filter_spec(""), "info");
    }
}
