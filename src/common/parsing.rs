// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::U256;
use alloy::primitives::utils::parse_ether;
use serde::{Deserialize, Deserializer};

/// The factory API is not consistent about numbers: ids and hash rates
/// arrive as JSON numbers on some endpoints and as strings on others.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(u64),
    Float(f64),
    Text(String),
}

pub fn deserialize_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(v) => Ok(v),
        NumberOrString::Float(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        NumberOrString::Float(v) => Err(serde::de::Error::custom(format!(
            "expected an unsigned integer, got {v}"
        ))),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid integer {s:?}: {e}"))),
    }
}

pub fn deserialize_f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(v) => Ok(v as f64),
        NumberOrString::Float(v) => Ok(v),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number {s:?}: {e}"))),
    }
}

/// Parse a decimal ether amount ("0.0125") into wei.
pub fn parse_ether_decimal(raw: &str) -> Option<U256> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_ether(trimmed).ok()
}

pub fn short_hex(bytes: &[u8], len: usize) -> String {
    format!("0x{}", hex::encode(&bytes[..len.min(bytes.len())]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "deserialize_u64_lenient")]
        id: u64,
        #[serde(deserialize_with = "deserialize_f64_lenient")]
        rate: f64,
    }

    #[test]
    fn lenient_numbers_accept_strings_and_numbers() {
        let a: Probe = serde_json::from_str(r#"{"id": 42, "rate": 12.5}"#).unwrap();
        assert_eq!(a.id, 42);
        assert_eq!(a.rate, 12.5);

        let b: Probe = serde_json::from_str(r#"{"id": " 7 ", "rate": "900"}"#).unwrap();
        assert_eq!(b.id, 7);
        assert_eq!(b.rate, 900.0);
    }

    #[test]
    fn lenient_integer_rejects_fractions() {
        let res: Result<Probe, _> = serde_json::from_str(r#"{"id": 1.5, "rate": 1}"#);
        assert!(res.is_err());
    }

    #[test]
    fn ether_decimals_parse_to_wei() {
        assert_eq!(
            parse_ether_decimal("0.5"),
            Some(U256::from(500_000_000_000_000_000u64))
        );
        assert_eq!(parse_ether_decimal("  "), None);
        assert_eq!(parse_ether_decimal("abc"), None);
    }

    #[test]
    fn short_hex_clamps_to_input_length() {
        assert_eq!(short_hex(&[0xde, 0xad], 8), "0xdead");
        assert_eq!(short_hex(&[1, 2, 3, 4], 2), "0x0102");
    }
}
