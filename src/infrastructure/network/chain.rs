// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::network::provider::{HttpProvider, SigningProvider};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::TransactionRequest;
use alloy::transports::{RpcError as TransportRpcError, TransportError};
use alloy_sol_types::{Revert, SolError};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

/// One contract call, fully parameterised, as sent to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas_price: u128,
    pub gas_limit: Option<u64>,
}

impl CallRequest {
    pub fn to_transaction_request(&self) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.to)
            .with_input(self.input.clone())
            .with_value(self.value)
            .with_gas_price(self.gas_price);
        if let Some(limit) = self.gas_limit {
            tx = tx.with_gas_limit(limit);
        }
        tx
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The node refused the call; carries the decoded revert reason or the
    /// node's message verbatim.
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("rpc failure: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedReceipt {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub success: bool,
}

/// Read/write surface the transaction pipeline drives.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn estimate_gas(&self, req: &CallRequest) -> Result<u64, ChainError>;

    /// Dry-run the exact call (`eth_call`) and return its output.
    async fn simulate(&self, req: &CallRequest) -> Result<Bytes, ChainError>;

    /// Sign and broadcast; returns as soon as the node accepted the transaction.
    async fn broadcast(&self, req: &CallRequest) -> Result<B256, ChainError>;

    async fn wait_for_receipt(&self, hash: B256) -> Result<MinedReceipt, ChainError>;
}

pub struct RpcChainClient {
    reader: HttpProvider,
    writer: SigningProvider,
    chain_id: u64,
    receipt_poll: Duration,
    receipt_timeout: Duration,
}

impl RpcChainClient {
    pub fn new(
        reader: HttpProvider,
        writer: SigningProvider,
        chain_id: u64,
        receipt_poll_ms: u64,
        receipt_timeout_ms: u64,
    ) -> Self {
        Self {
            reader,
            writer,
            chain_id,
            receipt_poll: Duration::from_millis(receipt_poll_ms.max(1)),
            receipt_timeout: Duration::from_millis(receipt_timeout_ms.max(1)),
        }
    }

    /// Refuse to sign anything if the RPC endpoint serves another chain.
    pub async fn verify_chain(&self) -> Result<(), AppError> {
        let reported = self
            .reader
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("eth_chainId failed: {e}")))?;
        check_chain_id(self.chain_id, reported)?;
        tracing::debug!(target: "pipeline", chain_id = reported, "RPC chain verified");
        Ok(())
    }

    /// The request as signed: chain id pinned so a node on another chain
    /// rejects it instead of executing it.
    pub fn signed_request(&self, req: &CallRequest) -> TransactionRequest {
        req.to_transaction_request().with_chain_id(self.chain_id)
    }
}

pub fn check_chain_id(expected: u64, reported: u64) -> Result<(), AppError> {
    if expected != reported {
        return Err(AppError::Config(format!(
            "RPC endpoint serves chain {reported}, expected chain {expected}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn estimate_gas(&self, req: &CallRequest) -> Result<u64, ChainError> {
        self.reader
            .estimate_gas(req.to_transaction_request())
            .await
            .map_err(|e| classify_rpc_error(&e))
    }

    async fn simulate(&self, req: &CallRequest) -> Result<Bytes, ChainError> {
        self.reader
            .call(req.to_transaction_request())
            .await
            .map_err(|e| classify_rpc_error(&e))
    }

    async fn broadcast(&self, req: &CallRequest) -> Result<B256, ChainError> {
        let pending = self
            .writer
            .send_transaction(self.signed_request(req))
            .await
            .map_err(|e| classify_rpc_error(&e))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<MinedReceipt, ChainError> {
        let started = Instant::now();
        loop {
            match self.reader.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    return Ok(MinedReceipt {
                        hash,
                        block_number: rcpt.block_number,
                        gas_used: rcpt.gas_used as u64,
                        success: rcpt.status(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "pipeline",
                        error = %e,
                        hash = %format!("{:#x}", hash),
                        "Receipt lookup error; polling again"
                    );
                }
            }

            if started.elapsed() >= self.receipt_timeout {
                return Err(ChainError::Network(format!(
                    "no receipt for {:#x} after {}ms",
                    hash,
                    self.receipt_timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }
}

/// Node answers that mean "try again later" rather than "this call fails".
const RATE_LIMIT_CODES: &[i64] = &[-32005, 429];

/// Split transport failures into "the node rejected the call" and "the network failed".
///
/// Any JSON-RPC error response rejects this exact call, rate limiting aside.
/// Everything else the transport raises is a network failure.
pub fn classify_rpc_error(err: &TransportError) -> ChainError {
    match err {
        TransportRpcError::ErrorResp(payload) if !RATE_LIMIT_CODES.contains(&payload.code) => {
            let reason = payload
                .as_revert_data()
                .filter(|data| !data.is_empty())
                .map(|data| decode_revert_reason(&data))
                .unwrap_or_else(|| payload.message.to_string());
            ChainError::Reverted(reason)
        }
        _ => ChainError::Network(err.to_string()),
    }
}

/// Human-readable reason for raw revert bytes.
pub fn decode_revert_reason(revert_data: &[u8]) -> String {
    if revert_data.is_empty() {
        return "reverted without data".to_string();
    }
    if let Ok(msg) = Revert::abi_decode(revert_data) {
        return msg.reason().to_string();
    }
    format!("0x{}", hex::encode(revert_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::ErrorPayload;
    use alloy::transports::TransportErrorKind;

    fn error_resp(code: i64, message: &str, data: Option<&str>) -> TransportError {
        let payload: ErrorPayload = serde_json::from_value(serde_json::json!({
            "code": code,
            "message": message,
            "data": data,
        }))
        .unwrap();
        TransportRpcError::ErrorResp(payload)
    }

    #[test]
    fn decodes_standard_revert_reason() {
        let data = Revert::from("not owner").abi_encode();
        assert_eq!(decode_revert_reason(&data), "not owner");
    }

    #[test]
    fn unknown_revert_payload_is_hex() {
        assert_eq!(decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]), "0xdeadbeef");
        assert_eq!(decode_revert_reason(&[]), "reverted without data");
    }

    #[test]
    fn code_three_with_data_is_a_revert_with_decoded_reason() {
        let data = format!("0x{}", hex::encode(Revert::from("bad group size").abi_encode()));
        let err = error_resp(3, "execution reverted: bad group size", Some(&data));
        assert_eq!(
            classify_rpc_error(&err),
            ChainError::Reverted("bad group size".to_string())
        );
    }

    #[test]
    fn revert_message_without_data_is_surfaced_verbatim() {
        let err = error_resp(-32000, "execution reverted", None);
        assert_eq!(
            classify_rpc_error(&err),
            ChainError::Reverted("execution reverted".to_string())
        );
    }

    #[test]
    fn insufficient_funds_is_a_rejection_not_a_network_failure() {
        let err = error_resp(
            -32000,
            "insufficient funds for gas * price + value: have 0 want 142000000000000000",
            None,
        );
        assert_eq!(
            classify_rpc_error(&err),
            ChainError::Reverted(
                "insufficient funds for gas * price + value: have 0 want 142000000000000000"
                    .to_string()
            )
        );

        let err = error_resp(-32000, "gas required exceeds allowance (30000000)", None);
        assert!(matches!(classify_rpc_error(&err), ChainError::Reverted(_)));
    }

    #[test]
    fn rate_limits_and_transport_errors_are_network_failures() {
        let err = error_resp(-32005, "limit exceeded", None);
        assert!(matches!(classify_rpc_error(&err), ChainError::Network(_)));
        let err = error_resp(429, "Too Many Requests", None);
        assert!(matches!(classify_rpc_error(&err), ChainError::Network(_)));

        let transport = TransportErrorKind::custom_str("connection reset");
        assert!(matches!(
            classify_rpc_error(&transport),
            ChainError::Network(msg) if msg.contains("connection reset")
        ));
    }

    #[test]
    fn chain_mismatch_is_a_config_error() {
        assert!(check_chain_id(56, 56).is_ok());
        let err = check_chain_id(56, 1).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("chain 1")));
    }

    #[test]
    fn broadcast_request_pins_configured_chain() {
        use crate::network::provider::ConnectionFactory;
        use alloy::signers::local::PrivateKeySigner;

        let signer: PrivateKeySigner =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let client = RpcChainClient::new(
            ConnectionFactory::http("http://127.0.0.1:8545").unwrap(),
            ConnectionFactory::signing("http://127.0.0.1:8545", signer).unwrap(),
            56,
            1_000,
            1_000,
        );
        let req = CallRequest {
            from: Address::from([1u8; 20]),
            to: Address::from([2u8; 20]),
            input: Bytes::new(),
            value: U256::ZERO,
            gas_price: 1_000_000_000,
            gas_limit: Some(50_000),
        };
        assert_eq!(client.signed_request(&req).chain_id, Some(56));
        assert_eq!(req.to_transaction_request().chain_id, None);
    }

    #[test]
    fn call_request_carries_pinned_gas_fields() {
        let req = CallRequest {
            from: Address::from([1u8; 20]),
            to: Address::from([2u8; 20]),
            input: Bytes::from(vec![0xaa, 0xbb]),
            value: U256::from(5u64),
            gas_price: 1_000_000_000,
            gas_limit: Some(110_000),
        };
        let tx = req.to_transaction_request();
        assert_eq!(tx.from, Some(req.from));
        assert_eq!(tx.gas_price, Some(1_000_000_000));
        assert_eq!(tx.gas, Some(110_000));
        assert_eq!(tx.value, Some(U256::from(5u64)));
    }
}
