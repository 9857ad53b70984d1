// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::parse_ether_decimal;
use crate::data::contracts::{IMulticall3, LifePriceOracle};
use crate::domain::constants::MULTICALL_CHUNK_SIZE;
use crate::network::provider::HttpProvider;
use alloy::primitives::{Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Mint price lookup for a set of gene ids.
#[async_trait]
pub trait PriceStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve_prices(&self, ids: &[u64]) -> Result<HashMap<u64, U256>, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStrategyKind {
    Sequential,
    #[default]
    Multicall,
    Quote,
}

impl FromStr for PriceStrategyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "multicall" => Ok(Self::Multicall),
            "quote" => Ok(Self::Quote),
            other => Err(AppError::Validation {
                field: "price_strategy".into(),
                message: format!("unknown strategy {other:?} (sequential|multicall|quote)"),
            }),
        }
    }
}

impl fmt::Display for PriceStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequential => "sequential",
            Self::Multicall => "multicall",
            Self::Quote => "quote",
        };
        f.write_str(name)
    }
}

/// The oracle prices a gene by its two parent cells; a single-gene mint uses
/// the same id for both.
pub fn price_pair(id: u64) -> Vec<U256> {
    vec![U256::from(id), U256::from(id)]
}

pub fn sum_prices(prices: &[U256]) -> U256 {
    prices
        .iter()
        .fold(U256::ZERO, |acc, p| acc.saturating_add(*p))
}

pub fn build_price_calls(oracle: Address, ids: &[u64]) -> Vec<IMulticall3::Call3> {
    ids.iter()
        .map(|id| IMulticall3::Call3 {
            target: oracle,
            allowFailure: true,
            callData: LifePriceOracle::getLifePriceCall {
                cells_: price_pair(*id),
            }
            .abi_encode()
            .into(),
        })
        .collect()
}

/// Pair aggregate3 results back to ids. Failed or missing sub-results price
/// at zero so one bad id never sinks the batch.
pub fn collect_prices(ids: &[u64], results: &[IMulticall3::Call3Result]) -> HashMap<u64, U256> {
    let mut out = HashMap::with_capacity(ids.len());
    for (idx, id) in ids.iter().enumerate() {
        let price = match results.get(idx) {
            Some(r) if r.success => {
                match LifePriceOracle::getLifePriceCall::abi_decode_returns(&r.returnData) {
                    Ok(prices) => sum_prices(&prices),
                    Err(e) => {
                        tracing::warn!(target: "pricing", id, error = %e, "Undecodable oracle result; pricing at zero");
                        U256::ZERO
                    }
                }
            }
            Some(_) => {
                tracing::warn!(target: "pricing", id, "Oracle sub-call failed; pricing at zero");
                U256::ZERO
            }
            None => {
                tracing::warn!(target: "pricing", id, "Missing oracle sub-result; pricing at zero");
                U256::ZERO
            }
        };
        out.insert(*id, price);
    }
    out
}

/// Price `ids` in chunks of `chunk_size`, one aggregate round trip per chunk.
/// A failed round trip fails the lookup; failed sub-calls price at zero.
pub(crate) async fn resolve_in_chunks<F, Fut>(
    oracle: Address,
    ids: &[u64],
    chunk_size: usize,
    mut aggregate: F,
) -> Result<HashMap<u64, U256>, AppError>
where
    F: FnMut(Vec<IMulticall3::Call3>) -> Fut,
    Fut: Future<Output = Result<Vec<IMulticall3::Call3Result>, AppError>>,
{
    let mut out = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(chunk_size.max(1)) {
        let results = aggregate(build_price_calls(oracle, chunk)).await?;
        if results.len() != chunk.len() {
            tracing::warn!(
                target: "pricing",
                expected = chunk.len(),
                got = results.len(),
                "aggregate3 returned a short result set"
            );
        }
        out.extend(collect_prices(chunk, &results));
    }
    Ok(out)
}

/// One `getLifePrice` read per id.
pub struct SequentialOracle {
    provider: HttpProvider,
    oracle: Address,
}

impl SequentialOracle {
    pub fn new(provider: HttpProvider, oracle: Address) -> Self {
        Self { provider, oracle }
    }
}

#[async_trait]
impl PriceStrategy for SequentialOracle {
    fn name(&self) -> &'static str {
        "sequential"
    }

    async fn resolve_prices(&self, ids: &[u64]) -> Result<HashMap<u64, U256>, AppError> {
        let contract = LifePriceOracle::new(self.oracle, self.provider.clone());
        let mut out = HashMap::with_capacity(ids.len());
        for id in ids {
            let prices = contract
                .getLifePrice(price_pair(*id))
                .call()
                .await
                .map_err(|e| {
                    AppError::Connection(format!("getLifePrice failed for gene {id}: {e}"))
                })?;
            out.insert(*id, sum_prices(&prices));
        }
        Ok(out)
    }
}

/// `aggregate3` round trips of up to `MULTICALL_CHUNK_SIZE` ids each.
pub struct MulticallOracle {
    provider: HttpProvider,
    oracle: Address,
    multicall: Address,
}

impl MulticallOracle {
    pub fn new(provider: HttpProvider, oracle: Address, multicall: Address) -> Self {
        Self {
            provider,
            oracle,
            multicall,
        }
    }
}

#[async_trait]
impl PriceStrategy for MulticallOracle {
    fn name(&self) -> &'static str {
        "multicall"
    }

    async fn resolve_prices(&self, ids: &[u64]) -> Result<HashMap<u64, U256>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let aggregator = IMulticall3::new(self.multicall, self.provider.clone());
        let aggregator = &aggregator;
        resolve_in_chunks(self.oracle, ids, MULTICALL_CHUNK_SIZE, move |calls| async move {
            aggregator
                .aggregate3(calls)
                .call()
                .await
                .map_err(|e| AppError::Connection(format!("aggregate3 failed: {e}")))
        })
        .await
    }
}

#[derive(Debug, Serialize)]
struct QuoteRequest {
    ids: Vec<u64>,
    quantity: u64,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    price: serde_json::Value,
}

pub(crate) fn parse_quote(body: &[u8]) -> Result<U256, AppError> {
    let parsed: QuoteResponse = serde_json::from_slice(body)
        .map_err(|e| AppError::Initialization(format!("quote decode failed: {e}")))?;
    let raw = match &parsed.price {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(AppError::Initialization(format!(
                "quote price has unexpected shape: {other}"
            )));
        }
    };
    parse_ether_decimal(&raw)
        .ok_or_else(|| AppError::Initialization(format!("quote price {raw:?} is not a decimal")))
}

/// Off-chain quote service, one POST per id.
pub struct QuoteEndpoint {
    client: Client,
    url: String,
}

impl QuoteEndpoint {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PriceStrategy for QuoteEndpoint {
    fn name(&self) -> &'static str {
        "quote"
    }

    async fn resolve_prices(&self, ids: &[u64]) -> Result<HashMap<u64, U256>, AppError> {
        let mut out = HashMap::with_capacity(ids.len());
        for id in ids {
            let request = QuoteRequest {
                ids: vec![*id, *id],
                quantity: 1,
            };
            let resp = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| AppError::Connection(format!("quote request failed: {e}")))?;
            if !resp.status().is_success() {
                return Err(AppError::ApiCall {
                    provider: "quote".into(),
                    status: resp.status().as_u16(),
                });
            }
            let body = resp
                .bytes()
                .await
                .map_err(|e| AppError::Connection(format!("quote body read failed: {e}")))?;
            out.insert(*id, parse_quote(&body)?);
        }
        Ok(out)
    }
}
