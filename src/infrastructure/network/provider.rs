// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use std::time::Duration;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;
/// Provider with a local wallet attached; fills nonce and chain id on send.
pub type SigningProvider = DynProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url = parse_rpc_url(rpc_url)?;
        Ok(RootProvider::new_http(url))
    }

    pub fn signing(rpc_url: &str, signer: PrivateKeySigner) -> Result<SigningProvider, AppError> {
        let url = parse_rpc_url(rpc_url)?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);
        Ok(provider.erased())
    }

    /// Shared HTTP client for the off-chain collaborators.
    pub fn rest_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))
    }
}

fn parse_rpc_url(rpc_url: &str) -> Result<Url, AppError> {
    Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))
}
