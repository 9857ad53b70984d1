// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::deserialize_f64_lenient;
use crate::domain::constants::{CATALOG_PAGE_SIZE, INVENTORY_PAGE_SIZE};
use crate::domain::types::{Asset, CatalogEntry};
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

const PROVIDER: &str = "factory-api";
const SUCCESS_CODE: i64 = 200;

/// Resting (not currently mining) assets owned by an account.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn resting_assets(&self, owner: Address) -> Result<Vec<Asset>, AppError>;
}

/// Mintable gene templates, without prices.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, AppError>;
}

/// Accumulated energy of one holder.
#[async_trait]
pub trait EnergySource: Send + Sync {
    async fn energy_of(&self, holder: &str) -> Result<f64, AppError>;
}

/// The factory backend wraps lists as `{code, message, data: {list}}`; some
/// proxies forward the bare list. Both are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged, bound(deserialize = "T: DeserializeOwned"))]
enum ListResponse<T> {
    Envelope {
        code: i64,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        data: Option<ListPage<T>>,
    },
    Bare(Vec<T>),
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ListPage<T> {
    #[serde(default)]
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MiningEnvelope {
    #[serde(default)]
    code: Option<i64>,
    data: Option<MiningInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MiningInfo {
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    my_energy: f64,
    #[serde(default, deserialize_with = "deserialize_f64_lenient")]
    wait_claim_energy: f64,
}

pub(crate) fn unpack_list<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, AppError> {
    let parsed: ListResponse<T> = serde_json::from_slice(body)
        .map_err(|e| AppError::Initialization(format!("{PROVIDER} decode failed: {e}")))?;
    match parsed {
        ListResponse::Bare(list) => Ok(list),
        ListResponse::Envelope {
            code: SUCCESS_CODE,
            data: Some(page),
            ..
        } => Ok(page.list),
        ListResponse::Envelope { code, message, .. } => {
            tracing::warn!(
                target: "inventory",
                code,
                message = message.as_deref().unwrap_or(""),
                "Factory API returned an error envelope"
            );
            Err(AppError::ApiCall {
                provider: PROVIDER.into(),
                status: u16::try_from(code).unwrap_or(500),
            })
        }
    }
}

pub(crate) fn total_energy(body: &[u8]) -> Result<f64, AppError> {
    let parsed: MiningEnvelope = serde_json::from_slice(body)
        .map_err(|e| AppError::Initialization(format!("{PROVIDER} decode failed: {e}")))?;
    if let Some(code) = parsed.code
        && code != SUCCESS_CODE
    {
        return Err(AppError::ApiCall {
            provider: PROVIDER.into(),
            status: u16::try_from(code).unwrap_or(500),
        });
    }
    let info = parsed.data.ok_or_else(|| {
        AppError::Initialization(format!("{PROVIDER} miningInfo response has no data"))
    })?;
    Ok(info.my_energy + info.wait_claim_energy)
}

#[derive(Clone)]
pub struct FactoryApi {
    client: Client,
    base_url: String,
}

impl FactoryApi {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| AppError::Config(format!("Invalid factory API url: {e}")))
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("{PROVIDER} request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::ApiCall {
                provider: PROVIDER.into(),
                status: status.as_u16(),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AppError::Connection(format!("{PROVIDER} body read failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl InventorySource for FactoryApi {
    async fn resting_assets(&self, owner: Address) -> Result<Vec<Asset>, AppError> {
        let mut url = self.endpoint("myRestingLives")?;
        url.query_pairs_mut()
            .append_pair("ethAddress", &format!("{owner:#x}"))
            .append_pair("pageSize", &INVENTORY_PAGE_SIZE.to_string());
        let body = self.get_bytes(url).await?;
        let assets: Vec<Asset> = unpack_list(&body)?;
        tracing::debug!(target: "inventory", owner = %owner, count = assets.len(), "Loaded resting assets");
        Ok(assets)
    }
}

#[async_trait]
impl CatalogSource for FactoryApi {
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, AppError> {
        let mut url = self.endpoint("cells")?;
        url.query_pairs_mut()
            .append_pair("pageNum", "1")
            .append_pair("pageSize", &CATALOG_PAGE_SIZE.to_string());
        let body = self.get_bytes(url).await?;
        let entries: Vec<CatalogEntry> = unpack_list(&body)?;
        tracing::debug!(target: "pricing", count = entries.len(), "Loaded gene catalog");
        Ok(entries)
    }
}

#[async_trait]
impl EnergySource for FactoryApi {
    async fn energy_of(&self, holder: &str) -> Result<f64, AppError> {
        let mut url = self.endpoint("miningInfo")?;
        url.query_pairs_mut().append_pair("ethAddress", holder);
        let body = self.get_bytes(url).await?;
        total_energy(&body)
    }
}
