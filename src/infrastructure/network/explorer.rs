// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::constants::{EXPLORER_CHAIN_SHORT_NAME, LEADERBOARD_PAGE_SIZE};
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use url::Url;

const PROVIDER: &str = "oklink";
const ACCESS_KEY_HEADER: &str = "Ok-Access-Key";

/// Holders of a token contract, largest positions first.
#[async_trait]
pub trait HolderSource: Send + Sync {
    async fn holders(&self, token: Address, max: usize) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<PositionPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionPage {
    #[serde(default)]
    position_list: Vec<Position>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Position {
    holder_address: String,
}

/// Holder addresses of one `position-list` page.
pub(crate) fn parse_position_page(body: &[u8]) -> Result<Vec<String>, AppError> {
    let parsed: PositionResponse = serde_json::from_slice(body)
        .map_err(|e| AppError::Initialization(format!("{PROVIDER} decode failed: {e}")))?;
    if parsed.code != "0" {
        tracing::warn!(target: "leaderboard", code = %parsed.code, msg = %parsed.msg, "Explorer rejected position-list request");
        return Err(AppError::ApiCall {
            provider: PROVIDER.into(),
            status: parsed.code.parse().unwrap_or(500),
        });
    }
    Ok(parsed
        .data
        .into_iter()
        .next()
        .map(|page| page.position_list)
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.holder_address)
        .collect())
}

/// Walk pages from 1 until a short page or `max` holders, then truncate to `max`.
pub(crate) async fn collect_pages<F, Fut>(
    max: usize,
    page_size: usize,
    mut fetch: F,
) -> Result<Vec<String>, AppError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<String>, AppError>>,
{
    let mut holders = Vec::new();
    let mut page = 1;
    while holders.len() < max {
        let batch = fetch(page).await?;
        let last_page = batch.len() < page_size;
        holders.extend(batch);
        if last_page {
            break;
        }
        page += 1;
    }
    holders.truncate(max);
    tracing::debug!(target: "leaderboard", count = holders.len(), pages = page, "Collected token holders");
    Ok(holders)
}

pub struct OklinkExplorer {
    client: Client,
    url: String,
    api_key: String,
}

impl OklinkExplorer {
    pub fn new(client: Client, url: &str, api_key: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn fetch_page(&self, token: Address, page: usize) -> Result<Vec<String>, AppError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| AppError::Config(format!("Invalid explorer url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("chainShortName", EXPLORER_CHAIN_SHORT_NAME)
            .append_pair("tokenContractAddress", &format!("{token:#x}"))
            .append_pair("page", &page.to_string())
            .append_pair("limit", &LEADERBOARD_PAGE_SIZE.to_string());

        let resp = self
            .client
            .get(url)
            .header(ACCESS_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("{PROVIDER} request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::ApiCall {
                provider: PROVIDER.into(),
                status: resp.status().as_u16(),
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| AppError::Connection(format!("{PROVIDER} body read failed: {e}")))?;
        parse_position_page(&body)
    }
}

#[async_trait]
impl HolderSource for OklinkExplorer {
    async fn holders(&self, token: Address, max: usize) -> Result<Vec<String>, AppError> {
        collect_pages(max, LEADERBOARD_PAGE_SIZE, |page| self.fetch_page(token, page)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves `sizes[page - 1]` holders per page and records requested pages.
    struct Pages {
        sizes: Vec<usize>,
        fail_on: Option<usize>,
        requested: Mutex<Vec<usize>>,
    }

    impl Pages {
        fn new(sizes: &[usize]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                fail_on: None,
                requested: Mutex::new(Vec::new()),
            }
        }

        async fn fetch(&self, page: usize) -> Result<Vec<String>, AppError> {
            self.requested.lock().unwrap().push(page);
            if self.fail_on == Some(page) {
                return Err(AppError::ApiCall {
                    provider: PROVIDER.into(),
                    status: 429,
                });
            }
            let size = self.sizes.get(page - 1).copied().unwrap_or(0);
            Ok((0..size).map(|i| format!("0x{page:02}{i:04}")).collect())
        }
    }

    #[tokio::test]
    async fn stops_at_short_page() {
        let pages = Pages::new(&[100, 100, 30, 100]);
        let holders = collect_pages(400, 100, |p| pages.fetch(p)).await.unwrap();
        assert_eq!(holders.len(), 230);
        assert_eq!(*pages.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stops_at_cap_and_truncates_mid_page() {
        let pages = Pages::new(&[100, 100, 100, 100, 100]);
        let holders = collect_pages(150, 100, |p| pages.fetch(p)).await.unwrap();
        assert_eq!(holders.len(), 150);
        assert_eq!(holders[149], "0x020049");
        assert_eq!(*pages.requested.lock().unwrap(), vec![1, 2]);

        let pages = Pages::new(&[100; 6]);
        let holders = collect_pages(400, 100, |p| pages.fetch(p)).await.unwrap();
        assert_eq!(holders.len(), 400);
        assert_eq!(*pages.requested.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn error_on_a_middle_page_propagates() {
        let mut pages = Pages::new(&[100, 100, 100]);
        pages.fail_on = Some(2);
        let err = collect_pages(400, 100, |p| pages.fetch(p)).await.unwrap_err();
        assert!(matches!(err, AppError::ApiCall { status: 429, .. }));
        assert_eq!(*pages.requested.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn extracts_holder_addresses() {
        let body = br#"{"code":"0","msg":"","data":[{"page":"1","positionList":[
            {"holderAddress":"0xaaa","amount":"10"},
            {"holderAddress":"0xbbb","amount":"5"}
        ]}]}"#;
        assert_eq!(parse_position_page(body).unwrap(), vec!["0xaaa", "0xbbb"]);
    }

    #[test]
    fn empty_data_is_an_empty_page() {
        let body = br#"{"code":"0","msg":"","data":[]}"#;
        assert!(parse_position_page(body).unwrap().is_empty());
    }

    #[test]
    fn non_zero_code_is_an_error() {
        let body = br#"{"code":"50011","msg":"rate limited","data":[]}"#;
        let err = parse_position_page(body).unwrap_err();
        assert!(matches!(err, AppError::ApiCall { status: 50011, .. }));
    }
}
