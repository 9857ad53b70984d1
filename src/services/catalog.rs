// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::types::CatalogEntry;
use crate::network::factory_api::CatalogSource;
use crate::network::price_feed::PriceStrategy;
use alloy::primitives::U256;
use std::collections::HashMap;

/// Attach prices, sort ascending (stable, so ties keep catalog order) and
/// keep the cheapest `preview` entries.
pub fn rank_by_price(
    mut entries: Vec<CatalogEntry>,
    prices: &HashMap<u64, U256>,
    preview: usize,
) -> Vec<CatalogEntry> {
    for entry in &mut entries {
        entry.price = prices.get(&entry.id).copied().unwrap_or(U256::ZERO);
    }
    entries.sort_by(|a, b| a.price.cmp(&b.price));
    entries.truncate(preview);
    entries
}

pub async fn load_priced_catalog(
    catalog: &dyn CatalogSource,
    strategy: &dyn PriceStrategy,
    preview: usize,
) -> Result<Vec<CatalogEntry>, AppError> {
    let entries = catalog.catalog().await?;
    let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
    let prices = strategy.resolve_prices(&ids).await?;
    tracing::info!(
        target: "pricing",
        strategy = strategy.name(),
        genes = ids.len(),
        priced = prices.len(),
        "Resolved gene prices"
    );
    Ok(rank_by_price(entries, &prices, preview))
}
