// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::{ErrorKind, PipelineError};
use crate::domain::types::{Asset, BatchPlan, ChargeRatio, Classification, Thresholds};
use crate::network::factory_api::InventorySource;
use crate::services::recharge::{allocator, classifier};
use alloy::primitives::Address;

/// Per-account planning context: the last inventory snapshot and the
/// caller's current knobs. Classification and plans are derived on demand.
#[derive(Debug, Clone)]
pub struct Session {
    owner: Address,
    assets: Vec<Asset>,
    thresholds: Thresholds,
    ratio: ChargeRatio,
    max_batch: usize,
}

impl Session {
    pub fn new(owner: Address, thresholds: Thresholds, ratio: ChargeRatio, max_batch: usize) -> Self {
        Self {
            owner,
            assets: Vec::new(),
            thresholds,
            ratio,
            max_batch,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn ratio(&self) -> ChargeRatio {
        self.ratio
    }

    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Replace the snapshot with a fresh fetch. On failure the old snapshot is kept.
    pub async fn refresh(&mut self, source: &dyn InventorySource) -> Result<usize, PipelineError> {
        let assets = source.resting_assets(self.owner).await.map_err(|e| {
            PipelineError::new(ErrorKind::InventoryUnavailable, e.to_string())
        })?;
        tracing::info!(target: "inventory", owner = %self.owner, count = assets.len(), "Inventory refreshed");
        self.assets = assets;
        Ok(self.assets.len())
    }

    pub fn load(&mut self, assets: Vec<Asset>) {
        self.assets = assets;
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    pub fn set_ratio(&mut self, ratio: ChargeRatio) {
        self.ratio = ratio;
    }

    pub fn classification(&self) -> Classification {
        classifier::classify(&self.assets, self.thresholds)
    }

    /// Allocate over the snapshot in inventory order.
    pub fn plan(&self) -> Result<BatchPlan, PipelineError> {
        let classes = self.classification();
        allocator::allocate(
            &classes.destroyable_ids(),
            &classes.chargeable_ids(),
            self.ratio,
            self.max_batch,
        )
    }
}
