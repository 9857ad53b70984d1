// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::{deserialize_f64_lenient, deserialize_u64_lenient};
use crate::domain::constants::{
    DEFAULT_CHARGE_FLOOR, DEFAULT_CHARGE_RATIO, DEFAULT_DESTROY_CEILING, MAX_CHARGE_RATIO,
    MIN_CHARGE_RATIO,
};
use crate::domain::error::AppError;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type AssetId = u64;

/// A resting life as reported by the inventory collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(alias = "tokenId", deserialize_with = "deserialize_u64_lenient")]
    pub id: AssetId,
    /// Hash rate.
    #[serde(alias = "hashRate", deserialize_with = "deserialize_f64_lenient")]
    pub value: f64,
    #[serde(alias = "roleImage", default)]
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Assets strictly below this hash rate may be recycled.
    pub destroy_ceiling: f64,
    /// Assets strictly above this hash rate may be charged.
    pub charge_floor: f64,
}

impl Thresholds {
    /// Rejects non-finite bounds and a ceiling above the floor, which would let
    /// one asset be both recycled and charged.
    pub fn new(destroy_ceiling: f64, charge_floor: f64) -> Result<Self, AppError> {
        if !destroy_ceiling.is_finite() || !charge_floor.is_finite() {
            return Err(AppError::Validation {
                field: "thresholds".into(),
                message: "thresholds must be finite numbers".into(),
            });
        }
        if destroy_ceiling > charge_floor {
            return Err(AppError::Validation {
                field: "thresholds".into(),
                message: format!(
                    "destroy ceiling {destroy_ceiling} is above charge floor {charge_floor}"
                ),
            });
        }
        Ok(Self {
            destroy_ceiling,
            charge_floor,
        })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            destroy_ceiling: DEFAULT_DESTROY_CEILING,
            charge_floor: DEFAULT_CHARGE_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub destroyable: Vec<Asset>,
    pub chargeable: Vec<Asset>,
}

impl Classification {
    pub fn destroyable_ids(&self) -> Vec<AssetId> {
        self.destroyable.iter().map(|a| a.id).collect()
    }

    pub fn chargeable_ids(&self) -> Vec<AssetId> {
        self.chargeable.iter().map(|a| a.id).collect()
    }
}

/// Assets recycled per charge target, which is also the number of days granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChargeRatio(u8);

impl ChargeRatio {
    pub fn new(ratio: u8) -> Result<Self, AppError> {
        if (MIN_CHARGE_RATIO..=MAX_CHARGE_RATIO).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(AppError::Validation {
                field: "charge_ratio".into(),
                message: format!(
                    "{ratio} is outside {MIN_CHARGE_RATIO}..={MAX_CHARGE_RATIO}"
                ),
            })
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for ChargeRatio {
    fn default() -> Self {
        Self(DEFAULT_CHARGE_RATIO)
    }
}

impl TryFrom<u64> for ChargeRatio {
    type Error = AppError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let narrowed = u8::try_from(value).map_err(|_| AppError::Validation {
            field: "charge_ratio".into(),
            message: format!("{value} is outside {MIN_CHARGE_RATIO}..={MAX_CHARGE_RATIO}"),
        })?;
        Self::new(narrowed)
    }
}

/// Paired recycle groups and charge targets for one `batchRecycle` call.
///
/// Only the allocator builds plans, so every group holds exactly `ratio` ids
/// and `recycle_groups.len() == charge_targets.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    recycle_groups: Vec<Vec<AssetId>>,
    charge_targets: Vec<AssetId>,
    ratio: usize,
}

impl BatchPlan {
    pub(crate) fn from_parts(
        recycle_groups: Vec<Vec<AssetId>>,
        charge_targets: Vec<AssetId>,
        ratio: usize,
    ) -> Self {
        debug_assert_eq!(recycle_groups.len(), charge_targets.len());
        debug_assert!(recycle_groups.iter().all(|g| g.len() == ratio));
        Self {
            recycle_groups,
            charge_targets,
            ratio,
        }
    }

    pub fn recycle_groups(&self) -> &[Vec<AssetId>] {
        &self.recycle_groups
    }

    pub fn charge_targets(&self) -> &[AssetId] {
        &self.charge_targets
    }

    pub fn ratio(&self) -> usize {
        self.ratio
    }

    pub fn len(&self) -> usize {
        self.charge_targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charge_targets.is_empty()
    }

    pub fn recycled_count(&self) -> usize {
        self.recycle_groups.len() * self.ratio
    }

    pub fn charged_count(&self) -> usize {
        self.charge_targets.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "charged {} assets for {} days, recycled {} assets",
            self.charged_count(),
            self.ratio,
            self.recycled_count()
        )
    }

    /// ABI shape of `batchRecycle(uint256[][] recycle_array, uint256[] charge_ids)`.
    pub fn to_call_args(&self) -> (Vec<Vec<U256>>, Vec<U256>) {
        let groups = self
            .recycle_groups
            .iter()
            .map(|g| g.iter().map(|id| U256::from(*id)).collect())
            .collect();
        let targets = self.charge_targets.iter().map(|id| U256::from(*id)).collect();
        (groups, targets)
    }
}

/// A mintable gene template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(alias = "tokenId", deserialize_with = "deserialize_u64_lenient")]
    pub id: u64,
    #[serde(alias = "livingNum", default, deserialize_with = "deserialize_u64_lenient")]
    pub living_count: u64,
    #[serde(alias = "numStr", default)]
    pub label: String,
    /// Mint price in wei, attached after the catalog fetch.
    #[serde(default)]
    pub price: U256,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderEnergy {
    pub address: String,
    pub total_energy: f64,
}

impl fmt::Display for HolderEnergy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.address, self.total_energy)
    }
}
