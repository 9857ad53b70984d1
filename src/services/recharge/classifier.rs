// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::types::{Asset, Classification, Thresholds};

/// Split an inventory into recyclable and chargeable assets.
///
/// Both bounds are strict: an asset whose hash rate equals the ceiling or the
/// floor lands in neither set. Input order is preserved within each set.
pub fn classify(assets: &[Asset], thresholds: Thresholds) -> Classification {
    let destroyable = assets
        .iter()
        .filter(|a| a.value < thresholds.destroy_ceiling)
        .cloned()
        .collect();
    let chargeable = assets
        .iter()
        .filter(|a| a.value > thresholds.charge_floor)
        .cloned()
        .collect();
    Classification {
        destroyable,
        chargeable,
    }
}
