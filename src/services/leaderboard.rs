// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::types::HolderEnergy;
use crate::network::explorer::HolderSource;
use crate::network::factory_api::EnergySource;
use alloy::primitives::Address;
use futures::future::join_all;

/// Sort by total energy, highest first, and keep `top`.
pub fn rank_holders(mut rows: Vec<HolderEnergy>, top: usize) -> Vec<HolderEnergy> {
    rows.sort_by(|a, b| b.total_energy.total_cmp(&a.total_energy));
    rows.truncate(top);
    rows
}

/// Fetch every holder's energy concurrently. A failed lookup drops that
/// holder; it never aborts the others.
pub async fn collect_energy(energy: &dyn EnergySource, holders: &[String]) -> Vec<HolderEnergy> {
    let lookups = holders.iter().map(|holder| async move {
        match energy.energy_of(holder).await {
            Ok(total_energy) => Some(HolderEnergy {
                address: holder.clone(),
                total_energy,
            }),
            Err(e) => {
                tracing::warn!(target: "leaderboard", holder = %holder, error = %e, "Energy lookup failed");
                None
            }
        }
    });
    join_all(lookups).await.into_iter().flatten().collect()
}

pub async fn energy_leaderboard(
    holders: &dyn HolderSource,
    energy: &dyn EnergySource,
    token: Address,
    max_holders: usize,
    top: usize,
) -> Result<Vec<HolderEnergy>, AppError> {
    let addresses = holders.holders(token, max_holders).await?;
    let rows = collect_energy(energy, &addresses).await;
    tracing::info!(
        target: "leaderboard",
        holders = addresses.len(),
        resolved = rows.len(),
        "Collected holder energy"
    );
    Ok(rank_holders(rows, top))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(address: &str, total_energy: f64) -> HolderEnergy {
        HolderEnergy {
            address: address.into(),
            total_energy,
        }
    }

    #[test]
    fn ranks_descending_and_truncates() {
        let rows = vec![row("a", 1.0), row("b", 9.5), row("c", 4.0), row("d", 12.0)];
        let ranked = rank_holders(rows, 3);
        let order: Vec<&str> = ranked.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "c"]);
    }
}
