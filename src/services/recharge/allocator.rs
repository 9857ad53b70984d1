// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::{ErrorKind, PipelineError};
use crate::domain::types::{AssetId, BatchPlan, ChargeRatio};

/// Number of recycle groups a plan can hold.
pub fn plan_size(destroyable: usize, chargeable: usize, ratio: usize, max_batch: usize) -> usize {
    if ratio == 0 {
        return 0;
    }
    (destroyable / ratio).min(chargeable).min(max_batch)
}

/// Pair contiguous `ratio`-sized slices of `destroyable` with the first
/// charge targets, in input order.
///
/// The caller decides which assets go first by ordering the inputs. Fails with
/// `InsufficientInventory` when not even one group can be formed.
pub fn allocate(
    destroyable: &[AssetId],
    chargeable: &[AssetId],
    ratio: ChargeRatio,
    max_batch: usize,
) -> Result<BatchPlan, PipelineError> {
    let ratio = ratio.get();
    let n = plan_size(destroyable.len(), chargeable.len(), ratio, max_batch);
    if n == 0 {
        return Err(PipelineError::new(
            ErrorKind::InsufficientInventory,
            format!(
                "{} recyclable / {} chargeable assets cannot fill one group of {} (max batch {})",
                destroyable.len(),
                chargeable.len(),
                ratio,
                max_batch
            ),
        ));
    }

    let recycle_groups: Vec<Vec<AssetId>> = destroyable
        .chunks_exact(ratio)
        .take(n)
        .map(<[AssetId]>::to_vec)
        .collect();
    let charge_targets = chargeable[..n].to_vec();

    tracing::debug!(
        target: "inventory",
        groups = n,
        ratio,
        unused = destroyable.len() - n * ratio,
        "Allocated batch plan"
    );
    Ok(BatchPlan::from_parts(recycle_groups, charge_targets, ratio))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(r: u8) -> ChargeRatio {
        ChargeRatio::new(r).unwrap()
    }

    #[test]
    fn twenty_three_recyclable_five_chargeable_ratio_seven() {
        let destroyable: Vec<u64> = (1..=23).collect();
        let chargeable: Vec<u64> = (101..=105).collect();
        let plan = allocate(&destroyable, &chargeable, ratio(7), 100).unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.recycle_groups()[0], (1..=7).collect::<Vec<_>>());
        assert_eq!(plan.recycle_groups()[1], (8..=14).collect::<Vec<_>>());
        assert_eq!(plan.recycle_groups()[2], (15..=21).collect::<Vec<_>>());
        assert_eq!(plan.charge_targets(), &[101, 102, 103]);
        assert_eq!(plan.summary(), "charged 3 assets for 7 days, recycled 21 assets");
    }

    #[test]
    fn ratio_larger_than_inventory_is_insufficient() {
        let err = allocate(&[1, 2, 3], &[10], ratio(7), 100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientInventory);
    }

    #[test]
    fn no_charge_targets_is_insufficient() {
        let err = allocate(&[1, 2, 3, 4], &[], ratio(1), 100).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientInventory);
    }

    #[test]
    fn max_batch_caps_group_count() {
        let destroyable: Vec<u64> = (0..1_000).collect();
        let chargeable: Vec<u64> = (5_000..5_500).collect();
        let plan = allocate(&destroyable, &chargeable, ratio(2), 100).unwrap();
        assert_eq!(plan.len(), 100);
        assert_eq!(plan.recycled_count(), 200);
    }

    #[test]
    fn size_law_and_prefix_property_hold_across_inputs() {
        for d in 0..30usize {
            for c in 0..8usize {
                for r in 1..=7u8 {
                    for max_batch in [1usize, 3, 100] {
                        let destroyable: Vec<u64> = (0..d as u64).collect();
                        let chargeable: Vec<u64> = (1_000..1_000 + c as u64).collect();
                        let expected = (d / r as usize).min(c).min(max_batch);
                        match allocate(&destroyable, &chargeable, ratio(r), max_batch) {
                            Ok(plan) => {
                                assert_eq!(plan.recycle_groups().len(), expected);
                                assert_eq!(plan.charge_targets().len(), expected);
                                assert!(plan.recycle_groups().iter().all(|g| g.len() == r as usize));
                                let flat: Vec<u64> =
                                    plan.recycle_groups().iter().flatten().copied().collect();
                                assert_eq!(flat, &destroyable[..expected * r as usize]);
                            }
                            Err(err) => {
                                assert_eq!(expected, 0);
                                assert_eq!(err.kind, ErrorKind::InsufficientInventory);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_plans() {
        let destroyable: Vec<u64> = (1..=40).rev().collect();
        let chargeable = vec![900, 901, 902];
        let a = allocate(&destroyable, &chargeable, ratio(5), 100).unwrap();
        let b = allocate(&destroyable, &chargeable, ratio(5), 100).unwrap();
        assert_eq!(a, b);
    }
}
