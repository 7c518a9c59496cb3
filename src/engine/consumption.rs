use crate::model::Inventory;

use super::resolver::Resolution;

// ── Consumption Tracker ───────────────────────────────────────────

/// Remove every reagent record a successful resolution consumed from the
/// working inventory, so later resolutions in the same pass observe reduced
/// availability. No-op for `Empty` and `Insufficient` resolutions.
///
/// Must be called exactly once per successful resolution, in the order the
/// parameter builder issued them. Returns the number of records removed.
pub fn commit(working: &mut Inventory, resolution: &Resolution) -> usize {
    let ids = resolution.consumable_ids();
    if ids.is_empty() {
        return 0;
    }
    let removed = working.remove_reagents(ids);
    metrics::counter!(crate::observability::REAGENTS_CONSUMED_TOTAL).increment(removed as u64);
    tracing::debug!(removed, "committed consumption");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::resolver::{PickedWell, ResolvedSource};
    use crate::model::Reagent;
    use ulid::Ulid;

    fn media_reagent() -> Reagent {
        Reagent {
            id: Ulid::new(),
            well_id: Ulid::new(),
            name: "Complete Media".into(),
            volume: 2.0,
            expires_at: None,
        }
    }

    #[test]
    fn commit_removes_matched_reagents() {
        let consumed = media_reagent();
        let untouched = media_reagent();
        let mut working = Inventory {
            reagents: vec![consumed.clone(), untouched.clone()],
            ..Default::default()
        };
        let resolution = Resolution::Matched(ResolvedSource {
            plate_id: Ulid::new(),
            plate_barcode: "BC0001".into(),
            nest_id: None,
            wells: vec![PickedWell {
                well_id: consumed.well_id,
                position: "A1".into(),
            }],
            consumable_ids: vec![consumed.id],
        });

        assert_eq!(commit(&mut working, &resolution), 1);
        assert_eq!(working.reagents, vec![untouched]);
        // Committing again is a no-op: the ids are already gone.
        assert_eq!(commit(&mut working, &resolution), 0);
    }

    #[test]
    fn commit_ignores_empty_and_insufficient() {
        let mut working = Inventory {
            reagents: vec![media_reagent()],
            ..Default::default()
        };
        let before = working.clone();

        assert_eq!(commit(&mut working, &Resolution::Empty), 0);
        assert_eq!(
            commit(
                &mut working,
                &Resolution::Insufficient {
                    consumable: "Complete Media".into(),
                    needed: 3
                }
            ),
            0
        );
        assert_eq!(working, before);
    }
}
