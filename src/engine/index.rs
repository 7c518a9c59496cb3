use std::collections::HashMap;

use crate::model::{Id, Inventory};

/// Where a plate currently sits, derived from `plate.nest_id → nest →
/// instrument`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub instrument_id: Option<Id>,
    /// Lowercased instrument class ("liconic", "hotel", "bravo", …).
    pub instrument_kind: Option<String>,
    /// Nest belongs to a static hotel rather than a driven instrument.
    pub hotel: bool,
}

/// Instrument classes that count as bulk/static storage. Plates seated
/// anywhere else (or checked out entirely) are in active processing and must
/// not be raided for consumables.
const STORAGE_KINDS: &[&str] = &["liconic", "hotel", "carousel"];

/// Plate id → owning instrument, built once from the raw snapshot and never
/// updated during a resolution pass. Used purely as a classification filter.
#[derive(Debug, Default)]
pub struct OwnershipIndex {
    owners: HashMap<Id, Owner>,
}

impl OwnershipIndex {
    pub fn build(inventory: &Inventory) -> Self {
        let mut owners = HashMap::new();
        for plate in &inventory.plates {
            let Some(nest_id) = plate.nest_id else {
                continue;
            };
            let Some(nest) = inventory.nest(nest_id) else {
                continue;
            };
            let instrument = nest
                .instrument_id
                .and_then(|id| inventory.instrument(id));
            owners.insert(
                plate.id,
                Owner {
                    instrument_id: instrument.map(|i| i.id),
                    instrument_kind: instrument.map(|i| i.kind.to_ascii_lowercase()),
                    hotel: nest.hotel_id.is_some(),
                },
            );
        }
        Self { owners }
    }

    pub fn owner(&self, plate_id: Id) -> Option<&Owner> {
        self.owners.get(&plate_id)
    }

    /// True if the plate may be treated as bulk reagent/tip storage: it sits
    /// in a hotel nest or on a storage-class instrument. Plates without a
    /// known owner are never eligible.
    pub fn is_bulk_storage(&self, plate_id: Id) -> bool {
        let Some(owner) = self.owners.get(&plate_id) else {
            return false;
        };
        if owner.hotel {
            return true;
        }
        owner
            .instrument_kind
            .as_deref()
            .is_some_and(|kind| STORAGE_KINDS.contains(&kind))
    }
}
