use std::collections::{BTreeMap, HashMap};

use crate::model::{Id, Inventory, PlateFormat};

use super::index::OwnershipIndex;
use super::requirements::TipSize;

// ── Candidate Resolver ────────────────────────────────────────────

/// Rows a column must fill before a multichannel pick may use it. Both
/// multichannel formats are checked against eight rows; see DESIGN.md for
/// the 384-well discussion.
pub(crate) const FULL_COLUMN_ROWS: usize = 8;

/// Minimum count of full columns a candidate plate must offer before any
/// wells are sliced from it.
fn required_full_columns(format: PlateFormat) -> usize {
    match format {
        PlateFormat::NinetySixWell => 2,
        PlateFormat::ThreeEightyFourWell => 3,
        _ => 0,
    }
}

/// One well selected from a stock plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedWell {
    pub well_id: Id,
    /// Positional string (`"B7"`) for the downstream command builders.
    pub position: String,
}

/// A successful match: the chosen plate plus the wells and the reagent
/// records backing them. `consumable_ids` is the audit trail the external
/// persistence layer later decrements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub plate_id: Id,
    pub plate_barcode: String,
    pub nest_id: Option<Id>,
    pub wells: Vec<PickedWell>,
    pub consumable_ids: Vec<Id>,
}

/// Outcome of one resolution. Shortage is data, not an error: the engine
/// never raises from an insufficient inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(ResolvedSource),
    /// Zero-quantity request; nothing to allocate, nothing consumed.
    Empty,
    Insufficient { consumable: String, needed: u32 },
}

impl Resolution {
    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }

    pub fn consumable_ids(&self) -> &[Id] {
        match self {
            Resolution::Matched(source) => &source.consumable_ids,
            _ => &[],
        }
    }
}

/// Search the working inventory for `quantity` wells holding `consumable`
/// on a single eligible stock plate.
///
/// Candidate plates are visited in snapshot order and the first plate that
/// satisfies the quantity wins — first fit, no scoring. Only plates the
/// ownership index classifies as bulk storage are considered, so a media
/// plate seated in an active tool never gets raided mid-protocol.
///
/// When `format_hint` names a multichannel format the match must line up
/// with multichannel pipetting: only plates of that format are considered,
/// wells are grouped by column, and wells are sliced exclusively from full
/// columns after the plate shows at least the required number of them.
pub fn resolve(
    working: &Inventory,
    index: &OwnershipIndex,
    consumable: &str,
    quantity: u32,
    format_hint: Option<PlateFormat>,
) -> Resolution {
    if quantity == 0 {
        return Resolution::Empty;
    }

    // One well, one consumable unit: first matching reagent per well.
    let mut by_well: HashMap<Id, Id> = HashMap::new();
    for reagent in &working.reagents {
        if reagent.name == consumable {
            by_well.entry(reagent.well_id).or_insert(reagent.id);
        }
    }

    let multichannel_hint = format_hint.filter(|f| f.is_multichannel());

    for plate in &working.plates {
        if !index.is_bulk_storage(plate.id) {
            continue;
        }
        if let Some(hint) = multichannel_hint
            && plate.plate_type != hint
        {
            continue;
        }

        let picked = if multichannel_hint.is_some() {
            pick_full_columns(working, plate.id, plate.plate_type, &by_well, quantity)
        } else {
            pick_first_fit(working, plate.id, &by_well, quantity)
        };

        if let Some((wells, consumable_ids)) = picked {
            tracing::debug!(
                consumable,
                quantity,
                plate = %plate.barcode,
                "resolved consumable"
            );
            metrics::counter!(crate::observability::RESOLUTIONS_TOTAL).increment(1);
            return Resolution::Matched(ResolvedSource {
                plate_id: plate.id,
                plate_barcode: plate.barcode.clone(),
                nest_id: plate.nest_id,
                wells,
                consumable_ids,
            });
        }
    }

    tracing::warn!(consumable, quantity, "insufficient inventory");
    metrics::counter!(crate::observability::RESOLUTIONS_INSUFFICIENT_TOTAL).increment(1);
    Resolution::Insufficient {
        consumable: consumable.to_string(),
        needed: quantity,
    }
}

/// Simple formats: first `quantity` matched wells in the plate's stored
/// well order.
fn pick_first_fit(
    working: &Inventory,
    plate_id: Id,
    by_well: &HashMap<Id, Id>,
    quantity: u32,
) -> Option<(Vec<PickedWell>, Vec<Id>)> {
    let mut wells = Vec::new();
    let mut ids = Vec::new();
    for well in working.wells_of(plate_id) {
        let Some(&reagent_id) = by_well.get(&well.id) else {
            continue;
        };
        wells.push(PickedWell {
            well_id: well.id,
            position: well.position(),
        });
        ids.push(reagent_id);
        if wells.len() == quantity as usize {
            return Some((wells, ids));
        }
    }
    None
}

/// Multichannel formats: group matched wells by column, keep only full
/// columns, and slice the first `quantity` wells from the concatenated
/// full-column set (ascending column order). A plate with too few full
/// columns — or not enough wells inside them — is skipped entirely; partial
/// columns are never allocated.
fn pick_full_columns(
    working: &Inventory,
    plate_id: Id,
    format: PlateFormat,
    by_well: &HashMap<Id, Id>,
    quantity: u32,
) -> Option<(Vec<PickedWell>, Vec<Id>)> {
    let mut columns: BTreeMap<u32, Vec<(PickedWell, Id)>> = BTreeMap::new();
    for well in working.wells_of(plate_id) {
        let Some(&reagent_id) = by_well.get(&well.id) else {
            continue;
        };
        columns.entry(well.column).or_default().push((
            PickedWell {
                well_id: well.id,
                position: well.position(),
            },
            reagent_id,
        ));
    }

    let full: Vec<&Vec<(PickedWell, Id)>> = columns
        .values()
        .filter(|wells| wells.len() == FULL_COLUMN_ROWS)
        .collect();
    if full.len() < required_full_columns(format) {
        return None;
    }
    if full.iter().map(|c| c.len()).sum::<usize>() < quantity as usize {
        return None;
    }

    let mut wells = Vec::with_capacity(quantity as usize);
    let mut ids = Vec::with_capacity(quantity as usize);
    for (well, reagent_id) in full.into_iter().flatten() {
        wells.push(well.clone());
        ids.push(*reagent_id);
        if wells.len() == quantity as usize {
            break;
        }
    }
    Some((wells, ids))
}

/// Resolve one tip box per requested size. Same algorithm as any other
/// consumable, keyed by the tip-size consumable name.
pub fn resolve_tip_boxes(
    working: &Inventory,
    index: &OwnershipIndex,
    requests: &[(TipSize, u32)],
) -> HashMap<TipSize, Resolution> {
    requests
        .iter()
        .map(|&(size, quantity)| {
            (size, resolve(working, index, size.label(), quantity, None))
        })
        .collect()
}
