mod consumption;
mod error;
mod index;
mod params;
mod requirements;
mod resolver;

pub use consumption::commit;
pub use error::EngineError;
pub use index::{Owner, OwnershipIndex};
pub use params::{ParamValue, Params, UNRESOLVED_MARKER};
pub use requirements::{quantity_needed, ConsumableClass, Phase, TipSize};
pub use resolver::{resolve, resolve_tip_boxes, PickedWell, ResolvedSource, Resolution};

use crate::model::{Id, Inventory, PlateFormat};

/// One resolution pass over one inventory snapshot.
///
/// The engine owns two independent copies of the snapshot: `raw` is never
/// touched and backs location lookups and the audit trail; `working` is
/// consumed as phases resolve, so each resolution sees what the previous
/// ones left behind. An engine serves a single routine and is then either
/// discarded or drained via [`Engine::into_working`] to seed the next
/// engine in the routine queue.
pub struct Engine {
    raw: Inventory,
    working: Inventory,
    index: OwnershipIndex,
    consumed: Vec<Id>,
}

impl Engine {
    pub fn new(snapshot: Inventory) -> Self {
        let index = OwnershipIndex::build(&snapshot);
        Self {
            working: snapshot.clone(),
            raw: snapshot,
            index,
            consumed: Vec::new(),
        }
    }

    /// The snapshot as it was at construction.
    pub fn raw(&self) -> &Inventory {
        &self.raw
    }

    /// The snapshot minus everything consumed so far.
    pub fn working(&self) -> &Inventory {
        &self.working
    }

    pub fn index(&self) -> &OwnershipIndex {
        &self.index
    }

    /// Ids of every reagent record consumed by this engine, in commit order.
    /// The persistence layer decrements these after the pass.
    pub fn consumed_ids(&self) -> &[Id] {
        &self.consumed
    }

    /// Surrender the working inventory, e.g. to seed the engine for the next
    /// routine in a FIFO queue.
    pub fn into_working(self) -> Inventory {
        self.working
    }

    pub(super) fn resolve(
        &self,
        consumable: &str,
        quantity: u32,
        format_hint: Option<PlateFormat>,
    ) -> Resolution {
        resolver::resolve(&self.working, &self.index, consumable, quantity, format_hint)
    }

    pub(super) fn resolve_tip_boxes(
        &self,
        requests: &[(TipSize, u32)],
    ) -> std::collections::HashMap<TipSize, Resolution> {
        resolver::resolve_tip_boxes(&self.working, &self.index, requests)
    }

    /// Commit a resolution against the working inventory and record the
    /// consumed ids in the engine ledger.
    pub(super) fn take(&mut self, resolution: &Resolution) -> usize {
        self.consumed.extend_from_slice(resolution.consumable_ids());
        consumption::commit(&mut self.working, resolution)
    }
}
