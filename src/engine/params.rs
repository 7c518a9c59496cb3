use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::model::{Id, NestLocation, Plate, PlateFormat};
use crate::routine::{
    ImagingRequest, MediaExchangeRequest, PassageRequest, Routine, TransfectRequest,
};

use super::requirements::{quantity_needed, ConsumableClass, Phase, TipSize};
use super::resolver::Resolution;
use super::{Engine, EngineError};

// ── Protocol Parameter Builder ────────────────────────────────────

/// Legacy sentinel the downstream command builders expect for fields the
/// engine could not resolve. [`ParamValue::Unresolved`] serializes to this.
pub const UNRESOLVED_MARKER: &str = "unknown";

/// One value in the flat parameter map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Number(i64),
    List(Vec<String>),
    /// Could not be resolved from inventory; the operator fills the gap
    /// manually. Distinguishable from real data, unlike a magic string.
    Unresolved,
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Text(s) => serializer.serialize_str(s),
            ParamValue::Number(n) => serializer.serialize_i64(*n),
            ParamValue::List(items) => items.serialize(serializer),
            ParamValue::Unresolved => serializer.serialize_str(UNRESOLVED_MARKER),
        }
    }
}

/// Flat parameter map consumed by downstream protocol/command generation.
/// Keys are sorted for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn set(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn is_unresolved(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(ParamValue::Unresolved))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .values
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    ParamValue::Text(s) => serde_json::Value::String(s.clone()),
                    ParamValue::Number(n) => serde_json::Value::from(*n),
                    ParamValue::List(items) => {
                        serde_json::Value::from(items.clone())
                    }
                    ParamValue::Unresolved => {
                        serde_json::Value::String(UNRESOLVED_MARKER.into())
                    }
                };
                (k.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Arm teach-point slot numbers keyed by instrument class. Static per
/// workcell build; locations outside the table yield `Unresolved`.
const SLOT_TABLE: &[(&str, i64)] = &[
    ("liconic", 1),
    ("hotel", 2),
    ("carousel", 3),
    ("bravo", 4),
    ("pf400", 5),
    ("centrifuge", 6),
    ("microscope", 7),
    ("tip_hotel", 8),
];

fn slot_number(instrument_kind: &str) -> Option<i64> {
    let kind = instrument_kind.to_ascii_lowercase();
    SLOT_TABLE
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|&(_, slot)| slot)
}

impl Engine {
    /// Build the parameter map for one routine, resolving and consuming
    /// inventory phase by phase.
    ///
    /// Insufficient inventory never fails the build: affected fields carry
    /// [`ParamValue::Unresolved`] and later phases still run against
    /// whatever was left. The two hard failures are a malformed request and
    /// a passage with no destination plate at all.
    pub fn build_params(&mut self, routine: &Routine) -> Result<Params, EngineError> {
        routine.validate()?;
        let label = crate::observability::routine_label(routine);
        tracing::debug!(routine = label, "building routine parameters");

        let result = match routine {
            Routine::MediaExchange(req) => self.build_media_exchange(req),
            Routine::Passage(req) => self.build_passage(req),
            Routine::Transfect(req) => self.build_transfect(req),
            Routine::ImageCulturePlate(req) => self.build_imaging(req),
        };
        metrics::counter!(crate::observability::ROUTINES_TOTAL, "routine" => label).increment(1);
        result
    }

    fn build_media_exchange(&mut self, req: &MediaExchangeRequest) -> Result<Params, EngineError> {
        let mut params = self.common_params("Media Exchange", req.plate_id, &req.wells, &req.workflow_step_ids)?;
        params.set("media_type", ParamValue::Text(req.media_type.clone()));
        params.set("percent_change", ParamValue::Number(req.percent_change as i64));

        let wells = req.wells.len() as u32;
        let media_quantity = quantity_needed(
            ConsumableClass::Media,
            req.plate_type,
            Phase::MediaExchange,
            wells,
            req.percent_change,
        );
        let media = self.resolve(&req.media_type, media_quantity, Some(req.plate_type));
        self.take(&media);
        self.write_resolution(&mut params, "media", &media);

        let tip_requests = [
            (
                TipSize::Ul300,
                quantity_needed(
                    ConsumableClass::Tip(TipSize::Ul300),
                    req.plate_type,
                    Phase::MediaExchange,
                    wells,
                    req.percent_change,
                ),
            ),
            (
                TipSize::Ul1000,
                quantity_needed(
                    ConsumableClass::Tip(TipSize::Ul1000),
                    req.plate_type,
                    Phase::MediaExchange,
                    wells,
                    req.percent_change,
                ),
            ),
        ];
        self.write_tip_boxes(&mut params, &tip_requests);

        self.finish(&mut params);
        Ok(params)
    }

    fn build_passage(&mut self, req: &PassageRequest) -> Result<Params, EngineError> {
        let mut params = self.common_params("Passage", req.plate_id, &req.wells, &req.workflow_step_ids)?;
        params.set("media_type", ParamValue::Text(req.media_type.clone()));

        // The destination is a hard requirement: without a plate to split
        // into, the routine cannot run at all.
        let destination = self
            .find_destination_plate(req.plate_id, req.target_plate_type)
            .ok_or(EngineError::NoDestinationPlate {
                format: req.target_plate_type,
            })?;
        let destination_wells: Vec<String> = self
            .raw
            .wells_of(destination.id)
            .take(req.wells.len())
            .map(|w| w.position())
            .collect();
        let destination_nest = destination.nest_id;
        params.set(
            "destination_plate_barcode",
            ParamValue::Text(destination.barcode.clone()),
        );
        self.write_location(&mut params, "destination", destination_nest);
        params.set("destination_wells", ParamValue::List(destination_wells));

        let source_wells = req.wells.len() as u32;
        let dest_wells = req.wells.len() as u32;

        if let Some(coating) = &req.coating_reagent {
            let quantity = quantity_needed(
                ConsumableClass::Media,
                req.target_plate_type,
                Phase::PassagePrep,
                dest_wells,
                100,
            );
            let coat = self.resolve(coating, quantity, Some(req.target_plate_type));
            self.take(&coat);
            self.write_resolution(&mut params, "coat", &coat);
        }

        let dissociation_quantity = quantity_needed(
            ConsumableClass::Dissociation,
            req.plate_type,
            Phase::PassageDissociation,
            source_wells,
            100,
        );
        let dissociation =
            self.resolve(&req.dissociation_reagent, dissociation_quantity, Some(req.plate_type));
        self.take(&dissociation);
        self.write_resolution(&mut params, "dissociation", &dissociation);

        let wash_quantity = quantity_needed(
            ConsumableClass::Media,
            req.plate_type,
            Phase::PassageWash,
            source_wells,
            100,
        );
        let wash = self.resolve(&req.media_type, wash_quantity, Some(req.plate_type));
        self.take(&wash);
        self.write_resolution(&mut params, "wash", &wash);

        let suspension_quantity = quantity_needed(
            ConsumableClass::Media,
            req.target_plate_type,
            Phase::PassageSuspension,
            dest_wells,
            100,
        );
        let suspension =
            self.resolve(&req.media_type, suspension_quantity, Some(req.target_plate_type));
        self.take(&suspension);
        self.write_resolution(&mut params, "suspension", &suspension);

        let tip_requests = [
            (TipSize::Ul300, dissociation_quantity),
            (TipSize::Ul1000, wash_quantity + suspension_quantity),
        ];
        self.write_tip_boxes(&mut params, &tip_requests);

        self.finish(&mut params);
        Ok(params)
    }

    fn build_transfect(&mut self, req: &TransfectRequest) -> Result<Params, EngineError> {
        let mut params = self.common_params("Transfect", req.plate_id, &req.wells, &req.workflow_step_ids)?;
        params.set("media_type", ParamValue::Text(req.media_type.clone()));

        // The DNA plate is named explicitly by the request; its absence is a
        // boundary error, not an inventory shortage.
        let dna = self
            .raw
            .plate(req.dna_plate_id)
            .ok_or(EngineError::PlateNotFound(req.dna_plate_id))?;
        let dna_nest = dna.nest_id;
        params.set("dna_plate_barcode", ParamValue::Text(dna.barcode.clone()));
        self.write_location(&mut params, "dna", dna_nest);

        let wells = req.wells.len() as u32;
        let mix_quantity = quantity_needed(
            ConsumableClass::Media,
            req.plate_type,
            Phase::TransfectionMix,
            wells,
            100,
        );
        let mix = self.resolve(&req.transfection_reagent, mix_quantity, Some(req.plate_type));
        self.take(&mix);
        self.write_resolution(&mut params, "transfection", &mix);

        let feed_quantity = quantity_needed(
            ConsumableClass::Media,
            req.plate_type,
            Phase::MediaExchange,
            wells,
            100,
        );
        let feed = self.resolve(&req.media_type, feed_quantity, Some(req.plate_type));
        self.take(&feed);
        self.write_resolution(&mut params, "media", &feed);

        let tip_requests = [
            (
                TipSize::Ul20,
                quantity_needed(
                    ConsumableClass::Tip(TipSize::Ul20),
                    req.plate_type,
                    Phase::TransfectionMix,
                    wells,
                    100,
                ),
            ),
            (
                TipSize::Ul300,
                quantity_needed(
                    ConsumableClass::Tip(TipSize::Ul300),
                    req.plate_type,
                    Phase::TransfectionMix,
                    wells,
                    100,
                ),
            ),
            (
                TipSize::Ul1000,
                quantity_needed(
                    ConsumableClass::Tip(TipSize::Ul1000),
                    req.plate_type,
                    Phase::TransfectionMix,
                    wells,
                    100,
                ),
            ),
        ];
        self.write_tip_boxes(&mut params, &tip_requests);

        self.finish(&mut params);
        Ok(params)
    }

    fn build_imaging(&mut self, req: &ImagingRequest) -> Result<Params, EngineError> {
        let mut params =
            self.common_params("Image Culture Plate", req.plate_id, &req.wells, &req.workflow_step_ids)?;
        // Imaging consumes nothing; an empty selection means the whole plate.
        if req.wells.is_empty() {
            let all: Vec<String> = self
                .raw
                .wells_of(req.plate_id)
                .map(|w| w.position())
                .collect();
            params.set("wells_to_process", ParamValue::List(all));
        }
        self.finish(&mut params);
        Ok(params)
    }

    /// Routine name, source plate location, requested wells, workflow ids.
    fn common_params(
        &self,
        routine: &str,
        plate_id: Id,
        wells: &[String],
        workflow_step_ids: &[String],
    ) -> Result<Params, EngineError> {
        let source = self
            .raw
            .plate(plate_id)
            .ok_or(EngineError::PlateNotFound(plate_id))?;
        let source_nest = source.nest_id;

        let mut params = Params::default();
        params.set("routine", ParamValue::Text(routine.into()));
        params.set(
            "source_plate_barcode",
            ParamValue::Text(source.barcode.clone()),
        );
        params.set("wells_to_process", ParamValue::List(wells.to_vec()));
        params.set(
            "workflow_step_ids",
            ParamValue::List(workflow_step_ids.to_vec()),
        );
        self.write_location(&mut params, "source", source_nest);
        Ok(params)
    }

    /// Nest name, slot number, and liconic level/cassette for a location,
    /// with `Unresolved` standing in wherever the graph has a gap.
    fn write_location(&self, params: &mut Params, prefix: &str, nest_id: Option<Id>) {
        let nest = nest_id.and_then(|id| self.raw.nest(id));
        let Some(nest) = nest else {
            params.set(format!("{prefix}_nest"), ParamValue::Unresolved);
            params.set(format!("{prefix}_slot"), ParamValue::Unresolved);
            params.set(format!("{prefix}_level"), ParamValue::Unresolved);
            params.set(format!("{prefix}_cassette"), ParamValue::Unresolved);
            return;
        };
        params.set(format!("{prefix}_nest"), ParamValue::Text(nest.name.clone()));

        let slot = nest
            .instrument_id
            .and_then(|id| self.raw.instrument(id))
            .and_then(|i| slot_number(&i.kind));
        params.set(
            format!("{prefix}_slot"),
            slot.map_or(ParamValue::Unresolved, ParamValue::Number),
        );

        let location = NestLocation::parse(&nest.name);
        params.set(
            format!("{prefix}_level"),
            location
                .level
                .map_or(ParamValue::Unresolved, |l| ParamValue::Number(l as i64)),
        );
        params.set(
            format!("{prefix}_cassette"),
            location
                .cassette
                .map_or(ParamValue::Unresolved, |c| ParamValue::Number(c as i64)),
        );
    }

    /// Write a resolution under a key prefix. Matched resolutions carry the
    /// stock plate location and picked wells; insufficient ones carry the
    /// sentinel in every field. Empty resolutions write nothing.
    fn write_resolution(&self, params: &mut Params, prefix: &str, resolution: &Resolution) {
        match resolution {
            Resolution::Matched(source) => {
                params.set(
                    format!("{prefix}_plate_barcode"),
                    ParamValue::Text(source.plate_barcode.clone()),
                );
                self.write_location(params, prefix, source.nest_id);
                params.set(
                    format!("{prefix}_wells"),
                    ParamValue::List(source.wells.iter().map(|w| w.position.clone()).collect()),
                );
            }
            Resolution::Empty => {}
            Resolution::Insufficient { .. } => {
                params.set(format!("{prefix}_plate_barcode"), ParamValue::Unresolved);
                params.set(format!("{prefix}_nest"), ParamValue::Unresolved);
                params.set(format!("{prefix}_slot"), ParamValue::Unresolved);
                params.set(format!("{prefix}_level"), ParamValue::Unresolved);
                params.set(format!("{prefix}_cassette"), ParamValue::Unresolved);
                params.set(format!("{prefix}_wells"), ParamValue::Unresolved);
            }
        }
    }

    /// Resolve and commit one tip box per size, in request order, writing
    /// each under `tips_{size}`.
    fn write_tip_boxes(&mut self, params: &mut Params, requests: &[(TipSize, u32)]) {
        let resolutions = self.resolve_tip_boxes(requests);
        for (size, _) in requests {
            let resolution = &resolutions[size];
            self.take(resolution);
            self.write_resolution(params, &format!("tips_{}", size.key()), resolution);
        }
    }

    /// First empty plate of the target format sitting in bulk storage.
    fn find_destination_plate(&self, source_plate_id: Id, format: PlateFormat) -> Option<Plate> {
        self.working
            .plates
            .iter()
            .find(|p| {
                p.id != source_plate_id
                    && p.plate_type == format
                    && self.index.is_bulk_storage(p.id)
                    && self.working.plate_is_empty(p.id)
            })
            .cloned()
    }

    /// Cumulative audit trail: every reagent id this engine has consumed.
    fn finish(&self, params: &mut Params) {
        params.set(
            "consumable_ids",
            ParamValue::List(self.consumed.iter().map(|id| id.to_string()).collect()),
        );
    }
}
