use serde::Deserialize;

use crate::engine::EngineError;
use crate::limits::*;
use crate::model::{Id, PlateFormat, WellAddress};

/// One externally-defined protocol request from the workflow/LIMS system,
/// tagged by routine name. Each kind carries its own typed payload; unknown
/// routine names fail deserialization instead of falling through a string
/// dispatch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name")]
pub enum Routine {
    #[serde(rename = "Media Exchange")]
    MediaExchange(MediaExchangeRequest),
    #[serde(rename = "Passage")]
    Passage(PassageRequest),
    #[serde(rename = "Transfect")]
    Transfect(TransfectRequest),
    #[serde(rename = "Image Culture Plate")]
    ImageCulturePlate(ImagingRequest),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaExchangeRequest {
    /// Culture plate being processed (wellPlateID upstream).
    pub plate_id: Id,
    pub plate_type: PlateFormat,
    /// Well positions to process, `"A1"` style.
    pub wells: Vec<String>,
    pub media_type: String,
    /// Percent of the full exchange volume; 100 is a full change.
    pub percent_change: u32,
    /// Workflow step ids passed through for the LIMS audit trail.
    #[serde(default)]
    pub workflow_step_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PassageRequest {
    pub plate_id: Id,
    pub plate_type: PlateFormat,
    pub wells: Vec<String>,
    pub media_type: String,
    /// Dissociation reagent name, e.g. "Accutase".
    pub dissociation_reagent: String,
    /// Format of the destination plate the cells are split into.
    pub target_plate_type: PlateFormat,
    /// Surface coating applied in the prep phase, e.g. "Geltrex". Skipped
    /// when absent (pre-coated destination plates).
    #[serde(default)]
    pub coating_reagent: Option<String>,
    #[serde(default)]
    pub workflow_step_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransfectRequest {
    pub plate_id: Id,
    pub plate_type: PlateFormat,
    pub wells: Vec<String>,
    /// Source plate holding the DNA/plasmid preps (DNAPlateID upstream).
    pub dna_plate_id: Id,
    pub transfection_reagent: String,
    pub media_type: String,
    #[serde(default)]
    pub workflow_step_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagingRequest {
    pub plate_id: Id,
    pub plate_type: PlateFormat,
    /// Wells to image; empty means the whole plate.
    #[serde(default)]
    pub wells: Vec<String>,
    #[serde(default)]
    pub workflow_step_ids: Vec<String>,
}

impl Routine {
    pub fn plate_id(&self) -> Id {
        match self {
            Routine::MediaExchange(r) => r.plate_id,
            Routine::Passage(r) => r.plate_id,
            Routine::Transfect(r) => r.plate_id,
            Routine::ImageCulturePlate(r) => r.plate_id,
        }
    }

    pub fn plate_type(&self) -> PlateFormat {
        match self {
            Routine::MediaExchange(r) => r.plate_type,
            Routine::Passage(r) => r.plate_type,
            Routine::Transfect(r) => r.plate_type,
            Routine::ImageCulturePlate(r) => r.plate_type,
        }
    }

    pub fn wells(&self) -> &[String] {
        match self {
            Routine::MediaExchange(r) => &r.wells,
            Routine::Passage(r) => &r.wells,
            Routine::Transfect(r) => &r.wells,
            Routine::ImageCulturePlate(r) => &r.wells,
        }
    }

    pub fn workflow_step_ids(&self) -> &[String] {
        match self {
            Routine::MediaExchange(r) => &r.workflow_step_ids,
            Routine::Passage(r) => &r.workflow_step_ids,
            Routine::Transfect(r) => &r.workflow_step_ids,
            Routine::ImageCulturePlate(r) => &r.workflow_step_ids,
        }
    }

    /// Fail-fast boundary validation. Inventory shortage is never an error,
    /// but a request that does not describe a coherent operation is.
    pub fn validate(&self) -> Result<(), EngineError> {
        let wells = self.wells();
        if wells.len() > MAX_WELLS_PER_REQUEST {
            return Err(EngineError::InvalidRequest("too many wells requested".into()));
        }
        let format = self.plate_type();
        for well in wells {
            let addr = WellAddress::parse(well).ok_or_else(|| {
                EngineError::InvalidRequest(format!("malformed well address: {well:?}"))
            })?;
            if !addr.fits(format) {
                return Err(EngineError::InvalidRequest(format!(
                    "well {addr} outside {} plate",
                    format.label()
                )));
            }
        }
        match self {
            Routine::MediaExchange(r) => {
                if r.wells.is_empty() {
                    return Err(EngineError::InvalidRequest("no wells to process".into()));
                }
                if r.percent_change > MAX_PERCENT_CHANGE {
                    return Err(EngineError::InvalidRequest(format!(
                        "percent_change {} out of range",
                        r.percent_change
                    )));
                }
                validate_name(&r.media_type)?;
            }
            Routine::Passage(r) => {
                if r.wells.is_empty() {
                    return Err(EngineError::InvalidRequest("no wells to process".into()));
                }
                validate_name(&r.media_type)?;
                validate_name(&r.dissociation_reagent)?;
                if let Some(coating) = &r.coating_reagent {
                    validate_name(coating)?;
                }
            }
            Routine::Transfect(r) => {
                if r.wells.is_empty() {
                    return Err(EngineError::InvalidRequest("no wells to process".into()));
                }
                validate_name(&r.transfection_reagent)?;
                validate_name(&r.media_type)?;
            }
            // Imaging consumes nothing; an empty well list means whole-plate.
            Routine::ImageCulturePlate(_) => {}
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty() {
        return Err(EngineError::InvalidRequest("empty consumable name".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::InvalidRequest("consumable name too long".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn exchange(wells: Vec<&str>, percent: u32) -> Routine {
        Routine::MediaExchange(MediaExchangeRequest {
            plate_id: Ulid::new(),
            plate_type: PlateFormat::SixWell,
            wells: wells.into_iter().map(String::from).collect(),
            media_type: "Complete Media".into(),
            percent_change: percent,
            workflow_step_ids: vec![],
        })
    }

    #[test]
    fn deserialize_tagged_by_routine_name() {
        let json = format!(
            r#"{{
                "name": "Media Exchange",
                "plate_id": "{}",
                "plate_type": "6 well",
                "wells": ["A1", "B3"],
                "media_type": "Complete Media",
                "percent_change": 50
            }}"#,
            Ulid::new()
        );
        let routine: Routine = serde_json::from_str(&json).unwrap();
        match routine {
            Routine::MediaExchange(r) => {
                assert_eq!(r.plate_type, PlateFormat::SixWell);
                assert_eq!(r.wells, vec!["A1", "B3"]);
                assert_eq!(r.percent_change, 50);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_routine_name_rejected() {
        let json = r#"{"name": "Defrost", "plate_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV"}"#;
        assert!(serde_json::from_str::<Routine>(json).is_err());
    }

    #[test]
    fn validate_accepts_well_formed_exchange() {
        assert!(exchange(vec!["A1", "B3"], 100).validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_addresses() {
        let err = exchange(vec!["1A"], 100).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
        // C4 is outside a 6-well plate (2 rows x 3 columns).
        let err = exchange(vec!["C4"], 100).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[test]
    fn validate_rejects_percent_out_of_range() {
        let err = exchange(vec!["A1"], 150).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[test]
    fn validate_rejects_empty_well_list_except_imaging() {
        assert!(exchange(vec![], 100).validate().is_err());
        let imaging = Routine::ImageCulturePlate(ImagingRequest {
            plate_id: Ulid::new(),
            plate_type: PlateFormat::NinetySixWell,
            wells: vec![],
            workflow_step_ids: vec![],
        });
        assert!(imaging.validate().is_ok());
    }
}
