use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Entity id — assigned by the persistence layer, opaque to the engine.
pub type Id = Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Discrete plate format. The persistence layer stores the legacy label
/// strings, so variants are serde-renamed to deserialize unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateFormat {
    #[serde(rename = "6 well")]
    SixWell,
    #[serde(rename = "12 well")]
    TwelveWell,
    #[serde(rename = "24 well")]
    TwentyFourWell,
    #[serde(rename = "96 well")]
    NinetySixWell,
    #[serde(rename = "384 well")]
    ThreeEightyFourWell,
}

impl PlateFormat {
    pub fn rows(&self) -> u32 {
        match self {
            PlateFormat::SixWell => 2,
            PlateFormat::TwelveWell => 3,
            PlateFormat::TwentyFourWell => 4,
            PlateFormat::NinetySixWell => 8,
            PlateFormat::ThreeEightyFourWell => 16,
        }
    }

    pub fn columns(&self) -> u32 {
        match self {
            PlateFormat::SixWell => 3,
            PlateFormat::TwelveWell => 4,
            PlateFormat::TwentyFourWell => 6,
            PlateFormat::NinetySixWell => 12,
            PlateFormat::ThreeEightyFourWell => 24,
        }
    }

    pub fn well_count(&self) -> u32 {
        self.rows() * self.columns()
    }

    /// Formats dense enough to require multichannel pipetting, which in turn
    /// forces whole-column allocation in the resolver.
    pub fn is_multichannel(&self) -> bool {
        matches!(
            self,
            PlateFormat::NinetySixWell | PlateFormat::ThreeEightyFourWell
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlateFormat::SixWell => "6 well",
            PlateFormat::TwelveWell => "12 well",
            PlateFormat::TwentyFourWell => "24 well",
            PlateFormat::NinetySixWell => "96 well",
            PlateFormat::ThreeEightyFourWell => "384 well",
        }
    }
}

impl std::str::FromStr for PlateFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "6 well" => Ok(PlateFormat::SixWell),
            "12 well" => Ok(PlateFormat::TwelveWell),
            "24 well" => Ok(PlateFormat::TwentyFourWell),
            "96 well" => Ok(PlateFormat::NinetySixWell),
            "384 well" => Ok(PlateFormat::ThreeEightyFourWell),
            _ => Err(()),
        }
    }
}

/// One addressable plate position, e.g. `"B7"`. Rows are letters, columns
/// are 1-based numbers; this is the positional string format the downstream
/// command builders consume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WellAddress {
    pub row: String,
    pub column: u32,
}

impl WellAddress {
    /// Parse `"B7"`-style addresses. Returns `None` for anything that does
    /// not split into a leading alphabetic run and a trailing number.
    pub fn parse(s: &str) -> Option<Self> {
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (row, digits) = s.split_at(split);
        if row.is_empty() || !row.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let column: u32 = digits.parse().ok()?;
        if column == 0 {
            return None;
        }
        Some(Self {
            row: row.to_ascii_uppercase(),
            column,
        })
    }

    /// Row index as 0-based offset from `A`. Multi-letter rows (`AA`…) extend
    /// past 25 for 1536-well labware, which this engine does not allocate.
    pub fn row_index(&self) -> u32 {
        let mut idx = 0u32;
        for c in self.row.bytes() {
            idx = idx * 26 + (c - b'A') as u32 + 1;
        }
        idx - 1
    }

    /// True if the address fits inside the given format's grid.
    pub fn fits(&self, format: PlateFormat) -> bool {
        self.row_index() < format.rows() && self.column <= format.columns()
    }
}

impl std::fmt::Display for WellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

/// Structured liconic coordinates. Legacy nest names encode these as
/// `prefix_level_cassette`; `parse` is the boundary adapter for that scheme
/// and silently yields `None` fields for names that do not conform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NestLocation {
    pub level: Option<u32>,
    pub cassette: Option<u32>,
}

impl NestLocation {
    pub fn parse(name: &str) -> Self {
        let segments: Vec<&str> = name.split('_').collect();
        if segments.len() < 3 {
            return Self::default();
        }
        Self {
            level: segments[segments.len() - 2].parse().ok(),
            cassette: segments[segments.len() - 1].parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestStatus {
    Empty,
    Reserved,
    Occupied,
}

/// A physical device or static storage unit. Immutable for the duration of
/// one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: Id,
    pub name: String,
    /// Free-text device class from the workcell config: "liconic", "hotel",
    /// "bravo", …
    #[serde(rename = "type")]
    pub kind: String,
}

/// A single storage slot. Holds at most one plate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nest {
    pub id: Id,
    pub name: String,
    pub row: Option<u32>,
    pub column: Option<u32>,
    pub instrument_id: Option<Id>,
    pub hotel_id: Option<Id>,
    pub status: NestStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    pub id: Id,
    pub name: String,
    pub barcode: String,
    pub plate_type: PlateFormat,
    /// Current physical location; `None` means checked out of the workcell.
    pub nest_id: Option<Id>,
    pub status: String,
}

/// Position within a plate. Every plate owns a fixed, pre-populated set of
/// wells matching its format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Well {
    pub id: Id,
    pub plate_id: Id,
    pub row: String,
    pub column: u32,
}

impl Well {
    /// Positional string (`"{row}{column}"`) consumed downstream.
    pub fn position(&self) -> String {
        format!("{}{}", self.row, self.column)
    }
}

/// A consumable unit tracked in a well: liquid reagent, media, or a pipette
/// tip. The matching logic treats one well as one consumable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reagent {
    pub id: Id,
    pub well_id: Id,
    pub name: String,
    pub volume: f64,
    pub expires_at: Option<Ms>,
}

/// Full inventory graph at a point in time, as fetched from the persistence
/// layer. The engine keeps two copies: the raw snapshot (never touched) and
/// a working copy that consumption mutates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub instruments: Vec<Instrument>,
    pub nests: Vec<Nest>,
    pub plates: Vec<Plate>,
    pub wells: Vec<Well>,
    pub reagents: Vec<Reagent>,
}

impl Inventory {
    pub fn instrument(&self, id: Id) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id == id)
    }

    pub fn nest(&self, id: Id) -> Option<&Nest> {
        self.nests.iter().find(|n| n.id == id)
    }

    pub fn plate(&self, id: Id) -> Option<&Plate> {
        self.plates.iter().find(|p| p.id == id)
    }

    pub fn well(&self, id: Id) -> Option<&Well> {
        self.wells.iter().find(|w| w.id == id)
    }

    /// Wells of a plate in stored order. The resolver's first-fit pick relies
    /// on this order being stable; no row/column sort is applied.
    pub fn wells_of(&self, plate_id: Id) -> impl Iterator<Item = &Well> {
        self.wells.iter().filter(move |w| w.plate_id == plate_id)
    }

    pub fn reagents_in(&self, well_id: Id) -> impl Iterator<Item = &Reagent> {
        self.reagents.iter().filter(move |r| r.well_id == well_id)
    }

    /// True if no well of the plate holds any reagent record.
    pub fn plate_is_empty(&self, plate_id: Id) -> bool {
        !self.reagents.iter().any(|r| {
            self.well(r.well_id)
                .is_some_and(|w| w.plate_id == plate_id)
        })
    }

    /// Remove reagent records by id. Returns how many were removed; ids not
    /// present are ignored.
    pub fn remove_reagents(&mut self, ids: &[Id]) -> usize {
        let before = self.reagents.len();
        self.reagents.retain(|r| !ids.contains(&r.id));
        before - self.reagents.len()
    }
}
