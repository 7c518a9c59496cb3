use crate::model::PlateFormat;

// ── Requirement Calculator ────────────────────────────────────────
//
// Pure quantity math: (consumable class, plate format, protocol phase,
// well count, percent change) → whole consumable units. One unit is one
// occupied well on a stock plate; the resolver turns units into wells.

/// Pipette tip sizes stocked in the workcell, keyed by the consumable name
/// the inventory uses for the corresponding tip boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipSize {
    Ul20,
    Ul300,
    Ul1000,
}

impl TipSize {
    pub fn label(&self) -> &'static str {
        match self {
            TipSize::Ul20 => "20 ul tip",
            TipSize::Ul300 => "300 ul tip",
            TipSize::Ul1000 => "1000 ul tip",
        }
    }

    /// Short key used in parameter names ("tips_20ul_…").
    pub fn key(&self) -> &'static str {
        match self {
            TipSize::Ul20 => "20ul",
            TipSize::Ul300 => "300ul",
            TipSize::Ul1000 => "1000ul",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumableClass {
    Media,
    Dissociation,
    Tip(TipSize),
}

/// Protocol phase the quantity is being computed for. Passage is split into
/// independently sized sub-requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    MediaExchange,
    PassagePrep,
    PassageDissociation,
    PassageWash,
    PassageSuspension,
    TransfectionMix,
}

/// Per-well multiplier as an exact rational, so percent scaling can be
/// applied before any rounding happens.
#[derive(Debug, Clone, Copy)]
struct PerWell {
    num: u32,
    den: u32,
}

/// Media volume-equivalents per well. A 6-well plate drinks two media units
/// per well; dense formats share one unit across several wells.
fn media_per_well(format: PlateFormat) -> PerWell {
    match format {
        PlateFormat::SixWell => PerWell { num: 2, den: 1 },
        PlateFormat::TwelveWell => PerWell { num: 1, den: 1 },
        PlateFormat::TwentyFourWell => PerWell { num: 1, den: 2 },
        PlateFormat::NinetySixWell => PerWell { num: 1, den: 6 },
        PlateFormat::ThreeEightyFourWell => PerWell { num: 1, den: 12 },
    }
}

/// Dissociation reagent per well.
fn dissociation_per_well(format: PlateFormat) -> PerWell {
    match format {
        PlateFormat::SixWell => PerWell { num: 1, den: 1 },
        PlateFormat::TwelveWell => PerWell { num: 1, den: 2 },
        PlateFormat::TwentyFourWell => PerWell { num: 1, den: 4 },
        PlateFormat::NinetySixWell => PerWell { num: 1, den: 12 },
        PlateFormat::ThreeEightyFourWell => PerWell { num: 1, den: 24 },
    }
}

/// Ceiling of `well_count * per_well * percent / 100`, computed exactly.
fn scaled(per_well: PerWell, well_count: u32, percent: u32) -> u32 {
    let num = well_count as u64 * per_well.num as u64 * percent as u64;
    let den = per_well.den as u64 * 100;
    num.div_ceil(den) as u32
}

/// How many units of `class` the given phase consumes for `well_count`
/// processed wells on a plate of `format`.
///
/// Rounding is ceiling on the exact rational, applied after percent scaling —
/// a 50% change of an even full-change quantity is exactly half of it.
///
/// Multichannel formats (96/384-well) express media-exchange quantities as a
/// count of occupied wells rather than volume, because allocation must later
/// find whole columns. This also covers the 384-well `percent == 0` case,
/// which calls for a 1:1 full-volume multiplier.
pub fn quantity_needed(
    class: ConsumableClass,
    format: PlateFormat,
    phase: Phase,
    well_count: u32,
    percent_change: u32,
) -> u32 {
    if well_count == 0 {
        return 0;
    }
    match (class, phase) {
        (ConsumableClass::Media, Phase::MediaExchange) => {
            if format.is_multichannel() {
                well_count
            } else {
                scaled(media_per_well(format), well_count, percent_change)
            }
        }
        // Coating/prep fills the destination plate with full-change volumes.
        (ConsumableClass::Media, Phase::PassagePrep) => {
            scaled(media_per_well(format), well_count, 100)
        }
        // One rinse unit per well regardless of format.
        (ConsumableClass::Media, Phase::PassageWash) => well_count,
        // Resuspension takes a full change plus one unit for trituration.
        (ConsumableClass::Media, Phase::PassageSuspension) => {
            scaled(media_per_well(format), well_count, 100) + 1
        }
        (ConsumableClass::Media, Phase::TransfectionMix) => {
            scaled(media_per_well(format), well_count, 100)
        }
        // Dissociation is reagent-only; no media moves in that phase.
        (ConsumableClass::Media, Phase::PassageDissociation) => 0,
        (ConsumableClass::Dissociation, _) => {
            scaled(dissociation_per_well(format), well_count, 100)
        }
        // Transfection tip usage is linear in well count with per-size
        // coefficients: mixing, delivery, and a spare.
        (ConsumableClass::Tip(TipSize::Ul20), Phase::TransfectionMix) => 2 * well_count + 1,
        (ConsumableClass::Tip(TipSize::Ul300), Phase::TransfectionMix) => well_count + 2,
        (ConsumableClass::Tip(TipSize::Ul1000), Phase::TransfectionMix) => {
            (well_count as u64).div_ceil(8) as u32 + 1
        }
        // Bulk-liquid phases burn one tip per unit handled.
        (ConsumableClass::Tip(_), phase) => {
            quantity_needed(ConsumableClass::Media, format, phase, well_count, percent_change)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_well_media_exchange() {
        // 2 media units per well on a 6-well plate.
        let q = quantity_needed(
            ConsumableClass::Media,
            PlateFormat::SixWell,
            Phase::MediaExchange,
            3,
            100,
        );
        assert_eq!(q, 6);
    }

    #[test]
    fn half_change_is_exactly_half() {
        let full = quantity_needed(
            ConsumableClass::Media,
            PlateFormat::SixWell,
            Phase::MediaExchange,
            3,
            100,
        );
        let half = quantity_needed(
            ConsumableClass::Media,
            PlateFormat::SixWell,
            Phase::MediaExchange,
            3,
            50,
        );
        assert_eq!(full, 6);
        assert_eq!(half, 3);
    }

    #[test]
    fn half_change_rounds_up_on_odd_rationals() {
        // 12-well, 1 unit/well, 3 wells: 100% → 3, 50% → ceil(1.5) = 2.
        let half = quantity_needed(
            ConsumableClass::Media,
            PlateFormat::TwelveWell,
            Phase::MediaExchange,
            3,
            50,
        );
        assert_eq!(half, 2);
    }

    #[test]
    fn dense_formats_round_up() {
        // 24-well, half a unit per well, 5 wells → ceil(2.5) = 3.
        let q = quantity_needed(
            ConsumableClass::Media,
            PlateFormat::TwentyFourWell,
            Phase::MediaExchange,
            5,
            100,
        );
        assert_eq!(q, 3);
    }

    #[test]
    fn multichannel_exchange_counts_wells_not_volume() {
        for percent in [0, 50, 100] {
            let q = quantity_needed(
                ConsumableClass::Media,
                PlateFormat::NinetySixWell,
                Phase::MediaExchange,
                24,
                percent,
            );
            assert_eq!(q, 24);
        }
        // 384-well percent 0 is the 1:1 full-volume rule.
        let q = quantity_needed(
            ConsumableClass::Media,
            PlateFormat::ThreeEightyFourWell,
            Phase::MediaExchange,
            48,
            0,
        );
        assert_eq!(q, 48);
    }

    #[test]
    fn zero_wells_needs_nothing() {
        for class in [
            ConsumableClass::Media,
            ConsumableClass::Dissociation,
            ConsumableClass::Tip(TipSize::Ul300),
        ] {
            assert_eq!(
                quantity_needed(class, PlateFormat::SixWell, Phase::MediaExchange, 0, 100),
                0
            );
        }
    }

    #[test]
    fn passage_sub_requirements_are_independent() {
        let format = PlateFormat::SixWell;
        let prep = quantity_needed(ConsumableClass::Media, format, Phase::PassagePrep, 6, 100);
        let wash = quantity_needed(ConsumableClass::Media, format, Phase::PassageWash, 6, 100);
        let susp =
            quantity_needed(ConsumableClass::Media, format, Phase::PassageSuspension, 6, 100);
        let diss =
            quantity_needed(ConsumableClass::Dissociation, format, Phase::PassageDissociation, 6, 100);
        assert_eq!(prep, 12);
        assert_eq!(wash, 6);
        assert_eq!(susp, 13);
        assert_eq!(diss, 6);
    }

    #[test]
    fn transfection_tip_counts_are_linear_per_size() {
        let format = PlateFormat::NinetySixWell;
        let tips20 = quantity_needed(
            ConsumableClass::Tip(TipSize::Ul20),
            format,
            Phase::TransfectionMix,
            8,
            100,
        );
        let tips300 = quantity_needed(
            ConsumableClass::Tip(TipSize::Ul300),
            format,
            Phase::TransfectionMix,
            8,
            100,
        );
        let tips1000 = quantity_needed(
            ConsumableClass::Tip(TipSize::Ul1000),
            format,
            Phase::TransfectionMix,
            8,
            100,
        );
        assert_eq!(tips20, 17); // 2w + 1
        assert_eq!(tips300, 10); // w + 2
        assert_eq!(tips1000, 2); // ceil(w/8) + 1
    }

    #[test]
    fn dissociation_scales_by_format() {
        let q6 = quantity_needed(
            ConsumableClass::Dissociation,
            PlateFormat::SixWell,
            Phase::PassageDissociation,
            4,
            100,
        );
        let q24 = quantity_needed(
            ConsumableClass::Dissociation,
            PlateFormat::TwentyFourWell,
            Phase::PassageDissociation,
            4,
            100,
        );
        assert_eq!(q6, 4);
        assert_eq!(q24, 1);
    }
}
