use crate::routine::Routine;

// Metric name constants. The library only emits through the `metrics` facade;
// installing an exporter is the embedding process's job.

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: routines built into parameter maps. Labels: routine.
pub const ROUTINES_TOTAL: &str = "benchstock_routines_total";

/// Counter: consumable resolutions that found a source plate.
pub const RESOLUTIONS_TOTAL: &str = "benchstock_resolutions_total";

/// Counter: resolutions that found insufficient inventory.
pub const RESOLUTIONS_INSUFFICIENT_TOTAL: &str = "benchstock_resolutions_insufficient_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Counter: reagent records consumed from working inventories.
pub const REAGENTS_CONSUMED_TOTAL: &str = "benchstock_reagents_consumed_total";

/// Map a routine variant to a short label for metrics.
pub fn routine_label(routine: &Routine) -> &'static str {
    match routine {
        Routine::MediaExchange(_) => "media_exchange",
        Routine::Passage(_) => "passage",
        Routine::Transfect(_) => "transfect",
        Routine::ImageCulturePlate(_) => "image_culture_plate",
    }
}
