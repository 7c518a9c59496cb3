//! Boundary validation limits. Requests exceeding these are programming or
//! configuration errors upstream and are rejected before resolution starts.

/// Largest supported well selection (one full 384-well plate).
pub const MAX_WELLS_PER_REQUEST: usize = 384;

/// Media change is a percentage of the full exchange volume.
pub const MAX_PERCENT_CHANGE: u32 = 100;

/// Consumable / media type names come from free-text workcell config.
pub const MAX_NAME_LEN: usize = 256;
