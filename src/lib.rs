//! benchstock — inventory requirement resolution for laboratory workcells.
//!
//! Takes an abstract protocol request ("wash 12 wells of a 96-well plate")
//! and resolves it, against a snapshot of physical inventory, into concrete
//! coordinates (which plate, which wells, which nest, which tip box) plus a
//! ledger of consumed consumables. Pure computation: fetching the snapshot
//! and persisting the consumption afterwards belong to the embedding system.
//!
//! The whole surface is `Inventory × Routine → Params`:
//!
//! ```no_run
//! # fn snapshot() -> benchstock::model::Inventory { unimplemented!() }
//! # fn next_routine() -> benchstock::routine::Routine { unimplemented!() }
//! let mut engine = benchstock::Engine::new(snapshot());
//! let _params = engine.build_params(&next_routine())?;
//! # Ok::<(), benchstock::EngineError>(())
//! ```

pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod routine;

pub use engine::{Engine, EngineError, ParamValue, Params, Resolution};
