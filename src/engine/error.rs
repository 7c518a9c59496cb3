use crate::model::{Id, PlateFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed routine parameters — rejected at the boundary before any
    /// resolution runs. Inventory shortage is never reported this way.
    InvalidRequest(String),
    /// A plate the routine names explicitly is absent from the snapshot.
    PlateNotFound(Id),
    /// No eligible destination plate exists for a passage. Distinct from the
    /// sentinel-filled degradation path: callers must branch on this.
    NoDestinationPlate { format: PlateFormat },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EngineError::PlateNotFound(id) => write!(f, "plate not found: {id}"),
            EngineError::NoDestinationPlate { format } => {
                write!(f, "no {} destination plate available", format.label())
            }
        }
    }
}

impl std::error::Error for EngineError {}
