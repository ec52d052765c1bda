use crate::geometry::Point;
use crate::transform::PinRef;

/// Errors raised while placing pins, labels and wires
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("Pin {0} does not exist on its component")]
    InvalidPinReference(PinRef),

    #[error("Component {0} is not placed on this sheet")]
    UnknownComponent(String),

    #[error("Malformed placement: {0}")]
    MalformedPlacement(String),

    /// A stored anchor no longer matches its pin. Always a bug upstream.
    #[error("Connection point mismatch: pin is at {expected}, record is at {actual}")]
    PlacementMismatch { expected: Point, actual: Point },

    #[error("Pin {0} already carries a label")]
    DuplicateLabel(PinRef),

    #[error("A wire from {start} to {end} already exists")]
    DuplicateWire { start: Point, end: Point },
}

impl PlacementError {
    /// Reported conditions the caller may choose to skip rather than abort on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlacementError::DuplicateLabel(_) | PlacementError::DuplicateWire { .. }
        )
    }
}
