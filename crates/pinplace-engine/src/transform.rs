//! Symbol-local pin geometry to world space.
//!
//! For a pin at local `p` with local orientation `θ` on a placement at `origin`
//! with rotation `R` and mirror `M`:
//!
//! ```text
//! position    = origin + R(M(flip_y(p)))
//! orientation = M(θ) + R
//! ```
//!
//! `flip_y` ([`authored_to_world`]) is the only convention fix-up. Mirror comes
//! before rotation for both position and orientation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{authored_to_world, Angle, Point};
use crate::placement::ComponentPlacement;
use crate::symbol::{PinDefinition, PinKind};
use crate::PlacementError;

/// Identifies a pin on a placed component, e.g. `R1` pin `2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinRef {
    pub reference: String,
    pub number: String,
}

impl PinRef {
    pub fn new(reference: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            number: number.into(),
        }
    }
}

/// Parses `R1.2`. The split is at the last dot so references may contain dots.
impl FromStr for PinRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((reference, number)) if !reference.is_empty() && !number.is_empty() => {
                Ok(PinRef::new(reference, number))
            }
            _ => Err(format!("invalid pin reference '{s}', expected REF.PIN")),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.reference, self.number)
    }
}

/// A pin's electrical connection point and direction on the sheet.
///
/// Always derived from a placement and its pin table; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldPin {
    pub pin: PinRef,
    pub name: String,
    pub kind: PinKind,
    pub position: Point,
    pub orientation: Angle,
}

/// Map a symbol-local point onto the sheet for `placement`.
pub fn local_to_world(placement: &ComponentPlacement, local: Point) -> Point {
    let offset = placement
        .rotation
        .apply(placement.mirror.apply(authored_to_world(local)));
    placement.position + offset
}

/// Map a symbol-local direction onto the sheet for `placement`.
pub fn local_to_world_angle(placement: &ComponentPlacement, local: Angle) -> Angle {
    placement.mirror.apply_angle(local) + placement.rotation.as_angle()
}

/// World position and orientation of `pin` on `placement`.
///
/// The caller is responsible for `pin` actually belonging to the placement's
/// symbol; see [`world_pin_by_number`] for the checked lookup.
pub fn world_pin_of(placement: &ComponentPlacement, pin: &PinDefinition) -> WorldPin {
    WorldPin {
        pin: PinRef::new(&placement.reference, &pin.number),
        name: pin.name.clone(),
        kind: pin.kind,
        position: local_to_world(placement, pin.local_position),
        orientation: local_to_world_angle(placement, pin.local_orientation),
    }
}

/// Every pin of the placement, in pin-table order.
pub fn world_pins(placement: &ComponentPlacement) -> Vec<WorldPin> {
    placement
        .symbol
        .pins()
        .iter()
        .map(|pin| world_pin_of(placement, pin))
        .collect()
}

pub fn world_pin_by_number(
    placement: &ComponentPlacement,
    number: &str,
) -> Result<WorldPin, PlacementError> {
    let pin = placement
        .symbol
        .pin(number)
        .ok_or_else(|| PlacementError::InvalidPinReference(PinRef::new(&placement.reference, number)))?;
    Ok(world_pin_of(placement, pin))
}
