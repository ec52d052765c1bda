use std::collections::HashMap;

use crate::placement::ComponentPlacement;
use crate::symbol::PinDefinition;
use crate::transform::{world_pin_of, PinRef, WorldPin};
use crate::PlacementError;

/// Read-only access to a sheet's placements.
///
/// The sheet owns placements and serializes mutations; the planner and
/// validator only ever see a snapshot through this trait.
pub trait SchematicView {
    fn placement_of(&self, reference: &str) -> Option<&ComponentPlacement>;

    fn pins_of<'a>(&self, placement: &'a ComponentPlacement) -> &'a [PinDefinition] {
        placement.symbol.pins()
    }

    fn is_power_symbol(&self, placement: &ComponentPlacement) -> bool {
        placement.symbol.is_power_symbol()
    }

    /// Look up a pin and compute where it currently sits.
    fn resolve_pin(&self, pin: &PinRef) -> Result<WorldPin, PlacementError> {
        let placement = self
            .placement_of(&pin.reference)
            .ok_or_else(|| PlacementError::UnknownComponent(pin.reference.clone()))?;
        let definition = self
            .pins_of(placement)
            .iter()
            .find(|p| p.number == pin.number)
            .ok_or_else(|| PlacementError::InvalidPinReference(pin.clone()))?;
        Ok(world_pin_of(placement, definition))
    }
}

impl SchematicView for [ComponentPlacement] {
    fn placement_of(&self, reference: &str) -> Option<&ComponentPlacement> {
        self.iter().find(|p| p.reference == reference)
    }
}

impl SchematicView for Vec<ComponentPlacement> {
    fn placement_of(&self, reference: &str) -> Option<&ComponentPlacement> {
        self.as_slice().placement_of(reference)
    }
}

impl SchematicView for HashMap<String, ComponentPlacement> {
    fn placement_of(&self, reference: &str) -> Option<&ComponentPlacement> {
        self.get(reference)
    }
}
