use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::{Mirror, Point, Rotation};
use crate::symbol::SymbolRef;
use crate::PlacementError;

/// Whether a component's own glyph already shows its net name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Regular,
    PowerSymbol,
}

/// Where and how a symbol instance sits on the sheet.
///
/// The pin table is shared with every other placement of the same symbol;
/// only position, rotation and mirror belong to the instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentPlacement {
    pub reference: String,
    pub value: String,
    pub position: Point,
    pub rotation: Rotation,
    pub mirror: Mirror,
    #[serde(serialize_with = "serialize_lib_id")]
    pub symbol: SymbolRef,
    /// Extra fields beyond Reference and Value (`Tolerance`, `MPN`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

fn serialize_lib_id<S: serde::Serializer>(symbol: &SymbolRef, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&symbol.lib_id)
}

impl ComponentPlacement {
    pub fn new(reference: impl Into<String>, symbol: SymbolRef, position: Point) -> Self {
        Self {
            reference: reference.into(),
            value: String::new(),
            position,
            rotation: Rotation::Deg0,
            mirror: Mirror::None,
            symbol,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Like [`Self::with_rotation`] but from raw degrees; anything other than a
    /// right angle is a [`PlacementError::MalformedPlacement`].
    pub fn with_rotation_degrees(self, degrees: f64) -> Result<Self, PlacementError> {
        Ok(self.with_rotation(Rotation::try_from(degrees)?))
    }

    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ComponentKind {
        if self.symbol.is_power_symbol() {
            ComponentKind::PowerSymbol
        } else {
            ComponentKind::Regular
        }
    }

    pub fn move_to(&mut self, position: Point) {
        self.position = position;
    }

    /// Rotate further by `by`, on top of the current rotation.
    pub fn rotate(&mut self, by: Rotation) {
        self.rotation = self.rotation.then(by);
    }

    /// Reflect across `axis` in the symbol's own frame. Applying the same axis
    /// twice restores the original placement.
    pub fn mirror_across(&mut self, axis: Mirror) {
        let (mirror, extra) = self.mirror.toggle(axis);
        self.mirror = mirror;
        self.rotation = self.rotation.then(extra);
    }
}
