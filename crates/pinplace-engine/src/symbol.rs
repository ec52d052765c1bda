//! Static symbol geometry: the pin table a library symbol is authored with.
//!
//! Symbols are immutable once loaded and shared between every placement that
//! uses them through [`SymbolRef`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Angle, Point};

/// Shared, read-only handle to a symbol's pin table.
pub type SymbolRef = Arc<Symbol>;

/// Electrical type of a pin, as named in KiCad symbol libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    Input,
    Output,
    Bidirectional,
    TriState,
    #[default]
    Passive,
    Free,
    Unspecified,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    NoConnect,
}

impl PinKind {
    pub fn is_power(self) -> bool {
        matches!(self, PinKind::PowerIn | PinKind::PowerOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PinKind::Input => "input",
            PinKind::Output => "output",
            PinKind::Bidirectional => "bidirectional",
            PinKind::TriState => "tri_state",
            PinKind::Passive => "passive",
            PinKind::Free => "free",
            PinKind::Unspecified => "unspecified",
            PinKind::PowerIn => "power_in",
            PinKind::PowerOut => "power_out",
            PinKind::OpenCollector => "open_collector",
            PinKind::OpenEmitter => "open_emitter",
            PinKind::NoConnect => "no_connect",
        }
    }
}

impl FromStr for PinKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "input" => PinKind::Input,
            "output" => PinKind::Output,
            "bidirectional" => PinKind::Bidirectional,
            "tri_state" => PinKind::TriState,
            "passive" => PinKind::Passive,
            "free" => PinKind::Free,
            "unspecified" => PinKind::Unspecified,
            "power_in" => PinKind::PowerIn,
            "power_out" => PinKind::PowerOut,
            "open_collector" => PinKind::OpenCollector,
            "open_emitter" => PinKind::OpenEmitter,
            "no_connect" => PinKind::NoConnect,
            other => return Err(format!("unknown pin type '{other}'")),
        })
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pin as authored in the symbol library (Y-up local coordinates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDefinition {
    pub number: String,
    #[serde(default)]
    pub name: String,
    pub local_position: Point,
    pub local_orientation: Angle,
    #[serde(default)]
    pub kind: PinKind,
}

impl PinDefinition {
    pub fn new(
        number: impl Into<String>,
        local_position: Point,
        local_orientation: Angle,
        kind: PinKind,
    ) -> Self {
        Self {
            number: number.into(),
            name: String::new(),
            local_position,
            local_orientation,
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A library symbol reduced to what pin placement needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// `Library:Name`, e.g. `Device:R`.
    pub lib_id: String,
    pins: Vec<PinDefinition>,
    /// Power symbols (ground, supply glyphs) draw their own net name.
    #[serde(default)]
    pub power: bool,
    /// Reference prefix from the library (`R`, `#PWR`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_prefix: Option<String>,
    /// Default value from the library, e.g. `GND` for a ground symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Symbol {
    /// Build a symbol. When two pins share a number the first one wins, so
    /// numbers stay unique within the table.
    pub fn new(lib_id: impl Into<String>, pins: Vec<PinDefinition>) -> Self {
        let lib_id = lib_id.into();
        let mut unique: Vec<PinDefinition> = Vec::with_capacity(pins.len());
        for pin in pins {
            if unique.iter().any(|p| p.number == pin.number) {
                log::debug!("{lib_id}: ignoring duplicate pin number {}", pin.number);
                continue;
            }
            unique.push(pin);
        }
        Self {
            lib_id,
            pins: unique,
            power: false,
            reference_prefix: None,
            default_value: None,
        }
    }

    pub fn power(mut self, power: bool) -> Self {
        self.power = power;
        self
    }

    pub fn with_properties(mut self, reference_prefix: Option<String>, value: Option<String>) -> Self {
        self.reference_prefix = reference_prefix;
        self.default_value = value;
        self
    }

    /// `R` → `R1`; symbols without a prefix get `U1`.
    pub fn first_reference(&self) -> String {
        let prefix = self.reference_prefix.as_deref().unwrap_or("U");
        format!("{}1", prefix.trim_end_matches('?'))
    }

    pub fn into_ref(self) -> SymbolRef {
        Arc::new(self)
    }

    /// Pins in library order.
    pub fn pins(&self) -> &[PinDefinition] {
        &self.pins
    }

    pub fn pin(&self, number: &str) -> Option<&PinDefinition> {
        self.pins.iter().find(|p| p.number == number)
    }

    pub fn is_power_symbol(&self) -> bool {
        self.power
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_kind_round_trips_kicad_names() {
        for name in ["input", "tri_state", "power_in", "no_connect", "open_emitter"] {
            assert_eq!(name.parse::<PinKind>().unwrap().as_str(), name);
        }
        assert!("analog".parse::<PinKind>().is_err());
        assert!(PinKind::PowerOut.is_power());
        assert!(!PinKind::Passive.is_power());
    }

    #[test]
    fn test_duplicate_pin_numbers_keep_first() {
        let symbol = Symbol::new(
            "Device:Q",
            vec![
                PinDefinition::new("1", Point::new(0.0, 1.0), Angle::DOWN, PinKind::Passive),
                PinDefinition::new("1", Point::new(5.0, 5.0), Angle::UP, PinKind::Input),
                PinDefinition::new("2", Point::new(0.0, -1.0), Angle::UP, PinKind::Passive),
            ],
        );
        assert_eq!(symbol.pins().len(), 2);
        assert_eq!(symbol.pin("1").unwrap().local_position, Point::new(0.0, 1.0));
        assert!(symbol.pin("3").is_none());
    }

    #[test]
    fn test_first_reference_uses_library_prefix() {
        let bare = Symbol::new("Device:X", vec![]);
        assert_eq!(bare.first_reference(), "U1");
        let ground =
            Symbol::new("power:GND", vec![]).with_properties(Some("#PWR".into()), Some("GND".into()));
        assert_eq!(ground.first_reference(), "#PWR1");
        assert_eq!(ground.default_value.as_deref(), Some("GND"));
    }
}
