use pinplace_engine::{Angle, PinDefinition, PinKind, Point, Symbol};
use pinplace_sexpr::Sexpr;

use crate::SymbolError;

/// A `(symbol ...)` entry of a `.kicad_sym` library before `extends` is resolved.
#[derive(Debug, Default, Clone)]
pub struct KicadSymbol {
    pub(super) name: String,
    pub(super) extends: Option<String>,
    pub(super) pins: Vec<PinDefinition>,
    pub(super) power: bool,
    pub(super) reference: Option<String>,
    pub(super) value: Option<String>,
}

impl KicadSymbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// Convert into the engine's pin table under `library:name`.
    pub fn into_symbol(self, library: &str) -> Symbol {
        let lib_id = format!("{library}:{}", self.name);
        // power symbols live in the `power` library even when the flag is missing
        let power = self.power || library == "power";
        Symbol::new(lib_id, self.pins)
            .power(power)
            .with_properties(self.reference, self.value)
    }
}

/// Parse one `(symbol "Name" ...)` list.
pub(super) fn parse_symbol(sexpr: &Sexpr) -> Result<KicadSymbol, SymbolError> {
    let name = sexpr
        .get(1)
        .and_then(Sexpr::as_atom)
        .ok_or_else(|| SymbolError::Malformed {
            symbol: "<unnamed>".to_string(),
            reason: "symbol name not found".to_string(),
        })?
        .to_string();

    let mut symbol = KicadSymbol {
        name,
        ..Default::default()
    };

    for item in sexpr.as_list().unwrap_or_default().iter().skip(2) {
        match item.tag() {
            Some("extends") => {
                symbol.extends = item.get(1).and_then(Sexpr::as_atom).map(str::to_string);
            }
            Some("power") => symbol.power = true,
            Some("property") => parse_property(&mut symbol, item),
            Some("pin") => {
                let pin = parse_pin(&symbol.name, item)?;
                symbol.pins.push(pin);
            }
            // Unit sub-symbols (`R_0_1`, `R_1_1`) carry the pins of each unit
            Some("symbol") => collect_unit_pins(&mut symbol, item)?,
            _ => {}
        }
    }

    log::debug!(
        "Parsed symbol '{}' with {} pins{}",
        symbol.name,
        symbol.pins.len(),
        if symbol.power { " (power)" } else { "" }
    );
    Ok(symbol)
}

fn collect_unit_pins(symbol: &mut KicadSymbol, unit: &Sexpr) -> Result<(), SymbolError> {
    for item in unit.as_list().unwrap_or_default() {
        match item.tag() {
            Some("pin") => {
                let pin = parse_pin(&symbol.name, item)?;
                symbol.pins.push(pin);
            }
            Some("symbol") => collect_unit_pins(symbol, item)?,
            _ => {}
        }
    }
    Ok(())
}

fn parse_property(symbol: &mut KicadSymbol, item: &Sexpr) {
    let (Some(key), Some(value)) = (
        item.get(1).and_then(Sexpr::as_atom),
        item.get(2).and_then(Sexpr::as_atom),
    ) else {
        return;
    };
    match key {
        "Reference" => symbol.reference = Some(value.to_string()),
        "Value" => symbol.value = Some(value.to_string()),
        _ => {}
    }
}

/// `(pin power_in line (at 0 3.81 270) (length 1.27) (name "~") (number "1"))`
fn parse_pin(symbol: &str, item: &Sexpr) -> Result<PinDefinition, SymbolError> {
    let malformed = |reason: String| SymbolError::Malformed {
        symbol: symbol.to_string(),
        reason,
    };

    let number = item
        .child_atom("number")
        .ok_or_else(|| malformed("pin without a number".to_string()))?;

    let at = item
        .find("at")
        .ok_or_else(|| malformed(format!("pin {number} has no position")))?;
    let (Some(x), Some(y)) = (
        at.get(1).and_then(Sexpr::as_f64),
        at.get(2).and_then(Sexpr::as_f64),
    ) else {
        return Err(malformed(format!("pin {number} has an unreadable position")));
    };
    // Angle is optional
    let angle = at.get(3).and_then(Sexpr::as_f64).unwrap_or(0.0);

    let kind = match item.get(1).and_then(Sexpr::as_atom) {
        Some(type_name) => type_name.parse::<PinKind>().unwrap_or_else(|e| {
            log::warn!("{symbol}: pin {number}: {e}, treating as unspecified");
            PinKind::Unspecified
        }),
        None => PinKind::Unspecified,
    };

    let name = item.child_atom("name").unwrap_or_default();

    Ok(PinDefinition::new(number, Point::new(x, y), Angle::new(angle), kind).with_name(name))
}
