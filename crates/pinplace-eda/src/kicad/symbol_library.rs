use std::collections::HashMap;

use pinplace_sexpr::parse;

use super::symbol::{parse_symbol, KicadSymbol};
use crate::SymbolError;

/// All symbols of one `.kicad_sym` file, with `extends` resolved.
#[derive(Debug)]
pub struct KicadSymbolLibrary {
    symbols: Vec<KicadSymbol>,
}

impl KicadSymbolLibrary {
    pub fn from_string(content: &str, source: &str) -> Result<Self, SymbolError> {
        let root = parse(content).map_err(|e| SymbolError::Parse(source.to_string(), e))?;
        if !root.is_tagged("kicad_symbol_lib") {
            log::debug!("{source}: top-level list is not kicad_symbol_lib, scanning anyway");
        }

        let mut symbols = root
            .find_all("symbol")
            .map(parse_symbol)
            .collect::<Result<Vec<_>, _>>()?;
        resolve_extends(&mut symbols);

        log::debug!("{source}: loaded {} symbols", symbols.len());
        Ok(KicadSymbolLibrary { symbols })
    }

    pub fn symbols(&self) -> &[KicadSymbol] {
        &self.symbols
    }

    pub fn get_symbol(&self, name: &str) -> Option<&KicadSymbol> {
        self.symbols.iter().find(|s| s.name() == name)
    }

    pub fn into_symbols(self) -> Vec<KicadSymbol> {
        self.symbols
    }
}

/// Derived symbols (`(extends "Parent")`) reuse the parent's pins and power
/// flag when they define none of their own. Chains resolve parent-first;
/// cycles and missing parents are left as they are.
fn resolve_extends(symbols: &mut [KicadSymbol]) {
    let index: HashMap<String, usize> = symbols
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name().to_string(), i))
        .collect();

    for i in 0..symbols.len() {
        let mut chain = Vec::new();
        let mut current = i;
        while let Some(parent) = symbols[current].extends() {
            let Some(&parent_idx) = index.get(parent) else {
                log::warn!(
                    "Symbol '{}' extends '{}' but parent not found",
                    symbols[i].name(),
                    parent
                );
                break;
            };
            if parent_idx == i || chain.contains(&parent_idx) {
                log::warn!("Circular extends chain at symbol '{}'", symbols[i].name());
                break;
            }
            chain.push(parent_idx);
            current = parent_idx;
        }

        // Nearest ancestor that actually has pins wins
        if symbols[i].pins.is_empty() {
            if let Some(&donor) = chain.iter().find(|&&idx| !symbols[idx].pins.is_empty()) {
                symbols[i].pins = symbols[donor].pins.clone();
            }
        }
        if symbols[i].reference.is_none() {
            if let Some(&donor) = chain.iter().find(|&&idx| symbols[idx].reference.is_some()) {
                symbols[i].reference = symbols[donor].reference.clone();
            }
        }
        if chain.iter().any(|&idx| symbols[idx].power) {
            symbols[i].power = true;
        }
    }
}
