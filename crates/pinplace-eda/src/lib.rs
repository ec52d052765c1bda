//! KiCad symbol libraries as shared pin tables.
//!
//! A `.kicad_sym` file is read once into a [`SymbolLibrary`]; each symbol
//! becomes an immutable [`pinplace_engine::Symbol`] behind an `Arc`, so every
//! placement of `Device:R` shares one pin table.

pub mod kicad;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use kicad::symbol_library::KicadSymbolLibrary;
use pinplace_engine::SymbolRef;
use pinplace_sexpr::ParseError;

/// Environment variable that points at the KiCad symbol directory.
pub const SYMBOL_DIR_ENV: &str = "KICAD_SYMBOL_DIR";

#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("Failed to read symbol file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse symbol library {0}: {1}")]
    Parse(String, #[source] ParseError),

    #[error("Malformed symbol {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("Symbol {0} not found in library {1}")]
    NotFound(String, String),

    #[error("Invalid library reference '{0}'. Expected 'Library:Name'")]
    InvalidLibId(String),

    #[error(
        "KiCad symbol directory not found. Please set KICAD_SYMBOL_DIR environment variable or install KiCad"
    )]
    SymbolDirNotFound,
}

/// Split `Library:Name`.
pub fn split_lib_id(lib_id: &str) -> Result<(&str, &str), SymbolError> {
    match lib_id.split_once(':') {
        Some((library, name)) if !library.is_empty() && !name.is_empty() && !name.contains(':') => {
            Ok((library, name))
        }
        _ => Err(SymbolError::InvalidLibId(lib_id.to_string())),
    }
}

/// A loaded library: nickname plus its symbols keyed by bare name.
#[derive(Debug, Clone)]
pub struct SymbolLibrary {
    nickname: String,
    symbols: Vec<SymbolRef>,
    by_name: HashMap<String, usize>,
}

impl SymbolLibrary {
    /// Parse a library; its nickname is the file stem (`Device.kicad_sym` → `Device`).
    pub fn from_file(path: &Path) -> Result<Self, SymbolError> {
        let nickname = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("lib")
            .to_string();
        log::debug!("Loading symbol library {} as '{nickname}'", path.display());
        let content =
            fs::read_to_string(path).map_err(|e| SymbolError::Read(path.to_path_buf(), e))?;
        Self::from_string(&content, &nickname)
    }

    pub fn from_string(content: &str, nickname: &str) -> Result<Self, SymbolError> {
        let lib = KicadSymbolLibrary::from_string(content, nickname)?;
        let mut symbols = Vec::new();
        let mut by_name = HashMap::new();
        for symbol in lib.into_symbols() {
            by_name.insert(symbol.name().to_string(), symbols.len());
            symbols.push(symbol.into_symbol(nickname).into_ref());
        }
        Ok(SymbolLibrary {
            nickname: nickname.to_string(),
            symbols,
            by_name,
        })
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn symbols(&self) -> &[SymbolRef] {
        &self.symbols
    }

    /// Look up by bare name (`R`).
    pub fn get(&self, name: &str) -> Option<SymbolRef> {
        self.by_name.get(name).map(|&i| self.symbols[i].clone())
    }

    pub fn symbol_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Lazily loads libraries by nickname and hands out shared symbols by lib id.
///
/// Libraries registered explicitly take precedence over files in the symbol
/// directory.
#[derive(Debug, Default)]
pub struct SymbolCache {
    symbol_dir: Option<PathBuf>,
    libraries: HashMap<String, SymbolLibrary>,
}

impl SymbolCache {
    pub fn new(symbol_dir: Option<PathBuf>) -> Self {
        Self {
            symbol_dir,
            libraries: HashMap::new(),
        }
    }

    pub fn symbol_dir(&self) -> Option<&Path> {
        self.symbol_dir.as_deref()
    }

    pub fn add_library(&mut self, library: SymbolLibrary) {
        log::debug!(
            "Registered library '{}' ({} symbols)",
            library.nickname(),
            library.symbols().len()
        );
        self.libraries.insert(library.nickname().to_string(), library);
    }

    /// Resolve `Library:Name` to a shared symbol, loading `Library.kicad_sym`
    /// from the symbol directory on first use.
    pub fn resolve(&mut self, lib_id: &str) -> Result<SymbolRef, SymbolError> {
        let (library, name) = split_lib_id(lib_id)?;
        if !self.libraries.contains_key(library) {
            let dir = self
                .symbol_dir
                .as_ref()
                .ok_or(SymbolError::SymbolDirNotFound)?;
            let loaded = SymbolLibrary::from_file(&dir.join(format!("{library}.kicad_sym")))?;
            self.libraries.insert(library.to_string(), loaded);
        }

        self.libraries
            .get(library)
            .and_then(|lib| lib.get(name))
            .ok_or_else(|| SymbolError::NotFound(name.to_string(), library.to_string()))
    }
}

/// Locate the KiCad symbol directory: an explicit path first, then
/// `KICAD_SYMBOL_DIR`, then the usual install locations for this platform.
pub fn find_kicad_symbol_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let mut candidates = Vec::new();
    if let Ok(env_path) = std::env::var(SYMBOL_DIR_ENV) {
        candidates.push(PathBuf::from(env_path));
    }

    if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from(
            "/Applications/KiCad/KiCad.app/Contents/SharedSupport/symbols",
        ));
        candidates.push(PathBuf::from("/Library/Application Support/kicad/symbols"));
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join("Library/Application Support/kicad/symbols"));
        }
    } else if cfg!(target_os = "windows") {
        candidates.push(PathBuf::from("C:\\Program Files\\KiCad\\share\\kicad\\symbols"));
        if let Some(config) = dirs::config_dir() {
            candidates.push(config.join("kicad\\symbols"));
        }
    } else {
        candidates.push(PathBuf::from("/usr/share/kicad/symbols"));
        candidates.push(PathBuf::from("/usr/local/share/kicad/symbols"));
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".local/share/kicad/symbols"));
        }
    }

    let found = candidates.into_iter().find(|p| p.exists());
    log::debug!("KiCad symbol directory: {found:?}");
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lib_id() {
        assert_eq!(split_lib_id("Device:R").unwrap(), ("Device", "R"));
        assert!(split_lib_id("Device").is_err());
        assert!(split_lib_id(":R").is_err());
        assert!(split_lib_id("a:b:c").is_err());
    }

    #[test]
    fn test_resolve_without_directory() {
        let mut cache = SymbolCache::new(None);
        assert!(matches!(
            cache.resolve("Device:R"),
            Err(SymbolError::SymbolDirNotFound)
        ));
    }
}
