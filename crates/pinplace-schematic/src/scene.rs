//! TOML scene files: which symbol libraries to load, what to place, and the
//! operations to run afterwards.
//!
//! ```toml
//! libraries = ["symbols/Device.kicad_sym"]
//!
//! [[component]]
//! reference = "R1"
//! lib_id = "Device:R"
//! at = [101.6, 50.8]
//! rotation = 90
//!
//! [[operation]]
//! op = "label_pin"
//! pin = "R1.1"
//! text = "VIN"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use pinplace_eda::{find_kicad_symbol_dir, SymbolCache, SymbolError, SymbolLibrary};
use serde::Deserialize;

use crate::document::{Document, DocumentError};
use crate::operation::{ComponentSpec, Operation, OperationOutput};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Failed to read scene file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse scene file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("Operation #{index} ({op}) failed: {source}")]
    Operation {
        index: usize,
        op: &'static str,
        #[source]
        source: DocumentError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    /// Directory with `<Library>.kicad_sym` files, relative to the scene file.
    #[serde(default)]
    pub symbol_dir: Option<PathBuf>,
    /// Individual library files, registered under their file stem.
    #[serde(default)]
    pub libraries: Vec<PathBuf>,
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentSpec>,
    #[serde(default, rename = "operation")]
    pub operations: Vec<Operation>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// The result of one operation that ran.
#[derive(Debug)]
pub struct Step {
    pub index: usize,
    pub op: &'static str,
    pub outcome: Result<OperationOutput, DocumentError>,
}

/// A finished run: the resulting document plus every operation's outcome.
/// Only recoverable failures appear in `steps`; anything else aborts the run.
#[derive(Debug)]
pub struct SceneRun {
    pub document: Document,
    pub steps: Vec<Step>,
}

impl SceneRun {
    pub fn warnings(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.outcome.is_err())
    }
}

impl Scene {
    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        let content =
            fs::read_to_string(path).map_err(|e| SceneError::Read(path.to_path_buf(), e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        Self::parse(&content, path, base_dir)
    }

    /// Parse scene text; relative paths inside it resolve against `base_dir`.
    pub fn parse(content: &str, source: &Path, base_dir: PathBuf) -> Result<Self, SceneError> {
        let mut scene: Scene =
            toml::from_str(content).map_err(|e| SceneError::Parse(source.to_path_buf(), e))?;
        scene.base_dir = base_dir;
        log::debug!(
            "Scene {}: {} components, {} operations",
            source.display(),
            scene.components.len(),
            scene.operations.len()
        );
        Ok(scene)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Build the symbol cache for this scene; listed libraries are loaded
    /// eagerly. The symbol directory is `override_dir` when given, else the
    /// scene's own `symbol_dir`, else `KICAD_SYMBOL_DIR` or a KiCad install.
    pub fn symbol_cache(&self, override_dir: Option<PathBuf>) -> Result<SymbolCache, SceneError> {
        let dir = override_dir
            .or_else(|| self.symbol_dir.as_deref().map(|dir| self.resolve_path(dir)))
            .or_else(|| find_kicad_symbol_dir(None));
        log::debug!("Symbol directory: {dir:?}");
        let mut cache = SymbolCache::new(dir);
        for library in &self.libraries {
            cache.add_library(SymbolLibrary::from_file(&self.resolve_path(library))?);
        }
        Ok(cache)
    }

    /// Place the components, then run the operations in order.
    ///
    /// Duplicate wires and labels are kept as failed steps and the run goes
    /// on; any other failure stops it.
    pub fn run(&self, symbols: &mut SymbolCache) -> Result<SceneRun, SceneError> {
        let mut document = Document::new();
        let mut steps = Vec::new();

        let ops = self
            .components
            .iter()
            .cloned()
            .map(Operation::AddComponent)
            .chain(self.operations.iter().cloned());

        for (index, op) in ops.enumerate() {
            match op.apply(&mut document, symbols) {
                Err(source) if !source.is_recoverable() => {
                    return Err(SceneError::Operation {
                        index,
                        op: op.name(),
                        source,
                    });
                }
                outcome => {
                    if let Err(e) = &outcome {
                        log::warn!("Operation #{index} ({}): {e}", op.name());
                    }
                    steps.push(Step {
                        index,
                        op: op.name(),
                        outcome,
                    });
                }
            }
        }

        Ok(SceneRun { document, steps })
    }
}
