//! A schematic sheet that owns component placements, labels, wires and text, and
//! the editing operations that act on it.
//!
//! The [`Document`] implements [`pinplace_engine::SchematicView`], so the
//! engine's planner and validator run directly against it. Scenes loaded from
//! TOML drive a document through the closed [`Operation`] set; the result can
//! be written as a `.kicad_sch` file or previewed as SVG.

pub mod document;
pub mod kicad_schematic;
pub mod operation;
pub mod scene;
pub mod svg_preview;

pub use document::{
    ComponentRecord, Document, DocumentError, LabelRecord, Record, TextNote, TextRecord,
    WireRecord,
};
pub use kicad_schematic::{to_kicad_schematic, write_kicad_schematic};
pub use operation::{
    ComponentFilter, ComponentSpec, FindingDisplay, Operation, OperationOutput, RecordSelector,
};
pub use scene::{Scene, SceneError, SceneRun, Step};
pub use svg_preview::{save_svg, to_svg};
