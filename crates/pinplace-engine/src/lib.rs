//! # pinplace-engine
//!
//! Pin geometry and connection placement for schematic diagrams.
//!
//! Given a component placed with a position, a right-angle rotation and an
//! optional mirror, this crate computes where each of its pins sits on the
//! sheet and which way it points, then plans labels and wires that land
//! exactly on those points:
//!
//! * [`geometry`] – points, angles, exact right-angle transforms.
//! * [`transform`] – symbol-local pin → [`WorldPin`].
//! * [`planner`] – labels with pin-aware text direction, pin-to-pin wires.
//! * [`validate`] – re-check records against recomputed pins.
//!
//! Everything here is pure. The sheet that owns placements hands in a
//! read-only [`SchematicView`]; nothing in this crate keeps state between calls.

pub mod geometry;
pub mod placement;
pub mod planner;
pub mod symbol;
pub mod transform;
pub mod validate;

mod error;
mod view;

pub use error::PlacementError;
pub use geometry::{authored_to_world, Angle, Mirror, Point, Rotation};
pub use placement::{ComponentKind, ComponentPlacement};
pub use planner::{
    check_duplicate, label_orientation, plan_label, plan_label_at, plan_wire, plan_wire_to_pin,
    LabelPlacement, Planner, WireEnd, WireSegment,
};
pub use symbol::{PinDefinition, PinKind, Symbol, SymbolRef};
pub use transform::{world_pin_by_number, world_pin_of, world_pins, PinRef, WorldPin};
pub use validate::{validate, validate_all, Connection, Finding, Subject, ValidationResult};
pub use view::SchematicView;
