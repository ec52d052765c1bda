//! Re-check planned labels and wires against freshly computed pin positions.
//!
//! Validation never corrects anything. A record whose anchor drifted from its
//! pin is reported as a mismatch and left for the caller to deal with.

use serde::Serialize;

use crate::geometry::Point;
use crate::planner::{LabelPlacement, WireEnd, WireSegment};
use crate::transform::PinRef;
use crate::view::SchematicView;
use crate::PlacementError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Ok,
    Mismatch {
        pin: PinRef,
        expected: Point,
        actual: Point,
    },
    DuplicateLabel {
        pin: PinRef,
    },
    /// The record points at a component or pin that no longer exists.
    Unresolved {
        pin: PinRef,
    },
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Ok)
    }

    pub fn into_result(self) -> Result<(), PlacementError> {
        match self {
            ValidationResult::Ok => Ok(()),
            ValidationResult::Mismatch {
                expected, actual, ..
            } => Err(PlacementError::PlacementMismatch { expected, actual }),
            ValidationResult::DuplicateLabel { pin } => Err(PlacementError::DuplicateLabel(pin)),
            ValidationResult::Unresolved { pin } => Err(PlacementError::InvalidPinReference(pin)),
        }
    }
}

/// Something the validator can check.
#[derive(Debug, Clone, Copy)]
pub enum Connection<'a> {
    Label(&'a LabelPlacement),
    Wire(&'a WireSegment),
}

/// Validate one label or wire against `view`. `existing_labels` are the labels
/// already on the sheet, used for the duplicate-label check.
pub fn validate<V: SchematicView + ?Sized>(
    item: Connection<'_>,
    view: &V,
    existing_labels: &[LabelPlacement],
) -> ValidationResult {
    match item {
        Connection::Label(label) => validate_label(label, view, existing_labels),
        Connection::Wire(wire) => validate_wire(wire, view),
    }
}

fn check_end<V: SchematicView + ?Sized>(
    pin: &PinRef,
    actual: Point,
    view: &V,
) -> Result<(), ValidationResult> {
    let world = view
        .resolve_pin(pin)
        .map_err(|_| ValidationResult::Unresolved { pin: pin.clone() })?;
    if world.position != actual {
        return Err(ValidationResult::Mismatch {
            pin: pin.clone(),
            expected: world.position,
            actual,
        });
    }
    Ok(())
}

pub fn validate_label<V: SchematicView + ?Sized>(
    label: &LabelPlacement,
    view: &V,
    existing_labels: &[LabelPlacement],
) -> ValidationResult {
    let Some(pin) = &label.target else {
        return ValidationResult::Ok;
    };
    if let Err(finding) = check_end(pin, label.anchor, view) {
        return finding;
    }
    // check_end resolved the pin, so both lookups succeed here
    let on_power = view.placement_of(&pin.reference).is_some_and(|placement| {
        view.is_power_symbol(placement)
            || view
                .pins_of(placement)
                .iter()
                .any(|p| p.number == pin.number && p.kind.is_power())
    });
    let already_labelled = existing_labels
        .iter()
        .any(|other| !std::ptr::eq(other, label) && other.target.as_ref() == Some(pin));

    if on_power && already_labelled {
        ValidationResult::DuplicateLabel { pin: pin.clone() }
    } else {
        ValidationResult::Ok
    }
}

pub fn validate_wire<V: SchematicView + ?Sized>(wire: &WireSegment, view: &V) -> ValidationResult {
    for WireEnd { point, pin } in [&wire.start, &wire.end] {
        if let Some(pin) = pin {
            if let Err(finding) = check_end(pin, *point, view) {
                return finding;
            }
        }
    }
    ValidationResult::Ok
}

/// Which record a [`Finding`] is about, by index into its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Subject {
    Label(usize),
    Wire(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub subject: Subject,
    pub result: ValidationResult,
}

/// Validate every label then every wire, returning only the failures, in
/// record order. Each label is checked for duplicates against the labels
/// recorded before it.
pub fn validate_all<V: SchematicView + ?Sized>(
    view: &V,
    labels: &[LabelPlacement],
    wires: &[WireSegment],
) -> Vec<Finding> {
    let label_findings = labels.iter().enumerate().map(|(i, label)| Finding {
        subject: Subject::Label(i),
        result: validate_label(label, view, &labels[..i]),
    });
    let wire_findings = wires.iter().enumerate().map(|(i, wire)| Finding {
        subject: Subject::Wire(i),
        result: validate_wire(wire, view),
    });
    label_findings
        .chain(wire_findings)
        .filter(|finding| !finding.result.is_ok())
        .collect()
}
