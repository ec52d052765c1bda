//! Decide where labels and wires go so they land exactly on pins.
//!
//! The free functions are pure and take already-resolved [`WorldPin`]s.
//! [`Planner`] adds the lookup step on top of a [`SchematicView`] and turns
//! bad references into [`PlacementError`]s.

use serde::{Deserialize, Serialize};

use crate::geometry::{Angle, Point};
use crate::placement::ComponentKind;
use crate::transform::{PinRef, WorldPin};
use crate::view::SchematicView;
use crate::PlacementError;

/// A net label attached to a pin (or, with no target, floating at a point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    pub text: String,
    pub target: Option<PinRef>,
    pub anchor: Point,
    pub text_orientation: Angle,
    /// Set on power symbols, whose glyph already shows the net. Suppressed
    /// labels are tracked but never written out.
    pub suppressed: bool,
}

/// One end of a wire: a point, and the pin it was resolved from if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEnd {
    pub point: Point,
    pub pin: Option<PinRef>,
}

impl WireEnd {
    pub fn at(point: Point) -> Self {
        Self { point, pin: None }
    }

    pub fn on(pin: &WorldPin) -> Self {
        Self {
            point: pin.position,
            pin: Some(pin.pin.clone()),
        }
    }
}

/// A straight wire between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSegment {
    pub start: WireEnd,
    pub end: WireEnd,
}

impl WireSegment {
    /// True when both segments join the same two points, in either direction.
    pub fn spans_same_points(&self, other: &WireSegment) -> bool {
        let (a, b) = (self.start.point, self.end.point);
        let (c, d) = (other.start.point, other.end.point);
        (a == c && b == d) || (a == d && b == c)
    }

    pub fn is_zero_length(&self) -> bool {
        self.start.point == self.end.point
    }
}

/// Snap a direction to the nearest of 0/90/180/270. Each boundary belongs to
/// the bucket that starts there: 45 → 90, 135 → 180, 225 → 270, 315 → 0.
pub fn cardinal(angle: Angle) -> Angle {
    let d = angle.degrees();
    if d < 45.0 || d >= 315.0 {
        Angle::RIGHT
    } else if d < 135.0 {
        Angle::UP
    } else if d < 225.0 {
        Angle::LEFT
    } else {
        Angle::DOWN
    }
}

/// Text direction for a label on a pin with the given world orientation: the
/// opposite direction, snapped to a cardinal.
pub fn label_orientation(pin_orientation: Angle) -> Angle {
    cardinal(pin_orientation.opposite())
}

/// Plan a label on `pin`.
///
/// The anchor is the pin position itself; any offset would break electrical
/// contact.
pub fn plan_label(pin: &WorldPin, text: &str, component: ComponentKind) -> LabelPlacement {
    if component == ComponentKind::PowerSymbol {
        log::debug!("Suppressing label '{text}' on power symbol pin {}", pin.pin);
        return LabelPlacement {
            text: text.to_string(),
            target: Some(pin.pin.clone()),
            anchor: pin.position,
            text_orientation: Angle::ZERO,
            suppressed: true,
        };
    }

    LabelPlacement {
        text: text.to_string(),
        target: Some(pin.pin.clone()),
        anchor: pin.position,
        text_orientation: label_orientation(pin.orientation),
        suppressed: false,
    }
}

/// A label at an arbitrary point, reading rightward.
pub fn plan_label_at(point: Point, text: &str) -> LabelPlacement {
    LabelPlacement {
        text: text.to_string(),
        target: None,
        anchor: point,
        text_orientation: Angle::RIGHT,
        suppressed: false,
    }
}

pub fn plan_wire(a: &WorldPin, b: &WorldPin) -> WireSegment {
    WireSegment {
        start: WireEnd::on(a),
        end: WireEnd::on(b),
    }
}

pub fn plan_wire_to_pin(from: Point, pin: &WorldPin) -> WireSegment {
    WireSegment {
        start: WireEnd::at(from),
        end: WireEnd::on(pin),
    }
}

/// Reject `wire` when it would add nothing: an identical segment already
/// exists, or both ends are the same point.
pub fn check_duplicate(wire: &WireSegment, existing: &[WireSegment]) -> Result<(), PlacementError> {
    if wire.is_zero_length() || existing.iter().any(|w| w.spans_same_points(wire)) {
        return Err(PlacementError::DuplicateWire {
            start: wire.start.point,
            end: wire.end.point,
        });
    }
    Ok(())
}

/// Pin-reference front end to the planning functions.
pub struct Planner<'a, V: SchematicView + ?Sized> {
    view: &'a V,
}

impl<'a, V: SchematicView + ?Sized> Planner<'a, V> {
    pub fn new(view: &'a V) -> Self {
        Self { view }
    }

    fn component_kind(&self, pin: &PinRef) -> Result<ComponentKind, PlacementError> {
        let placement = self
            .view
            .placement_of(&pin.reference)
            .ok_or_else(|| PlacementError::UnknownComponent(pin.reference.clone()))?;
        Ok(if self.view.is_power_symbol(placement) {
            ComponentKind::PowerSymbol
        } else {
            ComponentKind::Regular
        })
    }

    pub fn label_pin(&self, pin: &PinRef, text: &str) -> Result<LabelPlacement, PlacementError> {
        let world = self.view.resolve_pin(pin)?;
        Ok(plan_label(&world, text, self.component_kind(pin)?))
    }

    /// Join two pins by giving both the same net label instead of drawing a wire.
    pub fn connect_with_labels(
        &self,
        a: &PinRef,
        b: &PinRef,
        net: &str,
    ) -> Result<[LabelPlacement; 2], PlacementError> {
        // Resolve both before producing anything
        let first = self.label_pin(a, net)?;
        let second = self.label_pin(b, net)?;
        Ok([first, second])
    }

    pub fn wire_pins(
        &self,
        a: &PinRef,
        b: &PinRef,
        existing: &[WireSegment],
    ) -> Result<WireSegment, PlacementError> {
        let start = self.view.resolve_pin(a)?;
        let end = self.view.resolve_pin(b)?;
        let wire = plan_wire(&start, &end);
        check_duplicate(&wire, existing)?;
        Ok(wire)
    }

    pub fn wire_to_pin(
        &self,
        from: Point,
        pin: &PinRef,
        existing: &[WireSegment],
    ) -> Result<WireSegment, PlacementError> {
        let end = self.view.resolve_pin(pin)?;
        let wire = plan_wire_to_pin(from, &end);
        check_duplicate(&wire, existing)?;
        Ok(wire)
    }

    /// Chain `pins` with wires in the given order. Segments that would
    /// duplicate an existing (or earlier planned) wire are skipped; an
    /// unresolvable pin fails the whole net with nothing planned.
    pub fn wire_net(
        &self,
        pins: &[PinRef],
        existing: &[WireSegment],
    ) -> Result<Vec<WireSegment>, PlacementError> {
        let resolved = pins
            .iter()
            .map(|pin| self.view.resolve_pin(pin))
            .collect::<Result<Vec<_>, _>>()?;

        let mut planned: Vec<WireSegment> = Vec::new();
        for pair in resolved.windows(2) {
            let wire = plan_wire(&pair[0], &pair[1]);
            match check_duplicate(&wire, existing).and_then(|()| check_duplicate(&wire, &planned)) {
                Ok(()) => planned.push(wire),
                Err(e) => log::warn!("Skipping {} -> {}: {e}", pair[0].pin, pair[1].pin),
            }
        }
        Ok(planned)
    }
}
