//! Points, angles and the right-angle transforms applied to symbol geometry.
//!
//! World space is the schematic's screen-style coordinate system: millimeters,
//! +X to the right, +Y *down*. Angles are degrees and increase counter-clockwise
//! as seen on screen (0° right, 90° up, 180° left, 270° down).
//!
//! Every transform here is an exact swap/negate of coordinates. Nothing goes
//! through `sin`/`cos`, so repeated transforms never drift.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::PlacementError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An angle in degrees, always stored normalized to `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);
    pub const RIGHT: Angle = Angle(0.0);
    pub const UP: Angle = Angle(90.0);
    pub const LEFT: Angle = Angle(180.0);
    pub const DOWN: Angle = Angle(270.0);

    pub fn new(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negatives, and keeps -0
        if normalized >= 360.0 || normalized == 0.0 {
            Angle(0.0)
        } else {
            Angle(normalized)
        }
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Angle {
        self + Angle(180.0)
    }
}

impl From<f64> for Angle {
    fn from(degrees: f64) -> Self {
        Angle::new(degrees)
    }
}

impl From<Angle> for f64 {
    fn from(angle: Angle) -> f64 {
        angle.0
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle::new(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Angle {
        Angle::new(self.0 - rhs.0)
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        Angle::new(-self.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// A component rotation. Only the four right angles exist; anything else is
/// rejected when converting from degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn degrees(self) -> f64 {
        f64::from(self.quarter_turns()) * 90.0
    }

    pub fn as_angle(self) -> Angle {
        Angle::new(self.degrees())
    }

    /// This rotation followed by `other`.
    pub fn then(self, other: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// Turn a world-space offset counter-clockwise on screen. With +Y down a
    /// quarter turn maps `(x, y)` to `(y, -x)`.
    pub fn apply(self, p: Point) -> Point {
        match self {
            Rotation::Deg0 => p,
            Rotation::Deg90 => Point::new(p.y, -p.x),
            Rotation::Deg180 => Point::new(-p.x, -p.y),
            Rotation::Deg270 => Point::new(-p.y, p.x),
        }
    }
}

impl TryFrom<f64> for Rotation {
    type Error = PlacementError;

    fn try_from(degrees: f64) -> Result<Self, Self::Error> {
        let normalized = Angle::new(degrees).degrees();
        match normalized {
            d if d == 0.0 => Ok(Rotation::Deg0),
            d if d == 90.0 => Ok(Rotation::Deg90),
            d if d == 180.0 => Ok(Rotation::Deg180),
            d if d == 270.0 => Ok(Rotation::Deg270),
            _ => Err(PlacementError::MalformedPlacement(format!(
                "rotation {degrees}° is not a right angle"
            ))),
        }
    }
}

impl From<Rotation> for f64 {
    fn from(rotation: Rotation) -> f64 {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Reflection applied to a component before its rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror {
    #[default]
    None,
    /// Flip left/right: negates X.
    Horizontal,
    /// Flip up/down: negates Y.
    Vertical,
}

impl Mirror {
    pub fn apply(self, p: Point) -> Point {
        match self {
            Mirror::None => p,
            Mirror::Horizontal => Point::new(-p.x, p.y),
            Mirror::Vertical => Point::new(p.x, -p.y),
        }
    }

    /// Reflect a direction the same way [`Mirror::apply`] reflects a position.
    pub fn apply_angle(self, angle: Angle) -> Angle {
        match self {
            Mirror::None => angle,
            Mirror::Horizontal => Angle::new(180.0 - angle.degrees()),
            Mirror::Vertical => -angle,
        }
    }

    /// Compose this mirror with a further reflection across `axis`.
    ///
    /// Reflecting twice across the same axis cancels; reflecting across both
    /// axes is a half turn, returned as the extra rotation to fold into the
    /// placement.
    pub fn toggle(self, axis: Mirror) -> (Mirror, Rotation) {
        match (self, axis) {
            (current, Mirror::None) => (current, Rotation::Deg0),
            (Mirror::None, axis) => (axis, Rotation::Deg0),
            (current, axis) if current == axis => (Mirror::None, Rotation::Deg0),
            _ => (Mirror::None, Rotation::Deg180),
        }
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mirror::None => "none",
            Mirror::Horizontal => "horizontal",
            Mirror::Vertical => "vertical",
        })
    }
}

/// Convert a symbol-local offset from the library's Y-up convention into the
/// schematic's Y-down convention.
///
/// This is the one place the two conventions are reconciled. Orientation
/// angles need no counterpart: they are measured counter-clockwise on screen in
/// both spaces.
pub fn authored_to_world(local: Point) -> Point {
    Point::new(local.x, -local.y)
}
