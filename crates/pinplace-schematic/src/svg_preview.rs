//! Quick-look SVG drawing of a document: pin stubs, wires and labels.
//!
//! Not a faithful KiCad rendering. Symbol bodies are unknown here, so each
//! component is shown as its pins plus its reference at the origin.

use std::path::Path;

use pinplace_engine::{world_pins, Angle, Point};
use svg::node::element::{Circle, Group, Line, Text};
use svg::Document as SvgDocument;

use crate::document::Document;

const MARGIN: f64 = 10.0;
const PIN_LENGTH: f64 = 2.54;
const FONT_SIZE: f64 = 1.27;

/// `from` moved `length` along a counter-clockwise angle, in Y-down coordinates.
fn step(from: Point, angle: Angle, length: f64) -> Point {
    let radians = angle.degrees().to_radians();
    Point::new(
        from.x + length * radians.cos(),
        from.y - length * radians.sin(),
    )
}

#[derive(Default)]
struct Bounds {
    min: Option<Point>,
    max: Option<Point>,
}

impl Bounds {
    fn include(&mut self, p: Point) {
        self.min = Some(match self.min {
            Some(m) => Point::new(m.x.min(p.x), m.y.min(p.y)),
            None => p,
        });
        self.max = Some(match self.max {
            Some(m) => Point::new(m.x.max(p.x), m.y.max(p.y)),
            None => p,
        });
    }

    /// `(x, y, width, height)` with the margin added on every side.
    fn view_box(&self) -> (f64, f64, f64, f64) {
        let min = self.min.unwrap_or(Point::ORIGIN);
        let max = self.max.unwrap_or(Point::ORIGIN);
        (
            min.x - MARGIN,
            min.y - MARGIN,
            max.x - min.x + 2.0 * MARGIN,
            max.y - min.y + 2.0 * MARGIN,
        )
    }
}

fn line(a: Point, b: Point, stroke: &str, width: f64) -> Line {
    Line::new()
        .set("x1", a.x)
        .set("y1", a.y)
        .set("x2", b.x)
        .set("y2", b.y)
        .set("stroke", stroke)
        .set("stroke-width", width)
}

/// Text reading in `orientation`. Leftward and downward text is flipped and
/// end-anchored so it stays upright.
fn oriented_text(content: &str, at: Point, orientation: Angle, fill: &str) -> Text {
    sized_text(content, at, orientation, fill, FONT_SIZE)
}

fn sized_text(content: &str, at: Point, orientation: Angle, fill: &str, size: f64) -> Text {
    let flipped = orientation == Angle::LEFT || orientation == Angle::DOWN;
    let (anchor, degrees) = if flipped {
        ("end", orientation.degrees() - 180.0)
    } else {
        ("start", orientation.degrees())
    };
    Text::new()
        .set("x", at.x)
        .set("y", at.y)
        .set("font-size", size)
        .set("font-family", "monospace")
        .set("text-anchor", anchor)
        .set("fill", fill)
        // SVG rotates clockwise on screen
        .set("transform", format!("rotate({} {} {})", -degrees, at.x, at.y))
        .add(svg::node::Text::new(content))
}

/// Build the SVG drawing for `doc`.
pub fn to_svg(doc: &Document) -> SvgDocument {
    let mut bounds = Bounds::default();
    let mut components = Group::new().set("id", "components");
    for placement in doc.placements() {
        bounds.include(placement.position);
        let mut group = Group::new().set("id", placement.reference.as_str());
        for pin in world_pins(placement) {
            let inner = step(pin.position, pin.orientation, PIN_LENGTH);
            bounds.include(pin.position);
            bounds.include(inner);
            group = group
                .add(line(pin.position, inner, "#840000", 0.254))
                .add(
                    Circle::new()
                        .set("cx", pin.position.x)
                        .set("cy", pin.position.y)
                        .set("r", 0.3)
                        .set("fill", "#840000"),
                );
        }
        group = group.add(oriented_text(
            &placement.reference,
            placement.position,
            Angle::RIGHT,
            "#006464",
        ));
        components = components.add(group);
    }

    let mut wires = Group::new().set("id", "wires");
    for record in doc.wires() {
        let (a, b) = (record.item.start.point, record.item.end.point);
        bounds.include(a);
        bounds.include(b);
        wires = wires.add(line(a, b, "#009600", 0.254));
    }

    let mut labels = Group::new().set("id", "labels");
    for record in doc.labels().iter().filter(|l| !l.item.suppressed) {
        let label = &record.item;
        bounds.include(label.anchor);
        labels = labels.add(oriented_text(
            &label.text,
            label.anchor,
            label.text_orientation,
            "#000000",
        ));
    }

    let mut notes = Group::new().set("id", "notes");
    for record in doc.texts() {
        let note = &record.item;
        bounds.include(note.position);
        notes = notes.add(sized_text(
            &note.text,
            note.position,
            note.angle,
            "#484848",
            note.size,
        ));
    }

    let (x, y, width, height) = bounds.view_box();
    SvgDocument::new()
        .set("width", format!("{width}mm"))
        .set("height", format!("{height}mm"))
        .set("viewBox", (x, y, width, height))
        .add(wires)
        .add(components)
        .add(labels)
        .add(notes)
}

pub fn save_svg(doc: &Document, path: &Path) -> std::io::Result<()> {
    log::debug!("Writing SVG preview to {}", path.display());
    svg::save(path, &to_svg(doc))
}
