//! Write a [`Document`] as a minimal KiCad schematic (`.kicad_sch`).
//!
//! Only the records needed to reproduce the placement are emitted: symbol
//! instances, wires and local labels. Library symbol bodies are not embedded,
//! so KiCad resolves them from its own libraries on open.

use std::fs;
use std::path::Path;

use pinplace_engine::{Angle, ComponentPlacement, LabelPlacement, Mirror, Point, WireSegment};
use pinplace_sexpr::{format_sexpr, Sexpr};
use uuid::Uuid;

use crate::document::{Document, Record, TextNote};

const FILE_VERSION: &str = "20231120";
const GENERATOR: &str = "pinplace";
const FONT_SIZE: f64 = 1.27;

/// Render `doc` as `.kicad_sch` text.
pub fn to_kicad_schematic(doc: &Document) -> String {
    let sheet_uuid = Uuid::new_v4();
    let mut items = vec![
        Sexpr::tagged("version", [Sexpr::symbol(FILE_VERSION)]),
        Sexpr::tagged("generator", [Sexpr::string(GENERATOR)]),
        Sexpr::tagged("uuid", [Sexpr::symbol(sheet_uuid.to_string())]),
        Sexpr::tagged("paper", [Sexpr::string("A4")]),
        Sexpr::list(vec![Sexpr::symbol("lib_symbols")]),
    ];

    items.extend(doc.wires().iter().map(wire_to_sexpr));

    let suppressed = doc.labels().iter().filter(|l| l.item.suppressed).count();
    if suppressed > 0 {
        log::debug!("Skipping {suppressed} suppressed power-symbol labels");
    }
    items.extend(
        doc.labels()
            .iter()
            .filter(|l| !l.item.suppressed)
            .map(label_to_sexpr),
    );

    items.extend(doc.texts().iter().map(text_to_sexpr));

    items.extend(
        doc.components()
            .iter()
            .map(|c| symbol_to_sexpr(c, sheet_uuid)),
    );

    items.push(Sexpr::tagged(
        "sheet_instances",
        [Sexpr::tagged(
            "path",
            [
                Sexpr::string("/"),
                Sexpr::tagged("page", [Sexpr::string("1")]),
            ],
        )],
    ));

    format_sexpr(&Sexpr::tagged("kicad_sch", items), 0)
}

pub fn write_kicad_schematic(doc: &Document, path: &Path) -> std::io::Result<()> {
    log::debug!("Writing schematic to {}", path.display());
    fs::write(path, to_kicad_schematic(doc))
}

fn at(p: Point, angle: f64) -> Sexpr {
    Sexpr::tagged(
        "at",
        [Sexpr::number(p.x), Sexpr::number(p.y), Sexpr::number(angle)],
    )
}

fn uuid(uuid: &Uuid) -> Sexpr {
    Sexpr::tagged("uuid", [Sexpr::symbol(uuid.to_string())])
}

fn font(size: f64) -> Sexpr {
    Sexpr::tagged(
        "font",
        [Sexpr::tagged("size", [Sexpr::number(size), Sexpr::number(size)])],
    )
}

fn yes_no(flag: bool) -> Sexpr {
    Sexpr::symbol(if flag { "yes" } else { "no" })
}

fn wire_to_sexpr(record: &Record<WireSegment>) -> Sexpr {
    let xy = |p: Point| Sexpr::tagged("xy", [Sexpr::number(p.x), Sexpr::number(p.y)]);
    let wire = &record.item;
    Sexpr::tagged(
        "wire",
        [
            Sexpr::tagged("pts", [xy(wire.start.point), xy(wire.end.point)]),
            Sexpr::tagged(
                "stroke",
                [
                    Sexpr::tagged("width", [Sexpr::number(0.0)]),
                    Sexpr::tagged("type", [Sexpr::symbol("default")]),
                ],
            ),
            uuid(&record.uuid),
        ],
    )
}

/// KiCad anchors a local label at the end its text starts from; text read
/// leftward or downward is right-justified.
fn justify(text_orientation: Angle) -> &'static str {
    if text_orientation == Angle::LEFT || text_orientation == Angle::DOWN {
        "right"
    } else {
        "left"
    }
}

fn label_to_sexpr(record: &Record<LabelPlacement>) -> Sexpr {
    let label = &record.item;
    Sexpr::tagged(
        "label",
        [
            Sexpr::string(label.text.clone()),
            at(label.anchor, label.text_orientation.degrees()),
            Sexpr::tagged("fields_autoplaced", [yes_no(true)]),
            Sexpr::tagged(
                "effects",
                [
                    font(FONT_SIZE),
                    Sexpr::tagged(
                        "justify",
                        [
                            Sexpr::symbol(justify(label.text_orientation)),
                            Sexpr::symbol("bottom"),
                        ],
                    ),
                ],
            ),
            uuid(&record.uuid),
        ],
    )
}

fn text_to_sexpr(record: &Record<TextNote>) -> Sexpr {
    let note = &record.item;
    Sexpr::tagged(
        "text",
        [
            Sexpr::string(note.text.clone()),
            Sexpr::tagged("exclude_from_sim", [yes_no(false)]),
            at(note.position, note.angle.degrees()),
            Sexpr::tagged("effects", [font(note.size)]),
            uuid(&record.uuid),
        ],
    )
}

fn property(key: &str, value: &str, position: Point, hide: bool) -> Sexpr {
    let mut effects = vec![font(FONT_SIZE)];
    if hide {
        effects.push(Sexpr::tagged("hide", [yes_no(true)]));
    }
    Sexpr::tagged(
        "property",
        [
            Sexpr::string(key),
            Sexpr::string(value),
            at(position, 0.0),
            Sexpr::tagged("effects", effects),
        ],
    )
}

/// `(mirror ..)` names the axis KiCad flips across: a left/right flip is a
/// mirror across the Y axis.
fn mirror_axis(mirror: Mirror) -> Option<&'static str> {
    match mirror {
        Mirror::None => None,
        Mirror::Horizontal => Some("y"),
        Mirror::Vertical => Some("x"),
    }
}

fn symbol_to_sexpr(record: &Record<ComponentPlacement>, sheet_uuid: Uuid) -> Sexpr {
    let placement = &record.item;
    let power = placement.symbol.is_power_symbol();

    let mut items = vec![
        Sexpr::tagged("lib_id", [Sexpr::string(placement.symbol.lib_id.clone())]),
        at(placement.position, placement.rotation.degrees()),
    ];
    if let Some(axis) = mirror_axis(placement.mirror) {
        items.push(Sexpr::tagged("mirror", [Sexpr::symbol(axis)]));
    }
    items.extend([
        Sexpr::tagged("unit", [Sexpr::number(1.0)]),
        Sexpr::tagged("exclude_from_sim", [yes_no(false)]),
        Sexpr::tagged("in_bom", [yes_no(!power)]),
        Sexpr::tagged("on_board", [yes_no(!power)]),
        Sexpr::tagged("dnp", [yes_no(false)]),
        uuid(&record.uuid),
    ]);

    // Fields sit just off the origin; KiCad re-autoplaces them on edit
    let offset = Point::new(2.54, 0.0);
    items.push(property(
        "Reference",
        &placement.reference,
        placement.position + offset - Point::new(0.0, FONT_SIZE),
        power,
    ));
    items.push(property(
        "Value",
        &placement.value,
        placement.position + offset + Point::new(0.0, FONT_SIZE),
        false,
    ));
    for (key, value) in &placement.properties {
        items.push(property(key, value, placement.position, true));
    }

    items.push(Sexpr::tagged(
        "instances",
        [Sexpr::tagged(
            "project",
            [
                Sexpr::string(""),
                Sexpr::tagged(
                    "path",
                    [
                        Sexpr::string(format!("/{sheet_uuid}")),
                        Sexpr::tagged("reference", [Sexpr::string(placement.reference.clone())]),
                        Sexpr::tagged("unit", [Sexpr::number(1.0)]),
                    ],
                ),
            ],
        )],
    ));

    Sexpr::tagged("symbol", items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinplace_engine::{PinDefinition, PinKind, PinRef, Planner, Rotation, Symbol};
    use pinplace_sexpr::parse;

    fn resistor() -> pinplace_engine::SymbolRef {
        Symbol::new(
            "Device:R",
            vec![
                PinDefinition::new("1", Point::new(0.0, 3.81), Angle::DOWN, PinKind::Passive),
                PinDefinition::new("2", Point::new(0.0, -3.81), Angle::UP, PinKind::Passive),
            ],
        )
        .into_ref()
    }

    fn ground() -> pinplace_engine::SymbolRef {
        Symbol::new(
            "power:GND",
            vec![PinDefinition::new(
                "1",
                Point::ORIGIN,
                Angle::DOWN,
                PinKind::PowerIn,
            )],
        )
        .power(true)
        .into_ref()
    }

    #[test]
    fn test_justify_follows_text_direction() {
        assert_eq!(justify(Angle::RIGHT), "left");
        assert_eq!(justify(Angle::UP), "left");
        assert_eq!(justify(Angle::LEFT), "right");
        assert_eq!(justify(Angle::DOWN), "right");
    }

    #[test]
    fn test_schematic_records() {
        let mut doc = Document::new();
        doc.add_component(
            ComponentPlacement::new("R1", resistor(), Point::new(100.33, 50.8))
                .with_value("10k")
                .with_rotation(Rotation::Deg90)
                .with_mirror(Mirror::Horizontal)
                .with_property("Tolerance", "1%"),
        )
        .unwrap();
        doc.add_component(ComponentPlacement::new("#PWR01", ground(), Point::new(120.0, 60.0)))
            .unwrap();

        let planner = Planner::new(&doc);
        let sig = planner.label_pin(&PinRef::new("R1", "1"), "SIG").unwrap();
        let gnd = planner.label_pin(&PinRef::new("#PWR01", "1"), "GND").unwrap();
        let wire = planner
            .wire_pins(&PinRef::new("R1", "2"), &PinRef::new("#PWR01", "1"), &[])
            .unwrap();
        doc.add_label(sig).unwrap();
        doc.add_label(gnd).unwrap();
        doc.add_wire(wire).unwrap();

        let text = to_kicad_schematic(&doc);
        let root = parse(&text).unwrap();
        assert!(root.is_tagged("kicad_sch"));
        assert_eq!(root.child_atom("version"), Some(FILE_VERSION));

        // Suppressed power label is not written
        let labels: Vec<_> = root.find_all("label").collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].get(1).and_then(Sexpr::as_atom), Some("SIG"));

        let symbols: Vec<_> = root.find_all("symbol").collect();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].child_atom("lib_id"), Some("Device:R"));
        assert_eq!(symbols[0].child_atom("mirror"), Some("y"));
        let at = symbols[0].find("at").unwrap();
        assert_eq!(at.get(3).and_then(Sexpr::as_atom), Some("90"));
        assert!(symbols[1].find("mirror").is_none());
        assert_eq!(symbols[1].child_atom("in_bom"), Some("no"));
        let fields: Vec<_> = symbols[0]
            .find_all("property")
            .filter_map(|p| p.get(1).and_then(Sexpr::as_atom))
            .collect();
        assert_eq!(fields, vec!["Reference", "Value", "Tolerance"]);

        assert_eq!(root.find_all("wire").count(), 1);
        assert!(root.find("text").is_none());
        // No float noise in coordinates
        assert!(!text.contains("0000001"));
        assert!(!text.contains("-0 "));
    }

    #[test]
    fn test_text_notes_are_written() {
        let mut doc = Document::new();
        doc.add_text(TextNote {
            text: "Test Circuit".to_string(),
            position: Point::new(90.0, 80.0),
            angle: Angle::ZERO,
            size: 2.0,
        });
        let root = parse(&to_kicad_schematic(&doc)).unwrap();
        let text = root.find("text").unwrap();
        assert_eq!(text.get(1).and_then(Sexpr::as_atom), Some("Test Circuit"));
        let size = text.find("effects").and_then(|e| e.find("font")).and_then(|f| f.find("size"));
        assert_eq!(size.and_then(|s| s.get(1)).and_then(Sexpr::as_atom), Some("2"));
    }

    #[test]
    fn test_wire_uses_exact_pin_coordinates() {
        let mut doc = Document::new();
        doc.add_component(ComponentPlacement::new("R1", resistor(), Point::ORIGIN))
            .unwrap();
        doc.add_component(ComponentPlacement::new("R2", resistor(), Point::new(10.16, 0.0)))
            .unwrap();
        let wire = Planner::new(&doc)
            .wire_pins(&PinRef::new("R1", "1"), &PinRef::new("R2", "1"), &[])
            .unwrap();
        doc.add_wire(wire).unwrap();

        let text = to_kicad_schematic(&doc);
        assert!(text.contains("(pts (xy 0 -3.81) (xy 10.16 -3.81))"));
    }
}
