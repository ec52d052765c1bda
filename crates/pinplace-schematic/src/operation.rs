//! The closed set of editing operations a scene can run against a [`Document`].

use std::collections::BTreeMap;
use std::fmt;

use pinplace_eda::{split_lib_id, SymbolCache};
use pinplace_engine::{
    plan_label_at, world_pins, ComponentPlacement, Finding, Mirror, PinRef, PlacementError,
    Planner, Point, Rotation, SchematicView, Subject, SymbolRef, ValidationResult, WorldPin,
};
use pinplace_sexpr::format_number;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::document::{
    Document, DocumentError, LabelRecord, Record, TextNote, TextRecord, WireRecord,
};

const DEFAULT_TEXT_SIZE: f64 = 1.27;

/// Where and how to place one component.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentSpec {
    pub reference: String,
    pub lib_id: String,
    /// Defaults to the library's Value field, then the symbol name.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(deserialize_with = "point")]
    pub at: Point,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub mirror: Mirror,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ComponentSpec {
    pub fn to_placement(&self, symbol: SymbolRef) -> Result<ComponentPlacement, DocumentError> {
        let value = match (&self.value, &symbol.default_value) {
            (Some(value), _) | (None, Some(value)) => value.clone(),
            (None, None) => split_lib_id(&self.lib_id)?.1.to_string(),
        };
        let mut placement = ComponentPlacement::new(&self.reference, symbol, self.at)
            .with_value(value)
            .with_rotation(self.rotation)
            .with_mirror(self.mirror);
        placement.properties.extend(self.properties.clone());
        Ok(placement)
    }
}

/// Which components an operation applies to. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentFilter {
    #[serde(default)]
    pub lib_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    /// Reference prefix, e.g. `R` matches `R1` and `R12`.
    #[serde(default)]
    pub reference: Option<String>,
}

impl ComponentFilter {
    pub fn matches(&self, placement: &ComponentPlacement) -> bool {
        self.lib_id.as_ref().map_or(true, |id| *id == placement.symbol.lib_id)
            && self.value.as_ref().map_or(true, |v| *v == placement.value)
            && self
                .reference
                .as_ref()
                .map_or(true, |prefix| placement.reference.starts_with(prefix.as_str()))
    }
}

/// A stored label or wire, by UUID or by the pin it is attached to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordSelector {
    Uuid {
        uuid: Uuid,
    },
    Pin {
        #[serde(deserialize_with = "pin_ref")]
        pin: PinRef,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddComponent(ComponentSpec),
    MoveComponent {
        reference: String,
        #[serde(deserialize_with = "point")]
        to: Point,
    },
    RotateComponent {
        reference: String,
        #[serde(default = "quarter_turn")]
        by: Rotation,
    },
    MirrorComponent {
        reference: String,
        axis: Mirror,
    },
    RemoveComponent {
        reference: String,
    },
    /// Change the value and extra fields of every matching component.
    BulkUpdateComponents {
        #[serde(default)]
        criteria: ComponentFilter,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        properties: BTreeMap<String, String>,
    },
    FilterComponents {
        #[serde(flatten)]
        filter: ComponentFilter,
    },
    ComponentsInArea {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    ListPins {
        reference: String,
    },
    PinPosition {
        #[serde(deserialize_with = "pin_ref")]
        pin: PinRef,
    },
    LabelPin {
        #[serde(deserialize_with = "pin_ref")]
        pin: PinRef,
        text: String,
    },
    ConnectPinsWithLabels {
        #[serde(deserialize_with = "pin_ref")]
        a: PinRef,
        #[serde(deserialize_with = "pin_ref")]
        b: PinRef,
        net: String,
    },
    WirePins {
        #[serde(deserialize_with = "pin_ref")]
        from: PinRef,
        #[serde(deserialize_with = "pin_ref")]
        to: PinRef,
    },
    WireToPin {
        #[serde(deserialize_with = "point")]
        from: Point,
        #[serde(deserialize_with = "pin_ref")]
        to: PinRef,
    },
    WireNet {
        #[serde(deserialize_with = "pin_refs")]
        pins: Vec<PinRef>,
    },
    Label {
        #[serde(deserialize_with = "point")]
        at: Point,
        text: String,
    },
    RemoveLabel {
        #[serde(flatten)]
        target: RecordSelector,
    },
    RemoveWire {
        #[serde(flatten)]
        target: RecordSelector,
    },
    AddText {
        text: String,
        #[serde(deserialize_with = "point")]
        at: Point,
        #[serde(default)]
        rotation: Rotation,
        #[serde(default = "default_text_size")]
        size: f64,
    },
    RemoveText {
        uuid: Uuid,
    },
    Validate,
}

fn default_text_size() -> f64 {
    DEFAULT_TEXT_SIZE
}

fn quarter_turn() -> Rotation {
    Rotation::Deg90
}

/// `[x, y]` or `{ x = .., y = .. }`
#[derive(Deserialize)]
#[serde(untagged)]
enum PointSpec {
    Pair(f64, f64),
    Table { x: f64, y: f64 },
}

fn point<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Point, D::Error> {
    Ok(match PointSpec::deserialize(deserializer)? {
        PointSpec::Pair(x, y) | PointSpec::Table { x, y } => Point::new(x, y),
    })
}

fn pin_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PinRef, D::Error> {
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

fn pin_refs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PinRef>, D::Error> {
    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|text| text.parse().map_err(serde::de::Error::custom))
        .collect()
}

impl Operation {
    /// The `op` name used in scene files.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddComponent(_) => "add_component",
            Operation::MoveComponent { .. } => "move_component",
            Operation::RotateComponent { .. } => "rotate_component",
            Operation::MirrorComponent { .. } => "mirror_component",
            Operation::RemoveComponent { .. } => "remove_component",
            Operation::BulkUpdateComponents { .. } => "bulk_update_components",
            Operation::FilterComponents { .. } => "filter_components",
            Operation::ComponentsInArea { .. } => "components_in_area",
            Operation::ListPins { .. } => "list_pins",
            Operation::PinPosition { .. } => "pin_position",
            Operation::LabelPin { .. } => "label_pin",
            Operation::ConnectPinsWithLabels { .. } => "connect_pins_with_labels",
            Operation::WirePins { .. } => "wire_pins",
            Operation::WireToPin { .. } => "wire_to_pin",
            Operation::WireNet { .. } => "wire_net",
            Operation::Label { .. } => "label",
            Operation::RemoveLabel { .. } => "remove_label",
            Operation::RemoveWire { .. } => "remove_wire",
            Operation::AddText { .. } => "add_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::Validate => "validate",
        }
    }

    /// Run the operation. Nothing is recorded when it fails.
    pub fn apply(
        &self,
        doc: &mut Document,
        symbols: &mut SymbolCache,
    ) -> Result<OperationOutput, DocumentError> {
        log::debug!("Applying {}", self.name());
        match self {
            Operation::AddComponent(spec) => {
                let symbol = symbols.resolve(&spec.lib_id)?;
                let placement = spec.to_placement(symbol)?;
                let record = doc.add_component(placement)?;
                Ok(OperationOutput::Component {
                    placement: record.item.clone(),
                })
            }
            Operation::MoveComponent { reference, to } => {
                let placement = doc.placement_mut(reference)?;
                placement.move_to(*to);
                Ok(OperationOutput::Component {
                    placement: placement.clone(),
                })
            }
            Operation::RotateComponent { reference, by } => {
                let placement = doc.placement_mut(reference)?;
                placement.rotate(*by);
                Ok(OperationOutput::Component {
                    placement: placement.clone(),
                })
            }
            Operation::MirrorComponent { reference, axis } => {
                let placement = doc.placement_mut(reference)?;
                placement.mirror_across(*axis);
                Ok(OperationOutput::Component {
                    placement: placement.clone(),
                })
            }
            Operation::RemoveComponent { reference } => {
                let removed = doc.remove_component(reference)?;
                Ok(OperationOutput::Removed {
                    reference: removed.reference,
                })
            }
            Operation::BulkUpdateComponents {
                criteria,
                value,
                properties,
            } => {
                let mut placements = Vec::new();
                for placement in doc.placements_mut().filter(|p| criteria.matches(p)) {
                    if let Some(value) = value {
                        placement.value = value.clone();
                    }
                    placement.properties.extend(properties.clone());
                    placements.push(placement.clone());
                }
                log::debug!("Updated {} components", placements.len());
                Ok(OperationOutput::Components { placements })
            }
            Operation::FilterComponents { filter } => Ok(OperationOutput::Components {
                placements: doc
                    .placements()
                    .filter(|p| filter.matches(p))
                    .cloned()
                    .collect(),
            }),
            Operation::ComponentsInArea { x1, y1, x2, y2 } => Ok(OperationOutput::Components {
                placements: doc
                    .components_in_area(Point::new(*x1, *y1), Point::new(*x2, *y2))
                    .into_iter()
                    .cloned()
                    .collect(),
            }),
            Operation::ListPins { reference } => {
                let placement = doc
                    .placement_of(reference)
                    .ok_or_else(|| PlacementError::UnknownComponent(reference.clone()))?;
                Ok(OperationOutput::Pins {
                    reference: reference.clone(),
                    pins: world_pins(placement),
                })
            }
            Operation::PinPosition { pin } => Ok(OperationOutput::Pin {
                pin: doc.resolve_pin(pin)?,
            }),
            Operation::LabelPin { pin, text } => {
                let label = Planner::new(&*doc).label_pin(pin, text)?;
                let record = doc.add_label(label)?.clone();
                Ok(OperationOutput::Labels {
                    labels: vec![record],
                })
            }
            Operation::ConnectPinsWithLabels { a, b, net } => {
                let planned = Planner::new(&*doc).connect_with_labels(a, b, net)?;
                let labels = doc.add_labels(Vec::from(planned))?.to_vec();
                Ok(OperationOutput::Labels { labels })
            }
            Operation::WirePins { from, to } => {
                let existing = doc.wire_segments();
                let wire = Planner::new(&*doc).wire_pins(from, to, &existing)?;
                let record = doc.add_wire(wire)?.clone();
                Ok(OperationOutput::Wires {
                    wires: vec![record],
                    skipped: 0,
                })
            }
            Operation::WireToPin { from, to } => {
                let existing = doc.wire_segments();
                let wire = Planner::new(&*doc).wire_to_pin(*from, to, &existing)?;
                let record = doc.add_wire(wire)?.clone();
                Ok(OperationOutput::Wires {
                    wires: vec![record],
                    skipped: 0,
                })
            }
            Operation::WireNet { pins } => {
                let existing = doc.wire_segments();
                let planned = Planner::new(&*doc).wire_net(pins, &existing)?;
                let skipped = pins.len().saturating_sub(1) - planned.len();
                let wires = planned
                    .into_iter()
                    .map(|wire| doc.add_wire(wire).map(Record::clone))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(OperationOutput::Wires { wires, skipped })
            }
            Operation::Label { at, text } => {
                let record = doc.add_label(plan_label_at(*at, text))?.clone();
                Ok(OperationOutput::Labels {
                    labels: vec![record],
                })
            }
            Operation::RemoveLabel { target } => {
                let uuids = match target {
                    RecordSelector::Uuid { uuid } => vec![*uuid],
                    RecordSelector::Pin { pin } => doc.labels_on(pin).map(|l| l.uuid).collect(),
                };
                for uuid in &uuids {
                    doc.remove_label(*uuid)?;
                }
                Ok(OperationOutput::Deleted {
                    record: "label",
                    uuids,
                })
            }
            Operation::RemoveWire { target } => {
                let uuids = match target {
                    RecordSelector::Uuid { uuid } => vec![*uuid],
                    RecordSelector::Pin { pin } => doc.wires_on(pin).map(|w| w.uuid).collect(),
                };
                for uuid in &uuids {
                    doc.remove_wire(*uuid)?;
                }
                Ok(OperationOutput::Deleted {
                    record: "wire",
                    uuids,
                })
            }
            Operation::AddText {
                text,
                at,
                rotation,
                size,
            } => {
                if !(size.is_finite() && *size > 0.0) {
                    return Err(PlacementError::MalformedPlacement(format!(
                        "text size {size} must be positive"
                    ))
                    .into());
                }
                let record = doc.add_text(TextNote {
                    text: text.clone(),
                    position: *at,
                    angle: rotation.as_angle(),
                    size: *size,
                });
                Ok(OperationOutput::Text {
                    text: record.clone(),
                })
            }
            Operation::RemoveText { uuid } => {
                doc.remove_text(*uuid)?;
                Ok(OperationOutput::Deleted {
                    record: "text",
                    uuids: vec![*uuid],
                })
            }
            Operation::Validate => Ok(OperationOutput::Findings {
                findings: doc.validate(),
            }),
        }
    }
}

/// What an operation produced, printable as text or serializable as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationOutput {
    Component { placement: ComponentPlacement },
    Components { placements: Vec<ComponentPlacement> },
    Removed { reference: String },
    Deleted { record: &'static str, uuids: Vec<Uuid> },
    Text { text: TextRecord },
    Pins { reference: String, pins: Vec<WorldPin> },
    Pin { pin: WorldPin },
    Labels { labels: Vec<LabelRecord> },
    Wires { wires: Vec<WireRecord>, skipped: usize },
    Findings { findings: Vec<Finding> },
}

fn xy(p: Point) -> String {
    format!("({}, {})", format_number(p.x), format_number(p.y))
}

fn write_component(f: &mut fmt::Formatter<'_>, placement: &ComponentPlacement) -> fmt::Result {
    write!(
        f,
        "{} {} ({}) at {} rotation {}° mirror {}",
        placement.reference,
        placement.symbol.lib_id,
        placement.value,
        xy(placement.position),
        format_number(placement.rotation.degrees()),
        placement.mirror
    )
}

fn write_pin(f: &mut fmt::Formatter<'_>, pin: &WorldPin) -> fmt::Result {
    write!(f, "{} ", pin.pin)?;
    if !pin.name.is_empty() && pin.name != "~" {
        write!(f, "[{}] ", pin.name)?;
    }
    write!(
        f,
        "{} at {} facing {}°",
        pin.kind,
        xy(pin.position),
        format_number(pin.orientation.degrees())
    )
}

impl fmt::Display for OperationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutput::Component { placement } => write_component(f, placement),
            OperationOutput::Components { placements } => {
                write!(f, "{} component(s)", placements.len())?;
                for placement in placements {
                    write!(f, "\n  ")?;
                    write_component(f, placement)?;
                }
                Ok(())
            }
            OperationOutput::Removed { reference } => write!(f, "removed {reference}"),
            OperationOutput::Deleted { record, uuids } => {
                if uuids.is_empty() {
                    return write!(f, "no {record} matched");
                }
                write!(f, "removed {} {record}(s)", uuids.len())?;
                for uuid in uuids {
                    write!(f, "\n  {uuid}")?;
                }
                Ok(())
            }
            OperationOutput::Text { text } => write!(
                f,
                "text '{}' at {} size {}",
                text.item.text,
                xy(text.item.position),
                format_number(text.item.size)
            ),
            OperationOutput::Pins { reference, pins } => {
                write!(f, "{reference}: {} pins", pins.len())?;
                for pin in pins {
                    write!(f, "\n  ")?;
                    write_pin(f, pin)?;
                }
                Ok(())
            }
            OperationOutput::Pin { pin } => write_pin(f, pin),
            OperationOutput::Labels { labels } => {
                for (i, record) in labels.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    let label = &record.item;
                    write!(f, "label '{}'", label.text)?;
                    if let Some(pin) = &label.target {
                        write!(f, " on {pin}")?;
                    }
                    if label.suppressed {
                        write!(f, " suppressed (power symbol)")?;
                    } else {
                        write!(
                            f,
                            " at {} text {}°",
                            xy(label.anchor),
                            format_number(label.text_orientation.degrees())
                        )?;
                    }
                }
                Ok(())
            }
            OperationOutput::Wires { wires, skipped } => {
                for (i, record) in wires.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    let wire = &record.item;
                    write!(f, "wire {} -> {}", xy(wire.start.point), xy(wire.end.point))?;
                }
                if *skipped > 0 {
                    if !wires.is_empty() {
                        writeln!(f)?;
                    }
                    write!(f, "skipped {skipped} duplicate segment(s)")?;
                }
                Ok(())
            }
            OperationOutput::Findings { findings } => {
                if findings.is_empty() {
                    return write!(f, "all connections valid");
                }
                for (i, finding) in findings.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", FindingDisplay(finding))?;
                }
                Ok(())
            }
        }
    }
}

/// One-line description of a validation finding.
pub struct FindingDisplay<'a>(pub &'a Finding);

impl fmt::Display for FindingDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.subject {
            Subject::Label(i) => write!(f, "label #{i}: ")?,
            Subject::Wire(i) => write!(f, "wire #{i}: ")?,
        }
        match &self.0.result {
            ValidationResult::Ok => write!(f, "ok"),
            ValidationResult::Mismatch {
                pin,
                expected,
                actual,
            } => write!(
                f,
                "{pin} is at {} but the record ends at {}",
                xy(*expected),
                xy(*actual)
            ),
            ValidationResult::DuplicateLabel { pin } => {
                write!(f, "{pin} already carries a label")
            }
            ValidationResult::Unresolved { pin } => write!(f, "{pin} no longer exists"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Ops {
        operation: Vec<Operation>,
    }

    fn parse(toml_text: &str) -> Vec<Operation> {
        toml::from_str::<Ops>(toml_text).unwrap().operation
    }

    #[test]
    fn test_deserialize_operations() {
        let ops = parse(
            r#"
            [[operation]]
            op = "add_component"
            reference = "R1"
            lib_id = "Device:R"
            at = [100, 50.8]
            rotation = 90

            [[operation]]
            op = "rotate_component"
            reference = "R1"

            [[operation]]
            op = "wire_to_pin"
            from = { x = 90.0, y = 50.8 }
            to = "R1.1"

            [[operation]]
            op = "wire_net"
            pins = ["R1.2", "R2.1", "C1.1"]

            [[operation]]
            op = "validate"
            "#,
        );

        assert_eq!(ops.len(), 5);
        let Operation::AddComponent(spec) = &ops[0] else {
            panic!("expected add_component, got {:?}", ops[0]);
        };
        assert_eq!(spec.at, Point::new(100.0, 50.8));
        assert_eq!(spec.rotation, Rotation::Deg90);
        assert_eq!(spec.mirror, Mirror::None);
        assert_eq!(
            ops[1],
            Operation::RotateComponent {
                reference: "R1".to_string(),
                by: Rotation::Deg90
            }
        );
        assert_eq!(
            ops[2],
            Operation::WireToPin {
                from: Point::new(90.0, 50.8),
                to: PinRef::new("R1", "1"),
            }
        );
        assert!(matches!(&ops[3], Operation::WireNet { pins } if pins.len() == 3));
        assert_eq!(ops[4].name(), "validate");
    }

    #[test]
    fn test_odd_rotation_and_bad_pin_are_rejected() {
        let bad_rotation = toml::from_str::<Ops>(
            r#"
            [[operation]]
            op = "add_component"
            reference = "R1"
            lib_id = "Device:R"
            at = [0, 0]
            rotation = 45
            "#,
        );
        assert!(bad_rotation.is_err());

        let bad_pin = toml::from_str::<Ops>(
            r#"
            [[operation]]
            op = "label_pin"
            pin = "R1"
            text = "SIG"
            "#,
        );
        assert!(bad_pin.is_err());
    }

    #[test]
    fn test_deserialize_record_and_query_operations() {
        let ops = parse(
            r#"
            [[operation]]
            op = "remove_label"
            pin = "R1.1"

            [[operation]]
            op = "remove_wire"
            uuid = "67e55044-10b1-426f-9247-bb680e5fe0c8"

            [[operation]]
            op = "filter_components"
            lib_id = "Device:R"

            [[operation]]
            op = "components_in_area"
            x1 = 100
            y1 = 100
            x2 = 130
            y2 = 130

            [[operation]]
            op = "bulk_update_components"
            criteria = { lib_id = "Device:R" }
            properties = { Tolerance = "1%" }

            [[operation]]
            op = "add_text"
            text = "Test Circuit"
            at = [90, 80]
            size = 2.0
            "#,
        );
        assert_eq!(
            ops[0],
            Operation::RemoveLabel {
                target: RecordSelector::Pin {
                    pin: PinRef::new("R1", "1")
                }
            }
        );
        assert!(matches!(
            &ops[1],
            Operation::RemoveWire { target: RecordSelector::Uuid { uuid } }
                if uuid.to_string() == "67e55044-10b1-426f-9247-bb680e5fe0c8"
        ));
        assert!(matches!(
            &ops[2],
            Operation::FilterComponents { filter } if filter.lib_id.as_deref() == Some("Device:R")
        ));
        assert!(matches!(ops[3], Operation::ComponentsInArea { x2, .. } if x2 == 130.0));
        let Operation::BulkUpdateComponents {
            criteria,
            value,
            properties,
        } = &ops[4]
        else {
            panic!("expected bulk_update_components, got {:?}", ops[4]);
        };
        assert_eq!(criteria.lib_id.as_deref(), Some("Device:R"));
        assert!(value.is_none());
        assert_eq!(properties.get("Tolerance").map(String::as_str), Some("1%"));
        assert!(matches!(
            &ops[5],
            Operation::AddText { rotation: Rotation::Deg0, size, .. } if *size == 2.0
        ));
    }

    mod apply {
        use super::*;
        use pinplace_engine::{Angle, PinDefinition, PinKind, Symbol};

        fn resistor() -> SymbolRef {
            Symbol::new(
                "Device:R",
                vec![
                    PinDefinition::new("1", Point::new(0.0, 3.81), Angle::DOWN, PinKind::Passive),
                    PinDefinition::new("2", Point::new(0.0, -3.81), Angle::UP, PinKind::Passive),
                ],
            )
            .with_properties(Some("R".to_string()), Some("R".to_string()))
            .into_ref()
        }

        fn regulator() -> SymbolRef {
            Symbol::new(
                "Regulator_Linear:AMS1117-3.3",
                vec![PinDefinition::new(
                    "2",
                    Point::new(7.62, 0.0),
                    Angle::LEFT,
                    PinKind::PowerOut,
                )],
            )
            .with_properties(Some("U".to_string()), Some("AMS1117-3.3".to_string()))
            .into_ref()
        }

        fn run(doc: &mut Document, op: Operation) -> Result<OperationOutput, DocumentError> {
            op.apply(doc, &mut SymbolCache::new(None))
        }

        fn sheet() -> Document {
            let mut doc = Document::new();
            for (reference, symbol, at) in [
                ("R1", resistor(), Point::new(100.0, 100.0)),
                ("R2", resistor(), Point::new(120.0, 100.0)),
                ("U1", regulator(), Point::new(150.0, 100.0)),
            ] {
                doc.add_component(ComponentPlacement::new(reference, symbol, at))
                    .unwrap();
            }
            doc
        }

        #[test]
        fn test_default_value_comes_from_library() {
            let spec = ComponentSpec {
                reference: "U2".to_string(),
                lib_id: "Regulator_Linear:AMS1117-3.3".to_string(),
                value: None,
                at: Point::ORIGIN,
                rotation: Rotation::Deg0,
                mirror: Mirror::None,
                properties: BTreeMap::new(),
            };
            assert_eq!(spec.to_placement(regulator()).unwrap().value, "AMS1117-3.3");
            let bare = Symbol::new("Device:X", vec![]).into_ref();
            assert_eq!(spec.to_placement(bare).unwrap().value, "AMS1117-3.3");
        }

        #[test]
        fn test_connect_with_labels_stores_nothing_on_duplicate() {
            let mut doc = sheet();
            let supply = PinRef::new("U1", "2");
            run(
                &mut doc,
                Operation::LabelPin {
                    pin: supply.clone(),
                    text: "3V3".to_string(),
                },
            )
            .unwrap();

            let err = run(
                &mut doc,
                Operation::ConnectPinsWithLabels {
                    a: PinRef::new("R1", "1"),
                    b: supply,
                    net: "VOUT".to_string(),
                },
            )
            .unwrap_err();
            assert!(err.is_recoverable());
            assert_eq!(doc.labels().len(), 1);
            assert!(doc.labels().iter().all(|l| l.item.text == "3V3"));
        }

        #[test]
        fn test_remove_labels_and_wires_by_pin() {
            let mut doc = sheet();
            let pin = PinRef::new("R1", "2");
            run(
                &mut doc,
                Operation::LabelPin {
                    pin: pin.clone(),
                    text: "MID".to_string(),
                },
            )
            .unwrap();
            run(
                &mut doc,
                Operation::WirePins {
                    from: pin.clone(),
                    to: PinRef::new("R2", "2"),
                },
            )
            .unwrap();

            let removed = run(
                &mut doc,
                Operation::RemoveWire {
                    target: RecordSelector::Pin { pin: pin.clone() },
                },
            )
            .unwrap();
            assert!(matches!(removed, OperationOutput::Deleted { record: "wire", ref uuids } if uuids.len() == 1));
            assert!(doc.wires().is_empty());

            let uuid = doc.labels()[0].uuid;
            run(
                &mut doc,
                Operation::RemoveLabel {
                    target: RecordSelector::Uuid { uuid },
                },
            )
            .unwrap();
            assert!(doc.labels().is_empty());
            let again = run(
                &mut doc,
                Operation::RemoveLabel {
                    target: RecordSelector::Uuid { uuid },
                },
            );
            assert!(matches!(again, Err(DocumentError::UnknownRecord { .. })));
            let none = run(
                &mut doc,
                Operation::RemoveLabel {
                    target: RecordSelector::Pin { pin },
                },
            )
            .unwrap();
            assert_eq!(none.to_string(), "no label matched");
        }

        #[test]
        fn test_filter_area_and_bulk_update() {
            let mut doc = sheet();
            let OperationOutput::Components { placements } = run(
                &mut doc,
                Operation::FilterComponents {
                    filter: ComponentFilter {
                        lib_id: Some("Device:R".to_string()),
                        ..Default::default()
                    },
                },
            )
            .unwrap() else {
                panic!("expected components");
            };
            assert_eq!(placements.len(), 2);

            let in_area = run(
                &mut doc,
                Operation::ComponentsInArea {
                    x1: 130.0,
                    y1: 90.0,
                    x2: 110.0,
                    y2: 110.0,
                },
            )
            .unwrap();
            assert!(in_area.to_string().starts_with("1 component(s)\n  R2 Device:R"));

            run(
                &mut doc,
                Operation::BulkUpdateComponents {
                    criteria: ComponentFilter {
                        reference: Some("R".to_string()),
                        ..Default::default()
                    },
                    value: Some("10k".to_string()),
                    properties: BTreeMap::from([("Tolerance".to_string(), "1%".to_string())]),
                },
            )
            .unwrap();
            let r1 = doc.placement_of("R1").unwrap();
            assert_eq!(r1.value, "10k");
            assert_eq!(r1.properties.get("Tolerance").map(String::as_str), Some("1%"));
            assert!(doc.placement_of("U1").unwrap().properties.is_empty());
        }

        #[test]
        fn test_add_text_rejects_bad_size() {
            let mut doc = sheet();
            let text = |size| Operation::AddText {
                text: "Power".to_string(),
                at: Point::new(90.0, 80.0),
                rotation: Rotation::Deg90,
                size,
            };
            let output = run(&mut doc, text(2.0)).unwrap();
            assert_eq!(output.to_string(), "text 'Power' at (90, 80) size 2");
            assert_eq!(doc.texts()[0].item.angle, Angle::UP);
            assert!(run(&mut doc, text(0.0)).is_err());
            assert_eq!(doc.texts().len(), 1);
        }
    }

    #[test]
    fn test_output_json_shape() {
        let output = OperationOutput::Removed {
            reference: "R3".to_string(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["kind"], "removed");
        assert_eq!(json["reference"], "R3");
        assert_eq!(output.to_string(), "removed R3");
    }
}
