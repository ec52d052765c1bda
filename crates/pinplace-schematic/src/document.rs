use pinplace_eda::SymbolError;
use pinplace_engine::validate::validate_label;
use pinplace_engine::{
    check_duplicate, validate_all, Angle, ComponentPlacement, Finding, LabelPlacement, PinRef,
    PlacementError, Point, SchematicView, WireSegment,
};
use serde::Serialize;
use uuid::Uuid;

/// Errors that can occur while editing a [`Document`]
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("Component {0} already exists")]
    DuplicateReference(String),

    #[error("No {kind} with uuid {uuid}")]
    UnknownRecord { kind: &'static str, uuid: Uuid },
}

impl DocumentError {
    /// Duplicate wires and labels are reported and skipped; everything else
    /// stops the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DocumentError::Placement(e) if e.is_recoverable())
    }
}

/// A stored item together with the UUID it is written out under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub item: T,
}

impl<T> Record<T> {
    fn new(item: T) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            item,
        }
    }
}

pub type ComponentRecord = Record<ComponentPlacement>;
pub type LabelRecord = Record<LabelPlacement>;
pub type WireRecord = Record<WireSegment>;
pub type TextRecord = Record<TextNote>;

/// Free-standing text on the sheet (titles, notes). Not connected to anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNote {
    pub text: String,
    pub position: Point,
    pub angle: Angle,
    /// Font height in millimeters.
    pub size: f64,
}

fn take_record<T>(
    records: &mut Vec<Record<T>>,
    kind: &'static str,
    uuid: Uuid,
) -> Result<Record<T>, DocumentError> {
    let index = records
        .iter()
        .position(|r| r.uuid == uuid)
        .ok_or(DocumentError::UnknownRecord { kind, uuid })?;
    Ok(records.remove(index))
}

/// One schematic sheet: placed components plus the labels and wires drawn on it.
///
/// Records are kept in insertion order, which is also the export order.
/// Removing a component leaves its labels and wires in place; [`Document::validate`]
/// reports them as unresolved.
#[derive(Debug, Default)]
pub struct Document {
    components: Vec<ComponentRecord>,
    labels: Vec<LabelRecord>,
    wires: Vec<WireRecord>,
    texts: Vec<TextRecord>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[ComponentRecord] {
        &self.components
    }

    pub fn labels(&self) -> &[LabelRecord] {
        &self.labels
    }

    pub fn wires(&self) -> &[WireRecord] {
        &self.wires
    }

    pub fn texts(&self) -> &[TextRecord] {
        &self.texts
    }

    pub fn placements(&self) -> impl Iterator<Item = &ComponentPlacement> {
        self.components.iter().map(|c| &c.item)
    }

    pub(crate) fn placements_mut(&mut self) -> impl Iterator<Item = &mut ComponentPlacement> {
        self.components.iter_mut().map(|c| &mut c.item)
    }

    /// Components whose origin lies inside the rectangle spanned by `a` and
    /// `b`, edges included. The corners may be given in any order.
    pub fn components_in_area(&self, a: Point, b: Point) -> Vec<&ComponentPlacement> {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        self.placements()
            .filter(|p| {
                (min_x..=max_x).contains(&p.position.x) && (min_y..=max_y).contains(&p.position.y)
            })
            .collect()
    }

    pub fn add_component(
        &mut self,
        placement: ComponentPlacement,
    ) -> Result<&ComponentRecord, DocumentError> {
        if self.placement_of(&placement.reference).is_some() {
            return Err(DocumentError::DuplicateReference(placement.reference));
        }
        log::debug!(
            "Adding {} ({}) at {}",
            placement.reference,
            placement.symbol.lib_id,
            placement.position
        );
        self.components.push(Record::new(placement));
        Ok(&self.components[self.components.len() - 1])
    }

    pub fn placement_mut(
        &mut self,
        reference: &str,
    ) -> Result<&mut ComponentPlacement, PlacementError> {
        self.components
            .iter_mut()
            .map(|c| &mut c.item)
            .find(|p| p.reference == reference)
            .ok_or_else(|| PlacementError::UnknownComponent(reference.to_string()))
    }

    pub fn remove_component(
        &mut self,
        reference: &str,
    ) -> Result<ComponentPlacement, PlacementError> {
        let index = self
            .components
            .iter()
            .position(|c| c.item.reference == reference)
            .ok_or_else(|| PlacementError::UnknownComponent(reference.to_string()))?;
        let removed = self.components.remove(index).item;

        let dangling = self
            .labels
            .iter()
            .filter_map(|l| l.item.target.as_ref())
            .chain(self.wires.iter().flat_map(|w| {
                [w.item.start.pin.as_ref(), w.item.end.pin.as_ref()]
                    .into_iter()
                    .flatten()
            }))
            .filter(|pin| pin.reference == reference)
            .count();
        if dangling > 0 {
            log::warn!("Removed {reference}; {dangling} label/wire ends now point at nothing");
        }
        Ok(removed)
    }

    fn label_items(&self) -> Vec<LabelPlacement> {
        self.labels.iter().map(|l| l.item.clone()).collect()
    }

    fn wire_items(&self) -> Vec<WireSegment> {
        self.wires.iter().map(|w| w.item.clone()).collect()
    }

    /// Record a planned label. A second label on a power pin is rejected as
    /// [`PlacementError::DuplicateLabel`]; a label whose anchor is off its pin
    /// is rejected as a mismatch.
    pub fn add_label(&mut self, label: LabelPlacement) -> Result<&LabelRecord, DocumentError> {
        let existing = self.label_items();
        validate_label(&label, &*self, &existing).into_result()?;
        if label.suppressed {
            log::debug!("Tracking suppressed label '{}'", label.text);
        }
        self.labels.push(Record::new(label));
        Ok(&self.labels[self.labels.len() - 1])
    }

    /// Record several labels as one edit: each is checked against the sheet
    /// and the ones before it, and nothing is stored unless all pass.
    pub fn add_labels(
        &mut self,
        labels: Vec<LabelPlacement>,
    ) -> Result<&[LabelRecord], DocumentError> {
        let mut existing = self.label_items();
        for label in &labels {
            validate_label(label, &*self, &existing).into_result()?;
            existing.push(label.clone());
        }
        let start = self.labels.len();
        self.labels.extend(labels.into_iter().map(Record::new));
        Ok(&self.labels[start..])
    }

    pub fn remove_label(&mut self, uuid: Uuid) -> Result<LabelRecord, DocumentError> {
        take_record(&mut self.labels, "label", uuid)
    }

    pub fn remove_wire(&mut self, uuid: Uuid) -> Result<WireRecord, DocumentError> {
        take_record(&mut self.wires, "wire", uuid)
    }

    pub fn add_text(&mut self, text: TextNote) -> &TextRecord {
        log::debug!("Adding text '{}' at {}", text.text, text.position);
        self.texts.push(Record::new(text));
        &self.texts[self.texts.len() - 1]
    }

    pub fn remove_text(&mut self, uuid: Uuid) -> Result<TextRecord, DocumentError> {
        take_record(&mut self.texts, "text", uuid)
    }

    /// Record a planned wire unless an identical one is already drawn.
    pub fn add_wire(&mut self, wire: WireSegment) -> Result<&WireRecord, DocumentError> {
        check_duplicate(&wire, &self.wire_items())?;
        self.wires.push(Record::new(wire));
        Ok(&self.wires[self.wires.len() - 1])
    }

    /// Existing wires, for the planner's duplicate check.
    pub fn wire_segments(&self) -> Vec<WireSegment> {
        self.wire_items()
    }

    /// Every label and wire that no longer lands on its pin, is a duplicate,
    /// or refers to something that is gone. Labels first, then wires, each in
    /// insertion order.
    pub fn validate(&self) -> Vec<Finding> {
        let findings = validate_all(self, &self.label_items(), &self.wire_items());
        for finding in &findings {
            log::debug!("Validation finding: {finding:?}");
        }
        findings
    }

    /// Labels attached to `pin`.
    pub fn labels_on<'a>(&'a self, pin: &'a PinRef) -> impl Iterator<Item = &'a LabelRecord> {
        self.labels
            .iter()
            .filter(move |l| l.item.target.as_ref() == Some(pin))
    }

    /// Wires with either end on `pin`.
    pub fn wires_on<'a>(&'a self, pin: &'a PinRef) -> impl Iterator<Item = &'a WireRecord> {
        self.wires.iter().filter(move |w| {
            w.item.start.pin.as_ref() == Some(pin) || w.item.end.pin.as_ref() == Some(pin)
        })
    }
}

impl SchematicView for Document {
    fn placement_of(&self, reference: &str) -> Option<&ComponentPlacement> {
        self.placements().find(|p| p.reference == reference)
    }
}
