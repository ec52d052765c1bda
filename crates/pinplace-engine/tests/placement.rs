use pinplace_engine::{
    plan_label, validate, validate_all, world_pin_by_number, world_pins, Angle, ComponentKind,
    ComponentPlacement, Connection, Mirror, PinDefinition, PinKind, PinRef, PlacementError,
    Planner, Point, Rotation, SchematicView, Subject, Symbol, SymbolRef, ValidationResult,
};

fn two_terminal() -> SymbolRef {
    Symbol::new(
        "Device:R",
        vec![
            PinDefinition::new("1", Point::new(0.0, 3.81), Angle::new(270.0), PinKind::Passive),
            PinDefinition::new("2", Point::new(0.0, -3.81), Angle::new(90.0), PinKind::Passive),
        ],
    )
    .into_ref()
}

fn ground() -> SymbolRef {
    Symbol::new(
        "power:GND",
        vec![PinDefinition::new("1", Point::ORIGIN, Angle::new(270.0), PinKind::PowerIn)],
    )
    .power(true)
    .into_ref()
}

fn regulator() -> SymbolRef {
    Symbol::new(
        "Regulator_Linear:AMS1117-3.3",
        vec![
            PinDefinition::new("1", Point::new(0.0, -7.62), Angle::new(90.0), PinKind::PowerIn)
                .with_name("GND"),
            PinDefinition::new("2", Point::new(7.62, 0.0), Angle::new(180.0), PinKind::PowerOut)
                .with_name("VO"),
            PinDefinition::new("3", Point::new(-7.62, 0.0), Angle::new(0.0), PinKind::PowerIn)
                .with_name("VI"),
        ],
    )
    .into_ref()
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn two_pin_part_at_origin() {
    let r1 = ComponentPlacement::new("R1", two_terminal(), Point::ORIGIN);

    let pin1 = world_pin_by_number(&r1, "1").unwrap();
    let pin2 = world_pin_by_number(&r1, "2").unwrap();
    assert!(pin1.position.y < 0.0, "pin 1 should sit above the origin");
    assert!(pin2.position.y > 0.0, "pin 2 should sit below the origin");
    assert_eq!(pin1.position, Point::new(0.0, -3.81));
    assert_eq!(pin2.position, Point::new(0.0, 3.81));

    let label = plan_label(&pin1, "VIN", ComponentKind::Regular);
    assert_eq!(label.text_orientation, Angle::new(90.0));
    let label = plan_label(&pin2, "VOUT", ComponentKind::Regular);
    assert_eq!(label.text_orientation, Angle::new(270.0));
}

#[test]
fn quarter_turn_shifts_label_bucket_by_ninety() {
    let upright = ComponentPlacement::new("R1", two_terminal(), Point::ORIGIN);
    let turned = upright.clone().with_rotation(Rotation::Deg90);

    for number in ["1", "2"] {
        let before = world_pin_by_number(&upright, number).unwrap();
        let after = world_pin_by_number(&turned, number).unwrap();
        assert_eq!(after.position, Rotation::Deg90.apply(before.position));

        let label_before = plan_label(&before, "N", ComponentKind::Regular).text_orientation;
        let label_after = plan_label(&after, "N", ComponentKind::Regular).text_orientation;
        assert_eq!(label_after, label_before + Angle::new(90.0));
    }

    // Pin 1 moves to the left of the body and its label reads leftward
    let pin1 = world_pin_by_number(&turned, "1").unwrap();
    assert_eq!(pin1.position, Point::new(-3.81, 0.0));
    assert_eq!(
        plan_label(&pin1, "N", ComponentKind::Regular).text_orientation,
        Angle::LEFT
    );
}

#[test]
fn full_turn_returns_to_start_without_drift() {
    let origin = Point::new(123.19, 87.63);
    let base = ComponentPlacement::new("U1", regulator(), origin);
    let start = world_pins(&base);

    let mut placement = base.clone();
    for _ in 0..4 {
        placement.rotate(Rotation::Deg90);
    }
    assert_eq!(placement.rotation, Rotation::Deg0);
    assert_eq!(world_pins(&placement), start);

    // Every intermediate rotation is also exactly a fresh computation
    let mut stepped = base.clone();
    for rotation in Rotation::ALL {
        let fresh = base.clone().with_rotation(rotation);
        assert_eq!(world_pins(&stepped), world_pins(&fresh));
        stepped.rotate(Rotation::Deg90);
    }
}

#[test]
fn mirroring_twice_is_identity() {
    for rotation in Rotation::ALL {
        for axis in [Mirror::Horizontal, Mirror::Vertical] {
            let base = ComponentPlacement::new("U1", regulator(), Point::new(50.8, 50.8))
                .with_rotation(rotation);
            let mut mirrored = base.clone();
            mirrored.mirror_across(axis);
            assert_ne!(world_pins(&mirrored), world_pins(&base));
            mirrored.mirror_across(axis);
            assert_eq!(mirrored, base);
            assert_eq!(world_pins(&mirrored), world_pins(&base));
        }
    }
}

#[test]
fn mirroring_both_axes_is_a_half_turn() {
    let base = ComponentPlacement::new("U1", regulator(), Point::new(25.4, 25.4));
    let mut both = base.clone();
    both.mirror_across(Mirror::Horizontal);
    both.mirror_across(Mirror::Vertical);
    assert_eq!(both.mirror, Mirror::None);
    assert_eq!(world_pins(&both), world_pins(&base.with_rotation(Rotation::Deg180)));
}

#[test]
fn horizontal_mirror_moves_output_to_the_left() {
    let u1 = ComponentPlacement::new("U1", regulator(), Point::ORIGIN).with_mirror(Mirror::Horizontal);
    let vo = world_pin_by_number(&u1, "2").unwrap();
    assert_eq!(vo.position, Point::new(-7.62, 0.0));
    assert_eq!(vo.orientation, Angle::new(0.0));
    // Label sits on the left pin and reads leftward, away from the body
    assert_eq!(plan_label(&vo, "3V3", ComponentKind::Regular).text_orientation, Angle::LEFT);
}

#[test]
fn label_anchors_are_pin_positions_bit_for_bit() {
    let placements = vec![
        ComponentPlacement::new("R1", two_terminal(), Point::new(101.6, 101.6))
            .with_rotation(Rotation::Deg270)
            .with_mirror(Mirror::Vertical),
        ComponentPlacement::new("U1", regulator(), Point::new(127.0, 96.52))
            .with_rotation(Rotation::Deg90),
    ];
    let planner = Planner::new(&placements);
    for placement in &placements {
        for pin in world_pins(placement) {
            let label = planner.label_pin(&pin.pin, "NET").unwrap();
            assert_eq!(label.anchor.x.to_bits(), pin.position.x.to_bits());
            assert_eq!(label.anchor.y.to_bits(), pin.position.y.to_bits());
        }
    }
}

#[test]
fn power_symbols_never_get_visible_labels() {
    let placements = vec![ComponentPlacement::new("#PWR01", ground(), Point::new(76.2, 110.49))];
    let planner = Planner::new(&placements);
    let label = planner.label_pin(&PinRef::new("#PWR01", "1"), "GND").unwrap();
    assert!(label.suppressed);

    let both = planner
        .connect_with_labels(&PinRef::new("#PWR01", "1"), &PinRef::new("#PWR01", "1"), "GND")
        .unwrap();
    assert!(both.iter().all(|l| l.suppressed));
}

#[test]
fn wire_validates_until_component_moves() {
    init_logger();
    let mut placements = vec![
        ComponentPlacement::new("R1", two_terminal(), Point::new(101.6, 101.6)),
        ComponentPlacement::new("R2", two_terminal(), Point::new(127.0, 101.6))
            .with_rotation(Rotation::Deg90),
    ];
    let a = PinRef::new("R1", "2");
    let b = PinRef::new("R2", "1");

    let wire = Planner::new(&placements).wire_pins(&a, &b, &[]).unwrap();
    assert_eq!(validate(Connection::Wire(&wire), &placements, &[]), ValidationResult::Ok);

    placements[0].move_to(Point::new(101.6, 114.3));
    let expected = placements.resolve_pin(&a).unwrap().position;
    assert_eq!(
        validate(Connection::Wire(&wire), &placements, &[]),
        ValidationResult::Mismatch {
            pin: a,
            expected,
            actual: wire.start.point,
        }
    );
    assert!(matches!(
        validate(Connection::Wire(&wire), &placements, &[]).into_result(),
        Err(PlacementError::PlacementMismatch { .. })
    ));
}

#[test]
fn unknown_references_fail_fast() {
    let placements = vec![ComponentPlacement::new("R1", two_terminal(), Point::ORIGIN)];
    let planner = Planner::new(&placements);

    assert_eq!(
        planner.label_pin(&PinRef::new("R1", "3"), "X").unwrap_err(),
        PlacementError::InvalidPinReference(PinRef::new("R1", "3"))
    );
    assert_eq!(
        planner.wire_pins(&PinRef::new("R1", "1"), &PinRef::new("R9", "1"), &[]).unwrap_err(),
        PlacementError::UnknownComponent("R9".to_string())
    );
    assert!(ComponentPlacement::new("R1", two_terminal(), Point::ORIGIN)
        .with_rotation_degrees(30.0)
        .is_err());
}

#[test]
fn duplicate_wire_is_reported_not_fatal() {
    let placements = vec![
        ComponentPlacement::new("R1", two_terminal(), Point::new(0.0, 0.0)),
        ComponentPlacement::new("R2", two_terminal(), Point::new(10.16, 0.0)),
    ];
    let planner = Planner::new(&placements);
    let a = PinRef::new("R1", "1");
    let b = PinRef::new("R2", "1");
    let first = planner.wire_pins(&a, &b, &[]).unwrap();
    let err = planner.wire_pins(&b, &a, &[first]).unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn wire_net_chains_in_input_order_and_skips_duplicates() {
    let placements = vec![
        ComponentPlacement::new("R1", two_terminal(), Point::new(0.0, 0.0)),
        ComponentPlacement::new("R2", two_terminal(), Point::new(10.16, 0.0)),
        ComponentPlacement::new("R3", two_terminal(), Point::new(20.32, 0.0)),
    ];
    let planner = Planner::new(&placements);
    let pins = [
        PinRef::new("R1", "2"),
        PinRef::new("R2", "2"),
        PinRef::new("R3", "2"),
    ];
    let existing = planner.wire_pins(&pins[1], &pins[2], &[]).unwrap();
    let wires = planner.wire_net(&pins, std::slice::from_ref(&existing)).unwrap();
    assert_eq!(wires.len(), 1);
    assert_eq!(wires[0].start.pin.as_ref(), Some(&pins[0]));
    assert_eq!(wires[0].end.pin.as_ref(), Some(&pins[1]));

    let missing = [PinRef::new("R1", "2"), PinRef::new("R4", "1")];
    assert!(planner.wire_net(&missing, &[]).is_err());
}

#[test]
fn second_label_on_power_pin_is_duplicate() {
    let placements = vec![
        ComponentPlacement::new("U1", regulator(), Point::new(50.8, 50.8)),
        ComponentPlacement::new("#PWR01", ground(), Point::new(50.8, 63.5)),
    ];
    let planner = Planner::new(&placements);

    let vo = PinRef::new("U1", "2");
    let first = planner.label_pin(&vo, "3V3").unwrap();
    let second = planner.label_pin(&vo, "VCC").unwrap();
    let gnd = PinRef::new("#PWR01", "1");
    let gnd_auto = planner.label_pin(&gnd, "GND").unwrap();
    let gnd_again = planner.label_pin(&gnd, "GND").unwrap();

    let labels = vec![first, second, gnd_auto, gnd_again];
    let findings = validate_all(&placements, &labels, &[]);
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].subject, Subject::Label(1));
    assert_eq!(findings[0].result, ValidationResult::DuplicateLabel { pin: vo });
    // Suppressed labels still count on power symbols
    assert_eq!(findings[1].subject, Subject::Label(3));
    assert_eq!(findings[1].result, ValidationResult::DuplicateLabel { pin: gnd });

    // Passive pins may carry several labels
    let r = vec![ComponentPlacement::new("R1", two_terminal(), Point::ORIGIN)];
    let planner = Planner::new(&r);
    let labels = vec![
        planner.label_pin(&PinRef::new("R1", "1"), "A").unwrap(),
        planner.label_pin(&PinRef::new("R1", "1"), "B").unwrap(),
    ];
    assert!(validate_all(&r, &labels, &[]).is_empty());
}

#[test]
fn removed_component_is_unresolved() {
    let mut placements = vec![ComponentPlacement::new("R1", two_terminal(), Point::ORIGIN)];
    let label = Planner::new(&placements)
        .label_pin(&PinRef::new("R1", "1"), "SIG")
        .unwrap();
    placements.clear();
    assert_eq!(
        validate(Connection::Label(&label), &placements, &[]),
        ValidationResult::Unresolved {
            pin: PinRef::new("R1", "1")
        }
    );
}
