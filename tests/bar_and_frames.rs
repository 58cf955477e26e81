//! Closed-form checks of small bars and frames

use approx::assert_relative_eq;
use fea_static::prelude::*;

/// Fixed-fixed bar of length 4 split at mid-span; only DX is free at mid-span
fn fixed_fixed_bar(ea: f64) -> (Model, [NodeId; 3]) {
    let mut model = Model::new();
    let a = model
        .add_node(Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    let b = model
        .add_node(Node::new("B", 2.0, 0.0, 0.0).with_constraints(Constraints::roller_x()))
        .unwrap();
    let c = model
        .add_node(Node::new("C", 4.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    let material = Material::new(ea, ea, 0.0);
    model
        .add_element(TrussElement::new("T1", a, b, material, Section::axial(1.0)))
        .unwrap();
    model
        .add_element(TrussElement::new("T2", b, c, material, Section::axial(1.0)))
        .unwrap();
    (model, [a, b, c])
}

fn check_midspan_load(ea: f64, p: f64) {
    let (mut model, [a, b, c]) = fixed_fixed_bar(ea);
    model.add_nodal_load(b, NodalLoad::fx(p, "P")).unwrap();

    let case = LoadCase::from("P");
    model.solve(&case).unwrap();

    let u = model.node_displacement(b, &case).unwrap();
    assert_relative_eq!(u.dx, p * 2.0 * 2.0 / (ea * 4.0), max_relative = 1e-12);

    let ra = model.node_reactions(a, &case).unwrap();
    let rc = model.node_reactions(c, &case).unwrap();
    assert_relative_eq!(ra.fx, -p / 2.0, max_relative = 1e-12);
    assert_relative_eq!(rc.fx, -p / 2.0, max_relative = 1e-12);
    // Released DoF carries no reaction
    assert_eq!(model.node_reactions(b, &case).unwrap().fx, 0.0);
}

#[test]
fn test_fixed_fixed_bar_with_midspan_load() {
    check_midspan_load(100.0, 10.0);
}

#[test]
fn test_unit_axial_stiffness_bar_with_midspan_load() {
    check_midspan_load(1.0, 1.0);
    check_midspan_load(1.0, -7.5);
}

#[test]
fn test_element_point_load_goes_straight_to_supports() {
    let p = 10.0;
    let mut model = Model::new();
    let a = model
        .add_node(Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    let c = model
        .add_node(Node::new("C", 4.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    model
        .add_element(
            FrameElement2Node::new("M", a, c, Material::unit(), Section::new(1.0, 1.0, 1.0, 1.0))
                .with_load(PointLoad::axial(p, 2.0, "P")),
        )
        .unwrap();

    let case = LoadCase::from("P");
    model.solve(&case).unwrap();
    assert_relative_eq!(model.node_reactions(a, &case).unwrap().fx, -p / 2.0, max_relative = 1e-12);
    assert_relative_eq!(model.node_reactions(c, &case).unwrap().fx, -p / 2.0, max_relative = 1e-12);
    assert_eq!(model.node_displacement(a, &case).unwrap().dx, 0.0);
}

#[test]
fn test_cantilever_end_forces() {
    let p = 3.0;
    let mut model = Model::new();
    let a = model
        .add_node(Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    let b = model.add_node(Node::new("B", 2.0, 0.0, 0.0)).unwrap();
    model
        .add_element(FrameElement2Node::new(
            "M",
            a,
            b,
            Material::unit(),
            Section::new(1.0, 1.0, 1.0, 1.0),
        ))
        .unwrap();
    model.add_nodal_load(b, NodalLoad::fy(-p, "P")).unwrap();

    let case = LoadCase::from("P");
    model.solve(&case).unwrap();

    // PL^3 / 3EI
    let tip = model.node_displacement(b, &case).unwrap();
    assert_relative_eq!(tip.dy, -p * 8.0 / 3.0, max_relative = 1e-10);

    let forces = model.element_end_forces("M", &case).unwrap();
    assert_relative_eq!(forces[1], p, max_relative = 1e-10);
    assert_relative_eq!(forces[5], 2.0 * p, max_relative = 1e-10);
    assert_relative_eq!(forces[7], -p, max_relative = 1e-10);
    assert!(forces[11].abs() < 1e-10);

    assert!(matches!(
        model.element_end_forces("Nope", &case),
        Err(FEAError::ElementNotFound(_))
    ));
}

#[test]
fn test_support_settlement_moves_the_structure_rigidly() {
    let mut model = Model::new();
    let a = model
        .add_node(Node::new("A", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    let b = model.add_node(Node::new("B", 3.0, 0.0, 0.0)).unwrap();
    model
        .add_element(FrameElement2Node::new(
            "M",
            a,
            b,
            Material::steel(),
            Section::rectangular(0.2, 0.4),
        ))
        .unwrap();
    model
        .add_settlement(
            a,
            Settlement::new(Displacement::translation(0.0, -0.01, 0.0), "S"),
        )
        .unwrap();

    let case = LoadCase::from("S");
    model.solve(&case).unwrap();

    assert_eq!(model.node_displacement(a, &case).unwrap().dy, -0.01);
    let tip = model.node_displacement(b, &case).unwrap();
    assert_relative_eq!(tip.dy, -0.01, max_relative = 1e-9);
    assert!(tip.rz.abs() < 1e-12);
    assert!(model.node_reactions(a, &case).unwrap().force_magnitude() < 1e-3);
}

#[test]
fn test_frame_with_element_loads_is_in_equilibrium() {
    let mut model = Model::new();
    let section = Section::rectangular(0.3, 0.5);
    let steel = Material::steel();
    let n1 = model
        .add_node(Node::new("N1", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
        .unwrap();
    let n2 = model
        .add_node(Node::new("N2", 6.0, 0.0, 2.0).with_constraints(Constraints::pinned()))
        .unwrap();
    let n3 = model.add_node(Node::new("N3", 0.0, 4.0, 0.0)).unwrap();
    let n4 = model.add_node(Node::new("N4", 6.0, 4.0, 2.0)).unwrap();

    model
        .add_element(FrameElement2Node::new("C1", n1, n3, steel, section))
        .unwrap();
    model
        .add_element(FrameElement2Node::new("C2", n2, n4, steel, section).with_rotation(0.3))
        .unwrap();
    model
        .add_element(
            FrameElement2Node::new("B1", n3, n4, steel, section)
                .with_load(DistributedLoad::gravity(5_000.0, "D"))
                .with_load(PointLoad::new(2_000.0, 1.5, LoadDirection::FZ, "D")),
        )
        .unwrap();
    model.add_nodal_load(n3, NodalLoad::force(1_000.0, 0.0, -500.0, "D")).unwrap();
    model.add_nodal_load(n4, NodalLoad::moment(0.0, 300.0, 0.0, "D")).unwrap();
    model.set_options(AnalysisOptions::default().with_statics_check());

    let case = LoadCase::from("D");
    model.solve(&case).unwrap();

    let result = model.results().get(&case).unwrap();
    let residual = result.equilibrium_residual(model.mesh());
    let scale = result.total_forces.amax();
    assert!(residual.force_magnitude() < 1e-8 * scale);
    assert!(residual.moment_magnitude() < 1e-7 * scale);
    assert!(result
        .diagnostics
        .iter()
        .all(|d| d.kind != DiagnosticKind::StaticsResidual));

    let summary = model.summary(&case).unwrap();
    assert_eq!(summary.num_elements, 3);
    assert_eq!(summary.free_dofs, 6 * 4 - 6 - 3);
    assert_eq!(summary.slave_dofs, 0);
}
