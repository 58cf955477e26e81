//! FEA Example - portal frame with a pinned beam-column joint
//!
//! Usage: `fea-example [options.json]`. Results are printed as JSON.

use anyhow::{Context, Result};
use fea_static::prelude::*;
use serde::Serialize;

#[derive(Serialize)]
struct NodeResult {
    node: String,
    displacement: NodeDisplacement,
    reaction: Reactions,
}

#[derive(Serialize)]
struct CaseReport {
    summary: AnalysisSummary,
    nodes: Vec<NodeResult>,
}

//     N3 -------- N4b N4
//     |               |
//     |               |
//     N1              N2
//   Fixed           Fixed
//
// N4b coincides with N4 and is tied to it by a hinge link, so the beam
// end is pinned to the right column.
fn build_portal_frame(options: AnalysisOptions) -> Result<Model> {
    let mut model = Model::with_options(options);

    let height = 4.0;
    let span = 6.0;

    // W12x26 (approximate properties)
    let section = Section::new(0.00494, 8.49e-5, 7.2e-6, 1.25e-7);
    let steel = Material::steel();

    let n1 = model.add_node(Node::new("N1", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))?;
    let n2 = model.add_node(Node::new("N2", span, 0.0, 0.0).with_constraints(Constraints::fixed()))?;
    let n3 = model.add_node(Node::new("N3", 0.0, height, 0.0))?;
    let n4 = model.add_node(Node::new("N4", span, height, 0.0))?;
    let n4b = model.add_node(Node::new("N4b", span, height, 0.0))?;

    model.add_element(FrameElement2Node::new("Col1", n1, n3, steel, section))?;
    model.add_element(FrameElement2Node::new("Col2", n2, n4, steel, section))?;
    model.add_element(
        FrameElement2Node::new("Beam", n3, n4b, steel, section)
            .with_load(DistributedLoad::gravity(10_000.0, LoadCase::dead("Dead"))),
    )?;
    model.add_mpc_element(HingeLink::new("Joint", vec![n4, n4b]))?;

    model.add_nodal_load(n3, NodalLoad::fx(5_000.0, LoadCase::wind("Wind")))?;
    model.add_load_combo(
        LoadCombination::new("1.2D + 1.0W")
            .with_case(LoadCase::dead("Dead"), 1.2)
            .with_case(LoadCase::wind("Wind"), 1.0),
    )?;

    Ok(model)
}

fn report(model: &Model, case: &LoadCase) -> Result<CaseReport> {
    let mut nodes = Vec::new();
    for (i, node) in model.nodes().iter().enumerate() {
        let id = NodeId(i);
        nodes.push(NodeResult {
            node: node.label.clone(),
            displacement: model.node_displacement(id, case)?,
            reaction: model.node_reactions(id, case)?,
        });
    }
    Ok(CaseReport {
        summary: model.summary(case)?,
        nodes,
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => AnalysisOptions::from_json_file(&path)
            .with_context(|| format!("reading analysis options from {}", path))?,
        None => AnalysisOptions::default().with_statics_check(),
    };

    let mut model = build_portal_frame(options)?;
    model.solve_parallel().context("solving load cases")?;

    let mut cases = serde_json::Map::new();
    for case in model.load_cases() {
        let case_report = report(&model, &case)?;
        cases.insert(case.name.clone(), serde_json::to_value(case_report)?);
    }

    let combined = model.combo_displacements("1.2D + 1.0W")?;
    let output = serde_json::json!({
        "load_cases": cases,
        "combinations": {
            "1.2D + 1.0W": {
                "max_abs_displacement": combined.amax(),
            }
        },
        "solver_cache": {
            "entries": model.results().solver_cache().len(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
