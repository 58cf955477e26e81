//! Static linear analysis results and the per-load-case solve pipeline
//!
//! For each load case the pipeline classifies the DoFs, permutes the global
//! stiffness matrix into the reduced order, splits it into zones, solves the
//! released-released block with a cached solver and maps everything back to
//! the natural node-major order.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisOptions;
use crate::assembly::MatrixAssemblerUtil;
use crate::diagnostics::{dof_name, Diagnostic, DiagnosticKind};
use crate::dof_map::DofMap;
use crate::elements::NodeId;
use crate::error::{FEAError, FEAResult};
use crate::loads::{Force, LoadCase, LoadCombination};
use crate::math::sparse_matvec;
use crate::model::Mesh;
use crate::partition::ZoneDividedMatrix;
use crate::permutation::{PermutationGenerator, PermutationPair};
use crate::solver::{factory_for, SolveReport, Solver, SolverCache, SolverError, SolverFactory};

/// Displacement results at a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDisplacement {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    pub fn rotation_magnitude(&self) -> f64 {
        (self.rx.powi(2) + self.ry.powi(2) + self.rz.powi(2)).sqrt()
    }
}

/// Support reactions at a node
pub type Reactions = Force;

/// Analysis summary of one load case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub load_case: String,
    pub num_nodes: usize,
    pub num_elements: usize,
    pub num_mpc_elements: usize,
    pub total_dofs: usize,
    pub free_dofs: usize,
    pub known_dofs: usize,
    pub slave_dofs: usize,
    pub max_displacement: f64,
    pub max_disp_node: String,
    pub max_reaction: f64,
    pub max_reaction_node: String,
    pub solver_iterations: usize,
    pub solver_residual: f64,
    pub diagnostics: usize,
}

/// Progress of one load case through the pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CaseState {
    #[default]
    NotComputed,
    Assembling,
    Solving,
    Computed,
    Failed(String),
}

/// Stored vectors of one solved load case, all `6N` in node-major order
#[derive(Debug, Clone)]
pub struct LoadCaseResult {
    pub load_case: LoadCase,
    pub displacements: DVector<f64>,
    /// Non-zero only at fixed (known) DoFs
    pub support_reactions: DVector<f64>,
    /// Element equivalent loads plus concentrated loads
    pub total_forces: DVector<f64>,
    pub element_forces: DVector<f64>,
    pub concentrated_forces: DVector<f64>,
    pub report: SolveReport,
    pub diagnostics: Vec<Diagnostic>,
    pub dof_map: DofMap,
}

impl LoadCaseResult {
    fn node_block(vector: &DVector<f64>, node: NodeId) -> [f64; 6] {
        let mut out = [0.0; 6];
        for (local, value) in out.iter_mut().enumerate() {
            *value = vector[node.dof(local)];
        }
        out
    }

    pub fn node_displacement(&self, node: NodeId) -> NodeDisplacement {
        NodeDisplacement::from_array(Self::node_block(&self.displacements, node))
    }

    pub fn node_reactions(&self, node: NodeId) -> Reactions {
        Force::from_array(Self::node_block(&self.support_reactions, node))
    }

    /// Peak displacement and reaction, plus the sizes of the reduced system
    pub fn summary(&self, mesh: &Mesh) -> AnalysisSummary {
        let mut summary = AnalysisSummary {
            load_case: self.load_case.name.clone(),
            num_nodes: mesh.nodes.len(),
            num_elements: mesh.elements.len(),
            num_mpc_elements: mesh.mpc_elements.len(),
            total_dofs: self.dof_map.total_dofs(),
            free_dofs: self.dof_map.m,
            known_dofs: self.dof_map.known_count(),
            slave_dofs: self.dof_map.slaves.len(),
            solver_iterations: self.report.iterations,
            solver_residual: self.report.residual,
            diagnostics: self.diagnostics.len(),
            ..Default::default()
        };

        for (i, node) in mesh.nodes.iter().enumerate() {
            let disp = self.node_displacement(NodeId(i)).translation_magnitude();
            if disp > summary.max_displacement {
                summary.max_displacement = disp;
                summary.max_disp_node = node.label.clone();
            }
            let rxn = self.node_reactions(NodeId(i));
            let rxn = (rxn.fx.powi(2) + rxn.fy.powi(2) + rxn.fz.powi(2)).sqrt();
            if rxn > summary.max_reaction {
                summary.max_reaction = rxn;
                summary.max_reaction_node = node.label.clone();
            }
        }
        summary
    }

    /// Resultant of applied loads plus reactions, moments taken about the origin
    ///
    /// Zero up to round-off for a structure in equilibrium.
    pub fn equilibrium_residual(&self, mesh: &Mesh) -> Force {
        let mut total = Force::ZERO;
        for (i, node) in mesh.nodes.iter().enumerate() {
            let id = NodeId(i);
            let f = Force::from_array(Self::node_block(&self.total_forces, id))
                + Force::from_array(Self::node_block(&self.support_reactions, id));
            total += Force::new(
                f.fx,
                f.fy,
                f.fz,
                f.mx + node.y * f.fz - node.z * f.fy,
                f.my + node.z * f.fx - node.x * f.fz,
                f.mz + node.x * f.fy - node.y * f.fx,
            );
        }
        total
    }
}

/// A load case after DoF classification and reduction, ready to solve
struct PreparedCase {
    case: LoadCase,
    map: DofMap,
    pair: PermutationPair,
    zones: ZoneDividedMatrix,
    rhs: DVector<f64>,
    fsr: DVector<f64>,
    usr: DVector<f64>,
    element_forces: DVector<f64>,
    concentrated_forces: DVector<f64>,
    total_forces: DVector<f64>,
    diagnostics: Vec<Diagnostic>,
}

/// Results of a static linear analysis, plus the caches that make them cheap
///
/// The full stiffness matrix and the initialized solvers are kept until the
/// owning model changes topology and calls [`invalidate`](Self::invalidate).
pub struct StaticLinearAnalysisResult {
    options: AnalysisOptions,
    factory: Arc<dyn SolverFactory>,
    stiffness: Option<CsrMatrix<f64>>,
    solvers: SolverCache,
    results: HashMap<LoadCase, LoadCaseResult>,
    states: HashMap<LoadCase, CaseState>,
    // Model-level findings copied into every new load case result
    warnings: Vec<Diagnostic>,
}

impl Default for StaticLinearAnalysisResult {
    fn default() -> Self {
        Self::new(AnalysisOptions::default(), None)
    }
}

impl StaticLinearAnalysisResult {
    /// Empty result using `factory`, or the built-in solver chosen by `options`
    pub fn new(options: AnalysisOptions, factory: Option<Arc<dyn SolverFactory>>) -> Self {
        let factory = factory.unwrap_or_else(|| factory_for(&options));
        Self {
            options,
            factory,
            stiffness: None,
            solvers: SolverCache::new(),
            results: HashMap::new(),
            states: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Drop the cached stiffness matrix, solvers and every stored result
    pub fn invalidate(&mut self) {
        if !self.results.is_empty() || self.stiffness.is_some() {
            log::debug!("invalidating {} stored load case results", self.results.len());
        }
        self.stiffness = None;
        self.solvers.clear();
        self.results.clear();
        self.states.clear();
    }

    /// Findings about the model as a whole, attached to results computed from now on
    pub fn set_model_warnings(&mut self, warnings: Vec<Diagnostic>) {
        self.warnings = warnings;
    }

    /// Drop the stored result of one load case; cached factorizations stay
    pub fn remove(&mut self, case: &LoadCase) -> Option<LoadCaseResult> {
        self.states.remove(case);
        self.results.remove(case)
    }

    pub fn state(&self, case: &LoadCase) -> CaseState {
        self.states.get(case).cloned().unwrap_or_default()
    }

    pub fn contains(&self, case: &LoadCase) -> bool {
        self.results.contains_key(case)
    }

    pub fn computed_cases(&self) -> Vec<&LoadCase> {
        self.results.keys().collect()
    }

    pub fn solver_cache(&self) -> &SolverCache {
        &self.solvers
    }

    pub fn get(&self, case: &LoadCase) -> FEAResult<&LoadCaseResult> {
        self.results
            .get(case)
            .ok_or_else(|| FEAError::NotAnalyzed(case.name.clone()))
    }

    pub fn displacements(&self, case: &LoadCase) -> FEAResult<&DVector<f64>> {
        Ok(&self.get(case)?.displacements)
    }

    pub fn support_reactions(&self, case: &LoadCase) -> FEAResult<&DVector<f64>> {
        Ok(&self.get(case)?.support_reactions)
    }

    pub fn total_forces(&self, case: &LoadCase) -> FEAResult<&DVector<f64>> {
        Ok(&self.get(case)?.total_forces)
    }

    fn ensure_stiffness(&mut self, mesh: &Mesh) -> FEAResult<()> {
        let stale = self
            .stiffness
            .as_ref()
            .is_some_and(|k| k.nrows() != mesh.total_dofs());
        if stale {
            log::warn!("stored stiffness does not match the mesh, reassembling");
            self.invalidate();
        }
        if self.stiffness.is_none() {
            self.stiffness = Some(MatrixAssemblerUtil::assemble_full_stiffness_matrix(mesh)?);
        }
        Ok(())
    }

    /// Solve a load case and store its result, replacing any previous one
    ///
    /// When the solve fails a previously stored result is kept and the state
    /// records the failure.
    pub fn add_analysis_result(&mut self, mesh: &Mesh, case: &LoadCase) -> FEAResult<()> {
        log::info!("analysing load case '{}'", case.name);
        self.states.insert(case.clone(), CaseState::Assembling);

        let outcome = self.run_case(mesh, case);
        match outcome {
            Ok(result) => {
                log::info!(
                    "load case '{}' solved ({} iterations, residual {:e})",
                    case.name,
                    result.report.iterations,
                    result.report.residual
                );
                self.states.insert(case.clone(), CaseState::Computed);
                self.results.insert(case.clone(), result);
                Ok(())
            }
            Err(e) => {
                log::error!("load case '{}' failed: {}", case.name, e);
                self.states
                    .insert(case.clone(), CaseState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Solve a load case unless a result for it is already stored
    pub fn add_analysis_result_if_not_exists(
        &mut self,
        mesh: &Mesh,
        case: &LoadCase,
    ) -> FEAResult<()> {
        if self.results.contains_key(case) {
            return Ok(());
        }
        self.add_analysis_result(mesh, case)
    }

    fn run_case(&mut self, mesh: &Mesh, case: &LoadCase) -> FEAResult<LoadCaseResult> {
        self.ensure_stiffness(mesh)?;
        let k = self.stiffness.as_ref().ok_or_else(|| {
            FEAError::InvalidInput("stiffness matrix missing after assembly".to_string())
        })?;
        let prepared = prepare_case(mesh, k, case, &self.options, &self.warnings)?;

        self.states.insert(case.clone(), CaseState::Solving);
        let solver = if prepared.map.m > 0 {
            let rr = &prepared.zones.released_released;
            Some(self.solvers.get_or_create(
                &prepared.map.master_map,
                self.factory.as_ref(),
                &case.name,
                || rr.clone(),
            )?)
        } else {
            None
        };
        let (ufr, report) = solve_prepared(&prepared, solver)?;
        Ok(finish_case(mesh, prepared, ufr, report, &self.options))
    }

    /// Solve several load cases, running independent solves in parallel
    ///
    /// Cases that already have a result are skipped. Solvers are created and
    /// initialized up front, one per distinct master map; the solves then
    /// share them. Every successful case is stored even when others fail; the
    /// first failure is returned.
    pub fn add_analysis_results_parallel(
        &mut self,
        mesh: &Mesh,
        cases: &[LoadCase],
    ) -> FEAResult<()> {
        let mut pending: Vec<LoadCase> = Vec::new();
        for case in cases {
            if !self.results.contains_key(case) && !pending.contains(case) {
                pending.push(case.clone());
            }
        }
        if pending.is_empty() {
            return Ok(());
        }
        log::info!("analysing {} load cases in parallel", pending.len());
        self.ensure_stiffness(mesh)?;
        for case in &pending {
            self.states.insert(case.clone(), CaseState::Assembling);
        }

        let k = self.stiffness.as_ref().ok_or_else(|| {
            FEAError::InvalidInput("stiffness matrix missing after assembly".to_string())
        })?;
        let options = &self.options;
        let warnings = &self.warnings;
        let prepared: Vec<FEAResult<PreparedCase>> = pending
            .par_iter()
            .map(|case| prepare_case(mesh, k, case, options, warnings))
            .collect();

        // Factorize sequentially, one solver per master map
        let mut ready: Vec<FEAResult<PreparedCase>> = Vec::with_capacity(prepared.len());
        for item in prepared {
            let item = item.and_then(|p| {
                if p.map.m > 0 {
                    let rr = &p.zones.released_released;
                    self.solvers.get_or_create(
                        &p.map.master_map,
                        self.factory.as_ref(),
                        &p.case.name,
                        || rr.clone(),
                    )?;
                }
                Ok(p)
            });
            if let Ok(p) = &item {
                self.states.insert(p.case.clone(), CaseState::Solving);
            }
            ready.push(item);
        }

        let solvers = &self.solvers;
        let options = &self.options;
        let solved: Vec<FEAResult<LoadCaseResult>> = ready
            .into_par_iter()
            .map(|item| {
                let p = item?;
                let solver = if p.map.m > 0 {
                    solvers.get(&p.map.master_map)?
                } else {
                    None
                };
                let (ufr, report) = solve_prepared(&p, solver)?;
                Ok(finish_case(mesh, p, ufr, report, options))
            })
            .collect();

        let mut first_error = None;
        for (case, outcome) in pending.iter().zip(solved) {
            match outcome {
                Ok(result) => {
                    self.states.insert(case.clone(), CaseState::Computed);
                    self.results.insert(case.clone(), result);
                }
                Err(e) => {
                    log::error!("load case '{}' failed: {}", case.name, e);
                    self.states
                        .insert(case.clone(), CaseState::Failed(e.to_string()));
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Factored sum of the displacements of a combination's load cases
    ///
    /// Missing load case results are computed first.
    pub fn combined_displacements(
        &mut self,
        mesh: &Mesh,
        combo: &LoadCombination,
    ) -> FEAResult<DVector<f64>> {
        self.combine(mesh, combo, |r| &r.displacements)
    }

    /// Factored sum of the support reactions of a combination's load cases
    pub fn combined_reactions(
        &mut self,
        mesh: &Mesh,
        combo: &LoadCombination,
    ) -> FEAResult<DVector<f64>> {
        self.combine(mesh, combo, |r| &r.support_reactions)
    }

    fn combine(
        &mut self,
        mesh: &Mesh,
        combo: &LoadCombination,
        pick: impl Fn(&LoadCaseResult) -> &DVector<f64>,
    ) -> FEAResult<DVector<f64>> {
        let mut total = DVector::zeros(mesh.total_dofs());
        for (case, factor) in &combo.factors {
            if factor.abs() <= 1e-10 {
                continue;
            }
            self.add_analysis_result_if_not_exists(mesh, case)?;
            total.axpy(*factor, pick(self.get(case)?), 1.0);
        }
        Ok(total)
    }

    /// End forces of an element in global coordinates, `K_e * u_e - f_eq`
    pub fn element_end_forces(
        &self,
        mesh: &Mesh,
        element: usize,
        case: &LoadCase,
    ) -> FEAResult<DVector<f64>> {
        let element = mesh
            .elements
            .get(element)
            .ok_or_else(|| FEAError::ElementNotFound(format!("#{}", element)))?;
        element.end_forces(&mesh.nodes, self.displacements(case)?, case)
    }
}

/// Steps up to the right-hand side: DoF map, permutation, zones and loads
fn prepare_case(
    mesh: &Mesh,
    k: &CsrMatrix<f64>,
    case: &LoadCase,
    options: &AnalysisOptions,
    warnings: &[Diagnostic],
) -> FEAResult<PreparedCase> {
    let map = DofMap::create(mesh, case)?;
    let pair = PermutationGenerator::generate(&map);

    let k_reduced = &(&pair.pf * k) * &pair.pu;
    let zones = ZoneDividedMatrix::divide(&k_reduced, &map);
    log::debug!(
        "load case '{}': {} free, {} known, {} slave DoFs, RR nnz {}",
        case.name,
        map.m,
        map.known_count(),
        map.slaves.len(),
        zones.released_released.nnz()
    );

    let mut diagnostics: Vec<Diagnostic> = warnings
        .iter()
        .map(|w| Diagnostic {
            load_case: Some(case.name.clone()),
            ..w.clone()
        })
        .chain(map.diagnostics.iter().cloned())
        .collect();
    for i in zones.zero_diagonals() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::ZeroStiffness,
            Some(case),
            format!("free DoF {} has no stiffness", dof_name(&mesh.nodes, map.rmap1[i])),
        ));
    }
    if options.strict {
        if let Some(d) = diagnostics.iter().find(|d| d.is_singularity()) {
            return Err(d.clone().into_error());
        }
    }

    let element_forces = MatrixAssemblerUtil::assemble_element_force_vector(mesh, case)?;
    let concentrated_forces = MatrixAssemblerUtil::assemble_concentrated_force_vector(mesh, case);
    let total_forces = &element_forces + &concentrated_forces;

    let fr = sparse_matvec(&pair.pf, &(&total_forces - sparse_matvec(k, &pair.d)));
    let m = map.m;
    let ffr = fr.rows(0, m).into_owned();
    let fsr = fr.rows(m, map.known_count()).into_owned();
    let usr = DVector::from_column_slice(&map.known_values);
    let rhs = ffr - sparse_matvec(&zones.released_fixed, &usr);

    Ok(PreparedCase {
        case: case.clone(),
        map,
        pair,
        zones,
        rhs,
        fsr,
        usr,
        element_forces,
        concentrated_forces,
        total_forces,
        diagnostics,
    })
}

/// Solve `RR * ufr = ffr - RF * usr`; an empty free zone needs no solver
fn solve_prepared(
    prepared: &PreparedCase,
    solver: Option<&dyn Solver>,
) -> FEAResult<(DVector<f64>, SolveReport)> {
    let Some(solver) = solver else {
        return Ok((DVector::zeros(0), SolveReport::default()));
    };
    let mut ufr = DVector::zeros(prepared.map.m);
    let report = solver
        .solve(&prepared.rhs, &mut ufr)
        .map_err(|reason| FEAError::SolverFailure {
            load_case: prepared.case.name.clone(),
            residual: match reason {
                SolverError::NotConverged { residual, .. } => Some(residual),
                _ => None,
            },
            reason,
        })?;
    Ok((ufr, report))
}

/// Reactions and back-permutation to the natural order
fn finish_case(
    mesh: &Mesh,
    prepared: PreparedCase,
    ufr: DVector<f64>,
    report: SolveReport,
    options: &AnalysisOptions,
) -> LoadCaseResult {
    let PreparedCase {
        case,
        map,
        pair,
        zones,
        fsr,
        usr,
        element_forces,
        concentrated_forces,
        total_forces,
        mut diagnostics,
        ..
    } = prepared;

    let reduced_reactions = sparse_matvec(&zones.fixed_released, &ufr)
        + sparse_matvec(&zones.fixed_fixed, &usr)
        - fsr;
    let mut support_reactions = DVector::zeros(map.total_dofs());
    for j in 0..map.known_count() {
        support_reactions[map.known_dof(j)] = reduced_reactions[j];
    }

    let ur = DVector::from_iterator(map.reduced_size(), ufr.iter().chain(usr.iter()).copied());
    let displacements = sparse_matvec(&pair.pu, &ur) + &pair.d;

    let mut result = LoadCaseResult {
        load_case: case,
        displacements,
        support_reactions,
        total_forces,
        element_forces,
        concentrated_forces,
        report,
        diagnostics: Vec::new(),
        dof_map: map,
    };

    if options.check_statics {
        let residual = result.equilibrium_residual(mesh);
        let scale = result
            .total_forces
            .iter()
            .chain(result.support_reactions.iter())
            .fold(0.0_f64, |m, v| m.max(v.abs()));
        let force = (residual.fx.powi(2) + residual.fy.powi(2) + residual.fz.powi(2)).sqrt();
        log::info!(
            "statics check for '{}': force residual {:e}, moment residual {:e}",
            result.load_case.name,
            force,
            residual.moment_magnitude()
        );
        if force > 1e-6 * scale.max(1.0) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::StaticsResidual,
                Some(&result.load_case),
                format!("unbalanced force resultant {:e}", force),
            ));
        }
    }
    result.diagnostics = diagnostics;
    result
}

