//! FE Model - nodes, elements, MPC elements and their analysis results

use std::sync::Arc;

use nalgebra::DVector;

use crate::analysis::AnalysisOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::elements::{Constraints, Element, Node, NodeId, DOFS_PER_NODE};
use crate::error::{FEAError, FEAResult};
use crate::loads::{LoadCase, LoadCombination, NodalLoad, Settlement};
use crate::mpc::MpcElement;
use crate::results::{
    AnalysisSummary, CaseState, NodeDisplacement, Reactions, StaticLinearAnalysisResult,
};
use crate::solver::SolverFactory;

/// Geometry and topology of a model, the input of every assembly step
#[derive(Debug, Default)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Box<dyn Element>>,
    pub mpc_elements: Vec<Box<dyn MpcElement>>,
}

impl Mesh {
    /// Number of global DoFs (`6N`)
    pub fn total_dofs(&self) -> usize {
        self.nodes.len() * DOFS_PER_NODE
    }

    pub fn node(&self, id: NodeId) -> FEAResult<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| FEAError::NodeNotFound(format!("#{}", id.0)))
    }

    pub fn find_node(&self, label: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.label == label).map(NodeId)
    }

    pub fn find_element(&self, label: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.label() == label)
    }

    /// Whether each node is referenced by an element or an MPC element
    pub fn connected_nodes(&self) -> Vec<bool> {
        let mut connected = vec![false; self.nodes.len()];
        let ids = self
            .elements
            .iter()
            .flat_map(|e| e.nodes().iter())
            .chain(self.mpc_elements.iter().flat_map(|m| m.nodes().iter()));
        for id in ids {
            if let Some(flag) = connected.get_mut(id.0) {
                *flag = true;
            }
        }
        connected
    }
}

/// The main 3D finite element model
///
/// Topology changes (nodes, elements, MPC elements, constraints) drop every
/// stored result together with the cached stiffness matrix and solvers. Load
/// and settlement changes only drop the results of the affected load case.
pub struct Model {
    mesh: Mesh,
    /// Load combinations
    pub load_combos: Vec<LoadCombination>,
    factory: Option<Arc<dyn SolverFactory>>,
    result: StaticLinearAnalysisResult,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::with_options(AnalysisOptions::default())
    }

    pub fn with_options(options: AnalysisOptions) -> Self {
        Self {
            mesh: Mesh::default(),
            load_combos: Vec::new(),
            factory: None,
            result: StaticLinearAnalysisResult::new(options, None),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn nodes(&self) -> &[Node] {
        &self.mesh.nodes
    }

    pub fn options(&self) -> &AnalysisOptions {
        self.result.options()
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node and return its id
    pub fn add_node(&mut self, node: Node) -> FEAResult<NodeId> {
        if !node.label.is_empty() && self.mesh.find_node(&node.label).is_some() {
            return Err(FEAError::DuplicateName(node.label));
        }
        let id = NodeId(self.mesh.nodes.len());
        self.mesh.nodes.push(node);
        self.result.invalidate();
        Ok(id)
    }

    /// Id of the node with the given label
    pub fn node_id(&self, label: &str) -> FEAResult<NodeId> {
        self.mesh
            .find_node(label)
            .ok_or_else(|| FEAError::NodeNotFound(label.to_string()))
    }

    fn check_nodes(&self, ids: &[NodeId], owner: &str) -> FEAResult<()> {
        match ids.iter().find(|id| id.0 >= self.mesh.nodes.len()) {
            Some(id) => Err(FEAError::NodeNotFound(format!(
                "#{} (referenced by '{}')",
                id.0, owner
            ))),
            None => Ok(()),
        }
    }

    /// Add an element and return its index
    pub fn add_element(&mut self, element: impl Element + 'static) -> FEAResult<usize> {
        if self.mesh.find_element(element.label()).is_some() {
            return Err(FEAError::DuplicateName(element.label().to_string()));
        }
        self.check_nodes(element.nodes(), element.label())?;
        self.mesh.elements.push(Box::new(element));
        self.result.invalidate();
        Ok(self.mesh.elements.len() - 1)
    }

    pub fn add_mpc_element(&mut self, mpc: impl MpcElement + 'static) -> FEAResult<()> {
        if self.mesh.mpc_elements.iter().any(|m| m.label() == mpc.label()) {
            return Err(FEAError::DuplicateName(mpc.label().to_string()));
        }
        self.check_nodes(mpc.nodes(), mpc.label())?;
        self.mesh.mpc_elements.push(Box::new(mpc));
        self.result.invalidate();
        Ok(())
    }

    /// Replace the support conditions of a node
    pub fn set_constraints(&mut self, node: NodeId, constraints: Constraints) -> FEAResult<()> {
        let target = self
            .mesh
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| FEAError::NodeNotFound(format!("#{}", node.0)))?;
        if target.constraints != constraints {
            target.constraints = constraints;
            self.result.invalidate();
        }
        Ok(())
    }

    pub fn add_nodal_load(&mut self, node: NodeId, load: NodalLoad) -> FEAResult<()> {
        let target = self
            .mesh
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| FEAError::NodeNotFound(format!("#{}", node.0)))?;
        self.result.remove(&load.case);
        target.loads.push(load);
        Ok(())
    }

    /// Prescribe displacements of the fixed DoFs of a node for one load case
    pub fn add_settlement(&mut self, node: NodeId, settlement: Settlement) -> FEAResult<()> {
        let target = self
            .mesh
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| FEAError::NodeNotFound(format!("#{}", node.0)))?;
        self.result.remove(&settlement.case);
        target.settlements.push(settlement);
        Ok(())
    }

    /// Add a load combination
    pub fn add_load_combo(&mut self, combo: LoadCombination) -> FEAResult<()> {
        if self.load_combos.iter().any(|c| c.name == combo.name) {
            return Err(FEAError::DuplicateName(combo.name));
        }
        self.load_combos.push(combo);
        Ok(())
    }

    pub fn load_combo(&self, name: &str) -> FEAResult<&LoadCombination> {
        self.load_combos
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FEAError::LoadCombinationNotFound(name.to_string()))
    }

    // ========================
    // Configuration
    // ========================

    /// Change the analysis options; drops every stored result and solver
    pub fn set_options(&mut self, options: AnalysisOptions) {
        self.result = StaticLinearAnalysisResult::new(options, self.factory.clone());
    }

    /// Install a custom solver factory; drops every stored result and solver
    pub fn set_solver_factory(&mut self, factory: Arc<dyn SolverFactory>) {
        self.factory = Some(factory);
        self.result = StaticLinearAnalysisResult::new(self.options().clone(), self.factory.clone());
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Every load case referenced by a nodal load, settlement or element load
    pub fn load_cases(&self) -> Vec<LoadCase> {
        let mut cases: Vec<LoadCase> = Vec::new();
        let node_cases = self.mesh.nodes.iter().flat_map(|n| {
            n.loads
                .iter()
                .map(|l| l.case.clone())
                .chain(n.settlements.iter().map(|s| s.case.clone()))
        });
        let element_cases = self.mesh.elements.iter().flat_map(|e| e.load_cases());
        for case in node_cases.chain(element_cases) {
            if !cases.contains(&case) {
                cases.push(case);
            }
        }
        cases
    }

    /// Model problems that can be found without assembling anything
    pub fn check_warnings(&self) -> Vec<Diagnostic> {
        self.mesh
            .connected_nodes()
            .iter()
            .enumerate()
            .filter(|(_, &connected)| !connected)
            .map(|(i, _)| {
                Diagnostic::new(
                    DiagnosticKind::UnconnectedNode,
                    None,
                    format!(
                        "node '{}' is not connected to any element",
                        self.mesh.nodes[i].label
                    ),
                )
            })
            .collect()
    }

    /// Solve one load case unless its results are already stored
    pub fn solve(&mut self, case: &LoadCase) -> FEAResult<()> {
        if self.result.contains(case) {
            return Ok(());
        }
        self.result.set_model_warnings(self.check_warnings());
        self.result.add_analysis_result(&self.mesh, case)
    }

    /// Solve every load case of the model, one after the other
    ///
    /// Stops at the first failing case; cases solved before it keep their results.
    pub fn solve_all(&mut self) -> FEAResult<()> {
        self.result.set_model_warnings(self.check_warnings());
        for case in self.load_cases() {
            self.result
                .add_analysis_result_if_not_exists(&self.mesh, &case)?;
        }
        Ok(())
    }

    /// Solve every load case of the model in parallel
    pub fn solve_parallel(&mut self) -> FEAResult<()> {
        self.result.set_model_warnings(self.check_warnings());
        let cases = self.load_cases();
        self.result.add_analysis_results_parallel(&self.mesh, &cases)
    }

    // ========================
    // Result Access Methods
    // ========================

    pub fn results(&self) -> &StaticLinearAnalysisResult {
        &self.result
    }

    pub fn case_state(&self, case: &LoadCase) -> CaseState {
        self.result.state(case)
    }

    pub fn is_analyzed(&self, case: &LoadCase) -> bool {
        self.result.contains(case)
    }

    /// Get node displacement
    pub fn node_displacement(&self, node: NodeId, case: &LoadCase) -> FEAResult<NodeDisplacement> {
        self.mesh.node(node)?;
        Ok(self.result.get(case)?.node_displacement(node))
    }

    /// Get node reactions
    pub fn node_reactions(&self, node: NodeId, case: &LoadCase) -> FEAResult<Reactions> {
        self.mesh.node(node)?;
        Ok(self.result.get(case)?.node_reactions(node))
    }

    /// Global end forces of an element, `K_e * u_e - f_eq`
    pub fn element_end_forces(&self, label: &str, case: &LoadCase) -> FEAResult<DVector<f64>> {
        let index = self
            .mesh
            .find_element(label)
            .ok_or_else(|| FEAError::ElementNotFound(label.to_string()))?;
        self.result.element_end_forces(&self.mesh, index, case)
    }

    /// Get analysis summary
    pub fn summary(&self, case: &LoadCase) -> FEAResult<AnalysisSummary> {
        Ok(self.result.get(case)?.summary(&self.mesh))
    }

    /// Displacements of a named load combination, solving missing cases first
    pub fn combo_displacements(&mut self, combo_name: &str) -> FEAResult<DVector<f64>> {
        let combo = self.load_combo(combo_name)?.clone();
        self.result.combined_displacements(&self.mesh, &combo)
    }

    /// Support reactions of a named load combination, solving missing cases first
    pub fn combo_reactions(&mut self, combo_name: &str) -> FEAResult<DVector<f64>> {
        let combo = self.load_combo(combo_name)?.clone();
        self.result.combined_reactions(&self.mesh, &combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{FrameElement2Node, Material, Section};
    use approx::assert_relative_eq;

    fn cantilever() -> (Model, NodeId, NodeId) {
        let mut model = Model::new();
        let n1 = model
            .add_node(Node::new("N1", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
            .unwrap();
        let n2 = model.add_node(Node::new("N2", 10.0, 0.0, 0.0)).unwrap();
        model
            .add_element(FrameElement2Node::new(
                "M1",
                n1,
                n2,
                Material::steel(),
                Section::rectangular(0.3, 0.5),
            ))
            .unwrap();
        (model, n1, n2)
    }

    #[test]
    fn test_simple_cantilever() {
        let (mut model, n1, n2) = cantilever();
        model
            .add_nodal_load(n2, NodalLoad::fy(-10000.0, "Case 1"))
            .unwrap();
        let case = LoadCase::from("Case 1");
        model.solve(&case).unwrap();

        // PL^3 / 3EI about the local z axis
        let iz = 0.3 * 0.5_f64.powi(3) / 12.0;
        let expected = -10000.0 * 1000.0 / (3.0 * 200e9 * iz);
        let disp = model.node_displacement(n2, &case).unwrap();
        assert_relative_eq!(disp.dy, expected, max_relative = 1e-9);

        let rxn = model.node_reactions(n1, &case).unwrap();
        assert_relative_eq!(rxn.fy, 10000.0, max_relative = 1e-9);
        assert_relative_eq!(rxn.mz, 100000.0, max_relative = 1e-9);
        assert_eq!(model.case_state(&case), CaseState::Computed);
    }

    #[test]
    fn test_duplicate_node_label() {
        let (mut model, _, _) = cantilever();
        let err = model.add_node(Node::new("N1", 1.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, FEAError::DuplicateName(_)));
    }

    #[test]
    fn test_element_with_missing_node() {
        let (mut model, n1, _) = cantilever();
        let err = model
            .add_element(FrameElement2Node::new(
                "M2",
                n1,
                NodeId(7),
                Material::steel(),
                Section::rectangular(0.1, 0.1),
            ))
            .unwrap_err();
        assert!(matches!(err, FEAError::NodeNotFound(_)));
    }

    #[test]
    fn test_load_change_drops_only_that_case() {
        let (mut model, _, n2) = cantilever();
        let a = LoadCase::from("A");
        let b = LoadCase::from("B");
        model.add_nodal_load(n2, NodalLoad::fy(-1.0, "A")).unwrap();
        model.add_nodal_load(n2, NodalLoad::fx(1.0, "B")).unwrap();
        model.solve_all().unwrap();
        assert!(model.is_analyzed(&a) && model.is_analyzed(&b));

        model.add_nodal_load(n2, NodalLoad::fy(-1.0, "A")).unwrap();
        assert!(!model.is_analyzed(&a));
        assert!(model.is_analyzed(&b));
        assert_eq!(model.results().solver_cache().len(), 1);
    }

    #[test]
    fn test_topology_change_drops_everything() {
        let (mut model, _, n2) = cantilever();
        let case = LoadCase::from("A");
        model.add_nodal_load(n2, NodalLoad::fy(-1.0, "A")).unwrap();
        model.solve(&case).unwrap();

        model.add_node(Node::new("N3", 20.0, 0.0, 0.0)).unwrap();
        assert!(!model.is_analyzed(&case));
        assert!(model.results().solver_cache().is_empty());
        assert!(matches!(
            model.node_displacement(n2, &case),
            Err(FEAError::NotAnalyzed(_))
        ));
    }

    #[test]
    fn test_unconnected_node_warning() {
        let (mut model, _, _) = cantilever();
        model.add_node(Node::new("Lonely", 5.0, 5.0, 0.0)).unwrap();
        let warnings = model.check_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, DiagnosticKind::UnconnectedNode);
    }

    #[test]
    fn test_load_cases_are_collected_once() {
        let (mut model, n1, n2) = cantilever();
        model.add_nodal_load(n2, NodalLoad::fy(-1.0, "A")).unwrap();
        model.add_nodal_load(n2, NodalLoad::fx(1.0, "A")).unwrap();
        model
            .add_settlement(
                n1,
                Settlement::new(crate::loads::Displacement::translation(0.0, -0.01, 0.0), "S"),
            )
            .unwrap();
        let names: Vec<String> = model.load_cases().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["S".to_string(), "A".to_string()]);
    }
}
