//! DoF classification and reduced index maps of one load case

use std::collections::BTreeMap;

use crate::diagnostics::Diagnostic;
use crate::elements::{Node, DOFS_PER_NODE};
use crate::error::FEAResult;
use crate::loads::LoadCase;
use crate::model::Mesh;
use crate::mpc::{ConstraintSystem, DofKind, MasterMap, MpcElement, SlaveExpression};

/// Index maps between the natural (node-major) DoF order and the reduced order
///
/// The reduced order lists the free DoFs first, then the known (fixed) DoFs,
/// each group in ascending global order. Slave DoFs have no reduced index.
#[derive(Debug, Clone)]
pub struct DofMap {
    pub load_case: LoadCase,
    /// Classification of every global DoF
    pub fixity: Vec<DofKind>,
    /// Reduced index -> global DoF
    pub rmap1: Vec<usize>,
    /// Free subset -> reduced index (identity)
    pub rmap2: Vec<usize>,
    /// Known subset -> reduced index (`m + j`)
    pub rmap3: Vec<usize>,
    /// Number of free DoFs
    pub m: usize,
    /// Prescribed value of every known DoF, in `rmap3` order
    pub known_values: Vec<f64>,
    pub slaves: BTreeMap<usize, SlaveExpression>,
    pub master_map: MasterMap,
    pub diagnostics: Vec<Diagnostic>,
    /// Global DoF -> reduced index
    reduced_index: Vec<Option<usize>>,
}

impl DofMap {
    /// Classify the DoFs of `mesh` for `case` and build the index maps
    pub fn create(mesh: &Mesh, case: &LoadCase) -> FEAResult<Self> {
        Self::from_parts(&mesh.nodes, &mesh.mpc_elements, case)
    }

    pub fn from_parts(
        nodes: &[Node],
        mpc_elements: &[Box<dyn MpcElement>],
        case: &LoadCase,
    ) -> FEAResult<Self> {
        let system = ConstraintSystem::build(nodes, mpc_elements, case)?;
        let master_map = system.master_map();

        let free: Vec<usize> = (0..system.kinds.len())
            .filter(|&d| system.kinds[d] == DofKind::Free)
            .collect();
        let known: Vec<usize> = (0..system.kinds.len())
            .filter(|&d| system.kinds[d] == DofKind::Fixed)
            .collect();
        let m = free.len();

        let mut rmap1 = free;
        rmap1.extend_from_slice(&known);
        let mut reduced_index = vec![None; system.kinds.len()];
        for (r, &g) in rmap1.iter().enumerate() {
            reduced_index[g] = Some(r);
        }

        Ok(Self {
            load_case: case.clone(),
            rmap2: (0..m).collect(),
            rmap3: (m..rmap1.len()).collect(),
            known_values: known.iter().map(|&d| system.known_values[d]).collect(),
            m,
            rmap1,
            fixity: system.kinds,
            slaves: system.slaves,
            master_map,
            diagnostics: system.diagnostics,
            reduced_index,
        })
    }

    /// Number of global DoFs (`6N`)
    pub fn total_dofs(&self) -> usize {
        self.fixity.len()
    }

    /// Size of the reduced system (free + known)
    pub fn reduced_size(&self) -> usize {
        self.rmap1.len()
    }

    pub fn known_count(&self) -> usize {
        self.rmap3.len()
    }

    pub fn has_slaves(&self) -> bool {
        !self.slaves.is_empty()
    }

    /// Reduced index of a global DoF, `None` for slaves
    pub fn reduced_index(&self, dof: usize) -> Option<usize> {
        self.reduced_index.get(dof).copied().flatten()
    }

    /// Global DoF of the `j`-th known DoF
    pub fn known_dof(&self, j: usize) -> usize {
        self.rmap1[self.rmap3[j]]
    }

    /// Node index and local DoF of a global DoF
    pub fn node_of(dof: usize) -> (usize, usize) {
        (dof / DOFS_PER_NODE, dof % DOFS_PER_NODE)
    }
}
