//! fea-static - static linear finite element analysis
//!
//! A 3D structural analysis pipeline supporting:
//! - Frame and truss elements with element loads
//! - Node supports with per-load-case settlements
//! - Multi-point constraints (hinge, rigid, telepathy links and virtual supports)
//!   eliminated by master/slave substitution
//! - Pluggable sparse solvers (skyline Cholesky, PCG with SSOR) whose
//!   factorizations are reused across load cases with the same constraint topology
//! - Parallel solution of independent load cases
//!
//! ## Example
//! ```rust
//! use fea_static::prelude::*;
//!
//! let mut model = Model::new();
//!
//! // 10m cantilever fixed at N1
//! let n1 = model
//!     .add_node(Node::new("N1", 0.0, 0.0, 0.0).with_constraints(Constraints::fixed()))
//!     .unwrap();
//! let n2 = model.add_node(Node::new("N2", 10.0, 0.0, 0.0)).unwrap();
//!
//! let section = Section::new(7.65e-3, 17.3e-6, 204e-6, 0.3e-6);
//! model
//!     .add_element(FrameElement2Node::new("M1", n1, n2, Material::steel(), section))
//!     .unwrap();
//!
//! // Loads
//! model.add_nodal_load(n2, NodalLoad::fy(-10000.0, "Dead")).unwrap();
//!
//! // Analyze
//! let dead = LoadCase::from("Dead");
//! model.solve(&dead).unwrap();
//!
//! // Get results
//! let displacement = model.node_displacement(n2, &dead).unwrap();
//! assert!(displacement.dy < 0.0);
//! ```

pub mod analysis;
pub mod assembly;
pub mod diagnostics;
pub mod dof_map;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod mpc;
pub mod partition;
pub mod permutation;
pub mod results;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, SolverType};
    pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
    pub use crate::elements::{
        Constraints, Dof, DofConstraint, Element, FrameElement2Node, Material, MemberReleases,
        Node, NodeId, Section, TrussElement,
    };
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::loads::{
        Displacement, DistributedLoad, Force, LoadCase, LoadCombination, LoadDirection, LoadType,
        NodalLoad, PointLoad, Settlement,
    };
    pub use crate::model::{Mesh, Model};
    pub use crate::mpc::{
        Applicability, HingeLink, MpcElement, RigidLink, TelepathyLink, VirtualConstraint,
    };
    pub use crate::results::{
        AnalysisSummary, CaseState, NodeDisplacement, Reactions, StaticLinearAnalysisResult,
    };
    pub use crate::solver::{
        CholeskySolverFactory, PcgSolverFactory, Solver, SolverError, SolverFactory,
    };
}
