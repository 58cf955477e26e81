//! Error types for the static analysis engine

use thiserror::Error;

use crate::solver::SolverError;

/// Main error type for FEA operations
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Element '{0}' not found in model")]
    ElementNotFound(String),

    #[error("Load case '{0}' not found in model")]
    LoadCaseNotFound(String),

    #[error("Load combination '{0}' not found in model")]
    LoadCombinationNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No results for load case '{0}' - run the analysis first")]
    NotAnalyzed(String),

    /// Two constraint equations compete for the same DoF, or a prescribed
    /// value targets a DoF that is already fixed.
    #[error("Constraint conflict on DoF {dof} in load case '{load_case}' (elements: {})", elements.join(", "))]
    ConstraintConflict {
        load_case: String,
        dof: String,
        elements: Vec<String>,
    },

    /// Zero stiffness on a free DoF or linearly dependent constraint rows.
    /// Only raised as an error in strict mode; otherwise it is a diagnostic.
    #[error("Structural singularity in load case '{load_case}': {message}")]
    StructuralSingularity { load_case: String, message: String },

    #[error("Solver failed for load case '{load_case}': {reason}")]
    SolverFailure {
        load_case: String,
        reason: SolverError,
        residual: Option<f64>,
    },

    /// A cached solver was fetched for a DoF layout it was not built for.
    #[error("Cached solver topology mismatch: built for {expected} free DoFs, requested for {found}")]
    TopologyMismatch { expected: usize, found: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for FEA operations
pub type FEAResult<T> = Result<T, FEAError>;
