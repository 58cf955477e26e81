//! Linear solvers for the released-released block
//!
//! A [`SolverFactory`] turns a sparse matrix into a [`Solver`]; the solver is
//! initialized once (factorization, preconditioner setup) and then solves any
//! number of right-hand sides. [`SolverCache`] keeps initialized solvers keyed
//! by the master map of the constraint topology they were built for.

mod cache;
mod cholesky;
mod pcg;

use std::sync::Arc;

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{AnalysisOptions, SolverType};

pub use cache::{CachedSolver, SolverCache};
pub use cholesky::CholeskySolver;
pub use pcg::PcgSolver;

/// Failures of the linear solvers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("solver used before initialize()")]
    NotInitialized,

    #[error("matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error("matrix is not positive definite (pivot at row {row})")]
    NotPositiveDefinite { row: usize },

    #[error("missing or zero diagonal at row {row}")]
    MissingDiagonal { row: usize },

    #[error("no convergence after {iterations} iterations (relative residual {residual:e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("right-hand side has {found} rows, system has {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid solver parameter: {0}")]
    InvalidParameter(String),

    #[error("iteration broke down: {0}")]
    Breakdown(String),
}

/// Outcome of a successful solve
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SolveReport {
    /// Iterations used, 0 for direct solvers
    pub iterations: usize,
    /// Relative residual `|A x - b| / |b|`
    pub residual: f64,
}

/// A linear solver bound to one matrix
pub trait Solver: Send + Sync {
    fn is_initialized(&self) -> bool;

    /// Factorize or set up the preconditioner. Calling it again is a no-op.
    fn initialize(&mut self) -> Result<(), SolverError>;

    /// Solve `A x = b`. `x` is resized to the system dimension.
    fn solve(&self, b: &DVector<f64>, x: &mut DVector<f64>) -> Result<SolveReport, SolverError>;

    /// Number of unknowns
    fn dimension(&self) -> usize;
}

/// Creates solvers for released-released blocks
pub trait SolverFactory: Send + Sync {
    fn create_solver(&self, a: CsrMatrix<f64>) -> Box<dyn Solver>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CholeskySolverFactory;

impl SolverFactory for CholeskySolverFactory {
    fn create_solver(&self, a: CsrMatrix<f64>) -> Box<dyn Solver> {
        Box::new(CholeskySolver::new(a))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PcgSolverFactory {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub omega: f64,
}

impl Default for PcgSolverFactory {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 5000,
            omega: 1.0,
        }
    }
}

impl SolverFactory for PcgSolverFactory {
    fn create_solver(&self, a: CsrMatrix<f64>) -> Box<dyn Solver> {
        Box::new(PcgSolver::new(a, self.tolerance, self.max_iterations, self.omega))
    }
}

/// Built-in factory selected by the analysis options
pub fn factory_for(options: &AnalysisOptions) -> Arc<dyn SolverFactory> {
    match options.solver {
        SolverType::Cholesky => Arc::new(CholeskySolverFactory),
        SolverType::ConjugateGradient => Arc::new(PcgSolverFactory {
            tolerance: options.tolerance,
            max_iterations: options.max_iterations,
            omega: options.ssor_omega,
        }),
    }
}

/// Relative residual `|A x - b| / |b|` (absolute when `b` is zero)
pub(crate) fn relative_residual(a: &CsrMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let r = crate::math::sparse_matvec(a, x) - b;
    let scale = b.norm();
    if scale > 0.0 {
        r.norm() / scale
    } else {
        r.norm()
    }
}
