//! Analysis options

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FEAResult;

/// Built-in linear solver used for the released-released block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverType {
    /// Sparse skyline Cholesky factorization (reused across load cases)
    Cholesky,
    /// Preconditioned Conjugate Gradient with an SSOR preconditioner
    ConjugateGradient,
}

impl Default for SolverType {
    fn default() -> Self {
        Self::Cholesky
    }
}

/// Options for static linear analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Built-in solver kind
    pub solver: SolverType,
    /// Relative residual tolerance for the iterative solver
    pub tolerance: f64,
    /// Iteration cap for the iterative solver
    pub max_iterations: usize,
    /// SSOR relaxation factor, must lie in (0, 2)
    pub ssor_omega: f64,
    /// Escalate structural singularity warnings to errors
    pub strict: bool,
    /// Log the equilibrium residual after each load case
    pub check_statics: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            solver: SolverType::Cholesky,
            tolerance: 1e-10,
            max_iterations: 5000,
            ssor_omega: 1.0,
            strict: false,
            check_statics: false,
        }
    }
}

impl AnalysisOptions {
    /// Options using the direct Cholesky solver
    pub fn cholesky() -> Self {
        Self::default()
    }

    /// Options using the PCG iterative solver
    pub fn conjugate_gradient() -> Self {
        Self {
            solver: SolverType::ConjugateGradient,
            ..Self::default()
        }
    }

    /// Enable strict mode
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Enable the statics check
    pub fn with_statics_check(mut self) -> Self {
        self.check_statics = true;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the SSOR relaxation factor
    pub fn with_ssor_omega(mut self, omega: f64) -> Self {
        self.ssor_omega = omega;
        self
    }

    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> FEAResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> FEAResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts = AnalysisOptions::from_json_str(r#"{ "solver": "ConjugateGradient", "strict": true }"#)
            .unwrap();
        assert_eq!(opts.solver, SolverType::ConjugateGradient);
        assert!(opts.strict);
        assert_eq!(opts.max_iterations, 5000);
        assert_eq!(opts.ssor_omega, 1.0);
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let err = AnalysisOptions::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::error::FEAError::SerializationError(_)));
    }
}
