//! Initialized solvers keyed by constraint topology

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use nalgebra_sparse::CsrMatrix;

use super::{Solver, SolverFactory};
use crate::error::{FEAError, FEAResult};
use crate::mpc::MasterMap;

/// An initialized solver together with the master map it was built for
pub struct CachedSolver {
    pub master_map: MasterMap,
    pub solver: Box<dyn Solver>,
}

impl CachedSolver {
    /// Check that this solver fits `map`
    pub fn verify(&self, map: &MasterMap) -> FEAResult<()> {
        if self.solver.dimension() != map.free_count() || self.master_map != *map {
            return Err(FEAError::TopologyMismatch {
                expected: self.solver.dimension(),
                found: map.free_count(),
            });
        }
        Ok(())
    }
}

/// Model-scoped solver cache
///
/// Load cases whose constraint topology matches reuse one factorization.
/// The cache is cleared whenever the model topology changes.
#[derive(Default)]
pub struct SolverCache {
    entries: HashMap<MasterMap, CachedSolver>,
    hits: usize,
    misses: usize,
}

impl SolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, map: &MasterMap) -> bool {
        self.entries.contains_key(map)
    }

    /// Cache hits and misses since the last clear
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Fetch an initialized solver for `map`
    pub fn get(&self, map: &MasterMap) -> FEAResult<Option<&dyn Solver>> {
        match self.entries.get(map) {
            Some(entry) => {
                entry.verify(map)?;
                Ok(Some(entry.solver.as_ref()))
            }
            None => Ok(None),
        }
    }

    /// Fetch the solver for `map`, creating and initializing it on a miss
    ///
    /// `matrix` is only called on a miss.
    pub fn get_or_create(
        &mut self,
        map: &MasterMap,
        factory: &dyn SolverFactory,
        load_case: &str,
        matrix: impl FnOnce() -> CsrMatrix<f64>,
    ) -> FEAResult<&dyn Solver> {
        let entry = match self.entries.entry(map.clone()) {
            Entry::Occupied(occupied) => {
                self.hits += 1;
                log::debug!("solver cache hit for load case '{}'", load_case);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                self.misses += 1;
                log::debug!("solver cache miss for load case '{}'", load_case);
                let mut solver = factory.create_solver(matrix());
                if solver.dimension() != map.free_count() {
                    return Err(FEAError::TopologyMismatch {
                        expected: solver.dimension(),
                        found: map.free_count(),
                    });
                }
                solver
                    .initialize()
                    .map_err(|reason| FEAError::SolverFailure {
                        load_case: load_case.to_string(),
                        reason,
                        residual: None,
                    })?;
                vacant.insert(CachedSolver {
                    master_map: map.clone(),
                    solver,
                })
            }
        };
        entry.verify(map)?;
        Ok(entry.solver.as_ref())
    }

    pub fn remove(&mut self, map: &MasterMap) -> Option<CachedSolver> {
        self.entries.remove(map)
    }
}
