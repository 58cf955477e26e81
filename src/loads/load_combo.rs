//! Load combinations

use serde::{Deserialize, Serialize};

use super::LoadCase;

/// A load combination: a factored sum of load cases.
///
/// Results of a combination are the same factored sum of the case results,
/// which holds because the analysis is linear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCombination {
    /// Name of the load combination
    pub name: String,
    /// Factors for each load case
    pub factors: Vec<(LoadCase, f64)>,
}

impl LoadCombination {
    /// Create a new load combination
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            factors: Vec::new(),
        }
    }

    /// Create a load combination with a single load case at factor 1.0
    pub fn single(name: &str, case: LoadCase) -> Self {
        Self::new(name).with_case(case, 1.0)
    }

    /// Add a load case with a factor; adding a case twice accumulates the factor
    pub fn with_case(mut self, case: LoadCase, factor: f64) -> Self {
        match self.factors.iter_mut().find(|(c, _)| *c == case) {
            Some((_, f)) => *f += factor,
            None => self.factors.push((case, factor)),
        }
        self
    }

    /// Get the factor for a load case
    pub fn factor(&self, case: &LoadCase) -> f64 {
        self.factors
            .iter()
            .find(|(c, _)| c == case)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Load cases with a non-negligible factor
    pub fn cases(&self) -> impl Iterator<Item = &LoadCase> {
        self.factors
            .iter()
            .filter(|(_, f)| f.abs() > 1e-10)
            .map(|(c, _)| c)
    }

    /// 1.2 dead + 1.6 live
    pub fn lrfd_dead_live(dead: LoadCase, live: LoadCase) -> Self {
        Self::new("1.2D + 1.6L")
            .with_case(dead, 1.2)
            .with_case(live, 1.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factors_accumulate() {
        let d = LoadCase::dead("D");
        let combo = LoadCombination::new("C")
            .with_case(d.clone(), 1.0)
            .with_case(d.clone(), 0.5);
        assert_eq!(combo.factor(&d), 1.5);
        assert_eq!(combo.factor(&LoadCase::live("L")), 0.0);
        assert_eq!(combo.cases().count(), 1);
    }
}
