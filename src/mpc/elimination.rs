//! Merging of MPC rows into a consistent DoF classification
//!
//! Rows are processed element by element in insertion order. Each row first
//! has the known slave expressions substituted in, then eliminates one DoF:
//! the released, unclaimed DoF with the largest coefficient (ties go to the
//! highest global index). A row left with a single term pins that DoF to a
//! known value instead. Every new slave is substituted back into the earlier
//! expressions, so slaves only ever refer to free or fixed DoFs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MpcElement;
use crate::diagnostics::{dof_name, Diagnostic, DiagnosticKind};
use crate::elements::{Node, DOFS_PER_NODE};
use crate::error::{FEAError, FEAResult};
use crate::loads::LoadCase;

/// Relative size below which a coefficient counts as zero
const DROP_TOLERANCE: f64 = 1e-12;

/// Classification of one global DoF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DofKind {
    /// Unknown of the reduced system
    Free,
    /// Value known before solving (support or pinned by a constraint row)
    Fixed,
    /// Value follows from other DoFs through a constraint row
    Slave,
}

/// `u_s = sum(c_j * u_j) + constant`, every `j` free or fixed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlaveExpression {
    /// Master DoFs in ascending order with their coefficients
    pub terms: Vec<(usize, f64)>,
    pub constant: f64,
}

impl SlaveExpression {
    pub fn evaluate(&self, u: &[f64]) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, &(j, c)| acc + c * u[j])
    }
}

/// Structural fingerprint of a constraint system
///
/// Two load cases with equal master maps share the same reduced stiffness
/// matrix and therefore the same factorization. Constant terms are excluded:
/// they only affect the right-hand side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MasterMap {
    kinds: Vec<DofKind>,
    slaves: Vec<(usize, Vec<(usize, u64)>)>,
}

impl MasterMap {
    pub fn total_dofs(&self) -> usize {
        self.kinds.len()
    }

    pub fn free_count(&self) -> usize {
        self.kinds.iter().filter(|k| **k == DofKind::Free).count()
    }

    pub fn slave_count(&self) -> usize {
        self.slaves.len()
    }
}

/// Working form of a slave expression
#[derive(Debug, Clone, Default)]
struct Expr {
    terms: BTreeMap<usize, f64>,
    constant: f64,
}

impl Expr {
    /// Replace `dof` by `with`, if present
    fn substitute(&mut self, dof: usize, with: &Expr) {
        let Some(b) = self.terms.remove(&dof) else {
            return;
        };
        for (&j, &c) in &with.terms {
            *self.terms.entry(j).or_insert(0.0) += b * c;
        }
        self.constant += b * with.constant;
        prune(&mut self.terms);
    }
}

fn prune(terms: &mut BTreeMap<usize, f64>) {
    let max = terms.values().fold(0.0_f64, |m, a| m.max(a.abs()));
    terms.retain(|_, a| a.abs() > DROP_TOLERANCE * max);
}

fn names(nodes: &[Node], dofs: &[usize]) -> String {
    dofs.iter()
        .map(|&d| dof_name(nodes, d))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Labels of the current element and of whatever claimed `dofs` before it
fn claimants(
    label: &str,
    owner: &[Option<String>],
    nodes: &[Node],
    dofs: &[usize],
) -> Vec<String> {
    let mut labels = vec![label.to_string()];
    for &d in dofs {
        let claimed_by = owner[d]
            .clone()
            .unwrap_or_else(|| format!("support of node {}", dof_name(nodes, d)));
        if !labels.contains(&claimed_by) {
            labels.push(claimed_by);
        }
    }
    labels
}

/// DoF classification of a model for one load case
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    pub kinds: Vec<DofKind>,
    /// Prescribed values, meaningful at fixed DoFs
    pub known_values: Vec<f64>,
    pub slaves: BTreeMap<usize, SlaveExpression>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConstraintSystem {
    /// Classify the DoFs of `nodes` under the MPC elements applicable to `case`
    pub fn build(
        nodes: &[Node],
        mpc_elements: &[Box<dyn MpcElement>],
        case: &LoadCase,
    ) -> FEAResult<Self> {
        let total = nodes.len() * DOFS_PER_NODE;
        let mut kinds = vec![DofKind::Free; total];
        let mut known_values = vec![0.0; total];
        // Label of the MPC element that claimed each DoF; None for node supports
        let mut owner: Vec<Option<String>> = vec![None; total];

        for (n, node) in nodes.iter().enumerate() {
            let settlement = node.total_settlement(case).as_array();
            for (local, c) in node.constraints.as_array().iter().enumerate() {
                if c.is_fixed() {
                    let dof = n * DOFS_PER_NODE + local;
                    kinds[dof] = DofKind::Fixed;
                    known_values[dof] = settlement[local];
                }
            }
        }

        let mut slaves: BTreeMap<usize, Expr> = BTreeMap::new();
        let mut diagnostics = Vec::new();

        for element in mpc_elements.iter().filter(|e| e.applies_to(case)) {
            let label = element.label();
            let eqs = element.extra_equations(nodes, total)?;
            if eqs.ncols() != total + 1 || eqs.nrows() != element.extra_equations_count(nodes) {
                return Err(FEAError::InvalidInput(format!(
                    "MPC element '{}' returned a {}x{} equation matrix, expected {}x{}",
                    label,
                    eqs.nrows(),
                    eqs.ncols(),
                    element.extra_equations_count(nodes),
                    total + 1
                )));
            }

            for r in 0..eqs.nrows() {
                let lane = eqs.row(r);
                let mut row = Expr::default();
                for (&col, &val) in lane.col_indices().iter().zip(lane.values()) {
                    if col == total {
                        row.constant += val;
                    } else {
                        *row.terms.entry(col).or_insert(0.0) += val;
                    }
                }
                let original: Vec<usize> = row.terms.keys().copied().collect();
                let scale = row.terms.values().fold(0.0_f64, |m, a| m.max(a.abs()));
                if scale == 0.0 {
                    return Err(FEAError::InvalidInput(format!(
                        "MPC element '{}' emitted an empty equation row {}",
                        label, r
                    )));
                }
                let constant_scale = scale.max(row.constant.abs());

                for (&s, expr) in &slaves {
                    row.substitute(s, expr);
                }
                row.terms.retain(|_, a| a.abs() > DROP_TOLERANCE * scale);

                if row.terms.is_empty() {
                    if row.constant.abs() <= DROP_TOLERANCE * constant_scale {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::DependentConstraint,
                            Some(case),
                            format!(
                                "row {} of MPC element '{}' on {} is linearly dependent on earlier rows",
                                r,
                                label,
                                names(nodes, &original)
                            ),
                        ));
                        continue;
                    }
                    return Err(FEAError::ConstraintConflict {
                        load_case: case.name.clone(),
                        dof: names(nodes, &original),
                        elements: claimants(label, &owner, nodes, &original),
                    });
                }

                let mut single = row.terms.iter();
                if let (Some((&dof, &a)), None) = (single.next(), single.next()) {
                    if kinds[dof] != DofKind::Free {
                        return Err(FEAError::ConstraintConflict {
                            load_case: case.name.clone(),
                            dof: dof_name(nodes, dof),
                            elements: claimants(label, &owner, nodes, &[dof]),
                        });
                    }
                    kinds[dof] = DofKind::Fixed;
                    known_values[dof] = row.constant / a;
                    owner[dof] = Some(label.to_string());
                    continue;
                }

                let mut pivot: Option<(usize, f64)> = None;
                for (&j, &a) in &row.terms {
                    if kinds[j] != DofKind::Free {
                        continue;
                    }
                    if pivot.map_or(true, |(_, best)| a.abs() >= best.abs()) {
                        pivot = Some((j, a));
                    }
                }
                let Some((p, a_p)) = pivot else {
                    // Every remaining term is on a known DoF: the row either holds or contradicts
                    let dofs: Vec<usize> = row.terms.keys().copied().collect();
                    let lhs: f64 = row.terms.iter().map(|(&j, &a)| a * known_values[j]).sum();
                    let known_scale = row
                        .terms
                        .iter()
                        .fold(constant_scale, |m, (&j, &a)| m.max((a * known_values[j]).abs()));
                    if (lhs - row.constant).abs() <= DROP_TOLERANCE * known_scale {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::DependentConstraint,
                            Some(case),
                            format!(
                                "row {} of MPC element '{}' on {} already holds for the supported DoFs",
                                r,
                                label,
                                names(nodes, &dofs)
                            ),
                        ));
                        continue;
                    }
                    return Err(FEAError::ConstraintConflict {
                        load_case: case.name.clone(),
                        dof: names(nodes, &dofs),
                        elements: claimants(label, &owner, nodes, &dofs),
                    });
                };

                let expr = Expr {
                    terms: row
                        .terms
                        .iter()
                        .filter(|&(&j, _)| j != p)
                        .map(|(&j, &a)| (j, -a / a_p))
                        .collect(),
                    constant: row.constant / a_p,
                };
                for earlier in slaves.values_mut() {
                    earlier.substitute(p, &expr);
                }
                slaves.insert(p, expr);
                kinds[p] = DofKind::Slave;
                owner[p] = Some(label.to_string());
            }
        }

        log::debug!(
            "load case '{}': {} fixed, {} slave, {} free DoFs",
            case.name,
            kinds.iter().filter(|k| **k == DofKind::Fixed).count(),
            slaves.len(),
            kinds.iter().filter(|k| **k == DofKind::Free).count()
        );

        let slaves = slaves
            .into_iter()
            .map(|(s, e)| {
                (
                    s,
                    SlaveExpression {
                        terms: e.terms.into_iter().collect(),
                        constant: e.constant,
                    },
                )
            })
            .collect();

        Ok(Self {
            kinds,
            known_values,
            slaves,
            diagnostics,
        })
    }

    pub fn master_map(&self) -> MasterMap {
        MasterMap {
            kinds: self.kinds.clone(),
            slaves: self
                .slaves
                .iter()
                .map(|(&s, e)| (s, e.terms.iter().map(|&(j, c)| (j, c.to_bits())).collect()))
                .collect(),
        }
    }
}
