//! Two-node 3D frame element (beam/column)

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{lookup, Element, Material, Node, NodeId, Section};
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementLoad, Force, LoadCase, LoadDirection};
use crate::math::{
    apply_fer_releases, apply_releases, fer_point_load, fer_uniform_load, member_local_stiffness,
    member_transformation_matrix, rotation_matrix, Mat12, Vec12, Vec3,
};

/// End releases of a frame element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReleases {
    /// i-node releases [DX, DY, DZ, RX, RY, RZ]
    pub i_node: [bool; 6],
    /// j-node releases [DX, DY, DZ, RX, RY, RZ]
    pub j_node: [bool; 6],
}

impl MemberReleases {
    const MOMENTS: [bool; 6] = [false, false, false, false, true, true];

    pub fn none() -> Self {
        Self::default()
    }

    /// Moment hinge at the i-node
    pub fn pin_i() -> Self {
        Self {
            i_node: Self::MOMENTS,
            j_node: [false; 6],
        }
    }

    /// Moment hinge at the j-node
    pub fn pin_j() -> Self {
        Self {
            i_node: [false; 6],
            j_node: Self::MOMENTS,
        }
    }

    /// Moment hinges at both ends
    pub fn pin_both() -> Self {
        Self {
            i_node: Self::MOMENTS,
            j_node: Self::MOMENTS,
        }
    }

    pub fn as_array(&self) -> [bool; 12] {
        let mut arr = [false; 12];
        arr[0..6].copy_from_slice(&self.i_node);
        arr[6..12].copy_from_slice(&self.j_node);
        arr
    }

    pub fn any(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }
}

/// Euler-Bernoulli frame element with axial, torsional and biaxial bending stiffness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameElement2Node {
    pub label: String,
    nodes: [NodeId; 2],
    pub material: Material,
    pub section: Section,
    /// Rotation of the section about the element axis (radians)
    pub rotation: f64,
    pub releases: MemberReleases,
    pub loads: Vec<ElementLoad>,
}

impl FrameElement2Node {
    pub fn new(
        label: &str,
        i_node: NodeId,
        j_node: NodeId,
        material: Material,
        section: Section,
    ) -> Self {
        Self {
            label: label.to_string(),
            nodes: [i_node, j_node],
            material,
            section,
            rotation: 0.0,
            releases: MemberReleases::none(),
            loads: Vec::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_releases(mut self, releases: MemberReleases) -> Self {
        self.releases = releases;
        self
    }

    pub fn with_load(mut self, load: impl Into<ElementLoad>) -> Self {
        self.loads.push(load.into());
        self
    }

    pub fn i_node(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn j_node(&self) -> NodeId {
        self.nodes[1]
    }

    fn end_coords(&self, nodes: &[Node]) -> FEAResult<([f64; 3], [f64; 3])> {
        let i = lookup(nodes, self.nodes[0], &self.label)?;
        let j = lookup(nodes, self.nodes[1], &self.label)?;
        Ok((i.coords(), j.coords()))
    }

    pub fn length(&self, nodes: &[Node]) -> FEAResult<f64> {
        let i = lookup(nodes, self.nodes[0], &self.label)?;
        let j = lookup(nodes, self.nodes[1], &self.label)?;
        Ok(i.distance_to(j))
    }

    /// Unreleased local stiffness matrix
    fn local_stiffness(&self, length: f64) -> Mat12 {
        let (m, s) = (&self.material, &self.section);
        member_local_stiffness(m.e, m.g, s.a, s.iy, s.iz, s.j, length)
    }

    /// Local stiffness matrix with end releases condensed out
    pub fn local_stiffness_matrix(&self, nodes: &[Node]) -> FEAResult<Mat12> {
        let k = self.local_stiffness(self.length(nodes)?);
        Ok(apply_releases(&k, &self.releases.as_array()))
    }

    pub fn transformation_matrix(&self, nodes: &[Node]) -> FEAResult<Mat12> {
        let (i, j) = self.end_coords(nodes)?;
        member_transformation_matrix(&i, &j, self.rotation)
    }

    /// Fixed end reactions of a load case in local coordinates
    pub fn local_fixed_end_reactions(&self, nodes: &[Node], case: &LoadCase) -> FEAResult<Vec12> {
        let (i, j) = self.end_coords(nodes)?;
        let length = self.length(nodes)?;
        let r = rotation_matrix(&i, &j, self.rotation)?;
        let axes: Vec<Vec3> = (0..3).map(|k| r.row(k).transpose()).collect();

        let mut fer = Vec12::zeros();
        for load in self.loads.iter().filter(|l| l.case() == case) {
            let (magnitude, direction, position) = match load {
                ElementLoad::Point(p) => (p.magnitude, p.direction, Some(p.position)),
                ElementLoad::Distributed(d) => (d.w, d.direction, None),
            };
            if let Some(a) = position {
                if !(0.0..=length).contains(&a) {
                    return Err(FEAError::InvalidInput(format!(
                        "point load at {} lies outside element '{}' of length {}",
                        a, self.label, length
                    )));
                }
            }

            for (axis, component) in local_components(magnitude, direction, &axes) {
                if component == 0.0 {
                    continue;
                }
                fer += match position {
                    Some(a) => fer_point_load(component, a, length, axis),
                    None => fer_uniform_load(component, length, axis),
                };
            }
        }

        let k = self.local_stiffness(length);
        Ok(apply_fer_releases(&fer, &k, &self.releases.as_array()))
    }

    /// End forces of [`Element::end_forces`] rotated into local coordinates
    pub fn local_end_forces(&self, nodes: &[Node], global: &DVector<f64>) -> FEAResult<Vec12> {
        if global.len() != 12 {
            return Err(FEAError::InvalidInput(format!(
                "expected 12 end forces for element '{}', got {}",
                self.label,
                global.len()
            )));
        }
        let t = self.transformation_matrix(nodes)?;
        Ok(t * Vec12::from_column_slice(global.as_slice()))
    }
}

/// Split a load into local components: (local index, value)
///
/// `axes` are the local x, y, z unit vectors in global coordinates.
fn local_components(magnitude: f64, direction: LoadDirection, axes: &[Vec3]) -> Vec<(usize, f64)> {
    match direction {
        LoadDirection::Fx => vec![(0, magnitude)],
        LoadDirection::Fy => vec![(1, magnitude)],
        LoadDirection::Fz => vec![(2, magnitude)],
        LoadDirection::Mx => vec![(3, magnitude)],
        global => {
            let g = global.global_axis().map(Vec3::from).unwrap_or_else(Vec3::zeros) * magnitude;
            axes.iter().enumerate().map(|(k, axis)| (k, axis.dot(&g))).collect()
        }
    }
}

impl Element for FrameElement2Node {
    fn label(&self) -> &str {
        &self.label
    }

    fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn load_cases(&self) -> Vec<LoadCase> {
        let mut cases: Vec<LoadCase> = Vec::new();
        for load in &self.loads {
            if !cases.contains(load.case()) {
                cases.push(load.case().clone());
            }
        }
        cases
    }

    fn global_stiffness_matrix(&self, nodes: &[Node]) -> FEAResult<DMatrix<f64>> {
        let k = self.local_stiffness_matrix(nodes)?;
        let t = self.transformation_matrix(nodes)?;
        let kg = t.transpose() * k * t;
        Ok(DMatrix::from_column_slice(12, 12, kg.as_slice()))
    }

    fn global_equivalent_nodal_loads(
        &self,
        nodes: &[Node],
        case: &LoadCase,
    ) -> FEAResult<Vec<Force>> {
        let fer = self.local_fixed_end_reactions(nodes, case)?;
        let t = self.transformation_matrix(nodes)?;
        let f = -(t.transpose() * fer);
        Ok(vec![
            Force::new(f[0], f[1], f[2], f[3], f[4], f[5]),
            Force::new(f[6], f[7], f[8], f[9], f[10], f[11]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::{DistributedLoad, PointLoad};
    use approx::assert_relative_eq;

    fn beam(length: f64) -> (Vec<Node>, FrameElement2Node) {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0), Node::new("B", length, 0.0, 0.0)];
        let element = FrameElement2Node::new(
            "M1",
            NodeId(0),
            NodeId(1),
            Material::unit(),
            Section::new(1.0, 1.0, 1.0, 1.0),
        );
        (nodes, element)
    }

    #[test]
    fn test_global_stiffness_is_symmetric() {
        let nodes = vec![Node::new("A", 0.0, 0.0, 0.0), Node::new("B", 3.0, 4.0, 2.0)];
        let element = FrameElement2Node::new(
            "M",
            NodeId(0),
            NodeId(1),
            Material::steel(),
            Section::default(),
        )
        .with_rotation(0.4);
        let k = element.global_stiffness_matrix(&nodes).unwrap();
        assert_eq!(k.shape(), (12, 12));
        assert!((&k - k.transpose()).amax() <= 1e-9 * k.amax());
    }

    #[test]
    fn test_gravity_load_splits_to_both_ends() {
        let (nodes, element) = beam(4.0);
        let element = element.with_load(DistributedLoad::gravity(2.0, "D"));
        let f = element
            .global_equivalent_nodal_loads(&nodes, &LoadCase::from("D"))
            .unwrap();
        assert_relative_eq!(f[0].fy, -4.0, epsilon = 1e-12);
        assert_relative_eq!(f[1].fy, -4.0, epsilon = 1e-12);
        // wL^2/12 end moments of opposite sign
        assert_relative_eq!(f[0].mz, -8.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(f[1].mz, 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_loads_of_other_cases_are_ignored() {
        let (nodes, element) = beam(4.0);
        let element = element.with_load(PointLoad::axial(5.0, 1.0, "L"));
        let f = element
            .global_equivalent_nodal_loads(&nodes, &LoadCase::from("D"))
            .unwrap();
        assert_eq!(f[0], Force::ZERO);
        assert_eq!(f[1], Force::ZERO);
    }

    #[test]
    fn test_point_load_outside_element_is_rejected() {
        let (nodes, element) = beam(4.0);
        let element = element.with_load(PointLoad::downward(1.0, 5.0, "D"));
        let err = element
            .global_equivalent_nodal_loads(&nodes, &LoadCase::from("D"))
            .unwrap_err();
        assert!(matches!(err, FEAError::InvalidInput(_)));
    }

    #[test]
    fn test_end_forces_of_rigid_body_motion_vanish() {
        let (nodes, element) = beam(2.0);
        let mut u = DVector::zeros(12);
        u[1] = 0.5;
        u[7] = 0.5;
        let f = element.end_forces(&nodes, &u, &LoadCase::default()).unwrap();
        assert_relative_eq!(f.norm(), 0.0, epsilon = 1e-12);
    }
}
