// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tessellation integration: fan every convex piece into tetrahedra around
//! its centroid and concatenate collapsed simplex rules.

use super::gauss::tet_rule;
use super::{CellIntegrator, IntegrationRule};
use crate::error::{EntityRef, Result};
use crate::geometry::polygon;
use crate::geometry::robust_predicates::oriented_volume;
use crate::mesh::ConvexPiece;
use nalgebra::Point3;

/// Tetrahedra filling a convex piece
pub fn tetrahedra(piece: &ConvexPiece) -> Vec<[Point3<f64>; 4]> {
    let center = piece.centroid();
    let mut tets = Vec::new();
    for face in &piece.faces {
        for tri in polygon::fan_triangles(&face.points) {
            let tet = [center, tri[0], tri[1], tri[2]];
            if oriented_volume(&tet[0], &tet[1], &tet[2], &tet[3]) != 0.0 {
                tets.push(tet);
            }
        }
    }
    tets
}

#[derive(Debug, Clone)]
pub struct Tessellation {
    degree: usize,
}

impl Tessellation {
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }
}

impl CellIntegrator for Tessellation {
    fn name(&self) -> &'static str {
        "tessellation"
    }

    fn integrate_cell(&self, pieces: &[ConvexPiece], _cell: EntityRef) -> Result<IntegrationRule> {
        let mut rule = IntegrationRule::new();
        for piece in pieces {
            for tet in tetrahedra(piece) {
                rule.extend(tet_rule(&tet, self.degree));
            }
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ElementShape, Plane};
    use crate::mesh::FaceOrigin;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_wedge_cut_off_cube() {
        let corners: Vec<Point3<f64>> = ElementShape::Hex8
            .reference_nodes()
            .iter()
            .map(|p| Point3::new((p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0, (p.z + 1.0) / 2.0))
            .collect();
        let cube =
            ConvexPiece::from_element(ElementShape::Hex8, &corners, &[0, 1, 2, 3, 4, 5, 6, 7], 1e-12)
                .unwrap();
        let plane = Plane::through(&Point3::new(1.0, 0.0, 0.0), &Vector3::new(1.0, 1.0, 0.0)).unwrap();
        let (back, _) = cube.split(&plane, FaceOrigin::CutPlane(0), 1e-12);
        let rule = Tessellation::new(2)
            .integrate_cell(&[back.unwrap()], EntityRef::Element(0))
            .unwrap();
        // region x + y <= 1 of the unit cube
        assert_relative_eq!(rule.volume(), 0.5, epsilon = 1e-13);
        assert_relative_eq!(rule.integrate(|p| p.x), 1.0 / 6.0, epsilon = 1e-13);
        assert!(rule.weights.iter().all(|w| *w > 0.0));
    }
}
