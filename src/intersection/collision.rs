// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Collision detection between background elements and cutter sides

use crate::geometry::{BoundingBox, Plane, PlaneClassification, BVH};
use crate::mesh::{CutMesh, SideId};
use nalgebra::Point3;
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Elements with at least one candidate side or level-set side
    pub registered: usize,
    /// Element/side candidate pairs after the narrow phase
    pub candidate_pairs: usize,
    /// Global ids of cutter sides touching at least one element
    pub found_sides: BTreeSet<usize>,
}

/// Whether a triangle can touch an element: boxes overlap and the element
/// corners are not all strictly on one side of the triangle's plane
fn may_touch(
    triangle: &[Point3<f64>; 3],
    corners: &[Point3<f64>],
    bbox: &BoundingBox,
    tolerance: f64,
) -> bool {
    if !BoundingBox::from_points(triangle).intersects(bbox) {
        return false;
    }
    let Some(plane) = Plane::from_triangle(&triangle[0], &triangle[1], &triangle[2]) else {
        return false;
    };
    let sides: Vec<PlaneClassification> =
        corners.iter().map(|c| plane.classify(c, tolerance)).collect();
    !(sides.iter().all(|s| *s == PlaneClassification::Front)
        || sides.iter().all(|s| *s == PlaneClassification::Back))
}

/// Attach candidate cutter sides to every element
///
/// Broad phase queries `tree` (cutter sides by arena index) with the
/// element box; narrow phase rejects sides whose triangles all miss.
pub fn detect_collisions(mesh: &mut CutMesh, tree: &BVH) -> CollisionReport {
    let tolerance = mesh.tolerance;
    let candidates: Vec<Vec<SideId>> = mesh
        .elements
        .par_iter()
        .map(|element| {
            let bbox = element.bbox.inflated(tolerance);
            tree.query(&bbox)
                .into_iter()
                .map(SideId)
                .filter(|&side| {
                    let s = mesh.side(side);
                    !s.is_level_set()
                        && s.bbox.intersects(&bbox)
                        && mesh
                            .sub_side_triangles(side)
                            .iter()
                            .any(|t| may_touch(t, &element.corners, &bbox, tolerance))
                })
                .collect()
        })
        .collect();

    let mut report = CollisionReport::default();
    for (element, sides) in mesh.elements.iter_mut().zip(candidates) {
        report.candidate_pairs += sides.len();
        element.candidate_sides = sides;
        element.registered =
            !element.candidate_sides.is_empty() || !element.level_set_sides.is_empty();
        if element.registered {
            report.registered += 1;
        }
    }
    for element in &mesh.elements {
        for side in &element.candidate_sides {
            report.found_sides.insert(mesh.side(*side).gid);
        }
    }

    debug!(
        registered = report.registered,
        pairs = report.candidate_pairs,
        "collision detection done"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ElementShape, SideShape};
    use crate::mesh::SideOrigin;
    use nalgebra::Vector3;

    fn unit_hex(mesh: &mut CutMesh, gid: usize, x0: f64) {
        let corners = ElementShape::Hex8
            .reference_nodes()
            .iter()
            .map(|p| Point3::new(x0 + (p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0, (p.z + 1.0) / 2.0))
            .collect();
        mesh.add_element(gid, ElementShape::Hex8, (0..8).map(|i| 8 * gid + i).collect(), corners, None);
    }

    #[test]
    fn test_candidates_follow_geometry() {
        let mut mesh = CutMesh::new(1e-10);
        unit_hex(&mut mesh, 0, 0.0);
        unit_hex(&mut mesh, 1, 1.0);
        // vertical triangle through the first element only
        mesh.add_side(
            0,
            SideShape::Tri3,
            vec![0, 1, 2],
            vec![
                Point3::new(0.5, -0.1, -0.1),
                Point3::new(0.5, 1.1, -0.1),
                Point3::new(0.5, -0.1, 1.1),
            ],
            vec![Vector3::zeros(); 3],
            SideOrigin::Cutter(0),
        );
        let tree = BVH::build(vec![(0, mesh.sides[0].bbox)]);
        let report = detect_collisions(&mut mesh, &tree);
        assert_eq!(report.registered, 1);
        assert!(mesh.elements[0].registered);
        assert!(!mesh.elements[1].registered);
        assert!(report.found_sides.contains(&0));
    }

    #[test]
    fn test_plane_beside_element_is_rejected() {
        let mut mesh = CutMesh::new(1e-10);
        unit_hex(&mut mesh, 0, 0.0);
        mesh.add_side(
            0,
            SideShape::Tri3,
            vec![0, 1, 2],
            vec![
                Point3::new(0.8, 1.7, 0.0),
                Point3::new(1.7, 0.8, 0.0),
                Point3::new(0.8, 1.7, 1.0),
            ],
            vec![Vector3::zeros(); 3],
            SideOrigin::Cutter(0),
        );
        let tree = BVH::build(vec![(0, mesh.sides[0].bbox)]);
        let report = detect_collisions(&mut mesh, &tree);
        // boxes overlap, but the plane x + y = 2.5 misses the cube
        assert_eq!(report.registered, 0);
        assert!(report.found_sides.is_empty());
    }
}
