// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Self-cut: refine cutter sides along the lines where they intersect each
//! other, so that later element cutting sees a surface without crossings
//! inside its triangles.

use crate::geometry::triangle_intersection::{
    split_triangle_by_line, triangle_triangle_intersection, IntersectionType,
};
use crate::geometry::{BoundingBox, BVH};
use crate::mesh::CutMesh;
use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome of self-cut resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfCutReport {
    /// Side pairs with overlapping bounding boxes
    pub pairs_tested: usize,
    /// Pairs crossing along a segment
    pub intersecting_pairs: usize,
    /// Pairs with a coplanar overlap
    pub coplanar_pairs: usize,
    /// Sides whose triangles were split
    pub refined_sides: usize,
}

/// Split every cutter side along its intersection segments with other sides
///
/// `tree` indexes the cutter sides by arena index.
pub fn self_cut(mesh: &mut CutMesh, tree: &BVH) -> SelfCutReport {
    let tolerance = mesh.tolerance;
    let boxes: Vec<BoundingBox> = mesh.sides.iter().map(|s| s.bbox).collect();
    let mut report = SelfCutReport::default();
    let mut segments: BTreeMap<usize, Vec<(Point3<f64>, Point3<f64>)>> = BTreeMap::new();

    for i in 0..mesh.sides.len() {
        if mesh.sides[i].is_level_set() {
            continue;
        }
        let triangles_i = mesh.sides[i].triangles();
        let query = boxes[i].inflated(tolerance);
        for j in tree.query(&query) {
            if j <= i || mesh.sides[j].is_level_set() || !boxes[j].intersects(&query) {
                continue;
            }
            report.pairs_tested += 1;
            let mut crossing = false;
            let mut coplanar = false;
            for a in &triangles_i {
                for b in &mesh.sides[j].triangles() {
                    let result = triangle_triangle_intersection(a, b, tolerance);
                    match result.intersection_type {
                        IntersectionType::Segment => {
                            let p = result.intersection_points[0];
                            let q = result.intersection_points[1];
                            segments.entry(i).or_default().push((p, q));
                            segments.entry(j).or_default().push((p, q));
                            crossing = true;
                        }
                        IntersectionType::Coplanar => coplanar = true,
                        IntersectionType::Point | IntersectionType::None => {}
                    }
                }
            }
            if crossing {
                report.intersecting_pairs += 1;
            }
            if coplanar {
                report.coplanar_pairs += 1;
                warn!(
                    side_a = mesh.sides[i].gid,
                    side_b = mesh.sides[j].gid,
                    "cutter sides overlap coplanar"
                );
            }
        }
    }

    for (index, cuts) in segments {
        let original = mesh.sides[index].triangles();
        let mut triangles = original.clone();
        for (p, q) in &cuts {
            let reach = BoundingBox::from_points([p, q]).inflated(tolerance);
            triangles = triangles
                .into_iter()
                .flat_map(|t| {
                    if BoundingBox::from_points(&t).intersects(&reach) {
                        split_triangle_by_line(&t, (p, q), tolerance)
                    } else {
                        vec![t]
                    }
                })
                .collect();
        }
        if triangles.len() == original.len() {
            continue;
        }
        let sub_sides = triangles
            .iter()
            .map(|t| t.map(|p| mesh.points.get_or_insert(&p)))
            .collect();
        mesh.sides[index].sub_sides = sub_sides;
        report.refined_sides += 1;
    }

    debug!(
        pairs = report.pairs_tested,
        intersecting = report.intersecting_pairs,
        refined = report.refined_sides,
        "self-cut resolved"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{polygon, SideShape};
    use crate::mesh::SideOrigin;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn add_quad(mesh: &mut CutMesh, gid: usize, corners: [Point3<f64>; 4]) {
        mesh.add_side(
            gid,
            SideShape::Quad4,
            vec![4 * gid, 4 * gid + 1, 4 * gid + 2, 4 * gid + 3],
            corners.to_vec(),
            vec![Vector3::zeros(); 4],
            SideOrigin::Cutter(0),
        );
    }

    fn tree(mesh: &CutMesh) -> BVH {
        BVH::build(mesh.sides.iter().enumerate().map(|(i, s)| (i, s.bbox)).collect())
    }

    #[test]
    fn test_crossing_quads_are_refined() {
        let mut mesh = CutMesh::new(1e-10);
        add_quad(
            &mut mesh,
            0,
            [
                Point3::new(0.0, 0.0, 0.5),
                Point3::new(1.0, 0.0, 0.5),
                Point3::new(1.0, 1.0, 0.5),
                Point3::new(0.0, 1.0, 0.5),
            ],
        );
        add_quad(
            &mut mesh,
            1,
            [
                Point3::new(0.3, 0.0, 0.0),
                Point3::new(0.3, 1.0, 0.0),
                Point3::new(0.3, 1.0, 1.0),
                Point3::new(0.3, 0.0, 1.0),
            ],
        );
        let tree = tree(&mesh);
        let report = self_cut(&mut mesh, &tree);
        assert_eq!(report.pairs_tested, 1);
        assert_eq!(report.intersecting_pairs, 1);
        assert_eq!(report.refined_sides, 2);

        for side in 0..2 {
            let id = crate::mesh::SideId(side);
            let refined = mesh.sub_side_triangles(id);
            assert!(refined.len() > 2);
            let area: f64 = refined.iter().map(|t| polygon::area(t)).sum();
            assert_relative_eq!(area, 1.0, epsilon = 1e-12);
        }
        // no refined triangle straddles x = 0.3 on the horizontal quad
        for t in mesh.sub_side_triangles(crate::mesh::SideId(0)) {
            let lo = t.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
            let hi = t.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
            assert!(hi <= 0.3 + 1e-12 || lo >= 0.3 - 1e-12);
        }
    }

    #[test]
    fn test_neighbors_sharing_an_edge_stay_whole() {
        let mut mesh = CutMesh::new(1e-10);
        add_quad(
            &mut mesh,
            0,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        add_quad(
            &mut mesh,
            1,
            [
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
        );
        let tree = tree(&mesh);
        let report = self_cut(&mut mesh, &tree);
        assert_eq!(report.refined_sides, 0);
        assert!(mesh.side(crate::mesh::SideId(0)).sub_sides.is_empty());
    }
}
