// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Level-set zero contours
//!
//! Each element is split into tetrahedra and the nodal field is linear on
//! each of them, so the zero contour is one triangle or one quad per
//! tetrahedron (marching tetrahedra). Values `φ >= 0` count as positive.
//! Contour triangles are oriented toward positive values, which makes
//! negative the inside phase.
//!
//! Apart from Tet4, every face is coned to the element center, which carries
//! the mean nodal value. Quad faces are split along the diagonal through
//! their lowest global node id, so two elements sharing a face contour it
//! identically whatever their local numbering.

use crate::geometry::{polygon, ElementShape, SideShape};
use crate::mesh::{CutMesh, ElementId, SideOrigin};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

/// Tetrahedra of the element decomposition
///
/// Indices below `node_ids.len()` are element corners, `node_ids.len()` is
/// the element center.
fn decomposition(shape: ElementShape, node_ids: &[usize]) -> Vec<[usize; 4]> {
    if shape == ElementShape::Tet4 {
        return vec![[0, 1, 2, 3]];
    }
    let center = node_ids.len();
    let mut tets = Vec::new();
    for face in shape.faces() {
        if face.len() == 3 {
            tets.push([face[0], face[1], face[2], center]);
            continue;
        }
        let start = (0..4).min_by_key(|&i| node_ids[face[i]]).unwrap_or(0);
        let r = |k: usize| face[(start + k) % 4];
        tets.push([r(0), r(1), r(2), center]);
        tets.push([r(0), r(2), r(3), center]);
    }
    tets
}

/// Zero-contour triangles of a nodal field over one element
///
/// `node_ids` fix the face diagonals and the interpolation direction on
/// every edge, so elements sharing a face produce bit-identical crossing
/// points.
pub fn contour_triangles(
    shape: ElementShape,
    corners: &[Point3<f64>],
    node_ids: &[usize],
    values: &[f64],
    tolerance: f64,
) -> Vec<[Point3<f64>; 3]> {
    let n = corners.len();
    let mut points = corners.to_vec();
    let mean = values.iter().sum::<f64>() / n as f64;
    let mut values = values.to_vec();
    points.push(polygon::vertex_average(corners));
    values.push(mean);
    let key = |i: usize| if i < n { node_ids[i] } else { usize::MAX };

    let crossing = |a: usize, b: usize| {
        let (u, v) = if key(a) < key(b) { (a, b) } else { (b, a) };
        if values[v] == 0.0 {
            return points[v];
        }
        let t = values[u] / (values[u] - values[v]);
        points[u] + (points[v] - points[u]) * t
    };

    let mut triangles = Vec::new();
    for tet in decomposition(shape, node_ids) {
        let (positive, negative): (Vec<usize>, Vec<usize>) =
            tet.iter().copied().partition(|&i| values[i] >= 0.0);
        let contour: Vec<Point3<f64>> = match (positive.len(), negative.len()) {
            (1, 3) => negative.iter().map(|&m| crossing(positive[0], m)).collect(),
            (3, 1) => positive.iter().map(|&p| crossing(p, negative[0])).collect(),
            (2, 2) => {
                let (a, b) = (positive[0], positive[1]);
                let (c, d) = (negative[0], negative[1]);
                vec![crossing(a, c), crossing(a, d), crossing(b, d), crossing(b, c)]
            }
            _ => continue,
        };

        let average = |ids: &[usize]| {
            ids.iter().fold(Vector3::zeros(), |acc, &i| acc + points[i].coords) / ids.len() as f64
        };
        let toward_positive = average(&positive) - average(&negative);

        for mut triangle in polygon::fan_triangles(&contour) {
            let normal = (triangle[1] - triangle[0]).cross(&(triangle[2] - triangle[0]));
            if normal.norm() <= tolerance * tolerance {
                continue;
            }
            if normal.dot(&toward_positive) < 0.0 {
                triangle.swap(1, 2);
            }
            triangles.push(triangle);
        }
    }
    triangles
}

/// Add contour sides for every element with a sign change
///
/// Side global ids are assigned consecutively from `first_gid` in ascending
/// element order. Returns the number of sides created.
pub fn create_level_set_sides(mesh: &mut CutMesh, first_gid: usize) -> usize {
    let tolerance = mesh.tolerance;
    let contours: Vec<Vec<[Point3<f64>; 3]>> = mesh
        .elements
        .par_iter()
        .map(|element| {
            let Some(values) = &element.level_set else {
                return Vec::new();
            };
            let has_negative = values.iter().any(|v| *v < 0.0);
            let has_positive = values.iter().any(|v| *v >= 0.0);
            if !(has_negative && has_positive) {
                return Vec::new();
            }
            contour_triangles(element.shape, &element.corners, &element.nodes, values, tolerance)
        })
        .collect();

    let mut gid = first_gid;
    for (index, triangles) in contours.into_iter().enumerate() {
        let element = ElementId(index);
        for triangle in triangles {
            let side = mesh.add_side(
                gid,
                SideShape::Tri3,
                Vec::new(),
                triangle.to_vec(),
                vec![Vector3::zeros(); 3],
                SideOrigin::LevelSet(element),
            );
            mesh.elements[index].level_set_sides.push(side);
            mesh.elements[index].registered = true;
            gid += 1;
        }
    }
    let created = gid - first_gid;
    debug!(sides = created, "level-set contour extracted");
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_corners(shape: ElementShape) -> Vec<Point3<f64>> {
        match shape {
            ElementShape::Hex8 => shape
                .reference_nodes()
                .iter()
                .map(|p| Point3::new((p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0, (p.z + 1.0) / 2.0))
                .collect(),
            _ => shape.reference_nodes(),
        }
    }

    #[test]
    fn test_planar_contour_in_hex() {
        let corners = unit_corners(ElementShape::Hex8);
        let values: Vec<f64> = corners.iter().map(|p| p.x + 0.3 * p.y - 0.55).collect();
        let ids: Vec<usize> = (0..8).collect();
        let triangles = contour_triangles(ElementShape::Hex8, &corners, &ids, &values, 1e-12);
        assert!(!triangles.is_empty());

        let area: f64 = triangles.iter().map(|t| polygon::area(t)).sum();
        // plane section of the unit cube: |n| / n_x times the unit square
        assert_relative_eq!(area, (1.0f64 + 0.09).sqrt(), epsilon = 1e-12);
        for t in &triangles {
            let normal = (t[1] - t[0]).cross(&(t[2] - t[0]));
            assert!(normal.x > 0.0);
            for p in t {
                assert_relative_eq!(p.x + 0.3 * p.y, 0.55, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_single_positive_vertex() {
        let corners = unit_corners(ElementShape::Tet4);
        let values = [-0.5, 0.5, -0.5, -0.5];
        let triangles = contour_triangles(ElementShape::Tet4, &corners, &[0, 1, 2, 3], &values, 1e-12);
        assert_eq!(triangles.len(), 1);
        // φ = x - 0.5: the triangle x = 0.5, y + z <= 0.5
        assert_relative_eq!(polygon::area(&triangles[0]), 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_no_sign_change_gives_nothing() {
        let corners = unit_corners(ElementShape::Tet4);
        let values = [0.0, 0.1, 0.2, 0.3];
        assert!(contour_triangles(ElementShape::Tet4, &corners, &[0, 1, 2, 3], &values, 1e-12).is_empty());
    }

    #[test]
    fn test_contour_independent_of_local_numbering() {
        // saddle on every x face: the face diagonal decides the contour
        let phi = |p: &Point3<f64>| 4.0 * (p.y - 0.5) * (p.z - 0.5) + 0.2;
        let corners = unit_corners(ElementShape::Hex8);
        let ids: Vec<usize> = (0..8).collect();
        let values: Vec<f64> = corners.iter().map(phi).collect();
        let reference = contour_triangles(ElementShape::Hex8, &corners, &ids, &values, 1e-12);

        // same cube, local axes x, z, -y
        let order = [3, 2, 6, 7, 0, 1, 5, 4];
        let rotated_corners: Vec<Point3<f64>> = order.iter().map(|&i| corners[i]).collect();
        let rotated_values: Vec<f64> = order.iter().map(|&i| values[i]).collect();
        let rotated = contour_triangles(
            ElementShape::Hex8,
            &rotated_corners,
            &order,
            &rotated_values,
            1e-12,
        );

        let area = |ts: &[[Point3<f64>; 3]]| ts.iter().map(|t| polygon::area(t)).sum::<f64>();
        assert_relative_eq!(area(&reference), area(&rotated), epsilon = 1e-12);
        for p in reference.iter().flatten() {
            assert!(
                rotated.iter().flatten().any(|q| (p - q).norm() < 1e-12),
                "{p} missing from the rotated contour"
            );
        }
    }
}
