// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Direct divergence integration
//!
//! A volume integral of `x^a y^b z^c` is turned into facet integrals of
//! `x^(a+1) / (a+1) y^b z^c n_x` by the divergence theorem. On a facet the
//! plane is written as `x = α0 + α1 y + α2 z`, the integrand is integrated in
//! closed form along y with the per-monomial table in
//! [`divergence_table`](super::divergence_table), and Green's theorem leaves
//! a line integral over the facet edges. No tessellation and no
//! point-in-cell tests are needed.
//!
//! The same facet parametrisation also yields a quadrature rule: facet
//! Gauss points are swept along x down to a reference plane with a 1D Gauss
//! rule on each line.

use super::divergence_table::y_antiderivative;
use super::gauss::{gauss_legendre, points_for_degree, triangle_points, unit_interval};
use super::monomials::{degree_of, monomial_count, monomial_index, MONOMIALS};
use super::{CellIntegrator, IntegrationRule};
use crate::error::{EntityRef, Result};
use crate::geometry::polygon;
use crate::mesh::{ConvexPiece, PieceFace};
use nalgebra::{Point3, Vector3};

/// Facets with a smaller |n_x| are parallel to x and contribute nothing
const NORMAL_X_TOLERANCE: f64 = 1e-12;

/// Plane coefficients `[α0, α1, α2]` of `x = α0 + α1 y + α2 z`
pub fn plane_coefficients(normal: &Vector3<f64>, point: &Point3<f64>) -> Option<[f64; 3]> {
    if normal.x.abs() < NORMAL_X_TOLERANCE {
        return None;
    }
    let d = normal.dot(&point.coords);
    Some([d / normal.x, -normal.y / normal.x, -normal.z / normal.x])
}

/// Contribution of one facet to the volume integral of monomial `index`
///
/// `points` run counter-clockwise around the outward normal. The facet is
/// integrated along whichever of y and z carries the larger plane
/// coefficient.
pub fn facet_moment(
    points: &[Point3<f64>],
    alpha: &[f64; 3],
    index: usize,
    zero_tolerance: f64,
) -> f64 {
    if alpha[2].abs() <= alpha[1].abs() {
        return edge_sum(points, alpha, index, zero_tolerance);
    }
    // swapping y and z mirrors the projected loop
    let [a, b, c] = MONOMIALS[index];
    let swapped: Vec<Point3<f64>> = points.iter().map(|p| Point3::new(p.x, p.z, p.y)).collect();
    -edge_sum(
        &swapped,
        &[alpha[0], alpha[2], alpha[1]],
        monomial_index([a, c, b]),
        zero_tolerance,
    )
}

/// Line integral of the y-antiderivative over the facet edges
fn edge_sum(points: &[Point3<f64>], alpha: &[f64; 3], index: usize, zero_tolerance: f64) -> f64 {
    let order = degree_of(index) + 2;
    let rule = unit_interval(points_for_degree(order));
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let dz = q.z - p.z;
        if dz == 0.0 {
            continue;
        }
        let dy = q.y - p.y;
        for &(t, w) in &rule {
            let y = p.y + t * dy;
            let z = p.z + t * dz;
            sum += y_antiderivative(index, alpha, y, z, zero_tolerance) * w * dz;
        }
    }
    sum
}

/// Exact moments of all monomials up to `degree` over a convex piece
pub fn piece_moments(piece: &ConvexPiece, degree: usize, zero_tolerance: f64) -> Vec<f64> {
    let count = monomial_count(degree);
    let mut moments = vec![0.0; count];
    for face in &piece.faces {
        let Some(alpha) = plane_coefficients(&face.plane.normal, &face.points[0]) else {
            continue;
        };
        for (index, moment) in moments.iter_mut().enumerate() {
            *moment += facet_moment(&face.points, &alpha, index, zero_tolerance);
        }
    }
    moments
}

/// Exact moments over the union of pieces
pub fn cell_moments(pieces: &[ConvexPiece], degree: usize, zero_tolerance: f64) -> Vec<f64> {
    let mut total = vec![0.0; monomial_count(degree)];
    for piece in pieces {
        for (t, m) in total
            .iter_mut()
            .zip(piece_moments(piece, degree, zero_tolerance))
        {
            *t += m;
        }
    }
    total
}

/// Faces shared exactly by two pieces of the same cell, which cancel
fn matched_faces(pieces: &[ConvexPiece], tolerance: f64) -> Vec<Vec<bool>> {
    let mut matched: Vec<Vec<bool>> = pieces.iter().map(|p| vec![false; p.faces.len()]).collect();
    let same_loop = |f: &PieceFace, g: &PieceFace| {
        f.points.len() == g.points.len()
            && f.plane.normal.dot(&g.plane.normal) < -1.0 + 1e-10
            && f.points
                .iter()
                .all(|p| g.points.iter().any(|q| (p - q).norm() <= tolerance))
    };
    for i in 0..pieces.len() {
        for j in i + 1..pieces.len() {
            for (fi, f) in pieces[i].faces.iter().enumerate() {
                for (gj, g) in pieces[j].faces.iter().enumerate() {
                    if !matched[i][fi] && !matched[j][gj] && same_loop(f, g) {
                        matched[i][fi] = true;
                        matched[j][gj] = true;
                    }
                }
            }
        }
    }
    matched
}

/// Direct-divergence cell integrator
#[derive(Debug, Clone)]
pub struct DirectDivergence {
    degree: usize,
    zero_tolerance: f64,
}

impl DirectDivergence {
    pub fn new(degree: usize, zero_tolerance: f64) -> Self {
        Self {
            degree,
            zero_tolerance,
        }
    }

    /// Exact moments of the cell, in table order
    pub fn moments(&self, pieces: &[ConvexPiece]) -> Vec<f64> {
        cell_moments(pieces, self.degree, self.zero_tolerance)
    }
}

impl CellIntegrator for DirectDivergence {
    fn name(&self) -> &'static str {
        "direct_divergence"
    }

    fn integrate_cell(&self, pieces: &[ConvexPiece], _cell: EntityRef) -> Result<IntegrationRule> {
        let mut rule = IntegrationRule::new();
        let Some(x_ref) = pieces
            .iter()
            .map(|p| p.bounding_box().min.x)
            .min_by(|a, b| a.total_cmp(b))
        else {
            return Ok(rule);
        };
        let scale = pieces
            .iter()
            .map(|p| p.bounding_box().diagonal())
            .fold(0.0, f64::max);
        let matched = matched_faces(pieces, 1e-12 * scale.max(1.0));
        let (line_nodes, line_weights) = gauss_legendre(points_for_degree(self.degree));

        for (piece, skip) in pieces.iter().zip(&matched) {
            for (face, skip) in piece.faces.iter().zip(skip) {
                let nx = face.plane.normal.x;
                if *skip || nx.abs() < NORMAL_X_TOLERANCE {
                    continue;
                }
                for triangle in polygon::fan_triangles(&face.points) {
                    for (q, wf) in triangle_points(&triangle, self.degree + 1) {
                        let length = q.x - x_ref;
                        if length.abs() <= f64::EPSILON * scale {
                            continue;
                        }
                        for (xi, wl) in line_nodes.iter().zip(&line_weights) {
                            let x = x_ref + 0.5 * length * (1.0 + xi);
                            rule.push(Point3::new(x, q.y, q.z), nx * wf * wl * 0.5 * length);
                        }
                    }
                }
            }
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ElementShape;
    use approx::assert_relative_eq;

    fn factorial(n: u32) -> f64 {
        (1..=n).map(|k| k as f64).product()
    }

    fn unit_cube() -> ConvexPiece {
        let corners: Vec<Point3<f64>> = ElementShape::Hex8
            .reference_nodes()
            .iter()
            .map(|p| Point3::new((p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0, (p.z + 1.0) / 2.0))
            .collect();
        ConvexPiece::from_element(ElementShape::Hex8, &corners, &[0, 1, 2, 3, 4, 5, 6, 7], 1e-12)
            .unwrap()
    }

    fn tet(scale_y: f64) -> ConvexPiece {
        let corners = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, scale_y, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        ConvexPiece::from_element(ElementShape::Tet4, &corners, &[0, 1, 2, 3], 1e-12).unwrap()
    }

    #[test]
    fn test_all_monomials_on_unit_cube() {
        let moments = piece_moments(&unit_cube(), 6, 1e-7);
        assert_eq!(moments.len(), 84);
        for (index, [a, b, c]) in MONOMIALS.iter().enumerate() {
            let exact = 1.0 / ((a + 1) * (b + 1) * (c + 1)) as f64;
            assert_relative_eq!(moments[index], exact, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_all_monomials_on_unit_tet() {
        // slanted face has α1 = -1: general table forms
        let moments = piece_moments(&tet(1.0), 6, 1e-7);
        for (index, [a, b, c]) in MONOMIALS.iter().enumerate() {
            let exact = factorial(*a) * factorial(*b) * factorial(*c) / factorial(a + b + c + 3);
            assert_relative_eq!(moments[index], exact, epsilon = 1e-14, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_all_monomials_on_stretched_tet() {
        // slanted face has α1 = -1/4 and α2 = -1: integrated along z
        let moments = piece_moments(&tet(4.0), 6, 1e-7);
        for (index, [a, b, c]) in MONOMIALS.iter().enumerate() {
            let exact = 4f64.powi(*b as i32 + 1) * factorial(*a) * factorial(*b) * factorial(*c)
                / factorial(a + b + c + 3);
            assert_relative_eq!(moments[index], exact, epsilon = 1e-12, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_all_monomials_on_tet_stretched_in_z() {
        // slanted face has α1 = -1 and α2 = -1/4: integrated along y
        let corners = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let piece =
            ConvexPiece::from_element(ElementShape::Tet4, &corners, &[0, 1, 2, 3], 1e-12).unwrap();
        let moments = piece_moments(&piece, 6, 1e-7);
        for (index, [a, b, c]) in MONOMIALS.iter().enumerate() {
            let exact = 4f64.powi(*c as i32 + 1) * factorial(*a) * factorial(*b) * factorial(*c)
                / factorial(a + b + c + 3);
            assert_relative_eq!(moments[index], exact, epsilon = 1e-12, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_facet_moment_direction_is_irrelevant() {
        // triangle on x = 0.2 + 0.5 y - 1.5 z, both y and z integration
        let alpha = [0.2, 0.5, -1.5];
        let on_plane = |y: f64, z: f64| Point3::new(alpha[0] + alpha[1] * y + alpha[2] * z, y, z);
        let points = vec![on_plane(0.0, 0.0), on_plane(0.0, 0.6), on_plane(0.9, 0.1)];
        for index in 0..MONOMIALS.len() {
            let along_z = facet_moment(&points, &alpha, index, 1e-7);
            let along_y = edge_sum(&points, &alpha, index, 1e-7);
            assert_relative_eq!(along_z, along_y, epsilon = 1e-12, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_rule_reproduces_moments() {
        let plane = crate::geometry::Plane::through(
            &Point3::new(0.5, 0.5, 0.5),
            &Vector3::new(1.0, 0.3, -0.2),
        )
        .unwrap();
        let (back, _) = unit_cube().split(&plane, crate::mesh::FaceOrigin::CutPlane(0), 1e-12);
        let pieces = vec![back.unwrap()];
        let integrator = DirectDivergence::new(4, 1e-7);
        let rule = integrator
            .integrate_cell(&pieces, EntityRef::Element(0))
            .unwrap();
        let moments = integrator.moments(&pieces);
        for index in 0..monomial_count(4) {
            let value = rule.integrate(|p| super::super::monomials::evaluate(index, p));
            assert_relative_eq!(value, moments[index], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matched_faces_cancel() {
        let plane = crate::geometry::Plane::through(&Point3::new(0.5, 0.0, 0.0), &Vector3::x()).unwrap();
        let (back, front) = unit_cube().split(&plane, crate::mesh::FaceOrigin::CutPlane(0), 1e-12);
        let pieces = vec![back.unwrap(), front.unwrap()];
        let matched = matched_faces(&pieces, 1e-12);
        assert_eq!(matched.iter().flatten().filter(|m| **m).count(), 2);
        let rule = DirectDivergence::new(2, 1e-7)
            .integrate_cell(&pieces, EntityRef::Element(0))
            .unwrap();
        assert_relative_eq!(rule.volume(), 1.0, epsilon = 1e-13);
    }
}
