// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Moment fitting
//!
//! Exact monomial moments of the cell come from the direct-divergence
//! formulas. Candidate points are tensor Gauss points of the cell's bounding
//! box that fall inside the cell; a well-conditioned subset is picked by
//! pivoted Gram-Schmidt and the weights are the least-squares solution of
//! the moment equations. All work happens in box-scaled coordinates
//! `ξ ∈ [-1, 1]³` so the monomial matrix stays well conditioned.

use super::direct_divergence::cell_moments;
use super::gauss::{gauss_legendre, tet_rule};
use super::monomials::{evaluate, monomial_count};
use super::tessellation::tetrahedra;
use super::{CellIntegrator, IntegrationRule};
use crate::error::{CutError, EntityRef, Result};
use crate::mesh::ConvexPiece;
use nalgebra::{DMatrix, DVector, Point3};
use tracing::debug;

/// Relative residual above which the fit is rejected
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Largest tensor grid tried before falling back to tessellation points
const MAX_GRID_POINTS: usize = 12;

#[derive(Debug, Clone)]
pub struct MomentFitting {
    degree: usize,
    zero_tolerance: f64,
}

impl MomentFitting {
    pub fn new(degree: usize, zero_tolerance: f64) -> Self {
        Self {
            degree,
            zero_tolerance,
        }
    }

    fn grid_candidates(&self, local: &[ConvexPiece], count: usize) -> Vec<Point3<f64>> {
        let inside = |p: &Point3<f64>| local.iter().any(|piece| piece.contains(p, 1e-12));
        let mut points = Vec::new();
        for n in self.degree / 2 + 1..=MAX_GRID_POINTS {
            let (nodes, _) = gauss_legendre(n);
            points.clear();
            for &x in &nodes {
                for &y in &nodes {
                    for &z in &nodes {
                        let p = Point3::new(x, y, z);
                        if inside(&p) {
                            points.push(p);
                        }
                    }
                }
            }
            if points.len() >= 2 * count {
                break;
            }
        }
        points
    }

    fn tessellation_candidates(&self, local: &[ConvexPiece]) -> Vec<Point3<f64>> {
        local
            .iter()
            .flat_map(tetrahedra)
            .flat_map(|tet| tet_rule(&tet, self.degree).points)
            .collect()
    }
}

/// Columns of `matrix` picked by pivoted Gram-Schmidt
fn select_columns(matrix: &DMatrix<f64>) -> Vec<usize> {
    let mut residual = matrix.clone();
    let mut selected = Vec::new();
    let initial = (0..matrix.ncols())
        .map(|j| matrix.column(j).norm())
        .fold(0.0, f64::max);
    if initial == 0.0 {
        return selected;
    }

    for _ in 0..matrix.nrows() {
        let best = (0..residual.ncols())
            .filter(|j| !selected.contains(j))
            .map(|j| (j, residual.column(j).norm()))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((j, norm)) = best else { break };
        if norm <= 1e-10 * initial {
            break;
        }
        let q = residual.column(j) / norm;
        for k in 0..residual.ncols() {
            let projection = q.dot(&residual.column(k));
            let mut column = residual.column_mut(k);
            column.axpy(-projection, &q, 1.0);
        }
        selected.push(j);
    }
    selected.sort_unstable();
    selected
}

fn least_squares(matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Option<(DVector<f64>, f64)> {
    let svd = matrix.clone().svd(true, true);
    let weights = svd.solve(rhs, 1e-14).ok()?;
    let residual = (matrix * &weights - rhs).norm() / rhs.norm().max(f64::MIN_POSITIVE);
    Some((weights, residual))
}

/// Weights per candidate index reproducing `moments`
fn fit(
    candidates: &[Point3<f64>],
    moments: &DVector<f64>,
    count: usize,
) -> Option<Vec<(usize, f64)>> {
    if candidates.is_empty() {
        return None;
    }
    let matrix = DMatrix::from_fn(count, candidates.len(), |i, j| evaluate(i, &candidates[j]));

    let selected = select_columns(&matrix);
    if let Some((w, _)) = least_squares(&matrix.select_columns(&selected), moments)
        .filter(|(_, residual)| *residual <= RESIDUAL_TOLERANCE)
    {
        return Some(selected.into_iter().zip(w.iter().copied()).collect());
    }

    let (w, residual) = least_squares(&matrix, moments)?;
    if residual > RESIDUAL_TOLERANCE {
        debug!(residual, "minimum-norm moment fit rejected");
        return None;
    }
    Some((0..candidates.len()).zip(w.iter().copied()).collect())
}

impl CellIntegrator for MomentFitting {
    fn name(&self) -> &'static str {
        "moment_fitting"
    }

    fn integrate_cell(&self, pieces: &[ConvexPiece], cell: EntityRef) -> Result<IntegrationRule> {
        if pieces.is_empty() {
            return Ok(IntegrationRule::new());
        }
        let bbox = pieces
            .iter()
            .map(ConvexPiece::bounding_box)
            .fold(crate::geometry::BoundingBox::empty(), |a, b| a.merged(&b));
        let center = bbox.center();
        let half = bbox.size() / 2.0;
        if half.iter().any(|h| *h <= 0.0) {
            return Err(CutError::geometry(cell, "cell has a degenerate bounding box"));
        }
        let to_local = |p: &Point3<f64>| {
            Point3::new(
                (p.x - center.x) / half.x,
                (p.y - center.y) / half.y,
                (p.z - center.z) / half.z,
            )
        };
        let local = pieces
            .iter()
            .map(|p| p.mapped(to_local))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CutError::geometry(cell, "degenerate face in scaled cell"))?;

        let count = monomial_count(self.degree);
        let moments = DVector::from_vec(cell_moments(&local, self.degree, self.zero_tolerance));
        let mut candidates = self.grid_candidates(&local, count);
        let mut fitted = fit(&candidates, &moments, count);
        if fitted.is_none() {
            // thin cells can miss the grid entirely
            debug!(%cell, "grid points insufficient, adding tessellation points");
            candidates.extend(self.tessellation_candidates(&local));
            fitted = fit(&candidates, &moments, count);
        }
        let weights = fitted.ok_or_else(|| {
            CutError::geometry(
                cell,
                format!("moment fitting failed with {} candidate points", candidates.len()),
            )
        })?;

        let jacobian = half.x * half.y * half.z;
        let negligible = 1e-14 * moments[0].abs();
        let mut rule = IntegrationRule::new();
        for (j, w) in weights {
            if w.abs() <= negligible {
                continue;
            }
            let xi = candidates[j];
            let p = Point3::new(
                center.x + half.x * xi.x,
                center.y + half.y * xi.y,
                center.z + half.z * xi.z,
            );
            rule.push(p, w * jacobian);
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ElementShape, Plane};
    use crate::integration::DirectDivergence;
    use crate::mesh::FaceOrigin;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn box_piece(min: Point3<f64>, max: Point3<f64>) -> ConvexPiece {
        let corners: Vec<Point3<f64>> = ElementShape::Hex8
            .reference_nodes()
            .iter()
            .map(|p| {
                Point3::new(
                    min.x + (p.x + 1.0) / 2.0 * (max.x - min.x),
                    min.y + (p.y + 1.0) / 2.0 * (max.y - min.y),
                    min.z + (p.z + 1.0) / 2.0 * (max.z - min.z),
                )
            })
            .collect();
        ConvexPiece::from_element(ElementShape::Hex8, &corners, &[0, 1, 2, 3, 4, 5, 6, 7], 1e-12)
            .unwrap()
    }

    #[test]
    fn test_fitted_rule_matches_moments_of_cut_box() {
        let cube = box_piece(Point3::new(1.0, 2.0, 0.0), Point3::new(2.0, 2.5, 3.0));
        let plane =
            Plane::through(&Point3::new(1.4, 2.2, 1.0), &Vector3::new(1.0, -0.5, 0.2)).unwrap();
        let (back, _) = cube.split(&plane, FaceOrigin::CutPlane(0), 1e-12);
        let pieces = vec![back.unwrap()];
        let rule = MomentFitting::new(3, 1e-7)
            .integrate_cell(&pieces, EntityRef::Element(0))
            .unwrap();
        let exact = DirectDivergence::new(3, 1e-7).moments(&pieces);
        assert_relative_eq!(rule.volume(), exact[0], max_relative = 1e-8);
        for index in 0..monomial_count(3) {
            let value = rule.integrate(|p| evaluate(index, p));
            assert_relative_eq!(value, exact[index], epsilon = 1e-8, max_relative = 1e-7);
        }
        assert!(rule.points.iter().all(|p| pieces[0].contains(p, 1e-9)));
    }

    #[test]
    fn test_selected_columns_are_independent() {
        let matrix = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 0.0, 1.0, 2.0, 1.0]);
        let selected = select_columns(&matrix);
        assert_eq!(selected.len(), 2);
        assert!(selected.contains(&2));
    }
}
