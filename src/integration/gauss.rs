// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Gauss-Legendre and collapsed simplex rules

use super::IntegrationRule;
use crate::geometry::robust_predicates::oriented_volume;
use nalgebra::Point3;

/// Gauss-Legendre nodes and weights on [-1, 1], exact to degree `2n - 1`
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let n = n.max(1);
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];

    for i in 0..n.div_ceil(2) {
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut derivative = 1.0;
        for _ in 0..100 {
            let (p, dp) = legendre(n, x);
            derivative = dp;
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        if dp.is_finite() {
            derivative = dp;
        }
        let w = 2.0 / ((1.0 - x * x) * derivative * derivative);
        nodes[i] = -x;
        nodes[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

/// Legendre polynomial P_n and its derivative
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    for k in 2..=n {
        let p2 = ((2 * k - 1) as f64 * x * p1 - (k - 1) as f64 * p0) / k as f64;
        p0 = p1;
        p1 = p2;
    }
    if n == 0 {
        return (1.0, 0.0);
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

/// Gauss points mapped to [0, 1]
pub fn unit_interval(n: usize) -> Vec<(f64, f64)> {
    let (nodes, weights) = gauss_legendre(n);
    nodes
        .into_iter()
        .zip(weights)
        .map(|(x, w)| (0.5 * (x + 1.0), 0.5 * w))
        .collect()
}

/// Number of Gauss points integrating degree `degree` exactly
pub fn points_for_degree(degree: usize) -> usize {
    degree / 2 + 1
}

/// Collapsed rule on a physical triangle, exact to `degree`
pub fn triangle_points(triangle: &[Point3<f64>; 3], degree: usize) -> Vec<(Point3<f64>, f64)> {
    let area2 = (triangle[1] - triangle[0])
        .cross(&(triangle[2] - triangle[0]))
        .norm();
    if area2 == 0.0 {
        return Vec::new();
    }
    let u_rule = unit_interval(points_for_degree(degree + 1));
    let v_rule = unit_interval(points_for_degree(degree));

    let mut out = Vec::with_capacity(u_rule.len() * v_rule.len());
    for &(u, wu) in &u_rule {
        for &(v, wv) in &v_rule {
            let xi = u;
            let eta = (1.0 - u) * v;
            let p = triangle[0] + (triangle[1] - triangle[0]) * xi + (triangle[2] - triangle[0]) * eta;
            out.push((p, wu * wv * (1.0 - u) * area2));
        }
    }
    out
}

/// Collapsed rule on a physical tetrahedron, exact to `degree`
pub fn tet_rule(tet: &[Point3<f64>; 4], degree: usize) -> IntegrationRule {
    let det = oriented_volume(&tet[0], &tet[1], &tet[2], &tet[3]).abs();
    let mut rule = IntegrationRule::new();
    if det == 0.0 {
        return rule;
    }
    let u_rule = unit_interval(points_for_degree(degree + 2));
    let v_rule = unit_interval(points_for_degree(degree + 1));
    let w_rule = unit_interval(points_for_degree(degree));

    for &(u, wu) in &u_rule {
        for &(v, wv) in &v_rule {
            for &(w, ww) in &w_rule {
                let xi = u;
                let eta = (1.0 - u) * v;
                let zeta = (1.0 - u) * (1.0 - v) * w;
                let p = tet[0]
                    + (tet[1] - tet[0]) * xi
                    + (tet[2] - tet[0]) * eta
                    + (tet[3] - tet[0]) * zeta;
                let jacobian = (1.0 - u) * (1.0 - u) * (1.0 - v);
                rule.push(p, wu * wv * ww * jacobian * det);
            }
        }
    }
    rule
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gauss_legendre_weights() {
        for n in 1..=10 {
            let (nodes, weights) = gauss_legendre(n);
            assert_relative_eq!(weights.iter().sum::<f64>(), 2.0, epsilon = 1e-13);
            // exact for x^(2n-2)
            let k = 2 * n - 2;
            let integral: f64 = nodes.iter().zip(&weights).map(|(x, w)| x.powi(k as i32) * w).sum();
            assert_relative_eq!(integral, 2.0 / (k as f64 + 1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_three_point_rule() {
        let (nodes, weights) = gauss_legendre(3);
        assert_relative_eq!(nodes[2], (0.6f64).sqrt(), epsilon = 1e-14);
        assert_relative_eq!(weights[1], 8.0 / 9.0, epsilon = 1e-14);
        assert!(nodes[0] < nodes[1] && nodes[1] < nodes[2]);
    }

    #[test]
    fn test_triangle_rule_moments() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let points = triangle_points(&tri, 4);
        let area: f64 = points.iter().map(|(_, w)| w).sum();
        assert_relative_eq!(area, 0.5, epsilon = 1e-14);
        // ∫ x^2 y^2 = 2! 2! / 6! = 1/180
        let m: f64 = points.iter().map(|(p, w)| p.x * p.x * p.y * p.y * w).sum();
        assert_relative_eq!(m, 1.0 / 180.0, epsilon = 1e-14);
    }

    #[test]
    fn test_tet_rule_moments() {
        let tet = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let rule = tet_rule(&tet, 6);
        assert_relative_eq!(rule.volume(), 1.0 / 6.0, epsilon = 1e-14);
        // ∫ x^2 y^2 z^2 = 2! 2! 2! / 9! = 8 / 362880
        let m = rule.integrate(|p| (p.x * p.y * p.z).powi(2));
        assert_relative_eq!(m, 8.0 / 362880.0, epsilon = 1e-15);
    }
}
