// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Robust geometric predicates for cutting
//! Implements adaptive precision fallback for near-degenerate cases

use nalgebra::{Point3, Vector3};

/// Epsilon below which a determinant is recomputed with compensated sums
const EPS: f64 = 1e-9;

/// Compute oriented volume of tetrahedron (a, b, c, d), times six
/// Positive if d is on the positive side of plane (a, b, c)
pub fn oriented_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;

    let result = ab.dot(&ac.cross(&ad));

    if result.abs() < EPS {
        adaptive_precision_volume(&ab, &ac, &ad)
    } else {
        result
    }
}

/// Near-degenerate determinant with error-compensated products
fn adaptive_precision_volume(ab: &Vector3<f64>, ac: &Vector3<f64>, ad: &Vector3<f64>) -> f64 {
    let cx = two_product(ac.y, ad.z, ac.z, ad.y);
    let cy = two_product(ac.z, ad.x, ac.x, ad.z);
    let cz = two_product(ac.x, ad.y, ac.y, ad.x);

    compensated_dot(ab, &[cx, cy, cz])
}

/// Computes (a * b) - (c * d) with one rounding on the second product
fn two_product(a: f64, b: f64, c: f64, d: f64) -> f64 {
    let cd = c * d;
    let err = c.mul_add(d, -cd);
    a.mul_add(b, -cd) - err
}

/// Dot product summed largest-first with Kahan compensation
fn compensated_dot(v: &Vector3<f64>, w: &[f64; 3]) -> f64 {
    let mut terms = [v.x * w[0], v.y * w[1], v.z * w[2]];
    terms.sort_by(|a, b| b.abs().total_cmp(&a.abs()));

    let mut sum = 0.0;
    let mut c = 0.0;
    for &term in &terms {
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }

    sum
}

/// Classification of a point relative to a plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneClassification {
    /// Positive side (along the normal)
    Front,
    /// Negative side
    Back,
    /// Within tolerance of the plane
    OnPlane,
}

impl PlaneClassification {
    /// -1, 0 or +1
    pub fn sign(self) -> i8 {
        match self {
            PlaneClassification::Front => 1,
            PlaneClassification::Back => -1,
            PlaneClassification::OnPlane => 0,
        }
    }
}

/// Oriented plane `normal · x = offset` with unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Plane {
    /// Plane through `point` with the given (not necessarily unit) normal
    pub fn through(point: &Point3<f64>, normal: &Vector3<f64>) -> Option<Self> {
        let len = normal.norm();
        if len < f64::MIN_POSITIVE.sqrt() {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            offset: normal.dot(&point.coords),
        })
    }

    /// Plane of a triangle, oriented by the right-hand rule
    pub fn from_triangle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        Self::through(a, &(b - a).cross(&(c - a)))
    }

    /// Same plane, opposite orientation
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Signed distance from point to plane
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        let distance = self.normal.dot(&point.coords) - self.offset;
        if distance.abs() < EPS {
            compensated_dot(&self.normal, &[point.x, point.y, point.z]) - self.offset
        } else {
            distance
        }
    }

    /// Classify a point with an absolute tolerance
    pub fn classify(&self, point: &Point3<f64>, tolerance: f64) -> PlaneClassification {
        let distance = self.signed_distance(point);
        if distance > tolerance {
            PlaneClassification::Front
        } else if distance < -tolerance {
            PlaneClassification::Back
        } else {
            PlaneClassification::OnPlane
        }
    }

    /// Whether `other` describes the same geometric plane (either orientation)
    pub fn is_coplanar(&self, other: &Plane, tolerance: f64) -> bool {
        let alignment = self.normal.dot(&other.normal);
        if alignment > 1.0 - 1e-8 {
            (self.offset - other.offset).abs() <= tolerance
        } else if alignment < -1.0 + 1e-8 {
            (self.offset + other.offset).abs() <= tolerance
        } else {
            false
        }
    }

    /// Orthonormal in-plane basis (u, v) with u × v = normal
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        let n = self.normal;
        let helper = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = helper.cross(&n).normalize();
        let v = n.cross(&u);
        (u, v)
    }
}

/// Compute robust triangle area
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let area = ab.cross(&ac).norm() / 2.0;

    if area < EPS {
        let cx = two_product(ab.y, ac.z, ab.z, ac.y);
        let cy = two_product(ab.z, ac.x, ab.x, ac.z);
        let cz = two_product(ab.x, ac.y, ab.y, ac.x);
        (cx * cx + cy * cy + cz * cz).sqrt() / 2.0
    } else {
        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oriented_volume() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let d = Point3::new(0.0, 0.0, 1.0);

        assert!(oriented_volume(&a, &b, &c, &d) > 0.0);
        assert!(oriented_volume(&a, &b, &c, &Point3::new(0.0, 0.0, -1.0)) < 0.0);
        assert_eq!(oriented_volume(&a, &b, &c, &Point3::new(0.3, 0.3, 0.0)), 0.0);
    }

    #[test]
    fn test_plane_classification() {
        let plane = Plane::through(&Point3::origin(), &Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_eq!(plane.normal, Vector3::z());

        assert_eq!(
            plane.classify(&Point3::new(0.0, 0.0, 1.0), 1e-9),
            PlaneClassification::Front
        );
        assert_eq!(
            plane.classify(&Point3::new(0.0, 0.0, -1.0), 1e-9),
            PlaneClassification::Back
        );
        assert_eq!(
            plane.classify(&Point3::new(5.0, 3.0, 1e-12), 1e-9),
            PlaneClassification::OnPlane
        );
    }

    #[test]
    fn test_coplanar_either_orientation() {
        let a = Plane::from_triangle(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert!(a.is_coplanar(&a.flipped(), 1e-12));
        let shifted = Plane {
            offset: a.offset + 1e-3,
            ..a
        };
        assert!(!a.is_coplanar(&shifted, 1e-6));
    }

    #[test]
    fn test_basis_is_right_handed() {
        let plane = Plane::through(&Point3::origin(), &Vector3::new(1.0, 2.0, 3.0)).unwrap();
        let (u, v) = plane.basis();
        assert!((u.cross(&v) - plane.normal).norm() < 1e-12);
        assert!(u.dot(&plane.normal).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_triangle_has_no_plane() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(Plane::from_triangle(&p, &p, &Point3::new(2.0, 2.0, 2.0)).is_none());
        assert_eq!(triangle_area(&p, &p, &Point3::new(2.0, 2.0, 2.0)), 0.0);
    }
}
