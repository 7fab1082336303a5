// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle-triangle intersection and splitting
//! Handles coplanar cases robustly using robust predicates

use super::polygon;
use super::robust_predicates::{Plane, PlaneClassification};
use nalgebra::{Point3, Vector3};

/// Result of triangle-triangle intersection test
#[derive(Debug, Clone)]
pub struct IntersectionResult {
    /// Intersection type
    pub intersection_type: IntersectionType,
    /// Intersection points: segment end points, or the overlap polygon for
    /// coplanar triangles
    pub intersection_points: Vec<Point3<f64>>,
}

impl IntersectionResult {
    fn none() -> Self {
        Self {
            intersection_type: IntersectionType::None,
            intersection_points: Vec::new(),
        }
    }

    pub fn intersects(&self) -> bool {
        self.intersection_type != IntersectionType::None
    }
}

/// Type of triangle-triangle intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionType {
    /// No intersection
    None,
    /// Triangles are coplanar and overlap with positive area
    Coplanar,
    /// Triangles touch at a point
    Point,
    /// Triangles intersect along a line segment
    Segment,
}

/// Test if two triangles intersect
pub fn triangle_triangle_intersection(
    tri_a: &[Point3<f64>; 3],
    tri_b: &[Point3<f64>; 3],
    tolerance: f64,
) -> IntersectionResult {
    let (Some(plane_a), Some(plane_b)) = (
        Plane::from_triangle(&tri_a[0], &tri_a[1], &tri_a[2]),
        Plane::from_triangle(&tri_b[0], &tri_b[1], &tri_b[2]),
    ) else {
        return IntersectionResult::none();
    };

    let sides_b: Vec<PlaneClassification> =
        tri_b.iter().map(|p| plane_a.classify(p, tolerance)).collect();
    if sides_b.iter().all(|s| *s == PlaneClassification::OnPlane) {
        return handle_coplanar_triangles(tri_a, tri_b, tolerance);
    }
    if one_sided(&sides_b) {
        return IntersectionResult::none();
    }
    let sides_a: Vec<PlaneClassification> =
        tri_a.iter().map(|p| plane_b.classify(p, tolerance)).collect();
    if one_sided(&sides_a) {
        return IntersectionResult::none();
    }

    // Both triangles straddle the other's plane: intersect their sections
    // along the common line
    let direction = plane_a.normal.cross(&plane_b.normal);
    if direction.norm() < tolerance {
        return IntersectionResult::none();
    }
    let direction = direction.normalize();

    let (Some(section_a), Some(section_b)) = (
        plane_section(tri_a, &plane_b, tolerance),
        plane_section(tri_b, &plane_a, tolerance),
    ) else {
        return IntersectionResult::none();
    };

    let param = |p: &Point3<f64>| direction.dot(&p.coords);
    let (a0, a1) = ordered(param(&section_a.0), param(&section_a.1));
    let (b0, b1) = ordered(param(&section_b.0), param(&section_b.1));
    let start = a0.max(b0);
    let end = a1.min(b1);
    if start > end + tolerance {
        return IntersectionResult::none();
    }

    let along = |t: f64| -> Point3<f64> {
        let (p, q) = (section_a.0, section_a.1);
        let (tp, tq) = (param(&p), param(&q));
        if (tq - tp).abs() < f64::EPSILON {
            p
        } else {
            p + (q - p) * ((t - tp) / (tq - tp))
        }
    };

    let mut intersection_points = vec![along(start)];
    if end - start > tolerance {
        intersection_points.push(along(end));
    }
    intersection_points = deduplicate_points(&intersection_points, tolerance);

    let intersection_type = match intersection_points.len() {
        0 => IntersectionType::None,
        1 => IntersectionType::Point,
        _ => IntersectionType::Segment,
    };

    IntersectionResult {
        intersection_type,
        intersection_points,
    }
}

fn one_sided(sides: &[PlaneClassification]) -> bool {
    let none_of = |kind: PlaneClassification| sides.iter().all(|s| *s != kind);
    none_of(PlaneClassification::OnPlane)
        && (none_of(PlaneClassification::Back) || none_of(PlaneClassification::Front))
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Segment where a triangle meets a plane it straddles
fn plane_section(
    triangle: &[Point3<f64>; 3],
    plane: &Plane,
    tolerance: f64,
) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut points = Vec::with_capacity(3);
    for i in 0..3 {
        let p = triangle[i];
        let q = triangle[(i + 1) % 3];
        let dp = plane.signed_distance(&p);
        let dq = plane.signed_distance(&q);
        if dp.abs() <= tolerance {
            points.push(p);
        }
        if (dp > tolerance && dq < -tolerance) || (dp < -tolerance && dq > tolerance) {
            let t = dp / (dp - dq);
            points.push(p + (q - p) * t);
        }
    }
    let points = deduplicate_points(&points, tolerance);
    match points.len() {
        0 => None,
        1 => Some((points[0], points[0])),
        _ => Some((points[0], points[1])),
    }
}

/// Handle coplanar triangle intersection
fn handle_coplanar_triangles(
    tri_a: &[Point3<f64>; 3],
    tri_b: &[Point3<f64>; 3],
    tolerance: f64,
) -> IntersectionResult {
    let overlap = polygon::convex_intersection(tri_a, tri_b, tolerance);
    if polygon::area(&overlap) > tolerance * tolerance {
        IntersectionResult {
            intersection_type: IntersectionType::Coplanar,
            intersection_points: overlap,
        }
    } else {
        IntersectionResult::none()
    }
}

/// Split a triangle by the in-plane line carrying a segment
///
/// Returns the triangle itself when the line misses its interior. The
/// fragments always tile the input triangle exactly.
pub fn split_triangle_by_line(
    triangle: &[Point3<f64>; 3],
    segment: (&Point3<f64>, &Point3<f64>),
    tolerance: f64,
) -> Vec<[Point3<f64>; 3]> {
    let Some(plane) = Plane::from_triangle(&triangle[0], &triangle[1], &triangle[2]) else {
        return vec![*triangle];
    };
    let direction: Vector3<f64> = segment.1 - segment.0;
    let Some(cutting) = Plane::through(segment.0, &plane.normal.cross(&direction)) else {
        return vec![*triangle];
    };

    let (back, front) = polygon::split(triangle, &cutting, tolerance);
    let min_area = tolerance * tolerance;
    if back.len() < 3
        || front.len() < 3
        || polygon::area(&back) <= min_area
        || polygon::area(&front) <= min_area
    {
        return vec![*triangle];
    }

    polygon::fan_triangles(&back)
        .into_iter()
        .chain(polygon::fan_triangles(&front))
        .filter(|t| polygon::area(t) > min_area)
        .collect()
}

/// Deduplicate points within epsilon distance
fn deduplicate_points(points: &[Point3<f64>], tolerance: f64) -> Vec<Point3<f64>> {
    let mut result: Vec<Point3<f64>> = Vec::new();

    for &point in points {
        if !result.iter().any(|existing| (point - existing).norm() <= tolerance) {
            result.push(point);
        }
    }

    result
}
