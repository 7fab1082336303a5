// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar convex polygon operations
//!
//! Polygons are vertex loops in 3D, counter-clockwise around their normal.
//! Every function here assumes a planar, convex input; the cutter only ever
//! produces such polygons because all pieces it creates are convex.

use super::robust_predicates::{triangle_area, Plane, PlaneClassification};
use nalgebra::{Point3, Vector3};

/// Area-weighted normal (Newell), length equals the polygon area
pub fn area_vector(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut sum = Vector3::zeros();
    if points.len() < 3 {
        return sum;
    }
    let origin = points[0];
    for i in 1..points.len() - 1 {
        sum += (points[i] - origin).cross(&(points[i + 1] - origin));
    }
    sum * 0.5
}

pub fn area(points: &[Point3<f64>]) -> f64 {
    area_vector(points).norm()
}

/// Area centroid
pub fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    match points.len() {
        0 => Point3::origin(),
        1 | 2 => vertex_average(points),
        _ => {
            let origin = points[0];
            let mut weighted = Vector3::zeros();
            let mut total = 0.0;
            for i in 1..points.len() - 1 {
                let a = triangle_area(&origin, &points[i], &points[i + 1]);
                weighted += (origin.coords + points[i].coords + points[i + 1].coords) * (a / 3.0);
                total += a;
            }
            if total > 0.0 {
                Point3::from(weighted / total)
            } else {
                vertex_average(points)
            }
        }
    }
}

pub fn vertex_average(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Drop consecutive duplicates (including last-to-first)
pub fn dedup(points: Vec<Point3<f64>>, tolerance: f64) -> Vec<Point3<f64>> {
    let mut result: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if result
            .last()
            .map_or(true, |last| (p - last).norm() > tolerance)
        {
            result.push(p);
        }
    }
    while result.len() > 1 && (result[0] - result[result.len() - 1]).norm() <= tolerance {
        result.pop();
    }
    result
}

/// Split a polygon by a plane into its back and front parts
///
/// Vertices within `tolerance` of the plane go to both parts. Either part
/// may come back with fewer than three vertices.
pub fn split(
    points: &[Point3<f64>],
    plane: &Plane,
    tolerance: f64,
) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
    let mut back = Vec::new();
    let mut front = Vec::new();
    let n = points.len();
    if n == 0 {
        return (back, front);
    }

    let distances: Vec<f64> = points.iter().map(|p| plane.signed_distance(p)).collect();
    let sides: Vec<PlaneClassification> = points
        .iter()
        .map(|p| plane.classify(p, tolerance))
        .collect();

    for i in 0..n {
        let j = (i + 1) % n;
        let (p, q) = (points[i], points[j]);

        match sides[i] {
            PlaneClassification::Back => back.push(p),
            PlaneClassification::Front => front.push(p),
            PlaneClassification::OnPlane => {
                back.push(p);
                front.push(p);
            }
        }

        let crosses = matches!(
            (sides[i], sides[j]),
            (PlaneClassification::Back, PlaneClassification::Front)
                | (PlaneClassification::Front, PlaneClassification::Back)
        );
        if crosses {
            let t = distances[i] / (distances[i] - distances[j]);
            let x = p + (q - p) * t;
            back.push(x);
            front.push(x);
        }
    }

    (dedup(back, tolerance), dedup(front, tolerance))
}

/// Keep the part of a polygon on the back side of a plane
pub fn clip_back(points: &[Point3<f64>], plane: &Plane, tolerance: f64) -> Vec<Point3<f64>> {
    split(points, plane, tolerance).0
}

/// Intersection of two coplanar convex polygons
///
/// `subject` is clipped against the edge half-planes of `clip`, using the
/// orientation of `clip` itself.
pub fn convex_intersection(
    subject: &[Point3<f64>],
    clip: &[Point3<f64>],
    tolerance: f64,
) -> Vec<Point3<f64>> {
    if subject.len() < 3 || clip.len() < 3 {
        return Vec::new();
    }
    let normal = area_vector(clip);
    if normal.norm() <= tolerance * tolerance {
        return Vec::new();
    }
    let normal = normal.normalize();

    let mut result = subject.to_vec();
    for i in 0..clip.len() {
        let a = clip[i];
        let b = clip[(i + 1) % clip.len()];
        // outward normal of the edge within the polygon plane
        let Some(edge_plane) = Plane::through(&a, &(b - a).cross(&normal)) else {
            continue;
        };
        result = clip_back(&result, &edge_plane, tolerance);
        if result.len() < 3 {
            return Vec::new();
        }
    }
    result
}

/// Area of the intersection of two coplanar convex polygons
pub fn overlap_area(a: &[Point3<f64>], b: &[Point3<f64>], tolerance: f64) -> f64 {
    area(&convex_intersection(a, b, tolerance))
}

/// Fan triangulation from the first vertex
pub fn fan_triangles(points: &[Point3<f64>]) -> Vec<[Point3<f64>; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }
    (1..points.len() - 1)
        .map(|i| [points[0], points[i], points[i + 1]])
        .collect()
}

/// Whether a point in the polygon plane lies inside the polygon
pub fn contains_point(points: &[Point3<f64>], point: &Point3<f64>, tolerance: f64) -> bool {
    if points.len() < 3 {
        return false;
    }
    let normal = area_vector(points);
    if normal.norm() == 0.0 {
        return false;
    }
    let normal = normal.normalize();
    (0..points.len()).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        (b - a).cross(&normal).dot(&(point - a)) <= tolerance * (b - a).norm()
    })
}

/// Order coplanar points counter-clockwise around `normal`
pub fn sort_around(points: &mut [Point3<f64>], normal: &Vector3<f64>) {
    if points.len() < 3 {
        return;
    }
    let center = vertex_average(points);
    let Some(plane) = Plane::through(&center, normal) else {
        return;
    };
    let (u, v) = plane.basis();
    points.sort_by(|p, q| {
        let dp = p - center;
        let dq = q - center;
        let ap = dp.dot(&v).atan2(dp.dot(&u));
        let aq = dq.dot(&v).atan2(dq.dot(&u));
        ap.total_cmp(&aq)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_area_and_centroid() {
        let square = unit_square();
        assert_relative_eq!(area(&square), 1.0);
        assert_relative_eq!(area_vector(&square).z, 1.0);
        let c = centroid(&square);
        assert_relative_eq!(c.x, 0.5);
        assert_relative_eq!(c.y, 0.5);
    }

    #[test]
    fn test_split_square() {
        let plane = Plane::through(&Point3::new(0.25, 0.0, 0.0), &Vector3::x()).unwrap();
        let (back, front) = split(&unit_square(), &plane, 1e-12);
        assert_relative_eq!(area(&back), 0.25, epsilon = 1e-12);
        assert_relative_eq!(area(&front), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_split_through_vertices() {
        let plane = Plane::through(&Point3::origin(), &Vector3::new(1.0, -1.0, 0.0)).unwrap();
        let (back, front) = split(&unit_square(), &plane, 1e-12);
        assert_eq!(back.len(), 3);
        assert_eq!(front.len(), 3);
        assert_relative_eq!(area(&back) + area(&front), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_convex_intersection() {
        let shifted: Vec<_> = unit_square()
            .iter()
            .map(|p| p + Vector3::new(0.5, 0.5, 0.0))
            .collect();
        assert_relative_eq!(overlap_area(&unit_square(), &shifted, 1e-12), 0.25, epsilon = 1e-12);

        // clip orientation does not matter
        let mut reversed = shifted.clone();
        reversed.reverse();
        assert_relative_eq!(overlap_area(&unit_square(), &reversed, 1e-12), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let far: Vec<_> = unit_square()
            .iter()
            .map(|p| p + Vector3::new(3.0, 0.0, 0.0))
            .collect();
        assert!(convex_intersection(&unit_square(), &far, 1e-12).is_empty());
    }

    #[test]
    fn test_sort_around() {
        let mut points = vec![
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        sort_around(&mut points, &Vector3::z());
        assert!(area_vector(&points).z > 0.0);
        assert_relative_eq!(area(&points), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_contains_point() {
        let square = unit_square();
        assert!(contains_point(&square, &Point3::new(0.5, 0.5, 0.0), 1e-12));
        assert!(contains_point(&square, &Point3::new(1.0, 0.5, 0.0), 1e-12));
        assert!(!contains_point(&square, &Point3::new(1.5, 0.5, 0.0), 1e-12));
    }
}
