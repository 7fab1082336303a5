// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex polyhedral pieces of an element
//!
//! A volume cell is the union of one or more convex pieces. Pieces are
//! produced by recursively splitting the element polyhedron with cutter
//! planes, so every face of a piece either lies on an element face or on a
//! cutting plane.

use crate::geometry::{polygon, BoundingBox, ElementShape, Plane, PlaneClassification};
use nalgebra::Point3;

/// Where a piece face came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceOrigin {
    /// Local face index of the element shape
    ElementSide(usize),
    /// Index into the element's candidate triangle list
    CutPlane(usize),
}

/// Planar face, counter-clockwise around its outward normal
#[derive(Debug, Clone)]
pub struct PieceFace {
    pub points: Vec<Point3<f64>>,
    pub plane: Plane,
    pub origin: FaceOrigin,
}

impl PieceFace {
    fn new(points: Vec<Point3<f64>>, origin: FaceOrigin) -> Option<Self> {
        let normal = polygon::area_vector(&points);
        let plane = Plane::through(&polygon::vertex_average(&points), &normal)?;
        Some(Self {
            points,
            plane,
            origin,
        })
    }

    pub fn area(&self) -> f64 {
        polygon::area(&self.points)
    }
}

/// Convex polyhedron given by its faces
#[derive(Debug, Clone)]
pub struct ConvexPiece {
    pub faces: Vec<PieceFace>,
}

impl ConvexPiece {
    /// Element polyhedron; non-planar quad faces are split along the diagonal
    /// through their smallest node id so neighbors split the same way
    pub fn from_element(
        shape: ElementShape,
        corners: &[Point3<f64>],
        node_ids: &[usize],
        tolerance: f64,
    ) -> Option<Self> {
        let mut faces = Vec::new();
        for (k, face) in shape.faces().iter().enumerate() {
            let points: Vec<Point3<f64>> = face.iter().map(|&i| corners[i]).collect();
            let planar = points.len() == 3 || {
                let plane = Plane::from_triangle(&points[0], &points[1], &points[2]);
                plane.map_or(false, |p| p.signed_distance(&points[3]).abs() <= tolerance)
            };
            if planar {
                faces.push(PieceFace::new(points, FaceOrigin::ElementSide(k))?);
                continue;
            }

            let ids: Vec<usize> = face.iter().map(|&i| node_ids[i]).collect();
            let start = (0..4).min_by_key(|&i| ids[i]).unwrap_or(0);
            let rotated: Vec<Point3<f64>> = (0..4).map(|i| points[(start + i) % 4]).collect();
            for tri in [[0, 1, 2], [0, 2, 3]] {
                let tri_points = tri.iter().map(|&i| rotated[i]).collect();
                faces.push(PieceFace::new(tri_points, FaceOrigin::ElementSide(k))?);
            }
        }
        Some(Self { faces })
    }

    /// Volume from the divergence theorem over the faces
    pub fn volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| polygon::area_vector(&f.points).dot(&f.points[0].coords))
            .sum::<f64>()
            / 3.0
    }

    pub fn vertices(&self) -> Vec<Point3<f64>> {
        let mut result: Vec<Point3<f64>> = Vec::new();
        for face in &self.faces {
            for p in &face.points {
                if !result.iter().any(|q| (q - p).norm() < 1e-14) {
                    result.push(*p);
                }
            }
        }
        result
    }

    /// Vertex average, interior for any non-degenerate convex piece
    pub fn centroid(&self) -> Point3<f64> {
        polygon::vertex_average(&self.vertices())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for face in &self.faces {
            for p in &face.points {
                bbox.expand_to_include(p);
            }
        }
        bbox
    }

    /// Image under an orientation-preserving affine map
    pub fn mapped(&self, map: impl Fn(&Point3<f64>) -> Point3<f64>) -> Option<ConvexPiece> {
        let faces = self
            .faces
            .iter()
            .map(|f| PieceFace::new(f.points.iter().map(&map).collect(), f.origin))
            .collect::<Option<Vec<_>>>()?;
        Some(ConvexPiece { faces })
    }

    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        self.faces
            .iter()
            .all(|f| f.plane.signed_distance(point) <= tolerance)
    }

    /// Section polygon with a plane, counter-clockwise around its normal
    pub fn section(&self, plane: &Plane, tolerance: f64) -> Vec<Point3<f64>> {
        let mut points: Vec<Point3<f64>> = Vec::new();
        let mut push = |p: Point3<f64>| {
            if !points.iter().any(|q| (q - p).norm() <= tolerance) {
                points.push(p);
            }
        };
        for face in &self.faces {
            let n = face.points.len();
            for i in 0..n {
                let p = face.points[i];
                let q = face.points[(i + 1) % n];
                let dp = plane.signed_distance(&p);
                let dq = plane.signed_distance(&q);
                if dp.abs() <= tolerance {
                    push(p);
                } else if dq.abs() > tolerance && (dp > 0.0) != (dq > 0.0) {
                    push(p + (q - p) * (dp / (dp - dq)));
                }
            }
        }
        if points.len() < 3 {
            return Vec::new();
        }
        polygon::sort_around(&mut points, &plane.normal);
        points
    }

    /// Split by a plane into the back and front pieces
    ///
    /// The new cap face is tagged with `origin`. Returns `None` for a side
    /// that ends up empty.
    pub fn split(
        &self,
        plane: &Plane,
        origin: FaceOrigin,
        tolerance: f64,
    ) -> (Option<ConvexPiece>, Option<ConvexPiece>) {
        let sides: Vec<PlaneClassification> = self
            .faces
            .iter()
            .flat_map(|f| f.points.iter().map(|p| plane.classify(p, tolerance)))
            .collect();
        if !sides.contains(&PlaneClassification::Front) {
            return (Some(self.clone()), None);
        }
        if !sides.contains(&PlaneClassification::Back) {
            return (None, Some(self.clone()));
        }

        let mut back = Vec::new();
        let mut front = Vec::new();
        let min_area = tolerance * tolerance;

        for face in &self.faces {
            let on_plane = face
                .points
                .iter()
                .all(|p| plane.classify(p, tolerance) == PlaneClassification::OnPlane);
            if on_plane {
                if face.plane.normal.dot(&plane.normal) > 0.0 {
                    back.push(face.clone());
                } else {
                    front.push(face.clone());
                }
                continue;
            }

            let (b, f) = polygon::split(&face.points, plane, tolerance);
            if b.len() >= 3 && polygon::area(&b) > min_area {
                back.push(PieceFace {
                    points: b,
                    plane: face.plane,
                    origin: face.origin,
                });
            }
            if f.len() >= 3 && polygon::area(&f) > min_area {
                front.push(PieceFace {
                    points: f,
                    plane: face.plane,
                    origin: face.origin,
                });
            }
        }

        let cap = self.section(plane, tolerance);
        if cap.len() >= 3 && polygon::area(&cap) > min_area {
            let mut reversed = cap.clone();
            reversed.reverse();
            back.push(PieceFace {
                points: cap,
                plane: *plane,
                origin,
            });
            front.push(PieceFace {
                points: reversed,
                plane: plane.flipped(),
                origin,
            });
        }

        let close = |faces: Vec<PieceFace>| (faces.len() >= 4).then(|| ConvexPiece { faces });
        (close(back), close(front))
    }
}
