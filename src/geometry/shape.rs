// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Element and side shape tables
//!
//! Shapes are a closed set, so each one is an enum variant backed by static
//! tables: reference corners, outward face lists, tetrahedral decompositions,
//! and shape functions with their derivatives.

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Background element shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementShape {
    Tet4,
    Hex8,
    Wedge6,
    Pyramid5,
}

const TET4_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[0, 3, 2], &[1, 2, 3]];

const HEX8_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

const WEDGE6_FACES: &[&[usize]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];

const PYRAMID5_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

const TET4_TETS: &[[usize; 4]] = &[[0, 1, 2, 3]];

/// Six tetrahedra around the 0-6 diagonal
const HEX8_TETS: &[[usize; 4]] = &[
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

const WEDGE6_TETS: &[[usize; 4]] = &[[0, 1, 2, 5], [0, 1, 5, 4], [0, 4, 5, 3]];

const PYRAMID5_TETS: &[[usize; 4]] = &[[0, 1, 2, 4], [0, 2, 3, 4]];

const HEX8_CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

impl ElementShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementShape::Tet4 => "tet4",
            ElementShape::Hex8 => "hex8",
            ElementShape::Wedge6 => "wedge6",
            ElementShape::Pyramid5 => "pyramid5",
        }
    }

    pub fn num_nodes(&self) -> usize {
        match self {
            ElementShape::Tet4 => 4,
            ElementShape::Hex8 => 8,
            ElementShape::Wedge6 => 6,
            ElementShape::Pyramid5 => 5,
        }
    }

    /// Face node lists, counter-clockwise seen from outside
    pub fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            ElementShape::Tet4 => TET4_FACES,
            ElementShape::Hex8 => HEX8_FACES,
            ElementShape::Wedge6 => WEDGE6_FACES,
            ElementShape::Pyramid5 => PYRAMID5_FACES,
        }
    }

    /// Positively oriented tetrahedral decomposition
    pub fn tetrahedra(&self) -> &'static [[usize; 4]] {
        match self {
            ElementShape::Tet4 => TET4_TETS,
            ElementShape::Hex8 => HEX8_TETS,
            ElementShape::Wedge6 => WEDGE6_TETS,
            ElementShape::Pyramid5 => PYRAMID5_TETS,
        }
    }

    /// Reference coordinates of the corner nodes
    pub fn reference_nodes(&self) -> Vec<Point3<f64>> {
        match self {
            ElementShape::Tet4 => vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            ElementShape::Hex8 => HEX8_CORNERS
                .iter()
                .map(|c| Point3::new(c[0], c[1], c[2]))
                .collect(),
            ElementShape::Wedge6 => vec![
                Point3::new(0.0, 0.0, -1.0),
                Point3::new(1.0, 0.0, -1.0),
                Point3::new(0.0, 1.0, -1.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            ElementShape::Pyramid5 => vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
        }
    }

    /// Reference point where the Jacobian is checked
    pub fn reference_center(&self) -> Point3<f64> {
        match self {
            ElementShape::Tet4 => Point3::new(0.25, 0.25, 0.25),
            ElementShape::Hex8 => Point3::origin(),
            ElementShape::Wedge6 => Point3::new(1.0 / 3.0, 1.0 / 3.0, 0.0),
            ElementShape::Pyramid5 => Point3::new(0.0, 0.0, 0.25),
        }
    }

    /// Shape function values at a reference point
    pub fn shape_functions(&self, xi: &Point3<f64>) -> Vec<f64> {
        let (r, s, t) = (xi.x, xi.y, xi.z);
        match self {
            ElementShape::Tet4 => vec![1.0 - r - s - t, r, s, t],
            ElementShape::Hex8 => HEX8_CORNERS
                .iter()
                .map(|c| 0.125 * (1.0 + c[0] * r) * (1.0 + c[1] * s) * (1.0 + c[2] * t))
                .collect(),
            ElementShape::Wedge6 => {
                let tri = [1.0 - r - s, r, s];
                let lower = 0.5 * (1.0 - t);
                let upper = 0.5 * (1.0 + t);
                tri.iter()
                    .map(|l| l * lower)
                    .chain(tri.iter().map(|l| l * upper))
                    .collect()
            }
            ElementShape::Pyramid5 => {
                let rational = if (1.0 - t).abs() > 1e-14 {
                    r * s * t / (1.0 - t)
                } else {
                    0.0
                };
                let mut values: Vec<f64> = HEX8_CORNERS[..4]
                    .iter()
                    .map(|c| {
                        0.25 * ((1.0 + c[0] * r) * (1.0 + c[1] * s) - t
                            + c[0] * c[1] * rational)
                    })
                    .collect();
                values.push(t);
                values
            }
        }
    }

    /// Shape function derivatives with respect to the reference coordinates
    pub fn shape_derivatives(&self, xi: &Point3<f64>) -> Vec<Vector3<f64>> {
        let (r, s, t) = (xi.x, xi.y, xi.z);
        match self {
            ElementShape::Tet4 => vec![
                Vector3::new(-1.0, -1.0, -1.0),
                Vector3::x(),
                Vector3::y(),
                Vector3::z(),
            ],
            ElementShape::Hex8 => HEX8_CORNERS
                .iter()
                .map(|c| {
                    Vector3::new(
                        0.125 * c[0] * (1.0 + c[1] * s) * (1.0 + c[2] * t),
                        0.125 * c[1] * (1.0 + c[0] * r) * (1.0 + c[2] * t),
                        0.125 * c[2] * (1.0 + c[0] * r) * (1.0 + c[1] * s),
                    )
                })
                .collect(),
            ElementShape::Wedge6 => {
                let tri = [1.0 - r - s, r, s];
                let dtri = [(-1.0, -1.0), (1.0, 0.0), (0.0, 1.0)];
                let mut out = Vec::with_capacity(6);
                for (sign, half) in [(-1.0, 0.5 * (1.0 - t)), (1.0, 0.5 * (1.0 + t))] {
                    for k in 0..3 {
                        out.push(Vector3::new(
                            dtri[k].0 * half,
                            dtri[k].1 * half,
                            0.5 * sign * tri[k],
                        ));
                    }
                }
                out
            }
            ElementShape::Pyramid5 => {
                let q = 1.0 - t;
                let (a, b, c) = if q.abs() > 1e-14 {
                    (s * t / q, r * t / q, r * s / (q * q))
                } else {
                    (0.0, 0.0, 0.0)
                };
                let mut out: Vec<Vector3<f64>> = HEX8_CORNERS[..4]
                    .iter()
                    .map(|k| {
                        let ab = k[0] * k[1];
                        Vector3::new(
                            0.25 * (k[0] * (1.0 + k[1] * s) + ab * a),
                            0.25 * (k[1] * (1.0 + k[0] * r) + ab * b),
                            0.25 * (-1.0 + ab * c),
                        )
                    })
                    .collect();
                out.push(Vector3::z());
                out
            }
        }
    }

    /// Jacobian matrix dx/dxi (columns are the reference directions)
    pub fn jacobian(&self, xi: &Point3<f64>, corners: &[Point3<f64>]) -> Matrix3<f64> {
        let derivatives = self.shape_derivatives(xi);
        let mut jac = Matrix3::zeros();
        for (x, d) in corners.iter().zip(&derivatives) {
            jac += x.coords * d.transpose();
        }
        jac
    }

    /// Map a reference point to physical coordinates
    pub fn map_to_physical(&self, xi: &Point3<f64>, corners: &[Point3<f64>]) -> Point3<f64> {
        let values = self.shape_functions(xi);
        let sum = corners
            .iter()
            .zip(&values)
            .fold(Vector3::zeros(), |acc, (x, n)| acc + x.coords * *n);
        Point3::from(sum)
    }

    /// Interpolate nodal scalars at a reference point
    pub fn interpolate(&self, xi: &Point3<f64>, nodal: &[f64]) -> f64 {
        self.shape_functions(xi)
            .iter()
            .zip(nodal)
            .map(|(n, v)| n * v)
            .sum()
    }
}

/// Cutter side shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideShape {
    Tri3,
    Quad4,
}

impl SideShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideShape::Tri3 => "tri3",
            SideShape::Quad4 => "quad4",
        }
    }

    pub fn num_nodes(&self) -> usize {
        match self {
            SideShape::Tri3 => 3,
            SideShape::Quad4 => 4,
        }
    }

    /// Triangles the side is cut as
    pub fn triangles(&self) -> &'static [[usize; 3]] {
        match self {
            SideShape::Tri3 => &[[0, 1, 2]],
            SideShape::Quad4 => &[[0, 1, 2], [0, 2, 3]],
        }
    }

    pub fn from_node_count(count: usize) -> Option<Self> {
        match count {
            3 => Some(SideShape::Tri3),
            4 => Some(SideShape::Quad4),
            _ => None,
        }
    }

    /// Shape function values at local coordinates (r, s)
    pub fn shape_functions(&self, r: f64, s: f64) -> Vec<f64> {
        match self {
            SideShape::Tri3 => vec![1.0 - r - s, r, s],
            SideShape::Quad4 => vec![
                0.25 * (1.0 - r) * (1.0 - s),
                0.25 * (1.0 + r) * (1.0 - s),
                0.25 * (1.0 + r) * (1.0 + s),
                0.25 * (1.0 - r) * (1.0 + s),
            ],
        }
    }
}
