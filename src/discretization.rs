// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Input discretizations consumed by the cutter
//!
//! The background mesh, cutter meshes and level-set field are owned by the
//! caller. The cutter reads them once in `prepare()` and only keeps ids and
//! coordinates from then on.

use crate::error::{CutError, EntityRef, Result};
use crate::geometry::{BoundingBox, ElementShape, SideShape};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Background node with its owning rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    pub coords: Point3<f64>,
    #[serde(default)]
    pub owner: usize,
}

/// Background element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInput {
    pub id: usize,
    pub shape: ElementShape,
    pub nodes: Vec<usize>,
}

/// Volumetric mesh being cut, as seen by one rank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundMesh {
    pub nodes: BTreeMap<usize, Node>,
    pub elements: BTreeMap<usize, ElementInput>,
    /// Nodal displacement mapping reference to current configuration
    #[serde(default)]
    pub displacement: BTreeMap<usize, Vector3<f64>>,
    /// Number of nodes in the whole distributed mesh
    #[serde(default)]
    pub global_node_count: Option<usize>,
}

impl BackgroundMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: usize, coords: Point3<f64>) {
        self.add_owned_node(id, coords, 0);
    }

    pub fn add_owned_node(&mut self, id: usize, coords: Point3<f64>, owner: usize) {
        self.nodes.insert(id, Node { id, coords, owner });
    }

    /// Add an element; its nodes must already exist
    pub fn add_element(&mut self, id: usize, shape: ElementShape, nodes: Vec<usize>) -> Result<()> {
        if nodes.len() != shape.num_nodes() {
            return Err(CutError::geometry(
                EntityRef::Element(id),
                format!(
                    "{} expects {} nodes, got {}",
                    shape.as_str(),
                    shape.num_nodes(),
                    nodes.len()
                ),
            ));
        }
        if let Some(missing) = nodes.iter().find(|n| !self.nodes.contains_key(n)) {
            return Err(CutError::geometry(
                EntityRef::Element(id),
                format!("references unknown node {missing}"),
            ));
        }
        self.elements.insert(id, ElementInput { id, shape, nodes });
        Ok(())
    }

    pub fn set_displacement(&mut self, node: usize, displacement: Vector3<f64>) {
        self.displacement.insert(node, displacement);
    }

    pub fn global_node_count(&self) -> usize {
        self.global_node_count.unwrap_or(self.nodes.len())
    }

    /// Current position of a node (reference plus displacement)
    pub fn position(&self, node: usize) -> Option<Point3<f64>> {
        let base = self.nodes.get(&node)?.coords;
        Some(match self.displacement.get(&node) {
            Some(d) => base + d,
            None => base,
        })
    }

    /// Current corner coordinates of an element
    pub fn element_corners(&self, element: &ElementInput) -> Result<Vec<Point3<f64>>> {
        element
            .nodes
            .iter()
            .map(|&n| {
                self.position(n).ok_or_else(|| {
                    CutError::geometry(
                        EntityRef::Element(element.id),
                        format!("references unknown node {n}"),
                    )
                })
            })
            .collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for id in self.nodes.keys() {
            if let Some(p) = self.position(*id) {
                bbox.expand_to_include(&p);
            }
        }
        bbox
    }

    /// Sum of element volumes from their tetrahedral decompositions
    pub fn volume(&self) -> f64 {
        self.elements
            .values()
            .filter_map(|e| self.element_corners(e).ok().map(|c| (e.shape, c)))
            .map(|(shape, corners)| {
                shape
                    .tetrahedra()
                    .iter()
                    .map(|t| {
                        crate::geometry::robust_predicates::oriented_volume(
                            &corners[t[0]],
                            &corners[t[1]],
                            &corners[t[2]],
                            &corners[t[3]],
                        ) / 6.0
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    /// Structured box of hexahedra
    pub fn structured_hex_box(divisions: [usize; 3], min: Point3<f64>, max: Point3<f64>) -> Self {
        let [nx, ny, nz] = divisions.map(|d| d.max(1));
        let step = Vector3::new(
            (max.x - min.x) / nx as f64,
            (max.y - min.y) / ny as f64,
            (max.z - min.z) / nz as f64,
        );
        let node_id = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);

        let mut mesh = Self::new();
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    let p = Point3::new(
                        min.x + step.x * i as f64,
                        min.y + step.y * j as f64,
                        min.z + step.z * k as f64,
                    );
                    mesh.add_node(node_id(i, j, k), p);
                }
            }
        }
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let nodes = vec![
                        node_id(i, j, k),
                        node_id(i + 1, j, k),
                        node_id(i + 1, j + 1, k),
                        node_id(i, j + 1, k),
                        node_id(i, j, k + 1),
                        node_id(i + 1, j, k + 1),
                        node_id(i + 1, j + 1, k + 1),
                        node_id(i, j + 1, k + 1),
                    ];
                    let id = i + nx * (j + ny * k);
                    mesh.elements.insert(
                        id,
                        ElementInput {
                            id,
                            shape: ElementShape::Hex8,
                            nodes,
                        },
                    );
                }
            }
        }
        mesh
    }

    /// Split into per-rank views with a ghost layer
    ///
    /// Elements are dealt out in contiguous id blocks. A node is owned by the
    /// lowest rank owning an element around it, and every rank also receives
    /// all elements touching its owned nodes, so owners always see the full
    /// support of their nodes.
    pub fn partition(&self, ranks: usize) -> Vec<BackgroundMesh> {
        let ranks = ranks.max(1);
        let count = self.elements.len();
        let element_rank: BTreeMap<usize, usize> = self
            .elements
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, (i * ranks / count.max(1)).min(ranks - 1)))
            .collect();

        let mut node_owner: BTreeMap<usize, usize> = BTreeMap::new();
        for element in self.elements.values() {
            let rank = element_rank[&element.id];
            for n in &element.nodes {
                let owner = node_owner.entry(*n).or_insert(rank);
                *owner = (*owner).min(rank);
            }
        }

        (0..ranks)
            .map(|rank| {
                let mut local = BackgroundMesh {
                    global_node_count: Some(self.global_node_count()),
                    ..Default::default()
                };
                for element in self.elements.values() {
                    let owned = element_rank[&element.id] == rank;
                    let supports_owned = element
                        .nodes
                        .iter()
                        .any(|n| node_owner.get(n) == Some(&rank));
                    if !(owned || supports_owned) {
                        continue;
                    }
                    for n in &element.nodes {
                        if let Some(node) = self.nodes.get(n) {
                            let owner = node_owner.get(n).copied().unwrap_or(rank);
                            local.add_owned_node(*n, node.coords, owner);
                            if let Some(d) = self.displacement.get(n) {
                                local.set_displacement(*n, *d);
                            }
                        }
                    }
                    local.elements.insert(element.id, element.clone());
                }
                local
            })
            .collect()
    }
}

/// Cutter side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideInput {
    pub id: usize,
    pub shape: SideShape,
    pub nodes: Vec<usize>,
}

/// Coordinate perturbation applied to a node set before cutting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetMarker {
    pub node_ids: Vec<usize>,
    /// 0, 1 or 2
    pub axis: usize,
    pub value: f64,
}

/// Explicit cutting surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CutterMesh {
    pub nodes: BTreeMap<usize, Point3<f64>>,
    pub sides: Vec<SideInput>,
    #[serde(default)]
    pub displacement: BTreeMap<usize, Vector3<f64>>,
    /// Added to side and node ids of this mesh
    #[serde(default)]
    pub id_offset: usize,
    /// Local side ids that must intersect the background mesh
    #[serde(default)]
    pub marked_sides: BTreeSet<usize>,
    #[serde(default)]
    pub offsets: Vec<OffsetMarker>,
}

impl CutterMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_offset(mut self, offset: usize) -> Self {
        self.id_offset = offset;
        self
    }

    pub fn add_node(&mut self, id: usize, coords: Point3<f64>) {
        self.nodes.insert(id, coords);
    }

    pub fn add_side(&mut self, id: usize, shape: SideShape, nodes: Vec<usize>) -> Result<()> {
        let gid = id + self.id_offset;
        if nodes.len() != shape.num_nodes() {
            return Err(CutError::geometry(
                EntityRef::Side(gid),
                format!("{} expects {} nodes, got {}", shape.as_str(), shape.num_nodes(), nodes.len()),
            ));
        }
        if let Some(missing) = nodes.iter().find(|n| !self.nodes.contains_key(n)) {
            return Err(CutError::geometry(
                EntityRef::Side(gid),
                format!("references unknown node {missing}"),
            ));
        }
        self.sides.push(SideInput { id, shape, nodes });
        Ok(())
    }

    pub fn mark_side(&mut self, id: usize) {
        self.marked_sides.insert(id);
    }

    pub fn add_offset(&mut self, marker: OffsetMarker) {
        self.offsets.push(marker);
    }

    /// Accumulated offset shift of a node
    pub fn offset_shift(&self, node: usize) -> Vector3<f64> {
        let mut shift = Vector3::zeros();
        for marker in &self.offsets {
            if marker.axis < 3 && marker.node_ids.contains(&node) {
                shift[marker.axis] += marker.value;
            }
        }
        shift
    }

    /// Position used for cutting: reference, displacement and offsets
    pub fn position(&self, node: usize) -> Option<Point3<f64>> {
        let mut p = *self.nodes.get(&node)?;
        if let Some(d) = self.displacement.get(&node) {
            p += *d;
        }
        Some(p + self.offset_shift(node))
    }

    /// Single planar quad
    pub fn quad(corners: [Point3<f64>; 4]) -> Self {
        let mut mesh = Self::new();
        for (i, c) in corners.iter().enumerate() {
            mesh.add_node(i, *c);
        }
        mesh.sides.push(SideInput {
            id: 0,
            shape: SideShape::Quad4,
            nodes: vec![0, 1, 2, 3],
        });
        mesh
    }

    /// Closed triangulated box surface with outward normals
    pub fn box_surface(min: Point3<f64>, max: Point3<f64>) -> Self {
        let mut mesh = Self::new();
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..2 {
                    let p = Point3::new(
                        if i == 0 { min.x } else { max.x },
                        if j == 0 { min.y } else { max.y },
                        if k == 0 { min.z } else { max.z },
                    );
                    mesh.add_node(i + 2 * j + 4 * k, p);
                }
            }
        }
        // Outward loops for the i + 2j + 4k corner numbering
        const QUADS: [[usize; 4]; 6] = [
            [0, 2, 3, 1],
            [4, 5, 7, 6],
            [0, 1, 5, 4],
            [1, 3, 7, 5],
            [3, 2, 6, 7],
            [2, 0, 4, 6],
        ];
        for (i, q) in QUADS.iter().enumerate() {
            mesh.sides.push(SideInput {
                id: 2 * i,
                shape: SideShape::Tri3,
                nodes: vec![q[0], q[1], q[2]],
            });
            mesh.sides.push(SideInput {
                id: 2 * i + 1,
                shape: SideShape::Tri3,
                nodes: vec![q[0], q[2], q[3]],
            });
        }
        mesh
    }
}

/// Scalar level-set value per background node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelSetField {
    pub values: BTreeMap<usize, f64>,
}

impl LevelSetField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample a function at the current node positions
    pub fn from_fn(mesh: &BackgroundMesh, f: impl Fn(&Point3<f64>) -> f64) -> Self {
        let values = mesh
            .nodes
            .keys()
            .filter_map(|id| mesh.position(*id).map(|p| (*id, f(&p))))
            .collect();
        Self { values }
    }

    pub fn set(&mut self, node: usize, value: f64) {
        self.values.insert(node, value);
    }

    pub fn value(&self, node: usize) -> Option<f64> {
        self.values.get(&node).copied()
    }
}
