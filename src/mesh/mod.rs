// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut mesh: arena storage for everything the cutter creates
//!
//! Points, sides, facets, volume cells and boundary cells live in flat
//! vectors owned by [`CutMesh`]. Records refer to each other through typed
//! indices, never through references, so the facet/cell/boundary-cell
//! relations can be many-to-many without ownership cycles.

mod piece;
mod point;

pub use piece::{ConvexPiece, FaceOrigin, PieceFace};
pub use point::PointPool;

use crate::dofset::NodalDofSets;
use crate::geometry::{BoundingBox, ElementShape, Plane, SideShape};
use crate::integration::IntegrationRule;
use nalgebra::{Matrix2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index into the point pool
    PointId
);
arena_id!(
    /// Index into the side arena
    SideId
);
arena_id!(
    /// Index into the element arena
    ElementId
);
arena_id!(FacetId);
arena_id!(VolumeCellId);
arena_id!(BoundaryCellId);

/// Location relative to the cutting interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Undecided,
    Inside,
    Outside,
    OnCutSurface,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Undecided => "undecided",
            Position::Inside => "inside",
            Position::Outside => "outside",
            Position::OnCutSurface => "on_cut_surface",
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, Position::Undecided)
    }
}

/// Where a side comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOrigin {
    /// Index of the cutter mesh passed to `prepare`
    Cutter(usize),
    /// Zero contour of the level set inside a background element
    LevelSet(ElementId),
}

/// Cutting side
#[derive(Debug, Clone)]
pub struct Side {
    pub gid: usize,
    pub shape: SideShape,
    /// Node ids including the mesh id offset (empty for level-set sides)
    pub nodes: Vec<usize>,
    /// Corner coordinates used for cutting
    pub corners: Vec<Point3<f64>>,
    pub points: Vec<PointId>,
    /// Offset shift applied to each corner before cutting
    pub node_shifts: Vec<Vector3<f64>>,
    pub origin: SideOrigin,
    pub marked: bool,
    /// Triangles after self-cut refinement
    pub sub_sides: Vec<[PointId; 3]>,
    pub boundary_cells: Vec<BoundaryCellId>,
    pub bbox: BoundingBox,
}

impl Side {
    pub fn is_level_set(&self) -> bool {
        matches!(self.origin, SideOrigin::LevelSet(_))
    }

    /// Triangles of the unrefined side
    pub fn triangles(&self) -> Vec<[Point3<f64>; 3]> {
        self.shape
            .triangles()
            .iter()
            .map(|t| [self.corners[t[0]], self.corners[t[1]], self.corners[t[2]]])
            .collect()
    }

    pub fn plane(&self) -> Option<Plane> {
        Plane::from_triangle(&self.corners[0], &self.corners[1], &self.corners[2])
    }

    /// Parametric coordinates of a point on the side
    ///
    /// Barycentric `(r, s)` for triangles, bilinear `(r, s)` in [-1, 1]^2 for
    /// quads. Points off the side are projected along the normal.
    pub fn local_coordinates(&self, point: &Point3<f64>) -> Vector2<f64> {
        match self.shape {
            SideShape::Tri3 => {
                let e1 = self.corners[1] - self.corners[0];
                let e2 = self.corners[2] - self.corners[0];
                solve_tangential(&e1, &e2, &(point - self.corners[0]))
            }
            SideShape::Quad4 => {
                let mut rs = Vector2::zeros();
                for _ in 0..25 {
                    let (r, s) = (rs.x, rs.y);
                    let x = self.interpolate_point(r, s);
                    let dr = (self.corners[1] - self.corners[0]) * (1.0 - s)
                        + (self.corners[2] - self.corners[3]) * (1.0 + s);
                    let ds = (self.corners[3] - self.corners[0]) * (1.0 - r)
                        + (self.corners[2] - self.corners[1]) * (1.0 + r);
                    let step = solve_tangential(&(dr * 0.25), &(ds * 0.25), &(point - x));
                    rs += step;
                    if step.norm() < 1e-13 {
                        break;
                    }
                }
                rs
            }
        }
    }

    fn interpolate_point(&self, r: f64, s: f64) -> Point3<f64> {
        let values = self.shape.shape_functions(r, s);
        Point3::from(
            self.corners
                .iter()
                .zip(&values)
                .fold(Vector3::zeros(), |acc, (c, n)| acc + c.coords * *n),
        )
    }

    /// Offset shift at a point, interpolated from the corner shifts
    pub fn shift_at(&self, point: &Point3<f64>) -> Vector3<f64> {
        if self.node_shifts.iter().all(|s| s.norm() == 0.0) {
            return Vector3::zeros();
        }
        let rs = self.local_coordinates(point);
        let values = match self.shape {
            SideShape::Tri3 => vec![1.0 - rs.x - rs.y, rs.x, rs.y],
            SideShape::Quad4 => self.shape.shape_functions(rs.x, rs.y),
        };
        self.node_shifts
            .iter()
            .zip(&values)
            .fold(Vector3::zeros(), |acc, (s, n)| acc + s * *n)
    }
}

/// Least-squares `(a, b)` with `a * e1 + b * e2 ≈ d`
fn solve_tangential(e1: &Vector3<f64>, e2: &Vector3<f64>, d: &Vector3<f64>) -> Vector2<f64> {
    let m = Matrix2::new(e1.dot(e1), e1.dot(e2), e2.dot(e1), e2.dot(e2));
    let rhs = Vector2::new(e1.dot(d), e2.dot(d));
    m.try_inverse().map_or(Vector2::zeros(), |inv| inv * rhs)
}

/// Background element as seen by the cutter
#[derive(Debug, Clone)]
pub struct Element {
    pub gid: usize,
    pub shape: ElementShape,
    pub nodes: Vec<usize>,
    pub corners: Vec<Point3<f64>>,
    pub bbox: BoundingBox,
    /// Nodal level-set values, when cutting with a level set
    pub level_set: Option<Vec<f64>>,
    /// Overlaps a cutter side or has a level-set sign change
    pub registered: bool,
    /// Sides found by collision detection, ascending
    pub candidate_sides: Vec<SideId>,
    pub level_set_sides: Vec<SideId>,
    pub cells: Vec<VolumeCellId>,
    pub facets: Vec<FacetId>,
    pub boundary_cells: Vec<BoundaryCellId>,
}

impl Element {
    /// More than one volume cell, or any interface patch
    pub fn is_cut(&self) -> bool {
        self.cells.len() > 1 || !self.boundary_cells.is_empty()
    }

    /// Face node ids (global) for a local face
    pub fn face_nodes(&self, face: usize) -> Vec<usize> {
        self.shape.faces()[face]
            .iter()
            .map(|&i| self.nodes[i])
            .collect()
    }
}

/// Facet classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    /// Part of a background element face (local face index)
    ElementSide(usize),
    /// Lies on a cutter or level-set side
    CutSide(SideId),
    /// Cutting-plane face not covered by any side
    Internal,
}

/// Planar polygon bounding one or two volume cells
#[derive(Debug, Clone)]
pub struct Facet {
    pub element: ElementId,
    pub kind: FacetKind,
    pub points: Vec<PointId>,
    pub coords: Vec<Point3<f64>>,
    /// Outward normal with respect to the first cell
    pub normal: Vector3<f64>,
    pub cells: Vec<VolumeCellId>,
}

impl Facet {
    pub fn area(&self) -> f64 {
        crate::geometry::polygon::area(&self.coords)
    }

    pub fn on_interface(&self) -> bool {
        matches!(self.kind, FacetKind::CutSide(_))
    }
}

/// Connected sub-volume of one element
#[derive(Debug, Clone)]
pub struct VolumeCell {
    pub element: ElementId,
    /// Index within the element, in creation order
    pub local_index: usize,
    pub position: Position,
    pub pieces: Vec<ConvexPiece>,
    pub facets: Vec<FacetId>,
    pub boundary_cells: Vec<BoundaryCellId>,
    pub rule: IntegrationRule,
}

impl VolumeCell {
    /// Geometric volume of the pieces
    pub fn geometric_volume(&self) -> f64 {
        self.pieces.iter().map(|p| p.volume()).sum()
    }

    /// Volume from the integration rule
    pub fn volume(&self) -> f64 {
        self.rule.volume()
    }

    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        self.pieces.iter().any(|p| p.contains(point, tolerance))
    }

    /// A point strictly inside the cell
    pub fn interior_point(&self) -> Point3<f64> {
        self.pieces
            .iter()
            .max_by(|a, b| a.volume().total_cmp(&b.volume()))
            .map(|p| p.centroid())
            .unwrap_or_else(Point3::origin)
    }
}

/// Interface patch on a side, attached to one volume cell
#[derive(Debug, Clone)]
pub struct BoundaryCell {
    pub side: SideId,
    pub cell: VolumeCellId,
    pub facet: FacetId,
    pub points: Vec<Point3<f64>>,
    /// Side normal, pointing from inside to outside
    pub normal: Vector3<f64>,
}

impl BoundaryCell {
    pub fn area(&self) -> f64 {
        crate::geometry::polygon::area(&self.points)
    }
}

/// All cutter data of one rank's partition
#[derive(Debug, Clone)]
pub struct CutMesh {
    pub points: PointPool,
    pub sides: Vec<Side>,
    pub elements: Vec<Element>,
    pub facets: Vec<Facet>,
    pub cells: Vec<VolumeCell>,
    pub boundary_cells: Vec<BoundaryCell>,
    /// Cells connected through element faces, each pair once with the
    /// lower id first
    pub links: Vec<(VolumeCellId, VolumeCellId)>,
    pub node_owner: BTreeMap<usize, usize>,
    pub node_positions: BTreeMap<usize, Position>,
    pub node_dofsets: BTreeMap<usize, NodalDofSets>,
    /// Absolute point merge radius
    pub tolerance: f64,
    element_lookup: BTreeMap<usize, ElementId>,
    side_lookup: BTreeMap<usize, SideId>,
}

impl CutMesh {
    pub fn new(tolerance: f64) -> Self {
        Self {
            points: PointPool::new(tolerance),
            sides: Vec::new(),
            elements: Vec::new(),
            facets: Vec::new(),
            cells: Vec::new(),
            boundary_cells: Vec::new(),
            links: Vec::new(),
            node_owner: BTreeMap::new(),
            node_positions: BTreeMap::new(),
            node_dofsets: BTreeMap::new(),
            tolerance,
            element_lookup: BTreeMap::new(),
            side_lookup: BTreeMap::new(),
        }
    }

    /// Area below which patches count as empty
    pub fn area_tolerance(&self) -> f64 {
        self.tolerance * self.length_scale() * 10.0
    }

    /// Volume below which pieces count as empty
    pub fn volume_tolerance(&self) -> f64 {
        self.area_tolerance() * self.length_scale()
    }

    fn length_scale(&self) -> f64 {
        self.elements
            .iter()
            .map(|e| e.bbox.diagonal())
            .fold(0.0, f64::max)
            .max(self.tolerance)
    }

    pub fn add_side(
        &mut self,
        gid: usize,
        shape: SideShape,
        nodes: Vec<usize>,
        corners: Vec<Point3<f64>>,
        node_shifts: Vec<Vector3<f64>>,
        origin: SideOrigin,
    ) -> SideId {
        let id = SideId(self.sides.len());
        let points = corners.iter().map(|c| self.points.get_or_insert(c)).collect();
        let bbox = BoundingBox::from_points(&corners);
        self.sides.push(Side {
            gid,
            shape,
            nodes,
            corners,
            points,
            node_shifts,
            origin,
            marked: false,
            sub_sides: Vec::new(),
            boundary_cells: Vec::new(),
            bbox,
        });
        self.side_lookup.insert(gid, id);
        id
    }

    pub fn add_element(
        &mut self,
        gid: usize,
        shape: ElementShape,
        nodes: Vec<usize>,
        corners: Vec<Point3<f64>>,
        level_set: Option<Vec<f64>>,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        let bbox = BoundingBox::from_points(&corners);
        self.elements.push(Element {
            gid,
            shape,
            nodes,
            corners,
            bbox,
            level_set,
            registered: false,
            candidate_sides: Vec::new(),
            level_set_sides: Vec::new(),
            cells: Vec::new(),
            facets: Vec::new(),
            boundary_cells: Vec::new(),
        });
        self.element_lookup.insert(gid, id);
        id
    }

    pub fn element_by_gid(&self, gid: usize) -> Option<ElementId> {
        self.element_lookup.get(&gid).copied()
    }

    pub fn side_by_gid(&self, gid: usize) -> Option<SideId> {
        self.side_lookup.get(&gid).copied()
    }

    /// Cutter side whose node set equals `nodes`, in any order
    pub fn side_by_nodes(&self, nodes: &[usize]) -> Option<SideId> {
        let mut wanted = nodes.to_vec();
        wanted.sort_unstable();
        self.sides
            .iter()
            .position(|s| {
                let mut have = s.nodes.clone();
                have.sort_unstable();
                !have.is_empty() && have == wanted
            })
            .map(SideId)
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn side(&self, id: SideId) -> &Side {
        &self.sides[id.0]
    }

    pub fn cell(&self, id: VolumeCellId) -> &VolumeCell {
        &self.cells[id.0]
    }

    pub fn facet(&self, id: FacetId) -> &Facet {
        &self.facets[id.0]
    }

    pub fn boundary_cell(&self, id: BoundaryCellId) -> &BoundaryCell {
        &self.boundary_cells[id.0]
    }

    /// Refined triangles of a side in coordinates
    pub fn sub_side_triangles(&self, id: SideId) -> Vec<[Point3<f64>; 3]> {
        let side = &self.sides[id.0];
        if side.sub_sides.is_empty() {
            return side.triangles();
        }
        side.sub_sides
            .iter()
            .map(|t| t.map(|p| *self.points.coords(p)))
            .collect()
    }

    /// Elements containing each node, ascending by element index
    pub fn node_elements(&self) -> BTreeMap<usize, Vec<ElementId>> {
        let mut map: BTreeMap<usize, Vec<ElementId>> = BTreeMap::new();
        for (i, element) in self.elements.iter().enumerate() {
            for n in &element.nodes {
                map.entry(*n).or_default().push(ElementId(i));
            }
        }
        map
    }

    /// `(element gid, local cell index)` of a cell
    pub fn cell_key(&self, id: VolumeCellId) -> (usize, usize) {
        let cell = &self.cells[id.0];
        (self.elements[cell.element.0].gid, cell.local_index)
    }

    /// Remove everything created by cutting, keeping prepared inputs
    pub fn clear_cut(&mut self) {
        self.facets.clear();
        self.cells.clear();
        self.boundary_cells.clear();
        self.links.clear();
        self.node_positions.clear();
        self.node_dofsets.clear();
        for element in &mut self.elements {
            element.cells.clear();
            element.facets.clear();
            element.boundary_cells.clear();
            element.candidate_sides.clear();
        }
        for side in &mut self.sides {
            side.boundary_cells.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad_side() -> CutMesh {
        let mut mesh = CutMesh::new(1e-10);
        let corners = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        mesh.add_side(
            7,
            SideShape::Quad4,
            vec![10, 11, 12, 13],
            corners,
            vec![Vector3::zeros(); 4],
            SideOrigin::Cutter(0),
        );
        mesh
    }

    #[test]
    fn test_side_lookup() {
        let mesh = quad_side();
        assert_eq!(mesh.side_by_gid(7), Some(SideId(0)));
        assert_eq!(mesh.side_by_nodes(&[13, 11, 12, 10]), Some(SideId(0)));
        assert_eq!(mesh.side_by_nodes(&[10, 11, 12]), None);
        assert_eq!(mesh.points.len(), 4);
    }

    #[test]
    fn test_quad_local_coordinates() {
        let mesh = quad_side();
        let side = mesh.side(SideId(0));
        let rs = side.local_coordinates(&Point3::new(1.5, 0.25, 0.3));
        assert_relative_eq!(rs.x, 0.5, epsilon = 1e-10);
        assert_relative_eq!(rs.y, -0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_triangle_local_coordinates() {
        let mut mesh = CutMesh::new(1e-10);
        let id = mesh.add_side(
            0,
            SideShape::Tri3,
            vec![0, 1, 2],
            vec![
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            vec![Vector3::zeros(); 3],
            SideOrigin::Cutter(0),
        );
        let rs = mesh.side(id).local_coordinates(&Point3::new(0.25, 0.5, 1.0));
        assert_relative_eq!(rs.x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(rs.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_shift_interpolation() {
        let mut mesh = CutMesh::new(1e-10);
        let id = mesh.add_side(
            0,
            SideShape::Tri3,
            vec![0, 1, 2],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Vector3::new(0.0, 0.0, 0.1), Vector3::zeros(), Vector3::zeros()],
            SideOrigin::Cutter(0),
        );
        let shift = mesh.side(id).shift_at(&Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(shift.z, 0.05, epsilon = 1e-12);
    }
}
