// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Exact element cutting
//!
//! An element is treated as a convex polyhedron and split, one candidate
//! triangle at a time, by the triangle's supporting plane wherever the
//! triangle actually crosses the current piece. The result is a set of
//! convex pieces none of which has a cutter triangle running through its
//! interior. Two pieces belong to the same volume cell when they touch
//! across a face patch that the cutter leaves open.
//!
//! Facets and boundary cells are derived from the piece faces afterwards,
//! and cells of neighboring elements are linked across element faces.

use super::{candidate_triangles, CutTriangle};
use crate::error::{CutError, EntityRef, Result};
use crate::geometry::{polygon, BoundingBox, ElementShape, Plane};
use crate::mesh::{
    BoundaryCell, BoundaryCellId, ConvexPiece, CutMesh, ElementId, FaceOrigin, Facet, FacetId,
    FacetKind, PieceFace, PointId, Position, SideId, VolumeCell, VolumeCellId,
};
use ahash::AHashMap;
use disjoint::DisjointSet;
use nalgebra::Point3;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Pieces of one element grouped into volume cells
#[derive(Debug, Clone)]
pub struct ElementCut {
    pub pieces: Vec<ConvexPiece>,
    /// Piece indices per cell, cells ordered by their smallest piece index
    pub cells: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Copy)]
struct Tolerances {
    point: f64,
    area: f64,
    volume: f64,
}

impl Tolerances {
    fn of(mesh: &CutMesh) -> Self {
        Self {
            point: mesh.tolerance,
            area: mesh.area_tolerance(),
            volume: mesh.volume_tolerance(),
        }
    }
}

/// Area of `patch` covered by triangles lying in `plane`
fn coverage(patch: &[Point3<f64>], plane: &Plane, triangles: &[CutTriangle], tolerance: f64) -> f64 {
    triangles
        .iter()
        .filter(|t| t.plane.is_coplanar(plane, tolerance))
        .map(|t| polygon::overlap_area(patch, &t.points, tolerance))
        .sum()
}

/// Whether two pieces touch across a face patch not closed off by the cutter
fn open_contact(
    a: &ConvexPiece,
    b: &ConvexPiece,
    triangles: &[CutTriangle],
    tol: Tolerances,
) -> bool {
    for f in &a.faces {
        for g in &b.faces {
            let opposite = f.plane.normal.dot(&g.plane.normal) < -1.0 + 1e-8
                && (f.plane.offset + g.plane.offset).abs() <= tol.point;
            if !opposite {
                continue;
            }
            let shared = polygon::convex_intersection(&f.points, &g.points, tol.point);
            let area = polygon::area(&shared);
            if area <= tol.area {
                continue;
            }
            let covered = coverage(&shared, &f.plane, triangles, tol.point).min(area);
            if area - covered > tol.area {
                return true;
            }
        }
    }
    false
}

fn connected_pieces(pieces: &[ConvexPiece], triangles: &[CutTriangle], tol: Tolerances) -> Vec<Vec<usize>> {
    let mut sets = DisjointSet::with_len(pieces.len());
    for i in 0..pieces.len() {
        for j in i + 1..pieces.len() {
            if !sets.is_joined(i, j) && open_contact(&pieces[i], &pieces[j], triangles, tol) {
                sets.join(i, j);
            }
        }
    }
    let mut cells: Vec<Vec<usize>> = sets
        .sets()
        .into_iter()
        .map(|mut set| {
            set.sort_unstable();
            set
        })
        .collect();
    cells.sort_by_key(|set| set.first().copied());
    cells
}

fn split_pieces(
    element: ConvexPiece,
    triangles: &[CutTriangle],
    tol: Tolerances,
) -> Vec<ConvexPiece> {
    let mut pieces = vec![element];
    for (index, triangle) in triangles.iter().enumerate() {
        let reach = BoundingBox::from_points(&triangle.points).inflated(tol.point);
        let mut next = Vec::with_capacity(pieces.len() + 1);
        for piece in pieces {
            if !piece.bounding_box().intersects(&reach) {
                next.push(piece);
                continue;
            }
            let cap = piece.section(&triangle.plane, tol.point);
            if polygon::overlap_area(&cap, &triangle.points, tol.point) <= tol.area {
                next.push(piece);
                continue;
            }
            match piece.split(&triangle.plane, FaceOrigin::CutPlane(index), tol.point) {
                (Some(back), Some(front))
                    if back.volume() > tol.volume && front.volume() > tol.volume =>
                {
                    next.push(back);
                    next.push(front);
                }
                _ => next.push(piece),
            }
        }
        pieces = next;
    }
    pieces
}

fn cut_element(
    gid: usize,
    shape: ElementShape,
    corners: &[Point3<f64>],
    nodes: &[usize],
    triangles: &[CutTriangle],
    tol: Tolerances,
) -> Result<ElementCut> {
    let entity = EntityRef::Element(gid);
    let whole = ConvexPiece::from_element(shape, corners, nodes, tol.point)
        .ok_or_else(|| CutError::geometry(entity, "degenerate element face"))?;
    let volume = whole.volume();
    if volume <= tol.volume {
        return Err(CutError::geometry(
            entity,
            format!("non-positive element volume {volume:.6e}"),
        ));
    }

    let pieces = if triangles.is_empty() {
        vec![whole]
    } else {
        split_pieces(whole, triangles, tol)
    };
    let cells = if pieces.len() == 1 {
        vec![vec![0]]
    } else {
        connected_pieces(&pieces, triangles, tol)
    };
    Ok(ElementCut { pieces, cells })
}

/// Facet kind of a face created by a cutting plane
fn cut_face_kind(face: &PieceFace, triangles: &[CutTriangle], tol: Tolerances) -> FacetKind {
    let mut per_side: BTreeMap<SideId, f64> = BTreeMap::new();
    for t in triangles
        .iter()
        .filter(|t| t.plane.is_coplanar(&face.plane, tol.point))
    {
        *per_side.entry(t.side).or_default() +=
            polygon::overlap_area(&face.points, &t.points, tol.point);
    }
    let total: f64 = per_side.values().sum();
    if total <= tol.area {
        return FacetKind::Internal;
    }
    per_side
        .into_iter()
        .fold(None, |best: Option<(SideId, f64)>, (side, area)| match best {
            Some((_, a)) if a >= area => best,
            _ => Some((side, area)),
        })
        .map_or(FacetKind::Internal, |(side, _)| FacetKind::CutSide(side))
}

struct FaceRef {
    cell: VolumeCellId,
    piece: usize,
    face: usize,
    points: Vec<PointId>,
}

/// Store the cells, facets and boundary cells of one element
fn insert_cut(
    mesh: &mut CutMesh,
    element: ElementId,
    cut: ElementCut,
    triangles: &[CutTriangle],
    tol: Tolerances,
) {
    let mut piece_cell = vec![VolumeCellId(0); cut.pieces.len()];
    for (local, piece_ids) in cut.cells.iter().enumerate() {
        let id = VolumeCellId(mesh.cells.len());
        for &p in piece_ids {
            piece_cell[p] = id;
        }
        mesh.cells.push(VolumeCell {
            element,
            local_index: local,
            position: Position::Undecided,
            pieces: piece_ids.iter().map(|&p| cut.pieces[p].clone()).collect(),
            facets: Vec::new(),
            boundary_cells: Vec::new(),
            rule: Default::default(),
        });
        mesh.elements[element.0].cells.push(id);
    }

    // group identical faces; group order is creation order
    let mut groups: Vec<Vec<FaceRef>> = Vec::new();
    let mut lookup: AHashMap<Vec<PointId>, usize> = AHashMap::new();
    for (p, piece) in cut.pieces.iter().enumerate() {
        for (f, face) in piece.faces.iter().enumerate() {
            let mut points: Vec<PointId> =
                face.points.iter().map(|x| mesh.points.get_or_insert(x)).collect();
            points.dedup();
            while points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            if points.len() < 3 {
                continue;
            }
            let mut key = points.clone();
            key.sort_unstable();
            let entry = FaceRef {
                cell: piece_cell[p],
                piece: p,
                face: f,
                points,
            };
            match lookup.get(&key) {
                Some(&g) => groups[g].push(entry),
                None => {
                    lookup.insert(key, groups.len());
                    groups.push(vec![entry]);
                }
            }
        }
    }

    let mut votes: BTreeMap<VolumeCellId, Vec<Position>> = BTreeMap::new();
    for group in groups {
        let first = &group[0];
        let face = &cut.pieces[first.piece].faces[first.face];
        let kind = match face.origin {
            FaceOrigin::ElementSide(k) => FacetKind::ElementSide(k),
            FaceOrigin::CutPlane(_) => cut_face_kind(face, triangles, tol),
        };
        let mut cells: Vec<VolumeCellId> = Vec::new();
        for member in &group {
            if !cells.contains(&member.cell) {
                cells.push(member.cell);
            }
        }

        let facet = FacetId(mesh.facets.len());
        mesh.facets.push(Facet {
            element,
            kind,
            points: first.points.clone(),
            coords: face.points.clone(),
            normal: face.plane.normal,
            cells: cells.clone(),
        });
        mesh.elements[element.0].facets.push(facet);
        for cell in &cells {
            mesh.cells[cell.0].facets.push(facet);
        }

        if !matches!(kind, FacetKind::CutSide(_)) {
            continue;
        }
        for member in &group {
            let face = &cut.pieces[member.piece].faces[member.face];
            for t in triangles
                .iter()
                .filter(|t| t.plane.is_coplanar(&face.plane, tol.point))
            {
                let mut patch = polygon::convex_intersection(&face.points, &t.points, tol.point);
                if polygon::area(&patch) <= tol.area {
                    continue;
                }
                if polygon::area_vector(&patch).dot(&t.plane.normal) < 0.0 {
                    patch.reverse();
                }
                let position = if face.plane.normal.dot(&t.plane.normal) > 0.0 {
                    Position::Inside
                } else {
                    Position::Outside
                };
                votes.entry(member.cell).or_default().push(position);

                let id = BoundaryCellId(mesh.boundary_cells.len());
                mesh.boundary_cells.push(BoundaryCell {
                    side: t.side,
                    cell: member.cell,
                    facet,
                    points: patch,
                    normal: t.plane.normal,
                });
                mesh.cells[member.cell.0].boundary_cells.push(id);
                mesh.elements[element.0].boundary_cells.push(id);
                mesh.sides[t.side.0].boundary_cells.push(id);
            }
        }
    }

    for (cell, positions) in votes {
        let first = positions[0];
        if positions.iter().all(|p| *p == first) {
            mesh.cells[cell.0].position = first;
        } else {
            let (element, local) = mesh.cell_key(cell);
            warn!(element, cell = local, "conflicting interface orientation, position left undecided");
        }
    }
}

/// Cut every element of the mesh
///
/// Elements are processed in parallel and merged in ascending element
/// order. Returns the number of elements with more than one cell or with
/// boundary cells.
pub fn cut_elements(mesh: &mut CutMesh) -> Result<usize> {
    let tol = Tolerances::of(mesh);
    let triangles: Vec<Vec<CutTriangle>> = (0..mesh.elements.len())
        .into_par_iter()
        .map(|i| {
            if mesh.elements[i].registered {
                candidate_triangles(mesh, ElementId(i))
            } else {
                Vec::new()
            }
        })
        .collect();

    let cuts = mesh
        .elements
        .par_iter()
        .zip(triangles.par_iter())
        .map(|(e, tris)| cut_element(e.gid, e.shape, &e.corners, &e.nodes, tris, tol))
        .collect::<Result<Vec<_>>>()?;

    for (index, (cut, tris)) in cuts.into_iter().zip(&triangles).enumerate() {
        insert_cut(mesh, ElementId(index), cut, tris, tol);
    }
    let links = link_cells(mesh);
    let cut = mesh.elements.iter().filter(|e| e.is_cut()).count();
    debug!(
        cut,
        cells = mesh.cells.len(),
        facets = mesh.facets.len(),
        boundary_cells = mesh.boundary_cells.len(),
        links,
        "exact cut done"
    );
    Ok(cut)
}

/// Link cells of neighboring elements that touch across an open part of
/// their common face; returns the number of links
pub fn link_cells(mesh: &mut CutMesh) -> usize {
    let tol = Tolerances::of(mesh);
    let mut shared_faces: Vec<Vec<(ElementId, usize)>> = Vec::new();
    let mut lookup: AHashMap<Vec<usize>, usize> = AHashMap::new();
    for (index, element) in mesh.elements.iter().enumerate() {
        for k in 0..element.shape.faces().len() {
            let mut key = element.face_nodes(k);
            key.sort_unstable();
            match lookup.get(&key) {
                Some(&g) => shared_faces[g].push((ElementId(index), k)),
                None => {
                    lookup.insert(key, shared_faces.len());
                    shared_faces.push(vec![(ElementId(index), k)]);
                }
            }
        }
    }

    let mut links = Vec::new();
    let mut triangles: BTreeMap<ElementId, Vec<CutTriangle>> = BTreeMap::new();
    for group in shared_faces.iter().filter(|g| g.len() > 1) {
        for (i, &(a, ka)) in group.iter().enumerate() {
            for &(b, kb) in &group[i + 1..] {
                let tris = triangles
                    .entry(a)
                    .or_insert_with(|| candidate_triangles(mesh, a));
                for fa in &mesh.elements[a.0].facets {
                    let fa = &mesh.facets[fa.0];
                    if fa.kind != FacetKind::ElementSide(ka) {
                        continue;
                    }
                    for fb in &mesh.elements[b.0].facets {
                        let fb = &mesh.facets[fb.0];
                        if fb.kind != FacetKind::ElementSide(kb) {
                            continue;
                        }
                        let shared = polygon::convex_intersection(&fa.coords, &fb.coords, tol.point);
                        let area = polygon::area(&shared);
                        if area <= tol.area {
                            continue;
                        }
                        let covered = Plane::through(&shared[0], &fa.normal)
                            .map_or(0.0, |plane| coverage(&shared, &plane, tris, tol.point))
                            .min(area);
                        if area - covered > tol.area {
                            let (x, y) = (fa.cells[0], fb.cells[0]);
                            links.push((x.min(y), x.max(y)));
                        }
                    }
                }
            }
        }
    }
    links.sort_unstable();
    links.dedup();
    mesh.links = links;
    mesh.links.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::CutterMesh;
    use crate::geometry::SideShape;
    use crate::mesh::SideOrigin;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn unit_hex(mesh: &mut CutMesh, gid: usize, x0: f64) -> ElementId {
        let corners = ElementShape::Hex8
            .reference_nodes()
            .iter()
            .map(|p| Point3::new(x0 + (p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0, (p.z + 1.0) / 2.0))
            .collect();
        // nodes numbered on a 2 x 1 x 1 grid
        let base = [0, 1, 4, 3, 6, 7, 10, 9];
        let nodes = base.iter().map(|n| n + gid).collect();
        mesh.add_element(gid, ElementShape::Hex8, nodes, corners, None)
    }

    fn add_cutter(mesh: &mut CutMesh, cutter: &CutterMesh) {
        for side in &cutter.sides {
            let corners: Vec<Point3<f64>> = side
                .nodes
                .iter()
                .map(|n| cutter.position(*n).unwrap())
                .collect();
            let count = corners.len();
            let id = mesh.add_side(
                side.id,
                side.shape,
                side.nodes.clone(),
                corners,
                vec![Vector3::zeros(); count],
                SideOrigin::Cutter(0),
            );
            for element in &mut mesh.elements {
                element.candidate_sides.push(id);
                element.registered = true;
            }
        }
    }

    fn cell_volumes(mesh: &CutMesh) -> Vec<(Position, f64)> {
        mesh.cells
            .iter()
            .map(|c| (c.position, c.geometric_volume()))
            .collect()
    }

    #[test]
    fn test_plane_cut_gives_two_cells() {
        let mut mesh = CutMesh::new(1e-10);
        unit_hex(&mut mesh, 0, 0.0);
        let cutter = CutterMesh::quad([
            Point3::new(0.37, -1.0, -1.0),
            Point3::new(0.37, 2.0, -1.0),
            Point3::new(0.37, 2.0, 2.0),
            Point3::new(0.37, -1.0, 2.0),
        ]);
        add_cutter(&mut mesh, &cutter);
        assert_eq!(cut_elements(&mut mesh).unwrap(), 1);

        let cells = cell_volumes(&mesh);
        assert_eq!(cells.len(), 2);
        let inside: f64 = cells.iter().filter(|c| c.0 == Position::Inside).map(|c| c.1).sum();
        let outside: f64 = cells.iter().filter(|c| c.0 == Position::Outside).map(|c| c.1).sum();
        assert_relative_eq!(inside, 0.37, epsilon = 1e-12);
        assert_relative_eq!(outside, 0.63, epsilon = 1e-12);

        // one interface facet shared by both cells; each cell sees both
        // triangles of the quad
        let interface: Vec<&Facet> = mesh.facets.iter().filter(|f| f.on_interface()).collect();
        assert_eq!(interface.len(), 1);
        assert_eq!(interface[0].cells.len(), 2);
        assert_eq!(mesh.boundary_cells.len(), 4);
        for cell in &mesh.cells {
            let area: f64 = cell
                .boundary_cells
                .iter()
                .map(|id| mesh.boundary_cell(*id).area())
                .sum();
            assert_relative_eq!(area, 1.0, epsilon = 1e-12);
        }
        for bc in &mesh.boundary_cells {
            assert_relative_eq!(bc.normal.x, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_closed_box_inside_element() {
        let mut mesh = CutMesh::new(1e-10);
        unit_hex(&mut mesh, 0, 0.0);
        let cutter = CutterMesh::box_surface(Point3::new(0.2, 0.2, 0.2), Point3::new(0.6, 0.6, 0.6));
        add_cutter(&mut mesh, &cutter);
        cut_elements(&mut mesh).unwrap();

        let cells = cell_volumes(&mesh);
        assert_eq!(cells.len(), 2);
        let inner = cells.iter().find(|c| c.0 == Position::Inside).unwrap();
        let outer = cells.iter().find(|c| c.0 == Position::Outside).unwrap();
        assert_relative_eq!(inner.1, 0.064, epsilon = 1e-12);
        assert_relative_eq!(outer.1, 0.936, epsilon = 1e-12);
        let area: f64 = mesh.boundary_cells.iter().map(|bc| bc.area()).sum();
        // every box face is seen from both sides
        assert_relative_eq!(area, 2.0 * 6.0 * 0.16, epsilon = 1e-12);
    }

    #[test]
    fn test_cells_are_linked_across_elements() {
        let mut mesh = CutMesh::new(1e-10);
        unit_hex(&mut mesh, 0, 0.0);
        unit_hex(&mut mesh, 1, 1.0);
        let cutter = CutterMesh::quad([
            Point3::new(1.5, -1.0, -1.0),
            Point3::new(1.5, 2.0, -1.0),
            Point3::new(1.5, 2.0, 2.0),
            Point3::new(1.5, -1.0, 2.0),
        ]);
        add_cutter(&mut mesh, &cutter);
        cut_elements(&mut mesh).unwrap();

        assert_eq!(mesh.elements[0].cells.len(), 1);
        assert_eq!(mesh.elements[1].cells.len(), 2);
        // the uncut element touches only the cell on its side of x = 1.5
        assert_eq!(mesh.links.len(), 1);
        let (a, b) = mesh.links[0];
        assert_eq!(mesh.cell(a).element, ElementId(0));
        assert_eq!(mesh.cell(b).position, Position::Inside);
    }

    #[test]
    fn test_partial_cutter_keeps_one_cell() {
        // a crack ending inside the element does not separate it
        let mut mesh = CutMesh::new(1e-10);
        unit_hex(&mut mesh, 0, 0.0);
        mesh.add_side(
            0,
            SideShape::Quad4,
            vec![0, 1, 2, 3],
            vec![
                Point3::new(0.5, -0.1, -0.1),
                Point3::new(0.5, 0.5, -0.1),
                Point3::new(0.5, 0.5, 1.1),
                Point3::new(0.5, -0.1, 1.1),
            ],
            vec![Vector3::zeros(); 4],
            SideOrigin::Cutter(0),
        );
        mesh.elements[0].candidate_sides.push(SideId(0));
        mesh.elements[0].registered = true;
        cut_elements(&mut mesh).unwrap();

        assert_eq!(mesh.cells.len(), 1);
        assert_relative_eq!(mesh.cells[0].geometric_volume(), 1.0, epsilon = 1e-12);
        // both faces of the crack border the same cell
        assert_eq!(mesh.cells[0].position, Position::Undecided);
        assert_eq!(mesh.boundary_cells.len(), 4);
    }

    #[test]
    fn test_collapsed_element_is_rejected() {
        let mut mesh = CutMesh::new(1e-10);
        let corners = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        mesh.add_element(9, ElementShape::Tet4, vec![0, 1, 2, 3], corners, None);
        let err = cut_elements(&mut mesh).unwrap_err();
        assert!(matches!(
            err,
            CutError::GeometryInconsistency {
                entity: EntityRef::Element(9),
                ..
            }
        ));
    }
}
