// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Inside/outside classification of volume cells and nodes
//!
//! Cells touching an interface already carry a position from the exact cut.
//! The remaining cells take the position of the cells they are linked to,
//! and any component still undecided is classified by casting a ray.

use crate::geometry::polygon;
use crate::mesh::{CutMesh, ElementId, Position, VolumeCellId};
use disjoint::DisjointSet;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionReport {
    /// Cells decided by interface orientation
    pub from_interface: usize,
    /// Cells of uncut level-set elements decided by sign
    pub from_level_set: usize,
    /// Cells decided through links to decided cells
    pub propagated: usize,
    /// Cells decided by ray casting
    pub ray_cast: usize,
    pub undecided: usize,
}

/// Ray/triangle distance along `direction`, if the ray hits
fn ray_hit(origin: &Point3<f64>, direction: &Vector3<f64>, triangle: &[Point3<f64>; 3]) -> Option<f64> {
    const EPS: f64 = 1e-12;

    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < EPS {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - triangle[0];
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > EPS).then_some(t)
}

/// Position of a point from the nearest surface triangle along a fixed
/// skew direction; no hit means outside
fn cast_ray(origin: &Point3<f64>, triangles: &[[Point3<f64>; 3]]) -> Position {
    let direction = Vector3::new(1.0, 1e-3 * 2f64.sqrt(), 1e-3 * 3f64.sqrt()).normalize();
    let nearest = triangles
        .iter()
        .filter_map(|t| ray_hit(origin, &direction, t).map(|d| (d, t)))
        .min_by(|a, b| a.0.total_cmp(&b.0));
    match nearest {
        Some((_, t)) => {
            let normal = (t[1] - t[0]).cross(&(t[2] - t[0]));
            if normal.dot(&direction) > 0.0 {
                Position::Inside
            } else {
                Position::Outside
            }
        }
        None => Position::Outside,
    }
}

fn level_set_sign(values: &[f64]) -> Option<Position> {
    if values.iter().all(|v| *v < 0.0) {
        Some(Position::Inside)
    } else if values.iter().all(|v| *v >= 0.0) {
        Some(Position::Outside)
    } else {
        None
    }
}

/// Classify all cells, then all background nodes
pub fn determine_positions(mesh: &mut CutMesh, find_positions: bool) -> PositionReport {
    let mut report = PositionReport {
        from_interface: mesh.cells.iter().filter(|c| c.position.is_decided()).count(),
        ..Default::default()
    };

    for index in 0..mesh.cells.len() {
        if mesh.cells[index].position.is_decided() {
            continue;
        }
        let element = mesh.cells[index].element;
        let sign = mesh.elements[element.0].level_set.as_deref().and_then(level_set_sign);
        if let Some(position) = sign {
            mesh.cells[index].position = position;
            report.from_level_set += 1;
        }
    }

    let mut sets = DisjointSet::with_len(mesh.cells.len());
    for (a, b) in &mesh.links {
        sets.join(a.0, b.0);
    }
    let mut triangles: Option<Vec<[Point3<f64>; 3]>> = None;
    for component in sets.sets() {
        let mut decided: Vec<Position> = component
            .iter()
            .map(|&i| mesh.cells[i].position)
            .filter(Position::is_decided)
            .collect();
        decided.sort_unstable();
        decided.dedup();

        let position = match decided.as_slice() {
            [single] => {
                report.propagated += component
                    .iter()
                    .filter(|&&i| !mesh.cells[i].position.is_decided())
                    .count();
                *single
            }
            [] if find_positions => {
                let Some(&first) = component.iter().min() else {
                    continue;
                };
                let triangles = triangles.get_or_insert_with(|| {
                    (0..mesh.sides.len())
                        .flat_map(|s| mesh.sub_side_triangles(crate::mesh::SideId(s)))
                        .collect()
                });
                report.ray_cast += component.len();
                cast_ray(&mesh.cells[first].interior_point(), triangles)
            }
            [] => continue,
            _ => {
                let (element, cell) = mesh.cell_key(VolumeCellId(component[0]));
                warn!(element, cell, "linked cells on both sides of the interface");
                continue;
            }
        };
        for &i in &component {
            if !mesh.cells[i].position.is_decided() {
                mesh.cells[i].position = position;
            }
        }
    }
    report.undecided = mesh.cells.iter().filter(|c| !c.position.is_decided()).count();

    let nodes = node_positions(mesh);
    mesh.node_positions = nodes;

    debug!(
        interface = report.from_interface,
        level_set = report.from_level_set,
        propagated = report.propagated,
        ray_cast = report.ray_cast,
        undecided = report.undecided,
        "positions determined"
    );
    report
}

fn node_positions(mesh: &CutMesh) -> BTreeMap<usize, Position> {
    let tolerance = mesh.tolerance;
    let mut positions = BTreeMap::new();
    for (node, elements) in mesh.node_elements() {
        let Some((coords, on_level_set)) = node_state(mesh, node, &elements, tolerance) else {
            continue;
        };
        let on_interface = on_level_set
            || elements.iter().any(|e| {
                mesh.elements[e.0].boundary_cells.iter().any(|b| {
                    let bc = mesh.boundary_cell(*b);
                    let offset = bc.normal.dot(&(coords - bc.points[0])).abs();
                    offset <= tolerance && polygon::contains_point(&bc.points, &coords, tolerance)
                })
            });
        let position = if on_interface {
            Position::OnCutSurface
        } else {
            elements
                .iter()
                .flat_map(|e| &mesh.elements[e.0].cells)
                .map(|c| mesh.cell(*c))
                .find(|c| c.position.is_decided() && c.contains(&coords, tolerance))
                .map_or(Position::Undecided, |c| c.position)
        };
        positions.insert(node, position);
    }
    positions
}

/// Coordinates of a node and whether its level-set value vanishes
fn node_state(
    mesh: &CutMesh,
    node: usize,
    elements: &[ElementId],
    tolerance: f64,
) -> Option<(Point3<f64>, bool)> {
    let mut coords = None;
    let mut on_level_set = false;
    for e in elements {
        let element = &mesh.elements[e.0];
        let Some(local) = element.nodes.iter().position(|n| *n == node) else {
            continue;
        };
        coords.get_or_insert(element.corners[local]);
        if let Some(values) = &element.level_set {
            on_level_set |= values[local].abs() <= tolerance;
        }
    }
    coords.map(|c| (c, on_level_set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::CutterMesh;
    use crate::geometry::ElementShape;
    use crate::intersection::{create_level_set_sides, cut_elements};
    use crate::mesh::SideOrigin;

    fn two_hexes(mesh: &mut CutMesh, phi: impl Fn(&Point3<f64>) -> f64) {
        let base = [0, 1, 4, 3, 6, 7, 10, 9];
        for gid in 0..2 {
            let corners: Vec<Point3<f64>> = ElementShape::Hex8
                .reference_nodes()
                .iter()
                .map(|p| Point3::new(gid as f64 + (p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0, (p.z + 1.0) / 2.0))
                .collect();
            let values = corners.iter().map(&phi).collect();
            let nodes = base.iter().map(|n| n + gid).collect();
            mesh.add_element(gid, ElementShape::Hex8, nodes, corners, Some(values));
        }
    }

    #[test]
    fn test_level_set_positions() {
        let mut mesh = CutMesh::new(1e-10);
        two_hexes(&mut mesh, |p| p.x - 1.5);
        create_level_set_sides(&mut mesh, 0);
        cut_elements(&mut mesh).unwrap();
        let report = determine_positions(&mut mesh, false);

        assert_eq!(report.from_interface, 2);
        assert_eq!(report.from_level_set, 1);
        assert_eq!(report.undecided, 0);
        assert_eq!(mesh.cells[0].position, Position::Inside);

        // nodes at x = 0 and x = 1 are inside, x = 2 outside
        for (node, expected) in [
            (0, Position::Inside),
            (1, Position::Inside),
            (2, Position::Outside),
            (11, Position::Outside),
        ] {
            assert_eq!(mesh.node_positions[&node], expected, "node {node}");
        }
    }

    #[test]
    fn test_node_on_zero_level_is_on_surface() {
        let mut mesh = CutMesh::new(1e-10);
        two_hexes(&mut mesh, |p| p.x - 1.0);
        create_level_set_sides(&mut mesh, 0);
        cut_elements(&mut mesh).unwrap();
        // the contour lies on the shared face, so the left cell is only
        // reachable by ray casting
        let report = determine_positions(&mut mesh, true);
        assert_eq!(report.ray_cast, 1);
        assert_eq!(mesh.node_positions[&1], Position::OnCutSurface);
        assert_eq!(mesh.node_positions[&0], Position::Inside);
        assert_eq!(mesh.node_positions[&2], Position::Outside);
    }

    #[test]
    fn test_enclosing_surface_found_by_ray() {
        let cutter = CutterMesh::box_surface(Point3::new(-1.0, -1.0, -1.0), Point3::new(3.0, 2.0, 2.0));
        for (find, expected) in [(true, Position::Inside), (false, Position::Undecided)] {
            let mut mesh = CutMesh::new(1e-10);
            two_hexes(&mut mesh, |_| 1.0);
            for element in &mut mesh.elements {
                element.level_set = None;
            }
            for side in &cutter.sides {
                let corners = side
                    .nodes
                    .iter()
                    .filter_map(|n| cutter.position(*n))
                    .collect();
                mesh.add_side(
                    side.id,
                    side.shape,
                    side.nodes.clone(),
                    corners,
                    vec![Vector3::zeros(); 3],
                    SideOrigin::Cutter(0),
                );
            }
            cut_elements(&mut mesh).unwrap();
            let report = determine_positions(&mut mesh, find);
            assert_eq!(mesh.links.len(), 1);
            assert!(mesh.cells.iter().all(|c| c.position == expected));
            assert_eq!(report.ray_cast, if find { 2 } else { 0 });
        }
    }

    #[test]
    fn test_ray_misses_parallel_triangle() {
        let triangle = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let origin = Point3::new(0.1, 0.1, 0.0);
        assert!(ray_hit(&origin, &Vector3::x(), &triangle).is_none());
        assert!(ray_hit(&origin, &Vector3::z(), &triangle).is_some());
        assert!(ray_hit(&origin, &-Vector3::z(), &triangle).is_none());
    }

    #[test]
    fn test_ray_takes_nearest_hit_not_parity() {
        // two stacked sheets at x = 1 and x = 2, both facing +x
        let sheet = |x: f64| {
            [
                [
                    Point3::new(x, -5.0, -5.0),
                    Point3::new(x, 5.0, -5.0),
                    Point3::new(x, 0.0, 5.0),
                ],
            ]
        };
        let mut triangles = sheet(2.0).to_vec();
        triangles.extend(sheet(1.0));
        // an even number of hits, but the nearest sheet is crossed along its normal
        assert_eq!(cast_ray(&Point3::origin(), &triangles), Position::Inside);
        assert_eq!(cast_ray(&Point3::new(1.5, 0.0, 0.0), &triangles), Position::Inside);
        assert_eq!(cast_ray(&Point3::new(2.5, 0.0, 0.0), &triangles), Position::Outside);

        // flipped sheets are crossed against their normals
        let flipped: Vec<[Point3<f64>; 3]> = triangles.iter().map(|t| [t[0], t[2], t[1]]).collect();
        assert_eq!(cast_ray(&Point3::origin(), &flipped), Position::Outside);
    }
}
