// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Intersection engine
//!
//! The pipeline steps, each operating on a [`CutMesh`]:
//!
//! 1. [`self_cut`]: refine cutter sides along their mutual intersections
//! 2. [`collision`]: broad and narrow phase element/side candidate search
//! 3. [`level_set`]: zero-contour sides for level-set cutting
//! 4. [`exact_cut`]: split elements into volume cells, facets and boundary cells
//! 5. [`position`]: inside/outside classification of cells and nodes
//! 6. [`finalize`]: integration rules for every volume cell

pub mod collision;
pub mod exact_cut;
pub mod level_set;
pub mod position;
pub mod self_cut;

pub use collision::{detect_collisions, CollisionReport};
pub use exact_cut::{cut_elements, link_cells, ElementCut};
pub use level_set::{contour_triangles, create_level_set_sides};
pub use position::{determine_positions, PositionReport};
pub use self_cut::{self_cut, SelfCutReport};

use crate::error::{CutError, EntityRef, Result};
use crate::geometry::{polygon, Plane};
use crate::integration::CellIntegrator;
use crate::mesh::{CutMesh, ElementId, SideId};
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

/// Cutting triangle with its supporting plane
#[derive(Debug, Clone)]
pub struct CutTriangle {
    pub side: SideId,
    pub points: [Point3<f64>; 3],
    pub plane: Plane,
}

/// Triangles of all sides cutting an element, in ascending side order
pub fn candidate_triangles(mesh: &CutMesh, element: ElementId) -> Vec<CutTriangle> {
    let e = mesh.element(element);
    let area_tolerance = mesh.area_tolerance();
    let bbox = e.bbox.inflated(mesh.tolerance);
    let mut sides: Vec<SideId> = e
        .candidate_sides
        .iter()
        .chain(&e.level_set_sides)
        .copied()
        .collect();
    sides.sort_unstable();
    sides.dedup();

    let mut triangles = Vec::new();
    for side in sides {
        for points in mesh.sub_side_triangles(side) {
            if polygon::area(&points) <= area_tolerance {
                continue;
            }
            let tri_box = crate::geometry::BoundingBox::from_points(&points);
            if !tri_box.intersects(&bbox) {
                continue;
            }
            if let Some(plane) = Plane::from_triangle(&points[0], &points[1], &points[2]) {
                triangles.push(CutTriangle {
                    side,
                    points,
                    plane,
                });
            }
        }
    }
    triangles
}

/// Generate the integration rule of every volume cell
///
/// Rules are computed in parallel; a cell with non-positive volume aborts.
pub fn finalize(mesh: &mut CutMesh, integrator: &dyn CellIntegrator) -> Result<usize> {
    let keys: Vec<EntityRef> = (0..mesh.cells.len())
        .map(|i| {
            let (element, cell) = mesh.cell_key(crate::mesh::VolumeCellId(i));
            EntityRef::VolumeCell { element, cell }
        })
        .collect();

    let rules = mesh
        .cells
        .par_iter()
        .zip(keys.par_iter())
        .map(|(cell, key)| {
            let rule = integrator.integrate_cell(&cell.pieces, *key)?;
            let volume = rule.volume();
            if volume.is_nan() || volume <= 0.0 {
                return Err(CutError::geometry(
                    *key,
                    format!("non-positive cell volume {volume:.6e}"),
                ));
            }
            Ok(rule)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut points = 0;
    for (cell, rule) in mesh.cells.iter_mut().zip(rules) {
        points += rule.len();
        cell.rule = rule;
    }
    debug!(
        cells = mesh.cells.len(),
        points,
        strategy = integrator.name(),
        "integration rules generated"
    );
    Ok(points)
}
