// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut wizard: the pipeline facade
//!
//! `configure` → `prepare` → `cut`, then queries. Every operation checks
//! the current state and fails with a [`ConfigurationError`] when called
//! out of order. `cut` always starts from the mesh built by `prepare`, so
//! calling it again reproduces the same result.

use crate::config::{CutOptions, Verbosity};
use crate::discretization::{BackgroundMesh, CutterMesh, LevelSetField};
use crate::dofset::assign_dofsets;
use crate::error::{ConfigurationError, CutError, EntityRef, Result};
use crate::geometry::BVH;
use crate::integration::integrator_for;
use crate::intersection::{
    create_level_set_sides, cut_elements, detect_collisions, determine_positions, finalize,
    self_cut,
};
use crate::io::gmsh;
use crate::mesh::{
    BoundaryCell, CutMesh, ElementId, Facet, Position, SideId, SideOrigin, VolumeCell,
};
use crate::parallel::{
    agree, check_layout, check_marked_sides, sync_dofsets, sync_node_positions, Communicator,
    SerialCommunicator,
};
use nalgebra::{Point3, Vector2, Vector3};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Unconfigured,
    Configured,
    Prepared,
    Cut,
}

impl WizardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardState::Unconfigured => "Unconfigured",
            WizardState::Configured => "Configured",
            WizardState::Prepared => "Prepared",
            WizardState::Cut => "Cut",
        }
    }
}

/// Summary of one `cut()` run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CutReport {
    /// False when there was nothing to cut with
    pub performed: bool,
    pub strategy: &'static str,
    pub cut_elements: usize,
    pub volume_cells: usize,
    pub boundary_cells: usize,
    pub integration_points: usize,
    pub level_set_sides: usize,
    pub refined_sides: usize,
    pub candidate_pairs: usize,
    pub undecided_cells: usize,
    /// Ghost node values received from owners (positions plus DOF sets)
    pub ghost_updates: usize,
}

/// Rule volume per phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseVolumes {
    pub inside: f64,
    pub outside: f64,
    pub undecided: f64,
}

impl PhaseVolumes {
    pub fn total(&self) -> f64 {
        self.inside + self.outside + self.undecided
    }
}

/// DOF-set usage of one element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDofUse {
    pub node: usize,
    /// DOF sets at the node
    pub count: usize,
    /// Set index used by each volume cell of the element, `None` for cells
    /// without DOFs at this node
    pub cell_sets: Vec<Option<usize>>,
}

/// Read-only view of one cut element
#[derive(Debug, Clone, Copy)]
pub struct ElementHandle<'a> {
    mesh: &'a CutMesh,
    id: ElementId,
}

impl<'a> ElementHandle<'a> {
    pub fn gid(&self) -> usize {
        self.mesh.element(self.id).gid
    }

    pub fn is_cut(&self) -> bool {
        self.mesh.element(self.id).is_cut()
    }

    pub fn has_level_set_side(&self) -> bool {
        !self.mesh.element(self.id).level_set_sides.is_empty()
    }

    pub fn volume_cells(&self) -> Vec<&'a VolumeCell> {
        let mesh = self.mesh;
        mesh.element(self.id).cells.iter().map(|c| mesh.cell(*c)).collect()
    }

    pub fn boundary_cells(&self) -> Vec<&'a BoundaryCell> {
        let mesh = self.mesh;
        mesh.element(self.id)
            .boundary_cells
            .iter()
            .map(|b| mesh.boundary_cell(*b))
            .collect()
    }

    pub fn facets(&self) -> Vec<&'a Facet> {
        let mesh = self.mesh;
        mesh.element(self.id).facets.iter().map(|f| mesh.facet(*f)).collect()
    }

    /// DOF sets at each element node, in element node order
    pub fn node_dofsets(&self) -> Vec<NodeDofUse> {
        let element = self.mesh.element(self.id);
        element
            .nodes
            .iter()
            .map(|&node| {
                let sets = self.mesh.node_dofsets.get(&node);
                let cell_sets = element
                    .cells
                    .iter()
                    .map(|c| sets.and_then(|s| s.set_of(self.mesh.cell_key(*c))))
                    .collect();
                NodeDofUse {
                    node,
                    count: sets.map_or(0, |s| s.count()),
                    cell_sets,
                }
            })
            .collect()
    }

    /// Position of each element node
    pub fn node_positions(&self) -> Vec<Position> {
        self.mesh
            .element(self.id)
            .nodes
            .iter()
            .map(|n| self.mesh.node_positions.get(n).copied().unwrap_or(Position::Undecided))
            .collect()
    }
}

/// Read-only view of one cutting side
#[derive(Debug, Clone, Copy)]
pub struct SideHandle<'a> {
    mesh: &'a CutMesh,
    id: SideId,
}

impl<'a> SideHandle<'a> {
    pub fn gid(&self) -> usize {
        self.mesh.side(self.id).gid
    }

    pub fn is_level_set(&self) -> bool {
        self.mesh.side(self.id).is_level_set()
    }

    /// Triangles after self-cut refinement, in cutting coordinates
    pub fn sub_sides(&self) -> Vec<[Point3<f64>; 3]> {
        self.mesh.sub_side_triangles(self.id)
    }

    pub fn boundary_cells(&self) -> Vec<&'a BoundaryCell> {
        let mesh = self.mesh;
        mesh.side(self.id)
            .boundary_cells
            .iter()
            .map(|b| mesh.boundary_cell(*b))
            .collect()
    }

    /// Parametric coordinates of a point on the side
    pub fn local_coordinates(&self, point: &Point3<f64>) -> Vector2<f64> {
        self.mesh.side(self.id).local_coordinates(point)
    }
}

/// Pipeline facade over one rank's partition
pub struct CutWizard<C: Communicator = SerialCommunicator> {
    comm: C,
    state: WizardState,
    options: CutOptions,
    prepared: Option<Prepared>,
    mesh: Option<CutMesh>,
}

/// Inputs retained between `prepare` and `cut`
struct Prepared {
    mesh: CutMesh,
    tree: BVH,
    marked: BTreeSet<usize>,
    global_node_count: usize,
    has_cutters: bool,
    has_level_set: bool,
}

impl CutWizard<SerialCommunicator> {
    pub fn new() -> Self {
        Self::with_communicator(SerialCommunicator)
    }
}

impl Default for CutWizard<SerialCommunicator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Communicator> CutWizard<C> {
    pub fn with_communicator(comm: C) -> Self {
        Self {
            comm,
            state: WizardState::Unconfigured,
            options: CutOptions::default(),
            prepared: None,
            mesh: None,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn options(&self) -> &CutOptions {
        &self.options
    }

    pub fn communicator(&self) -> &C {
        &self.comm
    }

    /// Back to `Unconfigured`, dropping all inputs and results
    pub fn reset(&mut self) {
        self.state = WizardState::Unconfigured;
        self.options = CutOptions::default();
        self.prepared = None;
        self.mesh = None;
    }

    pub fn configure(&mut self, options: CutOptions) -> Result<()> {
        if self.state != WizardState::Unconfigured {
            return Err(ConfigurationError::AlreadyConfigured.into());
        }
        options.validate()?;
        debug!(strategy = options.quadrature.as_str(), "wizard configured");
        self.options = options;
        self.state = WizardState::Configured;
        Ok(())
    }

    /// Register cutter sides, then background elements
    ///
    /// May be called again after `cut` to replace the inputs.
    pub fn prepare(
        &mut self,
        background: &BackgroundMesh,
        cutters: &[CutterMesh],
        level_set: Option<&LevelSetField>,
    ) -> Result<()> {
        if self.state == WizardState::Unconfigured {
            return Err(ConfigurationError::NotConfigured.into());
        }

        let diagonal = background.bounding_box().diagonal();
        let scale = if diagonal > 0.0 { diagonal } else { 1.0 };
        let mut mesh = CutMesh::new(self.options.point_tolerance * scale);

        let mut marked = BTreeSet::new();
        for (index, cutter) in cutters.iter().enumerate() {
            for side in &cutter.sides {
                let gid = side.id + cutter.id_offset;
                if mesh.side_by_gid(gid).is_some() {
                    return Err(CutError::geometry(EntityRef::Side(gid), "duplicate side id"));
                }
                if side.nodes.len() != side.shape.num_nodes() {
                    return Err(CutError::geometry(
                        EntityRef::Side(gid),
                        format!(
                            "{} side has {} nodes, expected {}",
                            side.shape.as_str(),
                            side.nodes.len(),
                            side.shape.num_nodes()
                        ),
                    ));
                }
                let corners = side
                    .nodes
                    .iter()
                    .map(|&n| {
                        cutter.position(n).ok_or_else(|| {
                            CutError::geometry(
                                EntityRef::Side(gid),
                                format!("references unknown node {}", n + cutter.id_offset),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let shifts: Vec<Vector3<f64>> =
                    side.nodes.iter().map(|&n| cutter.offset_shift(n)).collect();
                let nodes = side.nodes.iter().map(|n| n + cutter.id_offset).collect();
                let id = mesh.add_side(
                    gid,
                    side.shape,
                    nodes,
                    corners,
                    shifts,
                    SideOrigin::Cutter(index),
                );
                if cutter.marked_sides.contains(&side.id) {
                    mesh.sides[id.0].marked = true;
                    marked.insert(gid);
                }
            }
        }
        let tree = BVH::build(mesh.sides.iter().enumerate().map(|(i, s)| (i, s.bbox)).collect());

        for element in background.elements.values() {
            let corners = background.element_corners(element)?;
            let values = level_set
                .map(|field| {
                    element
                        .nodes
                        .iter()
                        .map(|&n| {
                            field.value(n).ok_or_else(|| {
                                CutError::geometry(
                                    EntityRef::Element(element.id),
                                    format!("no level-set value for node {n}"),
                                )
                            })
                        })
                        .collect::<Result<Vec<f64>>>()
                })
                .transpose()?;

            let center = element.shape.reference_center();
            let determinant = element.shape.jacobian(&center, &corners).determinant();
            if determinant.is_nan() || determinant <= 0.0 {
                return Err(CutError::geometry(
                    EntityRef::Element(element.id),
                    format!("non-positive Jacobian determinant {determinant:.6e}"),
                ));
            }
            mesh.add_element(element.id, element.shape, element.nodes.clone(), corners, values);
        }
        for node in background.nodes.values() {
            mesh.node_owner.insert(node.id, node.owner);
        }

        debug!(
            sides = mesh.sides.len(),
            elements = mesh.elements.len(),
            tolerance = mesh.tolerance,
            "wizard prepared"
        );
        self.prepared = Some(Prepared {
            mesh,
            tree,
            marked,
            global_node_count: background.global_node_count(),
            has_cutters: cutters.iter().any(|c| !c.sides.is_empty()),
            has_level_set: level_set.is_some(),
        });
        self.mesh = None;
        self.state = WizardState::Prepared;
        Ok(())
    }

    /// Run the full pipeline
    ///
    /// `include_inner` keeps cells inside the cutter in the DOF sets.
    pub fn cut(&mut self, include_inner: bool) -> Result<CutReport> {
        let prepared = match (self.state, &self.prepared) {
            (WizardState::Prepared | WizardState::Cut, Some(prepared)) => prepared,
            (state, _) => return Err(CutError::order("cut()", state.as_str())),
        };
        let options = &self.options;
        let comm = &self.comm;

        if !prepared.has_cutters && !prepared.has_level_set {
            warn!("no cutter mesh and no level set registered, nothing to cut");
            return Ok(CutReport::default());
        }

        let mut mesh = prepared.mesh.clone();
        check_layout(comm, prepared.global_node_count)?;
        comm.barrier()?;

        let self_cut_report = self_cut(&mut mesh, &prepared.tree);
        comm.barrier()?;

        let first_gid = mesh.sides.iter().map(|s| s.gid + 1).max().unwrap_or(0);
        let level_set_sides = create_level_set_sides(&mut mesh, first_gid);
        let collisions = detect_collisions(&mut mesh, &prepared.tree);
        check_marked_sides(comm, &prepared.marked, &collisions.found_sides)?;
        comm.barrier()?;

        let cut_count = agree(comm, cut_elements(&mut mesh))?;
        comm.barrier()?;

        let positions = determine_positions(&mut mesh, options.find_positions);
        let mut ghost_updates = sync_node_positions(comm, &mut mesh)?;
        mesh.node_dofsets = assign_dofsets(&mesh, include_inner);
        ghost_updates += sync_dofsets(comm, &mut mesh)?;
        comm.barrier()?;

        let integrator = integrator_for(options);
        let points = agree(comm, finalize(&mut mesh, integrator.as_ref()))?;
        undo_offsets(&mut mesh);
        comm.barrier()?;

        if options.verbosity == Verbosity::Debug {
            if let Some(dir) = &options.dump_directory {
                let prefix = format!("xcut_rank{}", comm.rank());
                agree(comm, gmsh::write_dump(&mesh, dir, &prefix))?;
            }
        }

        let report = CutReport {
            performed: true,
            strategy: integrator.name(),
            cut_elements: cut_count,
            volume_cells: mesh.cells.len(),
            boundary_cells: mesh.boundary_cells.len(),
            integration_points: points,
            level_set_sides,
            refined_sides: self_cut_report.refined_sides,
            candidate_pairs: collisions.candidate_pairs,
            undecided_cells: positions.undecided,
            ghost_updates,
        };
        if options.verbosity >= Verbosity::Normal {
            info!(
                rank = comm.rank(),
                cut = report.cut_elements,
                cells = report.volume_cells,
                boundary_cells = report.boundary_cells,
                points = report.integration_points,
                strategy = report.strategy,
                "cut finished"
            );
        }

        self.mesh = Some(mesh);
        self.state = WizardState::Cut;
        Ok(report)
    }

    fn cut_mesh_for(&self, operation: &'static str) -> Result<&CutMesh> {
        match (&self.mesh, self.state) {
            (Some(mesh), WizardState::Cut) => Ok(mesh),
            (_, state) => Err(CutError::order(operation, state.as_str())),
        }
    }

    /// The cut mesh of the last `cut()`
    pub fn cut_mesh(&self) -> Result<&CutMesh> {
        self.cut_mesh_for("cut_mesh()")
    }

    pub fn element_handle(&self, gid: usize) -> Result<Option<ElementHandle<'_>>> {
        let mesh = self.cut_mesh_for("element_handle()")?;
        Ok(mesh.element_by_gid(gid).map(|id| ElementHandle { mesh, id }))
    }

    pub fn side_handle(&self, gid: usize) -> Result<Option<SideHandle<'_>>> {
        let mesh = self.cut_mesh_for("side_handle()")?;
        Ok(mesh.side_by_gid(gid).map(|id| SideHandle { mesh, id }))
    }

    /// Cutter side by its node ids (with id offset), in any order
    pub fn side_handle_by_nodes(&self, nodes: &[usize]) -> Result<Option<SideHandle<'_>>> {
        let mesh = self.cut_mesh_for("side_handle()")?;
        Ok(mesh.side_by_nodes(nodes).map(|id| SideHandle { mesh, id }))
    }

    pub fn has_level_set_side(&self, element_gid: usize) -> Result<bool> {
        let mesh = self.cut_mesh_for("has_level_set_side()")?;
        Ok(mesh
            .element_by_gid(element_gid)
            .is_some_and(|id| !mesh.element(id).level_set_sides.is_empty()))
    }

    /// Rule volumes of the local partition by position, ghost layer included
    pub fn phase_volumes(&self) -> Result<PhaseVolumes> {
        let mesh = self.cut_mesh_for("phase_volumes()")?;
        let mut volumes = PhaseVolumes::default();
        for cell in &mesh.cells {
            let volume = cell.volume();
            match cell.position {
                Position::Inside => volumes.inside += volume,
                Position::Outside => volumes.outside += volume,
                Position::Undecided | Position::OnCutSurface => volumes.undecided += volume,
            }
        }
        Ok(volumes)
    }

    /// Write the Gmsh debug dump of the last cut; returns the files written
    pub fn dump(&self, directory: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        let mesh = self.cut_mesh_for("dump()")?;
        gmsh::write_dump(mesh, directory, prefix)
    }
}

/// Remove the offset perturbation from boundary-cell points
fn undo_offsets(mesh: &mut CutMesh) {
    let mut shifted = 0;
    for index in 0..mesh.boundary_cells.len() {
        let side = &mesh.sides[mesh.boundary_cells[index].side.0];
        let shifts: Vec<Vector3<f64>> = mesh.boundary_cells[index]
            .points
            .iter()
            .map(|p| side.shift_at(p))
            .collect();
        if shifts.iter().all(|s| s.norm() == 0.0) {
            continue;
        }
        for (point, shift) in mesh.boundary_cells[index].points.iter_mut().zip(shifts) {
            *point -= shift;
        }
        shifted += 1;
    }
    if shifted > 0 {
        debug!(boundary_cells = shifted, "offsets undone");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::OffsetMarker;
    use crate::error::ConfigurationError;
    use approx::assert_relative_eq;

    fn unit_box(n: usize) -> BackgroundMesh {
        BackgroundMesh::structured_hex_box([n; 3], Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    fn plane_cutter(x: f64) -> CutterMesh {
        CutterMesh::quad([
            Point3::new(x, -0.5, -0.5),
            Point3::new(x, 1.5, -0.5),
            Point3::new(x, 1.5, 1.5),
            Point3::new(x, -0.5, 1.5),
        ])
    }

    #[test]
    fn test_state_machine_order() {
        let mut wizard = CutWizard::new();
        assert!(matches!(
            wizard.cut(false),
            Err(CutError::Configuration(ConfigurationError::PipelineOrder { .. }))
        ));
        assert!(matches!(
            wizard.prepare(&unit_box(1), &[], None),
            Err(CutError::Configuration(ConfigurationError::NotConfigured))
        ));
        wizard.configure(CutOptions::default()).unwrap();
        assert!(matches!(
            wizard.configure(CutOptions::default()),
            Err(CutError::Configuration(ConfigurationError::AlreadyConfigured))
        ));
        assert!(wizard.cut(false).unwrap_err().is_configuration());
        assert!(wizard.element_handle(0).unwrap_err().is_configuration());

        wizard.reset();
        assert_eq!(wizard.state(), WizardState::Unconfigured);
        wizard.configure(CutOptions::default()).unwrap();
    }

    #[test]
    fn test_nothing_to_cut_is_soft() {
        let mut wizard = CutWizard::new();
        wizard.configure(CutOptions::default()).unwrap();
        wizard.prepare(&unit_box(2), &[], None).unwrap();
        let report = wizard.cut(false).unwrap();
        assert!(!report.performed);
        assert_eq!(wizard.state(), WizardState::Prepared);
    }

    #[test]
    fn test_plane_cut_through_wizard() {
        let mut wizard = CutWizard::new();
        wizard.configure(CutOptions::default()).unwrap();
        wizard.prepare(&unit_box(2), &[plane_cutter(0.3)], None).unwrap();
        let report = wizard.cut(true).unwrap();
        assert!(report.performed);
        assert_eq!(report.cut_elements, 4);
        assert_eq!(report.volume_cells, 12);

        let volumes = wizard.phase_volumes().unwrap();
        assert_relative_eq!(volumes.inside, 0.3, epsilon = 1e-10);
        assert_relative_eq!(volumes.outside, 0.7, epsilon = 1e-10);

        let element = wizard.element_handle(0).unwrap().unwrap();
        assert!(element.is_cut());
        assert_eq!(element.volume_cells().len(), 2);
        assert!(!element.has_level_set_side());
        assert!(wizard.element_handle(99).unwrap().is_none());

        let side = wizard.side_handle_by_nodes(&[3, 2, 1, 0]).unwrap().unwrap();
        assert_eq!(side.gid(), 0);
        let area: f64 = side.boundary_cells().iter().map(|b| b.area()).sum();
        // four elements, each face seen from both cells
        assert_relative_eq!(area, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_offsets_are_undone_on_boundary_cells() {
        let mut cutter = plane_cutter(0.5);
        cutter.add_offset(OffsetMarker {
            node_ids: vec![0, 1, 2, 3],
            axis: 0,
            value: 1e-3,
        });
        let mut wizard = CutWizard::new();
        wizard.configure(CutOptions::default()).unwrap();
        wizard.prepare(&unit_box(2), &[cutter], None).unwrap();
        wizard.cut(false).unwrap();

        let volumes = wizard.phase_volumes().unwrap();
        assert_relative_eq!(volumes.inside, 0.501, epsilon = 1e-10);
        let side = wizard.side_handle(0).unwrap().unwrap();
        for bc in side.boundary_cells() {
            for p in &bc.points {
                assert_relative_eq!(p.x, 0.5, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_level_set_side_query() {
        let background = unit_box(2);
        let field = LevelSetField::from_fn(&background, |p| p.x - 0.25);
        let mut wizard = CutWizard::new();
        wizard.configure(CutOptions::default()).unwrap();
        wizard.prepare(&background, &[], Some(&field)).unwrap();
        let report = wizard.cut(false).unwrap();
        assert!(report.level_set_sides > 0);
        assert!(wizard.has_level_set_side(0).unwrap());
        assert!(!wizard.has_level_set_side(1).unwrap());
    }

    #[test]
    fn test_inverted_element_is_rejected() {
        let mut background = BackgroundMesh::new();
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        for (i, c) in corners.iter().enumerate() {
            background.add_node(i, *c);
        }
        background
            .add_element(7, crate::geometry::ElementShape::Tet4, vec![0, 1, 2, 3])
            .unwrap();
        let mut wizard = CutWizard::new();
        wizard.configure(CutOptions::default()).unwrap();
        let err = wizard.prepare(&background, &[], None).unwrap_err();
        assert!(matches!(
            err,
            CutError::GeometryInconsistency {
                entity: EntityRef::Element(7),
                ..
            }
        ));
    }
}
