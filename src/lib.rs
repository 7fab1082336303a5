// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! xcut: geometric mesh cutting for extended finite elements
//!
//! A background volume mesh is cut by explicit surface meshes or by the zero
//! contour of a nodal level set. Every intersected element is split into
//! volume cells, interface patches become boundary cells, nodes receive one
//! DOF set per connected phase, and every cell gets an integration rule.
//!
//! ```no_run
//! use nalgebra::Point3;
//! use xcut::{BackgroundMesh, CutOptions, CutWizard, LevelSetField};
//!
//! let background = BackgroundMesh::structured_hex_box(
//!     [4, 4, 4],
//!     Point3::origin(),
//!     Point3::new(1.0, 1.0, 1.0),
//! );
//! let field = LevelSetField::from_fn(&background, |p| (p - Point3::new(0.5, 0.5, 0.5)).norm() - 0.3);
//!
//! let mut wizard = CutWizard::new();
//! wizard.configure(CutOptions::default())?;
//! wizard.prepare(&background, &[], Some(&field))?;
//! let report = wizard.cut(false)?;
//! println!("{} cells, inside volume {}", report.volume_cells, wizard.phase_volumes()?.inside);
//! # Ok::<(), xcut::CutError>(())
//! ```

pub mod cli;
pub mod config;
pub mod discretization;
pub mod dofset;
pub mod error;
pub mod geometry;
pub mod integration;
pub mod intersection;
pub mod io;
pub mod mesh;
pub mod parallel;
pub mod wizard;

pub use config::{CutOptions, Verbosity, VolumeCellStrategy};
pub use discretization::{BackgroundMesh, CutterMesh, LevelSetField, OffsetMarker};
pub use dofset::{CellKey, NodalDofSets};
pub use error::{ConfigurationError, CutError, EntityRef, Result};
pub use geometry::{ElementShape, SideShape};
pub use integration::IntegrationRule;
pub use mesh::Position;
pub use parallel::{Communicator, SerialCommunicator, ThreadCommunicator};
pub use wizard::{
    CutReport, CutWizard, ElementHandle, NodeDofUse, PhaseVolumes, SideHandle, WizardState,
};
