// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wizard lifecycle: ordering, repeatability, options and debug output

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Point3;
use tempfile::TempDir;
use xcut::{
    BackgroundMesh, CutOptions, CutWizard, CutterMesh, LevelSetField, Verbosity,
    VolumeCellStrategy, WizardState,
};

fn unit_box(n: usize) -> BackgroundMesh {
    BackgroundMesh::structured_hex_box([n; 3], Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}

fn sphere(mesh: &BackgroundMesh) -> LevelSetField {
    let center = Point3::new(0.45, 0.5, 0.55);
    LevelSetField::from_fn(mesh, |p| (p - center).norm() - 0.3)
}

#[test]
fn test_queries_require_a_cut() -> Result<()> {
    let mut wizard = CutWizard::new();
    assert!(wizard.phase_volumes().unwrap_err().is_configuration());
    wizard.configure(CutOptions::default())?;
    wizard.prepare(&unit_box(2), &[], None)?;
    assert_eq!(wizard.state(), WizardState::Prepared);
    assert!(wizard.cut_mesh().unwrap_err().is_configuration());
    assert!(wizard.side_handle(0).unwrap_err().is_configuration());
    Ok(())
}

#[test]
fn test_cut_is_repeatable() -> Result<()> {
    let background = unit_box(3);
    let field = sphere(&background);
    let mut wizard = CutWizard::new();
    wizard.configure(CutOptions::default())?;
    wizard.prepare(&background, &[], Some(&field))?;

    let first = wizard.cut(false)?;
    let (cells, positions, dofsets, points) = {
        let mesh = wizard.cut_mesh()?;
        (
            mesh.cells.len(),
            mesh.node_positions.clone(),
            mesh.node_dofsets.clone(),
            mesh.cells
                .iter()
                .flat_map(|c| c.rule.iter().map(|(p, w)| (*p, w)).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        )
    };

    let second = wizard.cut(false)?;
    assert_eq!(first, second);
    let mesh = wizard.cut_mesh()?;
    assert_eq!(mesh.cells.len(), cells);
    assert_eq!(mesh.node_positions, positions);
    assert_eq!(mesh.node_dofsets, dofsets);
    let again: Vec<_> = mesh
        .cells
        .iter()
        .flat_map(|c| c.rule.iter().map(|(p, w)| (*p, w)).collect::<Vec<_>>())
        .collect();
    assert_eq!(again, points);
    Ok(())
}

#[test]
fn test_prepare_again_replaces_inputs() -> Result<()> {
    let background = unit_box(2);
    let plane = |x: f64| {
        CutterMesh::quad([
            Point3::new(x, -1.0, -1.0),
            Point3::new(x, 2.0, -1.0),
            Point3::new(x, 2.0, 2.0),
            Point3::new(x, -1.0, 2.0),
        ])
    };
    let mut wizard = CutWizard::new();
    wizard.configure(CutOptions::default())?;

    wizard.prepare(&background, &[plane(0.3)], None)?;
    wizard.cut(true)?;
    assert_relative_eq!(wizard.phase_volumes()?.inside, 0.3, epsilon = 1e-10);

    wizard.prepare(&background, &[plane(0.8)], None)?;
    assert_eq!(wizard.state(), WizardState::Prepared);
    wizard.cut(true)?;
    assert_relative_eq!(wizard.phase_volumes()?.inside, 0.8, epsilon = 1e-10);
    Ok(())
}

#[test]
fn test_options_from_toml() -> Result<()> {
    let options = CutOptions::from_toml(
        r#"
        quadrature = "tessellation"
        find_positions = false
        verbosity = "silent"
        integration_degree = 2
        "#,
    )?;
    assert_eq!(options.quadrature, VolumeCellStrategy::Tessellation);
    assert_eq!(options.verbosity, Verbosity::Silent);

    let background = unit_box(2);
    let field = LevelSetField::from_fn(&background, |p| p.y - 0.6);
    let mut wizard = CutWizard::new();
    wizard.configure(options)?;
    wizard.prepare(&background, &[], Some(&field))?;
    let report = wizard.cut(true)?;
    assert_eq!(report.strategy, "tessellation");
    assert_relative_eq!(wizard.phase_volumes()?.inside, 0.6, epsilon = 1e-10);

    assert!(CutOptions::from_toml("integration_degree = 40").is_err());
    Ok(())
}

#[test]
fn test_debug_dump_is_written() -> Result<()> {
    let dir = TempDir::new()?;
    let options = CutOptions {
        verbosity: Verbosity::Debug,
        dump_directory: Some(dir.path().to_path_buf()),
        ..CutOptions::default()
    };
    let background = unit_box(2);
    let field = sphere(&background);
    let mut wizard = CutWizard::new();
    wizard.configure(options)?;
    wizard.prepare(&background, &[], Some(&field))?;
    wizard.cut(false)?;

    for suffix in ["cut_topology", "volume_cells", "integration_cells"] {
        let path = dir.path().join(format!("xcut_rank0_{suffix}.pos"));
        let content = std::fs::read_to_string(&path)?;
        assert!(content.contains("View \""), "{}", path.display());
    }

    let files = wizard.dump(dir.path(), "again")?;
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.exists()));
    Ok(())
}
