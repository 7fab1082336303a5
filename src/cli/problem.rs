// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut problems run by the CLI

use crate::config::CutOptions;
use crate::discretization::{BackgroundMesh, CutterMesh, LevelSetField};
use crate::wizard::{CutReport, CutWizard, PhaseVolumes};
use anyhow::{bail, Context, Result};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Analytic level-set shapes for quick experiments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSetShape {
    /// `a x + b y + c z + d`
    Plane { normal: Vector3<f64>, offset: f64 },
    /// Signed distance to a sphere, negative inside
    Sphere { center: Point3<f64>, radius: f64 },
}

impl LevelSetShape {
    pub fn value(&self, p: &Point3<f64>) -> f64 {
        match self {
            LevelSetShape::Plane { normal, offset } => normal.dot(&p.coords) + offset,
            LevelSetShape::Sphere { center, radius } => (p - center).norm() - radius,
        }
    }

    /// Parse `a,b,c,d` as a plane
    pub fn parse_plane(text: &str) -> Result<Self> {
        let [a, b, c, d] = parse_numbers::<4>(text).context("plane expects a,b,c,d")?;
        Ok(LevelSetShape::Plane {
            normal: Vector3::new(a, b, c),
            offset: d,
        })
    }

    /// Parse `cx,cy,cz,r` as a sphere
    pub fn parse_sphere(text: &str) -> Result<Self> {
        let [x, y, z, r] = parse_numbers::<4>(text).context("sphere expects cx,cy,cz,r")?;
        if r <= 0.0 {
            bail!("sphere radius must be positive, got {r}");
        }
        Ok(LevelSetShape::Sphere {
            center: Point3::new(x, y, z),
            radius: r,
        })
    }
}

fn parse_numbers<const N: usize>(text: &str) -> Result<[f64; N]> {
    let values = text
        .split(',')
        .map(|s| s.trim().parse::<f64>().with_context(|| format!("not a number: {s:?}")))
        .collect::<Result<Vec<_>>>()?;
    let count = values.len();
    values
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected {N} values, got {count}"))
}

/// Everything `prepare` needs, serializable as JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Problem {
    pub background: BackgroundMesh,
    #[serde(default)]
    pub cutters: Vec<CutterMesh>,
    #[serde(default)]
    pub level_set: Option<LevelSetField>,
    #[serde(default)]
    pub include_inner: bool,
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub report: CutReport,
    pub volumes: PhaseVolumes,
    pub duration: Duration,
}

impl Problem {
    /// Unit cube of `divisions`³ hexahedra cut by an analytic level set
    pub fn unit_cube(divisions: usize, shape: LevelSetShape) -> Self {
        let background = BackgroundMesh::structured_hex_box(
            [divisions; 3],
            Point3::origin(),
            Point3::new(1.0, 1.0, 1.0),
        );
        let level_set = LevelSetField::from_fn(&background, |p| shape.value(p));
        Self {
            background,
            cutters: Vec::new(),
            level_set: Some(level_set),
            include_inner: true,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse problem file: {}", path.display()))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write problem file: {}", path.display()))
    }

    /// Configure, prepare and cut with a fresh wizard
    pub fn run(&self, options: &CutOptions) -> Result<(CutWizard, RunResult)> {
        let start = Instant::now();
        let mut wizard = CutWizard::new();
        wizard.configure(options.clone())?;
        wizard
            .prepare(&self.background, &self.cutters, self.level_set.as_ref())
            .context("prepare failed")?;
        let report = wizard.cut(self.include_inner).context("cut failed")?;
        let volumes = if report.performed {
            wizard.phase_volumes()?
        } else {
            PhaseVolumes::default()
        };
        let result = RunResult {
            report,
            volumes,
            duration: start.elapsed(),
        };
        Ok((wizard, result))
    }
}
