// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut options and their loading from TOML / environment

use crate::error::{ConfigurationError, CutError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest polynomial degree the direct-divergence tables cover
pub const MAX_INTEGRATION_DEGREE: usize = 6;

/// Algorithm used to build integration rules for volume cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCellStrategy {
    /// Split cells into tetrahedra and concatenate simplex rules
    Tessellation,
    /// Solve for a reduced rule matching the cell's polynomial moments
    MomentFitting,
    /// Divergence-theorem rule built on facets, no tessellation
    DirectDivergence,
}

impl VolumeCellStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeCellStrategy::Tessellation => "tessellation",
            VolumeCellStrategy::MomentFitting => "moment_fitting",
            VolumeCellStrategy::DirectDivergence => "direct_divergence",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "tessellation" => Some(VolumeCellStrategy::Tessellation),
            "moment_fitting" => Some(VolumeCellStrategy::MomentFitting),
            "direct_divergence" => Some(VolumeCellStrategy::DirectDivergence),
            _ => None,
        }
    }

    /// All strategies, in a fixed order
    pub fn all() -> [VolumeCellStrategy; 3] {
        [
            VolumeCellStrategy::Tessellation,
            VolumeCellStrategy::MomentFitting,
            VolumeCellStrategy::DirectDivergence,
        ]
    }
}

/// Output verbosity of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Silent,
    Normal,
    /// Also writes the debug dump when a dump directory is set
    Debug,
}

impl Verbosity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" => Some(Verbosity::Silent),
            "normal" => Some(Verbosity::Normal),
            "debug" => Some(Verbosity::Debug),
            _ => None,
        }
    }
}

/// Options passed to `CutWizard::configure`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutOptions {
    /// Integration rule generation for volume cells
    pub quadrature: VolumeCellStrategy,
    /// Ray-cast cells whose position cannot be propagated
    pub find_positions: bool,
    /// Log and dump verbosity
    pub verbosity: Verbosity,
    /// Point merge radius, relative to the background bounding-box diagonal
    pub point_tolerance: f64,
    /// Polynomial degree integrated exactly by generated rules
    pub integration_degree: usize,
    /// Threshold below which a facet plane coefficient counts as zero in
    /// the direct-divergence closed forms
    pub zero_coefficient_tolerance: f64,
    /// Directory for the debug dump
    pub dump_directory: Option<PathBuf>,
}

impl Default for CutOptions {
    fn default() -> Self {
        Self {
            quadrature: VolumeCellStrategy::DirectDivergence,
            find_positions: true,
            verbosity: Verbosity::Normal,
            point_tolerance: 1e-10,
            integration_degree: 4,
            zero_coefficient_tolerance: 1e-7,
            dump_directory: None,
        }
    }
}

impl CutOptions {
    /// Options with a given strategy and defaults otherwise
    pub fn with_strategy(quadrature: VolumeCellStrategy) -> Self {
        Self {
            quadrature,
            ..Self::default()
        }
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let options: CutOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Load `xcut.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut options = if PathBuf::from("xcut.toml").exists() {
            Self::from_file("xcut.toml")?
        } else {
            Self::default()
        };

        if let Ok(quadrature) = std::env::var("XCUT_QUADRATURE") {
            options.quadrature = VolumeCellStrategy::from_str(&quadrature).ok_or_else(|| {
                ConfigurationError::InvalidOption(format!("XCUT_QUADRATURE={quadrature}"))
            })?;
        }

        if let Ok(verbosity) = std::env::var("XCUT_VERBOSITY") {
            options.verbosity = Verbosity::from_str(&verbosity).ok_or_else(|| {
                ConfigurationError::InvalidOption(format!("XCUT_VERBOSITY={verbosity}"))
            })?;
        }

        if let Ok(find) = std::env::var("XCUT_FIND_POSITIONS") {
            options.find_positions = find.parse().unwrap_or(options.find_positions);
        }

        if let Ok(dir) = std::env::var("XCUT_DUMP_DIR") {
            options.dump_directory = Some(PathBuf::from(dir));
        }

        options.validate()?;
        Ok(options)
    }

    /// Save options to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            CutError::Configuration(ConfigurationError::InvalidOption(e.to_string()))
        })?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.integration_degree > MAX_INTEGRATION_DEGREE {
            return Err(ConfigurationError::InvalidOption(format!(
                "integration_degree {} exceeds {}",
                self.integration_degree, MAX_INTEGRATION_DEGREE
            ))
            .into());
        }
        if !(self.point_tolerance > 0.0 && self.point_tolerance < 1e-3) {
            return Err(ConfigurationError::InvalidOption(format!(
                "point_tolerance {} outside (0, 1e-3)",
                self.point_tolerance
            ))
            .into());
        }
        if !(self.zero_coefficient_tolerance > 0.0) {
            return Err(ConfigurationError::InvalidOption(format!(
                "zero_coefficient_tolerance {} must be positive",
                self.zero_coefficient_tolerance
            ))
            .into());
        }
        Ok(())
    }
}
