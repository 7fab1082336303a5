// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Volume-cell integration rules
//!
//! Three interchangeable strategies turn the convex pieces of a volume cell
//! into a list of points and weights:
//!
//! - [`Tessellation`]: fan each piece into tetrahedra, concatenate simplex rules
//! - [`MomentFitting`]: solve for weights reproducing the cell's exact moments
//! - [`DirectDivergence`]: facet rules swept along x, no tessellation
//!
//! All of them integrate polynomials up to the configured degree exactly.

pub mod direct_divergence;
pub mod divergence_table;
pub mod gauss;
pub mod moment_fitting;
pub mod monomials;
pub mod tessellation;

pub use direct_divergence::DirectDivergence;
pub use moment_fitting::MomentFitting;
pub use tessellation::Tessellation;

use crate::config::{CutOptions, VolumeCellStrategy};
use crate::error::{EntityRef, Result};
use crate::mesh::ConvexPiece;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Quadrature points with weights in physical coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRule {
    pub points: Vec<Point3<f64>>,
    pub weights: Vec<f64>,
}

impl IntegrationRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point3<f64>, weight: f64) {
        self.points.push(point);
        self.weights.push(weight);
    }

    pub fn extend(&mut self, other: IntegrationRule) {
        self.points.extend(other.points);
        self.weights.extend(other.weights);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of weights, the integral of 1
    pub fn volume(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn integrate(&self, f: impl Fn(&Point3<f64>) -> f64) -> f64 {
        self.points
            .iter()
            .zip(&self.weights)
            .map(|(p, w)| f(p) * w)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point3<f64>, f64)> {
        self.points.iter().zip(self.weights.iter().copied())
    }
}

/// Strategy producing a rule for one volume cell
pub trait CellIntegrator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rule over the union of `pieces`; `cell` names the cell in errors
    fn integrate_cell(&self, pieces: &[ConvexPiece], cell: EntityRef) -> Result<IntegrationRule>;
}

/// Integrator for the configured strategy
pub fn integrator_for(options: &CutOptions) -> Box<dyn CellIntegrator> {
    let degree = options.integration_degree;
    match options.quadrature {
        VolumeCellStrategy::Tessellation => Box::new(Tessellation::new(degree)),
        VolumeCellStrategy::MomentFitting => Box::new(MomentFitting::new(
            degree,
            options.zero_coefficient_tolerance,
        )),
        VolumeCellStrategy::DirectDivergence => Box::new(DirectDivergence::new(
            degree,
            options.zero_coefficient_tolerance,
        )),
    }
}
