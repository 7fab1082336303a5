// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cross-strategy comparison: the same problem cut with every integration
//! strategy

use super::{Problem, Reporter, RunResult};
use crate::config::{CutOptions, VolumeCellStrategy};
use anyhow::{Context, Result};
use colored::Colorize;

/// Runs of one problem, one per strategy
#[derive(Debug, Clone)]
pub struct StrategyComparison {
    pub runs: Vec<(VolumeCellStrategy, RunResult)>,
    /// Largest relative deviation of any phase volume from the first run
    pub max_deviation: f64,
}

impl StrategyComparison {
    pub fn passed(&self, tolerance: f64) -> bool {
        self.max_deviation <= tolerance
    }
}

fn relative_deviation(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// Cut `problem` with every strategy on top of `base` options
pub fn compare_strategies(
    problem: &Problem,
    base: &CutOptions,
    verbose: bool,
) -> Result<StrategyComparison> {
    let mut runs = Vec::new();
    for strategy in VolumeCellStrategy::all() {
        if verbose {
            Reporter::progress(&format!("Cutting with {}", strategy.as_str()));
        }
        let options = CutOptions {
            quadrature: strategy,
            ..base.clone()
        };
        let (_, result) = problem
            .run(&options)
            .with_context(|| format!("Failed to cut with {}", strategy.as_str()))?;
        runs.push((strategy, result));
    }

    let max_deviation = match runs.first() {
        Some((_, reference)) => runs
            .iter()
            .flat_map(|(_, run)| {
                [
                    relative_deviation(run.volumes.inside, reference.volumes.inside),
                    relative_deviation(run.volumes.outside, reference.volumes.outside),
                ]
            })
            .fold(0.0, f64::max),
        None => 0.0,
    };
    Ok(StrategyComparison {
        runs,
        max_deviation,
    })
}

/// Print a comparison table
pub fn report_comparison(comparison: &StrategyComparison, tolerance: f64) {
    println!("\n{}", "═".repeat(80));
    println!("{}", "Strategy comparison".bold());
    println!("{}", "═".repeat(80));
    for (strategy, run) in &comparison.runs {
        Reporter::report_phase_line(strategy.as_str(), run);
    }
    let deviation = format!("{:.3e}", comparison.max_deviation);
    println!(
        "\n  {} {}",
        "Max deviation:".bright_black(),
        if comparison.passed(tolerance) {
            deviation.green()
        } else {
            deviation.red()
        }
    );
    println!("{}", "═".repeat(80));
}
