// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for xcut

pub mod compare;
pub mod problem;
pub mod reporter;

pub use compare::{compare_strategies, report_comparison, StrategyComparison};
pub use problem::{LevelSetShape, Problem, RunResult};
pub use reporter::Reporter;
