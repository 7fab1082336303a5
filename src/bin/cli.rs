// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! xcut CLI

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xcut::cli::{compare_strategies, report_comparison, LevelSetShape, Problem, Reporter};
use xcut::{CutOptions, Verbosity, VolumeCellStrategy};

#[derive(Parser)]
#[command(name = "xcut")]
#[command(about = "xcut - mesh cutting and cut-cell quadrature for XFEM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Options file (TOML); defaults to xcut.toml plus XCUT_* overrides
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ProblemArgs {
    /// Hexahedra per direction of the unit cube
    #[arg(short, long, default_value = "4")]
    divisions: usize,

    /// Plane level set a,b,c,d (a x + b y + c z + d)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "sphere")]
    plane: Option<String>,

    /// Sphere level set cx,cy,cz,r (negative inside)
    #[arg(long)]
    sphere: Option<String>,

    /// Problem definition as JSON instead of an analytic level set
    #[arg(long, value_name = "FILE", conflicts_with_all = ["plane", "sphere"])]
    problem: Option<PathBuf>,
}

impl ProblemArgs {
    fn load(&self) -> Result<(String, Problem)> {
        if let Some(path) = &self.problem {
            return Ok((path.display().to_string(), Problem::from_json_file(path)?));
        }
        let (name, shape) = match (&self.plane, &self.sphere) {
            (Some(plane), _) => (format!("plane {plane}"), LevelSetShape::parse_plane(plane)?),
            (None, Some(sphere)) => (
                format!("sphere {sphere}"),
                LevelSetShape::parse_sphere(sphere)?,
            ),
            (None, None) => bail!("one of --plane, --sphere or --problem is required"),
        };
        let name = format!("unit cube {0}x{0}x{0}, {name}", self.divisions);
        Ok((name, Problem::unit_cube(self.divisions, shape)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cut a problem and print the phase volumes
    Levelset {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Integration strategy
        #[arg(short, long)]
        strategy: Option<String>,

        /// Write the Gmsh debug dump into this directory
        #[arg(long, value_name = "DIR")]
        dump: Option<PathBuf>,
    },

    /// Cut a problem with every strategy and compare the volumes
    Compare {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Largest accepted relative deviation
        #[arg(short, long, default_value = "1e-6")]
        tolerance: f64,
    },

    /// Write the default options as TOML
    Config {
        #[arg(short, long, default_value = "xcut.toml")]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "xcut=debug" } else { "xcut=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Levelset {
            problem,
            strategy,
            dump,
        } => {
            let options = load_options(cli.config.as_ref(), strategy.as_deref(), dump.clone())?;
            levelset_command(problem, &options)?;
        }
        Commands::Compare { problem, tolerance } => {
            let options = load_options(cli.config.as_ref(), None, None)?;
            compare_command(problem, &options, *tolerance, cli.verbose)?;
        }
        Commands::Config { output } => {
            CutOptions::default()
                .save(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            Reporter::success(&format!("Default options written to {}", output.display()));
        }
        Commands::Version => {
            println!("xcut v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_options(
    path: Option<&PathBuf>,
    strategy: Option<&str>,
    dump: Option<PathBuf>,
) -> Result<CutOptions> {
    let mut options = match path {
        Some(path) => CutOptions::from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => CutOptions::load().context("Failed to load options")?,
    };
    if let Some(strategy) = strategy {
        options.quadrature = VolumeCellStrategy::from_str(strategy)
            .with_context(|| format!("Unknown strategy: {strategy}"))?;
    }
    if let Some(dump) = dump {
        options.verbosity = Verbosity::Debug;
        options.dump_directory = Some(dump);
    }
    Ok(options)
}

fn levelset_command(args: &ProblemArgs, options: &CutOptions) -> Result<()> {
    let (name, problem) = args.load()?;
    match problem.run(options) {
        Ok((_, result)) => {
            Reporter::report_cut(&name, &result);
            if let Some(dir) = &options.dump_directory {
                Reporter::report_info(&format!("Debug dump written to {}", dir.display()));
            }
            Ok(())
        }
        Err(e) => {
            Reporter::report_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

fn compare_command(args: &ProblemArgs, options: &CutOptions, tolerance: f64, verbose: bool) -> Result<()> {
    let (name, problem) = args.load()?;
    if verbose {
        Reporter::report_info(&format!("Comparing strategies on {name}"));
    }
    let comparison = compare_strategies(&problem, options, verbose)?;
    report_comparison(&comparison, tolerance);
    if !comparison.passed(tolerance) {
        std::process::exit(1);
    }
    Ok(())
}
