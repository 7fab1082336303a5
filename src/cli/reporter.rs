// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::RunResult;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report one cut run
    pub fn report_cut(name: &str, run: &RunResult) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Problem:".bold(), name.cyan());
        println!("{}", "━".repeat(80).bright_black());

        let report = &run.report;
        if !report.performed {
            Self::report_warning("nothing to cut: no cutter mesh and no level set");
            return;
        }

        println!("\n{}", "Cut:".bold());
        Self::print_count("Strategy", report.strategy);
        Self::print_count("Cut elements", &report.cut_elements.to_string());
        Self::print_count("Volume cells", &report.volume_cells.to_string());
        Self::print_count("Boundary cells", &report.boundary_cells.to_string());
        Self::print_count("Integration points", &report.integration_points.to_string());
        if report.undecided_cells > 0 {
            Self::report_warning(&format!(
                "{} volume cells without position",
                report.undecided_cells
            ));
        }

        println!("\n{}", "Phase volumes:".bold());
        Self::print_count("Inside", &format!("{:.10}", run.volumes.inside));
        Self::print_count("Outside", &format!("{:.10}", run.volumes.outside));
        Self::print_count("Total", &format!("{:.10}", run.volumes.total()));

        println!("\n{}", "Performance:".bold());
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(run.duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// One line per strategy in a comparison table
    pub fn report_phase_line(label: &str, run: &RunResult) {
        println!(
            "  {:<20} {} {:.10} | {} {:.10} | {} {:>8} | {}",
            label.cyan(),
            "inside:".bright_black(),
            run.volumes.inside,
            "outside:".bright_black(),
            run.volumes.outside,
            "points:".bright_black(),
            run.report.integration_points,
            Self::format_duration(run.duration).yellow()
        );
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    fn print_count(name: &str, value: &str) {
        println!("  {} {}", format!("{}:", name).bright_black(), value.cyan());
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print progress message
    pub fn progress(message: &str) {
        println!("{} {}...", "⏳".bright_blue(), message.bright_black());
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(
            Reporter::format_duration(Duration::from_micros(500)),
            "500µs"
        );
        assert_eq!(
            Reporter::format_duration(Duration::from_millis(5)),
            "5.00ms"
        );
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }
}
