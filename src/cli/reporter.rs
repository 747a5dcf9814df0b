// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::boundary::{AssignReport, SegmentRegistry};
use crate::geometry::checks::PreflightReport;
use crate::io::{ExportSummary, ImportedModel};
use crate::scene::LookupSource;
use crate::thermal::{ResistanceReport, USectionReport};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    fn header(title: &str, subject: &str) {
        println!();
        Self::rule();
        println!("{} {}", title.bold(), subject.cyan());
        Self::rule();
    }

    fn field(name: &str, value: impl std::fmt::Display) {
        println!(
            "  {} {}",
            format!("{}:", name).bright_black(),
            value.to_string().cyan()
        );
    }

    /// Report the outcome of an edge assignment
    pub fn report_assign(group: &str, report: &AssignReport) {
        Self::header("Assigned:", group);
        Self::field("Created", report.created_count());
        if report.reversed > 0 {
            Self::field("Reversed", report.reversed);
        }
        if report.ambiguous > 0 {
            println!(
                "  {} {}",
                "Ambiguous:".bright_black(),
                report.ambiguous.to_string().yellow()
            );
        }
        if report.duplicates > 0 {
            println!(
                "  {} {}",
                "Duplicates:".bright_black(),
                report.duplicates.to_string().yellow()
            );
        }
        if !report.collisions.is_empty() {
            let existing: Vec<String> = report.collisions.iter().map(|t| t.to_string()).collect();
            println!(
                "  {} {} {}",
                "Collisions:".bright_black(),
                report.collisions.len().to_string().red(),
                format!("({})", existing.join(", ")).bright_black()
            );
        }
        if report.degenerate > 0 {
            Self::field("Degenerate", report.degenerate);
        }
        Self::rule();
    }

    /// Report a finished export
    pub fn report_export(file: &str, summary: &ExportSummary, duration: Duration) {
        Self::header("Exported:", file);
        Self::field("Materials", summary.materials);
        Self::field("Polygons", summary.polygons);
        Self::field("Boundaries", summary.boundaries);
        Self::field("Conditions", summary.boundary_conditions.join(", "));
        if summary.unmatched_ufactors > 0 {
            println!(
                "  {} {} {}",
                "Unmatched U-factors:".bright_black(),
                summary.unmatched_ufactors.to_string().yellow(),
                "(written as Adiabatic)".bright_black()
            );
        }
        Self::field("Time", Self::format_duration(duration));
        Self::rule();
    }

    /// Report an imported file
    pub fn report_import(file: &str, model: &ImportedModel) {
        Self::header("Imported:", file);
        if let Some(ref title) = model.title {
            Self::field("Title", title);
        }
        Self::field("Solids", model.solids.len());
        Self::field("Materials", model.materials.len());
        Self::field("Segments", model.registry.len());
        if model.skipped_boundaries > 0 {
            println!(
                "  {} {}",
                "Skipped boundaries:".bright_black(),
                model.skipped_boundaries.to_string().yellow()
            );
        }
        for result in &model.results {
            for projection in &result.projections {
                println!(
                    "  {} {} {} {}",
                    format!("U[{}]", result.tag).bright_black(),
                    projection.length_type,
                    format!("{:.4}", projection.ufactor).green(),
                    projection.ufactor_units.bright_black()
                );
            }
        }
        Self::rule();
    }

    /// List registry groups in export order
    pub fn report_groups(registry: &SegmentRegistry) {
        Self::header("Groups:", &registry.group_count().to_string());
        for group in registry.list_groups() {
            println!(
                "  {:<40} {} {}",
                group.name().cyan(),
                group.len().to_string().bold(),
                "segments".bright_black()
            );
            for segment in group.segments() {
                println!(
                    "    {} {} ({:.4}, {:.4}) → ({:.4}, {:.4})",
                    format!("#{}", segment.id).bright_black(),
                    segment.name,
                    segment.segment.start.x,
                    segment.segment.start.y,
                    segment.segment.end.x,
                    segment.segment.end.y
                );
            }
        }
        Self::rule();
    }

    /// Report a layered resistance calculation
    pub fn report_resistance(report: &ResistanceReport) {
        Self::header("U-value:", &format!("{} layers", report.layers.len()));
        for (index, layer) in report.layers.iter().enumerate() {
            let line = format!(
                "  {:>2}. d={:.3} m  λ={:.3} W/mK  R={:.3} m²K/W",
                index + 1,
                layer.layer.thickness,
                layer.layer.conductivity,
                layer.resistance
            );
            if layer.flagged {
                println!("{} {}", line.yellow(), "(ignored)".bright_black());
            } else {
                println!("{}", line);
            }
        }
        Self::field("Rsi", format!("{:.2}", report.rsi));
        Self::field("Rse", format!("{:.2}", report.rse));
        Self::field("R total", format!("{:.2} m²K/W", report.r_total));

        let u_value = format!("{:.3} W/m²K", report.u_value);
        if report.valid {
            println!("  {} {}", "U:".bright_black(), u_value.green().bold());
        } else {
            println!("  {} {}", "U:".bright_black(), u_value.red().bold());
        }
        Self::rule();
    }

    /// Report a U-section evaluation
    pub fn report_usection(report: &USectionReport) {
        Self::header("U-section:", &report.name);
        for layer in &report.layers {
            let source = match layer.conductivity.source {
                LookupSource::Explicit => "explicit".to_string(),
                LookupSource::NameHeuristic(keyword) => format!("from name \"{keyword}\""),
                LookupSource::Default => "default".to_string(),
            };
            println!(
                "  {} {} d={:.3} m λ={:.3} {}",
                layer.solid.cyan(),
                layer.material.as_deref().unwrap_or("-").bright_black(),
                layer.thickness,
                layer.conductivity.value,
                format!("({source})").bright_black()
            );
        }
        for missing in &report.missing_layers {
            Self::report_warning(&format!("layer not found: {missing}"));
        }
        Self::report_resistance(&report.resistance);
    }

    /// Report preflight findings; returns whether every solid is clean
    pub fn report_preflight(reports: &[PreflightReport]) -> bool {
        Self::header("Preflight:", &format!("{} solids", reports.len()));
        let mut clean = true;
        for report in reports {
            if report.is_clean() {
                println!("  {} {}", "✅".green(), report.solid);
                continue;
            }
            clean = false;
            println!("  {} {}", "⚠️ ".yellow(), report.solid.yellow().bold());
            if !report.downward_faces.is_empty() {
                Self::field("Downward faces", report.downward_faces.len());
            }
            if report.off_grid_vertices > 0 {
                Self::field("Off-grid vertices", report.off_grid_vertices);
            }
            if report.faces_with_too_few_vertices > 0 {
                Self::field("Degenerate faces", report.faces_with_too_few_vertices);
            }
        }
        Self::rule();
        clean
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
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

    #[test]
    fn test_preflight_summary() {
        colored::control::set_override(false);
        let clean = PreflightReport {
            solid: "wall".to_string(),
            ..Default::default()
        };
        let dirty = PreflightReport {
            solid: "slab".to_string(),
            off_grid_vertices: 3,
            ..Default::default()
        };
        assert!(Reporter::report_preflight(&[clean.clone()]));
        assert!(!Reporter::report_preflight(&[clean, dirty]));
    }
}
