//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;
use std::path::Path;

use maestro_compose::cascade::Plan;
use maestro_runtime::orchestrator::ApplyReport;

const RULE: &str = "\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}";

/// Renders a plan as a human-readable listing, one task per line.
#[must_use]
pub fn format_plan(file: &Path, plan: &Plan, mode: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan for: {} [{mode}]", file.display());
    let _ = writeln!(out, "{RULE}");

    if plan.is_empty() {
        let _ = writeln!(out, "  Nothing to do.");
        return out;
    }

    let _ = writeln!(out, "  tier: {}", plan.tier);
    let _ = writeln!(out);
    for (index, task) in plan.tasks.iter().enumerate() {
        let _ = writeln!(out, "  {:>3}. {task}", index + 1);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {} task(s) planned.", plan.len());
    out
}

/// Summarizes the outcome of `validate` or `apply`.
#[must_use]
pub fn format_report(report: &ApplyReport, validate_only: bool) -> String {
    let verb = if validate_only { "validated" } else { "applied" };
    if report.tasks == 0 {
        format!("[{}] nothing to do", report.mode)
    } else {
        format!(
            "[{}] {} task(s) {verb} from {}",
            report.mode, report.tasks, report.tier
        )
    }
}
