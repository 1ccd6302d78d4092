use std::fmt::Write as _;

use crate::analyzers::ImpactedFile;
use crate::change::{ChangeType, ChangedFile};
use crate::error::Error;
use crate::pipeline::AnalysisReport;

fn status_letter(change: ChangeType) -> char {
    match change {
        ChangeType::Added => 'A',
        ChangeType::Modified => 'M',
        ChangeType::Deleted => 'D',
        ChangeType::Renamed => 'R',
    }
}

fn changed_line(file: &ChangedFile) -> String {
    let letter = status_letter(file.change_type);
    match &file.old_path {
        Some(old) => format!("  {letter} {old} -> {}", file.path),
        None => format!("  {letter} {}", file.path),
    }
}

fn impacted_lines(out: &mut String, file: &ImpactedFile) {
    let _ = writeln!(out, "  {}", file.path);
    for reason in &file.reasons {
        let _ = writeln!(out, "    - {}: {}", reason.kind.as_str(), reason.description);
    }
}

/// Human-readable report, one section per concern.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Changed files ({}):", report.changed_files.len());
    if report.changed_files.is_empty() {
        out.push_str("  (none)\n");
    }
    for file in &report.changed_files {
        let _ = writeln!(out, "{}", changed_line(file));
    }
    out.push('\n');

    if let Some(mono) = &report.monorepo {
        let _ = writeln!(
            out,
            "Monorepo: {} ({} workspaces)",
            mono.kind.as_str(),
            mono.workspaces.len()
        );
        if report.affected_packages.is_empty() {
            out.push_str("Affected packages: (none)\n");
        } else {
            let _ = writeln!(out, "Affected packages: {}", report.affected_packages.join(", "));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Impacted tests ({}: {} unit, {} api):",
        report.impacted_tests.len(),
        report.unit_test_count,
        report.api_test_count
    );
    if report.impacted_tests.is_empty() {
        out.push_str("  (none)\n");
    }
    for file in &report.impacted_tests {
        impacted_lines(&mut out, file);
    }
    out.push('\n');

    let risk = &report.risk;
    let _ = writeln!(out, "Risk: {} (score {})", risk.level, risk.score);
    let _ = writeln!(out, "  {}", risk.summary);
    for signal in &risk.signals {
        let _ = writeln!(out, "  + {} ({}): {}", signal.signal, signal.weight, signal.description);
    }

    if !report.warnings.is_empty() {
        out.push('\n');
        out.push_str("Warnings:\n");
        for warning in &report.warnings {
            let _ = writeln!(out, "  {warning}");
        }
    }

    out.push('\n');
    let _ = writeln!(
        out,
        "Scanned {} files, {} import edges ({} cached, {} parsed)",
        report.graph_files, report.graph_edges, report.stats.cache_hits, report.stats.cache_misses
    );
    out
}

pub fn render_json(report: &AnalysisReport) -> Result<String, Error> {
    serde_json::to_string_pretty(report).map_err(Error::ReportSerialize)
}

pub fn print_report(report: &AnalysisReport) {
    print!("{}", render_text(report));
}

pub fn print_report_json(report: &AnalysisReport) -> Result<(), Error> {
    println!("{}", render_json(report)?);
    Ok(())
}
