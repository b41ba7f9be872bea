use serde::Serialize;

use crate::cli::OutputFormat;
use crate::target_path::TargetPath;

/// Result of the `targets` command.
#[derive(Debug, Serialize)]
pub struct TargetsReport<'a> {
    pub targets: &'a [TargetPath],
    /// Targets that were discovered through entry module dependencies.
    pub dependencies: Vec<&'a TargetPath>,
    pub watch_dependencies: bool,
}

/// Result of the `deps` command.
#[derive(Debug, Serialize)]
pub struct DependenciesReport<'a> {
    pub entries: &'a [TargetPath],
    pub dependencies: &'a [TargetPath],
}

/// Result of the `uses` command.
#[derive(Debug, Serialize)]
pub struct UsesReport<'a> {
    pub source: &'a TargetPath,
    pub dependency: &'a TargetPath,
    pub uses: bool,
}

pub fn render_targets(report: &TargetsReport<'_>, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Compact => lines(report.targets.iter()),
    }
}

pub fn render_dependencies(report: &DependenciesReport<'_>, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Compact => lines(report.dependencies.iter()),
    }
}

pub fn render_uses(report: &UsesReport<'_>, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Compact => {
            let verb = if report.uses { "uses" } else { "does not use" };
            format!("{} {} {}", report.source, verb, report.dependency)
        }
    }
}

fn lines<'a>(paths: impl Iterator<Item = &'a TargetPath>) -> String {
    paths.map(TargetPath::as_str).collect::<Vec<_>>().join("\n")
}

fn to_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(s) => s,
        Err(e) => format!("{{\"error\": \"failed to serialise output: {e}\"}}"),
    }
}
