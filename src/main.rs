use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use watch_targets::cli::{Cli, Commands, OutputFormat};
use watch_targets::config::ExcludeMatcher;
use watch_targets::fs::RealFileSystem;
use watch_targets::output::{
    DependenciesReport, TargetsReport, UsesReport, render_dependencies, render_targets,
    render_uses,
};
use watch_targets::{DependencyResolver, TargetPath, WatchConfig, WatchTargets};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    watch_targets::logging::init_logging(cli.log_level)?;

    match cli.command {
        Commands::Targets {
            path,
            files,
            dirs,
            entries,
            no_deps,
            format,
        } => {
            run_targets(&path, &files, &dirs, &entries, no_deps, &format).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Deps {
            path,
            entries,
            format,
        } => {
            run_deps(&path, &entries, &format).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Uses {
            path,
            source,
            dependency,
            format,
        } => {
            let uses = run_uses(&path, &source, &dependency, &format).await?;
            Ok(if uses { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

async fn run_targets(
    root: &Path,
    files: &[String],
    dirs: &[String],
    entries: &[String],
    no_deps: bool,
    format: &OutputFormat,
) -> Result<()> {
    let (config, exclude) = load_config(root)?;

    let mut targets = WatchTargets::new(root);
    targets.set_watch_dependencies(config.watch_dependencies && !no_deps);
    targets.add_many(files);
    targets.add_and_make_glob(dirs);
    targets
        .add_dependencies_filtered(entries, |dep| Ok(exclude.matches(dep)))
        .await?;

    info!(
        root = %root.display(),
        targets = targets.targets().len(),
        "computed watch targets"
    );

    let report = TargetsReport {
        targets: targets.targets(),
        dependencies: targets
            .targets()
            .iter()
            .filter(|t| targets.is_dependency(t.as_str()))
            .collect(),
        watch_dependencies: targets.watch_dependencies(),
    };
    println!("{}", render_targets(&report, format));
    Ok(())
}

async fn run_deps(root: &Path, entries: &[String], format: &OutputFormat) -> Result<()> {
    let entries: Vec<TargetPath> = entries.iter().filter_map(|e| TargetPath::parse(e)).collect();
    if entries.is_empty() {
        bail!("no entry modules given");
    }

    let (_, exclude) = load_config(root)?;
    let resolver = DependencyResolver::for_project(root, Arc::new(RealFileSystem));
    let batch = entries.clone();
    let mut dependencies =
        tokio::task::spawn_blocking(move || resolver.get_dependencies(&batch)).await?;
    dependencies.retain(|dep| !exclude.matches(dep));

    let report = DependenciesReport {
        entries: &entries,
        dependencies: &dependencies,
    };
    println!("{}", render_dependencies(&report, format));
    Ok(())
}

async fn run_uses(
    root: &Path,
    source: &str,
    dependency: &str,
    format: &OutputFormat,
) -> Result<bool> {
    let (Some(source_target), Some(dependency_target)) =
        (TargetPath::parse(source), TargetPath::parse(dependency))
    else {
        bail!("source and dependency must be non-empty paths");
    };

    let (config, exclude) = load_config(root)?;
    let mut targets = WatchTargets::new(root);
    targets.set_watch_dependencies(config.watch_dependencies);
    targets
        .add_dependencies_filtered([source], |dep| Ok(exclude.matches(dep)))
        .await?;
    let uses = targets.uses(source, dependency);

    let report = UsesReport {
        source: &source_target,
        dependency: &dependency_target,
        uses,
    };
    println!("{}", render_uses(&report, format));
    Ok(uses)
}

/// `watch-targets.toml` from `root` plus its compiled `exclude` globs.
fn load_config(root: &Path) -> Result<(WatchConfig, ExcludeMatcher)> {
    let config = WatchConfig::load(root);
    let exclude = config.exclude_matcher()?;
    Ok((config, exclude))
}
