pub mod file_resolver;
pub mod loader;
pub mod workspace;

pub use file_resolver::{ResolutionOutcome, build_resolver, resolve_import, workspace_map_to_aliases};
pub use loader::SourceModuleLoader;
pub use workspace::discover_workspace_packages;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::target_path::TargetPath;

/// Returns the modules a single module requires directly.
///
/// Implementations should skip library code; [`DependencyResolver`] filters it again
/// regardless.
pub trait ModuleLoader: Send + Sync {
    /// Absolute paths of the modules `module` imports or requires, in source order.
    fn immediate_dependencies(&self, module: &Path) -> Result<Vec<PathBuf>>;

    /// Forget anything cached about the on-disk module graph.
    fn clear_cache(&self) {}
}

/// Flattens the transitive, first-party dependency graph of a batch of entry modules.
pub struct DependencyResolver {
    project_root: PathBuf,
    loader: Arc<dyn ModuleLoader>,
}

impl fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("project_root", &self.project_root)
            .finish_non_exhaustive()
    }
}

impl DependencyResolver {
    /// Resolver for the project at `project_root` backed by [`SourceModuleLoader`].
    pub fn for_project(project_root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        let project_root = canonical_root(project_root.into());
        let loader = SourceModuleLoader::new(&project_root, fs);
        Self::new(project_root, Arc::new(loader))
    }

    pub fn new(project_root: impl Into<PathBuf>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            project_root: project_root.into(),
            loader,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Every first-party module the entries require, directly or transitively.
    ///
    /// The result is deduplicated and ordered by a depth-first walk in source order, entry
    /// by entry. Entry paths never appear in it, and neither does anything outside the
    /// project root or under `node_modules`.
    ///
    /// An entry that cannot be loaded contributes nothing; the rest of the batch still
    /// resolves. A dependency that cannot be loaded is kept but not descended into.
    pub fn get_dependencies(&self, entries: &[TargetPath]) -> Vec<TargetPath> {
        let entry_set: HashSet<&TargetPath> = entries.iter().collect();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut seen: HashSet<TargetPath> = HashSet::new();
        let mut dependencies = Vec::new();

        for entry in entries {
            let entry_path = entry.to_fs_path(&self.project_root);
            if !visited.insert(entry_path.clone()) {
                continue;
            }

            let direct = match self.loader.immediate_dependencies(&entry_path) {
                Ok(deps) => deps,
                Err(err) => {
                    warn!(entry = %entry, "could not load dependencies: {err:#}");
                    continue;
                }
            };

            // Depth-first, source order: push children reversed so the first import pops first.
            let mut stack: Vec<PathBuf> = direct.into_iter().rev().collect();
            while let Some(path) = stack.pop() {
                if !visited.insert(path.clone()) {
                    continue;
                }
                let Some(target) = self.first_party_target(&path) else {
                    debug!(path = %path.display(), "skipping dependency outside the project");
                    continue;
                };

                if !entry_set.contains(&target) && seen.insert(target.clone()) {
                    dependencies.push(target);
                }

                match self.loader.immediate_dependencies(&path) {
                    Ok(children) => stack.extend(children.into_iter().rev()),
                    Err(err) => {
                        debug!(path = %path.display(), "treating dependency as a leaf: {err:#}");
                    }
                }
            }
        }

        dependencies
    }

    pub fn clear_cache(&self) {
        self.loader.clear_cache();
    }

    fn first_party_target(&self, path: &Path) -> Option<TargetPath> {
        if is_library_path(path) {
            return None;
        }
        TargetPath::from_fs_path(&self.project_root, path)
    }
}

/// Returns true if any component of `path` is named `node_modules`.
pub(crate) fn is_library_path(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "node_modules")
}

/// The resolver reports symlink-free paths, so the root is compared in the same form.
fn canonical_root(root: PathBuf) -> PathBuf {
    std::fs::canonicalize(&root).unwrap_or(root)
}
