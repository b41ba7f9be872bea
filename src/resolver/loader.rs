use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use oxc_resolver::Resolver;
use tracing::debug;

use crate::fs::FileSystem;
use crate::parser::languages::Grammar;
use crate::parser::parse_imports;

use super::file_resolver::{ResolutionOutcome, build_resolver, resolve_import, workspace_map_to_aliases};
use super::workspace::discover_workspace_packages;
use super::{ModuleLoader, is_library_path};

/// [`ModuleLoader`] that reads a module, extracts its import specifiers with tree-sitter,
/// and resolves each one with `oxc_resolver`.
///
/// Built-in modules, unresolvable specifiers, and anything resolved into `node_modules`
/// are dropped here, so library code is never handed back for traversal.
pub struct SourceModuleLoader {
    resolver: Resolver,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for SourceModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceModuleLoader")
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl SourceModuleLoader {
    /// Loader for the project at `project_root`, aware of its tsconfig and workspace packages.
    pub fn new(project_root: &Path, fs: Arc<dyn FileSystem>) -> Self {
        let workspace = discover_workspace_packages(project_root);
        if !workspace.is_empty() {
            debug!(packages = workspace.len(), "resolving workspace packages to local sources");
        }
        let resolver = build_resolver(project_root, workspace_map_to_aliases(&workspace));
        Self { resolver, fs }
    }
}

impl ModuleLoader for SourceModuleLoader {
    fn immediate_dependencies(&self, module: &Path) -> Result<Vec<PathBuf>> {
        let source = self.fs.read(module)?;

        let ext = module.extension().and_then(|e| e.to_str()).unwrap_or("");
        if Grammar::for_extension(ext).is_none() {
            // JSON and other non-module files are leaves.
            return Ok(Vec::new());
        }

        let mut deps = Vec::new();
        for import in parse_imports(module, &source)? {
            match resolve_import(&self.resolver, module, &import.specifier) {
                ResolutionOutcome::Resolved(path) => {
                    if is_library_path(&path) {
                        debug!(
                            module = %module.display(),
                            specifier = %import.specifier,
                            "skipping library dependency"
                        );
                        continue;
                    }
                    if !deps.contains(&path) {
                        deps.push(path);
                    }
                }
                ResolutionOutcome::BuiltinModule(name) => {
                    debug!(module = %module.display(), builtin = %name, "skipping builtin");
                }
                ResolutionOutcome::Unresolved(reason) => {
                    debug!(
                        module = %module.display(),
                        specifier = %import.specifier,
                        reason = %reason,
                        "unresolved import"
                    );
                }
            }
        }

        Ok(deps)
    }

    fn clear_cache(&self) {
        self.resolver.clear_cache();
    }
}
