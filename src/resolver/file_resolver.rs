use std::collections::HashMap;
use std::path::{Path, PathBuf};

use oxc_resolver::{AliasValue, ResolveOptions, Resolver, TsconfigOptions, TsconfigReferences};

/// The outcome of resolving a single import specifier.
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// Successfully resolved to an absolute file path.
    Resolved(PathBuf),
    /// The specifier is a Node.js built-in module (e.g. `"fs"`, `"node:crypto"`).
    BuiltinModule(String),
    /// The specifier could not be resolved. `String` contains a human-readable reason.
    Unresolved(String),
}

/// Build an `oxc_resolver::Resolver` for a JavaScript/TypeScript project.
///
/// - Both CommonJS (`require`) and ESM (`import`) condition names are enabled, since
///   config files and templates freely mix the two.
/// - `.js` extension aliases map to `.ts`/`.tsx`/`.js` so TypeScript sources that write
///   `import './foo.js'` resolve to `foo.ts`.
/// - If `tsconfig.json` exists at `project_root`, path aliases and project references
///   are honoured via `TsconfigReferences::Auto`.
/// - `workspace_aliases` point workspace package names at their local source directories
///   instead of `node_modules`, which keeps them first-party.
pub fn build_resolver(
    project_root: &Path,
    workspace_aliases: Vec<(String, Vec<AliasValue>)>,
) -> Resolver {
    let tsconfig_path = project_root.join("tsconfig.json");
    let tsconfig = tsconfig_path.exists().then(|| TsconfigOptions {
        config_file: tsconfig_path,
        references: TsconfigReferences::Auto,
    });

    Resolver::new(ResolveOptions {
        extensions: vec![
            ".js".into(),
            ".cjs".into(),
            ".mjs".into(),
            ".jsx".into(),
            ".ts".into(),
            ".tsx".into(),
            ".mts".into(),
            ".cts".into(),
            ".json".into(),
        ],
        extension_alias: vec![(
            ".js".into(),
            vec![".ts".into(), ".tsx".into(), ".js".into()],
        )],
        tsconfig,
        alias: workspace_aliases,
        condition_names: vec!["node".into(), "require".into(), "import".into()],
        builtin_modules: true,
        ..ResolveOptions::default()
    })
}

/// Resolve `specifier` as written inside `from_file`, relative to that file's directory.
pub fn resolve_import(resolver: &Resolver, from_file: &Path, specifier: &str) -> ResolutionOutcome {
    let Some(dir) = from_file.parent() else {
        return ResolutionOutcome::Unresolved("from_file has no parent directory".to_owned());
    };

    match resolver.resolve(dir, specifier) {
        Ok(resolution) => ResolutionOutcome::Resolved(resolution.into_path_buf()),
        Err(oxc_resolver::ResolveError::Builtin { resolved, .. }) => {
            ResolutionOutcome::BuiltinModule(resolved)
        }
        Err(e) => ResolutionOutcome::Unresolved(e.to_string()),
    }
}

/// Convert a workspace package map into `oxc_resolver` aliases, sorted by package name so
/// the resolver configuration does not depend on `HashMap` iteration order.
pub fn workspace_map_to_aliases(map: &HashMap<String, PathBuf>) -> Vec<(String, Vec<AliasValue>)> {
    let mut aliases: Vec<_> = map
        .iter()
        .map(|(name, path)| {
            (
                name.clone(),
                vec![AliasValue::Path(path.to_string_lossy().into_owned())],
            )
        })
        .collect();
    aliases.sort_by(|a, b| a.0.cmp(&b.0));
    aliases
}
