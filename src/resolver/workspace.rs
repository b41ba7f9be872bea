use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Discover workspace packages for npm/yarn/pnpm monorepos.
///
/// Returns a map from package name (e.g. `"@myorg/utils"`) to the directory imports of that
/// package should resolve into: `<pkg>/src/` when it exists, otherwise `<pkg>/`. An empty
/// map means the project is not a workspace.
pub fn discover_workspace_packages(root: &Path) -> HashMap<String, PathBuf> {
    let mut packages = HashMap::new();

    for pattern in read_workspace_globs(root) {
        let manifest_glob = format!("{}/{}/package.json", root.display(), pattern);
        let Ok(manifests) = glob::glob(&manifest_glob) else {
            debug!(pattern = %pattern, "skipping invalid workspace glob");
            continue;
        };

        for manifest in manifests.flatten() {
            let Some(pkg_dir) = manifest.parent() else {
                continue;
            };
            let Some(name) = read_json(&manifest)
                .and_then(|json| json["name"].as_str().map(str::to_owned))
            else {
                continue;
            };

            let src = pkg_dir.join("src");
            let source_dir = if src.is_dir() { src } else { pkg_dir.to_path_buf() };
            debug!(package = %name, dir = %source_dir.display(), "workspace package");
            packages.insert(name, source_dir);
        }
    }

    packages
}

fn read_json(path: &Path) -> Option<serde_json::Value> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Workspace glob patterns declared at the project root.
///
/// `pnpm-workspace.yaml` wins over the `workspaces` field of `package.json`, which may be
/// either an array or `{ "packages": [...] }` (yarn).
fn read_workspace_globs(root: &Path) -> Vec<String> {
    if let Ok(content) = std::fs::read_to_string(root.join("pnpm-workspace.yaml")) {
        return parse_pnpm_workspace_yaml(&content);
    }

    let Some(json) = read_json(&root.join("package.json")) else {
        return Vec::new();
    };
    let workspaces = &json["workspaces"];
    let list = workspaces
        .as_array()
        .or_else(|| workspaces["packages"].as_array());

    list.map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

/// Line-based reader for the `packages:` list of `pnpm-workspace.yaml`.
///
/// ```yaml
/// packages:
///   - 'packages/*'
///   - "apps/*"
///   - tools/*
/// ```
pub(crate) fn parse_pnpm_workspace_yaml(content: &str) -> Vec<String> {
    let mut globs = Vec::new();
    let mut in_packages = false;

    for line in content.lines() {
        let line = line.trim_end();

        if !in_packages {
            in_packages = line.trim() == "packages:";
            continue;
        }

        // The next top-level key closes the list.
        if !line.is_empty() && !line.starts_with([' ', '\t', '-']) {
            break;
        }

        let Some(item) = line.trim_start().strip_prefix("- ") else {
            continue;
        };
        let item = item.trim().trim_matches(|c: char| c == '\'' || c == '"');
        if !item.is_empty() {
            globs.push(item.to_owned());
        }
    }

    globs
}
