pub mod attribution;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Result, WatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolver::DependencyResolver;
use crate::target_path::TargetPath;

use attribution::AttributionGraph;

/// The set of paths a watch session observes, and why each dependency is in it.
///
/// Targets are kept in first-insertion order and deduplicated by canonical form
/// ([`TargetPath`]). The set only grows, so the checkpoint used by
/// [`new_targets_since_last_reset`](Self::new_targets_since_last_reset) is a length.
///
/// Mutations take `&mut self`; share one set between tasks through a
/// `tokio::sync::Mutex`.
#[derive(Debug)]
pub struct WatchTargets {
    targets: Vec<TargetPath>,
    watched: HashSet<TargetPath>,
    /// Targets that entered through `add_dependencies*`.
    dependencies: HashSet<TargetPath>,
    attribution: AttributionGraph,
    checkpoint: usize,
    watch_dependencies: bool,
    project_root: PathBuf,
    fs: Arc<dyn FileSystem>,
    resolver: Arc<DependencyResolver>,
}

impl WatchTargets {
    /// Empty set for the project at `project_root`, using the real filesystem and the
    /// tree-sitter/oxc module loader.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let resolver = DependencyResolver::for_project(project_root, fs.clone());
        Self::with_collaborators(fs, Arc::new(resolver))
    }

    /// Empty set over explicit collaborators. Paths are interpreted relative to the
    /// resolver's project root.
    pub fn with_collaborators(fs: Arc<dyn FileSystem>, resolver: Arc<DependencyResolver>) -> Self {
        Self {
            targets: Vec::new(),
            watched: HashSet::new(),
            dependencies: HashSet::new(),
            attribution: AttributionGraph::new(),
            checkpoint: 0,
            watch_dependencies: true,
            project_root: resolver.project_root().to_path_buf(),
            fs,
            resolver,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn watch_dependencies(&self) -> bool {
        self.watch_dependencies
    }

    /// When off, `add_dependencies*` calls change nothing.
    pub fn set_watch_dependencies(&mut self, watch: bool) {
        self.watch_dependencies = watch;
    }

    // -----------------------------------------------------------------------
    // Adding targets
    // -----------------------------------------------------------------------

    /// Watch `path`. Empty input is ignored; the path does not have to exist.
    pub fn add(&mut self, path: &str) {
        if let Some(target) = TargetPath::parse(path) {
            self.insert(target);
        }
    }

    pub fn add_many<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.add(path.as_ref());
        }
    }

    /// Like [`add_many`](Self::add_many), but directories become `<dir>/**` globs.
    ///
    /// A path the filesystem does not report as a directory (including one that does not
    /// exist) is added as written.
    pub fn add_and_make_glob<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            let Some(target) = TargetPath::parse(path.as_ref()) else {
                continue;
            };
            let target = if self.fs.is_dir(&target.to_fs_path(&self.project_root)) {
                target.to_recursive_glob()
            } else {
                target
            };
            self.insert(target);
        }
    }

    /// Watch every first-party module the entries require, transitively, and attribute
    /// each discovered dependency to every entry of the batch.
    pub async fn add_dependencies<I, S>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_dependencies_filtered(entries, |_| Ok(false)).await
    }

    /// [`add_dependencies`](Self::add_dependencies), dropping every dependency for which
    /// `exclude` returns `Ok(true)`.
    ///
    /// An `Err` from `exclude` aborts the call before anything is recorded.
    pub async fn add_dependencies_filtered<I, S, F>(&mut self, entries: I, mut exclude: F) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&TargetPath) -> anyhow::Result<bool>,
    {
        if !self.watch_dependencies {
            debug!("dependency watching is off, skipping");
            return Ok(());
        }

        let mut batch: Vec<TargetPath> = Vec::new();
        for entry in entries {
            if let Some(target) = TargetPath::parse(entry.as_ref())
                && !batch.contains(&target)
            {
                batch.push(target);
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        let resolver = Arc::clone(&self.resolver);
        let entries_for_task = batch.clone();
        let discovered =
            tokio::task::spawn_blocking(move || resolver.get_dependencies(&entries_for_task))
                .await?;

        let mut kept = Vec::with_capacity(discovered.len());
        for dep in discovered {
            let excluded = exclude(&dep).map_err(|err| WatchError::Filter {
                path: dep.to_string(),
                message: format!("{err:#}"),
            })?;
            if excluded {
                trace!(dependency = %dep, "excluded by filter");
            } else {
                kept.push(dep);
            }
        }

        debug!(
            entries = batch.len(),
            dependencies = kept.len(),
            "attaching module dependencies"
        );

        for dep in kept {
            for entry in &batch {
                self.attribution.record(entry, &dep);
            }
            self.dependencies.insert(dep.clone());
            self.insert(dep);
        }

        Ok(())
    }

    fn insert(&mut self, target: TargetPath) {
        if self.watched.insert(target.clone()) {
            trace!(target = %target, "new watch target");
            self.targets.push(target);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// True iff `dependency` was attributed to `source` by an `add_dependencies*` call.
    pub fn uses(&self, source: &str, dependency: &str) -> bool {
        match (TargetPath::parse(source), TargetPath::parse(dependency)) {
            (Some(source), Some(dependency)) => self.attribution.uses(&source, &dependency),
            _ => false,
        }
    }

    pub fn dependencies_of(&self, source: &str) -> Vec<TargetPath> {
        TargetPath::parse(source)
            .map(|s| self.attribution.dependencies_of(&s))
            .unwrap_or_default()
    }

    pub fn dependants_of(&self, dependency: &str) -> Vec<TargetPath> {
        TargetPath::parse(dependency)
            .map(|d| self.attribution.dependants_of(&d))
            .unwrap_or_default()
    }

    pub fn is_watched(&self, path: &str) -> bool {
        TargetPath::parse(path).is_some_and(|t| self.watched.contains(&t))
    }

    /// True if `path` entered the set as a module dependency.
    pub fn is_dependency(&self, path: &str) -> bool {
        TargetPath::parse(path).is_some_and(|t| self.dependencies.contains(&t))
    }

    /// All targets, in first-insertion order.
    pub fn targets(&self) -> &[TargetPath] {
        &self.targets
    }

    /// Targets added since the last [`reset`](Self::reset), or since construction.
    pub fn new_targets_since_last_reset(&self) -> &[TargetPath] {
        &self.targets[self.checkpoint..]
    }

    /// Move the checkpoint to the current set.
    pub fn reset(&mut self) {
        self.checkpoint = self.targets.len();
    }

    /// Drop the module loader's cached view of the dependency graph, so the next
    /// `add_dependencies*` call re-reads changed modules.
    pub fn clear_dependency_cache(&self) {
        self.resolver.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::resolver::ModuleLoader;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ROOT: &str = "/site";

    #[derive(Default)]
    struct StubLoader {
        edges: HashMap<PathBuf, Vec<PathBuf>>,
        cleared: AtomicUsize,
    }

    impl StubLoader {
        fn with(mut self, from: &str, to: &[&str]) -> Self {
            self.edges.insert(
                Path::new(ROOT).join(from),
                to.iter().map(|t| Path::new(ROOT).join(t)).collect(),
            );
            self
        }
    }

    impl ModuleLoader for StubLoader {
        fn immediate_dependencies(&self, module: &Path) -> anyhow::Result<Vec<PathBuf>> {
            self.edges
                .get(module)
                .cloned()
                .ok_or_else(|| anyhow!("cannot find module {}", module.display()))
        }

        fn clear_cache(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn stub_graph() -> StubLoader {
        StubLoader::default()
            .with("config-deps.js", &["config-deps-upstream.js"])
            .with("config-deps-upstream.js", &[])
            .with("deps/two-deps.11ty.js", &["deps/dep1.js", "deps/dep2.js"])
            .with("deps/dep1.js", &[])
            .with("deps/dep2.js", &[])
    }

    fn watch_targets_with(fs: MockFileSystem, loader: StubLoader) -> WatchTargets {
        let resolver = DependencyResolver::new(ROOT, Arc::new(loader));
        WatchTargets::with_collaborators(Arc::new(fs), Arc::new(resolver))
    }

    fn watch_targets() -> WatchTargets {
        watch_targets_with(MockFileSystem::new(), stub_graph())
    }

    fn strs(targets: &[TargetPath]) -> Vec<&str> {
        targets.iter().map(|t| t.as_str()).collect()
    }

    #[test]
    fn test_starts_empty() {
        let targets = watch_targets();
        assert!(targets.targets().is_empty());
        assert!(targets.new_targets_since_last_reset().is_empty());
        assert!(targets.watch_dependencies());
    }

    #[test]
    fn test_add_normalizes_and_dedups() {
        let mut targets = watch_targets();
        targets.add(".eleventy.js");
        targets.add("./.eleventy.js");
        targets.add("");
        assert_eq!(strs(targets.targets()), vec!["./.eleventy.js"]);
        assert!(targets.is_watched(".eleventy.js"));
        assert!(!targets.is_dependency(".eleventy.js"));
    }

    #[test]
    fn test_add_many_preserves_first_insertion_order() {
        let mut targets = watch_targets();
        targets.add_many([".eleventy.js", "b.js"]);
        targets.add_many(vec!["b.js".to_owned(), "c.js".to_owned()]);
        assert_eq!(strs(targets.targets()), vec!["./.eleventy.js", "./b.js", "./c.js"]);
    }

    #[test]
    fn test_add_and_make_glob() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/test/b.js", "");
        let mut targets = watch_targets_with(fs, stub_graph());

        targets.add_and_make_glob(["test", "test/b.js", "missing-dir", ""]);
        assert_eq!(
            strs(targets.targets()),
            vec!["./test/**", "./test/b.js", "./missing-dir"]
        );
    }

    #[tokio::test]
    async fn test_add_dependencies_attributes_each_dependency() {
        let mut targets = watch_targets();
        targets.add_dependencies(["deps/two-deps.11ty.js"]).await.unwrap();

        assert_eq!(strs(targets.targets()), vec!["./deps/dep1.js", "./deps/dep2.js"]);
        assert!(targets.uses("./deps/two-deps.11ty.js", "./deps/dep1.js"));
        assert!(targets.uses("deps/two-deps.11ty.js", "deps/dep2.js"));
        assert!(!targets.uses("./deps/two-deps.11ty.js", "./deps/dep3.js"));
        assert!(!targets.uses("./deps/two-deps.11ty.js", "./deps/two-deps.11ty.js"));
        assert!(targets.is_dependency("./deps/dep1.js"));
        assert!(!targets.is_watched("./deps/two-deps.11ty.js"));
    }

    #[tokio::test]
    async fn test_batch_attributes_to_every_entry() {
        let mut targets = watch_targets();
        targets
            .add_dependencies(["config-deps.js", "deps/two-deps.11ty.js"])
            .await
            .unwrap();

        for dep in ["./config-deps-upstream.js", "./deps/dep1.js", "./deps/dep2.js"] {
            assert!(targets.uses("./config-deps.js", dep), "config-deps.js -> {dep}");
            assert!(targets.uses("./deps/two-deps.11ty.js", dep), "two-deps -> {dep}");
        }
        assert_eq!(
            strs(&targets.dependants_of("./deps/dep1.js")),
            vec!["./config-deps.js", "./deps/two-deps.11ty.js"]
        );
        assert_eq!(
            strs(&targets.dependencies_of("config-deps.js")),
            vec!["./config-deps-upstream.js", "./deps/dep1.js", "./deps/dep2.js"]
        );
    }

    #[tokio::test]
    async fn test_toggle_off_is_a_no_op() {
        let mut targets = watch_targets();
        targets.set_watch_dependencies(false);
        targets.add_dependencies(["deps/two-deps.11ty.js"]).await.unwrap();

        assert!(targets.targets().is_empty());
        assert!(!targets.uses("./deps/two-deps.11ty.js", "./deps/dep1.js"));
        assert!(!targets.uses("./deps/two-deps.11ty.js", "./deps/dep2.js"));
    }

    #[tokio::test]
    async fn test_filter_excludes_matching_dependencies() {
        let mut targets = watch_targets();
        targets
            .add_dependencies_filtered(["deps/two-deps.11ty.js"], |dep| {
                Ok(dep.as_str().ends_with("dep1.js"))
            })
            .await
            .unwrap();

        assert_eq!(strs(targets.targets()), vec!["./deps/dep2.js"]);
        assert!(!targets.uses("./deps/two-deps.11ty.js", "./deps/dep1.js"));
        assert!(targets.uses("./deps/two-deps.11ty.js", "./deps/dep2.js"));
    }

    #[tokio::test]
    async fn test_filter_excluding_everything() {
        let mut targets = watch_targets();
        targets
            .add_dependencies_filtered(["config-deps.js"], |_| Ok(true))
            .await
            .unwrap();

        assert!(targets.targets().is_empty());
        assert!(!targets.uses("./config-deps.js", "./config-deps-upstream.js"));
    }

    #[tokio::test]
    async fn test_filter_error_propagates_without_mutation() {
        let mut targets = watch_targets();
        let err = targets
            .add_dependencies_filtered(["deps/two-deps.11ty.js"], |dep| {
                if dep.as_str().ends_with("dep2.js") {
                    Err(anyhow!("boom"))
                } else {
                    Ok(false)
                }
            })
            .await
            .unwrap_err();

        match err {
            WatchError::Filter { path, message } => {
                assert_eq!(path, "./deps/dep2.js");
                assert!(message.contains("boom"));
            }
            other => panic!("expected WatchError::Filter, got {other:?}"),
        }
        assert!(targets.targets().is_empty());
        assert!(!targets.uses("./deps/two-deps.11ty.js", "./deps/dep1.js"));
    }

    #[tokio::test]
    async fn test_empty_and_missing_entries() {
        let mut targets = watch_targets();
        targets.add("");
        targets.add_dependencies([""]).await.unwrap();
        targets.add_dependencies(Vec::<String>::new()).await.unwrap();
        assert!(targets.targets().is_empty());

        targets.add("./.eleventy-notfound.js");
        targets.add_dependencies(["./.eleventy-notfound.js"]).await.unwrap();
        assert_eq!(strs(targets.targets()), vec!["./.eleventy-notfound.js"]);
    }

    #[tokio::test]
    async fn test_entry_also_added_directly() {
        let mut targets = watch_targets();
        targets.add("config-deps.js");
        targets.add_dependencies(["config-deps.js"]).await.unwrap();
        assert_eq!(
            strs(targets.targets()),
            vec!["./config-deps.js", "./config-deps-upstream.js"]
        );
        assert!(!targets.is_dependency("config-deps.js"));
    }

    #[test]
    fn test_checkpoint_delta() {
        let mut targets = watch_targets();
        targets.add("./.eleventy-notfound.js");
        assert_eq!(
            strs(targets.new_targets_since_last_reset()),
            vec!["./.eleventy-notfound.js"]
        );
        assert_eq!(
            strs(targets.new_targets_since_last_reset()),
            vec!["./.eleventy-notfound.js"]
        );

        targets.reset();
        targets.add("./.eleventy-notfound2.js");
        targets.add("./.eleventy-notfound.js");
        assert_eq!(
            strs(targets.new_targets_since_last_reset()),
            vec!["./.eleventy-notfound2.js"]
        );

        targets.reset();
        assert!(targets.new_targets_since_last_reset().is_empty());
        assert_eq!(targets.targets().len(), 2);
    }

    #[tokio::test]
    async fn test_dependencies_show_up_in_checkpoint_delta() {
        let mut targets = watch_targets();
        targets.add("config-deps.js");
        targets.reset();
        targets.add_dependencies(["config-deps.js"]).await.unwrap();
        assert_eq!(
            strs(targets.new_targets_since_last_reset()),
            vec!["./config-deps-upstream.js"]
        );
    }

    #[test]
    fn test_clear_dependency_cache_reaches_loader() {
        let loader = Arc::new(stub_graph());
        let resolver = DependencyResolver::new(ROOT, loader.clone());
        let targets = WatchTargets::with_collaborators(Arc::new(MockFileSystem::new()), Arc::new(resolver));
        targets.clear_dependency_cache();
        assert_eq!(loader.cleared.load(Ordering::SeqCst), 1);
    }
}
