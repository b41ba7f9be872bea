use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, WatchError};
use crate::target_path::TargetPath;

/// File name looked up at the project root.
pub const CONFIG_FILE: &str = "watch-targets.toml";

/// Configuration loaded from `watch-targets.toml` at the project root.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Follow module dependencies of entry files. `--no-deps` overrides this.
    pub watch_dependencies: bool,
    /// Glob patterns for dependencies that should never be watched (e.g. `"generated/**"`).
    /// Matched against the dependency path with and without its leading `./`.
    pub exclude: Option<Vec<String>>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watch_dependencies: true,
            exclude: None,
        }
    }
}

impl WatchConfig {
    /// Load configuration from `watch-targets.toml` in the given root directory.
    ///
    /// Returns the default configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                warn!("failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Compile the `exclude` patterns into a matcher.
    pub fn exclude_matcher(&self) -> Result<ExcludeMatcher> {
        let patterns = self
            .exclude
            .iter()
            .flatten()
            .map(|raw| {
                glob::Pattern::new(raw.trim_start_matches("./")).map_err(|source| {
                    WatchError::Pattern {
                        pattern: raw.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ExcludeMatcher { patterns })
    }
}

/// Compiled `exclude` globs.
#[derive(Debug, Default)]
pub struct ExcludeMatcher {
    patterns: Vec<glob::Pattern>,
}

impl ExcludeMatcher {
    pub fn matches(&self, target: &TargetPath) -> bool {
        let bare = target.as_str().trim_start_matches("./");
        self.patterns.iter().any(|p| p.matches(bare))
    }
}
