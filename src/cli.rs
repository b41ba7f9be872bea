use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Compute the set of paths a watch-mode build has to observe.
///
/// Entry modules (config files, JavaScript templates) are followed through their
/// `require`/`import` graph so every first-party file they load is watched too.
#[derive(Parser, Debug)]
#[command(
    name = "watch-targets",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log verbosity (overrides WATCH_TARGETS_LOG).
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Output format for command results.
#[derive(Clone, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// One path per line (default).
    #[default]
    Compact,
    /// Structured JSON suitable for programmatic consumption.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the watch targets for a project.
    ///
    /// Paths are relative to the project root. Dependencies of `--entry` modules are
    /// filtered through the `exclude` patterns of watch-targets.toml.
    Targets {
        /// Path to the project root.
        path: PathBuf,

        /// A file to watch as-is (repeatable).
        #[arg(long = "file")]
        files: Vec<String>,

        /// A directory to watch recursively (repeatable). Non-directories are watched as-is.
        #[arg(long = "dir")]
        dirs: Vec<String>,

        /// An entry module whose dependencies are watched (repeatable).
        #[arg(long = "entry")]
        entries: Vec<String>,

        /// Do not follow entry module dependencies.
        #[arg(long)]
        no_deps: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Print the first-party modules the given entries require, directly or transitively.
    ///
    /// Modules matching the `exclude` patterns of watch-targets.toml are left out.
    Deps {
        /// Path to the project root.
        path: PathBuf,

        /// Entry modules, relative to the project root.
        #[arg(required = true)]
        entries: Vec<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Check whether SOURCE depends on DEPENDENCY. Exits with status 1 when it does not.
    ///
    /// Honours watch-targets.toml: an excluded dependency, or `watch_dependencies = false`,
    /// reads as "does not use".
    Uses {
        /// Path to the project root.
        path: PathBuf,

        /// The entry module.
        source: String,

        /// The candidate dependency.
        dependency: String,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}
