//! Watch-target tracking for incremental rebuilds.
//!
//! [`WatchTargets`] owns the ordered, deduplicated set of paths a watch session observes.
//! Entry modules handed to [`WatchTargets::add_dependencies`] are followed through their
//! `require`/`import` graph ([`DependencyResolver`]) and every first-party module found is
//! watched and attributed to the entry that pulled it in.

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod target_path;
pub mod targets;

pub use config::WatchConfig;
pub use error::{Result, WatchError};
pub use resolver::{DependencyResolver, ModuleLoader, SourceModuleLoader};
pub use target_path::TargetPath;
pub use targets::WatchTargets;
