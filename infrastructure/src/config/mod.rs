//! Configuration file loading for parley
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./parley.toml` or `./.parley.toml`
//! 3. Global: `$XDG_CONFIG_HOME/parley/config.toml`
//! 4. `PARLEY_*` environment variables
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileConfig, FileConnectionConfig, FileDirectoryConfig, FileLoggingConfig,
    FileRevealConfig, FileServerConfig, Severity,
};
pub use loader::ConfigLoader;
