//! Error types for the I/O-facing layers.
//!
//! Graph construction itself never fails; scanning, configuration loading and
//! export do.

use thiserror::Error;

/// Result type for flowdocs operations
pub type Result<T> = std::result::Result<T, FlowError>;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),
}
