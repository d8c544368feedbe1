//! Error types for clickaway

use thiserror::Error;

pub use clickaway_core::{SelectorError, TreeError};

/// Failure to load an [`OutsideConfig`](crate::config::OutsideConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML source did not parse or had the wrong shape
    #[error("invalid outside-click config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors surfaced by clickaway APIs
///
/// Registration itself never fails; these come from the fallible edges
/// (config loading, explicit selector parsing, tree mutation in hosts).
#[derive(Error, Debug)]
pub enum ClickawayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result type for clickaway operations
pub type Result<T> = std::result::Result<T, ClickawayError>;
