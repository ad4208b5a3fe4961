//! Error types for the growth engine.
//!
//! Stepping a tree never fails: degenerate directions, capped spawns and empty
//! attraction sets all degrade to "no growth". Errors only arise while loading
//! or validating configuration, and from the bounded fast-forward helper.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with a [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has mistyped keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A parameter is outside the range the growth rules accept.
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Failures of the tree driver helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// [`crate::tree::Tree::grow_to_completion`] ran out of steps.
    #[error("tree not fully grown after {steps} steps")]
    StepLimit { steps: usize },
}
