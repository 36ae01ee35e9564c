//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the land-spill plug-ins.
///
/// Configuration problems abort a run before its first sub-step; I/O
/// errors come from writing ledger files.
#[derive(Debug, Error)]
pub enum LandspillError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Ledger output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
