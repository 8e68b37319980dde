//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run so that
//! `main` can propagate with `?`.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", path.display())]
    ConfigNotFound {
        /// The path given on the command line.
        path: PathBuf,
    },

    /// Configuration loading, validation, or world construction failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: wasteflow_core::ConfigurationError,
    },

    /// The final report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
