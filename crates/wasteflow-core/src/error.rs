//! Construction errors.
//!
//! [`ConfigurationError`] is the only fatal condition in the simulation:
//! it is raised while loading or validating configuration or while building
//! a world. Once a world exists, advancing it never fails.

use wasteflow_agents::AgentError;
use wasteflow_world::WorldError;

/// Errors raised while loading configuration or constructing a world.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A parameter is out of range or the parameters cannot be satisfied
    /// together.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// The grid rejected a placement.
    #[error("world construction failed: {0}")]
    World(#[from] WorldError),

    /// A truck was configured with invalid parameters.
    #[error("truck construction failed: {0}")]
    Agent(#[from] AgentError),
}

impl From<serde_yml::Error> for ConfigurationError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl ConfigurationError {
    /// Shorthand for [`ConfigurationError::Invalid`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}
