//! Runtime error types.

use commandler_framework::BoxError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building or running a [`Commandler`](crate::Commandler).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The registry, adapters, handlers or dispatchers are inconsistent.
    #[error("Invalid command setup: {0}")]
    Setup(#[from] commandler_core::ConfigError),

    /// An integration stopped with an error.
    #[error("Integration '{name}' failed: {source}")]
    Integration {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl RuntimeError {
    pub fn integration(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Integration {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
