//! Configuration module for the Commandler runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the dispatcher, logging, the action cache and message catalogs.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CacheConfig, CommandlerConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
