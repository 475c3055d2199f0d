//! Commandler Runtime - configuration, logging and integrations.
//!
//! This crate provides:
//! - Layered configuration loading with figment (`CommandlerConfig`, `ConfigLoader`)
//! - Logging configuration (`LoggingBuilder`)
//! - The `Integration` trait and the stdin/stdout `ConsoleIntegration`
//! - The `Commandler` runtime that wires registry, dispatchers, binder and
//!   handlers together
//!
//! ```rust,ignore
//! use commandler_runtime::{Commandler, ConsoleIntegration};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let commandler = Commandler::builder()
//!         .controller(math_controller(), math_handler())
//!         .build()?;
//!
//!     // Run until stdin closes or Ctrl+C
//!     commandler.run(ConsoleIntegration::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! `commandler.toml` in the working directory (or `config.toml`, or the
//! user config directory) is merged over the defaults, then `COMMANDLER_*`
//! environment variables are applied:
//!
//! ```toml
//! [standard_dispatcher]
//! prefixes = ["!"]
//!
//! [logging]
//! level = "debug"
//! ```

pub mod config;
pub mod error;
pub mod integration;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{CommandlerConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use integration::{ConsoleIntegration, Integration};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Commandler, CommandlerBuilder};

// Re-export for integrations implemented in other crates
pub use tokio_util::sync::CancellationToken;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Runtime types plus the commonly used logging macros.
pub mod prelude {
    pub use super::{CancellationToken, Commandler, ConsoleIntegration, Integration};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
