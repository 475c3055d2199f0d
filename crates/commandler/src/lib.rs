//! # Commandler
//!
//! Turns free-form text from chat-like transports into strongly typed
//! command invocations, or into a precise diagnostic of what went wrong.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────────────┐   ┌─────────────────┐   ┌──────────────┐
//! │ Integration │──▶│ DispatcherManager │──▶│ ParameterBinder │──▶│ tower layers │──▶ Handler
//! │  (console)  │   │ (alias / pattern) │   │ (type adapters) │   │ disable/cache│
//! └─────────────┘   └───────────────────┘   └─────────────────┘   └──────────────┘
//!        ▲                    │                      │
//!        └──── reply ◀── MisuseRouter ◀──────────────┘
//! ```
//!
//! - **core**: registry metadata, tokenizer, dispatchers, adapters, binder
//! - **framework**: handlers, headers, middleware, misuse rendering, help
//! - **runtime**: configuration, logging, integrations, the `Commandler` runtime
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use commandler::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let commandler = Commandler::builder()
//!         .controller(
//!             Controller::builder("math").alias("math").command(
//!                 Command::builder("add")
//!                     .alias("add")
//!                     .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
//!                     .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
//!             ),
//!             handler_fn(|inv: Invocation| async move {
//!                 let a: i32 = inv.arg(0).unwrap_or_default();
//!                 let b: i32 = inv.arg(1).unwrap_or_default();
//!                 (a + b).to_string()
//!             }),
//!         )
//!         .build()?;
//!
//!     // `$math add 1 2` replies `3`
//!     commandler.run(ConsoleIntegration::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `commandler.toml` (default)
//! - `yaml-config`: load `commandler.yaml`
//! - `json-log`: JSON log output

pub use commandler_core as core;
pub use commandler_framework as framework;
pub use commandler_runtime as runtime;

pub use commandler_runtime::{Commandler, CommandlerBuilder, ConsoleIntegration, Integration};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use commandler::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use commandler_runtime::{
        CancellationToken, Commandler, CommandlerBuilder, CommandlerConfig, ConsoleIntegration,
        Integration, RuntimeError,
    };

    // Handlers, registry metadata and values
    pub use commandler_framework::prelude::*;
    pub use commandler_framework::{IntoReply, StaticHeader};
}
