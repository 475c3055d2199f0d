//! # Commandler Core
//!
//! The resolution engine of the Commandler command framework.
//!
//! This crate turns free-form chat text into a typed invocation of a
//! registered command, or into a structured [`Misuse`] describing what the
//! user got wrong.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Plain data the pipeline operates on:
//! - **Registry**: controllers, commands and parameters ([`Registry`], [`Controller`], [`Command`])
//! - **Requests**: inbound messages and resolved actions ([`Request`], [`Action`], [`ActionEvent`])
//! - **Values**: typed parameter values ([`Value`], [`TypeKey`])
//! - **Errors**: misuse taxonomy and configuration errors ([`Misuse`], [`ConfigError`])
//!
//! ### Framework Layer
//!
//! The resolution pipeline:
//! - **Tokenizer**: splits parameter text into groups ([`tokenize`])
//! - **Dispatchers**: resolve controllers and commands ([`DispatcherManager`], [`StandardDispatcher`])
//! - **Adapters**: convert raw items into values ([`AdapterRegistry`])
//! - **Binder**: produces typed [`Args`] ([`ParameterBinder`])
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────┐     ┌────────────┐     ┌─────────────┐     ┌────────┐
//! │ Request │────▶│ Dispatcher │────▶│ ActionEvent │────▶│ Binder │────▶ Args
//! └─────────┘     └────────────┘     └─────────────┘     └────────┘
//!                       │                                     │
//!                       └──────────────▶ Misuse ◀──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use commandler_core::prelude::*;
//!
//! let registry = Arc::new(
//!     Registry::builder()
//!         .controller(
//!             Controller::builder("math").alias("math").command(
//!                 Command::builder("add")
//!                     .alias("add")
//!                     .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
//!                     .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
//!             ),
//!         )
//!         .build()?,
//! );
//!
//! let patterns = PatternCache::new();
//! let dispatcher = StandardDispatcher::new(registry, &StandardDispatcherConfig::default(), &patterns)?;
//! let binder = ParameterBinder::new(Arc::new(AdapterRegistry::with_defaults()));
//!
//! let request = Arc::new(Request::new("console", "1", "$math add 1 2"));
//! if let Some(event) = dispatcher.parse(&request)? {
//!     let args = binder.bind(&event)?;
//!     assert_eq!(args.get::<i32>(0), Some(1));
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;

// Re-export foundation types
pub use foundation::{
    ALIASES, Action, ActionEvent, ActionId, Command, CommandBuilder, ConfigError, ConfigResult,
    Controller, ControllerBuilder, DispatchError, DispatchResult, ExpressionError, FromValue,
    IdentityResolver, MapResolver, MessageResolver, Misuse, MisuseKind, PATTERN, ParamType,
    Parameter, Properties, Property, PropertyMap, Registry, RegistryBuilder, Request, Slot, Source,
    TimeUnit, TypeKey, Value, alias_eq,
};

// Re-export framework types
pub use framework::{
    ActionCache, AdaptContext, Adapter, AdapterRegistry, Args, BoundArg, Dispatcher,
    DispatcherManager, EnumAdapter, EnumVariant, MatchDispatcher, MemoryActionCache,
    ParameterBinder, PatternCache, StandardDispatcher, StandardDispatcherConfig, tokenize,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{
        ActionCache, AdaptContext, Adapter, AdapterRegistry, Args, BoundArg, Dispatcher,
        DispatcherManager, EnumAdapter, EnumVariant, MatchDispatcher, MemoryActionCache,
        ParameterBinder, PatternCache, StandardDispatcher, StandardDispatcherConfig,
    };
}
