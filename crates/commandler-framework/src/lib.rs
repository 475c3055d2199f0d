//! # Commandler Framework
//!
//! Action handling on top of the Commandler core.
//!
//! This layer provides:
//! - Handlers backing registry controllers, looked up via a [`ControllerFactory`]
//! - Header binders that attach transport metadata to requests
//! - A tower-based invocation pipeline with cache and disable middleware
//! - Misuse routing and the default English diagnostics
//! - The built-in `help` controller
//! - [`ActionHandler`], which ties everything together
//!
//! The core crate resolves and binds; this crate decides what happens next.

pub mod action;
pub mod error;
pub mod handler;
pub mod header;
pub mod help;
pub mod middleware;
pub mod misuse;

pub use action::{ActionHandler, ActionHandlerBuilder};
pub use error::{ActionError, ActionResult};
pub use handler::{
    CommandRouter, ControllerFactory, FnHandler, Handler, HandlerMap, IntoReply, Invocation,
    handler_fn,
};
pub use header::{HeaderBinder, HeaderManager, StaticHeader};
pub use help::{ControllerAdapter, HELP, HelpHandler, help_controller};
pub use middleware::{
    CacheLayer, ControllerService, DisableLayer, DisabledControllers, InvokeService, pipeline,
};
pub use misuse::{DefaultMisuseHandler, MisuseHandler, MisuseRouter};

pub use tower::BoxError;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        ActionError, ActionHandler, BoxError, CommandRouter, ControllerAdapter, ControllerFactory,
        DisabledControllers, Handler, HandlerMap, HelpHandler, Invocation, MisuseRouter,
        help_controller, handler_fn,
    };
    pub use commandler_core::prelude::*;
}
