//! Controller implementations.
//!
//! Registry metadata only describes commands. The code behind a controller is
//! a [`Handler`], looked up through a [`ControllerFactory`] when an action
//! is invoked.
//!
//! # Example
//!
//! ```rust,ignore
//! use commandler_framework::prelude::*;
//!
//! let math = CommandRouter::new()
//!     .on("add", handler_fn(|inv: Invocation| async move {
//!         let a: i32 = inv.arg(0).unwrap_or_default();
//!         let b: i32 = inv.arg(1).unwrap_or_default();
//!         (a + b).to_string()
//!     }));
//!
//! let handlers = HandlerMap::new().with("math", math);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use commandler_core::{
    ActionEvent, Args, Command, ConfigError, Controller, FromValue, Registry, Request,
};
use tower::BoxError;

// ============================================================================
// Invocation
// ============================================================================

/// A resolved action together with its bound arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    event: Arc<ActionEvent>,
    args: Args,
}

impl Invocation {
    pub fn new(event: Arc<ActionEvent>, args: Args) -> Self {
        Self { event, args }
    }

    pub fn event(&self) -> &Arc<ActionEvent> {
        &self.event
    }

    pub fn request(&self) -> &Arc<Request> {
        self.event.request()
    }

    pub fn controller(&self) -> &Arc<Controller> {
        self.event.controller()
    }

    pub fn command(&self) -> &Arc<Command> {
        self.event.command()
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Shorthand for [`Args::get`].
    pub fn arg<T: FromValue>(&self, position: usize) -> Option<T> {
        self.args.get(position)
    }
}

// ============================================================================
// IntoReply
// ============================================================================

/// Types a handler may return.
pub trait IntoReply: Send + 'static {
    fn into_reply(self) -> Result<Option<String>, BoxError>;
}

/// No reply.
impl IntoReply for () {
    fn into_reply(self) -> Result<Option<String>, BoxError> {
        Ok(None)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Option<String>, BoxError> {
        Ok(Some(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Option<String>, BoxError> {
        Ok(Some(self.to_string()))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Option<String>, BoxError> {
        match self {
            Some(t) => t.into_reply(),
            None => Ok(None),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError> + Send + 'static,
{
    fn into_reply(self) -> Result<Option<String>, BoxError> {
        self.map_err(Into::into)?.into_reply()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// The implementation behind a controller.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Runs the invoked command and returns the reply, if any.
    async fn invoke(&self, invocation: Invocation) -> Result<Option<String>, BoxError>;
}

/// A [`Handler`] backed by an async closure. Created by [`handler_fn`].
pub struct FnHandler<F, Fut, R> {
    f: F,
    _marker: PhantomData<fn() -> (Fut, R)>,
}

/// Wraps an async closure as a [`Handler`].
pub fn handler_fn<F, Fut, R>(f: F) -> FnHandler<F, Fut, R>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, R> Handler for FnHandler<F, Fut, R>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    async fn invoke(&self, invocation: Invocation) -> Result<Option<String>, BoxError> {
        (self.f)(invocation).await.into_reply()
    }
}

/// Routes invocations to per-command handlers by command name.
#[derive(Default, Clone)]
pub struct CommandRouter {
    commands: HashMap<String, Arc<dyn Handler>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for the command named `command`.
    pub fn on(mut self, command: impl Into<String>, handler: impl Handler) -> Self {
        self.commands.insert(command.into(), Arc::new(handler));
        self
    }
}

#[async_trait]
impl Handler for CommandRouter {
    async fn invoke(&self, invocation: Invocation) -> Result<Option<String>, BoxError> {
        let name = invocation.command().name();
        let Some(handler) = self.commands.get(name) else {
            return Err(format!("no route for command '{name}'").into());
        };
        handler.invoke(invocation).await
    }
}

impl fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.commands.keys()).finish()
    }
}

// ============================================================================
// ControllerFactory
// ============================================================================

/// Supplies the handler for a controller.
pub trait ControllerFactory: Send + Sync + 'static {
    fn get(&self, controller: &Controller) -> Option<Arc<dyn Handler>>;
}

/// A [`ControllerFactory`] holding one handler per controller type id.
#[derive(Default, Clone)]
pub struct HandlerMap {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_id: impl Into<String>, handler: impl Handler) {
        self.handlers.insert(type_id.into(), Arc::new(handler));
    }

    /// Registers a handler (builder pattern).
    pub fn with(mut self, type_id: impl Into<String>, handler: impl Handler) -> Self {
        self.insert(type_id, handler);
        self
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.handlers.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Checks that every controller in `registry` has a handler.
    pub fn verify(&self, registry: &Registry) -> Result<(), ConfigError> {
        match registry
            .controllers()
            .iter()
            .find(|c| !self.contains(c.type_id()))
        {
            Some(controller) => Err(ConfigError::invalid(format!(
                "controller '{}' has no handler",
                controller.type_id()
            ))),
            None => Ok(()),
        }
    }
}

impl ControllerFactory for HandlerMap {
    fn get(&self, controller: &Controller) -> Option<Arc<dyn Handler>> {
        self.handlers.get(controller.type_id()).cloned()
    }
}

impl fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use commandler_core::{Action, ParamType, Parameter, TypeKey, Value};
    use commandler_core::framework::BoundArg;

    pub(crate) fn invocation(controller: Controller, command: &str, args: Vec<Value>) -> Invocation {
        let controller = Arc::new(controller);
        let command = Arc::clone(controller.command(command).unwrap());
        let action = Action::new("1".into(), "", controller.type_id(), command.name(), Vec::new());
        let event = Arc::new(ActionEvent::new(
            Arc::new(Request::new("test", "1", "")),
            action,
            controller,
            command,
        ));
        Invocation::new(event, Args::new(args.into_iter().map(BoundArg::Value).collect()))
    }

    pub(crate) fn math() -> Controller {
        Controller::builder("math")
            .alias("math")
            .command(
                Command::builder("add")
                    .alias("add")
                    .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
                    .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
            )
            .command(Command::builder("nothing").alias("nothing"))
            .build()
    }

    fn add() -> impl Handler {
        handler_fn(|inv: Invocation| async move {
            let a: i32 = inv.arg(0).ok_or("missing a")?;
            let b: i32 = inv.arg(1).ok_or("missing b")?;
            Ok::<_, BoxError>((a + b).to_string())
        })
    }

    #[tokio::test]
    async fn test_fn_handler_reply() {
        let reply = add()
            .invoke(invocation(math(), "add", vec![Value::I32(2), Value::I32(3)]))
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_fn_handler_error() {
        let err = add()
            .invoke(invocation(math(), "add", vec![Value::I32(2)]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing b");
    }

    #[tokio::test]
    async fn test_router_by_command_name() {
        let router = CommandRouter::new()
            .on("add", add())
            .on("nothing", handler_fn(|_: Invocation| async {}));

        let reply = router
            .invoke(invocation(math(), "nothing", Vec::new()))
            .await
            .unwrap();
        assert!(reply.is_none());

        let reply = router
            .invoke(invocation(math(), "add", vec![Value::I32(1), Value::I32(1)]))
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_router_unknown_command() {
        let router = CommandRouter::new().on("add", add());
        assert!(router.invoke(invocation(math(), "nothing", Vec::new())).await.is_err());
    }

    #[test]
    fn test_handler_map_verify() {
        let registry = Registry::builder()
            .controller(Controller::builder("math").alias("math").command(Command::builder("x")))
            .build()
            .unwrap();

        let handlers = HandlerMap::new();
        assert!(handlers.verify(&registry).is_err());

        let handlers = handlers.with("math", add());
        assert!(handlers.verify(&registry).is_ok());
        assert!(handlers.get(&registry.controllers()[0]).is_some());
    }
}
