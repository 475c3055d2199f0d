//! The invocation pipeline.
//!
//! Bound invocations pass through a stack of tower [`Layer`]s before reaching
//! the [`ControllerService`], which looks up and runs the controller's
//! [`Handler`](crate::handler::Handler). Layers run after binding, so they see
//! the resolved controller, command and typed arguments.
//!
//! ```text
//! Invocation ──▶ DisableLayer ──▶ CacheLayer ──▶ (custom layers) ──▶ ControllerService
//! ```
//!
//! Middleware reports user-facing failures by returning a boxed [`Misuse`];
//! [`ActionError::from_service`] turns it back into a typed error.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use commandler_core::{ActionCache, Misuse};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use parking_lot::RwLock;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Layer, Service, ServiceBuilder};
use tracing::{debug, trace};

use crate::error::ActionError;
use crate::handler::{ControllerFactory, Invocation};

/// The type-erased invocation pipeline.
pub type InvokeService = BoxCloneSyncService<Invocation, Option<String>, BoxError>;

// ============================================================================
// ControllerService
// ============================================================================

/// Innermost service: runs the handler of the invoked controller.
#[derive(Clone)]
pub struct ControllerService {
    factory: Arc<dyn ControllerFactory>,
}

impl ControllerService {
    pub fn new(factory: Arc<dyn ControllerFactory>) -> Self {
        Self { factory }
    }
}

impl Service<Invocation> for ControllerService {
    type Response = Option<String>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Option<String>, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, invocation: Invocation) -> Self::Future {
        let handler = self.factory.get(invocation.controller());
        async move {
            let Some(handler) = handler else {
                let type_id = invocation.controller().type_id().to_string();
                return Err(Box::new(ActionError::ControllerNotFound { type_id }) as BoxError);
            };
            debug!(
                controller = invocation.controller().name(),
                command = invocation.command().name(),
                "Invoking command"
            );
            handler.invoke(invocation).await
        }
        .boxed()
    }
}

impl fmt::Debug for ControllerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerService").finish_non_exhaustive()
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Stores every action that reaches it in an [`ActionCache`].
#[derive(Clone)]
pub struct CacheLayer {
    cache: Arc<dyn ActionCache>,
}

impl CacheLayer {
    pub fn new(cache: Arc<dyn ActionCache>) -> Self {
        Self { cache }
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = CacheService<S>;

    fn layer(&self, inner: S) -> CacheService<S> {
        CacheService {
            cache: Arc::clone(&self.cache),
            inner,
        }
    }
}

/// The [`Service`] produced by [`CacheLayer`].
#[derive(Clone)]
pub struct CacheService<S> {
    cache: Arc<dyn ActionCache>,
    inner: S,
}

impl<S> Service<Invocation> for CacheService<S>
where
    S: Service<Invocation, Response = Option<String>, Error = BoxError>,
{
    type Response = Option<String>;
    type Error = BoxError;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, invocation: Invocation) -> Self::Future {
        let action = invocation.event().action().clone();
        trace!(action_id = %action.id(), "Caching action");
        self.cache.put(action);
        self.inner.call(invocation)
    }
}

// ============================================================================
// Disable
// ============================================================================

/// Shared set of disabled controller type ids.
///
/// Clones share state, so a handle kept by the application can toggle
/// controllers while requests are being served.
#[derive(Debug, Clone, Default)]
pub struct DisabledControllers {
    type_ids: Arc<RwLock<HashSet<String>>>,
}

impl DisabledControllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the controller was enabled before.
    pub fn disable(&self, type_id: impl Into<String>) -> bool {
        self.type_ids.write().insert(type_id.into())
    }

    /// Returns `true` if the controller was disabled before.
    pub fn enable(&self, type_id: &str) -> bool {
        self.type_ids.write().remove(type_id)
    }

    pub fn is_disabled(&self, type_id: &str) -> bool {
        self.type_ids.read().contains(type_id)
    }
}

impl<S: Into<String>> FromIterator<S> for DisabledControllers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            type_ids: Arc::new(RwLock::new(iter.into_iter().map(Into::into).collect())),
        }
    }
}

/// Rejects invocations of disabled controllers with [`Misuse::ModuleDisabled`].
#[derive(Debug, Clone)]
pub struct DisableLayer {
    disabled: DisabledControllers,
}

impl DisableLayer {
    pub fn new(disabled: DisabledControllers) -> Self {
        Self { disabled }
    }
}

impl<S> Layer<S> for DisableLayer {
    type Service = DisableService<S>;

    fn layer(&self, inner: S) -> DisableService<S> {
        DisableService {
            disabled: self.disabled.clone(),
            inner,
        }
    }
}

/// The [`Service`] produced by [`DisableLayer`].
#[derive(Debug, Clone)]
pub struct DisableService<S> {
    disabled: DisabledControllers,
    inner: S,
}

impl<S> Service<Invocation> for DisableService<S>
where
    S: Service<Invocation, Response = Option<String>, Error = BoxError>,
    S::Future: Send + 'static,
{
    type Response = Option<String>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Option<String>, BoxError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, invocation: Invocation) -> Self::Future {
        if self.disabled.is_disabled(invocation.controller().type_id()) {
            debug!(controller = invocation.controller().name(), "Controller is disabled");
            let misuse = Misuse::ModuleDisabled {
                event: Arc::clone(invocation.event()),
            };
            return future::ready(Err(Box::new(misuse) as BoxError)).boxed();
        }
        self.inner.call(invocation).boxed()
    }
}

/// Assembles the default pipeline around `factory`.
pub fn pipeline(
    factory: Arc<dyn ControllerFactory>,
    disabled: DisabledControllers,
    cache: Option<Arc<dyn ActionCache>>,
) -> InvokeService {
    let service = ServiceBuilder::new()
        .layer(DisableLayer::new(disabled))
        .option_layer(cache.map(CacheLayer::new))
        .service(ControllerService::new(factory));
    BoxCloneSyncService::new(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::tests::{invocation, math};
    use crate::handler::{HandlerMap, handler_fn};
    use commandler_core::{MemoryActionCache, MisuseKind, Value};
    use tower::ServiceExt;

    fn factory() -> Arc<dyn ControllerFactory> {
        Arc::new(HandlerMap::new().with(
            "math",
            handler_fn(|inv: Invocation| async move { format!("ran {}", inv.command().name()) }),
        ))
    }

    fn add() -> Invocation {
        invocation(math(), "add", vec![Value::I32(1), Value::I32(2)])
    }

    #[tokio::test]
    async fn test_pipeline_invokes_handler() {
        let service = pipeline(factory(), DisabledControllers::new(), None);
        let reply = service.oneshot(add()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("ran add"));
    }

    #[tokio::test]
    async fn test_disabled_controller_is_misuse() {
        let disabled = DisabledControllers::new();
        let service = pipeline(factory(), disabled.clone(), None);

        assert!(disabled.disable("math"));
        let err = service.clone().oneshot(add()).await.unwrap_err();
        let err = ActionError::from_service(err, "math", "add");
        assert_eq!(err.as_misuse().map(Misuse::kind), Some(MisuseKind::ModuleDisabled));

        assert!(disabled.enable("math"));
        assert!(service.oneshot(add()).await.is_ok());
    }

    #[tokio::test]
    async fn test_cache_layer_stores_action() {
        let cache = MemoryActionCache::new();
        let service = pipeline(
            factory(),
            DisabledControllers::new(),
            Some(Arc::new(cache.clone())),
        );
        service.oneshot(add()).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&"1".into()).is_some());
    }

    #[tokio::test]
    async fn test_missing_handler() {
        let service = pipeline(Arc::new(HandlerMap::new()), DisabledControllers::new(), None);
        let err = service.oneshot(add()).await.unwrap_err();
        let err = ActionError::from_service(err, "math", "add");
        assert!(matches!(err, ActionError::ControllerNotFound { type_id } if type_id == "math"));
    }

    #[test]
    fn test_disabled_from_iter() {
        let disabled: DisabledControllers = ["a", "b"].into_iter().collect();
        assert!(disabled.is_disabled("a"));
        assert!(!disabled.is_disabled("c"));
    }
}
