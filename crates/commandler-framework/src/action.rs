//! End-to-end request processing.
//!
//! [`ActionHandler`] owns the whole pipeline for one registry:
//!
//! ```text
//! Request ─▶ HeaderManager ─▶ DispatcherManager ─▶ ParameterBinder ─▶ InvokeService ─▶ reply
//!                                    │                    │                 │
//!                                    └──────── Misuse ────┴─────────────────┴─▶ MisuseRouter
//! ```

use std::fmt;
use std::sync::Arc;

use commandler_core::{ActionCache, DispatchError, DispatcherManager, ParameterBinder, Request};
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Layer, Service, ServiceExt};
use tracing::{Instrument, Level, debug, error, span};

use crate::error::{ActionError, ActionResult};
use crate::handler::{ControllerFactory, Invocation};
use crate::header::{HeaderBinder, HeaderManager};
use crate::middleware::{DisabledControllers, InvokeService, pipeline};
use crate::misuse::MisuseRouter;

/// Processes requests against one registry.
#[derive(Clone)]
pub struct ActionHandler {
    headers: HeaderManager,
    dispatchers: DispatcherManager,
    binder: ParameterBinder,
    service: InvokeService,
    misuse: MisuseRouter,
}

impl ActionHandler {
    pub fn builder(
        dispatchers: DispatcherManager,
        binder: ParameterBinder,
        factory: Arc<dyn ControllerFactory>,
    ) -> ActionHandlerBuilder {
        ActionHandlerBuilder::new(dispatchers, binder, factory)
    }

    /// Resolves, binds and invokes `request`.
    ///
    /// Returns `Ok(None)` when no dispatcher recognized the request or the
    /// handler produced no reply.
    pub async fn process(&self, mut request: Request) -> ActionResult<Option<String>> {
        self.headers.apply(&mut request)?;
        let request = Arc::new(request);

        let span = span!(
            Level::DEBUG,
            "action",
            integration = request.integration(),
            action_id = %request.id()
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: Arc<Request>) -> ActionResult<Option<String>> {
        let Some(event) = self.dispatchers.dispatch(&request)? else {
            return Ok(None);
        };
        let args = self.binder.bind(&event)?;

        let controller = event.controller().type_id().to_string();
        let command = event.command().name().to_string();
        let reply = self
            .service
            .clone()
            .oneshot(Invocation::new(event, args))
            .await
            .map_err(|err| ActionError::from_service(err, &controller, &command))?;

        debug!(%controller, %command, replied = reply.is_some(), "Action completed");
        Ok(reply)
    }

    /// Processes `request` and turns failures into replies.
    ///
    /// Misuse is rendered through the [`MisuseRouter`]; configuration and
    /// handler errors are logged and produce no reply.
    pub async fn on_action(&self, request: Request) -> Option<String> {
        match self.process(request).await {
            Ok(reply) => reply,
            Err(ActionError::Dispatch(DispatchError::Misuse(misuse))) => self.misuse.route(&misuse),
            Err(err) => {
                error!(error = %err, "Failed to process action");
                None
            }
        }
    }

    pub fn misuse_router(&self) -> &MisuseRouter {
        &self.misuse
    }
}

impl fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandler")
            .field("headers", &self.headers)
            .field("dispatchers", &self.dispatchers)
            .field("binder", &self.binder)
            .field("misuse", &self.misuse)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionHandler`].
pub struct ActionHandlerBuilder {
    headers: HeaderManager,
    dispatchers: DispatcherManager,
    binder: ParameterBinder,
    factory: Arc<dyn ControllerFactory>,
    disabled: DisabledControllers,
    cache: Option<Arc<dyn ActionCache>>,
    layers: Vec<Box<dyn FnOnce(InvokeService) -> InvokeService + Send>>,
    misuse: MisuseRouter,
}

impl ActionHandlerBuilder {
    pub fn new(
        dispatchers: DispatcherManager,
        binder: ParameterBinder,
        factory: Arc<dyn ControllerFactory>,
    ) -> Self {
        Self {
            headers: HeaderManager::new(),
            dispatchers,
            binder,
            factory,
            disabled: DisabledControllers::new(),
            cache: None,
            layers: Vec::new(),
            misuse: MisuseRouter::default(),
        }
    }

    pub fn header(mut self, binder: impl HeaderBinder) -> Self {
        self.headers.add(binder);
        self
    }

    pub fn headers(mut self, headers: HeaderManager) -> Self {
        self.headers = headers;
        self
    }

    /// Shares a set of disabled controllers with the pipeline.
    pub fn disabled(mut self, disabled: DisabledControllers) -> Self {
        self.disabled = disabled;
        self
    }

    /// Stores every invoked action in `cache`.
    pub fn cache(mut self, cache: Arc<dyn ActionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Wraps the invocation pipeline in a custom tower layer.
    ///
    /// Layers added later run first.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<InvokeService> + Send + 'static,
        L::Service: Service<Invocation, Response = Option<String>, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Invocation>>::Future: Send + 'static,
    {
        self.layers
            .push(Box::new(move |inner: InvokeService| BoxCloneSyncService::new(layer.layer(inner))));
        self
    }

    pub fn misuse(mut self, misuse: MisuseRouter) -> Self {
        self.misuse = misuse;
        self
    }

    pub fn build(self) -> ActionHandler {
        let service = self
            .layers
            .into_iter()
            .fold(pipeline(self.factory, self.disabled, self.cache), |service, layer| {
                layer(service)
            });

        ActionHandler {
            headers: self.headers,
            dispatchers: self.dispatchers,
            binder: self.binder,
            service,
            misuse: self.misuse,
        }
    }
}
