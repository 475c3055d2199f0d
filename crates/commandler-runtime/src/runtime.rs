//! The Commandler runtime.
//!
//! [`Commandler`] owns a validated configuration, the immutable registry and
//! the [`ActionHandler`] assembled from it, and drives an [`Integration`]
//! until it ends or a shutdown signal arrives.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use commandler_runtime::{Commandler, ConsoleIntegration};
//!
//! let commandler = Commandler::builder()
//!     .config_file("commandler.toml")
//!     .controller(
//!         Controller::builder("ping").alias("ping").command(Command::builder("pong").default_command()),
//!         handler_fn(|_: Invocation| async { "pong" }),
//!     )
//!     .build()?;
//!
//! commandler.run(ConsoleIntegration::new()).await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use commandler_core::{
    ActionCache, Adapter, AdapterRegistry, ControllerBuilder, DispatcherManager, MapResolver,
    MatchDispatcher, MemoryActionCache, MessageResolver, MisuseKind, ParameterBinder,
    PatternCache, Registry, RegistryBuilder, Request, StandardDispatcher, TypeKey,
};
use commandler_framework::{
    ActionHandler, ActionHandlerBuilder, BoxError, ControllerAdapter, DefaultMisuseHandler,
    DisabledControllers, HELP, Handler, HandlerMap, HeaderBinder, HeaderManager, HelpHandler,
    InvokeService, Invocation, MisuseHandler, MisuseRouter, help_controller,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

use crate::config::{CommandlerConfig, ConfigLoader, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::integration::Integration;
use crate::logging;

/// A fully wired command processor.
pub struct Commandler {
    config: CommandlerConfig,
    registry: Arc<Registry>,
    handler: ActionHandler,
    disabled: DisabledControllers,
    cache: Option<MemoryActionCache>,
}

impl Commandler {
    pub fn builder() -> CommandlerBuilder {
        CommandlerBuilder::new()
    }

    pub fn config(&self) -> &CommandlerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn handler(&self) -> &ActionHandler {
        &self.handler
    }

    /// Handle to the disabled controllers; changes apply to new requests.
    pub fn disabled(&self) -> &DisabledControllers {
        &self.disabled
    }

    /// The action cache, if `cache.enabled` is set.
    pub fn cache(&self) -> Option<&MemoryActionCache> {
        self.cache.as_ref()
    }

    /// Processes one request outside of any integration.
    pub async fn on_action(&self, request: Request) -> Option<String> {
        self.handler.on_action(request).await
    }

    /// Runs `integration` until it ends or Ctrl+C / SIGTERM is received.
    pub async fn run<I: Integration>(&self, integration: I) -> RuntimeResult<()> {
        info!(
            integration = integration.name(),
            "Commandler is now running. Press Ctrl+C to stop."
        );
        self.run_until(integration, wait_for_shutdown()).await
    }

    /// Runs `integration` until it ends or `shutdown` completes.
    ///
    /// On shutdown the integration is cancelled and awaited.
    pub async fn run_until<I, F>(&self, integration: I, shutdown: F) -> RuntimeResult<()>
    where
        I: Integration,
        F: Future<Output = ()>,
    {
        let name = integration.name().to_string();
        let token = CancellationToken::new();
        let mut task = integration.run(self.handler.clone(), token.clone());

        let result = tokio::select! {
            result = &mut task => {
                debug!(integration = %name, "Integration finished");
                result
            }
            () = shutdown => {
                info!(integration = %name, "Shutting down");
                token.cancel();
                task.await
            }
        };

        result.map_err(|source| {
            error!(integration = %name, error = %source, "Integration failed");
            RuntimeError::integration(name.as_str(), source)
        })?;
        info!(integration = %name, "Commandler stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Commandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commandler")
            .field("controllers", &self.registry.len())
            .field("handler", &self.handler)
            .field("cache", &self.cache.as_ref().map(MemoryActionCache::len))
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            futures::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// CommandlerBuilder
// =============================================================================

type BuilderStep<T> = Box<dyn FnOnce(T) -> T + Send>;

/// Builder for [`Commandler`].
///
/// Controllers, handlers and adapters are collected first; [`build`]
/// loads the configuration and validates everything against the final
/// registry.
///
/// [`build`]: CommandlerBuilder::build
pub struct CommandlerBuilder {
    config_loader: ConfigLoader,
    config: Option<CommandlerConfig>,
    registry: RegistryBuilder,
    handlers: HandlerMap,
    adapters: AdapterRegistry,
    headers: HeaderManager,
    misuse: Vec<BuilderStep<MisuseRouter>>,
    layers: Vec<BuilderStep<ActionHandlerBuilder>>,
    help: bool,
    init_logging: bool,
}

impl CommandlerBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            registry: Registry::builder(),
            handlers: HandlerMap::new(),
            adapters: AdapterRegistry::with_defaults(),
            headers: HeaderManager::new(),
            misuse: Vec::new(),
            layers: Vec::new(),
            help: true,
            init_logging: true,
        }
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration below files and environment variables.
    pub fn merge(mut self, config: CommandlerConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `config` as is, skipping file and environment loading.
    pub fn config(mut self, config: CommandlerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Registers a controller together with its handler.
    pub fn controller(mut self, controller: ControllerBuilder, handler: impl Handler) -> Self {
        self.handlers.insert(controller.type_id(), handler);
        self.registry.add(controller);
        self
    }

    /// Registers controller metadata only; its handler is added separately
    /// with [`handler`](Self::handler).
    pub fn metadata(mut self, controller: ControllerBuilder) -> Self {
        self.registry.add(controller);
        self
    }

    pub fn handler(mut self, type_id: impl Into<String>, handler: impl Handler) -> Self {
        self.handlers.insert(type_id, handler);
        self
    }

    /// Registers `adapter` for `types`, replacing built-in adapters.
    pub fn adapter<A: Adapter>(mut self, types: &[TypeKey], adapter: A) -> Self {
        self.adapters.add(types, adapter);
        self
    }

    /// Skips the built-in `help` controller.
    pub fn without_help(mut self) -> Self {
        self.help = false;
        self
    }

    // -------------------------------------------------------------------------
    // Pipeline
    // -------------------------------------------------------------------------

    pub fn header(mut self, binder: impl HeaderBinder) -> Self {
        self.headers.add(binder);
        self
    }

    /// Replaces the rendering of one misuse kind.
    pub fn on_misuse(mut self, kind: MisuseKind, handler: impl MisuseHandler) -> Self {
        self.misuse
            .push(Box::new(move |router: MisuseRouter| router.on(kind, handler)));
        self
    }

    /// Wraps the invocation pipeline in a tower layer.
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
            .push(Box::new(move |builder: ActionHandlerBuilder| builder.layer(layer)));
        self
    }

    /// Loads the configuration and assembles the runtime.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot be loaded or validated, or when
    /// the registry, handlers, adapters and dispatchers do not fit together.
    pub fn build(self) -> RuntimeResult<Commandler> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };
        validate_config(&config)?;
        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        let messages: Arc<dyn MessageResolver> =
            Arc::new(MapResolver::new(config.messages.clone()));

        let mut registry = self.registry;
        if self.help {
            registry.add(help_controller());
        }
        let registry = Arc::new(registry.build()?);

        let mut handlers = self.handlers;
        if self.help {
            handlers.insert(
                HELP,
                HelpHandler::new(Arc::clone(&registry), Arc::clone(&messages)),
            );
        }
        handlers.verify(&registry)?;

        let mut adapters = self.adapters;
        if adapters.get_adapter(&TypeKey::CONTROLLER).is_err() {
            adapters.add(
                &[TypeKey::CONTROLLER],
                ControllerAdapter::new(Arc::clone(&registry)).with_resolver(Arc::clone(&messages)),
            );
        }
        adapters.verify(&registry)?;

        let patterns = PatternCache::new();
        let mut dispatchers = DispatcherManager::new();
        let matching = MatchDispatcher::new(Arc::clone(&registry), &patterns)?;
        if matching.route_count() > 0 {
            dispatchers.add(matching);
        }
        dispatchers.add(
            StandardDispatcher::new(
                Arc::clone(&registry),
                &config.standard_dispatcher,
                &patterns,
            )?
            .with_resolver(Arc::clone(&messages))?,
        );

        for type_id in &config.disabled {
            if registry.controller(type_id).is_none() {
                warn!(controller = %type_id, "Disabled controller is not registered");
            }
        }
        let disabled: DisabledControllers = config.disabled.iter().cloned().collect();

        let misuse = self.misuse.into_iter().fold(
            MisuseRouter::new(DefaultMisuseHandler::new(Arc::clone(&messages))),
            |router, apply| apply(router),
        );

        let mut builder = ActionHandler::builder(
            dispatchers,
            ParameterBinder::new(Arc::new(adapters)),
            Arc::new(handlers),
        )
        .headers(self.headers)
        .disabled(disabled.clone())
        .misuse(misuse);

        let cache = config.cache.enabled.then(MemoryActionCache::new);
        if let Some(cache) = &cache {
            let cache: Arc<dyn ActionCache> = Arc::new(cache.clone());
            builder = builder.cache(cache);
        }
        let handler = self
            .layers
            .into_iter()
            .fold(builder, |builder, apply| apply(builder))
            .build();

        info!(
            controllers = registry.len(),
            patterns = patterns.len(),
            cache = config.cache.enabled,
            disabled = config.disabled.len(),
            "Commandler initialized"
        );

        Ok(Commandler {
            config,
            registry,
            handler,
            disabled,
            cache,
        })
    }
}

impl Default for CommandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::ConfigError;
    use async_trait::async_trait;
    use commandler_core::{Command, Controller, Misuse, ParamType, Parameter, Property, PATTERN};
    use commandler_framework::{CommandRouter, StaticHeader, handler_fn};

    fn math() -> ControllerBuilder {
        Controller::builder("math")
            .name("Math")
            .alias("alias.math")
            .command(
                Command::builder("add")
                    .alias("add")
                    .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
                    .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
            )
    }

    fn math_handler() -> CommandRouter {
        CommandRouter::new().on(
            "add",
            handler_fn(|inv: Invocation| async move {
                let a: i32 = inv.arg(0).unwrap_or_default();
                let b: i32 = inv.arg(1).unwrap_or_default();
                (a + b).to_string()
            }),
        )
    }

    fn config() -> CommandlerConfig {
        let mut config = CommandlerConfig::default();
        config
            .messages
            .insert("alias.math".into(), "math".into());
        config
    }

    fn builder(config: CommandlerConfig) -> CommandlerBuilder {
        Commandler::builder()
            .config(config)
            .without_logging()
            .controller(math(), math_handler())
    }

    fn request(content: &str) -> Request {
        Request::new("test", "1", content)
    }

    #[tokio::test]
    async fn test_build_and_process() {
        let commandler = builder(config()).build().unwrap();
        assert_eq!(
            commandler.on_action(request("$math add 2 3")).await.as_deref(),
            Some("5")
        );
        assert_eq!(commandler.registry().len(), 2);
        assert!(commandler.cache().is_none());
    }

    #[tokio::test]
    async fn test_help_is_registered() {
        let commandler = builder(config()).build().unwrap();
        let reply = commandler.on_action(request("$help math")).await.unwrap();
        assert!(reply.starts_with("Math (math)"));
        assert!(reply.contains("add (add) a, b"));

        let commandler = builder(config()).without_help().build().unwrap();
        assert!(commandler.on_action(request("$help")).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_and_cache_from_config() {
        let mut config = config();
        config.disabled = vec!["math".into()];
        config.cache.enabled = true;
        let commandler = builder(config).build().unwrap();

        let reply = commandler.on_action(request("$math add 1 2")).await.unwrap();
        assert!(reply.contains("currently disabled"));

        assert!(commandler.disabled().enable("math"));
        assert_eq!(
            commandler.on_action(request("$math add 1 2")).await.as_deref(),
            Some("3")
        );
        assert_eq!(commandler.cache().map(MemoryActionCache::len), Some(1));
    }

    #[tokio::test]
    async fn test_pattern_commands_are_dispatched() {
        let commandler = builder(config())
            .controller(
                Controller::builder("dice").command(
                    Command::builder("roll")
                        .property(Property::new(PATTERN, r"^roll (\d+)$"))
                        .param(Parameter::new("count", ParamType::Scalar(TypeKey::I32))),
                ),
                handler_fn(|inv: Invocation| async move {
                    format!("rolled {}", inv.arg::<i32>(0).unwrap_or_default())
                }),
            )
            .build()
            .unwrap();
        assert_eq!(
            commandler.on_action(request("roll 3")).await.as_deref(),
            Some("rolled 3")
        );
        assert_eq!(
            commandler.on_action(request("$math add 1 1")).await.as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn test_headers_and_misuse_overrides() {
        let commandler = builder(config())
            .header(StaticHeader::new("lang", "en"))
            .on_misuse(MisuseKind::ModuleNotFound, |_: &Misuse| {
                Some("Unknown command.".to_string())
            })
            .build()
            .unwrap();
        assert_eq!(
            commandler.on_action(request("$nothing")).await.as_deref(),
            Some("Unknown command.")
        );
    }

    #[test]
    fn test_missing_handler_fails_build() {
        let result = Commandler::builder()
            .config(config())
            .without_logging()
            .metadata(math())
            .build();
        assert!(matches!(result, Err(RuntimeError::Setup(_))));
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let mut config = config();
        config.standard_dispatcher.delimiter = "(".into();
        let result = builder(config).build();
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::InvalidDelimiter { .. }))
        ));
    }

    #[test]
    fn test_malformed_default_fails_build() {
        let greet = Controller::builder("greet").alias("greet").command(
            Command::builder("hello").default_command().param(
                Parameter::new("name", ParamType::Scalar(TypeKey::STRING))
                    .default_value("${source.user"),
            ),
        );
        let result = builder(config())
            .controller(greet, handler_fn(|_: Invocation| async { "hi" }))
            .build();
        assert!(matches!(
            result,
            Err(RuntimeError::Setup(commandler_core::ConfigError::InvalidDefault { .. }))
        ));
    }

    #[test]
    fn test_localized_alias_clash_fails_build() {
        let mut config = config();
        config.messages.insert("alias.math".into(), "help".into());
        let result = builder(config).build();
        assert!(matches!(
            result,
            Err(RuntimeError::Setup(commandler_core::ConfigError::DuplicateAlias { .. }))
        ));
    }

    /// Feeds fixed lines and records the replies.
    struct Scripted {
        lines: Vec<&'static str>,
        replies: Arc<Mutex<Vec<String>>>,
        wait: bool,
    }

    #[async_trait]
    impl Integration for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn run(
            &self,
            handler: ActionHandler,
            shutdown: CancellationToken,
        ) -> Result<(), BoxError> {
            for (id, line) in self.lines.iter().enumerate() {
                let request = Request::new("scripted", id as u64, *line);
                if let Some(reply) = handler.on_action(request).await {
                    self.replies.lock().unwrap().push(reply);
                }
            }
            if self.wait {
                shutdown.cancelled().await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_until_integration_ends() {
        let commandler = builder(config()).build().unwrap();
        let replies = Arc::new(Mutex::new(Vec::new()));
        let integration = Scripted {
            lines: vec!["$math add 1 2", "$math add 2 2"],
            replies: Arc::clone(&replies),
            wait: false,
        };

        commandler
            .run_until(integration, futures::future::pending())
            .await
            .unwrap();
        assert_eq!(*replies.lock().unwrap(), vec!["3", "4"]);
    }

    #[tokio::test]
    async fn test_run_until_shutdown_cancels_integration() {
        let commandler = builder(config()).build().unwrap();
        let integration = Scripted {
            lines: Vec::new(),
            replies: Arc::default(),
            wait: true,
        };

        commandler
            .run_until(
                integration,
                tokio::time::sleep(std::time::Duration::from_millis(10)),
            )
            .await
            .unwrap();
    }

    struct Failing;

    #[async_trait]
    impl Integration for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _: ActionHandler, _: CancellationToken) -> Result<(), BoxError> {
            Err("connection refused".into())
        }
    }

    #[tokio::test]
    async fn test_integration_error_is_reported() {
        let commandler = builder(config()).build().unwrap();
        let err = commandler
            .run_until(Failing, futures::future::pending())
            .await
            .unwrap_err();
        assert!(
            matches!(err, RuntimeError::Integration { ref name, .. } if name == "failing")
        );
        assert!(err.to_string().contains("connection refused"));
    }
}
