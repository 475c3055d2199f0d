//! Built-in help controller.
//!
//! `help` lists every public controller grouped by group; `help math, util`
//! lists the public commands of the named controllers.
//!
//! ```rust,ignore
//! let registry = Arc::new(
//!     Registry::builder()
//!         .controller(help_controller())
//!         .controller(math)
//!         .build()?,
//! );
//! let adapters = AdapterRegistry::with_defaults()
//!     .register(&[TypeKey::CONTROLLER], ControllerAdapter::new(registry.clone()));
//! let handlers = HandlerMap::new().with(HELP, HelpHandler::new(registry.clone(), messages));
//! ```

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use commandler_core::{
    AdaptContext, Adapter, Command, Controller, ControllerBuilder, IdentityResolver,
    MessageResolver, ParamType, Parameter, Registry, TypeKey, Value, alias_eq,
};
use tower::BoxError;

use crate::handler::{Handler, Invocation};

/// Type id of the help controller.
pub const HELP: &str = "help";

/// Registry metadata for the help controller.
pub fn help_controller() -> ControllerBuilder {
    Controller::builder(HELP)
        .name("Help")
        .description("Lists modules and their commands")
        .alias("help")
        .command(
            Command::builder("show")
                .default_command()
                .description("Shows all modules, or the commands of the given modules")
                .param(
                    Parameter::new("modules", ParamType::Array(TypeKey::CONTROLLER))
                        .default_value("${[]}")
                        .description("Modules to describe"),
                ),
        )
}

/// Adapts a controller name or alias to the [`Controller`] it names.
///
/// Produces [`Value::Custom`] wrapping an `Arc<Controller>`. Hidden
/// controllers are not found. Names and aliases are compared after
/// resolution, the same way the dispatcher sees them.
#[derive(Debug, Clone)]
pub struct ControllerAdapter {
    registry: Arc<Registry>,
    messages: Arc<dyn MessageResolver>,
}

impl ControllerAdapter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            messages: Arc::new(IdentityResolver),
        }
    }

    pub fn with_resolver(mut self, messages: Arc<dyn MessageResolver>) -> Self {
        self.messages = messages;
        self
    }

    fn is_named(&self, controller: &Controller, input: &str) -> bool {
        alias_eq(&self.messages.resolve(controller.name()), input)
            || controller
                .aliases()
                .any(|a| alias_eq(&self.messages.resolve(a), input))
    }
}

impl Adapter for ControllerAdapter {
    fn adapt(&self, input: &str, _ctx: &AdaptContext<'_>) -> Option<Value> {
        let controller = self
            .registry
            .controllers()
            .iter()
            .find(|c| !c.is_hidden() && self.is_named(c, input))?;
        Some(Value::custom(TypeKey::CONTROLLER, Arc::clone(controller)))
    }
}

/// Handler of the help controller.
#[derive(Debug, Clone)]
pub struct HelpHandler {
    registry: Arc<Registry>,
    messages: Arc<dyn MessageResolver>,
}

impl HelpHandler {
    pub fn new(registry: Arc<Registry>, messages: Arc<dyn MessageResolver>) -> Self {
        Self { registry, messages }
    }

    fn overview(&self) -> String {
        let mut out = String::new();
        for (group, controllers) in self.registry.public_groups() {
            let group = group.map_or_else(|| "General".to_string(), |g| self.messages.resolve(g));
            let _ = writeln!(out, "{group}");
            for controller in controllers {
                let _ = writeln!(out, "  {}", self.summary(controller));
            }
        }
        out.trim_end().to_string()
    }

    fn aliases<'a>(&self, aliases: impl Iterator<Item = &'a str>) -> String {
        aliases
            .map(|a| self.messages.resolve(a))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn summary(&self, controller: &Controller) -> String {
        let mut line = format!(
            "{} ({})",
            self.messages.resolve(controller.name()),
            self.aliases(controller.aliases())
        );
        if let Some(description) = controller.description() {
            let _ = write!(line, ": {}", self.messages.resolve(description));
        }
        line
    }

    fn details(&self, controller: &Controller) -> String {
        let mut out = self.summary(controller);
        for command in controller.public_commands() {
            let marker = if command.is_default() { "*" } else { "" };
            let _ = write!(
                out,
                "\n  {marker}{} ({})",
                self.messages.resolve(command.name()),
                self.aliases(command.aliases())
            );
            let params = command.to_param_string();
            if !params.is_empty() {
                let _ = write!(out, " {params}");
            }
            if let Some(description) = command.description() {
                let _ = write!(out, " - {}", self.messages.resolve(description));
            }
        }
        out
    }
}

#[async_trait]
impl Handler for HelpHandler {
    async fn invoke(&self, invocation: Invocation) -> Result<Option<String>, BoxError> {
        let selected: Vec<Value> = invocation.arg(0).unwrap_or_default();
        let controllers: Vec<&Arc<Controller>> = selected
            .iter()
            .filter_map(|value| value.downcast_ref::<Arc<Controller>>())
            .collect();

        if controllers.is_empty() {
            return Ok(Some(self.overview()));
        }
        let details: Vec<String> = controllers.iter().map(|c| self.details(c)).collect();
        Ok(Some(details.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commandler_core::{
        AdapterRegistry, Dispatcher, MapResolver, ParameterBinder, PatternCache, Request,
        StandardDispatcher, StandardDispatcherConfig,
    };

    fn registry() -> Arc<Registry> {
        Arc::new(
            Registry::builder()
                .controller(help_controller())
                .controller(
                    Controller::builder("math")
                        .name("Math")
                        .group("Tools")
                        .description("Arithmetic")
                        .alias("math")
                        .alias("m")
                        .command(
                            Command::builder("add")
                                .alias("add")
                                .description("Adds numbers")
                                .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
                                .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
                        )
                        .command(Command::builder("secret").alias("secret").hidden()),
                )
                .controller(
                    Controller::builder("admin")
                        .alias("admin")
                        .hidden()
                        .command(Command::builder("x").alias("x")),
                )
                .build()
                .unwrap(),
        )
    }

    async fn run(content: &str) -> String {
        let registry = registry();
        let adapters = AdapterRegistry::with_defaults()
            .register(&[TypeKey::CONTROLLER], ControllerAdapter::new(registry.clone()));
        let dispatcher = StandardDispatcher::new(
            registry.clone(),
            &StandardDispatcherConfig::default(),
            &PatternCache::new(),
        )
        .unwrap();

        let event = dispatcher
            .parse(&Arc::new(Request::new("test", "1", content)))
            .unwrap()
            .unwrap();
        let args = ParameterBinder::new(Arc::new(adapters)).bind(&event).unwrap();
        HelpHandler::new(registry, Arc::new(IdentityResolver))
            .invoke(Invocation::new(event, args))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_overview_groups_public_controllers() {
        let reply = run("$help").await;
        assert!(reply.contains("Tools\n  Math (math, m): Arithmetic"));
        assert!(reply.contains("Help (help)"));
        assert!(!reply.contains("admin"));
    }

    #[tokio::test]
    async fn test_controller_details() {
        let reply = run("$help m").await;
        assert!(reply.starts_with("Math (math, m): Arithmetic"));
        assert!(reply.contains("\n  add (add) a, b - Adds numbers"));
        assert!(!reply.contains("secret"));
    }

    #[test]
    fn test_controller_adapter() {
        let registry = registry();
        let adapter = ControllerAdapter::new(registry);
        let ctx = AdaptContext::new(TypeKey::CONTROLLER);

        let value = adapter.adapt("MATH", &ctx).unwrap();
        let controller = value.downcast_ref::<Arc<Controller>>().unwrap();
        assert_eq!(controller.type_id(), "math");
        assert!(adapter.adapt("admin", &ctx).is_none());
        assert!(adapter.adapt("nothing", &ctx).is_none());
    }

    #[test]
    fn test_controller_adapter_resolves_aliases() {
        let adapter = ControllerAdapter::new(registry())
            .with_resolver(Arc::new(MapResolver::default().with("m", "calc")));
        let ctx = AdaptContext::new(TypeKey::CONTROLLER);
        assert!(adapter.adapt("calc", &ctx).is_some());
        assert!(adapter.adapt("m", &ctx).is_none());
    }
}
