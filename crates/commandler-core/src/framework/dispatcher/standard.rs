//! Alias-based dispatcher.
//!
//! Messages look like `<prefix><controller> [command] [params...]`:
//!
//! ```text
//! >math add 1 2      controller "math", command "add", params [[1], [2]]
//! >ping              controller "ping", its default command
//! >echo hi           static command "echo", params [[hi]]
//! ```
//!
//! Controllers are scanned in registration order. For each controller its
//! aliases are checked first, then the aliases of its static commands; the
//! first hit wins.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::foundation::error::{ConfigError, DispatchResult, Misuse};
use crate::foundation::event::{ActionEvent, Request};
use crate::foundation::message::{IdentityResolver, MessageResolver};
use crate::foundation::metadata::{Command, Controller, alias_eq};
use crate::foundation::registry::Registry;
use crate::framework::dispatcher::prefix::Prefix;
use crate::framework::dispatcher::{Dispatcher, resolve_event};
use crate::framework::pattern::PatternCache;
use crate::framework::tokenizer::tokenize;

/// Configuration of the [`StandardDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardDispatcherConfig {
    /// Accepted command prefixes. Entries may read the prefix from a request
    /// header with `${KEY}` or `${KEY:default}`. Empty accepts every message.
    pub prefixes: Vec<String>,

    /// Regular expression separating the controller, command and parameter text.
    pub delimiter: String,
}

impl Default for StandardDispatcherConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["$".to_string()],
            delimiter: r"\s+".to_string(),
        }
    }
}

impl StandardDispatcherConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes = vec![prefix.into()];
        self
    }
}

/// Resolves controllers and commands by alias.
#[derive(Debug)]
pub struct StandardDispatcher {
    registry: Arc<Registry>,
    prefixes: Vec<Prefix>,
    delimiter: Regex,
    resolver: Arc<dyn MessageResolver>,
}

impl StandardDispatcher {
    /// Creates a dispatcher over `registry`.
    ///
    /// # Errors
    ///
    /// Fails when the configured delimiter is not a valid regular expression.
    pub fn new(
        registry: Arc<Registry>,
        config: &StandardDispatcherConfig,
        patterns: &PatternCache,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            registry,
            prefixes: config.prefixes.iter().map(|p| Prefix::parse(p)).collect(),
            delimiter: patterns.get_or_compile(&config.delimiter)?,
            resolver: Arc::new(IdentityResolver),
        })
    }

    /// Resolves aliases through `resolver` before comparing them.
    ///
    /// # Errors
    ///
    /// Fails when two aliases that are distinct in the registry resolve to
    /// the same text.
    pub fn with_resolver(mut self, resolver: Arc<dyn MessageResolver>) -> Result<Self, ConfigError> {
        self.registry.verify_aliases(resolver.as_ref())?;
        self.resolver = resolver;
        Ok(self)
    }

    /// Strips the first matching prefix from the request content.
    fn strip_prefix<'a>(&'a self, request: &'a Request) -> Option<&'a str> {
        let content = request.content();
        if self.prefixes.is_empty() {
            return Some(content);
        }
        self.prefixes
            .iter()
            .filter_map(|p| p.resolve(request))
            .find_map(|p| content.strip_prefix(p))
    }

    fn matches<'a>(&self, mut aliases: impl Iterator<Item = &'a str>, token: &str) -> bool {
        aliases.any(|alias| alias_eq(&self.resolver.resolve(alias), token))
    }

    /// Picks the controller, command and remaining parameter text.
    fn select<'r, 't>(
        &'r self,
        text: &'t str,
    ) -> DispatchResult<(&'r Arc<Controller>, &'r Arc<Command>, &'t str)> {
        let mut tokens = self.delimiter.splitn(text, 3);
        let Some(first) = tokens.next().filter(|t| !t.is_empty()) else {
            return Err(Misuse::OnlyPrefix.into());
        };
        let second = tokens.next();
        let rest = tokens.next().unwrap_or("");
        let after_first = self.delimiter.splitn(text, 2).nth(1).unwrap_or("");

        for controller in self.registry.controllers() {
            if self.matches(controller.aliases(), first) {
                trace!(controller = controller.name(), "Matched controller alias");
                let addressed = second.and_then(|token| {
                    controller
                        .commands()
                        .iter()
                        .find(|c| self.matches(c.aliases(), token))
                });
                if let Some(command) = addressed {
                    return Ok((controller, command, rest));
                }
                return match controller.default_command() {
                    Some(command) => Ok((controller, command, after_first)),
                    None => Err(Misuse::NoDefaultCommand {
                        controller: Arc::clone(controller),
                    }
                    .into()),
                };
            }

            if let Some(command) = controller
                .static_commands()
                .find(|c| self.matches(c.aliases(), first))
            {
                trace!(command = command.name(), "Matched static command");
                return Ok((controller, command, after_first));
            }
        }

        Err(Misuse::ModuleNotFound.into())
    }
}

impl Dispatcher for StandardDispatcher {
    fn is_valid(&self, request: &Request) -> bool {
        self.strip_prefix(request).is_some()
    }

    fn parse(&self, request: &Arc<Request>) -> DispatchResult<Option<Arc<ActionEvent>>> {
        let Some(text) = self.strip_prefix(request) else {
            return Ok(None);
        };
        let (controller, command, remainder) = self.select(text.trim())?;
        let param_groups = tokenize(remainder.trim());
        resolve_event(request, controller, command, param_groups).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::{DispatchError, MisuseKind};
    use crate::foundation::message::MapResolver;
    use crate::foundation::metadata::{ParamType, Parameter, TypeKey};

    fn registry() -> Arc<Registry> {
        let int = || ParamType::Scalar(TypeKey::I32);
        Arc::new(
            Registry::builder()
                .controller(
                    Controller::builder("math").alias("math").command(
                        Command::builder("add")
                            .alias("add")
                            .param(Parameter::new("a", int()))
                            .param(Parameter::new("b", int())),
                    ),
                )
                .controller(
                    Controller::builder("ping")
                        .alias("ping")
                        .command(Command::builder("pong").default_command()),
                )
                .controller(
                    Controller::builder("util")
                        .alias("util")
                        .command(
                            Command::builder("echo")
                                .static_command()
                                .alias("echo")
                                .param(Parameter::new("text", ParamType::Scalar(TypeKey::STRING))),
                        )
                        .command(Command::builder("noop").alias("noop")),
                )
                .controller(
                    Controller::builder("say").alias("say").command(
                        Command::builder("line")
                            .default_command()
                            .param(Parameter::new("first", ParamType::Scalar(TypeKey::STRING)))
                            .param(Parameter::new("rest", ParamType::List(TypeKey::STRING))),
                    ),
                )
                .build()
                .unwrap(),
        )
    }

    fn dispatcher() -> StandardDispatcher {
        let config = StandardDispatcherConfig::default().with_prefix(">");
        StandardDispatcher::new(registry(), &config, &PatternCache::new()).unwrap()
    }

    fn parse(content: &str) -> DispatchResult<Option<Arc<ActionEvent>>> {
        dispatcher().parse(&Arc::new(Request::new("test", "1", content)))
    }

    fn misuse_kind(content: &str) -> Option<MisuseKind> {
        parse(content).unwrap_err().as_misuse().map(Misuse::kind)
    }

    #[test]
    fn test_controller_and_command() {
        let event = parse(">math add 1 2").unwrap().unwrap();
        assert_eq!(event.controller().type_id(), "math");
        assert_eq!(event.command().name(), "add");
        assert_eq!(event.action().param_groups(), &[vec!["1"], vec!["2"]]);
    }

    #[test]
    fn test_case_insensitive_aliases() {
        let event = parse(">MATH Add 1 2").unwrap().unwrap();
        assert_eq!(event.command().name(), "add");
    }

    #[test]
    fn test_param_count_mismatch() {
        assert_eq!(misuse_kind(">math add 1"), Some(MisuseKind::ParamCountMismatch));
        assert_eq!(misuse_kind(">math add 1 2 3"), Some(MisuseKind::ParamCountMismatch));
    }

    #[test]
    fn test_default_command() {
        let event = parse(">ping").unwrap().unwrap();
        assert_eq!(event.command().name(), "pong");
        assert!(event.action().param_groups().is_empty());
    }

    #[test]
    fn test_default_command_receives_unmatched_token() {
        let event = parse(">say hello there, world").unwrap().unwrap();
        assert_eq!(event.command().name(), "line");
        assert_eq!(
            event.action().param_groups(),
            &[vec!["hello"], vec!["there", "world"]]
        );
    }

    #[test]
    fn test_no_default_command() {
        let err = parse(">math subtract 1 2").unwrap_err();
        match err {
            DispatchError::Misuse(Misuse::NoDefaultCommand { controller }) => {
                assert_eq!(controller.type_id(), "math");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(misuse_kind(">math"), Some(MisuseKind::NoDefaultCommand));
    }

    #[test]
    fn test_static_command() {
        let event = parse(">echo hello").unwrap().unwrap();
        assert_eq!(event.controller().type_id(), "util");
        assert_eq!(event.command().name(), "echo");
        assert_eq!(event.action().param_groups(), &[vec!["hello"]]);
    }

    #[test]
    fn test_non_static_command_needs_controller() {
        assert_eq!(misuse_kind(">noop"), Some(MisuseKind::ModuleNotFound));
        assert!(parse(">util noop").unwrap().is_some());
    }

    #[test]
    fn test_module_not_found() {
        assert_eq!(misuse_kind(">weather today"), Some(MisuseKind::ModuleNotFound));
    }

    #[test]
    fn test_only_prefix() {
        assert_eq!(misuse_kind(">"), Some(MisuseKind::OnlyPrefix));
        assert_eq!(misuse_kind(">   "), Some(MisuseKind::OnlyPrefix));
    }

    #[test]
    fn test_unprefixed_content_is_ignored() {
        let dispatcher = dispatcher();
        let request = Arc::new(Request::new("test", "1", "math add 1 2"));
        assert!(!dispatcher.is_valid(&request));
        assert!(dispatcher.parse(&request).unwrap().is_none());
    }

    #[test]
    fn test_repeated_resolution_shares_references() {
        let dispatcher = dispatcher();
        let a = dispatcher
            .parse(&Arc::new(Request::new("test", "1", ">math add 1 2")))
            .unwrap()
            .unwrap();
        let b = dispatcher
            .parse(&Arc::new(Request::new("test", "2", ">math add 3 4")))
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(a.controller(), b.controller()));
        assert!(Arc::ptr_eq(a.command(), b.command()));
    }

    #[test]
    fn test_header_prefix() {
        let config = StandardDispatcherConfig::default().with_prefix("${prefix:>}");
        let dispatcher = StandardDispatcher::new(registry(), &config, &PatternCache::new()).unwrap();

        let custom = Request::new("test", "1", "!ping").with_header("prefix", "!").unwrap();
        assert!(dispatcher.is_valid(&custom));
        assert!(dispatcher.parse(&Arc::new(custom)).unwrap().is_some());

        let fallback = Request::new("test", "2", ">ping");
        assert!(dispatcher.is_valid(&fallback));
        assert!(!dispatcher.is_valid(&Request::new("test", "3", "!ping")));
    }

    #[test]
    fn test_empty_prefixes_accept_everything() {
        let config = StandardDispatcherConfig {
            prefixes: Vec::new(),
            ..Default::default()
        };
        let dispatcher = StandardDispatcher::new(registry(), &config, &PatternCache::new()).unwrap();
        let event = dispatcher
            .parse(&Arc::new(Request::new("test", "1", "ping")))
            .unwrap()
            .unwrap();
        assert_eq!(event.command().name(), "pong");
    }

    #[test]
    fn test_custom_delimiter() {
        let config = StandardDispatcherConfig {
            prefixes: vec![">".into()],
            delimiter: r"\s*:\s*".into(),
        };
        let dispatcher = StandardDispatcher::new(registry(), &config, &PatternCache::new()).unwrap();
        let event = dispatcher
            .parse(&Arc::new(Request::new("test", "1", ">math:add:1 2")))
            .unwrap()
            .unwrap();
        assert_eq!(event.action().param_groups(), &[vec!["1"], vec!["2"]]);
    }

    #[test]
    fn test_invalid_delimiter() {
        let config = StandardDispatcherConfig {
            delimiter: "(".into(),
            ..Default::default()
        };
        let result = StandardDispatcher::new(registry(), &config, &PatternCache::new());
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_localized_aliases() {
        let resolver = MapResolver::default().with("math", "rechnen");
        let dispatcher = dispatcher().with_resolver(Arc::new(resolver)).unwrap();
        let event = dispatcher
            .parse(&Arc::new(Request::new("test", "1", ">rechnen add 1 2")))
            .unwrap();
        assert!(event.is_some());
    }

    #[test]
    fn test_localized_alias_collision() {
        let resolver = MapResolver::default().with("math", "ping");
        let result = dispatcher().with_resolver(Arc::new(resolver));
        assert!(matches!(result, Err(ConfigError::DuplicateAlias { .. })));
    }
}
