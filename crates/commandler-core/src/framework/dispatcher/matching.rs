//! Pattern-based dispatcher.
//!
//! Commands carrying a [`PATTERN`] property are matched against the whole
//! message content. Each capture group becomes one single-item parameter
//! group, so `(?i)^roll (\d+)d(\d+)$` turns `roll 2d6` into `[[2], [6]]`.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::foundation::error::{ConfigError, DispatchResult};
use crate::foundation::event::{ActionEvent, Request};
use crate::foundation::metadata::{Command, Controller, PATTERN};
use crate::foundation::registry::Registry;
use crate::framework::dispatcher::{Dispatcher, resolve_event};
use crate::framework::pattern::PatternCache;

struct Route {
    controller: Arc<Controller>,
    command: Arc<Command>,
    pattern: Regex,
}

/// Resolves commands by regular expression.
pub struct MatchDispatcher {
    routes: Vec<Route>,
}

impl MatchDispatcher {
    /// Compiles every command pattern in `registry`.
    ///
    /// # Errors
    ///
    /// Fails on the first pattern that does not compile.
    pub fn new(registry: Arc<Registry>, patterns: &PatternCache) -> Result<Self, ConfigError> {
        let mut routes = Vec::new();
        for controller in registry.controllers() {
            for command in controller.commands() {
                let Some(pattern) = command.properties().value(PATTERN) else {
                    continue;
                };
                routes.push(Route {
                    controller: Arc::clone(controller),
                    command: Arc::clone(command),
                    pattern: patterns.get_or_compile(pattern)?,
                });
            }
        }
        debug!(routes = routes.len(), "Compiled command patterns");
        Ok(Self { routes })
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

impl Dispatcher for MatchDispatcher {
    fn is_valid(&self, _request: &Request) -> bool {
        true
    }

    fn parse(&self, request: &Arc<Request>) -> DispatchResult<Option<Arc<ActionEvent>>> {
        for route in &self.routes {
            let Some(captures) = route.pattern.captures(request.content()) else {
                continue;
            };
            // Groups after the first one that did not participate are dropped.
            let param_groups = captures
                .iter()
                .skip(1)
                .map_while(|m| m.map(|m| vec![m.as_str().to_string()]))
                .collect();
            return resolve_event(request, &route.controller, &route.command, param_groups)
                .map(Some);
        }
        Ok(None)
    }
}

impl std::fmt::Debug for MatchDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchDispatcher")
            .field("routes", &self.routes.len())
            .finish()
    }
}
