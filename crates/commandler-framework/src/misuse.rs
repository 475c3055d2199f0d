//! Misuse routing and rendering.
//!
//! Every [`Misuse`] raised while processing a request is handed to the
//! [`MisuseRouter`], which picks a [`MisuseHandler`] by [`MisuseKind`] and
//! falls back to the [`DefaultMisuseHandler`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use commandler_core::{Command, IdentityResolver, MessageResolver, Misuse, MisuseKind};
use tracing::info;

/// Turns a misuse into an optional reply for the user.
pub trait MisuseHandler: Send + Sync + 'static {
    fn handle(&self, misuse: &Misuse) -> Option<String>;
}

impl<F> MisuseHandler for F
where
    F: Fn(&Misuse) -> Option<String> + Send + Sync + 'static,
{
    fn handle(&self, misuse: &Misuse) -> Option<String> {
        self(misuse)
    }
}

/// Renders English diagnostics for misuse that addressed a real command.
///
/// [`Misuse::OnlyPrefix`] and [`Misuse::ModuleNotFound`] produce no reply:
/// the message most likely was not meant as a command. Names are passed
/// through the [`MessageResolver`] before rendering.
#[derive(Debug, Clone)]
pub struct DefaultMisuseHandler {
    messages: Arc<dyn MessageResolver>,
}

impl DefaultMisuseHandler {
    pub fn new(messages: Arc<dyn MessageResolver>) -> Self {
        Self { messages }
    }

    fn resolve(&self, key: &str) -> String {
        self.messages.resolve(key)
    }

    fn describe(&self, command: &Command) -> String {
        let aliases: Vec<String> = command.aliases().map(|a| self.resolve(a)).collect();
        let params = command.to_param_string();
        match (aliases.is_empty(), params.is_empty()) {
            (true, true) => self.resolve(command.name()),
            (true, false) => format!("{}: {params}", self.resolve(command.name())),
            (false, true) => format!("{} ({})", self.resolve(command.name()), aliases.join(", ")),
            (false, false) => format!(
                "{} ({}): {params}",
                self.resolve(command.name()),
                aliases.join(", ")
            ),
        }
    }
}

impl Default for DefaultMisuseHandler {
    fn default() -> Self {
        Self::new(Arc::new(IdentityResolver))
    }
}

impl MisuseHandler for DefaultMisuseHandler {
    fn handle(&self, misuse: &Misuse) -> Option<String> {
        let reply = match misuse {
            Misuse::OnlyPrefix | Misuse::ModuleNotFound => return None,
            Misuse::NoDefaultCommand { controller } => {
                let commands: Vec<String> = controller
                    .public_commands()
                    .map(|c| self.describe(c))
                    .collect();
                format!(
                    "Command failed; this module has no default command.\n\
                     Module: {}\n\n\
                     Possibilities:\n{}\n\n\
                     See the help command for more information.",
                    self.resolve(controller.name()),
                    commands.join("\n")
                )
            }
            Misuse::ParamCountMismatch { event } => format!(
                "Command failed: you provided the wrong amount of parameters.\n\
                 Module: {}\n\
                 Command: {}\n\
                 Required: {}\n\
                 Provided: {}",
                self.resolve(event.controller().name()),
                self.resolve(event.command().name()),
                event.command().to_param_string(),
                event.action().to_param_string()
            ),
            Misuse::ParamParse { event, param, item } => format!(
                "Command failed; I couldn't interpret '{item}', as the parameter '{}'.\n\
                 Module: {}\n\
                 Command: {}\n\
                 Required: {}\n\
                 Provided: {}",
                self.resolve(param.name()),
                self.resolve(event.controller().name()),
                self.resolve(event.command().name()),
                event.command().to_param_string(),
                event.action().to_param_string()
            ),
            Misuse::ListUnsupported { event, param, .. } => format!(
                "Command failed; the parameter '{}' can't be a list.\n\
                 Module: {}\n\
                 Command: {}\n\
                 Required: {}\n\
                 Provided: {}",
                self.resolve(param.name()),
                self.resolve(event.controller().name()),
                self.resolve(event.command().name()),
                event.command().to_param_string(),
                event.action().to_param_string()
            ),
            Misuse::ModuleDisabled { event } => format!(
                "Command failed; this module is currently disabled due to live issues.\n\
                 Module: {}",
                self.resolve(event.controller().name())
            ),
        };
        Some(reply)
    }
}

/// Dispatches misuse to handlers keyed by [`MisuseKind`].
#[derive(Clone)]
pub struct MisuseRouter {
    handlers: HashMap<MisuseKind, Arc<dyn MisuseHandler>>,
    fallback: Arc<dyn MisuseHandler>,
}

impl MisuseRouter {
    /// A router sending every kind to `fallback`.
    pub fn new(fallback: impl MisuseHandler) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Overrides the handler for one kind (builder pattern).
    pub fn on(mut self, kind: MisuseKind, handler: impl MisuseHandler) -> Self {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    /// Renders `misuse` with the handler registered for its kind.
    pub fn route(&self, misuse: &Misuse) -> Option<String> {
        let kind = misuse.kind();
        info!(kind = %kind, reason = %misuse, "Command misuse");
        self.handlers
            .get(&kind)
            .unwrap_or(&self.fallback)
            .handle(misuse)
    }
}

impl Default for MisuseRouter {
    fn default() -> Self {
        Self::new(DefaultMisuseHandler::default())
    }
}

impl fmt::Debug for MisuseRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MisuseRouter")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
