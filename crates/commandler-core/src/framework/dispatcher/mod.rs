//! Request dispatchers.
//!
//! A [`Dispatcher`] turns a [`Request`] into an [`ActionEvent`] by picking a
//! controller and command from the registry and tokenizing the remaining
//! text. The [`DispatcherManager`] asks several dispatchers in turn:
//!
//! 1. Dispatchers are consulted in registration order
//! 2. Dispatchers whose [`is_valid`](Dispatcher::is_valid) check fails are skipped
//! 3. The first dispatcher that yields an event wins
//! 4. An error (misuse or configuration) stops dispatch immediately
//!
//! ```rust,ignore
//! use commandler_core::prelude::*;
//!
//! let manager = DispatcherManager::new()
//!     .with(MatchDispatcher::new(registry.clone(), &patterns)?)
//!     .with(StandardDispatcher::new(registry, &config, &patterns)?);
//!
//! match manager.dispatch(&request) {
//!     Ok(Some(event)) => { /* bind and invoke */ }
//!     Ok(None) => { /* not a command */ }
//!     Err(e) => { /* misuse or configuration error */ }
//! }
//! ```

pub mod matching;
pub mod prefix;
pub mod standard;

use std::sync::Arc;

use tracing::{Level, debug, span};

use crate::foundation::error::{DispatchResult, Misuse};
use crate::foundation::event::{Action, ActionEvent, Request};
use crate::foundation::metadata::{Command, Controller};

pub use matching::MatchDispatcher;
pub use prefix::Prefix;
pub use standard::{StandardDispatcher, StandardDispatcherConfig};

/// Resolves requests into action events.
pub trait Dispatcher: Send + Sync + 'static {
    /// Cheap pre-check whether this dispatcher is responsible for `request`.
    fn is_valid(&self, request: &Request) -> bool;

    /// Resolves `request`.
    ///
    /// Returns `Ok(None)` when the content is not recognized as a command.
    fn parse(&self, request: &Arc<Request>) -> DispatchResult<Option<Arc<ActionEvent>>>;
}

/// Runs dispatchers in order until one produces an event.
#[derive(Default, Clone)]
pub struct DispatcherManager {
    dispatchers: Vec<Arc<dyn Dispatcher>>,
}

impl DispatcherManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dispatcher. Dispatchers are consulted in the order they are added.
    pub fn add(&mut self, dispatcher: impl Dispatcher) {
        self.dispatchers.push(Arc::new(dispatcher));
    }

    /// Adds a dispatcher (builder pattern).
    pub fn with(mut self, dispatcher: impl Dispatcher) -> Self {
        self.add(dispatcher);
        self
    }

    pub fn dispatcher_count(&self) -> usize {
        self.dispatchers.len()
    }

    /// Dispatches a request to the first responsible dispatcher.
    pub fn dispatch(&self, request: &Arc<Request>) -> DispatchResult<Option<Arc<ActionEvent>>> {
        let span = span!(Level::DEBUG, "dispatch", action_id = %request.id());
        let _enter = span.enter();

        for dispatcher in &self.dispatchers {
            if !dispatcher.is_valid(request) {
                continue;
            }
            if let Some(event) = dispatcher.parse(request)? {
                return Ok(Some(event));
            }
        }

        debug!("No dispatcher recognized the request");
        Ok(None)
    }
}

impl std::fmt::Debug for DispatcherManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherManager")
            .field("dispatcher_count", &self.dispatchers.len())
            .finish()
    }
}

/// Builds the event for a resolved command and checks its arity.
pub(crate) fn resolve_event(
    request: &Arc<Request>,
    controller: &Arc<Controller>,
    command: &Arc<Command>,
    param_groups: Vec<Vec<String>>,
) -> DispatchResult<Arc<ActionEvent>> {
    let count = param_groups.len();
    let action = Action::new(
        request.id().clone(),
        request.content(),
        controller.type_id(),
        command.name(),
        param_groups,
    );
    let event = Arc::new(ActionEvent::new(
        Arc::clone(request),
        action,
        Arc::clone(controller),
        Arc::clone(command),
    ));

    if !command.is_valid_param_count(count) {
        debug!(
            controller = controller.name(),
            command = command.name(),
            provided = count,
            "Parameter count mismatch"
        );
        return Err(Misuse::ParamCountMismatch { event }.into());
    }

    debug!(
        controller = controller.name(),
        command = command.name(),
        params = %event.action().to_param_string(),
        "Resolved action"
    );
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::{DispatchError, MisuseKind};

    struct Fixed(Option<&'static str>);

    impl Dispatcher for Fixed {
        fn is_valid(&self, request: &Request) -> bool {
            !request.content().is_empty()
        }

        fn parse(&self, request: &Arc<Request>) -> DispatchResult<Option<Arc<ActionEvent>>> {
            let Some(name) = self.0 else {
                return Ok(None);
            };
            let controller = Arc::new(
                Controller::builder(name)
                    .command(Command::builder("run").default_command())
                    .build(),
            );
            let command = Arc::clone(&controller.commands()[0]);
            resolve_event(request, &controller, &command, Vec::new()).map(Some)
        }
    }

    struct Failing;

    impl Dispatcher for Failing {
        fn is_valid(&self, _: &Request) -> bool {
            true
        }

        fn parse(&self, _: &Arc<Request>) -> DispatchResult<Option<Arc<ActionEvent>>> {
            Err(Misuse::ModuleNotFound.into())
        }
    }

    fn request(content: &str) -> Arc<Request> {
        Arc::new(Request::new("test", "1", content))
    }

    #[test]
    fn test_first_event_wins() {
        let manager = DispatcherManager::new()
            .with(Fixed(None))
            .with(Fixed(Some("first")))
            .with(Fixed(Some("second")));
        let event = manager.dispatch(&request("hi")).unwrap().unwrap();
        assert_eq!(event.controller().type_id(), "first");
    }

    #[test]
    fn test_invalid_dispatchers_are_skipped() {
        let manager = DispatcherManager::new().with(Fixed(Some("x")));
        assert!(manager.dispatch(&request("")).unwrap().is_none());
    }

    #[test]
    fn test_errors_stop_dispatch() {
        let manager = DispatcherManager::new().with(Failing).with(Fixed(Some("x")));
        let err = manager.dispatch(&request("hi")).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Misuse(ref m) if m.kind() == MisuseKind::ModuleNotFound
        ));
    }

    #[test]
    fn test_arity_checked_on_resolve() {
        let controller = Arc::new(
            Controller::builder("c")
                .command(Command::builder("none"))
                .build(),
        );
        let command = Arc::clone(&controller.commands()[0]);
        let err = resolve_event(&request("x"), &controller, &command, vec![vec!["1".into()]])
            .unwrap_err();
        assert_eq!(err.as_misuse().map(Misuse::kind), Some(MisuseKind::ParamCountMismatch));
    }
}
