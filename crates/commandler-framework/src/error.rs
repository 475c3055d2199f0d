//! Error types for the Commandler framework.

use commandler_core::{ConfigError, DispatchError, Misuse};
use thiserror::Error;
use tower::BoxError;

/// Errors that can occur while processing a request end to end.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Resolution or binding failed, either through misuse or a setup defect.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// No handler is registered for a resolved controller.
    #[error("no handler registered for controller '{type_id}'")]
    ControllerNotFound { type_id: String },

    /// The handler itself failed.
    #[error("command '{command}' of '{controller}' failed: {source}")]
    Handler {
        controller: String,
        command: String,
        #[source]
        source: BoxError,
    },
}

impl ActionError {
    /// The misuse behind this error, if it was caused by user input.
    pub fn as_misuse(&self) -> Option<&Misuse> {
        match self {
            Self::Dispatch(err) => err.as_misuse(),
            _ => None,
        }
    }

    pub fn is_misuse(&self) -> bool {
        self.as_misuse().is_some()
    }

    /// Recovers a typed error from the invocation pipeline.
    ///
    /// Middleware reports misuse and missing handlers as boxed errors; anything
    /// else is attributed to the handler of `controller`/`command`.
    pub fn from_service(err: BoxError, controller: &str, command: &str) -> Self {
        let err = match err.downcast::<Misuse>() {
            Ok(misuse) => return (*misuse).into(),
            Err(err) => err,
        };
        match err.downcast::<ActionError>() {
            Ok(err) => *err,
            Err(source) => Self::Handler {
                controller: controller.to_string(),
                command: command.to_string(),
                source,
            },
        }
    }
}

impl From<Misuse> for ActionError {
    fn from(misuse: Misuse) -> Self {
        Self::Dispatch(misuse.into())
    }
}

impl From<ConfigError> for ActionError {
    fn from(err: ConfigError) -> Self {
        Self::Dispatch(err.into())
    }
}

/// Result type for action processing.
pub type ActionResult<T> = Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use commandler_core::MisuseKind;

    #[test]
    fn test_from_service_recovers_misuse() {
        let boxed: BoxError = Box::new(Misuse::ModuleNotFound);
        let err = ActionError::from_service(boxed, "c", "x");
        assert_eq!(err.as_misuse().map(Misuse::kind), Some(MisuseKind::ModuleNotFound));
    }

    #[test]
    fn test_from_service_recovers_action_error() {
        let boxed: BoxError = Box::new(ActionError::ControllerNotFound {
            type_id: "ghost".into(),
        });
        let err = ActionError::from_service(boxed, "c", "x");
        assert!(matches!(err, ActionError::ControllerNotFound { type_id } if type_id == "ghost"));
    }

    #[test]
    fn test_from_service_wraps_other_errors() {
        let err = ActionError::from_service("boom".into(), "math", "add");
        assert!(!err.is_misuse());
        assert_eq!(err.to_string(), "command 'add' of 'math' failed: boom");
    }
}
