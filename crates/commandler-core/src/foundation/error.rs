//! Error types for the Commandler core.
//!
//! Two categories are kept strictly apart:
//!
//! - [`Misuse`] describes a user mistake. It always carries enough context to
//!   render a helpful reply and is handed unmodified to the caller.
//! - [`ConfigError`] describes a defect in registry or adapter setup. It is
//!   never rendered to users as misuse.
//!
//! [`DispatchError`] unifies both for the dispatch and binding entry points.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::foundation::event::ActionEvent;
use crate::foundation::metadata::{Controller, Parameter};

// =============================================================================
// Misuse
// =============================================================================

/// Discriminant of a [`Misuse`], used to route it to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MisuseKind {
    OnlyPrefix,
    ModuleNotFound,
    NoDefaultCommand,
    ParamCountMismatch,
    ParamParse,
    ListUnsupported,
    ModuleDisabled,
}

impl MisuseKind {
    /// The text did not address a resolvable command.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::OnlyPrefix | Self::ModuleNotFound | Self::NoDefaultCommand
        )
    }

    /// A command was found but its inputs were invalid.
    pub fn is_parameter(self) -> bool {
        matches!(
            self,
            Self::ParamCountMismatch | Self::ParamParse | Self::ListUnsupported
        )
    }
}

impl fmt::Display for MisuseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OnlyPrefix => "only_prefix",
            Self::ModuleNotFound => "module_not_found",
            Self::NoDefaultCommand => "no_default_command",
            Self::ParamCountMismatch => "param_count_mismatch",
            Self::ParamParse => "param_parse",
            Self::ListUnsupported => "list_unsupported",
            Self::ModuleDisabled => "module_disabled",
        };
        f.write_str(name)
    }
}

/// A user-input error detected while resolving or binding a command.
#[derive(Debug, Clone, Error)]
pub enum Misuse {
    /// The message consisted of a prefix and nothing else.
    #[error("message contains only a command prefix")]
    OnlyPrefix,

    /// Neither a controller alias nor a static command matched.
    #[error("no module matches the message")]
    ModuleNotFound,

    /// A controller was addressed without a command and has no default.
    #[error("module '{}' has no default command", .controller.name())]
    NoDefaultCommand { controller: Arc<Controller> },

    /// The number of parameter groups is outside the command's arity.
    #[error(
        "command '{}' expects {} to {} parameters, got {}",
        .event.command().name(),
        .event.command().min_params(),
        .event.command().max_params(),
        .event.action().param_groups().len()
    )]
    ParamCountMismatch { event: Arc<ActionEvent> },

    /// An item could not be adapted to the parameter's type.
    #[error("could not interpret '{item}' as parameter '{}'", .param.name())]
    ParamParse {
        event: Arc<ActionEvent>,
        param: Parameter,
        item: String,
    },

    /// Several items were given for a scalar parameter.
    #[error("parameter '{}' does not accept a list", .param.name())]
    ListUnsupported {
        event: Arc<ActionEvent>,
        param: Parameter,
        items: Vec<String>,
    },

    /// The addressed controller is administratively disabled.
    #[error("module '{}' is disabled", .event.controller().name())]
    ModuleDisabled { event: Arc<ActionEvent> },
}

impl Misuse {
    pub fn kind(&self) -> MisuseKind {
        match self {
            Self::OnlyPrefix => MisuseKind::OnlyPrefix,
            Self::ModuleNotFound => MisuseKind::ModuleNotFound,
            Self::NoDefaultCommand { .. } => MisuseKind::NoDefaultCommand,
            Self::ParamCountMismatch { .. } => MisuseKind::ParamCountMismatch,
            Self::ParamParse { .. } => MisuseKind::ParamParse,
            Self::ListUnsupported { .. } => MisuseKind::ListUnsupported,
            Self::ModuleDisabled { .. } => MisuseKind::ModuleDisabled,
        }
    }

    /// The resolved event, when the misuse happened after resolution.
    pub fn event(&self) -> Option<&Arc<ActionEvent>> {
        match self {
            Self::ParamCountMismatch { event }
            | Self::ParamParse { event, .. }
            | Self::ListUnsupported { event, .. }
            | Self::ModuleDisabled { event } => Some(event),
            _ => None,
        }
    }
}

// =============================================================================
// Expression Errors
// =============================================================================

/// Errors raised while evaluating a parameter's default expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("syntax error at {position} in '{expression}': {reason}")]
    Syntax {
        expression: String,
        position: usize,
        reason: String,
    },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("'{variable}' has no property '{property}'")]
    UnknownProperty { variable: String, property: String },
}

impl ExpressionError {
    pub fn syntax(expression: &str, position: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            position,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// A defect in registry, adapter or dispatcher setup.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No adapter is registered for a parameter's element type.
    #[error("no adapter registered for type '{type_name}'")]
    AdapterRequired { type_name: &'static str },

    #[error("controller type '{type_id}' is registered twice")]
    DuplicateController { type_id: String },

    #[error("alias '{alias}' is used by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("alias '{alias}' is used by two commands of '{controller}'")]
    DuplicateCommandAlias { controller: String, alias: String },

    #[error("controller '{controller}' declares several default commands: {commands}")]
    MultipleDefaults { controller: String, commands: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A binder tried to set a header that is already present.
    #[error("header '{key}' is already set")]
    HeaderConflict { key: String },

    #[error("default value of parameter '{param}' is not usable as '{type_name}'")]
    DefaultTypeMismatch {
        param: String,
        type_name: &'static str,
    },

    /// A required parameter follows an optional one, so it can never be
    /// reached positionally.
    #[error("required parameter '{param}' of '{controller}.{command}' follows an optional one")]
    RequiredAfterOptional {
        controller: String,
        command: String,
        param: String,
    },

    #[error("default value of '{controller}.{command}.{param}' is malformed: {source}")]
    InvalidDefault {
        controller: String,
        command: String,
        param: String,
        source: ExpressionError,
    },

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn pattern(pattern: &str, err: impl fmt::Display) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Failure of [`parse`](crate::framework::dispatcher::Dispatcher::parse) or
/// [`bind`](crate::framework::binder::ParameterBinder::bind).
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Misuse(#[from] Misuse),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DispatchError {
    pub fn as_misuse(&self) -> Option<&Misuse> {
        match self {
            Self::Misuse(misuse) => Some(misuse),
            Self::Config(_) => None,
        }
    }

    pub fn is_misuse(&self) -> bool {
        self.as_misuse().is_some()
    }
}

impl From<ExpressionError> for DispatchError {
    fn from(err: ExpressionError) -> Self {
        Self::Config(err.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dispatch and binding.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for setup operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_categories() {
        assert!(Misuse::OnlyPrefix.kind().is_structural());
        assert!(Misuse::ModuleNotFound.kind().is_structural());
        assert!(!MisuseKind::ParamParse.is_structural());
        assert!(MisuseKind::ListUnsupported.is_parameter());
        assert!(!MisuseKind::ModuleDisabled.is_parameter());
    }

    #[test]
    fn test_dispatch_error_conversions() {
        let err: DispatchError = Misuse::ModuleNotFound.into();
        assert!(err.is_misuse());
        assert_eq!(err.as_misuse().map(Misuse::kind), Some(MisuseKind::ModuleNotFound));

        let err: DispatchError = ExpressionError::UnknownVariable("x".into()).into();
        assert!(!err.is_misuse());
        assert!(matches!(err, DispatchError::Config(ConfigError::Expression(_))));
    }

    #[test]
    fn test_no_default_message() {
        let controller = Arc::new(Controller::builder("ping").name("Ping").build());
        let err = Misuse::NoDefaultCommand { controller };
        assert_eq!(err.to_string(), "module 'Ping' has no default command");
    }
}
