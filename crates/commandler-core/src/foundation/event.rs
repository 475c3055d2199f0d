//! Requests, resolved actions and action events.
//!
//! - [`Request`] - an inbound message as handed over by an integration
//! - [`Action`] - the serializable outcome of resolving a request
//! - [`ActionEvent`] - an action bundled with the request and registry entries
//!
//! Integration-specific payloads are carried type-erased through [`Source`]
//! and can be recovered by downcasting:
//!
//! ```rust,ignore
//! if let Some(line) = event.request().source().downcast_ref::<ConsoleLine>() {
//!     println!("from stdin #{}", line.number);
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::error::ConfigError;
use crate::foundation::metadata::{Command, Controller};
use crate::foundation::value::Value;

// ============================================================================
// Source
// ============================================================================

/// An integration-specific event or message object attached to a request.
pub trait Source: Any + Send + Sync {
    /// Looks up a named property, used by default-value expressions.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn Source {
    pub fn downcast_ref<T: Source>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// A [`Source`] backed by a plain property map.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap(HashMap<String, Value>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl Source for PropertyMap {
    fn property(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Request
// ============================================================================

/// Opaque identifier of an action, assigned by the integration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ActionId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// An inbound text message awaiting resolution.
#[derive(Clone)]
pub struct Request {
    integration: String,
    id: ActionId,
    source: Arc<dyn Source>,
    message: Option<Arc<dyn Source>>,
    content: String,
    headers: HashMap<String, String>,
}

impl Request {
    /// Creates a request with an empty [`PropertyMap`] as its source.
    pub fn new(
        integration: impl Into<String>,
        id: impl Into<ActionId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            integration: integration.into(),
            id: id.into(),
            source: Arc::new(PropertyMap::new()),
            message: None,
            content: content.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Source) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_message(mut self, message: impl Source) -> Self {
        self.message = Some(Arc::new(message));
        self
    }

    /// Adds a header.
    ///
    /// # Errors
    ///
    /// Headers are write-once; setting an existing key fails with
    /// [`ConfigError::HeaderConflict`].
    pub fn set_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        if self.headers.contains_key(&key) {
            return Err(ConfigError::HeaderConflict { key });
        }
        self.headers.insert(key, value.into());
        Ok(())
    }

    /// Builder form of [`set_header`](Self::set_header).
    pub fn with_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        self.set_header(key, value)?;
        Ok(self)
    }

    /// Name of the integration that produced this request.
    pub fn integration(&self) -> &str {
        &self.integration
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    pub fn message(&self) -> Option<&dyn Source> {
        self.message.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("integration", &self.integration)
            .field("id", &self.id)
            .field("content", &self.content)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Action
// ============================================================================

/// The resolved, serializable form of a command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    id: ActionId,
    content: String,
    controller_type: String,
    command_name: String,
    param_groups: Vec<Vec<String>>,
}

impl Action {
    pub fn new(
        id: ActionId,
        content: impl Into<String>,
        controller_type: impl Into<String>,
        command_name: impl Into<String>,
        param_groups: Vec<Vec<String>>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            controller_type: controller_type.into(),
            command_name: command_name.into(),
            param_groups,
        }
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    /// The raw text the action was resolved from.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn controller_type(&self) -> &str {
        &self.controller_type
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn param_groups(&self) -> &[Vec<String>] {
        &self.param_groups
    }

    /// Renders the parameter groups, e.g. `(1) a (2) [b, c]`, or `None`.
    pub fn to_param_string(&self) -> String {
        if self.param_groups.is_empty() {
            return "None".to_string();
        }
        self.param_groups
            .iter()
            .enumerate()
            .map(|(i, group)| match group.as_slice() {
                [single] => format!("({}) {single}", i + 1),
                items => format!("({}) [{}]", i + 1, items.join(", ")),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// ActionEvent
// ============================================================================

/// A resolved action together with the request and registry entries it refers to.
#[derive(Clone)]
pub struct ActionEvent {
    request: Arc<Request>,
    action: Action,
    controller: Arc<Controller>,
    command: Arc<Command>,
}

impl ActionEvent {
    pub fn new(
        request: Arc<Request>,
        action: Action,
        controller: Arc<Controller>,
        command: Arc<Command>,
    ) -> Self {
        Self {
            request,
            action,
            controller,
            command,
        }
    }

    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }
}

impl fmt::Debug for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEvent")
            .field("action", &self.action)
            .field("controller", &self.controller.name())
            .field("command", &self.command.name())
            .finish_non_exhaustive()
    }
}
