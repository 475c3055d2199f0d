//! Registry metadata: controllers, commands, parameters and their properties.
//!
//! Everything in this module is plain immutable data. Instances are assembled
//! through the builder methods and then frozen into a
//! [`Registry`](crate::foundation::registry::Registry), after which they are
//! only ever shared behind an [`Arc`].
//!
//! # Example
//!
//! ```rust,ignore
//! use commandler_core::prelude::*;
//!
//! let math = Controller::builder("math")
//!     .name("Math")
//!     .alias("math")
//!     .command(
//!         Command::builder("add")
//!             .alias("add")
//!             .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
//!             .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
//!     );
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Property key holding the comma-separated aliases of a controller or command.
pub const ALIASES: &str = "aliases";

/// Property key holding the regular expression used by the match dispatcher.
pub const PATTERN: &str = "pattern";

/// Compares two aliases the way users type them: ignoring case.
pub fn alias_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

// ============================================================================
// Type keys
// ============================================================================

/// A nominal type identifier used to pick adapters and check assignability.
///
/// Two keys are equal when their names are equal. A key is assignable to
/// another when the names match or the other key's name appears among this
/// key's supertypes.
#[derive(Clone, Copy)]
pub struct TypeKey {
    name: &'static str,
    supertypes: &'static [&'static str],
}

impl TypeKey {
    pub const STRING: TypeKey = TypeKey::new("string");
    pub const BOOL: TypeKey = TypeKey::new("bool");
    pub const CHAR: TypeKey = TypeKey::new("char");
    /// Abstract supertype of every integer and float key.
    pub const NUMBER: TypeKey = TypeKey::new("number");
    pub const I8: TypeKey = TypeKey::new("i8").with_supertypes(&["number"]);
    pub const I16: TypeKey = TypeKey::new("i16").with_supertypes(&["number"]);
    pub const I32: TypeKey = TypeKey::new("i32").with_supertypes(&["number"]);
    pub const I64: TypeKey = TypeKey::new("i64").with_supertypes(&["number"]);
    pub const F32: TypeKey = TypeKey::new("f32").with_supertypes(&["number"]);
    pub const F64: TypeKey = TypeKey::new("f64").with_supertypes(&["number"]);
    /// Abstract supertype of every user enumeration.
    pub const ENUM: TypeKey = TypeKey::new("enum");
    pub const DURATION: TypeKey = TypeKey::new("duration");
    pub const TIME_UNIT: TypeKey = TypeKey::new("time_unit");
    /// A reference to a registered controller.
    pub const CONTROLLER: TypeKey = TypeKey::new("controller");

    /// Creates a key without supertypes.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            supertypes: &[],
        }
    }

    /// Declares the supertypes this key is assignable to.
    pub const fn with_supertypes(self, supertypes: &'static [&'static str]) -> Self {
        Self {
            name: self.name,
            supertypes,
        }
    }

    /// Declares a user enumeration key, assignable to [`TypeKey::ENUM`].
    pub const fn enumeration(name: &'static str) -> Self {
        Self::new(name).with_supertypes(&["enum"])
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn supertypes(&self) -> &'static [&'static str] {
        self.supertypes
    }

    /// Returns `true` if a value of this type may be used where `other` is expected.
    pub fn is_assignable_to(&self, other: &TypeKey) -> bool {
        self.name == other.name || self.supertypes.contains(&other.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The declared shape of a user-input parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// A single value.
    Scalar(TypeKey),
    /// A fixed sequence of values.
    Array(TypeKey),
    /// A growable sequence of values.
    List(TypeKey),
}

impl ParamType {
    /// The key every item of this parameter is adapted to.
    pub fn element(&self) -> TypeKey {
        match self {
            Self::Scalar(key) | Self::Array(key) | Self::List(key) => *key,
        }
    }

    /// Returns `true` for array and list parameters.
    pub fn is_multi(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }
}

// ============================================================================
// Properties
// ============================================================================

/// A key/value annotation attached to a controller, command or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    key: String,
    value: String,
    is_public: bool,
    is_localized: bool,
    display_name: Option<String>,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_public: false,
            is_localized: false,
            display_name: None,
        }
    }

    /// Marks the property as visible in generated help output.
    pub fn public(mut self, display_name: impl Into<String>) -> Self {
        self.is_public = true;
        self.display_name = Some(display_name.into());
        self
    }

    /// Marks the value as a message key to resolve before display.
    pub fn localized(mut self) -> Self {
        self.is_localized = true;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn is_localized(&self) -> bool {
        self.is_localized
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// An ordered property bag; later insertions replace earlier ones with the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<Property>);

impl Properties {
    pub fn insert(&mut self, property: Property) {
        match self.0.iter_mut().find(|p| p.key == property.key) {
            Some(existing) => *existing = property,
            None => self.0.push(property),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(Property::value)
    }

    /// Splits a comma-separated property value into trimmed, non-empty entries.
    pub fn values(&self, key: &str) -> impl Iterator<Item = &str> {
        self.value(key)
            .into_iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn public(&self) -> impl Iterator<Item = &Property> {
        self.0.iter().filter(|p| p.is_public)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }

    fn push_alias(&mut self, alias: &str) {
        let value = match self.value(ALIASES) {
            Some(existing) => format!("{existing},{alias}"),
            None => alias.to_string(),
        };
        self.insert(Property::new(ALIASES, value));
    }
}

// ============================================================================
// Parameter
// ============================================================================

/// A user-input slot of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    position_index: usize,
    logical_index: usize,
    name: String,
    description: Option<String>,
    target_type: ParamType,
    default_expression: Option<String>,
    properties: Properties,
}

impl Parameter {
    /// Creates a required parameter. Indices are assigned when it is added to a command.
    pub fn new(name: impl Into<String>, target_type: ParamType) -> Self {
        Self {
            position_index: 0,
            logical_index: 0,
            name: name.into(),
            description: None,
            target_type,
            default_expression: None,
            properties: Properties::default(),
        }
    }

    /// Makes the parameter optional; `expression` is evaluated when the user omits it.
    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.default_expression = Some(expression.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.insert(property);
        self
    }

    /// Index among all formal slots of the command, injected ones included.
    pub fn position_index(&self) -> usize {
        self.position_index
    }

    /// Index among user-input parameters only.
    pub fn logical_index(&self) -> usize {
        self.logical_index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn target_type(&self) -> ParamType {
        self.target_type
    }

    pub fn is_required(&self) -> bool {
        self.default_expression.is_none()
    }

    pub fn default_expression(&self) -> Option<&str> {
        self.default_expression.as_deref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// A formal slot of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Filled from the user's parameter groups.
    Param(Parameter),
    /// Filled by the caller from its own context; never counted for arity.
    Injected {
        position_index: usize,
        type_key: TypeKey,
    },
}

// ============================================================================
// Command
// ============================================================================

/// A single invocable operation of a controller.
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    description: Option<String>,
    hidden: bool,
    is_static: bool,
    is_default: bool,
    properties: Properties,
    slots: Vec<Slot>,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Static commands are addressed by their own alias without the controller's.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.properties.values(ALIASES)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// User-input parameters in logical order.
    pub fn params(&self) -> impl Iterator<Item = &Parameter> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Param(param) => Some(param),
            Slot::Injected { .. } => None,
        })
    }

    pub fn min_params(&self) -> usize {
        self.params().filter(|p| p.is_required()).count()
    }

    pub fn max_params(&self) -> usize {
        self.params().count()
    }

    pub fn is_valid_param_count(&self, count: usize) -> bool {
        count >= self.min_params() && count <= self.max_params()
    }

    /// Renders the parameter list, e.g. `a, ?b, [c]`.
    pub fn to_param_string(&self) -> String {
        self.params()
            .map(|p| {
                let optional = if p.is_required() { "" } else { "?" };
                if p.target_type().is_multi() {
                    format!("{optional}[{}]", p.name())
                } else {
                    format!("{optional}{}", p.name())
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builder for [`Command`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            command: Command {
                name: name.into(),
                description: None,
                hidden: false,
                is_static: false,
                is_default: false,
                properties: Properties::default(),
                slots: Vec::new(),
            },
        }
    }

    /// Adds an alias; may be called repeatedly.
    pub fn alias(mut self, alias: &str) -> Self {
        self.command.properties.push_alias(alias);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.command.description = Some(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.command.hidden = true;
        self
    }

    pub fn static_command(mut self) -> Self {
        self.command.is_static = true;
        self
    }

    pub fn default_command(mut self) -> Self {
        self.command.is_default = true;
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.command.properties.insert(property);
        self
    }

    /// Appends a user-input parameter, assigning its position and logical index.
    pub fn param(mut self, mut param: Parameter) -> Self {
        param.position_index = self.command.slots.len();
        param.logical_index = self.command.max_params();
        self.command.slots.push(Slot::Param(param));
        self
    }

    /// Appends a slot that the caller fills from its own context.
    pub fn inject(mut self, type_key: TypeKey) -> Self {
        let position_index = self.command.slots.len();
        self.command.slots.push(Slot::Injected {
            position_index,
            type_key,
        });
        self
    }

    pub fn build(self) -> Command {
        self.command
    }
}

// ============================================================================
// Controller
// ============================================================================

/// A named group of commands backed by one controller implementation.
#[derive(Debug, Clone)]
pub struct Controller {
    type_id: String,
    group: Option<String>,
    name: String,
    description: Option<String>,
    hidden: bool,
    properties: Properties,
    commands: Vec<Arc<Command>>,
}

impl Controller {
    /// Starts a controller whose implementation is looked up by `type_id`.
    pub fn builder(type_id: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder::new(type_id)
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.properties.values(ALIASES)
    }

    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    pub fn public_commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter().filter(|c| !c.is_hidden())
    }

    pub fn hidden_commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter().filter(|c| c.is_hidden())
    }

    pub fn static_commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter().filter(|c| c.is_static())
    }

    pub fn default_command(&self) -> Option<&Arc<Command>> {
        self.commands.iter().find(|c| c.is_default())
    }

    pub fn command(&self, name: &str) -> Option<&Arc<Command>> {
        self.commands.iter().find(|c| c.name() == name)
    }
}

/// Builder for [`Controller`].
#[derive(Debug, Clone)]
pub struct ControllerBuilder {
    type_id: String,
    group: Option<String>,
    name: Option<String>,
    description: Option<String>,
    hidden: bool,
    properties: Properties,
    commands: Vec<Command>,
}

impl ControllerBuilder {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            group: None,
            name: None,
            description: None,
            hidden: false,
            properties: Properties::default(),
            commands: Vec::new(),
        }
    }

    /// Display name; defaults to the type id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Adds an alias; may be called repeatedly.
    pub fn alias(mut self, alias: &str) -> Self {
        self.properties.push_alias(alias);
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.insert(property);
        self
    }

    pub fn command(mut self, command: impl Into<Command>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn build(self) -> Controller {
        Controller {
            name: self.name.unwrap_or_else(|| self.type_id.clone()),
            type_id: self.type_id,
            group: self.group,
            description: self.description,
            hidden: self.hidden,
            properties: self.properties,
            commands: self.commands.into_iter().map(Arc::new).collect(),
        }
    }
}

impl From<CommandBuilder> for Command {
    fn from(builder: CommandBuilder) -> Self {
        builder.build()
    }
}
