//! Foundation layer - registry data model and request types.
//!
//! This module contains the plain data the rest of the crate operates on:
//! - Registry metadata (controllers, commands, parameters, properties)
//! - The immutable registry and its builder
//! - Requests, actions and action events
//! - Typed parameter values
//! - Error types, including the misuse taxonomy

pub mod error;
pub mod event;
pub mod message;
pub mod metadata;
pub mod registry;
pub mod value;

pub use error::{
    ConfigError, ConfigResult, DispatchError, DispatchResult, ExpressionError, Misuse, MisuseKind,
};
pub use event::{Action, ActionEvent, ActionId, PropertyMap, Request, Source};
pub use message::{IdentityResolver, MapResolver, MessageResolver};
pub use metadata::{
    ALIASES, Command, CommandBuilder, Controller, ControllerBuilder, PATTERN, ParamType, Parameter,
    Properties, Property, Slot, TypeKey, alias_eq,
};
pub use registry::{Registry, RegistryBuilder};
pub use value::{FromValue, TimeUnit, Value};
