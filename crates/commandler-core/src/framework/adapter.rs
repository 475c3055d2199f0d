//! Type adapters and their registry.
//!
//! An [`Adapter`] turns one raw string item into a typed [`Value`] and
//! declares the [`TypeKey`]s it can produce. The [`AdapterRegistry`] picks an
//! adapter for a target type:
//!
//! 1. An adapter listing the exact target type wins, regardless of order
//! 2. Otherwise the first registered adapter whose type the target is
//!    assignable to is used
//! 3. Otherwise [`ConfigError::AdapterRequired`] is returned
//!
//! # Example
//!
//! ```rust,ignore
//! use commandler_core::prelude::*;
//!
//! const POINT: TypeKey = TypeKey::new("point");
//!
//! let adapters = AdapterRegistry::with_defaults().register(&[POINT], |input: &str, _: &AdaptContext<'_>| {
//!     let (x, y) = input.split_once(';')?;
//!     Some(Value::custom(POINT, (x.parse::<i64>().ok()?, y.parse::<i64>().ok()?)))
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::foundation::error::ConfigError;
use crate::foundation::event::ActionEvent;
use crate::foundation::metadata::{Parameter, TypeKey};
use crate::foundation::registry::Registry;
use crate::foundation::value::Value;
use crate::framework::adapters::{
    BooleanAdapter, CharAdapter, DurationAdapter, NumberAdapter, StringAdapter, TimeUnitAdapter,
};

/// What an adapter is asked to produce, and for whom.
#[derive(Debug, Clone, Copy)]
pub struct AdaptContext<'a> {
    target: TypeKey,
    param: Option<&'a Parameter>,
    event: Option<&'a ActionEvent>,
}

impl<'a> AdaptContext<'a> {
    /// A context with only a target type, for adapting outside of a request.
    pub fn new(target: TypeKey) -> Self {
        Self {
            target,
            param: None,
            event: None,
        }
    }

    pub fn for_param(param: &'a Parameter, event: &'a ActionEvent) -> Self {
        Self {
            target: param.target_type().element(),
            param: Some(param),
            event: Some(event),
        }
    }

    /// The element type to produce.
    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn param(&self) -> Option<&'a Parameter> {
        self.param
    }

    pub fn event(&self) -> Option<&'a ActionEvent> {
        self.event
    }
}

/// Converts a raw string item into a typed value.
pub trait Adapter: Send + Sync + 'static {
    /// Returns `None` when `input` cannot be interpreted as the target type.
    fn adapt(&self, input: &str, ctx: &AdaptContext<'_>) -> Option<Value>;
}

impl<F> Adapter for F
where
    F: Fn(&str, &AdaptContext<'_>) -> Option<Value> + Send + Sync + 'static,
{
    fn adapt(&self, input: &str, ctx: &AdaptContext<'_>) -> Option<Value> {
        self(input, ctx)
    }
}

#[derive(Clone)]
struct Registration {
    types: Vec<TypeKey>,
    name: &'static str,
    adapter: Arc<dyn Adapter>,
}

/// Ordered set of adapters keyed by the types they produce.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Registration>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in string, number, boolean, character,
    /// time unit and duration adapters.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(&[TypeKey::STRING], StringAdapter)
            .register(&NumberAdapter::TYPES, NumberAdapter)
            .register(&[TypeKey::BOOL], BooleanAdapter)
            .register(&[TypeKey::CHAR], CharAdapter)
            .register(&[TypeKey::TIME_UNIT], TimeUnitAdapter::default())
            .register(&[TypeKey::DURATION], DurationAdapter::default())
    }

    /// Registers an adapter for `types` (builder pattern).
    pub fn register<A: Adapter>(mut self, types: &[TypeKey], adapter: A) -> Self {
        self.add(types, adapter);
        self
    }

    /// Registers an adapter for `types`.
    pub fn add<A: Adapter>(&mut self, types: &[TypeKey], adapter: A) {
        self.adapters.push(Registration {
            types: types.to_vec(),
            name: std::any::type_name::<A>(),
            adapter: Arc::new(adapter),
        });
    }

    /// Selects the adapter for `target`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::AdapterRequired`] when no registered adapter is compatible.
    pub fn get_adapter(&self, target: &TypeKey) -> Result<Arc<dyn Adapter>, ConfigError> {
        let mut candidate: Option<&Registration> = None;

        for registration in &self.adapters {
            if registration.types.contains(target) {
                candidate = Some(registration);
                break;
            }
            if candidate.is_none() && registration.types.iter().any(|t| target.is_assignable_to(t)) {
                candidate = Some(registration);
            }
        }

        match candidate {
            Some(registration) => {
                trace!(target = %target, adapter = registration.name, "Selected adapter");
                Ok(Arc::clone(&registration.adapter))
            }
            None => Err(ConfigError::AdapterRequired {
                type_name: target.name(),
            }),
        }
    }

    /// Checks that every parameter in `registry` has an adapter.
    pub fn verify(&self, registry: &Registry) -> Result<(), ConfigError> {
        for controller in registry.controllers() {
            for command in controller.commands() {
                for param in command.params() {
                    self.get_adapter(&param.target_type().element())?;
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|r| (r.name, &r.types)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::metadata::{Command, Controller, ParamType};

    struct Tagged(&'static str);

    impl Adapter for Tagged {
        fn adapt(&self, _: &str, _: &AdaptContext<'_>) -> Option<Value> {
            Some(Value::from(self.0))
        }
    }

    fn tagged(tag: &'static str) -> Tagged {
        Tagged(tag)
    }

    fn adapt_with(registry: &AdapterRegistry, target: TypeKey) -> Option<Value> {
        registry
            .get_adapter(&target)
            .unwrap()
            .adapt("1", &AdaptContext::new(target))
    }

    #[test]
    fn test_exact_match_beats_assignable() {
        let registry = AdapterRegistry::new()
            .register(&[TypeKey::NUMBER], tagged("number"))
            .register(&[TypeKey::I32], tagged("i32"));
        assert_eq!(adapt_with(&registry, TypeKey::I32), Some(Value::from("i32")));
        assert_eq!(adapt_with(&registry, TypeKey::I64), Some(Value::from("number")));
    }

    #[test]
    fn test_first_assignable_wins() {
        let registry = AdapterRegistry::new()
            .register(&[TypeKey::NUMBER], tagged("first"))
            .register(&[TypeKey::NUMBER], tagged("second"));
        assert_eq!(adapt_with(&registry, TypeKey::F64), Some(Value::from("first")));
    }

    #[test]
    fn test_adapter_required() {
        let registry = AdapterRegistry::new().register(&[TypeKey::STRING], tagged("s"));
        let err = registry.get_adapter(&TypeKey::BOOL).err().unwrap();
        assert!(matches!(err, ConfigError::AdapterRequired { type_name: "bool" }));
    }

    #[test]
    fn test_defaults_cover_builtin_types() {
        let registry = AdapterRegistry::with_defaults();
        for key in [
            TypeKey::STRING,
            TypeKey::I8,
            TypeKey::I64,
            TypeKey::F32,
            TypeKey::NUMBER,
            TypeKey::BOOL,
            TypeKey::CHAR,
            TypeKey::TIME_UNIT,
            TypeKey::DURATION,
        ] {
            assert!(registry.get_adapter(&key).is_ok(), "missing adapter for {key}");
        }
        assert!(registry.get_adapter(&TypeKey::ENUM).is_err());
    }

    #[test]
    fn test_verify_registry() {
        let registry = Registry::builder()
            .controller(
                Controller::builder("c").command(
                    Command::builder("x")
                        .param(Parameter::new("p", ParamType::List(TypeKey::new("point")))),
                ),
            )
            .build()
            .unwrap();

        let adapters = AdapterRegistry::with_defaults();
        assert!(matches!(
            adapters.verify(&registry),
            Err(ConfigError::AdapterRequired { type_name: "point" })
        ));

        let adapters = adapters.register(&[TypeKey::new("point")], tagged("p"));
        assert!(adapters.verify(&registry).is_ok());
    }
}
