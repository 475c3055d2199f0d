//! Parameter binding.
//!
//! The [`ParameterBinder`] turns the raw parameter groups of an
//! [`ActionEvent`] into typed [`Args`], one entry per command slot.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::foundation::error::{ConfigError, DispatchResult, Misuse};
use crate::foundation::event::ActionEvent;
use crate::foundation::metadata::{Parameter, Slot, TypeKey};
use crate::foundation::value::{FromValue, Value};
use crate::framework::adapter::{AdaptContext, AdapterRegistry};
use crate::framework::expression::{EventScope, evaluate};

/// One bound slot.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArg {
    Value(Value),
    /// A slot the framework fills from its own state rather than user input.
    Injected(TypeKey),
}

/// Bound arguments of a command, indexed by slot position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    slots: Vec<BoundArg>,
}

impl Args {
    pub fn new(slots: Vec<BoundArg>) -> Self {
        Self { slots }
    }

    /// Extracts the value at `position` as `T`.
    ///
    /// Returns `None` for injected slots, out-of-range positions and values
    /// of a different type.
    pub fn get<T: FromValue>(&self, position: usize) -> Option<T> {
        T::from_value(self.value(position)?)
    }

    pub fn value(&self, position: usize) -> Option<&Value> {
        match self.slots.get(position)? {
            BoundArg::Value(value) => Some(value),
            BoundArg::Injected(_) => None,
        }
    }

    /// The type requested by the injected slot at `position`.
    pub fn injected(&self, position: usize) -> Option<TypeKey> {
        match self.slots.get(position)? {
            BoundArg::Injected(key) => Some(*key),
            BoundArg::Value(_) => None,
        }
    }

    pub fn slots(&self) -> &[BoundArg] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Adapts parameter groups and evaluates defaults.
#[derive(Clone)]
pub struct ParameterBinder {
    adapters: Arc<AdapterRegistry>,
}

impl ParameterBinder {
    pub fn new(adapters: Arc<AdapterRegistry>) -> Self {
        Self { adapters }
    }

    pub fn adapters(&self) -> &Arc<AdapterRegistry> {
        &self.adapters
    }

    /// Binds every slot of the event's command.
    ///
    /// # Errors
    ///
    /// - [`Misuse::ParamParse`] when an item cannot be adapted
    /// - [`Misuse::ListUnsupported`] when a scalar receives several items
    /// - [`ConfigError`] for missing adapters and broken default expressions
    pub fn bind(&self, event: &Arc<ActionEvent>) -> DispatchResult<Args> {
        let groups = event.action().param_groups();
        let mut slots = Vec::with_capacity(event.command().slots().len());

        for slot in event.command().slots() {
            let bound = match slot {
                Slot::Injected { type_key, .. } => BoundArg::Injected(*type_key),
                Slot::Param(param) => {
                    let value = match groups.get(param.logical_index()) {
                        Some(items) => self.adapt_items(event, param, items)?,
                        None => self.default_value(event, param)?,
                    };
                    BoundArg::Value(value)
                }
            };
            slots.push(bound);
        }

        debug!(
            command = event.command().name(),
            slots = slots.len(),
            "Bound parameters"
        );
        Ok(Args::new(slots))
    }

    fn adapt_items(
        &self,
        event: &Arc<ActionEvent>,
        param: &Parameter,
        items: &[String],
    ) -> DispatchResult<Value> {
        let adapter = self.adapters.get_adapter(&param.target_type().element())?;
        let ctx = AdaptContext::for_param(param, event);
        let adapt = |item: &String| {
            adapter.adapt(item, &ctx).ok_or_else(|| Misuse::ParamParse {
                event: Arc::clone(event),
                param: param.clone(),
                item: item.clone(),
            })
        };

        if param.target_type().is_multi() {
            let values = items.iter().map(&adapt).collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::Array(values));
        }

        match items {
            [item] => Ok(adapt(item)?),
            _ => Err(Misuse::ListUnsupported {
                event: Arc::clone(event),
                param: param.clone(),
                items: items.to_vec(),
            }
            .into()),
        }
    }

    fn default_value(&self, event: &Arc<ActionEvent>, param: &Parameter) -> DispatchResult<Value> {
        // The registry keeps required parameters ahead of optional ones, so
        // arity checking guarantees they have a group.
        let expression = param.default_expression().ok_or_else(|| {
            ConfigError::invalid(format!("parameter '{}' has no value", param.name()))
        })?;
        let value = evaluate(expression, &EventScope(event))?;
        trace!(param = param.name(), expression, value = %value, "Evaluated default");

        if value.is_assignable_to(&param.target_type()) {
            return Ok(value);
        }

        let items = match &value {
            Value::String(s) => vec![s.clone()],
            Value::Array(values) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| mismatch(param))?,
            _ => return Err(mismatch(param).into()),
        };
        self.adapt_items(event, param, &items)
    }
}

fn mismatch(param: &Parameter) -> ConfigError {
    ConfigError::DefaultTypeMismatch {
        param: param.name().to_string(),
        type_name: param.target_type().element().name(),
    }
}

impl fmt::Debug for ParameterBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterBinder")
            .field("adapters", &self.adapters.len())
            .finish()
    }
}
