//! Typed parameter values produced by adapters and default expressions.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::foundation::metadata::{ParamType, TypeKey};

/// A unit of time, as accepted by the time unit and duration adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Converts `amount` of this unit into a [`Duration`], saturating on overflow.
    pub fn duration(self, amount: u64) -> Duration {
        match self {
            Self::Days => Duration::from_secs(amount.saturating_mul(86_400)),
            Self::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            Self::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            Self::Seconds => Duration::from_secs(amount),
            Self::Milliseconds => Duration::from_millis(amount),
            Self::Microseconds => Duration::from_micros(amount),
            Self::Nanoseconds => Duration::from_nanos(amount),
        }
    }
}

/// A typed value bound to a parameter slot.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Duration(Duration),
    TimeUnit(TimeUnit),
    /// A variant of a user enumeration, identified by its declared name.
    Enum {
        type_key: TypeKey,
        variant: String,
    },
    Array(Vec<Value>),
    /// Any other value produced by a user adapter.
    Custom {
        type_key: TypeKey,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl Value {
    /// The type key of a scalar value; `None` for arrays.
    pub fn type_key(&self) -> Option<TypeKey> {
        Some(match self {
            Self::Bool(_) => TypeKey::BOOL,
            Self::Char(_) => TypeKey::CHAR,
            Self::I8(_) => TypeKey::I8,
            Self::I16(_) => TypeKey::I16,
            Self::I32(_) => TypeKey::I32,
            Self::I64(_) => TypeKey::I64,
            Self::F32(_) => TypeKey::F32,
            Self::F64(_) => TypeKey::F64,
            Self::String(_) => TypeKey::STRING,
            Self::Duration(_) => TypeKey::DURATION,
            Self::TimeUnit(_) => TypeKey::TIME_UNIT,
            Self::Enum { type_key, .. } | Self::Custom { type_key, .. } => *type_key,
            Self::Array(_) => return None,
        })
    }

    /// Returns `true` if this value can be bound to a parameter of type `ty` as is.
    pub fn is_assignable_to(&self, ty: &ParamType) -> bool {
        match (self, ty) {
            (Self::Array(items), ParamType::Array(elem) | ParamType::List(elem)) => items
                .iter()
                .all(|item| item.type_key().is_some_and(|k| k.is_assignable_to(elem))),
            (Self::Array(_), ParamType::Scalar(_)) => false,
            (value, ParamType::Scalar(key)) => {
                value.type_key().is_some_and(|k| k.is_assignable_to(key))
            }
            (_, ParamType::Array(_) | ParamType::List(_)) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The variant name of an enumeration value.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Self::Enum { variant, .. } => Some(variant),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Downcasts a custom value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom { value, .. } => value.downcast_ref(),
            _ => None,
        }
    }

    pub fn custom<T: Any + Send + Sync>(type_key: TypeKey, value: T) -> Self {
        Self::Custom {
            type_key,
            value: Arc::new(value),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Char(v) => write!(f, "Char({v:?})"),
            Self::I8(v) => write!(f, "I8({v})"),
            Self::I16(v) => write!(f, "I16({v})"),
            Self::I32(v) => write!(f, "I32({v})"),
            Self::I64(v) => write!(f, "I64({v})"),
            Self::F32(v) => write!(f, "F32({v})"),
            Self::F64(v) => write!(f, "F64({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Duration(v) => write!(f, "Duration({v:?})"),
            Self::TimeUnit(v) => write!(f, "TimeUnit({v:?})"),
            Self::Enum { type_key, variant } => write!(f, "Enum({type_key}::{variant})"),
            Self::Array(items) => f.debug_list().entries(items).finish(),
            Self::Custom { type_key, .. } => write!(f, "Custom({type_key})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Duration(v) => write!(f, "{v:?}"),
            Self::TimeUnit(v) => write!(f, "{v:?}"),
            Self::Enum { variant, .. } => f.write_str(variant),
            Self::Array(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Custom { type_key, .. } => write!(f, "<{type_key}>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::TimeUnit(a), Self::TimeUnit(b)) => a == b,
            (
                Self::Enum {
                    type_key: ka,
                    variant: va,
                },
                Self::Enum {
                    type_key: kb,
                    variant: vb,
                },
            ) => ka == kb && va == vb,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Custom { value: a, .. }, Self::Custom { value: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

// ============================================================================
// FromValue
// ============================================================================

/// Extraction of a Rust value from a bound [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    Bool => bool,
    Char => char,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    F32 => f32,
    F64 => f64,
    String => String,
    Duration => Duration,
    TimeUnit => TimeUnit,
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_value).collect()
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
