//! Built-in adapters.

mod enumeration;
mod time;

pub use enumeration::{EnumAdapter, EnumVariant};
pub use time::{DurationAdapter, TimeUnitAdapter, parse_time_unit};

use crate::foundation::metadata::TypeKey;
use crate::foundation::value::Value;
use crate::framework::adapter::{AdaptContext, Adapter};

/// Passes the item through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringAdapter;

impl Adapter for StringAdapter {
    fn adapt(&self, input: &str, _ctx: &AdaptContext<'_>) -> Option<Value> {
        Some(Value::String(input.to_string()))
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Parses integers and floats of every width.
///
/// The whole item must parse. Values outside the target's range and
/// non-finite floats are rejected. For the abstract [`TypeKey::NUMBER`]
/// target an `i64` is tried before an `f64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberAdapter;

impl NumberAdapter {
    pub const TYPES: [TypeKey; 7] = [
        TypeKey::I8,
        TypeKey::I16,
        TypeKey::I32,
        TypeKey::I64,
        TypeKey::F32,
        TypeKey::F64,
        TypeKey::NUMBER,
    ];
}

impl Adapter for NumberAdapter {
    fn adapt(&self, input: &str, ctx: &AdaptContext<'_>) -> Option<Value> {
        let target = ctx.target();
        Some(match target.name() {
            "i8" => Value::I8(input.parse().ok()?),
            "i16" => Value::I16(input.parse().ok()?),
            "i32" => Value::I32(input.parse().ok()?),
            "i64" => Value::I64(input.parse().ok()?),
            "f32" => Value::F32(input.parse().ok().filter(|v: &f32| v.is_finite())?),
            "f64" => Value::F64(parse_finite(input)?),
            _ => match input.parse::<i64>() {
                Ok(v) => Value::I64(v),
                Err(_) => Value::F64(parse_finite(input)?),
            },
        })
    }
}

fn parse_finite(input: &str) -> Option<f64> {
    input.parse().ok().filter(|v: &f64| v.is_finite())
}

// ============================================================================
// Booleans
// ============================================================================

const TRUTHY: &[&str] = &["true", "t", "1", "one", "yes", "y", "ya", "ye", "yea", "yeah", "✔"];
const FALSY: &[&str] = &["false", "f", "0", "zero", "no", "n", "nah", "nope", "❌"];

/// Accepts common spellings of yes and no, ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanAdapter;

impl Adapter for BooleanAdapter {
    fn adapt(&self, input: &str, _ctx: &AdaptContext<'_>) -> Option<Value> {
        let input = input.to_lowercase();
        if TRUTHY.contains(&input.as_str()) {
            Some(Value::Bool(true))
        } else if FALSY.contains(&input.as_str()) {
            Some(Value::Bool(false))
        } else {
            None
        }
    }
}

// ============================================================================
// Characters
// ============================================================================

/// Accepts a single character, or a character code below 256.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharAdapter;

impl Adapter for CharAdapter {
    fn adapt(&self, input: &str, _ctx: &AdaptContext<'_>) -> Option<Value> {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Value::Char(c)),
            (Some(_), Some(_)) if input.len() < 4 => {
                input.parse::<u8>().ok().map(|code| Value::Char(char::from(code)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapt(adapter: &impl Adapter, input: &str, target: TypeKey) -> Option<Value> {
        adapter.adapt(input, &AdaptContext::new(target))
    }

    #[test]
    fn test_string_adapter() {
        assert_eq!(
            adapt(&StringAdapter, "a b", TypeKey::STRING),
            Some(Value::from("a b"))
        );
    }

    #[test]
    fn test_number_widths() {
        assert_eq!(adapt(&NumberAdapter, "42", TypeKey::I32), Some(Value::I32(42)));
        assert_eq!(adapt(&NumberAdapter, "-7", TypeKey::I8), Some(Value::I8(-7)));
        assert_eq!(adapt(&NumberAdapter, "300", TypeKey::I8), None);
        assert_eq!(adapt(&NumberAdapter, "1.5", TypeKey::F64), Some(Value::F64(1.5)));
        assert_eq!(adapt(&NumberAdapter, "1.5", TypeKey::I32), None);
    }

    #[test]
    fn test_number_rejects_partial_input() {
        assert_eq!(adapt(&NumberAdapter, "12abc", TypeKey::I64), None);
        assert_eq!(adapt(&NumberAdapter, "", TypeKey::I64), None);
        assert_eq!(adapt(&NumberAdapter, "NaN", TypeKey::F64), None);
        assert_eq!(adapt(&NumberAdapter, "inf", TypeKey::F32), None);
    }

    #[test]
    fn test_abstract_number() {
        assert_eq!(adapt(&NumberAdapter, "3", TypeKey::NUMBER), Some(Value::I64(3)));
        assert_eq!(adapt(&NumberAdapter, "3.25", TypeKey::NUMBER), Some(Value::F64(3.25)));
    }

    #[test]
    fn test_boolean_spellings() {
        for input in ["true", "YES", "y", "yeah", "1", "✔"] {
            assert_eq!(adapt(&BooleanAdapter, input, TypeKey::BOOL), Some(Value::Bool(true)), "{input}");
        }
        for input in ["false", "No", "nope", "0", "zero", "❌"] {
            assert_eq!(adapt(&BooleanAdapter, input, TypeKey::BOOL), Some(Value::Bool(false)), "{input}");
        }
        assert_eq!(adapt(&BooleanAdapter, "maybe", TypeKey::BOOL), None);
    }

    #[test]
    fn test_char_adapter() {
        assert_eq!(adapt(&CharAdapter, "x", TypeKey::CHAR), Some(Value::Char('x')));
        assert_eq!(adapt(&CharAdapter, "é", TypeKey::CHAR), Some(Value::Char('é')));
        assert_eq!(adapt(&CharAdapter, "65", TypeKey::CHAR), Some(Value::Char('A')));
        assert_eq!(adapt(&CharAdapter, "abc", TypeKey::CHAR), None);
        assert_eq!(adapt(&CharAdapter, "1000", TypeKey::CHAR), None);
        assert_eq!(adapt(&CharAdapter, "", TypeKey::CHAR), None);
    }
}
