use std::collections::HashMap;

use crate::foundation::metadata::{TypeKey, alias_eq};
use crate::foundation::value::Value;
use crate::framework::adapter::{AdaptContext, Adapter};

/// One variant of a user enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    name: String,
    values: Vec<String>,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// An additional spelling users may type for this variant.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, normalized: &str, input: &str) -> bool {
        normalize(&self.name.replace('_', "")) == normalized
            || self.values.iter().any(|v| alias_eq(v, input))
    }
}

fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Adapts input to variants of registered enumerations.
///
/// A variant matches when its name, lowercased and without underscores,
/// equals the input lowercased and without spaces, so `DARK_RED` accepts
/// `dark red` and `darkred`. Extra values added with [`EnumVariant::value`]
/// match ignoring case.
#[derive(Debug, Clone, Default)]
pub struct EnumAdapter {
    enums: HashMap<TypeKey, Vec<EnumVariant>>,
}

impl EnumAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the variants of enumeration `key`.
    pub fn with(mut self, key: TypeKey, variants: impl IntoIterator<Item = EnumVariant>) -> Self {
        self.enums.insert(key, variants.into_iter().collect());
        self
    }

    /// Type keys of every declared enumeration, for registration.
    pub fn types(&self) -> Vec<TypeKey> {
        self.enums.keys().copied().collect()
    }
}

impl Adapter for EnumAdapter {
    fn adapt(&self, input: &str, ctx: &AdaptContext<'_>) -> Option<Value> {
        let target = ctx.target();
        let normalized = normalize(input);
        self.enums
            .get(&target)?
            .iter()
            .find(|variant| variant.matches(&normalized, input))
            .map(|variant| Value::Enum {
                type_key: target,
                variant: variant.name.clone(),
            })
    }
}
