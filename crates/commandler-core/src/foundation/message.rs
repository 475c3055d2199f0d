//! Message key resolution.
//!
//! Aliases, names and rendered diagnostics may be message keys rather than
//! literal text. A [`MessageResolver`] turns a key into display text; the
//! catalog behind it is up to the application.

use std::collections::HashMap;
use std::fmt::Debug;

/// Resolves a message key into display text.
pub trait MessageResolver: Debug + Send + Sync + 'static {
    /// Returns the text for `key`, or the key itself when it is unknown.
    fn resolve(&self, key: &str) -> String;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl MessageResolver for IdentityResolver {
    fn resolve(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Resolves keys from an in-memory catalog, falling back to the key.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    messages: HashMap<String, String>,
}

impl MapResolver {
    pub fn new(messages: HashMap<String, String>) -> Self {
        Self { messages }
    }

    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(key.into(), text.into());
        self
    }
}

impl MessageResolver for MapResolver {
    fn resolve(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_resolver_falls_back_to_key() {
        let resolver = MapResolver::default().with("alias.math", "calc");
        assert_eq!(resolver.resolve("alias.math"), "calc");
        assert_eq!(resolver.resolve("missing"), "missing");
        assert_eq!(IdentityResolver.resolve("x"), "x");
    }
}
