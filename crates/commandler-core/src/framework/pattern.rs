//! Shared cache of compiled regular expressions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use tracing::trace;

use crate::foundation::error::ConfigError;

/// Insert-once, read-many cache of compiled patterns.
///
/// Dispatchers populate it while they are constructed so request handling
/// only ever takes the read lock. [`Regex`] clones share their compiled
/// program, so handing out clones is cheap.
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    patterns: Arc<RwLock<HashMap<String, Regex>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled form of `pattern`, compiling it on first use.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, ConfigError> {
        if let Some(regex) = self.patterns.read().get(pattern) {
            return Ok(regex.clone());
        }

        let mut patterns = self.patterns.write();
        if let Some(regex) = patterns.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern).map_err(|e| ConfigError::pattern(pattern, e))?;
        trace!(pattern, "Compiled pattern");
        patterns.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn get(&self, pattern: &str) -> Option<Regex> {
        self.patterns.read().get(pattern).cloned()
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_once() {
        let cache = PatternCache::new();
        let first = cache.get_or_compile(r"^\d+$").unwrap();
        let second = cache.get_or_compile(r"^\d+$").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(first.as_str(), second.as_str());
        assert!(cache.get(r"^\d+$").is_some());
    }

    #[test]
    fn test_invalid_pattern() {
        let cache = PatternCache::new();
        let err = cache.get_or_compile("(").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_between_clones() {
        let cache = PatternCache::new();
        let clone = cache.clone();
        clone.get_or_compile("a+").unwrap();
        assert!(cache.get("a+").is_some());
    }
}
