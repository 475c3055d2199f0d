//! Request headers.
//!
//! Header binders attach transport metadata to a [`Request`] before it is
//! dispatched, so that prefixes like `${guild-prefix:!}` and default
//! expressions like `${event.header.lang}` can read it.

use std::fmt;
use std::sync::Arc;

use commandler_core::{ConfigError, Request};
use tracing::trace;

/// Adds headers to a request.
pub trait HeaderBinder: Send + Sync + 'static {
    /// Sets headers on `request`. Headers are write-once; use
    /// [`Request::set_header`] and propagate its error.
    fn bind(&self, request: &mut Request) -> Result<(), ConfigError>;
}

impl<F> HeaderBinder for F
where
    F: Fn(&mut Request) -> Result<(), ConfigError> + Send + Sync + 'static,
{
    fn bind(&self, request: &mut Request) -> Result<(), ConfigError> {
        self(request)
    }
}

/// Sets the same header on every request.
#[derive(Debug, Clone)]
pub struct StaticHeader {
    key: String,
    value: String,
}

impl StaticHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl HeaderBinder for StaticHeader {
    fn bind(&self, request: &mut Request) -> Result<(), ConfigError> {
        request.set_header(self.key.clone(), self.value.clone())
    }
}

/// Runs every registered [`HeaderBinder`] in order.
#[derive(Default, Clone)]
pub struct HeaderManager {
    binders: Vec<Arc<dyn HeaderBinder>>,
}

impl HeaderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binder: impl HeaderBinder) {
        self.binders.push(Arc::new(binder));
    }

    /// Adds a binder (builder pattern).
    pub fn with(mut self, binder: impl HeaderBinder) -> Self {
        self.add(binder);
        self
    }

    pub fn len(&self) -> usize {
        self.binders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    /// Applies all binders to `request`, stopping at the first failure.
    pub fn apply(&self, request: &mut Request) -> Result<(), ConfigError> {
        for binder in &self.binders {
            binder.bind(request)?;
        }
        trace!(headers = request.headers().len(), "Bound request headers");
        Ok(())
    }
}

impl fmt::Debug for HeaderManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderManager")
            .field("binders", &self.binders.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binders_run_in_order() {
        let manager = HeaderManager::new()
            .with(StaticHeader::new("prefix", "!"))
            .with(|request: &mut Request| {
                let upper = request.content().to_uppercase();
                request.set_header("shout", upper)
            });

        let mut request = Request::new("test", "1", "hi");
        manager.apply(&mut request).unwrap();
        assert_eq!(request.header("prefix"), Some("!"));
        assert_eq!(request.header("shout"), Some("HI"));
    }

    #[test]
    fn test_conflicting_binders_fail() {
        let manager = HeaderManager::new()
            .with(StaticHeader::new("lang", "en"))
            .with(StaticHeader::new("lang", "fr"));

        let mut request = Request::new("test", "1", "hi");
        let err = manager.apply(&mut request).unwrap_err();
        assert!(matches!(err, ConfigError::HeaderConflict { key } if key == "lang"));
        assert_eq!(request.header("lang"), Some("en"));
    }
}
