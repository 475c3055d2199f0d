//! Framework layer - resolution pipeline.
//!
//! This module turns requests into typed invocations:
//! - Tokenizer splitting parameter text into groups
//! - Dispatchers resolving controllers and commands
//! - Type adapters and their registry
//! - Default-value expressions
//! - The parameter binder producing [`Args`]
//! - The action cache and shared pattern cache

pub mod adapter;
pub mod adapters;
pub mod binder;
pub mod cache;
pub mod dispatcher;
pub mod expression;
pub mod pattern;
pub mod tokenizer;

pub use adapter::{AdaptContext, Adapter, AdapterRegistry};
pub use adapters::{
    BooleanAdapter, CharAdapter, DurationAdapter, EnumAdapter, EnumVariant, NumberAdapter,
    StringAdapter, TimeUnitAdapter,
};
pub use binder::{Args, BoundArg, ParameterBinder};
pub use cache::{ActionCache, MemoryActionCache};
pub use dispatcher::{
    Dispatcher, DispatcherManager, MatchDispatcher, Prefix, StandardDispatcher,
    StandardDispatcherConfig,
};
pub use expression::{EventScope, Variables, evaluate};
pub use pattern::PatternCache;
pub use tokenizer::tokenize;
