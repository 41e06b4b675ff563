//! Type aliases for commonly used complex types.
//!
//! `Arc<dyn Fn(T) + Send + Sync>` is hard to read at a glance; the alias
//! names the intent and keeps the same pattern in every crate.

use std::sync::Arc;

/// A cloneable callback that receives a single parameter.
///
/// Used where one registered callback is invoked from a task that may
/// outlive the registration call.
pub type SharedDataCallback<T> = Arc<dyn Fn(T) + Send + Sync>;
