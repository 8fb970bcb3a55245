//! Contract for deciding which types and methods get wrapped.
//!
//! The core consumes this predicate through the interception facility's
//! bootstrap wiring and does not implement matching logic itself. A selector
//! is typically declarative (markers, visibility); a rule that cannot be
//! built is a fatal [`SelectorError`](crate::error::SelectorError) at
//! registration time and is not retried.

use crate::invocation::{MethodMeta, TypeDescriptor};

/// Predicate over candidate types and their methods.
pub trait TargetSelector: Send + Sync {
    /// Whether `candidate` should be instrumented at all, judged from its
    /// declared markers and related metadata.
    fn matches_type(&self, candidate: &TypeDescriptor) -> bool;

    /// For a matched type, whether this particular method should be wrapped,
    /// judged from its signature-level metadata (e.g. visibility).
    fn matches_method(&self, owner: &TypeDescriptor, method: &MethodMeta) -> bool;
}
