//! Error types for the instrumentation core.
//!
//! The taxonomy matters more than the shapes: selector errors are fatal at
//! registration time, advice errors are caught and logged at the advice
//! boundary and never reach the wrapped call's caller, and errors raised by
//! the wrapped call itself are not errors of this crate at all.

use std::any::Any;
use thiserror::Error;

/// Malformed matching rules, detected at module-registration time.
/// Fatal; registration is not retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// A type matching rule could not be parsed or resolved.
    #[error("malformed type matching rule: {0}")]
    MalformedTypeRule(String),

    /// A method matching rule could not be parsed or resolved.
    #[error("malformed method matching rule: {0}")]
    MalformedMethodRule(String),
}

/// A failure inside the entry/exit advice itself. Captured at the advice
/// boundary, logged, and discarded; never unwound into caller code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdviceError {
    /// The tracing machinery panicked while wrapping a call.
    #[error("tracing advice panicked: {0}")]
    Panicked(String),
}

impl AdviceError {
    /// Builds an error from a caught panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Panicked(panic_message(payload))
    }
}

/// A second backend installation was attempted; the first one stays active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a tracing backend is already installed")]
pub struct InstallError;

/// Best-effort extraction of a panic payload's message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
