//! Causal propagation context and its ambient, thread-local access.
//!
//! [`PropagationContext`] is an opaque value token: immutable once obtained,
//! replaced (not mutated) when a new traced unit starts. The ambient slot is
//! thread-local; true thread-local access is reserved for the outermost
//! interception boundary, while everything below it passes the context
//! explicitly.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::marker::PhantomData;

/// The current unit of causally-ordered tracing state.
///
/// `trace_id`/`span_id` of zero mean "no active unit" (the root context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationContext {
    trace_id: u128,
    span_id: u64,
}

impl PropagationContext {
    /// The empty context: no traced unit is active.
    pub const fn root() -> Self {
        Self {
            trace_id: 0,
            span_id: 0,
        }
    }

    /// Context with the given unit as current.
    pub const fn for_unit(trace_id: u128, span_id: u64) -> Self {
        Self { trace_id, span_id }
    }

    pub fn is_root(&self) -> bool {
        self.span_id == 0
    }

    pub fn trace_id(&self) -> u128 {
        self.trace_id
    }

    pub fn span_id(&self) -> u64 {
        self.span_id
    }
}

impl Default for PropagationContext {
    fn default() -> Self {
        Self::root()
    }
}

thread_local! {
    static CURRENT: Cell<PropagationContext> = const { Cell::new(PropagationContext::root()) };
}

/// Ambient access to the current [`PropagationContext`].
pub struct AmbientContext;

impl AmbientContext {
    /// Returns the context currently ambient on this thread.
    pub fn current() -> PropagationContext {
        CURRENT.with(Cell::get)
    }

    /// Makes `context` ambient until the returned handle is closed. Handles
    /// nest LIFO; closing restores the exact prior context, never a stale or
    /// unrelated one.
    #[must_use = "dropping the handle immediately restores the prior context"]
    pub fn make_current(context: PropagationContext) -> ScopeHandle {
        let previous = CURRENT.with(|current| current.replace(context));
        ScopeHandle {
            previous,
            restored: false,
            _not_send: PhantomData,
        }
    }
}

/// Ownership of "context X is ambient for the duration of this invocation".
///
/// Closed exactly once: `close` consumes the handle, and `Drop` restores on
/// early exits so the prior context can never leak past the frame that
/// replaced it. The handle is `!Send`; ambient state is per-thread.
#[derive(Debug)]
pub struct ScopeHandle {
    previous: PropagationContext,
    restored: bool,
    _not_send: PhantomData<*const ()>,
}

impl ScopeHandle {
    /// Restores the context that was ambient before this handle was opened.
    pub fn close(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if !self.restored {
            self.restored = true;
            CURRENT.with(|current| current.set(self.previous));
        }
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        self.restore();
    }
}
