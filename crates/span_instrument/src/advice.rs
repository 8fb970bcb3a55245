//! Entry/exit advice wrapping each intercepted call.
//!
//! Per-invocation state machine: `NOT_STARTED -> STARTED -> ENDED`, or
//! `NOT_STARTED -> SKIPPED`. [`SpanGuard`] is the state: `Started` carries
//! the record and the open scope, and [`on_exit`] consumes the guard, so
//! there is exactly one exit per entry and a second end is unrepresentable.
//!
//! Failures of the tracing machinery itself are caught at this boundary,
//! logged, and discarded. The wrapped call must proceed (and its own panic
//! must propagate unchanged) no matter what the advice does.

use crate::config::instrumenter;
use crate::context::{AmbientContext, ScopeHandle};
use crate::error::{panic_message, AdviceError};
use crate::invocation::Invocation;
use crate::record::{CallOutcome, OperationRecord};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};

/// Per-invocation lifecycle state, handed from the entry point to the
/// matching exit point of the same frame. Never shared across threads.
#[must_use = "the guard must be passed to on_exit by the matching exit point"]
#[derive(Debug)]
pub enum SpanGuard {
    /// The backend declined to start; the exit point does nothing.
    Skipped,
    /// A traced unit is in flight.
    Started {
        record: OperationRecord,
        scope: ScopeHandle,
    },
}

impl SpanGuard {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// Entry advice. Reads the ambient context, asks the instrumenter whether a
/// new unit should start, and if so starts the record and makes its context
/// ambient. Never panics into the caller.
pub fn on_enter(invocation: &Invocation) -> SpanGuard {
    match catch_unwind(AssertUnwindSafe(|| enter(invocation))) {
        Ok(guard) => guard,
        Err(payload) => {
            suppress(&AdviceError::from_panic(payload.as_ref()));
            SpanGuard::Skipped
        }
    }
}

/// Exit advice. Runs exactly once per entry, on normal return and on error
/// alike: closes the scope first (restoring the prior ambient context), then
/// ends the record with the outcome. Never panics into the caller.
pub fn on_exit(guard: SpanGuard, invocation: &Invocation, outcome: CallOutcome) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(move || exit(guard, invocation, outcome))) {
        suppress(&AdviceError::from_panic(payload.as_ref()));
    }
}

/// Brackets `call` with [`on_enter`]/[`on_exit`]. A panic of the wrapped
/// call is recorded as the outcome and resumed unchanged.
pub fn traced<F, R>(invocation: &Invocation, call: F) -> R
where
    F: FnOnce() -> R,
{
    let guard = on_enter(invocation);
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => {
            on_exit(guard, invocation, CallOutcome::Success(None));
            value
        }
        Err(payload) => {
            on_exit(
                guard,
                invocation,
                CallOutcome::Error(panic_message(payload.as_ref())),
            );
            resume_unwind(payload)
        }
    }
}

fn enter(invocation: &Invocation) -> SpanGuard {
    let instrumenter = instrumenter();
    let parent = AmbientContext::current();
    if !instrumenter.should_start(&parent, invocation) {
        return SpanGuard::Skipped;
    }
    let record = instrumenter.start(&parent, invocation);
    let scope = AmbientContext::make_current(record.context());
    SpanGuard::Started { record, scope }
}

fn exit(guard: SpanGuard, invocation: &Invocation, outcome: CallOutcome) {
    if let SpanGuard::Started { record, scope } = guard {
        scope.close();
        instrumenter().end(record, invocation, outcome);
    }
}

fn suppress(error: &AdviceError) {
    log::error!("suppressed failure in tracing advice: {error}");
}
