//! The tracing backend contract and the process-wide provider.
//!
//! The backend owns exporting/storing completed spans; this crate only
//! drives it. Backend calls sit on the advice fast path and are expected to
//! be cheap; making them cheap (batching, buffering) is the backend's job.

use crate::context::PropagationContext;
use crate::error::InstallError;
use crate::invocation::Invocation;
use crate::record::{CallOutcome, OperationRecord, SpanKind};
use std::sync::{Arc, OnceLock};

/// External tracing backend driven by the span lifecycle advice.
pub trait TracingBackend: Send + Sync {
    /// Whether a new traced unit should start for this invocation under the
    /// given ambient context. The advice obeys the boolean; the policy
    /// (e.g. suppressing nested duplicate wrapping) lives here.
    fn should_start(&self, parent: &PropagationContext, invocation: &Invocation) -> bool;

    /// Starts a traced operation. `name` and `kind` come from the
    /// instrumenter's naming and classification strategies.
    fn start(
        &self,
        parent: &PropagationContext,
        invocation: &Invocation,
        name: String,
        kind: SpanKind,
    ) -> OperationRecord;

    /// Ends a started operation with the wrapped call's outcome. Takes the
    /// record by value; ending twice is unrepresentable.
    fn end(&self, record: OperationRecord, invocation: &Invocation, outcome: CallOutcome);
}

/// Backend that traces nothing. Used when no backend has been installed.
pub struct NoopBackend;

impl TracingBackend for NoopBackend {
    fn should_start(&self, _parent: &PropagationContext, _invocation: &Invocation) -> bool {
        false
    }

    fn start(
        &self,
        parent: &PropagationContext,
        _invocation: &Invocation,
        name: String,
        kind: SpanKind,
    ) -> OperationRecord {
        OperationRecord::begin(*parent, name, kind)
    }

    fn end(&self, _record: OperationRecord, _invocation: &Invocation, _outcome: CallOutcome) {}
}

static GLOBAL_BACKEND: OnceLock<Arc<dyn TracingBackend>> = OnceLock::new();

/// Installs the process-wide tracing backend. Must happen before the
/// instrumenter is first constructed; safe to call concurrently, exactly one
/// caller wins.
pub fn install_backend(backend: Arc<dyn TracingBackend>) -> Result<(), InstallError> {
    GLOBAL_BACKEND.set(backend).map_err(|_| InstallError)
}

/// Returns the installed backend, or [`NoopBackend`] if none was installed.
pub fn global_backend() -> Arc<dyn TracingBackend> {
    GLOBAL_BACKEND
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(NoopBackend))
}
