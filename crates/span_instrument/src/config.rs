//! Instrumenter configuration: one process-wide binding of naming strategy,
//! kind classification, and backend handle.

use crate::backend::{global_backend, TracingBackend};
use crate::cache::NameCache;
use crate::context::PropagationContext;
use crate::invocation::Invocation;
use crate::record::{CallOutcome, OperationRecord, SpanKind};
use std::sync::{Arc, OnceLock};

/// Instrumentation scope name identifying this instrumentation to backends.
pub const INSTRUMENTATION_SCOPE: &str = "span_instrument.stereotype-calls";

/// Binds the span lifecycle to a naming strategy, a kind classifier, and the
/// external tracing backend. Immutable after construction.
pub struct Instrumenter {
    names: NameCache,
    kind: SpanKind,
    backend: Arc<dyn TracingBackend>,
}

impl Instrumenter {
    /// Builds an instrumenter against an explicit backend. The process-wide
    /// instance is built against the globally installed backend instead; see
    /// [`instrumenter`].
    pub fn with_backend(backend: Arc<dyn TracingBackend>) -> Self {
        Self {
            names: NameCache::new(),
            // Intercepted calls are always in-process work units.
            kind: SpanKind::Internal,
            backend,
        }
    }

    fn from_global() -> Self {
        Self::with_backend(global_backend())
    }

    /// Asks the backend whether a new traced unit should start.
    pub fn should_start(&self, parent: &PropagationContext, invocation: &Invocation) -> bool {
        self.backend.should_start(parent, invocation)
    }

    /// Starts a traced operation for `invocation`, naming it via the cache.
    pub fn start(&self, parent: &PropagationContext, invocation: &Invocation) -> OperationRecord {
        let name = self.span_name(invocation);
        self.backend.start(parent, invocation, name, self.kind)
    }

    /// Ends a started operation with the wrapped call's outcome.
    pub fn end(&self, record: OperationRecord, invocation: &Invocation, outcome: CallOutcome) {
        self.backend.end(record, invocation, outcome);
    }

    /// Derived operation name for `invocation`; cached per owner type.
    /// Arguments are not part of the name. Usable by any attribute-extraction
    /// logic the backend attaches.
    pub fn span_name(&self, invocation: &Invocation) -> String {
        self.names.name_for(invocation.owner(), invocation.member())
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// Scope name backends attach to operations started by this instrumenter.
    pub fn scope_name(&self) -> &'static str {
        INSTRUMENTATION_SCOPE
    }
}

static INSTANCE: OnceLock<Instrumenter> = OnceLock::new();

/// The process-wide instrumenter, constructed on first use against the
/// globally installed backend. Concurrent first use constructs exactly one
/// instance.
pub fn instrumenter() -> &'static Instrumenter {
    INSTANCE.get_or_init(Instrumenter::from_global)
}
