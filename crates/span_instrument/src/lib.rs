//! Call-Interception Tracing Core
//!
//! Wraps calls to selected methods of matching types with a traceable
//! operation: decides whether to start a new traced unit, propagates a
//! causal context through the call, and records completion (success or
//! failure) when the call returns. Type/method matching, bootstrap wiring,
//! and the exporting backend are external collaborators behind narrow
//! interfaces.
//!
//! # Example
//!
//! ```
//! use span_instrument::{traced, Invocation, TypeDescriptor};
//! use std::sync::Arc;
//!
//! let service = Arc::new(
//!     TypeDescriptor::named("app::orders", "OrderService").with_markers(["Service"]),
//! );
//! let invocation = Invocation::new(Arc::clone(&service), "place");
//!
//! // No backend installed here, so the call runs untraced.
//! let confirmation = traced(&invocation, || "order-42");
//! assert_eq!(confirmation, "order-42");
//! ```
//!
//! # Guarantees
//!
//! - Failures in the tracing machinery are logged and suppressed at the
//!   advice boundary; at worst traces go missing, the wrapped call never
//!   regresses.
//! - Every started operation ends exactly once, on normal return and on
//!   error alike, and scope nesting restores the exact prior context.
//! - Name caching is weakly owned per type: caching a name never pins a
//!   type descriptor that is otherwise reclaimable.

mod advice;
mod backend;
mod cache;
mod config;
mod context;
mod error;
mod invocation;
mod naming;
mod record;
mod selector;

pub use advice::{on_enter, on_exit, traced, SpanGuard};
pub use backend::{global_backend, install_backend, NoopBackend, TracingBackend};
pub use cache::NameCache;
pub use config::{instrumenter, Instrumenter, INSTRUMENTATION_SCOPE};
pub use context::{AmbientContext, PropagationContext, ScopeHandle};
pub use error::{AdviceError, InstallError, SelectorError};
pub use invocation::{Invocation, MethodMeta, TypeDescriptor, Visibility};
pub use naming::{derive_name, simple_name};
pub use record::{
    AttributeValue, CallOutcome, CompletedOperation, OperationRecord, SpanKind, SpanStatus,
};
pub use selector::TargetSelector;
