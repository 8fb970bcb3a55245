//! In-flight and completed representations of one traced operation.

use crate::context::PropagationContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Attribute value types for span metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Span kind according to OpenTelemetry specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    /// Internal operation span
    Internal,
    /// Server-side RPC span
    Server,
    /// Client-side RPC span
    Client,
    /// Producer span (messaging)
    Producer,
    /// Consumer span (messaging)
    Consumer,
}

/// Span execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    /// Span completed successfully
    Ok,
    /// Span completed with error
    Error,
    /// Span status unknown
    Unset,
}

/// Outcome of the wrapped call, as reported by the interception facility at
/// the exit point.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Normal return, optionally carrying a representation of the value.
    Success(Option<AttributeValue>),
    /// The wrapped call raised; the message is recorded, the error itself is
    /// re-raised unchanged to the original caller.
    Error(String),
}

impl CallOutcome {
    pub fn status(&self) -> SpanStatus {
        match self {
            Self::Success(_) => SpanStatus::Ok,
            Self::Error(_) => SpanStatus::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// The in-flight record of one started traced operation. Owns the start time
/// and its own propagation context; receives the outcome exactly once,
/// because [`OperationRecord::complete`] and `TracingBackend::end` take it by
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    context: PropagationContext,
    parent: PropagationContext,
    name: String,
    kind: SpanKind,
    start_time: u64,
    attributes: HashMap<String, AttributeValue>,
}

impl OperationRecord {
    /// Starts a record under `parent`: a fresh span id, the parent's trace id
    /// (or a fresh trace id at a root context), and the current time.
    pub fn begin(parent: PropagationContext, name: impl Into<String>, kind: SpanKind) -> Self {
        let trace_id = if parent.is_root() {
            rand::random()
        } else {
            parent.trace_id()
        };
        // Span id zero is reserved for the root context.
        let span_id = loop {
            let id: u64 = rand::random();
            if id != 0 {
                break id;
            }
        };
        Self {
            context: PropagationContext::for_unit(trace_id, span_id),
            parent,
            name: name.into(),
            kind,
            start_time: unix_nanos(),
            attributes: HashMap::new(),
        }
    }

    /// The context that has this record as its current unit.
    pub fn context(&self) -> PropagationContext {
        self.context
    }

    pub fn parent(&self) -> PropagationContext {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// Start time in Unix nanoseconds.
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Adds an attribute to the record.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    /// Ends the record with the given outcome, producing the exportable form.
    /// Consumes the record; a second end is unrepresentable.
    pub fn complete(self, outcome: &CallOutcome) -> CompletedOperation {
        let mut attributes = self.attributes;
        match outcome {
            CallOutcome::Success(Some(value)) => {
                attributes.insert("call.result".to_string(), value.clone());
            }
            CallOutcome::Success(None) => {}
            CallOutcome::Error(message) => {
                attributes.insert(
                    "error.message".to_string(),
                    AttributeValue::String(message.clone()),
                );
            }
        }
        CompletedOperation {
            trace_id: self.context.trace_id(),
            span_id: self.context.span_id(),
            parent_span_id: self.parent.span_id(),
            name: self.name,
            kind: self.kind,
            status: outcome.status(),
            start_time: self.start_time,
            end_time: unix_nanos(),
            attributes,
        }
    }
}

/// A finished traced operation, ready for export by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOperation {
    /// Unique trace identifier (128-bit)
    pub trace_id: u128,
    /// Unique span identifier (64-bit)
    pub span_id: u64,
    /// Parent span identifier (0 if root span)
    pub parent_span_id: u64,
    /// Operation name
    pub name: String,
    /// Span kind
    pub kind: SpanKind,
    /// Span status
    pub status: SpanStatus,
    /// Start time (Unix nanoseconds)
    pub start_time: u64,
    /// End time (Unix nanoseconds)
    pub end_time: u64,
    /// Span attributes
    pub attributes: HashMap<String, AttributeValue>,
}

impl CompletedOperation {
    /// Duration of the operation in nanoseconds
    pub fn duration_nanos(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64)
}
