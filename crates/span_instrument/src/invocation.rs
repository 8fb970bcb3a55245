//! Descriptions of intercepted types, methods, and individual calls.
//!
//! The call-interception facility builds one [`TypeDescriptor`] per
//! instrumented type and shares it via `Arc`; descriptor identity is the
//! allocation, not the name. Per-call state lives in [`Invocation`], which is
//! created at the call site, read by the advice, and dropped when the call
//! completes.

use crate::record::AttributeValue;
use std::sync::Arc;

/// Metadata for one instrumented type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Fully-qualified identifier, e.g. `app::orders::OrderService`.
    qualified_name: String,
    /// Enclosing module path, e.g. `app::orders`. Absent for types whose
    /// origin could not be resolved.
    module_path: Option<String>,
    /// Declared simple name. `None` for anonymous/synthetic types created
    /// ad hoc at a call site.
    simple_name: Option<String>,
    /// Stereotype markers the target selector matches on, e.g. `Service`.
    markers: Vec<String>,
}

impl TypeDescriptor {
    /// Creates a descriptor for a normal named type.
    pub fn named(module_path: impl Into<String>, simple_name: impl Into<String>) -> Self {
        let module_path = module_path.into();
        let simple_name = simple_name.into();
        let qualified_name = if module_path.is_empty() {
            simple_name.clone()
        } else {
            format!("{module_path}::{simple_name}")
        };
        Self {
            qualified_name,
            module_path: Some(module_path),
            simple_name: Some(simple_name),
            markers: Vec::new(),
        }
    }

    /// Creates a descriptor for an anonymous/synthetic type that has no
    /// declared simple name, only a qualified identifier.
    pub fn synthetic(qualified_name: impl Into<String>, module_path: Option<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            module_path,
            simple_name: None,
            markers: Vec::new(),
        }
    }

    /// Attaches stereotype markers for selector matching.
    pub fn with_markers(mut self, markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    /// Declared simple name, if the type has one.
    pub fn declared_simple_name(&self) -> Option<&str> {
        self.simple_name.as_deref()
    }

    /// Returns `true` for anonymous/synthetic types.
    pub fn is_synthetic(&self) -> bool {
        self.simple_name.is_none()
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// Method visibility as seen by the interception facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Signature-level metadata for one candidate method, consumed by the
/// target selector when deciding which methods to wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMeta {
    name: String,
    visibility: Visibility,
}

impl MethodMeta {
    pub fn new(name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// One call to a wrapped member: owner type, member name, and the runtime
/// argument values. Not retained beyond the call.
#[derive(Debug, Clone)]
pub struct Invocation {
    owner: Arc<TypeDescriptor>,
    member: Arc<str>,
    args: Vec<AttributeValue>,
}

impl Invocation {
    pub fn new(owner: Arc<TypeDescriptor>, member: impl AsRef<str>) -> Self {
        Self {
            owner,
            member: Arc::from(member.as_ref()),
            args: Vec::new(),
        }
    }

    /// Attaches the runtime argument values.
    pub fn with_args(mut self, args: Vec<AttributeValue>) -> Self {
        self.args = args;
        self
    }

    pub fn owner(&self) -> &Arc<TypeDescriptor> {
        &self.owner
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn args(&self) -> &[AttributeValue] {
        &self.args
    }
}
