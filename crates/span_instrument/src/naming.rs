//! Pure derivation of human-readable operation names.
//!
//! Anonymous/synthetic types are named based on their enclosing scope: the
//! module prefix is stripped from the qualified identifier and the remainder
//! is kept verbatim. Both functions are total; malformed metadata degrades to
//! the least specific correct answer instead of failing.
//!
//! Results are cached by [`crate::cache::NameCache`]; there is no cache here.

use crate::invocation::TypeDescriptor;

/// Returns a simple type name for use in span names and attributes.
pub fn simple_name(owner: &TypeDescriptor) -> String {
    if let Some(declared) = owner.declared_simple_name() {
        return declared.to_string();
    }
    let qualified = owner.qualified_name();
    if let Some(module) = owner.module_path() {
        if !module.is_empty() {
            if let Some(local) = qualified
                .strip_prefix(module)
                .and_then(|rest| rest.strip_prefix("::"))
            {
                if !local.is_empty() {
                    return local.to_string();
                }
            }
        }
    }
    // No module information, or the module path is not actually a prefix of
    // the qualified identifier: fall back to the unstripped identifier.
    qualified.to_string()
}

/// Derives the operation name for a member of `owner`:
/// `simple_name(owner) + "." + member`. Arguments are not part of the name.
pub fn derive_name(owner: &TypeDescriptor, member: &str) -> String {
    format!("{}.{member}", simple_name(owner))
}
