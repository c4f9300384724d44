//! Reference resolution for user tokens

use crate::index::IndexLookup;
use crate::oci::reference::DEFAULT_TAG;

/// Whether a token is already a full reference rather than an index name
pub fn is_qualified(token: &str) -> bool {
    token.contains([':', '@'])
}

/// Turn a token into a reference
///
/// Qualified tokens are returned unchanged without consulting the index. Bare
/// names resolve to `registry/repository:latest` from the matching index entry,
/// or `None` when no index lists them.
pub fn resolve_reference(token: &str, index: &dyn IndexLookup) -> Option<String> {
    if is_qualified(token) {
        return Some(token.to_string());
    }

    index
        .entry_by_name(token)
        .map(|entry| format!("{}/{}:{DEFAULT_TAG}", entry.registry, entry.repository))
}
