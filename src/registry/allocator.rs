//! Document-code sequence allocation.
//!
//! The next sequence for a prefix is derived by scanning both collections and
//! taking the maximum 3-digit sequence already in use. This is a best-effort
//! read-then-decide computation: two callers allocating concurrently can
//! receive the same value, because the collections offer no reservation
//! primitive. The write path compensates by enforcing code uniqueness at
//! create time and retrying on conflict (see
//! [`Registry::create`](super::service::Registry::create)).

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{
    fields,
    store::{DocumentStore, RawItem, SourceCollection},
};

// Pattern is a literal; construction cannot fail.
static SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3})").unwrap_or_else(|e| unreachable!("invalid sequence pattern: {e}"))
});

/// An item that matched a prefix scan, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    /// Collection the item was found in.
    pub collection: SourceCollection,
    /// The item's display name.
    pub display_name: String,
    /// The code string the scan considered (metadata code or display-name
    /// fallback).
    pub code: String,
    /// The sequence number extracted from the code, if any.
    pub sequence: Option<u32>,
}

/// Allocates the next document-code sequence for a prefix.
#[derive(Debug, Clone, Copy)]
pub struct CodeAllocator<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> CodeAllocator<'a, S> {
    /// Creates an allocator over the given store.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Computes the next available sequence for `prefix`, zero-padded to 3
    /// digits.
    ///
    /// A collection that cannot be listed is logged and treated as empty, so
    /// partial availability degrades the result rather than failing it. With
    /// no matching items at all (including when both collections are
    /// unreachable), the first sequence `"001"` is returned.
    #[must_use]
    pub fn next_sequence(&self, prefix: &str) -> String {
        let max = self
            .scan(prefix)
            .iter()
            .filter_map(|m| m.sequence)
            .max()
            .unwrap_or(0);
        let next = max + 1;
        debug!(prefix, next, "allocated next sequence");
        format!("{next:03}")
    }

    /// Lists every item whose code matches `prefix`, for diagnostics.
    #[must_use]
    pub fn matching_items(&self, prefix: &str) -> Vec<PrefixMatch> {
        self.scan(prefix)
    }

    fn scan(&self, prefix: &str) -> Vec<PrefixMatch> {
        let mut matches = Vec::new();
        for collection in [SourceCollection::Published, SourceCollection::Authoring] {
            let items = match self.store.list_items(collection) {
                Ok(items) => items,
                Err(error) => {
                    // Partial availability: proceed with whatever remains.
                    warn!(%collection, %error, "collection unreachable during allocation");
                    continue;
                }
            };
            for item in items {
                let code = code_to_check(&item, prefix);
                if !code.starts_with(prefix) {
                    continue;
                }
                let sequence = extract_sequence(&code[prefix.len()..]);
                matches.push(PrefixMatch {
                    collection,
                    display_name: item.display_name,
                    code,
                    sequence,
                });
            }
        }
        matches
    }
}

/// The code string a prefix scan considers for an item: the metadata-carried
/// document code when it is non-empty and matches the prefix, otherwise the
/// display name with any trailing extension stripped.
fn code_to_check(item: &RawItem, prefix: &str) -> String {
    if let Some(code) = item.fields.get(fields::DOCUMENT_CODE)
        && !code.is_empty()
        && code.starts_with(prefix)
    {
        return code.clone();
    }
    strip_extension(&item.display_name).to_string()
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Extracts a leading run of exactly 3 digits; anything else is ignored.
fn extract_sequence(suffix: &str) -> Option<u32> {
    SEQUENCE_RE
        .captures(suffix)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
