#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Maps a command name to the pair of rewriters that govern its request and response.
//!
//! # Overview
//!
//! A [`FixerRegistry`] is built once at startup and never mutated again, so lookups from the
//! per-connection request loop need no synchronization. Every command starts from a
//! process-wide default fixer set (`$db` rewriting on requests, `writeErrors` scrubbing on
//! responses); [`FixerRegistry::new`] seeds per-key overlays for the handful of commands whose
//! responses carry an additional namespace.
//!
//! # Example
//!
//! ```
//! use registry::FixerRegistry;
//!
//! let registry = FixerRegistry::new();
//! let default_set = registry.lookup("find");
//! ```

use std::collections::HashMap;

use rewrite::leaf::{
    cursor_response_fixer, default_request_fixer, default_response_fixer,
    list_collections_batch_fixer, list_indexes_batch_fixer,
};
use rewrite::DocumentFixer;

/// The request and response rewriters registered for one command.
#[derive(Clone)]
pub struct FixerSet {
    request: DocumentFixer,
    response: DocumentFixer,
}

impl FixerSet {
    /// The fixer applied to the outbound request before it reaches the backend.
    pub fn request(&self) -> &DocumentFixer {
        &self.request
    }

    /// The fixer applied to the inbound response before it reaches the client.
    pub fn response(&self) -> &DocumentFixer {
        &self.response
    }
}

/// An immutable table mapping command name to [`FixerSet`].
///
/// Built once via [`FixerRegistry::new`]; [`FixerRegistry::lookup`] falls back to the default
/// fixer set for any command name that was not explicitly seeded.
pub struct FixerRegistry {
    fixers: HashMap<&'static str, FixerSet>,
    default: FixerSet,
}

impl FixerRegistry {
    /// Builds the registry, seeding the cursor-response overlays for `listCollections`,
    /// `listIndexes`, and `find`.
    pub fn new() -> Self {
        let default = FixerSet {
            request: default_request_fixer(),
            response: default_response_fixer(),
        };

        let mut fixers = HashMap::new();
        fixers.insert(
            "listCollections",
            default.overlay_response(cursor_response_fixer(Some(list_collections_batch_fixer()))),
        );
        fixers.insert(
            "listIndexes",
            default.overlay_response(cursor_response_fixer(Some(list_indexes_batch_fixer()))),
        );
        fixers.insert("find", default.overlay_response(cursor_response_fixer(None)));

        Self { fixers, default }
    }

    /// Returns the [`FixerSet`] registered for `command_name`, or the process-wide default if
    /// none was registered.
    pub fn lookup(&self, command_name: &str) -> &FixerSet {
        self.fixers.get(command_name).unwrap_or(&self.default)
    }
}

impl Default for FixerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FixerSet {
    /// Builds a new `FixerSet` that keeps this one's request fixer and overlays `response` on
    /// top of it. The response overlay here is already the command-specific response fixer in
    /// full (built from [`cursor_response_fixer`]), matching the registrations in the original
    /// command-attachment table, which never overlay the request side for cursor-returning
    /// commands.
    fn overlay_response(&self, response: DocumentFixer) -> Self {
        Self {
            request: self.request.clone(),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::builder::DocumentBuilder;
    use bson::DocIterator;

    #[test]
    fn unknown_command_gets_default_fixer_set() {
        let registry = FixerRegistry::new();
        let set = registry.lookup("ping");

        let mut doc = DocumentBuilder::new();
        doc.append_string_element(b"$db", b"testdb");
        let doc = doc.finish();

        let fixed = set.request().fix(&doc).unwrap();
        let mut iter = DocIterator::new(&fixed).unwrap();
        assert!(iter.next());
        assert_eq!(iter.element().unwrap().value().as_str().unwrap(), "fixedtestdb");
    }

    #[test]
    fn find_response_fixer_rewrites_cursor_ns() {
        let registry = FixerRegistry::new();
        let set = registry.lookup("find");

        let mut cursor = DocumentBuilder::new();
        cursor.append_string_element(b"ns", b"fixedtestdb.c");
        cursor.append_int64_element(b"id", 0);
        let cursor = cursor.finish();

        let mut doc = DocumentBuilder::new();
        doc.append_document_element(b"cursor", &cursor);
        let doc = doc.finish();

        let fixed = set.response().fix(&doc).unwrap();
        let mut iter = DocIterator::new(&fixed).unwrap();
        assert!(iter.next());
        let cursor_bytes = iter.element().unwrap().value().as_document().unwrap();
        let mut cursor_iter = DocIterator::new(cursor_bytes).unwrap();
        assert!(cursor_iter.next());
        assert_eq!(cursor_iter.element().unwrap().key(), b"ns");
        assert_eq!(cursor_iter.element().unwrap().value().as_str().unwrap(), "testdb.c");
    }
}
