#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! A declarative, composable engine for rewriting binary documents field by field.
//!
//! # Overview
//!
//! A [`DocumentFixer`] maps keys to child [`ValueFixer`]s. Walking a document with one copies
//! every unmatched element through verbatim and invokes the registered fixer on every matched
//! key. [`ArrayFixer`] applies one inner fixer to every element of an array. Leaf behavior —
//! the actual namespace-rewriting rules in [`leaf`] — is built from plain closures wrapped in
//! [`FnFixer`], so extending the rule set never touches the tree types.
//!
//! # Invariants
//!
//! - An empty [`DocumentFixer`] is the identity: output decodes to the same elements, in the
//!   same order, as the input.
//! - The engine never mutates its source buffer.
//! - Output preserves the input's key set and key order.
//!
//! # Example
//!
//! ```
//! use bson::builder::DocumentBuilder;
//! use rewrite::leaf::default_request_fixer;
//!
//! let mut doc = DocumentBuilder::new();
//! doc.append_string_element(b"$db", b"testdb");
//! let doc = doc.finish();
//!
//! let fixed = default_request_fixer().fix(&doc).unwrap();
//! ```

mod error;
mod fixer;
pub mod leaf;

pub use error::FixError;
pub use fixer::{ArrayFixer, DocumentFixer, FnFixer, ValueFixer};
