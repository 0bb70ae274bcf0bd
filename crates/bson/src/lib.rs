#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Lazy, zero-copy reading and incremental building for the binary document format carried on
//! the proxy's wire protocol.
//!
//! # Overview
//!
//! A document is a length-prefixed, self-delimiting, ordered sequence of typed, keyed
//! elements. This crate never materializes a whole document into an owned tree: [`DocIterator`]
//! walks elements lazily by offset, and [`builder::DocumentBuilder`] appends elements
//! incrementally into a growable buffer. Both borrow their input; only the builder's output is
//! owned.
//!
//! # Design
//!
//! [`Value`] borrows strings, subdocuments, and arrays straight out of the source buffer rather
//! than decoding them into owned Rust types. This keeps the rewrite engine's hot path
//! allocation-free for the common case of an element passing through unmatched.
//!
//! # Errors
//!
//! All fallible operations return [`BsonError`]. A malformed element latches the iterator:
//! once [`DocIterator::next`] returns `false` because of a decode failure, every subsequent
//! call also returns `false`, and [`DocIterator::err`] surfaces the original cause.
//!
//! # Example
//!
//! ```
//! use bson::{builder::DocumentBuilder, DocIterator};
//!
//! let mut builder = DocumentBuilder::new();
//! builder.append_string_element(b"$db", b"testdb");
//! let doc = builder.finish();
//!
//! let mut iter = DocIterator::new(&doc).unwrap();
//! assert!(iter.next());
//! assert_eq!(iter.element().unwrap().key(), b"$db");
//! assert_eq!(iter.element().unwrap().value().as_str().unwrap(), "testdb");
//! assert!(!iter.next());
//! assert!(iter.err().is_none());
//! ```

pub mod builder;
mod error;
mod iterator;
mod read;
mod value;

pub use error::BsonError;
pub use iterator::{DocIterator, Elements, MIN_DOCUMENT_SIZE};
pub use value::{Element, ElementType, Value};
