#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! A pooled, blocking TCP client for the proxy's one backend operation: round-tripping a
//! complete wire message to the upstream database and back.
//!
//! # Overview
//!
//! [`BackendClient`] is a single `round_trip(bytes) -> bytes` operation over the upstream
//! database connection. [`PooledClient`] realizes it over a bounded set of already-established
//! [`std::net::TcpStream`] connections, reusing [`net::FramedConnection`]'s length-prefix framing
//! so this crate does not re-implement it.
//!
//! # Resource discipline
//!
//! A connection is checked out for the duration of one `round_trip` call and returned to the
//! pool on every exit path, including error, via an internal guard's `Drop` impl. A connection
//! that errors mid-round-trip is poisoned rather than returned, so a future checkout dials a
//! fresh replacement instead of reusing a stream left in an unknown state.

mod error;
mod pool;

pub use error::BackendError;
pub use pool::{BackendClient, PooledClient};
