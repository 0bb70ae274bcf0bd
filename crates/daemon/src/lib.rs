#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Per-connection dispatcher, cursor continuation table, and accept loop for the proxy binary.
//!
//! # Overview
//!
//! This crate ties together every other crate in the workspace into a running server:
//! [`Config`] describes how to start it, [`run`] binds the listen address, dials the backend
//! once to fail fast on a bad address, and spawns one OS thread per accepted connection running
//! [`session::run_session`]. [`CursorTable`] is the one piece of state shared across those
//! threads: a process-wide map from a live cursor id to the command that opened it, consulted
//! so a `getMore` picks up the same request/response rewriter its originating command used.
//!
//! Unlike every other crate here, this one does not blanket-deny `unsafe_code`: installing the
//! `SIGINT`/`SIGTERM` handlers in [`signal`] requires one `unsafe` call into `libc::signal`,
//! narrowly scoped and commented at the call site.

mod config;
mod cursor;
mod error;
mod server;
mod signal;

pub use config::Config;
pub use cursor::CursorTable;
pub use error::{SessionError, StartupError};
pub use server::run;

pub mod session;

/// The default address the proxy listens on when no listen address is configured.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:33000";
