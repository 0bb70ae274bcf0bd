#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Length-prefixed framing over a blocking byte stream, plus the connection handshake.
//!
//! # Overview
//!
//! [`FramedConnection`] reads and writes whole wire messages, each one a 4-byte
//! little-endian length prefix followed by that many bytes total. [`handshake`] answers the
//! client's opening `isMaster`/`ismaster` command with a canned capability document before
//! normal request handling begins.
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpStream;
//! use net::{handshake, FramedConnection};
//!
//! # fn connect() -> std::io::Result<TcpStream> { TcpStream::connect("127.0.0.1:33000") }
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = connect()?;
//! let mut conn = FramedConnection::new(stream);
//! handshake(&mut conn)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod framed;
mod handshake;

pub use error::ConnError;
pub use framed::FramedConnection;
pub use handshake::handshake;
