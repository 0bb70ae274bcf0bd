#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Command-line flags for the `docproxyd` binary.
//!
//! The binary's `main.rs` only parses [`Args`] from `std::env::args_os()` and hands it to a
//! library-level `run()`; all flag definitions live here so they can be unit-tested without
//! spawning a process.

use clap::Parser;

/// The default address the proxy listens on when `--listen` is not given.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:33000";

/// Command-line arguments accepted by `docproxyd`.
#[derive(Debug, Parser)]
#[command(name = "docproxyd", about = "Transparent wire-protocol proxy for a document database", version)]
pub struct Args {
    /// Address to listen for client connections on.
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Address of the backend document database to proxy requests to.
    #[arg(long)]
    pub backend: String,

    /// Timeout, in seconds, for establishing and using a backend connection. Unset means no
    /// timeout (block indefinitely, matching `std::net::TcpStream`'s default).
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Maximum number of concurrent backend connections held open by the pool.
    #[arg(long, default_value_t = 16)]
    pub backend_pool_size: usize,

    /// Raises logging verbosity; repeatable (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_backend_flag() {
        let args = Args::parse_from(["docproxyd", "--backend", "127.0.0.1:27017"]);
        assert_eq!(args.backend, "127.0.0.1:27017");
        assert_eq!(args.listen, DEFAULT_LISTEN_ADDR);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.backend_pool_size, 16);
    }

    #[test]
    fn repeated_verbose_flags_accumulate() {
        let args = Args::parse_from(["docproxyd", "--backend", "db:27017", "-vvv"]);
        assert_eq!(args.verbose, 3);
    }

    #[test]
    fn missing_backend_is_a_parse_error() {
        let err = Args::try_parse_from(["docproxyd"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn connect_timeout_is_optional() {
        let args = Args::parse_from(["docproxyd", "--backend", "db:27017", "--connect-timeout", "5"]);
        assert_eq!(args.connect_timeout, Some(5));
    }
}
