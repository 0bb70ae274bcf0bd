#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Verbosity-flag-to-tracing-subscriber wiring for the proxy binary.
//!
//! The CLI exposes a single repeatable `-v`/`--verbose` flag (see `cli::Args`); this crate maps
//! the resulting count to a [`tracing_subscriber`] env-filter default, honoring `RUST_LOG` as an
//! override when the operator has set one explicitly.

use tracing_subscriber::EnvFilter;

/// The default filter directive selected by each verbosity level: `-v` raises session-granularity
/// detail, `-vv` and above raise it further, rather than a single on/off debug switch.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,docproxyd=info",
        1 => "info,docproxyd=debug",
        _ => "debug",
    }
}

/// Installs a global [`tracing`] subscriber, logging to stderr in a compact format.
///
/// `RUST_LOG`, if set, takes priority over `verbosity`; otherwise `verbosity` selects a default
/// filter directive. Returns an error if a subscriber was already installed (calling this
/// more than once per process is a bug, not a recoverable condition callers should retry).
pub fn init(verbosity: u8) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).compact().try_init()
}
