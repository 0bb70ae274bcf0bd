use thiserror::Error;

/// Errors raised while establishing or using a backend connection.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Could not establish the initial connection (or a replacement for a poisoned one) to
    /// the backend address.
    #[error("failed to connect to backend {addr}: {source}")]
    Connect {
        /// The backend address that refused the connection.
        addr: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A round trip's write or read failed, or hung up mid-frame.
    #[error(transparent)]
    RoundTrip(#[from] net::ConnError),

    /// The configured backend address string did not parse as a socket address.
    #[error("invalid backend address {0:?}")]
    InvalidAddress(String),
}
