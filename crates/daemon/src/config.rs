use std::time::Duration;

use crate::DEFAULT_LISTEN_ADDR;

/// Immutable daemon configuration, built once at startup and handed to [`crate::run`].
///
/// Kept independent of `cli::Args`'s concrete type so this crate does not need to depend on
/// the flag-parsing crate; `bin/docproxyd`'s `main.rs` is the only place that translates one
/// into the other.
#[derive(Debug, Clone)]
pub struct Config {
    listen_addr: String,
    backend_addr: String,
    connect_timeout: Option<Duration>,
    backend_pool_size: usize,
}

impl Config {
    /// Builds a configuration, defaulting an empty `listen_addr` to [`DEFAULT_LISTEN_ADDR`]
    /// and a zero `backend_pool_size` up to `1` (a pool of zero connections could never serve
    /// a request).
    pub fn new(listen_addr: impl Into<String>, backend_addr: impl Into<String>, connect_timeout: Option<Duration>, backend_pool_size: usize) -> Self {
        let listen_addr = listen_addr.into();
        Self {
            listen_addr: if listen_addr.is_empty() { DEFAULT_LISTEN_ADDR.to_string() } else { listen_addr },
            backend_addr: backend_addr.into(),
            connect_timeout,
            backend_pool_size: backend_pool_size.max(1),
        }
    }

    /// The address the proxy listens for client connections on.
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// The backend document database's address.
    pub fn backend_addr(&self) -> &str {
        &self.backend_addr
    }

    /// The connect/round-trip deadline applied to backend connections, if any.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// The maximum number of concurrent connections the backend pool holds open.
    pub fn backend_pool_size(&self) -> usize {
        self.backend_pool_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listen_addr_falls_back_to_default() {
        let config = Config::new("", "db:27017", None, 8);
        assert_eq!(config.listen_addr(), DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn zero_pool_size_is_raised_to_one() {
        let config = Config::new("0.0.0.0:33000", "db:27017", None, 0);
        assert_eq!(config.backend_pool_size(), 1);
    }
}
