use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use backend::PooledClient;
use registry::FixerRegistry;

use crate::config::Config;
use crate::cursor::CursorTable;
use crate::error::StartupError;
use crate::{session, signal};

/// How long `accept` blocks, via the non-blocking listener's poll interval, before the loop
/// rechecks for a shutdown request.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Binds `config.listen_addr()`, dials the backend once to fail fast on a bad address, and
/// serves connections — one OS thread per connection — until `SIGINT` or `SIGTERM` is received.
/// Returns once every in-flight session has finished.
pub fn run(config: Config) -> Result<(), StartupError> {
    let backend = PooledClient::connect(config.backend_addr(), config.backend_pool_size(), config.connect_timeout())?;
    let listener = TcpListener::bind(config.listen_addr())?;
    listener.set_nonblocking(true)?;
    tracing::info!(listen = config.listen_addr(), backend = config.backend_addr(), "docproxyd listening");

    signal::install();

    let registry = Arc::new(FixerRegistry::new());
    let cursor_table = Arc::new(CursorTable::new());
    let backend = Arc::new(backend);
    let next_session_id = AtomicU64::new(0);
    let mut sessions: Vec<JoinHandle<()>> = Vec::new();

    loop {
        if signal::shutdown_requested() {
            tracing::info!(in_flight = sessions.len(), "shutdown requested, draining in-flight sessions");
            break;
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(err) = stream.set_nodelay(true) {
                    tracing::warn!(error = %err, %peer, "failed to set TCP_NODELAY, continuing anyway");
                }
                let session_id = next_session_id.fetch_add(1, Ordering::Relaxed);
                let registry = Arc::clone(&registry);
                let cursor_table = Arc::clone(&cursor_table);
                let backend = Arc::clone(&backend);
                tracing::info!(session_id, %peer, "accepted connection");
                sessions.push(std::thread::spawn(move || {
                    session::run_session(stream, &registry, &cursor_table, backend.as_ref(), session_id);
                }));
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => std::thread::sleep(ACCEPT_POLL_INTERVAL),
            Err(err) => tracing::warn!(error = %err, "accept failed, continuing"),
        }

        sessions.retain(|handle| !handle.is_finished());
    }

    for handle in sessions {
        let _ = handle.join();
    }
    Ok(())
}
