use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use net::FramedConnection;

use crate::error::BackendError;

/// A pooled client's single operation: hand over a complete request, get back a complete
/// response.
pub trait BackendClient: Send + Sync {
    /// Sends `request` (a complete, framed wire message) to the backend and returns its
    /// response, also a complete framed wire message.
    fn round_trip(&self, request: &[u8]) -> Result<Vec<u8>, BackendError>;
}

struct PoolState {
    idle: Vec<TcpStream>,
    outstanding: usize,
}

struct Inner {
    addr: String,
    connect_timeout: Option<Duration>,
    capacity: usize,
    state: Mutex<PoolState>,
    became_idle: Condvar,
}

/// A bounded pool of established TCP connections to the backend database.
///
/// Connections are checked out for the duration of one [`BackendClient::round_trip`] call and
/// returned on every exit path, including error, via [`PooledConnection`]'s `Drop`
/// implementation. When the pool is exhausted, `round_trip` blocks on a [`Condvar`] until a
/// connection is returned rather than opening unbounded extra connections to the backend.
pub struct PooledClient {
    inner: Arc<Inner>,
}

impl PooledClient {
    /// Connects once to `addr` to fail fast if no backend is reachable, then returns a pool
    /// with room for up to `capacity` concurrent round trips (including the connection just
    /// made).
    pub fn connect(addr: impl Into<String>, capacity: usize, connect_timeout: Option<Duration>) -> Result<Self, BackendError> {
        let addr = addr.into();
        let first = dial(&addr, connect_timeout)?;
        let inner = Arc::new(Inner {
            addr,
            connect_timeout,
            capacity: capacity.max(1),
            state: Mutex::new(PoolState {
                idle: vec![first],
                outstanding: 0,
            }),
            became_idle: Condvar::new(),
        });
        Ok(Self { inner })
    }

    fn checkout(&self) -> Result<PooledConnection<'_>, BackendError> {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        loop {
            if let Some(stream) = state.idle.pop() {
                state.outstanding += 1;
                return Ok(PooledConnection {
                    pool: &self.inner,
                    conn: Some(FramedConnection::new(stream)),
                    poisoned: false,
                });
            }
            if state.outstanding < self.inner.capacity {
                state.outstanding += 1;
                drop(state);
                return match dial(&self.inner.addr, self.inner.connect_timeout) {
                    Ok(stream) => Ok(PooledConnection {
                        pool: &self.inner,
                        conn: Some(FramedConnection::new(stream)),
                        poisoned: false,
                    }),
                    Err(err) => {
                        // Connecting failed; undo the reservation so a later caller isn't
                        // permanently short one slot.
                        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
                        state.outstanding -= 1;
                        self.inner.became_idle.notify_one();
                        Err(err)
                    }
                };
            }
            state = self.inner.became_idle.wait(state).expect("pool mutex poisoned");
        }
    }
}

impl BackendClient for PooledClient {
    fn round_trip(&self, request: &[u8]) -> Result<Vec<u8>, BackendError> {
        let mut guard = self.checkout()?;
        if let Err(err) = guard.conn().write_wire_message(request) {
            guard.poison();
            return Err(err.into());
        }
        match guard.conn().read_wire_message() {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(err) => {
                guard.poison();
                Err(err.into())
            }
        }
    }
}

fn dial(addr: &str, timeout: Option<Duration>) -> Result<TcpStream, BackendError> {
    let socket_addr = addr
        .to_socket_addrs()
        .map_err(|_| BackendError::InvalidAddress(addr.to_string()))?
        .next()
        .ok_or_else(|| BackendError::InvalidAddress(addr.to_string()))?;

    let stream = match timeout {
        Some(timeout) => TcpStream::connect_timeout(&socket_addr, timeout),
        None => TcpStream::connect(socket_addr),
    }
    .map_err(|source| BackendError::Connect { addr: addr.to_string(), source })?;

    stream.set_read_timeout(timeout).map_err(|source| BackendError::Connect { addr: addr.to_string(), source })?;
    stream.set_write_timeout(timeout).map_err(|source| BackendError::Connect { addr: addr.to_string(), source })?;
    stream.set_nodelay(true).map_err(|source| BackendError::Connect { addr: addr.to_string(), source })?;

    tracing::debug!(backend = addr, "dialed backend connection");
    Ok(stream)
}

/// A connection checked out of a [`PooledClient`] for one round trip. Returned to the pool
/// (or, if [`PooledConnection::poison`] was called, dropped and not replaced until demand
/// creates a fresh one) when this guard is dropped.
struct PooledConnection<'a> {
    pool: &'a Inner,
    conn: Option<FramedConnection<TcpStream>>,
    poisoned: bool,
}

impl PooledConnection<'_> {
    fn conn(&mut self) -> &mut FramedConnection<TcpStream> {
        self.conn.as_mut().expect("conn only taken in Drop")
    }

    /// Marks this connection as left in an unknown state by a failed write or read, so `Drop`
    /// does not hand it back to a future round trip.
    fn poison(&mut self) {
        tracing::warn!(backend = self.pool.addr, "poisoning backend connection after round-trip failure");
        self.poisoned = true;
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        let mut state = self.pool.state.lock().expect("pool mutex poisoned");
        state.outstanding -= 1;
        if !self.poisoned {
            if let Some(conn) = self.conn.take() {
                state.idle.push(conn.into_inner());
            }
        }
        drop(state);
        self.pool.became_idle.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn echo_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[test]
    fn round_trip_echoes_a_framed_message() {
        let (listener, addr) = echo_server();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).unwrap();
            let len = i32::from_le_bytes(len_buf) as usize;
            let mut rest = vec![0u8; len - 4];
            stream.read_exact(&mut rest).unwrap();
            stream.write_all(&len_buf).unwrap();
            stream.write_all(&rest).unwrap();
        });

        let client = PooledClient::connect(addr, 4, Some(Duration::from_secs(2))).unwrap();
        let mut frame = Vec::new();
        frame.extend_from_slice(&9i32.to_le_bytes());
        frame.extend_from_slice(b"hello");

        let response = client.round_trip(&frame).unwrap();
        assert_eq!(response, frame);
        handle.join().unwrap();
    }

    #[test]
    fn pool_reuses_idle_connections_instead_of_growing_unbounded() {
        let (listener, addr) = echo_server();
        let handle = thread::spawn(move || {
            // A pool of capacity 1 reuses its single connection across both round trips, so
            // exactly one accept ever happens, each serving two request/response frames.
            let (mut stream, _) = listener.accept().unwrap();
            for _ in 0..2 {
                let mut len_buf = [0u8; 4];
                stream.read_exact(&mut len_buf).unwrap();
                let len = i32::from_le_bytes(len_buf) as usize;
                let mut rest = vec![0u8; len - 4];
                stream.read_exact(&mut rest).unwrap();
                stream.write_all(&len_buf).unwrap();
                stream.write_all(&rest).unwrap();
            }
        });

        let client = PooledClient::connect(addr, 1, Some(Duration::from_secs(2))).unwrap();
        let mut frame = Vec::new();
        frame.extend_from_slice(&9i32.to_le_bytes());
        frame.extend_from_slice(b"hello");

        client.round_trip(&frame).unwrap();
        client.round_trip(&frame).unwrap();

        assert_eq!(client.inner.state.lock().unwrap().outstanding, 0);
        handle.join().unwrap();
    }
}
