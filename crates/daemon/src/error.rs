use thiserror::Error;

/// Errors raised while servicing one client request, composed from every crate boundary the
/// request touches.
///
/// [`SessionError::is_client_hung_up`] and [`SessionError::is_recoverable`] together encode the
/// recovery policy: a hang-up ends the session quietly, a recoverable error is logged and the
/// session keeps reading requests, and anything else closes the connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The framed connection failed to read or write, or the client hung up.
    #[error(transparent)]
    Conn(#[from] net::ConnError),

    /// The wire envelope failed to decode or re-encode. Fatal to the session: once the
    /// envelope cannot be parsed, the connection can no longer be frame-aligned.
    #[error(transparent)]
    Wire(#[from] wire::WireError),

    /// A rewriter callback hit a malformed document or an unexpected value type while walking
    /// the command or response document.
    #[error(transparent)]
    Fix(#[from] rewrite::FixError),

    /// A command or response document failed to decode while peeking its first key or its
    /// cursor id.
    #[error(transparent)]
    Bson(#[from] bson::BsonError),

    /// The backend round trip failed (connect, write, read, or timeout).
    #[error(transparent)]
    Backend(#[from] backend::BackendError),

    /// A `getMore` referenced a cursor id with no entry in the continuation table.
    #[error("getMore referenced unknown cursor id {0}")]
    DanglingCursor(i64),

    /// A command document carried no elements, so there was no command name to read.
    #[error("command document carried no elements")]
    EmptyCommandDocument,
}

impl SessionError {
    /// True if this error is the client hanging up while a request was being read. Logged at
    /// `debug` and ends the session without further noise.
    pub fn is_client_hung_up(&self) -> bool {
        matches!(self, Self::Conn(net::ConnError::ClientHungUp))
    }

    /// True if the session should keep reading requests after logging this error: a malformed
    /// command document, a type mismatch inside a rewriter, or a dangling cursor. False for
    /// anything that leaves the framing layer or the backend connection in an unknown state.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Bson(_) | Self::DanglingCursor(_) | Self::EmptyCommandDocument => true,
            Self::Fix(_) => true,
            Self::Conn(_) | Self::Wire(_) | Self::Backend(_) => false,
        }
    }
}

/// Errors that can prevent the daemon from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The initial backend connection could not be established.
    #[error(transparent)]
    Backend(#[from] backend::BackendError),

    /// The listen address could not be bound.
    #[error("failed to bind listen address: {0}")]
    Bind(#[from] std::io::Error),
}
