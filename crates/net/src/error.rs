use thiserror::Error;

/// Errors raised by the framed connection and handshake.
#[derive(Debug, Error)]
pub enum ConnError {
    /// The client closed the connection while the next frame's length prefix was being read.
    /// Benign: the session should end quietly rather than being logged as a failure.
    #[error("client hung up the connection")]
    ClientHungUp,

    /// A lower-level I/O failure, other than the initial-read EOF that signals
    /// [`ConnError::ClientHungUp`].
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The wire envelope failed to decode.
    #[error(transparent)]
    Wire(#[from] wire::WireError),

    /// The command document's first key could not be read.
    #[error(transparent)]
    Bson(#[from] bson::BsonError),

    /// The first command sent during the handshake was not `isMaster`/`ismaster`.
    #[error("unknown handshake command {0:?}")]
    UnknownHandshakeCommand(String),

    /// The handshake's command document was empty, so there was no command name to read.
    #[error("handshake command document carried no elements")]
    EmptyHandshakeCommand,

    /// A frame's declared length prefix was smaller than the 4 bytes it takes to encode itself.
    #[error("frame declared an invalid length of {0} bytes")]
    InvalidFrameLength(i32),
}
