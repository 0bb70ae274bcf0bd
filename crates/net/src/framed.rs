use std::io::{self, Read, Write};

use crate::error::ConnError;

/// Length-prefixed framing over a blocking byte stream.
///
/// Every frame on the wire begins with a 4-byte little-endian `i32` giving the frame's total
/// length, including those 4 bytes. `FramedConnection` reuses one growable buffer across reads
/// so a long session does not reallocate once it has seen its largest message.
pub struct FramedConnection<S> {
    stream: S,
    buf: Vec<u8>,
}

impl<S> FramedConnection<S>
where
    S: Read + Write,
{
    /// Wraps `stream` with no prior read history.
    pub fn new(stream: S) -> Self {
        Self { stream, buf: Vec::new() }
    }

    /// Reads the next frame. If the connection is closed while reading the 4-byte length
    /// prefix, returns [`ConnError::ClientHungUp`] rather than a generic I/O error — this is
    /// the ordinary, expected way for a client session to end.
    pub fn read_wire_message(&mut self) -> Result<&[u8], ConnError> {
        let mut size_buf = [0u8; 4];
        if let Err(err) = self.stream.read_exact(&mut size_buf) {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                return Err(ConnError::ClientHungUp);
            }
            return Err(ConnError::Io(err));
        }

        let declared = i32::from_le_bytes(size_buf);
        if declared < 4 {
            return Err(ConnError::InvalidFrameLength(declared));
        }
        let size = declared as usize;
        self.buf.clear();
        self.buf.resize(size, 0);
        self.buf[..4].copy_from_slice(&size_buf);
        self.stream.read_exact(&mut self.buf[4..])?;
        Ok(&self.buf[..size])
    }

    /// Writes a complete frame to the client.
    pub fn write_wire_message(&mut self, bytes: &[u8]) -> Result<(), ConnError> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    /// Borrows the underlying stream, e.g. to set read/write timeouts on a `TcpStream`.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Recovers ownership of the underlying stream, discarding the reusable read buffer.
    /// Used by connection pools that hand the same stream back out for a later checkout.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
