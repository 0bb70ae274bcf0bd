use std::io::{Read, Write};

use bson::DocIterator;
use wire::ismaster::handshake_is_master_response;

use crate::error::ConnError;
use crate::framed::FramedConnection;

/// Answers the connection's opening command. Every client is expected to send an
/// `isMaster`/`ismaster` command first; the proxy replies with a canned capability document
/// and then normal request handling begins.
///
/// This is deliberately a single read-decode-match-reply step, not a loop: the handshake
/// protocol only ever has one message to answer, and looping over "read until we see
/// isMaster" invites a session to sit in handshake state indefinitely if a client sends
/// something else first.
pub fn handshake<S: Read + Write>(conn: &mut FramedConnection<S>) -> Result<(), ConnError> {
    let bytes = conn.read_wire_message()?;
    let message = wire::decode(bytes)?;
    let command = message.command_document();

    let mut iter = DocIterator::new(command)?;
    if !iter.next() {
        if let Some(err) = iter.err() {
            return Err((*err).clone().into());
        }
        return Err(ConnError::EmptyHandshakeCommand);
    }
    let command_name = String::from_utf8_lossy(iter.element().expect("next() returned true").key()).into_owned();

    match command_name.as_str() {
        "isMaster" | "ismaster" => {
            let response = handshake_is_master_response(message.request_id());
            conn.write_wire_message(&response.encode())
        }
        other => Err(ConnError::UnknownHandshakeCommand(other.to_string())),
    }
}
