use std::io::{Read, Write};

use backend::BackendClient;
use bson::DocIterator;
use net::FramedConnection;
use registry::FixerRegistry;
use wire::WireMessage;

use crate::cursor::CursorTable;
use crate::error::SessionError;

/// Runs one client session to completion: the handshake, then `handle_request` in a loop
/// until it reports the client hung up or a fatal (non-recoverable) error.
///
/// A recoverable error — a malformed command document, a rewriter type mismatch, a dangling
/// cursor — is logged and the loop continues with the next request, matching §7's recovery
/// policy. Anything else closes the connection.
pub fn run_session<S: Read + Write>(stream: S, registry: &FixerRegistry, cursor_table: &CursorTable, backend: &dyn BackendClient, session_id: u64) {
    let span = tracing::info_span!("session", session_id);
    let _entered = span.enter();

    let mut conn = FramedConnection::new(stream);
    if let Err(err) = net::handshake(&mut conn) {
        tracing::warn!(error = %err, "handshake failed, closing session");
        return;
    }
    tracing::debug!("handshake complete");

    loop {
        match handle_request(&mut conn, registry, cursor_table, backend) {
            Ok(()) => {}
            Err(err) if err.is_client_hung_up() => {
                tracing::debug!("client hung up");
                break;
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "recoverable request error, session continues");
            }
            Err(err) => {
                tracing::error!(error = %err, "fatal session error, closing connection");
                break;
            }
        }
    }
}

/// Services exactly one client request: read a frame, decode it, and either answer a
/// post-handshake `isMaster` heartbeat directly or hand it to [`handle_proxied_request`].
pub fn handle_request<S: Read + Write>(
    conn: &mut FramedConnection<S>,
    registry: &FixerRegistry,
    cursor_table: &CursorTable,
    backend: &dyn BackendClient,
) -> Result<(), SessionError> {
    let bytes = conn.read_wire_message()?;
    let message = wire::decode(bytes)?;
    let (command_name, cursor_hint) = peek_command(message.command_document())?;

    match command_name.as_str() {
        "isMaster" | "ismaster" => {
            let response = wire::ismaster::heartbeat_is_master_response(message.request_id());
            conn.write_wire_message(&response.encode())?;
            Ok(())
        }
        _ => handle_proxied_request(conn, registry, cursor_table, backend, &message, &command_name, cursor_hint),
    }
}

/// Rewrites, proxies, and rewrites back one non-handshake request: §4.F's
/// `handle_proxied_request` in full, including the cursor-continuation bookkeeping.
fn handle_proxied_request<S: Read + Write>(
    conn: &mut FramedConnection<S>,
    registry: &FixerRegistry,
    cursor_table: &CursorTable,
    backend: &dyn BackendClient,
    message: &WireMessage,
    literal_command_name: &str,
    cursor_hint: Option<i64>,
) -> Result<(), SessionError> {
    let effective_name = if literal_command_name == "getMore" {
        let cursor_id = cursor_hint.expect("getMore's first element is always the int64 cursor id");
        cursor_table.lookup(cursor_id).ok_or(SessionError::DanglingCursor(cursor_id))?
    } else {
        literal_command_name.to_string()
    };

    let fixer_set = registry.lookup(&effective_name);
    let fixed_request = fixer_set.request().fix(message.command_document())?;
    let encoded = message.encode_with(&fixed_request)?;

    let response_bytes = backend.round_trip(&encoded)?;
    let response_msg = wire::decode(&response_bytes)?;

    if let Some(returned_cursor_id) = extract_cursor_id(response_msg.command_document())? {
        if literal_command_name == "getMore" {
            if returned_cursor_id == 0 {
                let request_cursor_id = cursor_hint.expect("getMore's first element is always the int64 cursor id");
                cursor_table.remove(request_cursor_id);
            }
        } else if returned_cursor_id != 0 {
            cursor_table.insert(returned_cursor_id, literal_command_name.to_string());
        }
    }

    let fixed_response = fixer_set.response().fix(response_msg.command_document())?;
    let encoded_resp = response_msg.encode_with(&fixed_response)?;
    conn.write_wire_message(&encoded_resp)?;
    Ok(())
}

/// Reads a command document's first element, returning its key and — if the key is
/// `"getMore"` — the int64 cursor id carried as its value.
fn peek_command(doc: &[u8]) -> Result<(String, Option<i64>), SessionError> {
    let mut iter = DocIterator::new(doc)?;
    if !iter.next() {
        if let Some(err) = iter.err() {
            return Err(err.clone().into());
        }
        return Err(SessionError::EmptyCommandDocument);
    }
    let element = iter.element().expect("next() returned true");
    let key = String::from_utf8_lossy(element.key()).into_owned();
    let cursor_id = if key == "getMore" { Some(element.value().as_i64()?) } else { None };
    Ok((key, cursor_id))
}

/// Reads `cursor.id` out of a response's command document, if present and int64-typed.
/// Lenient by design: a missing `cursor` key, a `cursor` value that is not a document, or an
/// `id` that is not int64 are all treated as "no cursor id" rather than an error, since this
/// is bookkeeping for the continuation table, not a rewrite the client is relying on.
fn extract_cursor_id(doc: &[u8]) -> Result<Option<i64>, SessionError> {
    let mut iter = DocIterator::new(doc)?;
    for element in iter.elements() {
        if element.key() != b"cursor" {
            continue;
        }
        let Ok(sub) = element.value().as_document() else {
            return Ok(None);
        };
        let mut sub_iter = DocIterator::new(sub)?;
        for sub_element in sub_iter.elements() {
            if sub_element.key() == b"id" {
                return Ok(sub_element.value().as_i64().ok());
            }
        }
        if let Some(err) = sub_iter.err() {
            return Err(err.clone().into());
        }
        return Ok(None);
    }
    if let Some(err) = iter.err() {
        return Err(err.clone().into());
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Write};
    use std::sync::Mutex;

    use backend::BackendError;
    use test_support::{array_of, command_doc, msg_with_command, Field};

    use super::*;

    /// A tiny in-memory duplex standing in for the client's `TcpStream`: reads come from a
    /// fixed buffer (unused by these tests, since they drive `handle_proxied_request`
    /// directly), writes accumulate so the rewritten response can be inspected afterward.
    #[derive(Default)]
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// A stand-in backend that replies with a fixed, pre-recorded sequence of responses and
    /// records every request it was asked to proxy.
    struct FakeBackend {
        responses: Mutex<Vec<Vec<u8>>>,
        requests: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeBackend {
        fn new(responses: Vec<Vec<u8>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl BackendClient for FakeBackend {
        fn round_trip(&self, request: &[u8]) -> Result<Vec<u8>, BackendError> {
            self.requests.lock().unwrap().push(request.to_vec());
            Ok(self.responses.lock().unwrap().remove(0))
        }
    }

    fn wrap_as_msg_frame(command: &[u8]) -> Vec<u8> {
        msg_with_command(1, command).encode()
    }

    /// Drives `handle_proxied_request` directly against a fake backend and returns the
    /// rewritten request that reached the backend alongside the rewritten response that was
    /// written back to the client.
    fn run_one_request(command: &[u8], responses: Vec<Vec<u8>>) -> (Vec<u8>, Vec<u8>) {
        let registry = FixerRegistry::new();
        let cursor_table = CursorTable::new();
        let backend = FakeBackend::new(responses);
        let frame = wrap_as_msg_frame(command);
        let message = wire::decode(&frame).unwrap();
        let (name, cursor_hint) = peek_command(message.command_document()).unwrap();

        let mut conn = net::FramedConnection::new(Duplex::default());
        handle_proxied_request(&mut conn, &registry, &cursor_table, &backend, &message, &name, cursor_hint).unwrap();

        let sent = backend.requests.lock().unwrap().remove(0);
        let duplex = conn.into_inner();
        (sent, duplex.output)
    }

    #[test]
    fn default_request_rewrite_prepends_fixed_prefix() {
        let command = command_doc(&[Field::Str("find", "c"), Field::Str("$db", "testdb")]);
        let cursor = command_doc(&[Field::I64("id", 0), Field::Str("ns", "fixedtestdb.$cmd")]);
        let response = command_doc(&[Field::Doc("cursor", cursor), Field::I32("ok", 1)]);

        let (sent, _written) = run_one_request(&command, vec![wrap_as_msg_frame(&response)]);

        let sent_msg = wire::decode(&sent).unwrap();
        let mut iter = bson::DocIterator::new(sent_msg.command_document()).unwrap();
        assert!(iter.next());
        assert!(iter.next());
        assert_eq!(iter.element().unwrap().key(), b"$db");
        assert_eq!(iter.element().unwrap().value().as_str().unwrap(), "fixedtestdb");
    }

    #[test]
    fn admin_database_passes_through_unchanged() {
        let command = command_doc(&[Field::I32("ping", 1), Field::Str("$db", "admin")]);
        let response = command_doc(&[Field::I32("ok", 1)]);

        let (sent, _) = run_one_request(&command, vec![wrap_as_msg_frame(&response)]);

        let sent_msg = wire::decode(&sent).unwrap();
        let mut iter = bson::DocIterator::new(sent_msg.command_document()).unwrap();
        assert!(iter.next());
        assert!(iter.next());
        assert_eq!(iter.element().unwrap().value().as_str().unwrap(), "admin");
    }

    #[test]
    fn write_errors_errmsg_is_scrubbed_on_an_unrecognized_command() {
        let command = command_doc(&[Field::Str("insert", "c"), Field::Str("$db", "testdb")]);
        let error_doc = command_doc(&[Field::I32("index", 0), Field::Str("errmsg", "duplicate key on fixedtestdb.c")]);
        let response = command_doc(&[Field::Arr("writeErrors", array_of(&[error_doc])), Field::I32("ok", 1)]);

        let (_, written) = run_one_request(&command, vec![wrap_as_msg_frame(&response)]);

        let written_msg = wire::decode(&written).unwrap();
        let mut iter = bson::DocIterator::new(written_msg.command_document()).unwrap();
        assert!(iter.next());
        let arr = iter.element().unwrap().value().as_array().unwrap();
        let mut arr_iter = bson::DocIterator::new(arr).unwrap();
        assert!(arr_iter.next());
        let err_doc = arr_iter.element().unwrap().value().as_document().unwrap();
        let mut err_iter = bson::DocIterator::new(err_doc).unwrap();
        assert!(err_iter.next());
        assert!(err_iter.next());
        assert_eq!(err_iter.element().unwrap().value().as_str().unwrap(), "duplicate key on testdb.c");
    }

    #[test]
    fn dangling_cursor_is_an_error() {
        let registry = FixerRegistry::new();
        let cursor_table = CursorTable::new();
        let backend = FakeBackend::new(vec![]);
        let command = command_doc(&[Field::I64("getMore", 999), Field::Str("$db", "testdb")]);
        let frame = wrap_as_msg_frame(&command);
        let message = wire::decode(&frame).unwrap();
        let (name, cursor_hint) = peek_command(message.command_document()).unwrap();

        let mut conn = net::FramedConnection::new(Duplex::default());
        let err = handle_proxied_request(&mut conn, &registry, &cursor_table, &backend, &message, &name, cursor_hint).unwrap_err();

        assert!(matches!(err, SessionError::DanglingCursor(999)));
    }

    #[test]
    fn get_more_uses_the_originating_command_fixer_and_clears_exhausted_cursor() {
        let registry = FixerRegistry::new();
        let cursor_table = CursorTable::new();
        cursor_table.insert(42, "listCollections".to_string());

        let id_index = command_doc(&[Field::Str("ns", "fixedtestdb.c")]);
        let batch_doc = command_doc(&[Field::Str("name", "c"), Field::Doc("idIndex", id_index)]);
        let batch = array_of(&[batch_doc]);
        let cursor = command_doc(&[
            Field::I64("id", 0),
            Field::Str("ns", "fixedtestdb.$cmd.listCollections"),
            Field::Arr("nextBatch", batch),
        ]);
        let response = command_doc(&[Field::Doc("cursor", cursor), Field::I32("ok", 1)]);

        let backend = FakeBackend::new(vec![wrap_as_msg_frame(&response)]);
        let command = command_doc(&[Field::I64("getMore", 42), Field::Str("$db", "testdb")]);
        let frame = wrap_as_msg_frame(&command);
        let message = wire::decode(&frame).unwrap();
        let (name, cursor_hint) = peek_command(message.command_document()).unwrap();

        let mut conn = net::FramedConnection::new(Duplex::default());
        handle_proxied_request(&mut conn, &registry, &cursor_table, &backend, &message, &name, cursor_hint).unwrap();

        assert_eq!(cursor_table.len(), 0);

        let duplex = conn.into_inner();
        let written_msg = wire::decode(&duplex.output).unwrap();
        let mut cursor_iter = bson::DocIterator::new(written_msg.command_document()).unwrap();
        assert!(cursor_iter.next());
        let cursor_bytes = cursor_iter.element().unwrap().value().as_document().unwrap();
        let mut inner = bson::DocIterator::new(cursor_bytes).unwrap();
        assert!(inner.next()); // id
        assert!(inner.next()); // ns
        assert_eq!(inner.element().unwrap().value().as_str().unwrap(), "testdb.$cmd.listCollections");
    }

    #[test]
    fn get_more_keeps_the_cursor_when_the_backend_still_has_more() {
        let registry = FixerRegistry::new();
        let cursor_table = CursorTable::new();
        cursor_table.insert(42, "find".to_string());

        let cursor = command_doc(&[Field::I64("id", 42), Field::Str("ns", "fixedtestdb.c")]);
        let response = command_doc(&[Field::Doc("cursor", cursor), Field::I32("ok", 1)]);

        let backend = FakeBackend::new(vec![wrap_as_msg_frame(&response)]);
        let command = command_doc(&[Field::I64("getMore", 42), Field::Str("$db", "testdb")]);
        let frame = wrap_as_msg_frame(&command);
        let message = wire::decode(&frame).unwrap();
        let (name, cursor_hint) = peek_command(message.command_document()).unwrap();

        let mut conn = net::FramedConnection::new(Duplex::default());
        handle_proxied_request(&mut conn, &registry, &cursor_table, &backend, &message, &name, cursor_hint).unwrap();

        assert_eq!(cursor_table.lookup(42), Some("find".to_string()));
    }

    #[test]
    fn opening_a_cursor_records_its_origin() {
        let registry = FixerRegistry::new();
        let cursor_table = CursorTable::new();

        let cursor = command_doc(&[Field::I64("id", 7), Field::Str("ns", "fixedtestdb.c")]);
        let response = command_doc(&[Field::Doc("cursor", cursor), Field::I32("ok", 1)]);

        let backend = FakeBackend::new(vec![wrap_as_msg_frame(&response)]);
        let command = command_doc(&[Field::Str("find", "c"), Field::Str("$db", "testdb")]);
        let frame = wrap_as_msg_frame(&command);
        let message = wire::decode(&frame).unwrap();
        let (name, cursor_hint) = peek_command(message.command_document()).unwrap();

        let mut conn = net::FramedConnection::new(Duplex::default());
        handle_proxied_request(&mut conn, &registry, &cursor_table, &backend, &message, &name, cursor_hint).unwrap();

        assert_eq!(cursor_table.lookup(7), Some("find".to_string()));
    }
}
