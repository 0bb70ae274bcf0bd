use bson::builder::DocumentBuilder;

use crate::msg::OpMsg;
use crate::reply::OpReply;

const MAX_BSON_OBJECT_SIZE: i32 = 16_777_216;
const MAX_MESSAGE_SIZE_BYTES: i32 = 48_000_000;
const MAX_WRITE_BATCH_SIZE: i32 = 100_000;
const LOGICAL_SESSION_TIMEOUT_MINUTES: i32 = 30;
const MIN_WIRE_VERSION: i32 = 0;
const MAX_WIRE_VERSION: i32 = 8;

/// Builds the canned "is-master" capability document shared by the handshake and heartbeat
/// responses.
pub fn is_master_response_document() -> Vec<u8> {
    let mut doc = DocumentBuilder::new();
    doc.append_int32_element(b"ok", 1);
    doc.append_boolean_element(b"ismaster", true);
    doc.append_int32_element(b"maxBsonObjectSize", MAX_BSON_OBJECT_SIZE);
    doc.append_int32_element(b"maxMessageSizeBytes", MAX_MESSAGE_SIZE_BYTES);
    doc.append_int32_element(b"maxWriteBatchSize", MAX_WRITE_BATCH_SIZE);
    doc.append_int32_element(b"logicalSessionTimeoutMinutes", LOGICAL_SESSION_TIMEOUT_MINUTES);
    doc.append_int32_element(b"minWireVersion", MIN_WIRE_VERSION);
    doc.append_int32_element(b"maxWireVersion", MAX_WIRE_VERSION);
    doc.finish()
}

/// The handshake's answer to the client's first `isMaster`/`ismaster` command, sent as a
/// legacy `OP_REPLY` because the handshake itself still speaks the legacy opcode.
pub fn handshake_is_master_response(request_id: i32) -> OpReply {
    OpReply::new_response(request_id, &is_master_response_document())
}

/// The answer to a post-handshake `isMaster`/`ismaster` heartbeat, sent as `OP_MSG` since all
/// traffic after the handshake uses the modern opcode.
pub fn heartbeat_is_master_response(request_id: i32) -> OpMsg {
    OpMsg::new_response(request_id, &is_master_response_document())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DocIterator;

    #[test]
    fn canned_document_carries_expected_fields() {
        let doc = is_master_response_document();
        let mut iter = DocIterator::new(&doc).unwrap();
        let mut keys = Vec::new();
        while iter.next() {
            keys.push(iter.element().unwrap().key().to_vec());
        }
        assert!(iter.err().is_none());
        assert_eq!(
            keys,
            vec![
                b"ok".to_vec(),
                b"ismaster".to_vec(),
                b"maxBsonObjectSize".to_vec(),
                b"maxMessageSizeBytes".to_vec(),
                b"maxWriteBatchSize".to_vec(),
                b"logicalSessionTimeoutMinutes".to_vec(),
                b"minWireVersion".to_vec(),
                b"maxWireVersion".to_vec(),
            ]
        );
    }
}
