/// Incrementally builds a binary document (or array) into an owned buffer.
///
/// Mirrors the append-as-you-go style of the wire format: a 4-byte length placeholder is
/// reserved up front and patched in [`DocumentBuilder::finish`].
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    buf: Vec<u8>,
}

impl DocumentBuilder {
    /// Starts a new, empty document.
    pub fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0i32.to_le_bytes());
        Self { buf }
    }

    /// Starts a new document, reserving `capacity` bytes up front.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(&0i32.to_le_bytes());
        Self { buf }
    }

    fn append_key(&mut self, type_tag: u8, key: &[u8]) {
        self.buf.push(type_tag);
        self.buf.extend_from_slice(key);
        self.buf.push(0);
    }

    /// Appends a complete, previously-encoded element (type tag + key + payload) verbatim.
    /// Used to copy elements through unchanged when a fixer does not match their key.
    pub fn append_raw_element(&mut self, raw: &[u8]) {
        self.buf.extend_from_slice(raw);
    }

    /// Appends a UTF-8 string element under `key`.
    pub fn append_string_element(&mut self, key: &[u8], value: &[u8]) {
        self.append_key(0x02, key);
        let strlen = (value.len() + 1) as i32;
        self.buf.extend_from_slice(&strlen.to_le_bytes());
        self.buf.extend_from_slice(value);
        self.buf.push(0);
    }

    /// Appends a 32-bit integer element under `key`.
    pub fn append_int32_element(&mut self, key: &[u8], value: i32) {
        self.append_key(0x10, key);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a 64-bit integer element under `key`.
    pub fn append_int64_element(&mut self, key: &[u8], value: i64) {
        self.append_key(0x12, key);
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a boolean element under `key`.
    pub fn append_boolean_element(&mut self, key: &[u8], value: bool) {
        self.append_key(0x08, key);
        self.buf.push(u8::from(value));
    }

    /// Appends a subdocument element under `key`. `doc` must be a complete, length-prefixed
    /// document (as produced by [`DocumentBuilder::finish`] or borrowed from
    /// [`crate::Value::Document`]).
    pub fn append_document_element(&mut self, key: &[u8], doc: &[u8]) {
        self.append_key(0x03, key);
        self.buf.extend_from_slice(doc);
    }

    /// Appends an array element under `key`. `array` must be a complete, length-prefixed array.
    pub fn append_array_element(&mut self, key: &[u8], array: &[u8]) {
        self.append_key(0x04, key);
        self.buf.extend_from_slice(array);
    }

    /// Finalizes the document, patching the length prefix and appending the terminator.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(0);
        let len = self.buf.len() as i32;
        self.buf[0..4].copy_from_slice(&len.to_le_bytes());
        self.buf
    }
}

/// Builds the stringified-index key used for array elements (`"0"`, `"1"`, ...).
pub fn array_index_key(index: usize, scratch: &mut String) -> &[u8] {
    scratch.clear();
    use std::fmt::Write as _;
    let _ = write!(scratch, "{index}");
    scratch.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::DocIterator;

    #[test]
    fn round_trips_a_simple_document() {
        let mut builder = DocumentBuilder::new();
        builder.append_string_element(b"name", b"proxy");
        builder.append_int32_element(b"count", 42);
        builder.append_boolean_element(b"ok", true);
        let doc = builder.finish();

        let mut iter = DocIterator::new(&doc).unwrap();
        let elements: Vec<_> = iter.elements().collect();
        assert!(iter.err().is_none());
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].key(), b"name");
        assert_eq!(elements[0].value().as_str().unwrap(), "proxy");
    }

    #[test]
    fn array_index_keys_increment() {
        let mut scratch = String::new();
        assert_eq!(array_index_key(0, &mut scratch), b"0");
        assert_eq!(array_index_key(11, &mut scratch), b"11");
    }
}
