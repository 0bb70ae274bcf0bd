use crate::error::BsonError;
use crate::read::read_element;
use crate::value::Element;

/// Minimum legal size, in bytes, of a document or array: a 4-byte length prefix plus the
/// trailing terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// A lazy, zero-copy iterator over the elements of a binary document or array.
///
/// `DocIterator` does not implement [`std::iter::Iterator`] directly: its "stop and latch an
/// error" contract does not fit that trait's infallible-after-`None` shape without forcing
/// every caller to unwrap an `Option<Result<_>>` item. Use [`DocIterator::next`] plus
/// [`DocIterator::element`] for manual stepping, or [`DocIterator::elements`] for the common
/// case of iterating the happy path and checking [`DocIterator::err`] afterward.
pub struct DocIterator<'a> {
    src: &'a [u8],
    current: Option<Element<'a>>,
    err: Option<BsonError>,
}

impl<'a> DocIterator<'a> {
    /// Creates an iterator over `src`, a complete document or array (including its own
    /// 4-byte length prefix). Fails if `src` is shorter than [`MIN_DOCUMENT_SIZE`].
    pub fn new(src: &'a [u8]) -> Result<Self, BsonError> {
        if src.len() < MIN_DOCUMENT_SIZE {
            return Err(BsonError::DocumentTooSmall {
                min: MIN_DOCUMENT_SIZE,
                actual: src.len(),
            });
        }
        Ok(Self {
            src: &src[4..],
            current: None,
            err: None,
        })
    }

    /// Advances to the next element. Returns `true` if one was read successfully; returns
    /// `false` once the document is exhausted or a malformed element was encountered (in the
    /// latter case, [`DocIterator::err`] surfaces the failure and every subsequent call to
    /// `next` also returns `false`).
    pub fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        // A single remaining byte is the terminating nul; iteration is complete.
        if self.src.len() <= 1 {
            return false;
        }

        match read_element(self.src) {
            Ok((element, consumed)) => {
                self.src = &self.src[consumed..];
                self.current = Some(element);
                true
            }
            Err(err) => {
                self.err = Some(err);
                false
            }
        }
    }

    /// The element most recently read by [`DocIterator::next`]. Valid until the next call.
    pub fn element(&self) -> Option<&Element<'a>> {
        self.current.as_ref()
    }

    /// The first decode error encountered, if any.
    pub fn err(&self) -> Option<&BsonError> {
        self.err.as_ref()
    }

    /// Adapts this iterator into a standard [`Iterator`] over elements, for call sites that
    /// only care about the happy path. Check [`DocIterator::err`] once iteration finishes to
    /// distinguish "ran out of elements" from "hit a decode error".
    pub fn elements(&mut self) -> Elements<'a, '_> {
        Elements { iter: self }
    }
}

/// [`Iterator`] adapter returned by [`DocIterator::elements`].
pub struct Elements<'a, 'b> {
    iter: &'b mut DocIterator<'a>,
}

impl<'a> Iterator for Elements<'a, '_> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.iter.next() {
            self.iter.element().copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;

    #[test]
    fn rejects_documents_below_minimum_size() {
        let err = DocIterator::new(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, BsonError::DocumentTooSmall { min: 5, actual: 3 }));
    }

    #[test]
    fn empty_document_yields_no_elements() {
        let mut builder = DocumentBuilder::new();
        let doc = builder.finish();
        let mut iter = DocIterator::new(&doc).unwrap();
        assert!(!iter.next());
        assert!(iter.err().is_none());
    }

    #[test]
    fn iterates_elements_in_order() {
        let mut builder = DocumentBuilder::new();
        builder.append_string_element(b"a", b"one");
        builder.append_int32_element(b"b", 7);
        let doc = builder.finish();

        let mut iter = DocIterator::new(&doc).unwrap();
        let keys: Vec<&[u8]> = iter.elements().map(|e| e.key()).collect();
        assert!(iter.err().is_none());
        assert_eq!(keys, vec![b"a".as_slice(), b"b".as_slice()]);
    }

    #[test]
    fn latches_error_and_stops() {
        // truncated string element: declares a length that overruns the buffer.
        let mut bytes = vec![0u8; 4];
        bytes.push(0x02); // type: string
        bytes.extend_from_slice(b"k\0");
        bytes.extend_from_slice(&100i32.to_le_bytes()); // bogus declared length
        bytes.push(0); // document terminator, never reached
        let total_len = bytes.len() as i32;
        bytes[0..4].copy_from_slice(&total_len.to_le_bytes());

        let mut iter = DocIterator::new(&bytes).unwrap();
        assert!(!iter.next());
        assert!(iter.err().is_some());
        assert!(!iter.next());
    }
}
