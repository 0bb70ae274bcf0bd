use std::sync::Arc;

use bson::builder::DocumentBuilder;
use bson::{DocIterator, Value};
use rustc_hash::FxHashMap;

use crate::error::FixError;

/// Rewrites a single value, writing its replacement element into `dst`.
///
/// Implemented by [`DocumentFixer`] (recurses into a subdocument), [`ArrayFixer`] (applies an
/// inner fixer to every element of an array), and [`FnFixer`] (a leaf transform built from a
/// plain closure). All three compose uniformly through this trait, matching the original
/// interface-based extension point: new leaf behavior is added by writing a closure, not by
/// extending a closed enum.
pub trait ValueFixer: Send + Sync {
    /// Inspects `value` (found under `key`) and appends its replacement element to `dst`.
    fn fix_value(&self, value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder) -> Result<(), FixError>;
}

/// A leaf fixer built from a plain function or closure.
pub struct FnFixer<F>(F)
where
    F: Fn(Value<'_>, &[u8], &mut DocumentBuilder) -> Result<(), FixError> + Send + Sync;

impl<F> FnFixer<F>
where
    F: Fn(Value<'_>, &[u8], &mut DocumentBuilder) -> Result<(), FixError> + Send + Sync,
{
    /// Wraps `f` as a [`ValueFixer`].
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ValueFixer for FnFixer<F>
where
    F: Fn(Value<'_>, &[u8], &mut DocumentBuilder) -> Result<(), FixError> + Send + Sync,
{
    fn fix_value(&self, value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder) -> Result<(), FixError> {
        (self.0)(value, key, dst)
    }
}

/// A mapping from key to child [`ValueFixer`], applied to a document.
///
/// Keys with no registered fixer pass through unchanged. A `DocumentFixer` is itself a
/// [`ValueFixer`]: matching it against a key recurses into that key's subdocument.
#[derive(Clone, Default)]
pub struct DocumentFixer {
    fixers: Arc<FxHashMap<Vec<u8>, Arc<dyn ValueFixer>>>,
}

impl DocumentFixer {
    /// Builds a fixer from `(key, child fixer)` pairs.
    pub fn new(fixers: impl IntoIterator<Item = (Vec<u8>, Arc<dyn ValueFixer>)>) -> Self {
        Self {
            fixers: Arc::new(fixers.into_iter().collect()),
        }
    }

    /// An empty fixer: every document it is applied to passes through unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Rewrites a complete, top-level document, returning the freshly encoded bytes.
    ///
    /// The source buffer is never mutated; the engine only ever reads from it while it
    /// appends to a newly allocated output buffer.
    pub fn fix(&self, doc: &[u8]) -> Result<Vec<u8>, FixError> {
        let mut builder = DocumentBuilder::new();
        self.fix_into(doc, &mut builder)?;
        Ok(builder.finish())
    }

    fn fix_into(&self, doc: &[u8], dst: &mut DocumentBuilder) -> Result<(), FixError> {
        let mut iter = DocIterator::new(doc)?;
        for element in iter.elements() {
            match self.fixers.get(element.key()) {
                Some(fixer) => fixer.fix_value(element.value(), element.key(), dst)?,
                None => dst.append_raw_element(element.raw_bytes()),
            }
        }
        if let Some(err) = iter.err() {
            return Err(err.clone().into());
        }
        Ok(())
    }
}

impl ValueFixer for DocumentFixer {
    fn fix_value(&self, value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder) -> Result<(), FixError> {
        let sub = value.as_document().map_err(|_| FixError::ExpectedDocument {
            key: String::from_utf8_lossy(key).into_owned(),
            actual: value.element_type().name(),
        })?;

        let mut child = DocumentBuilder::new();
        self.fix_into(sub, &mut child)?;
        dst.append_document_element(key, &child.finish());
        Ok(())
    }
}

/// Applies a single inner [`ValueFixer`] to every element of an array.
pub struct ArrayFixer {
    inner: Arc<dyn ValueFixer>,
}

impl ArrayFixer {
    /// Wraps `inner`, applying it to each element of whatever array this fixer is matched
    /// against.
    pub fn new(inner: Arc<dyn ValueFixer>) -> Self {
        Self { inner }
    }
}

impl ValueFixer for ArrayFixer {
    fn fix_value(&self, value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder) -> Result<(), FixError> {
        let arr = value.as_array().map_err(|_| FixError::ExpectedArray {
            key: String::from_utf8_lossy(key).into_owned(),
            actual: value.element_type().name(),
        })?;

        let mut child = DocumentBuilder::new();
        let mut iter = DocIterator::new(arr)?;
        for element in iter.elements() {
            self.inner.fix_value(element.value(), element.key(), &mut child)?;
        }
        if let Some(err) = iter.err() {
            return Err(err.clone().into());
        }

        dst.append_array_element(key, &child.finish());
        Ok(())
    }
}
