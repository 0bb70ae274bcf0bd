//! Domain-specific leaf fixers: the namespace-rewriting rules themselves, built on top of the
//! generic [`crate::DocumentFixer`] / [`crate::ArrayFixer`] composition.

use std::sync::Arc;

use bson::builder::DocumentBuilder;
use bson::Value;

use crate::error::FixError;
use crate::fixer::{ArrayFixer, DocumentFixer, FnFixer, ValueFixer};

/// Logical database names that are proxied without any prefix rewriting.
const NOOP_DATABASE_NAMES: &[&str] = &["admin"];

/// The prefix applied to logical database names to obtain their physical name.
const FIXED_PREFIX: &str = "fixed";

fn type_error(key: &[u8], value: &Value<'_>) -> FixError {
    FixError::ExpectedString {
        key: String::from_utf8_lossy(key).into_owned(),
        actual: value.element_type().name(),
    }
}

/// Prepends [`FIXED_PREFIX`] to a `$db`-style string value, unless it is on the allow-list.
/// Used on outbound requests.
pub fn add_db_prefix() -> Arc<dyn ValueFixer> {
    Arc::new(FnFixer::new(|value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder| {
        let db = value.as_str().map_err(|_| type_error(key, &value))?;
        if NOOP_DATABASE_NAMES.contains(&db) {
            dst.append_string_element(key, db.as_bytes());
        } else {
            dst.append_string_element(key, format!("{FIXED_PREFIX}{db}").as_bytes());
        }
        Ok(())
    }))
}

/// Strips a leading [`FIXED_PREFIX`] from a string value, unless it is on the allow-list.
/// Used on inbound responses.
pub fn remove_db_prefix() -> Arc<dyn ValueFixer> {
    Arc::new(FnFixer::new(|value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder| {
        let db = value.as_str().map_err(|_| type_error(key, &value))?;
        let fixed = if NOOP_DATABASE_NAMES.contains(&db) {
            db
        } else {
            db.strip_prefix(FIXED_PREFIX).unwrap_or(db)
        };
        dst.append_string_element(key, fixed.as_bytes());
        Ok(())
    }))
}

/// Strips every occurrence of [`FIXED_PREFIX`] from a string value, with no allow-list
/// exemption. Used for `writeErrors[*].errmsg`, which embeds a namespace inline in free text
/// rather than carrying it as its own field.
fn strip_fixed_occurrences() -> Arc<dyn ValueFixer> {
    Arc::new(FnFixer::new(|value: Value<'_>, key: &[u8], dst: &mut DocumentBuilder| {
        let msg = value.as_str().map_err(|_| type_error(key, &value))?;
        dst.append_string_element(key, msg.replace(FIXED_PREFIX, "").as_bytes());
        Ok(())
    }))
}

/// The default response fixer's `writeErrors` entry: an array of error documents, each with its
/// `errmsg` field scrubbed of the fixed-database prefix.
pub fn write_errors_fixer() -> Arc<dyn ValueFixer> {
    let errmsg_fixer = DocumentFixer::new([(b"errmsg".to_vec(), strip_fixed_occurrences())]);
    Arc::new(ArrayFixer::new(Arc::new(errmsg_fixer)))
}

/// Builds the response fixer for a cursor-returning command: strips the database prefix from
/// `cursor.ns`, and applies `batch_doc_fixer` (if any) to every document in `cursor.firstBatch`
/// and `cursor.nextBatch`.
///
/// `batch_doc_fixer` is `None` for commands whose batch documents carry no namespace of their
/// own (e.g. `find`), and `Some` for commands like `listCollections`/`listIndexes` whose batch
/// documents embed a namespace at a nested key.
pub fn cursor_response_fixer(batch_doc_fixer: Option<Arc<dyn ValueFixer>>) -> DocumentFixer {
    let mut cursor_fixers: Vec<(Vec<u8>, Arc<dyn ValueFixer>)> = vec![(b"ns".to_vec(), remove_db_prefix())];
    if let Some(batch_fixer) = batch_doc_fixer {
        let batch_array_fixer: Arc<dyn ValueFixer> = Arc::new(ArrayFixer::new(batch_fixer));
        cursor_fixers.push((b"firstBatch".to_vec(), Arc::clone(&batch_array_fixer)));
        cursor_fixers.push((b"nextBatch".to_vec(), batch_array_fixer));
    }
    let cursor_subdoc_fixer = DocumentFixer::new(cursor_fixers);
    DocumentFixer::new([(b"cursor".to_vec(), Arc::new(cursor_subdoc_fixer) as Arc<dyn ValueFixer>)])
}

/// The process-wide default request fixer: rewrites `$db` on every command unless overridden.
pub fn default_request_fixer() -> DocumentFixer {
    DocumentFixer::new([(b"$db".to_vec(), add_db_prefix())])
}

/// The process-wide default response fixer: rewrites `writeErrors[*].errmsg` on every command
/// unless overridden.
pub fn default_response_fixer() -> DocumentFixer {
    DocumentFixer::new([(b"writeErrors".to_vec(), write_errors_fixer())])
}

/// The `idIndex.ns` fixer used for `listCollections` batch documents.
pub fn list_collections_batch_fixer() -> Arc<dyn ValueFixer> {
    Arc::new(DocumentFixer::new([(b"idIndex".to_vec(), Arc::new(DocumentFixer::new([(b"ns".to_vec(), remove_db_prefix())])) as Arc<dyn ValueFixer>)]))
}

/// The `ns` fixer used for `listIndexes` batch documents.
pub fn list_indexes_batch_fixer() -> Arc<dyn ValueFixer> {
    Arc::new(DocumentFixer::new([(b"ns".to_vec(), remove_db_prefix())]))
}
