//! Content loading for leaf payloads.
//!
//! Payloads come from server-rendered `script` blocks and are sometimes stored
//! double-encoded upstream (a JSON string whose contents are the document
//! JSON), so a decoded string is decoded a second time.

use serde_json::Value;

use crate::document::{DocNode, fallback_doc};
use crate::error::DocumentError;

/// Serialization of the empty fallback document.
pub const EMPTY_DOC_JSON: &str = r#"{"type":"doc","content":[{"type":"paragraph"}]}"#;

/// Strictly decode a payload into a normalized document.
pub fn parse_document(raw: &str) -> Result<DocNode, DocumentError> {
    let mut value: Value = serde_json::from_str(raw)?;
    if let Value::String(inner) = value {
        value = serde_json::from_str(&inner)?;
    }

    let found = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    let node: DocNode = match serde_json::from_value(value) {
        Ok(node) => node,
        Err(_) => return Err(DocumentError::NotADocument { found }),
    };
    if !node.is_document() {
        return Err(DocumentError::NotADocument { found });
    }
    Ok(node.normalized())
}

/// Produce a usable document for a leaf.
///
/// Never fails: an absent, empty or defective payload yields
/// [`fallback_doc`] of `fallback_text`.
pub fn load_document(payload: Option<&str>, fallback_text: &str) -> DocNode {
    let raw = payload.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return fallback_doc(fallback_text);
    }
    match parse_document(raw) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(error = %err, "payload unusable, using fallback document");
            fallback_doc(fallback_text)
        }
    }
}

/// Serialize a document for the submission field.
pub fn serialize_document(doc: &DocNode) -> String {
    match serde_json::to_string(doc) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "document serialization failed, writing empty document");
            EMPTY_DOC_JSON.to_string()
        }
    }
}
