//! Leaf anchors in the reader page.
//!
//! An anchor is any element carrying `data-leaf-id`. Its payload lives in a
//! JSON `script` block inside the enclosing `.reader-page`.

use leaf_surface_core::mount::LeafAnchor;
use web_sys::{Document, HtmlElement};

use crate::dom::query_all;

pub const ANCHOR_SELECTOR: &str = "[data-leaf-id]";
pub const LEAF_ID_ATTR: &str = "data-leaf-id";
pub const LEAF_TEXT_ATTR: &str = "data-leaf-text";
pub const READY_ATTR: &str = "data-leaf-ready";
pub const PAGE_SELECTOR: &str = ".reader-page";
pub const PAYLOAD_SELECTOR: &str = r#"script[type="application/json"]"#;

/// A leaf anchor element.
#[derive(Debug, Clone, PartialEq)]
pub struct DomAnchor {
    element: HtmlElement,
    leaf_id: String,
}

impl DomAnchor {
    pub fn new(element: HtmlElement, leaf_id: impl Into<String>) -> Self {
        Self {
            element,
            leaf_id: leaf_id.into(),
        }
    }

    /// An anchor for an element carrying `data-leaf-id`.
    pub fn from_element(element: HtmlElement) -> Self {
        let leaf_id = element.get_attribute(LEAF_ID_ATTR).unwrap_or_default();
        Self::new(element, leaf_id)
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl LeafAnchor for DomAnchor {
    fn leaf_id(&self) -> &str {
        &self.leaf_id
    }

    fn payload(&self) -> Option<String> {
        let page = self.element.closest(PAGE_SELECTOR).ok().flatten()?;
        let script = page.query_selector(PAYLOAD_SELECTOR).ok().flatten()?;
        script.text_content()
    }

    fn fallback_text(&self) -> String {
        self.element
            .get_attribute(LEAF_TEXT_ATTR)
            .unwrap_or_default()
    }

    fn is_ready(&self) -> bool {
        self.element.has_attribute(READY_ATTR)
    }

    fn mark_ready(&self) {
        if let Err(err) = self.element.set_attribute(READY_ATTR, "true") {
            tracing::debug!(leaf_id = %self.leaf_id, ?err, "could not set ready marker");
        }
    }

    fn show_plain_text(&self, text: &str) {
        self.element.set_text_content(Some(text));
    }
}

/// Every leaf anchor in document order.
pub fn discover_anchors(document: &Document) -> Vec<DomAnchor> {
    query_all::<HtmlElement>(document, ANCHOR_SELECTOR)
        .into_iter()
        .map(DomAnchor::from_element)
        .collect()
}
