//! Plain-mode editor pieces: the contenteditable surface and the hidden
//! submission field.

use leaf_surface_core::{PlainSurface, SubmissionField};
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, HtmlElement, HtmlInputElement};

pub const FALLBACK_CLASS: &str = "editor-surface--fallback";

/// The editor surface element, edited directly by the browser.
#[derive(Debug, Clone)]
pub struct PlainDomSurface {
    element: HtmlElement,
}

impl PlainDomSurface {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl PlainSurface for PlainDomSurface {
    fn inner_text(&self) -> String {
        self.element.inner_text()
    }

    fn has_focus(&self) -> bool {
        self.element
            .owner_document()
            .and_then(|d| d.active_element())
            .is_some_and(|active| active.is_same_node(Some(self.element.as_ref())))
    }

    fn insert_at_cursor(&self, text: &str) {
        let inserted = self
            .element
            .owner_document()
            .and_then(|d| d.dyn_into::<HtmlDocument>().ok())
            .and_then(|d| d.exec_command_with_show_ui_and_value("insertText", false, text).ok())
            .unwrap_or(false);
        if !inserted {
            self.append_text(text);
        }
    }

    fn append_text(&self, text: &str) {
        let current = self.element.text_content().unwrap_or_default();
        self.element.set_text_content(Some(&format!("{current}{text}")));
    }

    fn make_editable(&self) {
        self.element.set_content_editable("true");
        let _ = self.element.class_list().add_1(FALLBACK_CLASS);
    }
}

/// The hidden `content_json` input.
#[derive(Debug, Clone)]
pub struct HiddenField {
    input: HtmlInputElement,
}

impl HiddenField {
    pub fn new(input: HtmlInputElement) -> Self {
        Self { input }
    }
}

impl SubmissionField for HiddenField {
    fn value(&self) -> String {
        self.input.value()
    }

    fn set_value(&self, value: &str) {
        self.input.set_value(value);
    }
}
