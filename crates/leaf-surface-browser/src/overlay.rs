//! Overlay DOM: resolving image geometry and applying overlay reports.

use leaf_surface_core::{OverlayReport, Placement, Rect, RenderedBounds};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlInputElement, Node};

use crate::dom::is_image;
use crate::tiptap::TiptapEditor;

pub const VISIBLE_CLASS: &str = "is-visible";

fn rect_of(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.right(), r.bottom())
}

/// The `<img>` for a node rendered by the editor view.
///
/// The node may be the image itself, a text node inside it, or a wrapper
/// (resizable images render inside a container).
pub fn image_element(node: &Node) -> Option<Element> {
    if let Some(element) = node.dyn_ref::<Element>() {
        if is_image(element) {
            return Some(element.clone());
        }
        return element.query_selector("img").ok().flatten();
    }
    if node.node_type() == Node::TEXT_NODE {
        let parent = node.parent_element()?;
        return is_image(&parent).then_some(parent);
    }
    None
}

/// Geometry from the live editor view.
pub struct DomBounds {
    editor: TiptapEditor,
    canvas: Option<Element>,
}

impl DomBounds {
    pub fn new(editor: TiptapEditor, canvas: Option<Element>) -> Self {
        Self { editor, canvas }
    }
}

impl RenderedBounds for DomBounds {
    fn resolve_rendered_bounds(&self, pos: usize) -> Option<Rect> {
        let node = self.editor.view().node_at(pos)?;
        image_element(&node).map(|img| rect_of(&img))
    }

    fn canvas_bounds(&self) -> Option<Rect> {
        self.canvas.as_ref().map(rect_of)
    }
}

/// The overlay controls on the editor page. Either may be absent.
#[derive(Debug, Clone, Default)]
pub struct OverlayElements {
    pub remove_control: Option<HtmlElement>,
    pub color_input: Option<HtmlInputElement>,
}

impl OverlayElements {
    pub fn apply(&self, report: &OverlayReport) {
        self.place(report.remove_control);
        if let (Some(input), Some(color)) = (&self.color_input, &report.color_input) {
            input.set_value(color);
        }
    }

    pub fn place(&self, placement: Placement) {
        let Some(control) = &self.remove_control else {
            return;
        };
        let classes = control.class_list();
        if !placement.visible {
            let _ = classes.remove_1(VISIBLE_CLASS);
            return;
        }
        let style = control.style();
        let _ = style.set_property("left", &format!("{}px", placement.left));
        let _ = style.set_property("top", &format!("{}px", placement.top));
        let _ = classes.add_1(VISIBLE_CLASS);
    }
}
