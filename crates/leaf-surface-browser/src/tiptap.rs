//! Tiptap bindings.
//!
//! `TiptapSurface` adapts a live Tiptap editor to [`RichSurface`]. Every
//! command runs as one `chain().focus()...run()` call, which Tiptap commits
//! as a single transaction.

use js_sys::{Array, Object, Reflect};
use leaf_surface_core::mount::{LeafAnchor, SurfaceFactory, SurfaceRole};
use leaf_surface_core::{
    Command, DocNode, RichSurface, Selection, SurfaceError, Transaction, fallback_doc,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::anchors::DomAnchor;
use crate::capability::EngineModules;
use crate::dom::js_error_message;

#[wasm_bindgen]
extern "C" {
    /// A Tiptap `Editor` instance.
    #[derive(Debug, Clone)]
    pub type TiptapEditor;

    #[wasm_bindgen(method, js_name = getJSON)]
    fn get_json(this: &TiptapEditor) -> JsValue;

    #[wasm_bindgen(method, js_name = getAttributes)]
    fn get_attributes(this: &TiptapEditor, name: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = isActive)]
    fn is_active(this: &TiptapEditor, name: &str, attrs: &JsValue) -> bool;

    #[wasm_bindgen(method)]
    fn chain(this: &TiptapEditor) -> ChainedCommands;

    /// Subscribe to an editor event (`transaction`, `selectionUpdate`, ...).
    #[wasm_bindgen(method)]
    pub fn on(this: &TiptapEditor, event: &str, callback: &js_sys::Function);

    #[wasm_bindgen(method, getter)]
    fn state(this: &TiptapEditor) -> EditorState;

    #[wasm_bindgen(method, getter)]
    pub fn view(this: &TiptapEditor) -> EditorView;

    pub type ChainedCommands;

    #[wasm_bindgen(method)]
    fn focus(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = setParagraph)]
    fn set_paragraph(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = setHeading)]
    fn set_heading(this: &ChainedCommands, attrs: &JsValue) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = toggleHeading)]
    fn toggle_heading(this: &ChainedCommands, attrs: &JsValue) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = setColor)]
    fn set_color(this: &ChainedCommands, color: &str) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = setImage)]
    fn set_image(this: &ChainedCommands, attrs: &JsValue) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = insertContent)]
    fn insert_content(this: &ChainedCommands, content: &JsValue) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = deleteSelection)]
    fn delete_selection(this: &ChainedCommands) -> ChainedCommands;

    #[wasm_bindgen(method, js_name = setTextSelection)]
    fn set_text_selection(this: &ChainedCommands, position: &JsValue) -> ChainedCommands;

    #[wasm_bindgen(method)]
    fn run(this: &ChainedCommands) -> bool;

    type EditorState;

    #[wasm_bindgen(method, getter)]
    fn doc(this: &EditorState) -> JsValue;

    #[wasm_bindgen(method, getter)]
    fn selection(this: &EditorState) -> PmSelection;

    type PmSelection;

    #[wasm_bindgen(method, getter)]
    fn anchor(this: &PmSelection) -> f64;

    #[wasm_bindgen(method, getter)]
    fn head(this: &PmSelection) -> f64;

    pub type EditorView;

    #[wasm_bindgen(method, catch, js_name = posAtDOM)]
    fn pos_at_dom(this: &EditorView, node: &web_sys::Node, offset: u32) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, js_name = nodeDOM)]
    fn node_dom(this: &EditorView, pos: u32) -> Option<web_sys::Node>;
}

impl EditorView {
    /// Content position of a DOM node, if the view can map it.
    pub fn position_of(&self, node: &web_sys::Node) -> Option<usize> {
        match self.pos_at_dom(node, 0) {
            Ok(pos) if pos.is_finite() && pos >= 0.0 => Some(pos as usize),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(error = %js_error_message(&err), "posAtDOM failed");
                None
            }
        }
    }

    /// DOM node rendered for the node at `pos`.
    pub fn node_at(&self, pos: usize) -> Option<web_sys::Node> {
        self.node_dom(u32::try_from(pos).ok()?)
    }
}

/// Convert a JSON value into a plain JS object.
fn to_js(value: &serde_json::Value) -> Option<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .ok()
}

fn position(pos: usize) -> JsValue {
    JsValue::from_f64(pos as f64)
}

/// A Tiptap editor as a [`RichSurface`]. Clones share the editor.
#[derive(Debug, Clone)]
pub struct TiptapSurface {
    editor: TiptapEditor,
}

impl TiptapSurface {
    pub fn new(editor: TiptapEditor) -> Self {
        Self { editor }
    }

    pub fn editor(&self) -> &TiptapEditor {
        &self.editor
    }

    fn chain_for(&self, command: &Command) -> Option<ChainedCommands> {
        let chain = self.editor.chain().focus();
        let chain = match command {
            Command::Focus => chain,
            Command::SetParagraph => chain.set_paragraph(),
            Command::SetHeading { level } => {
                chain.set_heading(&to_js(&serde_json::json!({ "level": level }))?)
            }
            Command::ToggleHeading { level } => {
                chain.toggle_heading(&to_js(&serde_json::json!({ "level": level }))?)
            }
            Command::SetColor(color) => chain.set_color(color),
            Command::SetImage { src, width } => {
                chain.set_image(&to_js(&serde_json::json!({ "src": src, "width": width }))?)
            }
            Command::InsertText(text) => chain.insert_content(&to_js(
                &serde_json::json!({ "type": "text", "text": text }),
            )?),
            Command::DeleteSelection => chain.delete_selection(),
            Command::SetTextSelection(pos) => chain.set_text_selection(&position(*pos)),
        };
        Some(chain)
    }
}

impl RichSurface for TiptapSurface {
    fn document(&self) -> DocNode {
        match serde_wasm_bindgen::from_value::<DocNode>(self.editor.get_json()) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(error = %err, "editor JSON unreadable");
                fallback_doc("")
            }
        }
    }

    fn selection(&self) -> Selection {
        let selection = self.editor.state().selection();
        Selection::new(selection.anchor() as usize, selection.head() as usize)
    }

    fn restore_selection(&mut self, selection: Selection) {
        let range = to_js(&serde_json::json!({ "from": selection.anchor, "to": selection.head }));
        if let Some(range) = range {
            self.editor.chain().set_text_selection(&range).run();
        }
    }

    fn focus(&mut self) {
        self.editor.chain().focus().run();
    }

    fn apply(&mut self, command: &Command) -> Transaction {
        let before = self.editor.state().doc();
        let Some(chain) = self.chain_for(command) else {
            return Transaction::REJECTED;
        };
        let applied = chain.run();
        let doc_changed = !Object::is(&before, &self.editor.state().doc());
        Transaction {
            applied,
            doc_changed,
        }
    }

    fn text_color(&self) -> Option<String> {
        let attrs = self.editor.get_attributes("textStyle");
        Reflect::get(&attrs, &JsValue::from_str("color"))
            .ok()?
            .as_string()
            .filter(|c| !c.is_empty())
    }

    fn is_color_active(&self, color: &str) -> bool {
        to_js(&serde_json::json!({ "color": color }))
            .is_some_and(|attrs| self.editor.is_active("textStyle", &attrs))
    }

    fn is_image_active(&self) -> bool {
        self.editor.is_active("image", &JsValue::UNDEFINED)
    }
}

/// Creates Tiptap editors on anchors.
#[derive(Debug, Clone)]
pub struct TiptapFactory {
    engine: EngineModules,
}

impl TiptapFactory {
    pub fn new(engine: EngineModules) -> Self {
        Self { engine }
    }

    fn options(
        &self,
        anchor: &DomAnchor,
        doc: &DocNode,
        role: SurfaceRole,
    ) -> Result<Object, JsValue> {
        let content = doc
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(JsValue::from)?;
        let options = Object::new();
        Reflect::set(&options, &"element".into(), anchor.element())?;
        Reflect::set(&options, &"editable".into(), &JsValue::from_bool(role.editable()))?;
        Reflect::set(&options, &"extensions".into(), &self.engine.extensions)?;
        Reflect::set(&options, &"content".into(), &content)?;
        Ok(options)
    }
}

impl SurfaceFactory<DomAnchor> for TiptapFactory {
    type Surface = TiptapSurface;

    fn create(
        &mut self,
        anchor: &DomAnchor,
        doc: DocNode,
        role: SurfaceRole,
    ) -> Result<TiptapSurface, SurfaceError> {
        let mount_error = |err: JsValue| SurfaceError::Mount {
            leaf_id: anchor.leaf_id().to_string(),
            reason: js_error_message(&err),
        };
        let options = self.options(anchor, &doc, role).map_err(mount_error)?;
        let editor = Reflect::construct(&self.engine.editor_class, &Array::of1(&options))
            .map_err(mount_error)?;
        Ok(TiptapSurface::new(editor.unchecked_into()))
    }
}
