//! Document tree model.
//!
//! `DocNode` mirrors the rich-text engine's JSON shape exactly: optional
//! fields are skipped when absent so a tree serializes back to the same JSON
//! the engine produced. Unknown keys are dropped on decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

/// Node and mark attributes.
pub type Attrs = Map<String, Value>;

pub const DOC: &str = "doc";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const TEXT: &str = "text";
pub const IMAGE: &str = "image";
pub const HARD_BREAK: &str = "hardBreak";
pub const HORIZONTAL_RULE: &str = "horizontalRule";
pub const BLOCKQUOTE: &str = "blockquote";
pub const BULLET_LIST: &str = "bulletList";
pub const ORDERED_LIST: &str = "orderedList";
pub const LIST_ITEM: &str = "listItem";
pub const CODE_BLOCK: &str = "codeBlock";

/// Mark carrying the text color attribute.
pub const TEXT_STYLE: &str = "textStyle";

/// Node types the engine's schema knows about.
pub const RECOGNIZED_TYPES: &[&str] = &[
    DOC,
    PARAGRAPH,
    HEADING,
    TEXT,
    IMAGE,
    HARD_BREAK,
    HORIZONTAL_RULE,
    BLOCKQUOTE,
    BULLET_LIST,
    ORDERED_LIST,
    LIST_ITEM,
    CODE_BLOCK,
];

/// Nodes whose children are inline content.
const TEXTBLOCK_TYPES: &[&str] = &[PARAGRAPH, HEADING, CODE_BLOCK];

/// Nodes whose children are blocks, joined by newlines in plain text.
const CONTAINER_TYPES: &[&str] = &[DOC, BLOCKQUOTE, BULLET_LIST, ORDERED_LIST, LIST_ITEM];

/// An inline formatting mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
}

impl Mark {
    /// A `textStyle` mark with the given color.
    pub fn text_color(color: &str) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert("color".into(), Value::String(color.to_string()));
        Self {
            kind: TEXT_STYLE.into(),
            attrs: Some(attrs),
        }
    }

    /// The color attribute, if this is a `textStyle` mark carrying one.
    pub fn color(&self) -> Option<&str> {
        if self.kind != TEXT_STYLE {
            return None;
        }
        self.attrs
            .as_ref()?
            .get("color")?
            .as_str()
            .filter(|c| !c.is_empty())
    }
}

/// Color carried by a mark set, if any.
pub fn marks_color(marks: &[Mark]) -> Option<&str> {
    marks.iter().find_map(Mark::color)
}

/// Return `marks` with the `textStyle` color replaced by `color`.
///
/// Other `textStyle` attributes are kept.
pub fn with_color(marks: &[Mark], color: &str) -> Vec<Mark> {
    let mut out = marks.to_vec();
    match out.iter_mut().find(|m| m.kind == TEXT_STYLE) {
        Some(style) => {
            style
                .attrs
                .get_or_insert_with(Attrs::new)
                .insert("color".into(), Value::String(color.to_string()));
        }
        None => out.push(Mark::text_color(color)),
    }
    out
}

/// A node of the serialized document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub kind: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attrs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<DocNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocNode {
    /// A bare node of the given type.
    pub fn new(kind: impl Into<SmolStr>) -> Self {
        Self {
            kind: kind.into(),
            attrs: None,
            content: None,
            marks: None,
            text: None,
        }
    }

    pub fn doc(content: Vec<DocNode>) -> Self {
        Self {
            content: Some(content),
            ..Self::new(DOC)
        }
    }

    /// A paragraph. Empty content is omitted, as the engine does.
    pub fn paragraph(content: Vec<DocNode>) -> Self {
        Self::new(PARAGRAPH).with_content(content)
    }

    pub fn heading(level: u8, content: Vec<DocNode>) -> Self {
        Self::new(HEADING)
            .with_attr("level", Value::from(level))
            .with_content(content)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(TEXT)
        }
    }

    pub fn image(src: &str, width: Option<u32>) -> Self {
        let node = Self::new(IMAGE).with_attr("src", Value::String(src.to_string()));
        match width {
            Some(width) => node.with_attr("width", Value::from(width)),
            None => node,
        }
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs
            .get_or_insert_with(Attrs::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = if marks.is_empty() { None } else { Some(marks) };
        self
    }

    fn with_content(mut self, content: Vec<DocNode>) -> Self {
        self.content = if content.is_empty() {
            None
        } else {
            Some(content)
        };
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref()?.get(key)
    }

    pub fn children(&self) -> &[DocNode] {
        self.content.as_deref().unwrap_or(&[])
    }

    pub fn is_text(&self) -> bool {
        self.kind == TEXT
    }

    pub fn is_recognized(&self) -> bool {
        RECOGNIZED_TYPES.contains(&self.kind.as_str())
    }

    /// True when this node's children are inline content.
    pub fn is_textblock(&self) -> bool {
        TEXTBLOCK_TYPES.contains(&self.kind.as_str())
    }

    /// True for a `doc` root that carries a content list.
    pub fn is_document(&self) -> bool {
        self.kind == DOC && self.content.is_some()
    }

    /// Size of this node in the engine's position space.
    ///
    /// Text counts one per character, leaf nodes count one, and every other
    /// node counts its content plus an opening and a closing token.
    pub fn node_size(&self) -> usize {
        if self.is_text() {
            return self.text.as_deref().map_or(0, |t| t.chars().count());
        }
        if self.is_atom() {
            return 1;
        }
        self.children().iter().map(DocNode::node_size).sum::<usize>() + 2
    }

    /// Leaf nodes without content of their own (images, breaks, rules).
    pub fn is_atom(&self) -> bool {
        match self.kind.as_str() {
            IMAGE | HARD_BREAK | HORIZONTAL_RULE => true,
            TEXT => false,
            _ => !self.is_recognized() && self.content.is_none(),
        }
    }

    /// Plain-text projection of this node.
    pub fn plain_text(&self) -> String {
        if self.is_text() {
            return self.text.clone().unwrap_or_default();
        }
        if self.kind == HARD_BREAK {
            return "\n".to_string();
        }
        let children = self.children();
        let joins_blocks = CONTAINER_TYPES.contains(&self.kind.as_str())
            || (!self.is_recognized()
                && children
                    .iter()
                    .any(|c| c.is_recognized() && !c.is_text() && !c.is_atom()));
        let parts = children.iter().map(DocNode::plain_text);
        if joins_blocks {
            parts.collect::<Vec<_>>().join("\n")
        } else {
            parts.collect()
        }
    }

    /// Degrade unrecognized non-leaf nodes so the engine never sees them.
    ///
    /// In block position such a node becomes a paragraph holding its plain
    /// text; in inline position it becomes a text node (or disappears when it
    /// has no text). A document left without blocks gets an empty paragraph.
    pub fn normalized(self) -> DocNode {
        let mut doc = self
            .normalize_in(false)
            .unwrap_or_else(|| DocNode::doc(Vec::new()));
        if doc.kind == DOC && doc.children().is_empty() {
            doc.content = Some(vec![DocNode::paragraph(Vec::new())]);
        }
        doc
    }

    fn normalize_in(self, inline: bool) -> Option<DocNode> {
        if self.is_recognized() {
            let children_inline = self.is_textblock();
            let mut node = self;
            node.content = node.content.map(|children| {
                children
                    .into_iter()
                    .filter_map(|c| c.normalize_in(children_inline))
                    .collect()
            });
            return Some(node);
        }
        if self.content.is_none() {
            return Some(self);
        }

        tracing::debug!(kind = %self.kind, inline, "degrading unrecognized node");
        let text = self.plain_text();
        if inline {
            (!text.is_empty()).then(|| DocNode::text(text))
        } else if text.is_empty() {
            Some(DocNode::paragraph(Vec::new()))
        } else {
            Some(DocNode::paragraph(vec![DocNode::text(text)]))
        }
    }
}

/// The minimal valid document for a leaf with the given fallback text.
pub fn fallback_doc(text: &str) -> DocNode {
    if text.is_empty() {
        DocNode::doc(vec![DocNode::paragraph(Vec::new())])
    } else {
        DocNode::doc(vec![DocNode::paragraph(vec![DocNode::text(text)])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(json: &str) -> DocNode {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_paragraph_omits_content() {
        let json = serde_json::to_string(&DocNode::paragraph(Vec::new())).unwrap();
        assert_eq!(json, r#"{"type":"paragraph"}"#);
    }

    #[test]
    fn test_heading_serializes_level() {
        let json = serde_json::to_string(&DocNode::heading(2, vec![DocNode::text("Hi")])).unwrap();
        assert_eq!(
            json,
            r#"{"type":"heading","attrs":{"level":2},"content":[{"type":"text","text":"Hi"}]}"#
        );
    }

    #[test]
    fn test_plain_text_joins_blocks() {
        let doc = node(
            r#"{"type":"doc","content":[
                {"type":"paragraph","content":[{"type":"text","text":"one"}]},
                {"type":"bulletList","content":[
                    {"type":"listItem","content":[{"type":"paragraph","content":[{"type":"text","text":"two"}]}]}
                ]}
            ]}"#,
        );
        assert_eq!(doc.plain_text(), "one\ntwo");
    }

    #[test]
    fn test_plain_text_hard_break() {
        let para = node(
            r#"{"type":"paragraph","content":[
                {"type":"text","text":"a"},{"type":"hardBreak"},{"type":"text","text":"b"}
            ]}"#,
        );
        assert_eq!(para.plain_text(), "a\nb");
    }

    #[test]
    fn test_unknown_block_degrades_to_paragraph() {
        let doc = node(
            r#"{"type":"doc","content":[
                {"type":"callout","content":[{"type":"paragraph","content":[{"type":"text","text":"note"}]}]}
            ]}"#,
        )
        .normalized();
        assert_eq!(
            doc,
            DocNode::doc(vec![DocNode::paragraph(vec![DocNode::text("note")])])
        );
    }

    #[test]
    fn test_unknown_inline_degrades_to_text() {
        let doc = node(
            r#"{"type":"doc","content":[
                {"type":"paragraph","content":[
                    {"type":"text","text":"see "},
                    {"type":"mention","content":[{"type":"text","text":"@ana"}]},
                    {"type":"emoji","content":[]}
                ]}
            ]}"#,
        )
        .normalized();
        assert_eq!(
            doc,
            DocNode::doc(vec![DocNode::paragraph(vec![
                DocNode::text("see "),
                DocNode::text("@ana"),
            ])])
        );
    }

    #[test]
    fn test_empty_doc_gets_paragraph() {
        let doc = DocNode::doc(Vec::new()).normalized();
        assert_eq!(doc, fallback_doc(""));
    }

    #[test]
    fn test_recognized_tree_is_unchanged() {
        let doc = node(
            r##"{"type":"doc","content":[
                {"type":"heading","attrs":{"level":1},"content":[{"type":"text","text":"Title"}]},
                {"type":"paragraph","content":[
                    {"type":"text","marks":[{"type":"textStyle","attrs":{"color":"#ff0000"}}],"text":"red"},
                    {"type":"image","attrs":{"src":"/a.png","width":85}}
                ]}
            ]}"##,
        );
        assert_eq!(doc.clone().normalized(), doc);
    }

    #[test]
    fn test_node_size() {
        let doc = DocNode::doc(vec![
            DocNode::paragraph(vec![DocNode::text("abc"), DocNode::image("/x.png", None)]),
            DocNode::paragraph(Vec::new()),
        ]);
        // (3 + 1 + 2) + (0 + 2) + 2
        assert_eq!(doc.node_size(), 10);
    }

    #[test]
    fn test_with_color_keeps_other_style_attrs() {
        let mut style = Mark::text_color("#000000");
        style
            .attrs
            .as_mut()
            .unwrap()
            .insert("fontFamily".into(), Value::String("serif".into()));
        let marks = with_color(&[style], "#ff0000");
        assert_eq!(marks_color(&marks), Some("#ff0000"));
        assert_eq!(
            marks[0].attrs.as_ref().unwrap().get("fontFamily"),
            Some(&Value::String("serif".into()))
        );
    }
}
