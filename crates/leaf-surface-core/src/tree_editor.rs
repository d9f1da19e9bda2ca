//! In-memory rich-text surface over the document tree.
//!
//! Positions follow the engine's scheme: a block opens at +1, every text
//! character or inline atom (image, hard break) takes one position, and a
//! block closes at +1. Paragraphs and headings are editable; every other
//! top-level block is held opaquely at its full node size so it survives
//! untouched.
//!
//! Stored marks behave like the engine's: a color set on a collapsed
//! selection applies to the next inserted text, and any content change or
//! selection move drops it.

use std::ops::RangeInclusive;

use serde_json::Value;
use smol_str::SmolStr;

use crate::document::{Attrs, DocNode, HEADING, IMAGE, Mark, PARAGRAPH, marks_color, with_color};
use crate::surface::{Command, RichSurface, Selection, Transaction};

#[derive(Debug, Clone, PartialEq)]
enum Inline {
    Char { ch: char, marks: Vec<Mark> },
    Atom(DocNode),
}

impl Inline {
    fn is_image(&self) -> bool {
        matches!(self, Inline::Atom(node) if node.kind == IMAGE)
    }

    fn marks(&self) -> &[Mark] {
        match self {
            Inline::Char { marks, .. } => marks,
            Inline::Atom(node) => node.marks.as_deref().unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TextBlock {
    kind: SmolStr,
    attrs: Option<Attrs>,
    inlines: Vec<Inline>,
}

impl TextBlock {
    fn from_node(node: &DocNode) -> Self {
        let mut inlines = Vec::new();
        for child in node.children() {
            if child.is_text() {
                let marks = child.marks.clone().unwrap_or_default();
                let text = child.text.as_deref().unwrap_or_default();
                inlines.extend(text.chars().map(|ch| Inline::Char {
                    ch,
                    marks: marks.clone(),
                }));
            } else {
                inlines.push(Inline::Atom(child.clone()));
            }
        }
        Self {
            kind: node.kind.clone(),
            attrs: node.attrs.clone(),
            inlines,
        }
    }

    fn to_node(&self) -> DocNode {
        let mut content = Vec::new();
        let mut run = String::new();
        let mut run_marks: &[Mark] = &[];

        for inline in &self.inlines {
            match inline {
                Inline::Char { ch, marks } => {
                    if !run.is_empty() && run_marks != marks.as_slice() {
                        let text = std::mem::take(&mut run);
                        content.push(DocNode::text(text).with_marks(run_marks.to_vec()));
                    }
                    run_marks = marks.as_slice();
                    run.push(*ch);
                }
                Inline::Atom(node) => {
                    if !run.is_empty() {
                        let text = std::mem::take(&mut run);
                        content.push(DocNode::text(text).with_marks(run_marks.to_vec()));
                    }
                    content.push(node.clone());
                }
            }
        }
        if !run.is_empty() {
            content.push(DocNode::text(run).with_marks(run_marks.to_vec()));
        }

        DocNode {
            kind: self.kind.clone(),
            attrs: self.attrs.clone(),
            content: (!content.is_empty()).then_some(content),
            marks: None,
            text: None,
        }
    }

    fn heading_level(&self) -> Option<u64> {
        if self.kind != HEADING {
            return None;
        }
        self.attrs.as_ref()?.get("level")?.as_u64()
    }

    /// Change the block type, returning whether anything changed.
    fn set_type(&mut self, kind: &str, level: Option<u8>) -> bool {
        let before = (self.kind.clone(), self.attrs.clone());
        let mut attrs = self.attrs.take().unwrap_or_default();
        match level {
            Some(level) => {
                attrs.insert("level".into(), Value::from(level));
            }
            None => {
                attrs.remove("level");
            }
        }
        self.attrs = (!attrs.is_empty()).then_some(attrs);
        self.kind = kind.into();
        (self.kind.clone(), self.attrs.clone()) != before
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Text(TextBlock),
    Opaque(DocNode),
}

impl Block {
    fn size(&self) -> usize {
        match self {
            Block::Text(text) => text.inlines.len() + 2,
            Block::Opaque(node) => node.node_size(),
        }
    }

    fn to_node(&self) -> DocNode {
        match self {
            Block::Text(text) => text.to_node(),
            Block::Opaque(node) => node.clone(),
        }
    }
}

/// Headless implementation of [`RichSurface`].
#[derive(Debug, Clone)]
pub struct TreeEditor {
    blocks: Vec<Block>,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
    editable: bool,
    focused: bool,
}

impl TreeEditor {
    /// An editable surface over `doc`.
    pub fn new(doc: &DocNode) -> Self {
        Self::build(doc, true)
    }

    /// A surface that only renders; content commands are rejected.
    pub fn read_only(doc: &DocNode) -> Self {
        Self::build(doc, false)
    }

    fn build(doc: &DocNode, editable: bool) -> Self {
        let mut blocks: Vec<Block> = doc
            .children()
            .iter()
            .map(|node| match node.kind.as_str() {
                PARAGRAPH | HEADING => Block::Text(TextBlock::from_node(node)),
                _ => Block::Opaque(node.clone()),
            })
            .collect();
        if blocks.is_empty() {
            blocks.push(Block::Text(TextBlock::from_node(&DocNode::paragraph(Vec::new()))));
        }

        let mut editor = Self {
            blocks,
            selection: Selection::default(),
            stored_marks: None,
            editable,
            focused: false,
        };
        editor.selection = Selection::collapsed(editor.first_text_position());
        editor
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Size of the document content.
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::size).sum()
    }

    /// Position directly before each image, in document order.
    pub fn image_positions(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut start = 0;
        for block in &self.blocks {
            if let Block::Text(text) = block {
                out.extend(
                    text.inlines
                        .iter()
                        .enumerate()
                        .filter(|(_, inline)| inline.is_image())
                        .map(|(offset, _)| start + 1 + offset),
                );
            }
            start += block.size();
        }
        out
    }

    fn first_text_position(&self) -> usize {
        let mut start = 0;
        for block in &self.blocks {
            if matches!(block, Block::Text(_)) {
                return start + 1;
            }
            start += block.size();
        }
        0
    }

    /// Map a position to (block index, inline offset) inside an editable block.
    fn locate(&self, pos: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            if let Block::Text(text) = block {
                if pos > start && pos <= start + 1 + text.inlines.len() {
                    return Some((index, pos - start - 1));
                }
            }
            start += block.size();
        }
        None
    }

    fn text_block(&self, index: usize) -> Option<&TextBlock> {
        match self.blocks.get(index)? {
            Block::Text(text) => Some(text),
            Block::Opaque(_) => None,
        }
    }

    fn text_block_mut(&mut self, index: usize) -> Option<&mut TextBlock> {
        match self.blocks.get_mut(index)? {
            Block::Text(text) => Some(text),
            Block::Opaque(_) => None,
        }
    }

    /// Marks the cursor at `pos` would type with.
    fn marks_at(&self, pos: usize) -> Vec<Mark> {
        let Some((index, offset)) = self.locate(pos) else {
            return Vec::new();
        };
        let Some(block) = self.text_block(index) else {
            return Vec::new();
        };
        let neighbour = if offset > 0 {
            block.inlines.get(offset - 1)
        } else {
            block.inlines.get(offset)
        };
        neighbour.map(|i| i.marks().to_vec()).unwrap_or_default()
    }

    fn inlines_between(&self, from: usize, to: usize) -> Vec<&Inline> {
        let mut out = Vec::new();
        let mut start = 0;
        for block in &self.blocks {
            if let Block::Text(text) = block {
                let content_start = start + 1;
                let lo = from.max(content_start);
                let hi = to.min(content_start + text.inlines.len());
                if lo < hi {
                    out.extend(&text.inlines[lo - content_start..hi - content_start]);
                }
            }
            start += block.size();
        }
        out
    }

    fn recolor_between(&mut self, from: usize, to: usize, color: &str) -> bool {
        let mut changed = false;
        let mut start = 0;
        for block in &mut self.blocks {
            let size = block.size();
            if let Block::Text(text) = block {
                let content_start = start + 1;
                let lo = from.max(content_start);
                let hi = to.min(content_start + text.inlines.len());
                if lo < hi {
                    for inline in &mut text.inlines[lo - content_start..hi - content_start] {
                        if let Inline::Char { marks, .. } = inline {
                            let recolored = with_color(marks, color);
                            if recolored != *marks {
                                *marks = recolored;
                                changed = true;
                            }
                        }
                    }
                }
            }
            start += size;
        }
        changed
    }

    fn delete_between(&mut self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let (Some((first, first_offset)), Some((last, last_offset))) =
            (self.locate(from), self.locate(to))
        else {
            return false;
        };

        if first == last {
            if let Some(block) = self.text_block_mut(first) {
                block.inlines.drain(first_offset..last_offset);
            }
            return true;
        }

        let tail = match self.text_block(last) {
            Some(block) => block.inlines[last_offset..].to_vec(),
            None => return false,
        };
        if let Some(block) = self.text_block_mut(first) {
            block.inlines.truncate(first_offset);
            block.inlines.extend(tail);
        }
        self.blocks.drain(first + 1..=last);
        true
    }

    fn insert_at(&mut self, pos: usize, items: Vec<Inline>) -> bool {
        let Some((index, offset)) = self.locate(pos) else {
            return false;
        };
        match self.text_block_mut(index) {
            Some(block) => {
                block.inlines.splice(offset..offset, items);
                true
            }
            None => false,
        }
    }

    fn set_selection(&mut self, selection: Selection) {
        let max = self.content_size();
        let selection = Selection::new(selection.anchor.min(max), selection.head.min(max));
        if selection != self.selection {
            self.stored_marks = None;
        }
        self.selection = selection;
    }

    /// Indices of the blocks the selection touches.
    fn selected_blocks(&self) -> Option<RangeInclusive<usize>> {
        let (first, _) = self.locate(self.selection.from())?;
        let (last, _) = self.locate(self.selection.to())?;
        Some(first..=last)
    }

    fn retype(
        &mut self,
        blocks: RangeInclusive<usize>,
        kind: &str,
        level: Option<u8>,
    ) -> Transaction {
        let mut changed = false;
        for index in blocks {
            if let Some(block) = self.text_block_mut(index) {
                changed |= block.set_type(kind, level);
            }
        }
        Transaction::applied(changed)
    }

    fn heading(&mut self, level: u8, toggle: bool) -> Transaction {
        if !(1..=6).contains(&level) {
            return Transaction::REJECTED;
        }
        let Some(blocks) = self.selected_blocks() else {
            return Transaction::REJECTED;
        };
        let already = blocks
            .clone()
            .filter_map(|i| self.text_block(i))
            .all(|b| b.heading_level() == Some(u64::from(level)));
        if toggle && already {
            self.retype(blocks, PARAGRAPH, None)
        } else {
            self.retype(blocks, HEADING, Some(level))
        }
    }

    fn replace_selection(&mut self, items: Vec<Inline>) -> Transaction {
        let from = self.selection.from();
        if self.locate(from).is_none() || !self.delete_between(from, self.selection.to()) {
            return Transaction::REJECTED;
        }
        let len = items.len();
        if !self.insert_at(from, items) {
            return Transaction::REJECTED;
        }
        self.selection = Selection::collapsed(from + len);
        Transaction::applied(true)
    }

    fn run(&mut self, command: &Command) -> Transaction {
        if !self.editable && command.edits_content() {
            tracing::trace!(?command, "read-only surface rejected command");
            return Transaction::REJECTED;
        }

        match command {
            Command::Focus => Transaction::applied(false),
            Command::SetTextSelection(pos) => {
                self.set_selection(Selection::collapsed(*pos));
                Transaction::applied(false)
            }
            Command::SetParagraph => match self.selected_blocks() {
                Some(blocks) => self.retype(blocks, PARAGRAPH, None),
                None => Transaction::REJECTED,
            },
            Command::SetHeading { level } => self.heading(*level, false),
            Command::ToggleHeading { level } => self.heading(*level, true),
            Command::SetColor(color) => {
                if self.selection.is_empty() {
                    let base = match &self.stored_marks {
                        Some(marks) => marks.clone(),
                        None => self.marks_at(self.selection.head),
                    };
                    self.stored_marks = Some(with_color(&base, color));
                    return Transaction::applied(false);
                }
                let (from, to) = (self.selection.from(), self.selection.to());
                let changed = self.recolor_between(from, to, color);
                Transaction::applied(changed)
            }
            Command::SetImage { src, width } => {
                self.replace_selection(vec![Inline::Atom(DocNode::image(src, Some(*width)))])
            }
            Command::InsertText(text) => {
                if text.is_empty() {
                    return Transaction::REJECTED;
                }
                let marks = match self.stored_marks.take() {
                    Some(marks) => marks,
                    None => self.marks_at(self.selection.from()),
                };
                let items = text
                    .chars()
                    .map(|ch| Inline::Char {
                        ch,
                        marks: marks.clone(),
                    })
                    .collect();
                self.replace_selection(items)
            }
            Command::DeleteSelection => {
                if self.selection.is_empty() {
                    return Transaction::REJECTED;
                }
                let from = self.selection.from();
                if !self.delete_between(from, self.selection.to()) {
                    return Transaction::REJECTED;
                }
                self.selection = Selection::collapsed(from);
                Transaction::applied(true)
            }
        }
    }
}

impl RichSurface for TreeEditor {
    fn document(&self) -> DocNode {
        DocNode::doc(self.blocks.iter().map(Block::to_node).collect())
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn restore_selection(&mut self, selection: Selection) {
        self.set_selection(selection);
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn apply(&mut self, command: &Command) -> Transaction {
        self.focus();
        let tx = self.run(command);
        if tx.doc_changed {
            self.stored_marks = None;
        }
        tx
    }

    fn text_color(&self) -> Option<String> {
        if self.selection.is_empty() {
            let marks = match &self.stored_marks {
                Some(marks) => marks.clone(),
                None => self.marks_at(self.selection.head),
            };
            return marks_color(&marks).map(str::to_string);
        }
        self.inlines_between(self.selection.from(), self.selection.to())
            .into_iter()
            .find_map(|inline| match inline {
                Inline::Char { marks, .. } => Some(marks_color(marks).map(str::to_string)),
                Inline::Atom(_) => None,
            })
            .flatten()
    }

    fn is_color_active(&self, color: &str) -> bool {
        if self.selection.is_empty() {
            return self.text_color().as_deref() == Some(color);
        }
        let chars: Vec<_> = self
            .inlines_between(self.selection.from(), self.selection.to())
            .into_iter()
            .filter_map(|inline| match inline {
                Inline::Char { marks, .. } => Some(marks_color(marks)),
                Inline::Atom(_) => None,
            })
            .collect();
        !chars.is_empty() && chars.iter().all(|c| *c == Some(color))
    }

    fn is_image_active(&self) -> bool {
        let (from, to) = (self.selection.from(), self.selection.to());
        // Active only when images cover the whole range; a caret covers nothing.
        let images = self
            .inlines_between(from, to)
            .into_iter()
            .filter(|inline| inline.is_image())
            .count();
        images > 0 && images == to - from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fallback_doc;
    use crate::loader::load_document;

    fn doc(json: &str) -> DocNode {
        load_document(Some(json), "")
    }

    fn two_blocks() -> TreeEditor {
        // paragraph "ab" occupies 0..4, heading "cd" occupies 4..8
        TreeEditor::new(&DocNode::doc(vec![
            DocNode::paragraph(vec![DocNode::text("ab")]),
            DocNode::heading(2, vec![DocNode::text("cd")]),
        ]))
    }

    #[test]
    fn test_initial_selection_at_first_text() {
        let editor = two_blocks();
        assert_eq!(editor.selection(), Selection::collapsed(1));
        assert_eq!(editor.content_size(), 8);
    }

    #[test]
    fn test_document_round_trip() {
        let source = doc(
            r##"{"type":"doc","content":[
                {"type":"heading","attrs":{"level":1},"content":[{"type":"text","text":"Title"}]},
                {"type":"bulletList","content":[{"type":"listItem","content":[{"type":"paragraph","content":[{"type":"text","text":"item"}]}]}]},
                {"type":"paragraph","attrs":{"textAlign":"center"},"content":[
                    {"type":"text","marks":[{"type":"textStyle","attrs":{"color":"#00ff00"}}],"text":"green"},
                    {"type":"hardBreak"},
                    {"type":"image","attrs":{"src":"/x.png","width":85}}
                ]}
            ]}"##,
        );
        assert_eq!(TreeEditor::new(&source).document(), source);
    }

    #[test]
    fn test_color_range_splits_text() {
        let mut editor = TreeEditor::new(&fallback_doc("hello"));
        editor.restore_selection(Selection::new(2, 4));
        let tx = editor.apply(&Command::SetColor("#ff0000".into()));
        assert_eq!(tx, Transaction::applied(true));
        assert!(editor.is_color_active("#ff0000"));

        let expected = DocNode::doc(vec![DocNode::paragraph(vec![
            DocNode::text("h"),
            DocNode::text("el").with_marks(vec![Mark::text_color("#ff0000")]),
            DocNode::text("lo"),
        ])]);
        assert_eq!(editor.document(), expected);
    }

    #[test]
    fn test_stored_color_applies_to_typed_text() {
        let mut editor = TreeEditor::new(&fallback_doc("ab"));
        editor.apply(&Command::SetTextSelection(3));
        let tx = editor.apply(&Command::SetColor("#0000ff".into()));
        assert!(!tx.doc_changed);
        assert_eq!(editor.text_color().as_deref(), Some("#0000ff"));

        editor.apply(&Command::InsertText("c".into()));
        assert_eq!(editor.selection(), Selection::collapsed(4));
        // The cursor now sits after colored text, so the color persists.
        assert!(editor.is_color_active("#0000ff"));
        assert_eq!(
            editor.document().children()[0].children()[1],
            DocNode::text("c").with_marks(vec![Mark::text_color("#0000ff")])
        );
    }

    #[test]
    fn test_content_change_drops_stored_color() {
        let mut editor = TreeEditor::new(&fallback_doc("ab"));
        editor.apply(&Command::SetColor("#ff0000".into()));
        assert!(editor.is_color_active("#ff0000"));
        let tx = editor.apply(&Command::ToggleHeading { level: 1 });
        assert!(tx.doc_changed);
        assert_eq!(editor.text_color(), None);
    }

    #[test]
    fn test_toggle_heading() {
        let mut editor = two_blocks();
        editor.apply(&Command::SetTextSelection(5));
        let tx = editor.apply(&Command::ToggleHeading { level: 2 });
        assert!(tx.doc_changed);
        assert_eq!(editor.document().children()[1].kind.as_str(), PARAGRAPH);
        assert_eq!(editor.document().children()[1].attrs, None);

        editor.apply(&Command::ToggleHeading { level: 3 });
        assert_eq!(editor.document().children()[1], DocNode::heading(3, vec![DocNode::text("cd")]));
    }

    #[test]
    fn test_set_heading_is_not_a_toggle() {
        let mut editor = two_blocks();
        editor.apply(&Command::SetTextSelection(5));
        let tx = editor.apply(&Command::SetHeading { level: 2 });
        assert_eq!(tx, Transaction::applied(false));
        assert!(!editor.apply(&Command::SetHeading { level: 9 }).applied);
    }

    #[test]
    fn test_heading_over_two_blocks() {
        let mut editor = two_blocks();
        editor.restore_selection(Selection::new(1, 6));
        editor.apply(&Command::SetParagraph);
        let kinds: Vec<String> = editor
            .document()
            .children()
            .iter()
            .map(|n| n.kind.to_string())
            .collect();
        assert_eq!(kinds, vec!["paragraph", "paragraph"]);
    }

    #[test]
    fn test_image_insert_and_delete() {
        let mut editor = TreeEditor::new(&fallback_doc("ab"));
        editor.apply(&Command::SetTextSelection(2));
        let tx = editor.apply(&Command::SetImage {
            src: "/m/x.png".into(),
            width: 85,
        });
        assert!(tx.doc_changed);
        assert_eq!(editor.image_positions(), vec![2]);
        assert_eq!(editor.selection(), Selection::collapsed(3));
        assert!(!editor.is_image_active());

        editor.restore_selection(Selection::new(1, 3));
        assert!(!editor.is_image_active());
        editor.restore_selection(Selection::new(2, 3));
        assert!(editor.is_image_active());
        editor.apply(&Command::DeleteSelection);
        assert_eq!(editor.document(), fallback_doc("ab"));
        assert!(!editor.is_image_active());
    }

    #[test]
    fn test_delete_empty_selection_rejected() {
        let mut editor = TreeEditor::new(&fallback_doc("ab"));
        assert_eq!(editor.apply(&Command::DeleteSelection), Transaction::REJECTED);
    }

    #[test]
    fn test_delete_across_blocks_merges() {
        let mut editor = two_blocks();
        editor.restore_selection(Selection::new(2, 6));
        editor.apply(&Command::DeleteSelection);
        assert_eq!(
            editor.document(),
            DocNode::doc(vec![DocNode::paragraph(vec![DocNode::text("ad")])])
        );
    }

    #[test]
    fn test_opaque_block_rejects_edits() {
        let mut editor = TreeEditor::new(&doc(
            r#"{"type":"doc","content":[{"type":"codeBlock","content":[{"type":"text","text":"x"}]}]}"#,
        ));
        assert_eq!(editor.selection(), Selection::collapsed(0));
        assert!(!editor.apply(&Command::InsertText("y".into())).applied);
        assert!(!editor.apply(&Command::SetParagraph).applied);
    }

    #[test]
    fn test_read_only_rejects_content_commands() {
        let mut editor = TreeEditor::read_only(&fallback_doc("ab"));
        assert!(!editor.apply(&Command::InsertText("x".into())).applied);
        assert!(!editor.apply(&Command::SetColor("#fff".into())).applied);
        assert!(editor.apply(&Command::SetTextSelection(2)).applied);
        assert_eq!(editor.document(), fallback_doc("ab"));
    }
}
