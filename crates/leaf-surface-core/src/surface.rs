//! Rich-text engine capability.
//!
//! The engine is opaque: it owns its document and selection and exposes a
//! command/transaction API. The browser implementation wraps a Tiptap editor;
//! [`crate::TreeEditor`] is an in-memory implementation.

use crate::document::DocNode;

/// Selection in the engine's position space.
///
/// The anchor is where the selection started, the head is where it ends now.
/// They may be in any order - use `from()` and `to()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor position).
    pub fn collapsed(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    /// Lower bound.
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound.
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// One editing operation, committed as a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Focus the surface without changing anything.
    Focus,
    /// Turn the selected blocks into paragraphs.
    SetParagraph,
    /// Turn the selected blocks into headings of `level`.
    SetHeading { level: u8 },
    /// Like `SetHeading`, but headings already at `level` revert to paragraphs.
    ToggleHeading { level: u8 },
    /// Color the selected text, or the text typed next when collapsed.
    SetColor(String),
    /// Replace the selection with an image.
    SetImage { src: String, width: u32 },
    /// Replace the selection with text.
    InsertText(String),
    /// Delete the selected content.
    DeleteSelection,
    /// Collapse the selection at a position.
    SetTextSelection(usize),
}

impl Command {
    /// Whether the command can change document content.
    pub fn edits_content(&self) -> bool {
        !matches!(self, Command::Focus | Command::SetTextSelection(_))
    }
}

/// Outcome of applying a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transaction {
    /// The engine accepted the command.
    pub applied: bool,
    /// The document content changed.
    pub doc_changed: bool,
}

impl Transaction {
    pub const REJECTED: Transaction = Transaction {
        applied: false,
        doc_changed: false,
    };

    pub fn applied(doc_changed: bool) -> Self {
        Self {
            applied: true,
            doc_changed,
        }
    }
}

/// A live rich-text surface.
pub trait RichSurface {
    /// The full current document.
    fn document(&self) -> DocNode;

    /// The current selection.
    fn selection(&self) -> Selection;

    /// Put back a previously observed selection.
    fn restore_selection(&mut self, selection: Selection);

    /// Focus the surface, leaving the selection alone.
    fn focus(&mut self);

    /// Focus, apply `command`, and commit it as one transaction.
    fn apply(&mut self, command: &Command) -> Transaction;

    /// Color reported by the `textStyle` mark at the selection.
    fn text_color(&self) -> Option<String>;

    /// Whether the selection is entirely `color`.
    fn is_color_active(&self, color: &str) -> bool;

    /// Whether the selection is inside an image.
    fn is_image_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds() {
        let sel = Selection::new(9, 4);
        assert_eq!(sel.from(), 4);
        assert_eq!(sel.to(), 9);
        assert!(!sel.is_empty());
        assert!(Selection::collapsed(3).is_empty());
    }

    #[test]
    fn test_edits_content() {
        assert!(!Command::Focus.edits_content());
        assert!(!Command::SetTextSelection(2).edits_content());
        assert!(Command::SetColor("#000".into()).edits_content());
    }
}
