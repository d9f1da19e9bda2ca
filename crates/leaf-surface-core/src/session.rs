//! Editing sessions.
//!
//! An [`EditingSession`] wraps the page's one editable surface. Every event
//! it handles returns an [`OverlayReport`] for the host to apply, so the
//! overlay never has to query the surface on its own.
//!
//! When the engine is unavailable the editor runs a [`PlainSession`] over a
//! bare editable element instead.

use crate::config::SurfaceConfig;
use crate::document::{DocNode, fallback_doc};
use crate::loader::{load_document, serialize_document};
use crate::overlay::{ColorSync, OverlayReport, Placement, RenderedBounds, place_remove_control};
use crate::surface::{Command, RichSurface, Selection, Transaction};

/// The form field the serialized document is submitted through.
pub trait SubmissionField {
    fn value(&self) -> String;

    fn set_value(&self, value: &str);
}

/// Initial editor content: the field's current value, or an empty document.
pub fn initial_content<F: SubmissionField + ?Sized>(field: &F) -> DocNode {
    load_document(Some(&field.value()), "")
}

pub struct EditingSession<S, F, B> {
    surface: S,
    field: F,
    bounds: B,
    color: ColorSync,
    last_selection: Option<Selection>,
    remove_inset: f64,
}

impl<S, F, B> EditingSession<S, F, B>
where
    S: RichSurface,
    F: SubmissionField,
    B: RenderedBounds,
{
    pub fn new(surface: S, field: F, bounds: B, config: &SurfaceConfig) -> Self {
        Self {
            surface,
            field,
            bounds,
            color: ColorSync::default(),
            last_selection: None,
            remove_inset: config.remove_control_inset,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    /// The sticky color, if one is set.
    pub fn active_color(&self) -> Option<&str> {
        self.color.desired()
    }

    pub fn last_selection(&self) -> Option<Selection> {
        self.last_selection
    }

    /// Apply one command and process the events it produces: the
    /// transaction, then a selection update if the selection moved.
    pub fn run(&mut self, command: &Command) -> OverlayReport {
        let before = self.surface.selection();
        let tx = self.surface.apply(command);
        if !tx.applied {
            tracing::trace!(?command, "command not applied");
        }
        let mut report = self.on_transaction(tx);
        if self.surface.selection() != before {
            let update = self.on_selection_update();
            report.remove_control = update.remove_control;
            report.color_input = update.color_input;
        }
        report
    }

    /// Handle a committed transaction.
    ///
    /// Persists changed content, then reapplies the sticky color when the
    /// selection lost it. The correction's own transaction is processed here
    /// under the correcting guard, so it is never corrected again.
    pub fn on_transaction(&mut self, tx: Transaction) -> OverlayReport {
        if tx.doc_changed {
            self.persist();
        }
        if let Some(color) = self.color.begin_correction(&self.surface) {
            tracing::trace!(%color, "reapplying sticky color");
            let fix = self.surface.apply(&Command::SetColor(color));
            self.on_transaction(fix);
            self.color.finish_correction();
        }
        OverlayReport {
            remove_control: self.place_remove_control(),
            color_input: None,
        }
    }

    /// Handle a selection change: remember it, adopt its color.
    pub fn on_selection_update(&mut self) -> OverlayReport {
        self.last_selection = Some(self.surface.selection());
        let observed = self.surface.text_color();
        OverlayReport {
            remove_control: self.place_remove_control(),
            color_input: self.color.adopt(observed.as_deref()),
        }
    }

    /// The color input changed: restore the last selection and color it.
    pub fn apply_color_input(&mut self, color: &str) -> OverlayReport {
        self.color.choose(color);
        if let Some(selection) = self.last_selection {
            self.surface.restore_selection(selection);
        }
        self.run(&Command::SetColor(color.to_string()))
    }

    /// A touch landed on an image at `pos`, or on one whose position could
    /// not be resolved.
    pub fn touch_image(&mut self, pos: Option<usize>) -> OverlayReport {
        match pos {
            Some(pos) => self.run(&Command::SetTextSelection(pos + 1)),
            None => self.run(&Command::Focus),
        }
    }

    /// The remove control was clicked.
    pub fn remove_image(&mut self) -> OverlayReport {
        let mut report = self.run(&Command::DeleteSelection);
        report.remove_control = Placement::HIDDEN;
        report
    }

    /// Placement of the remove control for the current selection.
    pub fn place_remove_control(&self) -> Placement {
        place_remove_control(
            self.surface.is_image_active(),
            self.surface.selection().from(),
            &self.bounds,
            self.remove_inset,
        )
    }

    /// Write the current document to the submission field.
    pub fn persist(&self) {
        self.field
            .set_value(&serialize_document(&self.surface.document()));
    }

    /// The form is being submitted.
    pub fn submit(&self) {
        self.persist();
    }
}

/// A bare editable element standing in for the rich surface.
pub trait PlainSurface {
    fn inner_text(&self) -> String;

    fn has_focus(&self) -> bool;

    /// Insert text at the caret.
    fn insert_at_cursor(&self, text: &str);

    fn append_text(&self, text: &str);

    /// Turn the element editable.
    fn make_editable(&self);
}

/// Editor session without the rich-text engine.
pub struct PlainSession<P, F> {
    surface: P,
    field: F,
}

impl<P: PlainSurface, F: SubmissionField> PlainSession<P, F> {
    pub fn new(surface: P, field: F) -> Self {
        surface.make_editable();
        Self { surface, field }
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    /// The document the element's text currently represents.
    pub fn document(&self) -> DocNode {
        fallback_doc(self.surface.inner_text().trim())
    }

    pub fn on_input(&self) {
        self.field.set_value(&serialize_document(&self.document()));
    }

    pub fn submit(&self) {
        self.on_input();
    }

    /// Insert text at the caret when focused, otherwise append it.
    pub fn insert_text(&self, text: &str) {
        if self.surface.has_focus() {
            self.surface.insert_at_cursor(text);
        } else {
            self.surface.append_text(text);
        }
        self.on_input();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Mark, PARAGRAPH};
    use crate::overlay::Rect;
    use crate::testing::{FakeBounds, FakeField, FakePlainSurface};
    use crate::tree_editor::TreeEditor;

    type Session = EditingSession<TreeEditor, FakeField, FakeBounds>;

    fn session(field: &FakeField, bounds: FakeBounds) -> Session {
        let doc = initial_content(field);
        EditingSession::new(TreeEditor::new(&doc), field.clone(), bounds, &SurfaceConfig::default())
    }

    fn canvas() -> FakeBounds {
        FakeBounds::new(Rect::new(0.0, 0.0, 600.0, 800.0))
    }

    #[test]
    fn test_initial_content_from_field() {
        assert_eq!(initial_content(&FakeField::default()), fallback_doc(""));
        let field = FakeField::with_value(&serialize_document(&fallback_doc("draft")));
        assert_eq!(initial_content(&field).plain_text(), "draft");
        assert_eq!(initial_content(&FakeField::with_value("{nope")), fallback_doc(""));
    }

    #[test]
    fn test_content_change_persists() {
        let field = FakeField::default();
        let mut session = session(&field, canvas());
        session.run(&Command::SetTextSelection(1));
        assert_eq!(field.writes(), 0);

        session.run(&Command::InsertText("Hi".into()));
        assert_eq!(field.writes(), 1);
        assert_eq!(load_document(Some(&field.value()), ""), fallback_doc("Hi"));
    }

    #[test]
    fn test_submit_without_edits_writes_empty_doc() {
        let field = FakeField::default();
        let session = session(&field, canvas());
        assert_eq!(field.writes(), 0);
        session.submit();
        assert_eq!(field.writes(), 1);
        assert_eq!(field.value(), crate::loader::EMPTY_DOC_JSON);
    }

    #[test]
    fn test_session_round_trip() {
        let field = FakeField::default();
        let mut session = session(&field, canvas());
        session.run(&Command::InsertText("Chapter".into()));
        session.run(&Command::ToggleHeading { level: 2 });
        session.run(&Command::SetImage {
            src: "/media/leaf/1.png".into(),
            width: 85,
        });
        session.submit();
        let stored = load_document(Some(&field.value()), "");
        assert_eq!(stored, session.surface().document());
    }

    #[test]
    fn test_sticky_color_survives_heading_toggle() {
        let field = FakeField::with_value(&serialize_document(&fallback_doc("ab")));
        let mut session = session(&field, canvas());
        session.run(&Command::SetTextSelection(3));
        session.on_selection_update();

        session.apply_color_input("#ff0000");
        assert_eq!(session.active_color(), Some("#ff0000"));

        session.run(&Command::ToggleHeading { level: 1 });
        assert_eq!(session.surface().text_color().as_deref(), Some("#ff0000"));
        assert_eq!(session.surface().document().children()[0].kind.as_str(), "heading");

        session.run(&Command::InsertText("c".into()));
        let document = session.surface().document();
        let heading = &document.children()[0];
        assert_eq!(
            heading.children()[1],
            DocNode::text("c").with_marks(vec![Mark::text_color("#ff0000")])
        );
    }

    #[test]
    fn test_correction_is_not_repeated() {
        let field = FakeField::with_value(
            r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"image","attrs":{"src":"/a.png"}}]}]}"#,
        );
        let mut session = session(&field, canvas());
        session.surface_mut().restore_selection(Selection::new(1, 2));
        session.apply_color_input("#00ff00");
        // An image-only range can never report a color; the guard stops the loop.
        assert!(!session.surface().is_color_active("#00ff00"));
        assert_eq!(session.active_color(), Some("#00ff00"));
    }

    #[test]
    fn test_selection_adopts_color() {
        let field = FakeField::with_value(&serialize_document(&DocNode::doc(vec![
            DocNode::paragraph(vec![
                DocNode::text("blue").with_marks(vec![Mark::text_color("#0000ff")]),
                DocNode::text(" plain"),
            ]),
        ])));
        let mut session = session(&field, canvas());
        session.run(&Command::SetTextSelection(3));
        let report = session.on_selection_update();
        assert_eq!(report.color_input.as_deref(), Some("#0000ff"));
        assert_eq!(session.last_selection(), Some(Selection::collapsed(3)));

        // Moving into uncolored text reapplies the sticky color for typing.
        session.run(&Command::SetTextSelection(9));
        assert_eq!(session.surface().text_color().as_deref(), Some("#0000ff"));
        assert_eq!(session.active_color(), Some("#0000ff"));
        assert_eq!(field.writes(), 0);
    }

    #[test]
    fn test_color_input_restores_selection() {
        let field = FakeField::with_value(&serialize_document(&fallback_doc("hello")));
        let mut session = session(&field, canvas());
        session.surface_mut().restore_selection(Selection::new(1, 3));
        session.on_selection_update();
        // Focus moving to the color input collapses the surface selection.
        session.surface_mut().restore_selection(Selection::collapsed(6));

        session.apply_color_input("#ff0000");
        assert_eq!(session.surface().selection(), Selection::new(1, 3));
        assert_eq!(
            session.surface().document().children()[0].children()[0],
            DocNode::text("he").with_marks(vec![Mark::text_color("#ff0000")])
        );
    }

    #[test]
    fn test_remove_control_follows_selection() {
        let field = FakeField::with_value(&serialize_document(&DocNode::doc(vec![
            DocNode::paragraph(vec![DocNode::text("a"), DocNode::image("/i.png", Some(85))]),
        ])));
        let bounds = canvas().with_image(2, Rect::new(40.0, 100.0, 240.0, 300.0));
        let mut session = session(&field, bounds);

        // A touch leaves a caret after the image, which does not select it.
        let report = session.touch_image(Some(2));
        assert_eq!(session.surface().selection(), Selection::collapsed(3));
        assert_eq!(report.remove_control, Placement::HIDDEN);

        session.surface_mut().restore_selection(Selection::new(2, 3));
        let report = session.on_selection_update();
        assert_eq!(
            report.remove_control,
            Placement {
                visible: true,
                left: 226.0,
                top: 86.0
            }
        );

        session.run(&Command::SetTextSelection(1));
        let report = session.on_selection_update();
        assert!(!report.remove_control.visible);
    }

    #[test]
    fn test_remove_image_hides_control() {
        let field = FakeField::with_value(&serialize_document(&DocNode::doc(vec![
            DocNode::paragraph(vec![DocNode::image("/i.png", Some(85))]),
        ])));
        let bounds = canvas().with_image(1, Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut session = session(&field, bounds);
        session.surface_mut().restore_selection(Selection::new(1, 2));
        assert!(session.on_selection_update().remove_control.visible);

        let report = session.remove_image();
        assert_eq!(report.remove_control, Placement::HIDDEN);
        assert_eq!(session.surface().document(), fallback_doc(""));
        assert_eq!(field.value(), crate::loader::EMPTY_DOC_JSON);
    }

    #[test]
    fn test_touch_without_position_only_focuses() {
        let field = FakeField::default();
        let mut session = session(&field, canvas());
        let before = session.surface().selection();
        session.touch_image(None);
        assert!(session.surface().is_focused());
        assert_eq!(session.surface().selection(), before);
        assert_eq!(field.writes(), 0);
    }

    #[test]
    fn test_plain_session_wraps_text() {
        let surface = FakePlainSurface::default();
        *surface.text.borrow_mut() = "  typed words \n".into();
        let field = FakeField::default();
        let session = PlainSession::new(surface, field.clone());
        session.on_input();
        assert_eq!(load_document(Some(&field.value()), ""), fallback_doc("typed words"));

        *session.surface().text.borrow_mut() = String::new();
        session.submit();
        assert_eq!(field.value(), crate::loader::EMPTY_DOC_JSON);
        assert_eq!(session.document().children()[0].kind.as_str(), PARAGRAPH);
    }

    #[test]
    fn test_plain_insert_focus_and_append() {
        let field = FakeField::default();
        let session = PlainSession::new(FakePlainSurface::default(), field.clone());
        session.insert_text("end");
        session.surface().focused.set(true);
        session.insert_text("start ");
        assert_eq!(session.surface().inner_text(), "start end");
        assert_eq!(field.writes(), 2);
    }
}
