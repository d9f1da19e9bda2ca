//! Test doubles for host-side traits.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::document::DocNode;
use crate::error::SurfaceError;
use crate::mount::{LeafAnchor, SurfaceFactory, SurfaceRole};
use crate::overlay::{Rect, RenderedBounds};
use crate::session::{PlainSurface, SubmissionField};

pub struct FakeAnchor {
    id: String,
    payload: Option<String>,
    text: String,
    ready: Cell<bool>,
    shown: RefCell<Option<String>>,
}

impl FakeAnchor {
    pub fn new(id: &str, payload: Option<&str>, text: &str) -> Self {
        Self {
            id: id.to_string(),
            payload: payload.map(str::to_string),
            text: text.to_string(),
            ready: Cell::new(false),
            shown: RefCell::new(None),
        }
    }

    pub fn shown(&self) -> Option<String> {
        self.shown.borrow().clone()
    }
}

impl LeafAnchor for FakeAnchor {
    fn leaf_id(&self) -> &str {
        &self.id
    }

    fn payload(&self) -> Option<String> {
        self.payload.clone()
    }

    fn fallback_text(&self) -> String {
        self.text.clone()
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn mark_ready(&self) {
        self.ready.set(true);
    }

    fn show_plain_text(&self, text: &str) {
        *self.shown.borrow_mut() = Some(text.to_string());
    }
}

#[derive(Debug)]
pub struct FakeSurface {
    pub doc: DocNode,
    pub role: SurfaceRole,
}

#[derive(Default)]
struct FactoryLog {
    created: Vec<String>,
    fail_next: bool,
}

#[derive(Clone, Default)]
pub struct FakeFactory(Rc<RefCell<FactoryLog>>);

impl FakeFactory {
    pub fn created(&self) -> Vec<String> {
        self.0.borrow().created.clone()
    }

    pub fn fail_next(&self) {
        self.0.borrow_mut().fail_next = true;
    }
}

impl SurfaceFactory<FakeAnchor> for FakeFactory {
    type Surface = FakeSurface;

    fn create(
        &mut self,
        anchor: &FakeAnchor,
        doc: DocNode,
        role: SurfaceRole,
    ) -> Result<FakeSurface, SurfaceError> {
        let mut log = self.0.borrow_mut();
        if std::mem::take(&mut log.fail_next) {
            return Err(SurfaceError::Mount {
                leaf_id: anchor.leaf_id().to_string(),
                reason: "factory refused".into(),
            });
        }
        log.created.push(anchor.leaf_id().to_string());
        Ok(FakeSurface { doc, role })
    }
}

#[derive(Clone, Default)]
pub struct FakeField {
    value: Rc<RefCell<String>>,
    writes: Rc<Cell<usize>>,
}

impl FakeField {
    pub fn with_value(value: &str) -> Self {
        let field = Self::default();
        *field.value.borrow_mut() = value.to_string();
        field
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl SubmissionField for FakeField {
    fn value(&self) -> String {
        self.value.borrow().clone()
    }

    fn set_value(&self, value: &str) {
        self.writes.set(self.writes.get() + 1);
        *self.value.borrow_mut() = value.to_string();
    }
}

pub struct FakeBounds {
    canvas: Rect,
    images: HashMap<usize, Rect>,
}

impl FakeBounds {
    pub fn new(canvas: Rect) -> Self {
        Self {
            canvas,
            images: HashMap::new(),
        }
    }

    pub fn with_image(mut self, pos: usize, rect: Rect) -> Self {
        self.images.insert(pos, rect);
        self
    }
}

impl RenderedBounds for FakeBounds {
    fn resolve_rendered_bounds(&self, pos: usize) -> Option<Rect> {
        self.images.get(&pos).copied()
    }

    fn canvas_bounds(&self) -> Option<Rect> {
        Some(self.canvas)
    }
}

#[derive(Default)]
pub struct FakePlainSurface {
    pub text: RefCell<String>,
    pub focused: Cell<bool>,
}

impl PlainSurface for FakePlainSurface {
    fn inner_text(&self) -> String {
        self.text.borrow().clone()
    }

    fn has_focus(&self) -> bool {
        self.focused.get()
    }

    fn insert_at_cursor(&self, text: &str) {
        // The fake's cursor is always at the start.
        self.text.borrow_mut().insert_str(0, text);
    }

    fn append_text(&self, text: &str) {
        self.text.borrow_mut().push_str(text);
    }

    fn make_editable(&self) {}
}
