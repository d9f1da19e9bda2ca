//! Overlay synchronization: the image-remove control and sticky color.

use crate::surface::RichSurface;

/// A rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Resolves content positions to rendered geometry.
pub trait RenderedBounds {
    /// Bounds of the image rendered at `pos`, if one can be found.
    fn resolve_rendered_bounds(&self, pos: usize) -> Option<Rect>;

    /// Bounds of the canvas the overlay is positioned in.
    fn canvas_bounds(&self) -> Option<Rect>;
}

/// Where to put the remove control, relative to the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub visible: bool,
    pub left: f64,
    pub top: f64,
}

impl Placement {
    pub const HIDDEN: Placement = Placement {
        visible: false,
        left: 0.0,
        top: 0.0,
    };
}

/// Place the remove control on the top-right corner of the image at `pos`,
/// pulled in by `inset` and kept inside the canvas's top-left edge.
pub fn place_remove_control<B: RenderedBounds + ?Sized>(
    image_active: bool,
    pos: usize,
    bounds: &B,
    inset: f64,
) -> Placement {
    if !image_active {
        return Placement::HIDDEN;
    }
    let (Some(image), Some(canvas)) = (bounds.resolve_rendered_bounds(pos), bounds.canvas_bounds())
    else {
        tracing::trace!(pos, "image bounds unresolved, hiding remove control");
        return Placement::HIDDEN;
    };
    Placement {
        visible: true,
        left: (image.right - canvas.left - inset).max(0.0),
        top: (image.top - canvas.top - inset).max(0.0),
    }
}

/// Sticky-color state machine.
///
/// `desired` is the color the writer last chose or last landed on;
/// the surface's observed color is read fresh on every event. After a
/// transaction that loses the desired color, one correction is applied;
/// while it is in flight the machine is `Correcting` and any transaction it
/// triggers is not corrected again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorSync {
    desired: Option<String>,
    correcting: bool,
}

impl ColorSync {
    pub fn desired(&self) -> Option<&str> {
        self.desired.as_deref()
    }

    pub fn is_correcting(&self) -> bool {
        self.correcting
    }

    /// Adopt the observed selection color. Returns the color to reflect in
    /// the color input, if it changed the desired color.
    pub fn adopt(&mut self, observed: Option<&str>) -> Option<String> {
        let observed = observed.filter(|c| !c.is_empty())?;
        self.desired = Some(observed.to_string());
        Some(observed.to_string())
    }

    /// An explicit choice from the color input.
    pub fn choose(&mut self, color: &str) {
        self.desired = Some(color.to_string());
    }

    /// The color to reapply after a transaction, if any. Enters the
    /// correcting state when it returns a color.
    pub fn begin_correction<S: RichSurface + ?Sized>(&mut self, surface: &S) -> Option<String> {
        if self.correcting {
            return None;
        }
        let desired = self.desired.as_deref()?;
        if surface.is_color_active(desired) {
            return None;
        }
        self.correcting = true;
        Some(desired.to_string())
    }

    pub fn finish_correction(&mut self) {
        self.correcting = false;
    }
}

/// Overlay state produced for one session event.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayReport {
    pub remove_control: Placement,
    /// New value for the color input, when it should change.
    pub color_input: Option<String>,
}

impl OverlayReport {
    pub fn hidden() -> Self {
        Self {
            remove_control: Placement::HIDDEN,
            color_input: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocNode, fallback_doc};
    use crate::surface::{Command, Selection};
    use crate::testing::FakeBounds;
    use crate::tree_editor::TreeEditor;

    #[test]
    fn test_placement_inset_and_clamp() {
        let bounds = FakeBounds::new(Rect::new(100.0, 50.0, 300.0, 200.0))
            .with_image(2, Rect::new(120.0, 80.0, 220.0, 160.0));
        let placed = place_remove_control(true, 2, &bounds, 14.0);
        assert_eq!(
            placed,
            Placement {
                visible: true,
                left: 106.0,
                top: 16.0
            }
        );

        let corner = FakeBounds::new(Rect::new(100.0, 50.0, 300.0, 200.0))
            .with_image(2, Rect::new(100.0, 50.0, 110.0, 60.0));
        let placed = place_remove_control(true, 2, &corner, 14.0);
        assert_eq!((placed.left, placed.top), (0.0, 0.0));
    }

    #[test]
    fn test_placement_hidden() {
        let bounds = FakeBounds::new(Rect::default()).with_image(2, Rect::default());
        assert_eq!(place_remove_control(false, 2, &bounds, 14.0), Placement::HIDDEN);
        assert_eq!(place_remove_control(true, 7, &bounds, 14.0), Placement::HIDDEN);
    }

    #[test]
    fn test_adopt_ignores_empty() {
        let mut sync = ColorSync::default();
        assert_eq!(sync.adopt(None), None);
        assert_eq!(sync.adopt(Some("")), None);
        assert_eq!(sync.adopt(Some("#123456")).as_deref(), Some("#123456"));
        assert_eq!(sync.adopt(None), None);
        assert_eq!(sync.desired(), Some("#123456"));
    }

    #[test]
    fn test_correction_guard() {
        let surface = TreeEditor::new(&fallback_doc("ab"));
        let mut sync = ColorSync::default();
        assert_eq!(sync.begin_correction(&surface), None);

        sync.choose("#ff0000");
        assert_eq!(sync.begin_correction(&surface).as_deref(), Some("#ff0000"));
        assert!(sync.is_correcting());
        assert_eq!(sync.begin_correction(&surface), None);
        sync.finish_correction();
        assert!(!sync.is_correcting());
    }

    #[test]
    fn test_no_correction_when_active() {
        let mut surface = TreeEditor::new(&DocNode::doc(vec![DocNode::paragraph(vec![
            DocNode::text("red").with_marks(vec![crate::document::Mark::text_color("#ff0000")]),
        ])]));
        surface.restore_selection(Selection::new(1, 4));
        let mut sync = ColorSync::default();
        sync.choose("#ff0000");
        assert_eq!(sync.begin_correction(&surface), None);

        surface.apply(&Command::SetTextSelection(1));
        // At the start of a block the cursor takes the marks after it.
        assert_eq!(sync.begin_correction(&surface), None);
    }
}
