//! Surface mounting.
//!
//! The controller owns every leaf on the page and creates at most one
//! surface per leaf anchor, on demand. Anchors carry their own ready marker
//! so a second controller over the same page also sees them as mounted.

use std::ops::Range;

use crate::document::DocNode;
use crate::error::SurfaceError;
use crate::loader::load_document;
use crate::mode::CapabilityMode;

/// A host element a leaf renders into.
///
/// Methods take `&self`: DOM handles mutate through shared references.
pub trait LeafAnchor {
    /// Stable leaf identifier.
    fn leaf_id(&self) -> &str;

    /// Raw embedded payload, if the page carries one.
    fn payload(&self) -> Option<String>;

    /// Plain text shown when no surface can be created.
    fn fallback_text(&self) -> String;

    fn is_ready(&self) -> bool;

    fn mark_ready(&self);

    /// Replace the anchor's visible content with `text`.
    fn show_plain_text(&self, text: &str);
}

/// How a surface will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    /// Non-interactive rendering.
    Reader,
    /// The single editable surface of an editing session.
    Editor,
}

impl SurfaceRole {
    pub fn editable(self) -> bool {
        matches!(self, SurfaceRole::Editor)
    }
}

/// Creates surfaces bound to anchors.
pub trait SurfaceFactory<A: LeafAnchor> {
    type Surface;

    fn create(
        &mut self,
        anchor: &A,
        doc: DocNode,
        role: SurfaceRole,
    ) -> Result<Self::Surface, SurfaceError>;
}

/// A leaf and its surface, once mounted.
pub struct Leaf<A, S> {
    pub anchor: A,
    surface: Option<S>,
}

impl<A: LeafAnchor, S> Leaf<A, S> {
    fn new(anchor: A) -> Self {
        Self {
            anchor,
            surface: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some() || self.anchor.is_ready()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }
}

/// Result of a mount request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    Mounted,
    AlreadyMounted,
    OutOfRange,
    /// The controller is in plain mode and never creates surfaces.
    Plain,
    /// The factory failed; the anchor shows its plain text.
    Failed,
}

/// Mounts surfaces onto leaf anchors, at most once each.
pub struct MountController<A, F: SurfaceFactory<A>>
where
    A: LeafAnchor,
{
    leaves: Vec<Leaf<A, F::Surface>>,
    mode: CapabilityMode,
    factory: Option<F>,
}

impl<A: LeafAnchor, F: SurfaceFactory<A>> MountController<A, F> {
    /// A controller in `mode`. In plain mode the factory is dropped and every
    /// anchor shows its fallback text immediately.
    pub fn new(anchors: Vec<A>, mode: CapabilityMode, factory: F) -> Self {
        match mode {
            CapabilityMode::Rich => Self {
                leaves: anchors.into_iter().map(Leaf::new).collect(),
                mode,
                factory: Some(factory),
            },
            CapabilityMode::Plain => Self::plain(anchors),
        }
    }

    /// A controller that never creates surfaces.
    pub fn plain(anchors: Vec<A>) -> Self {
        for anchor in &anchors {
            anchor.show_plain_text(&anchor.fallback_text());
        }
        tracing::debug!(leaves = anchors.len(), "leaves degraded to plain text");
        Self {
            leaves: anchors.into_iter().map(Leaf::new).collect(),
            mode: CapabilityMode::Plain,
            factory: None,
        }
    }

    pub fn mode(&self) -> CapabilityMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaf(&self, index: usize) -> Option<&Leaf<A, F::Surface>> {
        self.leaves.get(index)
    }

    pub fn surface(&self, index: usize) -> Option<&F::Surface> {
        self.leaves.get(index)?.surface()
    }

    pub fn surface_mut(&mut self, index: usize) -> Option<&mut F::Surface> {
        self.leaves.get_mut(index)?.surface.as_mut()
    }

    /// Indices of leaves holding a surface.
    pub fn mounted(&self) -> Vec<usize> {
        self.leaves
            .iter()
            .enumerate()
            .filter(|(_, leaf)| leaf.surface.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Mount a read-only surface for leaf `index` from its embedded payload.
    pub fn mount(&mut self, index: usize) -> MountOutcome {
        let Some(leaf) = self.leaves.get(index) else {
            return MountOutcome::OutOfRange;
        };
        if leaf.is_mounted() {
            return MountOutcome::AlreadyMounted;
        }
        let doc = load_document(
            leaf.anchor.payload().as_deref(),
            &leaf.anchor.fallback_text(),
        );
        self.mount_with(index, doc, SurfaceRole::Reader)
    }

    /// Mount leaf `index` with the given content and role.
    pub fn mount_with(&mut self, index: usize, doc: DocNode, role: SurfaceRole) -> MountOutcome {
        let Some(leaf) = self.leaves.get_mut(index) else {
            return MountOutcome::OutOfRange;
        };
        if leaf.is_mounted() {
            return MountOutcome::AlreadyMounted;
        }
        let Some(factory) = self.factory.as_mut() else {
            return MountOutcome::Plain;
        };

        match factory.create(&leaf.anchor, doc, role) {
            Ok(surface) => {
                leaf.anchor.mark_ready();
                leaf.surface = Some(surface);
                tracing::debug!(leaf_id = leaf.anchor.leaf_id(), index, ?role, "leaf mounted");
                MountOutcome::Mounted
            }
            Err(err) => {
                tracing::warn!(
                    leaf_id = leaf.anchor.leaf_id(),
                    index,
                    error = %err,
                    "surface creation failed, showing plain text"
                );
                leaf.anchor.show_plain_text(&leaf.anchor.fallback_text());
                MountOutcome::Failed
            }
        }
    }

    /// Mount every leaf in `window`; indices past the end are ignored.
    pub fn mount_window(&mut self, window: Range<usize>) -> usize {
        window
            .filter(|&i| self.mount(i) == MountOutcome::Mounted)
            .count()
    }

    pub fn mount_all(&mut self) -> usize {
        self.mount_window(0..self.leaves.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeAnchor, FakeFactory};

    fn anchors(n: usize) -> Vec<FakeAnchor> {
        (0..n)
            .map(|i| FakeAnchor::new(&format!("leaf-{i}"), None, &format!("text {i}")))
            .collect()
    }

    #[test]
    fn test_mount_twice_creates_one_surface() {
        let factory = FakeFactory::default();
        let mut controller = MountController::new(anchors(2), CapabilityMode::Rich, factory.clone());
        assert_eq!(controller.mount(1), MountOutcome::Mounted);
        assert_eq!(controller.mount(1), MountOutcome::AlreadyMounted);
        assert_eq!(factory.created(), vec!["leaf-1".to_string()]);
        assert!(controller.leaf(1).unwrap().anchor.is_ready());
        assert_eq!(controller.mounted(), vec![1]);
    }

    #[test]
    fn test_ready_anchor_is_not_remounted() {
        let factory = FakeFactory::default();
        let list = anchors(1);
        list[0].mark_ready();
        let mut controller = MountController::new(list, CapabilityMode::Rich, factory.clone());
        assert_eq!(controller.mount(0), MountOutcome::AlreadyMounted);
        assert!(factory.created().is_empty());
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut controller = MountController::new(anchors(1), CapabilityMode::Rich, FakeFactory::default());
        assert_eq!(controller.mount(5), MountOutcome::OutOfRange);
        assert_eq!(controller.mount_window(0..4), 1);
    }

    #[test]
    fn test_mount_uses_loaded_payload() {
        let factory = FakeFactory::default();
        let anchor = FakeAnchor::new(
            "a",
            Some(r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"From payload"}]}]}"#),
            "fallback",
        );
        let bad = FakeAnchor::new("b", Some("{oops"), "fallback");
        let mut controller = MountController::new(vec![anchor, bad], CapabilityMode::Rich, factory.clone());
        controller.mount_all();
        assert_eq!(controller.surface(0).unwrap().doc.plain_text(), "From payload");
        assert_eq!(controller.surface(1).unwrap().doc.plain_text(), "fallback");
        assert_eq!(controller.surface(1).unwrap().role, SurfaceRole::Reader);
    }

    #[test]
    fn test_plain_mode_degrades_everything() {
        let factory = FakeFactory::default();
        let mut controller = MountController::new(anchors(3), CapabilityMode::Plain, factory.clone());
        assert_eq!(controller.mode(), CapabilityMode::Plain);
        for i in 0..3 {
            assert_eq!(controller.leaf(i).unwrap().anchor.shown(), Some(format!("text {i}")));
        }
        assert_eq!(controller.mount(0), MountOutcome::Plain);
        assert!(factory.created().is_empty());
        assert!(!controller.leaf(0).unwrap().anchor.is_ready());
    }

    #[test]
    fn test_factory_failure_allows_retry() {
        let factory = FakeFactory::default();
        factory.fail_next();
        let mut controller = MountController::new(anchors(1), CapabilityMode::Rich, factory.clone());
        assert_eq!(controller.mount(0), MountOutcome::Failed);
        let leaf = controller.leaf(0).unwrap();
        assert_eq!(leaf.anchor.shown().as_deref(), Some("text 0"));
        assert!(!leaf.is_mounted());

        assert_eq!(controller.mount(0), MountOutcome::Mounted);
    }
}
