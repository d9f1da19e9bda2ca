//! Reader page: read-only surfaces for every leaf, mounted on schedule.

use std::cell::RefCell;
use std::rc::Rc;

use leaf_surface_core::schedule::MountFn;
use leaf_surface_core::{
    CapabilityMode, MountController, MountStrategy, SurfaceConfig, SurfaceError,
};
use web_sys::Element;

use crate::anchors::{DomAnchor, discover_anchors};
use crate::capability::load_engine;
use crate::dom::document;
use crate::schedule::page_schedule;
use crate::tiptap::TiptapFactory;

pub type ReaderController = MountController<DomAnchor, TiptapFactory>;

/// What the reader set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSummary {
    pub mode: CapabilityMode,
    pub leaves: usize,
    /// `None` in plain mode.
    pub strategy: Option<MountStrategy>,
}

/// Find the page's leaves, load the engine and start mounting.
pub async fn mount_reader(config: &SurfaceConfig) -> Result<ReaderSummary, SurfaceError> {
    let document = document()?;
    let anchors = discover_anchors(&document);
    if anchors.is_empty() {
        tracing::debug!("no leaves on page");
        return Ok(ReaderSummary {
            mode: CapabilityMode::Rich,
            leaves: 0,
            strategy: None,
        });
    }
    let leaves = anchors.len();
    let elements: Vec<Element> = anchors.iter().map(|a| a.element().clone().into()).collect();

    let engine = load_engine(config).await;
    let mode = CapabilityMode::from_load(&engine);
    let controller = match engine {
        Ok(engine) => ReaderController::new(anchors, mode, TiptapFactory::new(engine)),
        Err(_) => ReaderController::plain(anchors),
    };
    if !mode.is_rich() {
        return Ok(ReaderSummary {
            mode,
            leaves,
            strategy: None,
        });
    }

    let controller = Rc::new(RefCell::new(controller));
    let schedule = page_schedule(&document, elements, config);
    let strategy = schedule.strategy();
    schedule.on_ready(mount_fn(controller));

    Ok(ReaderSummary {
        mode,
        leaves,
        strategy: Some(strategy),
    })
}

/// Mount callback over a shared controller.
pub fn mount_fn(controller: Rc<RefCell<ReaderController>>) -> MountFn {
    Rc::new(move |index| match controller.try_borrow_mut() {
        Ok(mut controller) => {
            controller.mount(index);
        }
        Err(_) => tracing::debug!(index, "mount re-entered, skipped"),
    })
}
