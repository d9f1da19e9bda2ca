//! DOM sources for mount scheduling.

use gloo_events::EventListener;
use js_sys::{Array, Reflect};
use leaf_surface_core::schedule::{
    EagerSchedule, HostCapabilities, MountSchedule, MountStrategy, PageSignal, PagingSchedule,
    ProximitySchedule, ProximitySource,
};
use leaf_surface_core::{SurfaceConfig, SurfaceError};
use wasm_bindgen::prelude::*;
use web_sys::{
    CustomEvent, Document, Element, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::dom::{js_error_message, query};

pub const PAGER_SELECTOR: &str = "[data-reader-pager]";

/// Page index carried in a paging event's `detail.index`.
pub fn page_index(event: &web_sys::Event) -> Option<i64> {
    let detail = event.dyn_ref::<CustomEvent>()?.detail();
    let index = Reflect::get(&detail, &JsValue::from_str("index")).ok()?.as_f64()?;
    index.is_finite().then_some(index as i64)
}

/// Page signals dispatched on the paging container.
pub struct DomPageSignal {
    pager: Element,
    event: String,
}

impl DomPageSignal {
    pub fn new(pager: Element, event: impl Into<String>) -> Self {
        Self {
            pager,
            event: event.into(),
        }
    }
}

impl PageSignal for DomPageSignal {
    fn subscribe(&self, handler: Box<dyn Fn(Option<i64>)>) {
        EventListener::new(&self.pager, self.event.clone(), move |event| {
            handler(page_index(event));
        })
        .forget();
    }
}

/// Viewport proximity through `IntersectionObserver`.
pub struct DomProximity {
    targets: Vec<Element>,
    margin: String,
}

impl DomProximity {
    pub fn new(targets: Vec<Element>, margin: impl Into<String>) -> Self {
        Self {
            targets,
            margin: margin.into(),
        }
    }
}

impl ProximitySource for DomProximity {
    fn observe(&self, on_enter: Box<dyn Fn(usize)>) -> Result<(), SurfaceError> {
        let targets = self.targets.clone();
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    observer.unobserve(&target);
                    if let Some(index) = targets.iter().position(|t| *t == target) {
                        on_enter(index);
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&self.margin);
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(|e| SurfaceError::CapabilityUnavailable(js_error_message(&e)))?;
        for target in &self.targets {
            observer.observe(target);
        }
        callback.forget();
        Ok(())
    }
}

/// What this page offers for scheduling.
pub fn host_capabilities(document: &Document) -> HostCapabilities {
    let proximity = web_sys::window()
        .and_then(|w| Reflect::has(&w, &JsValue::from_str("IntersectionObserver")).ok())
        .unwrap_or(false);
    HostCapabilities {
        paging: query::<Element>(document, PAGER_SELECTOR).is_some(),
        proximity,
    }
}

/// The schedule for this page, by strategy priority.
pub fn page_schedule(
    document: &Document,
    anchors: Vec<Element>,
    config: &SurfaceConfig,
) -> Box<dyn MountSchedule> {
    let len = anchors.len();
    let strategy = MountStrategy::select(host_capabilities(document));
    tracing::debug!(strategy = strategy.name(), leaves = len, "mount schedule selected");
    match (strategy, query::<Element>(document, PAGER_SELECTOR)) {
        (MountStrategy::Paging, Some(pager)) => Box::new(PagingSchedule::new(
            DomPageSignal::new(pager, config.page_event.clone()),
            len,
        )),
        (MountStrategy::Proximity, _) => Box::new(ProximitySchedule::new(
            DomProximity::new(anchors, config.proximity_margin.clone()),
            len,
        )),
        _ => Box::new(EagerSchedule::new(len)),
    }
}
