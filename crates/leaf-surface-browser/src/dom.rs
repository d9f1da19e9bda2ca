//! Small DOM helpers shared by the page wiring.

use std::cell::RefCell;

use leaf_surface_core::SurfaceError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element};

/// The page's document.
pub fn document() -> Result<Document, SurfaceError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or(SurfaceError::MissingElement("document"))
}

/// First element matching `selector`, cast to `T`.
pub fn query<T: JsCast>(root: &Document, selector: &str) -> Option<T> {
    root.query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<T>().ok())
}

/// Every element matching `selector`, cast to `T`. Non-matching casts are
/// skipped.
pub fn query_all<T: JsCast>(root: &Document, selector: &str) -> Vec<T> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<T>().ok())
        .collect()
}

/// Readable message for a thrown JS value.
pub fn js_error_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Whether the element is an `<img>`.
pub fn is_image(element: &Element) -> bool {
    element.tag_name().eq_ignore_ascii_case("img")
}

/// Run `f` on `cell` once nothing else holds it, yielding to the microtask
/// queue between attempts.
pub async fn borrow_when_free<T, R>(cell: &RefCell<T>, f: impl FnOnce(&mut T) -> R) -> R {
    loop {
        if let Ok(mut value) = cell.try_borrow_mut() {
            return f(&mut value);
        }
        tracing::trace!("target busy, deferring to next microtask");
        let _ = JsFuture::from(js_sys::Promise::resolve(&JsValue::UNDEFINED)).await;
    }
}
