//! Loading the rich-text engine.
//!
//! The engine ships as ES modules fetched at runtime. They load together:
//! if any one fails the page runs in plain mode.

use js_sys::{Array, Promise, Reflect};
use leaf_surface_core::{SurfaceConfig, SurfaceError};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::dom::js_error_message;

#[wasm_bindgen(inline_js = "export function importModule(url) { return import(url); }")]
extern "C" {
    #[wasm_bindgen(js_name = importModule, catch)]
    fn import_module(url: &str) -> Result<Promise, JsValue>;
}

/// Loaded engine: the editor constructor and its configured extensions.
#[derive(Debug, Clone)]
pub struct EngineModules {
    pub editor_class: js_sys::Function,
    pub extensions: Array,
}

/// Module export `name`, or the module's default export.
fn export_or_default(module: &JsValue, name: &str) -> Option<JsValue> {
    [name, "default"]
        .into_iter()
        .filter_map(|key| Reflect::get(module, &JsValue::from_str(key)).ok())
        .find(|value| !value.is_undefined() && !value.is_null())
}

fn missing(what: &str) -> SurfaceError {
    SurfaceError::CapabilityUnavailable(format!("engine export {what} not found"))
}

/// Import every engine module and assemble the extension list.
///
/// Modules are taken in order: core, starter kit, image, text style, color.
pub async fn load_engine(config: &SurfaceConfig) -> Result<EngineModules, SurfaceError> {
    let [core, starter, image, style, color] = config.engine_modules.as_slice() else {
        return Err(SurfaceError::CapabilityUnavailable(format!(
            "expected 5 engine modules, got {}",
            config.engine_modules.len()
        )));
    };

    let imports = Array::new();
    for url in [core, starter, image, style, color] {
        let promise = import_module(url)
            .map_err(|e| SurfaceError::CapabilityUnavailable(js_error_message(&e)))?;
        imports.push(&promise);
    }
    let modules = JsFuture::from(Promise::all(&imports))
        .await
        .map_err(|e| SurfaceError::CapabilityUnavailable(js_error_message(&e)))?;
    let modules: Array = modules.unchecked_into();

    let editor_class = Reflect::get(&modules.get(0), &JsValue::from_str("Editor"))
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
        .ok_or_else(|| missing("Editor"))?;
    let starter_kit =
        export_or_default(&modules.get(1), "StarterKit").ok_or_else(|| missing("StarterKit"))?;
    let image_module = modules.get(2);
    let image_resize = export_or_default(&image_module, "default").unwrap_or(image_module);
    let text_style =
        export_or_default(&modules.get(3), "TextStyle").ok_or_else(|| missing("TextStyle"))?;
    let color = export_or_default(&modules.get(4), "Color").ok_or_else(|| missing("Color"))?;

    let image_resize = configure_inline(&image_resize)?;

    let extensions = Array::new();
    extensions.push(&starter_kit);
    extensions.push(&text_style);
    extensions.push(&color);
    extensions.push(&image_resize);

    tracing::debug!(modules = config.engine_modules.len(), "rich-text engine loaded");
    Ok(EngineModules {
        editor_class,
        extensions,
    })
}

/// `extension.configure({ inline: true })`
fn configure_inline(extension: &JsValue) -> Result<JsValue, SurfaceError> {
    let configure = Reflect::get(extension, &JsValue::from_str("configure"))
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
        .ok_or_else(|| missing("ImageResize.configure"))?;
    let options = js_sys::Object::new();
    Reflect::set(&options, &JsValue::from_str("inline"), &JsValue::TRUE)
        .map_err(|e| SurfaceError::CapabilityUnavailable(js_error_message(&e)))?;
    configure
        .call1(extension, &options)
        .map_err(|e| SurfaceError::CapabilityUnavailable(js_error_message(&e)))
}
