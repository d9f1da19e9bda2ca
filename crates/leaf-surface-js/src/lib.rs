//! WASM entry points for leaf surfaces.
//!
//! A page calls `mountReader` or `mountEditor` once after the module loads.
//! Both take an optional configuration object (see `SurfaceConfig`, fields
//! in camelCase) and resolve once the page is wired up.

mod types;

pub use types::*;

use wasm_bindgen::prelude::*;

/// Install the panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    use tracing::Level;
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let reg = Registry::default().with(wasm_layer);

    let _ = set_global_default(reg);
}

/// Mount read-only surfaces for every leaf on the page.
#[wasm_bindgen(js_name = mountReader)]
pub async fn mount_reader(config: JsValue) -> Result<JsReaderSummary, JsError> {
    let config = config_from_js(config).map_err(|e| JsError::new(&e.to_string()))?;
    let summary = leaf_surface_browser::mount_reader(&config)
        .await
        .map_err(|e| JsError::new(&e.to_string()))?;
    tracing::info!(
        mode = %summary.mode,
        leaves = summary.leaves,
        strategy = ?summary.strategy,
        "reader mounted"
    );
    Ok(summary.into())
}

/// Mount the editor page's surface. Resolves to `"rich"` or `"plain"`.
#[wasm_bindgen(js_name = mountEditor)]
pub async fn mount_editor(config: JsValue) -> Result<String, JsError> {
    let config = config_from_js(config).map_err(|e| JsError::new(&e.to_string()))?;
    let mode = leaf_surface_browser::mount_editor(&config)
        .await
        .map_err(|e| JsError::new(&e.to_string()))?;
    tracing::info!(%mode, "editor mounted");
    Ok(mode.to_string())
}
