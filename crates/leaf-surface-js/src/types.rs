//! Types exposed to JavaScript via wasm-bindgen.

use leaf_surface_browser::{CapabilityMode, ReaderSummary, SurfaceConfig, SurfaceError};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// What `mountReader` set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsReaderSummary {
    #[tsify(type = "\"rich\" | \"plain\"")]
    pub mode: CapabilityMode,
    pub leaves: usize,
    /// "paging", "proximity" or "eager"; absent in plain mode.
    #[tsify(optional)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl From<ReaderSummary> for JsReaderSummary {
    fn from(summary: ReaderSummary) -> Self {
        Self {
            mode: summary.mode,
            leaves: summary.leaves,
            strategy: summary.strategy.map(|s| s.name().to_owned()),
        }
    }
}

/// Read configuration from a JS value. `undefined` and `null` give the
/// defaults.
pub fn config_from_js(value: JsValue) -> Result<SurfaceConfig, SurfaceError> {
    if value.is_undefined() || value.is_null() {
        return Ok(SurfaceConfig::default());
    }
    let config: SurfaceConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| SurfaceError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
