//! Capability mode, decided once at startup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the rich-text engine is available for this page.
///
/// Chosen once after engine modules load (or fail to) and passed to every
/// component that renders or edits. `Plain` means no surfaces are created:
/// readers show fallback text and the editor is a bare contenteditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityMode {
    #[default]
    Rich,
    Plain,
}

impl CapabilityMode {
    /// Mode for the outcome of loading the engine.
    pub fn from_load<T, E: fmt::Display>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => CapabilityMode::Rich,
            Err(err) => {
                tracing::warn!(error = %err, "rich-text engine unavailable, using plain text");
                CapabilityMode::Plain
            }
        }
    }

    pub fn is_rich(self) -> bool {
        matches!(self, CapabilityMode::Rich)
    }
}

impl fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityMode::Rich => f.write_str("rich"),
            CapabilityMode::Plain => f.write_str("plain"),
        }
    }
}
