use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

/// Engine modules loaded at startup: core, starter kit, image resize,
/// text style, color. Order matters to the browser loader.
pub const DEFAULT_ENGINE_MODULES: [&str; 5] = [
    "https://esm.sh/@tiptap/core@2.6.6",
    "https://esm.sh/@tiptap/starter-kit@2.6.6",
    "https://esm.sh/tiptap-extension-resize-image@1.3.2",
    "https://esm.sh/@tiptap/extension-text-style@2.6.6",
    "https://esm.sh/@tiptap/extension-color@2.6.6",
];

/// Runtime configuration for reader and editor surfaces.
///
/// Every field has a default, so an empty object (or no config at all) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceConfig {
    /// Upload endpoint. The editor form's `data-upload-url` overrides this.
    pub upload_url: Option<String>,
    /// Cookie holding the CSRF token.
    pub csrf_cookie: String,
    /// Header the CSRF token is sent in.
    pub csrf_header: String,
    /// Width (percent) of images inserted after upload.
    pub image_width: u32,
    /// Text inserted in place of an image whose upload failed.
    pub upload_failed_marker: String,
    /// Margin around the viewport within which leaves mount.
    pub proximity_margin: String,
    /// Name of the paging event.
    pub page_event: String,
    /// Inset of the image-remove control from the image's top-right corner.
    pub remove_control_inset: f64,
    /// Engine module URLs, in loader order.
    pub engine_modules: Vec<String>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            upload_url: None,
            csrf_cookie: "csrftoken".to_owned(),
            csrf_header: "X-CSRFToken".to_owned(),
            image_width: 85,
            upload_failed_marker: "[image upload failed]".to_owned(),
            proximity_margin: "50%".to_owned(),
            page_event: "reader:page".to_owned(),
            remove_control_inset: 14.0,
            engine_modules: DEFAULT_ENGINE_MODULES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl SurfaceConfig {
    /// Parse configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SurfaceError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loaders cannot work with.
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.engine_modules.is_empty() {
            return Err(SurfaceError::Config("engineModules must not be empty".into()));
        }
        if self.image_width == 0 || self.image_width > 100 {
            return Err(SurfaceError::Config(format!(
                "imageWidth must be within 1..=100, got {}",
                self.image_width
            )));
        }
        Ok(())
    }

    /// Replace the upload endpoint when `url` is present and non-empty.
    pub fn with_upload_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.upload_url = Some(url);
        }
        self
    }

    /// The configured upload endpoint, treating empty strings as unset.
    pub fn upload_endpoint(&self) -> Option<&str> {
        self.upload_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(SurfaceConfig::from_json("").unwrap(), SurfaceConfig::default());
        assert_eq!(SurfaceConfig::from_json("{}").unwrap(), SurfaceConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = SurfaceConfig::from_json(r#"{"uploadUrl":"/leaf/upload/","imageWidth":60}"#)
            .unwrap();
        assert_eq!(config.upload_endpoint(), Some("/leaf/upload/"));
        assert_eq!(config.image_width, 60);
        assert_eq!(config.csrf_cookie, "csrftoken");
    }

    #[test]
    fn test_invalid_config() {
        assert!(SurfaceConfig::from_json(r#"{"engineModules":[]}"#).is_err());
        assert!(SurfaceConfig::from_json(r#"{"imageWidth":0}"#).is_err());
        assert!(SurfaceConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_upload_url_override() {
        let config = SurfaceConfig::default().with_upload_url(Some("/up".into()));
        assert_eq!(config.upload_endpoint(), Some("/up"));
        let config = config.with_upload_url(Some("  ".into()));
        assert_eq!(config.upload_endpoint(), Some("/up"));
        assert_eq!(SurfaceConfig::default().upload_endpoint(), None);
    }
}
