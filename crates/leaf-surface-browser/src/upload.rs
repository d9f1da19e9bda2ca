//! Upload transport over `reqwest` (browser fetch).

use js_sys::Uint8Array;
use leaf_surface_core::{UploadError, UploadFile, UploadRequest, UploadTransport};
use reqwest::multipart::{Form, Part};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, HtmlDocument};

use crate::dom::js_error_message;

/// Sends uploads with the page's cookies.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    client: reqwest::Client,
}

impl FetchTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolve `endpoint` against the document's base URL; fetch through reqwest
/// needs absolute URLs.
fn absolute_url(endpoint: &str) -> Result<String, UploadError> {
    let base = crate::dom::document()
        .ok()
        .and_then(|d| d.base_uri().ok().flatten())
        .unwrap_or_default();
    web_sys::Url::new_with_base(endpoint, &base)
        .map(|url| url.href())
        .map_err(|e| {
            UploadError::Network(format!("bad endpoint {endpoint}: {}", js_error_message(&e)))
        })
}

impl UploadTransport for FetchTransport {
    async fn send(&self, request: UploadRequest) -> Result<(u16, String), UploadError> {
        let url = absolute_url(&request.endpoint)?;
        let mut part = Part::bytes(request.file.bytes).file_name(request.file.name);
        if !request.file.mime.is_empty() {
            part = part
                .mime_str(&request.file.mime)
                .map_err(|e| UploadError::Network(e.to_string()))?;
        }
        let form = Form::new().part(request.field, part);

        let response = self
            .client
            .post(url)
            .header(request.csrf_header, request.csrf_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;
        Ok((status, body))
    }
}

/// Read a picked file into memory.
pub async fn read_file(file: &File) -> Result<UploadFile, UploadError> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| {
            UploadError::Network(format!("could not read file: {}", js_error_message(&e)))
        })?;
    Ok(UploadFile {
        name: file.name(),
        mime: file.type_(),
        bytes: Uint8Array::new(&buffer).to_vec(),
    })
}

/// The page's `document.cookie`, or empty when unavailable.
pub fn document_cookies() -> String {
    crate::dom::document()
        .ok()
        .and_then(|d| d.dyn_into::<HtmlDocument>().ok())
        .and_then(|d| d.cookie().ok())
        .unwrap_or_default()
}
