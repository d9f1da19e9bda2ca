//! Image upload bridge.
//!
//! Turns a picked file into a hosted URL through a CSRF-protected multipart
//! POST, then places the outcome in the editor: an image on success, a
//! visible marker on any failure.

use std::future::Future;

use serde::Deserialize;

use crate::config::SurfaceConfig;
use crate::error::UploadError;
use crate::overlay::{OverlayReport, RenderedBounds};
use crate::session::{EditingSession, PlainSession, PlainSurface, SubmissionField};
use crate::surface::{Command, RichSurface};

/// Multipart field the file is sent in.
pub const UPLOAD_FIELD: &str = "image";

/// A file read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResult {
    pub url: String,
}

#[derive(Deserialize)]
struct RejectionBody {
    error: Option<String>,
}

/// One upload request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub endpoint: String,
    pub csrf_header: String,
    pub csrf_token: String,
    pub field: &'static str,
    pub file: UploadFile,
}

/// Sends upload requests. Returns the response status and body text;
/// a request that produced no response is a `Network` error.
pub trait UploadTransport {
    fn send(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<(u16, String), UploadError>>;
}

/// Value of cookie `name` in a `document.cookie` style header.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        })
}

/// Interpret an upload endpoint response.
pub fn parse_upload_response(status: u16, body: &str) -> Result<UploadResult, UploadError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<RejectionBody>(body)
            .ok()
            .and_then(|b| b.error);
        return Err(UploadError::Rejected { status, message });
    }
    let result: UploadResult =
        serde_json::from_str(body).map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
    if result.url.trim().is_empty() {
        return Err(UploadError::InvalidResponse("empty url".into()));
    }
    Ok(result)
}

pub struct UploadBridge<T> {
    transport: T,
    endpoint: Option<String>,
    csrf_cookie: String,
    csrf_header: String,
}

impl<T: UploadTransport> UploadBridge<T> {
    pub fn new(transport: T, config: &SurfaceConfig) -> Self {
        Self {
            transport,
            endpoint: config.upload_endpoint().map(str::to_string),
            csrf_cookie: config.csrf_cookie.clone(),
            csrf_header: config.csrf_header.clone(),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Upload `file`, taking the CSRF token from `cookies`.
    pub async fn upload(
        &self,
        file: UploadFile,
        cookies: &str,
    ) -> Result<UploadResult, UploadError> {
        let endpoint = self.endpoint.as_deref().ok_or(UploadError::MissingEndpoint)?;
        let request = UploadRequest {
            endpoint: endpoint.to_string(),
            csrf_header: self.csrf_header.clone(),
            csrf_token: cookie_value(cookies, &self.csrf_cookie).unwrap_or_default(),
            field: UPLOAD_FIELD,
            file,
        };
        tracing::debug!(endpoint, file = %request.file.name, "uploading image");
        let (status, body) = self.transport.send(request).await?;
        parse_upload_response(status, &body)
    }
}

/// Where an upload outcome lands.
pub trait InsertionPoint {
    fn insert_image(&mut self, url: &str, width: u32) -> Option<OverlayReport>;

    fn insert_text(&mut self, text: &str) -> Option<OverlayReport>;
}

impl<S, F, B> InsertionPoint for EditingSession<S, F, B>
where
    S: RichSurface,
    F: SubmissionField,
    B: RenderedBounds,
{
    fn insert_image(&mut self, url: &str, width: u32) -> Option<OverlayReport> {
        Some(self.run(&Command::SetImage {
            src: url.to_string(),
            width,
        }))
    }

    fn insert_text(&mut self, text: &str) -> Option<OverlayReport> {
        Some(self.run(&Command::InsertText(text.to_string())))
    }
}

impl<P: PlainSurface, F: SubmissionField> InsertionPoint for PlainSession<P, F> {
    fn insert_image(&mut self, url: &str, _width: u32) -> Option<OverlayReport> {
        PlainSession::insert_text(self, url);
        None
    }

    fn insert_text(&mut self, text: &str) -> Option<OverlayReport> {
        PlainSession::insert_text(self, text);
        None
    }
}

/// Place an upload outcome: the image on success, the failure marker
/// otherwise. Never fails.
pub fn place_upload<T: InsertionPoint + ?Sized>(
    target: &mut T,
    outcome: Result<UploadResult, UploadError>,
    config: &SurfaceConfig,
) -> Option<OverlayReport> {
    match outcome {
        Ok(result) => target.insert_image(&result.url, config.image_width),
        Err(err) => {
            match &err {
                UploadError::Rejected { status, message } => {
                    tracing::warn!(status, message = ?message, "image upload rejected")
                }
                other => tracing::warn!(error = %other, "image upload failed"),
            }
            target.insert_text(&config.upload_failed_marker)
        }
    }
}
