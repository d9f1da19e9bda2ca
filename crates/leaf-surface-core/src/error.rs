//! Error types for leaf surfaces.
//!
//! None of these reach the reader as a user-facing error. They are logged and
//! turned into a fallback at the boundary that observes them.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error for surface setup and operation.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SurfaceError {
    /// The rich-text engine (or one of its extension modules) failed to load.
    #[error("rich-text capability unavailable: {0}")]
    #[diagnostic(
        code(leaf_surface::capability),
        help("surfaces fall back to plain-text rendering")
    )]
    CapabilityUnavailable(String),

    /// The engine refused to create a surface for an anchor.
    #[error("failed to mount surface for leaf {leaf_id}: {reason}")]
    #[diagnostic(code(leaf_surface::mount))]
    Mount { leaf_id: String, reason: String },

    /// A required DOM element is missing.
    #[error("missing element: {0}")]
    #[diagnostic(code(leaf_surface::dom))]
    MissingElement(&'static str),

    /// Upload bridge failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] UploadError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    #[diagnostic(code(leaf_surface::config))]
    Config(String),

    /// Serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(leaf_surface::serde))]
    Serde(#[from] serde_json::Error),
}

/// Errors from the upload bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[non_exhaustive]
pub enum UploadError {
    /// No upload endpoint was configured for this editor.
    #[error("missing upload URL")]
    #[diagnostic(code(leaf_surface::upload::config))]
    MissingEndpoint,

    /// The endpoint answered with a non-success status.
    #[error("upload failed with status {status}")]
    #[diagnostic(code(leaf_surface::upload::rejected))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// The request never produced a response.
    #[error("upload request failed: {0}")]
    #[diagnostic(code(leaf_surface::upload::network))]
    Network(String),

    /// The response body was not `{ "url": ... }`.
    #[error("invalid upload response: {0}")]
    #[diagnostic(code(leaf_surface::upload::response))]
    InvalidResponse(String),
}

/// Why an embedded payload could not be used as a document.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("payload root is {found:?}, expected a doc with content")]
    NotADocument { found: Option<String> },
}
