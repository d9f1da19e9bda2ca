//! leaf-surface-core: platform-agnostic logic for book leaf surfaces.
//!
//! This crate provides:
//! - `DocNode` document tree and the fallback-safe content loader
//! - `MountController` with pluggable `MountSchedule` strategies
//! - `EditingSession` / `PlainSession` over the `RichSurface` capability
//! - Overlay synchronization (`ColorSync`, remove-control placement)
//! - The upload bridge contract
//! - `TreeEditor`, an in-memory `RichSurface`

pub mod config;
pub mod document;
pub mod error;
pub mod loader;
pub mod mode;
pub mod mount;
pub mod overlay;
pub mod schedule;
pub mod session;
pub mod surface;
pub mod toolbar;
pub mod tree_editor;
pub mod upload;

#[cfg(test)]
mod testing;

pub use config::{DEFAULT_ENGINE_MODULES, SurfaceConfig};
pub use document::{DocNode, Mark, fallback_doc};
pub use error::{DocumentError, SurfaceError, UploadError};
pub use loader::{EMPTY_DOC_JSON, load_document, parse_document, serialize_document};
pub use mode::CapabilityMode;
pub use mount::{LeafAnchor, MountController, MountOutcome, SurfaceFactory, SurfaceRole};
pub use overlay::{ColorSync, OverlayReport, Placement, Rect, RenderedBounds};
pub use schedule::{
    EagerSchedule, HostCapabilities, MountFn, MountSchedule, MountStrategy, PageSignal,
    PagingSchedule, ProximitySchedule, ProximitySource, paging_window,
};
pub use session::{EditingSession, PlainSession, PlainSurface, SubmissionField, initial_content};
pub use smol_str::SmolStr;
pub use surface::{Command, RichSurface, Selection, Transaction};
pub use toolbar::parse_heading_control;
pub use tree_editor::TreeEditor;
pub use upload::{
    InsertionPoint, UploadBridge, UploadFile, UploadRequest, UploadResult, UploadTransport,
    cookie_value, parse_upload_response, place_upload,
};
