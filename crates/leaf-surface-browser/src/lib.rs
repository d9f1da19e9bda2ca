//! Browser DOM layer for leaf surfaces.
//!
//! Binds the core crate's traits to the page. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `anchors`: leaf anchor discovery and payload lookup
//! - `capability`: dynamic loading of the rich-text engine modules
//! - `tiptap`: Tiptap bindings implementing `RichSurface` and `SurfaceFactory`
//! - `schedule`: page-signal and `IntersectionObserver` schedule sources
//! - `overlay`: image geometry and overlay control updates
//! - `upload`: multipart upload transport
//! - `fallback`: plain contenteditable surface and the submission field
//! - `reader` / `editor`: page wiring
//!
//! # Re-exports
//!
//! This crate re-exports `leaf-surface-core` for convenience, so consumers
//! only need to depend on `leaf-surface-browser`.

// Re-export core crate
pub use leaf_surface_core;
pub use leaf_surface_core::*;

pub mod anchors;
pub mod capability;
pub mod dom;
pub mod editor;
pub mod fallback;
pub mod overlay;
pub mod reader;
pub mod schedule;
pub mod tiptap;
pub mod upload;

pub use anchors::{DomAnchor, discover_anchors};
pub use capability::{EngineModules, load_engine};
pub use editor::mount_editor;
pub use fallback::{HiddenField, PlainDomSurface};
pub use reader::{ReaderSummary, mount_reader};
pub use tiptap::{TiptapFactory, TiptapSurface};
pub use upload::FetchTransport;
