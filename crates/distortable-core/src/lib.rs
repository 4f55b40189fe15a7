//! Distortable Core - group editing of distortable image overlays
//!
//! This crate provides the geometry and state behind editing quadrilateral
//! image overlays on a map: per-corner scale/rotate handles, multi-select,
//! rigid group drags of the selection, and export of the selected overlays.
//!
//! Rendering, DOM events and projection internals belong to the host; the
//! core receives projected pointer positions and reports back through
//! [`Notification`]s.
//!
//! # Module Structure
//!
//! - `geometry` - Stateless point math (scale factor, angle delta, transforms)
//! - `projection` - World/screen projection trait and implementations
//! - `overlay` - Per-overlay corner model
//! - `handle` - Corner edit handles
//! - `events` - Gestures, registrations and notifications
//! - `collection` - Selection set and group drag controller
//! - `export` - Export of selected overlays

pub mod collection;
pub mod events;
pub mod export;
pub mod geometry;
pub mod handle;
pub mod log;
pub mod overlay;
pub mod projection;

pub use collection::{Collection, CollectionError, CollectionOptions};
pub use events::{GestureTarget, Notification, OverlayId, PointerEvent};
pub use export::{generate_export_json, ExportError, ExportImage, ExportJson};
pub use geometry::{angle_delta, scale_factor, squared_distance, translate, GeometryError, Point};
pub use handle::{EditHandle, HandleMode};
pub use overlay::{Corner, ImageRef, LockMode, Overlay};
pub use projection::{IdentityProjection, LatLng, Projection, WebMercator};
