//! Export of selected overlays as structured data.
//!
//! The output mirrors the JSON consumed by downstream stitching tools:
//!
//! ```text
//! {
//!   "images": [
//!     { "id", "src", "width", "height", "image_file_name",
//!       "nodes": [{"lat", "lon"} x4], "cm_per_pixel" }
//!   ],
//!   "avg_cm_per_pixel": number
//! }
//! ```
//!
//! Images are listed newest first, and `nodes` follow the polygon winding
//! `[0, 1, 3, 2]` of the internal corner order.

use crate::events::OverlayId;
use crate::overlay::{Corner, Overlay};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for export.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// There is nothing to export, so no average resolution exists.
    #[error("No overlays selected for export")]
    NoSelection,
}

/// Corner order used by exported polygons.
const NODE_ORDER: [Corner; 4] = [
    Corner::TopLeft,
    Corner::TopRight,
    Corner::BottomRight,
    Corner::BottomLeft,
];

/// One exported corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub lat: f64,
    pub lon: f64,
}

/// One exported overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportImage {
    pub id: OverlayId,
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub image_file_name: String,
    pub nodes: [Node; 4],
    pub cm_per_pixel: f64,
}

impl ExportImage {
    pub fn from_overlay(id: OverlayId, overlay: &Overlay) -> Self {
        let image = overlay.image();
        Self {
            id,
            src: image.src.clone(),
            width: image.width,
            height: image.height,
            image_file_name: image.file_name().to_string(),
            nodes: NODE_ORDER.map(|corner| {
                let c = overlay.corner(corner);
                Node { lat: c.lat, lon: c.lng }
            }),
            cm_per_pixel: overlay.cm_per_pixel(),
        }
    }
}

/// Full export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJson {
    pub images: Vec<ExportImage>,
    pub avg_cm_per_pixel: f64,
}

/// Build an export document from overlays given oldest first.
///
/// # Errors
///
/// Returns [`ExportError::NoSelection`] when `overlays` is empty.
pub fn generate_export_json<'a, I>(overlays: I) -> Result<ExportJson, ExportError>
where
    I: IntoIterator<Item = (OverlayId, &'a Overlay)>,
{
    let mut images: Vec<ExportImage> = overlays
        .into_iter()
        .map(|(id, overlay)| ExportImage::from_overlay(id, overlay))
        .collect();
    images.reverse();

    let avg_cm_per_pixel = average_cm_per_pixel(&images)?;
    Ok(ExportJson {
        images,
        avg_cm_per_pixel,
    })
}

fn average_cm_per_pixel(images: &[ExportImage]) -> Result<f64, ExportError> {
    if images.is_empty() {
        return Err(ExportError::NoSelection);
    }
    let sum: f64 = images.iter().map(|img| img.cm_per_pixel).sum();
    Ok(sum / images.len() as f64)
}
