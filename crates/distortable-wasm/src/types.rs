//! Conversions between JavaScript-shaped data and core types.

use distortable_core::{Corner, LatLng, OverlayId};
use serde::{Deserialize, Serialize};

/// JavaScript-compatible corner coordinate (`{lat, lng}`, as Leaflet uses).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JsLatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<JsLatLng> for LatLng {
    fn from(js: JsLatLng) -> Self {
        LatLng::new(js.lat, js.lng)
    }
}

impl From<LatLng> for JsLatLng {
    fn from(ll: LatLng) -> Self {
        JsLatLng {
            lat: ll.lat,
            lng: ll.lng,
        }
    }
}

/// JavaScript-compatible screen point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JsPoint {
    pub x: f64,
    pub y: f64,
}

/// Validate a corner list coming from JavaScript.
///
/// Exactly four finite corners are required.
pub(crate) fn corners_from_js(corners: Vec<JsLatLng>) -> Result<[LatLng; 4], String> {
    let count = corners.len();
    let corners: [JsLatLng; 4] = corners
        .try_into()
        .map_err(|_| format!("Expected 4 corners, got {}", count))?;

    if corners.iter().any(|c| !c.lat.is_finite() || !c.lng.is_finite()) {
        return Err("Corner coordinates must be finite".to_string());
    }
    Ok(corners.map(LatLng::from))
}

/// Convert a corner index from JavaScript.
pub(crate) fn corner_from_index(index: u8) -> Result<Corner, String> {
    Corner::from_index(index as usize).ok_or_else(|| format!("Invalid corner index: {}", index))
}

/// Overlay ids cross the boundary unchanged as plain JS numbers.
pub(crate) fn id_to_js(id: OverlayId) -> u32 {
    id.0
}

pub(crate) fn id_from_js(id: u32) -> OverlayId {
    OverlayId(id)
}
