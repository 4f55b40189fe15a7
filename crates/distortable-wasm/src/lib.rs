//! Distortable WASM - WebAssembly bindings for distortable overlay editing
//!
//! This crate exposes the distortable-core collection controller to a
//! JavaScript map frontend. The frontend renders overlays and handles, and
//! forwards pointer events in layer-point coordinates.
//!
//! # Module Structure
//!
//! - `collection` - The `JsOverlayCollection` wrapper
//! - `types` - JavaScript-shaped coordinate types and conversions
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsOverlayCollection } from '@distortable/wasm';
//!
//! await init();
//!
//! const collection = new JsOverlayCollection(map.getZoom(), undefined);
//! const id = collection.add_overlay(img.src, img.width, img.height, corners, 2.5);
//! map.on('zoomend', () => collection.set_zoom(map.getZoom()));
//! ```

use wasm_bindgen::prelude::*;

mod collection;
mod types;

// Re-export public types
pub use collection::JsOverlayCollection;
pub use types::{JsLatLng, JsPoint};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
