//! WASM bindings for the overlay collection.
//!
//! The host map keeps rendering and DOM listeners; it forwards pointer events
//! here in layer-point coordinates and redraws whatever the drained
//! notifications name.

use crate::types::{corner_from_index, corners_from_js, id_from_js, id_to_js, JsLatLng, JsPoint};
use distortable_core::{
    Collection, CollectionOptions, GestureTarget, ImageRef, Notification, Overlay, Point, PointerEvent,
    WebMercator,
};
use wasm_bindgen::prelude::*;

/// A collection of distortable overlays for JavaScript.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const collection = new JsOverlayCollection(16, { handleMode: 'freeRotate' });
/// const id = collection.add_overlay(img.src, img.width, img.height, corners, 2.5);
///
/// collection.dispatch({ kind: 'body', id }, { type: 'click', modifier: e.shiftKey });
/// for (const note of collection.take_notifications()) redraw(note);
/// ```
#[wasm_bindgen]
pub struct JsOverlayCollection {
    inner: Collection<WebMercator>,
}

#[wasm_bindgen]
impl JsOverlayCollection {
    /// Create a collection projecting at `zoom`.
    ///
    /// `options` may be `undefined` or a partial `{ editable, handleMode }` object.
    #[wasm_bindgen(constructor)]
    pub fn new(zoom: f64, options: JsValue) -> Result<JsOverlayCollection, JsValue> {
        let options: CollectionOptions = if options.is_undefined() || options.is_null() {
            CollectionOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
        };
        Ok(Self::with_options(zoom, options))
    }

    /// Register an overlay. `corners` is an array of four `{lat, lng}` objects.
    pub fn add_overlay(
        &mut self,
        src: String,
        width: u32,
        height: u32,
        corners: JsValue,
        cm_per_pixel: f64,
    ) -> Result<u32, JsValue> {
        let corners: Vec<JsLatLng> = serde_wasm_bindgen::from_value(corners)
            .map_err(|e| JsValue::from_str(&format!("Invalid corners: {}", e)))?;
        self.add(src, width, height, corners, cm_per_pixel)
            .map_err(|e| JsValue::from_str(&e))
    }

    pub fn remove_overlay(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner
            .remove(id_from_js(id))
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Update the projection after a zoom change.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.inner.set_projection(WebMercator::new(zoom));
    }

    /// Forward a pointer event. Returns whether it was consumed.
    ///
    /// `target` is `{kind: 'body', id}` or `{kind: 'handle', id, corner}` with
    /// `corner` one of `'topLeft' | 'topRight' | 'bottomLeft' | 'bottomRight'`;
    /// `event` is `{type: 'dragStart' | 'drag' | 'dragEnd', position}`,
    /// `{type: 'click', modifier}` or `{type: 'longPress'}`.
    pub fn dispatch(&mut self, target: JsValue, event: JsValue) -> Result<bool, JsValue> {
        let target: GestureTarget = serde_wasm_bindgen::from_value(target)
            .map_err(|e| JsValue::from_str(&format!("Invalid gesture target: {}", e)))?;
        let event: PointerEvent = serde_wasm_bindgen::from_value(event)
            .map_err(|e| JsValue::from_str(&format!("Invalid pointer event: {}", e)))?;
        Ok(self.inner.dispatch(target, event))
    }

    pub fn click(&mut self, id: u32, modifier: bool) -> bool {
        self.inner.click(id_from_js(id), modifier)
    }

    pub fn long_press(&mut self, id: u32) -> bool {
        self.inner.long_press(id_from_js(id))
    }

    pub fn any_collected(&self) -> bool {
        self.inner.any_collected()
    }

    pub fn is_collected(&self, id: u32) -> bool {
        self.inner.is_collected(id_from_js(id))
    }

    /// CSS class to put on the overlay element, if any.
    pub fn selection_class(&self, id: u32) -> Option<String> {
        self.inner
            .get(id_from_js(id))
            .and_then(|o| o.selection_class())
            .map(str::to_string)
    }

    pub fn lock(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner
            .lock(id_from_js(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn unlock(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner
            .unlock(id_from_js(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn enable(&mut self) {
        self.inner.enable();
    }

    pub fn disable(&mut self) {
        self.inner.disable();
    }

    /// Remove every selected, unlocked overlay. Returns the removed ids.
    pub fn remove_selected(&mut self) -> Vec<u32> {
        self.inner
            .remove_eligible()
            .into_iter()
            .map(|(id, _)| id_to_js(id))
            .collect()
    }

    /// Current corners of an overlay as `{lat, lng}` objects.
    pub fn corners(&self, id: u32) -> Result<JsValue, JsValue> {
        let corners = self
            .corner_list(id)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown overlay: {}", id)))?;
        serde_wasm_bindgen::to_value(&corners).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Screen positions of the overlay's corner handles, or `null` when it
    /// has none.
    pub fn handle_positions(&self, id: u32) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.handle_points(id)).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Drain pending notifications.
    pub fn take_notifications(&mut self) -> Result<JsValue, JsValue> {
        let notes: Vec<Notification> = self.inner.take_notifications();
        serde_wasm_bindgen::to_value(&notes).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Export the selected overlays.
    pub fn export_json(&self) -> Result<JsValue, JsValue> {
        let json = self
            .inner
            .generate_export_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(&json).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Drag a corner handle to `(x, y)` in one complete gesture.
    pub fn drag_handle(&mut self, id: u32, corner: u8, x: f64, y: f64) -> Result<bool, JsValue> {
        self.move_handle(id, corner, Point::new(x, y))
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }
}

impl JsOverlayCollection {
    pub(crate) fn with_options(zoom: f64, options: CollectionOptions) -> Self {
        Self {
            inner: Collection::with_options(WebMercator::new(zoom), options),
        }
    }

    pub(crate) fn add(
        &mut self,
        src: String,
        width: u32,
        height: u32,
        corners: Vec<JsLatLng>,
        cm_per_pixel: f64,
    ) -> Result<u32, String> {
        let corners = corners_from_js(corners)?;
        let overlay = Overlay::new(ImageRef::new(src, width, height), corners, cm_per_pixel);
        Ok(id_to_js(self.inner.add(overlay)))
    }

    pub(crate) fn corner_list(&self, id: u32) -> Option<Vec<JsLatLng>> {
        self.inner
            .get(id_from_js(id))
            .map(|o| o.corners().iter().map(|&c| JsLatLng::from(c)).collect())
    }

    pub(crate) fn handle_points(&self, id: u32) -> Option<Vec<JsPoint>> {
        self.inner.handles(id_from_js(id)).map(|handles| {
            handles
                .iter()
                .map(|h| {
                    let p = h.position();
                    JsPoint { x: p.x, y: p.y }
                })
                .collect()
        })
    }

    pub(crate) fn move_handle(&mut self, id: u32, corner: u8, to: Point) -> Result<bool, String> {
        let corner = corner_from_index(corner)?;
        let target = GestureTarget::Handle {
            id: id_from_js(id),
            corner,
        };
        let started = self.inner.dispatch(target, PointerEvent::DragStart { position: to });
        let moved = self.inner.dispatch(target, PointerEvent::Drag { position: to });
        let ended = self.inner.dispatch(target, PointerEvent::DragEnd { position: to });
        Ok(started && moved && ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lng: f64) -> Vec<JsLatLng> {
        vec![
            JsLatLng { lat: lat + 0.01, lng },
            JsLatLng { lat: lat + 0.01, lng: lng + 0.01 },
            JsLatLng { lat, lng },
            JsLatLng { lat, lng: lng + 0.01 },
        ]
    }

    fn collection() -> JsOverlayCollection {
        JsOverlayCollection::with_options(16.0, CollectionOptions::default())
    }

    #[test]
    fn test_add_and_read_corners() {
        let mut c = collection();
        let id = c
            .add("https://example.org/a.png".into(), 100, 50, square(41.0, -87.0), 2.0)
            .unwrap();
        assert_eq!(c.length(), 1);
        assert_eq!(c.corner_list(id).unwrap(), square(41.0, -87.0));
        assert_eq!(c.handle_points(id).unwrap().len(), 4);
    }

    #[test]
    fn test_add_rejects_bad_corners() {
        let mut c = collection();
        let mut corners = square(41.0, -87.0);
        corners.pop();
        assert!(c.add("a.png".into(), 1, 1, corners, 1.0).is_err());
        assert_eq!(c.length(), 0);
    }

    #[test]
    fn test_selection_roundtrip() {
        let mut c = collection();
        let a = c.add("a.png".into(), 1, 1, square(41.0, -87.0), 1.0).unwrap();
        let b = c.add("b.png".into(), 1, 1, square(41.1, -87.1), 1.0).unwrap();

        assert!(c.click(a, true));
        assert!(c.click(b, true));
        assert!(c.is_collected(a));
        assert!(c.any_collected());
        assert_eq!(c.selection_class(a).as_deref(), Some("collected"));

        c.lock(b).unwrap();
        assert_eq!(c.remove_selected(), vec![a]);
        assert_eq!(c.length(), 1);
        assert!(c.is_collected(b));
    }

    #[test]
    fn test_drag_handle_scales_overlay() {
        let mut c = collection();
        let id = c.add("a.png".into(), 1, 1, square(41.0, -87.0), 1.0).unwrap();
        let before = c.handle_points(id).unwrap();

        let br = before[3];
        let tl = before[0];
        let to = Point::new(br.x + (br.x - tl.x) / 2.0, br.y + (br.y - tl.y) / 2.0);
        assert!(c.move_handle(id, 3, to).unwrap());

        let after = c.handle_points(id).unwrap();
        assert!((after[3].x - to.x).abs() < 1e-6);
        assert!((after[3].y - to.y).abs() < 1e-6);
    }

    #[test]
    fn test_drag_handle_invalid_corner() {
        let mut c = collection();
        let id = c.add("a.png".into(), 1, 1, square(41.0, -87.0), 1.0).unwrap();
        assert!(c.move_handle(id, 9, Point::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_set_zoom_moves_handles() {
        let mut c = collection();
        let id = c.add("a.png".into(), 1, 1, square(41.0, -87.0), 1.0).unwrap();
        let z16 = c.handle_points(id).unwrap()[0];
        c.set_zoom(17.0);
        let z17 = c.handle_points(id).unwrap()[0];
        assert!((z17.x - 2.0 * z16.x).abs() < 1e-6);
    }

    #[test]
    fn test_disable_drops_handles() {
        let mut c = collection();
        let id = c.add("a.png".into(), 1, 1, square(41.0, -87.0), 1.0).unwrap();
        c.disable();
        assert!(c.handle_points(id).is_none());
        c.enable();
        assert!(c.handle_points(id).is_some());
    }
}
