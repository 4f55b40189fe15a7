//! Collection controller: selection, locking and group drag.
//!
//! The [`Collection`] owns every overlay under management, the edit handles
//! of editable overlays, the gesture registry and the active gesture.
//!
//! # Selection
//!
//! - A plain click on an overlay deselects every other overlay.
//! - A modified click (or a touch long-press) toggles the clicked overlay,
//!   provided it is editable.
//!
//! # Group Drag
//!
//! When a selected overlay is dragged, every overlay snapshots its projected
//! corners at drag start. Each drag step moves the dragged overlay by the
//! pointer delta, derives the corner-point delta (`cpd`) from its first
//! corner, and replays that delta as a pure translation on every other
//! selected, unlocked overlay. Group motion is always rigid, whatever the
//! dragged overlay's own gesture does.

use crate::events::{GestureRegistry, GestureTarget, Notification, OverlayId, PointerEvent, Subscription};
use crate::export::{generate_export_json, ExportError, ExportJson};
use crate::geometry::{Point, Transformation};
use crate::handle::{EditHandle, HandleMode};
use crate::log;
use crate::overlay::{Corner, LockMode, Overlay};
use crate::projection::Projection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for collection management operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectionError {
    /// No overlay with this id is registered.
    #[error("Unknown overlay: {0}")]
    UnknownOverlay(OverlayId),
}

/// Collection-wide configuration.
///
/// Missing fields fall back to their defaults when deserialized, so a host
/// can pass a partial options object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionOptions {
    /// Whether the collection starts editable
    pub editable: bool,
    /// Behaviour of corner handles created for editable overlays
    pub handle_mode: HandleMode,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            editable: true,
            handle_mode: HandleMode::FreeRotate,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    id: OverlayId,
    overlay: Overlay,
    handles: Option<[EditHandle; 4]>,
}

impl Entry {
    fn resync_handles<P: Projection>(&mut self, projection: &P) {
        if let Some(handles) = self.handles.as_mut() {
            for handle in handles.iter_mut() {
                handle.resync(&self.overlay, projection);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ActiveGesture {
    BodyDrag {
        id: OverlayId,
        anchor: Point,
        group: bool,
    },
    HandleDrag {
        id: OverlayId,
        corner: Corner,
    },
}

/// Set of overlays edited together.
#[derive(Debug, Clone)]
pub struct Collection<P: Projection> {
    options: CollectionOptions,
    projection: P,
    entries: Vec<Entry>,
    registry: GestureRegistry,
    next_id: u32,
    editable: bool,
    toolbar_visible: bool,
    active: Option<ActiveGesture>,
    notifications: Vec<Notification>,
}

impl<P: Projection> Collection<P> {
    /// Create an empty collection with default options.
    pub fn new(projection: P) -> Self {
        Self::with_options(projection, CollectionOptions::default())
    }

    pub fn with_options(projection: P, options: CollectionOptions) -> Self {
        Self {
            options,
            projection,
            entries: Vec::new(),
            registry: GestureRegistry::new(),
            next_id: 1,
            editable: options.editable,
            toolbar_visible: false,
            active: None,
            notifications: Vec::new(),
        }
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    /// Replace the viewport projection (e.g. after a zoom) and resync handles.
    pub fn set_projection(&mut self, projection: P) {
        self.projection = projection;
        for entry in self.entries.iter_mut() {
            entry.resync_handles(&self.projection);
        }
    }

    /// Register an overlay and subscribe it to gestures. Returns its id.
    pub fn add(&mut self, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;

        let handles = (self.editable && overlay.is_editable())
            .then(|| EditHandle::for_overlay(&overlay, self.options.handle_mode, &self.projection));
        self.entries.push(Entry { id, overlay, handles });
        self.registry.register(id);

        log::debug!(%id, "overlay added");
        id
    }

    /// Deregister an overlay and hand it back.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownOverlay`] if `id` is not registered.
    pub fn remove(&mut self, id: OverlayId) -> Result<Overlay, CollectionError> {
        let index = self.index_of(id)?;

        if self.active.is_some_and(|g| gesture_overlay(g) == id) {
            self.cancel_gesture();
        }
        self.registry.deregister(id);
        let entry = self.entries.remove(index);
        self.notifications.push(Notification::Removed { id });
        self.sync_toolbar();

        log::debug!(%id, "overlay removed");
        Ok(entry.overlay)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.overlay)
    }

    /// Overlays in registration order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> {
        self.entries.iter().map(|e| (e.id, &e.overlay))
    }

    pub fn ids(&self) -> Vec<OverlayId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Corner handles of an overlay, if it is currently editable.
    pub fn handles(&self, id: OverlayId) -> Option<&[EditHandle; 4]> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.handles.as_ref())
    }

    pub fn registry(&self) -> &GestureRegistry {
        &self.registry
    }

    /// Take every notification emitted since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Make the collection editable. Calling it twice is harmless.
    pub fn enable(&mut self) {
        if self.editable {
            return;
        }
        self.editable = true;

        let mode = self.options.handle_mode;
        for entry in self.entries.iter_mut() {
            if entry.overlay.is_editable() && entry.handles.is_none() {
                entry.handles = Some(EditHandle::for_overlay(&entry.overlay, mode, &self.projection));
            }
        }
    }

    /// Stop editing: cancel the active gesture and drop every handle.
    /// Calling it twice is harmless.
    pub fn disable(&mut self) {
        if !self.editable {
            return;
        }
        self.cancel_gesture();
        self.editable = false;
        for entry in self.entries.iter_mut() {
            entry.handles = None;
        }
    }

    /// Enable editing of one overlay, creating its handles.
    pub fn enable_editing(&mut self, id: OverlayId) -> Result<(), CollectionError> {
        let index = self.index_of(id)?;
        let entry = &mut self.entries[index];
        entry.overlay.set_editable(true);
        if self.editable && entry.handles.is_none() {
            entry.handles = Some(EditHandle::for_overlay(
                &entry.overlay,
                self.options.handle_mode,
                &self.projection,
            ));
        }
        Ok(())
    }

    /// Disable editing of one overlay, tearing down its handles and any
    /// gesture in progress on it.
    pub fn disable_editing(&mut self, id: OverlayId) -> Result<(), CollectionError> {
        let index = self.index_of(id)?;
        if self.active.is_some_and(|g| gesture_overlay(g) == id) {
            self.cancel_gesture();
        }
        let entry = &mut self.entries[index];
        entry.overlay.set_editable(false);
        entry.handles = None;
        Ok(())
    }

    pub fn lock(&mut self, id: OverlayId) -> Result<(), CollectionError> {
        self.set_lock_mode(id, LockMode::Lock)
    }

    pub fn unlock(&mut self, id: OverlayId) -> Result<(), CollectionError> {
        self.set_lock_mode(id, LockMode::None)
    }

    fn set_lock_mode(&mut self, id: OverlayId, mode: LockMode) -> Result<(), CollectionError> {
        let index = self.index_of(id)?;
        self.apply_lock_mode(index, mode);
        Ok(())
    }

    fn apply_lock_mode(&mut self, index: usize, mode: LockMode) {
        let id = self.entries[index].id;
        if mode == LockMode::Lock && self.active.is_some_and(|g| gesture_overlay(g) == id) {
            self.cancel_gesture();
        }

        let entry = &mut self.entries[index];
        entry.overlay.set_lock_mode(mode);
        if let Some(handles) = entry.handles.as_mut() {
            for handle in handles.iter_mut() {
                handle.set_draggable(mode == LockMode::None);
            }
        }
    }

    /// Lock every selected, unlocked overlay. Returns the ids that changed.
    pub fn lock_selected(&mut self) -> Vec<OverlayId> {
        self.set_selected_lock_mode(LockMode::Lock)
    }

    /// Unlock every selected, locked overlay. Returns the ids that changed.
    pub fn unlock_selected(&mut self) -> Vec<OverlayId> {
        self.set_selected_lock_mode(LockMode::None)
    }

    fn set_selected_lock_mode(&mut self, mode: LockMode) -> Vec<OverlayId> {
        let indices: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.overlay.is_selected() && e.overlay.lock_mode() != mode)
            .map(|(index, _)| index)
            .collect();

        indices
            .into_iter()
            .map(|index| {
                self.apply_lock_mode(index, mode);
                self.entries[index].id
            })
            .collect()
    }

    pub fn is_collected(&self, id: OverlayId) -> bool {
        self.get(id).is_some_and(|o| o.is_selected())
    }

    /// True if at least one overlay is selected.
    pub fn any_collected(&self) -> bool {
        self.entries.iter().any(|e| e.overlay.is_selected())
    }

    pub fn collected(&self) -> Vec<OverlayId> {
        self.entries
            .iter()
            .filter(|e| e.overlay.is_selected())
            .map(|e| e.id)
            .collect()
    }

    /// Overlays that bulk actions may touch: selected and not locked.
    pub fn eligible(&self) -> Vec<OverlayId> {
        self.entries
            .iter()
            .filter(|e| e.overlay.is_selected() && !e.overlay.is_locked())
            .map(|e| e.id)
            .collect()
    }

    /// Remove every eligible overlay. Locked overlays are never removed.
    pub fn remove_eligible(&mut self) -> Vec<(OverlayId, Overlay)> {
        let ids = self.eligible();
        let removed: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.remove(id).ok().map(|overlay| (id, overlay)))
            .collect();

        log::debug!(count = removed.len(), "removed eligible overlays");
        removed
    }

    /// Select every editable overlay.
    pub fn select_all(&mut self) {
        if !self.editable {
            return;
        }
        for entry in self.entries.iter_mut() {
            if entry.overlay.is_editable() {
                entry.overlay.set_selected(true);
                entry.overlay.unpick();
            }
        }
        self.sync_toolbar();
    }

    pub fn deselect_all(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.overlay.set_selected(false);
        }
        self.sync_toolbar();
    }

    /// Pointer press on an overlay surface.
    ///
    /// Every other overlay is unpicked. A plain click also deselects every
    /// other overlay; with `modifier` held the selection is kept and the
    /// clicked overlay's membership is toggled if it is editable.
    /// Returns `false` if the collection is not editable or `id` is unknown.
    pub fn click(&mut self, id: OverlayId, modifier: bool) -> bool {
        if !self.editable || self.index_of(id).is_err() {
            return false;
        }

        for entry in self.entries.iter_mut().filter(|e| e.id != id) {
            if !modifier {
                entry.overlay.set_selected(false);
            }
            entry.overlay.unpick();
        }
        self.toggle_multi_collect(id, modifier);
        true
    }

    /// Touch long-press on an overlay surface: toggles its selection without
    /// touching the other overlays.
    pub fn long_press(&mut self, id: OverlayId) -> bool {
        if !self.editable || self.index_of(id).is_err() {
            return false;
        }
        self.toggle_multi_collect(id, true);
        true
    }

    fn toggle_multi_collect(&mut self, id: OverlayId, toggle: bool) {
        let any_collected = {
            let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
                return;
            };
            if toggle && entry.overlay.is_editable() {
                let selected = entry.overlay.is_selected();
                entry.overlay.set_selected(!selected);
            }
            self.entries.iter().any(|e| e.overlay.is_selected())
        };

        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            if any_collected {
                entry.overlay.unpick();
            } else if entry.overlay.is_editable() {
                entry.overlay.pick();
            }
        }
        self.sync_toolbar();
    }

    fn sync_toolbar(&mut self) {
        let visible = self.any_collected();
        if visible != self.toolbar_visible {
            self.toolbar_visible = visible;
            self.notifications.push(Notification::Toolbar { visible });
        }
    }

    /// Route a pointer event to the overlay or handle it targets.
    ///
    /// Events for overlays without a live registration are ignored. Returns
    /// `true` if the event was consumed.
    pub fn dispatch(&mut self, target: GestureTarget, event: PointerEvent) -> bool {
        match target {
            GestureTarget::Body { id } => {
                let subscription = match event {
                    PointerEvent::Click { .. } | PointerEvent::LongPress => Subscription::Select,
                    _ => Subscription::Drag,
                };
                if !self.registry.is_subscribed(id, subscription) {
                    return false;
                }

                match event {
                    PointerEvent::DragStart { position } => self.drag_start(id, position),
                    PointerEvent::Drag { position } => self.drag(id, position),
                    PointerEvent::DragEnd { .. } => self.drag_end(id),
                    PointerEvent::Click { modifier } => self.click(id, modifier),
                    PointerEvent::LongPress => self.long_press(id),
                }
            }
            GestureTarget::Handle { id, corner } => match event {
                PointerEvent::DragStart { .. } => self.handle_drag_start(id, corner),
                PointerEvent::Drag { position } => self.handle_drag(id, corner, position),
                PointerEvent::DragEnd { .. } => self.handle_drag_end(id, corner),
                PointerEvent::Click { .. } | PointerEvent::LongPress => false,
            },
        }
    }

    /// Begin dragging an overlay body at `position`.
    ///
    /// Locked or non-editable overlays do not move. If the overlay is selected
    /// the drag becomes a group drag and every overlay snapshots its corners.
    pub fn drag_start(&mut self, id: OverlayId, position: Point) -> bool {
        if !self.editable || self.active.is_some() {
            return false;
        }
        let Ok(index) = self.index_of(id) else {
            return false;
        };
        let overlay = &self.entries[index].overlay;
        if !overlay.is_editable() || overlay.is_locked() {
            return false;
        }

        let group = overlay.is_selected();
        if group {
            for entry in self.entries.iter_mut() {
                entry.overlay.snapshot_drag_start(&self.projection);
                entry.overlay.unpick();
            }
        } else {
            self.entries[index].overlay.snapshot_drag_start(&self.projection);
        }

        self.active = Some(ActiveGesture::BodyDrag {
            id,
            anchor: position,
            group,
        });
        log::debug!(%id, group, "drag start");
        true
    }

    /// Move the dragged overlay to follow the pointer and, for a group drag,
    /// translate the rest of the selection by the same corner-point delta.
    pub fn drag(&mut self, id: OverlayId, position: Point) -> bool {
        let Some(ActiveGesture::BodyDrag { id: active, anchor, group }) = self.active else {
            return false;
        };
        if active != id {
            return false;
        }
        let Ok(index) = self.index_of(id) else {
            return false;
        };

        let entry = &mut self.entries[index];
        let Some(start) = entry.overlay.drag_start_corners().copied() else {
            return false;
        };

        let pointer_delta = position - anchor;
        let moved = Transformation::translation(pointer_delta.x, pointer_delta.y).transform_all(&start);
        entry.overlay.set_corners_from_points(&moved, &self.projection);
        entry.resync_handles(&self.projection);
        self.notifications.push(Notification::Update { id });

        if group {
            let current = self.entries[index].overlay.projected_corners(&self.projection);
            let cpd = current[0] - start[0];
            self.update_collection_from_points(cpd, id);
        }
        true
    }

    /// Finish a body drag and drop every drag snapshot.
    pub fn drag_end(&mut self, id: OverlayId) -> bool {
        let Some(ActiveGesture::BodyDrag { id: active, .. }) = self.active else {
            return false;
        };
        if active != id {
            return false;
        }

        self.clear_snapshots();
        self.active = None;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.overlay.mark_edited();
        }
        self.notifications.push(Notification::Edit { id });
        log::debug!(%id, "drag end");
        true
    }

    /// New projected corners for every overlay a group drag with delta `cpd`
    /// would move: selected, unlocked, not the dragged one, with a snapshot.
    pub fn calc_collection_from_points(&self, cpd: Point, dragged: OverlayId) -> Vec<(OverlayId, [Point; 4])> {
        let transform = Transformation::translation(cpd.x, cpd.y);

        self.entries
            .iter()
            .filter(|e| e.id != dragged && !e.overlay.is_locked() && e.overlay.is_selected())
            .filter_map(|e| {
                e.overlay
                    .drag_start_corners()
                    .map(|start| (e.id, transform.transform_all(start)))
            })
            .collect()
    }

    fn update_collection_from_points(&mut self, cpd: Point, dragged: OverlayId) {
        let to_move = self.calc_collection_from_points(cpd, dragged);

        for (id, points) in to_move {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
                entry.overlay.set_corners_from_points(&points, &self.projection);
                entry.resync_handles(&self.projection);
                self.notifications.push(Notification::Update { id });
            }
        }
    }

    /// Begin dragging a corner handle.
    pub fn handle_drag_start(&mut self, id: OverlayId, corner: Corner) -> bool {
        if !self.editable || self.active.is_some() {
            return false;
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let Some(handles) = entry.handles.as_mut() else {
            return false;
        };

        if !handles[corner.index()].drag_start(&mut entry.overlay, &self.projection) {
            return false;
        }
        self.active = Some(ActiveGesture::HandleDrag { id, corner });
        self.notifications.push(Notification::EditStart { id });
        true
    }

    /// Apply an intermediate handle position. Degenerate frames are skipped.
    pub fn handle_drag(&mut self, id: OverlayId, corner: Corner, position: Point) -> bool {
        if self.active != Some(ActiveGesture::HandleDrag { id, corner }) {
            return false;
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let Some(handles) = entry.handles.as_mut() else {
            return false;
        };

        if !handles[corner.index()].drag(&mut entry.overlay, position, &self.projection) {
            return false;
        }
        entry.resync_handles(&self.projection);
        self.notifications.push(Notification::Update { id });
        true
    }

    /// Finish a handle drag; the overlay is marked edited.
    pub fn handle_drag_end(&mut self, id: OverlayId, corner: Corner) -> bool {
        if self.active != Some(ActiveGesture::HandleDrag { id, corner }) {
            return false;
        }
        self.active = None;

        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let Some(handles) = entry.handles.as_mut() else {
            return false;
        };

        if !handles[corner.index()].drag_end(&mut entry.overlay, &self.projection) {
            return false;
        }
        self.notifications.push(Notification::Edit { id });
        true
    }

    /// Abandon the active gesture and drop every drag snapshot.
    pub fn cancel_gesture(&mut self) {
        if let Some(ActiveGesture::HandleDrag { id, corner }) = self.active {
            if let Some(handles) = self
                .entries
                .iter_mut()
                .find(|e| e.id == id)
                .and_then(|e| e.handles.as_mut())
            {
                handles[corner.index()].cancel();
            }
        }
        if self.active.take().is_some() {
            log::debug!("gesture cancelled");
        }
        self.clear_snapshots();
    }

    fn clear_snapshots(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.overlay.clear_drag_start();
        }
    }

    /// Export the selected overlays, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoSelection`] when nothing is selected.
    pub fn generate_export_json(&self) -> Result<ExportJson, ExportError> {
        generate_export_json(self.iter().filter(|(_, o)| o.is_selected()))
    }

    fn index_of(&self, id: OverlayId) -> Result<usize, CollectionError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(CollectionError::UnknownOverlay(id))
    }
}

fn gesture_overlay(gesture: ActiveGesture) -> OverlayId {
    match gesture {
        ActiveGesture::BodyDrag { id, .. } | ActiveGesture::HandleDrag { id, .. } => id,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::overlay::ImageRef;
    use crate::projection::{IdentityProjection, LatLng};
    use proptest::prelude::*;

    /// Integer-valued coordinates keep translations exact.
    fn coord() -> impl Strategy<Value = f64> {
        (-500i32..500).prop_map(f64::from)
    }

    /// Per overlay: (top-left x, top-left y, selected, locked).
    fn layout_strategy() -> impl Strategy<Value = Vec<(f64, f64, bool, bool)>> {
        prop::collection::vec((coord(), coord(), any::<bool>(), any::<bool>()), 1..8)
    }

    fn overlay_at(x: f64, y: f64) -> Overlay {
        Overlay::new(
            ImageRef::new("img.png", 10, 10),
            [
                LatLng::new(y, x),
                LatLng::new(y, x + 7.0),
                LatLng::new(y + 3.0, x),
                LatLng::new(y + 3.0, x + 7.0),
            ],
            1.0,
        )
    }

    proptest! {
        /// Property: a group drag translates exactly the selected, unlocked
        /// overlays and leaves every other overlay untouched.
        #[test]
        fn prop_group_drag_translation(
            layout in layout_strategy(),
            dx in coord(),
            dy in coord(),
        ) {
            let mut c = Collection::new(IdentityProjection);
            let dragged = c.add(overlay_at(0.0, 0.0));
            c.long_press(dragged);

            let ids: Vec<_> = layout
                .iter()
                .map(|&(x, y, selected, locked)| {
                    let id = c.add(overlay_at(x, y));
                    if selected {
                        c.long_press(id);
                    }
                    if locked {
                        c.lock(id).unwrap();
                    }
                    id
                })
                .collect();
            let before: Vec<_> = ids.iter().map(|&id| c.get(id).unwrap().corners()).collect();

            prop_assert!(c.drag_start(dragged, Point::new(0.0, 0.0)));
            prop_assert!(c.drag(dragged, Point::new(dx, dy)));
            c.drag_end(dragged);

            for ((&id, corners), &(_, _, selected, locked)) in ids.iter().zip(&before).zip(&layout) {
                let after = c.get(id).unwrap().corners();
                if selected && !locked {
                    let expected = corners.map(|ll| LatLng::new(ll.lat + dy, ll.lng + dx));
                    prop_assert_eq!(after, expected);
                } else {
                    prop_assert_eq!(after, *corners);
                }
            }
        }
    }
}
