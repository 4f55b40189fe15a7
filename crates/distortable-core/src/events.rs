//! Pointer gestures, gesture registrations and outgoing notifications.
//!
//! The host translates its DOM/map events into [`PointerEvent`]s addressed to
//! a [`GestureTarget`]. A target only receives events while it is registered
//! in the [`GestureRegistry`]; the collection registers an overlay when it is
//! added and deregisters it when it is removed.

use crate::geometry::Point;
use crate::overlay::Corner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable identifier assigned to an overlay by its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(pub u32);

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which element of an overlay a gesture is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GestureTarget {
    /// The overlay image surface.
    Body { id: OverlayId },
    /// One of the overlay's corner handles.
    Handle { id: OverlayId, corner: Corner },
}

impl GestureTarget {
    pub fn overlay(&self) -> OverlayId {
        match *self {
            GestureTarget::Body { id } | GestureTarget::Handle { id, .. } => id,
        }
    }
}

/// Pointer input in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    DragStart { position: Point },
    Drag { position: Point },
    DragEnd { position: Point },
    /// Pointer press on the overlay surface; `modifier` is the multi-select key.
    Click { modifier: bool },
    /// Touch long-press (context menu) on the overlay surface.
    LongPress,
}

/// Handler families an overlay can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subscription {
    /// dragstart / drag / dragend on the overlay body.
    Drag,
    /// click / long-press on the overlay surface.
    Select,
}

/// Table of live gesture subscriptions.
///
/// Registering or deregistering twice is harmless.
#[derive(Debug, Clone, Default)]
pub struct GestureRegistry {
    entries: BTreeSet<(OverlayId, Subscription)>,
}

impl GestureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an overlay to every handler family.
    pub fn register(&mut self, id: OverlayId) {
        self.entries.insert((id, Subscription::Drag));
        self.entries.insert((id, Subscription::Select));
    }

    /// Drop every subscription of an overlay.
    pub fn deregister(&mut self, id: OverlayId) {
        self.entries.remove(&(id, Subscription::Drag));
        self.entries.remove(&(id, Subscription::Select));
    }

    pub fn is_subscribed(&self, id: OverlayId, subscription: Subscription) -> bool {
        self.entries.contains(&(id, subscription))
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Notification emitted by the collection for the host to act on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// A handle gesture began on the overlay.
    EditStart { id: OverlayId },
    /// A gesture on the overlay finished and changed it.
    Edit { id: OverlayId },
    /// The overlay's corners changed; redraw it and its handles.
    Update { id: OverlayId },
    /// The overlay left the collection.
    Removed { id: OverlayId },
    /// The group-editing toolbar should be shown or hidden.
    Toolbar { visible: bool },
}
