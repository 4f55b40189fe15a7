//! Edit handles bound to overlay corners.
//!
//! A handle never owns overlay state. Each gesture method borrows the owning
//! [`Overlay`] mutably and asks it to rebuild its corners.
//!
//! # Gesture
//!
//! ```text
//! Idle ──drag_start──▶ Dragging ──drag_end──▶ Idle
//!                        │  ▲
//!                        └──┘ drag
//! ```
//!
//! While dragging, every frame compares the pre-gesture handle position with
//! the current pointer position around the overlay center, and the overlay
//! rebuilds its corners from the snapshot taken at `drag_start`. Frames that
//! would divide by a zero radius are skipped.

use crate::geometry::{angle_delta, scale_factor, GeometryError, Point};
use crate::log;
use crate::overlay::{Corner, Overlay};
use crate::projection::Projection;
use serde::{Deserialize, Serialize};

/// What dragging a corner handle does to its overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandleMode {
    /// Scale and rotate about the center.
    #[default]
    FreeRotate,
    /// Scale about the center only.
    Scale,
    /// Rotate about the center only.
    Rotate,
    /// Move only the dragged corner.
    Distort,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HandleState {
    Idle,
    Dragging { former: Point },
}

/// Draggable control point for one overlay corner.
#[derive(Debug, Clone, PartialEq)]
pub struct EditHandle {
    corner: Corner,
    mode: HandleMode,
    draggable: bool,
    position: Point,
    state: HandleState,
}

impl EditHandle {
    /// Create a handle positioned on `overlay`'s corner.
    ///
    /// Handles on locked overlays are created non-draggable.
    pub fn new<P: Projection>(overlay: &Overlay, corner: Corner, mode: HandleMode, projection: &P) -> Self {
        Self {
            corner,
            mode,
            draggable: !overlay.is_locked(),
            position: projection.project(overlay.corner(corner)),
            state: HandleState::Idle,
        }
    }

    /// One handle per corner, in corner order.
    pub fn for_overlay<P: Projection>(overlay: &Overlay, mode: HandleMode, projection: &P) -> [EditHandle; 4] {
        Corner::ALL.map(|corner| EditHandle::new(overlay, corner, mode, projection))
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn mode(&self) -> HandleMode {
        self.mode
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
        if !draggable {
            self.state = HandleState::Idle;
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, HandleState::Dragging { .. })
    }

    /// Begin a gesture. Returns `true` if the handle entered `Dragging`,
    /// in which case the caller should announce an edit start.
    pub fn drag_start<P: Projection>(&mut self, overlay: &mut Overlay, projection: &P) -> bool {
        if !self.draggable || !overlay.is_editable() || self.is_dragging() {
            return false;
        }

        overlay.snapshot_drag_start(projection);
        self.state = HandleState::Dragging {
            former: self.position,
        };
        log::debug!(corner = ?self.corner, "handle drag start");
        true
    }

    /// Apply one intermediate drag position.
    ///
    /// Returns `true` when the overlay's corners changed.
    pub fn drag<P: Projection>(&mut self, overlay: &mut Overlay, position: Point, projection: &P) -> bool {
        let HandleState::Dragging { former } = self.state else {
            return false;
        };
        self.position = position;

        if self.mode == HandleMode::Distort {
            overlay.move_corner(self.corner, position, projection);
            return true;
        }

        let center = overlay.center(projection);
        let scale = match scale_factor(center, former, position) {
            Ok(scale) => scale,
            Err(GeometryError::DegenerateRadius) => {
                log::debug!(corner = ?self.corner, "skipping frame with zero scale radius");
                return false;
            }
        };
        let angle = angle_delta(center, former, position);

        let (scale, angle) = match self.mode {
            HandleMode::Scale => (scale, 0.0),
            HandleMode::Rotate => (1.0, angle),
            HandleMode::FreeRotate | HandleMode::Distort => (scale, angle),
        };

        overlay.scale_rotate_from_drag_start(center, scale, angle, projection)
    }

    /// Finish the gesture. Returns `true` if a gesture was active; the overlay
    /// is then marked edited.
    pub fn drag_end<P: Projection>(&mut self, overlay: &mut Overlay, projection: &P) -> bool {
        if !self.is_dragging() {
            return false;
        }

        self.state = HandleState::Idle;
        overlay.clear_drag_start();
        overlay.mark_edited();
        self.resync(overlay, projection);
        log::debug!(corner = ?self.corner, "handle drag end");
        true
    }

    /// Abandon an active gesture without marking the overlay edited.
    pub fn cancel(&mut self) {
        self.state = HandleState::Idle;
    }

    /// Re-read the handle position from the overlay's corner.
    pub fn resync<P: Projection>(&mut self, overlay: &Overlay, projection: &P) {
        self.position = projection.project(overlay.corner(self.corner));
    }
}
