//! Overlay corner model.
//!
//! An [`Overlay`] is a distortable quadrilateral image described by exactly
//! four corners. Corner order is fixed:
//!
//! ```text
//! 0 ─── 1
//! │     │
//! 2 ─── 3
//! ```
//!
//! Corners are stored geographically; the transform helpers take a
//! [`Projection`] and do their math in projected space.

use crate::geometry::{centroid, scale_rotate_about, Point};
use crate::log;
use crate::projection::{LatLng, Projection};
use serde::{Deserialize, Serialize};

/// Visual marker derived from the selection flag.
pub const COLLECTED_CLASS: &str = "collected";

/// One of the four overlay corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Corner for an index in `0..4`.
    pub fn from_index(index: usize) -> Option<Corner> {
        Corner::ALL.get(index).copied()
    }
}

/// Whether an overlay takes part in group transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    #[default]
    None,
    Lock,
}

/// Source image an overlay displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image URL or path
    pub src: String,
    /// Natural width in pixels
    pub width: u32,
    /// Natural height in pixels
    pub height: u32,
}

impl ImageRef {
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
        }
    }

    /// Final path segment of `src`.
    pub fn file_name(&self) -> &str {
        self.src.rsplit('/').next().unwrap_or(&self.src)
    }
}

/// A distortable image overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    image: ImageRef,
    corners: [LatLng; 4],
    cm_per_pixel: f64,
    lock_mode: LockMode,
    editable: bool,
    selected: bool,
    picked: bool,
    edited: bool,
    drag_start_corners: Option<[Point; 4]>,
}

impl Overlay {
    /// Create an unlocked, editable, unselected overlay.
    ///
    /// # Arguments
    /// * `image` - Source image reference
    /// * `corners` - Corners in `[top-left, top-right, bottom-left, bottom-right]` order
    /// * `cm_per_pixel` - Ground resolution of the image
    pub fn new(image: ImageRef, corners: [LatLng; 4], cm_per_pixel: f64) -> Self {
        Self {
            image,
            corners,
            cm_per_pixel,
            lock_mode: LockMode::None,
            editable: true,
            selected: false,
            picked: false,
            edited: false,
            drag_start_corners: None,
        }
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn cm_per_pixel(&self) -> f64 {
        self.cm_per_pixel
    }

    pub fn corner(&self, corner: Corner) -> LatLng {
        self.corners[corner.index()]
    }

    pub fn corners(&self) -> [LatLng; 4] {
        self.corners
    }

    pub fn set_corners(&mut self, corners: [LatLng; 4]) {
        self.corners = corners;
    }

    /// Replace all corners from projected points.
    pub fn set_corners_from_points<P: Projection>(&mut self, points: &[Point; 4], projection: &P) {
        self.corners = points.map(|p| projection.unproject(p));
    }

    pub fn projected_corners<P: Projection>(&self, projection: &P) -> [Point; 4] {
        self.corners.map(|c| projection.project(c))
    }

    /// Center of the overlay in projected space.
    pub fn center<P: Projection>(&self, projection: &P) -> Point {
        centroid(&self.projected_corners(projection))
    }

    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    pub fn set_lock_mode(&mut self, mode: LockMode) {
        self.lock_mode = mode;
    }

    pub fn is_locked(&self) -> bool {
        self.lock_mode == LockMode::Lock
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Enable or disable editing. Disabling drops any pending drag snapshot.
    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
        if !editable {
            self.drag_start_corners = None;
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Visual class derived from the selection flag.
    pub fn selection_class(&self) -> Option<&'static str> {
        self.selected.then_some(COLLECTED_CLASS)
    }

    pub fn is_picked(&self) -> bool {
        self.picked
    }

    pub fn pick(&mut self) {
        self.picked = true;
    }

    pub fn unpick(&mut self) {
        self.picked = false;
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn mark_edited(&mut self) {
        self.edited = true;
    }

    pub fn drag_start_corners(&self) -> Option<&[Point; 4]> {
        self.drag_start_corners.as_ref()
    }

    /// Snapshot the projected corners for the gesture that is starting.
    pub fn snapshot_drag_start<P: Projection>(&mut self, projection: &P) {
        self.drag_start_corners = Some(self.projected_corners(projection));
    }

    pub fn clear_drag_start(&mut self) {
        self.drag_start_corners = None;
    }

    /// Rebuild all corners from the drag-start snapshot by scaling and
    /// rotating about `center`.
    ///
    /// Returns `false` (leaving the corners untouched) when there is no
    /// snapshot or the result would not be finite.
    pub fn scale_rotate_from_drag_start<P: Projection>(
        &mut self,
        center: Point,
        scale: f64,
        angle: f64,
        projection: &P,
    ) -> bool {
        let Some(start) = self.drag_start_corners else {
            return false;
        };

        let points = start.map(|p| scale_rotate_about(center, p, scale, angle));
        if !points.iter().all(|p| p.is_finite()) {
            log::warn!(scale, angle, "dropping non-finite corner update");
            return false;
        }

        self.set_corners_from_points(&points, projection);
        true
    }

    /// Move a single corner to a projected point.
    pub fn move_corner<P: Projection>(&mut self, corner: Corner, point: Point, projection: &P) {
        self.corners[corner.index()] = projection.unproject(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::IdentityProjection;
    use std::f64::consts::FRAC_PI_2;

    fn square() -> Overlay {
        Overlay::new(
            ImageRef::new("https://example.org/maps/site.png", 200, 100),
            [
                LatLng::new(10.0, 0.0),
                LatLng::new(10.0, 10.0),
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 10.0),
            ],
            5.0,
        )
    }

    #[test]
    fn test_corner_index_round_trip() {
        for (i, corner) in Corner::ALL.iter().enumerate() {
            assert_eq!(corner.index(), i);
            assert_eq!(Corner::from_index(i), Some(*corner));
        }
        assert_eq!(Corner::from_index(4), None);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(square().image().file_name(), "site.png");
        assert_eq!(ImageRef::new("plain.jpg", 1, 1).file_name(), "plain.jpg");
    }

    #[test]
    fn test_defaults() {
        let o = square();
        assert!(o.is_editable());
        assert!(!o.is_selected());
        assert!(!o.is_locked());
        assert!(!o.is_edited());
        assert!(o.drag_start_corners().is_none());
    }

    #[test]
    fn test_selection_class_follows_flag() {
        let mut o = square();
        assert_eq!(o.selection_class(), None);
        o.set_selected(true);
        assert_eq!(o.selection_class(), Some("collected"));
    }

    #[test]
    fn test_center() {
        let o = square();
        assert_eq!(o.center(&IdentityProjection), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_scale_rotate_without_snapshot_is_noop() {
        let mut o = square();
        let before = o.corners();
        assert!(!o.scale_rotate_from_drag_start(Point::new(5.0, 5.0), 2.0, 0.0, &IdentityProjection));
        assert_eq!(o.corners(), before);
    }

    #[test]
    fn test_scale_from_snapshot() {
        let mut o = square();
        let proj = IdentityProjection;
        o.snapshot_drag_start(&proj);
        assert!(o.scale_rotate_from_drag_start(o.center(&proj), 2.0, 0.0, &proj));

        assert_eq!(o.corner(Corner::TopLeft), LatLng::new(15.0, -5.0));
        assert_eq!(o.corner(Corner::BottomRight), LatLng::new(-5.0, 15.0));
    }

    #[test]
    fn test_rotate_keeps_center() {
        let mut o = square();
        let proj = IdentityProjection;
        let center = o.center(&proj);
        o.snapshot_drag_start(&proj);
        o.scale_rotate_from_drag_start(center, 1.0, FRAC_PI_2, &proj);

        let after = o.center(&proj);
        assert!((after.x - center.x).abs() < 1e-9);
        assert!((after.y - center.y).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_result_is_rejected() {
        let mut o = square();
        let proj = IdentityProjection;
        let before = o.corners();
        o.snapshot_drag_start(&proj);
        assert!(!o.scale_rotate_from_drag_start(Point::new(5.0, 5.0), f64::NAN, 0.0, &proj));
        assert_eq!(o.corners(), before);
    }

    #[test]
    fn test_disable_editing_drops_snapshot() {
        let mut o = square();
        o.snapshot_drag_start(&IdentityProjection);
        o.set_editable(false);
        assert!(o.drag_start_corners().is_none());
    }
}
