//! Viewport projection between geographic and projected coordinates.
//!
//! Overlay corners are stored as [`LatLng`], but every gesture computation
//! runs on projected [`Point`]s. The host map owns the real projection; the
//! implementations here cover tests and hosts that only need spherical
//! mercator layer points.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Converts between world coordinates and projected (screen/layer) points.
pub trait Projection {
    fn project(&self, latlng: LatLng) -> Point;
    fn unproject(&self, point: Point) -> LatLng;
}

/// Maps `lng` to `x` and `lat` to `y` unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, latlng: LatLng) -> Point {
        Point::new(latlng.lng, latlng.lat)
    }

    fn unproject(&self, point: Point) -> LatLng {
        LatLng::new(point.y, point.x)
    }
}

/// Latitude limit of the square mercator world.
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Tile edge length in pixels at zoom 0.
const TILE_SIZE: f64 = 256.0;

/// Spherical mercator (EPSG:3857) layer points at a given zoom level.
///
/// `x` grows eastward and `y` grows southward, with the world spanning
/// `256 · 2^zoom` pixels in both directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
}

impl WebMercator {
    pub fn new(zoom: f64) -> Self {
        Self { zoom }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Projection for WebMercator {
    fn project(&self, latlng: LatLng) -> Point {
        let size = self.world_size();
        let lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

        let x = (latlng.lng + 180.0) / 360.0 * size;
        let y = (0.5 - (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI)) * size;
        Point::new(x, y)
    }

    fn unproject(&self, point: Point) -> LatLng {
        let size = self.world_size();

        let lng = point.x / size * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * point.y / size);
        let lat = n.sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_projection() {
        let ll = LatLng::new(12.0, -4.0);
        let p = IdentityProjection.project(ll);
        assert_eq!(p, Point::new(-4.0, 12.0));
        assert_eq!(IdentityProjection.unproject(p), ll);
    }

    #[test]
    fn test_mercator_origin_is_world_center() {
        let merc = WebMercator::new(0.0);
        let p = merc.project(LatLng::new(0.0, 0.0));
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_zoom_doubles_scale() {
        let ll = LatLng::new(41.85, -87.65);
        let z1 = WebMercator::new(1.0).project(ll);
        let z2 = WebMercator::new(2.0).project(ll);
        assert!((z2.x - 2.0 * z1.x).abs() < 1e-9);
        assert!((z2.y - 2.0 * z1.y).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_north_is_up() {
        let merc = WebMercator::new(3.0);
        let north = merc.project(LatLng::new(10.0, 0.0));
        let south = merc.project(LatLng::new(-10.0, 0.0));
        assert!(north.y < south.y);
    }

    #[test]
    fn test_mercator_unproject_recovers_latlng() {
        let merc = WebMercator::new(16.0);
        let ll = LatLng::new(41.85, -87.65);
        let back = merc.unproject(merc.project(ll));
        assert!((back.lat - ll.lat).abs() < 1e-9);
        assert!((back.lng - ll.lng).abs() < 1e-9);
    }
}
