//! Spherical Web Mercator (EPSG:3857) forward and inverse projection.
//!
//! These are pure functions over degrees and meters so they can be tested
//! without any map widget in the loop.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use super::geodesy::{LatLon, MERCATOR_MAX_LAT, WGS84_A};

/// Half the side of the square Mercator world, in meters.
pub const MERCATOR_HALF_EXTENT: f64 = PI * WGS84_A;

/// A point in Web Mercator meters. `y` increases northward.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Project geographic degrees to Web Mercator meters.
///
/// Latitude is clamped to [`MERCATOR_MAX_LAT`] first; the poles have no finite image.
pub fn project(p: LatLon) -> MercatorPoint {
    let lat = p.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let x = WGS84_A * p.lon.to_radians();
    let y = WGS84_A * (FRAC_PI_4 + lat / 2.0).tan().ln();
    MercatorPoint::new(x, y)
}

/// Inverse of [`project`].
pub fn unproject(p: MercatorPoint) -> LatLon {
    let lon = (p.x / WGS84_A).to_degrees();
    let lat = (2.0 * (p.y / WGS84_A).exp().atan() - FRAC_PI_2).to_degrees();
    LatLon::new(lat, lon)
}

/// Ground resolution in Mercator meters per pixel at a (possibly fractional) zoom.
pub fn meters_per_pixel(zoom: f64, tile_size: u32) -> f64 {
    (2.0 * MERCATOR_HALF_EXTENT) / (tile_size as f64 * zoom.exp2())
}
