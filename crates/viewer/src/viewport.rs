//! Viewport controller: center, zoom and hard max bounds.
//!
//! Clamping happens in projected meters. The visible extent is kept inside
//! the max bounds; when the view is larger than the bounds on an axis, the
//! view centers on the bounds along that axis. Drags may overshoot by
//! `(1 - viscosity)` of the overshoot and are rubber-banded back on release.

use foundation::{
    GeoBounds, LatLon, MercatorPoint, ProjectedBounds, YAxis, meters_per_pixel, project,
    projected_bounds_from_geo, unproject,
};
use streaming::ZoomPolicy;

/// Floating-point slack when deciding whether a pan was clamped.
const CLAMP_EPSILON_DEG: f64 = 1e-9;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Result of a pan: where the caller asked to go and where the view ended up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanOutcome {
    pub requested: LatLon,
    pub applied: LatLon,
    pub clamped: bool,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    center: LatLon,
    zoom: f64,
    size: ViewportSize,
    tile_size: u32,
    min_zoom: f64,
    max_zoom: f64,
    max_bounds: Option<GeoBounds>,
    /// 0.0 = drags move freely past the bounds, 1.0 = bounds are solid.
    viscosity: f64,
    drag_center: Option<LatLon>,
}

impl Viewport {
    pub fn new(size: ViewportSize, tile_size: u32) -> Self {
        Self {
            center: LatLon::new(0.0, 0.0),
            zoom: 0.0,
            size,
            tile_size,
            min_zoom: 0.0,
            max_zoom: 22.0,
            max_bounds: None,
            viscosity: 1.0,
            drag_center: None,
        }
    }

    /// The center currently drawn, including any in-progress drag.
    pub fn center(&self) -> LatLon {
        self.drag_center.unwrap_or(self.center)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn max_bounds(&self) -> Option<&GeoBounds> {
        self.max_bounds.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_center.is_some()
    }

    pub fn set_viscosity(&mut self, viscosity: f64) {
        self.viscosity = viscosity.clamp(0.0, 1.0);
    }

    /// Adopt the display zoom range of a tile set.
    pub fn apply_zoom_policy(&mut self, policy: &ZoomPolicy) {
        self.set_zoom_range(
            policy.display_min_zoom() as f64,
            policy.display_max_zoom() as f64,
        );
    }

    pub fn set_zoom_range(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom.min(max_zoom);
        self.max_zoom = max_zoom.max(min_zoom);
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self.center = self.clamp_center(self.center);
    }

    pub fn set_max_bounds(&mut self, bounds: Option<GeoBounds>) {
        self.max_bounds = bounds;
        self.center = self.clamp_center(self.center);
    }

    pub fn resize(&mut self, size: ViewportSize) {
        self.size = size;
        self.center = self.clamp_center(self.center);
    }

    pub fn pan_to(&mut self, target: LatLon) -> PanOutcome {
        self.drag_center = None;
        self.center = self.clamp_center(target);
        outcome(target, self.center)
    }

    /// Pan by a screen offset in pixels. Positive `dx` moves the view east,
    /// positive `dy` moves it south.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> PanOutcome {
        let target = self.offset(self.center, dx, dy);
        self.pan_to(target)
    }

    pub fn begin_drag(&mut self) {
        if self.drag_center.is_none() {
            self.drag_center = Some(self.center);
        }
    }

    /// Move the in-progress drag. Overshoot past the bounds is damped by the viscosity.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> LatLon {
        let from = self.drag_center.unwrap_or(self.center);
        let wanted = self.offset(from, dx, dy);
        let limited = self.clamp_center(wanted);
        let shown = if self.viscosity >= 1.0 {
            limited
        } else {
            let w = project(wanted);
            let l = project(limited);
            let v = self.viscosity;
            unproject(MercatorPoint::new(
                w.x - (w.x - l.x) * v,
                w.y - (w.y - l.y) * v,
            ))
        };
        self.drag_center = Some(shown);
        shown
    }

    /// Release the drag and settle inside the bounds.
    pub fn end_drag(&mut self) -> PanOutcome {
        let released = self.drag_center.take().unwrap_or(self.center);
        self.center = self.clamp_center(released);
        outcome(released, self.center)
    }

    /// Zoom to `zoom` clamped into the allowed range; returns the zoom applied.
    pub fn zoom_to(&mut self, zoom: f64) -> f64 {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.center = self.clamp_center(self.center);
        self.zoom
    }

    /// Center on `bounds` at the deepest whole zoom that shows all of it.
    pub fn fit_bounds(&mut self, bounds: &GeoBounds) {
        let pb = projected_bounds_from_geo(bounds, YAxis::NorthUp);
        let w = self.size.width.max(1) as f64;
        let h = self.size.height.max(1) as f64;
        let needed = (pb.width() / w).max(pb.height() / h);
        let zoom = if needed > 0.0 {
            (meters_per_pixel(0.0, self.tile_size) / needed).log2().floor()
        } else {
            self.max_zoom
        };
        self.drag_center = None;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.center = self.clamp_center(unproject(pb.center()));
    }

    /// Visible extent in projected meters.
    pub fn visible_projected(&self) -> ProjectedBounds {
        let c = project(self.center());
        let (hw, hh) = self.half_extent_m();
        ProjectedBounds::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh)
    }

    pub fn visible_bounds(&self) -> GeoBounds {
        let v = self.visible_projected();
        let sw = unproject(MercatorPoint::new(v.min_x, v.min_y)).clamp_to_mercator();
        let ne = unproject(MercatorPoint::new(v.max_x, v.max_y)).clamp_to_mercator();
        GeoBounds::new(sw.lat, sw.lon, ne.lat, ne.lon)
    }

    fn half_extent_m(&self) -> (f64, f64) {
        let mpp = meters_per_pixel(self.zoom, self.tile_size);
        (
            self.size.width as f64 / 2.0 * mpp,
            self.size.height as f64 / 2.0 * mpp,
        )
    }

    fn offset(&self, from: LatLon, dx: f64, dy: f64) -> LatLon {
        let mpp = meters_per_pixel(self.zoom, self.tile_size);
        let p = project(from);
        unproject(MercatorPoint::new(p.x + dx * mpp, p.y - dy * mpp))
    }

    fn clamp_center(&self, target: LatLon) -> LatLon {
        let Some(bounds) = self.max_bounds else {
            return target.clamp_to_mercator();
        };
        let pb = projected_bounds_from_geo(&bounds, YAxis::NorthUp);
        let (hw, hh) = self.half_extent_m();
        let p = project(target.clamp_to_mercator());
        let x = clamp_axis(p.x, pb.min_x, pb.max_x, hw);
        let y = clamp_axis(p.y, pb.min_y, pb.max_y, hh);
        // Final geographic clamp absorbs round-off from the projection round trip.
        bounds.clamp(unproject(MercatorPoint::new(x, y)))
    }
}

fn clamp_axis(v: f64, lo: f64, hi: f64, half: f64) -> f64 {
    if hi - lo <= 2.0 * half {
        (lo + hi) / 2.0
    } else {
        v.clamp(lo + half, hi - half)
    }
}

fn outcome(requested: LatLon, applied: LatLon) -> PanOutcome {
    let clamped = (requested.lat - applied.lat).abs() > CLAMP_EPSILON_DEG
        || (requested.lon - applied.lon).abs() > CLAMP_EPSILON_DEG;
    PanOutcome {
        requested,
        applied,
        clamped,
    }
}
