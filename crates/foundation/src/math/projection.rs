//! Bounds projector: projected tile-set envelopes to geographic boxes and back.

use crate::bounds::{BoundsError, GeoBounds, ProjectedBounds};

use super::mercator::{MercatorPoint, project, unproject};

/// Direction in which the projected Y axis grows.
///
/// EPSG:3857 is `NorthUp`. `SouthUp` covers boxes expressed with a flipped
/// row axis (TMS-style row order against XYZ display rows).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum YAxis {
    #[default]
    NorthUp,
    SouthUp,
}

impl YAxis {
    /// Projected Y values of the (south, north) edges for a `min_y..max_y` span.
    fn south_north(self, min_y: f64, max_y: f64) -> (f64, f64) {
        match self {
            YAxis::NorthUp => (min_y, max_y),
            YAxis::SouthUp => (-max_y, -min_y),
        }
    }
}

/// Convert a projected box into the geographic box a map widget can clamp to.
///
/// The south-west corner comes from `(min_x, south)` and the north-east
/// corner from `(max_x, north)`, so the result always has `south < north`
/// and `west < east` for a valid input.
pub fn geo_bounds_from_projected(
    bounds: &ProjectedBounds,
    axis: YAxis,
) -> Result<GeoBounds, BoundsError> {
    bounds.validate()?;

    let (south_y, north_y) = axis.south_north(bounds.min_y, bounds.max_y);
    let sw = unproject(MercatorPoint::new(bounds.min_x, south_y));
    let ne = unproject(MercatorPoint::new(bounds.max_x, north_y));

    let geo = GeoBounds::new(sw.lat, sw.lon, ne.lat, ne.lon);
    if !geo.is_valid() {
        // Extreme northings saturate at the poles and collapse the box.
        return Err(BoundsError::Degenerate {
            axis: 'y',
            min: geo.south,
            max: geo.north,
        });
    }
    Ok(geo)
}

/// Inverse of [`geo_bounds_from_projected`] for the same axis.
pub fn projected_bounds_from_geo(bounds: &GeoBounds, axis: YAxis) -> ProjectedBounds {
    let sw = project(bounds.south_west());
    let ne = project(bounds.north_east());
    match axis {
        YAxis::NorthUp => ProjectedBounds::new(sw.x, sw.y, ne.x, ne.y),
        YAxis::SouthUp => ProjectedBounds::new(sw.x, -ne.y, ne.x, -sw.y),
    }
}
