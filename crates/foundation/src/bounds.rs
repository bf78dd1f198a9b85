use crate::math::{LatLon, MercatorPoint};

/// Axis-aligned box in projected (Web Mercator) meters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectedBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Axis-aligned box in geographic degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundsError {
    NonFinite,
    Degenerate { axis: char, min: f64, max: f64 },
}

impl std::fmt::Display for BoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsError::NonFinite => write!(f, "bounds contain non-finite coordinates"),
            BoundsError::Degenerate { axis, min, max } => {
                write!(f, "degenerate bounds on {axis}: min={min} max={max}")
            }
        }
    }
}

impl std::error::Error for BoundsError {}

impl ProjectedBounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Check `min_x < max_x` and `min_y < max_y` with finite corners.
    pub fn validate(&self) -> Result<(), BoundsError> {
        let all = [self.min_x, self.min_y, self.max_x, self.max_y];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(BoundsError::NonFinite);
        }
        if self.min_x >= self.max_x {
            return Err(BoundsError::Degenerate {
                axis: 'x',
                min: self.min_x,
                max: self.max_x,
            });
        }
        if self.min_y >= self.max_y {
            return Err(BoundsError::Degenerate {
                axis: 'y',
                min: self.min_y,
                max: self.max_y,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> MercatorPoint {
        MercatorPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: MercatorPoint) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    /// Overlap of two boxes, or `None` when they only touch or are disjoint.
    pub fn intersection(&self, other: &ProjectedBounds) -> Option<ProjectedBounds> {
        let out = ProjectedBounds::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        (out.min_x < out.max_x && out.min_y < out.max_y).then_some(out)
    }
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    pub fn south_west(&self) -> LatLon {
        LatLon::new(self.south, self.west)
    }

    pub fn north_east(&self) -> LatLon {
        LatLon::new(self.north, self.east)
    }

    /// Non-degenerate: `south < north` and `west < east`.
    pub fn is_valid(&self) -> bool {
        self.south < self.north && self.west < self.east
    }

    pub fn contains(&self, p: LatLon) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lon)
    }

    /// Nearest point inside the box.
    pub fn clamp(&self, p: LatLon) -> LatLon {
        LatLon::new(
            p.lat.clamp(self.south, self.north),
            p.lon.clamp(self.west, self.east),
        )
    }
}
