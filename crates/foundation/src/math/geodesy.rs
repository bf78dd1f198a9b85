/// WGS84 semi-major axis (meters). Spherical Mercator uses it as the sphere radius.
pub const WGS84_A: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world (degrees).
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Clamp latitude to the range representable in Web Mercator.
    pub fn clamp_to_mercator(self) -> Self {
        Self {
            lat: self.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT),
            lon: self.lon.clamp(-180.0, 180.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLon, MERCATOR_MAX_LAT};

    #[test]
    fn validity_checks_ranges_and_finiteness() {
        assert!(LatLon::new(40.2, -7.5).is_valid());
        assert!(LatLon::new(-90.0, 180.0).is_valid());
        assert!(!LatLon::new(90.5, 0.0).is_valid());
        assert!(!LatLon::new(0.0, -180.1).is_valid());
        assert!(!LatLon::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn clamp_to_mercator_limits_latitude() {
        let p = LatLon::new(89.0, 10.0).clamp_to_mercator();
        assert_eq!(p.lat, MERCATOR_MAX_LAT);
        assert_eq!(p.lon, 10.0);
    }
}
