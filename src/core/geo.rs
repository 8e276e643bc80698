use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used by all geodesic math in this crate.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Decimal digits kept when comparing viewports. Coarse enough to absorb
/// sub-pixel floating point drift between idle events, fine enough that any
/// real pan or zoom still registers as a change.
pub const BOUNDS_FIXED_PRECISION: i32 = 8;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng > -180.0 && self.lng <= 180.0
    }

    /// Returns the same point with the longitude folded into `(-180, 180]`.
    pub fn normalized(&self) -> Self {
        Self::new(self.lat, normalize_longitude(self.lng))
    }

    /// Rounds both components to the given number of decimal digits.
    pub fn to_fixed_precision(&self, digits: i32) -> Self {
        Self::new(round_to(self.lat, digits), round_to(self.lng, digits))
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Maps any real longitude into `(-180, 180]` by ±360° folding.
///
/// A single fold handles every value a map provider realistically produces
/// (|lng| < 540°); the loop keeps the function total for pathological input.
pub fn normalize_longitude(lng: f64) -> f64 {
    let mut lng = lng;
    while lng > 180.0 {
        lng -= 360.0;
    }
    while lng <= -180.0 {
        lng += 360.0;
    }
    lng
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// A rectangular region expressed as northeast/southwest corners.
///
/// `sw.lng > ne.lng` is legal and means the box crosses the antimeridian;
/// every function taking bounds must treat that case explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub ne: LatLng,
    pub sw: LatLng,
}

impl LatLngBounds {
    pub fn new(ne: LatLng, sw: LatLng) -> Self {
        Self { ne, sw }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(north: f64, east: f64, south: f64, west: f64) -> Self {
        Self::new(LatLng::new(north, east), LatLng::new(south, west))
    }

    /// Whether the box wraps across the ±180° line.
    pub fn crosses_antimeridian(&self) -> bool {
        self.sw.lng > self.ne.lng
    }

    /// Gets the center point of the bounds. For a wrapping box the center
    /// longitude is computed on the unwrapped span and folded back.
    pub fn center(&self) -> LatLng {
        let lat = (self.ne.lat + self.sw.lat) / 2.0;
        let lng = if self.crosses_antimeridian() {
            normalize_longitude((self.sw.lng - 360.0 + self.ne.lng) / 2.0)
        } else {
            (self.sw.lng + self.ne.lng) / 2.0
        };
        LatLng::new(lat, lng)
    }

    /// Checks if the bounds contain a point, antimeridian-aware.
    pub fn contains(&self, point: &LatLng) -> bool {
        let lat_ok = point.lat >= self.sw.lat && point.lat <= self.ne.lat;
        let lng_ok = if self.crosses_antimeridian() {
            point.lng >= self.sw.lng || point.lng <= self.ne.lng
        } else {
            point.lng >= self.sw.lng && point.lng <= self.ne.lng
        };
        lat_ok && lng_ok
    }

    /// Cuts precision from all four coordinates. Idempotent: truncating an
    /// already-truncated box is a no-op.
    pub fn to_fixed_precision(&self, digits: i32) -> Self {
        Self::new(
            self.ne.to_fixed_precision(digits),
            self.sw.to_fixed_precision(digits),
        )
    }
}

/// Exact field equality after truncation; the sole gate used for
/// feedback-loop suppression in the viewport sync controller.
pub fn bounds_equal(a: &LatLngBounds, b: &LatLngBounds, digits: i32) -> bool {
    a.to_fixed_precision(digits) == b.to_fixed_precision(digits)
}

/// Truncated bounds plus center captured from a live map on idle.
///
/// Used only for equality comparison across renders, never for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSnapshot {
    pub bounds: LatLngBounds,
    pub center: LatLng,
}

impl ViewportSnapshot {
    pub fn new(bounds: LatLngBounds, center: LatLng, digits: i32) -> Self {
        Self {
            bounds: bounds.to_fixed_precision(digits),
            center,
        }
    }

    pub fn same_bounds(&self, other: &ViewportSnapshot) -> bool {
        self.bounds == other.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(40.7128, -74.0060);
        assert_eq!(coord.lat, 40.7128);
        assert_eq!(coord.lng, -74.0060);
        assert!(coord.is_valid());
    }

    #[test]
    fn test_normalize_longitude_range() {
        for lng in [-539.9, -360.0, -180.0, -179.9, 0.0, 180.0, 180.1, 359.0, 539.9] {
            let n = normalize_longitude(lng);
            assert!(n > -180.0 && n <= 180.0, "{} folded to {}", lng, n);
        }
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let bounds = LatLngBounds::from_coords(
            40.912_345_678_9,
            -73.700_987_654_3,
            40.477_111_222_3,
            -74.259_888_777_6,
        );
        for digits in [0, 2, 5, 8] {
            let once = bounds.to_fixed_precision(digits);
            let twice = once.to_fixed_precision(digits);
            assert_eq!(once, twice, "digits = {}", digits);
        }
    }

    #[test]
    fn test_bounds_equal_absorbs_jitter() {
        let a = LatLngBounds::from_coords(40.9176, -73.7004, 40.4774, -74.2591);
        let jitter = 1e-10;
        let b = LatLngBounds::from_coords(
            40.9176 + jitter,
            -73.7004 - jitter,
            40.4774 + jitter,
            -74.2591 - jitter,
        );
        assert!(bounds_equal(&a, &b, BOUNDS_FIXED_PRECISION));

        let moved = LatLngBounds::from_coords(41.0, -73.7004, 40.5, -74.2591);
        assert!(!bounds_equal(&a, &moved, BOUNDS_FIXED_PRECISION));
    }

    #[test]
    fn test_wrapping_bounds_contains() {
        // Box around the antimeridian: Fiji-ish region
        let bounds = LatLngBounds::from_coords(-12.0, -175.0, -22.0, 175.0);
        assert!(bounds.crosses_antimeridian());
        assert!(bounds.contains(&LatLng::new(-17.0, 179.0)));
        assert!(bounds.contains(&LatLng::new(-17.0, -178.0)));
        assert!(!bounds.contains(&LatLng::new(-17.0, 0.0)));
    }

    #[test]
    fn test_wrapping_bounds_center() {
        let bounds = LatLngBounds::from_coords(-12.0, -175.0, -22.0, 175.0);
        let center = bounds.center();
        assert!((center.lat - -17.0).abs() < 1e-9);
        assert!((center.lng - 180.0).abs() < 1e-9);
    }
}
