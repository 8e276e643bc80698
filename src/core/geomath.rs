//! Geodesic calculations shared by the search map and the geocoder.
//!
//! Pure functions only; the one piece of state is the explicit
//! [`FuzzyCoordinateCache`] used for coordinate obfuscation.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::core::geo::{normalize_longitude, LatLng, LatLngBounds, EARTH_RADIUS};
use crate::core::listing::Listing;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Bounding box that encompasses the given radius around a center point.
///
/// Equirectangular approximation: `Δlat = r/R`, `Δlng = r/(R·cos(lat))`.
/// Precision loss is sub-marker-size at the radii the search uses (≈160 km).
/// Latitudes near the poles are not clamped.
pub fn bounds_for_radius(center: LatLng, radius_meters: f64) -> LatLngBounds {
    let lat_rad = center.lat * DEG_TO_RAD;

    let lat_offset = radius_meters / EARTH_RADIUS / DEG_TO_RAD;
    let lng_offset = radius_meters / (EARTH_RADIUS * lat_rad.cos()) / DEG_TO_RAD;

    LatLngBounds::from_coords(
        center.lat + lat_offset,
        center.lng + lng_offset,
        center.lat - lat_offset,
        center.lng - lng_offset,
    )
}

/// Great-circle distance between two points in meters (Haversine formula).
pub fn great_circle_distance(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat * DEG_TO_RAD;
    let lat2 = b.lat * DEG_TO_RAD;
    let d_lat = (b.lat - a.lat) * DEG_TO_RAD;
    let d_lng = (b.lng - a.lng) * DEG_TO_RAD;

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS * c
}

/// Samples a circle of the given radius as a closed polygon, one vertex
/// every 8°. Usable by either provider for drawing a radius indicator when
/// the provider lacks a native circle primitive.
pub fn circle_polyline(center: LatLng, radius_meters: f64) -> Vec<LatLng> {
    const STEP_DEG: usize = 8;

    let lat = center.lat * DEG_TO_RAD;
    let lng = center.lng * DEG_TO_RAD;
    let d = radius_meters / EARTH_RADIUS;

    let mut points = Vec::with_capacity(360 / STEP_DEG + 1);
    for i in (0..=360).step_by(STEP_DEG) {
        let bearing = i as f64 * DEG_TO_RAD;

        let p_lat = (lat.sin() * d.cos() + lat.cos() * d.sin() * bearing.cos()).asin();
        let p_lng = lng
            + (bearing.sin() * d.sin() * lat.cos())
                .atan2(d.cos() - lat.sin() * p_lat.sin());

        points.push(LatLng::new(
            p_lat / DEG_TO_RAD,
            normalize_longitude(p_lng / DEG_TO_RAD),
        ));
    }

    points
}

/// Listings within `radius_meters` of `center`.
pub fn filter_listings_by_radius(
    listings: &[Listing],
    center: LatLng,
    radius_meters: f64,
) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| great_circle_distance(center, listing.geolocation) <= radius_meters)
        .cloned()
        .collect()
}

/// URL to view a location on the configured provider's public map site.
pub fn external_map_url(
    geolocation: Option<LatLng>,
    address: Option<&str>,
    provider: crate::core::config::MapProviderKind,
) -> Option<String> {
    use crate::core::config::MapProviderKind;

    match (geolocation, address, provider) {
        (Some(LatLng { lat, lng }), _, MapProviderKind::GoogleMaps) => {
            Some(format!("https://maps.google.com/?q={},{}", lat, lng))
        }
        (Some(LatLng { lat, lng }), _, MapProviderKind::OpenStreetMap) => Some(format!(
            "https://www.openstreetmap.org/?mlat={}&mlon={}&zoom=15",
            lat, lng
        )),
        (None, Some(address), MapProviderKind::GoogleMaps) => Some(format!(
            "https://maps.google.com/?q={}",
            urlencode(address)
        )),
        (None, Some(address), MapProviderKind::OpenStreetMap) => Some(format!(
            "https://www.openstreetmap.org/search?query={}",
            urlencode(address)
        )),
        (None, None, _) => None,
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Deterministic "random" pair in `[0, 1)` derived from a seed string.
/// Splitmix-style mixing; good enough for obfuscation offsets, not crypto.
fn seeded_unit_pair(seed: &str) -> (f64, f64) {
    fn mix(mut z: u64) -> u64 {
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    let mut h: u64 = 0xcbf29ce484222325;
    for b in seed.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }

    let a = mix(h.wrapping_add(0x9e3779b97f4a7c15));
    let b = mix(a.wrapping_add(0x9e3779b97f4a7c15));

    let to_unit = |v: u64| (v >> 11) as f64 / (1u64 << 53) as f64;
    (to_unit(a), to_unit(b))
}

fn obfuscated_coordinates_impl(latlng: LatLng, fuzzy_offset: f64, seed: &str) -> LatLng {
    let (randomize_bearing, randomize_distance) = seeded_unit_pair(seed);

    let lat = latlng.lat * DEG_TO_RAD;
    let lng = latlng.lng * DEG_TO_RAD;

    let distance = randomize_distance * fuzzy_offset;
    let bearing = randomize_bearing * 2.0 * PI;
    let theta = distance / EARTH_RADIUS;

    let new_lat = (lat.sin() * theta.cos() + lat.cos() * theta.sin() * bearing.cos()).asin();
    let new_lng = lng
        + (bearing.sin() * theta.sin() * lat.cos())
            .atan2(theta.cos() - lat.sin() * new_lat.sin());

    // Normalize -PI..PI radians before converting back
    let new_lng = ((new_lng + 3.0 * PI) % (2.0 * PI)) - PI;

    LatLng::new(new_lat / DEG_TO_RAD, new_lng / DEG_TO_RAD)
}

/// Cache for obfuscated coordinates keyed by a caller-supplied string
/// (typically the listing id), so a listing keeps the same fuzzy location
/// for the lifetime of the cache.
///
/// An explicit struct rather than a hidden memo table: lifetime and
/// eviction stay visible to the owner.
#[derive(Debug, Default)]
pub struct FuzzyCoordinateCache {
    entries: HashMap<String, LatLng>,
}

impl FuzzyCoordinateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hides the exact location by moving it randomly up to `fuzzy_offset`
    /// meters. The same cache key always yields the same offset point.
    pub fn obfuscated(&mut self, latlng: LatLng, fuzzy_offset: f64, cache_key: &str) -> LatLng {
        if let Some(cached) = self.entries.get(cache_key) {
            return *cached;
        }
        let result = obfuscated_coordinates_impl(latlng, fuzzy_offset, cache_key);
        self.entries.insert(cache_key.to_string(), result);
        result
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MapProviderKind;
    use crate::core::listing::Listing;

    #[test]
    fn test_bounds_for_radius_span() {
        // 100 miles around lower Manhattan
        let bounds = bounds_for_radius(LatLng::new(40.7128, -74.0060), 160_934.0);
        let lat_span = bounds.ne.lat - bounds.sw.lat;
        assert!((lat_span - 2.897).abs() < 0.01, "lat span {}", lat_span);
        assert!(bounds.ne.lat > bounds.sw.lat);
        assert!(bounds.ne.lng > bounds.sw.lng);
        // Longitude span widens with latitude
        assert!(bounds.ne.lng - bounds.sw.lng > lat_span);
    }

    #[test]
    fn test_great_circle_distance_symmetric_and_zero() {
        let nyc = LatLng::new(40.7128, -74.0060);
        let la = LatLng::new(34.0522, -118.2437);

        assert_eq!(great_circle_distance(nyc, nyc), 0.0);
        assert_eq!(
            great_circle_distance(nyc, la),
            great_circle_distance(la, nyc)
        );
        // Roughly 3 936 km with the mean Earth radius
        let d = great_circle_distance(nyc, la);
        assert!((d - 3_936_000.0).abs() < 10_000.0, "distance {}", d);
    }

    #[test]
    fn test_circle_polyline_closed_and_on_radius() {
        let center = LatLng::new(40.7128, -74.0060);
        let radius = 160_934.0;
        let points = circle_polyline(center, radius);

        assert_eq!(points.len(), 46);
        let (first, last) = (points[0], points[points.len() - 1]);
        assert!((first.lat - last.lat).abs() < 1e-9);
        assert!((first.lng - last.lng).abs() < 1e-9);

        for p in &points {
            let d = great_circle_distance(center, *p);
            assert!((d - radius).abs() / radius < 0.01, "vertex at {}", d);
        }
    }

    #[test]
    fn test_circle_polyline_normalizes_near_antimeridian() {
        let points = circle_polyline(LatLng::new(0.0, 179.9), 100_000.0);
        for p in &points {
            assert!(p.lng > -180.0 && p.lng <= 180.0, "lng {}", p.lng);
        }
    }

    #[test]
    fn test_fuzzy_coordinates_deterministic_per_key() {
        let mut cache = FuzzyCoordinateCache::new();
        let exact = LatLng::new(40.7128, -74.0060);

        let a = cache.obfuscated(exact, 500.0, "listing-1");
        let b = cache.obfuscated(exact, 500.0, "listing-1");
        let other = cache.obfuscated(exact, 500.0, "listing-2");

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert!(great_circle_distance(exact, a) <= 501.0);
        assert!(great_circle_distance(exact, other) <= 501.0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_filter_listings_by_radius() {
        let center = LatLng::new(40.7128, -74.0060);
        let listings = vec![
            Listing::new("near", LatLng::new(40.73, -74.0), 120_00, "USD"),
            Listing::new("far", LatLng::new(34.0522, -118.2437), 80_00, "USD"),
        ];

        let within = filter_listings_by_radius(&listings, center, 160_934.0);
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].id, "near");
    }

    #[test]
    fn test_external_map_url() {
        let geo = Some(LatLng::new(40.7128, -74.006));
        assert_eq!(
            external_map_url(geo, None, MapProviderKind::OpenStreetMap).unwrap(),
            "https://www.openstreetmap.org/?mlat=40.7128&mlon=-74.006&zoom=15"
        );
        assert_eq!(
            external_map_url(None, Some("New York, NY"), MapProviderKind::OpenStreetMap).unwrap(),
            "https://www.openstreetmap.org/search?query=New%20York%2C%20NY"
        );
        assert_eq!(
            external_map_url(geo, None, MapProviderKind::GoogleMaps).unwrap(),
            "https://maps.google.com/?q=40.7128,-74.006"
        );
        assert!(external_map_url(None, None, MapProviderKind::GoogleMaps).is_none());
    }
}
