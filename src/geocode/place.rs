//! Wire types for the geocoding service's place results and their
//! conversion into the crate's geodesic model.

use serde::Deserialize;

use crate::core::geo::{LatLng, LatLngBounds};
use crate::core::geomath::bounds_for_radius;
use crate::geocode::address::format_address;

/// Prediction id reserved for the device's own location.
pub const CURRENT_LOCATION_ID: &str = "current-location";

const DEFAULT_BOUNDS_DISTANCE_M: f64 = 500.0;

/// Synthesized bounds radius for a place without an explicit bounding box,
/// by administrative type.
fn bounds_distance_for_type(place_type: &str) -> f64 {
    match place_type {
        "house" | "building" | "residential" => 500.0,
        "city" | "town" | "village" => 2_000.0,
        "state" => 5_000.0,
        "country" => 10_000.0,
        _ => DEFAULT_BOUNDS_DISTANCE_M,
    }
}

/// One place object as the service returns it. Coordinates and bounding
/// box edges arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub place_id: Option<u64>,
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    #[serde(rename = "type", default)]
    pub place_type: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    /// `[south, north, west, east]` as strings.
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
    #[serde(default)]
    pub address: Option<PlaceAddress>,
}

/// Structured address components; every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceAddress {
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// The point coordinate of a place, if its lat/lon strings parse.
pub fn place_origin(result: &PlaceResult) -> Option<LatLng> {
    let lat = result.lat.parse::<f64>().ok()?;
    let lng = result.lon.parse::<f64>().ok()?;
    Some(LatLng::new(lat, lng))
}

/// Bounds for a place: the explicit bounding box when present, otherwise a
/// box synthesized around the origin at a radius chosen by place type.
pub fn place_bounds(result: &PlaceResult) -> Option<LatLngBounds> {
    if let Some(edges) = &result.boundingbox {
        if edges.len() == 4 {
            let south = edges[0].parse::<f64>().ok()?;
            let north = edges[1].parse::<f64>().ok()?;
            let west = edges[2].parse::<f64>().ok()?;
            let east = edges[3].parse::<f64>().ok()?;
            return Some(LatLngBounds::from_coords(north, east, south, west));
        }
    }

    let place_type = result
        .place_type
        .as_deref()
        .or(result.class.as_deref())
        .unwrap_or("default");
    let origin = place_origin(result)?;
    Some(bounds_for_radius(origin, bounds_distance_for_type(place_type)))
}

/// A ranked, geocoded candidate ready for the search layer: formatted
/// address line, point origin and fit-ready bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub id: String,
    pub address: String,
    pub origin: LatLng,
    pub bounds: LatLngBounds,
}

impl PlaceCandidate {
    /// Candidate for the device's own location: no address line, bounds
    /// synthesized at the caller-chosen radius.
    pub fn current_location(origin: LatLng, bounds_distance_m: f64) -> Self {
        Self {
            id: CURRENT_LOCATION_ID.to_string(),
            address: String::new(),
            origin,
            bounds: bounds_for_radius(origin, bounds_distance_m),
        }
    }

    /// Builds a candidate from a raw result; `None` when the coordinates
    /// do not parse.
    pub fn from_result(result: &PlaceResult, home_country: &str) -> Option<Self> {
        let origin = place_origin(result)?;
        let bounds = place_bounds(result)?;
        let id = result
            .place_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| result.display_name.clone());
        Some(Self {
            id,
            address: format_address(
                result.address.as_ref(),
                &result.display_name,
                home_country,
            ),
            origin,
            bounds,
        })
    }
}
