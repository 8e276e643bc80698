//! Prelude module for common searchmap types and traits
//!
//! Re-exports the most commonly used types, traits, and functions for easy
//! importing with `use searchmap::prelude::*;`

pub use crate::core::{
    config::{
        ApiAccess, ConfigError, GeocodingConfig, MapConfig, MapProviderKind,
        AUTOCOMPLETE_SEARCH_RADIUS_M,
    },
    geo::{
        bounds_equal, normalize_longitude, LatLng, LatLngBounds, ViewportSnapshot,
        BOUNDS_FIXED_PRECISION, EARTH_RADIUS,
    },
    geomath::{
        bounds_for_radius, circle_polyline, external_map_url, filter_listings_by_radius,
        great_circle_distance, FuzzyCoordinateCache,
    },
    listing::Listing,
};

pub use crate::markers::{
    group_by_coordinates, InfoCardSpec, ListingMarkerGroup, MarkerContent, MarkerGroupKind,
    MarkerLifecycleManager, MarkerSpec, OverlaySink,
};

pub use crate::provider::{
    google::GoogleAdapter, osm::OsmAdapter, ContainerSize, FitOptions, InitialView, MapAdapter,
};

pub use crate::sync::{InitOutcome, ViewportEvent, ViewportSyncController};

pub use crate::geocode::{
    format_address, ip_geolocation, parse_address_components, place_bounds, place_origin,
    GeocodeTransport, GeocodingClient, HttpTransport, PlaceAddress, PlaceCandidate, PlaceResult,
    CURRENT_LOCATION_ID,
};

pub use crate::container::{Attachment, ReusableMapContainer, SurfaceLocation};

pub use crate::{MapError, Result};
