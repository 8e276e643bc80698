//! Free-text address search against a Nominatim-style geocoding service.
//!
//! The client wraps the service's usage policy: a minimum interval between
//! outgoing requests, a bounded process-wide result cache, and a contract
//! that search never fails to the caller.

pub mod address;
pub mod client;
pub mod geoip;
pub mod place;

pub use address::{format_address, parse_address_components, AddressComponents};
pub use client::{GeocodeTransport, GeocodingClient, HttpTransport};
pub use geoip::{ip_geolocation, IpGeolocation};
pub use place::{
    place_bounds, place_origin, PlaceAddress, PlaceCandidate, PlaceResult, CURRENT_LOCATION_ID,
};
