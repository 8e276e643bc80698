//! # Searchmap
//!
//! Map viewport synchronization and geocoding engine for a listing
//! marketplace: keeps a rendered map, a set of listing markers and a
//! free-text address search in agreement with each other, across two
//! interchangeable map-rendering providers, without update feedback
//! loops, while respecting the geocoding service's rate limits.

pub mod container;
pub mod core;
pub mod geocode;
pub mod markers;
pub mod prelude;
pub mod provider;
pub mod sync;

// Re-export public API
pub use crate::core::{
    config::{ApiAccess, ConfigError, GeocodingConfig, MapConfig, MapProviderKind},
    geo::{LatLng, LatLngBounds, ViewportSnapshot},
    listing::Listing,
};

pub use crate::container::{Attachment, ReusableMapContainer, SurfaceLocation};
pub use crate::geocode::{GeocodingClient, PlaceCandidate};
pub use crate::markers::{MarkerLifecycleManager, OverlaySink};
pub use crate::provider::{ContainerSize, InitialView, MapAdapter};
pub use crate::sync::{InitOutcome, ViewportEvent, ViewportSyncController};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Geocoding service returned status {0}")]
    GeocodeStatus(u16),

    #[error("Invalid geocoding endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),

    #[error("Map provider error: {0}")]
    Provider(String),
}

/// Error type alias for convenience
pub type Error = MapError;
