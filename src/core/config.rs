//! Configuration for the search map and geocoding subsystem.
//!
//! Resolved once at startup; invalid combinations fail fast there rather
//! than surfacing as runtime errors mid-session.

use std::time::Duration;

use crate::core::geo::{LatLng, LatLngBounds, BOUNDS_FIXED_PRECISION};

/// 100 miles in meters; the catchment area shown for address searches.
pub const AUTOCOMPLETE_SEARCH_RADIUS_M: f64 = 160_934.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapProviderKind {
    OpenStreetMap,
    GoogleMaps,
}

impl Default for MapProviderKind {
    fn default() -> Self {
        Self::OpenStreetMap
    }
}

/// What a provider needs before its runtime can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAccess {
    /// No key required; tile and search requests carry a custom User-Agent.
    UserAgentOnly,
    ApiKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("map provider {0:?} requires an API key")]
    MissingApiKey(MapProviderKind),

    #[error("location is required but neither center nor bounds was configured")]
    MissingRequiredLocation,

    #[error("geocoding minimum request interval must be non-zero")]
    ZeroRequestInterval,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingConfig {
    /// Base URL of the address search service.
    pub endpoint: String,
    /// Sent as the User-Agent header; the service's policy requires one.
    pub application_name: String,
    /// Minimum wall-clock spacing between outgoing requests.
    pub min_interval: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub request_timeout: Duration,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            application_name: "OpenStreetMapIntegration".to_string(),
            min_interval: Duration::from_millis(1000),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 100,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub provider: MapProviderKind,
    pub google_maps_api_key: Option<String>,
    /// Country whose name is omitted from formatted delivery addresses.
    pub home_country: String,
    /// Decimal digits kept when comparing viewport bounds.
    pub bounds_precision: i32,
    /// Radius applied when fitting a single-point address match.
    pub autocomplete_radius_m: f64,
    /// How far listing coordinates are randomly offset before display.
    pub fuzzy_offset_m: f64,
    /// When true, a missing center and bounds is a startup error.
    pub require_location: bool,
    pub geocoding: GeocodingConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            provider: MapProviderKind::default(),
            google_maps_api_key: None,
            home_country: "United States".to_string(),
            bounds_precision: BOUNDS_FIXED_PRECISION,
            autocomplete_radius_m: AUTOCOMPLETE_SEARCH_RADIUS_M,
            fuzzy_offset_m: 500.0,
            require_location: false,
            geocoding: GeocodingConfig::default(),
        }
    }
}

impl MapConfig {
    /// Resolves what the selected provider needs to come up.
    pub fn api_access(&self) -> Result<ApiAccess, ConfigError> {
        match self.provider {
            MapProviderKind::OpenStreetMap => Ok(ApiAccess::UserAgentOnly),
            MapProviderKind::GoogleMaps => self
                .google_maps_api_key
                .clone()
                .map(ApiAccess::ApiKey)
                .ok_or(ConfigError::MissingApiKey(MapProviderKind::GoogleMaps)),
        }
    }

    /// Fail-fast validation, intended to run at startup with the initial
    /// view the host supplies.
    pub fn validate(
        &self,
        initial_center: Option<&LatLng>,
        initial_bounds: Option<&LatLngBounds>,
    ) -> Result<(), ConfigError> {
        self.api_access()?;

        if self.geocoding.min_interval.is_zero() {
            return Err(ConfigError::ZeroRequestInterval);
        }

        if self.require_location && initial_center.is_none() && initial_bounds.is_none() {
            return Err(ConfigError::MissingRequiredLocation);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_access_per_provider() {
        let osm = MapConfig::default();
        assert_eq!(osm.api_access().unwrap(), ApiAccess::UserAgentOnly);

        let google_missing_key = MapConfig {
            provider: MapProviderKind::GoogleMaps,
            ..MapConfig::default()
        };
        assert!(matches!(
            google_missing_key.api_access(),
            Err(ConfigError::MissingApiKey(MapProviderKind::GoogleMaps))
        ));

        let google = MapConfig {
            provider: MapProviderKind::GoogleMaps,
            google_maps_api_key: Some("test-key".to_string()),
            ..MapConfig::default()
        };
        assert_eq!(
            google.api_access().unwrap(),
            ApiAccess::ApiKey("test-key".to_string())
        );
    }

    #[test]
    fn test_required_location_fails_fast() {
        let config = MapConfig {
            require_location: true,
            ..MapConfig::default()
        };

        assert!(matches!(
            config.validate(None, None),
            Err(ConfigError::MissingRequiredLocation)
        ));

        let center = LatLng::new(40.7128, -74.0060);
        assert!(config.validate(Some(&center), None).is_ok());
    }

    #[test]
    fn test_default_tuning_values() {
        let config = MapConfig::default();
        assert_eq!(config.bounds_precision, 8);
        assert_eq!(config.autocomplete_radius_m, 160_934.0);
        assert_eq!(config.geocoding.min_interval, Duration::from_millis(1000));
        assert_eq!(config.geocoding.cache_capacity, 100);
        assert_eq!(config.geocoding.cache_ttl, Duration::from_secs(300));
    }
}
