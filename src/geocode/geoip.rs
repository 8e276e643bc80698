//! IP-based fallback geolocation, used when device geolocation is
//! unavailable.

use serde::Deserialize;

use crate::core::geo::LatLng;
use crate::Result;

/// Response of the companion `/api/geo/ip` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IpGeolocation {
    pub lat: f64,
    pub lng: f64,
    /// Which upstream database produced the estimate.
    pub source: String,
}

impl IpGeolocation {
    pub fn latlng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Looks up an approximate location for the caller's IP. Resolves to
/// `None` when the endpoint has no estimate (404).
pub async fn ip_geolocation(base_url: &str) -> Result<Option<IpGeolocation>> {
    let url = format!("{}/api/geo/ip", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url).await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        log::debug!("no ip geolocation available");
        return Ok(None);
    }
    let response = response.error_for_status()?;
    Ok(Some(response.json().await?))
}
