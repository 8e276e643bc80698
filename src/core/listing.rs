use serde::{Deserialize, Serialize};

use crate::core::geo::LatLng;

/// The slice of a marketplace listing the map subsystem needs: an id, a
/// geolocation and a price. The listing CRUD layer owns everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub geolocation: LatLng,
    /// Minor units (cents); formatting currency is the host's concern.
    pub price_amount: i64,
    pub price_currency: String,
}

impl Listing {
    pub fn new(
        id: impl Into<String>,
        geolocation: LatLng,
        price_amount: i64,
        price_currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            geolocation,
            price_amount,
            price_currency: price_currency.into(),
        }
    }
}
