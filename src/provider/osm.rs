//! OpenStreetMap (Leaflet-style) adapter.
//!
//! Leaflet's native types differ from the crate's model in two ways that
//! matter here: bounds are corner arrays `[[south, west], [north, east]]`,
//! and after panning across the antimeridian the reported longitudes can
//! leave the ±180 range. Conversion in this module is the only place those
//! quirks are allowed to exist.

use std::collections::HashMap;

use crate::core::config::MapProviderKind;
use crate::core::geo::{LatLng, LatLngBounds};
use crate::markers::{InfoCardSpec, MarkerSpec, OverlaySink};
use crate::provider::{ContainerSize, FitOptions, InitialView, MapAdapter};
use crate::Result;

const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.7128,
    lng: -74.006,
};
const DEFAULT_ZOOM: f64 = 11.0;
const BOUNDS_DERIVED_ZOOM: f64 = 15.0;

/// Leaflet-shaped coordinate; `lng` is raw and may exceed ±180.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsmLatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Leaflet-shaped bounds: `[[south, west], [north, east]]`.
pub type OsmCornerBounds = [[f64; 2]; 2];

/// Convert a Leaflet coordinate to the crate's model. For boxes overlapping
/// the antimeridian Leaflet hands out longitudes outside ±180; a single
/// ±360 step brings them back.
pub fn osm_lat_lng_to_sdk(latlng: OsmLatLng) -> LatLng {
    let lng = if latlng.lng > 180.0 {
        latlng.lng - 360.0
    } else if latlng.lng < -180.0 {
        latlng.lng + 360.0
    } else {
        latlng.lng
    };
    LatLng::new(latlng.lat, lng)
}

/// Convert Leaflet corner bounds to the crate's model.
pub fn osm_bounds_to_sdk(bounds: &OsmCornerBounds) -> LatLngBounds {
    let [[south, west], [north, east]] = *bounds;
    LatLngBounds::new(
        osm_lat_lng_to_sdk(OsmLatLng {
            lat: north,
            lng: east,
        }),
        osm_lat_lng_to_sdk(OsmLatLng {
            lat: south,
            lng: west,
        }),
    )
}

/// Convert crate bounds to Leaflet corner bounds. A wrapping box
/// (`sw.lng > ne.lng`) is unwrapped by shifting the west edge below -180,
/// which is the representation Leaflet expects for an antimeridian fit.
pub fn sdk_bounds_to_osm(bounds: &LatLngBounds) -> OsmCornerBounds {
    let sw_lng = if bounds.crosses_antimeridian() {
        bounds.sw.lng - 360.0
    } else {
        bounds.sw.lng
    };
    [[bounds.sw.lat, sw_lng], [bounds.ne.lat, bounds.ne.lng]]
}

#[derive(Debug, Clone, PartialEq)]
struct OsmDivOverlay {
    spec: MarkerSpec,
}

#[derive(Debug, Clone, PartialEq)]
struct OsmInfoCardOverlay {
    spec: InfoCardSpec,
}

/// Simulated live Leaflet map surface: viewport state, overlay layers and
/// the idle signal a real map would emit after settling.
#[derive(Debug)]
pub struct OsmMap {
    bounds: OsmCornerBounds,
    zoom: f64,
    size: ContainerSize,
    idle_pending: bool,
    fit_bounds_calls: usize,
    next_handle: u64,
    labels: HashMap<u64, OsmDivOverlay>,
    info_card: Option<(u64, OsmInfoCardOverlay)>,
    origin_marker: Option<OsmLatLng>,
    // Leaflet has a native circle primitive; center plus radius is enough.
    radius_circle: Option<(OsmLatLng, f64)>,
}

impl OsmMap {
    fn new(size: ContainerSize, center: LatLng, zoom: f64) -> Self {
        let mut map = Self {
            bounds: [[0.0, 0.0], [0.0, 0.0]],
            zoom,
            size,
            idle_pending: false,
            fit_bounds_calls: 0,
            next_handle: 0,
            labels: HashMap::new(),
            info_card: None,
            origin_marker: None,
            radius_circle: None,
        };
        map.set_view(center, zoom);
        map
    }

    /// Derives corner bounds from a center and zoom the way a 256px-tile
    /// slippy map sizes its viewport.
    fn set_view(&mut self, center: LatLng, zoom: f64) {
        let lng_span = 360.0 * self.size.width_px as f64 / 256.0 / 2f64.powf(zoom);
        let lat_span = lng_span * self.size.height_px as f64 / self.size.width_px.max(1) as f64;

        self.zoom = zoom;
        self.bounds = [
            [center.lat - lat_span / 2.0, center.lng - lng_span / 2.0],
            [center.lat + lat_span / 2.0, center.lng + lng_span / 2.0],
        ];
        self.idle_pending = true;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn fit_bounds_call_count(&self) -> usize {
        self.fit_bounds_calls
    }

    pub fn origin_marker(&self) -> Option<OsmLatLng> {
        self.origin_marker
    }

    pub fn radius_circle(&self) -> Option<(OsmLatLng, f64)> {
        self.radius_circle
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// The current spec of a rendered label, looked up by marker id.
    pub fn label_spec(&self, marker_id: &str) -> Option<&MarkerSpec> {
        self.labels
            .values()
            .map(|overlay| &overlay.spec)
            .find(|spec| spec.marker_id == marker_id)
    }

    pub fn info_card_location(&self) -> Option<LatLng> {
        self.info_card
            .as_ref()
            .map(|(_, overlay)| overlay.spec.location)
    }

    /// Drag gesture: raw longitude shift, deliberately unnormalized — this
    /// is where Leaflet's out-of-range longitudes come from.
    pub fn simulate_pan(&mut self, d_lat: f64, d_lng: f64) {
        for corner in &mut self.bounds {
            corner[0] += d_lat;
            corner[1] += d_lng;
        }
        self.idle_pending = true;
    }

    /// The map settled; returns whether a moveend/idle signal was due.
    pub fn take_idle(&mut self) -> bool {
        std::mem::take(&mut self.idle_pending)
    }
}

impl OverlaySink for OsmMap {
    type Handle = u64;

    fn create_label(&mut self, spec: &MarkerSpec) -> u64 {
        self.next_handle += 1;
        self.labels
            .insert(self.next_handle, OsmDivOverlay { spec: spec.clone() });
        self.next_handle
    }

    fn update_label(&mut self, handle: &mut u64, spec: &MarkerSpec) {
        if let Some(overlay) = self.labels.get_mut(handle) {
            overlay.spec = spec.clone();
        }
    }

    fn destroy_label(&mut self, handle: u64) {
        self.labels.remove(&handle);
    }

    fn create_info_card(&mut self, spec: &InfoCardSpec) -> u64 {
        self.next_handle += 1;
        self.info_card = Some((self.next_handle, OsmInfoCardOverlay { spec: spec.clone() }));
        self.next_handle
    }

    fn destroy_info_card(&mut self, handle: u64) {
        if matches!(self.info_card, Some((id, _)) if id == handle) {
            self.info_card = None;
        }
    }
}

/// Adapter for the Leaflet runtime.
#[derive(Debug, Clone)]
pub struct OsmAdapter {
    lib_loaded: bool,
}

impl Default for OsmAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OsmAdapter {
    pub fn new() -> Self {
        Self { lib_loaded: true }
    }

    /// Simulates the runtime script not having loaded (window.L absent).
    pub fn with_lib_loaded(lib_loaded: bool) -> Self {
        Self { lib_loaded }
    }
}

impl MapAdapter for OsmAdapter {
    type Instance = OsmMap;

    fn kind(&self) -> MapProviderKind {
        MapProviderKind::OpenStreetMap
    }

    fn is_lib_loaded(&self) -> bool {
        self.lib_loaded
    }

    fn init(&self, size: ContainerSize, view: &InitialView) -> Result<OsmMap> {
        let (center, zoom) = match (&view.center, &view.bounds) {
            (Some(center), _) => (*center, view.zoom.unwrap_or(DEFAULT_ZOOM)),
            (None, Some(bounds)) => (bounds.center(), BOUNDS_DERIVED_ZOOM),
            (None, None) => (DEFAULT_CENTER, DEFAULT_ZOOM),
        };
        log::debug!(
            "initializing leaflet map at {:?} zoom {}",
            center,
            zoom
        );
        Ok(OsmMap::new(size, center, zoom))
    }

    fn fit_bounds(&self, map: &mut OsmMap, bounds: &LatLngBounds, _options: &FitOptions) {
        let corners = sdk_bounds_to_osm(bounds);
        map.fit_bounds_calls += 1;
        map.bounds = corners;
        map.idle_pending = true;
    }

    fn map_bounds(&self, map: &OsmMap) -> LatLngBounds {
        osm_bounds_to_sdk(&map.bounds)
    }

    fn map_center(&self, map: &OsmMap) -> LatLng {
        let [[south, west], [north, east]] = map.bounds;
        osm_lat_lng_to_sdk(OsmLatLng {
            lat: (south + north) / 2.0,
            lng: (west + east) / 2.0,
        })
    }

    fn invalidate_size(&self, map: &mut OsmMap) {
        map.idle_pending = true;
    }

    fn place_origin_marker(&self, map: &mut OsmMap, at: LatLng) {
        map.origin_marker = Some(OsmLatLng {
            lat: at.lat,
            lng: at.lng,
        });
    }

    fn remove_origin_marker(&self, map: &mut OsmMap) {
        map.origin_marker = None;
    }

    fn place_radius_overlay(&self, map: &mut OsmMap, center: LatLng, radius_meters: f64) {
        map.radius_circle = Some((
            OsmLatLng {
                lat: center.lat,
                lng: center.lng,
            },
            radius_meters,
        ));
    }

    fn remove_radius_overlay(&self, map: &mut OsmMap) {
        map.radius_circle = None;
    }
}
