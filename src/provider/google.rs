//! Google Maps adapter.
//!
//! Google's JS API expresses bounds as a `{north, east, south, west}`
//! literal with longitudes already folded into range, so conversion here
//! is a plain field shuffle. The API has no styled circle primitive that
//! matches the search-radius look, so the radius overlay is drawn as a
//! closed polyline.

use std::collections::HashMap;

use crate::core::config::{ApiAccess, MapProviderKind};
use crate::core::geo::{LatLng, LatLngBounds};
use crate::core::geomath::circle_polyline;
use crate::markers::{InfoCardSpec, MarkerSpec, OverlaySink};
use crate::provider::{ContainerSize, FitOptions, InitialView, MapAdapter};
use crate::Result;

const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.7128,
    lng: -74.006,
};
const DEFAULT_ZOOM: f64 = 11.0;
const BOUNDS_DERIVED_ZOOM: f64 = 15.0;

/// Google's bounds literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoogleBoundsLiteral {
    pub north: f64,
    pub east: f64,
    pub south: f64,
    pub west: f64,
}

pub fn google_bounds_to_sdk(literal: &GoogleBoundsLiteral) -> LatLngBounds {
    LatLngBounds::from_coords(literal.north, literal.east, literal.south, literal.west)
}

pub fn sdk_bounds_to_google(bounds: &LatLngBounds) -> GoogleBoundsLiteral {
    GoogleBoundsLiteral {
        north: bounds.ne.lat,
        east: bounds.ne.lng,
        south: bounds.sw.lat,
        west: bounds.sw.lng,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GoogleOverlayView {
    // Labels sit in the overlayMouseTarget pane so they take clicks; the
    // info card floats above everything in floatPane.
    pane: &'static str,
    spec: GoogleOverlayContent,
}

#[derive(Debug, Clone, PartialEq)]
enum GoogleOverlayContent {
    Label(MarkerSpec),
    InfoCard(InfoCardSpec),
}

/// Simulated live Google map surface.
#[derive(Debug)]
pub struct GoogleMap {
    bounds: GoogleBoundsLiteral,
    zoom: f64,
    size: ContainerSize,
    idle_pending: bool,
    fit_bounds_calls: usize,
    next_handle: u64,
    overlays: HashMap<u64, GoogleOverlayView>,
    info_card_handle: Option<u64>,
    origin_marker: Option<LatLng>,
    radius_polyline: Option<Vec<LatLng>>,
}

impl GoogleMap {
    fn new(size: ContainerSize, center: LatLng, zoom: f64) -> Self {
        let mut map = Self {
            bounds: GoogleBoundsLiteral {
                north: 0.0,
                east: 0.0,
                south: 0.0,
                west: 0.0,
            },
            zoom,
            size,
            idle_pending: false,
            fit_bounds_calls: 0,
            next_handle: 0,
            overlays: HashMap::new(),
            info_card_handle: None,
            origin_marker: None,
            radius_polyline: None,
        };
        map.set_view(center, zoom);
        map
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        let lng_span = 360.0 * self.size.width_px as f64 / 256.0 / 2f64.powf(zoom);
        let lat_span = lng_span * self.size.height_px as f64 / self.size.width_px.max(1) as f64;

        self.zoom = zoom;
        self.bounds = GoogleBoundsLiteral {
            north: center.lat + lat_span / 2.0,
            east: center.lng + lng_span / 2.0,
            south: center.lat - lat_span / 2.0,
            west: center.lng - lng_span / 2.0,
        };
        self.idle_pending = true;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn fit_bounds_call_count(&self) -> usize {
        self.fit_bounds_calls
    }

    pub fn origin_marker(&self) -> Option<LatLng> {
        self.origin_marker
    }

    pub fn radius_polyline(&self) -> Option<&[LatLng]> {
        self.radius_polyline.as_deref()
    }

    pub fn label_count(&self) -> usize {
        self.overlays
            .values()
            .filter(|o| matches!(o.spec, GoogleOverlayContent::Label(_)))
            .count()
    }

    /// Pane the open info card sits in, if one is open.
    pub fn info_card_pane(&self) -> Option<&'static str> {
        let handle = self.info_card_handle?;
        self.overlays.get(&handle).map(|overlay| overlay.pane)
    }

    pub fn simulate_pan(&mut self, d_lat: f64, d_lng: f64) {
        self.bounds.north += d_lat;
        self.bounds.south += d_lat;
        self.bounds.east += d_lng;
        self.bounds.west += d_lng;
        self.idle_pending = true;
    }

    /// The map went idle; returns whether a signal was due.
    pub fn take_idle(&mut self) -> bool {
        std::mem::take(&mut self.idle_pending)
    }
}

impl OverlaySink for GoogleMap {
    type Handle = u64;

    fn create_label(&mut self, spec: &MarkerSpec) -> u64 {
        self.next_handle += 1;
        self.overlays.insert(
            self.next_handle,
            GoogleOverlayView {
                pane: "overlayMouseTarget",
                spec: GoogleOverlayContent::Label(spec.clone()),
            },
        );
        self.next_handle
    }

    fn update_label(&mut self, handle: &mut u64, spec: &MarkerSpec) {
        if let Some(overlay) = self.overlays.get_mut(handle) {
            overlay.spec = GoogleOverlayContent::Label(spec.clone());
        }
    }

    fn destroy_label(&mut self, handle: u64) {
        self.overlays.remove(&handle);
    }

    fn create_info_card(&mut self, spec: &InfoCardSpec) -> u64 {
        self.next_handle += 1;
        self.overlays.insert(
            self.next_handle,
            GoogleOverlayView {
                pane: "floatPane",
                spec: GoogleOverlayContent::InfoCard(spec.clone()),
            },
        );
        self.info_card_handle = Some(self.next_handle);
        self.next_handle
    }

    fn destroy_info_card(&mut self, handle: u64) {
        self.overlays.remove(&handle);
        if self.info_card_handle == Some(handle) {
            self.info_card_handle = None;
        }
    }
}

/// Adapter for the Google Maps runtime. The runtime only loads when an API
/// key was configured.
#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    access: ApiAccess,
}

impl GoogleAdapter {
    pub fn new(access: ApiAccess) -> Self {
        Self { access }
    }
}

impl MapAdapter for GoogleAdapter {
    type Instance = GoogleMap;

    fn kind(&self) -> MapProviderKind {
        MapProviderKind::GoogleMaps
    }

    fn is_lib_loaded(&self) -> bool {
        matches!(self.access, ApiAccess::ApiKey(_))
    }

    fn init(&self, size: ContainerSize, view: &InitialView) -> Result<GoogleMap> {
        let (center, zoom) = match (&view.center, &view.bounds) {
            (Some(center), _) => (*center, view.zoom.unwrap_or(DEFAULT_ZOOM)),
            (None, Some(bounds)) => (bounds.center(), BOUNDS_DERIVED_ZOOM),
            (None, None) => (DEFAULT_CENTER, DEFAULT_ZOOM),
        };
        log::debug!("initializing google map at {:?} zoom {}", center, zoom);
        Ok(GoogleMap::new(size, center, zoom))
    }

    fn fit_bounds(&self, map: &mut GoogleMap, bounds: &LatLngBounds, _options: &FitOptions) {
        map.fit_bounds_calls += 1;
        map.bounds = sdk_bounds_to_google(bounds);
        map.idle_pending = true;
    }

    fn map_bounds(&self, map: &GoogleMap) -> LatLngBounds {
        google_bounds_to_sdk(&map.bounds)
    }

    fn map_center(&self, map: &GoogleMap) -> LatLng {
        google_bounds_to_sdk(&map.bounds).center()
    }

    fn invalidate_size(&self, map: &mut GoogleMap) {
        map.idle_pending = true;
    }

    fn place_origin_marker(&self, map: &mut GoogleMap, at: LatLng) {
        map.origin_marker = Some(at);
    }

    fn remove_origin_marker(&self, map: &mut GoogleMap) {
        map.origin_marker = None;
    }

    fn place_radius_overlay(&self, map: &mut GoogleMap, center: LatLng, radius_meters: f64) {
        map.radius_polyline = Some(circle_polyline(center, radius_meters));
    }

    fn remove_radius_overlay(&self, map: &mut GoogleMap) {
        map.radius_polyline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_literal_round_trip() {
        let literal = GoogleBoundsLiteral {
            north: 41.0,
            east: -73.0,
            south: 40.0,
            west: -75.0,
        };
        let sdk = google_bounds_to_sdk(&literal);
        assert_eq!(sdk.ne, LatLng::new(41.0, -73.0));
        assert_eq!(sdk.sw, LatLng::new(40.0, -75.0));
        assert_eq!(sdk_bounds_to_google(&sdk), literal);
    }

    #[test]
    fn test_wrapping_bounds_round_trip() {
        // Box across the antimeridian, Fiji-ish: Google expresses it as
        // west > east, with both edges still inside ±180.
        let sdk = LatLngBounds::from_coords(-12.0, -175.0, -22.0, 175.0);
        assert!(sdk.crosses_antimeridian());

        let literal = sdk_bounds_to_google(&sdk);
        assert!(literal.west > literal.east);
        assert_eq!(literal.west, 175.0);
        assert_eq!(literal.east, -175.0);

        let back = google_bounds_to_sdk(&literal);
        assert!(back.crosses_antimeridian());
        assert_eq!(back, sdk);
        assert!(back.contains(&LatLng::new(-17.0, 179.0)));
        assert!(back.contains(&LatLng::new(-17.0, -178.0)));
    }

    #[test]
    fn test_fit_wrapping_bounds_reports_them_back() {
        let adapter = GoogleAdapter::new(ApiAccess::ApiKey("test-key".into()));
        let mut map = adapter
            .init(ContainerSize::new(800, 600), &InitialView::default())
            .unwrap();

        let wrapping = LatLngBounds::from_coords(-12.0, -175.0, -22.0, 175.0);
        adapter.fit_bounds(&mut map, &wrapping, &FitOptions::default());

        let reported = adapter.map_bounds(&map);
        assert!(reported.crosses_antimeridian());
        assert_eq!(reported, wrapping);
        let center = adapter.map_center(&map);
        assert!((center.lng.abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_lib_loaded_requires_api_key() {
        let keyed = GoogleAdapter::new(ApiAccess::ApiKey("test-key".into()));
        assert!(keyed.is_lib_loaded());

        let keyless = GoogleAdapter::new(ApiAccess::UserAgentOnly);
        assert!(!keyless.is_lib_loaded());
    }

    #[test]
    fn test_radius_overlay_is_closed_polyline() {
        let adapter = GoogleAdapter::new(ApiAccess::ApiKey("test-key".into()));
        let mut map = adapter
            .init(ContainerSize::new(800, 600), &InitialView::default())
            .unwrap();

        adapter.place_radius_overlay(&mut map, LatLng::new(40.7128, -74.006), 160934.0);
        let points = map.radius_polyline().unwrap();
        assert_eq!(points.len(), 46);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!((first.lat - last.lat).abs() < 1e-9);
        assert!((first.lng - last.lng).abs() < 1e-9);

        adapter.remove_radius_overlay(&mut map);
        assert!(map.radius_polyline().is_none());
    }

    #[test]
    fn test_info_card_floats_above_labels() {
        use crate::markers::MarkerContent;

        let adapter = GoogleAdapter::new(ApiAccess::ApiKey("test-key".into()));
        let mut map = adapter
            .init(ContainerSize::new(800, 600), &InitialView::default())
            .unwrap();

        map.create_label(&MarkerSpec {
            marker_id: "price_1".to_string(),
            location: LatLng::new(40.7, -74.0),
            content: MarkerContent::Price {
                amount: 12_000,
                currency: "USD".to_string(),
            },
            is_active: false,
        });
        let card_handle = map.create_info_card(&InfoCardSpec {
            marker_id: "infoCard_1".to_string(),
            location: LatLng::new(40.7, -74.0),
            listing_ids: vec!["1".to_string()],
        });

        assert_eq!(map.label_count(), 1);
        assert_eq!(map.info_card_pane(), Some("floatPane"));

        map.destroy_info_card(card_handle);
        assert_eq!(map.info_card_pane(), None);
        assert_eq!(map.label_count(), 1);
    }

    #[test]
    fn test_fit_then_idle() {
        let adapter = GoogleAdapter::new(ApiAccess::ApiKey("test-key".into()));
        let mut map = adapter
            .init(ContainerSize::new(800, 600), &InitialView::default())
            .unwrap();
        assert!(map.take_idle());

        let target = LatLngBounds::from_coords(41.0, -73.0, 40.0, -75.0);
        adapter.fit_bounds(&mut map, &target, &FitOptions::default());
        assert_eq!(map.fit_bounds_call_count(), 1);
        assert!(map.take_idle());
        assert_eq!(adapter.map_bounds(&map), target);
    }
}
