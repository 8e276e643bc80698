//! End-to-end exercises of the search-page flow: geocode a query, fit the
//! map, react to idle signals, and keep markers in sync across pans.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use searchmap::geocode::{GeocodeTransport, GeocodingClient, PlaceResult};
use searchmap::markers::MarkerLifecycleManager;
use searchmap::provider::osm::{OsmAdapter, OsmMap};
use searchmap::provider::{ContainerSize, InitialView, MapAdapter};
use searchmap::{
    Attachment, InitOutcome, LatLng, Listing, MapConfig, ReusableMapContainer, Result,
    ViewportSyncController,
};

struct CannedTransport {
    calls: Arc<AtomicUsize>,
    body: serde_json::Value,
}

impl CannedTransport {
    fn nyc() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            body: serde_json::json!([{
                "place_id": 298_085,
                "display_name": "New York, United States",
                "lat": "40.7128",
                "lon": "-74.0060",
                "type": "city",
                "address": {
                    "city": "New York",
                    "state": "New York",
                    "country": "United States"
                }
            }]),
        }
    }
}

#[async_trait]
impl GeocodeTransport for CannedTransport {
    async fn get(
        &self,
        _url: reqwest::Url,
        _user_agent: &str,
        _timeout: Duration,
    ) -> Result<Vec<PlaceResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn listing(id: &str, lat: f64, lng: f64, cents: i64) -> Listing {
    Listing::new(id, LatLng::new(lat, lng), cents, "USD")
}

fn ready_controller() -> ViewportSyncController<OsmAdapter> {
    init_logging();
    let mut controller = ViewportSyncController::new(OsmAdapter::new(), &MapConfig::default());
    let outcome = controller
        .ensure_initialized(ContainerSize::new(1024, 768), &InitialView::default())
        .unwrap();
    assert_eq!(outcome, InitOutcome::Ready);
    controller
}

#[tokio::test(start_paused = true)]
async fn geocoded_search_fits_and_notifies_once() {
    let transport = CannedTransport::nyc();
    let calls = transport.calls.clone();
    let client = GeocodingClient::with_transport(transport, &MapConfig::default());

    let candidates = client.search("new york", None, None).await;
    assert_eq!(candidates.len(), 1);
    let place = &candidates[0];
    assert_eq!(place.address, "New York, New York");

    let mut controller = ready_controller();
    controller.instance_mut().unwrap().take_idle();
    controller.handle_idle();

    // A selected place starts a fresh search: origin marker, cleared
    // viewport memory, fit to the place bounds.
    controller.reset_viewport();
    controller.set_center(Some(place.origin));
    assert!(controller.sync_bounds(&place.bounds, true));
    assert!(controller.instance_mut().unwrap().take_idle());

    let event = controller.handle_idle().expect("settled fit must notify");
    // First settle of the fresh search raises the flag; a host that
    // re-queries only on `bounds_changed` still runs this search.
    assert!(event.bounds_changed);
    assert!(event.viewport_bounds.contains(&place.origin));

    // The search layer echoes the place bounds back as props; the
    // controller must not enter a fit loop.
    assert!(!controller.sync_bounds(&place.bounds, true));
    assert_eq!(controller.instance().unwrap().fit_bounds_call_count(), 1);

    // Same query again comes from cache.
    client.search("new york", None, None).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn markers_follow_viewport_across_pans() {
    let mut controller = ready_controller();
    // First settle seeds the remembered viewport.
    controller.instance_mut().unwrap().take_idle();
    controller.handle_idle();

    let mut markers: MarkerLifecycleManager<u64> = MarkerLifecycleManager::new();

    let in_view = vec![
        listing("a", 40.71, -74.0, 12_000),
        listing("b", 40.71, -74.0, 15_000),
        listing("c", 40.75, -73.98, 9_000),
    ];
    {
        let map = controller.instance_mut().unwrap();
        markers.sync(map, &in_view, None, None);
        assert_eq!(map.label_count(), 2);
    }

    // A pan far enough to change the result set.
    controller.instance_mut().unwrap().simulate_pan(2.0, 2.0);
    let event = controller.handle_idle().expect("pan must notify");
    assert!(event.bounds_changed);

    let new_results = vec![listing("c", 40.75, -73.98, 9_000), listing("d", 42.7, -71.9, 20_000)];
    {
        let map = controller.instance_mut().unwrap();
        markers.sync(map, &new_results, None, None);
        assert_eq!(map.label_count(), 2);
    }
    let ids = markers.rendered_marker_ids();
    assert!(ids.contains(&"price_c"));
    assert!(ids.contains(&"price_d"));
    assert!(!ids.contains(&"group_a"));
}

#[test]
fn map_surface_survives_navigation() {
    let mut container: ReusableMapContainer<OsmMap> = ReusableMapContainer::new();
    let adapter = OsmAdapter::new();

    let view = InitialView {
        center: Some(LatLng::new(40.7128, -74.006)),
        bounds: None,
        zoom: None,
    };
    let (attachment, _) = container
        .attach("search-page", || {
            adapter.init(ContainerSize::new(1024, 768), &view)
        })
        .unwrap();
    assert_eq!(attachment, Attachment::Created);

    let fitted_zoom = container.surface().unwrap().zoom();

    // Navigate away and back; the instance is moved, never rebuilt.
    container.park();
    let (attachment, surface) = container
        .attach("search-page", || {
            panic!("navigation must not recreate the map");
        })
        .unwrap();
    assert_eq!(attachment, Attachment::AdoptedFromParking);
    assert_eq!(surface.zoom(), fitted_zoom);
}

#[test]
fn relocated_instance_keeps_controller_state_fresh() {
    let mut controller = ready_controller();
    controller.instance_mut().unwrap().simulate_pan(1.0, 1.0);
    controller.handle_idle();

    let instance = controller.release().expect("live instance");
    let mut second = ViewportSyncController::new(OsmAdapter::new(), &MapConfig::default());
    second.adopt(instance);

    // The adopting controller has no remembered viewport, so the next
    // bounds it is handed must fit.
    let bounds = searchmap::LatLngBounds::from_coords(41.0, -73.0, 40.0, -75.0);
    assert!(second.sync_bounds(&bounds, false));
}
