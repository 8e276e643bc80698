//! Keeps one live map instance in agreement with application-level bounds
//! and center, and reports genuine user-driven viewport changes upward.
//!
//! The delicate part is feedback-loop suppression: a programmatic fit makes
//! the map move, the move fires an idle signal, the idle signal updates the
//! application's bounds, and those bounds flow right back in. Without a
//! gate, every idle would trigger a re-fit forever. The gate is precision
//! truncation plus memory of the last bounds this controller itself fit to.

use crate::core::config::MapConfig;
use crate::core::geo::{bounds_equal, LatLng, LatLngBounds, ViewportSnapshot};
use crate::core::geomath::bounds_for_radius;
use crate::provider::{ContainerSize, FitOptions, InitialView, MapAdapter};
use crate::Result;

/// Result of an initialization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The container has no measured size yet; retry on the next pass.
    Deferred,
    /// The provider's runtime library is not loaded; render a placeholder.
    Unavailable,
    /// A fresh map instance came up.
    Ready,
    /// An instance already exists; nothing was done.
    AlreadyReady,
}

/// Normalized viewport-change notification for the search layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportEvent {
    /// True when the settled viewport differs from the remembered one,
    /// and also on the first settle of a center-only view: hosts gate
    /// their re-query on this flag, and the first autocomplete search
    /// must run even though by bounds-equality nothing "changed".
    pub bounds_changed: bool,
    pub viewport_bounds: LatLngBounds,
    pub viewport_center: LatLng,
}

/// Owns exactly one live map instance per mounted view.
pub struct ViewportSyncController<A: MapAdapter> {
    adapter: A,
    precision: i32,
    autocomplete_radius_m: f64,
    instance: Option<A::Instance>,
    /// Last viewport the map itself reported, truncated for comparison.
    viewport: Option<ViewportSnapshot>,
    /// Last bounds the application asked to fit, truncated, pre-expansion.
    last_fitted_request: Option<LatLngBounds>,
    origin: Option<LatLng>,
    center_supplied: bool,
}

impl<A: MapAdapter> ViewportSyncController<A> {
    pub fn new(adapter: A, config: &MapConfig) -> Self {
        Self {
            adapter,
            precision: config.bounds_precision,
            autocomplete_radius_m: config.autocomplete_radius_m,
            instance: None,
            viewport: None,
            last_fitted_request: None,
            origin: None,
            center_supplied: false,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn is_ready(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance(&self) -> Option<&A::Instance> {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut A::Instance> {
        self.instance.as_mut()
    }

    /// Brings the map up once the container has real dimensions. Safe to
    /// call on every render pass; a zero-sized container defers without
    /// error and a missing runtime reports unavailable.
    pub fn ensure_initialized(
        &mut self,
        size: ContainerSize,
        view: &InitialView,
    ) -> Result<InitOutcome> {
        if self.instance.is_some() {
            return Ok(InitOutcome::AlreadyReady);
        }
        if !self.adapter.is_lib_loaded() {
            log::warn!("map runtime not loaded, rendering placeholder");
            return Ok(InitOutcome::Unavailable);
        }
        if !size.has_dimensions() {
            log::debug!("container has no dimensions yet, deferring map init");
            return Ok(InitOutcome::Deferred);
        }

        let map = self.adapter.init(size, view)?;
        self.instance = Some(map);
        self.center_supplied = view.center.is_some();
        Ok(InitOutcome::Ready)
    }

    /// Applies application-supplied bounds to the live map. Returns whether
    /// a provider fit call was actually issued.
    ///
    /// `from_autocomplete` marks bounds that originate from a single-point
    /// address match; those are expanded to the configured search radius
    /// around their centroid so an address search always shows a consistent
    /// catchment area instead of a pinpoint-tight view.
    pub fn sync_bounds(&mut self, requested: &LatLngBounds, from_autocomplete: bool) -> bool {
        let Some(map) = self.instance.as_mut() else {
            return false;
        };

        let truncated = requested.to_fixed_precision(self.precision);
        if let Some(last) = &self.last_fitted_request {
            if bounds_equal(last, &truncated, self.precision) {
                return false;
            }
        }
        if let Some(snapshot) = &self.viewport {
            if bounds_equal(&snapshot.bounds, &truncated, self.precision) {
                // The map is already showing these bounds; remember the
                // request so an echo of it cannot re-fit later.
                self.last_fitted_request = Some(truncated);
                return false;
            }
        }

        let target = if from_autocomplete {
            bounds_for_radius(truncated.center(), self.autocomplete_radius_m)
        } else {
            truncated
        };
        log::debug!("fitting map to {:?}", target);
        self.adapter
            .fit_bounds(map, &target, &FitOptions::default());
        self.last_fitted_request = Some(truncated);
        true
    }

    /// Processes a provider idle/moveend signal. Emits an event when the
    /// settled viewport differs from the last remembered one, or on the
    /// very first settle of a center-only view.
    pub fn handle_idle(&mut self) -> Option<ViewportEvent> {
        let map = self.instance.as_ref()?;
        let bounds = self.adapter.map_bounds(map);
        let center = self.adapter.map_center(map);
        let snapshot = ViewportSnapshot::new(bounds, center, self.precision);

        let (emit, bounds_changed) = match &self.viewport {
            Some(prev) => {
                let changed = !prev.same_bounds(&snapshot);
                (changed, changed)
            }
            // First settle of a center-only view: notify with the flag
            // raised so the waiting search actually runs.
            None => (self.center_supplied, true),
        };

        let event = emit.then(|| ViewportEvent {
            bounds_changed,
            viewport_bounds: snapshot.bounds,
            viewport_center: snapshot.center,
        });
        self.viewport = Some(snapshot);
        event
    }

    /// Idle handling with the host's viewport-change callback invoked
    /// inline. The flag mirrors [`ViewportEvent::bounds_changed`].
    pub fn dispatch_idle<F>(&mut self, mut on_viewport_changed: F)
    where
        F: FnMut(bool, &ViewportEvent),
    {
        if let Some(event) = self.handle_idle() {
            on_viewport_changed(event.bounds_changed, &event);
        }
    }

    /// A fresh location search started; the next supplied bounds must fit
    /// regardless of where the user had panned to.
    pub fn reset_viewport(&mut self) {
        self.viewport = None;
        self.last_fitted_request = None;
    }

    /// Keeps one origin marker and one translucent radius overlay on the
    /// geocoded search center. Both are recreated only when the coordinate
    /// actually changes, not on every render.
    pub fn set_center(&mut self, center: Option<LatLng>) {
        let Some(map) = self.instance.as_mut() else {
            return;
        };
        match center {
            Some(at) => {
                self.center_supplied = true;
                if self.origin != Some(at) {
                    self.adapter.place_origin_marker(map, at);
                    self.adapter
                        .place_radius_overlay(map, at, self.autocomplete_radius_m);
                    self.origin = Some(at);
                }
            }
            None => {
                if self.origin.is_some() {
                    self.adapter.remove_origin_marker(map);
                    self.adapter.remove_radius_overlay(map);
                    self.origin = None;
                }
            }
        }
    }

    /// Re-measure after the container was resized or relocated.
    pub fn refresh(&mut self) {
        if let Some(map) = self.instance.as_mut() {
            self.adapter.invalidate_size(map);
        }
    }

    /// Hands the live instance off for relocation instead of destruction.
    pub fn release(&mut self) -> Option<A::Instance> {
        self.viewport = None;
        self.last_fitted_request = None;
        self.origin = None;
        self.center_supplied = false;
        self.instance.take()
    }

    /// Takes ownership of a previously released instance. The adopting
    /// view starts from scratch: the first-search exception re-arms when
    /// the host supplies its center through [`Self::set_center`].
    pub fn adopt(&mut self, instance: A::Instance) {
        self.instance = Some(instance);
        self.viewport = None;
        self.last_fitted_request = None;
        self.center_supplied = false;
    }
}
