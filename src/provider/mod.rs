//! Map-rendering provider adapters.
//!
//! One adapter per provider, all satisfying the same [`MapAdapter`]
//! contract; selection happens through the `MapProviderKind` config value.
//! Only adapter code touches provider-native coordinate and bounds types.

pub mod google;
pub mod osm;

use crate::core::config::MapProviderKind;
use crate::core::geo::{LatLng, LatLngBounds};
use crate::Result;

/// Measured size of the DOM container the map mounts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerSize {
    pub width_px: u32,
    pub height_px: u32,
}

impl ContainerSize {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Initialization must wait until the container has real dimensions.
    pub fn has_dimensions(&self) -> bool {
        self.width_px > 0 && self.height_px > 0
    }
}

/// The view the host asks for when the map first comes up.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InitialView {
    pub center: Option<LatLng>,
    pub bounds: Option<LatLngBounds>,
    pub zoom: Option<f64>,
}

/// Options for a programmatic fit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitOptions {
    pub padding_px: u32,
    pub animate: bool,
}

/// The per-provider contract: own exactly one live map instance type and
/// translate between its native representations and the crate's geodesic
/// model. No inheritance; two independent implementations.
pub trait MapAdapter {
    /// Opaque handle to the live rendering surface. Exclusively owned by
    /// the controller for the lifetime of one mounted view; ownership
    /// transfers (never duplicates) on relocation.
    type Instance;

    fn kind(&self) -> MapProviderKind;

    /// Whether the provider's runtime library is available. When false the
    /// caller renders an inert placeholder instead of a map.
    fn is_lib_loaded(&self) -> bool;

    fn init(&self, size: ContainerSize, view: &InitialView) -> Result<Self::Instance>;

    fn fit_bounds(&self, map: &mut Self::Instance, bounds: &LatLngBounds, options: &FitOptions);

    fn map_bounds(&self, map: &Self::Instance) -> LatLngBounds;

    fn map_center(&self, map: &Self::Instance) -> LatLng;

    /// Re-measure after the container was resized or relocated.
    fn invalidate_size(&self, map: &mut Self::Instance);

    fn place_origin_marker(&self, map: &mut Self::Instance, at: LatLng);

    fn remove_origin_marker(&self, map: &mut Self::Instance);

    fn place_radius_overlay(&self, map: &mut Self::Instance, center: LatLng, radius_meters: f64);

    fn remove_radius_overlay(&self, map: &mut Self::Instance);
}
