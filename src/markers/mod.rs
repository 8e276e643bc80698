//! Marker lifecycle: grouping listings by coordinate and diffing the
//! resulting labels against the previous frame's overlays.
//!
//! Overlay objects are expensive to create (they need provider projection
//! callbacks), so reuse is identity-based: a marker id present in both
//! frames keeps its overlay handle and only gets a content update.

use std::collections::HashMap;

use crate::core::geo::LatLng;
use crate::core::listing::Listing;

/// Discriminant for a coordinate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerGroupKind {
    /// Single listing at the coordinate; rendered as a price label.
    Price,
    /// Two or more listings sharing the exact coordinate; rendered as a
    /// count label.
    Group,
}

/// Listings sharing one exact coordinate, rebuilt fresh every render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingMarkerGroup {
    pub location: LatLng,
    pub listing_ids: Vec<String>,
    pub kind: MarkerGroupKind,
}

impl ListingMarkerGroup {
    /// Stable identity across frames: the group's composition may change
    /// while it conceptually stays "the same" cluster, so the id is derived
    /// from the first listing, never from position in the array.
    pub fn marker_id(&self) -> String {
        match self.kind {
            MarkerGroupKind::Price => format!("price_{}", self.listing_ids[0]),
            MarkerGroupKind::Group => format!("group_{}", self.listing_ids[0]),
        }
    }
}

/// Groups listings by exact coordinate equality, preserving first-seen
/// order of locations and listing order within each location.
pub fn group_by_coordinates(listings: &[Listing]) -> Vec<ListingMarkerGroup> {
    let mut order: Vec<(u64, u64)> = Vec::new();
    let mut groups: HashMap<(u64, u64), ListingMarkerGroup> = HashMap::new();

    for listing in listings {
        let key = (
            listing.geolocation.lat.to_bits(),
            listing.geolocation.lng.to_bits(),
        );
        match groups.get_mut(&key) {
            Some(group) => {
                group.listing_ids.push(listing.id.clone());
                group.kind = MarkerGroupKind::Group;
            }
            None => {
                order.push(key);
                groups.insert(
                    key,
                    ListingMarkerGroup {
                        location: listing.geolocation,
                        listing_ids: vec![listing.id.clone()],
                        kind: MarkerGroupKind::Price,
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect()
}

/// Content handed to the provider when creating or updating a label.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerContent {
    Price { amount: i64, currency: String },
    Group { count: usize },
}

/// One label to render this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub marker_id: String,
    pub location: LatLng,
    pub content: MarkerContent,
    pub is_active: bool,
}

/// The single open info card, rendered above all labels.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoCardSpec {
    pub marker_id: String,
    pub location: LatLng,
    pub listing_ids: Vec<String>,
}

/// Provider-side overlay operations. Each map adapter's live instance
/// implements this; the lifecycle manager never sees native types.
pub trait OverlaySink {
    type Handle;

    fn create_label(&mut self, spec: &MarkerSpec) -> Self::Handle;
    fn update_label(&mut self, handle: &mut Self::Handle, spec: &MarkerSpec);
    fn destroy_label(&mut self, handle: Self::Handle);

    fn create_info_card(&mut self, spec: &InfoCardSpec) -> Self::Handle;
    fn destroy_info_card(&mut self, handle: Self::Handle);
}

struct RenderedMarker<H> {
    marker_id: String,
    handle: H,
}

/// Diffs each frame's labels against the previous frame and drives the
/// minimal set of create/update/destroy calls on the sink.
pub struct MarkerLifecycleManager<H> {
    rendered: Vec<RenderedMarker<H>>,
    info_card: Option<(String, H)>,
}

impl<H> Default for MarkerLifecycleManager<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> MarkerLifecycleManager<H> {
    pub fn new() -> Self {
        Self {
            rendered: Vec::new(),
            info_card: None,
        }
    }

    /// Ids of the labels currently backed by an overlay, in render order.
    pub fn rendered_marker_ids(&self) -> Vec<&str> {
        self.rendered.iter().map(|m| m.marker_id.as_str()).collect()
    }

    pub fn open_info_card_id(&self) -> Option<&str> {
        self.info_card.as_ref().map(|(id, _)| id.as_str())
    }

    /// One render pass: group, build label specs, diff, and reconcile the
    /// info card slot.
    pub fn sync<S: OverlaySink<Handle = H>>(
        &mut self,
        sink: &mut S,
        listings: &[Listing],
        active_listing_id: Option<&str>,
        info_card_open: Option<&[Listing]>,
    ) {
        let labels = build_labels(listings, active_listing_id, info_card_open);

        // Markers whose id vanished this frame lose their overlay.
        let keep: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.marker_id.as_str(), i))
            .collect();
        let mut reusable: HashMap<String, H> = HashMap::new();
        for rendered in self.rendered.drain(..) {
            if keep.contains_key(rendered.marker_id.as_str()) {
                reusable.insert(rendered.marker_id, rendered.handle);
            } else {
                sink.destroy_label(rendered.handle);
            }
        }

        // Reuse on id match, create otherwise.
        self.rendered = labels
            .into_iter()
            .map(|spec| {
                let handle = match reusable.remove(&spec.marker_id) {
                    Some(mut handle) => {
                        sink.update_label(&mut handle, &spec);
                        handle
                    }
                    None => sink.create_label(&spec),
                };
                RenderedMarker {
                    marker_id: spec.marker_id,
                    handle,
                }
            })
            .collect();

        self.sync_info_card(sink, info_card_open);
    }

    fn sync_info_card<S: OverlaySink<Handle = H>>(
        &mut self,
        sink: &mut S,
        info_card_open: Option<&[Listing]>,
    ) {
        let wanted = info_card_open.and_then(|listings| listings.first()).map(|first| {
            InfoCardSpec {
                marker_id: format!("infoCard_{}", first.id),
                location: first.geolocation,
                listing_ids: info_card_open
                    .map(|l| l.iter().map(|x| x.id.clone()).collect())
                    .unwrap_or_default(),
            }
        });

        match (&self.info_card, &wanted) {
            (Some((current_id, _)), Some(spec)) if *current_id == spec.marker_id => {}
            _ => {
                if let Some((_, handle)) = self.info_card.take() {
                    sink.destroy_info_card(handle);
                }
                if let Some(spec) = wanted {
                    let handle = sink.create_info_card(&spec);
                    self.info_card = Some((spec.marker_id, handle));
                }
            }
        }
    }

    /// Destroys everything; used when the map instance goes away.
    pub fn clear<S: OverlaySink<Handle = H>>(&mut self, sink: &mut S) {
        for rendered in self.rendered.drain(..) {
            sink.destroy_label(rendered.handle);
        }
        if let Some((_, handle)) = self.info_card.take() {
            sink.destroy_info_card(handle);
        }
    }
}

/// Builds this frame's label specs from the listing array.
///
/// Groups are reversed before rendering so later-returned listings draw
/// first and earlier ones stack visually on top, independent of result-set
/// ordering. A label whose listings include one shown in the open info card
/// is suppressed so it cannot overlap the card.
pub fn build_labels(
    listings: &[Listing],
    active_listing_id: Option<&str>,
    info_card_open: Option<&[Listing]>,
) -> Vec<MarkerSpec> {
    let open_ids: Vec<&str> = info_card_open
        .map(|l| l.iter().map(|x| x.id.as_str()).collect())
        .unwrap_or_default();

    let by_id: HashMap<&str, &Listing> = listings.iter().map(|l| (l.id.as_str(), l)).collect();

    let mut groups = group_by_coordinates(listings);
    groups.reverse();

    groups
        .into_iter()
        .filter_map(|group| {
            if group
                .listing_ids
                .iter()
                .any(|id| open_ids.contains(&id.as_str()))
            {
                return None;
            }

            let is_active = active_listing_id
                .map(|active| group.listing_ids.iter().any(|id| id == active))
                .unwrap_or(false);

            let content = match group.kind {
                MarkerGroupKind::Price => {
                    let listing = by_id.get(group.listing_ids[0].as_str())?;
                    MarkerContent::Price {
                        amount: listing.price_amount,
                        currency: listing.price_currency.clone(),
                    }
                }
                MarkerGroupKind::Group => MarkerContent::Group {
                    count: group.listing_ids.len(),
                },
            };

            Some(MarkerSpec {
                marker_id: group.marker_id(),
                location: group.location,
                content,
                is_active,
            })
        })
        .collect()
}
