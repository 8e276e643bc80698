//! Keeps one live map surface alive across page transitions.
//!
//! Instantiating a provider map is the dominant cost (and, for paid
//! providers, the rate-limited operation), so the surface is never torn
//! down on navigation. Instead it moves between the current mount point
//! and a hidden parking location, the way a detached DOM node would be
//! re-parented rather than rebuilt.

use crate::Result;

/// Where the surface currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceLocation {
    /// Hidden off-layout parking spot; no view is showing the map.
    Parked,
    /// Attached at the named mount point.
    Mounted(String),
}

/// What `attach` had to do to honor the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// No surface existed yet; one was created at the mount point.
    Created,
    /// Already mounted at the requested location; nothing moved.
    LeftInPlace,
    /// An existing surface was moved to the requested mount point.
    AdoptedFromParking,
}

/// Single-owner holder for a reusable map surface.
pub struct ReusableMapContainer<S> {
    surface: Option<S>,
    location: SurfaceLocation,
}

impl<S> Default for ReusableMapContainer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ReusableMapContainer<S> {
    pub fn new() -> Self {
        Self {
            surface: None,
            location: SurfaceLocation::Parked,
        }
    }

    pub fn location(&self) -> &SurfaceLocation {
        &self.location
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Makes the surface live at `mount_id`, creating it only if none
    /// exists. An already-correctly-mounted surface is left untouched;
    /// a parked or elsewhere-mounted one is moved, not recreated.
    pub fn attach<F>(&mut self, mount_id: &str, create: F) -> Result<(Attachment, &mut S)>
    where
        F: FnOnce() -> Result<S>,
    {
        let mounted_here = matches!(
            &self.location,
            SurfaceLocation::Mounted(current) if current == mount_id
        );

        let (attachment, surface) = match self.surface.take() {
            Some(existing) if mounted_here => {
                (Attachment::LeftInPlace, self.surface.insert(existing))
            }
            Some(existing) => {
                log::debug!("relocating map surface to mount {:?}", mount_id);
                (Attachment::AdoptedFromParking, self.surface.insert(existing))
            }
            None => {
                log::debug!("creating map surface at mount {:?}", mount_id);
                (Attachment::Created, self.surface.insert(create()?))
            }
        };
        self.location = SurfaceLocation::Mounted(mount_id.to_string());
        Ok((attachment, surface))
    }

    /// No mount point currently wants the map; hide it off-layout while
    /// keeping the instance alive.
    pub fn park(&mut self) {
        self.location = SurfaceLocation::Parked;
    }

    /// Releases ownership of the surface, e.g. when the configured
    /// provider changes and the instance really must be destroyed.
    pub fn take(&mut self) -> Option<S> {
        self.location = SurfaceLocation::Parked;
        self.surface.take()
    }
}
