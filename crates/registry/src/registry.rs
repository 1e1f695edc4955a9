use std::collections::BTreeMap;

use crate::buffer::Buffer;
use crate::error::RegistryError;
use crate::surface::Surface;

/// Owns every live [`Surface`] and arbitrates ownership and composition
/// ordering (spec.md §4.5). Ids are assigned monotonically and never reused
/// within a run, matching the frame-number monotonicity property tested at
/// spec.md §8.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    next_id: u32,
    surfaces: BTreeMap<u32, Surface>,
    composition_locked: bool,
    deferred_destructions: Vec<u32>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self { next_id: 1, ..Default::default() }
    }

    pub fn create_surface(&mut self, owner: u32, width: u32, height: u32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.surfaces.insert(id, Surface::new(id, owner, width, height));
        tracing::trace!(target: "registry", id, owner, width, height, "surface_created");
        id
    }

    /// Read-only iteration over every live surface, independent of the
    /// composition lock — for callers that only need to inspect state (e.g.
    /// checking whether any surface has pending damage) without taking a
    /// composition pass.
    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.values()
    }

    pub fn is_owner(&self, id: u32, client: u32) -> bool {
        self.surfaces.get(&id).is_some_and(|s| s.owner == client)
    }

    fn check_owner(&self, id: u32, requester: u32) -> Result<(), RegistryError> {
        match self.surfaces.get(&id) {
            None => Err(RegistryError::InvalidSurface(id)),
            Some(s) if s.owner != requester => {
                Err(RegistryError::PermissionDenied { surface: id, requester })
            }
            Some(_) => Ok(()),
        }
    }

    /// Removes the surface immediately unless a composition pass holds the
    /// scoped lock, in which case the destruction is deferred to
    /// `end_composition` (spec.md §4.5).
    pub fn destroy_surface(&mut self, id: u32, requester: u32) -> Result<(), RegistryError> {
        self.check_owner(id, requester)?;
        if self.composition_locked {
            self.deferred_destructions.push(id);
        } else {
            self.surfaces.remove(&id);
        }
        Ok(())
    }

    pub fn attach_buffer(&mut self, id: u32, requester: u32, buffer: Buffer) -> Result<(), RegistryError> {
        self.check_owner(id, requester)?;
        self.surfaces.get_mut(&id).unwrap().pending = Some(buffer);
        Ok(())
    }

    /// Swaps `pending` into `current`, dropping the previous `current`
    /// exactly once, and returns the new per-surface frame number.
    pub fn commit(&mut self, id: u32, requester: u32) -> Result<u64, RegistryError> {
        self.check_owner(id, requester)?;
        let surface = self.surfaces.get_mut(&id).unwrap();
        if surface.pending.is_none() {
            return Err(RegistryError::InvalidBuffer(id));
        }
        surface.current = surface.pending.take();
        surface.frame_number += 1;
        Ok(surface.frame_number)
    }

    pub fn set_visible(&mut self, id: u32, requester: u32, visible: bool) -> Result<(), RegistryError> {
        self.check_owner(id, requester)?;
        self.surfaces.get_mut(&id).unwrap().visible = visible;
        Ok(())
    }

    pub fn set_z_order(&mut self, id: u32, requester: u32, z: i32) -> Result<(), RegistryError> {
        self.check_owner(id, requester)?;
        self.surfaces.get_mut(&id).unwrap().z_order = z;
        Ok(())
    }

    pub fn set_position(&mut self, id: u32, requester: u32, x: f32, y: f32) -> Result<(), RegistryError> {
        self.check_owner(id, requester)?;
        let surface = self.surfaces.get_mut(&id).unwrap();
        surface.x = x;
        surface.y = y;
        Ok(())
    }

    /// Removes every surface owned by `client`, returning `(id, pixel_count)`
    /// pairs so the caller can release the matching session usage. Honors the
    /// same composition-lock deferral as [`Self::destroy_surface`].
    pub fn remove_client_surfaces(&mut self, client: u32) -> Vec<(u32, u64)> {
        let owned: Vec<(u32, u64)> = self
            .surfaces
            .values()
            .filter(|s| s.owner == client)
            .map(|s| (s.id, s.pixel_count()))
            .collect();
        for (id, _) in &owned {
            if self.composition_locked {
                self.deferred_destructions.push(*id);
            } else {
                self.surfaces.remove(id);
            }
        }
        owned
    }

    /// Takes the scoped composition lock. Destructive mutations requested
    /// while the returned guard is alive are deferred until it is dropped.
    pub fn begin_composition(&mut self) -> CompositionGuard<'_> {
        self.composition_locked = true;
        CompositionGuard { registry: self }
    }

    fn end_composition(&mut self) {
        self.composition_locked = false;
        for id in self.deferred_destructions.drain(..) {
            self.surfaces.remove(&id);
        }
    }

    fn composition_order(&self) -> Vec<&Surface> {
        let mut order: Vec<&Surface> = self.surfaces.values().collect();
        order.sort_by_key(|s| (s.z_order, s.id));
        order
    }
}

/// RAII scope produced by [`SurfaceRegistry::begin_composition`]. Dropping it
/// (including via an early return or panic unwind mid-pass) always applies
/// deferred destructions.
pub struct CompositionGuard<'a> {
    registry: &'a mut SurfaceRegistry,
}

impl CompositionGuard<'_> {
    /// Ascending z-order; within equal z, creation order (spec.md §4.5).
    pub fn composition_order(&self) -> Vec<&Surface> {
        self.registry.composition_order()
    }

    /// Destroys a surface while the pass is in progress; deferred until this
    /// guard drops, per spec.md §4.5.
    pub fn destroy_surface(&mut self, id: u32, requester: u32) -> Result<(), RegistryError> {
        self.registry.destroy_surface(id, requester)
    }
}

impl Drop for CompositionGuard<'_> {
    fn drop(&mut self) {
        self.registry.end_composition();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut r = SurfaceRegistry::new();
        let a = r.create_surface(1, 10, 10);
        let b = r.create_surface(1, 10, 10);
        assert!(b > a);
    }

    #[test]
    fn ownership_enforced_on_mutation() {
        let mut r = SurfaceRegistry::new();
        let id = r.create_surface(1, 10, 10);
        let err = r.destroy_surface(id, 2).unwrap_err();
        assert_eq!(err, RegistryError::PermissionDenied { surface: id, requester: 2 });
    }

    #[test]
    fn commit_without_pending_is_invalid_buffer() {
        let mut r = SurfaceRegistry::new();
        let id = r.create_surface(1, 10, 10);
        let err = r.commit(id, 1).unwrap_err();
        assert_eq!(err, RegistryError::InvalidBuffer(id));
    }

    #[test]
    fn commit_swaps_pending_into_current_and_increments_frame() {
        let mut r = SurfaceRegistry::new();
        let id = r.create_surface(1, 10, 10);
        r.attach_buffer(id, 1, Buffer::inline(vec![1, 2, 3])).unwrap();
        let frame = r.commit(id, 1).unwrap();
        assert_eq!(frame, 1);
        r.attach_buffer(id, 1, Buffer::inline(vec![4, 5])).unwrap();
        let frame2 = r.commit(id, 1).unwrap();
        assert_eq!(frame2, 2);
    }

    #[test]
    fn composition_order_is_z_then_creation() {
        let mut r = SurfaceRegistry::new();
        let a = r.create_surface(1, 1, 1);
        let b = r.create_surface(1, 1, 1);
        let c = r.create_surface(1, 1, 1);
        r.set_z_order(a, 1, 5).unwrap();
        r.set_z_order(b, 1, 1).unwrap();
        r.set_z_order(c, 1, 1).unwrap();
        let guard = r.begin_composition();
        let order: Vec<u32> = guard.composition_order().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn destroy_during_composition_is_deferred() {
        let mut r = SurfaceRegistry::new();
        let id = r.create_surface(1, 1, 1);
        let mut guard = r.begin_composition();
        assert_eq!(guard.composition_order().len(), 1);
        guard.destroy_surface(id, 1).unwrap();
        // Still present: deferred until the guard drops.
        assert_eq!(guard.composition_order().len(), 1);
        drop(guard);
        assert_eq!(r.composition_order().len(), 0);
    }

    #[test]
    fn remove_client_surfaces_returns_ids_and_pixels() {
        let mut r = SurfaceRegistry::new();
        let a = r.create_surface(1, 10, 20);
        let b = r.create_surface(1, 5, 5);
        let _other = r.create_surface(2, 1, 1);
        let mut removed = r.remove_client_surfaces(1);
        removed.sort();
        assert_eq!(removed, vec![(a, 200), (b, 25)]);
        assert_eq!(r.composition_order().len(), 1);
    }
}
