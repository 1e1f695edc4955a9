use crate::error::SessionError;

/// Per-client resource ceilings (spec.md §4.4). Configurable via
/// `semadraw-config`; these are the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_surfaces: u32,
    pub max_total_pixels: u64,
    pub max_sdcs_bytes: u64,
    pub max_shm_bytes: u64,
}

impl ResourceLimits {
    pub const DEFAULT_MAX_SURFACES: u32 = 64;
    pub const DEFAULT_MAX_TOTAL_PIXELS: u64 = 256 * 1024 * 1024;
    pub const DEFAULT_MAX_SDCS_BYTES: u64 = 64 * 1024 * 1024;
    pub const DEFAULT_MAX_SHM_BYTES: u64 = 512 * 1024 * 1024;
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_surfaces: Self::DEFAULT_MAX_SURFACES,
            max_total_pixels: Self::DEFAULT_MAX_TOTAL_PIXELS,
            max_sdcs_bytes: Self::DEFAULT_MAX_SDCS_BYTES,
            max_shm_bytes: Self::DEFAULT_MAX_SHM_BYTES,
        }
    }
}

/// Live accounting for one client, checked against [`ResourceLimits`] on every
/// mutation. Never wraps silently: every increment is `checked_add`, every
/// decrement `saturating_sub`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResourceUsage {
    pub surface_count: u32,
    pub total_pixels: u64,
    pub sdcs_bytes: u64,
    pub shm_bytes: u64,
}

impl ResourceUsage {
    pub fn reserve_surface(&mut self, limits: &ResourceLimits, pixels: u64) -> Result<(), SessionError> {
        let next_count = self.surface_count.checked_add(1).ok_or(SessionError::ResourceLimit {
            resource: "surface_count",
            current: self.surface_count as u64,
            requested: 1,
            limit: limits.max_surfaces as u64,
        })?;
        if next_count > limits.max_surfaces {
            return Err(SessionError::ResourceLimit {
                resource: "surface_count",
                current: self.surface_count as u64,
                requested: 1,
                limit: limits.max_surfaces as u64,
            });
        }
        let next_pixels = self.total_pixels.checked_add(pixels).ok_or(SessionError::ResourceLimit {
            resource: "total_pixels",
            current: self.total_pixels,
            requested: pixels,
            limit: limits.max_total_pixels,
        })?;
        if next_pixels > limits.max_total_pixels {
            return Err(SessionError::ResourceLimit {
                resource: "total_pixels",
                current: self.total_pixels,
                requested: pixels,
                limit: limits.max_total_pixels,
            });
        }
        self.surface_count = next_count;
        self.total_pixels = next_pixels;
        Ok(())
    }

    pub fn release_surface(&mut self, pixels: u64) {
        self.surface_count = self.surface_count.saturating_sub(1);
        self.total_pixels = self.total_pixels.saturating_sub(pixels);
    }

    pub fn reserve_sdcs_bytes(&mut self, limits: &ResourceLimits, bytes: u64) -> Result<(), SessionError> {
        let next = self.sdcs_bytes.checked_add(bytes).ok_or(SessionError::ResourceLimit {
            resource: "sdcs_bytes",
            current: self.sdcs_bytes,
            requested: bytes,
            limit: limits.max_sdcs_bytes,
        })?;
        if next > limits.max_sdcs_bytes {
            return Err(SessionError::ResourceLimit {
                resource: "sdcs_bytes",
                current: self.sdcs_bytes,
                requested: bytes,
                limit: limits.max_sdcs_bytes,
            });
        }
        self.sdcs_bytes = next;
        Ok(())
    }

    pub fn release_sdcs_bytes(&mut self, bytes: u64) {
        self.sdcs_bytes = self.sdcs_bytes.saturating_sub(bytes);
    }

    pub fn reserve_shm_bytes(&mut self, limits: &ResourceLimits, bytes: u64) -> Result<(), SessionError> {
        let next = self.shm_bytes.checked_add(bytes).ok_or(SessionError::ResourceLimit {
            resource: "shm_bytes",
            current: self.shm_bytes,
            requested: bytes,
            limit: limits.max_shm_bytes,
        })?;
        if next > limits.max_shm_bytes {
            return Err(SessionError::ResourceLimit {
                resource: "shm_bytes",
                current: self.shm_bytes,
                requested: bytes,
                limit: limits.max_shm_bytes,
            });
        }
        self.shm_bytes = next;
        Ok(())
    }

    pub fn release_shm_bytes(&mut self, bytes: u64) {
        self.shm_bytes = self.shm_bytes.saturating_sub(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_limit_enforced() {
        let limits = ResourceLimits { max_surfaces: 2, ..Default::default() };
        let mut usage = ResourceUsage::default();
        usage.reserve_surface(&limits, 100).unwrap();
        usage.reserve_surface(&limits, 100).unwrap();
        assert!(usage.reserve_surface(&limits, 100).is_err());
        assert_eq!(usage.surface_count, 2);
    }

    #[test]
    fn release_never_underflows() {
        let mut usage = ResourceUsage::default();
        usage.release_surface(100);
        assert_eq!(usage.surface_count, 0);
        assert_eq!(usage.total_pixels, 0);
    }

    #[test]
    fn pixel_limit_enforced_independent_of_surface_count() {
        let limits = ResourceLimits { max_surfaces: 64, max_total_pixels: 150, ..Default::default() };
        let mut usage = ResourceUsage::default();
        usage.reserve_surface(&limits, 100).unwrap();
        assert!(usage.reserve_surface(&limits, 100).is_err());
        assert_eq!(usage.total_pixels, 100);
    }
}
