//! Maps a descriptor-passed shared-memory segment read-only and exposes a
//! sub-range of it as [`semadraw_registry::BufferBytes`] (spec.md §5: "fd-passed
//! buffers mapped read-only by the daemon, mapping lifetime equals the
//! slot's lifetime"). Grounded on `semadraw-registry::buffer::InlineBytes`'s
//! shape, swapping an owned `Vec<u8>` for a mapping this daemon owns.

use std::fmt;
use std::num::NonZeroUsize;
use std::os::fd::OwnedFd;
use std::ptr::NonNull;

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use semadraw_registry::BufferBytes;

/// One `mmap`'d region, unmapped on drop. Not `Clone`: exactly one owner,
/// shared afterwards only via the `Arc<dyn BufferBytes>` that wraps it.
struct MappedRegion {
    ptr: NonNull<std::ffi::c_void>,
    len: usize,
}

// SAFETY: the mapping is read-only and never mutated through `ptr` after
// creation; sharing the resulting `&[u8]` across threads is sound.
unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` describe exactly the mapping created in
        // `MappedRegion::new` and are not used again after this point.
        if let Err(e) = unsafe { munmap(self.ptr, self.len) } {
            tracing::warn!(target: "daemon.shm", error = %e, "munmap_failed");
        }
    }
}

impl MappedRegion {
    fn new(fd: OwnedFd, len: usize) -> nix::Result<Self> {
        let nz_len = NonZeroUsize::new(len).unwrap_or(NonZeroUsize::MIN);
        // SAFETY: `fd` names a valid, caller-owned file descriptor; the
        // mapping is read-only so no aliasing-mutation hazard exists.
        let ptr = unsafe {
            mmap(None, nz_len, ProtFlags::PROT_READ, MapFlags::MAP_SHARED, Some(&fd), 0)
        }?;
        Ok(Self { ptr, len })
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `len` bytes for the lifetime of `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().cast::<u8>(), self.len) }
    }
}

/// A read-only `[offset, offset+length)` view into a mapped shared-memory
/// segment, attached to a surface as its SDCS buffer.
pub struct MmapBytes {
    region: MappedRegion,
    offset: usize,
    length: usize,
}

impl fmt::Debug for MmapBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapBytes")
            .field("offset", &self.offset)
            .field("length", &self.length)
            .finish()
    }
}

impl MmapBytes {
    /// Maps `fd` for `shm_size` bytes and validates that `[offset, offset +
    /// length)` lies within it before returning.
    pub fn map(fd: OwnedFd, shm_size: u64, offset: u64, length: u64) -> Result<Self, MapError> {
        let shm_size = usize::try_from(shm_size).map_err(|_| MapError::OutOfRange)?;
        let offset = usize::try_from(offset).map_err(|_| MapError::OutOfRange)?;
        let length = usize::try_from(length).map_err(|_| MapError::OutOfRange)?;
        let end = offset.checked_add(length).ok_or(MapError::OutOfRange)?;
        if end > shm_size {
            return Err(MapError::OutOfRange);
        }
        let region = MappedRegion::new(fd, shm_size)?;
        Ok(Self { region, offset, length })
    }
}

impl BufferBytes for MmapBytes {
    fn as_bytes(&self) -> &[u8] {
        &self.region.as_slice()[self.offset..self.offset + self.length]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("offset/length exceed the mapped segment's size")]
    OutOfRange,
    #[error("mmap failed: {0}")]
    Mmap(#[from] nix::Error),
}
