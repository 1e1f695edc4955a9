use thiserror::Error;

/// Failures surfaced by [`crate::SurfaceRegistry`] (spec.md §4.5, §7).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("surface {0} does not exist")]
    InvalidSurface(u32),
    #[error("client {requester} does not own surface {surface}")]
    PermissionDenied { surface: u32, requester: u32 },
    #[error("surface {0} has no pending buffer to commit")]
    InvalidBuffer(u32),
}
