//! Surface registry: creation, ownership, the pending/current buffer swap,
//! and composition ordering (spec.md §4.5).

pub mod buffer;
pub mod error;
pub mod registry;
pub mod surface;

pub use buffer::{Buffer, BufferBytes};
pub use error::RegistryError;
pub use registry::{CompositionGuard, SurfaceRegistry};
pub use surface::Surface;
