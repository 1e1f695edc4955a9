//! Client session state machine and per-client resource accounting
//! (spec.md §4.4).

pub mod error;
pub mod limits;
pub mod state;

pub use error::SessionError;
pub use limits::{ResourceLimits, ResourceUsage};
pub use state::{ClientId, ClientSession, SessionState};
