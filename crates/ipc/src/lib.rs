//! Fixed-header IPC wire protocol between SemaDraw clients and the daemon
//! (spec.md §3, §4.3). Transport-agnostic: `semadraw-transport` frames these
//! bytes over a Unix socket or TCP stream.

pub mod error;
pub mod header;
pub mod messages;

pub use error::{ErrorCode, IpcError};
pub use header::MsgHeader;
pub use messages::{decode_frame, encode_frame, Message};

/// Protocol version this implementation speaks (spec.md §4.3 `hello`
/// handshake). A client's `version_major` must match exactly; `version_minor`
/// may be less than or equal to this value.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;
pub const PROTOCOL_VERSION_MINOR: u16 = 1;
