//! Framed transports carrying [`semadraw_ipc`] messages between clients and
//! the daemon. Two concrete transports, matching spec.md §4.3's split
//! between local and network bodies:
//!
//! - [`local`]: a Unix domain socket, `8 KiB` max body, supports passing
//!   shared-memory file descriptors alongside `attach_buffer` frames.
//! - [`network`]: a TCP stream, `64 KiB` max body, carries SDCS inline
//!   (`attach_buffer_inline`) since there is no fd channel to ride along.

pub mod assembler;
pub mod error;
pub mod local;
pub mod network;

pub use assembler::FrameAssembler;
pub use error::TransportError;

/// Common framing contract: read and write whole `[header][body]` frames as
/// produced by [`semadraw_ipc::encode_frame`], enforcing a transport-specific
/// maximum body size.
pub trait FramedTransport {
    fn max_body_size(&self) -> u32;
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;
    fn recv_frame(&mut self) -> Result<Vec<u8>, TransportError>;
}

pub(crate) fn frame_body_len(frame_header_bytes: &[u8]) -> Option<u32> {
    semadraw_ipc::MsgHeader::read_from(frame_header_bytes).map(|h| h.length)
}
