//! Per-connection state: the transport handle plus the session state machine
//! and resource accounting from `semadraw-session` (spec.md §4.4).

use std::os::fd::{AsRawFd, RawFd};

use semadraw_session::{ClientId, ClientSession};
use semadraw_transport::{FrameAssembler, FramedTransport, TransportError};

use semadraw_transport::local::LocalStream;
use semadraw_transport::network::NetworkStream;

use crate::dispatch::BufferAccounting;

/// The two transports a client may be connected over (spec.md §4.3). Local
/// clients read one whole frame (plus any `SCM_RIGHTS` fds) per poll
/// readiness via a single blocking `recvmsg`, since ancillary data must
/// travel in the same syscall as the frame bytes it rides with and cannot be
/// recovered from a generic byte-stream reassembler; this is a documented
/// simplification relying on local messages arriving atomically under the 8
/// KiB cap (see `DESIGN.md`). Network clients have no fd channel, so they go
/// through the nonblocking [`FrameAssembler`] instead, which correctly
/// reassembles frames split across TCP segments.
pub enum ClientTransport {
    Local(LocalStream),
    Network { stream: NetworkStream, assembler: FrameAssembler },
}

impl ClientTransport {
    pub fn as_raw_fd(&self) -> RawFd {
        match self {
            Self::Local(s) => s.as_raw_fd(),
            Self::Network { stream, .. } => stream.as_raw_fd(),
        }
    }

    pub fn max_body_size(&self) -> u32 {
        match self {
            Self::Local(s) => s.max_body_size(),
            Self::Network { stream, .. } => stream.max_body_size(),
        }
    }

    pub fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        match self {
            Self::Local(s) => s.send_frame(frame),
            Self::Network { stream, .. } => stream.send_frame(frame),
        }
    }
}

pub struct Client {
    pub id: ClientId,
    pub transport: ClientTransport,
    pub session: ClientSession,
    pub accounting: BufferAccounting,
}

impl Client {
    pub fn new(id: ClientId, transport: ClientTransport, session: ClientSession) -> Self {
        Self { id, transport, session, accounting: BufferAccounting::new() }
    }
}
