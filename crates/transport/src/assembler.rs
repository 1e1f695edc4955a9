//! Incremental frame assembly for nonblocking sockets (used by the daemon's
//! single-threaded poll loop, spec.md §4.9): bytes arrive in arbitrary-sized
//! chunks, and a complete `[header][body]` frame is only handed back once
//! every byte has been seen.

use semadraw_ipc::header::HEADER_BYTES;

use crate::TransportError;

/// Buffers bytes fed from nonblocking reads and yields complete frames as
/// they become available. One instance per connected client.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops one complete frame off the front of the buffer, if present.
    /// `max_body` enforces the transport's body-size ceiling against the
    /// declared length as soon as the header is available, so an
    /// over-declaring client is rejected before its body even arrives.
    pub fn try_take_frame(&mut self, max_body: u32) -> Result<Option<Vec<u8>>, TransportError> {
        if self.buf.len() < HEADER_BYTES {
            return Ok(None);
        }
        let body_len = crate::frame_body_len(&self.buf[..HEADER_BYTES])
            .ok_or(TransportError::Closed)? as usize;
        if body_len as u32 > max_body {
            return Err(TransportError::FrameTooLarge { length: body_len as u32, max: max_body });
        }
        let total = HEADER_BYTES + body_len;
        if self.buf.len() < total {
            return Ok(None);
        }
        let frame: Vec<u8> = self.buf.drain(..total).collect();
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semadraw_ipc::messages::{encode_frame, CommitRequest};

    #[test]
    fn assembles_frame_split_across_feeds() {
        let mut a = FrameAssembler::new();
        let frame = encode_frame(&CommitRequest { id: 9 });
        a.feed(&frame[..3]);
        assert!(a.try_take_frame(1 << 20).unwrap().is_none());
        a.feed(&frame[3..]);
        let got = a.try_take_frame(1 << 20).unwrap().unwrap();
        assert_eq!(got, frame);
    }

    #[test]
    fn yields_two_frames_fed_back_to_back() {
        let mut a = FrameAssembler::new();
        let f1 = encode_frame(&CommitRequest { id: 1 });
        let f2 = encode_frame(&CommitRequest { id: 2 });
        let mut both = f1.clone();
        both.extend_from_slice(&f2);
        a.feed(&both);
        let got1 = a.try_take_frame(1 << 20).unwrap().unwrap();
        let got2 = a.try_take_frame(1 << 20).unwrap().unwrap();
        assert_eq!(got1, f1);
        assert_eq!(got2, f2);
        assert!(a.try_take_frame(1 << 20).unwrap().is_none());
    }

    #[test]
    fn oversized_declared_length_rejected_before_body_arrives() {
        let mut a = FrameAssembler::new();
        let header = semadraw_ipc::MsgHeader { msg_type: 1, flags: 0, length: 100 };
        let mut buf = Vec::new();
        header.write_to(&mut buf);
        a.feed(&buf);
        let err = a.try_take_frame(10).unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
    }
}
