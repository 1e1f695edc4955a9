//! TCP transport (spec.md §4.3). No fd channel exists over a network socket,
//! so buffer attachment always uses `attach_buffer_inline` on this transport.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::os::fd::{AsRawFd, RawFd};

use crate::error::TransportError;
use crate::FramedTransport;
use semadraw_ipc::header::{HEADER_BYTES, NETWORK_MAX_BODY};

pub struct NetworkListener {
    inner: TcpListener,
}

impl NetworkListener {
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        Ok(Self { inner: TcpListener::bind(addr)? })
    }

    pub fn accept(&self) -> Result<NetworkStream, TransportError> {
        let (stream, _addr) = self.inner.accept()?;
        stream.set_nodelay(true)?;
        Ok(NetworkStream { inner: stream })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

pub struct NetworkStream {
    inner: TcpStream,
}

impl NetworkStream {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self { inner: stream })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), TransportError> {
        self.inner.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// One nonblocking read into `buf`. `Ok(0)` means "no data ready right
    /// now", not EOF (EOF is reported as [`TransportError::Closed`]).
    pub fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.inner.read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn read_exact_or_closed(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(TransportError::Closed),
            Err(e) => Err(e.into()),
        }
    }
}

impl FramedTransport for NetworkStream {
    fn max_body_size(&self) -> u32 {
        NETWORK_MAX_BODY
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let len = crate::frame_body_len(frame).ok_or(TransportError::Closed)?;
        if len > NETWORK_MAX_BODY {
            return Err(TransportError::FrameTooLarge { length: len, max: NETWORK_MAX_BODY });
        }
        self.inner.write_all(frame)?;
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut header = [0u8; HEADER_BYTES];
        self.read_exact_or_closed(&mut header)?;
        let body_len = crate::frame_body_len(&header).ok_or(TransportError::Closed)?;
        if body_len > NETWORK_MAX_BODY {
            return Err(TransportError::FrameTooLarge { length: body_len, max: NETWORK_MAX_BODY });
        }
        let mut body = vec![0u8; body_len as usize];
        self.read_exact_or_closed(&mut body)?;
        let mut frame = Vec::with_capacity(HEADER_BYTES + body.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semadraw_ipc::messages::{encode_frame, CommitRequest};

    #[test]
    fn plain_frame_round_trips_over_loopback() {
        let listener = NetworkListener::bind("127.0.0.1:0").unwrap();
        let local_addr = listener.inner.local_addr().unwrap();
        let client = std::thread::spawn(move || {
            let mut stream = NetworkStream::connect(local_addr).unwrap();
            let frame = encode_frame(&CommitRequest { id: 42 });
            stream.send_frame(&frame).unwrap();
        });
        let mut server = listener.accept().unwrap();
        let frame = server.recv_frame().unwrap();
        client.join().unwrap();
        let msg: CommitRequest = semadraw_ipc::decode_frame(&frame).unwrap();
        assert_eq!(msg.id, 42);
    }

    #[test]
    fn oversized_declared_length_is_rejected() {
        let listener = NetworkListener::bind("127.0.0.1:0").unwrap();
        let local_addr = listener.inner.local_addr().unwrap();
        let client = std::thread::spawn(move || {
            let stream = TcpStream::connect(local_addr).unwrap();
            let mut stream = stream;
            let header = semadraw_ipc::MsgHeader { msg_type: 1, flags: 0, length: NETWORK_MAX_BODY + 1 };
            let mut buf = Vec::new();
            header.write_to(&mut buf);
            let _ = stream.write_all(&buf);
        });
        let mut server = listener.accept().unwrap();
        let err = server.recv_frame().unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
        client.join().unwrap();
    }
}
