//! Unix domain socket transport (spec.md §4.3, §6). Supports passing raw file
//! descriptors (POSIX shared memory segments backing attached buffers)
//! alongside a message frame via `SCM_RIGHTS` ancillary data.

use std::io::{IoSlice, IoSliceMut, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

use nix::sys::socket::{
    bind, listen, recvmsg, sendmsg, socket, AddressFamily, Backlog, ControlMessage,
    ControlMessageOwned, MsgFlags, SockFlag, SockType, UnixAddr,
};

use crate::error::TransportError;
use crate::FramedTransport;
use semadraw_ipc::header::{HEADER_BYTES, LOCAL_MAX_BODY};

/// Binds a local socket, removing a stale socket file left behind by a
/// previous daemon instance at the same path.
pub struct LocalListener {
    inner: UnixListener,
}

impl LocalListener {
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(Self { inner: UnixListener::bind(path)? })
    }

    /// Binds with an explicit listen backlog and `mode` permission bits
    /// (spec.md §6: default path, mode `0660`, unlink-before-bind, backlog
    /// 16). `std::os::unix::net::UnixListener` has no backlog knob, so this
    /// builds the socket through `nix`'s raw syscalls instead.
    pub fn bind_with_backlog(path: impl AsRef<Path>, backlog: i32, mode: u32) -> Result<Self, TransportError> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let fd: OwnedFd = socket(AddressFamily::Unix, SockType::Stream, SockFlag::SOCK_CLOEXEC, None)?;
        let addr = UnixAddr::new(path)?;
        bind(fd.as_raw_fd(), &addr)?;
        let backlog = Backlog::new(backlog).unwrap_or(Backlog::MAXCONN);
        listen(&fd, backlog)?;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        // SAFETY: `fd` was just created and bound above; ownership transfers
        // to the `UnixListener` we construct from its raw value.
        let inner = unsafe { UnixListener::from_raw_fd(fd.into_raw_fd()) };
        Ok(Self { inner })
    }

    pub fn accept(&self) -> Result<LocalStream, TransportError> {
        let (stream, _addr) = self.inner.accept()?;
        Ok(LocalStream { inner: stream })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

pub struct LocalStream {
    inner: UnixStream,
}

impl LocalStream {
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        Ok(Self { inner: UnixStream::connect(path)? })
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), TransportError> {
        self.inner.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// One nonblocking read into `buf`. `Ok(0)` means "no data ready right
    /// now", not EOF (EOF is reported as [`TransportError::Closed`]); callers
    /// rely on poll readiness to know when to call this again.
    pub fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.inner.read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Sends `frame` together with `fds`, attached as `SCM_RIGHTS` ancillary
    /// data on the same datagram boundary as the frame header. The peer must
    /// read the frame and its fds together, in the same [`Self::recv_frame_with_fds`]
    /// call, or the descriptors are silently dropped by the kernel.
    pub fn send_frame_with_fds(&mut self, frame: &[u8], fds: &[RawFd]) -> Result<(), TransportError> {
        check_body_len(frame, LOCAL_MAX_BODY)?;
        let iov = [IoSlice::new(frame)];
        if fds.is_empty() {
            self.inner.write_all(frame)?;
            return Ok(());
        }
        let cmsg = [ControlMessage::ScmRights(fds)];
        sendmsg::<()>(self.inner.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)?;
        Ok(())
    }

    /// Receives one frame, plus up to `max_fds` descriptors carried alongside
    /// it via `SCM_RIGHTS`.
    pub fn recv_frame_with_fds(&mut self, max_fds: usize) -> Result<(Vec<u8>, Vec<OwnedFd>), TransportError> {
        let mut header = [0u8; HEADER_BYTES];
        self.read_exact_or_closed(&mut header)?;
        let body_len = crate::frame_body_len(&header).ok_or(TransportError::Closed)?;
        if body_len > LOCAL_MAX_BODY {
            return Err(TransportError::FrameTooLarge { length: body_len, max: LOCAL_MAX_BODY });
        }
        let mut body = vec![0u8; body_len as usize];
        let mut cmsg_space = nix::cmsg_space!([RawFd; 16]);
        let mut iov = [IoSliceMut::new(&mut body)];
        let msg = recvmsg::<()>(
            self.inner.as_raw_fd(),
            &mut iov,
            Some(&mut cmsg_space),
            MsgFlags::empty(),
        )?;
        let mut fds = Vec::new();
        for cmsg in msg.cmsgs()? {
            if let ControlMessageOwned::ScmRights(raw_fds) = cmsg {
                for fd in raw_fds {
                    // SAFETY: fd was just received from the kernel via SCM_RIGHTS
                    // and is owned exclusively by this process from this point on.
                    fds.push(unsafe { OwnedFd::from_raw_fd(fd) });
                }
            }
        }
        if fds.len() > max_fds {
            return Err(TransportError::TooManyFds { got: fds.len(), max: max_fds });
        }
        let mut frame = Vec::with_capacity(HEADER_BYTES + body.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(&body);
        Ok((frame, fds))
    }

    fn read_exact_or_closed(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(TransportError::Closed),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_body_len(frame: &[u8], max: u32) -> Result<(), TransportError> {
    let len = crate::frame_body_len(frame).ok_or(TransportError::Closed)?;
    if len > max {
        return Err(TransportError::FrameTooLarge { length: len, max });
    }
    Ok(())
}

impl FramedTransport for LocalStream {
    fn max_body_size(&self) -> u32 {
        LOCAL_MAX_BODY
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        check_body_len(frame, LOCAL_MAX_BODY)?;
        self.inner.write_all(frame)?;
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut header = [0u8; HEADER_BYTES];
        self.read_exact_or_closed(&mut header)?;
        let body_len = crate::frame_body_len(&header).ok_or(TransportError::Closed)?;
        if body_len > LOCAL_MAX_BODY {
            return Err(TransportError::FrameTooLarge { length: body_len, max: LOCAL_MAX_BODY });
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
    fn plain_frame_round_trips_over_socketpair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semadraw.sock");
        let listener = LocalListener::bind(&path).unwrap();
        let client = std::thread::spawn({
            let path = path.clone();
            move || {
                let mut stream = LocalStream::connect(&path).unwrap();
                let frame = encode_frame(&CommitRequest { id: 7 });
                stream.send_frame(&frame).unwrap();
            }
        });
        let mut server = listener.accept().unwrap();
        let frame = server.recv_frame().unwrap();
        client.join().unwrap();
        let msg: CommitRequest = semadraw_ipc::decode_frame(&frame).unwrap();
        assert_eq!(msg.id, 7);
    }

    #[test]
    fn oversized_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semadraw.sock");
        let listener = LocalListener::bind(&path).unwrap();
        let client = std::thread::spawn({
            let path = path.clone();
            move || {
                let mut stream = LocalStream::connect(&path).unwrap();
                let mut oversized = vec![0u8; HEADER_BYTES];
                let header = semadraw_ipc::MsgHeader { msg_type: 1, flags: 0, length: LOCAL_MAX_BODY + 1 };
                header.write_to(&mut oversized);
                // caller never follows through with the declared body; server
                // should reject on the header alone.
                let _ = stream.inner.write_all(&oversized);
            }
        });
        let mut server = listener.accept().unwrap();
        let err = server.recv_frame().unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
        client.join().unwrap();
    }
}
