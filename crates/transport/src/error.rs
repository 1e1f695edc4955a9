use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer closed the connection")]
    Closed,
    #[error("frame of {length} bytes exceeds this transport's maximum of {max} bytes")]
    FrameTooLarge { length: u32, max: u32 },
    #[error("received more file descriptors ({got}) than the caller allowed ({max})")]
    TooManyFds { got: usize, max: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ipc decode error: {0}")]
    Ipc(#[from] semadraw_ipc::IpcError),
    #[error("ancillary fd-passing error: {0}")]
    Nix(#[from] nix::Error),
}
