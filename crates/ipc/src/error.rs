use thiserror::Error;

/// Wire-level decode failures (spec.md §4.3).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IpcError {
    #[error("message body too short: needed {needed}, got {got}")]
    Truncated { needed: usize, got: usize },
    #[error("unknown message type 0x{0:04x}")]
    UnknownType(u16),
    #[error("frame length {length} exceeds transport maximum {max}")]
    FrameTooLarge { length: u32, max: u32 },
    #[error("message body does not match declared type")]
    TypeMismatch,
}

/// `error_reply` codes (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    None = 0,
    InvalidMessage = 1,
    InvalidSurface = 2,
    InvalidBuffer = 3,
    PermissionDenied = 4,
    ResourceLimit = 5,
    ProtocolError = 6,
    InternalError = 7,
    ValidationFailed = 8,
}

impl ErrorCode {
    pub fn from_u16(raw: u16) -> Option<Self> {
        Some(match raw {
            0 => Self::None,
            1 => Self::InvalidMessage,
            2 => Self::InvalidSurface,
            3 => Self::InvalidBuffer,
            4 => Self::PermissionDenied,
            5 => Self::ResourceLimit,
            6 => Self::ProtocolError,
            7 => Self::InternalError,
            8 => Self::ValidationFailed,
            _ => return None,
        })
    }
}
