use thiserror::Error;

/// Errors the encoder can return while building a command stream
/// (spec.md §4.1 "Contracts").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Structural/content failure modes produced by the validator (spec.md §4.2).
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("protocol error at offset {offset}: {message}")]
    Protocol {
        offset: u64,
        message: &'static str,
    },
    #[error("unsupported opcode 0x{opcode:04x} at offset {offset}")]
    UnsupportedOpcode { offset: u64, opcode: u16 },
    #[error("unsupported version {major}.{minor}")]
    VersionUnsupported { major: u16, minor: u16 },
    #[error("invalid scalar in opcode {opcode_name} at offset {offset}")]
    InvalidScalar {
        offset: u64,
        opcode: u16,
        opcode_name: &'static str,
    },
    #[error("invalid geometry in opcode {opcode_name} at offset {offset}")]
    InvalidGeometry {
        offset: u64,
        opcode: u16,
        opcode_name: &'static str,
    },
    /// Diagnostic variant: file offset, opcode, opcode-name, expected vs
    /// actual payload size, and a human-readable message (spec.md §4.2).
    #[error("{message} (opcode {opcode_name} at offset {offset}: expected {expected} bytes, got {actual})")]
    SizeMismatch {
        offset: u64,
        opcode: u16,
        opcode_name: &'static str,
        expected: u64,
        actual: u64,
        message: &'static str,
    },
}
