use thiserror::Error;

/// Failures surfaced by [`crate::ClientSession`] (spec.md §4.4, §7).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("message type 0x{msg_type:04x} is not accepted in state {state}")]
    ProtocolViolation { msg_type: u16, state: &'static str },
    #[error("resource limit exceeded: {resource} (have {current}, requested {requested}, limit {limit})")]
    ResourceLimit {
        resource: &'static str,
        current: u64,
        requested: u64,
        limit: u64,
    },
}
