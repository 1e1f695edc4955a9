use std::collections::HashSet;

use crate::error::SessionError;
use crate::limits::{ResourceLimits, ResourceUsage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

/// spec.md §4.4: `awaiting_hello → connected → disconnecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHello,
    Connected,
    Disconnecting,
}

impl SessionState {
    fn label(self) -> &'static str {
        match self {
            Self::AwaitingHello => "awaiting_hello",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }
}

/// The daemon's per-connection bookkeeping: handshake state, owned surfaces,
/// and resource usage against [`ResourceLimits`].
#[derive(Debug)]
pub struct ClientSession {
    pub id: ClientId,
    state: SessionState,
    limits: ResourceLimits,
    usage: ResourceUsage,
    owned_surfaces: HashSet<u32>,
}

impl ClientSession {
    pub fn new(id: ClientId, limits: ResourceLimits) -> Self {
        Self {
            id,
            state: SessionState::AwaitingHello,
            limits,
            usage: ResourceUsage::default(),
            owned_surfaces: HashSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn usage(&self) -> ResourceUsage {
        self.usage
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn owned_surfaces(&self) -> impl Iterator<Item = u32> + '_ {
        self.owned_surfaces.iter().copied()
    }

    pub fn owns(&self, surface_id: u32) -> bool {
        self.owned_surfaces.contains(&surface_id)
    }

    /// `hello` is the only request accepted in `awaiting_hello`; it moves the
    /// session to `connected`.
    pub fn complete_hello(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::AwaitingHello, 0x0001)?;
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Rejects any request type other than `hello` while `awaiting_hello`,
    /// and moves the session to `disconnecting` as spec.md §4.4 mandates.
    pub fn reject_before_hello(&mut self, msg_type: u16) -> SessionError {
        self.state = SessionState::Disconnecting;
        SessionError::ProtocolViolation { msg_type, state: SessionState::AwaitingHello.label() }
    }

    pub fn require_connected(&self, msg_type: u16) -> Result<(), SessionError> {
        self.require(SessionState::Connected, msg_type)
    }

    fn require(&self, expected: SessionState, msg_type: u16) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::ProtocolViolation { msg_type, state: self.state.label() })
        }
    }

    pub fn begin_disconnect(&mut self) {
        self.state = SessionState::Disconnecting;
    }

    pub fn reserve_surface(&mut self, id: u32, pixels: u64) -> Result<(), SessionError> {
        self.usage.reserve_surface(&self.limits, pixels)?;
        self.owned_surfaces.insert(id);
        Ok(())
    }

    pub fn release_surface(&mut self, id: u32, pixels: u64) {
        if self.owned_surfaces.remove(&id) {
            self.usage.release_surface(pixels);
        }
    }

    pub fn reserve_sdcs_bytes(&mut self, bytes: u64) -> Result<(), SessionError> {
        self.usage.reserve_sdcs_bytes(&self.limits, bytes)
    }

    pub fn release_sdcs_bytes(&mut self, bytes: u64) {
        self.usage.release_sdcs_bytes(bytes);
    }

    pub fn reserve_shm_bytes(&mut self, bytes: u64) -> Result<(), SessionError> {
        self.usage.reserve_shm_bytes(&self.limits, bytes)
    }

    pub fn release_shm_bytes(&mut self, bytes: u64) {
        self.usage.release_shm_bytes(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_transitions_to_connected() {
        let mut s = ClientSession::new(ClientId(1), ResourceLimits::default());
        assert_eq!(s.state(), SessionState::AwaitingHello);
        s.complete_hello().unwrap();
        assert_eq!(s.state(), SessionState::Connected);
    }

    #[test]
    fn non_hello_before_hello_disconnects() {
        let mut s = ClientSession::new(ClientId(1), ResourceLimits::default());
        let err = s.reject_before_hello(0x0002);
        assert_eq!(s.state(), SessionState::Disconnecting);
        assert!(matches!(err, SessionError::ProtocolViolation { .. }));
    }

    #[test]
    fn surface_ownership_tracked_on_reserve_and_release() {
        let mut s = ClientSession::new(ClientId(1), ResourceLimits::default());
        s.complete_hello().unwrap();
        s.reserve_surface(1, 100).unwrap();
        assert!(s.owns(1));
        assert_eq!(s.usage().surface_count, 1);
        s.release_surface(1, 100);
        assert!(!s.owns(1));
        assert_eq!(s.usage().surface_count, 0);
    }
}
