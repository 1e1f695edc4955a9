//! Translates one decoded IPC frame into session/registry/clipboard
//! mutations and the reply/error frames spec.md §4.3/§4.4/§7 call for. Pure
//! with respect to I/O: callers own sending `DispatchOutcome::replies` and
//! acting on `disconnect`.

use std::collections::HashMap;
use std::os::fd::OwnedFd;

use semadraw_ipc::messages::*;
use semadraw_ipc::{decode_frame, encode_frame, ErrorCode, Message, MsgHeader};
use semadraw_registry::{Buffer, RegistryError, SurfaceRegistry};
use semadraw_sdcs::validator::validate as validate_sdcs;
use semadraw_session::{ClientSession, SessionError, SessionState};

use crate::clipboard::ClipboardStore;
use crate::shm::MmapBytes;

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub replies: Vec<Vec<u8>>,
    pub disconnect: bool,
}

impl DispatchOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn reply(frame: Vec<u8>) -> Self {
        Self { replies: vec![frame], disconnect: false }
    }

    fn error(code: ErrorCode, context: u32) -> Self {
        Self { replies: vec![encode_frame(&ErrorReply { code: code as u16, context })], disconnect: false }
    }

    fn error_and_disconnect(code: ErrorCode, context: u32) -> Self {
        Self { replies: vec![encode_frame(&ErrorReply { code: code as u16, context })], disconnect: true }
    }

    fn disconnect_only() -> Self {
        Self { replies: Vec::new(), disconnect: true }
    }

    fn from_session_error(e: SessionError, context: u32) -> Self {
        match e {
            SessionError::ResourceLimit { .. } => Self::error(ErrorCode::ResourceLimit, context),
            SessionError::ProtocolViolation { .. } => Self::error_and_disconnect(ErrorCode::ProtocolError, context),
        }
    }

    fn from_registry_error(e: RegistryError, _context: u32) -> Self {
        match e {
            RegistryError::InvalidSurface(id) => Self::error(ErrorCode::InvalidSurface, id),
            RegistryError::PermissionDenied { surface, .. } => Self::error(ErrorCode::PermissionDenied, surface),
            RegistryError::InvalidBuffer(id) => Self::error(ErrorCode::InvalidBuffer, id),
        }
    }
}

/// Which resource-limit counter a surface's attached buffer is reserved
/// against. Local (fd-passed) attachments count against `max_shm_bytes`;
/// inline attachments (always available, the only option on the network
/// transport) count against `max_sdcs_bytes` (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachKind {
    Shm,
    Inline,
}

/// Per-client bookkeeping tracking, for every surface this client owns, the
/// byte length and kind reserved for its `pending` and `current` buffer
/// slots — mirroring `semadraw_registry::Surface`'s own pending/current
/// split so resource accounting can release exactly what a commit or
/// destroy actually frees. A surface may only ever be attached via one kind
/// across its lifetime; a later attach using the other kind is rejected as
/// `invalid_message` rather than silently mixing accounting categories.
#[derive(Debug, Default)]
pub struct BufferAccounting {
    kind: HashMap<u32, AttachKind>,
    pending_len: HashMap<u32, u64>,
    current_len: HashMap<u32, u64>,
}

impl BufferAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    fn release(session: &mut ClientSession, kind: AttachKind, len: u64) {
        match kind {
            AttachKind::Shm => session.release_shm_bytes(len),
            AttachKind::Inline => session.release_sdcs_bytes(len),
        }
    }

    fn reserve(session: &mut ClientSession, kind: AttachKind, len: u64) -> Result<(), SessionError> {
        match kind {
            AttachKind::Shm => session.reserve_shm_bytes(len),
            AttachKind::Inline => session.reserve_sdcs_bytes(len),
        }
    }

    /// Attempts to record a new pending attachment, reserving `len` bytes
    /// against the counter matching `kind`, releasing the previous pending
    /// reservation (if any, and of the same kind) first. Restores the old
    /// reservation and returns the error unchanged if the new one doesn't
    /// fit, leaving the caller's registry state untouched.
    fn attach_pending(
        &mut self,
        session: &mut ClientSession,
        id: u32,
        kind: AttachKind,
        len: u64,
    ) -> Result<(), SessionError> {
        if let Some(existing) = self.kind.get(&id) {
            if *existing != kind {
                return Err(SessionError::ProtocolViolation { msg_type: 0, state: "mixed_attach_kind" });
            }
        }
        let old = self.pending_len.remove(&id);
        if let Some(old_len) = old {
            Self::release(session, kind, old_len);
        }
        match Self::reserve(session, kind, len) {
            Ok(()) => {
                self.kind.insert(id, kind);
                self.pending_len.insert(id, len);
                Ok(())
            }
            Err(e) => {
                if let Some(old_len) = old {
                    // Restoring a reservation that fit a moment ago cannot
                    // fail; the old pending buffer in the registry is
                    // untouched by this aborted attach.
                    let _ = Self::reserve(session, kind, old_len);
                    self.pending_len.insert(id, old_len);
                }
                Err(e)
            }
        }
    }

    /// Moves a surface's pending reservation into its current slot,
    /// releasing whatever the previous current slot held (spec.md §5:
    /// "prior current freed").
    fn commit(&mut self, session: &mut ClientSession, id: u32) {
        if let Some(old_len) = self.current_len.remove(&id) {
            if let Some(kind) = self.kind.get(&id) {
                Self::release(session, *kind, old_len);
            }
        }
        if let Some(len) = self.pending_len.remove(&id) {
            self.current_len.insert(id, len);
        }
    }

    /// Releases everything held for a surface that is going away (destroy,
    /// or the owning client's full teardown).
    pub fn remove_surface(&mut self, session: &mut ClientSession, id: u32) {
        let kind = self.kind.remove(&id);
        let Some(kind) = kind else { return };
        if let Some(len) = self.pending_len.remove(&id) {
            Self::release(session, kind, len);
        }
        if let Some(len) = self.current_len.remove(&id) {
            Self::release(session, kind, len);
        }
    }
}

fn decode_or_invalid<M: Message>(frame: &[u8]) -> Result<M, DispatchOutcome> {
    decode_frame::<M>(frame).map_err(|_| DispatchOutcome::error(ErrorCode::InvalidMessage, 0))
}

/// Dispatches one fully-received frame (plus any fds it arrived with, only
/// ever non-empty for a local `attach_buffer`). `session`/`registry` are the
/// owning client's and the shared surface registry, `clipboard` the shared
/// store, `accounting` this client's buffer bookkeeping.
pub fn dispatch(
    session: &mut ClientSession,
    registry: &mut SurfaceRegistry,
    clipboard: &mut ClipboardStore,
    accounting: &mut BufferAccounting,
    frame: &[u8],
    fds: Vec<OwnedFd>,
) -> DispatchOutcome {
    let Some(header) = MsgHeader::read_from(frame) else {
        return DispatchOutcome::disconnect_only();
    };
    let msg_type = header.msg_type;

    if session.state() == SessionState::AwaitingHello {
        if msg_type != HelloRequest::TYPE {
            let _ = session.reject_before_hello(msg_type);
            return DispatchOutcome::error_and_disconnect(ErrorCode::ProtocolError, 0);
        }
        return handle_hello(session, frame);
    }

    if session.require_connected(msg_type).is_err() {
        return DispatchOutcome::disconnect_only();
    }

    match msg_type {
        CreateSurfaceRequest::TYPE => handle_create_surface(session, registry, frame),
        DestroySurfaceRequest::TYPE => handle_destroy_surface(session, registry, accounting, frame),
        AttachBufferRequest::TYPE => handle_attach_buffer(session, registry, accounting, frame, fds),
        AttachBufferInlineRequest::TYPE => handle_attach_buffer_inline(session, registry, accounting, frame),
        CommitRequest::TYPE => handle_commit(session, registry, accounting, frame),
        SetVisibleRequest::TYPE => handle_set_visible(session, registry, frame),
        SetZOrderRequest::TYPE => handle_set_z_order(session, registry, frame),
        SetPositionRequest::TYPE => handle_set_position(session, registry, frame),
        SyncRequest::TYPE => handle_sync(frame),
        ClipboardSetRequest::TYPE => handle_clipboard_set(session, clipboard, frame),
        ClipboardRequestRequest::TYPE => handle_clipboard_request(clipboard, frame),
        DisconnectRequest::TYPE => {
            session.begin_disconnect();
            DispatchOutcome::disconnect_only()
        }
        _ => DispatchOutcome::error(ErrorCode::InvalidMessage, 0),
    }
}

fn handle_hello(session: &mut ClientSession, frame: &[u8]) -> DispatchOutcome {
    let req: HelloRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(_) => return DispatchOutcome::error_and_disconnect(ErrorCode::ProtocolError, 0),
    };
    if req.version_major != semadraw_ipc::PROTOCOL_VERSION_MAJOR {
        return DispatchOutcome::error_and_disconnect(ErrorCode::ProtocolError, 0);
    }
    session.complete_hello().expect("state was just checked to be awaiting_hello");
    let reply = HelloReply {
        version_major: semadraw_ipc::PROTOCOL_VERSION_MAJOR,
        version_minor: semadraw_ipc::PROTOCOL_VERSION_MINOR,
        client_id: session.id.0,
        server_flags: 0,
    };
    DispatchOutcome::reply(encode_frame(&reply))
}

fn handle_create_surface(session: &mut ClientSession, registry: &mut SurfaceRegistry, frame: &[u8]) -> DispatchOutcome {
    let req: CreateSurfaceRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let pixels = req.width as u64 * req.height as u64;
    let id = registry.create_surface(session.id.0, req.width, req.height);
    if let Err(e) = session.reserve_surface(id, pixels) {
        let _ = registry.destroy_surface(id, session.id.0);
        return DispatchOutcome::from_session_error(e, id);
    }
    DispatchOutcome::reply(encode_frame(&SurfaceCreatedReply { id }))
}

fn handle_destroy_surface(
    session: &mut ClientSession,
    registry: &mut SurfaceRegistry,
    accounting: &mut BufferAccounting,
    frame: &[u8],
) -> DispatchOutcome {
    let req: DestroySurfaceRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let pixel_count = registry.iter().find(|s| s.id == req.id).map(|s| s.pixel_count());
    match registry.destroy_surface(req.id, session.id.0) {
        Ok(()) => {
            if let Some(pixels) = pixel_count {
                session.release_surface(req.id, pixels);
            }
            accounting.remove_surface(session, req.id);
            DispatchOutcome::none()
        }
        Err(e) => DispatchOutcome::from_registry_error(e, req.id),
    }
}

fn handle_attach_buffer(
    session: &mut ClientSession,
    registry: &mut SurfaceRegistry,
    accounting: &mut BufferAccounting,
    frame: &[u8],
    mut fds: Vec<OwnedFd>,
) -> DispatchOutcome {
    let req: AttachBufferRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    if fds.len() != 1 {
        return DispatchOutcome::error(ErrorCode::InvalidMessage, req.id);
    }
    let fd = fds.pop().unwrap();
    let mapped = match MmapBytes::map(fd, req.shm_size, req.offset, req.length) {
        Ok(m) => m,
        Err(_) => return DispatchOutcome::error(ErrorCode::ValidationFailed, req.id),
    };
    if let Err(_e) = validate_sdcs(mapped.as_bytes()) {
        return DispatchOutcome::error(ErrorCode::ValidationFailed, req.id);
    }
    let len = mapped.as_bytes().len() as u64;
    if let Err(e) = accounting.attach_pending(session, req.id, AttachKind::Shm, req.shm_size.max(len)) {
        return DispatchOutcome::from_session_error(e, req.id);
    }
    match registry.attach_buffer(req.id, session.id.0, Buffer::from_bytes(std::sync::Arc::new(mapped))) {
        Ok(()) => DispatchOutcome::none(),
        Err(e) => {
            accounting.remove_surface(session, req.id);
            DispatchOutcome::from_registry_error(e, req.id)
        }
    }
}

fn handle_attach_buffer_inline(
    session: &mut ClientSession,
    registry: &mut SurfaceRegistry,
    accounting: &mut BufferAccounting,
    frame: &[u8],
) -> DispatchOutcome {
    let req: AttachBufferInlineRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    if let Err(_e) = validate_sdcs(&req.sdcs) {
        return DispatchOutcome::error(ErrorCode::ValidationFailed, req.id);
    }
    let len = req.sdcs.len() as u64;
    if let Err(e) = accounting.attach_pending(session, req.id, AttachKind::Inline, len) {
        return DispatchOutcome::from_session_error(e, req.id);
    }
    match registry.attach_buffer(req.id, session.id.0, Buffer::inline(req.sdcs)) {
        Ok(()) => DispatchOutcome::none(),
        Err(e) => {
            accounting.remove_surface(session, req.id);
            DispatchOutcome::from_registry_error(e, req.id)
        }
    }
}

fn handle_commit(
    session: &mut ClientSession,
    registry: &mut SurfaceRegistry,
    accounting: &mut BufferAccounting,
    frame: &[u8],
) -> DispatchOutcome {
    let req: CommitRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    match registry.commit(req.id, session.id.0) {
        Ok(_frame_number) => {
            accounting.commit(session, req.id);
            // No immediate reply: `frame_complete` is emitted once the
            // compositor actually renders this surface (spec.md §4.3).
            DispatchOutcome::none()
        }
        Err(e) => DispatchOutcome::from_registry_error(e, req.id),
    }
}

fn handle_set_visible(session: &mut ClientSession, registry: &mut SurfaceRegistry, frame: &[u8]) -> DispatchOutcome {
    let req: SetVisibleRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    match registry.set_visible(req.id, session.id.0, req.visible) {
        Ok(()) => DispatchOutcome::none(),
        Err(e) => DispatchOutcome::from_registry_error(e, req.id),
    }
}

fn handle_set_z_order(session: &mut ClientSession, registry: &mut SurfaceRegistry, frame: &[u8]) -> DispatchOutcome {
    let req: SetZOrderRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    match registry.set_z_order(req.id, session.id.0, req.z) {
        Ok(()) => DispatchOutcome::none(),
        Err(e) => DispatchOutcome::from_registry_error(e, req.id),
    }
}

/// Handled identically regardless of which transport the client connected
/// over (spec.md §9 Open Question 1, resolved in `SPEC_FULL.md` §9): no
/// local/network branching here or anywhere else in this module.
fn handle_set_position(session: &mut ClientSession, registry: &mut SurfaceRegistry, frame: &[u8]) -> DispatchOutcome {
    let req: SetPositionRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    match registry.set_position(req.id, session.id.0, req.x, req.y) {
        Ok(()) => DispatchOutcome::none(),
        Err(e) => DispatchOutcome::from_registry_error(e, req.id),
    }
}

fn handle_sync(frame: &[u8]) -> DispatchOutcome {
    let req: SyncRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    // The loop is single-threaded and processes one client's requests
    // strictly in order, so every request preceding this `sync` has already
    // been applied by the time we reach it: the barrier is free.
    DispatchOutcome::reply(encode_frame(&SyncDoneReply { sync_id: req.sync_id }))
}

fn handle_clipboard_set(session: &mut ClientSession, clipboard: &mut ClipboardStore, frame: &[u8]) -> DispatchOutcome {
    let req: ClipboardSetRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let Some(selection) = ClipboardSelection::from_u32(req.selection) else {
        return DispatchOutcome::error(ErrorCode::InvalidMessage, req.selection);
    };
    clipboard.set(selection, session.id, req.data);
    DispatchOutcome::none()
}

fn handle_clipboard_request(clipboard: &mut ClipboardStore, frame: &[u8]) -> DispatchOutcome {
    let req: ClipboardRequestRequest = match decode_or_invalid(frame) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let Some(selection) = ClipboardSelection::from_u32(req.selection) else {
        return DispatchOutcome::error(ErrorCode::InvalidMessage, req.selection);
    };
    match clipboard.get(selection) {
        Some(data) => DispatchOutcome::reply(encode_frame(&ClipboardDataReply { selection: req.selection, data: data.to_vec() })),
        None => DispatchOutcome::error(ErrorCode::InvalidMessage, req.selection),
    }
}

/// End-to-end dispatch scenarios (spec.md §8). Scenario 6 (frame pacing
/// under load) is exercised by `semadraw-scheduler`'s own tests instead,
/// since pacing is entirely that crate's responsibility.
#[cfg(test)]
mod tests {
    use semadraw_registry::SurfaceRegistry;
    use semadraw_sdcs::Encoder;
    use semadraw_session::{ClientId, ClientSession, ResourceLimits};

    use super::*;

    fn connected_session(id: u32, limits: ResourceLimits) -> ClientSession {
        let mut session = ClientSession::new(ClientId(id), limits);
        session.complete_hello().unwrap();
        session
    }

    /// Minimal valid SDCS buffer: a `RESET` record followed by `END`
    /// (spec.md §8 scenario 2).
    fn minimal_sdcs() -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.reset();
        enc.end();
        enc.to_container_bytes()
    }

    #[test]
    fn handshake_only() {
        let mut session = ClientSession::new(ClientId(1), ResourceLimits::default());
        let mut registry = SurfaceRegistry::new();
        let mut clipboard = ClipboardStore::new();
        let mut accounting = BufferAccounting::new();

        // spec.md §8 scenario 1's literal fixture: hello{0,1,0}.
        let frame = encode_frame(&HelloRequest { version_major: 0, version_minor: 1, client_flags: 0 });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &frame, Vec::new());

        assert!(!outcome.disconnect);
        assert_eq!(outcome.replies.len(), 1);
        let reply: HelloReply = decode_frame(&outcome.replies[0]).unwrap();
        assert_eq!(reply.version_major, 0);
        assert_eq!(reply.version_minor, 1);
        assert_eq!(reply.client_id, 1);
        assert_eq!(reply.server_flags, 0);
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn create_attach_inline_commit_advances_frame_number() {
        let mut session = connected_session(1, ResourceLimits::default());
        let mut registry = SurfaceRegistry::new();
        let mut clipboard = ClipboardStore::new();
        let mut accounting = BufferAccounting::new();

        let create = encode_frame(&CreateSurfaceRequest { width: 400, height: 300, scale: 1.0, flags: 0 });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &create, Vec::new());
        assert!(!outcome.disconnect);
        let created: SurfaceCreatedReply = decode_frame(&outcome.replies[0]).unwrap();
        assert_eq!(created.id, 1);

        let attach = encode_frame(&AttachBufferInlineRequest { id: created.id, flags: 0, sdcs: minimal_sdcs() });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &attach, Vec::new());
        assert!(outcome.replies.is_empty());
        assert!(!outcome.disconnect);

        let commit = encode_frame(&CommitRequest { id: created.id });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &commit, Vec::new());
        assert!(outcome.replies.is_empty());
        assert!(!outcome.disconnect);

        let surface = registry.iter().find(|s| s.id == created.id).unwrap();
        assert_eq!(surface.frame_number, 1);
        assert!(surface.current.is_some());
    }

    #[test]
    fn ownership_violation_on_destroy_by_non_owner() {
        let mut owner = connected_session(1, ResourceLimits::default());
        let mut intruder = connected_session(2, ResourceLimits::default());
        let mut registry = SurfaceRegistry::new();
        let mut clipboard = ClipboardStore::new();
        let mut owner_accounting = BufferAccounting::new();
        let mut intruder_accounting = BufferAccounting::new();

        let create = encode_frame(&CreateSurfaceRequest { width: 10, height: 10, scale: 1.0, flags: 0 });
        let outcome = dispatch(&mut owner, &mut registry, &mut clipboard, &mut owner_accounting, &create, Vec::new());
        let created: SurfaceCreatedReply = decode_frame(&outcome.replies[0]).unwrap();

        let destroy = encode_frame(&DestroySurfaceRequest { id: created.id });
        let outcome = dispatch(&mut intruder, &mut registry, &mut clipboard, &mut intruder_accounting, &destroy, Vec::new());

        assert!(!outcome.disconnect);
        assert_eq!(outcome.replies.len(), 1);
        let err: ErrorReply = decode_frame(&outcome.replies[0]).unwrap();
        assert_eq!(err.code, ErrorCode::PermissionDenied as u16);
        assert_eq!(err.context, created.id);
        assert!(registry.is_owner(created.id, owner.id.0));
    }

    #[test]
    fn exceeding_max_surfaces_is_resource_limit() {
        let limits = ResourceLimits { max_surfaces: 2, ..Default::default() };
        let mut session = connected_session(1, limits);
        let mut registry = SurfaceRegistry::new();
        let mut clipboard = ClipboardStore::new();
        let mut accounting = BufferAccounting::new();

        for _ in 0..2 {
            let create = encode_frame(&CreateSurfaceRequest { width: 1, height: 1, scale: 1.0, flags: 0 });
            let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &create, Vec::new());
            assert!(outcome.replies.len() == 1);
            decode_frame::<SurfaceCreatedReply>(&outcome.replies[0]).expect("first two surfaces succeed");
        }

        let create = encode_frame(&CreateSurfaceRequest { width: 1, height: 1, scale: 1.0, flags: 0 });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &create, Vec::new());
        assert!(!outcome.disconnect);
        let err: ErrorReply = decode_frame(&outcome.replies[0]).unwrap();
        assert_eq!(err.code, ErrorCode::ResourceLimit as u16);
    }

    #[test]
    fn malformed_sdcs_is_validation_failed_and_commit_still_has_no_pending() {
        let mut session = connected_session(1, ResourceLimits::default());
        let mut registry = SurfaceRegistry::new();
        let mut clipboard = ClipboardStore::new();
        let mut accounting = BufferAccounting::new();

        let create = encode_frame(&CreateSurfaceRequest { width: 10, height: 10, scale: 1.0, flags: 0 });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &create, Vec::new());
        let created: SurfaceCreatedReply = decode_frame(&outcome.replies[0]).unwrap();

        // A `CMDS` chunk whose record sequence never terminates with `END`.
        let mut enc = Encoder::new();
        enc.reset();
        let bad_sdcs = enc.to_container_bytes();

        let attach = encode_frame(&AttachBufferInlineRequest { id: created.id, flags: 0, sdcs: bad_sdcs });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &attach, Vec::new());
        assert!(!outcome.disconnect);
        let err: ErrorReply = decode_frame(&outcome.replies[0]).unwrap();
        assert_eq!(err.code, ErrorCode::ValidationFailed as u16);
        assert_eq!(err.context, created.id);

        let commit = encode_frame(&CommitRequest { id: created.id });
        let outcome = dispatch(&mut session, &mut registry, &mut clipboard, &mut accounting, &commit, Vec::new());
        let err: ErrorReply = decode_frame(&outcome.replies[0]).unwrap();
        assert_eq!(err.code, ErrorCode::InvalidBuffer as u16);
    }
}
