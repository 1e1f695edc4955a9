//! Request/reply/event message bodies (spec.md §4.3 "excerpt").
//!
//! Every message implements [`Message`], giving it a stable `TYPE` tag and a
//! fixed encode/decode pair. Variable-length payloads (inline SDCS buffers,
//! clipboard data) are carried as a trailing `Vec<u8>` appended after the
//! fixed fields, with their own length field validated on decode.

use crate::error::IpcError;

/// Implemented by every wire message. `encode_body`/`decode_body` operate on
/// the bytes *after* the 8-byte [`crate::header::MsgHeader`].
pub trait Message: Sized {
    const TYPE: u16;
    fn encode_body(&self, out: &mut Vec<u8>);
    fn decode_body(body: &[u8]) -> Result<Self, IpcError>;
}

fn need(body: &[u8], n: usize) -> Result<(), IpcError> {
    if body.len() < n {
        Err(IpcError::Truncated { needed: n, got: body.len() })
    } else {
        Ok(())
    }
}

fn u16_at(b: &[u8], o: usize) -> u16 {
    u16::from_le_bytes(b[o..o + 2].try_into().unwrap())
}
fn u32_at(b: &[u8], o: usize) -> u32 {
    u32::from_le_bytes(b[o..o + 4].try_into().unwrap())
}
fn u64_at(b: &[u8], o: usize) -> u64 {
    u64::from_le_bytes(b[o..o + 8].try_into().unwrap())
}
fn i32_at(b: &[u8], o: usize) -> i32 {
    i32::from_le_bytes(b[o..o + 4].try_into().unwrap())
}
fn f32_at(b: &[u8], o: usize) -> f32 {
    f32::from_le_bytes(b[o..o + 4].try_into().unwrap())
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloRequest {
    pub version_major: u16,
    pub version_minor: u16,
    pub client_flags: u32,
}
impl Message for HelloRequest {
    const TYPE: u16 = 0x0001;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version_major.to_le_bytes());
        out.extend_from_slice(&self.version_minor.to_le_bytes());
        out.extend_from_slice(&self.client_flags.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 8)?;
        Ok(Self {
            version_major: u16_at(body, 0),
            version_minor: u16_at(body, 2),
            client_flags: u32_at(body, 4),
        })
    }
}
impl HelloRequest {
    pub const SIZE: usize = 8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloReply {
    pub version_major: u16,
    pub version_minor: u16,
    pub client_id: u32,
    pub server_flags: u32,
}
impl Message for HelloReply {
    const TYPE: u16 = 0x8001;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version_major.to_le_bytes());
        out.extend_from_slice(&self.version_minor.to_le_bytes());
        out.extend_from_slice(&self.client_id.to_le_bytes());
        out.extend_from_slice(&self.server_flags.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 12)?;
        Ok(Self {
            version_major: u16_at(body, 0),
            version_minor: u16_at(body, 2),
            client_id: u32_at(body, 4),
            server_flags: u32_at(body, 8),
        })
    }
}
impl HelloReply {
    pub const SIZE: usize = 12;
}

// ---------------------------------------------------------------------------
// Surface lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateSurfaceRequest {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub flags: u32,
}
impl Message for CreateSurfaceRequest {
    const TYPE: u16 = 0x0002;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.scale.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 16)?;
        Ok(Self {
            width: u32_at(body, 0),
            height: u32_at(body, 4),
            scale: f32_at(body, 8),
            flags: u32_at(body, 12),
        })
    }
}
impl CreateSurfaceRequest {
    pub const SIZE: usize = 16;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCreatedReply {
    pub id: u32,
}
impl Message for SurfaceCreatedReply {
    const TYPE: u16 = 0x8002;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 4)?;
        Ok(Self { id: u32_at(body, 0) })
    }
}
impl SurfaceCreatedReply {
    pub const SIZE: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroySurfaceRequest {
    pub id: u32,
}
impl Message for DestroySurfaceRequest {
    const TYPE: u16 = 0x0003;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 4)?;
        Ok(Self { id: u32_at(body, 0) })
    }
}
impl DestroySurfaceRequest {
    pub const SIZE: usize = 4;
}

// ---------------------------------------------------------------------------
// Buffer attachment
// ---------------------------------------------------------------------------

/// Local-transport variant: the SDCS bytes live in a descriptor-passed shared
/// memory object (spec.md §4.3, §6); this struct carries only the bookkeeping
/// fields, the descriptor itself travels out-of-band via the transport's
/// ancillary-data mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachBufferRequest {
    pub id: u32,
    pub shm_size: u64,
    pub offset: u64,
    pub length: u64,
}
impl Message for AttachBufferRequest {
    const TYPE: u16 = 0x0004;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // pad to align u64 fields
        out.extend_from_slice(&self.shm_size.to_le_bytes());
        out.extend_from_slice(&self.offset.to_le_bytes());
        out.extend_from_slice(&self.length.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 32)?;
        Ok(Self {
            id: u32_at(body, 0),
            shm_size: u64_at(body, 8),
            offset: u64_at(body, 16),
            length: u64_at(body, 24),
        })
    }
}
impl AttachBufferRequest {
    pub const SIZE: usize = 32;
}

/// Network-transport variant: `length` bytes of SDCS immediately follow the
/// fixed header fields in the same message body (spec.md §4.3).
#[derive(Debug, Clone, PartialEq)]
pub struct AttachBufferInlineRequest {
    pub id: u32,
    pub flags: u32,
    pub sdcs: Vec<u8>,
}
impl Message for AttachBufferInlineRequest {
    const TYPE: u16 = 0x0005;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&(self.sdcs.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.sdcs);
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 12)?;
        let id = u32_at(body, 0);
        let length = u32_at(body, 4) as usize;
        let flags = u32_at(body, 8);
        need(body, 12 + length)?;
        Ok(Self { id, flags, sdcs: body[12..12 + length].to_vec() })
    }
}
impl AttachBufferInlineRequest {
    pub const FIXED_SIZE: usize = 12;
}

// ---------------------------------------------------------------------------
// Commit and readiness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitRequest {
    pub id: u32,
}
impl Message for CommitRequest {
    const TYPE: u16 = 0x0006;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 4)?;
        Ok(Self { id: u32_at(body, 0) })
    }
}
impl CommitRequest {
    pub const SIZE: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCompleteEvent {
    pub id: u32,
    pub frame_number: u64,
    pub timestamp_ns: u64,
}
impl Message for FrameCompleteEvent {
    const TYPE: u16 = 0x8004;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.frame_number.to_le_bytes());
        out.extend_from_slice(&self.timestamp_ns.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 24)?;
        Ok(Self {
            id: u32_at(body, 0),
            frame_number: u64_at(body, 8),
            timestamp_ns: u64_at(body, 16),
        })
    }
}
impl FrameCompleteEvent {
    pub const SIZE: usize = 24;
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetVisibleRequest {
    pub id: u32,
    pub visible: bool,
}
impl Message for SetVisibleRequest {
    const TYPE: u16 = 0x0007;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&(self.visible as u32).to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 8)?;
        Ok(Self { id: u32_at(body, 0), visible: u32_at(body, 4) != 0 })
    }
}
impl SetVisibleRequest {
    pub const SIZE: usize = 8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetZOrderRequest {
    pub id: u32,
    pub z: i32,
}
impl Message for SetZOrderRequest {
    const TYPE: u16 = 0x0008;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&self.z.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 8)?;
        Ok(Self { id: u32_at(body, 0), z: i32_at(body, 4) })
    }
}
impl SetZOrderRequest {
    pub const SIZE: usize = 8;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetPositionRequest {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}
impl Message for SetPositionRequest {
    const TYPE: u16 = 0x0009;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 12)?;
        Ok(Self { id: u32_at(body, 0), x: f32_at(body, 4), y: f32_at(body, 8) })
    }
}
impl SetPositionRequest {
    pub const SIZE: usize = 12;
}

// ---------------------------------------------------------------------------
// Synchronization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    pub sync_id: u32,
}
impl Message for SyncRequest {
    const TYPE: u16 = 0x000A;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sync_id.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 4)?;
        Ok(Self { sync_id: u32_at(body, 0) })
    }
}
impl SyncRequest {
    pub const SIZE: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncDoneReply {
    pub sync_id: u32,
}
impl Message for SyncDoneReply {
    const TYPE: u16 = 0x8005;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sync_id.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 4)?;
        Ok(Self { sync_id: u32_at(body, 0) })
    }
}
impl SyncDoneReply {
    pub const SIZE: usize = 4;
}

// ---------------------------------------------------------------------------
// Input events (daemon -> client)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPressEvent {
    pub surface_id: u32,
    pub key_code: u32,
    pub modifiers: u32,
    pub pressed: bool,
}
impl Message for KeyPressEvent {
    const TYPE: u16 = 0x9001;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.surface_id.to_le_bytes());
        out.extend_from_slice(&self.key_code.to_le_bytes());
        out.extend_from_slice(&self.modifiers.to_le_bytes());
        out.extend_from_slice(&(self.pressed as u32).to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 16)?;
        Ok(Self {
            surface_id: u32_at(body, 0),
            key_code: u32_at(body, 4),
            modifiers: u32_at(body, 8),
            pressed: u32_at(body, 12) != 0,
        })
    }
}
impl KeyPressEvent {
    pub const SIZE: usize = 16;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEventMsg {
    pub surface_id: u32,
    pub x: f32,
    pub y: f32,
    pub button: u32,
    pub event_type: u32,
    pub modifiers: u32,
}
impl Message for MouseEventMsg {
    const TYPE: u16 = 0x9002;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.surface_id.to_le_bytes());
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.button.to_le_bytes());
        out.extend_from_slice(&self.event_type.to_le_bytes());
        out.extend_from_slice(&self.modifiers.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 24)?;
        Ok(Self {
            surface_id: u32_at(body, 0),
            x: f32_at(body, 4),
            y: f32_at(body, 8),
            button: u32_at(body, 12),
            event_type: u32_at(body, 16),
            modifiers: u32_at(body, 20),
        })
    }
}
impl MouseEventMsg {
    pub const SIZE: usize = 24;
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ClipboardSelection {
    Primary = 0,
    Clipboard = 1,
}
impl ClipboardSelection {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Primary),
            1 => Some(Self::Clipboard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardSetRequest {
    pub selection: u32,
    pub data: Vec<u8>,
}
impl Message for ClipboardSetRequest {
    const TYPE: u16 = 0x000B;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.selection.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.data);
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 8)?;
        let selection = u32_at(body, 0);
        let length = u32_at(body, 4) as usize;
        need(body, 8 + length)?;
        Ok(Self { selection, data: body[8..8 + length].to_vec() })
    }
}
impl ClipboardSetRequest {
    pub const FIXED_SIZE: usize = 8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardRequestRequest {
    pub selection: u32,
}
impl Message for ClipboardRequestRequest {
    const TYPE: u16 = 0x000C;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.selection.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 4)?;
        Ok(Self { selection: u32_at(body, 0) })
    }
}
impl ClipboardRequestRequest {
    pub const SIZE: usize = 4;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardDataReply {
    pub selection: u32,
    pub data: Vec<u8>,
}
impl Message for ClipboardDataReply {
    const TYPE: u16 = 0x8006;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.selection.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.data);
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 8)?;
        let selection = u32_at(body, 0);
        let length = u32_at(body, 4) as usize;
        need(body, 8 + length)?;
        Ok(Self { selection, data: body[8..8 + length].to_vec() })
    }
}
impl ClipboardDataReply {
    pub const FIXED_SIZE: usize = 8;
}

// ---------------------------------------------------------------------------
// Termination and generic error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectRequest;
impl Message for DisconnectRequest {
    const TYPE: u16 = 0x000D;
    fn encode_body(&self, _out: &mut Vec<u8>) {}
    fn decode_body(_body: &[u8]) -> Result<Self, IpcError> {
        Ok(Self)
    }
}
impl DisconnectRequest {
    pub const SIZE: usize = 0;
}

/// Generic failure reply carrying an [`crate::error::ErrorCode`] and an
/// opaque `context` (usually a surface or sync id, 0 when not applicable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReply {
    pub code: u16,
    pub context: u32,
}
impl Message for ErrorReply {
    const TYPE: u16 = 0x8003;
    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.code.to_le_bytes());
        out.extend_from_slice(&[0u8; 2]);
        out.extend_from_slice(&self.context.to_le_bytes());
    }
    fn decode_body(body: &[u8]) -> Result<Self, IpcError> {
        need(body, 8)?;
        Ok(Self { code: u16_at(body, 0), context: u32_at(body, 4) })
    }
}
impl ErrorReply {
    pub const SIZE: usize = 8;
}

/// Encode a full frame (8-byte header + body) for message `m`.
pub fn encode_frame<M: Message>(m: &M) -> Vec<u8> {
    let mut body = Vec::new();
    m.encode_body(&mut body);
    let mut out = Vec::with_capacity(crate::header::HEADER_BYTES + body.len());
    let header = crate::header::MsgHeader {
        msg_type: M::TYPE,
        flags: 0,
        length: body.len() as u32,
    };
    header.write_to(&mut out);
    out.extend_from_slice(&body);
    out
}

/// Decode a message of the expected concrete type from a full frame
/// (header + body). Returns [`IpcError::TypeMismatch`] if the header's type
/// tag does not match `M::TYPE`.
pub fn decode_frame<M: Message>(frame: &[u8]) -> Result<M, IpcError> {
    let header = crate::header::MsgHeader::read_from(frame)
        .ok_or(IpcError::Truncated { needed: crate::header::HEADER_BYTES, got: frame.len() })?;
    if header.msg_type != M::TYPE {
        return Err(IpcError::TypeMismatch);
    }
    let body_start = crate::header::HEADER_BYTES;
    let body_end = body_start + header.length as usize;
    if frame.len() < body_end {
        return Err(IpcError::Truncated { needed: body_end, got: frame.len() });
    }
    M::decode_body(&frame[body_start..body_end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<M: Message + std::fmt::Debug + PartialEq + Clone>(m: M) {
        let frame = encode_frame(&m);
        let mut body = Vec::new();
        m.encode_body(&mut body);
        assert_eq!(frame.len(), crate::header::HEADER_BYTES + body.len());
        let back: M = decode_frame(&frame).expect("decode");
        assert_eq!(m, back);
    }

    #[test]
    fn hello_round_trips() {
        round_trip(HelloRequest { version_major: 0, version_minor: 1, client_flags: 0 });
        round_trip(HelloReply { version_major: 0, version_minor: 1, client_id: 1, server_flags: 0 });
    }

    #[test]
    fn surface_lifecycle_round_trips() {
        round_trip(CreateSurfaceRequest { width: 400, height: 300, scale: 1.0, flags: 0 });
        round_trip(SurfaceCreatedReply { id: 1 });
        round_trip(DestroySurfaceRequest { id: 1 });
    }

    #[test]
    fn inline_buffer_round_trips_with_payload() {
        let m = AttachBufferInlineRequest { id: 1, flags: 0, sdcs: vec![1, 2, 3, 4, 5, 6, 7, 8] };
        round_trip(m);
    }

    #[test]
    fn clipboard_round_trips_with_payload() {
        round_trip(ClipboardSetRequest { selection: 0, data: b"hello".to_vec() });
        round_trip(ClipboardDataReply { selection: 0, data: b"hello".to_vec() });
    }

    #[test]
    fn error_reply_round_trips() {
        round_trip(ErrorReply { code: crate::error::ErrorCode::PermissionDenied as u16, context: 7 });
    }

    #[test]
    fn frame_complete_round_trips() {
        round_trip(FrameCompleteEvent { id: 1, frame_number: 1, timestamp_ns: 12345 });
    }

    #[test]
    fn type_mismatch_rejected() {
        let frame = encode_frame(&CommitRequest { id: 1 });
        let err = decode_frame::<SyncRequest>(&frame).unwrap_err();
        assert_eq!(err, IpcError::TypeMismatch);
    }

    #[test]
    fn truncated_body_rejected() {
        let mut frame = encode_frame(&CreateSurfaceRequest { width: 1, height: 1, scale: 1.0, flags: 0 });
        frame.truncate(frame.len() - 1);
        assert!(decode_frame::<CreateSurfaceRequest>(&frame).is_err());
    }
}
