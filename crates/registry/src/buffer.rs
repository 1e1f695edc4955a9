use std::fmt;
use std::sync::Arc;

/// Unifies inline and descriptor-mapped SDCS storage behind one read-only
/// view (spec.md §9, "inline vs fd-passed buffers"). Acquisition differs —
/// holding an allocation versus a read-only mapping — but composition only
/// ever needs a byte slice.
pub trait BufferBytes: fmt::Debug + Send + Sync {
    fn as_bytes(&self) -> &[u8];
}

#[derive(Debug)]
pub struct InlineBytes(pub Vec<u8>);

impl BufferBytes for InlineBytes {
    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A committed or pending SDCS buffer attached to a surface. `bytes` is
/// reference-counted so a buffer can be swapped out of `pending` without
/// cloning the underlying storage.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub bytes: Arc<dyn BufferBytes>,
}

impl Buffer {
    pub fn inline(bytes: Vec<u8>) -> Self {
        Self { bytes: Arc::new(InlineBytes(bytes)) }
    }

    pub fn from_bytes(bytes: Arc<dyn BufferBytes>) -> Self {
        Self { bytes }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
