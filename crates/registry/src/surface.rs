use crate::buffer::Buffer;

/// A client-owned rectangle of drawable content (spec.md §3, §4.5). Public
/// fields: callers read positioning/visibility directly rather than through
/// accessors, matching this workspace's preference for transparent DTOs.
#[derive(Debug)]
pub struct Surface {
    pub id: u32,
    pub owner: u32,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub z_order: i32,
    pub x: f32,
    pub y: f32,
    pub pending: Option<Buffer>,
    pub current: Option<Buffer>,
    pub frame_number: u64,
}

impl Surface {
    pub(crate) fn new(id: u32, owner: u32, width: u32, height: u32) -> Self {
        Self {
            id,
            owner,
            width,
            height,
            visible: false,
            z_order: 0,
            x: 0.0,
            y: 0.0,
            pending: None,
            current: None,
            frame_number: 0,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_renderable(&self) -> bool {
        self.visible && self.current.is_some()
    }
}
