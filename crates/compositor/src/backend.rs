//! The backend contract (spec.md §4.8): an opaque rasterization target the
//! orchestrator drives but never branches on the identity of. Concrete
//! backends (software, KMS, X11, Vulkan, Wayland, headless) are external
//! collaborators; this crate only defines the trait and a [`NullBackend`]
//! used by its own tests.

use semadraw_sdcs::types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferDesc {
    pub width: u32,
    pub height: u32,
    pub refresh_hz: u32,
    pub pixel_format: PixelFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: u32,
    pub modifiers: u32,
    pub pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub x: f32,
    pub y: f32,
    pub button: u32,
    pub event_type: u32,
    pub modifiers: u32,
}

/// One surface's contribution to a composition pass.
pub struct RenderRequest<'a> {
    pub surface_id: u32,
    pub sdcs: &'a [u8],
    pub framebuffer: FramebufferDesc,
    pub clear_color: Option<Color>,
    pub offset: (f32, f32),
}

#[derive(Debug, Clone, Default)]
pub struct RenderOutcome {
    pub render_time_ns: u64,
    pub error_msg: Option<String>,
}

/// Backend contract (spec.md §4.8). Any implementation satisfying this trait
/// is acceptable to [`crate::orchestrator::Compositor`]; concrete
/// rasterization backends are out of this crate's scope.
pub trait RasterBackend {
    fn init_framebuffer(&mut self, desc: FramebufferDesc);
    fn render(&mut self, request: RenderRequest<'_>) -> RenderOutcome;
    fn get_pixels(&self) -> &[u8];
    /// Returns `false` to signal a host-requested shutdown.
    fn poll_events(&mut self) -> bool;
    fn get_key_events(&mut self) -> Vec<KeyEvent>;
    fn get_mouse_events(&mut self) -> Vec<MouseEvent>;
    fn deinit(&mut self);
}

/// Reference backend that renders nothing and records every call it
/// receives. Used by this crate's own unit tests; not a deliverable
/// rasterization backend.
#[derive(Debug, Default)]
pub struct NullBackend {
    pub calls: Vec<&'static str>,
    pixels: Vec<u8>,
    pub shutdown_requested: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }
}

impl RasterBackend for NullBackend {
    fn init_framebuffer(&mut self, desc: FramebufferDesc) {
        self.calls.push("init_framebuffer");
        self.pixels = vec![0u8; (desc.width * desc.height * 4) as usize];
    }

    fn render(&mut self, _request: RenderRequest<'_>) -> RenderOutcome {
        self.calls.push("render");
        RenderOutcome::default()
    }

    fn get_pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn poll_events(&mut self) -> bool {
        self.calls.push("poll_events");
        !self.shutdown_requested
    }

    fn get_key_events(&mut self) -> Vec<KeyEvent> {
        Vec::new()
    }

    fn get_mouse_events(&mut self) -> Vec<MouseEvent> {
        Vec::new()
    }

    fn deinit(&mut self) {
        self.calls.push("deinit");
    }
}
