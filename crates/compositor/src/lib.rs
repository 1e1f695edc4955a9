//! Per-output composition pipeline (spec.md §4.8): wires the frame
//! scheduler, damage tracker, and surface registry together and drives an
//! opaque [`RasterBackend`].

pub mod backend;
pub mod error;
pub mod orchestrator;

pub use backend::{
    FramebufferDesc, KeyEvent, MouseEvent, NullBackend, PixelFormat, RasterBackend,
    RenderOutcome, RenderRequest,
};
pub use error::CompositorError;
pub use orchestrator::{Compositor, CompositeResult};

#[cfg(test)]
mod tests {
    use super::*;
    use semadraw_registry::{Buffer, SurfaceRegistry};

    fn desc() -> FramebufferDesc {
        FramebufferDesc { width: 64, height: 64, refresh_hz: 60, pixel_format: PixelFormat::Rgba8 }
    }

    fn clear() -> semadraw_sdcs::types::Color {
        semadraw_sdcs::types::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }
    }

    #[test]
    fn composite_renders_visible_committed_surfaces_and_clears_damage() {
        let mut registry = SurfaceRegistry::new();
        let id = registry.create_surface(1, 10, 10);
        registry.attach_buffer(id, 1, Buffer::inline(vec![0u8; 16])).unwrap();
        registry.commit(id, 1).unwrap();
        registry.set_visible(id, 1, true).unwrap();

        let backend = NullBackend::new();
        let mut compositor = Compositor::new(desc(), backend, 0, clear());
        compositor.start();
        compositor.damage_mut().set_full_repaint();

        assert!(compositor.needs_composite(&registry, u64::MAX));
        let result = compositor.composite(&mut registry, u64::MAX);
        assert_eq!(result.surfaces_rendered, 1);
        assert_eq!(result.frame_number, 1);
        assert!(!compositor.damage_mut().full_repaint());
        assert!(compositor.backend_mut().calls.contains(&"render"));
    }

    #[test]
    fn composite_skips_invisible_or_uncommitted_surfaces() {
        let mut registry = SurfaceRegistry::new();
        let invisible = registry.create_surface(1, 10, 10);
        registry.attach_buffer(invisible, 1, Buffer::inline(vec![0u8; 16])).unwrap();
        registry.commit(invisible, 1).unwrap();
        // not set_visible -> stays false

        let uncommitted = registry.create_surface(1, 10, 10);
        registry.set_visible(uncommitted, 1, true).unwrap();

        let backend = NullBackend::new();
        let mut compositor = Compositor::new(desc(), backend, 0, clear());
        compositor.start();
        compositor.damage_mut().set_full_repaint();

        let result = compositor.composite(&mut registry, u64::MAX);
        assert_eq!(result.surfaces_rendered, 0);
    }

    #[test]
    fn needs_composite_false_before_deadline() {
        let registry = SurfaceRegistry::new();
        let backend = NullBackend::new();
        let mut compositor = Compositor::new(desc(), backend, 0, clear());
        compositor.start();
        compositor.damage_mut().set_full_repaint();
        assert!(!compositor.needs_composite(&registry, 0));
    }
}
