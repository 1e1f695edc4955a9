use semadraw_damage::DamageTracker;
use semadraw_registry::SurfaceRegistry;
use semadraw_scheduler::FrameScheduler;
use semadraw_sdcs::types::Color;

use crate::backend::{FramebufferDesc, RasterBackend, RenderRequest};

/// Result of one composition pass (spec.md §4.8 step 7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeResult {
    pub frame_number: u64,
    pub surfaces_rendered: u32,
    pub total_render_time_ns: u64,
    pub frame_time_ns: u64,
}

/// Per-output pipeline: scheduler + damage tracker driving an opaque
/// [`RasterBackend`] (spec.md §4.8).
pub struct Compositor<B: RasterBackend> {
    desc: FramebufferDesc,
    backend: B,
    scheduler: FrameScheduler,
    damage: DamageTracker,
    background_clear: Color,
    frame_counter: u64,
    started: bool,
}

impl<B: RasterBackend> Compositor<B> {
    pub fn new(desc: FramebufferDesc, mut backend: B, now_ns: u64, background_clear: Color) -> Self {
        backend.init_framebuffer(desc);
        Self {
            desc,
            backend,
            scheduler: FrameScheduler::new(desc.refresh_hz, now_ns),
            damage: DamageTracker::new(),
            background_clear,
            frame_counter: 0,
            started: false,
        }
    }

    pub fn damage_mut(&mut self) -> &mut DamageTracker {
        &mut self.damage
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    /// True iff this output exists (the compositor has been started), damage
    /// is present somewhere, and the scheduler's deadline has passed
    /// (spec.md §4.8).
    pub fn needs_composite(&self, registry: &SurfaceRegistry, now_ns: u64) -> bool {
        self.started
            && self.scheduler.should_composite(now_ns)
            && (self.damage.full_repaint()
                || registry.iter().any(|s| self.damage.has_damage(s.id)))
    }

    /// Ids of the surfaces [`Self::composite`] will actually attempt to
    /// render right now, using the same predicate as its render loop. Lets a
    /// caller snapshot "who's about to render" before the pass mutates
    /// damage state, e.g. to know which clients to notify with
    /// `frame_complete` afterwards.
    pub fn surfaces_to_render(&self, registry: &SurfaceRegistry) -> Vec<u32> {
        let full_repaint = self.damage.full_repaint();
        registry
            .iter()
            .filter(|s| s.is_renderable() && (full_repaint || self.damage.has_damage(s.id)))
            .map(|s| s.id)
            .collect()
    }

    /// Runs the seven-step composition pass described in spec.md §4.8.
    pub fn composite(&mut self, registry: &mut SurfaceRegistry, now_ns: u64) -> CompositeResult {
        self.scheduler.begin_frame(now_ns);
        self.damage.begin_frame();

        let full_repaint = self.damage.full_repaint();
        let mut surfaces_rendered = 0u32;
        let mut total_render_time_ns = 0u64;
        let mut first_rendered = true;

        {
            let guard = registry.begin_composition();
            for surface in guard.composition_order() {
                if !surface.is_renderable() {
                    continue;
                }
                if !(full_repaint || self.damage.has_damage(surface.id)) {
                    continue;
                }
                let Some(current) = surface.current.as_ref() else { continue };
                let clear_color = if first_rendered && full_repaint { Some(self.background_clear) } else { None };
                let request = RenderRequest {
                    surface_id: surface.id,
                    sdcs: current.as_slice(),
                    framebuffer: self.desc,
                    clear_color,
                    offset: (surface.x, surface.y),
                };
                let outcome = self.backend.render(request);
                if let Some(msg) = &outcome.error_msg {
                    tracing::warn!(target: "compositor", surface = surface.id, error = %msg, "render_failed");
                    // Damage is preserved so the next pass retries.
                    continue;
                }
                total_render_time_ns += outcome.render_time_ns;
                surfaces_rendered += 1;
                first_rendered = false;
                self.damage.clear_surface(surface.id);
            }
        }

        self.damage.clear_all();
        self.frame_counter += 1;
        let stats_before = self.scheduler.end(now_ns);
        let frame_time_ns = stats_before.last_duration_ns;

        CompositeResult {
            frame_number: self.frame_counter,
            surfaces_rendered,
            total_render_time_ns,
            frame_time_ns,
        }
    }
}
