use std::collections::HashMap;

use crate::rect::Rect;

/// Above this many tracked rectangles a surface is promoted to full damage
/// rather than continuing to accumulate fine-grained regions (spec.md §4.6).
pub const OVERFLOW_THRESHOLD: usize = 32;

#[derive(Debug, Default)]
struct SurfaceDamage {
    rects: Vec<Rect>,
    full_damage: bool,
}

impl SurfaceDamage {
    fn add_region(&mut self, rect: Rect) {
        if self.full_damage || rect.is_empty() {
            return;
        }
        for existing in self.rects.iter_mut() {
            let merged = existing.union_with(&rect);
            if merged.area() <= existing.area() + rect.area() {
                *existing = merged;
                return;
            }
        }
        self.rects.push(rect);
        if self.rects.len() > OVERFLOW_THRESHOLD {
            self.full_damage = true;
            self.rects.clear();
        }
    }

    fn has_damage(&self) -> bool {
        self.full_damage || !self.rects.is_empty()
    }

    fn clear(&mut self) {
        self.rects.clear();
        self.full_damage = false;
    }
}

/// Tracks damage per surface plus one output-level full-repaint flag
/// (spec.md §4.6). Not thread-safe; mutated from the single daemon event
/// loop thread.
#[derive(Debug, Default)]
pub struct DamageTracker {
    surfaces: HashMap<u32, SurfaceDamage>,
    full_repaint: bool,
    frame: u64,
}

impl DamageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook matching the compositor's per-pass lifecycle (spec.md §4.8 step
    /// 2); advances the internal frame counter used for diagnostics.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    pub fn add_region(&mut self, surface: u32, rect: Rect, _frame: u64) {
        self.surfaces.entry(surface).or_default().add_region(rect);
    }

    pub fn set_full_repaint(&mut self) {
        self.full_repaint = true;
    }

    pub fn full_repaint(&self) -> bool {
        self.full_repaint
    }

    pub fn has_damage(&self, surface: u32) -> bool {
        self.full_repaint || self.surfaces.get(&surface).is_some_and(SurfaceDamage::has_damage)
    }

    /// Clears one surface's damage after it renders successfully within the
    /// current pass (spec.md §4.8 step 6).
    pub fn clear_surface(&mut self, surface: u32) {
        if let Some(d) = self.surfaces.get_mut(&surface) {
            d.clear();
        }
    }

    /// Clears every surface's damage and the output-level full-repaint flag
    /// once a pass completes (spec.md §4.8 step 7), restoring the tracker to
    /// a state indistinguishable from a fresh one (spec.md §8, "damage
    /// convergence").
    pub fn clear_all(&mut self) {
        for d in self.surfaces.values_mut() {
            d.clear();
        }
        self.full_repaint = false;
    }

    pub fn remove_surface(&mut self, surface: u32) {
        self.surfaces.remove(&surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_regions_merge_without_growing_past_sum() {
        let mut t = DamageTracker::new();
        t.add_region(1, Rect::new(0, 0, 10, 10), 1);
        t.add_region(1, Rect::new(10, 0, 10, 10), 1);
        assert!(t.has_damage(1));
    }

    #[test]
    fn overflow_promotes_full_damage() {
        let mut t = DamageTracker::new();
        for i in 0..40 {
            t.add_region(1, Rect::new(i * 100, i * 100, 1, 1), 1);
        }
        assert!(t.has_damage(1));
        let d = t.surfaces.get(&1).unwrap();
        assert!(d.full_damage);
        assert!(d.rects.is_empty());
    }

    #[test]
    fn clear_all_returns_to_fresh_state() {
        let mut t = DamageTracker::new();
        t.add_region(1, Rect::new(0, 0, 5, 5), 1);
        t.set_full_repaint();
        t.clear_all();
        assert!(!t.full_repaint());
        assert!(!t.has_damage(1));
    }

    #[test]
    fn full_repaint_forces_damage_on_every_surface() {
        let mut t = DamageTracker::new();
        t.set_full_repaint();
        assert!(t.has_damage(42));
    }
}
