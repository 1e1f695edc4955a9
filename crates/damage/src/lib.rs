//! Per-surface and per-output damage tracking (spec.md §4.6).

pub mod rect;
pub mod tracker;

pub use rect::Rect;
pub use tracker::{DamageTracker, OVERFLOW_THRESHOLD};
