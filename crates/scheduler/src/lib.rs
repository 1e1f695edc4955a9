//! Fixed-rate frame scheduler with drift recovery and adaptive Hz tuning
//! (spec.md §4.7). Time is supplied by the caller as a monotonic nanosecond
//! count rather than read internally, so the scheduler stays deterministic
//! and testable without a fake clock.

const NANOS_PER_SEC: u64 = 1_000_000_000;
const TUNE_WINDOW_FRAMES: u32 = 60;
const TUNE_MISS_RATE_DECREASE: f64 = 0.10;
const TUNE_MISS_RATE_INCREASE: f64 = 0.02;
const TUNE_DECREASE_HZ: u32 = 10;
const TUNE_INCREASE_HZ: u32 = 5;
const EMA_ALPHA: f64 = 0.1;

/// Plain accumulator DTO; fields are public rather than hidden behind
/// accessors so callers can log or assert on them directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerStats {
    pub total_frames: u64,
    pub missed_frames: u64,
    pub last_duration_ns: u64,
    pub avg_duration_ns: f64,
    pub min_duration_ns: u64,
    pub max_duration_ns: u64,
}

impl Default for SchedulerStats {
    fn default() -> Self {
        Self {
            total_frames: 0,
            missed_frames: 0,
            last_duration_ns: 0,
            avg_duration_ns: 0.0,
            min_duration_ns: u64::MAX,
            max_duration_ns: 0,
        }
    }
}

impl SchedulerStats {
    pub fn miss_rate(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.missed_frames as f64 / self.total_frames as f64
        }
    }
}

fn interval_ns_for(hz: u32) -> u64 {
    NANOS_PER_SEC / hz as u64
}

/// Fixed-rate scheduler with adaptive Hz tuning (spec.md §4.7).
#[derive(Debug)]
pub struct FrameScheduler {
    target_hz: u32,
    min_hz: u32,
    max_hz: u32,
    interval_ns: u64,
    next_deadline_ns: u64,
    frame_start_ns: Option<u64>,
    stats: SchedulerStats,
    frames_since_tune: u32,
    misses_since_tune: u32,
}

impl FrameScheduler {
    pub fn new(target_hz: u32, now_ns: u64) -> Self {
        Self::with_bounds(target_hz, now_ns, 1, 240)
    }

    pub fn with_bounds(target_hz: u32, now_ns: u64, min_hz: u32, max_hz: u32) -> Self {
        let interval_ns = interval_ns_for(target_hz);
        Self {
            target_hz,
            min_hz,
            max_hz,
            interval_ns,
            next_deadline_ns: now_ns + interval_ns,
            frame_start_ns: None,
            stats: SchedulerStats::default(),
            frames_since_tune: 0,
            misses_since_tune: 0,
        }
    }

    pub fn target_hz(&self) -> u32 {
        self.target_hz
    }

    pub fn next_deadline_ns(&self) -> u64 {
        self.next_deadline_ns
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn should_composite(&self, now_ns: u64) -> bool {
        now_ns >= self.next_deadline_ns
    }

    pub fn begin_frame(&mut self, now_ns: u64) {
        self.frame_start_ns = Some(now_ns);
    }

    /// Records frame duration, updates stats, applies drift recovery, and
    /// every [`TUNE_WINDOW_FRAMES`] frames, retunes `target_hz`.
    pub fn end(&mut self, now_ns: u64) -> &SchedulerStats {
        let start = self.frame_start_ns.take().unwrap_or(now_ns);
        let duration = now_ns.saturating_sub(start);

        self.stats.total_frames += 1;
        self.stats.last_duration_ns = duration;
        self.stats.avg_duration_ns = if self.stats.total_frames == 1 {
            duration as f64
        } else {
            EMA_ALPHA * duration as f64 + (1.0 - EMA_ALPHA) * self.stats.avg_duration_ns
        };
        self.stats.min_duration_ns = self.stats.min_duration_ns.min(duration);
        self.stats.max_duration_ns = self.stats.max_duration_ns.max(duration);

        let missed = now_ns > self.next_deadline_ns + self.interval_ns / 2;
        if missed {
            self.stats.missed_frames += 1;
            self.misses_since_tune += 1;
            // Drift recovery: snap to the next boundary strictly greater than
            // `now_ns`, no debt accumulation.
            let mut next = self.next_deadline_ns + self.interval_ns;
            while next <= now_ns {
                next += self.interval_ns;
            }
            self.next_deadline_ns = next;
        } else {
            self.next_deadline_ns += self.interval_ns;
        }

        self.frames_since_tune += 1;
        if self.frames_since_tune >= TUNE_WINDOW_FRAMES {
            self.retune();
            self.frames_since_tune = 0;
            self.misses_since_tune = 0;
        }

        &self.stats
    }

    fn retune(&mut self) {
        let miss_rate = self.misses_since_tune as f64 / self.frames_since_tune as f64;
        if miss_rate > TUNE_MISS_RATE_DECREASE && self.target_hz > self.min_hz {
            let new_hz = self.target_hz.saturating_sub(TUNE_DECREASE_HZ).max(self.min_hz);
            self.set_target_hz(new_hz);
        } else if miss_rate < TUNE_MISS_RATE_INCREASE && self.target_hz < self.max_hz {
            let new_hz = (self.target_hz + TUNE_INCREASE_HZ).min(self.max_hz);
            self.set_target_hz(new_hz);
        }
    }

    fn set_target_hz(&mut self, hz: u32) {
        tracing::debug!(target: "scheduler", from = self.target_hz, to = hz, "adaptive_hz_retune");
        self.target_hz = hz;
        self.interval_ns = interval_ns_for(hz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_composite_only_at_or_past_deadline() {
        let s = FrameScheduler::new(60, 0);
        let interval = interval_ns_for(60);
        assert!(!s.should_composite(interval - 1));
        assert!(s.should_composite(interval));
    }

    #[test]
    fn deadline_advances_by_interval_on_time() {
        let mut s = FrameScheduler::new(60, 0);
        let interval = interval_ns_for(60);
        s.begin_frame(interval);
        let before = s.next_deadline_ns();
        s.end(interval + 1000);
        assert_eq!(s.next_deadline_ns(), before + interval);
        assert!(s.stats().missed_frames == 0);
    }

    #[test]
    fn ema_average_updates_after_first_frame() {
        let mut s = FrameScheduler::new(60, 0);
        s.begin_frame(0);
        s.end(1_000_000);
        assert_eq!(s.stats().avg_duration_ns, 1_000_000.0);
        s.begin_frame(1_000_000);
        s.end(3_000_000);
        // duration = 2_000_000; avg = 0.1*2_000_000 + 0.9*1_000_000 = 1_100_000
        assert_eq!(s.stats().avg_duration_ns, 1_100_000.0);
    }

    #[test]
    fn drift_recovery_snaps_past_debt() {
        let mut s = FrameScheduler::new(60, 0);
        let interval = interval_ns_for(60);
        s.begin_frame(0);
        // ends far past deadline + half interval
        let now = interval * 5;
        let before = s.next_deadline_ns();
        s.end(now);
        assert!(s.stats().missed_frames == 1);
        assert!(s.next_deadline_ns() > now);
        assert!(s.next_deadline_ns() > before);
    }

    #[test]
    fn adaptive_scheduler_decreases_hz_under_heavy_miss_rate() {
        let mut s = FrameScheduler::new(60, 0);
        let interval = interval_ns_for(60);
        let mut now = 0u64;
        for _ in 0..60 {
            s.begin_frame(now);
            // sleeps 25ms every frame at 60hz (~16.7ms interval) -> always misses
            now += 25_000_000;
            s.end(now);
        }
        assert!(s.stats().miss_rate() > 0.5);
        assert!(s.target_hz() <= 50);
        let _ = interval;
    }

    #[test]
    fn adaptive_scheduler_increases_hz_when_comfortably_on_time() {
        let mut s = FrameScheduler::with_bounds(60, 0, 30, 120);
        let interval = interval_ns_for(60);
        let mut now = 0u64;
        for _ in 0..60 {
            s.begin_frame(now);
            now += interval / 4;
            s.end(now);
            now += interval - interval / 4;
        }
        assert!(s.stats().miss_rate() < 0.02);
        assert!(s.target_hz() >= 65);
    }
}
