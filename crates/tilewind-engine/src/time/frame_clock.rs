use std::time::{Duration, Instant};

/// Per-frame payload handed to frame hooks.
///
/// Built fresh for every hook round and never retained by the loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameArgs {
    /// Seconds elapsed since the previous collection.
    pub delta_time: f32,

    /// Zero-based index of the loop iteration producing these args.
    pub frame: u64,
}

/// Window loop clock.
///
/// Delta time is clamped so a debugger pause or a long stall does not hand
/// hooks a multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frames: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Clock clamped to `[100µs, 250ms]`.
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frames: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts the baseline and the iteration count.
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.frames = 0;
    }

    /// Counts a new loop iteration and returns its zero-based index.
    pub fn begin_frame(&mut self) -> u64 {
        let index = self.frames;
        self.frames = self.frames.wrapping_add(1);
        index
    }

    /// Iterations begun since the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds since the previous lap, clamped.
    pub fn lap(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;
        dt.as_secs_f32()
    }

    /// Collects args for a hook round of iteration `frame`.
    pub fn collect(&mut self, frame: u64) -> FrameArgs {
        FrameArgs {
            delta_time: self.lap(),
            frame,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lap_is_clamped() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(5), Duration::from_millis(10));
        let dt = clock.lap();
        assert!(dt >= 0.005 && dt <= 0.010, "dt = {dt}");
    }

    #[test]
    fn reset_restarts_frame_count() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.begin_frame(), 0);
        assert_eq!(clock.begin_frame(), 1);
        clock.reset();
        assert_eq!(clock.frames(), 0);
        assert_eq!(clock.begin_frame(), 0);
    }

    #[test]
    fn collect_tags_frame() {
        let mut clock = FrameClock::new();
        let args = clock.collect(7);
        assert_eq!(args.frame, 7);
        assert!(args.delta_time > 0.0);
    }
}
