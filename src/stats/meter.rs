//! Frame rate telemetry

use std::time::Duration;

use tokio::time::Instant;

/// Shortest span a sample may cover by default
pub const DEFAULT_MIN_WINDOW: Duration = Duration::from_millis(500);

/// Instantaneous frames-per-second derived from a cumulative frame counter
///
/// Each sample compares the host's counter with the previous sample:
/// `(new - previous) * 1000 / elapsed_ms`. A sample taken less than
/// `min_window` after the previous one (or after the baseline) is skipped
/// and the previous rate is kept, so a tick landing just after a reset does
/// not divide a handful of frames by a few milliseconds.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    /// Counter value at the last sample
    total_frames: u64,
    /// Time of the last sample (None while not measuring)
    last_sample: Option<Instant>,
    /// Last computed rate
    fps: Option<u64>,
    min_window: Duration,
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::with_min_window(DEFAULT_MIN_WINDOW)
    }
}

impl FrameRateMeter {
    /// Create an idle meter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle meter that skips samples shorter than `min_window`
    pub fn with_min_window(min_window: Duration) -> Self {
        Self {
            total_frames: 0,
            last_sample: None,
            fps: None,
            min_window: min_window.max(Duration::from_millis(1)),
        }
    }

    pub fn min_window(&self) -> Duration {
        self.min_window
    }

    /// Start measuring from `baseline` frames at `now`, discarding any rate
    pub fn reset(&mut self, baseline: u64, now: Instant) {
        self.total_frames = baseline;
        self.last_sample = Some(now);
        self.fps = None;
    }

    /// Stop measuring and zero everything
    pub fn clear(&mut self) {
        *self = Self::with_min_window(self.min_window);
    }

    /// Record a counter reading
    ///
    /// Returns the new rate, or `None` if the sample was skipped.
    pub fn sample(&mut self, frames: u64, now: Instant) -> Option<u64> {
        let last = self.last_sample?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_window {
            return None;
        }
        let elapsed_ms = elapsed.as_millis() as u64;

        let fps = frames.saturating_sub(self.total_frames) * 1000 / elapsed_ms;
        self.total_frames = frames;
        self.last_sample = Some(now);
        self.fps = Some(fps);
        Some(fps)
    }

    /// Last computed rate
    pub fn fps(&self) -> Option<u64> {
        self.fps
    }

    /// Counter value at the last sample or reset
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Whether a baseline has been taken
    pub fn is_measuring(&self) -> bool {
        self.last_sample.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_rate_from_two_samples() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::new();
        meter.reset(100, t0);

        assert_eq!(meter.sample(130, t0 + Duration::from_millis(1000)), Some(30));
        assert_eq!(meter.fps(), Some(30));
        assert_eq!(meter.total_frames(), 130);
    }

    #[test]
    fn test_short_window_skipped_until_min_window() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::with_min_window(Duration::from_millis(500));
        meter.reset(100, t0);

        // 1 frame in 5ms would read as 200 fps
        assert_eq!(meter.sample(101, t0 + Duration::from_millis(5)), None);
        assert_eq!(meter.fps(), None);
        assert_eq!(meter.total_frames(), 100);

        assert_eq!(meter.sample(131, t0 + Duration::from_millis(1005)), Some(30));
    }

    #[test]
    fn test_clear_keeps_min_window() {
        let mut meter = FrameRateMeter::with_min_window(Duration::from_secs(2));
        meter.reset(0, Instant::now());
        meter.clear();
        assert_eq!(meter.min_window(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_elapsed_keeps_previous_rate() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::new();
        meter.reset(0, t0);

        let t1 = t0 + Duration::from_millis(1000);
        assert_eq!(meter.sample(60, t1), Some(60));

        // Same instant: no division, nothing changes
        assert_eq!(meter.sample(90, t1), None);
        assert_eq!(meter.fps(), Some(60));
        assert_eq!(meter.total_frames(), 60);
    }

    #[test]
    fn test_uneven_interval() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::new();
        meter.reset(0, t0);

        // 45 frames in 1.5s
        assert_eq!(meter.sample(45, t0 + Duration::from_millis(1500)), Some(30));
    }

    #[test]
    fn test_counter_regression_saturates() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::new();
        meter.reset(500, t0);

        assert_eq!(meter.sample(10, t0 + Duration::from_secs(1)), Some(0));
    }

    #[test]
    fn test_idle_meter_skips_samples() {
        let mut meter = FrameRateMeter::new();
        assert!(!meter.is_measuring());
        assert_eq!(meter.sample(100, Instant::now()), None);
        assert_eq!(meter.fps(), None);
    }

    #[test]
    fn test_clear() {
        let t0 = Instant::now();
        let mut meter = FrameRateMeter::new();
        meter.reset(10, t0);
        meter.sample(40, t0 + Duration::from_secs(1));

        meter.clear();

        assert_eq!(meter.total_frames(), 0);
        assert_eq!(meter.fps(), None);
        assert!(!meter.is_measuring());
    }
}
