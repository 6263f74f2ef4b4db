//! Frame clock
//!
//! Delta and elapsed time derived from the timestamps the platform hands
//! to each frame callback.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since the first frame
    pub elapsed: f32,
    /// Platform timestamp of this frame
    pub timestamp: Duration,
}

/// Frame clock fed by platform timestamps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    start: Option<Duration>,
    last: Option<Duration>,
    frame: u64,
    /// Clamp on delta so a stalled loop doesn't teleport animations
    max_delta: Option<Duration>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = Some(max_delta);
        self
    }

    /// Advance to `timestamp`. Timestamps going backwards yield a zero delta.
    pub fn tick(&mut self, timestamp: Duration) -> FrameTime {
        let start = *self.start.get_or_insert(timestamp);
        let mut delta = self
            .last
            .map(|last| timestamp.saturating_sub(last))
            .unwrap_or(Duration::ZERO);
        if let Some(max) = self.max_delta {
            delta = delta.min(max);
        }
        self.last = Some(timestamp.max(self.last.unwrap_or(timestamp)));
        self.frame += 1;

        FrameTime {
            frame: self.frame,
            delta: delta.as_secs_f32(),
            elapsed: timestamp.saturating_sub(start).as_secs_f32(),
            timestamp,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Forget all history; the next tick becomes the first frame
    pub fn reset(&mut self) {
        self.start = None;
        self.last = None;
        self.frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_has_zero_delta() {
        let mut clock = FrameClock::new();
        let t = clock.tick(Duration::from_millis(500));
        assert_eq!(t.frame, 1);
        assert_eq!(t.delta, 0.0);
        assert_eq!(t.elapsed, 0.0);
    }

    #[test]
    fn test_delta_and_elapsed() {
        let mut clock = FrameClock::new();
        clock.tick(Duration::from_millis(100));
        clock.tick(Duration::from_millis(116));
        let t = clock.tick(Duration::from_millis(150));
        assert!((t.delta - 0.034).abs() < 1e-6);
        assert!((t.elapsed - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_backwards_timestamp() {
        let mut clock = FrameClock::new();
        clock.tick(Duration::from_millis(100));
        let t = clock.tick(Duration::from_millis(90));
        assert_eq!(t.delta, 0.0);
    }

    #[test]
    fn test_max_delta_clamps() {
        let mut clock = FrameClock::new().with_max_delta(Duration::from_millis(100));
        clock.tick(Duration::ZERO);
        let t = clock.tick(Duration::from_secs(5));
        assert!((t.delta - 0.1).abs() < 1e-6);
        assert_eq!(t.elapsed, 5.0);
    }
}
