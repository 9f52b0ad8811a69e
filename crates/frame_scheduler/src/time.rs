//! Frame timing

use std::time::Instant;

/// Timing of one frame, in milliseconds
///
/// Before the first frame both timestamps are `-1` and the delta is `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDetail {
    /// Timestamp of this frame
    pub current_time: f64,
    /// Timestamp of the previous frame
    pub prev_time: f64,
    /// Milliseconds since the previous frame
    pub delta_time: f64,
}

impl Default for FrameDetail {
    fn default() -> Self {
        Self {
            current_time: -1.0,
            prev_time: -1.0,
            delta_time: 0.0,
        }
    }
}

impl FrameDetail {
    /// Detail of the frame that follows this one at `now` milliseconds
    ///
    /// The very first frame reports a zero delta.
    pub fn next(&self, now: f64) -> Self {
        let delta_time = if self.current_time < 0.0 {
            0.0
        } else {
            now - self.current_time
        };
        Self {
            current_time: now,
            prev_time: self.current_time,
            delta_time,
        }
    }

    /// Delta in seconds
    pub fn delta_secs(&self) -> f64 {
        self.delta_time / 1000.0
    }
}

/// Monotonic clock producing a [`FrameDetail`] per tick
pub struct FrameClock {
    start: Instant,
    detail: FrameDetail,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Start a clock; time zero is now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            detail: FrameDetail::default(),
            frame_count: 0,
        }
    }

    /// Advance to a new frame (should be called once per frame)
    pub fn tick(&mut self) -> FrameDetail {
        let now = self.start.elapsed().as_secs_f64() * 1000.0;
        self.advance_to(now)
    }

    fn advance_to(&mut self, now: f64) -> FrameDetail {
        self.detail = self.detail.next(now);
        self.frame_count += 1;
        self.detail
    }

    /// Detail of the latest frame
    pub fn detail(&self) -> FrameDetail {
        self.detail
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS since the first frame
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f64 {
        if self.frame_count > 1 && self.detail.current_time > 0.0 {
            (self.frame_count - 1) as f64 * 1000.0 / self.detail.current_time
        } else {
            0.0
        }
    }

    /// FPS based on the last frame's delta
    pub fn current_fps(&self) -> f64 {
        if self.detail.delta_time > 0.0 {
            1000.0 / self.detail.delta_time
        } else {
            0.0
        }
    }
}
