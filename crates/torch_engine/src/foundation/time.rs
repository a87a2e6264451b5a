//! Time management utilities
//!
//! The main loop reads time exclusively through the [`Clock`] trait so that
//! tests can drive it with a [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source in seconds
pub trait Clock {
    /// Seconds elapsed since an arbitrary fixed origin
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is "now"
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock
///
/// Clones share the same time value, so a test can keep one copy and hand the
/// other to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }

    /// Jump to an absolute time
    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Frame statistics
///
/// Fed by the engine once per rendered frame.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    delta_time: f32,
    total_time: f64,
    frame_count: u64,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame that took `delta` seconds
    pub fn record(&mut self, delta: f64) {
        self.delta_time = delta as f32;
        self.total_time += delta;
        self.frame_count += 1;
    }

    /// Duration of the last recorded frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Sum of all recorded frame durations
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS since the timer was created
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            (self.frame_count as f64 / self.total_time) as f32
        } else {
            0.0
        }
    }

    /// FPS derived from the last frame only
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

/// Simulation time seen by components during one update tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Fixed step length in seconds
    pub delta: f32,
    /// Simulated seconds since the loop started
    pub total: f64,
    /// Number of completed update ticks
    pub tick: u64,
}

impl FrameTime {
    /// Advance by one fixed step of `delta` seconds
    pub fn step(&mut self, delta: f64) {
        self.delta = delta as f32;
        self.total += delta;
        self.tick += 1;
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Elapsed time including the running segment
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Whether the stopwatch is running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let engine_side = clock.clone();

        clock.advance(0.25);
        clock.advance(0.25);
        assert_eq!(engine_side.now(), 0.5);

        engine_side.set(3.0);
        assert_eq!(clock.now(), 3.0);
    }

    #[test]
    fn test_timer_statistics() {
        let mut timer = Timer::new();
        assert_eq!(timer.average_fps(), 0.0);

        timer.record(0.5);
        timer.record(0.5);

        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.total_time(), 1.0);
        assert_eq!(timer.average_fps(), 2.0);
        assert_eq!(timer.current_fps(), 2.0);
    }

    #[test]
    fn test_frame_time_step() {
        let mut time = FrameTime::default();
        time.step(0.5);
        time.step(0.5);

        assert_eq!(time.tick, 2);
        assert_eq!(time.delta, 0.5);
        assert_eq!(time.total, 1.0);
    }

    #[test]
    fn test_stopwatch_stopped_does_not_advance() {
        let mut stopwatch = Stopwatch::start_new();
        assert!(stopwatch.is_running());
        stopwatch.stop();
        let frozen = stopwatch.elapsed();
        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), frozen);
    }
}
