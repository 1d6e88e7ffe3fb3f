//! Time sources for the sequencer.
//!
//! The sequencer never reads wall-clock time directly. It asks a [`Clock`]
//! for the number of milliseconds since the clock's origin, which lets
//! tests drive it with a [`ManualClock`] and the runtime with a
//! [`TokioClock`] (itself pausable under `tokio::time::pause`).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Upper bound on how far ahead [`TokioClock::instant_at`] reaches, roughly
/// thirty years. Saturated virtual deadlines map here.
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A monotonic millisecond time source.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds elapsed since the clock's origin.
    fn now_ms(&self) -> u64;
}

/// Virtual clock advanced explicitly by the caller.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the sequencer owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_add(ms))
            })
            .ok();
    }

    /// Sets the clock to `ms`. Moving backwards is ignored.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Clock backed by `tokio::time::Instant`, optionally sped up.
///
/// A speed of `2.0` makes one real second count as two virtual seconds.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: Instant,
    speed: f64,
}

impl TokioClock {
    /// Creates a real-time clock starting now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_speed(1.0)
    }

    /// Creates a clock running `speed` times faster than real time.
    ///
    /// Non-finite or non-positive speeds fall back to real time.
    #[must_use]
    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        Self {
            origin: Instant::now(),
            speed,
        }
    }

    /// Returns the tokio instant at which virtual time reaches `ms`.
    ///
    /// Rounded up, so `now_ms()` at that instant is never below `ms`.
    /// Deadlines further out than [`FAR_FUTURE`] are clamped to it.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    pub fn instant_at(&self, ms: u64) -> Instant {
        let offset = if self.speed == 1.0 {
            Duration::from_millis(ms)
        } else {
            let real_micros = (ms as f64 * 1000.0 / self.speed).ceil() as u64;
            Duration::from_micros(real_micros.saturating_add(1))
        };
        self.origin + offset.min(FAR_FUTURE)
    }

    /// Returns the playback speed multiplier.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    fn now_ms(&self) -> u64 {
        let elapsed = self.origin.elapsed();
        if self.speed == 1.0 {
            return u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        }
        (elapsed.as_secs_f64() * 1000.0 * self.speed) as u64
    }
}
