//! Interval timers
//!
//! The host loop owns the clock. A timer only remembers when it is next due
//! and is polled with the current loop time, so starting, stopping and firing
//! all happen on the loop's thread in run-to-completion order.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

static TIMER_HANDLE_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Handle of a running interval. Never zero; a stopped timer has no handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(NonZeroU32);

impl TimerHandle {
    fn allocate() -> Self {
        let raw = TIMER_HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed).max(1);
        // max(1) above keeps this non-zero even after wrap-around
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    pub fn raw(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Repeating timer polled by the host loop
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    handle: Option<TimerHandle>,
    next_due: Duration,
    fired: u64,
}

impl IntervalTimer {
    /// Create a stopped timer with the given period
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
            next_due: Duration::ZERO,
            fired: 0,
        }
    }

    /// Create a stopped timer firing `hz` times per second
    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz.max(1) as f64))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the timer. A running timer keeps its handle and schedule.
    pub fn start(&mut self, now: Duration) -> TimerHandle {
        if let Some(handle) = self.handle {
            return handle;
        }
        let handle = TimerHandle::allocate();
        self.handle = Some(handle);
        self.next_due = now + self.period;
        handle
    }

    /// Stop the timer. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        self.handle.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.handle
    }

    /// Raw handle value, 0 when stopped
    pub fn raw_handle(&self) -> u32 {
        self.handle.map(|h| h.raw()).unwrap_or(0)
    }

    /// Total number of times this timer has fired
    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    /// Poll the timer. Returns true at most once per call when a period has
    /// elapsed; missed periods are coalesced instead of replayed.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.handle.is_none() || now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
        self.fired += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let mut timer = IntervalTimer::from_hz(24);
        assert!(!timer.poll(ms(1000)));
        assert_eq!(timer.raw_handle(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut timer = IntervalTimer::from_hz(24);
        let first = timer.start(ms(0));
        let second = timer.start(ms(10));
        assert_eq!(first, second);
        assert_ne!(timer.raw_handle(), 0);
    }

    #[test]
    fn test_fires_once_per_period() {
        let mut timer = IntervalTimer::new(ms(40));
        timer.start(ms(0));
        assert!(!timer.poll(ms(20)));
        assert!(timer.poll(ms(40)));
        assert!(!timer.poll(ms(50)));
        assert!(timer.poll(ms(80)));
        assert_eq!(timer.fired_count(), 2);
    }

    #[test]
    fn test_missed_periods_coalesce() {
        let mut timer = IntervalTimer::new(ms(40));
        timer.start(ms(0));
        assert!(timer.poll(ms(500)));
        assert!(!timer.poll(ms(510)));
        assert!(timer.poll(ms(540)));
    }

    #[test]
    fn test_stop_resets_handle() {
        let mut timer = IntervalTimer::from_hz(24);
        timer.start(ms(0));
        assert!(timer.stop());
        assert!(!timer.stop());
        assert_eq!(timer.raw_handle(), 0);
        assert!(!timer.poll(ms(1000)));
    }
}
