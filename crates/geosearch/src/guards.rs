//! Re-entrancy guards for host-signal handling.
//!
//! Host calls can synchronously re-dispatch the event loop, so signal
//! handlers may run while an apply is still in progress. Instead of bare
//! boolean flags these guards are scoped acquisitions: entering returns a
//! pass that releases the guard on drop, so every exit path (early
//! return, error, panic unwind) clears the flag.

use std::{
    cell::Cell,
    time::{Duration, Instant},
};

/// A single-flight flag with scoped acquisition.
#[derive(Debug, Default)]
pub struct ReentryGuard {
    /// Whether a pass is currently held.
    active: Cell<bool>,
}

impl ReentryGuard {
    /// Creates a released guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the guard; `None` when it is already held (the re-entrant
    /// caller should back off).
    pub fn try_enter(&self) -> Option<ReentryPass<'_>> {
        if self.active.get() {
            return None;
        }
        self.active.set(true);
        Some(ReentryPass { guard: self })
    }

    /// Whether a pass is currently held.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Held acquisition of a [`ReentryGuard`]; releases on drop.
#[derive(Debug)]
pub struct ReentryPass<'a> {
    /// The guard to release.
    guard: &'a ReentryGuard,
}

impl Drop for ReentryPass<'_> {
    fn drop(&mut self) {
        self.guard.active.set(false);
    }
}

/// Rate limiter for repeated warnings: allows one event per interval.
#[derive(Debug)]
pub struct WarnLimiter {
    /// Minimum spacing between allowed events.
    interval: Duration,
    /// Time of the last allowed event.
    last: Cell<Option<Instant>>,
}

impl WarnLimiter {
    /// Creates a limiter allowing one event per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Cell::new(None),
        }
    }

    /// Whether an event may fire now; firing stamps the limiter.
    pub fn allow(&self, now: Instant) -> bool {
        match self.last.get() {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last.set(Some(now));
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_single_flight() {
        let guard = ReentryGuard::new();
        let pass = guard.try_enter().unwrap();
        assert!(guard.is_active());
        assert!(guard.try_enter().is_none());
        drop(pass);
        assert!(!guard.is_active());
        assert!(guard.try_enter().is_some());
    }

    #[test]
    fn test_guard_released_on_unwind() {
        let guard = ReentryGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pass = guard.try_enter().unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!guard.is_active());
    }

    #[test]
    fn test_warn_limiter_one_per_interval() {
        let limiter = WarnLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        assert!(limiter.allow(start));
        assert!(!limiter.allow(start + Duration::from_millis(500)));
        assert!(limiter.allow(start + Duration::from_millis(1500)));
    }
}
