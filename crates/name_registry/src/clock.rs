//! Clock collaborator

use crate::types::ClockTick;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Monotonic tick source (block height or similar).
pub trait Clock: Send + Sync {
    fn now(&self) -> ClockTick;
}

/// Externally driven clock, advanced by the host as ticks are produced.
#[derive(Debug, Default)]
pub struct ManualClock {
    tick: AtomicU64,
}

impl ManualClock {
    pub fn new(start: ClockTick) -> Self {
        Self {
            tick: AtomicU64::new(start),
        }
    }

    /// Move the clock forward by `delta` ticks, returning the new tick.
    /// Saturates at `u64::MAX`.
    pub fn advance(&self, delta: u64) -> ClockTick {
        let previous = self
            .tick
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(delta))
            })
            .unwrap_or_else(|t| t);
        previous.saturating_add(delta)
    }

    /// Jump to `tick`. Moving backwards is refused.
    pub fn set(&self, tick: ClockTick) -> bool {
        let previous = self.tick.fetch_max(tick, Ordering::SeqCst);
        if tick < previous {
            warn!(
                target: "name_registry",
                "Refusing to move clock backwards from {} to {}",
                previous,
                tick
            );
            return false;
        }
        true
    }
}

impl Clock for ManualClock {
    fn now(&self) -> ClockTick {
        self.tick.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.advance(5), 15);
        assert!(clock.set(20));
        assert!(!clock.set(3));
        assert_eq!(clock.now(), 20);
    }

    #[test]
    fn advance_saturates_instead_of_wrapping() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.advance(u64::MAX), u64::MAX);
        assert_eq!(clock.now(), u64::MAX);
        assert_eq!(clock.advance(5), u64::MAX);
        assert_eq!(clock.now(), u64::MAX);
    }
}
