//! Repeating refresh deadline polled from the event loop.

use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);

/// At most one pending deadline exists at any time, so restarting can never
/// leave two timers firing.
#[derive(Debug)]
pub struct RefreshTimer {
    interval: Duration,
    next_due: Option<Instant>,
    generation: u64,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            generation: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Bumped every time a new schedule replaces the previous one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
        self.generation += 1;
    }

    /// Returns whether a pending schedule was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    /// Cancel-and-reschedule with a new interval.
    pub fn restart(&mut self, interval: Duration, now: Instant) -> bool {
        let cancelled = self.cancel();
        self.interval = interval;
        self.start(now);
        cancelled
    }

    /// True once per elapsed interval. A late poll fires once and
    /// reschedules from `now` instead of firing a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        let next = due + self.interval;
        self.next_due = Some(if next <= now { now + self.interval } else { next });
        true
    }
}

impl Default for RefreshTimer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fires(timer: &mut RefreshTimer, start: Instant, secs: u64) -> usize {
        (1..=secs)
            .filter(|s| timer.poll(start + Duration::from_secs(*s)))
            .count()
    }

    #[test]
    fn not_running_until_started() {
        let mut t = RefreshTimer::default();
        assert!(!t.poll(Instant::now() + Duration::from_secs(60)));
        assert!(!t.cancel());
    }

    #[test]
    fn fires_once_per_interval() {
        let t0 = Instant::now();
        let mut t = RefreshTimer::new(Duration::from_secs(10));
        t.start(t0);
        assert_eq!(fires(&mut t, t0, 60), 6);
    }

    #[test]
    fn restart_replaces_exactly_one_schedule() {
        let t0 = Instant::now();
        let mut t = RefreshTimer::new(Duration::from_secs(10));
        t.start(t0);
        let gen = t.generation();
        assert!(t.restart(Duration::from_secs(5), t0));
        assert_eq!(t.generation(), gen + 1);
        assert_eq!(t.interval(), Duration::from_secs(5));
        // only the new 5s cadence is observed, no leftover 10s ticks
        assert_eq!(fires(&mut t, t0, 60), 12);
    }

    #[test]
    fn late_poll_does_not_burst() {
        let t0 = Instant::now();
        let mut t = RefreshTimer::new(Duration::from_secs(10));
        t.start(t0);
        assert!(t.poll(t0 + Duration::from_secs(95)));
        assert!(!t.poll(t0 + Duration::from_secs(96)));
        assert!(t.poll(t0 + Duration::from_secs(105)));
    }
}
