use std::time::{Duration, Instant};

/// One observed firing of a [`Ticker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Number of whole periods since the ticker started.
    pub index: u64,
    /// Periods that elapsed without being observed (the loop was busy or asleep).
    pub missed: u64,
}

/// Fixed-period timer anchored to an absolute start instant.
///
/// Deadlines are always `start + k * period`, so a late or skipped callback never shifts the
/// phase of later ticks. Callers recompute from absolute time on each tick instead of summing
/// deltas.
#[derive(Debug, Clone)]
pub struct Ticker {
    start: Instant,
    period: Duration,
    last_index: u64,
}

impl Ticker {
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    pub fn new(start: Instant, period: Duration) -> Self {
        Self {
            start,
            period: period.max(Self::MIN_PERIOD),
            last_index: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn index_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_nanos() / self.period.as_nanos()) as u64
    }

    /// The first deadline strictly after `now`.
    pub fn next_deadline(&self, now: Instant) -> Instant {
        let next = self.index_at(now).saturating_add(1);
        let offset = self.period.as_nanos().saturating_mul(next as u128);
        self.start + Duration::from_nanos(offset.min(u64::MAX as u128) as u64)
    }

    /// Reports a tick if at least one new period boundary has passed since the last poll.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        let index = self.index_at(now);
        if index <= self.last_index {
            return None;
        }
        let missed = index - self.last_index - 1;
        self.last_index = index;
        Some(Tick { index, missed })
    }
}
