use std::time::Duration;

/// Monotonic elapsed time, advanced only by host frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    elapsed: Duration,
}

impl FrameClock {
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn now(&self) -> Duration {
        self.elapsed
    }
}

/// Single-slot deferred task: holds at most one payload due at a point on a
/// [`FrameClock`]. Rescheduling replaces the pending payload.
#[derive(Debug, Clone)]
pub struct Deferred<T> {
    slot: Option<(Duration, T)>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire `delay` after `now`, replacing anything pending.
    pub fn schedule(&mut self, now: Duration, delay: Duration, payload: T) {
        self.slot = Some((now + delay, payload));
    }

    pub fn cancel(&mut self) {
        self.slot = None;
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Take the payload if it is due at `now`.
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        match &self.slot {
            Some((due, _)) if *due <= now => self.slot.take().map(|(_, payload)| payload),
            _ => None,
        }
    }
}
