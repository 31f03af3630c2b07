//! Deterministic one-shot timer queue driven by host-provided elapsed time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// Handle to a scheduled timer, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Registration cutoff returned by [`Scheduler::advance`].
///
/// Timers registered after the cutoff wait for the next tick, even when
/// their deadline has already passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Boundary {
    now: Duration,
    cutoff: u64,
}

impl Boundary {
    pub fn now(&self) -> Duration {
        self.now
    }
}

/// One-shot timers keyed by (deadline, registration order).
///
/// Time only moves when the host calls [`advance`](Self::advance); nothing
/// here reads a wall clock. Entries whose deadlines are equal come out in
/// the order they were scheduled.
///
/// # Example
///
/// ```rust
/// use flowstate::schedule::Scheduler;
/// use std::time::Duration;
///
/// let mut timers = Scheduler::new();
/// timers.schedule(Duration::from_secs(2), "late");
/// timers.schedule(Duration::from_secs(1), "early");
///
/// let boundary = timers.advance(Duration::from_secs(2));
/// assert_eq!(timers.pop_due(boundary).map(|(_, p)| p), Some("early"));
/// assert_eq!(timers.pop_due(boundary).map(|(_, p)| p), Some("late"));
/// assert!(timers.pop_due(boundary).is_none());
/// ```
pub struct Scheduler<A> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), A>,
    deadlines: HashMap<u64, Duration>,
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Register `payload` to come due `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, payload: A) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline = self.now.saturating_add(delay);
        self.queue.insert((deadline, seq), payload);
        self.deadlines.insert(seq, deadline);
        TimerId(seq)
    }

    /// Remove a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(deadline) => self.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    /// Move time forward by `dt` and open a new tick boundary.
    pub fn advance(&mut self, dt: Duration) -> Boundary {
        self.now = self.now.saturating_add(dt);
        Boundary {
            now: self.now,
            cutoff: self.next_seq,
        }
    }

    /// Take the earliest timer that is due at `boundary` and was registered
    /// before it.
    pub fn pop_due(&mut self, boundary: Boundary) -> Option<(TimerId, A)> {
        let (TimerId(seq), _) = self.peek_due(boundary)?;
        let deadline = self.deadlines.remove(&seq)?;
        self.queue
            .remove(&(deadline, seq))
            .map(|payload| (TimerId(seq), payload))
    }

    /// Look at the timer [`pop_due`](Self::pop_due) would return, leaving it
    /// queued.
    pub fn peek_due(&self, boundary: Boundary) -> Option<(TimerId, &A)> {
        // Anything registered after the boundary sorts after every older due
        // entry, so checking the first entry is enough.
        let (&(deadline, seq), payload) = self.queue.first_key_value()?;
        if deadline > boundary.now || seq >= boundary.cutoff {
            return None;
        }
        Some((TimerId(seq), payload))
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|&(deadline, _)| deadline)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Scheduler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn drain<A>(timers: &mut Scheduler<A>, boundary: Boundary) -> Vec<A> {
        std::iter::from_fn(|| timers.pop_due(boundary).map(|(_, p)| p)).collect()
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut timers = Scheduler::new();
        timers.schedule(secs(5.0), "idle");

        let boundary = timers.advance(secs(4.9));
        assert!(timers.pop_due(boundary).is_none());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn fires_exactly_once_at_deadline() {
        let mut timers = Scheduler::new();
        timers.schedule(secs(5.0), "idle");

        let boundary = timers.advance(secs(5.0));
        assert_eq!(drain(&mut timers, boundary), vec!["idle"]);

        let boundary = timers.advance(secs(1.0));
        assert!(drain(&mut timers, boundary).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut timers = Scheduler::new();
        timers.schedule(secs(3.0), 3);
        timers.schedule(secs(1.0), 1);
        timers.schedule(secs(2.0), 2);

        let boundary = timers.advance(secs(10.0));
        assert_eq!(drain(&mut timers, boundary), vec![1, 2, 3]);
    }

    #[test]
    fn equal_deadlines_fire_in_registration_order() {
        let mut timers = Scheduler::new();
        for n in 0..5 {
            timers.schedule(secs(1.0), n);
        }

        let boundary = timers.advance(secs(1.0));
        assert_eq!(drain(&mut timers, boundary), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn peek_leaves_timer_queued() {
        let mut timers = Scheduler::new();
        let first = timers.schedule(secs(1.0), "first");
        timers.schedule(secs(1.0), "second");

        let early = timers.advance(secs(0.5));
        assert!(timers.peek_due(early).is_none());

        let boundary = timers.advance(secs(0.5));
        assert_eq!(timers.peek_due(boundary), Some((first, &"first")));
        assert_eq!(timers.len(), 2);
        assert_eq!(timers.pop_due(boundary), Some((first, "first")));
        assert_eq!(timers.peek_due(boundary).map(|(_, p)| *p), Some("second"));
    }

    #[test]
    fn deadlines_are_relative_to_current_time() {
        let mut timers = Scheduler::new();
        timers.advance(secs(10.0));
        timers.schedule(secs(1.0), "later");

        assert_eq!(timers.next_deadline(), Some(secs(11.0)));
        let boundary = timers.advance(secs(0.5));
        assert!(timers.pop_due(boundary).is_none());
    }

    #[test]
    fn timers_added_after_boundary_wait_for_next_tick() {
        let mut timers = Scheduler::new();
        timers.schedule(secs(1.0), "old");

        let boundary = timers.advance(secs(1.0));
        timers.schedule(Duration::ZERO, "new");

        assert_eq!(drain(&mut timers, boundary), vec!["old"]);
        assert_eq!(timers.len(), 1);

        let boundary = timers.advance(Duration::ZERO);
        assert_eq!(drain(&mut timers, boundary), vec!["new"]);
    }

    #[test]
    fn cancel_removes_pending_timer() {
        let mut timers = Scheduler::new();
        let keep = timers.schedule(secs(1.0), "keep");
        let dropped = timers.schedule(secs(1.0), "drop");

        assert!(timers.cancel(dropped));
        assert!(!timers.cancel(dropped));
        assert!(timers.is_pending(keep));
        assert!(!timers.is_pending(dropped));

        let boundary = timers.advance(secs(1.0));
        assert_eq!(drain(&mut timers, boundary), vec!["keep"]);
        assert!(!timers.cancel(keep));
    }

    #[test]
    fn clear_drops_everything() {
        let mut timers = Scheduler::new();
        let id = timers.schedule(secs(1.0), ());
        timers.schedule(secs(2.0), ());

        timers.clear();
        assert!(timers.is_empty());
        assert!(!timers.is_pending(id));
        assert!(timers.next_deadline().is_none());
    }

    #[test]
    fn timer_ids_are_unique() {
        let mut timers = Scheduler::new();
        let a = timers.schedule(secs(1.0), ());
        let b = timers.schedule(secs(1.0), ());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "timer#0");
    }
}
