//! Transition history tracking.
//!
//! Every transition a machine performs is appended to a bounded log, which
//! is handy for debug overlays and for asserting behavior in tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// What started a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// Entering the configured start state.
    Start,
    /// A direct call on the machine.
    Direct,
    /// Requested by a state hook or a timer callback.
    Requested,
    /// A scheduled transition whose delay ran out.
    Scheduled,
}

/// Record of a single transition.
///
/// # Example
///
/// ```rust
/// use flowstate::core::{TransitionCause, TransitionRecord};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let record = TransitionRecord {
///     from: Some("Idle".to_string()),
///     to: "Chase".to_string(),
///     cause: TransitionCause::Requested,
///     elapsed: Duration::from_secs(3),
///     timestamp: Utc::now(),
/// };
/// assert!(!record.is_reentry());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State left, `None` for the very first transition
    pub from: Option<String>,
    /// State entered
    pub to: String,
    pub cause: TransitionCause,
    /// Machine clock when the transition ran
    pub elapsed: Duration,
    /// Wall-clock time when the transition ran
    pub timestamp: DateTime<Utc>,
}

impl TransitionRecord {
    /// True when the machine left and re-entered the same state.
    pub fn is_reentry(&self) -> bool {
        self.from.as_deref() == Some(self.to.as_str())
    }
}

/// Ordered, bounded log of transitions.
///
/// Once `limit` records are held the oldest one is dropped for each new
/// record. A limit of zero disables recording.
///
/// # Example
///
/// ```rust
/// use flowstate::core::{TransitionCause, TransitionHistory, TransitionRecord};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let mut history = TransitionHistory::with_limit(2);
/// for (from, to) in [(None, "A"), (Some("A"), "B"), (Some("B"), "C")] {
///     history.record(TransitionRecord {
///         from: from.map(str::to_string),
///         to: to.to_string(),
///         cause: TransitionCause::Direct,
///         elapsed: Duration::ZERO,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get_path(), vec!["A", "B", "C"]);
/// assert_eq!(history.total_recorded(), 3);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
    total: u64,
}

impl TransitionHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(256)),
            limit,
            total: 0,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        self.total += 1;
        if self.limit == 0 {
            return;
        }
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The states traversed by the retained records: the `from` of the oldest
    /// record (if any), then the `to` of each record.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(from) = self.records.front().and_then(|r| r.from.as_deref()) {
            path.push(from);
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    /// Wall-clock time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> impl DoubleEndedIterator<Item = &TransitionRecord> + '_ {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Transitions seen since creation, including ones no longer retained.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: Option<&str>, to: &str) -> TransitionRecord {
        TransitionRecord {
            from: from.map(str::to_string),
            to: to.to_string(),
            cause: TransitionCause::Direct,
            elapsed: Duration::ZERO,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = TransitionHistory::with_limit(8);
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert!(history.last().is_none());
    }

    #[test]
    fn get_path_starts_with_first_origin() {
        let mut history = TransitionHistory::with_limit(8);
        history.record(record(None, "Idle"));
        history.record(record(Some("Idle"), "Chase"));

        assert_eq!(history.get_path(), vec!["Idle", "Chase"]);

        history.record(record(Some("Chase"), "Idle"));
        assert_eq!(history.get_path(), vec!["Idle", "Chase", "Idle"]);
    }

    #[test]
    fn limit_drops_oldest_records() {
        let mut history = TransitionHistory::with_limit(2);
        history.record(record(None, "A"));
        history.record(record(Some("A"), "B"));
        history.record(record(Some("B"), "C"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.records().next().unwrap().to, "B");
        assert_eq!(history.last().unwrap().to, "C");
        assert_eq!(history.total_recorded(), 3);
    }

    #[test]
    fn zero_limit_only_counts() {
        let mut history = TransitionHistory::with_limit(0);
        history.record(record(None, "A"));

        assert!(history.is_empty());
        assert_eq!(history.total_recorded(), 1);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = TransitionHistory::with_limit(8);
        history.record(record(None, "A"));
        std::thread::sleep(Duration::from_millis(10));
        history.record(record(Some("A"), "B"));

        assert!(history.duration().unwrap() >= Duration::from_millis(10));
    }

    #[test]
    fn reentry_is_detected() {
        assert!(record(Some("Idle"), "Idle").is_reentry());
        assert!(!record(Some("Idle"), "Chase").is_reentry());
        assert!(!record(None, "Idle").is_reentry());
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = TransitionHistory::with_limit(4);
        history.record(record(None, "Idle"));
        history.record(record(Some("Idle"), "Chase"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: TransitionHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.len(), 2);
        assert_eq!(deserialized.limit(), 4);
        assert_eq!(deserialized.last(), history.last());
    }
}
