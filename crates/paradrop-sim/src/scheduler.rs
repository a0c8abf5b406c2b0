//! Cooperative deferred-task queue.
//!
//! Tasks run no earlier than their due time. Ties run in submission order.
//! There is no cancellation; stale tasks are dropped by whoever pops them.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use paradrop_core::types::{LauncherId, SimSeconds, TrackerId};

/// Work the registry defers to a later time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Sample a tracker again.
    Tick { launcher: LauncherId, tracker: TrackerId },
    /// Deliver a resolved tracker's outcome at its moment of impact.
    Report { launcher: LauncherId, tracker: TrackerId },
}

impl Task {
    pub fn tracker(&self) -> TrackerId {
        match self {
            Task::Tick { tracker, .. } | Task::Report { tracker, .. } => *tracker,
        }
    }
}

#[derive(Debug)]
struct Entry {
    at: SimSeconds,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the BinaryHeap pops the earliest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of pending tasks keyed by due time.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run at or after `at`.
    pub fn schedule(&mut self, at: SimSeconds, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry { at, seq, task });
    }

    /// Pop the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: SimSeconds) -> Option<(SimSeconds, Task)> {
        if self.queue.peek()?.at > now {
            return None;
        }
        self.queue.pop().map(|e| (e.at, e.task))
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<SimSeconds> {
        self.queue.peek().map(|e| e.at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending tasks naming `tracker`.
    pub fn pending_for(&self, tracker: TrackerId) -> usize {
        self.queue
            .iter()
            .filter(|e| e.task.tracker() == tracker)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(n: u64) -> Task {
        Task::Tick {
            launcher: LauncherId(1),
            tracker: TrackerId(n),
        }
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(3.0, tick(3));
        s.schedule(1.0, tick(1));
        s.schedule(2.0, tick(2));
        assert_eq!(s.next_due(), Some(1.0));
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(10.0))
            .map(|(_, t)| t.tracker().0)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_nothing_due_before_time() {
        let mut s = Scheduler::new();
        s.schedule(5.0, tick(1));
        assert!(s.pop_due(4.999).is_none());
        assert_eq!(s.len(), 1);
        assert_eq!(s.pop_due(5.0), Some((5.0, tick(1))));
    }

    #[test]
    fn test_ties_keep_submission_order() {
        let mut s = Scheduler::new();
        for n in [7, 3, 9] {
            s.schedule(1.0, tick(n));
        }
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(1.0))
            .map(|(_, t)| t.tracker().0)
            .collect();
        assert_eq!(order, vec![7, 3, 9]);
    }

    #[test]
    fn test_pending_for_counts_both_kinds() {
        let mut s = Scheduler::new();
        s.schedule(1.0, tick(4));
        s.schedule(
            2.0,
            Task::Report {
                launcher: LauncherId(1),
                tracker: TrackerId(4),
            },
        );
        s.schedule(2.0, tick(5));
        assert_eq!(s.pending_for(TrackerId(4)), 2);
        assert_eq!(s.pending_for(TrackerId(5)), 1);
        assert_eq!(s.pending_for(TrackerId(6)), 0);
    }
}
