//! Deferred work queue.
//!
//! The core never sleeps; anything it wants done later goes in here with an
//! absolute deadline. Whoever drives the core asks for [`next_deadline`],
//! waits however it likes (tokio timer, test clock) and calls [`pop_due`]
//! when the time comes. Due tasks come back ordered by deadline and, within
//! one deadline, by insertion order.
//!
//! [`next_deadline`]: TimerQueue::next_deadline
//! [`pop_due`]: TimerQueue::pop_due

use std::time::Instant;

/// Work the core has put off until a deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    /// Send a protocol line, terminator not yet applied
    SendLine(String),
    /// Second step of the overlay hide: collapse the zone-control surface
    CollapseZoneSurface,
}

struct Entry {
    deadline: Instant,
    seq: u64,
    task: DeferredTask,
}

/// Pending deferred tasks, ordered by (deadline, insertion)
#[derive(Default)]
pub struct TimerQueue {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Instant, task: DeferredTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { deadline, seq, task });
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|entry| entry.deadline).min()
    }

    /// Remove and return every task due at `now`, in firing order
    pub fn pop_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.deadline <= now {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.entries = remaining;
        due.sort_by_key(|entry| (entry.deadline, entry.seq));
        due.into_iter().map(|entry| entry.task).collect()
    }

    /// Drop any pending surface collapse; send tasks are untouched
    pub fn cancel_collapse(&mut self) {
        self.entries
            .retain(|entry| !matches!(entry.task, DeferredTask::CollapseZoneSurface));
    }

    /// Drop everything; used when the connection goes away
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
