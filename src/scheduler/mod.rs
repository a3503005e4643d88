//! Single-threaded timer queue with cancellable handles.
//!
//! Timers are ordered by due time and then by scheduling order, so two timers
//! due at the same millisecond fire in the order they were scheduled. The
//! queue never looks at a clock itself; callers pass `now_ms` in.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Opaque handle identifying one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Timer that came due during [`TimerQueue::drain_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer<T> {
    pub handle: TimerHandle,
    pub due_at_ms: u64,
    pub payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    ordered: BTreeMap<(u64, u64), T>,
    due_by_id: HashMap<u64, u64>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            ordered: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay: Duration, payload: T) -> TimerHandle {
        self.next_id += 1;
        let id = self.next_id;
        let due = now_ms.saturating_add(delay.as_millis() as u64);
        self.ordered.insert((due, id), payload);
        self.due_by_id.insert(id, due);
        TimerHandle(id)
    }

    /// Cancel a pending timer, returning its payload if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let due = self.due_by_id.remove(&handle.0)?;
        self.ordered.remove(&(due, handle.0))
    }

    /// Cancel every pending timer whose payload matches `predicate`.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let doomed: Vec<(u64, u64)> = self
            .ordered
            .iter()
            .filter(|(_, payload)| predicate(payload))
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            self.ordered.remove(key);
            self.due_by_id.remove(&key.1);
        }
        doomed.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_id.contains_key(&handle.0)
    }

    /// Remove and return every timer due at or before `now_ms`.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<FiredTimer<T>> {
        let later = self.ordered.split_off(&(now_ms.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.ordered, later);
        due.into_iter()
            .map(|((due_at_ms, id), payload)| {
                self.due_by_id.remove(&id);
                FiredTimer {
                    handle: TimerHandle(id),
                    due_at_ms,
                    payload,
                }
            })
            .collect()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.ordered.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.due_by_id.clear();
    }
}
