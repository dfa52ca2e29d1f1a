//! A virtual clock standing in for `setTimeout`.
//!
//! Controllers schedule typed tasks instead of closures, and the owner of the clock decides when
//! time passes. Tasks that are due at the same instant run in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    due: u64,
    id: TimerId,
    task: T,
}

// Ordering only looks at (due, id), tasks don't need to be comparable
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.id) == (other.due, other.id)
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.id).cmp(&(other.due, other.id))
    }
}

#[derive(Debug)]
pub struct Timers<T> {
    now: u64,
    next_id: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
    cancelled: HashSet<TimerId>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Timers {
            now: 0,
            next_id: 0,
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time, in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse(Entry { due: self.now + delay_ms, id, task }));
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.cancelled.insert(id);
    }

    /// Number of tasks still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.iter().filter(|e| !self.cancelled.contains(&e.0.id)).count()
    }

    /// Removes the next task due at or before `until`, moving the clock to its due time.
    ///
    /// Tasks scheduled while draining (e.g. by a task that was just popped) are picked up by
    /// subsequent calls if they're due before `until`.
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        loop {
            match self.queue.peek() {
                Some(Reverse(entry)) if entry.due <= until => {}
                _ => return None,
            }
            let Reverse(entry) = self.queue.pop()?;
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            self.now = self.now.max(entry.due);
            return Some(entry.task);
        }
    }

    /// Moves the clock forward once all tasks due up to `until` have been popped.
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tasks_run_in_due_then_insertion_order() {
        let mut timers = Timers::new();
        timers.set_timeout(300, "c");
        timers.set_timeout(10, "a");
        let cancelled = timers.set_timeout(10, "x");
        timers.set_timeout(10, "b");
        timers.cancel(cancelled);
        assert_eq!(3, timers.pending());

        let mut ran = Vec::new();
        while let Some(task) = timers.pop_due(100) {
            ran.push(task);
        }
        timers.advance_to(100);
        assert_eq!(vec!["a", "b"], ran);
        assert_eq!(100, timers.now());

        // Scheduled relative to the current time
        timers.set_timeout(50, "d");
        assert_eq!(Some("d"), timers.pop_due(150));
        assert_eq!(150, timers.now());
        assert_eq!(None, timers.pop_due(200));
        assert_eq!(Some("c"), timers.pop_due(300));
    }
}
