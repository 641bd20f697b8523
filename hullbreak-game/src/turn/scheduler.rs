//! Run-scoped cancellable continuations on a logical millisecond clock.
//!
//! Deferred transitions (the settle delay after the Eco attack) are queued
//! here instead of free-running timers. Every task carries the run generation
//! it was scheduled in; `invalidate` bumps the generation so continuations
//! from a previous run are discarded rather than fired into fresh state.

use serde::{Deserialize, Serialize};

/// A deferred phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// Settle delay after the Eco attack elapsed; advance to maintenance
    EcoSettled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Task {
    due_ms: u64,
    generation: u64,
    seq: u64,
    continuation: Continuation,
}

/// Logical clock plus pending continuation queue for one run.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    generation: u64,
    next_seq: u64,
    tasks: Vec<Task>,
}

impl Scheduler {
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn pending(&self) -> bool {
        self.tasks
            .iter()
            .any(|task| task.generation == self.generation)
    }

    /// Queue a continuation `delay_ms` from now. Zero delays become due on
    /// the next `advance` call, including `advance(0)`.
    pub fn schedule(&mut self, delay_ms: u64, continuation: Continuation) {
        let task = Task {
            due_ms: self.now_ms.saturating_add(delay_ms),
            generation: self.generation,
            seq: self.next_seq,
            continuation,
        };
        self.next_seq += 1;
        self.tasks.push(task);
    }

    /// Move the clock forward and return the continuations that came due in
    /// order (due time, then scheduling order). Stale generations are
    /// silently dropped.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<Continuation> {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        let generation = self.generation;
        let now = self.now_ms;

        let mut due: Vec<Task> = self
            .tasks
            .iter()
            .copied()
            .filter(|task| task.generation == generation && task.due_ms <= now)
            .collect();
        due.sort_by_key(|task| (task.due_ms, task.seq));
        self.tasks
            .retain(|task| task.generation == generation && task.due_ms > now);
        due.into_iter().map(|task| task.continuation).collect()
    }

    /// Discard every pending continuation and reset the clock for a new run.
    /// The generation bump guarantees already-queued tasks can never fire.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.tasks.clear();
        self.now_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_tasks_fire_in_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(100, Continuation::EcoSettled);
        scheduler.schedule(50, Continuation::EcoSettled);
        assert!(scheduler.advance(40).is_empty());
        let due = scheduler.advance(20);
        assert_eq!(due, vec![Continuation::EcoSettled]);
        assert_eq!(scheduler.advance(100).len(), 1);
        assert!(!scheduler.pending());
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(0, Continuation::EcoSettled);
        assert_eq!(scheduler.advance(0).len(), 1);
    }

    #[test]
    fn invalidate_discards_stale_continuations() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(10, Continuation::EcoSettled);
        scheduler.invalidate();
        assert!(scheduler.advance(1_000).is_empty());
        assert_eq!(scheduler.now_ms(), 1_000);
        assert!(!scheduler.pending());
    }
}
