/// Deferred tasks keyed to the session clock.
///
/// Every task records the session generation it was scheduled under.
/// The session bumps its generation on (re)start, so a task that outlives
/// its game is recognised as stale when it comes due and dropped.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Deferred {
    /// One second of the memorize countdown has elapsed.
    CountdownTick,
    /// Turn a mismatched pair face-down and unlock input.
    HidePair { first: usize, second: usize },
    /// Final match animation done: move to the end screen.
    Finish,
    /// Encouragement display time is over. Only clears the message
    /// shown under the same token.
    ClearMessage { token: u64 },
}

#[derive(Clone, Debug)]
struct Pending {
    due_ms: u64,
    seq: u64,
    generation: u64,
    task: Deferred,
}

/// A task that has come due, with the generation it was scheduled under.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DueTask {
    pub due_ms: u64,
    pub generation: u64,
    pub task: Deferred,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, generation: u64, task: Deferred) {
        self.pending.push(Pending {
            due_ms: now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
            generation,
            task,
        });
        self.next_seq += 1;
    }

    /// Drop every pending task.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    /// Ties are broken by scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DueTask> {
        let idx = self.pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= now_ms)
            .min_by_key(|(_, p)| (p.due_ms, p.seq))
            .map(|(i, _)| i)?;
        let p = self.pending.swap_remove(idx);
        Some(DueTask { due_ms: p.due_ms, generation: p.generation, task: p.task })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_due_before_deadline() {
        let mut s = Scheduler::new();
        s.schedule(0, 500, 1, Deferred::Finish);
        assert_eq!(s.pop_due(499), None);
        assert_eq!(s.pop_due(500), Some(DueTask { due_ms: 500, generation: 1, task: Deferred::Finish }));
        assert!(s.is_empty());
    }

    #[test]
    fn due_tasks_come_out_in_deadline_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(0, 1000, 1, Deferred::CountdownTick);
        s.schedule(0, 500, 1, Deferred::ClearMessage { token: 0 });
        s.schedule(0, 500, 1, Deferred::Finish);
        assert_eq!(s.pop_due(2000).map(|d| d.task), Some(Deferred::ClearMessage { token: 0 }));
        assert_eq!(s.pop_due(2000).map(|d| d.task), Some(Deferred::Finish));
        assert_eq!(s.pop_due(2000).map(|d| d.task), Some(Deferred::CountdownTick));
        assert_eq!(s.pop_due(2000), None);
    }

    #[test]
    fn cancel_all_empties_queue() {
        let mut s = Scheduler::new();
        s.schedule(10, 5, 3, Deferred::HidePair { first: 0, second: 1 });
        s.schedule(10, 5, 3, Deferred::ClearMessage { token: 0 });
        assert_eq!(s.len(), 2);
        s.cancel_all();
        assert_eq!(s.pop_due(u64::MAX), None);
    }

    #[test]
    fn generation_travels_with_task() {
        let mut s = Scheduler::new();
        s.schedule(0, 0, 7, Deferred::CountdownTick);
        assert_eq!(s.pop_due(0).map(|d| d.generation), Some(7));
    }
}
