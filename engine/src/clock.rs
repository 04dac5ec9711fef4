//! Deterministic tick clock.
//!
//! Every periodic thing in the workspace (game tick loops, the scheduler's tests) is expressed as a
//! cancellable repeating task on a clock. `VirtualClock` only moves when told to, so callers can
//! drive it from wall time (the popup window) or step it explicitly (tests).

use std::time::Duration;

/// Shortest period a task may have. Keeps `advance` finite for zero-period requests.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Task {
    id: TaskId,
    next_due: Duration,
    period: Duration,
}

#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    tasks: Vec<Task>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the clock was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Registers a repeating task that first fires `initial_delay` from now, then every `period`.
    pub fn schedule(&mut self, initial_delay: Duration, period: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            next_due: self.now.saturating_add(initial_delay),
            period: period.max(MIN_PERIOD),
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn scheduled_len(&self) -> usize {
        self.tasks.len()
    }

    /// Pops the earliest firing due at or before `until`, moving `now` to its due time.
    ///
    /// Ties are broken by scheduling order. Callers that cancel tasks between calls see the
    /// cancellation take effect on the very next call.
    pub fn pop_due(&mut self, until: Duration) -> Option<TaskId> {
        let task = self
            .tasks
            .iter_mut()
            .filter(|task| task.next_due <= until)
            .min_by_key(|task| (task.next_due, task.id))?;

        let id = task.id;
        self.now = self.now.max(task.next_due);
        task.next_due = task.next_due.saturating_add(task.period);
        Some(id)
    }

    /// Moves `now` forward to `until` without firing anything.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Advances by `dt` and returns every firing in chronological order.
    pub fn advance(&mut self, dt: Duration) -> Vec<TaskId> {
        let until = self.now.saturating_add(dt);
        let mut fired = Vec::new();
        while let Some(id) = self.pop_due(until) {
            fired.push(id);
        }
        self.settle(until);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_firing_waits_for_initial_delay() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule(ms(100), ms(50));

        assert!(clock.advance(ms(99)).is_empty());
        assert_eq!(clock.advance(ms(1)), vec![id]);
        assert_eq!(clock.advance(ms(100)), vec![id, id]);
        assert_eq!(clock.now(), ms(200));
    }

    #[test]
    fn firings_interleave_in_time_order() {
        let mut clock = VirtualClock::new();
        let slow = clock.schedule(ms(30), ms(30));
        let fast = clock.schedule(ms(20), ms(20));

        assert_eq!(clock.advance(ms(60)), vec![fast, slow, fast, slow, fast]);
    }

    #[test]
    fn cancelled_task_never_fires_again() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule(ms(10), ms(10));
        assert_eq!(clock.advance(ms(10)), vec![id]);

        assert!(clock.cancel(id));
        assert!(!clock.cancel(id));
        assert!(!clock.is_scheduled(id));
        assert!(clock.advance(ms(1_000)).is_empty());
    }

    #[test]
    fn cancel_between_pops_stops_remaining_firings() {
        let mut clock = VirtualClock::new();
        let id = clock.schedule(ms(10), ms(10));

        assert_eq!(clock.pop_due(ms(100)), Some(id));
        clock.cancel(id);
        assert_eq!(clock.pop_due(ms(100)), None);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut clock = VirtualClock::new();
        clock.schedule(Duration::ZERO, Duration::ZERO);
        assert_eq!(clock.advance(ms(2)).len(), 3);
    }
}
