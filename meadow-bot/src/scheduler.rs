//! Tokio-backed [`Scheduler`]: one [`Interval`] per registered task, polled
//! from the main select loop.
use std::collections::HashMap;
use std::future::poll_fn;
use std::task::Poll;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use meadow_core::{Scheduler, TaskKind};

#[derive(Debug, Default)]
pub struct IntervalScheduler {
    intervals: HashMap<TaskKind, Interval>,
    /// Index into [`TaskKind::ALL`] where the next poll starts.
    cursor: usize,
}

impl IntervalScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the next firing. Pends forever while nothing is registered.
    ///
    /// Polling resumes after the task that fired last, so a task whose
    /// handler outlasts its period cannot starve the others. Cancel-safe: a
    /// tick is only consumed when it is returned.
    pub async fn next(&mut self) -> TaskKind {
        let Self { intervals, cursor } = self;
        poll_fn(|cx| {
            let count = TaskKind::ALL.len();
            for offset in 0..count {
                let index = (*cursor + offset) % count;
                let task = TaskKind::ALL[index];
                if let Some(interval) = intervals.get_mut(&task)
                    && interval.poll_tick(cx).is_ready()
                {
                    *cursor = (index + 1) % count;
                    return Poll::Ready(task);
                }
            }
            Poll::Pending
        })
        .await
    }
}

impl Scheduler for IntervalScheduler {
    fn register(&mut self, task: TaskKind, period: Duration) {
        // First firing after one full period, like a timer interval.
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.intervals.insert(task, interval);
    }

    fn cancel(&mut self, task: TaskKind) {
        self.intervals.remove(&task);
    }
}

#[cfg(test)]
impl IntervalScheduler {
    fn is_registered(&self, task: TaskKind) -> bool {
        self.intervals.contains_key(&task)
    }

    fn period(&self, task: TaskKind) -> Option<Duration> {
        self.intervals.get(&task).map(Interval::period)
    }
}
