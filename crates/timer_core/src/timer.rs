//! Start/stop transitions for a single task.
//!
//! Nothing here reads the clock: callers pass `now` in, so every transition is
//! deterministic. Elapsed time is truncated to whole seconds and never goes
//! negative, even when the clock has moved backwards since the task started.

use crate::model::{Task, TaskId};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleKind {
    Start,
    Stop,
}

/// Outcome of a toggle, handed back so the caller can notify without
/// re-reading the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEvent {
    pub task_id: TaskId,
    pub kind: ToggleKind,
    pub at: OffsetDateTime,
    /// Accumulated seconds after the transition.
    pub total_seconds: u64,
}

impl ToggleEvent {
    pub fn total_minutes(&self) -> u64 {
        self.total_seconds / 60
    }
}

/// Whole seconds between `since` and `now`, zero if `now` is earlier.
pub fn elapsed_seconds(since: OffsetDateTime, now: OffsetDateTime) -> u64 {
    let seconds = (now - since).whole_seconds();
    u64::try_from(seconds).unwrap_or(0)
}

/// Applies one toggle to `task` and returns the new task with the event.
pub fn toggle(task: &Task, now: OffsetDateTime) -> (Task, ToggleEvent) {
    let mut next = task.clone();
    let kind = match task.running_since {
        None => {
            next.running_since = Some(now);
            ToggleKind::Start
        }
        Some(since) => {
            next.accumulated_seconds = task
                .accumulated_seconds
                .saturating_add(elapsed_seconds(since, now));
            next.running_since = None;
            ToggleKind::Stop
        }
    };

    let event = ToggleEvent {
        task_id: next.id,
        kind,
        at: now,
        total_seconds: next.accumulated_seconds,
    };
    (next, event)
}

#[cfg(test)]
mod tests {
    use super::{ToggleKind, elapsed_seconds, toggle};
    use crate::model::{Task, TimerState};
    use time::{Duration, macros::datetime};

    fn task() -> Task {
        let mut task = Task::new("Write report", "");
        task.id = 1;
        task
    }

    #[test]
    fn toggle_starts_a_stopped_task() {
        let now = datetime!(2025-12-20 09:00:00 UTC);
        let (started, event) = toggle(&task(), now);

        assert_eq!(started.running_since, Some(now));
        assert_eq!(started.accumulated_seconds, 0);
        assert_eq!(event.kind, ToggleKind::Start);
        assert_eq!(event.at, now);
        assert_eq!(event.task_id, 1);
        assert_eq!(event.total_seconds, 0);
    }

    #[test]
    fn toggle_stops_and_accrues_elapsed_seconds() {
        let start = datetime!(2025-12-20 09:00:00 UTC);
        let (running, _) = toggle(&task(), start);
        let (stopped, event) = toggle(&running, start + Duration::seconds(125));

        assert_eq!(stopped.running_since, None);
        assert_eq!(stopped.accumulated_seconds, 125);
        assert_eq!(event.kind, ToggleKind::Stop);
        assert_eq!(event.total_seconds, 125);
        assert_eq!(event.total_minutes(), 2);
    }

    #[test]
    fn toggle_accumulates_across_cycles() {
        let t0 = datetime!(2025-12-20 09:00:00 UTC);
        let (running, _) = toggle(&task(), t0);
        let (stopped, _) = toggle(&running, t0 + Duration::seconds(60));
        let (running, event) = toggle(&stopped, t0 + Duration::seconds(600));
        assert_eq!(event.kind, ToggleKind::Start);
        assert_eq!(event.total_seconds, 60);

        let (stopped, _) = toggle(&running, t0 + Duration::seconds(630));
        assert_eq!(stopped.accumulated_seconds, 90);
    }

    #[test]
    fn two_toggles_restore_running_state() {
        let t0 = datetime!(2025-12-20 09:00:00 UTC);
        let mut original = task();
        original.accumulated_seconds = 40;
        original.running_since = Some(t0);

        let (stopped, _) = toggle(&original, t0 + Duration::seconds(20));
        let (restarted, _) = toggle(&stopped, t0 + Duration::seconds(20));

        assert_eq!(restarted.state(), TimerState::Running {
            since: t0 + Duration::seconds(20)
        });
        assert_eq!(restarted.accumulated_seconds, 60);
    }

    #[test]
    fn sub_second_precision_is_truncated() {
        let t0 = datetime!(2025-12-20 09:00:00 UTC);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(1_999)), 1);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(999)), 0);
    }

    #[test]
    fn clock_moving_backwards_accrues_nothing() {
        let t0 = datetime!(2025-12-20 09:00:00 UTC);
        let mut running = task();
        running.accumulated_seconds = 30;
        running.running_since = Some(t0);

        let (stopped, event) = toggle(&running, t0 - Duration::minutes(5));

        assert_eq!(stopped.accumulated_seconds, 30);
        assert_eq!(stopped.running_since, None);
        assert_eq!(event.kind, ToggleKind::Stop);
    }

    #[test]
    fn total_seconds_includes_open_interval() {
        let t0 = datetime!(2025-12-20 09:00:00 UTC);
        let mut running = task();
        running.accumulated_seconds = 10;
        running.running_since = Some(t0);

        assert_eq!(running.total_seconds_at(t0 + Duration::seconds(5)), 15);
        assert_eq!(running.total_seconds_at(t0 - Duration::seconds(5)), 10);
        assert_eq!(task().total_seconds_at(t0), 0);
    }
}
