use time::OffsetDateTime;

pub type TaskId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub notes: String,
    pub running_since: Option<OffsetDateTime>,
    pub accumulated_seconds: u64,
}

/// Running state of a task as seen by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running { since: OffsetDateTime },
}

impl Task {
    /// A stopped task with no time on it. The id is assigned by the store on insert.
    pub fn new<N: Into<String>, D: Into<String>>(name: N, notes: D) -> Self {
        Self {
            id: 0,
            name: name.into(),
            notes: notes.into(),
            running_since: None,
            accumulated_seconds: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn state(&self) -> TimerState {
        match self.running_since {
            Some(since) => TimerState::Running { since },
            None => TimerState::Stopped,
        }
    }

    /// Accumulated seconds plus the open interval, if any, measured at `now`.
    pub fn total_seconds_at(&self, now: OffsetDateTime) -> u64 {
        match self.running_since {
            Some(since) => self
                .accumulated_seconds
                .saturating_add(crate::timer::elapsed_seconds(since, now)),
            None => self.accumulated_seconds,
        }
    }
}
