use crate::error::AppError;
use crate::storage::{StoredTasks, TaskRepository};

/// Repository kept entirely in memory. Writes can be made to fail, which the
/// store tests use to check that nothing is published after a failed write.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: StoredTasks,
    saves: usize,
    fail_saves: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoredTasks) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl TaskRepository for MemoryRepository {
    fn load(&mut self) -> Result<StoredTasks, AppError> {
        Ok(self.state.clone().normalized())
    }

    fn save(&mut self, state: &StoredTasks) -> Result<(), AppError> {
        if self.fail_saves {
            return Err(AppError::persistence("memory repository rejected write"));
        }
        self.state = state.clone();
        self.saves += 1;
        Ok(())
    }
}
