use crate::error::AppError;
use crate::model::{Task, TaskId};

pub mod json_store;
mod memory;

pub use json_store::JsonFileRepository;
pub use memory::MemoryRepository;

/// Everything the store persists: the tasks in order plus the next id to hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTasks {
    pub tasks: Vec<Task>,
    pub next_id: TaskId,
}

impl Default for StoredTasks {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }
}

impl StoredTasks {
    /// Raises `next_id` past every stored id so ids are never handed out twice.
    /// A stored id of `u64::MAX` pins `next_id` there, and the store refuses
    /// to hand that value out.
    pub fn normalized(mut self) -> Self {
        let floor = self
            .tasks
            .iter()
            .map(|task| task.id.saturating_add(1))
            .max()
            .unwrap_or(1);
        self.next_id = self.next_id.max(floor).max(1);
        self
    }
}

/// Storage backend for the task store. Each `save` is one complete write of
/// the state; the store never calls it more than once per mutation.
pub trait TaskRepository: Send {
    fn load(&mut self) -> Result<StoredTasks, AppError>;

    fn save(&mut self, state: &StoredTasks) -> Result<(), AppError>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for Box<R> {
    fn load(&mut self) -> Result<StoredTasks, AppError> {
        (**self).load()
    }

    fn save(&mut self, state: &StoredTasks) -> Result<(), AppError> {
        (**self).save(state)
    }
}

#[cfg(test)]
mod tests {
    use super::StoredTasks;
    use crate::model::Task;

    #[test]
    fn normalized_moves_next_id_past_existing_ids() {
        let mut task = Task::new("a", "");
        task.id = 7;
        let state = StoredTasks {
            tasks: vec![task],
            next_id: 3,
        }
        .normalized();

        assert_eq!(state.next_id, 8);
    }

    #[test]
    fn normalized_keeps_higher_next_id() {
        let state = StoredTasks {
            tasks: Vec::new(),
            next_id: 12,
        }
        .normalized();

        assert_eq!(state.next_id, 12);
        assert_eq!(StoredTasks::default().normalized().next_id, 1);
    }
}
