pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod storage;
pub mod store;
pub mod timer;

pub use error::AppError;
pub use model::{Task, TaskId, TimerState};
pub use storage::{JsonFileRepository, MemoryRepository, StoredTasks, TaskRepository};
pub use store::{Snapshot, Subscription, TaskStore, Toggled};
pub use timer::{ToggleEvent, ToggleKind};
