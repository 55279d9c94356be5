use crate::error::AppError;
use crate::model::{Task, TaskId};
use crate::storage::{StoredTasks, TaskRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "TASKTIMER_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredFile {
    schema_version: u32,
    #[serde(default)]
    next_id: TaskId,
    tasks: Vec<TaskRecord>,
}

/// One persisted row. `running_since` is an RFC 3339 instant; null, missing
/// and the empty string all mean the task is stopped.
#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    id: TaskId,
    name: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    running_since: Option<String>,
    #[serde(default)]
    accumulated_seconds: u64,
}

impl TaskRecord {
    fn from_task(task: &Task) -> Result<Self, AppError> {
        let running_since = task
            .running_since
            .map(|since| since.format(&Rfc3339))
            .transpose()
            .map_err(AppError::persistence)?;
        Ok(Self {
            id: task.id,
            name: task.name.clone(),
            notes: task.notes.clone(),
            running_since,
            accumulated_seconds: task.accumulated_seconds,
        })
    }

    fn into_task(self) -> Result<Task, AppError> {
        let running_since = match self.running_since.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(OffsetDateTime::parse(value, &Rfc3339).map_err(|err| {
                AppError::persistence(format!(
                    "task {}: running_since must be RFC3339: {err}",
                    self.id
                ))
            })?),
        };
        Ok(Task {
            id: self.id,
            name: self.name,
            notes: self.notes,
            running_since,
            accumulated_seconds: self.accumulated_seconds,
        })
    }
}

/// Resolves the store file: `TASKTIMER_STORE_PATH`, then the configured path,
/// then the per-user default.
pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured {
        return Ok(path.to_path_buf());
    }

    Ok(crate::config::app_dir()?.join(STORE_FILE_NAME))
}

pub fn load_state(path: &Path) -> Result<StoredTasks, AppError> {
    if !path.exists() {
        return Ok(StoredTasks::default());
    }

    let content = std::fs::read_to_string(path).map_err(AppError::persistence)?;
    let stored: StoredFile = serde_json::from_str(&content).map_err(AppError::persistence)?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::persistence("schema_version mismatch"));
    }

    let mut seen = HashSet::with_capacity(stored.tasks.len());
    let mut tasks = Vec::with_capacity(stored.tasks.len());
    for record in stored.tasks {
        if !seen.insert(record.id) {
            return Err(AppError::persistence(format!(
                "duplicate task id {}",
                record.id
            )));
        }
        tasks.push(record.into_task()?);
    }

    Ok(StoredTasks {
        tasks,
        next_id: stored.next_id,
    }
    .normalized())
}

pub fn save_state(path: &Path, state: &StoredTasks) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(AppError::persistence)?;
    }

    let stored = StoredFile {
        schema_version: SCHEMA_VERSION,
        next_id: state.next_id,
        tasks: state
            .tasks
            .iter()
            .map(TaskRecord::from_task)
            .collect::<Result<_, _>>()?,
    };
    let content = serde_json::to_string_pretty(&stored).map_err(AppError::persistence)?;
    std::fs::write(path, content).map_err(AppError::persistence)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(AppError::persistence)?;
    }

    Ok(())
}

/// Repository backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl TaskRepository for JsonFileRepository {
    fn load(&mut self) -> Result<StoredTasks, AppError> {
        load_state(&self.path)
    }

    fn save(&mut self, state: &StoredTasks) -> Result<(), AppError> {
        save_state(&self.path, state)
    }
}
