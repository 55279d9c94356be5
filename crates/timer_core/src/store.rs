//! The authoritative task list.
//!
//! A single mutex guards the task list, the repository and the subscriber
//! list, so every mutation is a serialized read-modify-write that ends in
//! exactly one repository write. A mutation is applied to a copy first; the
//! copy only replaces the live state (and is only published) once the write
//! has succeeded.

use crate::error::AppError;
use crate::model::{Task, TaskId};
use crate::storage::{StoredTasks, TaskRepository};
use crate::timer::{self, ToggleEvent, ToggleKind};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Immutable point-in-time copy of the whole task list, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[Task]>);

impl Snapshot {
    fn new(tasks: &[Task]) -> Self {
        Self(Arc::from(tasks))
    }

    pub fn tasks(&self) -> &[Task] {
        &self.0
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.0.iter().find(|task| task.id == id)
    }

}

impl Deref for Snapshot {
    type Target = [Task];

    fn deref(&self) -> &[Task] {
        &self.0
    }
}

/// A toggled task together with the event describing the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
    pub task: Task,
    pub event: ToggleEvent,
}

/// Live feed of snapshots. The first item is the list as it was when
/// subscribing; after that there is one item per applied mutation.
///
/// Iterating blocks until the next snapshot arrives and ends once the store
/// has been dropped.
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<Snapshot>,
}

impl Subscription {
    /// Next snapshot if one is already queued.
    pub fn try_next(&self) -> Option<Snapshot> {
        match self.rx.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<Snapshot> {
        match self.rx.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Every snapshot queued so far, oldest first, without blocking.
    pub fn drain(&self) -> Vec<Snapshot> {
        self.rx.try_iter().collect()
    }
}

impl Iterator for Subscription {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().ok()
    }
}

struct Inner<R> {
    repository: R,
    state: StoredTasks,
    snapshot: Snapshot,
    subscribers: Vec<Sender<Snapshot>>,
}

impl<R: TaskRepository> Inner<R> {
    /// Persists `next`, then makes it the live state and publishes it.
    fn commit(&mut self, op: &'static str, next: StoredTasks) -> Result<(), AppError> {
        if let Err(err) = self.repository.save(&next) {
            warn!(op, error = %err, "task store write failed");
            return Err(err);
        }

        self.state = next;
        self.snapshot = Snapshot::new(&self.state.tasks);
        let snapshot = &self.snapshot;
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
        debug!(
            op,
            tasks = self.state.tasks.len(),
            subscribers = self.subscribers.len(),
            "task store updated"
        );
        Ok(())
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.state.tasks.iter().position(|task| task.id == id)
    }
}

/// Ordered, persisted task list with snapshot subscriptions.
///
/// The store is `Send + Sync` when its repository is `Send`; share it behind
/// an `Arc` when several components need it.
pub struct TaskStore<R> {
    inner: Mutex<Inner<R>>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Loads the current state from `repository` and takes ownership of it.
    pub fn open(mut repository: R) -> Result<Self, AppError> {
        let state = repository.load()?.normalized();
        debug!(tasks = state.tasks.len(), next_id = state.next_id, "task store opened");
        Ok(Self {
            inner: Mutex::new(Inner {
                repository,
                snapshot: Snapshot::new(&state.tasks),
                state,
                subscribers: Vec::new(),
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<R>>, AppError> {
        self.inner
            .lock()
            .map_err(|err| AppError::persistence(format!("task store lock poisoned: {err}")))
    }

    /// Appends `task` under a freshly assigned id. Any id on the input is ignored.
    pub fn insert(&self, task: Task) -> Result<TaskId, AppError> {
        let mut inner = self.lock()?;
        let mut next = inner.state.clone();
        let id = next.next_id;
        next.next_id = id
            .checked_add(1)
            .ok_or_else(|| AppError::invalid_data("task ids exhausted"))?;
        next.tasks.push(Task { id, ..task });
        inner.commit("insert", next)?;
        Ok(id)
    }

    /// Replaces the name and notes of the stored task with the same id,
    /// keeping its position. Timer fields are taken from the stored record;
    /// only `toggle_task` starts or stops a task.
    pub fn update(&self, task: Task) -> Result<(), AppError> {
        self.apply_labels("update", task.id, task.name, task.notes)
            .map(|_| ())
    }

    fn apply_labels(
        &self,
        op: &'static str,
        id: TaskId,
        name: String,
        notes: String,
    ) -> Result<Task, AppError> {
        let mut inner = self.lock()?;
        let index = inner.position(id).ok_or(AppError::NotFound(id))?;
        let mut next = inner.state.clone();
        let stored = &mut next.tasks[index];
        stored.name = name;
        stored.notes = notes;
        let updated = stored.clone();
        inner.commit(op, next)?;
        Ok(updated)
    }

    /// Removes the task if present. Deleting an unknown id does nothing.
    pub fn delete(&self, id: TaskId) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let Some(index) = inner.position(id) else {
            debug!(id, "delete of unknown task ignored");
            return Ok(());
        };
        let mut next = inner.state.clone();
        next.tasks.remove(index);
        inner.commit("delete", next)
    }

    pub fn delete_all(&self) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let next = StoredTasks {
            tasks: Vec::new(),
            next_id: inner.state.next_id,
        };
        inner.commit("delete_all", next)
    }

    /// Starts or stops the task at `now` and persists the result.
    pub fn toggle_task(&self, id: TaskId, now: OffsetDateTime) -> Result<ToggleEvent, AppError> {
        self.toggle_at(id, now).map(|toggled| toggled.event)
    }

    fn toggle_at(&self, id: TaskId, now: OffsetDateTime) -> Result<Toggled, AppError> {
        let mut inner = self.lock()?;
        let index = inner.position(id).ok_or(AppError::NotFound(id))?;
        let (toggled, event) = timer::toggle(&inner.state.tasks[index], now);
        let mut next = inner.state.clone();
        next.tasks[index] = toggled.clone();
        inner.commit("toggle", next)?;

        match event.kind {
            ToggleKind::Start => info!(id, total_seconds = event.total_seconds, "task started"),
            ToggleKind::Stop => info!(id, total_seconds = event.total_seconds, "task stopped"),
        }
        Ok(Toggled {
            task: toggled,
            event,
        })
    }

    /// Subscribes to the task list; the current snapshot is queued immediately.
    pub fn subscribe(&self) -> Result<Subscription, AppError> {
        let mut inner = self.lock()?;
        let (tx, rx) = crossbeam_channel::unbounded();
        // The receiver is alive, so the first send cannot fail.
        let _ = tx.send(inner.snapshot.clone());
        inner.subscribers.push(tx);
        Ok(Subscription { rx })
    }

    pub fn snapshot(&self) -> Result<Snapshot, AppError> {
        Ok(self.lock()?.snapshot.clone())
    }

    pub fn get(&self, id: TaskId) -> Result<Task, AppError> {
        self.lock()?
            .snapshot
            .get(id)
            .cloned()
            .ok_or(AppError::NotFound(id))
    }

    /// Runs `f` against the repository while holding the store lock.
    pub fn with_repository<T>(&self, f: impl FnOnce(&mut R) -> T) -> Result<T, AppError> {
        let mut inner = self.lock()?;
        Ok(f(&mut inner.repository))
    }

    // Collaborator-facing names for the operations above.

    pub fn list_all(&self) -> Result<Subscription, AppError> {
        self.subscribe()
    }

    pub fn create(&self, name: &str, notes: &str) -> Result<TaskId, AppError> {
        self.insert(Task::new(name, notes))
    }

    /// Changes name and notes, leaving the timer fields as stored.
    pub fn edit(&self, id: TaskId, name: &str, notes: &str) -> Result<Task, AppError> {
        self.apply_labels("edit", id, name.to_string(), notes.to_string())
    }

    pub fn remove(&self, id: TaskId) -> Result<(), AppError> {
        self.delete(id)
    }

    pub fn remove_all(&self) -> Result<(), AppError> {
        self.delete_all()
    }

    /// Toggles the task at the current wall-clock time and returns the task
    /// as it was written, so callers never re-read a later state.
    pub fn toggle(&self, id: TaskId) -> Result<Toggled, AppError> {
        self.toggle_at(id, OffsetDateTime::now_utc())
    }
}
