//! Task list screen state and its transitions.
//!
//! All screen state lives in one [`TaskListState`] held by a watch channel.
//! Each transition applies a single `send_modify`, so every completion is one
//! atomic replacement and subscribers always render a consistent snapshot.
//! Network operations are not queued against each other.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{DateTime, Local, TimeZone, Utc};
use shared::{
    domain::{Task, TaskId, UserId},
    protocol::{NewTaskRow, TaskTitlePatch},
};
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::{Alert, BackendError, TaskError, TaskOperation},
    session::{SessionEvent, SessionProvider},
    RemoteDataService,
};

const EMPTY_NEW_TITLE: &str = "Please enter a task title";
const EMPTY_EDIT_TITLE: &str = "Task title cannot be empty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub task_id: TaskId,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListState {
    /// Newest first.
    pub tasks: Vec<Task>,
    pub draft: String,
    pub editing: Option<EditState>,
    pub pending_delete: Option<TaskId>,
    pub loading: bool,
    pub refreshing: bool,
    pub alert: Option<Alert>,
}

impl TaskListState {
    pub fn is_editing(&self, id: &TaskId) -> bool {
        self.editing.as_ref().is_some_and(|edit| edit.task_id == *id)
    }

    /// Pull-to-refresh has its own indicator.
    /// `loading` stays set while any fetch is in flight.
    pub fn shows_loading_indicator(&self) -> bool {
        self.loading && !self.refreshing
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }
}

pub struct TaskListController {
    data: Arc<dyn RemoteDataService>,
    session: Arc<SessionProvider>,
    state: watch::Sender<TaskListState>,
    /// Only touched inside `send_modify`, which serializes the updates.
    fetches_in_flight: AtomicUsize,
}

impl TaskListController {
    pub fn new(data: Arc<dyn RemoteDataService>, session: Arc<SessionProvider>) -> Arc<Self> {
        let (state, _) = watch::channel(TaskListState::default());
        Arc::new(Self {
            data,
            session,
            state,
            fetches_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn snapshot(&self) -> TaskListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskListState> {
        self.state.subscribe()
    }

    /// Follows session changes: per-user state is dropped on sign-out, and a
    /// sign-in starts from an empty list and fetches.
    pub fn spawn_session_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.session.subscribe_events();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedIn(user)) => {
                        debug!(user_id = %user.id, "loading tasks for signed-in user");
                        controller.reset();
                        let _ = controller.fetch_tasks().await;
                    }
                    Ok(SessionEvent::SignedOut) => controller.reset(),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session listener lagged; resynchronizing");
                        controller.reset();
                        if controller.session.current_user().is_some() {
                            let _ = controller.fetch_tasks().await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub async fn fetch_tasks(&self) -> Result<(), TaskError> {
        let Some(user) = self.session.current_user() else {
            return Err(self.report(TaskError::from_backend(
                TaskOperation::Fetch,
                BackendError::NotSignedIn,
            )));
        };

        self.state.send_modify(|state| {
            self.fetches_in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
        });
        let result = self.data.select_tasks(user.id).await;
        self.state.send_modify(|state| {
            let remaining = self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            state.loading = remaining > 0;
        });

        match result {
            Ok(tasks) => {
                if !self.is_current_user(user.id) {
                    debug!(user_id = %user.id, "discarding tasks fetched for a previous session");
                    return Ok(());
                }
                info!(count = tasks.len(), "fetched tasks");
                self.state.send_modify(|state| state.tasks = tasks);
                Ok(())
            }
            Err(err) => Err(self.report(TaskError::from_backend(TaskOperation::Fetch, err))),
        }
    }

    pub async fn refresh(&self) -> Result<(), TaskError> {
        self.state.send_modify(|state| state.refreshing = true);
        let result = self.fetch_tasks().await;
        self.state.send_modify(|state| state.refreshing = false);
        result
    }

    pub async fn add_task(&self, title: &str) -> Result<(), TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(self.report(TaskError::Validation(EMPTY_NEW_TITLE.to_string())));
        }
        let Some(user) = self.session.current_user() else {
            return Err(self.report(TaskError::from_backend(
                TaskOperation::Add,
                BackendError::NotSignedIn,
            )));
        };

        let row = NewTaskRow {
            task_title: title.to_string(),
            user_id: user.id,
        };
        match self.data.insert_task(&row).await {
            Ok(task) => {
                if !self.is_current_user(user.id) {
                    debug!(task_id = %task.id, "dropping insert completed after sign-out");
                    return Ok(());
                }
                info!(task_id = %task.id, "added task");
                self.state.send_modify(|state| {
                    state.tasks.insert(0, task);
                    state.draft.clear();
                });
                Ok(())
            }
            Err(err) => Err(self.report(TaskError::from_backend(TaskOperation::Add, err))),
        }
    }

    /// Adds the current input draft; the draft survives a failed insert.
    pub async fn submit_draft(&self) -> Result<(), TaskError> {
        let draft = self.state.borrow().draft.clone();
        self.add_task(&draft).await
    }

    pub async fn update_task(&self, id: &TaskId, new_title: &str) -> Result<(), TaskError> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(self.report(TaskError::Validation(EMPTY_EDIT_TITLE.to_string())));
        }

        let patch = TaskTitlePatch {
            task_title: title.to_string(),
        };
        match self.data.update_task_title(id, &patch).await {
            Ok(()) => {
                info!(task_id = %id, "updated task");
                self.state.send_modify(|state| {
                    if let Some(task) = state.tasks.iter_mut().find(|task| task.id == *id) {
                        task.task_title = patch.task_title;
                    }
                    if state.is_editing(id) {
                        state.editing = None;
                    }
                });
                Ok(())
            }
            Err(err) => Err(self.report(TaskError::from_backend(TaskOperation::Update, err))),
        }
    }

    /// Saves the edit buffer of the item in edit mode, if any.
    pub async fn save_edit(&self) -> Result<(), TaskError> {
        let editing = self.state.borrow().editing.clone();
        match editing {
            Some(edit) => self.update_task(&edit.task_id, &edit.text).await,
            None => {
                debug!("save requested with no item in edit mode");
                Ok(())
            }
        }
    }

    /// First step of a delete: remember which task awaits confirmation.
    pub fn request_delete(&self, id: TaskId) {
        self.state
            .send_modify(|state| state.pending_delete = Some(id));
    }

    pub fn cancel_delete(&self) {
        self.state.send_if_modified(|state| state.pending_delete.take().is_some());
    }

    /// Deletes the task awaiting confirmation. Returns `Ok(false)` when nothing
    /// was pending.
    pub async fn confirm_delete(&self) -> Result<bool, TaskError> {
        let mut pending = None;
        self.state.send_if_modified(|state| {
            pending = state.pending_delete.take();
            pending.is_some()
        });
        let Some(id) = pending else {
            return Ok(false);
        };

        match self.data.delete_task(&id).await {
            Ok(()) => {
                info!(task_id = %id, "deleted task");
                self.state.send_modify(|state| {
                    state.tasks.retain(|task| task.id != id);
                    if state.is_editing(&id) {
                        state.editing = None;
                    }
                });
                Ok(true)
            }
            Err(err) => Err(self.report(TaskError::from_backend(TaskOperation::Delete, err))),
        }
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_if_modified(|state| {
            if state.draft == text {
                return false;
            }
            state.draft = text;
            true
        });
    }

    pub fn start_editing(&self, task: &Task) {
        self.state.send_modify(|state| {
            state.editing = Some(EditState {
                task_id: task.id.clone(),
                text: task.task_title.clone(),
            });
        });
    }

    pub fn set_edit_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_if_modified(|state| match state.editing.as_mut() {
            Some(edit) if edit.text != text => {
                edit.text = text;
                true
            }
            _ => false,
        });
    }

    pub fn cancel_editing(&self) {
        self.state.send_if_modified(|state| state.editing.take().is_some());
    }

    pub fn dismiss_alert(&self) {
        self.state.send_if_modified(|state| state.alert.take().is_some());
    }

    /// Drops everything that belongs to the current user.
    pub fn reset(&self) {
        self.state.send_replace(TaskListState::default());
    }

    fn is_current_user(&self, user_id: UserId) -> bool {
        self.session
            .current_user()
            .is_some_and(|user| user.id == user_id)
    }

    fn report(&self, err: TaskError) -> TaskError {
        match &err {
            TaskError::Unexpected { detail, .. } => {
                warn!(error = %err, detail = %detail, "task operation failed")
            }
            _ => warn!(error = %err, "task operation failed"),
        }
        let alert = Alert::from(&err);
        self.state.send_modify(|state| state.alert = Some(alert));
        err
    }
}

/// Creation date as a local calendar date, e.g. `3/5/2024`.
pub fn format_created_date(created_at: &DateTime<Utc>) -> String {
    format_created_date_in(created_at, &Local)
}

pub fn format_created_date_in<Tz>(created_at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    created_at.with_timezone(tz).format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
#[path = "tests/tasks_tests.rs"]
mod tests;
