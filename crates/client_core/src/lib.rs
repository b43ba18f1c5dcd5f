use async_trait::async_trait;
use shared::{
    domain::{Task, TaskId, UserId},
    protocol::{AuthSession, NewTaskRow, PasswordCredentials, SignUpResponse, TaskTitlePatch},
};

pub mod config;
pub mod error;
pub mod rest;
pub mod session;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use config::{load_settings, load_settings_from, ClientSettings};
pub use error::{Alert, BackendError, TaskError, TaskOperation};
pub use rest::SupabaseClient;
pub use session::{SessionEvent, SessionProvider, SessionSnapshot, SignUpOutcome};
pub use tasks::{
    format_created_date, format_created_date_in, EditState, TaskListController, TaskListState,
};

/// Table-level CRUD against the hosted database.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// All tasks owned by `owner`, most recently created first.
    async fn select_tasks(&self, owner: UserId) -> Result<Vec<Task>, BackendError>;
    /// Inserts one row and returns it as stored.
    async fn insert_task(&self, row: &NewTaskRow) -> Result<Task, BackendError>;
    async fn update_task_title(&self, id: &TaskId, patch: &TaskTitlePatch)
        -> Result<(), BackendError>;
    async fn delete_task(&self, id: &TaskId) -> Result<(), BackendError>;
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn current_session(&self) -> Result<Option<AuthSession>, BackendError>;
    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<AuthSession, BackendError>;
    async fn sign_up(&self, credentials: &PasswordCredentials)
        -> Result<SignUpResponse, BackendError>;
    async fn sign_out(&self) -> Result<(), BackendError>;
}
