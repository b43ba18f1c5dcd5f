//! In-memory stand-ins for the hosted backend used across unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{
    domain::{Task, TaskId, UserId, UserIdentity},
    protocol::{AuthSession, NewTaskRow, PasswordCredentials, SignUpResponse, TaskTitlePatch},
};
use uuid::Uuid;

use crate::{AuthBackend, BackendError, RemoteDataService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    Select,
    Insert,
    Update,
    Delete,
    SignIn,
    SignUp,
    SignOut,
}

#[derive(Default)]
struct FakeState {
    rows: Vec<Task>,
    next_id: i64,
    inserted: i64,
    calls: Vec<FakeOp>,
    failures: HashMap<FakeOp, BackendError>,
    accounts: HashMap<String, (String, UserIdentity)>,
    session: Option<AuthSession>,
    confirm_sign_ups: bool,
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
    select_gate: Mutex<Option<Arc<Semaphore>>>,
}

/// Holds selects until released. Dropping it lets every waiting select through.
pub struct SelectGate(Arc<Semaphore>);

impl SelectGate {
    /// Lets the longest-waiting select run.
    pub fn release_one(&self) {
        self.0.add_permits(1);
    }
}

impl Drop for SelectGate {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                next_id: 1,
                ..FakeState::default()
            }),
            select_gate: Mutex::new(None),
        })
    }

    pub fn register(&self, email: &str, password: &str) -> UserIdentity {
        let user = UserIdentity {
            id: UserId(Uuid::new_v4()),
            email: Some(email.to_string()),
        };
        self.state.lock().expect("fake state").accounts.insert(
            email.to_string(),
            (password.to_string(), user.clone()),
        );
        user
    }

    /// Every later call of `op` fails with `err` until [`Self::recover`].
    pub fn fail(&self, op: FakeOp, err: BackendError) {
        self.state
            .lock()
            .expect("fake state")
            .failures
            .insert(op, err);
    }

    pub fn recover(&self, op: FakeOp) {
        self.state.lock().expect("fake state").failures.remove(&op);
    }

    pub fn require_confirmation(&self) {
        self.state.lock().expect("fake state").confirm_sign_ups = true;
    }

    pub fn seed(&self, owner: UserId, title: &str, created_at: DateTime<Utc>) -> TaskId {
        let mut state = self.state.lock().expect("fake state");
        let id = TaskId::from(state.next_id);
        state.next_id += 1;
        state.rows.push(Task {
            id: id.clone(),
            task_title: title.to_string(),
            user_id: owner,
            created_at,
        });
        id
    }

    pub fn rows(&self) -> Vec<Task> {
        self.state.lock().expect("fake state").rows.clone()
    }

    pub fn calls(&self) -> Vec<FakeOp> {
        self.state.lock().expect("fake state").calls.clone()
    }

    pub fn hold_selects(&self) -> SelectGate {
        let permits = Arc::new(Semaphore::new(0));
        *self.select_gate.lock().expect("select gate") = Some(Arc::clone(&permits));
        SelectGate(permits)
    }

    fn begin(&self, op: FakeOp) -> Result<std::sync::MutexGuard<'_, FakeState>, BackendError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.push(op);
        if let Some(err) = state.failures.get(&op).cloned() {
            return Err(err);
        }
        Ok(state)
    }
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[async_trait]
impl RemoteDataService for FakeBackend {
    async fn select_tasks(&self, owner: UserId) -> Result<Vec<Task>, BackendError> {
        let gate = self.select_gate.lock().expect("select gate").clone();
        if let Some(gate) = gate {
            // A closed gate lets the select through.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        let state = self.begin(FakeOp::Select)?;
        let mut rows: Vec<Task> = state
            .rows
            .iter()
            .filter(|task| task.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_task(&self, row: &NewTaskRow) -> Result<Task, BackendError> {
        let mut state = self.begin(FakeOp::Insert)?;
        let task = Task {
            id: TaskId::from(state.next_id),
            task_title: row.task_title.clone(),
            user_id: row.user_id,
            created_at: at(12) + Duration::minutes(state.inserted),
        };
        state.next_id += 1;
        state.inserted += 1;
        state.rows.push(task.clone());
        Ok(task)
    }

    async fn update_task_title(
        &self,
        id: &TaskId,
        patch: &TaskTitlePatch,
    ) -> Result<(), BackendError> {
        let mut state = self.begin(FakeOp::Update)?;
        if let Some(task) = state.rows.iter_mut().find(|task| task.id == *id) {
            task.task_title = patch.task_title.clone();
        }
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), BackendError> {
        let mut state = self.begin(FakeOp::Delete)?;
        state.rows.retain(|task| task.id != *id);
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn current_session(&self) -> Result<Option<AuthSession>, BackendError> {
        Ok(self.state.lock().expect("fake state").session.clone())
    }

    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<AuthSession, BackendError> {
        let mut state = self.begin(FakeOp::SignIn)?;
        let user = match state.accounts.get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => user.clone(),
            _ => return Err(BackendError::api(400, "Invalid login credentials")),
        };
        let session = session_for(user);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<SignUpResponse, BackendError> {
        let mut state = self.begin(FakeOp::SignUp)?;
        if state.accounts.contains_key(&credentials.email) {
            return Err(BackendError::api(422, "User already registered"));
        }
        let user = UserIdentity {
            id: UserId(Uuid::new_v4()),
            email: Some(credentials.email.clone()),
        };
        state.accounts.insert(
            credentials.email.clone(),
            (credentials.password.clone(), user.clone()),
        );
        if state.confirm_sign_ups {
            return Ok(SignUpResponse::PendingConfirmation(user));
        }
        let session = session_for(user);
        state.session = Some(session.clone());
        Ok(SignUpResponse::Session(session))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.push(FakeOp::SignOut);
        state.session = None;
        match state.failures.get(&FakeOp::SignOut) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn session_for(user: UserIdentity) -> AuthSession {
    AuthSession {
        access_token: format!("token-{}", user.id),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        refresh_token: None,
        user,
    }
}
