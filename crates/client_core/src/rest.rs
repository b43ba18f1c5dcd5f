//! HTTP client for a Supabase-style deployment: PostgREST under `/rest/v1/`
//! and the GoTrue auth service under `/auth/v1/`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, RequestBuilder, Response};
use shared::{
    domain::{Task, TaskId, UserId},
    error::RemoteErrorBody,
    protocol::{
        AuthSession, NewTaskRow, PasswordCredentials, RefreshTokenGrant, SignUpResponse,
        TaskTitlePatch,
    },
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientSettings, AuthBackend, BackendError, RemoteDataService};

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const SINGLE_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";
/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct StoredSession {
    auth: AuthSession,
    expires_at: Option<Instant>,
}

impl StoredSession {
    fn new(auth: AuthSession) -> Self {
        let expires_at = auth
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(u64::try_from(secs).unwrap_or(0)));
        Self { auth, expires_at }
    }

    fn refresh_token_if_expiring(&self) -> Option<&str> {
        let expiring = self
            .expires_at
            .is_some_and(|at| at.saturating_duration_since(Instant::now()) <= REFRESH_MARGIN);
        if expiring {
            self.auth.refresh_token.as_deref()
        } else {
            None
        }
    }
}

pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    tasks_table: String,
    session: RwLock<Option<StoredSession>>,
    refresh_lock: Mutex<()>,
}

impl SupabaseClient {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        settings.validate()?;
        Ok(Self {
            http: Client::new(),
            base_url: settings.base_url()?,
            anon_key: settings.anon_key.clone(),
            tasks_table: settings.tasks_table.trim().to_string(),
            session: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|stored| stored.auth.access_token.clone())
    }

    /// Access token for the next request, refreshed first when it is about to
    /// expire. A failed refresh falls back to the current token.
    async fn bearer_token(&self) -> String {
        let _refreshing = self.refresh_lock.lock().await;
        let refresh_token = match self.session.read().await.as_ref() {
            None => return self.anon_key.clone(),
            Some(stored) => match stored.refresh_token_if_expiring() {
                None => return stored.auth.access_token.clone(),
                Some(token) => token.to_string(),
            },
        };

        match self.refresh_session(&refresh_token).await {
            Ok(session) => session.access_token,
            Err(err) => {
                warn!(error = %err, "access token refresh failed");
                self.access_token()
                    .await
                    .unwrap_or_else(|| self.anon_key.clone())
            }
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.anon_key)
            .json(&RefreshTokenGrant { refresh_token })
            .send()
            .await?;
        let session: AuthSession = ensure_success(response).await?.json().await?;

        let mut stored = self.session.write().await;
        // Signed out while the refresh was in flight.
        if stored.is_none() {
            return Err(BackendError::NotSignedIn);
        }
        *stored = Some(StoredSession::new(session.clone()));
        debug!(user_id = %session.user.id, "refreshed access token");
        Ok(session)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|err| BackendError::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    fn table_endpoint(&self) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{}", self.tasks_table))
    }

    /// Table requests run as the signed-in user when there is one, otherwise
    /// with the anon key.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.bearer_token().await;
        request
            .header(API_KEY_HEADER, &self.anon_key)
            .bearer_auth(token)
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<RemoteErrorBody>(&raw).unwrap_or_default();
    let message = body
        .human_message()
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(BackendError::Api {
        status: status.as_u16(),
        code: body.code_string(),
        message,
    })
}

#[async_trait]
impl RemoteDataService for SupabaseClient {
    async fn select_tasks(&self, owner: UserId) -> Result<Vec<Task>, BackendError> {
        let owner_filter = format!("eq.{owner}");
        let request = self.http.get(self.table_endpoint()?).query(&[
            ("select", "*"),
            ("user_id", owner_filter.as_str()),
            ("order", "created_at.desc"),
        ]);
        let response = self.authorized(request).await.send().await?;
        let tasks: Option<Vec<Task>> = ensure_success(response).await?.json().await?;
        let tasks = tasks.unwrap_or_default();
        debug!(count = tasks.len(), "selected tasks");
        Ok(tasks)
    }

    async fn insert_task(&self, row: &NewTaskRow) -> Result<Task, BackendError> {
        let request = self
            .http
            .post(self.table_endpoint()?)
            .header(PREFER_HEADER, "return=representation")
            .header(ACCEPT, SINGLE_OBJECT_MEDIA_TYPE)
            .json(&[row]);
        let response = self.authorized(request).await.send().await?;
        let task: Task = ensure_success(response).await?.json().await?;
        debug!(task_id = %task.id, "inserted task");
        Ok(task)
    }

    async fn update_task_title(
        &self,
        id: &TaskId,
        patch: &TaskTitlePatch,
    ) -> Result<(), BackendError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .http
            .patch(self.table_endpoint()?)
            .query(&[("id", id_filter.as_str())])
            .header(PREFER_HEADER, "return=minimal")
            .json(patch);
        let response = self.authorized(request).await.send().await?;
        ensure_success(response).await?;
        debug!(task_id = %id, "updated task title");
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), BackendError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .http
            .delete(self.table_endpoint()?)
            .query(&[("id", id_filter.as_str())]);
        let response = self.authorized(request).await.send().await?;
        ensure_success(response).await?;
        debug!(task_id = %id, "deleted task");
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn current_session(&self) -> Result<Option<AuthSession>, BackendError> {
        Ok(self
            .session
            .read()
            .await
            .as_ref()
            .map(|stored| stored.auth.clone()))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.anon_key)
            .json(credentials)
            .send()
            .await?;
        let session: AuthSession = ensure_success(response).await?.json().await?;
        *self.session.write().await = Some(StoredSession::new(session.clone()));
        debug!(user_id = %session.user.id, "password sign-in accepted");
        Ok(session)
    }

    async fn sign_up(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<SignUpResponse, BackendError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/signup")?)
            .header(API_KEY_HEADER, &self.anon_key)
            .json(credentials)
            .send()
            .await?;
        let outcome: SignUpResponse = ensure_success(response).await?.json().await?;
        if let SignUpResponse::Session(session) = &outcome {
            *self.session.write().await = Some(StoredSession::new(session.clone()));
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        // The local token is dropped even when the logout request fails.
        let Some(stored) = self.session.write().await.take() else {
            return Ok(());
        };
        let response = self
            .http
            .post(self.endpoint("auth/v1/logout")?)
            .header(API_KEY_HEADER, &self.anon_key)
            .bearer_auth(&stored.auth.access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
