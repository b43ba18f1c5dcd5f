use serde::{Deserialize, Serialize};

use crate::domain::{UserId, UserIdentity};

/// Insert payload for a new task; `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskRow {
    pub task_title: String,
    pub user_id: UserId,
}

/// Partial update touching only the title column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTitlePatch {
    pub task_title: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

impl PasswordCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of the password grant on the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserIdentity,
}

/// Body of the `refresh_token` grant.
#[derive(Debug, Serialize)]
pub struct RefreshTokenGrant<'a> {
    pub refresh_token: &'a str,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Sign-up returns a full session on auto-confirming deployments and only the
/// created user when email confirmation is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(AuthSession),
    PendingConfirmation(UserIdentity),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_response_distinguishes_session_from_bare_user() {
        let session = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": {"id": "5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11", "email": "a@example.com"}
        }"#;
        let parsed: SignUpResponse = serde_json::from_str(session).expect("session");
        assert!(matches!(parsed, SignUpResponse::Session(_)));

        let pending = r#"{"id": "5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11", "email": "a@example.com"}"#;
        let parsed: SignUpResponse = serde_json::from_str(pending).expect("user");
        assert!(matches!(parsed, SignUpResponse::PendingConfirmation(_)));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = PasswordCredentials::new("a@example.com", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("a@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
