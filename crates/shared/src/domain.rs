use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Server-assigned task key. Tables keyed by `bigint` send it as a JSON number,
/// tables keyed by `uuid` as a string; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for TaskId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTaskId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawTaskId::deserialize(deserializer)? {
            RawTaskId::Text(raw) => Self(raw),
            RawTaskId::Signed(raw) => Self(raw.to_string()),
            RawTaskId::Unsigned(raw) => Self(raw.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row of the `tasks` table as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_title: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// The authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_postgrest_task_row() {
        let raw = r#"{
            "id": 7,
            "task_title": "Buy milk",
            "user_id": "5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11",
            "created_at": "2024-03-05T09:15:00.123456+00:00"
        }"#;
        let task: Task = serde_json::from_str(raw).expect("task row");
        assert_eq!(task.id, TaskId::from(7));
        assert_eq!(task.id.to_string(), "7");
        assert_eq!(task.task_title, "Buy milk");
        assert_eq!(
            task.user_id.to_string(),
            "5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11"
        );
        assert_eq!(task.created_at.timestamp(), 1_709_630_100);
    }

    #[test]
    fn decodes_uuid_keyed_task_row() {
        let raw = r#"{
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "task_title": "Walk dog",
            "user_id": "5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11",
            "created_at": "2024-03-05T10:00:00+00:00"
        }"#;
        let task: Task = serde_json::from_str(raw).expect("task row");
        assert_eq!(task.id, TaskId::new("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert_eq!(task.id.as_str(), "0f8fad5b-d9cb-469f-a165-70867728950e");
    }

    #[test]
    fn rejects_non_scalar_task_id() {
        let raw = r#"{
            "id": {"value": 1},
            "task_title": "Broken",
            "user_id": "5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11",
            "created_at": "2024-03-05T10:00:00+00:00"
        }"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
    }

    #[test]
    fn identity_email_is_optional() {
        let raw = r#"{"id":"5b1c7e0a-2f44-4d3c-9a8e-0c2d6f1b9e11"}"#;
        let user: UserIdentity = serde_json::from_str(raw).expect("identity");
        assert!(user.email.is_none());
    }
}
