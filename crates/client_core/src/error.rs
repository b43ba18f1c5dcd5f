use thiserror::Error;

/// Failure reported by one of the hosted backend collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend answered with a structured error.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("no signed-in user")]
    NotSignedIn,
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Which task-list operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOperation {
    Fetch,
    Add,
    Update,
    Delete,
}

impl TaskOperation {
    fn remote_prefix(self) -> &'static str {
        match self {
            Self::Fetch => "Failed to fetch tasks",
            Self::Add => "Failed to add task",
            Self::Update => "Failed to update task",
            Self::Delete => "Failed to delete task",
        }
    }

    fn unexpected_message(self) -> &'static str {
        match self {
            Self::Fetch => "An unexpected error occurred while fetching tasks",
            Self::Add => "An unexpected error occurred while adding task",
            Self::Update => "An unexpected error occurred while updating task",
            Self::Delete => "An unexpected error occurred while deleting task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("{}: {message}", .operation.remote_prefix())]
    Remote {
        operation: TaskOperation,
        message: String,
    },
    #[error("{}", .operation.unexpected_message())]
    Unexpected {
        operation: TaskOperation,
        detail: String,
    },
}

impl TaskError {
    /// Structured backend errors keep their message; everything else becomes
    /// the generic per-operation message.
    pub fn from_backend(operation: TaskOperation, err: BackendError) -> Self {
        match err {
            BackendError::Api { message, .. } => Self::Remote { operation, message },
            other => Self::Unexpected {
                operation,
                detail: other.to_string(),
            },
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Modal notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
        }
    }
}

impl From<&TaskError> for Alert {
    fn from(err: &TaskError) -> Self {
        Alert::error(err.user_message())
    }
}
