//! UI/backend events and error modeling for the desktop GUI controller.

use std::sync::Arc;

use client_core::{SessionProvider, TaskListController};

pub enum UiEvent {
    Info(String),
    /// The worker finished startup; the UI renders from these from now on.
    BackendReady {
        session: Arc<SessionProvider>,
        controller: Arc<TaskListController>,
    },
    SignUpPending {
        email: Option<String>,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Configuration,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    SignIn,
    SignUp,
    SignOut,
}

pub fn classify_sign_in_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure") {
        "Backend worker startup failure; check the backend configuration and relaunch.".to_string()
    } else if lower.contains("transport failure")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Backend unreachable; check the project URL and network, then retry.".to_string()
    } else {
        format!("Sign-in failed: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid login credentials")
            || message_lower.contains("email not confirmed")
            || message_lower.contains("already registered")
            || message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("jwt")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("anon key")
            || message_lower.contains("invalid backend url")
            || message_lower.contains("table name")
        {
            UiErrorCategory::Configuration
        } else if message_lower.contains("password")
            || message_lower.contains("email")
            || message_lower.contains("missing")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("transport")
            || message_lower.contains("unreachable")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text for the sign-in screen banner.
    pub fn banner_text(&self) -> String {
        match self.context {
            UiErrorContext::SignIn | UiErrorContext::BackendStartup => {
                classify_sign_in_failure(&self.message)
            }
            UiErrorContext::SignUp => format!("Sign-up failed: {}", self.message),
            UiErrorContext::SignOut => {
                format!("Signed out locally; the backend reported: {}", self.message)
            }
        }
    }
}
