use serde::{Deserialize, Serialize};

/// Error body shapes used by the hosted backend.
///
/// The table API answers `{message, code, details, hint}`, while the auth
/// service uses `msg`, `error` or `error_description` depending on the
/// endpoint. Every field is optional so any of them decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RemoteErrorBody {
    /// First human-readable message present in the body.
    pub fn human_message(&self) -> Option<&str> {
        [
            self.message.as_deref(),
            self.msg.as_deref(),
            self.error_description.as_deref(),
            self.error.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|m| !m.is_empty())
    }

    pub fn code_string(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_table_api_message() {
        let body: RemoteErrorBody = serde_json::from_str(
            r#"{"message":"new row violates row-level security policy","code":"42501","hint":null}"#,
        )
        .expect("body");
        assert_eq!(
            body.human_message(),
            Some("new row violates row-level security policy")
        );
        assert_eq!(body.code_string().as_deref(), Some("42501"));
    }

    #[test]
    fn falls_back_to_auth_error_description() {
        let body: RemoteErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .expect("body");
        assert_eq!(body.human_message(), Some("Invalid login credentials"));
    }

    #[test]
    fn numeric_code_is_stringified() {
        let body: RemoteErrorBody =
            serde_json::from_str(r#"{"code":400,"msg":"Signup requires a valid password"}"#)
                .expect("body");
        assert_eq!(body.code_string().as_deref(), Some("400"));
        assert_eq!(body.human_message(), Some("Signup requires a valid password"));
    }
}
