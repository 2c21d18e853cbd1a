use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Code execution request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Source code to execute
    pub code: String,
    /// Language id as chosen in the editor
    pub language: String,
}

/// Normalized execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Running => f.write_str("running"),
            ExecutionStatus::Completed => f.write_str("completed"),
            ExecutionStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome of one execution request. Never mutated once appended to a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    /// Source code that was submitted
    pub code: String,
    /// Program output (stdout)
    pub output: String,
    /// stderr, compiler diagnostics or failure explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: ExecutionStatus,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub language: String,
}

impl ExecutionResult {
    /// Terminal failure with an empty output and a fresh id/timestamp
    pub fn failed(code: String, language: String, message: String) -> Self {
        Self {
            id: new_execution_id(),
            code,
            output: String::new(),
            error: Some(message),
            status: ExecutionStatus::Failed,
            timestamp: now_millis(),
            user_id: None,
            language,
        }
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }
}

pub(crate) fn new_execution_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
