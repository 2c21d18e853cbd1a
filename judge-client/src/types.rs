use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-side identifier of a language/compiler pairing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(pub u32);

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub source_code: String,
    pub language_id: RuntimeId,
    pub stdin: String,
}

/// Handle for one queued job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionToken {
    pub token: String,
}

impl fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// The provider's current view of a submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    pub status_id: u32,
    #[serde(default)]
    pub language_id: Option<RuntimeId>,
    #[serde(default)]
    pub compile_output: Option<String>,
}

impl SubmissionStatus {
    pub fn status(&self) -> StatusCode {
        StatusCode::from(self.status_id)
    }
}

/// Provider status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    RuntimeError(RuntimeFault),
    InternalError,
    ExecFormatError,
    Unknown(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFault {
    Sigsegv,
    Sigxfsz,
    Sigfpe,
    Sigabrt,
    Nzec,
    Other,
}

impl From<u32> for StatusCode {
    fn from(id: u32) -> Self {
        match id {
            1 => StatusCode::InQueue,
            2 => StatusCode::Processing,
            3 => StatusCode::Accepted,
            4 => StatusCode::WrongAnswer,
            5 => StatusCode::TimeLimitExceeded,
            6 => StatusCode::CompilationError,
            7 => StatusCode::RuntimeError(RuntimeFault::Sigsegv),
            8 => StatusCode::RuntimeError(RuntimeFault::Sigxfsz),
            9 => StatusCode::RuntimeError(RuntimeFault::Sigfpe),
            10 => StatusCode::RuntimeError(RuntimeFault::Sigabrt),
            11 => StatusCode::RuntimeError(RuntimeFault::Nzec),
            12 => StatusCode::RuntimeError(RuntimeFault::Other),
            13 => StatusCode::InternalError,
            14 => StatusCode::ExecFormatError,
            other => StatusCode::Unknown(other),
        }
    }
}

impl StatusCode {
    /// Queued or processing; the job has not settled yet
    pub fn is_pending(&self) -> bool {
        matches!(self, StatusCode::InQueue | StatusCode::Processing)
    }

    pub fn description(&self) -> String {
        match self {
            StatusCode::InQueue => "In Queue".to_string(),
            StatusCode::Processing => "Processing".to_string(),
            StatusCode::Accepted => "Accepted".to_string(),
            StatusCode::WrongAnswer => "Wrong Answer".to_string(),
            StatusCode::TimeLimitExceeded => "Time Limit Exceeded".to_string(),
            StatusCode::CompilationError => "Compilation Error".to_string(),
            StatusCode::RuntimeError(fault) => {
                let name = match fault {
                    RuntimeFault::Sigsegv => "SIGSEGV",
                    RuntimeFault::Sigxfsz => "SIGXFSZ",
                    RuntimeFault::Sigfpe => "SIGFPE",
                    RuntimeFault::Sigabrt => "SIGABRT",
                    RuntimeFault::Nzec => "NZEC",
                    RuntimeFault::Other => "Other",
                };
                format!("Runtime Error ({})", name)
            }
            StatusCode::InternalError => "Internal Error".to_string(),
            StatusCode::ExecFormatError => "Exec Format Error".to_string(),
            StatusCode::Unknown(id) => format!("Unknown status {}", id),
        }
    }
}
