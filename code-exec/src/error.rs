use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Transport(String),

    #[error("Execution timeout - code took too long to execute")]
    Timeout { attempts: u32, interval: Duration },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Execution cancelled")]
    Cancelled,

    #[error("Execution service unavailable: {0}")]
    Unavailable(String),
}

impl From<judge_client::Error> for Error {
    fn from(err: judge_client::Error) -> Self {
        match err {
            judge_client::Error::MissingEnvVar(_) | judge_client::Error::Configuration(_) => {
                Error::Configuration(err.to_string())
            }
            other => Error::Transport(other.to_string()),
        }
    }
}
