use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("HTTP error! Status: {status_code}, Body: {message}")]
    Api { status_code: u16, message: String },

    #[error("HTTP error during GET! Status: {status_code}, Body: {message}")]
    PollApi { status_code: u16, message: String },

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}
