use std::time::Duration;

use crate::error::Error;

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

pub const DEFAULT_API_URL: &str = "https://judge0-ce.p.rapidapi.com";
pub const DEFAULT_API_HOST: &str = "judge0-ce.p.rapidapi.com";

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Base URL for the execution provider API
    pub api_url: String,

    /// API key for authentication
    pub api_key: String,

    /// Host identifier sent alongside the key
    pub api_host: String,

    /// Per-request timeout for the underlying HTTP client
    pub request_timeout: Duration,
}

impl JudgeConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
            api_host: DEFAULT_API_HOST.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Read the API key from the process environment.
    ///
    /// A missing or blank key is a hard failure: nothing downstream can talk to
    /// the provider without it.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(Error::MissingEnvVar(API_KEY_ENV.to_string())),
        }
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_host(mut self, api_host: String) -> Self {
        self.api_host = api_host;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
