use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::JudgeConfig,
    error::Error,
    types::{RuntimeId, SubmissionRequest, SubmissionStatus, SubmissionToken},
};

const STATUS_FIELDS: &str = "stdout,stderr,status_id,language_id,compile_output";

/// Client for the remote execution provider.
///
/// Holds no per-call state; one instance can be shared by every in-flight
/// execution.
pub struct JudgeClient {
    client: Client,
    config: JudgeConfig,
}

impl JudgeClient {
    /// Create a new JudgeClient with the given configuration
    pub fn new(config: JudgeConfig) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Configuration("API key must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self { client, config })
    }

    /// Queue `source_code` for execution without waiting for it to finish
    pub async fn submit(
        &self,
        source_code: &str,
        language_id: RuntimeId,
    ) -> Result<SubmissionToken, Error> {
        let body = SubmissionRequest {
            source_code: source_code.to_string(),
            language_id,
            stdin: String::new(),
        };

        let response = self
            .client
            .post(format!("{}/submissions/", self.config.api_url))
            .query(&[("base64_encoded", "false"), ("wait", "false")])
            .header("Content-Type", "application/json")
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.api_host)
            .json(&body)
            .send()
            .await?;

        let token: SubmissionToken = Self::decode(response, |status_code, message| Error::Api {
            status_code,
            message,
        })
        .await?;
        debug!(token = %token, language_id = %language_id, "Submission queued");
        Ok(token)
    }

    /// Fetch the provider's current view of a submission
    pub async fn fetch_status(&self, token: &SubmissionToken) -> Result<SubmissionStatus, Error> {
        let response = self
            .client
            .get(format!("{}/submissions/{}", self.config.api_url, token.token))
            .query(&[("base64_encoded", "false"), ("fields", STATUS_FIELDS)])
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.api_host)
            .send()
            .await?;

        Self::decode(response, |status_code, message| Error::PollApi {
            status_code,
            message,
        })
        .await
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        rejected: fn(u16, String) -> Error,
    ) -> Result<T, Error> {
        let status = response.status();
        if !status.is_success() {
            return Err(rejected(status.as_u16(), response.text().await?));
        }

        response.json::<T>().await.map_err(Error::HttpClient)
    }
}
