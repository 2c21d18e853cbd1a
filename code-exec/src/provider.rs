use async_trait::async_trait;
use judge_client::{JudgeClient, RuntimeId, SubmissionStatus, SubmissionToken};

use crate::error::Error;

/// Remote service that runs submitted code in a sandbox
#[async_trait]
pub trait ExecutionProvider: Send + Sync {
    /// Queue a job and return its handle
    async fn submit(&self, source_code: &str, runtime_id: RuntimeId)
        -> Result<SubmissionToken, Error>;

    /// Current view of a queued job
    async fn fetch_status(&self, token: &SubmissionToken) -> Result<SubmissionStatus, Error>;
}

#[async_trait]
impl ExecutionProvider for JudgeClient {
    async fn submit(
        &self,
        source_code: &str,
        runtime_id: RuntimeId,
    ) -> Result<SubmissionToken, Error> {
        Ok(JudgeClient::submit(self, source_code, runtime_id).await?)
    }

    async fn fetch_status(&self, token: &SubmissionToken) -> Result<SubmissionStatus, Error> {
        Ok(JudgeClient::fetch_status(self, token).await?)
    }
}
