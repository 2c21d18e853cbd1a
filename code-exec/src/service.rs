use judge_client::{JudgeClient, JudgeConfig, SubmissionStatus};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    poller::{normalize_status, poll_until_settled, PollPolicy},
    provider::ExecutionProvider,
    registry::{to_language_id, to_runtime_id},
    types::{new_execution_id, now_millis, ExecutionResult, ExecutionStatus},
};

/// Turns a one-shot "run this code" request into a bounded asynchronous job.
///
/// `execute` never fails: transport errors, timeouts and cancellation all come
/// back as an [`ExecutionResult`] with [`ExecutionStatus::Failed`].
#[derive(Clone)]
pub struct CodeExecutionService {
    provider: Arc<dyn ExecutionProvider>,
    semaphore: Arc<Semaphore>,
    poll_policy: PollPolicy,
}

impl CodeExecutionService {
    pub fn new(
        provider: Arc<dyn ExecutionProvider>,
        poll_policy: PollPolicy,
        max_concurrent_executions: usize,
    ) -> Result<Self, Error> {
        if max_concurrent_executions == 0 {
            return Err(Error::Configuration(
                "max concurrent executions must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            provider,
            semaphore: Arc::new(Semaphore::new(max_concurrent_executions)),
            poll_policy,
        })
    }

    /// Build a service backed by a [`JudgeClient`]
    pub fn from_config(
        config: JudgeConfig,
        poll_policy: PollPolicy,
        max_concurrent_executions: usize,
    ) -> Result<Self, Error> {
        let client = JudgeClient::new(config)?;
        Self::new(Arc::new(client), poll_policy, max_concurrent_executions)
    }

    pub fn get_available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn execute(
        &self,
        code: &str,
        language: &str,
        user_id: Option<String>,
    ) -> ExecutionResult {
        self.execute_with_cancellation(code, language, user_id, &CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancellation(
        &self,
        code: &str,
        language: &str,
        user_id: Option<String>,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let id = new_execution_id();
        let timestamp = now_millis();

        debug!(execution_id = %id, language, "Starting code execution");

        let result = match self.run(code, language, cancel).await {
            Ok(status) => assemble(id, timestamp, code, language, status),
            Err(e) => {
                warn!(execution_id = %id, language, "Code execution failed: {}", e);
                let failed =
                    ExecutionResult::failed(code.to_string(), language.to_string(), e.to_string());
                ExecutionResult {
                    id,
                    timestamp,
                    ..failed
                }
            }
        };

        info!(
            execution_id = %result.id,
            language = %result.language,
            status = %result.status,
            "Code execution finished"
        );

        result.with_user(user_id)
    }

    async fn run(
        &self,
        code: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<SubmissionStatus, Error> {
        // Queueing for a permit draws on the same budget as polling
        let queued_at = Instant::now();
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            permit = time::timeout(self.poll_policy.budget(), self.semaphore.acquire()) => {
                match permit {
                    Ok(permit) => permit.map_err(|e| {
                        Error::Unavailable(format!("Failed to acquire execution permit: {}", e))
                    })?,
                    Err(_) => return Err(self.timeout()),
                }
            }
        };

        let poll_policy = self.poll_policy.remaining_after(queued_at.elapsed());
        if poll_policy.max_attempts == 0 {
            warn!("Poll budget spent waiting for an execution slot");
            return Err(self.timeout());
        }

        let runtime_id = to_runtime_id(language);
        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            token = self.provider.submit(code, runtime_id) => token?,
        };

        poll_until_settled(self.provider.as_ref(), &token, &poll_policy, cancel).await
    }

    fn timeout(&self) -> Error {
        Error::Timeout {
            attempts: self.poll_policy.max_attempts,
            interval: self.poll_policy.interval,
        }
    }
}

fn assemble(
    id: String,
    timestamp: i64,
    code: &str,
    requested_language: &str,
    status: SubmissionStatus,
) -> ExecutionResult {
    let normalized = normalize_status(status.status_id);
    let description = status.status().description();

    let error = non_empty(status.stderr)
        .or_else(|| non_empty(status.compile_output))
        .or_else(|| (normalized == ExecutionStatus::Failed).then_some(description));

    let language = to_language_id(
        status
            .language_id
            .unwrap_or_else(|| to_runtime_id(requested_language)),
    );

    ExecutionResult {
        id,
        code: code.to_string(),
        output: status.stdout.unwrap_or_default(),
        error,
        status: normalized,
        timestamp,
        user_id: None,
        language: language.to_string(),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}
