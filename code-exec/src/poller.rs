use judge_client::{StatusCode, SubmissionStatus, SubmissionToken};
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{error::Error, provider::ExecutionProvider, types::ExecutionStatus};

/// Fixed-interval polling budget for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    /// Upper bound on time spent sleeping between polls
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// The policy left over after `waited` of the budget was spent elsewhere
    pub fn remaining_after(&self, waited: Duration) -> PollPolicy {
        let consumed = match self.interval.as_nanos() {
            0 => 0,
            step => u32::try_from(waited.as_nanos() / step).unwrap_or(u32::MAX),
        };

        PollPolicy {
            interval: self.interval,
            max_attempts: self.max_attempts.saturating_sub(consumed),
        }
    }
}

/// Collapse a provider status code into the normalized status.
///
/// Every settled code other than "accepted" is a failure; the detail lives in
/// the error text.
pub fn normalize_status(status_id: u32) -> ExecutionStatus {
    match StatusCode::from(status_id) {
        code if code.is_pending() => ExecutionStatus::Running,
        StatusCode::Accepted => ExecutionStatus::Completed,
        _ => ExecutionStatus::Failed,
    }
}

/// Poll `token` until the provider reports a settled status.
///
/// Returns [`Error::Timeout`] once `policy.max_attempts` polls have all come
/// back pending, and [`Error::Cancelled`] as soon as `cancel` fires.
pub async fn poll_until_settled(
    provider: &dyn ExecutionProvider,
    token: &SubmissionToken,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<SubmissionStatus, Error> {
    for attempt in 1..=policy.max_attempts {
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            status = provider.fetch_status(token) => status?,
        };

        if normalize_status(status.status_id) != ExecutionStatus::Running {
            debug!(
                token = %token,
                attempt,
                status_id = status.status_id,
                "Submission settled"
            );
            return Ok(status);
        }

        debug!(token = %token, attempt, status_id = status.status_id, "Submission pending");

        if attempt < policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = time::sleep(policy.interval) => {}
            }
        }
    }

    warn!(
        token = %token,
        attempts = policy.max_attempts,
        "Submission still pending after poll budget"
    );
    Err(Error::Timeout {
        attempts: policy.max_attempts,
        interval: policy.interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{settled, token, ScriptedProvider};
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(5),
            max_attempts,
        }
    }

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status(1), ExecutionStatus::Running);
        assert_eq!(normalize_status(2), ExecutionStatus::Running);
        assert_eq!(normalize_status(3), ExecutionStatus::Completed);
        for id in [0, 4, 5, 6, 7, 11, 13, 14, 200] {
            assert_eq!(normalize_status(id), ExecutionStatus::Failed, "{}", id);
        }
    }

    #[test]
    fn test_default_budget_is_thirty_seconds() {
        assert_eq!(PollPolicy::default().budget(), Duration::from_secs(30));
    }

    #[test]
    fn test_remaining_after_spends_whole_intervals() {
        let policy = PollPolicy {
            interval: Duration::from_millis(100),
            max_attempts: 4,
        };

        assert_eq!(policy.remaining_after(Duration::ZERO).max_attempts, 4);
        assert_eq!(policy.remaining_after(Duration::from_millis(250)).max_attempts, 2);
        assert_eq!(policy.remaining_after(Duration::from_secs(5)).max_attempts, 0);
    }

    #[tokio::test]
    async fn test_keeps_polling_while_pending() {
        let provider = ScriptedProvider::new()
            .then_status(settled(1, 71))
            .then_status(settled(2, 71))
            .then_status(settled(3, 71));

        let status = poll_until_settled(
            &provider,
            &token(),
            &fast_policy(10),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(status.status_id, 3);
        assert_eq!(provider.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_first_settled_failure() {
        let provider = ScriptedProvider::new()
            .then_status(settled(2, 54))
            .then_status(settled(6, 54))
            .then_status(settled(3, 54));

        let status = poll_until_settled(
            &provider,
            &token(),
            &fast_policy(10),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(status.status_id, 6);
        assert_eq!(provider.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_times_out_after_attempt_ceiling() {
        let provider = ScriptedProvider::new();
        let policy = fast_policy(4);

        let started = Instant::now();
        let result =
            poll_until_settled(&provider, &token(), &policy, &CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(Error::Timeout {
                attempts: 4,
                ..
            })
        ));
        assert_eq!(provider.polls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_transport_error_stops_the_loop() {
        let provider = ScriptedProvider::new()
            .then_status(settled(1, 63))
            .then_error("HTTP error! Status: 502, Body: bad gateway");

        let result = poll_until_settled(
            &provider,
            &token(),
            &fast_policy(10),
            &CancellationToken::new(),
        )
        .await;

        match result {
            Err(Error::Transport(message)) => assert!(message.contains("bad gateway")),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(provider.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let provider = ScriptedProvider::new();
        let cancel = CancellationToken::new();
        let policy = PollPolicy {
            interval: Duration::from_secs(60),
            max_attempts: 30,
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = poll_until_settled(&provider, &token(), &policy, &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(provider.polls.load(Ordering::SeqCst), 1);
    }
}
