//! Bounded retry loop for async operations.
//!
//! `retry_async` calls an operation, checks the result with a predicate and,
//! while the predicate says no, sleeps a fixed delay before trying again.
//! The sleep is a tokio timer, so other tasks keep running while we wait.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Attempt budget exhausted. Displays as the configured failure message.
    #[error("{message}")]
    Timeout { message: String, attempts: u32 },
}

/// 재시도 정책 — 최대 시도 횟수, 고정 대기 시간, 실패 메시지
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub failure_message: String,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, failure_message: impl Into<String>) -> Self {
        Self {
            max_attempts,
            delay,
            failure_message: failure_message.into(),
        }
    }

    /// Attempts actually made. A zero budget still runs the operation once.
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Run `operation` until `predicate` accepts its result.
///
/// Makes at most `policy.max_attempts` calls with `policy.delay` between
/// consecutive calls. Success returns on the attempt that satisfied the
/// predicate, without a trailing delay. Exhaustion returns
/// [`RetryError::Timeout`] carrying `policy.failure_message`.
pub async fn retry_async<T, Op, Fut, P>(
    mut operation: Op,
    predicate: P,
    policy: &RetryPolicy,
) -> Result<T, RetryError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.effective_attempts();

    for attempt in 1..=max_attempts {
        let result = operation().await;
        if predicate(&result) {
            tracing::debug!("[Retry] succeeded on attempt {}/{}", attempt, max_attempts);
            return Ok(result);
        }

        if attempt < max_attempts {
            tracing::debug!(
                "[Retry] attempt {}/{} not satisfied, retrying in {:?}",
                attempt,
                max_attempts,
                policy.delay
            );
            tokio::time::sleep(policy.delay).await;
        }
    }

    tracing::warn!(
        "[Retry] giving up after {} attempts: {}",
        max_attempts,
        policy.failure_message
    );
    Err(RetryError::Timeout {
        message: policy.failure_message.clone(),
        attempts: max_attempts,
    })
}
