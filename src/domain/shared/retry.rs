use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::generation_error::{GenerationError, GenerationStage, StageError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded retry applied to every external call in the pipeline.
///
/// Each attempt runs under `attempt_timeout` and races the cancellation token.
/// Between attempts the policy sleeps `base_delay * 2^attempt`, capped at
/// `max_delay`, plus up to `base_delay / 2` of jitter when enabled.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
            attempt_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl RetryPolicy {
    /// No delay and no timeout; handy for tests and local runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
            attempt_timeout: None,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let capped = self
            .base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if !self.jitter {
            return capped;
        }

        let jitter_range_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX) / 2;
        if jitter_range_ms == 0 {
            return capped;
        }

        let jitter_ms = rand::rng().random_range(0..jitter_range_ms);
        (capped + Duration::from_millis(jitter_ms)).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
    ///
    /// The returned error carries the stage and the error of the last attempt as-is.
    pub async fn retry<T, F, Fut>(
        &self,
        stage: GenerationStage,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, StageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            if token.is_cancelled() {
                return Err(StageError {
                    stage,
                    attempts: attempt,
                    source: GenerationError::Cancelled,
                });
            }

            attempt += 1;
            let outcome = self.run_attempt(token, operation()).await;

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= max_attempts {
                tracing::warn!(
                    stage = %stage,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %err,
                    "Stage failed"
                );
                return Err(StageError {
                    stage,
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.delay_for_attempt(attempt - 1);
            tracing::warn!(
                stage = %stage,
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying after failed attempt"
            );

            tokio::select! {
                _ = token.cancelled() => {
                    return Err(StageError {
                        stage,
                        attempts: attempt,
                        source: GenerationError::Cancelled,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn run_attempt<T, Fut>(
        &self,
        token: &CancellationToken,
        attempt: Fut,
    ) -> Result<T, GenerationError>
    where
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let timed = async {
            match self.attempt_timeout {
                Some(limit) => tokio::time::timeout(limit, attempt)
                    .await
                    .unwrap_or(Err(GenerationError::Timeout(limit))),
                None => attempt.await,
            }
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(GenerationError::Cancelled),
            outcome = timed => outcome,
        }
    }
}
