//! Polling of long-running operations
//!
//! Some ARM operations (notably creating a storage account with a name that
//! was deleted moments before) take longer than any client-side polling
//! timeout, with no known upper bound. Timing out would leave an operation in
//! flight with no resource id recorded locally, and the next run would conflict
//! with it. [`IndefinitePoller`] therefore restarts the single-shot
//! [`PollAsNeeded`] primitive for as long as the operation reports
//! `202 Accepted`, and only returns on a terminal outcome.
//!
//! There is no cancellation. Callers that need a bound wrap the future in
//! their own deadline and treat expiry as "still pending".

use crate::error::RemoteError;
use async_trait::async_trait;
use std::time::Duration;

/// A response to an operation that may complete asynchronously
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResponse {
    /// HTTP status of the most recent response
    pub status: u16,
    /// Path of the request that started the operation
    pub request_path: String,
    /// `Azure-AsyncOperation` or `Location` header to poll
    pub poll_url: Option<String>,
    /// `Retry-After` header
    pub retry_after: Option<Duration>,
}

impl OperationResponse {
    pub fn new(status: u16, request_path: impl Into<String>) -> Self {
        Self {
            status,
            request_path: request_path.into(),
            poll_url: None,
            retry_after: None,
        }
    }

    pub fn with_poll_url(mut self, url: impl Into<String>) -> Self {
        self.poll_url = Some(url.into());
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

/// Single-shot polling primitive
///
/// Polls until the operation leaves `202 Accepted` or the primitive's own
/// polling window runs out. Running out is reported as a failure whose status
/// is still `202`; a final status outside `acceptable_codes` is a failure
/// carrying that status.
#[async_trait]
pub trait PollAsNeeded: Send + Sync {
    async fn poll_as_needed(
        &self,
        response: &OperationResponse,
        acceptable_codes: &[u16],
    ) -> Result<OperationResponse, RemoteError>;
}

/// Delay source used between polls
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling window of the single-shot primitive
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Delay between polls when the response carries no `Retry-After`
    pub delay: Duration,

    /// How long a single `poll_as_needed` call keeps polling before giving up
    pub duration: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            duration: Duration::from_secs(15 * 60),
        }
    }
}

/// State of an [`IndefinitePoller`] run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Waiting on attempt number `attempt` of the primitive
    Polling { attempt: u64 },
    Succeeded(OperationResponse),
    Failed(RemoteError),
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }

    /// Next state after attempt `attempt` returned `outcome`
    pub fn advance(attempt: u64, outcome: Result<OperationResponse, RemoteError>) -> Self {
        match outcome {
            Ok(response) => PollState::Succeeded(response),
            Err(err) if err.is_in_progress() => PollState::Polling {
                attempt: attempt + 1,
            },
            Err(err) => PollState::Failed(err),
        }
    }
}

/// Retries [`PollAsNeeded`] until the operation is no longer in progress
pub struct IndefinitePoller<'a, P: PollAsNeeded + ?Sized> {
    primitive: &'a P,
}

impl<'a, P: PollAsNeeded + ?Sized> IndefinitePoller<'a, P> {
    pub fn new(primitive: &'a P) -> Self {
        Self { primitive }
    }

    /// Block until the operation reaches a terminal state
    ///
    /// Only the in-progress condition is retried, immediately and without
    /// limit. Every other failure is returned untouched on first occurrence.
    pub async fn await_completion(
        &self,
        initial: &OperationResponse,
        acceptable_codes: &[u16],
    ) -> Result<OperationResponse, RemoteError> {
        let mut state = PollState::Polling { attempt: 1 };

        loop {
            state = match state {
                PollState::Polling { attempt } => {
                    let outcome = self
                        .primitive
                        .poll_as_needed(initial, acceptable_codes)
                        .await;
                    let next = PollState::advance(attempt, outcome);
                    if !next.is_terminal() {
                        tracing::debug!(
                            "Starting new polling loop for {:?} (attempt {})",
                            initial.request_path,
                            attempt + 1
                        );
                    }
                    next
                }
                PollState::Succeeded(response) => return Ok(response),
                PollState::Failed(err) => return Err(err),
            };
        }
    }
}
