//! Poll-until-done loop with exponential backoff.
//!
//! Asynchronous jobs (batch inference, text extraction) return immediately
//! with an in-progress status; callers then poll until the resource reaches
//! a terminal state. The loop shape is shared, only the fetch operation and
//! terminal-state classification differ per resource.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::errors::{WatsonxError, WatsonxResult};

/// Classification of a fetched resource's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Not yet terminal, keep polling.
    Pending,
    /// Terminal success.
    Succeeded,
    /// Terminal failure, with the remote-supplied detail.
    Failed(String),
}

/// A remote resource whose status can be polled until terminal.
pub trait PollableResource {
    /// Identifier used in timeout and failure errors.
    fn job_id(&self) -> Option<String>;

    /// Classifies the current status.
    fn poll_state(&self) -> PollState;
}

/// Backoff parameters for a poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the first fetch.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub growth_factor: u32,
    /// Upper bound on the per-attempt delay.
    pub max_delay: Duration,
    /// Overall deadline measured from loop start.
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            growth_factor: 2,
            max_delay: Duration::from_secs(30),
            deadline: Duration::from_secs(600),
        }
    }
}

impl PollConfig {
    /// Sets the overall deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }
}

/// Re-invokes a status fetch with doubling delay until the resource is
/// terminal or the deadline passes.
///
/// Each iteration first checks the deadline, then sleeps, then fetches, so
/// a fetch that returns non-terminal `k` times costs exactly `k + 1`
/// fetches before success. The sleep is an ordinary tokio sleep, so
/// dropping the returned future aborts a long poll promptly.
///
/// Timeout surfaces as [`WatsonxError::PollTimeout`], remote failure as
/// [`WatsonxError::JobFailed`]; the two are never conflated.
pub async fn poll_until_done<R, F, Fut>(
    operation: &str,
    config: &PollConfig,
    mut fetch: F,
) -> WatsonxResult<R>
where
    R: PollableResource,
    F: FnMut() -> Fut,
    Fut: Future<Output = WatsonxResult<R>>,
{
    let start = Instant::now();
    let mut delay = config.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        if start.elapsed() >= config.deadline {
            return Err(WatsonxError::PollTimeout {
                operation: operation.to_string(),
                elapsed: start.elapsed(),
            });
        }

        tokio::time::sleep(delay).await;
        delay = (delay * config.growth_factor).min(config.max_delay);
        attempt += 1;

        let resource = fetch().await?;
        match resource.poll_state() {
            PollState::Pending => {
                debug!(operation, attempt, next_delay = ?delay, "job still in progress");
            }
            PollState::Succeeded => {
                debug!(operation, attempt, "job completed");
                return Ok(resource);
            }
            PollState::Failed(message) => {
                return Err(WatsonxError::JobFailed {
                    message,
                    job_id: resource.job_id(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FakeJob {
        state: PollState,
    }

    impl PollableResource for FakeJob {
        fn job_id(&self) -> Option<String> {
            Some("job-1".to_string())
        }

        fn poll_state(&self) -> PollState {
            self.state.clone()
        }
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            initial_delay: Duration::from_millis(1),
            growth_factor: 2,
            max_delay: Duration::from_millis(4),
            deadline: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_non_terminal_k_times_then_success_fetches_k_plus_one() {
        let fetches = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fetches);

        let job = poll_until_done("batch", &fast_config(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(FakeJob {
                    state: if n < 3 {
                        PollState::Pending
                    } else {
                        PollState::Succeeded
                    },
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(job.poll_state(), PollState::Succeeded);
        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_never_terminal_hits_deadline() {
        let config = PollConfig {
            initial_delay: Duration::from_millis(1),
            growth_factor: 2,
            max_delay: Duration::from_millis(2),
            deadline: Duration::from_millis(20),
        };

        let result = poll_until_done("extraction", &config, || async {
            Ok(FakeJob {
                state: PollState::Pending,
            })
        })
        .await;

        assert!(matches!(
            result,
            Err(WatsonxError::PollTimeout { operation, .. }) if operation == "extraction"
        ));
    }

    #[tokio::test]
    async fn test_terminal_failure_surfaces_remote_detail() {
        let result = poll_until_done("batch", &fast_config(), || async {
            Ok(FakeJob {
                state: PollState::Failed("document corrupted".to_string()),
            })
        })
        .await;

        match result {
            Err(WatsonxError::JobFailed { message, job_id }) => {
                assert_eq!(message, "document corrupted");
                assert_eq!(job_id.as_deref(), Some("job-1"));
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let result: WatsonxResult<FakeJob> =
            poll_until_done("batch", &fast_config(), || async {
                Err(WatsonxError::stream("connection dropped"))
            })
            .await;

        assert!(matches!(result, Err(WatsonxError::Stream { .. })));
    }

    #[tokio::test]
    async fn test_delay_doubles_up_to_cap() {
        let mut config = fast_config();
        config.initial_delay = Duration::from_millis(1);
        config.max_delay = Duration::from_millis(3);

        // Indirect check: five pending fetches under a generous deadline
        // still finish quickly because the delay is capped.
        let fetches = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fetches);
        let started = std::time::Instant::now();

        poll_until_done("batch", &config, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(FakeJob {
                    state: if n < 5 {
                        PollState::Pending
                    } else {
                        PollState::Succeeded
                    },
                })
            }
        })
        .await
        .unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
