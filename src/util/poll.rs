//! Fixed-cadence polling with a bounded attempt budget.

use std::future::Future;
use std::time::Duration;

/// What a single poll attempt decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// Finished; stop polling with this value.
    Done(T),
    /// Not ready yet; poll again after the interval.
    Retry,
}

/// Poll schedule configuration.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Wait between consecutive attempts.
    pub interval: Duration,
}

impl PollSchedule {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Run `operation` until it returns [`Attempt::Done`] or an error.
    ///
    /// The first attempt runs immediately. Errors end polling at once.
    /// Returns `Ok(None)` when every attempt asked to retry.
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<Option<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Attempt<T>, E>>,
    {
        for attempt in 1..=self.max_attempts {
            match operation(attempt).await? {
                Attempt::Done(value) => return Ok(Some(value)),
                Attempt::Retry => {
                    if attempt >= self.max_attempts {
                        break;
                    }
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        interval_secs = self.interval.as_secs(),
                        "not ready, polling again"
                    );
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
        Ok(None)
    }
}
