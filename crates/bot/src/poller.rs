//! Long-polling loop for Bot API updates.
//!
//! Failed polls are retried with exponential backoff; the loop exits as
//! soon as the [`CancellationToken`] fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;
use crate::event::decode;
use crate::telegram::TelegramApi;

/// Tunable parameters for the retry backoff.
pub struct BackoffConfig {
    /// Delay after the first failed poll.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Poll until cancelled, handing every decoded event to the dispatcher.
/// Returns the next update offset.
pub async fn run(
    api: &TelegramApi,
    dispatcher: &mut Dispatcher,
    poll_timeout_secs: u64,
    backoff: &BackoffConfig,
    cancel: &CancellationToken,
) -> i64 {
    let mut offset = 0i64;
    let mut delay = backoff.initial_delay;
    let mut failures = 0u32;

    tracing::info!(poll_timeout_secs, "Polling for updates");
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = api.get_updates(offset, poll_timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                if failures > 0 {
                    tracing::info!(failures, "Polling recovered");
                }
                failures = 0;
                delay = backoff.initial_delay;

                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some((user_id, event)) = decode(update) {
                        dispatcher.dispatch(user_id, event);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(
                    error = %e,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "Polling failed",
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                delay = next_delay(delay, backoff);
            }
        }
    }

    tracing::info!(offset, "Polling stopped");
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = BackoffConfig::default();
        assert_eq!(next_delay(Duration::from_secs(1), &config), Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = BackoffConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(next_delay(Duration::from_secs(8), &config), Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = BackoffConfig::default();
        let mut delay = config.initial_delay;
        for expected in [1, 2, 4, 8, 16, 30, 30] {
            assert_eq!(delay.as_secs(), expected);
            delay = next_delay(delay, &config);
        }
    }
}
