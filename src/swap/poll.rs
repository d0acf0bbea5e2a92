//! Fixed-interval status polling for swap jobs.
//!
//! Re-polling a pending job is the protocol, not an error retry: failures
//! of any kind end the loop immediately.

use std::time::Duration;

use super::client::{JobUpdate, SwapError, SwapService, GENERATION_FAILED_MESSAGE};

/// Delay between status queries (2 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Status queries before giving up (~2 minutes at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Suspends the poll loop between attempts. Injected so tests can count
/// sleeps without waiting.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Cosmetic progress shown while a job is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Starting,
    Analyzing,
    Finishing,
}

impl ProgressPhase {
    /// Phase for the time spent polling so far.
    pub fn from_elapsed(elapsed: Duration) -> Self {
        if elapsed < Duration::from_secs(10) {
            ProgressPhase::Starting
        } else if elapsed < Duration::from_secs(20) {
            ProgressPhase::Analyzing
        } else {
            ProgressPhase::Finishing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ProgressPhase::Starting => "Starting AI processing...",
            ProgressPhase::Analyzing => "Analyzing your face...",
            ProgressPhase::Finishing => "Almost done, creating your traditional photo...",
        }
    }
}

/// Poll `prediction_id` until it reaches a terminal status.
///
/// Queries are strictly serial. `on_progress` is called after every pending
/// report. No sleep follows a terminal report or the final attempt.
///
/// # Errors
///
/// - `SwapError::JobFailed` with the server message (or "Generation failed")
/// - whatever `check_status` returned, unchanged, on a failed query
/// - `SwapError::Timeout` after `max_attempts` pending reports
pub async fn poll_for_result<C, S, F>(
    service: &C,
    sleeper: &S,
    prediction_id: &str,
    settings: PollSettings,
    mut on_progress: F,
) -> Result<String, SwapError>
where
    C: SwapService,
    S: Sleeper,
    F: FnMut(ProgressPhase),
{
    for attempt in 0..settings.max_attempts {
        let update = service.check_status(prediction_id).await?;
        log::debug!("[Poll {}] {:?}", attempt + 1, update);

        match update {
            JobUpdate::Succeeded { result_url } => {
                log::info!("Generation complete after {} polls", attempt + 1);
                return Ok(result_url);
            }
            JobUpdate::Failed { error } => {
                let message = error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| GENERATION_FAILED_MESSAGE.to_string());
                log::error!("Generation failed: {}", message);
                return Err(SwapError::JobFailed(message));
            }
            JobUpdate::Pending { .. } => {
                on_progress(ProgressPhase::from_elapsed(settings.interval * attempt));
            }
        }

        if attempt + 1 < settings.max_attempts {
            sleeper.sleep(settings.interval).await;
        }
    }

    log::error!(
        "Generation timed out after {} polls",
        settings.max_attempts
    );
    Err(SwapError::Timeout {
        attempts: settings.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_phase_boundaries() {
        assert_eq!(
            ProgressPhase::from_elapsed(Duration::ZERO),
            ProgressPhase::Starting
        );
        assert_eq!(
            ProgressPhase::from_elapsed(Duration::from_secs(8)),
            ProgressPhase::Starting
        );
        assert_eq!(
            ProgressPhase::from_elapsed(Duration::from_secs(10)),
            ProgressPhase::Analyzing
        );
        assert_eq!(
            ProgressPhase::from_elapsed(Duration::from_secs(18)),
            ProgressPhase::Analyzing
        );
        assert_eq!(
            ProgressPhase::from_elapsed(Duration::from_secs(20)),
            ProgressPhase::Finishing
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = PollSettings::default();
        assert_eq!(settings.interval, Duration::from_secs(2));
        assert_eq!(settings.max_attempts, 60);
    }

    #[test]
    fn test_progress_messages() {
        assert_eq!(ProgressPhase::Starting.message(), "Starting AI processing...");
        assert_eq!(ProgressPhase::Analyzing.message(), "Analyzing your face...");
        assert!(ProgressPhase::Finishing.message().starts_with("Almost done"));
    }
}
