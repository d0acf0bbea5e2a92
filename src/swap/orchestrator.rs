//! Two-phase swap: submit, then poll to completion.

use super::client::{SwapError, SwapService};
use super::poll::{poll_for_result, PollSettings, ProgressPhase, Sleeper};
use crate::photo::Capture;
use crate::selection::CharacterId;

/// Progress of a running swap, in the order it is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapProgress {
    /// Photo is being sent to the service.
    Uploading,
    /// The service accepted the job.
    Submitted { prediction_id: String },
    /// The job is still pending.
    Polling(ProgressPhase),
}

impl SwapProgress {
    /// Loading text for the processing screen.
    pub fn message(&self) -> &'static str {
        match self {
            SwapProgress::Uploading => "Uploading your photo...",
            SwapProgress::Submitted { .. } => "Creating your traditional photo...",
            SwapProgress::Polling(phase) => phase.message(),
        }
    }
}

/// Drives one swap against a [`SwapService`].
#[derive(Debug, Clone)]
pub struct SwapOrchestrator<C, S> {
    service: C,
    sleeper: S,
    settings: PollSettings,
}

impl<C: SwapService, S: Sleeper> SwapOrchestrator<C, S> {
    pub fn new(service: C, sleeper: S, settings: PollSettings) -> Self {
        Self {
            service,
            sleeper,
            settings,
        }
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// Start a job. Both inputs are required; a missing one is a caller bug
    /// reported as `SwapError::MissingInput`, never silently skipped.
    pub async fn submit(
        &self,
        image: Option<&Capture>,
        character: Option<&CharacterId>,
    ) -> Result<String, SwapError> {
        let (Some(image), Some(character)) = (image, character) else {
            log::warn!("Swap requested without a photo or character");
            return Err(SwapError::MissingInput);
        };
        self.service.start_job(image, character).await
    }

    /// Poll a submitted job until it succeeds, fails, or times out.
    pub async fn poll_for_result<F: FnMut(ProgressPhase)>(
        &self,
        prediction_id: &str,
        on_progress: F,
    ) -> Result<String, SwapError> {
        poll_for_result(
            &self.service,
            &self.sleeper,
            prediction_id,
            self.settings,
            on_progress,
        )
        .await
    }

    /// Submit, then poll. Resolves with the result URL.
    ///
    /// Submission strictly precedes the first poll. Every failure, from
    /// either phase, comes back through the single returned error.
    pub async fn perform_face_swap<F: FnMut(SwapProgress)>(
        &self,
        image: Option<&Capture>,
        character: Option<&CharacterId>,
        mut on_progress: F,
    ) -> Result<String, SwapError> {
        if image.is_none() || character.is_none() {
            return Err(SwapError::MissingInput);
        }

        on_progress(SwapProgress::Uploading);
        let prediction_id = self.submit(image, character).await?;

        on_progress(SwapProgress::Submitted {
            prediction_id: prediction_id.clone(),
        });
        self.poll_for_result(&prediction_id, |phase| {
            on_progress(SwapProgress::Polling(phase))
        })
        .await
    }
}
