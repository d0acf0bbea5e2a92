//! Swap orchestrator: face-swap service client and job lifecycle.
//!
//! A swap is a two-phase remote job. The photo and character are submitted
//! to `POST /swap-face`, which returns a prediction id, and the job is then
//! polled through `GET /check-status/{id}` until it succeeds, fails, or the
//! attempt budget runs out.

mod cache;
mod client;
mod job;
mod orchestrator;
mod poll;

pub use cache::{ResultCache, DEFAULT_CACHE_MAX_MB};
pub use client::{
    partial_path, JobUpdate, SwapClient, SwapError, SwapResponse, SwapService,
    DEFAULT_SERVER_URL, GENERATION_FAILED_MESSAGE, SERVER_URL_ENV, SUBMIT_FAILED_MESSAGE,
};
pub use job::{JobStatus, SwapJob};
pub use orchestrator::{SwapOrchestrator, SwapProgress};
pub use poll::{
    poll_for_result, PollSettings, ProgressPhase, Sleeper, TokioSleeper, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_POLL_INTERVAL,
};
