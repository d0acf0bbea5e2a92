//! The swap job tracked by the session.

/// Lifecycle of the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// The single swap job a session tracks.
///
/// `generation` is the session generation the job was started under. Events
/// tagged with any other generation belong to a superseded job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapJob {
    generation: u64,
    prediction_id: Option<String>,
    status: JobStatus,
    result_url: Option<String>,
}

impl SwapJob {
    pub fn pending(generation: u64) -> Self {
        Self {
            generation,
            prediction_id: None,
            status: JobStatus::Pending,
            result_url: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn prediction_id(&self) -> Option<&str> {
        self.prediction_id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.status == JobStatus::Pending
    }

    pub(crate) fn set_prediction_id(&mut self, prediction_id: String) {
        self.prediction_id = Some(prediction_id);
    }

    pub(crate) fn succeed(&mut self, result_url: String) {
        self.status = JobStatus::Succeeded;
        self.result_url = Some(result_url);
    }

    pub(crate) fn fail(&mut self) {
        self.status = JobStatus::Failed;
    }
}
