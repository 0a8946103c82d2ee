use crate::{JobFailure, Stage, VideoResult};

/// Snapshot the presentation layer renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationStatus {
    pub is_active: bool,
    pub message: String,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub stage: Stage,
    pub status: GenerationStatus,
    pub result: Option<VideoResult>,
    pub needs_authorization: bool,
    pub notice: Option<String>,
    pub last_failure: Option<JobFailure>,
}
