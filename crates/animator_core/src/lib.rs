//! Animator core: pure job-monitor state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, Phase, Stage, ACCEPTED_PROGRESS, GENERIC_FAILURE_NOTICE, PROGRESS_CEILING,
    PROGRESS_STEP, REASSURING_MESSAGES,
};
pub use types::{
    AspectRatio, GenerationRequest, JobFailure, JobHandle, JobId, JobSpec, ParseAspectRatioError,
    ProviderFault, SourceImage, VideoResult, DEFAULT_PROMPT,
};
pub use update::update;
pub use view_model::{AppViewModel, GenerationStatus};
