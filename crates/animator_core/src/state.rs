use crate::view_model::{AppViewModel, GenerationStatus};
use crate::{AspectRatio, JobFailure, JobHandle, JobId, JobSpec, VideoResult};

/// Fixed, ordered reassurance sequence shown while a job runs.
pub const REASSURING_MESSAGES: [&str; 7] = [
    "Capturing the essence of your image...",
    "Analyzing textures and layers for fluid motion...",
    "Our AI is weaving the fabric of time and space...",
    "Generating realistic movement patterns...",
    "Polishing the frames for a professional finish...",
    "Almost there! Humanizing the digital motion...",
    "Adding the final touches of life to your photo...",
];

/// Progress shown as soon as a job is accepted.
pub const ACCEPTED_PROGRESS: u8 = 10;
/// Progress added for every poll that finds the job still running.
pub const PROGRESS_STEP: u8 = 5;
/// Displayed progress never passes this before the job is terminal.
pub const PROGRESS_CEILING: u8 = 95;

pub const GENERIC_FAILURE_NOTICE: &str =
    "Something went wrong during generation. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Authorizing,
    Submitted,
    Polling,
    Retrieving,
    Succeeded,
    Failed,
}

/// Lifecycle of the single job. Result and activity live in different
/// variants, so a published video while a job runs cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Credential check in flight. Not active, but blocks new submissions.
    Authorizing {
        spec: JobSpec,
        previous: Option<VideoResult>,
    },
    Submitted {
        job_id: JobId,
        aspect_ratio: AspectRatio,
    },
    Polling {
        job_id: JobId,
        aspect_ratio: AspectRatio,
        handle: JobHandle,
        polls: u32,
    },
    Retrieving {
        job_id: JobId,
        aspect_ratio: AspectRatio,
    },
    Succeeded(VideoResult),
    Failed(JobFailure),
}

impl Phase {
    pub fn stage(&self) -> Stage {
        match self {
            Phase::Idle => Stage::Idle,
            Phase::Authorizing { .. } => Stage::Authorizing,
            Phase::Submitted { .. } => Stage::Submitted,
            Phase::Polling { .. } => Stage::Polling,
            Phase::Retrieving { .. } => Stage::Retrieving,
            Phase::Succeeded(_) => Stage::Succeeded,
            Phase::Failed(_) => Stage::Failed,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Phase::Submitted { .. } | Phase::Polling { .. } | Phase::Retrieving { .. }
        )
    }

    pub(crate) fn blocks_submission(&self) -> bool {
        self.is_active() || matches!(self, Phase::Authorizing { .. })
    }

    /// Job currently owning the phase, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Phase::Submitted { job_id, .. }
            | Phase::Polling { job_id, .. }
            | Phase::Retrieving { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }

    fn result(&self) -> Option<&VideoResult> {
        match self {
            Phase::Succeeded(result) => Some(result),
            Phase::Authorizing { previous, .. } => previous.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: Phase,
    progress: u8,
    message_index: usize,
    needs_authorization: bool,
    notice: Option<String>,
    last_job_id: JobId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let is_active = self.phase.is_active();
        AppViewModel {
            stage: self.phase.stage(),
            status: GenerationStatus {
                is_active,
                message: if is_active {
                    REASSURING_MESSAGES[self.message_index].to_string()
                } else {
                    String::new()
                },
                progress_percent: self.progress,
            },
            result: self.phase.result().cloned(),
            needs_authorization: self.needs_authorization,
            notice: self.notice.clone(),
            last_failure: match &self.phase {
                Phase::Failed(failure) => Some(failure.clone()),
                _ => None,
            },
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.mark_dirty();
    }

    pub(crate) fn take_phase(&mut self) -> Phase {
        self.mark_dirty();
        std::mem::take(&mut self.phase)
    }

    pub(crate) fn next_job_id(&mut self) -> JobId {
        self.last_job_id += 1;
        self.last_job_id
    }

    pub(crate) fn begin_job(&mut self) {
        self.progress = ACCEPTED_PROGRESS;
        self.message_index = 0;
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn end_job(&mut self) {
        self.progress = 0;
        self.message_index = 0;
        self.mark_dirty();
    }

    pub(crate) fn advance_progress(&mut self) {
        let next = self
            .progress
            .saturating_add(PROGRESS_STEP)
            .min(PROGRESS_CEILING);
        if next != self.progress {
            self.progress = next;
            self.mark_dirty();
        }
    }

    pub(crate) fn rotate_message(&mut self) {
        self.message_index = (self.message_index + 1) % REASSURING_MESSAGES.len();
        self.mark_dirty();
    }

    pub(crate) fn set_needs_authorization(&mut self, value: bool) {
        if self.needs_authorization != value {
            self.needs_authorization = value;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
        self.mark_dirty();
    }
}
