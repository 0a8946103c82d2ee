use crate::{JobFailure, JobHandle, JobId, JobSpec, VideoResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the authorization collaborator whether a credential is selected.
    CheckCredential,
    /// Let the user pick a credential.
    PromptForCredential,
    CreateJob { job_id: JobId, spec: JobSpec },
    /// Wait one poll interval, then re-read the operation.
    SchedulePoll { job_id: JobId, handle: JobHandle },
    /// Download the finished video and make it locally addressable.
    RetrieveAsset {
        job_id: JobId,
        uri: String,
        operation: String,
    },
    StartMessageRotation,
    StopMessageRotation,
    /// Generic, user-visible failure notice.
    Notify { notice: String },
    /// Terminal outcome of the submission that is currently tracked.
    Finished(Result<VideoResult, JobFailure>),
}
