use url::Url;

use crate::{GenerationRequest, JobFailure, JobHandle, JobId, ProviderFault};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User pressed Generate.
    SubmitRequested(GenerationRequest),
    /// Answer from the authorization collaborator.
    CredentialChecked { available: bool },
    /// Provider answered the creation call.
    JobCreated {
        job_id: JobId,
        result: Result<JobHandle, ProviderFault>,
    },
    /// Provider answered a re-read of the operation.
    PollCompleted {
        job_id: JobId,
        result: Result<JobHandle, ProviderFault>,
    },
    /// The finished video was downloaded and stored, or that failed.
    AssetRetrieved {
        job_id: JobId,
        result: Result<Url, JobFailure>,
    },
    /// Cosmetic timer: show the next reassurance message.
    RotateMessage,
    /// User discarded the published video.
    ResetResult,
    /// User asked to pick a credential.
    SelectCredentialRequested,
    /// The credential picker completed.
    CredentialSelected,
    /// The monitor is going away; whatever is running will never finish.
    Abandoned,
}
