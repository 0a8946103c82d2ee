use url::Url;

use crate::state::{Phase, GENERIC_FAILURE_NOTICE};
use crate::{
    AppState, AspectRatio, Effect, GenerationRequest, JobFailure, JobHandle, JobId, JobSpec, Msg,
    VideoResult,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(request) => submit(&mut state, request),
        Msg::CredentialChecked { available } => credential_checked(&mut state, available),
        Msg::JobCreated { job_id, result } => {
            let aspect_ratio = match state.phase() {
                Phase::Submitted {
                    job_id: current,
                    aspect_ratio,
                } if *current == job_id => *aspect_ratio,
                _ => return (state, Vec::new()),
            };
            match result {
                Ok(handle) => follow_handle(&mut state, job_id, aspect_ratio, handle, 0),
                Err(fault) => fail(&mut state, JobFailure::from_fault(fault)),
            }
        }
        Msg::PollCompleted { job_id, result } => {
            let (aspect_ratio, polls) = match state.phase() {
                Phase::Polling {
                    job_id: current,
                    aspect_ratio,
                    polls,
                    ..
                } if *current == job_id => (*aspect_ratio, *polls),
                _ => return (state, Vec::new()),
            };
            match result {
                Ok(handle) => {
                    if !handle.done && handle.error.is_none() {
                        state.advance_progress();
                    }
                    follow_handle(&mut state, job_id, aspect_ratio, handle, polls + 1)
                }
                Err(fault) => fail(&mut state, JobFailure::from_fault(fault)),
            }
        }
        Msg::AssetRetrieved { job_id, result } => {
            let aspect_ratio = match state.phase() {
                Phase::Retrieving {
                    job_id: current,
                    aspect_ratio,
                } if *current == job_id => *aspect_ratio,
                _ => return (state, Vec::new()),
            };
            match result {
                Ok(asset_url) => succeed(&mut state, asset_url, aspect_ratio),
                Err(failure) => fail(&mut state, failure),
            }
        }
        Msg::RotateMessage => {
            // A tick queued just before teardown must not touch an idle status.
            if state.phase().is_active() {
                state.rotate_message();
            }
            Vec::new()
        }
        Msg::ResetResult => {
            if matches!(state.phase(), Phase::Succeeded(_)) {
                state.set_phase(Phase::Idle);
            }
            Vec::new()
        }
        Msg::SelectCredentialRequested => vec![Effect::PromptForCredential],
        Msg::CredentialSelected => {
            state.set_needs_authorization(false);
            Vec::new()
        }
        Msg::Abandoned => {
            if state.phase().blocks_submission() {
                abandon(&mut state)
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn submit(state: &mut AppState, request: GenerationRequest) -> Vec<Effect> {
    if state.phase().blocks_submission() {
        return vec![Effect::Finished(Err(JobFailure::JobActive))];
    }
    let spec = match &request.source_image {
        Some(image) => JobSpec {
            image: image.clone(),
            prompt: request.effective_prompt().to_string(),
            aspect_ratio: request.aspect_ratio,
            sample_count: 1,
        },
        None => return vec![Effect::Finished(Err(JobFailure::MissingInput))],
    };

    let previous = match state.take_phase() {
        Phase::Succeeded(result) => Some(result),
        _ => None,
    };
    state.set_phase(Phase::Authorizing { spec, previous });
    vec![Effect::CheckCredential]
}

fn credential_checked(state: &mut AppState, available: bool) -> Vec<Effect> {
    if !matches!(state.phase(), Phase::Authorizing { .. }) {
        return Vec::new();
    }
    let (spec, previous) = match state.take_phase() {
        Phase::Authorizing { spec, previous } => (spec, previous),
        other => {
            state.set_phase(other);
            return Vec::new();
        }
    };

    if !available {
        state.set_needs_authorization(true);
        state.set_phase(previous.map(Phase::Succeeded).unwrap_or(Phase::Idle));
        return vec![Effect::Finished(Err(JobFailure::MissingAuthorization))];
    }

    let job_id = state.next_job_id();
    state.set_needs_authorization(false);
    state.set_phase(Phase::Submitted {
        job_id,
        aspect_ratio: spec.aspect_ratio,
    });
    state.begin_job();
    vec![
        Effect::StartMessageRotation,
        Effect::CreateJob { job_id, spec },
    ]
}

fn follow_handle(
    state: &mut AppState,
    job_id: JobId,
    aspect_ratio: AspectRatio,
    mut handle: JobHandle,
    polls: u32,
) -> Vec<Effect> {
    if let Some(fault) = handle.error.take() {
        return fail(state, JobFailure::from_fault(fault));
    }
    if !handle.done {
        state.set_phase(Phase::Polling {
            job_id,
            aspect_ratio,
            handle: handle.clone(),
            polls,
        });
        return vec![Effect::SchedulePoll { job_id, handle }];
    }

    match handle.asset_uri {
        Some(uri) => {
            state.set_phase(Phase::Retrieving {
                job_id,
                aspect_ratio,
            });
            vec![Effect::RetrieveAsset {
                job_id,
                uri,
                operation: handle.name,
            }]
        }
        None => fail(state, JobFailure::NoAssetProduced),
    }
}

fn succeed(state: &mut AppState, asset_url: Url, aspect_ratio: AspectRatio) -> Vec<Effect> {
    let result = VideoResult {
        asset_url,
        aspect_ratio,
    };
    state.set_phase(Phase::Succeeded(result.clone()));
    state.end_job();
    vec![Effect::StopMessageRotation, Effect::Finished(Ok(result))]
}

/// Ends the running job without a notice; nobody is left to read it.
fn abandon(state: &mut AppState) -> Vec<Effect> {
    state.set_phase(Phase::Failed(JobFailure::Abandoned));
    state.end_job();
    vec![
        Effect::StopMessageRotation,
        Effect::Finished(Err(JobFailure::Abandoned)),
    ]
}

fn fail(state: &mut AppState, failure: JobFailure) -> Vec<Effect> {
    state.set_phase(Phase::Failed(failure.clone()));
    state.end_job();

    let mut effects = vec![Effect::StopMessageRotation];
    if failure.needs_authorization() {
        state.set_needs_authorization(true);
    } else {
        state.set_notice(Some(GENERIC_FAILURE_NOTICE.to_string()));
        effects.push(Effect::Notify {
            notice: GENERIC_FAILURE_NOTICE.to_string(),
        });
    }
    effects.push(Effect::Finished(Err(failure)));
    effects
}
