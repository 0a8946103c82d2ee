use animator_core::{
    update, AppState, AspectRatio, Effect, GenerationRequest, JobFailure, JobHandle, JobId, Msg,
    ProviderFault, SourceImage, Stage, GENERIC_FAILURE_NOTICE, PROGRESS_CEILING,
    REASSURING_MESSAGES,
};
use url::Url;

fn request(aspect_ratio: AspectRatio) -> GenerationRequest {
    GenerationRequest::new(
        SourceImage {
            bytes: b"\x89PNG\r\n".to_vec(),
            mime_type: "image/png".to_string(),
        },
        aspect_ratio,
    )
}

/// Drives a fresh submission up to the point where the creation call is out.
fn start_job(state: AppState, aspect_ratio: AspectRatio) -> (AppState, JobId) {
    let (state, _) = update(state, Msg::SubmitRequested(request(aspect_ratio)));
    let (state, effects) = update(state, Msg::CredentialChecked { available: true });
    let job_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::CreateJob { job_id, .. } => Some(*job_id),
            _ => None,
        })
        .expect("create job effect");
    (state, job_id)
}

fn done_with_asset(name: &str) -> JobHandle {
    JobHandle {
        name: name.to_string(),
        done: true,
        asset_uri: Some("https://files.example.com/v1/video.mp4?alt=media".to_string()),
        error: None,
    }
}

fn local_url() -> Url {
    Url::parse("file:///tmp/social-worker-animation--0a1b2c3d.mp4").unwrap()
}

#[test]
fn two_pending_polls_then_success_publishes_result() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let op = "models/veo/operations/abc";

    let (state, effects) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(JobHandle::pending(op)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::SchedulePoll {
            job_id,
            handle: JobHandle::pending(op)
        }]
    );
    assert_eq!(state.view().stage, Stage::Polling);
    assert_eq!(state.view().status.progress_percent, 10);

    let mut progress = Vec::new();
    let mut state = state;
    for _ in 0..2 {
        let (next, effects) = update(
            state,
            Msg::PollCompleted {
                job_id,
                result: Ok(JobHandle::pending(op)),
            },
        );
        assert!(matches!(effects[..], [Effect::SchedulePoll { .. }]));
        progress.push(next.view().status.progress_percent);
        state = next;
    }
    assert_eq!(progress, vec![15, 20]);

    let (state, effects) = update(
        state,
        Msg::PollCompleted {
            job_id,
            result: Ok(done_with_asset(op)),
        },
    );
    assert_eq!(state.view().stage, Stage::Retrieving);
    assert!(state.view().status.is_active);
    assert_eq!(state.view().status.progress_percent, 20);
    assert_eq!(
        effects,
        vec![Effect::RetrieveAsset {
            job_id,
            uri: "https://files.example.com/v1/video.mp4?alt=media".to_string(),
            operation: op.to_string(),
        }]
    );

    let (state, effects) = update(
        state,
        Msg::AssetRetrieved {
            job_id,
            result: Ok(local_url()),
        },
    );
    let view = state.view();
    assert!(!view.status.is_active);
    assert_eq!(view.status.progress_percent, 0);
    assert!(view.status.message.is_empty());
    let result = view.result.expect("video result");
    assert_eq!(result.aspect_ratio, AspectRatio::Landscape);
    assert_eq!(result.asset_url, local_url());

    let finished: Vec<_> = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Finished(Ok(_))))
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(effects[0], Effect::StopMessageRotation);
}

#[test]
fn progress_never_exceeds_ceiling() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Portrait);
    let (mut state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(JobHandle::pending("op")),
        },
    );

    let mut last = state.view().status.progress_percent;
    for _ in 0..40 {
        let (next, _) = update(
            state,
            Msg::PollCompleted {
                job_id,
                result: Ok(JobHandle::pending("op")),
            },
        );
        let now = next.view().status.progress_percent;
        assert!(now >= last);
        assert!(now <= PROGRESS_CEILING);
        last = now;
        state = next;
    }
    assert_eq!(last, PROGRESS_CEILING);
}

#[test]
fn message_rotates_in_order_and_wraps_while_active() {
    let (mut state, _job_id) = start_job(AppState::new(), AspectRatio::Landscape);

    let mut seen = vec![state.view().status.message];
    for _ in 0..REASSURING_MESSAGES.len() {
        let (next, effects) = update(state, Msg::RotateMessage);
        assert!(effects.is_empty());
        seen.push(next.view().status.message);
        state = next;
    }

    let mut expected: Vec<String> = REASSURING_MESSAGES.iter().map(|m| m.to_string()).collect();
    expected.push(REASSURING_MESSAGES[0].to_string());
    assert_eq!(seen, expected);
}

#[test]
fn rotation_ticks_after_teardown_are_ignored() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let (state, effects) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Err(ProviderFault::new("backend exploded")),
        },
    );
    assert!(effects.contains(&Effect::StopMessageRotation));

    let (mut next, effects) = update(state.clone(), Msg::RotateMessage);
    assert!(effects.is_empty());
    assert!(next.view().status.message.is_empty());
    assert_eq!(next.view(), state.view());
    // Only the dirty bit left over from the failure.
    assert!(next.consume_dirty());
    assert!(!next.consume_dirty());
}

#[test]
fn authorization_error_payload_sets_flag_without_result() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let (state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(JobHandle::pending("op")),
        },
    );
    let failed = JobHandle {
        name: "op".to_string(),
        done: true,
        asset_uri: None,
        error: Some(ProviderFault {
            code: Some(404),
            status: Some("NOT_FOUND".to_string()),
            message: "Requested entity was not found.".to_string(),
        }),
    };

    let (state, effects) = update(
        state,
        Msg::PollCompleted {
            job_id,
            result: Ok(failed),
        },
    );

    let view = state.view();
    assert!(view.needs_authorization);
    assert!(view.result.is_none());
    assert!(!view.status.is_active);
    assert_eq!(view.status.progress_percent, 0);
    assert!(view.notice.is_none());
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::Notify { .. })));
    assert!(matches!(
        effects.last(),
        Some(Effect::Finished(Err(JobFailure::Unauthorized(_))))
    ));
}

#[test]
fn generic_failure_raises_notice() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let (state, effects) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Err(ProviderFault {
                code: Some(500),
                status: Some("INTERNAL".to_string()),
                message: "internal error".to_string(),
            }),
        },
    );

    let view = state.view();
    assert_eq!(view.stage, Stage::Failed);
    assert!(!view.needs_authorization);
    assert_eq!(view.notice.as_deref(), Some(GENERIC_FAILURE_NOTICE));
    assert_eq!(
        effects[1],
        Effect::Notify {
            notice: GENERIC_FAILURE_NOTICE.to_string()
        }
    );
}

#[test]
fn done_without_asset_fails() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let empty = JobHandle {
        name: "op".to_string(),
        done: true,
        asset_uri: None,
        error: None,
    };

    let (state, effects) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(empty),
        },
    );

    assert_eq!(state.view().last_failure, Some(JobFailure::NoAssetProduced));
    assert!(state.view().result.is_none());
    assert_eq!(
        effects.last(),
        Some(&Effect::Finished(Err(JobFailure::NoAssetProduced)))
    );
}

#[test]
fn reset_discards_result_and_new_job_replaces_it() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Portrait);
    let (state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(done_with_asset("op")),
        },
    );
    let (state, _) = update(
        state,
        Msg::AssetRetrieved {
            job_id,
            result: Ok(local_url()),
        },
    );
    assert!(state.view().result.is_some());

    // New submission keeps the old video visible until the job is accepted.
    let (authorizing, _) = update(
        state.clone(),
        Msg::SubmitRequested(request(AspectRatio::Landscape)),
    );
    assert!(authorizing.view().result.is_some());
    let (active, _) = update(authorizing, Msg::CredentialChecked { available: true });
    assert!(active.view().result.is_none());
    assert!(active.view().status.is_active);

    let (reset, effects) = update(state, Msg::ResetResult);
    assert!(effects.is_empty());
    assert!(reset.view().result.is_none());
    assert_eq!(reset.view().stage, Stage::Idle);
}

#[test]
fn denied_credential_restores_previous_result() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Portrait);
    let (state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(done_with_asset("op")),
        },
    );
    let (state, _) = update(
        state,
        Msg::AssetRetrieved {
            job_id,
            result: Ok(local_url()),
        },
    );

    let (state, _) = update(state, Msg::SubmitRequested(request(AspectRatio::Landscape)));
    let (state, _) = update(state, Msg::CredentialChecked { available: false });

    let view = state.view();
    assert_eq!(view.stage, Stage::Succeeded);
    assert_eq!(view.result.map(|r| r.aspect_ratio), Some(AspectRatio::Portrait));
    assert!(view.needs_authorization);
}

#[test]
fn storage_failure_is_terminal() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let (state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(done_with_asset("op")),
        },
    );
    let failure = JobFailure::Storage {
        message: "disk full".to_string(),
    };
    let (state, effects) = update(
        state,
        Msg::AssetRetrieved {
            job_id,
            result: Err(failure.clone()),
        },
    );

    assert!(!state.view().status.is_active);
    assert!(state.view().result.is_none());
    assert_eq!(effects.last(), Some(&Effect::Finished(Err(failure))));
}

#[test]
fn unfinished_operation_with_error_payload_fails_at_once() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Landscape);
    let (state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(JobHandle::pending("op")),
        },
    );
    let errored = JobHandle {
        error: Some(ProviderFault {
            code: Some(13),
            status: Some("INTERNAL".to_string()),
            message: "backend crashed".to_string(),
        }),
        ..JobHandle::pending("op")
    };

    let (state, effects) = update(
        state,
        Msg::PollCompleted {
            job_id,
            result: Ok(errored),
        },
    );

    let view = state.view();
    assert_eq!(view.stage, Stage::Failed);
    assert!(!view.status.is_active);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::SchedulePoll { .. })));
    assert!(matches!(
        effects.last(),
        Some(Effect::Finished(Err(JobFailure::Provider(_))))
    ));
}

#[test]
fn abandoning_a_running_job_ends_it_without_notice() {
    let (state, job_id) = start_job(AppState::new(), AspectRatio::Portrait);
    let (state, _) = update(
        state,
        Msg::JobCreated {
            job_id,
            result: Ok(JobHandle::pending("op")),
        },
    );
    assert!(state.view().status.is_active);

    let (state, effects) = update(state, Msg::Abandoned);

    let view = state.view();
    assert_eq!(view.stage, Stage::Failed);
    assert!(!view.status.is_active);
    assert_eq!(view.status.progress_percent, 0);
    assert_eq!(view.last_failure, Some(JobFailure::Abandoned));
    assert_eq!(view.notice, None);
    assert_eq!(
        effects,
        vec![
            Effect::StopMessageRotation,
            Effect::Finished(Err(JobFailure::Abandoned)),
        ]
    );
}
