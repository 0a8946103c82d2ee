use std::sync::Once;

use animator_core::{
    update, AppState, AspectRatio, Effect, GenerationRequest, JobFailure, JobHandle, Msg,
    SourceImage, Stage, ACCEPTED_PROGRESS, DEFAULT_PROMPT, REASSURING_MESSAGES,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(animator_logging::initialize_for_tests);
}

fn png_request(prompt: &str) -> GenerationRequest {
    GenerationRequest::new(
        SourceImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".to_string(),
        },
        AspectRatio::Landscape,
    )
    .with_prompt(prompt)
}

#[test]
fn submit_without_image_is_rejected_untouched() {
    init_logging();
    let state = AppState::new();
    let request = GenerationRequest {
        source_image: None,
        prompt: "anything".to_string(),
        aspect_ratio: AspectRatio::Portrait,
    };

    let (next, effects) = update(state.clone(), Msg::SubmitRequested(request));

    assert_eq!(next, state);
    assert_eq!(
        effects,
        vec![Effect::Finished(Err(JobFailure::MissingInput))]
    );
}

#[test]
fn submit_checks_credential_before_going_active() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SubmitRequested(png_request("")));

    assert_eq!(effects, vec![Effect::CheckCredential]);
    let view = state.view();
    assert_eq!(view.stage, Stage::Authorizing);
    assert!(!view.status.is_active);
    assert_eq!(view.status.progress_percent, 0);
}

#[test]
fn missing_credential_flags_authorization_and_stays_idle() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SubmitRequested(png_request("")));
    let (mut state, effects) = update(state, Msg::CredentialChecked { available: false });

    assert_eq!(
        effects,
        vec![Effect::Finished(Err(JobFailure::MissingAuthorization))]
    );
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::CreateJob { .. })));
    let view = state.view();
    assert!(view.needs_authorization);
    assert!(!view.status.is_active);
    assert_eq!(view.stage, Stage::Idle);
    assert!(state.consume_dirty());
}

#[test]
fn accepted_submit_goes_active_with_default_prompt() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SubmitRequested(png_request("  ")));
    let (state, effects) = update(state, Msg::CredentialChecked { available: true });

    let view = state.view();
    assert!(view.status.is_active);
    assert_eq!(view.status.progress_percent, ACCEPTED_PROGRESS);
    assert_eq!(view.status.message, REASSURING_MESSAGES[0]);
    assert_eq!(view.stage, Stage::Submitted);

    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::StartMessageRotation);
    match &effects[1] {
        Effect::CreateJob { job_id, spec } => {
            assert_eq!(*job_id, 1);
            assert_eq!(spec.prompt, DEFAULT_PROMPT);
            assert_eq!(spec.aspect_ratio, AspectRatio::Landscape);
            assert_eq!(spec.sample_count, 1);
            assert_eq!(spec.image.mime_type, "image/png");
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn second_submit_while_active_is_noop() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SubmitRequested(png_request("first")));
    let (state, _) = update(state, Msg::CredentialChecked { available: true });

    let (next, effects) = update(state.clone(), Msg::SubmitRequested(png_request("second")));

    assert_eq!(next, state);
    assert_eq!(effects, vec![Effect::Finished(Err(JobFailure::JobActive))]);
}

#[test]
fn second_submit_while_authorizing_is_noop() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SubmitRequested(png_request("first")));

    let (next, effects) = update(state.clone(), Msg::SubmitRequested(png_request("second")));

    assert_eq!(next, state);
    assert_eq!(effects, vec![Effect::Finished(Err(JobFailure::JobActive))]);
}

#[test]
fn credential_selection_clears_flag() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SubmitRequested(png_request("")));
    let (state, _) = update(state, Msg::CredentialChecked { available: false });
    assert!(state.view().needs_authorization);

    let (state, effects) = update(state, Msg::SelectCredentialRequested);
    assert_eq!(effects, vec![Effect::PromptForCredential]);
    assert!(state.view().needs_authorization);

    let (state, effects) = update(state, Msg::CredentialSelected);
    assert!(effects.is_empty());
    assert!(!state.view().needs_authorization);
}

#[test]
fn stale_provider_answers_are_ignored() {
    init_logging();
    let state = AppState::new();
    let (next, effects) = update(
        state.clone(),
        Msg::PollCompleted {
            job_id: 42,
            result: Ok(JobHandle::pending("operations/stale")),
        },
    );

    assert_eq!(next, state);
    assert!(effects.is_empty());
}
