use std::sync::Arc;
use std::time::Duration;

use animator_core::{
    update, AppState, AppViewModel, Effect, GenerationRequest, JobFailure, JobHandle, JobId,
    JobSpec, Msg, ProviderFault, VideoResult,
};
use animator_logging::{animator_debug, animator_info, animator_warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::AuthorizationProvider;
use crate::filename::deterministic_filename;
use crate::persist::AssetStore;
use crate::provider::GenerationProvider;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Wait between two reads of an in-flight operation.
    pub poll_interval: Duration,
    /// Cadence of the cosmetic reassurance message.
    pub message_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(8),
            message_interval: Duration::from_secs(6),
        }
    }
}

type Outcome = Result<VideoResult, JobFailure>;

enum Command {
    Submit {
        request: GenerationRequest,
        reply: oneshot::Sender<Outcome>,
    },
    SelectCredential {
        reply: oneshot::Sender<()>,
    },
    Dispatch(Msg),
}

/// Cloneable front of the job monitor. The monitor stops when every handle is
/// dropped or [`MonitorHandle::shutdown`] is called.
#[derive(Clone)]
pub struct MonitorHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    view_rx: watch::Receiver<AppViewModel>,
    shutdown: CancellationToken,
}

impl MonitorHandle {
    /// Runs one job to its terminal state.
    ///
    /// Rejections (no image, job already running, no credential) return
    /// immediately without touching the remote service.
    pub async fn submit(&self, request: GenerationRequest) -> Outcome {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Submit { request, reply }).is_err() {
            return Err(JobFailure::Abandoned);
        }
        rx.await.unwrap_or(Err(JobFailure::Abandoned))
    }

    /// Runs the credential selection flow and clears the authorization flag.
    pub async fn select_credential(&self) {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::SelectCredential { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn reset_result(&self) {
        let _ = self.cmd_tx.send(Command::Dispatch(Msg::ResetResult));
    }

    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.view_rx.clone()
    }

    pub fn view(&self) -> AppViewModel {
        self.view_rx.borrow().clone()
    }

    /// Abandons any running job and tears down every timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

pub struct JobMonitor;

impl JobMonitor {
    /// Starts the monitor on the current Tokio runtime.
    pub fn spawn(
        provider: Arc<dyn GenerationProvider>,
        auth: Arc<dyn AuthorizationProvider>,
        store: Arc<dyn AssetStore>,
        settings: MonitorSettings,
    ) -> MonitorHandle {
        let state = AppState::new();
        let (view_tx, view_rx) = watch::channel(state.view());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let actor = Actor {
            state,
            view_tx,
            msg_tx,
            provider,
            auth,
            store,
            settings,
            pending: None,
            credential_waiters: Vec::new(),
            rotation: None,
            stage: None,
            prompt: None,
        };
        tokio::spawn(actor.run(cmd_rx, msg_rx, shutdown.clone()));

        MonitorHandle {
            cmd_tx,
            view_rx,
            shutdown,
        }
    }
}

/// Spawned task that is aborted when the guard is dropped.
struct ScheduledTask(JoinHandle<()>);

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Actor {
    state: AppState,
    view_tx: watch::Sender<AppViewModel>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    provider: Arc<dyn GenerationProvider>,
    auth: Arc<dyn AuthorizationProvider>,
    store: Arc<dyn AssetStore>,
    settings: MonitorSettings,
    pending: Option<oneshot::Sender<Outcome>>,
    credential_waiters: Vec<oneshot::Sender<()>>,
    rotation: Option<ScheduledTask>,
    /// The one job stage in flight: credential check, creation, poll or download.
    stage: Option<ScheduledTask>,
    prompt: Option<ScheduledTask>,
}

impl Actor {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut msg_rx: mpsc::UnboundedReceiver<Msg>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                command = cmd_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(msg) = msg_rx.recv() => {
                    let effects = self.apply(msg);
                    self.run_effects(effects);
                }
            }
        }
        if self.state.phase().is_active() {
            animator_warn!("job monitor stopped while a job was running");
        }
        self.stage = None;
        let effects = self.apply(Msg::Abandoned);
        self.run_effects(effects);
        animator_debug!("job monitor stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { request, reply } => {
                let mut effects = self.apply(Msg::SubmitRequested(request));
                // Rejections come back synchronously and belong to this caller.
                if let Some(index) = effects
                    .iter()
                    .position(|effect| matches!(effect, Effect::Finished(_)))
                {
                    if let Effect::Finished(outcome) = effects.remove(index) {
                        if let Err(failure) = &outcome {
                            animator_info!("submission rejected: {}", failure);
                        }
                        let _ = reply.send(outcome);
                    }
                } else {
                    self.pending = Some(reply);
                }
                self.run_effects(effects);
            }
            Command::SelectCredential { reply } => {
                self.credential_waiters.push(reply);
                let effects = self.apply(Msg::SelectCredentialRequested);
                self.run_effects(effects);
            }
            Command::Dispatch(msg) => {
                let effects = self.apply(msg);
                self.run_effects(effects);
            }
        }
    }

    fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        let credential_selected = matches!(msg, Msg::CredentialSelected);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.view_tx.send_replace(state.view());
        }
        self.state = state;
        if credential_selected {
            for waiter in self.credential_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
        effects
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CheckCredential => {
                    let auth = self.auth.clone();
                    self.stage = Some(self.spawn_reporting(async move {
                        Msg::CredentialChecked {
                            available: auth.has_credential().await,
                        }
                    }));
                }
                Effect::PromptForCredential => {
                    let auth = self.auth.clone();
                    self.prompt = Some(self.spawn_reporting(async move {
                        auth.prompt_for_credential().await;
                        Msg::CredentialSelected
                    }));
                }
                Effect::CreateJob { job_id, spec } => {
                    animator_info!("job {} accepted", job_id);
                    self.stage = Some(self.spawn_create(job_id, spec));
                }
                Effect::SchedulePoll { job_id, handle } => {
                    self.stage = Some(self.spawn_poll(job_id, handle));
                }
                Effect::RetrieveAsset {
                    job_id,
                    uri,
                    operation,
                } => {
                    animator_info!("job {} finished remotely ({})", job_id, operation);
                    self.stage = Some(self.spawn_retrieve(job_id, uri, operation));
                }
                Effect::StartMessageRotation => {
                    self.rotation = Some(self.spawn_rotation());
                }
                Effect::StopMessageRotation => {
                    self.rotation = None;
                }
                Effect::Notify { notice } => {
                    animator_warn!("{}", notice);
                }
                Effect::Finished(outcome) => {
                    match &outcome {
                        Ok(result) => animator_info!("job finished: {}", result.asset_url),
                        Err(failure) => animator_warn!("job failed: {}", failure),
                    }
                    if let Some(reply) = self.pending.take() {
                        let _ = reply.send(outcome);
                    }
                }
            }
        }
    }

    fn spawn_reporting<F>(&self, work: F) -> ScheduledTask
    where
        F: std::future::Future<Output = Msg> + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        ScheduledTask(tokio::spawn(async move {
            let _ = msg_tx.send(work.await);
        }))
    }

    fn spawn_create(&self, job_id: JobId, spec: JobSpec) -> ScheduledTask {
        let provider = self.provider.clone();
        self.spawn_reporting(async move {
            let result = provider.create_job(&spec).await.map_err(ProviderFault::from);
            if let Ok(handle) = &result {
                animator_info!("job {} created as {}", job_id, handle.name);
            }
            Msg::JobCreated { job_id, result }
        })
    }

    fn spawn_poll(&self, job_id: JobId, handle: JobHandle) -> ScheduledTask {
        let provider = self.provider.clone();
        let wait = self.settings.poll_interval;
        self.spawn_reporting(async move {
            tokio::time::sleep(wait).await;
            let result = provider.poll_job(&handle).await.map_err(ProviderFault::from);
            Msg::PollCompleted { job_id, result }
        })
    }

    fn spawn_retrieve(&self, job_id: JobId, uri: String, operation: String) -> ScheduledTask {
        let provider = self.provider.clone();
        let store = self.store.clone();
        self.spawn_reporting(async move {
            let result = retrieve(provider.as_ref(), store, &uri, &operation).await;
            Msg::AssetRetrieved { job_id, result }
        })
    }

    fn spawn_rotation(&self) -> ScheduledTask {
        let msg_tx = self.msg_tx.clone();
        let period = self.settings.message_interval;
        ScheduledTask(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if msg_tx.send(Msg::RotateMessage).is_err() {
                    break;
                }
            }
        }))
    }
}

async fn retrieve(
    provider: &dyn GenerationProvider,
    store: Arc<dyn AssetStore>,
    uri: &str,
    operation: &str,
) -> Result<Url, JobFailure> {
    let bytes = provider
        .fetch_asset(uri)
        .await
        .map_err(|err| JobFailure::from_fault(err.into()))?;
    let filename = deterministic_filename(None, operation);
    let stored = tokio::task::spawn_blocking(move || store.store(&filename, &bytes)).await;
    match stored {
        Ok(Ok(url)) => Ok(url),
        Ok(Err(err)) => Err(JobFailure::Storage {
            message: err.to_string(),
        }),
        Err(err) => Err(JobFailure::Storage {
            message: err.to_string(),
        }),
    }
}
