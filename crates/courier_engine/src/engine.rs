use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use courier_core::{
    update, AppState, CoreConfig, Effect, Job, JobError, JobId, Msg, NumberPolicy, QueueState,
    ScreenSnapshot, StatusKind, StatusNotification,
};
use engine_logging::{
    engine_debug, engine_error, engine_info, engine_trace, engine_warn, JobScope,
};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;
use crate::listener::forward_ui_events;
use crate::supervisor::Supervisor;
use crate::{Host, HostError, StatusSink};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub core: CoreConfig,
    pub number_policy: NumberPolicy,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("no tokio runtime is running on this thread")]
    NoRuntime,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("introspection service is disabled")]
    IntrospectionDisabled,
    #[error("job {active} is still running")]
    Busy { active: JobId },
    #[error(transparent)]
    InvalidJob(#[from] JobError),
    #[error(transparent)]
    Subscription(HostError),
    #[error("engine has stopped")]
    Stopped,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the executor task and every handle.
struct Shared {
    config: EngineConfig,
    host: Arc<dyn Host>,
    sink: Arc<dyn StatusSink>,
    runtime: Handle,
    msg_tx: mpsc::UnboundedSender<Msg>,
    cancel: CancellationToken,
    next_job_id: AtomicU64,
    /// Jobs with an id below this value may no longer touch the host.
    fence: AtomicU64,
    /// Held across every host dispatch so `interrupt` can wait one out.
    dispatch_gate: Mutex<()>,
    active_job: Mutex<Option<JobId>>,
    queue: Mutex<Arc<QueueState>>,
    listening: AtomicBool,
}

impl Shared {
    fn new(
        config: EngineConfig,
        host: Arc<dyn Host>,
        sink: Arc<dyn StatusSink>,
        runtime: Handle,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Msg>) {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Self {
            config,
            host,
            sink,
            runtime,
            msg_tx,
            cancel: CancellationToken::new(),
            next_job_id: AtomicU64::new(1),
            fence: AtomicU64::new(0),
            dispatch_gate: Mutex::new(()),
            active_job: Mutex::new(None),
            queue: Mutex::new(Arc::new(QueueState::default())),
            listening: AtomicBool::new(false),
        });
        (shared, msg_rx)
    }

    /// Subscribes to the host's UI events unless a subscription is live.
    fn ensure_listening(self: &Arc<Self>) -> Result<(), HostError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let identity = self.config.core.identity.clone();
        let events = match self.host.subscribe_ui_events(&identity) {
            Ok(events) => events,
            Err(err) => {
                self.listening.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };
        engine_info!("subscribed to ui events of {}", identity.package);

        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            let ended =
                forward_ui_events(events, &identity, &shared.msg_tx, &shared.cancel).await;
            if ended {
                engine_warn!("ui event subscription for {} ended", identity.package);
                // Cleared before the failure is reported so that a caller
                // reacting to it subscribes again.
                shared.listening.store(false, Ordering::SeqCst);
                let _ = shared.msg_tx.send(Msg::SubscriptionLost);
            }
        });
        Ok(())
    }

    /// Holds the dispatch gate for `job_id`, or `None` if the job was
    /// interrupted.
    fn open_gate(&self, job_id: JobId) -> Option<MutexGuard<'_, ()>> {
        let gate = lock(&self.dispatch_gate);
        if job_id < self.fence.load(Ordering::SeqCst) {
            engine_warn!("job {} was interrupted; dropping host dispatch", job_id);
            return None;
        }
        Some(gate)
    }

    /// Fences off and interrupts the active job, or only `job` when given
    /// and still active.
    ///
    /// The active slot stays locked until `Msg::Interrupt` is queued, so a
    /// job enqueued afterwards always starts behind it.
    fn interrupt(&self, job: Option<JobId>) {
        let mut active = lock(&self.active_job);
        let fence = match job {
            Some(job_id) if *active != Some(job_id) => return,
            Some(job_id) => job_id + 1,
            None => self.next_job_id.load(Ordering::SeqCst),
        };
        self.fence.fetch_max(fence, Ordering::SeqCst);
        // Wait out a dispatch that passed the fence before it was raised.
        drop(lock(&self.dispatch_gate));
        engine_info!("interrupt requested; fence at {}", fence);
        let _ = self.msg_tx.send(Msg::Interrupt);
        *active = None;
    }
}

/// External interface of the job queue: start and interrupt jobs, observe
/// the queue.
pub struct EngineHandle {
    shared: Arc<Shared>,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    /// Runs the engine on a dedicated thread with its own runtime.
    pub fn start(
        config: EngineConfig,
        host: Arc<dyn Host>,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (shared, msg_rx) = Shared::new(config, host, sink, runtime.handle().clone());
        let executor = Executor::new(Arc::clone(&shared));
        let thread = thread::Builder::new()
            .name("courier-engine".to_string())
            .spawn(move || runtime.block_on(executor.run(msg_rx)))?;
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Runs the engine as a task on the caller's runtime.
    pub fn spawn(
        config: EngineConfig,
        host: Arc<dyn Host>,
        sink: Arc<dyn StatusSink>,
    ) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (shared, msg_rx) = Shared::new(config, host, sink, runtime.clone());
        let executor = Executor::new(Arc::clone(&shared));
        runtime.spawn(executor.run(msg_rx));
        Ok(Self {
            shared,
            thread: None,
        })
    }

    /// Starts broadcasting `message_text` to `recipients`.
    ///
    /// Numbers are normalized and deduplicated first. Per-recipient results
    /// arrive only through the status sink.
    pub fn enqueue_job<S: AsRef<str>>(
        &self,
        recipients: &[S],
        message_text: &str,
        attachments: &[S],
    ) -> Result<JobHandle, EnqueueError> {
        let shared = &self.shared;
        if shared.cancel.is_cancelled() {
            return Err(EnqueueError::Stopped);
        }
        if !shared.host.is_introspection_enabled() {
            engine_warn!("introspection disabled; asking the user to enable it");
            shared.sink.notify(StatusNotification {
                job_id: None,
                kind: StatusKind::IntrospectionRequired,
                recipient: None,
            });
            return Err(EnqueueError::IntrospectionDisabled);
        }

        let job = Arc::new(Job::new(
            recipients,
            message_text,
            attachments,
            &shared.config.number_policy,
        )?);
        shared
            .ensure_listening()
            .map_err(EnqueueError::Subscription)?;

        let job_id = {
            let mut active = lock(&shared.active_job);
            if let Some(active) = *active {
                return Err(EnqueueError::Busy { active });
            }
            let job_id = shared.next_job_id.fetch_add(1, Ordering::SeqCst);
            *active = Some(job_id);
            job_id
        };

        engine_info!(
            "enqueue job {} recipients={} attachments={}",
            job_id,
            job.recipients().len(),
            job.attachments().len()
        );
        let recipients = job.recipients().to_vec();
        if shared.msg_tx.send(Msg::StartJob { job_id, job }).is_err() {
            *lock(&shared.active_job) = None;
            return Err(EnqueueError::Stopped);
        }
        Ok(JobHandle {
            job_id,
            recipients,
            shared: Arc::clone(shared),
        })
    }

    /// Abandons the active job. No host dispatch for it happens once this
    /// returns; side effects already made in the target app stay.
    pub fn interrupt(&self) {
        self.shared.interrupt(None);
    }

    pub fn active_job(&self) -> Option<JobId> {
        *lock(&self.shared.active_job)
    }

    /// Latest queue snapshot published by the executor.
    pub fn queue_state(&self) -> Arc<QueueState> {
        Arc::clone(&lock(&self.shared.queue))
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shared.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                engine_error!("engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Returned by `enqueue_job`; identifies one job.
pub struct JobHandle {
    job_id: JobId,
    recipients: Vec<String>,
    shared: Arc<Shared>,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Normalized recipients in processing order.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn is_active(&self) -> bool {
        *lock(&self.shared.active_job) == Some(self.job_id)
    }

    /// Interrupts this job if it is still the active one.
    pub fn interrupt(&self) {
        self.shared.interrupt(Some(self.job_id));
    }
}

/// Single writer of `AppState`: every input is serialized through its
/// channel and effects run right after the update that produced them.
struct Executor {
    shared: Arc<Shared>,
    state: AppState,
    dispatcher: Dispatcher,
    supervisor: Supervisor,
}

impl Executor {
    fn new(shared: Arc<Shared>) -> Self {
        let state = AppState::new(shared.config.core.clone());
        let dispatcher = Dispatcher::new(
            Arc::clone(&shared.host),
            shared.config.core.profile.clone(),
        );
        let supervisor = Supervisor::new(shared.runtime.clone(), shared.msg_tx.clone());
        Self {
            shared,
            state,
            dispatcher,
            supervisor,
        }
    }

    async fn run(mut self, mut msg_rx: mpsc::UnboundedReceiver<Msg>) {
        engine_info!("executor started");
        loop {
            let msg = tokio::select! {
                _ = self.shared.cancel.cancelled() => break,
                msg = msg_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            self.handle(msg);
        }
        self.supervisor.cancel_armed();
        engine_info!("executor stopped");
    }

    fn handle(&mut self, msg: Msg) {
        let job = match &msg {
            Msg::StartJob { job_id, .. } => Some(*job_id),
            _ => self.state.active_job_id(),
        };
        let _scope = JobScope::enter(job);

        let snapshot = match &msg {
            Msg::ScreenChanged(snapshot) => {
                engine_trace!("screen changed: {} nodes", snapshot.nodes().count());
                Some(Arc::clone(snapshot))
            }
            Msg::StartJob { job_id, .. } => {
                engine_debug!("start job {}", job_id);
                None
            }
            other => {
                engine_debug!("{:?}", other);
                None
            }
        };

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        *lock(&self.shared.queue) = Arc::clone(self.state.queue());

        for effect in effects {
            self.execute(effect, snapshot.as_deref());
        }
    }

    fn execute(&mut self, effect: Effect, snapshot: Option<&ScreenSnapshot>) {
        match effect {
            Effect::Launch { job_id, request } => {
                let Some(_gate) = self.shared.open_gate(job_id) else {
                    return;
                };
                engine_info!(
                    "launch {} for {} (job {})",
                    request.package,
                    request.recipient,
                    job_id
                );
                if let Err(err) = self.shared.host.launch_target_app(&request) {
                    engine_error!("launch for {} failed: {}", request.recipient, err);
                    let _ = self.shared.msg_tx.send(Msg::LaunchFailed {
                        job_id,
                        recipient: request.recipient,
                        message: err.to_string(),
                    });
                }
            }
            Effect::Act { job_id, kind } => {
                let Some(_gate) = self.shared.open_gate(job_id) else {
                    return;
                };
                match snapshot {
                    Some(snapshot) => {
                        if !self.dispatcher.act(kind, snapshot) {
                            engine_warn!("act {:?} for job {}: nothing clicked", kind, job_id);
                        }
                    }
                    None => engine_warn!("act {:?} for job {} without a snapshot", kind, job_id),
                }
            }
            Effect::Dismiss { job_id } => {
                let Some(_gate) = self.shared.open_gate(job_id) else {
                    return;
                };
                self.dispatcher.dismiss();
            }
            Effect::ArmTimer {
                token,
                purpose,
                after,
            } => self.supervisor.arm(token, purpose, after),
            Effect::DisarmTimer { token } => self.supervisor.disarm(token),
            Effect::Notify(notification) => self.notify(notification),
        }
    }

    fn notify(&self, notification: StatusNotification) {
        let releases_slot =
            notification.is_terminal() || notification.kind == StatusKind::JobRejected;
        if releases_slot {
            let mut active = lock(&self.shared.active_job);
            if notification.job_id.is_some() && *active == notification.job_id {
                *active = None;
            }
        }
        match &notification.kind {
            StatusKind::JobFailed(_) | StatusKind::JobRejected => {
                engine_warn!("status: {}", notification)
            }
            _ => engine_info!("status: {}", notification),
        }
        self.shared.sink.notify(notification);
    }
}
