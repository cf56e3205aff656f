use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AppIdentity, Job, JobId, ScreenProfile};

/// Fixed durations the controller arms timers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// From launch until a recognizable chat or preview shows up.
    pub contact_open_timeout: Duration,
    /// From the send click until the send control disappears.
    pub confirm_send_timeout: Duration,
    /// From the recovery back until the chat screen is left.
    pub return_home_timeout: Duration,
    /// Settle time between a concluded pass and the next recipient.
    pub advance_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            contact_open_timeout: Duration::from_secs(7),
            confirm_send_timeout: Duration::from_secs(10),
            return_home_timeout: Duration::from_secs(5),
            advance_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoreConfig {
    pub identity: AppIdentity,
    pub profile: ScreenProfile,
    pub timings: Timings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassOutcome {
    Sent,
    Skipped,
    TimedOut,
}

/// Never-reused identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    ContactOpen,
    ConfirmSend,
    ReturnHome,
    Advance,
}

/// Per-recipient phase. Every non-idle phase names the recipient it serves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingScreen {
        recipient: String,
    },
    ActingOnMediaPreview {
        recipient: String,
    },
    ActingOnChatThread {
        recipient: String,
    },
    AwaitingReturnHome {
        recipient: String,
    },
    /// Pass concluded; waiting out the advance delay before reporting it.
    Settling {
        recipient: String,
        outcome: PassOutcome,
    },
}

impl Phase {
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Phase::Idle => None,
            Phase::AwaitingScreen { recipient }
            | Phase::ActingOnMediaPreview { recipient }
            | Phase::ActingOnChatThread { recipient }
            | Phase::AwaitingReturnHome { recipient }
            | Phase::Settling { recipient, .. } => Some(recipient),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub phase: Phase,
    pub timer: Option<(TimerToken, TimerPurpose)>,
}

/// Queue snapshot. Replaced as a whole on every change, never edited in
/// place, so a published `Arc<QueueState>` is always internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueState {
    pub job_id: Option<JobId>,
    pub pending: Vec<String>,
    pub current: Option<String>,
    pub is_active: bool,
    pub outcomes: Vec<(String, PassOutcome)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    config: Arc<CoreConfig>,
    job: Option<Arc<Job>>,
    queue: Arc<QueueState>,
    controller: ControllerState,
    next_timer: u64,
}

impl AppState {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn job(&self) -> Option<&Arc<Job>> {
        self.job.as_ref()
    }

    pub fn queue(&self) -> &Arc<QueueState> {
        &self.queue
    }

    pub fn controller(&self) -> &ControllerState {
        &self.controller
    }

    pub fn phase(&self) -> &Phase {
        &self.controller.phase
    }

    pub fn active_job_id(&self) -> Option<JobId> {
        self.queue.job_id.filter(|_| self.queue.is_active)
    }

    pub(crate) fn set_job(&mut self, job: Option<Arc<Job>>) {
        self.job = job;
    }

    pub(crate) fn replace_queue(&mut self, queue: QueueState) {
        self.queue = Arc::new(queue);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.controller.phase = phase;
    }

    pub(crate) fn allocate_timer(&mut self, purpose: TimerPurpose) -> TimerToken {
        self.next_timer += 1;
        let token = TimerToken(self.next_timer);
        self.controller.timer = Some((token, purpose));
        token
    }

    pub(crate) fn take_timer(&mut self) -> Option<TimerToken> {
        self.controller.timer.take().map(|(token, _)| token)
    }
}
