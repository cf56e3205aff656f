use std::fmt;
use std::time::Duration;

use crate::{JobId, LaunchRequest, ScreenKind, TimerPurpose, TimerToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the target application for one recipient.
    Launch { job_id: JobId, request: LaunchRequest },
    /// Click the forward control of `kind` on the snapshot that produced
    /// this effect.
    Act { job_id: JobId, kind: ScreenKind },
    /// Navigate back: toolbar affordance if present, host back otherwise.
    Dismiss { job_id: JobId },
    ArmTimer {
        token: TimerToken,
        purpose: TimerPurpose,
        after: Duration,
    },
    DisarmTimer { token: TimerToken },
    Notify(StatusNotification),
}

impl Effect {
    /// Job whose host side effects this is, for effects that touch the host.
    pub fn dispatch_job(&self) -> Option<JobId> {
        match self {
            Effect::Launch { job_id, .. } | Effect::Act { job_id, .. } | Effect::Dismiss { job_id } => {
                Some(*job_id)
            }
            Effect::ArmTimer { .. } | Effect::DisarmTimer { .. } | Effect::Notify(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobSummary {
    pub sent: usize,
    pub skipped: usize,
    pub timed_out: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The host refused to open the target application.
    LaunchFailed(String),
    /// The configured deep link could not be built.
    InvalidDeepLink(String),
    /// The UI-event subscription went away mid-job.
    ServiceLost,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::LaunchFailed(message) => write!(f, "launch failed: {message}"),
            FailureReason::InvalidDeepLink(message) => write!(f, "invalid deep link: {message}"),
            FailureReason::ServiceLost => write!(f, "ui event subscription lost"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    JobStarted,
    RecipientSent,
    RecipientSkipped,
    RecipientTimedOut,
    JobComplete(JobSummary),
    JobRejected,
    JobInterrupted,
    JobFailed(FailureReason),
    /// The host's introspection facility has to be enabled by the user.
    IntrospectionRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub job_id: Option<JobId>,
    pub kind: StatusKind,
    pub recipient: Option<String>,
}

impl StatusNotification {
    pub fn job(job_id: JobId, kind: StatusKind) -> Self {
        Self {
            job_id: Some(job_id),
            kind,
            recipient: None,
        }
    }

    pub fn recipient(job_id: JobId, kind: StatusKind, recipient: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id),
            kind,
            recipient: Some(recipient.into()),
        }
    }

    /// Whether this notification ends the job it belongs to.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            StatusKind::JobComplete(_) | StatusKind::JobInterrupted | StatusKind::JobFailed(_)
        )
    }
}

impl fmt::Display for StatusNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatusKind::JobStarted => write!(f, "job started")?,
            StatusKind::RecipientSent => write!(f, "message sent")?,
            StatusKind::RecipientSkipped => write!(f, "recipient skipped")?,
            StatusKind::RecipientTimedOut => write!(f, "recipient timed out")?,
            StatusKind::JobComplete(summary) => write!(
                f,
                "all messages processed (sent {}, skipped {}, timed out {})",
                summary.sent, summary.skipped, summary.timed_out
            )?,
            StatusKind::JobRejected => write!(f, "job rejected: another job is active")?,
            StatusKind::JobInterrupted => write!(f, "job interrupted")?,
            StatusKind::JobFailed(reason) => write!(f, "job failed: {reason}")?,
            StatusKind::IntrospectionRequired => {
                write!(f, "please enable the accessibility service")?
            }
        }
        if let Some(recipient) = &self.recipient {
            write!(f, " [{recipient}]")?;
        }
        Ok(())
    }
}
