use std::sync::Arc;

use crate::{Job, JobId, ScreenSnapshot, TimerToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// External request to start broadcasting a job.
    StartJob { job_id: JobId, job: Arc<Job> },
    /// External request to abandon the active job.
    Interrupt,
    /// Filtered UI-change notification from the target application.
    ScreenChanged(Arc<ScreenSnapshot>),
    /// A supervisor timer expired.
    TimerFired(TimerToken),
    /// The host could not launch the target application.
    LaunchFailed {
        job_id: JobId,
        recipient: String,
        message: String,
    },
    /// The UI-event subscription ended.
    SubscriptionLost,
    NoOp,
}
