use std::sync::Arc;
use std::time::Duration;

use crate::{
    classify, probe, AppState, Effect, FailureReason, Job, JobId, JobSummary, LaunchRequest, Msg,
    PassOutcome, Phase, QueueState, ScreenKind, ScreenSnapshot, StatusKind, StatusNotification,
    TimerPurpose, TimerToken,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Timer disarms are always emitted ahead of the host side effects of the
/// same transition.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::StartJob { job_id, job } => start_job(&mut state, job_id, job, &mut effects),
        Msg::Interrupt => interrupt(&mut state, &mut effects),
        Msg::ScreenChanged(snapshot) => on_screen(&mut state, &snapshot, &mut effects),
        Msg::TimerFired(token) => on_timer(&mut state, token, &mut effects),
        Msg::LaunchFailed {
            job_id,
            recipient,
            message,
        } => {
            if state.active_job_id() == Some(job_id) {
                fail_job(
                    &mut state,
                    FailureReason::LaunchFailed(message),
                    Some(recipient),
                    &mut effects,
                );
            }
        }
        Msg::SubscriptionLost => {
            if state.active_job_id().is_some() {
                let recipient = state.phase().recipient().map(ToOwned::to_owned);
                fail_job(&mut state, FailureReason::ServiceLost, recipient, &mut effects);
            }
        }
        Msg::NoOp => {}
    }
    (state, effects)
}

fn start_job(state: &mut AppState, job_id: JobId, job: Arc<Job>, effects: &mut Vec<Effect>) {
    if state.queue().is_active {
        effects.push(Effect::Notify(StatusNotification::job(
            job_id,
            StatusKind::JobRejected,
        )));
        return;
    }

    state.replace_queue(QueueState {
        job_id: Some(job_id),
        pending: job.recipients().to_vec(),
        current: None,
        is_active: true,
        outcomes: Vec::new(),
    });
    state.set_job(Some(job));
    state.set_phase(Phase::Idle);
    effects.push(Effect::Notify(StatusNotification::job(
        job_id,
        StatusKind::JobStarted,
    )));
    advance_queue(state, effects);
}

/// Pops the next recipient and dispatches it, or finishes the job.
fn advance_queue(state: &mut AppState, effects: &mut Vec<Effect>) {
    let mut queue = QueueState::clone(state.queue());
    let Some(job_id) = queue.job_id else {
        return;
    };

    if queue.pending.is_empty() {
        let summary = summarize(&queue.outcomes);
        queue.current = None;
        queue.is_active = false;
        state.replace_queue(queue);
        state.set_job(None);
        state.set_phase(Phase::Idle);
        effects.push(Effect::Notify(StatusNotification::job(
            job_id,
            StatusKind::JobComplete(summary),
        )));
        return;
    }

    let recipient = queue.pending.remove(0);
    queue.current = Some(recipient.clone());
    state.replace_queue(queue);
    dispatch_recipient(state, job_id, recipient, effects);
}

fn dispatch_recipient(
    state: &mut AppState,
    job_id: JobId,
    recipient: String,
    effects: &mut Vec<Effect>,
) {
    let Some(job) = state.job().cloned() else {
        return;
    };
    match LaunchRequest::for_recipient(&state.config().identity, &job, &recipient) {
        Ok(request) => {
            effects.push(Effect::Launch { job_id, request });
            state.set_phase(Phase::AwaitingScreen { recipient });
            let after = state.config().timings.contact_open_timeout;
            arm(state, TimerPurpose::ContactOpen, after, effects);
        }
        Err(err) => fail_job(
            state,
            FailureReason::InvalidDeepLink(err.to_string()),
            Some(recipient),
            effects,
        ),
    }
}

fn on_screen(state: &mut AppState, snapshot: &ScreenSnapshot, effects: &mut Vec<Effect>) {
    let Some(job_id) = state.active_job_id() else {
        return;
    };
    let config = state.config();
    let kind = classify(snapshot, &config.identity.package, &config.profile);
    let actionable = probe(kind, snapshot, &config.profile);

    match (state.phase().clone(), kind) {
        (Phase::AwaitingScreen { recipient }, ScreenKind::BlockingPopup) => {
            disarm(state, effects);
            effects.push(Effect::Dismiss { job_id });
            conclude(state, recipient, PassOutcome::Skipped, effects);
        }
        (Phase::AwaitingScreen { recipient }, ScreenKind::MediaPreview) if actionable => {
            disarm(state, effects);
            effects.push(Effect::Act { job_id, kind });
            state.set_phase(Phase::ActingOnMediaPreview { recipient });
            let after = state.config().timings.confirm_send_timeout;
            arm(state, TimerPurpose::ConfirmSend, after, effects);
        }
        (Phase::AwaitingScreen { recipient }, ScreenKind::ChatThread) if actionable => {
            disarm(state, effects);
            effects.push(Effect::Act { job_id, kind });
            state.set_phase(Phase::ActingOnChatThread { recipient });
            let after = state.config().timings.confirm_send_timeout;
            arm(state, TimerPurpose::ConfirmSend, after, effects);
        }
        (Phase::AwaitingScreen { .. }, ScreenKind::RecipientConfirmation) if actionable => {
            // Covered by the contact-open timer already running.
            effects.push(Effect::Act { job_id, kind });
        }
        (
            Phase::ActingOnMediaPreview { recipient } | Phase::ActingOnChatThread { recipient },
            ScreenKind::ChatThread,
        ) if !actionable => {
            // The send control vanishing is the only success signal there is.
            disarm(state, effects);
            effects.push(Effect::Dismiss { job_id });
            state.set_phase(Phase::AwaitingReturnHome { recipient });
            let after = state.config().timings.return_home_timeout;
            arm(state, TimerPurpose::ReturnHome, after, effects);
        }
        (Phase::AwaitingReturnHome { recipient }, kind) if kind != ScreenKind::ChatThread => {
            disarm(state, effects);
            conclude(state, recipient, PassOutcome::Sent, effects);
        }
        _ => {}
    }
}

fn on_timer(state: &mut AppState, token: TimerToken, effects: &mut Vec<Effect>) {
    match state.controller().timer {
        Some((armed, _)) if armed == token => {}
        _ => return,
    }
    state.take_timer();
    let Some(job_id) = state.active_job_id() else {
        return;
    };

    match state.phase().clone() {
        Phase::AwaitingScreen { recipient }
        | Phase::ActingOnMediaPreview { recipient }
        | Phase::ActingOnChatThread { recipient } => {
            effects.push(Effect::Dismiss { job_id });
            conclude(state, recipient, PassOutcome::TimedOut, effects);
        }
        Phase::AwaitingReturnHome { recipient } => {
            // Send already registered; only the navigation stalled.
            conclude(state, recipient, PassOutcome::Sent, effects);
        }
        Phase::Settling { recipient, outcome } => {
            pass_complete(state, job_id, recipient, outcome, effects);
        }
        Phase::Idle => {}
    }
}

/// Ends the pass and waits out the advance delay before reporting it.
fn conclude(
    state: &mut AppState,
    recipient: String,
    outcome: PassOutcome,
    effects: &mut Vec<Effect>,
) {
    state.set_phase(Phase::Settling { recipient, outcome });
    let after = state.config().timings.advance_delay;
    arm(state, TimerPurpose::Advance, after, effects);
}

fn pass_complete(
    state: &mut AppState,
    job_id: JobId,
    recipient: String,
    outcome: PassOutcome,
    effects: &mut Vec<Effect>,
) {
    state.set_phase(Phase::Idle);
    let mut queue = QueueState::clone(state.queue());
    queue.current = None;
    queue.outcomes.push((recipient.clone(), outcome));
    state.replace_queue(queue);

    let kind = match outcome {
        PassOutcome::Sent => StatusKind::RecipientSent,
        PassOutcome::Skipped => StatusKind::RecipientSkipped,
        PassOutcome::TimedOut => StatusKind::RecipientTimedOut,
    };
    effects.push(Effect::Notify(StatusNotification::recipient(
        job_id, kind, recipient,
    )));
    advance_queue(state, effects);
}

fn interrupt(state: &mut AppState, effects: &mut Vec<Effect>) {
    let job_id = state.active_job_id();
    disarm(state, effects);
    state.set_phase(Phase::Idle);
    state.replace_queue(QueueState::default());
    state.set_job(None);
    if let Some(job_id) = job_id {
        effects.push(Effect::Notify(StatusNotification::job(
            job_id,
            StatusKind::JobInterrupted,
        )));
    }
}

fn fail_job(
    state: &mut AppState,
    reason: FailureReason,
    recipient: Option<String>,
    effects: &mut Vec<Effect>,
) {
    let job_id = state.active_job_id();
    disarm(state, effects);
    state.set_phase(Phase::Idle);
    state.replace_queue(QueueState::default());
    state.set_job(None);
    if let Some(job_id) = job_id {
        effects.push(Effect::Notify(StatusNotification {
            job_id: Some(job_id),
            kind: StatusKind::JobFailed(reason),
            recipient,
        }));
    }
}

/// Replaces whatever timer is armed with a fresh one.
fn arm(state: &mut AppState, purpose: TimerPurpose, after: Duration, effects: &mut Vec<Effect>) {
    disarm(state, effects);
    let token = state.allocate_timer(purpose);
    effects.push(Effect::ArmTimer {
        token,
        purpose,
        after,
    });
}

fn disarm(state: &mut AppState, effects: &mut Vec<Effect>) {
    if let Some(token) = state.take_timer() {
        effects.push(Effect::DisarmTimer { token });
    }
}

fn summarize(outcomes: &[(String, PassOutcome)]) -> JobSummary {
    outcomes
        .iter()
        .fold(JobSummary::default(), |mut summary, (_, outcome)| {
            match outcome {
                PassOutcome::Sent => summary.sent += 1,
                PassOutcome::Skipped => summary.skipped += 1,
                PassOutcome::TimedOut => summary.timed_out += 1,
            }
            summary
        })
}
