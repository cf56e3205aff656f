mod common;

use std::time::Duration;

use common::*;
use courier_core::{FailureReason, JobSummary, StatusKind};
use courier_engine::{EnqueueError, LaunchError, UiEvent, UiEventKind};
use pretty_assertions::assert_eq;

const R1: &str = "+15550000001";
const R2: &str = "+15550000002";

#[tokio::test(start_paused = true)]
async fn chat_thread_is_sent_and_confirmed_by_leaving() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    let job = engine.enqueue_job(&[R1], "hello", &[]).unwrap();
    assert!(job.is_active());
    assert_eq!(job.recipients(), [R1.to_string()]);

    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    settle().await;
    assert_eq!(host.calls(), vec![HostCall::Launch(R1.into())]);

    host.show(chat_with_send());
    settle().await;
    assert_eq!(host.clicks(), vec!["send"]);

    // Send control disappears: leave the chat through the toolbar.
    host.show(chat_without_send());
    settle().await;
    assert_eq!(host.clicks(), vec!["send", "up"]);

    host.show(chat_list());
    let sent = next_status(&mut status).await;
    assert_eq!(sent.kind, StatusKind::RecipientSent);
    assert_eq!(sent.recipient.as_deref(), Some(R1));

    let done = next_status(&mut status).await;
    assert_eq!(
        done.kind,
        StatusKind::JobComplete(JobSummary {
            sent: 1,
            skipped: 0,
            timed_out: 0
        })
    );
    assert!(!job.is_active());
    assert_eq!(engine.active_job(), None);
    assert!(!engine.queue_state().is_active);
}

#[tokio::test(start_paused = true)]
async fn silent_host_times_out_and_goes_back() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    engine.enqueue_job(&[R1], "hello", &[]).unwrap();

    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    let timed_out = next_status(&mut status).await;
    assert_eq!(timed_out.kind, StatusKind::RecipientTimedOut);
    assert_eq!(timed_out.recipient.as_deref(), Some(R1));
    assert!(matches!(
        next_status(&mut status).await.kind,
        StatusKind::JobComplete(JobSummary { timed_out: 1, .. })
    ));

    // Nothing on screen to click, so the host's own back action is used.
    assert_eq!(
        host.calls(),
        vec![HostCall::Launch(R1.into()), HostCall::Back]
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_moves_on_to_the_next_recipient() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    engine.enqueue_job(&[R1, R2], "hello", &[]).unwrap();

    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    let first = next_status(&mut status).await;
    assert_eq!(first.kind, StatusKind::RecipientTimedOut);
    assert_eq!(first.recipient.as_deref(), Some(R1));
    settle().await;
    assert_eq!(engine.queue_state().current.as_deref(), Some(R2));

    host.show(media_preview());
    settle().await;
    host.show(chat_without_send());
    settle().await;
    host.show(chat_list());

    let second = next_status(&mut status).await;
    assert_eq!(second.kind, StatusKind::RecipientSent);
    assert_eq!(second.recipient.as_deref(), Some(R2));
    assert_eq!(
        next_status(&mut status).await.kind,
        StatusKind::JobComplete(JobSummary {
            sent: 1,
            skipped: 0,
            timed_out: 1
        })
    );
    assert_eq!(
        host.calls(),
        vec![
            HostCall::Launch(R1.into()),
            HostCall::Back,
            HostCall::Launch(R2.into()),
            HostCall::Click("send".into()),
            HostCall::Click("up".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn interrupt_blocks_further_dispatch() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    let job = engine.enqueue_job(&[R1, R2], "hello", &[]).unwrap();
    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    settle().await;

    host.show(chat_with_send());
    job.interrupt();
    assert!(!job.is_active());
    settle().await;

    let interrupted = next_status(&mut status).await;
    assert_eq!(interrupted.kind, StatusKind::JobInterrupted);
    assert_eq!(interrupted.job_id, Some(job.job_id()));

    // Well past every timeout: no further status and no host calls.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(status.try_recv().is_err());
    assert_eq!(host.calls(), vec![HostCall::Launch(R1.into())]);
    assert!(engine.queue_state().pending.is_empty());
}

#[tokio::test(start_paused = true)]
async fn popup_is_dismissed_and_recipient_skipped() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    engine.enqueue_job(&[R1], "hello", &[]).unwrap();
    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    settle().await;

    host.show(popup());
    let skipped = next_status(&mut status).await;
    assert_eq!(skipped.kind, StatusKind::RecipientSkipped);
    assert!(host.calls().contains(&HostCall::Back));
    assert!(host.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn launch_failure_fails_the_job_and_frees_the_slot() {
    let host = FakeHost::new();
    host.fail_launches(Some(LaunchError::NotInstalled("com.whatsapp".into())));
    let (engine, mut status) = spawn_engine(host.clone());
    let job = engine.enqueue_job(&[R1, R2], "hello", &[]).unwrap();

    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    let failed = next_status(&mut status).await;
    assert_eq!(
        failed.kind,
        StatusKind::JobFailed(FailureReason::LaunchFailed(
            "target application com.whatsapp is not installed".into()
        ))
    );
    assert_eq!(failed.recipient.as_deref(), Some(R1));
    assert!(!job.is_active());
    assert_eq!(host.calls(), vec![HostCall::Launch(R1.into())]);

    host.fail_launches(None);
    assert!(engine.enqueue_job(&[R2], "again", &[]).is_ok());
}

#[tokio::test(start_paused = true)]
async fn disabled_introspection_rejects_and_asks_for_it() {
    let host = FakeHost::new();
    host.set_enabled(false);
    let (engine, mut status) = spawn_engine(host.clone());

    let err = engine.enqueue_job(&[R1], "hello", &[]).err();
    assert_eq!(err, Some(EnqueueError::IntrospectionDisabled));
    let asked = next_status(&mut status).await;
    assert_eq!(asked.kind, StatusKind::IntrospectionRequired);
    assert_eq!(asked.job_id, None);
    assert_eq!(engine.active_job(), None);
    assert!(host.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_job_while_busy_is_refused() {
    let host = FakeHost::new();
    let (engine, _status) = spawn_engine(host.clone());
    let first = engine.enqueue_job(&[R1], "hello", &[]).unwrap();

    let err = engine.enqueue_job(&[R2], "other", &[]).err();
    assert_eq!(
        err,
        Some(EnqueueError::Busy {
            active: first.job_id()
        })
    );
    assert_eq!(engine.active_job(), Some(first.job_id()));
}

#[tokio::test(start_paused = true)]
async fn malformed_attachment_is_refused_up_front() {
    let host = FakeHost::new();
    let (engine, _status) = spawn_engine(host.clone());

    let err = engine.enqueue_job(&[R1], "hello", &["not a uri"]).err();
    assert!(matches!(err, Some(EnqueueError::InvalidJob(_))));
    assert_eq!(engine.active_job(), None);
}

#[tokio::test(start_paused = true)]
async fn lost_subscription_fails_the_job_then_resubscribes() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    engine.enqueue_job(&[R1], "hello", &[]).unwrap();
    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    settle().await;

    host.drop_subscription();
    let failed = next_status(&mut status).await;
    assert_eq!(
        failed.kind,
        StatusKind::JobFailed(FailureReason::ServiceLost)
    );
    assert_eq!(failed.recipient.as_deref(), Some(R1));
    settle().await;

    engine.enqueue_job(&[R2], "hello", &[]).unwrap();
    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    settle().await;
    host.show(chat_with_send());
    settle().await;
    assert_eq!(host.clicks(), vec!["send"]);
}

#[tokio::test(start_paused = true)]
async fn foreign_and_non_window_events_are_ignored() {
    let host = FakeHost::new();
    let (engine, mut status) = spawn_engine(host.clone());
    engine.enqueue_job(&[R1], "hello", &[]).unwrap();
    assert_eq!(next_status(&mut status).await.kind, StatusKind::JobStarted);
    settle().await;

    host.emit(UiEvent {
        package: "com.android.launcher".into(),
        kind: UiEventKind::WindowStateChanged,
        snapshot: chat_with_send(),
    });
    host.emit(UiEvent {
        package: PKG.into(),
        kind: UiEventKind::ViewFocused,
        snapshot: chat_with_send(),
    });
    settle().await;
    assert!(host.clicks().is_empty());
}
