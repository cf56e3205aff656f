#![allow(dead_code)]

use std::sync::{Arc, Once};

use courier_core::{
    update, AppState, CoreConfig, Effect, Job, JobId, Msg, NumberPolicy, ScreenSnapshot,
    StatusNotification, TimerPurpose, TimerToken, UiNode,
};

pub const PKG: &str = "com.whatsapp";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn job(numbers: &[&str]) -> Arc<Job> {
    Arc::new(Job::new(numbers, "hi", &[], &NumberPolicy::default()).expect("valid job"))
}

pub fn start(numbers: &[&str]) -> (AppState, Vec<Effect>) {
    start_with_id(AppState::new(CoreConfig::default()), 1, numbers)
}

pub fn start_with_id(state: AppState, job_id: JobId, numbers: &[&str]) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StartJob {
            job_id,
            job: job(numbers),
        },
    )
}

pub fn screen(state: AppState, snapshot: ScreenSnapshot) -> (AppState, Vec<Effect>) {
    update(state, Msg::ScreenChanged(Arc::new(snapshot)))
}

pub fn fire(state: AppState, token: TimerToken) -> (AppState, Vec<Effect>) {
    update(state, Msg::TimerFired(token))
}

/// Fires whatever timer is currently armed.
pub fn fire_armed(state: AppState) -> (AppState, Vec<Effect>) {
    let (token, _) = state.controller().timer.expect("a timer is armed");
    fire(state, token)
}

pub fn armed(effects: &[Effect]) -> Option<(TimerToken, TimerPurpose)> {
    effects.iter().rev().find_map(|effect| match effect {
        Effect::ArmTimer { token, purpose, .. } => Some((*token, *purpose)),
        _ => None,
    })
}

pub fn notifications(effects: &[Effect]) -> Vec<StatusNotification> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(notification) => Some(notification.clone()),
            _ => None,
        })
        .collect()
}

pub fn launched_recipients(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Launch { request, .. } => Some(request.recipient.clone()),
            _ => None,
        })
        .collect()
}

/// Host-visible side effects only (no timers, no notifications).
pub fn dispatches(effects: &[Effect]) -> Vec<Effect> {
    effects
        .iter()
        .filter(|effect| effect.dispatch_job().is_some())
        .cloned()
        .collect()
}

fn entry() -> UiNode {
    UiNode::new("entry").with_view_id("com.whatsapp:id/entry")
}

fn send() -> UiNode {
    UiNode::new("send")
        .with_view_id("com.whatsapp:id/send")
        .with_description("Send")
        .clickable()
}

fn toolbar() -> UiNode {
    UiNode::new("toolbar").with_child(
        UiNode::new("up")
            .with_description("Navigate up")
            .clickable(),
    )
}

pub fn chat_with_send() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root")
            .with_child(toolbar())
            .with_child(entry().with_text("hi"))
            .with_child(send()),
    )
}

pub fn chat_with_disabled_send() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root")
            .with_child(toolbar())
            .with_child(entry())
            .with_child(send().disabled()),
    )
}

/// Chat after the send went through: the send control turned into the mic.
pub fn chat_without_send() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root")
            .with_child(toolbar())
            .with_child(entry())
            .with_child(
                UiNode::new("mic")
                    .with_view_id("com.whatsapp:id/voice_note_btn")
                    .clickable(),
            ),
    )
}

pub fn media_preview() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root")
            .with_child(UiNode::new("caption").with_view_id("com.whatsapp:id/caption"))
            .with_child(send()),
    )
}

pub fn popup() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("dialog")
            .with_child(UiNode::new("message").with_text("Invite to WhatsApp?"))
            .with_child(
                UiNode::new("cancel")
                    .with_view_id("android:id/button2")
                    .with_text("Cancel")
                    .clickable(),
            ),
    )
}

pub fn confirmation() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root").with_child(
            UiNode::new("fab")
                .with_view_id("com.whatsapp:id/fab")
                .clickable(),
        ),
    )
}

pub fn chat_list() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root").with_child(UiNode::new("conversations").with_view_id("android:id/list")),
    )
}
