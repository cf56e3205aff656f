//! Courier core: pure broadcast state machine, screen classification and
//! the data model shared with the engine.
mod classify;
mod dispatch;
mod effect;
mod job;
mod launch;
mod msg;
mod phone;
mod screen;
mod state;
mod update;

pub use classify::classify;
pub use dispatch::{probe, resolve, resolve_back, target_matcher};
pub use effect::{Effect, FailureReason, JobSummary, StatusKind, StatusNotification};
pub use job::{Job, JobError, JobId};
pub use launch::{AppIdentity, LaunchIntent, LaunchRequest};
pub use msg::Msg;
pub use phone::{normalize, NumberPolicy};
pub use screen::{
    ControlMatcher, Descendants, NodeHandle, ScreenKind, ScreenProfile, ScreenSnapshot, UiNode,
};
pub use state::{
    AppState, ControllerState, CoreConfig, PassOutcome, Phase, QueueState, Timings, TimerPurpose,
    TimerToken,
};
pub use update::update;
