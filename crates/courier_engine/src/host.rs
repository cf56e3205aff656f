use courier_core::{AppIdentity, LaunchRequest, NodeHandle, ScreenSnapshot};
use futures_util::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEventKind {
    WindowStateChanged,
    WindowContentChanged,
    ViewClicked,
    ViewFocused,
}

impl UiEventKind {
    /// Only window-level changes carry a fresh picture of the screen.
    pub fn is_window_change(self) -> bool {
        matches!(
            self,
            UiEventKind::WindowStateChanged | UiEventKind::WindowContentChanged
        )
    }
}

/// One notification from the host's introspection facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub package: String,
    pub kind: UiEventKind,
    pub snapshot: ScreenSnapshot,
}

/// Ends when the subscription is lost.
pub type UiEventStream = BoxStream<'static, UiEvent>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LaunchError {
    #[error("target application {0} is not installed")]
    NotInstalled(String),
    #[error("launch rejected by host: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("introspection service is disabled")]
    IntrospectionDisabled,
    #[error("ui event subscription failed: {0}")]
    Subscription(String),
}

/// Everything the engine needs from the device it automates.
///
/// Calls are made from the engine's single executor and must not block for
/// long; waiting is the engine's job.
pub trait Host: Send + Sync {
    /// Whether the user has enabled the introspection facility for us.
    fn is_introspection_enabled(&self) -> bool;

    fn launch_target_app(&self, request: &LaunchRequest) -> Result<(), LaunchError>;

    /// Stream of UI changes. Filtering to `identity` is done by the engine as
    /// well, so hosts may deliver everything.
    fn subscribe_ui_events(&self, identity: &AppIdentity) -> Result<UiEventStream, HostError>;

    /// Fresh read of the active window, if there is one.
    fn current_snapshot(&self) -> Option<ScreenSnapshot>;

    /// Click-equivalent action on a live node. False if the host refused.
    fn click(&self, node: &NodeHandle) -> bool;

    /// Host-level back navigation.
    fn navigate_back(&self);
}
