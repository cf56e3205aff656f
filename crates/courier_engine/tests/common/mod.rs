#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier_core::{
    AppIdentity, LaunchRequest, NodeHandle, ScreenSnapshot, StatusNotification, UiNode,
};
use courier_engine::{
    ChannelStatusSink, EngineConfig, EngineHandle, Host, HostError, LaunchError, UiEvent,
    UiEventKind, UiEventStream,
};
use futures_util::StreamExt;
use tokio::sync::mpsc;

pub const PKG: &str = "com.whatsapp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Launch(String),
    Click(String),
    Back,
}

/// Host double: records every call and lets the test play screens.
pub struct FakeHost {
    enabled: AtomicBool,
    launch_error: Mutex<Option<LaunchError>>,
    events_tx: Mutex<Option<mpsc::UnboundedSender<UiEvent>>>,
    current: Mutex<Option<ScreenSnapshot>>,
    calls: Mutex<Vec<HostCall>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(true),
            launch_error: Mutex::new(None),
            events_tx: Mutex::new(None),
            current: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_launches(&self, error: Option<LaunchError>) {
        *self.launch_error.lock().unwrap() = error;
    }

    /// Makes `snapshot` the active window and notifies subscribers.
    pub fn show(&self, snapshot: ScreenSnapshot) {
        *self.current.lock().unwrap() = Some(snapshot.clone());
        self.emit(UiEvent {
            package: snapshot.package.clone(),
            kind: UiEventKind::WindowContentChanged,
            snapshot,
        });
    }

    pub fn emit(&self, event: UiEvent) {
        if let Some(tx) = self.events_tx.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Ends the current subscription as if the service was disabled.
    pub fn drop_subscription(&self) {
        self.events_tx.lock().unwrap().take();
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Click(handle) => Some(handle),
                _ => None,
            })
            .collect()
    }
}

impl Host for FakeHost {
    fn is_introspection_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn launch_target_app(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::Launch(request.recipient.clone()));
        match self.launch_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn subscribe_ui_events(&self, _identity: &AppIdentity) -> Result<UiEventStream, HostError> {
        if !self.is_introspection_enabled() {
            return Err(HostError::IntrospectionDisabled);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events_tx.lock().unwrap() = Some(tx);
        Ok(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }

    fn current_snapshot(&self) -> Option<ScreenSnapshot> {
        self.current.lock().unwrap().clone()
    }

    fn click(&self, node: &NodeHandle) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::Click(node.0.clone()));
        true
    }

    fn navigate_back(&self) {
        self.calls.lock().unwrap().push(HostCall::Back);
    }
}

pub fn spawn_engine(
    host: Arc<FakeHost>,
) -> (EngineHandle, mpsc::UnboundedReceiver<StatusNotification>) {
    let (sink, status) = ChannelStatusSink::channel();
    let engine =
        EngineHandle::spawn(EngineConfig::default(), host, Arc::new(sink)).expect("engine");
    (engine, status)
}

/// Lets every ready task run; the paused clock only moves once all are idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

pub async fn next_status(
    status: &mut mpsc::UnboundedReceiver<StatusNotification>,
) -> StatusNotification {
    tokio::time::timeout(Duration::from_secs(120), status.recv())
        .await
        .expect("status within timeout")
        .expect("status channel open")
}

fn toolbar() -> UiNode {
    UiNode::new("toolbar").with_child(UiNode::new("up").with_description("Navigate up").clickable())
}

fn send() -> UiNode {
    UiNode::new("send")
        .with_view_id("com.whatsapp:id/send")
        .clickable()
}

pub fn chat_with_send() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root")
            .with_child(toolbar())
            .with_child(UiNode::new("entry").with_view_id("com.whatsapp:id/entry"))
            .with_child(send()),
    )
}

pub fn chat_without_send() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("root")
            .with_child(toolbar())
            .with_child(UiNode::new("entry").with_view_id("com.whatsapp:id/entry")),
    )
}

pub fn media_preview() -> ScreenSnapshot {
    ScreenSnapshot::new(PKG, UiNode::new("root").with_child(send()))
}

pub fn popup() -> ScreenSnapshot {
    ScreenSnapshot::new(
        PKG,
        UiNode::new("dialog").with_child(
            UiNode::new("cancel")
                .with_view_id("android:id/button2")
                .with_text("Cancel")
                .clickable(),
        ),
    )
}

pub fn chat_list() -> ScreenSnapshot {
    ScreenSnapshot::new(PKG, UiNode::new("root").with_child(UiNode::new("list")))
}
