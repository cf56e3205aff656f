//! Rehearsal host: plays a scripted graph of screens in place of a device.
//!
//! Each launch shows a start screen, clicks and back presses follow the
//! transitions named in the script, and every screen change is pushed to the
//! subscriber as a window-content event.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use courier_core::{
    AppIdentity, LaunchIntent, LaunchRequest, NodeHandle, ScreenSnapshot, UiNode,
};
use courier_engine::{Host, HostError, LaunchError, UiEvent, UiEventKind, UiEventStream};
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedScreen {
    pub snapshot: ScreenSnapshot,
    /// Node handle to the screen shown after that node is clicked.
    #[serde(default)]
    pub on_click: BTreeMap<String, String>,
    #[serde(default)]
    pub on_back: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Screen shown after a deep-link launch.
    pub on_launch: String,
    /// Screen shown after a share launch; `on_launch` when absent.
    #[serde(default)]
    pub on_share: Option<String>,
    /// Per-recipient start screens, overriding the two above.
    #[serde(default)]
    pub per_recipient: BTreeMap<String, String>,
    /// Recipients whose launch the host refuses.
    #[serde(default)]
    pub unreachable: Vec<String>,
    #[serde(default = "enabled")]
    pub introspection_enabled: bool,
    pub screens: BTreeMap<String, ScriptedScreen>,
}

fn enabled() -> bool {
    true
}

impl Script {
    /// A chat app that sends on the first click and returns to its chat list.
    pub fn chat_app(package: &str) -> Self {
        let toolbar = || {
            UiNode::new("toolbar").with_child(
                UiNode::new("up")
                    .with_view_id("com.whatsapp:id/back")
                    .with_description("Navigate up")
                    .clickable(),
            )
        };
        let entry = || UiNode::new("entry").with_view_id("com.whatsapp:id/entry");
        let send = || {
            UiNode::new("send")
                .with_view_id("com.whatsapp:id/send")
                .with_description("Send")
                .clickable()
        };

        let mut screens = BTreeMap::new();
        screens.insert(
            "chat".to_string(),
            ScriptedScreen {
                snapshot: ScreenSnapshot::new(
                    package,
                    UiNode::new("chat")
                        .with_child(toolbar())
                        .with_child(entry())
                        .with_child(send()),
                ),
                on_click: transitions(&[("send", "chat_sent"), ("up", "home")]),
                on_back: Some("home".to_string()),
            },
        );
        screens.insert(
            "chat_sent".to_string(),
            ScriptedScreen {
                snapshot: ScreenSnapshot::new(
                    package,
                    UiNode::new("chat")
                        .with_child(toolbar())
                        .with_child(entry())
                        .with_child(
                            UiNode::new("mic")
                                .with_view_id("com.whatsapp:id/voice_note_btn")
                                .clickable(),
                        ),
                ),
                on_click: transitions(&[("up", "home")]),
                on_back: Some("home".to_string()),
            },
        );
        screens.insert(
            "preview".to_string(),
            ScriptedScreen {
                snapshot: ScreenSnapshot::new(
                    package,
                    UiNode::new("preview")
                        .with_child(UiNode::new("caption").with_text("Add a caption"))
                        .with_child(send()),
                ),
                on_click: transitions(&[("send", "chat_sent")]),
                on_back: Some("home".to_string()),
            },
        );
        screens.insert(
            "home".to_string(),
            ScriptedScreen {
                snapshot: ScreenSnapshot::new(
                    package,
                    UiNode::new("home").with_child(UiNode::new("conversations")),
                ),
                on_click: BTreeMap::new(),
                on_back: None,
            },
        );

        Self {
            on_launch: "chat".to_string(),
            on_share: Some("preview".to_string()),
            per_recipient: BTreeMap::new(),
            unreachable: Vec::new(),
            introspection_enabled: true,
            screens,
        }
    }
}

fn transitions(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

#[derive(Default)]
struct Live {
    screen: Option<String>,
    events_tx: Option<mpsc::UnboundedSender<UiEvent>>,
    launches: Vec<String>,
}

pub struct ScriptedHost {
    script: Script,
    live: Mutex<Live>,
}

impl ScriptedHost {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            live: Mutex::new(Live::default()),
        }
    }

    /// Recipients launched so far, in order.
    pub fn launches(&self) -> Vec<String> {
        self.live().launches.clone()
    }

    pub fn current_screen(&self) -> Option<String> {
        self.live().screen.clone()
    }

    fn live(&self) -> MutexGuard<'_, Live> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show(&self, live: &mut Live, name: &str) {
        let Some(screen) = self.script.screens.get(name) else {
            engine_warn!("script has no screen named {:?}", name);
            return;
        };
        engine_debug!("rehearsal screen -> {}", name);
        live.screen = Some(name.to_string());
        if let Some(tx) = &live.events_tx {
            let _ = tx.send(UiEvent {
                package: screen.snapshot.package.clone(),
                kind: UiEventKind::WindowContentChanged,
                snapshot: screen.snapshot.clone(),
            });
        }
    }

    fn start_screen(&self, request: &LaunchRequest) -> &str {
        if let Some(screen) = self.script.per_recipient.get(&request.recipient) {
            return screen;
        }
        match (&request.intent, &self.script.on_share) {
            (LaunchIntent::Share { .. }, Some(screen)) => screen,
            _ => &self.script.on_launch,
        }
    }
}

impl Host for ScriptedHost {
    fn is_introspection_enabled(&self) -> bool {
        self.script.introspection_enabled
    }

    fn launch_target_app(&self, request: &LaunchRequest) -> Result<(), LaunchError> {
        let mut live = self.live();
        live.launches.push(request.recipient.clone());
        if self.script.unreachable.contains(&request.recipient) {
            return Err(LaunchError::Rejected(format!(
                "no chat for {}",
                request.recipient
            )));
        }
        engine_info!("rehearsal launch of {} for {}", request.package, request.recipient);
        let start = self.start_screen(request).to_string();
        self.show(&mut live, &start);
        Ok(())
    }

    fn subscribe_ui_events(&self, identity: &AppIdentity) -> Result<UiEventStream, HostError> {
        if !self.script.introspection_enabled {
            return Err(HostError::IntrospectionDisabled);
        }
        engine_debug!("rehearsal subscription for {}", identity.package);
        let (tx, rx) = mpsc::unbounded_channel();
        self.live().events_tx = Some(tx);
        Ok(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }

    fn current_snapshot(&self) -> Option<ScreenSnapshot> {
        let live = self.live();
        let name = live.screen.as_ref()?;
        self.script
            .screens
            .get(name)
            .map(|screen| screen.snapshot.clone())
    }

    fn click(&self, node: &NodeHandle) -> bool {
        let mut live = self.live();
        let Some(screen) = live
            .screen
            .as_ref()
            .and_then(|name| self.script.screens.get(name))
        else {
            return false;
        };
        let Some(target) = screen
            .snapshot
            .nodes()
            .find(|candidate| candidate.handle == *node)
        else {
            return false;
        };
        if !target.is_actionable() {
            return false;
        }
        if let Some(next) = screen.on_click.get(&node.0).cloned() {
            self.show(&mut live, &next);
        }
        true
    }

    fn navigate_back(&self) {
        let mut live = self.live();
        let next = live
            .screen
            .as_ref()
            .and_then(|name| self.script.screens.get(name))
            .and_then(|screen| screen.on_back.clone());
        if let Some(next) = next {
            self.show(&mut live, &next);
        }
    }
}
