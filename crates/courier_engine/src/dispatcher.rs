use std::sync::Arc;

use courier_core::{resolve, resolve_back, ScreenKind, ScreenProfile, ScreenSnapshot};
use engine_logging::{engine_debug, engine_info};

use crate::Host;

/// Finds and invokes controls on the host's live UI.
pub struct Dispatcher {
    host: Arc<dyn Host>,
    profile: ScreenProfile,
}

impl Dispatcher {
    pub fn new(host: Arc<dyn Host>, profile: ScreenProfile) -> Self {
        Self { host, profile }
    }

    /// Clicks the forward control of `kind` on `snapshot`. True iff an
    /// enabled, clickable control was found and the host accepted the click.
    pub fn act(&self, kind: ScreenKind, snapshot: &ScreenSnapshot) -> bool {
        let Some(node) = resolve(kind, snapshot, &self.profile) else {
            engine_debug!("act {:?}: no actionable control", kind);
            return false;
        };
        let clicked = self.host.click(&node.handle);
        engine_info!("act {:?}: click {} -> {}", kind, node.handle, clicked);
        clicked
    }

    /// Lookup without invocation.
    pub fn probe(&self, kind: ScreenKind, snapshot: &ScreenSnapshot) -> bool {
        courier_core::probe(kind, snapshot, &self.profile)
    }

    /// Navigates back. Prefers an on-screen back affordance and falls back to
    /// the host's back action; never fails.
    pub fn dismiss(&self) {
        if let Some(snapshot) = self.host.current_snapshot() {
            if let Some(node) = resolve_back(&snapshot, &self.profile) {
                if self.host.click(&node.handle) {
                    engine_info!("dismiss: clicked back affordance {}", node.handle);
                    return;
                }
            }
        }
        engine_info!("dismiss: host back");
        self.host.navigate_back();
    }
}
