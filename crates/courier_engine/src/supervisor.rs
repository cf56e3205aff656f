use std::time::Duration;

use courier_core::{Msg, TimerPurpose, TimerToken};
use engine_logging::{engine_debug, engine_trace};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Owns the single pending timer. Arming replaces whatever was armed before.
pub(crate) struct Supervisor {
    runtime: Handle,
    msg_tx: mpsc::UnboundedSender<Msg>,
    armed: Option<(TimerToken, AbortHandle)>,
}

impl Supervisor {
    pub(crate) fn new(runtime: Handle, msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            runtime,
            msg_tx,
            armed: None,
        }
    }

    pub(crate) fn arm(&mut self, token: TimerToken, purpose: TimerPurpose, after: Duration) {
        self.cancel_armed();
        engine_debug!("arm timer {:?} ({:?}) for {:?}", token, purpose, after);
        let msg_tx = self.msg_tx.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            let _ = msg_tx.send(Msg::TimerFired(token));
        });
        self.armed = Some((token, task.abort_handle()));
    }

    pub(crate) fn disarm(&mut self, token: TimerToken) {
        if matches!(self.armed, Some((armed, _)) if armed == token) {
            self.cancel_armed();
        }
    }

    pub(crate) fn cancel_armed(&mut self) {
        if let Some((token, handle)) = self.armed.take() {
            engine_trace!("cancel timer {:?}", token);
            handle.abort();
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.cancel_armed();
    }
}
