use std::sync::Arc;

use courier_core::{AppIdentity, Msg};
use engine_logging::engine_trace;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::UiEventStream;

/// Forwards the target application's window changes to the executor, in
/// arrival order.
///
/// Returns true when the host ended the stream, false when the engine shut
/// down first.
pub(crate) async fn forward_ui_events(
    mut events: UiEventStream,
    identity: &AppIdentity,
    msg_tx: &mpsc::UnboundedSender<Msg>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return false,
            event = events.next() => event,
        };
        let Some(event) = event else {
            return true;
        };
        if event.package != identity.package || !event.kind.is_window_change() {
            engine_trace!("ignoring {:?} from {}", event.kind, event.package);
            continue;
        }
        if msg_tx.send(Msg::ScreenChanged(Arc::new(event.snapshot))).is_err() {
            return false;
        }
    }
}
