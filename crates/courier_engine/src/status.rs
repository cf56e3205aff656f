use courier_core::StatusNotification;
use tokio::sync::mpsc;

/// Outbound status channel. Fire-and-forget.
pub trait StatusSink: Send + Sync {
    fn notify(&self, notification: StatusNotification);
}

pub struct ChannelStatusSink {
    tx: mpsc::UnboundedSender<StatusNotification>,
}

impl ChannelStatusSink {
    pub fn new(tx: mpsc::UnboundedSender<StatusNotification>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end, for callers that just want a channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl StatusSink for ChannelStatusSink {
    fn notify(&self, notification: StatusNotification) {
        let _ = self.tx.send(notification);
    }
}
