use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    channel::Channel,
    error::ChannelError,
    types::{ChannelStatus, OutboundEvent},
};

/// In-process reference adapter used by the HTTP gateway and by integration
/// tests (§4.13). "Connecting" is a no-op — there is no external transport —
/// but the adapter still goes through the same lifecycle as a real one so
/// the `ChannelManager` treats it uniformly.
pub struct WebchatChannel {
    status: Mutex<ChannelStatus>,
    outbox: mpsc::UnboundedSender<OutboundEvent>,
}

impl WebchatChannel {
    /// Returns the adapter plus the receiving half of its outbox, so a
    /// caller (gateway handler or test) can read back what was sent.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { status: Mutex::new(ChannelStatus::Disconnected), outbox: tx }, rx)
    }
}

#[async_trait]
impl Channel for WebchatChannel {
    fn name(&self) -> &str {
        "webchat"
    }

    async fn connect(&mut self) -> Result<(), ChannelError> {
        *self.status.lock().unwrap() = ChannelStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ChannelError> {
        *self.status.lock().unwrap() = ChannelStatus::Disconnected;
        Ok(())
    }

    async fn send(&self, event: &OutboundEvent) -> Result<(), ChannelError> {
        self.outbox
            .send(event.clone())
            .map_err(|_| ChannelError::SendFailed("webchat outbox closed".to_string()))
    }

    fn status(&self) -> ChannelStatus {
        self.status.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[tokio::test]
    async fn connect_send_disconnect_round_trip() {
        let (mut channel, mut rx) = WebchatChannel::new();
        assert_eq!(channel.status(), ChannelStatus::Disconnected);

        channel.connect().await.unwrap();
        assert_eq!(channel.status(), ChannelStatus::Connected);

        let event = OutboundEvent {
            kind: EventKind::Final,
            text: "Bonjour".to_string(),
            new_state: "START".to_string(),
        };
        channel.send(&event).await.unwrap();
        let received = rx.try_recv().unwrap();
        assert_eq!(received.text, "Bonjour");

        channel.disconnect().await.unwrap();
        assert_eq!(channel.status(), ChannelStatus::Disconnected);
    }
}
