use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{dto::ws::ServerMessage, error::ConnectionError, state::game::ConnectionId};

/// Outbound half of a subscriber: already-encoded JSON frames.
pub type FrameSender = mpsc::UnboundedSender<String>;

/// Session-scoped subscriber list used to fan messages out to players.
///
/// Sends never block; a subscriber whose channel is closed is reported back
/// to the caller as unreachable.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: DashMap<ConnectionId, FrameSender>,
}

impl BroadcastHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start delivering messages to `connection`.
    pub fn subscribe(&self, connection: ConnectionId, sender: FrameSender) {
        self.subscribers.insert(connection, sender);
    }

    /// Stop delivering messages to `connection`.
    pub fn unsubscribe(&self, connection: &ConnectionId) -> bool {
        self.subscribers.remove(connection).is_some()
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// `true` when nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Send `message` to every subscriber, returning the ones that could not be reached.
    pub fn broadcast(&self, message: &ServerMessage) -> Vec<ConnectionId> {
        let Some(frame) = encode(message) else {
            return Vec::new();
        };

        self.subscribers
            .iter()
            .filter(|entry| entry.value().send(frame.clone()).is_err())
            .map(|entry| *entry.key())
            .collect()
    }

    /// Send `message` to a single subscriber.
    pub fn send_to(
        &self,
        connection: &ConnectionId,
        message: &ServerMessage,
    ) -> Result<(), ConnectionError> {
        let sender = self
            .subscribers
            .get(connection)
            .map(|entry| entry.value().clone())
            .ok_or(ConnectionError::PeerUnreachable)?;
        send_frame(&sender, message)
    }
}

/// Serialize `message` and push it onto `sender`.
///
/// Serialization failures are logged and swallowed; a closed channel is
/// reported as [`ConnectionError::PeerUnreachable`].
pub fn send_frame(sender: &FrameSender, message: &ServerMessage) -> Result<(), ConnectionError> {
    let Some(frame) = encode(message) else {
        return Ok(());
    };
    sender
        .send(frame)
        .map_err(|_| ConnectionError::PeerUnreachable)
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(frame) => Some(frame),
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{message:?}`");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let hub = BroadcastHub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.subscribe(Uuid::new_v4(), tx_a);
        hub.subscribe(Uuid::new_v4(), tx_b);

        let unreachable = hub.broadcast(&ServerMessage::error("boom"));
        assert!(unreachable.is_empty());
        let expected = r#"{"type":"error","message":"boom"}"#;
        assert_eq!(rx_a.try_recv().unwrap(), expected);
        assert_eq!(rx_b.try_recv().unwrap(), expected);
    }

    #[test]
    fn dead_subscriber_is_reported_without_blocking_others() {
        let hub = BroadcastHub::new();
        let dead = Uuid::new_v4();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        hub.subscribe(dead, tx_dead);
        hub.subscribe(Uuid::new_v4(), tx_live);
        drop(rx_dead);

        let unreachable = hub.broadcast(&ServerMessage::error("still here"));
        assert_eq!(unreachable, vec![dead]);
        assert!(rx_live.try_recv().is_ok());
    }

    #[test]
    fn direct_send_to_unknown_connection_fails() {
        let hub = BroadcastHub::new();
        assert!(matches!(
            hub.send_to(&Uuid::new_v4(), &ServerMessage::error("nobody")),
            Err(ConnectionError::PeerUnreachable)
        ));
    }
}
