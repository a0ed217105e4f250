//! Live WebSocket connections grouped by game.

use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Handle used to push messages to a connected client.
#[derive(Clone, Debug)]
pub struct HubConnection {
    /// Identifier assigned when the socket was accepted.
    pub id: Uuid,
    /// Outbound queue drained by the socket loop.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Registry of live connections keyed by game id.
///
/// Groups only exist while they hold at least one connection.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    groups: DashMap<String, Vec<HubConnection>>,
}

impl ConnectionHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `connection` to the group of `game_id`.
    pub fn register(&self, game_id: &str, connection: HubConnection) {
        debug!(game_id, connection_id = %connection.id, "connection registered");
        self.groups
            .entry(game_id.to_string())
            .or_default()
            .push(connection);
    }

    /// Remove a connection, retiring the group once it is empty.
    pub fn unregister(&self, game_id: &str, connection_id: Uuid) {
        if let Some(mut group) = self.groups.get_mut(game_id) {
            group.retain(|connection| connection.id != connection_id);
        }
        self.groups.remove_if(game_id, |_, group| group.is_empty());
        debug!(game_id, %connection_id, "connection unregistered");
    }

    /// Serialize `value` once and queue it on every connection of `game_id`.
    ///
    /// Connections whose queue is closed are pruned. Returns the number of
    /// connections the message was queued on.
    pub fn broadcast<T>(&self, game_id: &str, value: &T) -> usize
    where
        T: ?Sized + Serialize,
    {
        let Some(payload) = encode(value) else {
            return 0;
        };

        let delivered = match self.groups.get_mut(game_id) {
            Some(mut group) => {
                group.retain(|connection| {
                    let sent = connection.tx.send(Message::Text(payload.clone())).is_ok();
                    if !sent {
                        warn!(
                            game_id,
                            connection_id = %connection.id,
                            "dropping closed connection"
                        );
                    }
                    sent
                });
                group.len()
            }
            None => 0,
        };

        if delivered == 0 {
            self.groups.remove_if(game_id, |_, group| group.is_empty());
        }
        delivered
    }

    /// Number of live connections registered for `game_id`.
    pub fn connection_count(&self, game_id: &str) -> usize {
        self.groups.get(game_id).map_or(0, |group| group.len())
    }
}

/// Serialize a payload and push it onto a single connection's queue.
///
/// Serialization failures are logged and swallowed. Returns `false` when the
/// queue is closed.
pub fn send_to<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> bool
where
    T: ?Sized + Serialize,
{
    match encode(value) {
        Some(payload) => tx.send(Message::Text(payload)).is_ok(),
        None => true,
    }
}

fn encode<T>(value: &T) -> Option<Utf8Bytes>
where
    T: ?Sized + Serialize,
{
    match serde_json::to_string(value) {
        Ok(payload) => Some(payload.into()),
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn connection() -> (HubConnection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            HubConnection {
                id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    fn text(message: Message) -> String {
        match message {
            Message::Text(text) => text.to_string(),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn broadcast_reaches_only_the_target_game() {
        let hub = ConnectionHub::new();
        let (alice, mut alice_rx) = connection();
        let (bob, mut bob_rx) = connection();
        hub.register("GAME01", alice);
        hub.register("GAME02", bob);

        assert_eq!(hub.broadcast("GAME01", &json!({ "bid": 5 })), 1);

        assert_eq!(text(alice_rx.try_recv().unwrap()), r#"{"bid":5}"#);
        assert!(bob_rx.try_recv().is_err());
    }

    #[test]
    fn dead_connection_is_pruned_without_affecting_siblings() {
        let hub = ConnectionHub::new();
        let (alive, mut alive_rx) = connection();
        let (dead, dead_rx) = connection();
        hub.register("GAME01", dead);
        hub.register("GAME01", alive);
        drop(dead_rx);

        assert_eq!(hub.broadcast("GAME01", &json!({ "countdown": 9 })), 1);
        assert_eq!(hub.connection_count("GAME01"), 1);
        assert_eq!(text(alive_rx.try_recv().unwrap()), r#"{"countdown":9}"#);
    }

    #[test]
    fn group_is_retired_when_last_connection_leaves() {
        let hub = ConnectionHub::new();
        let (first, _first_rx) = connection();
        let (second, _second_rx) = connection();
        let (first_id, second_id) = (first.id, second.id);
        hub.register("GAME01", first);
        hub.register("GAME01", second);

        hub.unregister("GAME01", first_id);
        assert!(hub.groups.contains_key("GAME01"));
        hub.unregister("GAME01", second_id);
        assert!(!hub.groups.contains_key("GAME01"));
    }

    #[test]
    fn broadcast_to_fully_closed_group_retires_it() {
        let hub = ConnectionHub::new();
        let (dead, dead_rx) = connection();
        hub.register("GAME01", dead);
        drop(dead_rx);

        assert_eq!(hub.broadcast("GAME01", &json!({ "log": [] })), 0);
        assert!(!hub.groups.contains_key("GAME01"));
    }

    #[test]
    fn send_to_reports_closed_queue() {
        let (open, mut open_rx) = connection();
        assert!(send_to(&open.tx, &json!({ "team": "East 1" })));
        assert!(open_rx.try_recv().is_ok());

        drop(open_rx);
        assert!(!send_to(&open.tx, &json!({ "team": "East 1" })));
    }
}
