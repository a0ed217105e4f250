use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::game::{
    BidSummary, GameSnapshot, LotSummary, PlayerSummary, ScoreSummary, TeamSummary,
};

/// Close code sent when a client subscribes to a game that does not exist.
pub const INVALID_GAME_CLOSE_CODE: u16 = 4004;
/// Close reason paired with [`INVALID_GAME_CLOSE_CODE`].
pub const INVALID_GAME_CLOSE_REASON: &str = "invalid game";

/// Plain-text form of the start command.
const START_GAME_TEXT: &str = "startGame";

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
/// Messages accepted from game WebSocket clients.
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Creator asks to start the game.
    #[serde(rename = "startGame")]
    StartGame,
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Parse a text frame, accepting the bare `startGame` command as well as JSON.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        if text.trim() == START_GAME_TEXT {
            return Ok(Self::StartGame);
        }
        serde_json::from_str(text)
    }
}

/// One-shot signals pushed to every subscriber.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub enum SignalKind {
    #[serde(rename = "gameStarted")]
    GameStarted,
    #[serde(rename = "poolExhausted")]
    PoolExhausted,
}

/// Messages pushed to game WebSocket clients.
///
/// Each variant serializes as a single-purpose object such as `{"bid": 5}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Full state, sent once on connect.
    Snapshot(GameSnapshot),
    Bid {
        bid: u32,
    },
    Log {
        log: Vec<BidSummary>,
    },
    /// Newly opened lot, `null` once the pool is exhausted.
    Team {
        team: Option<LotSummary>,
    },
    Countdown {
        countdown: u32,
    },
    Players {
        players: Vec<PlayerSummary>,
    },
    Remaining {
        remaining: Vec<TeamSummary>,
    },
    Scores {
        scores: Vec<ScoreSummary>,
    },
    Signal {
        #[serde(rename = "type")]
        kind: SignalKind,
    },
    /// Failure of a command sent on this socket.
    Error {
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_plain_and_json_start_commands() {
        assert_eq!(
            InboundMessage::parse("startGame").unwrap(),
            InboundMessage::StartGame
        );
        assert_eq!(
            InboundMessage::parse(r#"{"type":"startGame"}"#).unwrap(),
            InboundMessage::StartGame
        );
        assert_eq!(
            InboundMessage::parse(r#"{"type":"dance"}"#).unwrap(),
            InboundMessage::Unknown
        );
        assert!(InboundMessage::parse("hello").is_err());
    }

    #[test]
    fn events_serialize_as_single_key_objects() {
        assert_eq!(
            serde_json::to_value(OutboundMessage::Countdown { countdown: 7 }).unwrap(),
            json!({ "countdown": 7 })
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::Team { team: None }).unwrap(),
            json!({ "team": null })
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::Signal {
                kind: SignalKind::GameStarted
            })
            .unwrap(),
            json!({ "type": "gameStarted" })
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::Error {
                error: "nope".into()
            })
            .unwrap(),
            json!({ "error": "nope" })
        );
    }
}
