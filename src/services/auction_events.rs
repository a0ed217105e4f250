use tracing::debug;

use crate::{
    dto::{
        game::{ScoreSummary, player_summaries, team_summaries},
        ws::{OutboundMessage, SignalKind},
    },
    state::{game::Game, hub::ConnectionHub},
};

/// Broadcast the highest bid on the open lot.
pub fn broadcast_bid(hub: &ConnectionHub, game: &Game) {
    send_game_event(
        hub,
        game.id(),
        &OutboundMessage::Bid {
            bid: game.current_bid(),
        },
    );
}

/// Broadcast the bid log of the open lot.
pub fn broadcast_log(hub: &ConnectionHub, game: &Game) {
    let log = game.bid_log().iter().map(Into::into).collect();
    send_game_event(hub, game.id(), &OutboundMessage::Log { log });
}

/// Broadcast the lot currently up for bidding.
pub fn broadcast_team(hub: &ConnectionHub, game: &Game) {
    let team = game.current_lot().map(Into::into);
    send_game_event(hub, game.id(), &OutboundMessage::Team { team });
}

/// Broadcast the seconds left on the open lot.
pub fn broadcast_countdown(hub: &ConnectionHub, game: &Game) {
    send_game_event(
        hub,
        game.id(),
        &OutboundMessage::Countdown {
            countdown: game.countdown(),
        },
    );
}

/// Broadcast the roster with balances and purchases.
pub fn broadcast_players(hub: &ConnectionHub, game: &Game) {
    send_game_event(
        hub,
        game.id(),
        &OutboundMessage::Players {
            players: player_summaries(game),
        },
    );
}

/// Broadcast the teams still waiting in the pool.
pub fn broadcast_remaining(hub: &ConnectionHub, game: &Game) {
    send_game_event(
        hub,
        game.id(),
        &OutboundMessage::Remaining {
            remaining: team_summaries(game.remaining_teams()),
        },
    );
}

/// Broadcast the scoreboard.
pub fn broadcast_scores(hub: &ConnectionHub, game_id: &str, scores: Vec<ScoreSummary>) {
    send_game_event(hub, game_id, &OutboundMessage::Scores { scores });
}

/// Broadcast a one-shot signal.
pub fn broadcast_signal(hub: &ConnectionHub, game_id: &str, kind: SignalKind) {
    send_game_event(hub, game_id, &OutboundMessage::Signal { kind });
}

/// Broadcast everything that changes when a lot closes and the next one opens.
pub fn broadcast_lot_refresh(hub: &ConnectionHub, game: &Game) {
    broadcast_log(hub, game);
    broadcast_team(hub, game);
    broadcast_bid(hub, game);
    broadcast_countdown(hub, game);
    broadcast_players(hub, game);
    broadcast_remaining(hub, game);
}

fn send_game_event(hub: &ConnectionHub, game_id: &str, message: &OutboundMessage) {
    let delivered = hub.broadcast(game_id, message);
    debug!(game_id, delivered, "game event broadcast");
}
