//! Per-game auction engine.
//!
//! Every game is owned by one task that applies commands in arrival order. Handlers
//! talk to it through an [`AuctionHandle`]; the countdown ticker feeds the same
//! mailbox, so bids, ticks and finalization never interleave.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    dao::bracket::BracketProvider,
    dto::{
        game::{GameSnapshot, GameSummary, ScoreSummary},
        ws::{OutboundMessage, SignalKind},
    },
    error::ServiceError,
    services::{auction_events, countdown::Countdown, scoring::compute_scores},
    state::{
        game::{BidRecord, Game},
        hub::{ConnectionHub, HubConnection, send_to},
        phase::AuctionPhase,
    },
};

/// Commands buffered per game before senders wait.
pub const MAILBOX_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Join {
        player: String,
        reply: Reply<Result<(), ServiceError>>,
    },
    View {
        reply: Reply<GameSummary>,
    },
    Bid {
        bid: BidRecord,
        reply: Reply<Result<(), ServiceError>>,
    },
    Start {
        token: String,
        reply: Reply<Result<(), ServiceError>>,
    },
    Finalize {
        reply: Reply<Result<(), ServiceError>>,
    },
    Scores {
        reply: Reply<Vec<ScoreSummary>>,
    },
    Subscribe {
        connection: HubConnection,
        reply: Reply<()>,
    },
    State {
        reply: Reply<Game>,
    },
    Tick {
        generation: u64,
    },
}

/// Cloneable address of a running auction engine.
#[derive(Clone, Debug)]
pub struct AuctionHandle {
    game_id: String,
    tx: mpsc::Sender<Command>,
}

impl AuctionHandle {
    /// Start the engine task for `game` with an OS-seeded random source.
    pub fn spawn(
        game: Game,
        hub: Arc<ConnectionHub>,
        bracket: Arc<dyn BracketProvider>,
    ) -> Result<Self, ServiceError> {
        Self::spawn_with_rng(game, hub, bracket, StdRng::from_os_rng())
    }

    /// Start the engine task for `game` drawing lots from `rng`.
    ///
    /// A game that has not opened a lot yet gets its first lot drawn here.
    pub fn spawn_with_rng(
        mut game: Game,
        hub: Arc<ConnectionHub>,
        bracket: Arc<dyn BracketProvider>,
        mut rng: StdRng,
    ) -> Result<Self, ServiceError> {
        if game.phase() == AuctionPhase::AwaitingStart {
            game.open_first_lot(&mut rng)?;
        }

        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let game_id = game.id().to_string();
        let engine = AuctionEngine {
            game,
            hub,
            bracket,
            rng,
            mailbox: tx.downgrade(),
            countdown: None,
            generation: 0,
        };

        let span = info_span!("auction", game_id = %game_id);
        tokio::spawn(engine.run(rx).instrument(span));

        Ok(Self { game_id, tx })
    }

    /// Identifier of the game this handle drives.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Add a player at the starting balance.
    pub async fn join(&self, player: String) -> Result<(), ServiceError> {
        self.request(|reply| Command::Join { player, reply }).await?
    }

    /// Rebroadcast the roster and return a summary of the game.
    pub async fn view(&self) -> Result<GameSummary, ServiceError> {
        self.request(|reply| Command::View { reply }).await
    }

    /// Bid on the open lot.
    pub async fn place_bid(
        &self,
        player: String,
        amount: u32,
        team: String,
    ) -> Result<(), ServiceError> {
        let bid = BidRecord {
            game_id: self.game_id.clone(),
            player,
            amount,
            team,
        };
        self.request(|reply| Command::Bid { bid, reply }).await?
    }

    /// Start the game on behalf of whoever holds the creator token.
    pub async fn start(&self, token: String) -> Result<(), ServiceError> {
        self.request(|reply| Command::Start { token, reply }).await?
    }

    /// Close the open lot immediately.
    pub async fn finalize(&self) -> Result<(), ServiceError> {
        self.request(|reply| Command::Finalize { reply }).await?
    }

    /// Score the game against the current match results.
    pub async fn scores(&self) -> Result<Vec<ScoreSummary>, ServiceError> {
        self.request(|reply| Command::Scores { reply }).await
    }

    /// Send the full snapshot to `connection`, then register it for events.
    pub async fn subscribe(&self, connection: HubConnection) -> Result<(), ServiceError> {
        self.request(|reply| Command::Subscribe { connection, reply })
            .await
    }

    /// Copy of the engine's game state.
    pub async fn state(&self) -> Result<Game, ServiceError> {
        self.request(|reply| Command::State { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| ServiceError::EngineUnavailable(self.game_id.clone()))?;
        response
            .await
            .map_err(|_| ServiceError::EngineUnavailable(self.game_id.clone()))
    }
}

struct AuctionEngine {
    game: Game,
    hub: Arc<ConnectionHub>,
    bracket: Arc<dyn BracketProvider>,
    rng: StdRng,
    mailbox: mpsc::WeakSender<Command>,
    countdown: Option<Countdown>,
    generation: u64,
}

impl AuctionEngine {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!("auction engine started");
        while let Some(command) = rx.recv().await {
            self.handle(command).await;
        }
        self.stop_countdown().await;
        info!("auction engine stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Join { player, reply } => {
                let _ = reply.send(self.join(player));
            }
            Command::View { reply } => {
                auction_events::broadcast_players(&self.hub, &self.game);
                let _ = reply.send(GameSummary::from(&self.game));
            }
            Command::Bid { bid, reply } => {
                let result = self.place_bid(bid).await;
                let _ = reply.send(result);
            }
            Command::Start { token, reply } => {
                let _ = reply.send(self.start(&token));
            }
            Command::Finalize { reply } => {
                let result = self.finalize().await;
                let _ = reply.send(result);
            }
            Command::Scores { reply } => {
                let _ = reply.send(self.scores());
            }
            Command::Subscribe { connection, reply } => {
                self.subscribe(connection);
                let _ = reply.send(());
            }
            Command::State { reply } => {
                let _ = reply.send(self.game.clone());
            }
            Command::Tick { generation } => self.tick(generation).await,
        }
    }

    fn join(&mut self, player: String) -> Result<(), ServiceError> {
        self.game.add_player(&player)?;
        info!(player = %player, "player joined");
        auction_events::broadcast_players(&self.hub, &self.game);
        Ok(())
    }

    async fn place_bid(&mut self, bid: BidRecord) -> Result<(), ServiceError> {
        let (player, amount) = (bid.player.clone(), bid.amount);
        if let Err(err) = self.game.place_bid(bid) {
            debug!(player = %player, amount, error = %err, "bid rejected");
            return Err(err);
        }

        self.restart_countdown().await;
        info!(player = %player, amount, "bid accepted");

        auction_events::broadcast_bid(&self.hub, &self.game);
        auction_events::broadcast_countdown(&self.hub, &self.game);
        auction_events::broadcast_log(&self.hub, &self.game);
        Ok(())
    }

    fn start(&mut self, token: &str) -> Result<(), ServiceError> {
        if self.game.start(token)? {
            info!("game started");
            auction_events::broadcast_signal(&self.hub, self.game.id(), SignalKind::GameStarted);
        }
        Ok(())
    }

    async fn tick(&mut self, generation: u64) {
        let current = self.countdown.as_ref().map(Countdown::generation);
        if current != Some(generation) {
            debug!(generation, ?current, "ignoring stale countdown tick");
            return;
        }

        if self.game.phase() != AuctionPhase::LotOpenTimed {
            self.stop_countdown().await;
            return;
        }

        let remaining = self.game.tick();
        auction_events::broadcast_countdown(&self.hub, &self.game);

        if remaining == 0 {
            if let Err(err) = self.finalize().await {
                warn!(error = %err, "failed to finalize lot after countdown");
            }
        }
    }

    async fn finalize(&mut self) -> Result<(), ServiceError> {
        self.stop_countdown().await;
        let outcome = self.game.finalize(&mut self.rng)?;

        match &outcome.winner {
            Some(bid) => info!(
                lot = %outcome.lot.name(),
                player = %bid.player,
                amount = bid.amount,
                "lot sold"
            ),
            None => info!(lot = %outcome.lot.name(), "lot closed without bids"),
        }

        auction_events::broadcast_lot_refresh(&self.hub, &self.game);

        if self.game.phase() == AuctionPhase::PoolExhausted {
            info!("team pool exhausted");
            auction_events::broadcast_signal(&self.hub, self.game.id(), SignalKind::PoolExhausted);
            let scores = self.scores();
            auction_events::broadcast_scores(&self.hub, self.game.id(), scores);
        }
        Ok(())
    }

    fn scores(&mut self) -> Vec<ScoreSummary> {
        let results = self.bracket.match_results();
        compute_scores(&mut self.game, &results)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    fn subscribe(&mut self, connection: HubConnection) {
        let snapshot = GameSnapshot::capture(&self.game, &self.bracket.match_results());
        if send_to(&connection.tx, &OutboundMessage::Snapshot(snapshot)) {
            self.hub.register(self.game.id(), connection);
        } else {
            debug!(connection_id = %connection.id, "subscriber left before the snapshot");
        }
    }

    async fn restart_countdown(&mut self) {
        self.stop_countdown().await;
        self.generation += 1;
        self.countdown = Some(Countdown::start(
            self.generation,
            self.game.settings().tick_interval(),
            self.mailbox.clone(),
            |generation| Command::Tick { generation },
        ));
    }

    async fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel().await;
        }
    }
}
