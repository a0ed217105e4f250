use std::time::SystemTime;

use indexmap::IndexMap;
use rand::Rng;

use crate::{
    config::AuctionSettings,
    error::ServiceError,
    state::{
        allocator::{Lot, TeamPool},
        phase::{AuctionEvent, AuctionPhase},
    },
};

/// Tournament team as supplied by the bracket provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Display name, unique within a tournament.
    pub short_name: String,
    /// Slug used by the bracket source for links and logos.
    pub url_name: String,
    /// Tournament seed (1..=16).
    pub seed: u8,
    /// Bracket region the team plays in.
    pub region: String,
}

/// Outcome of a single tournament game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Identifier of the match in the bracket source.
    pub id: String,
    /// Round label (e.g. "First Round").
    pub round_name: String,
    /// The two teams playing.
    pub participants: [Team; 2],
    /// Short name of the winner, absent until the game is played.
    pub winner: Option<String>,
    /// Scheduled start, as reported by the bracket source.
    pub start_date: String,
}

/// One accepted bid on the currently open lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRecord {
    /// Game the bid was placed in.
    pub game_id: String,
    /// Name of the bidding player.
    pub player: String,
    /// Bid amount in whole currency units.
    pub amount: u32,
    /// Lot name quoted by the bidder.
    pub team: String,
}

/// A team owned by a player after winning its lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasedTeam {
    /// The purchased team.
    pub team: Team,
    /// Price paid for the lot containing the team.
    pub purchase_price: u32,
    /// Match wins credited by the last scoring pass.
    pub points: u32,
    /// Name of the lot the team was sold in.
    pub lot: String,
}

/// Participant of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Display name, unique within the game.
    pub name: String,
    /// Game the player belongs to.
    pub game_id: String,
    /// Remaining budget.
    pub balance: u32,
    /// Purchased teams keyed by short name, in purchase order.
    pub purchased_teams: IndexMap<String, PurchasedTeam>,
}

impl Player {
    fn new(name: String, game_id: String, balance: u32) -> Self {
        Self {
            name,
            game_id,
            balance,
            purchased_teams: IndexMap::new(),
        }
    }

    /// Sum of points over every purchased team.
    pub fn total_points(&self) -> u32 {
        self.purchased_teams.values().map(|entry| entry.points).sum()
    }

    fn record_purchase(&mut self, lot: &Lot, price: u32) {
        let lot_name = lot.name();
        for team in lot.teams() {
            self.purchased_teams.insert(
                team.short_name.clone(),
                PurchasedTeam {
                    team: team.clone(),
                    purchase_price: price,
                    points: 0,
                    lot: lot_name.clone(),
                },
            );
        }
    }
}

/// Result of closing a lot.
#[derive(Debug, Clone)]
pub struct LotOutcome {
    /// The lot that was closed.
    pub lot: Lot,
    /// Winning bid, if anybody bid.
    pub winner: Option<BidRecord>,
}

/// Complete auction state for one game. Owned by that game's engine task.
#[derive(Debug, Clone)]
pub struct Game {
    id: String,
    creator: String,
    creator_token: String,
    created_at: SystemTime,
    players: IndexMap<String, Player>,
    phase: AuctionPhase,
    current_lot: Option<Lot>,
    current_bid: u32,
    countdown: u32,
    bid_log: Vec<BidRecord>,
    pool: TeamPool,
    master_teams: Vec<Team>,
    started: bool,
    settings: AuctionSettings,
}

impl Game {
    /// Build a game with the creator as first player and the full team list in the pool.
    ///
    /// Teams are kept sorted by seed; no lot is open until [`Game::open_first_lot`].
    pub fn new(
        id: String,
        creator: String,
        creator_token: String,
        mut teams: Vec<Team>,
        settings: AuctionSettings,
    ) -> Self {
        teams.sort_by_key(|team| team.seed);

        let mut players = IndexMap::new();
        players.insert(
            creator.clone(),
            Player::new(creator.clone(), id.clone(), settings.starting_balance),
        );

        Self {
            id,
            creator,
            creator_token,
            created_at: SystemTime::now(),
            players,
            phase: AuctionPhase::AwaitingStart,
            current_lot: None,
            current_bid: 0,
            countdown: settings.countdown_seconds,
            bid_log: Vec::new(),
            pool: TeamPool::new(teams.clone()),
            master_teams: teams,
            started: false,
            settings,
        }
    }

    /// Game identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the player who created the game.
    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Players in join order.
    pub fn players(&self) -> &IndexMap<String, Player> {
        &self.players
    }

    /// Mutable access used by the scoring pass.
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Current auction phase.
    pub fn phase(&self) -> AuctionPhase {
        self.phase
    }

    /// Lot open for bidding, if any.
    pub fn current_lot(&self) -> Option<&Lot> {
        self.current_lot.as_ref()
    }

    /// Highest accepted bid on the open lot.
    pub fn current_bid(&self) -> u32 {
        self.current_bid
    }

    /// Seconds left before the open lot is finalized.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Bids on the open lot, oldest first.
    pub fn bid_log(&self) -> &[BidRecord] {
        &self.bid_log
    }

    /// Teams not yet drawn.
    pub fn remaining_teams(&self) -> &[Team] {
        self.pool.remaining()
    }

    /// Every team of the tournament, sorted by seed.
    pub fn master_teams(&self) -> &[Team] {
        &self.master_teams
    }

    /// Whether the creator has started the game.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Tuning the game was created with.
    pub fn settings(&self) -> AuctionSettings {
        self.settings
    }

    /// Draw the first lot of a freshly created game.
    pub fn open_first_lot<R: Rng>(&mut self, rng: &mut R) -> Result<(), ServiceError> {
        self.draw_next(rng)
    }

    /// Register a new player at the starting balance.
    pub fn add_player(&mut self, name: &str) -> Result<(), ServiceError> {
        if self.players.contains_key(name) {
            return Err(ServiceError::PlayerNameTaken(name.to_string()));
        }

        self.players.insert(
            name.to_string(),
            Player::new(
                name.to_string(),
                self.id.clone(),
                self.settings.starting_balance,
            ),
        );
        Ok(())
    }

    /// Mark the game as started if `token` identifies the creator.
    ///
    /// Returns `true` only for the first successful start.
    pub fn start(&mut self, token: &str) -> Result<bool, ServiceError> {
        if token != self.creator_token {
            return Err(ServiceError::Unauthorized(
                "only the game creator can start the game".into(),
            ));
        }

        let first = !self.started;
        self.started = true;
        Ok(first)
    }

    /// Accept a bid on the open lot and reset the countdown.
    ///
    /// Bids must name the open lot, come from a known player, beat the current bid and
    /// fit within the bidder's balance. Rejected bids leave the game untouched.
    pub fn place_bid(&mut self, bid: BidRecord) -> Result<(), ServiceError> {
        let next = self.phase.next(AuctionEvent::BidPlaced)?;

        let Some(lot) = self.current_lot.as_ref() else {
            return Err(ServiceError::InvalidState("no lot is open".into()));
        };

        let lot_name = lot.name();
        if bid.team != lot_name {
            return Err(ServiceError::BidRejected(format!(
                "`{}` is not the open lot (bidding is on `{lot_name}`)",
                bid.team
            )));
        }

        let player = self
            .players
            .get(&bid.player)
            .ok_or_else(|| ServiceError::UnknownPlayer(bid.player.clone()))?;

        if bid.amount <= self.current_bid {
            return Err(ServiceError::BidRejected(format!(
                "bid of {} does not beat the current bid of {}",
                bid.amount, self.current_bid
            )));
        }

        if bid.amount > player.balance {
            return Err(ServiceError::BidRejected(format!(
                "bid of {} exceeds the balance of {}",
                bid.amount, player.balance
            )));
        }

        self.current_bid = bid.amount;
        self.countdown = self.settings.countdown_seconds;
        self.bid_log.push(bid);
        self.phase = next;
        Ok(())
    }

    /// Decrement the countdown by one second, returning the new value.
    pub fn tick(&mut self) -> u32 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    /// Close the open lot, settle it with the last bidder and draw the next lot.
    ///
    /// A lot closed without bids is not discarded: its teams go back to the
    /// pool after the next draw, so a team can be drawn more than once. When
    /// that lot was the last one it is reopened, which means an auction only
    /// reaches [`AuctionPhase::PoolExhausted`] once every team has been sold.
    pub fn finalize<R: Rng>(&mut self, rng: &mut R) -> Result<LotOutcome, ServiceError> {
        let next = self.phase.next(AuctionEvent::Finalize)?;
        let Some(lot) = self.current_lot.take() else {
            return Err(ServiceError::InvalidState("no lot is open".into()));
        };
        self.phase = next;

        let winner = self.bid_log.last().cloned();
        let mut unsold = None;
        match &winner {
            Some(bid) => {
                if let Some(player) = self.players.get_mut(&bid.player) {
                    player.balance = player.balance.saturating_sub(bid.amount);
                    player.record_purchase(&lot, bid.amount);
                }
            }
            // Unsold lots go back to the pool once the next lot is out, so the
            // auction still advances. A lone leftover lot is simply reopened.
            None if self.pool.is_empty() => self.pool.restore(lot.teams()),
            None => unsold = Some(lot.clone()),
        }

        self.bid_log.clear();
        self.current_bid = 0;
        self.countdown = self.settings.countdown_seconds;
        self.draw_next(rng)?;
        if let Some(unsold) = unsold {
            self.pool.restore(unsold.teams());
        }

        debug_assert!(self.is_team_conserved());
        Ok(LotOutcome { lot, winner })
    }

    /// Check that pool, open lot and purchases together cover the master list exactly once.
    pub fn is_team_conserved(&self) -> bool {
        let mut accounted: Vec<&str> = self
            .pool
            .remaining()
            .iter()
            .chain(self.current_lot.iter().flat_map(|lot| lot.teams()))
            .map(|team| team.short_name.as_str())
            .chain(
                self.players
                    .values()
                    .flat_map(|player| player.purchased_teams.keys().map(String::as_str)),
            )
            .collect();
        let mut expected: Vec<&str> = self
            .master_teams
            .iter()
            .map(|team| team.short_name.as_str())
            .collect();

        accounted.sort_unstable();
        expected.sort_unstable();
        accounted == expected
    }

    fn draw_next<R: Rng>(&mut self, rng: &mut R) -> Result<(), ServiceError> {
        match self.pool.draw_lot(rng) {
            Some(lot) => {
                self.phase = self.phase.next(AuctionEvent::LotDrawn)?;
                self.current_lot = Some(lot);
            }
            None => {
                self.phase = self.phase.next(AuctionEvent::PoolEmpty)?;
                self.current_lot = None;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::dao::bracket::generated_field;

    const TOKEN: &str = "creator-token";

    fn new_game(rng: &mut StdRng) -> Game {
        let mut game = Game::new(
            "AB12CD".into(),
            "Alice".into(),
            TOKEN.into(),
            generated_field(),
            AuctionSettings::default(),
        );
        game.open_first_lot(rng).unwrap();
        game
    }

    fn bid(game: &Game, player: &str, amount: u32) -> BidRecord {
        BidRecord {
            game_id: game.id().to_string(),
            player: player.to_string(),
            amount,
            team: game.current_lot().unwrap().name(),
        }
    }

    #[test]
    fn new_game_opens_first_lot_with_defaults() {
        let mut rng = StdRng::seed_from_u64(1);
        let game = new_game(&mut rng);

        assert_eq!(game.phase(), AuctionPhase::LotOpenIdle);
        assert!(game.current_lot().is_some());
        assert_eq!(game.current_bid(), 0);
        assert_eq!(game.countdown(), 10);
        assert_eq!(game.players().len(), 1);
        assert_eq!(game.players()["Alice"].balance, 100);
        assert!(game.is_team_conserved());
    }

    #[test]
    fn master_list_is_sorted_by_seed() {
        let mut rng = StdRng::seed_from_u64(2);
        let game = new_game(&mut rng);
        let seeds: Vec<u8> = game.master_teams().iter().map(|team| team.seed).collect();
        let mut sorted = seeds.clone();
        sorted.sort();
        assert_eq!(seeds, sorted);
    }

    #[test]
    fn duplicate_player_name_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = new_game(&mut rng);

        game.add_player("Bob").unwrap();
        let err = game.add_player("Alice").unwrap_err();
        assert!(matches!(err, ServiceError::PlayerNameTaken(name) if name == "Alice"));
        assert_eq!(
            game.players().keys().collect::<Vec<_>>(),
            vec!["Alice", "Bob"]
        );

        game.add_player("alice").unwrap();
        assert_eq!(game.players().len(), 3);
    }

    #[test]
    fn bid_resets_countdown_and_starts_timing() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut game = new_game(&mut rng);
        game.add_player("Bob").unwrap();

        game.tick();
        game.tick();
        game.place_bid(bid(&game, "Bob", 5)).unwrap();

        assert_eq!(game.current_bid(), 5);
        assert_eq!(game.countdown(), 10);
        assert_eq!(game.phase(), AuctionPhase::LotOpenTimed);
        assert_eq!(game.bid_log().len(), 1);
    }

    #[test]
    fn rejected_bids_leave_state_untouched() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = new_game(&mut rng);
        game.add_player("Bob").unwrap();
        game.place_bid(bid(&game, "Bob", 10)).unwrap();

        let low = bid(&game, "Alice", 10);
        assert!(matches!(
            game.place_bid(low),
            Err(ServiceError::BidRejected(_))
        ));

        let broke = bid(&game, "Alice", 101);
        assert!(matches!(
            game.place_bid(broke),
            Err(ServiceError::BidRejected(_))
        ));

        let mut wrong_team = bid(&game, "Alice", 20);
        wrong_team.team = "Nobody State".into();
        assert!(matches!(
            game.place_bid(wrong_team),
            Err(ServiceError::BidRejected(_))
        ));

        let stranger = bid(&game, "Mallory", 20);
        assert!(matches!(
            game.place_bid(stranger),
            Err(ServiceError::UnknownPlayer(_))
        ));

        assert_eq!(game.current_bid(), 10);
        assert_eq!(game.bid_log().len(), 1);
    }

    #[test]
    fn finalize_debits_last_bidder_and_records_lot() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut game = new_game(&mut rng);
        game.add_player("Bob").unwrap();

        game.place_bid(bid(&game, "Alice", 3)).unwrap();
        game.place_bid(bid(&game, "Bob", 5)).unwrap();
        let sold = game.current_lot().unwrap().clone();

        let outcome = game.finalize(&mut rng).unwrap();

        assert_eq!(outcome.lot, sold);
        assert_eq!(outcome.winner.unwrap().player, "Bob");
        let bob = &game.players()["Bob"];
        assert_eq!(bob.balance, 95);
        for team in sold.teams() {
            let entry = &bob.purchased_teams[&team.short_name];
            assert_eq!(entry.purchase_price, 5);
            assert_eq!(entry.lot, sold.name());
        }
        assert_eq!(game.players()["Alice"].balance, 100);
        assert!(game.bid_log().is_empty());
        assert_eq!(game.current_bid(), 0);
        assert_eq!(game.countdown(), 10);
        assert_eq!(game.phase(), AuctionPhase::LotOpenIdle);
        assert!(game.is_team_conserved());
    }

    #[test]
    fn empty_finalize_advances_without_purchase() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = new_game(&mut rng);
        game.add_player("Bob").unwrap();

        let outcome = game.finalize(&mut rng).unwrap();

        assert!(outcome.winner.is_none());
        assert!(
            game.players()
                .values()
                .all(|player| player.balance == 100 && player.purchased_teams.is_empty())
        );
        assert_ne!(game.current_lot(), Some(&outcome.lot));
        assert_eq!(game.phase(), AuctionPhase::LotOpenIdle);
        assert!(game.is_team_conserved());
    }

    #[test]
    fn unsold_last_lot_is_reopened() {
        let mut rng = StdRng::seed_from_u64(8);
        let team = generated_field().remove(0);
        let mut game = Game::new(
            "ONE111".into(),
            "Alice".into(),
            TOKEN.into(),
            vec![team.clone()],
            AuctionSettings::default(),
        );
        game.open_first_lot(&mut rng).unwrap();

        game.finalize(&mut rng).unwrap();

        assert_eq!(game.current_lot(), Some(&Lot::Single(team)));
        assert_eq!(game.phase(), AuctionPhase::LotOpenIdle);
        assert!(game.remaining_teams().is_empty());
        assert!(game.is_team_conserved());
    }

    #[test]
    fn full_auction_conserves_teams_and_exhausts_pool() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Game::new(
            "ZZ99ZZ".into(),
            "Alice".into(),
            TOKEN.into(),
            generated_field(),
            AuctionSettings {
                starting_balance: 10_000,
                ..AuctionSettings::default()
            },
        );
        game.open_first_lot(&mut rng).unwrap();
        game.add_player("Bob").unwrap();

        let mut round = 0;
        while game.phase() != AuctionPhase::PoolExhausted {
            let bidder = if round % 2 == 0 { "Alice" } else { "Bob" };
            game.place_bid(bid(&game, bidder, 1 + round % 7)).unwrap();
            game.finalize(&mut rng).unwrap();
            assert!(game.is_team_conserved());
            round += 1;
        }

        assert!(game.current_lot().is_none());
        assert!(game.remaining_teams().is_empty());
        let owned: usize = game
            .players()
            .values()
            .map(|player| player.purchased_teams.len())
            .sum();
        assert_eq!(owned, game.master_teams().len());
    }

    #[test]
    fn exhausted_game_rejects_bids_and_finalize() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut game = Game::new(
            "EMPTY1".into(),
            "Alice".into(),
            TOKEN.into(),
            Vec::new(),
            AuctionSettings::default(),
        );
        game.open_first_lot(&mut rng).unwrap();

        assert_eq!(game.phase(), AuctionPhase::PoolExhausted);
        assert!(matches!(
            game.finalize(&mut rng),
            Err(ServiceError::InvalidState(_))
        ));
        let attempt = BidRecord {
            game_id: "EMPTY1".into(),
            player: "Alice".into(),
            amount: 1,
            team: "anything".into(),
        };
        assert!(matches!(
            game.place_bid(attempt),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn only_creator_token_starts_game() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut game = new_game(&mut rng);

        assert!(matches!(
            game.start("guess"),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(!game.is_started());
        assert!(game.start(TOKEN).unwrap());
        assert!(!game.start(TOKEN).unwrap());
        assert!(game.is_started());
    }

    #[test]
    fn countdown_saturates_at_zero() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut game = new_game(&mut rng);
        for _ in 0..15 {
            game.tick();
        }
        assert_eq!(game.countdown(), 0);
    }
}
