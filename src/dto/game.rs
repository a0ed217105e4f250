use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        validation::{validate_lot_name, validate_player_name},
    },
    services::scoring::{PlayerScore, TeamPoints},
    state::{
        allocator::Lot,
        game::{BidRecord, Game, MatchResult, Player, PurchasedTeam, Team},
        phase::AuctionPhase,
    },
};

/// Payload used to open a new game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    /// Name of the creating player.
    pub player: String,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_player_name(&self.player) {
            errors.add("player", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to join an existing game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinGameRequest {
    /// Name the player wants to use, unique within the game.
    pub player: String,
}

impl Validate for JoinGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_player_name(&self.player) {
            errors.add("player", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to bid on the open lot.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BidRequest {
    /// Bidding player.
    pub player: String,
    /// Offered amount.
    pub bid: u32,
    /// Name of the lot being bid on.
    pub team: String,
}

impl Validate for BidRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_player_name(&self.player) {
            errors.add("player", e);
        }
        if let Err(e) = validate_lot_name(&self.team) {
            errors.add("team", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Returned once a game has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateGameResponse {
    /// Identifier other players use to join.
    pub id: String,
    /// Secret that lets the creator start the game over the WebSocket.
    pub creator_token: String,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct DetailResponse {
    /// Human readable outcome.
    pub detail: String,
}

impl DetailResponse {
    /// Build a response carrying `detail`.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Response of the view endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewGameResponse {
    pub detail: String,
    pub game: GameSummary,
}

/// Current standings of a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoresResponse {
    pub scores: Vec<ScoreSummary>,
}

/// Public projection of a team.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamSummary {
    pub short_name: String,
    pub url_name: String,
    pub seed: u8,
    pub region: String,
}

/// Lot currently up for bidding.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct LotSummary {
    /// Name to quote when bidding.
    pub name: String,
    /// Seed shared by the bundled teams, for bundle lots.
    pub bundle_seed: Option<u8>,
    pub teams: Vec<TeamSummary>,
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct BidSummary {
    pub game_id: String,
    pub player: String,
    pub amount: u32,
    pub team: String,
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub team: TeamSummary,
    pub purchase_price: u32,
    pub points: u32,
    pub lot: String,
}

/// Public projection of a player.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PlayerSummary {
    pub name: String,
    pub balance: u32,
    pub points: u32,
    pub purchased_teams: Vec<PurchaseSummary>,
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct MatchResultSummary {
    pub id: String,
    pub round_name: String,
    pub participants: Vec<TeamSummary>,
    pub winner: Option<String>,
    pub start_date: String,
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamPointsSummary {
    pub team: String,
    pub lot: String,
    pub purchase_price: u32,
    pub points: u32,
}

/// Scoreboard line.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ScoreSummary {
    pub player: String,
    pub total: u32,
    pub teams: Vec<TeamPointsSummary>,
}

/// Summary of a game's auction state.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: String,
    pub creator: String,
    pub created_at: String,
    pub phase: AuctionPhase,
    pub started: bool,
    pub current_lot: Option<LotSummary>,
    pub current_bid: u32,
    pub countdown: u32,
    pub players: Vec<PlayerSummary>,
    /// Number of teams still waiting in the pool.
    pub remaining: usize,
}

/// Full state sent to a stream subscriber when it connects.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct GameSnapshot {
    pub players: Vec<PlayerSummary>,
    pub bid: u32,
    pub team: Option<LotSummary>,
    pub remaining: Vec<TeamSummary>,
    #[serde(rename = "allTeams")]
    pub all_teams: Vec<TeamSummary>,
    #[serde(rename = "matchResults")]
    pub match_results: Vec<MatchResultSummary>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            short_name: team.short_name.clone(),
            url_name: team.url_name.clone(),
            seed: team.seed,
            region: team.region.clone(),
        }
    }
}

impl From<&Lot> for LotSummary {
    fn from(lot: &Lot) -> Self {
        let bundle_seed = match lot {
            Lot::Single(_) => None,
            Lot::Bundle { seed, .. } => Some(*seed),
        };
        Self {
            name: lot.name(),
            bundle_seed,
            teams: lot.teams().iter().map(Into::into).collect(),
        }
    }
}

impl From<&BidRecord> for BidSummary {
    fn from(bid: &BidRecord) -> Self {
        Self {
            game_id: bid.game_id.clone(),
            player: bid.player.clone(),
            amount: bid.amount,
            team: bid.team.clone(),
        }
    }
}

impl From<&PurchasedTeam> for PurchaseSummary {
    fn from(entry: &PurchasedTeam) -> Self {
        Self {
            team: (&entry.team).into(),
            purchase_price: entry.purchase_price,
            points: entry.points,
            lot: entry.lot.clone(),
        }
    }
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            balance: player.balance,
            points: player.total_points(),
            purchased_teams: player.purchased_teams.values().map(Into::into).collect(),
        }
    }
}

impl From<&MatchResult> for MatchResultSummary {
    fn from(result: &MatchResult) -> Self {
        Self {
            id: result.id.clone(),
            round_name: result.round_name.clone(),
            participants: result.participants.iter().map(Into::into).collect(),
            winner: result.winner.clone(),
            start_date: result.start_date.clone(),
        }
    }
}

impl From<TeamPoints> for TeamPointsSummary {
    fn from(value: TeamPoints) -> Self {
        Self {
            team: value.team,
            lot: value.lot,
            purchase_price: value.purchase_price,
            points: value.points,
        }
    }
}

impl From<PlayerScore> for ScoreSummary {
    fn from(value: PlayerScore) -> Self {
        Self {
            player: value.player,
            total: value.total,
            teams: value.teams.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id().to_string(),
            creator: game.creator().to_string(),
            created_at: format_system_time(game.created_at()),
            phase: game.phase(),
            started: game.is_started(),
            current_lot: game.current_lot().map(Into::into),
            current_bid: game.current_bid(),
            countdown: game.countdown(),
            players: player_summaries(game),
            remaining: game.remaining_teams().len(),
        }
    }
}

impl GameSnapshot {
    /// Capture the full state of `game` together with the known match results.
    pub fn capture(game: &Game, results: &[MatchResult]) -> Self {
        Self {
            players: player_summaries(game),
            bid: game.current_bid(),
            team: game.current_lot().map(Into::into),
            remaining: team_summaries(game.remaining_teams()),
            all_teams: team_summaries(game.master_teams()),
            match_results: results.iter().map(Into::into).collect(),
        }
    }
}

/// Roster in join order.
pub fn player_summaries(game: &Game) -> Vec<PlayerSummary> {
    game.players().values().map(Into::into).collect()
}

pub fn team_summaries(teams: &[Team]) -> Vec<TeamSummary> {
    teams.iter().map(Into::into).collect()
}
