//! Scoring of purchased teams against tournament results.

use std::{cmp::Ordering, collections::HashMap};

use crate::state::game::{Game, MatchResult};

/// Points earned by one purchased team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPoints {
    /// Short name of the team.
    pub team: String,
    /// Lot the team was bought in.
    pub lot: String,
    /// Price paid for the lot.
    pub purchase_price: u32,
    /// Match wins credited to the team.
    pub points: u32,
}

/// Scoreboard line for a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerScore {
    /// Player name.
    pub player: String,
    /// Sum of points over every purchased team.
    pub total: u32,
    /// Per-team breakdown, in purchase order.
    pub teams: Vec<TeamPoints>,
}

/// Credit one point per recorded win to every purchase of the winning team.
///
/// Points are rebuilt from zero on each call so repeated scoring with the same
/// results yields the same totals. Unplayed matches (no winner) are ignored.
/// The returned scoreboard is sorted by total, highest first, then by name.
pub fn compute_scores(game: &mut Game, results: &[MatchResult]) -> Vec<PlayerScore> {
    let mut wins: HashMap<&str, u32> = HashMap::new();
    for winner in results.iter().filter_map(|result| result.winner.as_deref()) {
        *wins.entry(winner).or_default() += 1;
    }

    let mut scores: Vec<PlayerScore> = game
        .players_mut()
        .map(|player| {
            let teams = player
                .purchased_teams
                .values_mut()
                .map(|entry| {
                    entry.points = wins
                        .get(entry.team.short_name.as_str())
                        .copied()
                        .unwrap_or(0);
                    TeamPoints {
                        team: entry.team.short_name.clone(),
                        lot: entry.lot.clone(),
                        purchase_price: entry.purchase_price,
                        points: entry.points,
                    }
                })
                .collect::<Vec<_>>();

            PlayerScore {
                player: player.name.clone(),
                total: teams.iter().map(|team| team.points).sum(),
                teams,
            }
        })
        .collect();

    scores.sort_by(|a, b| match b.total.cmp(&a.total) {
        Ordering::Equal => a.player.cmp(&b.player),
        other => other,
    });
    scores
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AuctionSettings,
        dao::bracket::generated_field,
        state::game::{BidRecord, Team},
    };

    fn result(id: &str, home: &Team, away: &Team, winner: Option<&Team>) -> MatchResult {
        MatchResult {
            id: id.into(),
            round_name: "First Round".into(),
            participants: [home.clone(), away.clone()],
            winner: winner.map(|team| team.short_name.clone()),
            start_date: String::new(),
        }
    }

    /// Sell the open lot to `player` for 1 and return its teams.
    fn sell(game: &mut Game, rng: &mut StdRng, player: &str) -> Vec<Team> {
        let lot = game.current_lot().unwrap().clone();
        game.place_bid(BidRecord {
            game_id: game.id().to_string(),
            player: player.into(),
            amount: 1,
            team: lot.name(),
        })
        .unwrap();
        game.finalize(rng).unwrap();
        lot.teams().to_vec()
    }

    fn game_with_purchases() -> (Game, Vec<Team>, Vec<Team>) {
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = Game::new(
            "SCORE1".into(),
            "Alice".into(),
            "token".into(),
            generated_field(),
            AuctionSettings::default(),
        );
        game.open_first_lot(&mut rng).unwrap();
        game.add_player("Bob").unwrap();
        game.add_player("Carol").unwrap();

        let alice = sell(&mut game, &mut rng, "Alice");
        let bob = sell(&mut game, &mut rng, "Bob");
        (game, alice, bob)
    }

    #[test]
    fn wins_are_credited_to_owners() {
        let (mut game, alice, bob) = game_with_purchases();
        let results = vec![
            result("m1", &alice[0], &bob[0], Some(&alice[0])),
            result("m2", &alice[0], &bob[0], Some(&alice[0])),
            result("m3", &bob[0], &alice[0], Some(&bob[0])),
            result("m4", &bob[0], &alice[0], None),
        ];

        let scores = compute_scores(&mut game, &results);

        assert_eq!(scores[0].player, "Alice");
        assert_eq!(scores[0].total, 2);
        assert_eq!(scores[1].player, "Bob");
        assert_eq!(scores[1].total, 1);
        assert_eq!(scores[2].player, "Carol");
        assert_eq!(scores[2].total, 0);
        assert_eq!(
            game.players()["Alice"].purchased_teams[&alice[0].short_name].points,
            2
        );
    }

    #[test]
    fn scoring_twice_does_not_double_count() {
        let (mut game, alice, bob) = game_with_purchases();
        let results = vec![result("m1", &alice[0], &bob[0], Some(&alice[0]))];

        let first = compute_scores(&mut game, &results);
        let second = compute_scores(&mut game, &results);

        assert_eq!(first, second);
        assert_eq!(game.players()["Alice"].total_points(), 1);
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let (mut game, _, _) = game_with_purchases();
        let scores = compute_scores(&mut game, &[]);
        let names: Vec<_> = scores.iter().map(|score| score.player.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }
}
