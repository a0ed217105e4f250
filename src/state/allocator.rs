//! Team pool ownership and lot drawing for a single game.

use rand::Rng;

use crate::state::game::Team;

/// Seeds whose teams are never auctioned alone but as one bundle per seed line.
pub const BUNDLED_SEEDS: [u8; 2] = [15, 16];

/// Unit put up for bidding: one team, or every team sharing a bundled seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lot {
    /// A single team auctioned on its own.
    Single(Team),
    /// All teams with the given seed, sold together.
    Bundle {
        /// Seed shared by every team in the bundle.
        seed: u8,
        /// Constituent teams, in pool order.
        teams: Vec<Team>,
    },
}

impl Lot {
    /// Name bidders must quote when bidding on this lot.
    pub fn name(&self) -> String {
        match self {
            Lot::Single(team) => team.short_name.clone(),
            Lot::Bundle { seed, .. } => format!("{seed} seeds"),
        }
    }

    /// Every team covered by the lot.
    pub fn teams(&self) -> &[Team] {
        match self {
            Lot::Single(team) => std::slice::from_ref(team),
            Lot::Bundle { teams, .. } => teams,
        }
    }
}

/// Unsold teams of one game.
#[derive(Debug, Clone, Default)]
pub struct TeamPool {
    teams: Vec<Team>,
}

impl TeamPool {
    /// Build a pool from the full team list.
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    /// Teams still waiting to be drawn.
    pub fn remaining(&self) -> &[Team] {
        &self.teams
    }

    /// Number of teams left in the pool.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether every team has been drawn.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Draw the next lot uniformly at random, or `None` once the pool is empty.
    ///
    /// Drawing a team with a bundled seed yields a [`Lot::Bundle`] holding every team of
    /// that seed, removed from the pool in one step.
    pub fn draw_lot<R: Rng>(&mut self, rng: &mut R) -> Option<Lot> {
        if self.teams.is_empty() {
            return None;
        }

        let index = rng.random_range(0..self.teams.len());
        let seed = self.teams[index].seed;

        if BUNDLED_SEEDS.contains(&seed) {
            let teams = self.take_seed(seed);
            return Some(Lot::Bundle { seed, teams });
        }

        Some(Lot::Single(self.teams.remove(index)))
    }

    /// Put teams back into the pool, keeping it ordered by seed.
    pub fn restore(&mut self, teams: &[Team]) {
        self.teams.extend_from_slice(teams);
        self.teams.sort_by_key(|team| team.seed);
    }

    /// Remove and return every team with `seed`.
    fn take_seed(&mut self, seed: u8) -> Vec<Team> {
        let (bundle, rest): (Vec<Team>, Vec<Team>) = std::mem::take(&mut self.teams)
            .into_iter()
            .partition(|team| team.seed == seed);
        self.teams = rest;
        bundle
    }
}
