//! Process-wide index of running games.

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::warn;

use crate::{error::ServiceError, services::auction::AuctionHandle};

/// Identifiers tried before giving up on a new game.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Maps game ids to engine handles. Entries live as long as the process.
#[derive(Debug)]
pub struct GameRegistry<H = AuctionHandle> {
    games: DashMap<String, H>,
}

impl<H> Default for GameRegistry<H> {
    fn default() -> Self {
        Self {
            games: DashMap::new(),
        }
    }
}

impl<H: Clone> GameRegistry<H> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id and install the handle built for it.
    ///
    /// `next_id` is called until it yields an unused id, at most
    /// [`MAX_ID_ATTEMPTS`] times. `spawn` runs while the id is reserved, so two
    /// concurrent creations can never claim the same id.
    pub fn register<F, S>(&self, mut next_id: F, spawn: S) -> Result<H, ServiceError>
    where
        F: FnMut() -> String,
        S: FnOnce(String) -> Result<H, ServiceError>,
    {
        for _ in 0..MAX_ID_ATTEMPTS {
            match self.games.entry(next_id()) {
                Entry::Occupied(taken) => {
                    warn!(game_id = %taken.key(), "generated game id already in use");
                }
                Entry::Vacant(slot) => {
                    let handle = spawn(slot.key().clone())?;
                    slot.insert(handle.clone());
                    return Ok(handle);
                }
            }
        }
        Err(ServiceError::DuplicateGameId)
    }

    /// Look up the handle of `game_id`.
    pub fn get(&self, game_id: &str) -> Result<H, ServiceError> {
        self.games
            .get(game_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::GameNotFound(game_id.to_string()))
    }

    /// Number of registered games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no game has been created yet.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
