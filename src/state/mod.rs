pub mod allocator;
pub mod game;
pub mod hub;
pub mod phase;
pub mod registry;

use std::{sync::Arc, time::SystemTime};

use crate::{config::AppConfig, dao::bracket::BracketProvider};

use self::{hub::ConnectionHub, registry::GameRegistry};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, bracket data, running games and live sockets.
pub struct AppState {
    config: AppConfig,
    bracket: Arc<dyn BracketProvider>,
    games: GameRegistry,
    hub: Arc<ConnectionHub>,
    started_at: SystemTime,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, bracket: Arc<dyn BracketProvider>) -> SharedState {
        Arc::new(Self {
            config,
            bracket,
            games: GameRegistry::new(),
            hub: Arc::new(ConnectionHub::new()),
            started_at: SystemTime::now(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Source of the team field and match results.
    pub fn bracket(&self) -> &Arc<dyn BracketProvider> {
        &self.bracket
    }

    /// Registry of running games keyed by id.
    pub fn games(&self) -> &GameRegistry {
        &self.games
    }

    /// Live WebSocket connections grouped by game.
    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    /// Moment the state was built.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}
