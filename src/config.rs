//! Application-level configuration loading, including auction tuning and the bracket source.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BRACKET_AUCTION_CONFIG_PATH";
/// Bracket file looked up when the configuration does not name one.
const DEFAULT_BRACKET_PATH: &str = "config/bracket.json";
/// Seconds between two reloads of the bracket results.
const DEFAULT_RESULTS_REFRESH_SECS: u64 = 300;

/// Tuning knobs applied to every game created by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuctionSettings {
    /// Budget each player starts with.
    pub starting_balance: u32,
    /// Countdown value a lot is reset to on every bid.
    pub countdown_seconds: u32,
    /// Delay between two countdown ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Number of characters in generated game identifiers.
    pub game_id_length: usize,
}

impl AuctionSettings {
    /// Interval between countdown ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Validate for AuctionSettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.tick_interval_ms == 0 {
            errors.add("tick_interval_ms", non_zero_error("tick_interval_ms"));
        }
        if self.game_id_length == 0 {
            errors.add("game_id_length", non_zero_error("game_id_length"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn non_zero_error(field: &str) -> ValidationError {
    let mut err = ValidationError::new("non_zero");
    err.message = Some(format!("{field} must be greater than zero").into());
    err
}

impl Default for AuctionSettings {
    fn default() -> Self {
        Self {
            starting_balance: 100,
            countdown_seconds: 10,
            tick_interval_ms: 1_000,
            game_id_length: 6,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    auction: AuctionSettings,
    bracket_path: PathBuf,
    results_refresh: Option<Duration>,
}

impl AppConfig {
    /// Build a configuration from explicit values.
    pub fn new(auction: AuctionSettings, bracket_path: impl Into<PathBuf>) -> Self {
        Self {
            auction,
            bracket_path: bracket_path.into(),
            results_refresh: Some(Duration::from_secs(DEFAULT_RESULTS_REFRESH_SECS)),
        }
    }

    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        starting_balance = app_config.auction.starting_balance,
                        countdown_seconds = app_config.auction.countdown_seconds,
                        "loaded auction settings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Settings applied to new games.
    pub fn auction(&self) -> AuctionSettings {
        self.auction
    }

    /// Location of the bracket JSON file.
    pub fn bracket_path(&self) -> &PathBuf {
        &self.bracket_path
    }

    /// How often match results are re-read from the bracket file, if at all.
    pub fn results_refresh(&self) -> Option<Duration> {
        self.results_refresh
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(AuctionSettings::default(), DEFAULT_BRACKET_PATH)
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    auction: AuctionSettings,
    bracket_path: Option<PathBuf>,
    /// `0` disables the periodic reload.
    results_refresh_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let bracket_path = value
            .bracket_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BRACKET_PATH));
        let auction = match value.auction.validate() {
            Ok(()) => value.auction,
            Err(err) => {
                warn!(error = %err, "invalid auction settings; falling back to defaults");
                AuctionSettings::default()
            }
        };
        let results_refresh = match value
            .results_refresh_secs
            .unwrap_or(DEFAULT_RESULTS_REFRESH_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            auction,
            bracket_path,
            results_refresh,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
