//! Source of the tournament field and match results.

use std::{collections::HashSet, error::Error, fs, path::Path, sync::RwLock};

use thiserror::Error;
use tracing::warn;

use crate::{
    dao::models::{BracketEntity, slugify},
    state::game::{MatchResult, Team},
};

/// Seeds a team may carry.
const SEED_RANGE: std::ops::RangeInclusive<u8> = 1..=16;

/// Regions of a standard 64-team field.
const REGIONS: [&str; 4] = ["East", "West", "South", "Midwest"];

/// Error raised when bracket data cannot be loaded.
#[derive(Debug, Error)]
pub enum BracketError {
    /// The bracket document could not be read or parsed.
    #[error("bracket unavailable: {message}")]
    Unavailable {
        /// What was being loaded.
        message: String,
        /// Underlying I/O or parse failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The bracket document parsed but describes an unusable field.
    #[error("invalid bracket: {0}")]
    Invalid(String),
}

impl BracketError {
    /// Construct an unavailable error from any loading failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        BracketError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Supplies the team field used to seed new games and the results used for scoring.
pub trait BracketProvider: Send + Sync {
    /// Every team of the tournament.
    fn teams(&self) -> Vec<Team>;
    /// Match results known so far.
    fn match_results(&self) -> Vec<MatchResult>;
}

/// In-memory bracket, optionally loaded from a JSON document.
///
/// Results can be replaced while games run so scoring picks up new outcomes.
#[derive(Debug, Default)]
pub struct StaticBracket {
    teams: Vec<Team>,
    results: RwLock<Vec<MatchResult>>,
}

impl StaticBracket {
    /// Build a bracket from already-parsed data.
    pub fn new(teams: Vec<Team>, results: Vec<MatchResult>) -> Self {
        Self {
            teams,
            results: RwLock::new(results),
        }
    }

    /// Read a bracket document from `path`.
    pub fn from_json_file(path: &Path) -> Result<Self, BracketError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            BracketError::unavailable(format!("cannot read `{}`", path.display()), err)
        })?;
        let entity: BracketEntity = serde_json::from_str(&contents).map_err(|err| {
            BracketError::unavailable(format!("cannot parse `{}`", path.display()), err)
        })?;

        let teams: Vec<Team> = entity.teams.into_iter().map(Into::into).collect();
        check_field(&teams)?;
        Ok(Self::new(
            teams,
            entity.results.into_iter().map(Into::into).collect(),
        ))
    }

    /// Re-read the match results from `path`, keeping the current field.
    ///
    /// Returns the number of results now known.
    pub fn reload_results(&self, path: &Path) -> Result<usize, BracketError> {
        let fresh = Self::from_json_file(path)?;
        let results = fresh.match_results();
        let count = results.len();
        self.set_results(results);
        Ok(count)
    }

    /// Placeholder 64-team field (four regions, seeds 1 to 16) with no results.
    pub fn generated() -> Self {
        Self::new(generated_field(), Vec::new())
    }

    /// Replace the known match results.
    pub fn set_results(&self, results: Vec<MatchResult>) {
        match self.results.write() {
            Ok(mut guard) => *guard = results,
            Err(poisoned) => *poisoned.into_inner() = results,
        }
    }
}

impl BracketProvider for StaticBracket {
    fn teams(&self) -> Vec<Team> {
        self.teams.clone()
    }

    fn match_results(&self) -> Vec<MatchResult> {
        match self.results.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("bracket results lock poisoned; serving last written value");
                poisoned.into_inner().clone()
            }
        }
    }
}

/// Reject fields with repeated short names or seeds outside 1 to 16.
fn check_field(teams: &[Team]) -> Result<(), BracketError> {
    let mut seen = HashSet::with_capacity(teams.len());
    for team in teams {
        if !SEED_RANGE.contains(&team.seed) {
            return Err(BracketError::Invalid(format!(
                "team `{}` has seed {} outside 1..=16",
                team.short_name, team.seed
            )));
        }
        if !seen.insert(team.short_name.as_str()) {
            return Err(BracketError::Invalid(format!(
                "team `{}` appears more than once",
                team.short_name
            )));
        }
    }
    Ok(())
}

/// Build the placeholder field used when no bracket document is available.
pub fn generated_field() -> Vec<Team> {
    REGIONS
        .iter()
        .flat_map(|region| {
            (1..=16u8).map(move |seed| {
                let short_name = format!("{region} {seed}");
                Team {
                    url_name: slugify(&short_name),
                    short_name,
                    seed,
                    region: (*region).to_string(),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::PathBuf};

    use super::*;

    fn write_document(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("bracket-{}.json", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn generated_field_has_four_teams_per_seed() {
        let field = generated_field();
        assert_eq!(field.len(), 64);
        for seed in 1..=16u8 {
            assert_eq!(field.iter().filter(|team| team.seed == seed).count(), 4);
        }
        let names: HashSet<_> = field.iter().map(|team| &team.short_name).collect();
        assert_eq!(names.len(), 64);
    }

    #[test]
    fn loads_bracket_document_from_disk() {
        let path = std::env::temp_dir().join(format!("bracket-{}.json", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "teams": [
                    {{ "short_name": "Duke", "url_name": "duke", "seed": 4, "region": "South" }},
                    {{ "short_name": "Vermont", "seed": 13, "region": "South" }}
                ],
                "results": [{{
                    "id": "m1",
                    "round_name": "First Round",
                    "participants": [
                        {{ "short_name": "Duke", "seed": 4, "region": "South" }},
                        {{ "short_name": "Vermont", "seed": 13, "region": "South" }}
                    ],
                    "winner": "Duke",
                    "start_date": "2024-03-21"
                }}]
            }}"#
        )
        .unwrap();

        let bracket = StaticBracket::from_json_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(bracket.teams().len(), 2);
        assert_eq!(bracket.teams()[1].url_name, "vermont");
        let results = bracket.match_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].winner.as_deref(), Some("Duke"));
    }

    #[test]
    fn missing_file_reports_unavailable() {
        let err = StaticBracket::from_json_file(Path::new("/nonexistent/bracket.json"))
            .unwrap_err();
        assert!(err.to_string().contains("bracket unavailable"));
    }

    #[test]
    fn duplicate_short_names_are_rejected() {
        let path = write_document(
            r#"{ "teams": [
                { "short_name": "Dup", "seed": 16, "region": "East" },
                { "short_name": "Dup", "seed": 16, "region": "West" }
            ] }"#,
        );
        let err = StaticBracket::from_json_file(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert!(matches!(err, BracketError::Invalid(ref message) if message.contains("Dup")));
    }

    #[test]
    fn out_of_range_seeds_are_rejected() {
        for seed in [0, 17] {
            let path = write_document(&format!(
                r#"{{ "teams": [{{ "short_name": "Odd", "seed": {seed}, "region": "East" }}] }}"#
            ));
            let err = StaticBracket::from_json_file(&path).unwrap_err();
            fs::remove_file(&path).ok();

            assert!(matches!(err, BracketError::Invalid(_)), "seed {seed} accepted");
        }
    }

    #[test]
    fn reload_picks_up_new_results() {
        let path = write_document(
            r#"{ "teams": [
                { "short_name": "Duke", "seed": 4, "region": "South" },
                { "short_name": "Vermont", "seed": 13, "region": "South" }
            ] }"#,
        );
        let bracket = StaticBracket::from_json_file(&path).unwrap();
        assert!(bracket.match_results().is_empty());

        fs::write(
            &path,
            r#"{ "teams": [
                { "short_name": "Duke", "seed": 4, "region": "South" },
                { "short_name": "Vermont", "seed": 13, "region": "South" }
            ], "results": [{
                "id": "m1",
                "round_name": "First Round",
                "participants": [
                    { "short_name": "Duke", "seed": 4, "region": "South" },
                    { "short_name": "Vermont", "seed": 13, "region": "South" }
                ],
                "winner": "Vermont"
            }] }"#,
        )
        .unwrap();
        let count = bracket.reload_results(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(count, 1);
        assert_eq!(bracket.match_results()[0].winner.as_deref(), Some("Vermont"));
    }

    #[test]
    fn failed_reload_keeps_previous_results() {
        let bracket = StaticBracket::generated();
        let err = bracket
            .reload_results(Path::new("/nonexistent/bracket.json"))
            .unwrap_err();
        assert!(matches!(err, BracketError::Unavailable { .. }));
        assert!(bracket.match_results().is_empty());
    }

    #[test]
    fn results_can_be_replaced() {
        let bracket = StaticBracket::generated();
        assert!(bracket.match_results().is_empty());

        let field = generated_field();
        bracket.set_results(vec![MatchResult {
            id: "m1".into(),
            round_name: "First Round".into(),
            participants: [field[0].clone(), field[15].clone()],
            winner: Some(field[0].short_name.clone()),
            start_date: String::new(),
        }]);

        assert_eq!(bracket.match_results().len(), 1);
    }
}
