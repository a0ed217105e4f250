use serde::{Deserialize, Serialize};

use crate::state::game::{MatchResult, Team};

/// On-disk bracket document: the field of teams plus the results known so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BracketEntity {
    /// Every team in the tournament.
    pub teams: Vec<TeamEntity>,
    /// Played or scheduled games.
    #[serde(default)]
    pub results: Vec<MatchResultEntity>,
}

/// Team entry as stored in the bracket document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Display name, unique within the tournament.
    pub short_name: String,
    /// Slug used by the bracket source.
    #[serde(default)]
    pub url_name: String,
    /// Tournament seed.
    pub seed: u8,
    /// Bracket region.
    pub region: String,
}

/// Match entry as stored in the bracket document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResultEntity {
    pub id: String,
    pub round_name: String,
    pub participants: [TeamEntity; 2],
    /// Short name of the winner once the game is final.
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub start_date: String,
}

impl From<TeamEntity> for Team {
    fn from(value: TeamEntity) -> Self {
        let url_name = if value.url_name.is_empty() {
            slugify(&value.short_name)
        } else {
            value.url_name
        };
        Self {
            short_name: value.short_name,
            url_name,
            seed: value.seed,
            region: value.region,
        }
    }
}

impl From<MatchResultEntity> for MatchResult {
    fn from(value: MatchResultEntity) -> Self {
        let [home, away] = value.participants;
        Self {
            id: value.id,
            round_name: value.round_name,
            participants: [home.into(), away.into()],
            winner: value.winner,
            start_date: value.start_date,
        }
    }
}

/// Lowercase, dash-separated slug of a team name.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(slugify("St. Mary's (CA)"), "st-mary-s-ca");
        assert_eq!(slugify("Duke"), "duke");
    }

    #[test]
    fn missing_url_name_is_derived() {
        let team: Team = TeamEntity {
            short_name: "North Carolina".into(),
            url_name: String::new(),
            seed: 1,
            region: "West".into(),
        }
        .into();
        assert_eq!(team.url_name, "north-carolina");
    }

    #[test]
    fn results_document_parses_without_optional_fields() {
        let doc: BracketEntity = serde_json::from_str(
            r#"{
                "teams": [{ "short_name": "Duke", "seed": 4, "region": "South" }],
                "results": [{
                    "id": "m1",
                    "round_name": "First Round",
                    "participants": [
                        { "short_name": "Duke", "seed": 4, "region": "South" },
                        { "short_name": "Vermont", "seed": 13, "region": "South" }
                    ]
                }]
            }"#,
        )
        .unwrap();

        let result: MatchResult = doc.results[0].clone().into();
        assert!(result.winner.is_none());
        assert_eq!(result.participants[1].short_name, "Vermont");
    }
}
