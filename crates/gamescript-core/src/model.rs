// Plain input records shared by the standings pipeline and the bracket engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type TeamId = i64;
pub type GameId = i64;
pub type SeasonId = i64;
pub type ScenarioId = i64;

/// The league a season belongs to. Every league-specific rule (ties,
/// tie-break tables, playoff field size, bracket shape) hangs off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nfl,
    Nba,
}

impl Sport {
    /// Whether a game can end level.
    pub fn allows_ties(self) -> bool {
        matches!(self, Sport::Nfl)
    }

    /// Number of teams per conference that reach the postseason
    /// (play-in included for NBA).
    pub fn playoff_field(self) -> usize {
        match self {
            Sport::Nfl => 7,
            Sport::Nba => 10,
        }
    }

    /// Last round of the bracket.
    pub fn final_round(self) -> u32 {
        match self {
            Sport::Nfl => 4,
            Sport::Nba => 6,
        }
    }

    /// NFL seeds all division winners ahead of the wild cards. NBA ranks the
    /// whole conference together and uses division-winner status only as a
    /// tie-breaker.
    pub fn seeds_division_winners_first(self) -> bool {
        matches!(self, Sport::Nfl)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Nba => "nba",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nfl" => Ok(Sport::Nfl),
            "nba" => Ok(Sport::Nba),
            other => Err(format!("unknown sport '{other}' (expected nfl or nba)")),
        }
    }
}

/// A franchise as loaded for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub city: String,
    pub name: String,
    pub abbreviation: String,
    pub conference: String,
    pub division: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// A scheduled regular-season game. Scores are present once the game has
/// been played; only `is_final` games count as real results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFact {
    pub id: GameId,
    pub week: Option<u32>,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_final: bool,
}

/// A user's prediction for one regular-season game in one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub scenario_id: ScenarioId,
    pub game_id: GameId,
    pub picked_team_id: Option<TeamId>,
    pub predicted_home_score: Option<i32>,
    pub predicted_away_score: Option<i32>,
}

impl Pick {
    /// A pick that only names a winner.
    pub fn winner(scenario_id: ScenarioId, game_id: GameId, team_id: TeamId) -> Self {
        Pick {
            scenario_id,
            game_id,
            picked_team_id: Some(team_id),
            predicted_home_score: None,
            predicted_away_score: None,
        }
    }
}

/// A user's hypothetical version of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub sport: Sport,
    pub season_id: SeasonId,
}
