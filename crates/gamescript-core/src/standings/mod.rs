// Standings pipeline: outcomes -> records -> strength metrics -> tie-breaks
// -> per-conference standings, seeds and draft order.
//
// Everything here is a pure function of its inputs and is recomputed on
// every request.

pub mod assemble;
pub mod draft;
pub mod outcome;
pub mod records;
pub mod strength;
pub mod tiebreak;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;
use crate::model::{GameFact, Pick, ScenarioId, SeasonId, Sport, Team, TeamId};
use crate::store::SeasonSource;

pub use outcome::{resolve_outcome, resolve_outcomes, GameOutcome};
pub use records::{Split, TeamRecord, NO_GAMES_PCT};
pub use tiebreak::{Criterion, Level, TiebreakContext};

/// One conference-wide rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffSeed {
    pub seed: u32,
    pub team: TeamRecord,
    pub is_division_winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    pub pick: u32,
    pub team: TeamRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceStandings {
    pub name: String,
    /// Each division's teams, best first.
    pub divisions: BTreeMap<String, Vec<TeamRecord>>,
    /// Every team in the conference, seeded 1..N.
    pub playoff_seeds: Vec<PlayoffSeed>,
}

impl ConferenceStandings {
    /// The team holding `seed`, if any.
    pub fn seed(&self, seed: u32) -> Option<&PlayoffSeed> {
        self.playoff_seeds.iter().find(|s| s.seed == seed)
    }

    /// The seeds that reach the postseason.
    pub fn playoff_teams(&self, sport: Sport) -> &[PlayoffSeed] {
        let n = sport.playoff_field().min(self.playoff_seeds.len());
        &self.playoff_seeds[..n]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub sport: Sport,
    /// Ordered by conference name.
    pub conferences: Vec<ConferenceStandings>,
    pub draft_order: Vec<DraftPick>,
}

impl Standings {
    pub fn conference(&self, name: &str) -> Option<&ConferenceStandings> {
        self.conferences.iter().find(|c| c.name == name)
    }

    /// Conference-wide seed of `team_id`.
    pub fn seed_of(&self, team_id: TeamId) -> Option<&PlayoffSeed> {
        self.conferences
            .iter()
            .flat_map(|c| c.playoff_seeds.iter())
            .find(|s| s.team.id() == team_id)
    }
}

/// Compute standings for one scenario from the season's roster and games and
/// the scenario's picks.
pub fn compute_standings(sport: Sport, teams: &[Team], games: &[GameFact], picks: &[Pick]) -> Standings {
    let outcomes = resolve_outcomes(games, picks, sport);
    standings_from_outcomes(sport, teams, &outcomes)
}

/// The pipeline after outcome resolution.
pub fn standings_from_outcomes(sport: Sport, teams: &[Team], outcomes: &[GameOutcome]) -> Standings {
    let mut records = records::aggregate_records(teams, outcomes);
    strength::apply_strength_metrics(&mut records, outcomes, sport);

    let conferences = assemble::assemble_conferences(sport, &records, outcomes);
    let draft_order = draft::draft_order(sport, &conferences);

    Standings {
        sport,
        conferences,
        draft_order,
    }
}

/// A season as seen through one scenario's picks.
#[derive(Debug, Clone)]
pub struct ScenarioSeason {
    pub sport: Sport,
    pub teams: Vec<Team>,
    pub games: Vec<GameFact>,
    pub outcomes: Vec<GameOutcome>,
}

impl ScenarioSeason {
    pub fn load<S: SeasonSource + ?Sized>(
        source: &S,
        scenario_id: ScenarioId,
        season_id: SeasonId,
        sport: Sport,
    ) -> Result<Self, ScenarioError> {
        let teams = source.load_teams(season_id)?;
        let games = source.list_games(season_id)?;
        let picks = source.list_picks(scenario_id)?;
        let outcomes = resolve_outcomes(&games, &picks, sport);
        Ok(ScenarioSeason {
            sport,
            teams,
            games,
            outcomes,
        })
    }

    /// Every scheduled game has a result or a valid pick.
    pub fn is_complete(&self) -> bool {
        !self.games.is_empty() && self.outcomes.len() == self.games.len()
    }

    pub fn standings(&self) -> Standings {
        standings_from_outcomes(self.sport, &self.teams, &self.outcomes)
    }
}

/// Standings for a stored scenario. The league comes from the scenario
/// record.
pub fn compute_scenario_standings<S: SeasonSource + ?Sized>(
    source: &S,
    scenario_id: ScenarioId,
    season_id: SeasonId,
) -> Result<Standings, ScenarioError> {
    let scenario = source
        .scenario(scenario_id)?
        .ok_or_else(|| ScenarioError::NotFound(format!("scenario {scenario_id}")))?;
    Ok(ScenarioSeason::load(source, scenario_id, season_id, scenario.sport)?.standings())
}
