// Postseason bracket: types shared by the round builders, the generator and
// the persistence layer.

pub mod generator;
pub mod locks;
pub mod nba;
pub mod nfl;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;
use crate::model::{ScenarioId, SeasonId, Sport, TeamId};
use crate::standings::Standings;

pub use generator::PlayoffBracketGenerator;
pub use locks::ScenarioLocks;

pub type PlayoffStateId = i64;

/// Per-scenario bracket pointer. Created the first time playoffs are enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffState {
    pub id: PlayoffStateId,
    pub scenario_id: ScenarioId,
    pub sport: Sport,
    pub season_id: SeasonId,
    pub current_round: u32,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A team as it enters a bracket slot, carrying its conference seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededTeam {
    pub team_id: TeamId,
    pub seed: u32,
}

/// Two teams meeting in one slot of one round. `higher` is the better seed
/// (smaller number) and hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub round: u32,
    pub order: u32,
    /// `None` for the final, which crosses conferences.
    pub conference: Option<String>,
    pub higher: SeededTeam,
    pub lower: SeededTeam,
}

impl Pairing {
    /// Build a pairing, putting the better seed first. On equal seeds `a`
    /// stays the higher seed.
    pub fn new(round: u32, order: u32, conference: Option<String>, a: SeededTeam, b: SeededTeam) -> Self {
        let (higher, lower) = if b.seed < a.seed { (b, a) } else { (a, b) };
        Pairing {
            round,
            order,
            conference,
            higher,
            lower,
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.higher.team_id == team_id || self.lower.team_id == team_id
    }

    /// Split into winner and loser for a picked team. `None` if the team is
    /// not in this pairing.
    pub fn decide(&self, winner: TeamId) -> Option<Decided> {
        let (winner, loser) = if winner == self.higher.team_id {
            (self.higher, self.lower)
        } else if winner == self.lower.team_id {
            (self.lower, self.higher)
        } else {
            return None;
        };
        Some(Decided {
            pairing: self.clone(),
            winner,
            loser,
        })
    }
}

/// A slot whose winner has been picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decided {
    pub pairing: Pairing,
    pub winner: SeededTeam,
    pub loser: SeededTeam,
}

/// How a round's slots are played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFormat {
    SingleGame,
    BestOf(u32),
}

impl SlotFormat {
    pub fn for_round(sport: Sport, round: u32) -> Self {
        match sport {
            Sport::Nfl => SlotFormat::SingleGame,
            Sport::Nba if round <= nba::PLAY_IN_B => SlotFormat::SingleGame,
            Sport::Nba => SlotFormat::BestOf(7),
        }
    }
}

/// Display name of a round.
pub fn round_name(sport: Sport, round: u32) -> &'static str {
    match (sport, round) {
        (Sport::Nfl, 1) => "Wild Card",
        (Sport::Nfl, 2) => "Divisional",
        (Sport::Nfl, 3) => "Conference Championship",
        (Sport::Nfl, 4) => "Super Bowl",
        (Sport::Nba, 1) => "Play-In",
        (Sport::Nba, 2) => "Play-In Final",
        (Sport::Nba, 3) => "Conference Quarterfinals",
        (Sport::Nba, 4) => "Conference Semifinals",
        (Sport::Nba, 5) => "Conference Finals",
        (Sport::Nba, 6) => "Finals",
        _ => "Unknown",
    }
}

/// Winners of `round` in `conference`, in slot order.
pub(crate) fn winners_of(decided: &[Decided], round: u32, conference: Option<&str>) -> Vec<SeededTeam> {
    let mut slots: Vec<&Decided> = decided
        .iter()
        .filter(|d| d.pairing.round == round && d.pairing.conference.as_deref() == conference)
        .collect();
    slots.sort_by_key(|d| d.pairing.order);
    slots.into_iter().map(|d| d.winner).collect()
}

/// Single-elimination reseeding: best remaining seed meets the worst, the
/// next best meets the next worst, and so on.
pub(crate) fn reseed(round: u32, conference: &str, mut teams: Vec<SeededTeam>) -> Vec<Pairing> {
    teams.sort_by_key(|t| (t.seed, t.team_id));
    let n = teams.len();
    (0..n / 2)
        .map(|i| {
            Pairing::new(
                round,
                i as u32 + 1,
                Some(conference.to_string()),
                teams[i],
                teams[n - 1 - i],
            )
        })
        .collect()
}

/// One team of the frozen playoff field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub seed: u32,
    pub team_id: TeamId,
    pub win_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceField {
    pub name: String,
    /// Seed order, 1 first.
    pub entries: Vec<FieldEntry>,
}

impl ConferenceField {
    /// Seed `seed` as a bracket entrant.
    pub fn seeded(&self, seed: u32) -> Result<SeededTeam, ScenarioError> {
        self.entries
            .iter()
            .find(|e| e.seed == seed)
            .map(|e| SeededTeam {
                team_id: e.team_id,
                seed,
            })
            .ok_or_else(|| ScenarioError::BracketShape(format!("{} has no seed {}", self.name, seed)))
    }
}

/// The playoff field as seeded when the bracket was enabled. Every round is
/// built from this snapshot, so later edits to regular-season picks cannot
/// move teams in or out of a bracket in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffField {
    pub conferences: Vec<ConferenceField>,
}

impl PlayoffField {
    /// The top `playoff_field()` seeds of every conference.
    pub fn from_standings(standings: &Standings) -> Self {
        let conferences = standings
            .conferences
            .iter()
            .map(|c| ConferenceField {
                name: c.name.clone(),
                entries: c
                    .playoff_teams(standings.sport)
                    .iter()
                    .map(|s| FieldEntry {
                        seed: s.seed,
                        team_id: s.team.id(),
                        win_pct: s.team.win_pct,
                    })
                    .collect(),
            })
            .collect();
        PlayoffField { conferences }
    }

    pub fn entry(&self, team_id: TeamId) -> Option<&FieldEntry> {
        self.conferences
            .iter()
            .flat_map(|c| c.entries.iter())
            .find(|e| e.team_id == team_id)
    }

    pub fn is_empty(&self) -> bool {
        self.conferences.iter().all(|c| c.entries.is_empty())
    }
}

/// The cross-conference final. Equal seeds go to the better regular-season
/// win percentage, then the lower team ID.
pub(crate) fn final_pairing(
    round: u32,
    field: &PlayoffField,
    champions: &[SeededTeam],
) -> Result<Pairing, ScenarioError> {
    let [a, b] = champions else {
        return Err(ScenarioError::BracketShape(format!(
            "final needs two conference champions, found {}",
            champions.len()
        )));
    };
    let pct = |t: &SeededTeam| field.entry(t.team_id).map_or(f64::NEG_INFINITY, |e| e.win_pct);
    let a_first = a.seed < b.seed
        || (a.seed == b.seed
            && (pct(a) > pct(b) || (pct(a) == pct(b) && a.team_id < b.team_id)));
    let (first, second) = if a_first { (*a, *b) } else { (*b, *a) };
    Ok(Pairing::new(round, 1, None, first, second))
}

/// A single-game slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub id: i64,
    #[serde(flatten)]
    pub pairing: Pairing,
    pub picked_team_id: Option<TeamId>,
    pub predicted_higher_score: Option<u32>,
    pub predicted_lower_score: Option<u32>,
}

/// A best-of-N slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    #[serde(flatten)]
    pub pairing: Pairing,
    pub best_of: u32,
    pub picked_team_id: Option<TeamId>,
    pub predicted_higher_wins: Option<u32>,
    pub predicted_lower_wins: Option<u32>,
}

/// Common view over matchups and series.
pub trait BracketSlotView {
    fn pairing(&self) -> &Pairing;
    fn picked(&self) -> Option<TeamId>;

    fn decided(&self) -> Option<Decided> {
        self.picked().and_then(|t| self.pairing().decide(t))
    }
}

impl BracketSlotView for Matchup {
    fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    fn picked(&self) -> Option<TeamId> {
        self.picked_team_id
    }
}

impl BracketSlotView for Series {
    fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    fn picked(&self) -> Option<TeamId> {
        self.picked_team_id
    }
}

/// Addresses one persisted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum BracketSlot {
    Matchup(i64),
    Series(i64),
}

/// A user's pick on one slot. For a single game the predicted values are
/// scores; for a series they are games won.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPick {
    pub picked_team_id: Option<TeamId>,
    pub predicted_higher: Option<u32>,
    pub predicted_lower: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BracketPhase {
    Disabled,
    Round { round: u32 },
    Completed { champion: TeamId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffStatus {
    pub state: Option<PlayoffState>,
    pub can_enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub name: String,
    pub complete: bool,
}

/// Everything persisted for a scenario's bracket, ordered by round,
/// conference and slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub state: Option<PlayoffState>,
    pub phase: BracketPhase,
    pub rounds: Vec<RoundSummary>,
    pub matchups: Vec<Matchup>,
    pub series: Vec<Series>,
}

impl Bracket {
    /// Slots of one round as pairings with their picks.
    pub fn round(&self, round: u32) -> Vec<&dyn BracketSlotView> {
        let matchups = self.matchups.iter().filter(|m| m.pairing.round == round).map(|m| m as &dyn BracketSlotView);
        let series = self.series.iter().filter(|s| s.pairing.round == round).map(|s| s as &dyn BracketSlotView);
        matchups.chain(series).collect()
    }

    pub fn rounds_present(&self) -> Vec<u32> {
        let mut rounds: Vec<u32> = self
            .matchups
            .iter()
            .map(|m| m.pairing.round)
            .chain(self.series.iter().map(|s| s.pairing.round))
            .collect();
        rounds.sort_unstable();
        rounds.dedup();
        rounds
    }

    /// Name and pick status of every persisted round.
    pub fn summarize(&self, sport: Sport) -> Vec<RoundSummary> {
        self.rounds_present()
            .into_iter()
            .map(|round| RoundSummary {
                round,
                name: round_name(sport, round).to_string(),
                complete: self.round(round).iter().all(|s| s.picked().is_some()),
            })
            .collect()
    }
}
