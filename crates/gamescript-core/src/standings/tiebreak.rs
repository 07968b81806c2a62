// League tie-breaking procedures.
//
// A tied group is resolved by repeatedly finding its single best team,
// emitting it, and starting over from the top of the criteria table with
// whoever is left. Each league's procedure is a static table of criteria
// applied in order; a criterion that cannot apply to the current pool is
// skipped, and a pool that survives every criterion falls back to the
// lowest team ID.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::outcome::GameOutcome;
use super::records::{Split, TeamRecord};
use crate::model::{Sport, TeamId};

/// Scores closer than this are treated as equal.
const EPSILON: f64 = 1e-9;

/// Which ranking is being produced. Division-level ties are between teams of
/// one division; conference-level ties may span divisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Division,
    Conference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Win percentage in games played among the tied teams.
    HeadToHead,
    /// Division winners ahead of everyone else.
    DivisionWinner,
    /// Only applies when every tied team is in the same division.
    DivisionRecord,
    /// Record against opponents every tied team has played. Skipped when a
    /// team has fewer than `min_games` such games.
    CommonGames { min_games: u32 },
    ConferenceRecord,
    StrengthOfVictory,
    StrengthOfSchedule,
    PointDifferential,
    PointsScored,
    /// Fewer is better.
    PointsAllowed,
}

use Criterion::*;

const NFL_DIVISION: &[Criterion] = &[
    HeadToHead,
    DivisionRecord,
    CommonGames { min_games: 0 },
    ConferenceRecord,
    StrengthOfVictory,
    StrengthOfSchedule,
    PointDifferential,
    PointsScored,
    PointsAllowed,
];

const NFL_CONFERENCE: &[Criterion] = &[
    DivisionWinner,
    HeadToHead,
    DivisionRecord,
    CommonGames { min_games: 4 },
    ConferenceRecord,
    StrengthOfVictory,
    StrengthOfSchedule,
    PointDifferential,
    PointsScored,
    PointsAllowed,
];

const NBA_DIVISION: &[Criterion] = &[HeadToHead, DivisionRecord, ConferenceRecord, PointDifferential];

const NBA_CONFERENCE: &[Criterion] = &[
    HeadToHead,
    DivisionWinner,
    DivisionRecord,
    ConferenceRecord,
    PointDifferential,
];

/// The ordered criteria for one league and level.
pub fn criteria(sport: Sport, level: Level) -> &'static [Criterion] {
    match (sport, level) {
        (Sport::Nfl, Level::Division) => NFL_DIVISION,
        (Sport::Nfl, Level::Conference) => NFL_CONFERENCE,
        (Sport::Nba, Level::Division) => NBA_DIVISION,
        (Sport::Nba, Level::Conference) => NBA_CONFERENCE,
    }
}

/// Rounded win percentage used to form tied groups.
pub(crate) fn pct_key(pct: f64) -> i64 {
    (pct * 1e6).round() as i64
}

/// Read-only view of a season used to rank teams. Borrowing the records and
/// outcomes keeps one context reusable across every group in a computation.
pub struct TiebreakContext<'a> {
    sport: Sport,
    records: HashMap<TeamId, &'a TeamRecord>,
    outcomes: &'a [GameOutcome],
    division_winners: HashSet<TeamId>,
}

impl<'a> TiebreakContext<'a> {
    pub fn new(sport: Sport, records: &'a [TeamRecord], outcomes: &'a [GameOutcome]) -> Self {
        TiebreakContext {
            sport,
            records: records.iter().map(|r| (r.id(), r)).collect(),
            outcomes,
            division_winners: records.iter().filter(|r| r.is_division_winner).map(|r| r.id()).collect(),
        }
    }

    /// Replace the set of teams treated as division winners.
    pub fn set_division_winners(&mut self, winners: impl IntoIterator<Item = TeamId>) {
        self.division_winners = winners.into_iter().collect();
    }

    /// Order `teams` best-first: by win percentage, with each group of equal
    /// percentage resolved by [`Self::break_tie`]. Unknown IDs are dropped.
    pub fn rank(&self, teams: &[TeamId], level: Level) -> Vec<TeamId> {
        let mut groups: BTreeMap<std::cmp::Reverse<i64>, Vec<TeamId>> = BTreeMap::new();
        for &id in teams {
            if let Some(rec) = self.records.get(&id) {
                groups
                    .entry(std::cmp::Reverse(pct_key(rec.win_pct)))
                    .or_default()
                    .push(id);
            }
        }

        let mut ordered = Vec::with_capacity(teams.len());
        for group in groups.into_values() {
            if group.len() == 1 {
                ordered.extend(group);
            } else {
                ordered.extend(self.break_tie(&group, level));
            }
        }
        ordered
    }

    /// Strict best-to-worst order for a group of teams assumed to share a
    /// win percentage. The result does not depend on the input order.
    pub fn break_tie(&self, teams: &[TeamId], level: Level) -> Vec<TeamId> {
        let mut remaining: Vec<TeamId> = teams.to_vec();
        remaining.sort_unstable();
        remaining.dedup();

        let mut ordered = Vec::with_capacity(remaining.len());
        while remaining.len() > 1 {
            let leader = self.leader(&remaining, level);
            debug!("tie-break {:?}: {} leads {:?}", level, leader, remaining);
            ordered.push(leader);
            remaining.retain(|&id| id != leader);
        }
        ordered.extend(remaining);
        ordered
    }

    fn leader(&self, pool: &[TeamId], level: Level) -> TeamId {
        if pool.len() == 1 {
            return pool[0];
        }

        // NFL conference ties first reduce to each division's best team.
        if self.sport == Sport::Nfl && level == Level::Conference {
            if pool.len() == 2 && self.same_division(pool) {
                return self.pick_leader(pool, Level::Division);
            }
            if pool.len() > 2 {
                let reps = self.division_representatives(pool);
                if reps.len() < pool.len() {
                    debug!("conference tie narrowed to division leaders {:?}", reps);
                    return self.leader(&reps, level);
                }
            }
        }

        if pool.len() > 2 {
            if let Some(sweeper) = self.sweep(pool) {
                debug!("{} swept {:?}", sweeper, pool);
                return sweeper;
            }
        }

        self.pick_leader(pool, level)
    }

    /// Walk the criteria table, narrowing the pool to the teams sharing the
    /// best score at each step.
    fn pick_leader(&self, pool: &[TeamId], level: Level) -> TeamId {
        let mut pool = pool.to_vec();
        for &criterion in criteria(self.sport, level) {
            if pool.len() == 1 {
                break;
            }
            let Some(scores) = self.scores(criterion, &pool, level) else {
                continue;
            };
            let best = scores.iter().map(|&(_, s)| s).fold(f64::NEG_INFINITY, f64::max);
            let survivors: Vec<TeamId> = scores
                .into_iter()
                .filter(|&(_, s)| (best - s).abs() < EPSILON)
                .map(|(id, _)| id)
                .collect();
            if survivors.len() < pool.len() {
                debug!("{:?} narrowed {:?} to {:?}", criterion, pool, survivors);
            }
            pool = survivors;
        }

        if pool.len() > 1 {
            debug!("tie unresolved among {:?}; falling back to team id", pool);
        }
        pool.into_iter().min().unwrap_or_default()
    }

    /// Score every team in the pool on one criterion (higher is better), or
    /// `None` when the criterion does not apply to this pool.
    fn scores(&self, criterion: Criterion, pool: &[TeamId], level: Level) -> Option<Vec<(TeamId, f64)>> {
        match criterion {
            HeadToHead => self.head_to_head(pool),
            DivisionWinner => {
                if level != Level::Conference {
                    return None;
                }
                Some(
                    pool.iter()
                        .map(|id| (*id, if self.division_winners.contains(id) { 1.0 } else { 0.0 }))
                        .collect(),
                )
            }
            DivisionRecord => {
                if !self.same_division(pool) {
                    return None;
                }
                self.score_each(pool, |r| r.division.pct(self.sport))
            }
            CommonGames { min_games } => self.common_games(pool, min_games),
            ConferenceRecord => self.score_each(pool, |r| r.conference.pct(self.sport)),
            StrengthOfVictory => self.score_each(pool, |r| r.strength_of_victory),
            StrengthOfSchedule => self.score_each(pool, |r| r.strength_of_schedule),
            PointDifferential => self.score_each(pool, |r| r.point_differential() as f64),
            PointsScored => self.score_each(pool, |r| r.points_for as f64),
            PointsAllowed => self.score_each(pool, |r| -(r.points_against as f64)),
        }
    }

    fn score_each(&self, pool: &[TeamId], f: impl Fn(&TeamRecord) -> f64) -> Option<Vec<(TeamId, f64)>> {
        pool.iter()
            .map(|id| self.records.get(id).map(|r| (*id, f(*r))))
            .collect()
    }

    fn head_to_head(&self, pool: &[TeamId]) -> Option<Vec<(TeamId, f64)>> {
        let members: HashSet<TeamId> = pool.iter().copied().collect();
        let mut splits: HashMap<TeamId, Split> = HashMap::new();
        for o in self.outcomes {
            if members.contains(&o.home_team_id) && members.contains(&o.away_team_id) {
                splits.entry(o.home_team_id).or_default().record(o.won_by(o.home_team_id));
                splits.entry(o.away_team_id).or_default().record(o.won_by(o.away_team_id));
            }
        }
        // Every team must have met the group at least once.
        pool.iter()
            .map(|id| splits.get(id).map(|s| (*id, s.pct(self.sport))))
            .collect()
    }

    fn common_games(&self, pool: &[TeamId], min_games: u32) -> Option<Vec<(TeamId, f64)>> {
        let members: HashSet<TeamId> = pool.iter().copied().collect();
        let mut opponents: HashMap<TeamId, HashSet<TeamId>> = HashMap::new();
        for o in self.outcomes {
            for id in pool {
                if let Some(opp) = o.opponent_of(*id) {
                    if !members.contains(&opp) {
                        opponents.entry(*id).or_default().insert(opp);
                    }
                }
            }
        }

        let mut common: Option<HashSet<TeamId>> = None;
        for id in pool {
            let theirs = opponents.get(id).cloned().unwrap_or_default();
            common = Some(match common {
                None => theirs,
                Some(acc) => acc.intersection(&theirs).copied().collect(),
            });
        }
        let common = common.unwrap_or_default();
        if common.is_empty() {
            return None;
        }

        let mut splits: HashMap<TeamId, Split> = HashMap::new();
        for o in self.outcomes {
            for id in pool {
                if let Some(opp) = o.opponent_of(*id) {
                    if common.contains(&opp) {
                        splits.entry(*id).or_default().record(o.won_by(*id));
                    }
                }
            }
        }

        let mut scores = Vec::with_capacity(pool.len());
        for id in pool {
            let split = splits.get(id).copied().unwrap_or_default();
            if split.games() < min_games.max(1) {
                return None;
            }
            scores.push((*id, split.pct(self.sport)));
        }
        Some(scores)
    }

    /// The one team that won every meeting with every other team in the
    /// pool, having met each of them at least once.
    fn sweep(&self, pool: &[TeamId]) -> Option<TeamId> {
        pool.iter().copied().find(|&candidate| {
            pool.iter().filter(|&&other| other != candidate).all(|&other| {
                let meetings: Vec<&GameOutcome> = self
                    .outcomes
                    .iter()
                    .filter(|o| o.opponent_of(candidate) == Some(other))
                    .collect();
                !meetings.is_empty() && meetings.iter().all(|o| o.winner() == Some(candidate))
            })
        })
    }

    fn same_division(&self, pool: &[TeamId]) -> bool {
        let mut keys = pool
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|r| (&r.team.conference, &r.team.division));
        match keys.next() {
            Some(first) => keys.all(|k| k == first),
            None => false,
        }
    }

    /// Best team of each division present in the pool, by the division
    /// procedure.
    fn division_representatives(&self, pool: &[TeamId]) -> Vec<TeamId> {
        let mut by_division: BTreeMap<(&str, &str), Vec<TeamId>> = BTreeMap::new();
        for id in pool {
            if let Some(r) = self.records.get(id) {
                by_division
                    .entry((r.team.conference.as_str(), r.team.division.as_str()))
                    .or_default()
                    .push(*id);
            }
        }
        let mut reps: Vec<TeamId> = by_division
            .into_values()
            .filter_map(|members| self.break_tie(&members, Level::Division).first().copied())
            .collect();
        reps.sort_unstable();
        reps
    }
}
