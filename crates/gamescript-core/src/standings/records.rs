// Fold game outcomes into per-team win/loss/tie records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::outcome::GameOutcome;
use crate::model::{Sport, Team, TeamId};

/// Win percentage given to a team that has not played. Strictly below any
/// real record, so such teams always sort last.
pub const NO_GAMES_PCT: f64 = -1.0;

/// Wins, losses and ties within one bucket (overall, home, division, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Split {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Count one result: `Some(true)` win, `Some(false)` loss, `None` tie.
    pub fn record(&mut self, result: Option<bool>) {
        match result {
            Some(true) => self.wins += 1,
            Some(false) => self.losses += 1,
            None => self.ties += 1,
        }
    }

    pub fn add(&mut self, other: &Split) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.ties += other.ties;
    }

    /// Win percentage with ties as half-wins. An empty split scores
    /// [`NO_GAMES_PCT`] in the NFL and 0 in the NBA.
    pub fn pct(&self, sport: Sport) -> f64 {
        if self.games() == 0 {
            return match sport {
                Sport::Nfl => NO_GAMES_PCT,
                Sport::Nba => 0.0,
            };
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / self.games() as f64
    }
}

/// Everything the standings need to know about one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team: Team,
    pub overall: Split,
    pub home: Split,
    pub away: Split,
    pub division: Split,
    pub conference: Split,
    pub points_for: i64,
    pub points_against: i64,
    /// Games that contributed to points for/against.
    pub games_with_scores: u32,
    pub win_pct: f64,
    pub strength_of_schedule: f64,
    pub strength_of_victory: f64,
    pub division_games_back: f64,
    pub conference_games_back: f64,
    pub is_division_winner: bool,
}

impl TeamRecord {
    pub fn new(team: Team) -> Self {
        TeamRecord {
            team,
            overall: Split::default(),
            home: Split::default(),
            away: Split::default(),
            division: Split::default(),
            conference: Split::default(),
            points_for: 0,
            points_against: 0,
            games_with_scores: 0,
            win_pct: NO_GAMES_PCT,
            strength_of_schedule: 0.0,
            strength_of_victory: 0.0,
            division_games_back: 0.0,
            conference_games_back: 0.0,
            is_division_winner: false,
        }
    }

    pub fn id(&self) -> TeamId {
        self.team.id
    }

    pub fn point_differential(&self) -> i64 {
        self.points_for - self.points_against
    }

    fn same_conference(&self, other: &TeamRecord) -> bool {
        self.team.conference == other.team.conference
    }

    fn same_division(&self, other: &TeamRecord) -> bool {
        self.same_conference(other) && self.team.division == other.team.division
    }
}

/// Overall win percentage: ties count half, and a team with no games gets
/// [`NO_GAMES_PCT`] in every league.
pub fn overall_win_pct(split: &Split) -> f64 {
    if split.games() == 0 {
        NO_GAMES_PCT
    } else {
        (split.wins as f64 + 0.5 * split.ties as f64) / split.games() as f64
    }
}

/// Games behind `leader`: `((leaderW - W) + (L - leaderL)) / 2`, with ties
/// counted as half a win and half a loss.
pub fn games_back(leader: &TeamRecord, team: &TeamRecord) -> f64 {
    if leader.id() == team.id() {
        return 0.0;
    }
    let half = |s: &Split| 0.5 * s.ties as f64;
    let leader_wins = leader.overall.wins as f64 + half(&leader.overall);
    let leader_losses = leader.overall.losses as f64 + half(&leader.overall);
    let team_wins = team.overall.wins as f64 + half(&team.overall);
    let team_losses = team.overall.losses as f64 + half(&team.overall);
    ((leader_wins - team_wins) + (team_losses - leader_losses)) / 2.0
}

/// Build fresh records for `teams` from the full outcome set. The output
/// preserves the order of `teams`. Outcomes naming a team outside the roster
/// are ignored.
pub fn aggregate_records(teams: &[Team], outcomes: &[GameOutcome]) -> Vec<TeamRecord> {
    let mut records: Vec<TeamRecord> = teams.iter().cloned().map(TeamRecord::new).collect();
    let index: HashMap<TeamId, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id(), i))
        .collect();

    for outcome in outcomes {
        let (Some(&h), Some(&a)) = (
            index.get(&outcome.home_team_id),
            index.get(&outcome.away_team_id),
        ) else {
            debug!("ignoring game {}: team not on roster", outcome.game_id);
            continue;
        };
        if h == a {
            debug!("ignoring game {}: team listed against itself", outcome.game_id);
            continue;
        }

        let division_game = records[h].same_division(&records[a]);
        let conference_game = records[h].same_conference(&records[a]);
        let home_result = outcome.won_by(outcome.home_team_id);
        let away_result = outcome.won_by(outcome.away_team_id);

        for (idx, result, is_home) in [(h, home_result, true), (a, away_result, false)] {
            let rec = &mut records[idx];
            rec.overall.record(result);
            if is_home {
                rec.home.record(result);
            } else {
                rec.away.record(result);
            }
            if division_game {
                rec.division.record(result);
            }
            if conference_game {
                rec.conference.record(result);
            }
        }

        if outcome.has_real_scores {
            let home_score = outcome.home_score as i64;
            let away_score = outcome.away_score as i64;
            records[h].points_for += home_score;
            records[h].points_against += away_score;
            records[h].games_with_scores += 1;
            records[a].points_for += away_score;
            records[a].points_against += home_score;
            records[a].games_with_scores += 1;
        }
    }

    for rec in &mut records {
        rec.win_pct = overall_win_pct(&rec.overall);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: TeamId, conference: &str, division: &str) -> Team {
        Team {
            id,
            city: format!("City {id}"),
            name: format!("Team {id}"),
            abbreviation: format!("T{id}"),
            conference: conference.into(),
            division: division.into(),
            primary_color: String::new(),
            secondary_color: String::new(),
            logo_url: None,
        }
    }

    fn outcome(id: i64, home: TeamId, away: TeamId, hs: i32, aws: i32, real: bool) -> GameOutcome {
        GameOutcome {
            game_id: id,
            home_team_id: home,
            away_team_id: away,
            home_score: hs,
            away_score: aws,
            has_real_scores: real,
        }
    }

    #[test]
    fn win_pct_formulas() {
        let s = Split { wins: 10, losses: 6, ties: 1 };
        assert!((s.pct(Sport::Nfl) - 10.5 / 17.0).abs() < 1e-12);
        assert_eq!(Split { wins: 17, losses: 0, ties: 0 }.pct(Sport::Nfl), 1.0);
        assert_eq!(Split { wins: 0, losses: 0, ties: 17 }.pct(Sport::Nfl), 0.5);
        assert_eq!(Split::default().pct(Sport::Nfl), NO_GAMES_PCT);
        assert_eq!(Split::default().pct(Sport::Nba), 0.0);
        assert_eq!(overall_win_pct(&Split::default()), NO_GAMES_PCT);
    }

    #[test]
    fn splits_by_venue_division_and_conference() {
        let teams = vec![
            team(1, "AFC", "East"),
            team(2, "AFC", "East"),
            team(3, "AFC", "West"),
            team(4, "NFC", "East"),
        ];
        let outs = vec![
            outcome(1, 1, 2, 20, 10, true), // division game
            outcome(2, 3, 1, 7, 14, true),  // conference, not division
            outcome(3, 4, 1, 3, 3, true),   // interconference tie
        ];
        let recs = aggregate_records(&teams, &outs);
        let t1 = &recs[0];
        assert_eq!(t1.overall, Split { wins: 2, losses: 0, ties: 1 });
        assert_eq!(t1.home, Split { wins: 1, losses: 0, ties: 0 });
        assert_eq!(t1.away, Split { wins: 1, losses: 0, ties: 1 });
        assert_eq!(t1.division, Split { wins: 1, losses: 0, ties: 0 });
        assert_eq!(t1.conference, Split { wins: 2, losses: 0, ties: 0 });
        assert_eq!((t1.points_for, t1.points_against), (37, 20));
        assert!((t1.win_pct - 2.5 / 3.0).abs() < 1e-12);

        let t4 = &recs[3];
        assert_eq!(t4.overall, Split { wins: 0, losses: 0, ties: 1 });
        assert_eq!(t4.conference.games(), 0);
    }

    #[test]
    fn same_division_name_in_other_conference_is_not_a_division_game() {
        let teams = vec![team(1, "AFC", "East"), team(2, "NFC", "East")];
        let recs = aggregate_records(&teams, &[outcome(1, 1, 2, 1, 0, true)]);
        assert_eq!(recs[0].division.games(), 0);
        assert_eq!(recs[0].conference.games(), 0);
    }

    #[test]
    fn synthesized_scores_do_not_touch_points() {
        let teams = vec![team(1, "East", "Atlantic"), team(2, "East", "Atlantic")];
        let recs = aggregate_records(&teams, &[outcome(1, 1, 2, 1, 0, false)]);
        assert_eq!(recs[0].overall.wins, 1);
        assert_eq!(recs[0].points_for, 0);
        assert_eq!(recs[0].games_with_scores, 0);
    }

    #[test]
    fn team_without_games_gets_sentinel_and_unknown_teams_are_ignored() {
        let teams = vec![team(1, "AFC", "East"), team(2, "AFC", "East"), team(3, "AFC", "East")];
        let recs = aggregate_records(&teams, &[outcome(1, 1, 2, 1, 0, true), outcome(2, 1, 77, 1, 0, true)]);
        assert_eq!(recs[0].overall.games(), 1);
        assert_eq!(recs[2].win_pct, NO_GAMES_PCT);
    }

    #[test]
    fn wins_equal_losses_across_a_closed_set() {
        let teams: Vec<Team> = (1..=4).map(|i| team(i, "AFC", "North")).collect();
        let outs = vec![
            outcome(1, 1, 2, 10, 3, true),
            outcome(2, 3, 4, 10, 13, true),
            outcome(3, 1, 3, 0, 1, false),
            outcome(4, 2, 4, 6, 6, true),
        ];
        let recs = aggregate_records(&teams, &outs);
        let wins: u32 = recs.iter().map(|r| r.overall.wins).sum();
        let losses: u32 = recs.iter().map(|r| r.overall.losses).sum();
        let ties: u32 = recs.iter().map(|r| r.overall.ties).sum();
        assert_eq!(wins, losses);
        assert_eq!(ties, 2);
    }

    #[test]
    fn games_back_counts_ties_as_halves() {
        let mut leader = TeamRecord::new(team(1, "AFC", "East"));
        leader.overall = Split { wins: 10, losses: 5, ties: 0 };
        let mut chaser = TeamRecord::new(team(2, "AFC", "East"));
        chaser.overall = Split { wins: 8, losses: 7, ties: 0 };
        assert_eq!(games_back(&leader, &chaser), 2.0);
        assert_eq!(games_back(&leader, &leader), 0.0);

        leader.overall = Split { wins: 10, losses: 5, ties: 2 };
        chaser.overall = Split { wins: 9, losses: 6, ties: 2 };
        assert_eq!(games_back(&leader, &chaser), 1.0);

        chaser.overall = Split { wins: 9, losses: 5, ties: 3 };
        assert_eq!(games_back(&leader, &chaser), 0.5);
    }
}
