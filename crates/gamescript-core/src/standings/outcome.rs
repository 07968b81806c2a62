// Merge real results with a scenario's picks into one outcome per game.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScenarioError;
use crate::model::{GameFact, GameId, Pick, Sport, TeamId};

/// The definitive result of one game inside a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub game_id: GameId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: i32,
    pub away_score: i32,
    /// False when the score was synthesized from a winner-only pick (1-0).
    /// Synthesized scores never feed points for/against.
    pub has_real_scores: bool,
}

impl GameOutcome {
    /// Winning team, or `None` for a tie.
    pub fn winner(&self) -> Option<TeamId> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(self.home_team_id),
            std::cmp::Ordering::Less => Some(self.away_team_id),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    /// The other participant, if `team_id` played in this game.
    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if self.home_team_id == team_id {
            Some(self.away_team_id)
        } else if self.away_team_id == team_id {
            Some(self.home_team_id)
        } else {
            None
        }
    }

    /// Result from `team_id`'s point of view: `Some(true)` win, `Some(false)`
    /// loss, `None` for a tie or a game the team did not play.
    pub fn won_by(&self, team_id: TeamId) -> Option<bool> {
        if !self.involves(team_id) {
            return None;
        }
        self.winner().map(|w| w == team_id)
    }
}

/// Resolve one game against its (optional) pick.
///
/// Priority: a pick with both predicted scores, then a winner-only pick
/// (synthesized 1-0), then a final real result. Returns `Ok(None)` when
/// nothing is known about the game yet. A pick naming a team that did not
/// play, or a level score in a league without ties, is `InvalidPick`.
pub fn resolve_outcome(
    game: &GameFact,
    pick: Option<&Pick>,
    sport: Sport,
) -> Result<Option<GameOutcome>, ScenarioError> {
    let outcome = |home_score, away_score, has_real_scores| GameOutcome {
        game_id: game.id,
        home_team_id: game.home_team_id,
        away_team_id: game.away_team_id,
        home_score,
        away_score,
        has_real_scores,
    };

    if let Some(pick) = pick {
        if let (Some(home), Some(away)) = (pick.predicted_home_score, pick.predicted_away_score) {
            if home == away && !sport.allows_ties() {
                return Err(ScenarioError::invalid_pick(
                    pick.picked_team_id.unwrap_or_default(),
                    format!("game {} (level score in a league without ties)", game.id),
                ));
            }
            return Ok(Some(outcome(home, away, true)));
        }

        if let Some(team_id) = pick.picked_team_id {
            return if team_id == game.home_team_id {
                Ok(Some(outcome(1, 0, false)))
            } else if team_id == game.away_team_id {
                Ok(Some(outcome(0, 1, false)))
            } else {
                Err(ScenarioError::invalid_pick(team_id, format!("game {}", game.id)))
            };
        }
    }

    match (game.is_final, game.home_score, game.away_score) {
        (true, Some(home), Some(away)) => Ok(Some(outcome(home, away, true))),
        _ => Ok(None),
    }
}

/// Resolve a whole season. Games with no result and no pick are left out;
/// games with a malformed pick are skipped with a warning.
pub fn resolve_outcomes(games: &[GameFact], picks: &[Pick], sport: Sport) -> Vec<GameOutcome> {
    let picks_by_game: HashMap<GameId, &Pick> = picks.iter().map(|p| (p.game_id, p)).collect();

    games
        .iter()
        .filter_map(|game| {
            match resolve_outcome(game, picks_by_game.get(&game.id).copied(), sport) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("skipping game {}: {}", game.id, e);
                    None
                }
            }
        })
        .collect()
}
