// Round-gated bracket state machine.
//
// disabled -> round 1 -> ... -> final round -> completed
//
// Every write holds the scenario's lock for its whole read-check-write
// sequence, and each write lands in the store as one transaction.

use tracing::{debug, info};

use super::{
    nba, nfl, round_name, Bracket, BracketPhase, BracketPick, BracketSlot, BracketSlotView, Decided, Matchup,
    Pairing, PlayoffField, PlayoffState, PlayoffStatus, ScenarioLocks, Series, SlotFormat,
};
use crate::error::ScenarioError;
use crate::model::{Scenario, ScenarioId, SeasonId, Sport, TeamId};
use crate::standings::{compute_scenario_standings, ScenarioSeason, Standings};
use crate::store::{BracketStore, SeasonSource};

pub struct PlayoffBracketGenerator<S> {
    store: S,
    locks: ScenarioLocks,
}

/// A persisted matchup or series.
enum SlotRecord {
    Matchup(Matchup),
    Series(Series),
}

impl SlotRecord {
    fn view(&self) -> &dyn BracketSlotView {
        match self {
            SlotRecord::Matchup(m) => m,
            SlotRecord::Series(s) => s,
        }
    }
}

impl<S: SeasonSource + BracketStore> PlayoffBracketGenerator<S> {
    pub fn new(store: S) -> Self {
        PlayoffBracketGenerator {
            store,
            locks: ScenarioLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn scenario(&self, scenario_id: ScenarioId) -> Result<Scenario, ScenarioError> {
        self.store
            .scenario(scenario_id)?
            .ok_or_else(|| ScenarioError::NotFound(format!("scenario {scenario_id}")))
    }

    fn state(&self, scenario_id: ScenarioId) -> Result<PlayoffState, ScenarioError> {
        self.store
            .playoff_state(scenario_id)?
            .ok_or_else(|| ScenarioError::NotFound(format!("playoff state for scenario {scenario_id}")))
    }

    fn round_slots(&self, state: &PlayoffState, round: u32) -> Result<Vec<SlotRecord>, ScenarioError> {
        let mut slots: Vec<SlotRecord> = self
            .store
            .list_matchups(state.id, Some(round))?
            .into_iter()
            .map(SlotRecord::Matchup)
            .collect();
        slots.extend(
            self.store
                .list_series(state.id, Some(round))?
                .into_iter()
                .map(SlotRecord::Series),
        );
        Ok(slots)
    }

    /// Standings for the scenario.
    pub fn compute_standings(&self, scenario_id: ScenarioId, season_id: SeasonId) -> Result<Standings, ScenarioError> {
        compute_scenario_standings(&self.store, scenario_id, season_id)
    }

    /// Whether every regular-season game has a result or a pick.
    pub fn check_playoff_eligibility(&self, scenario_id: ScenarioId, season_id: SeasonId) -> Result<bool, ScenarioError> {
        let scenario = self.scenario(scenario_id)?;
        Ok(ScenarioSeason::load(&self.store, scenario_id, season_id, scenario.sport)?.is_complete())
    }

    /// Enable playoffs, freeze the playoff field from the standings and seed
    /// round 1. Calling it again re-freezes the field, rebuilds round 1 and
    /// drops every later round.
    pub fn generate_first_round(
        &self,
        scenario_id: ScenarioId,
        season_id: SeasonId,
        sport: Sport,
    ) -> Result<(), ScenarioError> {
        self.locks.with_lock(scenario_id, || -> Result<(), ScenarioError> {
            let scenario = self.scenario(scenario_id)?;
            if scenario.sport != sport {
                return Err(ScenarioError::BracketShape(format!(
                    "scenario {scenario_id} is an {} scenario, not {sport}",
                    scenario.sport
                )));
            }

            let season = ScenarioSeason::load(&self.store, scenario_id, season_id, sport)?;
            if !season.is_complete() {
                return Err(ScenarioError::IncompleteSeason {
                    resolved: season.outcomes.len(),
                    total: season.games.len(),
                });
            }

            let field = PlayoffField::from_standings(&season.standings());
            let pairings = match sport {
                Sport::Nfl => nfl::wild_card_round(&field)?,
                Sport::Nba => nba::play_in_round(&field)?,
            };

            let state = self.store.load_or_create_playoff_state(scenario_id, sport, season_id)?;
            self.store
                .start_bracket(state.id, &field, &pairings, SlotFormat::for_round(sport, 1))?;
            info!(
                "playoffs enabled for scenario {} ({} round 1 slots)",
                scenario_id,
                pairings.len()
            );
            Ok(())
        })
    }

    /// Advance from `current_round` to the next round. Every slot of
    /// `current_round` must be picked; otherwise nothing is written.
    pub fn generate_next_round(&self, scenario_id: ScenarioId, current_round: u32) -> Result<(), ScenarioError> {
        self.locks.with_lock(scenario_id, || -> Result<(), ScenarioError> {
            let state = self.state(scenario_id)?;
            if !state.is_enabled {
                return Err(ScenarioError::InvalidRound {
                    round: current_round,
                    reason: "playoffs are not enabled".into(),
                });
            }
            if current_round != state.current_round {
                return Err(ScenarioError::InvalidRound {
                    round: current_round,
                    reason: format!("the bracket is at round {}", state.current_round),
                });
            }
            if current_round >= state.sport.final_round() {
                return Err(ScenarioError::InvalidRound {
                    round: current_round,
                    reason: "already at the final round".into(),
                });
            }

            let slots = self.round_slots(&state, current_round)?;
            let unpicked = slots.iter().filter(|s| s.view().picked().is_none()).count();
            if slots.is_empty() || unpicked > 0 {
                return Err(ScenarioError::RoundIncomplete {
                    round: current_round,
                    unpicked,
                    total: slots.len(),
                });
            }

            let mut decided: Vec<Decided> = Vec::new();
            for round in 1..=current_round {
                for slot in self.round_slots(&state, round)? {
                    if let Some(d) = slot.view().decided() {
                        decided.push(d);
                    }
                }
            }

            // Seeds come from the field frozen with round 1.
            let field = self.store.playoff_field(state.id)?;
            if field.is_empty() {
                return Err(ScenarioError::BracketShape(format!(
                    "scenario {scenario_id} has no frozen playoff field"
                )));
            }
            let next = current_round + 1;
            let pairings: Vec<Pairing> = match state.sport {
                Sport::Nfl => nfl::next_round(next, &field, &decided)?,
                Sport::Nba => nba::next_round(next, &field, &decided)?,
            };

            self.store
                .persist_round(state.id, next, &pairings, SlotFormat::for_round(state.sport, next))?;
            info!(
                "scenario {} advanced to the {} ({} slots)",
                scenario_id,
                round_name(state.sport, next),
                pairings.len()
            );
            Ok(())
        })
    }

    /// Whether every slot of `round` has a pick. A round with no slots is not
    /// complete.
    pub fn check_round_complete(&self, scenario_id: ScenarioId, round: u32) -> Result<bool, ScenarioError> {
        let state = self.state(scenario_id)?;
        let slots = self.round_slots(&state, round)?;
        Ok(!slots.is_empty() && slots.iter().all(|s| s.view().picked().is_some()))
    }

    /// Drop every round after `round` and move the bracket back to it.
    pub fn invalidate_rounds_after(&self, scenario_id: ScenarioId, round: u32) -> Result<(), ScenarioError> {
        self.locks.with_lock(scenario_id, || -> Result<(), ScenarioError> {
            let state = self.state(scenario_id)?;
            if round >= state.current_round {
                debug!("nothing after round {} for scenario {}", round, scenario_id);
                return Ok(());
            }
            self.store.delete_rounds_after(state.id, round)?;
            info!("scenario {} rounds after {} invalidated", scenario_id, round);
            Ok(())
        })
    }

    /// Record a pick on one slot. Later rounds are dropped first, so they
    /// must be generated again.
    pub fn update_bracket_pick(
        &self,
        scenario_id: ScenarioId,
        slot: BracketSlot,
        pick: BracketPick,
    ) -> Result<(), ScenarioError> {
        self.locks.with_lock(scenario_id, || -> Result<(), ScenarioError> {
            let state = self.state(scenario_id)?;
            let (round, resolved) = match self.find_slot(&state, slot)? {
                SlotRecord::Matchup(m) => (m.pairing.round, resolve_matchup_pick(&m.pairing, pick)?),
                SlotRecord::Series(s) => (s.pairing.round, resolve_series_pick(&s.pairing, s.best_of, pick)?),
            };
            self.store.save_bracket_pick(state.id, round, slot, &resolved)?;
            info!(
                "scenario {} round {} pick {:?} -> {:?}",
                scenario_id, round, slot, resolved.picked_team_id
            );
            Ok(())
        })
    }

    /// Remove the pick on one slot, dropping later rounds.
    pub fn clear_bracket_pick(&self, scenario_id: ScenarioId, slot: BracketSlot) -> Result<(), ScenarioError> {
        self.locks.with_lock(scenario_id, || -> Result<(), ScenarioError> {
            let state = self.state(scenario_id)?;
            let round = self.find_slot(&state, slot)?.view().pairing().round;
            self.store
                .save_bracket_pick(state.id, round, slot, &BracketPick::default())?;
            info!("scenario {} round {} pick {:?} cleared", scenario_id, round, slot);
            Ok(())
        })
    }

    fn find_slot(&self, state: &PlayoffState, slot: BracketSlot) -> Result<SlotRecord, ScenarioError> {
        let found = match slot {
            BracketSlot::Matchup(id) => self.store.matchup(state.id, id)?.map(SlotRecord::Matchup),
            BracketSlot::Series(id) => self.store.series(state.id, id)?.map(SlotRecord::Series),
        };
        found.ok_or_else(|| ScenarioError::NotFound(format!("{slot:?} in scenario {}", state.scenario_id)))
    }

    pub fn playoff_status(&self, scenario_id: ScenarioId, season_id: SeasonId) -> Result<PlayoffStatus, ScenarioError> {
        Ok(PlayoffStatus {
            state: self.store.playoff_state(scenario_id)?,
            can_enable: self.check_playoff_eligibility(scenario_id, season_id)?,
        })
    }

    /// Every persisted round of the scenario's bracket and its phase.
    pub fn bracket(&self, scenario_id: ScenarioId) -> Result<Bracket, ScenarioError> {
        self.locks.with_lock(scenario_id, || -> Result<Bracket, ScenarioError> {
            let Some(state) = self.store.playoff_state(scenario_id)? else {
                return Ok(Bracket {
                    state: None,
                    phase: BracketPhase::Disabled,
                    rounds: Vec::new(),
                    matchups: Vec::new(),
                    series: Vec::new(),
                });
            };
            let mut bracket = Bracket {
                matchups: self.store.list_matchups(state.id, None)?,
                series: self.store.list_series(state.id, None)?,
                phase: BracketPhase::Disabled,
                rounds: Vec::new(),
                state: None,
            };
            bracket.rounds = bracket.summarize(state.sport);
            bracket.phase = phase(&state, &bracket);
            bracket.state = Some(state);
            Ok(bracket)
        })
    }
}

fn phase(state: &PlayoffState, bracket: &Bracket) -> BracketPhase {
    if !state.is_enabled {
        return BracketPhase::Disabled;
    }
    let final_round = state.sport.final_round();
    if state.current_round == final_round {
        let champion = bracket
            .round(final_round)
            .into_iter()
            .find_map(|slot| slot.decided())
            .map(|d| d.winner.team_id);
        if let Some(champion) = champion {
            return BracketPhase::Completed { champion };
        }
    }
    BracketPhase::Round {
        round: state.current_round,
    }
}

fn participant(pairing: &Pairing, team_id: Option<TeamId>, context: &str) -> Result<TeamId, ScenarioError> {
    match team_id {
        Some(t) if pairing.involves(t) => Ok(t),
        Some(t) => Err(ScenarioError::invalid_pick(t, context)),
        None => Err(ScenarioError::invalid_pick(0, format!("{context} (no winner given)"))),
    }
}

/// Single game: predicted scores decide the winner when both are given and
/// must differ.
fn resolve_matchup_pick(pairing: &Pairing, pick: BracketPick) -> Result<BracketPick, ScenarioError> {
    let context = format!("round {} game {}", pairing.round, pairing.order);
    let winner = match (pick.predicted_higher, pick.predicted_lower) {
        (Some(h), Some(l)) if h == l => {
            return Err(ScenarioError::invalid_pick(
                pick.picked_team_id.unwrap_or_default(),
                format!("{context} (level score)"),
            ))
        }
        (Some(h), Some(l)) if h > l => pairing.higher.team_id,
        (Some(_), Some(_)) => pairing.lower.team_id,
        (None, None) => participant(pairing, pick.picked_team_id, &context)?,
        _ => {
            return Err(ScenarioError::invalid_pick(
                pick.picked_team_id.unwrap_or_default(),
                format!("{context} (both scores are needed)"),
            ))
        }
    };
    Ok(BracketPick {
        picked_team_id: Some(winner),
        ..pick
    })
}

/// Best-of-N: the winner needs exactly `best_of / 2 + 1` wins and the loser
/// fewer.
fn resolve_series_pick(pairing: &Pairing, best_of: u32, pick: BracketPick) -> Result<BracketPick, ScenarioError> {
    let context = format!("round {} series {}", pairing.round, pairing.order);
    let needed = best_of / 2 + 1;
    let winner = match (pick.predicted_higher, pick.predicted_lower) {
        (Some(h), Some(l)) if h == needed && l < needed => pairing.higher.team_id,
        (Some(h), Some(l)) if l == needed && h < needed => pairing.lower.team_id,
        (None, None) => participant(pairing, pick.picked_team_id, &context)?,
        (h, l) => {
            return Err(ScenarioError::invalid_pick(
                pick.picked_team_id.unwrap_or_default(),
                format!("{context} (series result {h:?}-{l:?} is not a best-of-{best_of} finish)"),
            ))
        }
    };
    Ok(BracketPick {
        picked_team_id: Some(winner),
        ..pick
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playoffs::SeededTeam;

    fn pairing() -> Pairing {
        Pairing::new(
            3,
            1,
            Some("East".into()),
            SeededTeam { team_id: 10, seed: 1 },
            SeededTeam { team_id: 80, seed: 8 },
        )
    }

    fn pick(team: Option<TeamId>, h: Option<u32>, l: Option<u32>) -> BracketPick {
        BracketPick {
            picked_team_id: team,
            predicted_higher: h,
            predicted_lower: l,
        }
    }

    #[test]
    fn matchup_scores_override_named_winner() {
        let resolved = resolve_matchup_pick(&pairing(), pick(Some(10), Some(17), Some(24))).unwrap();
        assert_eq!(resolved.picked_team_id, Some(80));
        assert_eq!(resolved.predicted_lower, Some(24));
    }

    #[test]
    fn matchup_rejects_level_or_partial_scores_and_outsiders() {
        assert!(resolve_matchup_pick(&pairing(), pick(None, Some(20), Some(20))).is_err());
        assert!(resolve_matchup_pick(&pairing(), pick(Some(10), Some(20), None)).is_err());
        assert!(matches!(
            resolve_matchup_pick(&pairing(), pick(Some(55), None, None)),
            Err(ScenarioError::InvalidPick { team_id: 55, .. })
        ));
        assert!(resolve_matchup_pick(&pairing(), pick(None, None, None)).is_err());
        assert_eq!(
            resolve_matchup_pick(&pairing(), pick(Some(10), None, None)).unwrap().picked_team_id,
            Some(10)
        );
    }

    #[test]
    fn series_wins_must_be_a_real_finish() {
        let p = pairing();
        assert_eq!(
            resolve_series_pick(&p, 7, pick(None, Some(4), Some(2))).unwrap().picked_team_id,
            Some(10)
        );
        assert_eq!(
            resolve_series_pick(&p, 7, pick(Some(10), Some(3), Some(4))).unwrap().picked_team_id,
            Some(80)
        );
        assert!(resolve_series_pick(&p, 7, pick(None, Some(5), Some(2))).is_err());
        assert!(resolve_series_pick(&p, 7, pick(None, Some(4), Some(4))).is_err());
        assert!(resolve_series_pick(&p, 7, pick(None, Some(3), Some(3))).is_err());
        assert!(resolve_series_pick(&p, 7, pick(Some(80), None, None)).is_ok());
    }
}
