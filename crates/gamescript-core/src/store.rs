// Collaborator interfaces the standings pipeline and bracket engine read
// from and write to. `db::Database` implements both.

use anyhow::Result;

use crate::model::{GameFact, Pick, Scenario, ScenarioId, SeasonId, Sport, Team};
use crate::playoffs::{
    BracketPick, BracketSlot, Matchup, Pairing, PlayoffField, PlayoffState, PlayoffStateId, Series,
    SlotFormat,
};

/// Read access to seasons and scenarios.
pub trait SeasonSource {
    fn load_teams(&self, season_id: SeasonId) -> Result<Vec<Team>>;
    fn list_games(&self, season_id: SeasonId) -> Result<Vec<GameFact>>;
    fn list_picks(&self, scenario_id: ScenarioId) -> Result<Vec<Pick>>;
    fn scenario(&self, scenario_id: ScenarioId) -> Result<Option<Scenario>>;
}

/// Durable bracket state.
pub trait BracketStore {
    fn playoff_state(&self, scenario_id: ScenarioId) -> Result<Option<PlayoffState>>;

    /// Fetch the scenario's state, creating a disabled one at round 0 if it
    /// does not exist yet.
    fn load_or_create_playoff_state(
        &self,
        scenario_id: ScenarioId,
        sport: Sport,
        season_id: SeasonId,
    ) -> Result<PlayoffState>;

    /// Matchups of one round, or of every round when `round` is `None`,
    /// ordered by round, conference and order.
    fn list_matchups(&self, state_id: PlayoffStateId, round: Option<u32>) -> Result<Vec<Matchup>>;

    /// Series of one round, or of every round when `round` is `None`.
    fn list_series(&self, state_id: PlayoffStateId, round: Option<u32>) -> Result<Vec<Series>>;

    fn matchup(&self, state_id: PlayoffStateId, matchup_id: i64) -> Result<Option<Matchup>>;
    fn series(&self, state_id: PlayoffStateId, series_id: i64) -> Result<Option<Series>>;

    /// The field frozen by `start_bracket`. Empty if the bracket was never
    /// started.
    fn playoff_field(&self, state_id: PlayoffStateId) -> Result<PlayoffField>;

    /// Atomically freeze `field`, replace every round with `pairings` as
    /// round 1, then set the state to enabled at round 1.
    fn start_bracket(
        &self,
        state_id: PlayoffStateId,
        field: &PlayoffField,
        pairings: &[Pairing],
        format: SlotFormat,
    ) -> Result<()>;

    /// Atomically replace `round` and everything after it with `pairings`,
    /// then set the state to enabled at `round`.
    fn persist_round(
        &self,
        state_id: PlayoffStateId,
        round: u32,
        pairings: &[Pairing],
        format: SlotFormat,
    ) -> Result<()>;

    /// Atomically delete every slot after `round` and set the current round
    /// back to `round`.
    fn delete_rounds_after(&self, state_id: PlayoffStateId, round: u32) -> Result<()>;

    /// Atomically delete every round after `round`, reset the current round
    /// to `round`, then write `pick` to `slot`.
    fn save_bracket_pick(
        &self,
        state_id: PlayoffStateId,
        round: u32,
        slot: BracketSlot,
        pick: &BracketPick,
    ) -> Result<()>;
}
