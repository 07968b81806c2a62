// Strength of schedule and strength of victory.

use std::collections::HashMap;

use super::outcome::GameOutcome;
use super::records::{Split, TeamRecord};
use crate::model::{Sport, TeamId};

/// Fill `strength_of_schedule` and `strength_of_victory` on every record.
///
/// SOS is the combined record of every opponent faced, one entry per game
/// (an opponent met twice counts twice). SOV is the same over the games the
/// team won. Both use the league's empty-split rule: NFL teams with no
/// qualifying games get the no-games sentinel, NBA teams get 0.
pub fn apply_strength_metrics(records: &mut [TeamRecord], outcomes: &[GameOutcome], sport: Sport) {
    let overall: HashMap<TeamId, Split> = records.iter().map(|r| (r.id(), r.overall)).collect();

    let mut schedule: HashMap<TeamId, Split> = HashMap::new();
    let mut victories: HashMap<TeamId, Split> = HashMap::new();

    for outcome in outcomes {
        let (Some(home), Some(away)) = (
            overall.get(&outcome.home_team_id),
            overall.get(&outcome.away_team_id),
        ) else {
            continue;
        };

        schedule.entry(outcome.home_team_id).or_default().add(away);
        schedule.entry(outcome.away_team_id).or_default().add(home);

        match outcome.winner() {
            Some(w) if w == outcome.home_team_id => {
                victories.entry(w).or_default().add(away);
            }
            Some(w) => {
                victories.entry(w).or_default().add(home);
            }
            None => {}
        }
    }

    for rec in records.iter_mut() {
        let id = rec.id();
        rec.strength_of_schedule = schedule.get(&id).copied().unwrap_or_default().pct(sport);
        rec.strength_of_victory = victories.get(&id).copied().unwrap_or_default().pct(sport);
    }
}
