// Division orders, division winners, conference seeds and games back.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::outcome::GameOutcome;
use super::records::{games_back, TeamRecord};
use super::tiebreak::{Level, TiebreakContext};
use super::{ConferenceStandings, PlayoffSeed};
use crate::model::{Sport, TeamId};

/// Ranked team IDs for one conference, before records are attached.
struct ConferenceOrder {
    name: String,
    divisions: BTreeMap<String, Vec<TeamId>>,
    seeds: Vec<TeamId>,
}

/// Build every conference's standings. Conferences and divisions come from
/// the roster itself and are returned sorted by name.
pub fn assemble_conferences(
    sport: Sport,
    records: &[TeamRecord],
    outcomes: &[GameOutcome],
) -> Vec<ConferenceStandings> {
    let orders = rank_conferences(sport, records, outcomes);

    let by_id: HashMap<TeamId, &TeamRecord> = records.iter().map(|r| (r.id(), r)).collect();
    let winners: HashSet<TeamId> = orders
        .iter()
        .flat_map(|c| c.divisions.values())
        .filter_map(|order| order.first().copied())
        .collect();

    orders
        .into_iter()
        .map(|order| build_conference(order, &by_id, &winners))
        .collect()
}

fn rank_conferences(sport: Sport, records: &[TeamRecord], outcomes: &[GameOutcome]) -> Vec<ConferenceOrder> {
    let mut layout: BTreeMap<&str, BTreeMap<&str, Vec<TeamId>>> = BTreeMap::new();
    for rec in records {
        layout
            .entry(rec.team.conference.as_str())
            .or_default()
            .entry(rec.team.division.as_str())
            .or_default()
            .push(rec.id());
    }

    let mut ctx = TiebreakContext::new(sport, records, outcomes);

    let mut orders: Vec<ConferenceOrder> = layout
        .iter()
        .map(|(conference, divisions)| ConferenceOrder {
            name: conference.to_string(),
            divisions: divisions
                .iter()
                .map(|(division, ids)| (division.to_string(), ctx.rank(ids, Level::Division)))
                .collect(),
            seeds: Vec::new(),
        })
        .collect();

    let winners: Vec<TeamId> = orders
        .iter()
        .flat_map(|c| c.divisions.values())
        .filter_map(|order| order.first().copied())
        .collect();
    ctx.set_division_winners(winners.iter().copied());

    for order in &mut orders {
        let members: Vec<TeamId> = order.divisions.values().flatten().copied().collect();
        order.seeds = if sport.seeds_division_winners_first() {
            let (leaders, rest): (Vec<TeamId>, Vec<TeamId>) =
                members.into_iter().partition(|id| winners.contains(id));
            let mut seeds = ctx.rank(&leaders, Level::Conference);
            seeds.extend(ctx.rank(&rest, Level::Conference));
            seeds
        } else {
            ctx.rank(&members, Level::Conference)
        };
        debug!("{} seeds: {:?}", order.name, order.seeds);
    }

    orders
}

fn build_conference(
    order: ConferenceOrder,
    by_id: &HashMap<TeamId, &TeamRecord>,
    winners: &HashSet<TeamId>,
) -> ConferenceStandings {
    let finished = |id: &TeamId| -> Option<TeamRecord> {
        by_id.get(id).map(|r| {
            let mut rec = (*r).clone();
            rec.is_division_winner = winners.contains(id);
            rec
        })
    };

    let leader = order.seeds.first().and_then(|id| by_id.get(id)).copied();
    let conference_gb = |rec: &mut TeamRecord| {
        rec.conference_games_back = leader.map_or(0.0, |l| games_back(l, rec));
    };

    let mut divisions = BTreeMap::new();
    for (name, ids) in &order.divisions {
        let division_leader = ids.first().and_then(|id| by_id.get(id)).copied();
        let teams: Vec<TeamRecord> = ids
            .iter()
            .filter_map(finished)
            .map(|mut rec| {
                rec.division_games_back = division_leader.map_or(0.0, |l| games_back(l, &rec));
                conference_gb(&mut rec);
                rec
            })
            .collect();
        divisions.insert(name.clone(), teams);
    }

    // Seeds reuse the division-adjusted records so games back travels with them.
    let adjusted: HashMap<TeamId, &TeamRecord> = divisions.values().flatten().map(|r| (r.id(), r)).collect();
    let playoff_seeds = order
        .seeds
        .iter()
        .filter_map(|id| adjusted.get(id))
        .enumerate()
        .map(|(i, rec)| PlayoffSeed {
            seed: i as u32 + 1,
            team: (*rec).clone(),
            is_division_winner: rec.is_division_winner,
        })
        .collect();

    ConferenceStandings {
        name: order.name,
        divisions,
        playoff_seeds,
    }
}
