// Reverse-order draft assignment.

use std::cmp::Ordering;

use super::records::TeamRecord;
use super::{ConferenceStandings, DraftPick};
use crate::model::Sport;

/// Worse win percentage first, then worse point differential, then team ID.
fn worst_first(a: &TeamRecord, b: &TeamRecord) -> Ordering {
    a.win_pct
        .total_cmp(&b.win_pct)
        .then_with(|| a.point_differential().cmp(&b.point_differential()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Non-playoff teams take the first picks, worst record first. Playoff teams
/// follow by seed descending, so the lowest seeds draft earliest.
pub fn draft_order(sport: Sport, conferences: &[ConferenceStandings]) -> Vec<DraftPick> {
    let field = sport.playoff_field() as u32;

    let mut outside: Vec<&TeamRecord> = Vec::new();
    let mut playoff: Vec<(u32, &TeamRecord)> = Vec::new();
    for conference in conferences {
        for seed in &conference.playoff_seeds {
            if seed.seed <= field {
                playoff.push((seed.seed, &seed.team));
            } else {
                outside.push(&seed.team);
            }
        }
    }

    outside.sort_by(|a, b| worst_first(a, b));
    playoff.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| worst_first(a, b)));

    outside
        .into_iter()
        .chain(playoff.into_iter().map(|(_, team)| team))
        .enumerate()
        .map(|(i, team)| DraftPick {
            pick: i as u32 + 1,
            team: team.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::Team;
    use crate::standings::records::{overall_win_pct, Split};
    use crate::standings::PlayoffSeed;

    fn record(id: i64, wins: u32, losses: u32, pf: i64, pa: i64) -> TeamRecord {
        let mut rec = TeamRecord::new(Team {
            id,
            city: String::new(),
            name: format!("T{id}"),
            abbreviation: format!("T{id}"),
            conference: "AFC".into(),
            division: "East".into(),
            primary_color: String::new(),
            secondary_color: String::new(),
            logo_url: None,
        });
        rec.overall = Split { wins, losses, ties: 0 };
        rec.win_pct = overall_win_pct(&rec.overall);
        rec.points_for = pf;
        rec.points_against = pa;
        rec
    }

    fn conference(records: Vec<TeamRecord>) -> ConferenceStandings {
        ConferenceStandings {
            name: "AFC".into(),
            divisions: BTreeMap::new(),
            playoff_seeds: records
                .into_iter()
                .enumerate()
                .map(|(i, team)| PlayoffSeed {
                    seed: i as u32 + 1,
                    team,
                    is_division_winner: false,
                })
                .collect(),
        }
    }

    #[test]
    fn worst_non_playoff_record_picks_first() {
        // Seven playoff teams, then a 4-12 (-40) team and a 3-13 (-80) team.
        let mut recs: Vec<TeamRecord> = (1..=7).map(|i| record(i, 12, 4, 300, 200)).collect();
        recs.push(record(8, 4, 12, 260, 300));
        recs.push(record(9, 3, 13, 220, 300));
        let order = draft_order(Sport::Nfl, &[conference(recs)]);

        let ids: Vec<i64> = order.iter().map(|p| p.team.id()).collect();
        assert_eq!(&ids[..2], &[9, 8]);
        // Then seeds 7 down to 1.
        assert_eq!(&ids[2..], &[7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(order[0].pick, 1);
        assert_eq!(order.last().map(|p| p.pick), Some(9));
    }

    #[test]
    fn equal_records_fall_back_to_point_differential_then_id() {
        let mut recs: Vec<TeamRecord> = (1..=7).map(|i| record(i, 12, 4, 300, 200)).collect();
        recs.push(record(10, 5, 11, 200, 250));
        recs.push(record(11, 5, 11, 200, 300));
        recs.push(record(12, 5, 11, 200, 300));
        let order = draft_order(Sport::Nfl, &[conference(recs)]);
        let ids: Vec<i64> = order.iter().take(3).map(|p| p.team.id()).collect();
        assert_eq!(ids, vec![11, 12, 10]);
    }

    #[test]
    fn same_seed_across_conferences_orders_by_record() {
        let east = conference((1..=10).map(|i| record(i, 50, 32, 0, 0)).collect());
        let mut west_records: Vec<TeamRecord> = (11..=20).map(|i| record(i, 50, 32, 0, 0)).collect();
        west_records[9] = record(20, 40, 42, 0, 0);
        let west = conference(west_records);
        let order = draft_order(Sport::Nba, &[east, west]);
        // Both 10 seeds draft first; the weaker one earlier.
        assert_eq!(order[0].team.id(), 20);
        assert_eq!(order[1].team.id(), 10);
        assert_eq!(order.len(), 20);
    }
}
