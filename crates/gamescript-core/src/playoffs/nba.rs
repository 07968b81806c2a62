// NBA bracket: a two-stage play-in for seeds 7-10, then four best-of-seven
// rounds with reseeding.

use super::{final_pairing, reseed, winners_of, ConferenceField, Decided, Pairing, PlayoffField, SeededTeam};
use crate::error::ScenarioError;

pub const PLAY_IN_A: u32 = 1;
pub const PLAY_IN_B: u32 = 2;
pub const QUARTERFINALS: u32 = 3;
pub const SEMIFINALS: u32 = 4;
pub const CONFERENCE_FINALS: u32 = 5;
pub const FINALS: u32 = 6;

/// Play-in slot orders.
const SEVEN_EIGHT: u32 = 1;
const NINE_TEN: u32 = 2;

/// 7 v 8 and 9 v 10 in every conference.
pub fn play_in_round(field: &PlayoffField) -> Result<Vec<Pairing>, ScenarioError> {
    let mut pairings = Vec::new();
    for conference in &field.conferences {
        let name = Some(conference.name.clone());
        pairings.push(Pairing::new(
            PLAY_IN_A,
            SEVEN_EIGHT,
            name.clone(),
            conference.seeded(7)?,
            conference.seeded(8)?,
        ));
        pairings.push(Pairing::new(
            PLAY_IN_A,
            NINE_TEN,
            name,
            conference.seeded(9)?,
            conference.seeded(10)?,
        ));
    }
    Ok(pairings)
}

fn play_in_slot<'a>(decided: &'a [Decided], conference: &str, order: u32) -> Result<&'a Decided, ScenarioError> {
    decided
        .iter()
        .find(|d| {
            d.pairing.round == PLAY_IN_A
                && d.pairing.order == order
                && d.pairing.conference.as_deref() == Some(conference)
        })
        .ok_or_else(|| ScenarioError::BracketShape(format!("{conference} play-in game {order} has no winner")))
}

fn play_in_final_winner(decided: &[Decided], conference: &str) -> Result<SeededTeam, ScenarioError> {
    let winners = winners_of(decided, PLAY_IN_B, Some(conference));
    winners
        .first()
        .copied()
        .ok_or_else(|| ScenarioError::BracketShape(format!("{conference} play-in final has no winner")))
}

fn quarterfinal_field(conference: &ConferenceField, decided: &[Decided]) -> Result<Vec<SeededTeam>, ScenarioError> {
    let mut entrants = (1..=6)
        .map(|seed| conference.seeded(seed))
        .collect::<Result<Vec<_>, _>>()?;
    let seventh = play_in_slot(decided, &conference.name, SEVEN_EIGHT)?.winner;
    let eighth = play_in_final_winner(decided, &conference.name)?;
    entrants.push(SeededTeam {
        team_id: seventh.team_id,
        seed: 7,
    });
    entrants.push(SeededTeam {
        team_id: eighth.team_id,
        seed: 8,
    });
    Ok(entrants)
}

fn expect_winners(conference: &str, round: u32, teams: &[SeededTeam], expected: usize) -> Result<(), ScenarioError> {
    if teams.len() == expected {
        Ok(())
    } else {
        Err(ScenarioError::BracketShape(format!(
            "{conference} has {} round {round} winners, expected {expected}",
            teams.len()
        )))
    }
}

/// Pairings for `round` (2-6) from the frozen field and every decided slot of
/// earlier rounds.
pub fn next_round(round: u32, field: &PlayoffField, decided: &[Decided]) -> Result<Vec<Pairing>, ScenarioError> {
    let mut pairings = Vec::new();
    match round {
        PLAY_IN_B => {
            for conference in &field.conferences {
                let seven_eight = play_in_slot(decided, &conference.name, SEVEN_EIGHT)?;
                let nine_ten = play_in_slot(decided, &conference.name, NINE_TEN)?;
                pairings.push(Pairing::new(
                    PLAY_IN_B,
                    1,
                    Some(conference.name.clone()),
                    seven_eight.loser,
                    nine_ten.winner,
                ));
            }
        }
        QUARTERFINALS => {
            for conference in &field.conferences {
                let entrants = quarterfinal_field(conference, decided)?;
                pairings.extend(reseed(QUARTERFINALS, &conference.name, entrants));
            }
        }
        SEMIFINALS | CONFERENCE_FINALS => {
            let expected = if round == SEMIFINALS { 4 } else { 2 };
            for conference in &field.conferences {
                let teams = winners_of(decided, round - 1, Some(&conference.name));
                expect_winners(&conference.name, round - 1, &teams, expected)?;
                pairings.extend(reseed(round, &conference.name, teams));
            }
        }
        FINALS => {
            let champions: Vec<SeededTeam> = field
                .conferences
                .iter()
                .flat_map(|c| winners_of(decided, CONFERENCE_FINALS, Some(&c.name)))
                .collect();
            pairings.push(final_pairing(FINALS, field, &champions)?);
        }
        _ => {
            return Err(ScenarioError::InvalidRound {
                round,
                reason: "the NBA bracket has rounds 1 to 6".into(),
            })
        }
    }
    Ok(pairings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playoffs::FieldEntry;

    /// East teams 1-10, West teams 21-30; seed = id - base.
    fn field() -> PlayoffField {
        let conference = |name: &str, base: i64| ConferenceField {
            name: name.into(),
            entries: (1..=10)
                .map(|seed| FieldEntry {
                    seed,
                    team_id: base + seed as i64,
                    win_pct: 0.8 - seed as f64 / 50.0 - base as f64 / 1000.0,
                })
                .collect(),
        };
        PlayoffField {
            conferences: vec![conference("East", 0), conference("West", 20)],
        }
    }

    fn pick_all(pairings: &[Pairing], pick: impl Fn(&Pairing) -> i64) -> Vec<Decided> {
        pairings.iter().filter_map(|p| p.decide(pick(p))).collect()
    }

    fn east(pairings: &[Pairing]) -> Vec<(i64, u32, i64, u32)> {
        pairings
            .iter()
            .filter(|p| p.conference.as_deref() == Some("East"))
            .map(|p| (p.higher.team_id, p.higher.seed, p.lower.team_id, p.lower.seed))
            .collect()
    }

    #[test]
    fn play_in_is_seven_eight_and_nine_ten() {
        let round = play_in_round(&field()).unwrap();
        assert_eq!(round.len(), 4);
        assert_eq!(east(&round), vec![(7, 7, 8, 8), (9, 9, 10, 10)]);
        assert_eq!(round[0].order, 1);
        assert_eq!(round[1].order, 2);
    }

    #[test]
    fn play_in_final_is_loser_of_seven_eight_against_winner_of_nine_ten() {
        let s = field();
        // 8 upsets 7; 10 upsets 9.
        let decided = pick_all(&play_in_round(&s).unwrap(), |p| p.lower.team_id);
        let round = next_round(PLAY_IN_B, &s, &decided).unwrap();
        assert_eq!(east(&round), vec![(7, 7, 10, 10)]);
    }

    #[test]
    fn quarterfinals_seat_play_in_winners_as_seven_and_eight() {
        let s = field();
        let mut decided = pick_all(&play_in_round(&s).unwrap(), |p| p.lower.team_id);
        decided.extend(pick_all(&next_round(PLAY_IN_B, &s, &decided).unwrap(), |p| p.lower.team_id));

        let qf = next_round(QUARTERFINALS, &s, &decided).unwrap();
        assert_eq!(qf.len(), 8);
        // Team 8 won 7 v 8 and plays as the 7 seed; team 10 won the final as the 8.
        assert_eq!(
            east(&qf),
            vec![(1, 1, 10, 8), (2, 2, 8, 7), (3, 3, 6, 6), (4, 4, 5, 5)]
        );
    }

    #[test]
    fn semifinals_reseed_best_against_worst() {
        let s = field();
        let mut decided = pick_all(&play_in_round(&s).unwrap(), |p| p.higher.team_id);
        decided.extend(pick_all(&next_round(PLAY_IN_B, &s, &decided).unwrap(), |p| p.higher.team_id));
        let qf = next_round(QUARTERFINALS, &s, &decided).unwrap();
        // Seeds 1, 7, 3 and 5 advance.
        decided.extend(pick_all(&qf, |p| match p.higher.seed {
            1 | 3 => p.higher.team_id,
            _ => p.lower.team_id,
        }));
        let semis = next_round(SEMIFINALS, &s, &decided).unwrap();
        assert_eq!(east(&semis), vec![(1, 1, 7, 7), (3, 3, 5, 5)]);
    }

    #[test]
    fn finals_cross_conferences() {
        let s = field();
        let mut decided = pick_all(&play_in_round(&s).unwrap(), |p| p.higher.team_id);
        for round in PLAY_IN_B..=CONFERENCE_FINALS {
            let pairings = next_round(round, &s, &decided).unwrap();
            decided.extend(pick_all(&pairings, |p| p.higher.team_id));
        }
        let finals = next_round(FINALS, &s, &decided).unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].conference, None);
        assert_eq!((finals[0].higher.team_id, finals[0].lower.team_id), (1, 21));
    }

    #[test]
    fn conference_short_of_ten_teams_cannot_hold_play_in() {
        let mut s = field();
        s.conferences[1].entries.truncate(9);
        assert!(matches!(play_in_round(&s), Err(ScenarioError::BracketShape(_))));
        assert!(matches!(
            next_round(7, &s, &[]),
            Err(ScenarioError::InvalidRound { round: 7, .. })
        ));
    }
}
