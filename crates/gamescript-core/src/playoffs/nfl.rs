// NFL bracket: seven teams per conference, the top seed idle in the wild
// card round, reseeding after every round.

use super::{final_pairing, reseed, winners_of, Decided, Pairing, PlayoffField};
use crate::error::ScenarioError;

pub const WILD_CARD: u32 = 1;
pub const DIVISIONAL: u32 = 2;
pub const CONFERENCE_CHAMPIONSHIP: u32 = 3;
pub const SUPER_BOWL: u32 = 4;

/// Wild card slots per conference as (higher seed, lower seed).
const WILD_CARD_SLOTS: [(u32, u32); 3] = [(2, 7), (3, 6), (4, 5)];

/// Seeds 2-7 of each conference in three games; seed 1 has a bye.
pub fn wild_card_round(field: &PlayoffField) -> Result<Vec<Pairing>, ScenarioError> {
    let mut pairings = Vec::new();
    for conference in &field.conferences {
        for (order, (high, low)) in WILD_CARD_SLOTS.iter().enumerate() {
            pairings.push(Pairing::new(
                WILD_CARD,
                order as u32 + 1,
                Some(conference.name.clone()),
                conference.seeded(*high)?,
                conference.seeded(*low)?,
            ));
        }
    }
    Ok(pairings)
}

/// Pairings for `round` (2-4) from the frozen field and every decided slot of
/// earlier rounds.
pub fn next_round(round: u32, field: &PlayoffField, decided: &[Decided]) -> Result<Vec<Pairing>, ScenarioError> {
    match round {
        DIVISIONAL => {
            let mut pairings = Vec::new();
            for conference in &field.conferences {
                let mut teams = winners_of(decided, WILD_CARD, Some(&conference.name));
                if teams.len() != WILD_CARD_SLOTS.len() {
                    return Err(ScenarioError::BracketShape(format!(
                        "{} has {} wild card winners, expected {}",
                        conference.name,
                        teams.len(),
                        WILD_CARD_SLOTS.len()
                    )));
                }
                teams.push(conference.seeded(1)?);
                pairings.extend(reseed(DIVISIONAL, &conference.name, teams));
            }
            Ok(pairings)
        }
        CONFERENCE_CHAMPIONSHIP => {
            let mut pairings = Vec::new();
            for conference in &field.conferences {
                let teams = winners_of(decided, DIVISIONAL, Some(&conference.name));
                if teams.len() != 2 {
                    return Err(ScenarioError::BracketShape(format!(
                        "{} has {} divisional winners, expected 2",
                        conference.name,
                        teams.len()
                    )));
                }
                pairings.extend(reseed(CONFERENCE_CHAMPIONSHIP, &conference.name, teams));
            }
            Ok(pairings)
        }
        SUPER_BOWL => {
            let champions: Vec<_> = field
                .conferences
                .iter()
                .flat_map(|c| winners_of(decided, CONFERENCE_CHAMPIONSHIP, Some(&c.name)))
                .collect();
            Ok(vec![final_pairing(SUPER_BOWL, field, &champions)?])
        }
        _ => Err(ScenarioError::InvalidRound {
            round,
            reason: "the NFL bracket has rounds 1 to 4".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playoffs::{ConferenceField, FieldEntry};

    /// Two conferences; AFC teams are 1-7, NFC teams 11-17, seed = id % 10.
    fn field() -> PlayoffField {
        let conference = |name: &str, base: i64| ConferenceField {
            name: name.into(),
            entries: (1..=7)
                .map(|seed| FieldEntry {
                    seed,
                    team_id: base + seed as i64,
                    win_pct: 1.0 - seed as f64 / 10.0 - base as f64 / 100.0,
                })
                .collect(),
        };
        PlayoffField {
            conferences: vec![conference("AFC", 0), conference("NFC", 10)],
        }
    }

    fn pick_all(pairings: &[Pairing], pick: impl Fn(&Pairing) -> i64) -> Vec<Decided> {
        pairings.iter().filter_map(|p| p.decide(pick(p))).collect()
    }

    fn teams(p: &Pairing) -> (i64, i64) {
        (p.higher.team_id, p.lower.team_id)
    }

    #[test]
    fn wild_card_pairs_two_through_seven() {
        let round = wild_card_round(&field()).unwrap();
        assert_eq!(round.len(), 6);
        let afc: Vec<(i64, i64)> = round
            .iter()
            .filter(|p| p.conference.as_deref() == Some("AFC"))
            .map(teams)
            .collect();
        assert_eq!(afc, vec![(2, 7), (3, 6), (4, 5)]);
        assert_eq!(round[2].order, 3);
        assert!(round.iter().all(|p| !p.involves(1) && !p.involves(11)));
    }

    #[test]
    fn divisional_top_seed_meets_lowest_survivor() {
        let s = field();
        let wc = wild_card_round(&s).unwrap();
        // Underdogs 7 and 6 win in the AFC; favourites win in the NFC.
        let decided = pick_all(&wc, |p| if p.higher.seed == 4 { p.higher.team_id } else { p.lower.team_id });
        let div = next_round(DIVISIONAL, &s, &decided).unwrap();
        let afc: Vec<(i64, i64)> = div
            .iter()
            .filter(|p| p.conference.as_deref() == Some("AFC"))
            .map(teams)
            .collect();
        assert_eq!(afc, vec![(1, 7), (4, 6)]);
    }

    #[test]
    fn full_bracket_reaches_super_bowl() {
        let s = field();
        let mut decided = pick_all(&wild_card_round(&s).unwrap(), |p| p.higher.team_id);
        for round in DIVISIONAL..=CONFERENCE_CHAMPIONSHIP {
            let pairings = next_round(round, &s, &decided).unwrap();
            decided.extend(pick_all(&pairings, |p| p.higher.team_id));
        }
        let sb = next_round(SUPER_BOWL, &s, &decided).unwrap();
        assert_eq!(sb.len(), 1);
        assert_eq!(sb[0].conference, None);
        // Both champions are 1 seeds; the AFC's has the better record.
        assert_eq!(teams(&sb[0]), (1, 11));
    }

    #[test]
    fn missing_winners_is_a_shape_error() {
        let s = field();
        let err = next_round(DIVISIONAL, &s, &[]).unwrap_err();
        assert!(matches!(err, ScenarioError::BracketShape(_)));
        assert!(matches!(
            next_round(5, &s, &[]),
            Err(ScenarioError::InvalidRound { round: 5, .. })
        ));
    }

    #[test]
    fn short_conference_cannot_seed() {
        let mut s = field();
        s.conferences[0].entries.truncate(6);
        assert!(matches!(wild_card_round(&s), Err(ScenarioError::BracketShape(_))));
    }
}
