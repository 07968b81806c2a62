// Shared fixtures for the integration tests: full NFL and NBA leagues with
// single round-robin schedules in which the lower team ID always wins.

#![allow(dead_code)]

use gamescript_core::db::Database;
use gamescript_core::model::{GameFact, Scenario, SeasonId, Sport, Team, TeamId};

pub const NFL_SEASON: SeasonId = 2024;
pub const NBA_SEASON: SeasonId = 2025;

pub fn team(id: TeamId, conference: &str, division: &str) -> Team {
    Team {
        id,
        city: format!("City {id}"),
        name: format!("Team {id}"),
        abbreviation: format!("T{id:02}"),
        conference: conference.to_string(),
        division: division.to_string(),
        primary_color: String::new(),
        secondary_color: String::new(),
        logo_url: None,
    }
}

/// 32 teams. AFC is 1-16, NFC 17-32; each conference has East, North, South
/// and West divisions of four consecutive IDs.
pub fn nfl_teams() -> Vec<Team> {
    let divisions = ["East", "North", "South", "West"];
    (1..=32)
        .map(|id| {
            let conference = if id <= 16 { "AFC" } else { "NFC" };
            let division = divisions[((id - 1) % 16 / 4) as usize];
            team(id, conference, division)
        })
        .collect()
}

/// 30 teams. Eastern is 1-15, Western 16-30, three divisions of five each.
pub fn nba_teams() -> Vec<Team> {
    let east = ["Atlantic", "Central", "Southeast"];
    let west = ["Northwest", "Pacific", "Southwest"];
    (1..=30)
        .map(|id| {
            let slot = ((id - 1) % 15 / 5) as usize;
            if id <= 15 {
                team(id, "Eastern", east[slot])
            } else {
                team(id, "Western", west[slot])
            }
        })
        .collect()
}

/// Every pair meets once. The lower ID wins 24-17. Home team alternates so
/// home/away splits are not one-sided. Game IDs start at `first_id`.
pub fn round_robin(teams: &[Team], first_id: i64) -> Vec<GameFact> {
    let mut games = Vec::new();
    let mut id = first_id;
    for (i, a) in teams.iter().enumerate() {
        for b in &teams[i + 1..] {
            let (home, away) = if (a.id + b.id) % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            let (home_score, away_score) = if home < away { (24, 17) } else { (17, 24) };
            games.push(GameFact {
                id,
                week: Some(((id - first_id) % 17 + 1) as u32),
                home_team_id: home,
                away_team_id: away,
                home_score: Some(home_score),
                away_score: Some(away_score),
                is_final: true,
            });
            id += 1;
        }
    }
    games
}

/// Mark the last `n` games unplayed.
pub fn leave_unplayed(games: &mut [GameFact], n: usize) {
    let len = games.len();
    for game in &mut games[len - n..] {
        game.home_score = None;
        game.away_score = None;
        game.is_final = false;
    }
}

pub fn nfl_games() -> Vec<GameFact> {
    round_robin(&nfl_teams(), 1)
}

pub fn nba_games() -> Vec<GameFact> {
    round_robin(&nba_teams(), 10_001)
}

/// In-memory database holding one season.
pub fn seeded_db(season_id: SeasonId, teams: &[Team], games: &[GameFact]) -> Database {
    let db = Database::open(":memory:").expect("in-memory database");
    db.import_season(season_id, teams, games).expect("season import");
    db
}

pub fn nfl_db() -> (Database, Scenario) {
    let db = seeded_db(NFL_SEASON, &nfl_teams(), &nfl_games());
    let scenario = db
        .create_scenario("nfl test", Sport::Nfl, NFL_SEASON)
        .expect("scenario");
    (db, scenario)
}

pub fn nba_db() -> (Database, Scenario) {
    let db = seeded_db(NBA_SEASON, &nba_teams(), &nba_games());
    let scenario = db
        .create_scenario("nba test", Sport::Nba, NBA_SEASON)
        .expect("scenario");
    (db, scenario)
}
