// Season and pick loading from CSV.
//
// teams.csv: id,city,name,abbreviation,conference,division[,primary_color,secondary_color,logo_url]
// games.csv: id,week,home_team_id,away_team_id,home_score,away_score,is_final
// picks.csv: game_id,picked_team_id,predicted_home_score,predicted_away_score
//
// Empty cells are read as missing values.

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::model::{GameFact, GameId, Pick, ScenarioId, Team, TeamId};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: TeamId,
    #[serde(default)]
    city: String,
    name: String,
    #[serde(default)]
    abbreviation: String,
    conference: String,
    division: String,
    #[serde(default)]
    primary_color: String,
    #[serde(default)]
    secondary_color: String,
    #[serde(default)]
    logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    id: GameId,
    #[serde(default)]
    week: Option<u32>,
    home_team_id: TeamId,
    away_team_id: TeamId,
    #[serde(default)]
    home_score: Option<i32>,
    #[serde(default)]
    away_score: Option<i32>,
    #[serde(default)]
    is_final: bool,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    game_id: GameId,
    #[serde(default)]
    picked_team_id: Option<TeamId>,
    #[serde(default)]
    predicted_home_score: Option<i32>,
    #[serde(default)]
    predicted_away_score: Option<i32>,
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<Team>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut teams: Vec<Team> = Vec::new();
    let mut seen = HashSet::new();
    for result in reader.deserialize::<RawTeam>() {
        match result {
            Ok(raw) => {
                if raw.conference.is_empty() || raw.division.is_empty() {
                    warn!("skipping team {} '{}': missing conference or division", raw.id, raw.name);
                    continue;
                }
                if !seen.insert(raw.id) {
                    warn!("duplicate team id {}, keeping the first row", raw.id);
                    continue;
                }
                teams.push(Team {
                    id: raw.id,
                    city: raw.city,
                    name: raw.name,
                    abbreviation: raw.abbreviation,
                    conference: raw.conference,
                    division: raw.division,
                    primary_color: raw.primary_color,
                    secondary_color: raw.secondary_color,
                    logo_url: raw.logo_url.filter(|u| !u.is_empty()),
                });
            }
            Err(e) => {
                warn!("skipping malformed team row: {}", e);
            }
        }
    }
    Ok(teams)
}

fn load_games_from_reader<R: Read>(rdr: R) -> Result<Vec<GameFact>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut games = Vec::new();
    for result in reader.deserialize::<RawGame>() {
        match result {
            Ok(raw) => {
                if raw.home_team_id == raw.away_team_id {
                    warn!("skipping game {}: team {} plays itself", raw.id, raw.home_team_id);
                    continue;
                }
                games.push(GameFact {
                    id: raw.id,
                    week: raw.week,
                    home_team_id: raw.home_team_id,
                    away_team_id: raw.away_team_id,
                    home_score: raw.home_score,
                    away_score: raw.away_score,
                    is_final: raw.is_final,
                });
            }
            Err(e) => {
                warn!("skipping malformed game row: {}", e);
            }
        }
    }
    Ok(games)
}

fn load_picks_from_reader<R: Read>(rdr: R, scenario_id: ScenarioId) -> Result<Vec<Pick>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut picks = Vec::new();
    for result in reader.deserialize::<RawPick>() {
        match result {
            Ok(raw) => {
                let scored = raw.predicted_home_score.is_some() && raw.predicted_away_score.is_some();
                if raw.picked_team_id.is_none() && !scored {
                    warn!("skipping pick for game {}: no winner or scores", raw.game_id);
                    continue;
                }
                picks.push(Pick {
                    scenario_id,
                    game_id: raw.game_id,
                    picked_team_id: raw.picked_team_id,
                    predicted_home_score: raw.predicted_home_score,
                    predicted_away_score: raw.predicted_away_score,
                });
            }
            Err(e) => {
                warn!("skipping malformed pick row: {}", e);
            }
        }
    }
    Ok(picks)
}

/// Drop games that reference a team outside `teams`.
pub fn retain_known_games(teams: &[Team], games: Vec<GameFact>) -> Vec<GameFact> {
    let known: HashSet<TeamId> = teams.iter().map(|t| t.id).collect();
    games
        .into_iter()
        .filter(|g| {
            let ok = known.contains(&g.home_team_id) && known.contains(&g.away_team_id);
            if !ok {
                warn!(
                    "skipping game {}: unknown team ({} vs {})",
                    g.id, g.away_team_id, g.home_team_id
                );
            }
            ok
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, ImportError> {
    std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> ImportError + '_ {
    move |e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

pub fn load_teams(path: &Path) -> Result<Vec<Team>, ImportError> {
    load_teams_from_reader(open(path)?).map_err(csv_error(path))
}

pub fn load_games(path: &Path) -> Result<Vec<GameFact>, ImportError> {
    load_games_from_reader(open(path)?).map_err(csv_error(path))
}

pub fn load_picks(path: &Path, scenario_id: ScenarioId) -> Result<Vec<Pick>, ImportError> {
    load_picks_from_reader(open(path)?, scenario_id).map_err(csv_error(path))
}

/// Load a season's roster and schedule. Games with unknown teams are dropped.
pub fn load_season(teams_path: &Path, games_path: &Path) -> Result<(Vec<Team>, Vec<GameFact>), ImportError> {
    let teams = load_teams(teams_path)?;
    if teams.is_empty() {
        return Err(ImportError::Validation(format!(
            "{} produced zero valid teams",
            teams_path.display()
        )));
    }
    let games = retain_known_games(&teams, load_games(games_path)?);
    Ok((teams, games))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_csv_with_optional_columns() {
        let csv_data = "\
id,city,name,abbreviation,conference,division,primary_color,secondary_color,logo_url
1,Buffalo,Bills,BUF,AFC,East,#00338D,#C60C30,
2,Miami,Dolphins,MIA,AFC,East,,,https://example.org/mia.png";

        let teams = load_teams_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].abbreviation, "BUF");
        assert_eq!(teams[0].logo_url, None);
        assert_eq!(teams[1].logo_url.as_deref(), Some("https://example.org/mia.png"));
    }

    #[test]
    fn team_csv_minimal_columns() {
        let csv_data = "\
id,name,conference,division
7,Celtics,East,Atlantic";

        let teams = load_teams_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].division, "Atlantic");
        assert!(teams[0].city.is_empty());
    }

    #[test]
    fn bad_team_rows_are_skipped() {
        let csv_data = "\
id,name,conference,division
one,Bills,AFC,East
2,Dolphins,AFC,
3,Jets,AFC,East
3,Jets Again,AFC,East";

        let teams = load_teams_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Jets");
    }

    #[test]
    fn games_read_empty_scores_as_unplayed() {
        let csv_data = "\
id,week,home_team_id,away_team_id,home_score,away_score,is_final
1,1,1,2,24,17,true
2,1,3,4,,,false
3,2,5,5,10,0,true";

        let games = load_games_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].home_score, Some(24));
        assert!(games[0].is_final);
        assert_eq!(games[1].home_score, None);
        assert!(!games[1].is_final);
    }

    #[test]
    fn picks_need_a_winner_or_scores() {
        let csv_data = "\
game_id,picked_team_id,predicted_home_score,predicted_away_score
1,2,,
2,,21,21
3,,,
4,,14,";

        let picks = load_picks_from_reader(csv_data.as_bytes(), 9).unwrap();
        assert_eq!(picks.len(), 2);
        assert!(picks.iter().all(|p| p.scenario_id == 9));
        assert_eq!(picks[0].picked_team_id, Some(2));
        assert_eq!(picks[1].predicted_away_score, Some(21));
    }

    #[test]
    fn games_with_unknown_teams_are_dropped() {
        let teams = load_teams_from_reader("id,name,conference,division\n1,A,X,Y\n2,B,X,Y".as_bytes()).unwrap();
        let games = load_games_from_reader(
            "id,week,home_team_id,away_team_id,home_score,away_score,is_final\n1,1,1,2,,,false\n2,1,1,99,,,false"
                .as_bytes(),
        )
        .unwrap();
        let kept = retain_known_games(&teams, games);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_teams(Path::new("/nonexistent/teams.csv")).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
