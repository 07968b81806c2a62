// SQLite persistence layer for seasons, scenarios and brackets.

use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction};

use crate::model::{GameFact, GameId, Pick, Scenario, ScenarioId, SeasonId, Sport, Team};
use crate::playoffs::{
    BracketPick, BracketSlot, ConferenceField, FieldEntry, Matchup, Pairing, PlayoffField, PlayoffState,
    PlayoffStateId, SeededTeam, Series, SlotFormat,
};
use crate::store::{BracketStore, SeasonSource};

/// SQLite-backed storage for teams, games, scenarios, picks and bracket
/// state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS teams (
                id              INTEGER NOT NULL,
                season_id       INTEGER NOT NULL,
                city            TEXT NOT NULL,
                name            TEXT NOT NULL,
                abbreviation    TEXT NOT NULL,
                conference      TEXT NOT NULL,
                division        TEXT NOT NULL,
                primary_color   TEXT NOT NULL DEFAULT '',
                secondary_color TEXT NOT NULL DEFAULT '',
                logo_url        TEXT,
                PRIMARY KEY (season_id, id)
            );

            CREATE TABLE IF NOT EXISTS games (
                id           INTEGER PRIMARY KEY,
                season_id    INTEGER NOT NULL,
                week         INTEGER,
                home_team_id INTEGER NOT NULL,
                away_team_id INTEGER NOT NULL,
                home_score   INTEGER,
                away_score   INTEGER,
                is_final     INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS scenarios (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                name       TEXT NOT NULL,
                sport      TEXT NOT NULL,
                season_id  INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS picks (
                scenario_id          INTEGER NOT NULL REFERENCES scenarios(id) ON DELETE CASCADE,
                game_id              INTEGER NOT NULL REFERENCES games(id),
                picked_team_id       INTEGER,
                predicted_home_score INTEGER,
                predicted_away_score INTEGER,
                PRIMARY KEY (scenario_id, game_id)
            );

            CREATE TABLE IF NOT EXISTS playoff_states (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                scenario_id   INTEGER NOT NULL UNIQUE REFERENCES scenarios(id) ON DELETE CASCADE,
                sport         TEXT NOT NULL,
                season_id     INTEGER NOT NULL,
                current_round INTEGER NOT NULL DEFAULT 0,
                is_enabled    INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS playoff_matchups (
                id                     INTEGER PRIMARY KEY AUTOINCREMENT,
                playoff_state_id       INTEGER NOT NULL REFERENCES playoff_states(id) ON DELETE CASCADE,
                round                  INTEGER NOT NULL,
                slot_order             INTEGER NOT NULL,
                conference             TEXT,
                higher_seed_team_id    INTEGER NOT NULL,
                higher_seed            INTEGER NOT NULL,
                lower_seed_team_id     INTEGER NOT NULL,
                lower_seed             INTEGER NOT NULL,
                picked_team_id         INTEGER,
                predicted_higher_score INTEGER,
                predicted_lower_score  INTEGER
            );

            CREATE TABLE IF NOT EXISTS playoff_series (
                id                    INTEGER PRIMARY KEY AUTOINCREMENT,
                playoff_state_id      INTEGER NOT NULL REFERENCES playoff_states(id) ON DELETE CASCADE,
                round                 INTEGER NOT NULL,
                slot_order            INTEGER NOT NULL,
                conference            TEXT,
                higher_seed_team_id   INTEGER NOT NULL,
                higher_seed           INTEGER NOT NULL,
                lower_seed_team_id    INTEGER NOT NULL,
                lower_seed            INTEGER NOT NULL,
                best_of               INTEGER NOT NULL,
                picked_team_id        INTEGER,
                predicted_higher_wins INTEGER,
                predicted_lower_wins  INTEGER
            );

            CREATE TABLE IF NOT EXISTS playoff_seeds (
                playoff_state_id INTEGER NOT NULL REFERENCES playoff_states(id) ON DELETE CASCADE,
                conference       TEXT NOT NULL,
                seed             INTEGER NOT NULL,
                team_id          INTEGER NOT NULL,
                win_pct          REAL NOT NULL,
                PRIMARY KEY (playoff_state_id, conference, seed)
            );

            CREATE INDEX IF NOT EXISTS idx_games_season ON games(season_id);
            CREATE INDEX IF NOT EXISTS idx_matchups_state_round ON playoff_matchups(playoff_state_id, round);
            CREATE INDEX IF NOT EXISTS idx_series_state_round ON playoff_series(playoff_state_id, round);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Seasons
    // ------------------------------------------------------------------

    /// Insert a team for a season, replacing any existing row.
    pub fn insert_team(&self, season_id: SeasonId, team: &Team) -> Result<()> {
        let conn = self.conn();
        insert_team_row(&conn, season_id, team)
    }

    /// Insert a game, replacing any existing row with the same id.
    pub fn insert_game(&self, season_id: SeasonId, game: &GameFact) -> Result<()> {
        let conn = self.conn();
        insert_game_row(&conn, season_id, game)
    }

    /// Import a whole season in a single transaction.
    pub fn import_season(&self, season_id: SeasonId, teams: &[Team], games: &[GameFact]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for team in teams {
            insert_team_row(&tx, season_id, team)?;
        }
        for game in games {
            insert_game_row(&tx, season_id, game)?;
        }
        tx.commit().context("failed to commit season import")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scenarios and picks
    // ------------------------------------------------------------------

    pub fn create_scenario(&self, name: &str, sport: Sport, season_id: SeasonId) -> Result<Scenario> {
        let conn = self.conn();
        let id: i64 = conn
            .query_row(
                "INSERT INTO scenarios (name, sport, season_id) VALUES (?1, ?2, ?3) RETURNING id",
                params![name, sport.as_str(), season_id],
                |row| row.get(0),
            )
            .context("failed to create scenario")?;
        Ok(Scenario {
            id,
            name: name.to_string(),
            sport,
            season_id,
        })
    }

    pub fn list_scenarios(&self) -> Result<Vec<Scenario>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, sport, season_id FROM scenarios ORDER BY id")
            .context("failed to prepare list_scenarios query")?;
        let scenarios = stmt
            .query_map([], scenario_from_row)
            .context("failed to query scenarios")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map scenario rows")?;
        Ok(scenarios)
    }

    /// Record a pick. Uses INSERT OR REPLACE so re-picking a game overwrites
    /// the previous pick.
    pub fn save_pick(&self, pick: &Pick) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO picks
                (scenario_id, game_id, picked_team_id, predicted_home_score, predicted_away_score)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pick.scenario_id,
                pick.game_id,
                pick.picked_team_id,
                pick.predicted_home_score,
                pick.predicted_away_score,
            ],
        )
        .context("failed to save pick")?;
        Ok(())
    }

    /// Remove a pick. Returns whether a pick existed.
    pub fn delete_pick(&self, scenario_id: ScenarioId, game_id: GameId) -> Result<bool> {
        let conn = self.conn();
        let removed = conn
            .execute(
                "DELETE FROM picks WHERE scenario_id = ?1 AND game_id = ?2",
                params![scenario_id, game_id],
            )
            .context("failed to delete pick")?;
        Ok(removed > 0)
    }
}

fn insert_team_row(conn: &Connection, season_id: SeasonId, team: &Team) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO teams
            (id, season_id, city, name, abbreviation, conference, division, primary_color, secondary_color, logo_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            team.id,
            season_id,
            team.city,
            team.name,
            team.abbreviation,
            team.conference,
            team.division,
            team.primary_color,
            team.secondary_color,
            team.logo_url,
        ],
    )
    .with_context(|| format!("failed to insert team {}", team.id))?;
    Ok(())
}

fn insert_game_row(conn: &Connection, season_id: SeasonId, game: &GameFact) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO games
            (id, season_id, week, home_team_id, away_team_id, home_score, away_score, is_final)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            game.id,
            season_id,
            game.week,
            game.home_team_id,
            game.away_team_id,
            game.home_score,
            game.away_score,
            game.is_final,
        ],
    )
    .with_context(|| format!("failed to insert game {}", game.id))?;
    Ok(())
}

fn sport_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Sport> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn scenario_from_row(row: &Row<'_>) -> rusqlite::Result<Scenario> {
    Ok(Scenario {
        id: row.get(0)?,
        name: row.get(1)?,
        sport: sport_column(row, 2)?,
        season_id: row.get(3)?,
    })
}

const STATE_COLUMNS: &str =
    "id, scenario_id, sport, season_id, current_round, is_enabled, created_at, updated_at";

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<PlayoffState> {
    Ok(PlayoffState {
        id: row.get(0)?,
        scenario_id: row.get(1)?,
        sport: sport_column(row, 2)?,
        season_id: row.get(3)?,
        current_round: row.get(4)?,
        is_enabled: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Shared leading columns of both slot tables.
const SLOT_COLUMNS: &str = "id, round, slot_order, conference, higher_seed_team_id, higher_seed, \
                            lower_seed_team_id, lower_seed, picked_team_id";

fn pairing_from_row(row: &Row<'_>) -> rusqlite::Result<Pairing> {
    Ok(Pairing {
        round: row.get(1)?,
        order: row.get(2)?,
        conference: row.get(3)?,
        higher: SeededTeam {
            team_id: row.get(4)?,
            seed: row.get(5)?,
        },
        lower: SeededTeam {
            team_id: row.get(6)?,
            seed: row.get(7)?,
        },
    })
}

fn matchup_from_row(row: &Row<'_>) -> rusqlite::Result<Matchup> {
    Ok(Matchup {
        id: row.get(0)?,
        pairing: pairing_from_row(row)?,
        picked_team_id: row.get(8)?,
        predicted_higher_score: row.get(9)?,
        predicted_lower_score: row.get(10)?,
    })
}

fn series_from_row(row: &Row<'_>) -> rusqlite::Result<Series> {
    Ok(Series {
        id: row.get(0)?,
        pairing: pairing_from_row(row)?,
        picked_team_id: row.get(8)?,
        best_of: row.get(9)?,
        predicted_higher_wins: row.get(10)?,
        predicted_lower_wins: row.get(11)?,
    })
}

fn delete_slots_from(tx: &Transaction<'_>, state_id: PlayoffStateId, first_round: u32) -> Result<()> {
    tx.execute(
        "DELETE FROM playoff_matchups WHERE playoff_state_id = ?1 AND round >= ?2",
        params![state_id, first_round],
    )
    .context("failed to delete matchups")?;
    tx.execute(
        "DELETE FROM playoff_series WHERE playoff_state_id = ?1 AND round >= ?2",
        params![state_id, first_round],
    )
    .context("failed to delete series")?;
    Ok(())
}

fn insert_slots(
    tx: &Transaction<'_>,
    state_id: PlayoffStateId,
    round: u32,
    pairings: &[Pairing],
    format: SlotFormat,
) -> Result<()> {
    for p in pairings {
        let inserted = match format {
            SlotFormat::SingleGame => tx.execute(
                "INSERT INTO playoff_matchups
                    (playoff_state_id, round, slot_order, conference, higher_seed_team_id,
                     higher_seed, lower_seed_team_id, lower_seed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    state_id,
                    round,
                    p.order,
                    p.conference,
                    p.higher.team_id,
                    p.higher.seed,
                    p.lower.team_id,
                    p.lower.seed,
                ],
            ),
            SlotFormat::BestOf(best_of) => tx.execute(
                "INSERT INTO playoff_series
                    (playoff_state_id, round, slot_order, conference, higher_seed_team_id,
                     higher_seed, lower_seed_team_id, lower_seed, best_of)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    state_id,
                    round,
                    p.order,
                    p.conference,
                    p.higher.team_id,
                    p.higher.seed,
                    p.lower.team_id,
                    p.lower.seed,
                    best_of,
                ],
            ),
        };
        inserted.with_context(|| format!("failed to insert round {round} slot {}", p.order))?;
    }
    Ok(())
}

fn set_current_round(
    tx: &Transaction<'_>,
    state_id: PlayoffStateId,
    round: u32,
    enabled: Option<bool>,
) -> Result<()> {
    let updated = tx
        .execute(
            "UPDATE playoff_states
             SET current_round = ?2, is_enabled = COALESCE(?3, is_enabled), updated_at = ?4
             WHERE id = ?1",
            params![state_id, round, enabled, Utc::now()],
        )
        .context("failed to update playoff state")?;
    if updated == 0 {
        bail!("playoff state {state_id} does not exist");
    }
    Ok(())
}

impl SeasonSource for Database {
    fn load_teams(&self, season_id: SeasonId) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, city, name, abbreviation, conference, division, primary_color, secondary_color, logo_url
                 FROM teams WHERE season_id = ?1 ORDER BY id",
            )
            .context("failed to prepare load_teams query")?;
        let teams = stmt
            .query_map(params![season_id], |row| {
                Ok(Team {
                    id: row.get(0)?,
                    city: row.get(1)?,
                    name: row.get(2)?,
                    abbreviation: row.get(3)?,
                    conference: row.get(4)?,
                    division: row.get(5)?,
                    primary_color: row.get(6)?,
                    secondary_color: row.get(7)?,
                    logo_url: row.get(8)?,
                })
            })
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?;
        Ok(teams)
    }

    fn list_games(&self, season_id: SeasonId) -> Result<Vec<GameFact>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, week, home_team_id, away_team_id, home_score, away_score, is_final
                 FROM games WHERE season_id = ?1 ORDER BY id",
            )
            .context("failed to prepare list_games query")?;
        let games = stmt
            .query_map(params![season_id], |row| {
                Ok(GameFact {
                    id: row.get(0)?,
                    week: row.get(1)?,
                    home_team_id: row.get(2)?,
                    away_team_id: row.get(3)?,
                    home_score: row.get(4)?,
                    away_score: row.get(5)?,
                    is_final: row.get(6)?,
                })
            })
            .context("failed to query games")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map game rows")?;
        Ok(games)
    }

    fn list_picks(&self, scenario_id: ScenarioId) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT scenario_id, game_id, picked_team_id, predicted_home_score, predicted_away_score
                 FROM picks WHERE scenario_id = ?1 ORDER BY game_id",
            )
            .context("failed to prepare list_picks query")?;
        let picks = stmt
            .query_map(params![scenario_id], |row| {
                Ok(Pick {
                    scenario_id: row.get(0)?,
                    game_id: row.get(1)?,
                    picked_team_id: row.get(2)?,
                    predicted_home_score: row.get(3)?,
                    predicted_away_score: row.get(4)?,
                })
            })
            .context("failed to query picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick rows")?;
        Ok(picks)
    }

    fn scenario(&self, scenario_id: ScenarioId) -> Result<Option<Scenario>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, sport, season_id FROM scenarios WHERE id = ?1")
            .context("failed to prepare scenario query")?;
        let mut rows = stmt
            .query_map(params![scenario_id], scenario_from_row)
            .context("failed to query scenario")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read scenario row")?)),
            None => Ok(None),
        }
    }
}

impl BracketStore for Database {
    fn playoff_state(&self, scenario_id: ScenarioId) -> Result<Option<PlayoffState>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {STATE_COLUMNS} FROM playoff_states WHERE scenario_id = ?1"
            ))
            .context("failed to prepare playoff_state query")?;
        let mut rows = stmt
            .query_map(params![scenario_id], state_from_row)
            .context("failed to query playoff state")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read playoff state row")?)),
            None => Ok(None),
        }
    }

    fn load_or_create_playoff_state(
        &self,
        scenario_id: ScenarioId,
        sport: Sport,
        season_id: SeasonId,
    ) -> Result<PlayoffState> {
        {
            let conn = self.conn();
            let now = Utc::now();
            conn.execute(
                "INSERT OR IGNORE INTO playoff_states
                    (scenario_id, sport, season_id, current_round, is_enabled, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, 0, ?4, ?4)",
                params![scenario_id, sport.as_str(), season_id, now],
            )
            .context("failed to create playoff state")?;
        }
        self.playoff_state(scenario_id)?
            .with_context(|| format!("playoff state for scenario {scenario_id} vanished"))
    }

    fn list_matchups(&self, state_id: PlayoffStateId, round: Option<u32>) -> Result<Vec<Matchup>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SLOT_COLUMNS}, predicted_higher_score, predicted_lower_score
                 FROM playoff_matchups
                 WHERE playoff_state_id = ?1 AND (?2 IS NULL OR round = ?2)
                 ORDER BY round, conference, slot_order"
            ))
            .context("failed to prepare list_matchups query")?;
        let matchups = stmt
            .query_map(params![state_id, round], matchup_from_row)
            .context("failed to query matchups")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map matchup rows")?;
        Ok(matchups)
    }

    fn list_series(&self, state_id: PlayoffStateId, round: Option<u32>) -> Result<Vec<Series>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SLOT_COLUMNS}, best_of, predicted_higher_wins, predicted_lower_wins
                 FROM playoff_series
                 WHERE playoff_state_id = ?1 AND (?2 IS NULL OR round = ?2)
                 ORDER BY round, conference, slot_order"
            ))
            .context("failed to prepare list_series query")?;
        let series = stmt
            .query_map(params![state_id, round], series_from_row)
            .context("failed to query series")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map series rows")?;
        Ok(series)
    }

    fn matchup(&self, state_id: PlayoffStateId, matchup_id: i64) -> Result<Option<Matchup>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SLOT_COLUMNS}, predicted_higher_score, predicted_lower_score
                 FROM playoff_matchups WHERE playoff_state_id = ?1 AND id = ?2"
            ))
            .context("failed to prepare matchup query")?;
        let mut rows = stmt
            .query_map(params![state_id, matchup_id], matchup_from_row)
            .context("failed to query matchup")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read matchup row")?)),
            None => Ok(None),
        }
    }

    fn series(&self, state_id: PlayoffStateId, series_id: i64) -> Result<Option<Series>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SLOT_COLUMNS}, best_of, predicted_higher_wins, predicted_lower_wins
                 FROM playoff_series WHERE playoff_state_id = ?1 AND id = ?2"
            ))
            .context("failed to prepare series query")?;
        let mut rows = stmt
            .query_map(params![state_id, series_id], series_from_row)
            .context("failed to query series")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read series row")?)),
            None => Ok(None),
        }
    }

    fn playoff_field(&self, state_id: PlayoffStateId) -> Result<PlayoffField> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT conference, seed, team_id, win_pct FROM playoff_seeds
                 WHERE playoff_state_id = ?1 ORDER BY conference, seed",
            )
            .context("failed to prepare playoff_field query")?;
        let rows = stmt
            .query_map(params![state_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    FieldEntry {
                        seed: row.get(1)?,
                        team_id: row.get(2)?,
                        win_pct: row.get(3)?,
                    },
                ))
            })
            .context("failed to query playoff field")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map playoff field rows")?;

        let mut conferences: Vec<ConferenceField> = Vec::new();
        for (name, entry) in rows {
            match conferences.last_mut() {
                Some(c) if c.name == name => c.entries.push(entry),
                _ => conferences.push(ConferenceField {
                    name,
                    entries: vec![entry],
                }),
            }
        }
        Ok(PlayoffField { conferences })
    }

    fn start_bracket(
        &self,
        state_id: PlayoffStateId,
        field: &PlayoffField,
        pairings: &[Pairing],
        format: SlotFormat,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin bracket transaction")?;
        delete_slots_from(&tx, state_id, 1)?;
        tx.execute("DELETE FROM playoff_seeds WHERE playoff_state_id = ?1", params![state_id])
            .context("failed to clear playoff field")?;
        for conference in &field.conferences {
            for entry in &conference.entries {
                tx.execute(
                    "INSERT INTO playoff_seeds (playoff_state_id, conference, seed, team_id, win_pct)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![state_id, conference.name, entry.seed, entry.team_id, entry.win_pct],
                )
                .with_context(|| format!("failed to freeze {} seed {}", conference.name, entry.seed))?;
            }
        }
        insert_slots(&tx, state_id, 1, pairings, format)?;
        set_current_round(&tx, state_id, 1, Some(true))?;
        tx.commit().context("failed to commit bracket start")?;
        Ok(())
    }

    fn persist_round(
        &self,
        state_id: PlayoffStateId,
        round: u32,
        pairings: &[Pairing],
        format: SlotFormat,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin round transaction")?;
        delete_slots_from(&tx, state_id, round)?;
        insert_slots(&tx, state_id, round, pairings, format)?;
        set_current_round(&tx, state_id, round, Some(true))?;
        tx.commit().context("failed to commit round")?;
        Ok(())
    }

    fn delete_rounds_after(&self, state_id: PlayoffStateId, round: u32) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin invalidation transaction")?;
        delete_slots_from(&tx, state_id, round + 1)?;
        set_current_round(&tx, state_id, round, None)?;
        tx.commit().context("failed to commit invalidation")?;
        Ok(())
    }

    fn save_bracket_pick(
        &self,
        state_id: PlayoffStateId,
        round: u32,
        slot: BracketSlot,
        pick: &BracketPick,
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin bracket pick transaction")?;
        delete_slots_from(&tx, state_id, round + 1)?;
        set_current_round(&tx, state_id, round, None)?;

        let (sql, id) = match slot {
            BracketSlot::Matchup(id) => (
                "UPDATE playoff_matchups
                 SET picked_team_id = ?3, predicted_higher_score = ?4, predicted_lower_score = ?5
                 WHERE playoff_state_id = ?1 AND id = ?2",
                id,
            ),
            BracketSlot::Series(id) => (
                "UPDATE playoff_series
                 SET picked_team_id = ?3, predicted_higher_wins = ?4, predicted_lower_wins = ?5
                 WHERE playoff_state_id = ?1 AND id = ?2",
                id,
            ),
        };
        let updated = tx
            .execute(
                sql,
                params![
                    state_id,
                    id,
                    pick.picked_team_id,
                    pick.predicted_higher,
                    pick.predicted_lower,
                ],
            )
            .context("failed to save bracket pick")?;
        if updated == 0 {
            bail!("bracket slot {slot:?} does not exist");
        }
        tx.commit().context("failed to commit bracket pick")?;
        Ok(())
    }
}
