// Gamescript command-line driver.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (copying defaults on first run)
// 3. Initialize tracing (stderr, so stdout carries only command output)
// 4. Open database
// 5. Run the subcommand

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use gamescript_core::config::{self, Config, ConfigError, ImportPaths};
use gamescript_core::db::Database;
use gamescript_core::import;
use gamescript_core::model::{GameId, ScenarioId, SeasonId, Sport, TeamId};
use gamescript_core::playoffs::{BracketPick, BracketSlot, PlayoffBracketGenerator};
use gamescript_core::standings::compute_scenario_standings;
use gamescript_core::store::SeasonSource;
use gamescript_core::{Pick, Scenario};

#[derive(Parser)]
#[command(name = "gamescript")]
#[command(about = "What-if standings and playoff brackets for NFL and NBA seasons")]
struct Cli {
    /// Directory holding config/ and defaults/.
    #[arg(long, env = "GAMESCRIPT_HOME", default_value = ".")]
    base_dir: PathBuf,

    /// Database file, overriding [database] path.
    #[arg(long, env = "GAMESCRIPT_DB")]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a season's teams and games from CSV
    Import {
        /// Defaults to [league] season
        #[arg(long)]
        season: Option<SeasonId>,
        /// Teams CSV, overriding [import] teams
        #[arg(long)]
        teams: Option<PathBuf>,
        /// Games CSV, overriding [import] games
        #[arg(long)]
        games: Option<PathBuf>,
    },
    /// Create and list scenarios
    #[command(subcommand)]
    Scenario(ScenarioCommand),
    /// Record or clear a regular-season pick
    Pick(PickArgs),
    /// Load picks for a scenario from CSV
    ImportPicks {
        #[arg(long)]
        scenario: ScenarioId,
        /// Picks CSV, overriding [import] picks
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a scenario's standings as JSON
    Standings {
        #[arg(long)]
        scenario: ScenarioId,
    },
    /// Drive a scenario's playoff bracket
    #[command(subcommand)]
    Playoffs(PlayoffCommand),
}

#[derive(Subcommand)]
enum ScenarioCommand {
    Create {
        #[arg(long)]
        name: String,
        /// Defaults to [league] sport
        #[arg(long)]
        sport: Option<Sport>,
        /// Defaults to [league] season
        #[arg(long)]
        season: Option<SeasonId>,
    },
    List,
}

#[derive(Args)]
struct PickArgs {
    #[arg(long)]
    scenario: ScenarioId,
    #[arg(long)]
    game: GameId,
    #[arg(long, conflicts_with = "clear")]
    team: Option<TeamId>,
    #[arg(long, requires = "away_score", conflicts_with = "clear")]
    home_score: Option<i32>,
    #[arg(long, requires = "home_score", conflicts_with = "clear")]
    away_score: Option<i32>,
    /// Remove the pick instead
    #[arg(long)]
    clear: bool,
}

#[derive(Subcommand)]
enum PlayoffCommand {
    /// Whether the season is complete and the stored bracket state
    Status {
        #[arg(long)]
        scenario: ScenarioId,
    },
    /// Seed round 1 from the standings
    Enable {
        #[arg(long)]
        scenario: ScenarioId,
    },
    /// Generate the round after `round`
    Next {
        #[arg(long)]
        scenario: ScenarioId,
        #[arg(long)]
        round: u32,
    },
    /// Pick a bracket slot
    Pick {
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long)]
        team: Option<TeamId>,
        /// Score or series wins of the higher seed
        #[arg(long, requires = "lower")]
        higher: Option<u32>,
        /// Score or series wins of the lower seed
        #[arg(long, requires = "higher")]
        lower: Option<u32>,
    },
    /// Clear a bracket slot's pick
    Clear {
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Drop every round after `round`
    Invalidate {
        #[arg(long)]
        scenario: ScenarioId,
        #[arg(long)]
        round: u32,
    },
    /// Print the bracket as JSON
    Show {
        #[arg(long)]
        scenario: ScenarioId,
    },
}

#[derive(Args)]
struct SlotArgs {
    #[arg(long)]
    scenario: ScenarioId,
    #[arg(long, conflicts_with = "series", required_unless_present = "series")]
    matchup: Option<i64>,
    #[arg(long)]
    series: Option<i64>,
}

impl SlotArgs {
    fn slot(&self) -> Result<BracketSlot> {
        match (self.matchup, self.series) {
            (Some(id), None) => Ok(BracketSlot::Matchup(id)),
            (None, Some(id)) => Ok(BracketSlot::Series(id)),
            _ => bail!("pass exactly one of --matchup or --series"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_settings(&cli.base_dir)?;
    init_tracing(&config.logging.filter)?;

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => ImportPaths::resolve(&cli.base_dir, &config.database.path)
            .display()
            .to_string(),
    };
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    run(cli.command, &cli.base_dir, &config, db)
}

/// Load config from `base_dir`. With no config/ or defaults/ there, fall back
/// to a database in the per-user data directory.
fn load_settings(base_dir: &Path) -> Result<Config> {
    match config::load_config(base_dir) {
        Ok(config) => Ok(config),
        Err(e @ ConfigError::NoConfig { .. }) => {
            let dirs = directories::ProjectDirs::from("", "", "gamescript")
                .context("no home directory to place the database in")?;
            std::fs::create_dir_all(dirs.data_dir())
                .with_context(|| format!("failed to create {}", dirs.data_dir().display()))?;
            eprintln!("gamescript: {e}; using {}", dirs.data_dir().display());
            Ok(Config::with_database(
                dirs.data_dir().join("gamescript.db").display().to_string(),
            ))
        }
        Err(e) => Err(e).context("failed to load configuration"),
    }
}

fn init_tracing(default_filter: &str) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("failed to serialize output")?);
    Ok(())
}

fn scenario(db: &Database, scenario_id: ScenarioId) -> Result<Scenario> {
    db.scenario(scenario_id)?
        .with_context(|| format!("scenario {scenario_id} not found"))
}

fn configured_path(base_dir: &Path, flag: Option<PathBuf>, configured: Option<&str>, what: &str) -> Result<PathBuf> {
    match (flag, configured) {
        (Some(path), _) => Ok(path),
        (None, Some(path)) => Ok(ImportPaths::resolve(base_dir, path)),
        (None, None) => bail!("no {what} CSV given; pass a path or set it under [import]"),
    }
}

fn season_or_default(flag: Option<SeasonId>, config: &Config) -> Result<SeasonId> {
    flag.or(config.league.season)
        .context("no season given; pass --season or set [league] season")
}

fn run(command: Commands, base_dir: &Path, config: &Config, db: Database) -> Result<()> {
    match command {
        Commands::Import { season, teams, games } => {
            let season = season_or_default(season, config)?;
            let teams_path = configured_path(base_dir, teams, config.import.teams.as_deref(), "teams")?;
            let games_path = configured_path(base_dir, games, config.import.games.as_deref(), "games")?;
            let (teams, games) = import::load_season(&teams_path, &games_path).context("failed to load season CSVs")?;
            db.import_season(season, &teams, &games)?;
            info!("Imported season {}: {} teams, {} games", season, teams.len(), games.len());
            println!("imported {} teams and {} games into season {season}", teams.len(), games.len());
        }
        Commands::Scenario(ScenarioCommand::Create { name, sport, season }) => {
            let sport = sport
                .or(config.league.sport)
                .context("no sport given; pass --sport or set [league] sport")?;
            let season = season_or_default(season, config)?;
            if db.load_teams(season)?.is_empty() {
                warn!("season {} has no teams yet", season);
            }
            let scenario = db.create_scenario(&name, sport, season)?;
            print_json(&scenario)?;
        }
        Commands::Scenario(ScenarioCommand::List) => {
            print_json(&db.list_scenarios()?)?;
        }
        Commands::Pick(args) => {
            scenario(&db, args.scenario)?;
            if args.clear {
                if !db.delete_pick(args.scenario, args.game)? {
                    warn!("no pick for game {} in scenario {}", args.game, args.scenario);
                }
            } else {
                if args.team.is_none() && args.home_score.is_none() {
                    bail!("pass --team, or --home-score with --away-score");
                }
                db.save_pick(&Pick {
                    scenario_id: args.scenario,
                    game_id: args.game,
                    picked_team_id: args.team,
                    predicted_home_score: args.home_score,
                    predicted_away_score: args.away_score,
                })?;
            }
        }
        Commands::ImportPicks { scenario: scenario_id, file } => {
            scenario(&db, scenario_id)?;
            let path = configured_path(base_dir, file, config.import.picks.as_deref(), "picks")?;
            let picks = import::load_picks(&path, scenario_id).context("failed to load picks CSV")?;
            for pick in &picks {
                db.save_pick(pick)?;
            }
            println!("imported {} picks into scenario {scenario_id}", picks.len());
        }
        Commands::Standings { scenario: scenario_id } => {
            let season = scenario(&db, scenario_id)?.season_id;
            print_json(&compute_scenario_standings(&db, scenario_id, season)?)?;
        }
        Commands::Playoffs(command) => run_playoffs(command, db)?,
    }
    Ok(())
}

fn run_playoffs(command: PlayoffCommand, db: Database) -> Result<()> {
    let generator = PlayoffBracketGenerator::new(db);
    match command {
        PlayoffCommand::Status { scenario: scenario_id } => {
            let season = scenario(generator.store(), scenario_id)?.season_id;
            print_json(&generator.playoff_status(scenario_id, season)?)?;
        }
        PlayoffCommand::Enable { scenario: scenario_id } => {
            let record = scenario(generator.store(), scenario_id)?;
            generator.generate_first_round(scenario_id, record.season_id, record.sport)?;
            print_json(&generator.bracket(scenario_id)?)?;
        }
        PlayoffCommand::Next { scenario: scenario_id, round } => {
            generator.generate_next_round(scenario_id, round)?;
            print_json(&generator.bracket(scenario_id)?)?;
        }
        PlayoffCommand::Pick {
            slot,
            team,
            higher,
            lower,
        } => {
            let pick = BracketPick {
                picked_team_id: team,
                predicted_higher: higher,
                predicted_lower: lower,
            };
            generator.update_bracket_pick(slot.scenario, slot.slot()?, pick)?;
            print_json(&generator.bracket(slot.scenario)?)?;
        }
        PlayoffCommand::Clear { slot } => {
            generator.clear_bracket_pick(slot.scenario, slot.slot()?)?;
            print_json(&generator.bracket(slot.scenario)?)?;
        }
        PlayoffCommand::Invalidate { scenario: scenario_id, round } => {
            generator.invalidate_rounds_after(scenario_id, round)?;
            print_json(&generator.bracket(scenario_id)?)?;
        }
        PlayoffCommand::Show { scenario: scenario_id } => {
            print_json(&generator.bracket(scenario_id)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bracket_pick() {
        let cli = Cli::try_parse_from([
            "gamescript", "playoffs", "pick", "--scenario", "3", "--series", "12", "--higher", "4", "--lower", "1",
        ])
        .unwrap();
        match cli.command {
            Commands::Playoffs(PlayoffCommand::Pick { slot, team, higher, lower }) => {
                assert_eq!(slot.slot().unwrap(), BracketSlot::Series(12));
                assert_eq!(team, None);
                assert_eq!((higher, lower), (Some(4), Some(1)));
            }
            _ => panic!("expected playoffs pick"),
        }
    }

    #[test]
    fn league_flags_fall_back_to_config() {
        let mut config = Config::with_database("x.db");
        assert!(season_or_default(None, &config).is_err());
        config.league.season = Some(2024);
        assert_eq!(season_or_default(None, &config).unwrap(), 2024);
        assert_eq!(season_or_default(Some(2019), &config).unwrap(), 2019);

        let cli = Cli::try_parse_from(["gamescript", "scenario", "create", "--name", "x"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Scenario(ScenarioCommand::Create { sport: None, season: None, .. })
        ));
    }

    #[test]
    fn slot_is_required() {
        assert!(Cli::try_parse_from(["gamescript", "playoffs", "clear", "--scenario", "3"]).is_err());
    }

    #[test]
    fn sport_parses_case_insensitively() {
        let cli = Cli::try_parse_from([
            "gamescript", "scenario", "create", "--name", "x", "--sport", "NBA", "--season", "2025",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Scenario(ScenarioCommand::Create { sport: Some(Sport::Nba), .. })
        ));
    }
}
