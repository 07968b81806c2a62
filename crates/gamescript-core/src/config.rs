// Settings for the gamescript binary (config/gamescript.toml).

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{SeasonId, Sport};

pub const CONFIG_FILE: &str = "gamescript.toml";
pub const DEFAULT_LOG_FILTER: &str = "gamescript=info,warn";

/// Seasons outside this range are rejected as typos.
const SEASON_RANGE: RangeInclusive<SeasonId> = 1920..=2100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("no config/gamescript.toml or defaults/gamescript.toml under {}", base_dir.display())]
    NoConfig { base_dir: PathBuf },

    #[error("failed to copy default config to {path}: {source}")]
    Bootstrap {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub league: LeagueDefaults,
    #[serde(default)]
    pub import: ImportPaths,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Fallbacks for commands run without `--sport` or `--season`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueDefaults {
    pub sport: Option<Sport>,
    pub season: Option<SeasonId>,
}

/// CSV files read by `gamescript import`. Relative paths resolve against the
/// base directory the config was loaded from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportPaths {
    pub teams: Option<String>,
    pub games: Option<String>,
    pub picks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Settings with only a database path, for a base directory that has no
    /// config at all.
    pub fn with_database(path: impl Into<String>) -> Self {
        Config {
            database: DatabaseConfig { path: path.into() },
            league: LeagueDefaults::default(),
            import: ImportPaths::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ImportPaths {
    /// `path` resolved against `base_dir` unless absolute.
    pub fn resolve(base_dir: &Path, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base_dir.join(p)
        }
    }
}

pub fn config_path(base_dir: &Path) -> PathBuf {
    base_dir.join("config").join(CONFIG_FILE)
}

/// Copy `defaults/gamescript.toml` to `config/` when no config exists yet.
/// Returns whether a copy was made; an existing config is never touched.
pub fn bootstrap(base_dir: &Path) -> Result<bool, ConfigError> {
    let target = config_path(base_dir);
    if target.exists() {
        return Ok(false);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::NoConfig {
            base_dir: base_dir.to_path_buf(),
        });
    }

    let copy = || -> std::io::Result<()> {
        std::fs::create_dir_all(base_dir.join("config"))?;
        std::fs::copy(&source, &target)?;
        Ok(())
    };
    copy().map_err(|source| ConfigError::Bootstrap {
        path: target.clone(),
        source,
    })?;
    Ok(true)
}

/// Load and validate `config/gamescript.toml` under `base_dir` without
/// bootstrapping.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(base_dir);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let config: Config = toml::from_str(&text).map_err(|source| ConfigError::ParseError { path, source })?;
    validate(&config)?;
    Ok(config)
}

/// Bootstrap from defaults if needed, then load.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    bootstrap(base_dir)?;
    load_config_from(base_dir)
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.database.path.trim().is_empty() {
        return Err(invalid("database.path", "must not be empty"));
    }

    if let Some(season) = config.league.season {
        if !SEASON_RANGE.contains(&season) {
            return Err(invalid(
                "league.season",
                format!("{season} is outside {}-{}", SEASON_RANGE.start(), SEASON_RANGE.end()),
            ));
        }
    }

    let import = &config.import;
    for (field, value) in [
        ("import.teams", &import.teams),
        ("import.games", &import.games),
        ("import.picks", &import.picks),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(invalid(field, "must not be empty when set"));
        }
    }
    // A season import needs both files.
    match (&import.teams, &import.games) {
        (Some(_), None) => return Err(invalid("import.games", "required when import.teams is set")),
        (None, Some(_)) => return Err(invalid("import.teams", "required when import.games is set")),
        _ => {}
    }

    if config.logging.filter.trim().is_empty() {
        return Err(invalid("logging.filter", "must not be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// The workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    /// A fresh directory under the system temp dir.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gamescript_config_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config(base: &Path, body: &str) {
        fs::create_dir_all(base.join("config")).unwrap();
        fs::write(config_path(base), body).unwrap();
    }

    fn rejected_field(base: &Path) -> String {
        match load_config_from(base).unwrap_err() {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn shipped_defaults_describe_the_sample_season() {
        let tmp = scratch("shipped");
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        let config = load_config(&tmp).expect("defaults should load");
        assert_eq!(config.league.sport, Some(Sport::Nfl));
        assert_eq!(config.league.season, Some(2024));
        assert_eq!(config.import.teams.as_deref(), Some("data/nfl_teams.csv"));
        assert!(config.import.picks.is_none());
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn only_database_is_required() {
        let tmp = scratch("minimal");
        write_config(&tmp, "[database]\npath = \"scenarios.db\"\n");

        let config = load_config_from(&tmp).unwrap();
        assert!(config.league.sport.is_none());
        assert!(config.league.season.is_none());
        assert!(config.import.teams.is_none());
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_bad_values_by_field() {
        let tmp = scratch("invalid");
        let cases = [
            ("[database]\npath = \"  \"\n", "database.path"),
            ("[database]\npath = \"x.db\"\n[league]\nseason = 24\n", "league.season"),
            (
                "[database]\npath = \"x.db\"\n[import]\nteams = \"teams.csv\"\ngames = \"\"\n",
                "import.games",
            ),
            ("[database]\npath = \"x.db\"\n[import]\ngames = \"games.csv\"\n", "import.teams"),
            ("[database]\npath = \"x.db\"\n[logging]\nfilter = \"\"\n", "logging.filter"),
        ];
        for (body, field) in cases {
            write_config(&tmp, body);
            assert_eq!(rejected_field(&tmp), field, "config:\n{body}");
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_sport_is_a_parse_error() {
        let tmp = scratch("sport");
        write_config(&tmp, "[database]\npath = \"x.db\"\n[league]\nsport = \"mlb\"\n");
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::ParseError { .. }
        ));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_config_is_file_not_found() {
        let tmp = scratch("missing");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bootstrap_copies_once_and_keeps_edits() {
        let tmp = scratch("bootstrap");
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), "[database]\npath = \"a.db\"\n").unwrap();

        assert!(bootstrap(&tmp).unwrap());
        write_config(&tmp, "[database]\npath = \"edited.db\"\n");
        assert!(!bootstrap(&tmp).unwrap());
        assert_eq!(load_config(&tmp).unwrap().database.path, "edited.db");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bootstrap_without_defaults_or_config() {
        let tmp = scratch("nothing");
        assert!(matches!(bootstrap(&tmp), Err(ConfigError::NoConfig { .. })));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn relative_import_paths_resolve_against_base() {
        let base = Path::new("/srv/gamescript");
        assert_eq!(
            ImportPaths::resolve(base, "data/teams.csv"),
            PathBuf::from("/srv/gamescript/data/teams.csv")
        );
        assert_eq!(
            ImportPaths::resolve(base, "/tmp/games.csv"),
            PathBuf::from("/tmp/games.csv")
        );
    }
}
