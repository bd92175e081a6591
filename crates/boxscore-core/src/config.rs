// Configuration loading and parsing (config/boxscore.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Built-in configuration written to `config/boxscore.toml` when absent.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/boxscore.toml");

/// File name of the configuration inside the `config/` directory.
pub const CONFIG_FILE_NAME: &str = "boxscore.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

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

    #[error("failed to write default config: {message}")]
    DefaultsWriteError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Fully assembled pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub team: TeamConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub qualification: QualificationConfig,
    /// Extra header synonyms keyed by canonical field name.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LeaderboardConfig {
    pub default_top_n: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self { default_top_n: 20 }
    }
}

/// Playing-time qualification ratios, relative to each season's leader.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QualificationConfig {
    pub min_ab_ratio: f64,
    pub min_ip_ratio: f64,
    #[serde(default)]
    pub enforce_min_ip: bool,
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            min_ab_ratio: 0.40,
            min_ip_ratio: 0.30,
            enforce_min_ip: false,
        }
    }
}

impl Config {
    /// Resolve the database location. Falls back to the platform data
    /// directory when `paths.db_path` is not set.
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.paths.db_path {
            return path.clone();
        }
        match directories::ProjectDirs::from("edu", "boxscore", "boxscore") {
            Some(dirs) => dirs.data_dir().join("college_baseball.db"),
            None => PathBuf::from("college_baseball.db"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/boxscore.toml` relative to `base_dir`.
///
/// Does not create the file; see [`ensure_config_file`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config = parse_config(&text).map_err(|e| match e {
        ConfigError::ParseError { source, .. } => ConfigError::ParseError { path, source },
        other => other,
    })?;
    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: PathBuf::from("<inline>"),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Write the built-in default to `config/boxscore.toml` if it does not exist.
/// Returns the path written, or `None` when a config file was already there.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsWriteError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let target = config_dir.join(CONFIG_FILE_NAME);
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, DEFAULT_CONFIG.as_bytes()).map_err(|e| {
                ConfigError::DefaultsWriteError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(Some(target))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ConfigError::DefaultsWriteError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Convenience wrapper: ensures the config file exists under `base_dir`,
/// then loads it.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.team.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "team.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.leaderboard.default_top_n == 0 {
        return Err(ConfigError::ValidationError {
            field: "leaderboard.default_top_n".into(),
            message: "must be > 0".into(),
        });
    }

    let q = &config.qualification;
    let ratio_fields: &[(&str, f64)] = &[
        ("qualification.min_ab_ratio", q.min_ab_ratio),
        ("qualification.min_ip_ratio", q.min_ip_ratio),
    ];
    for (name, val) in ratio_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            });
        }
    }

    for (canonical, aliases) in &config.aliases {
        if canonical.trim().is_empty() || aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                field: format!("aliases.{canonical}"),
                message: "alias names must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        tmp
    }

    #[test]
    fn default_config_parses_and_validates() {
        let config = parse_config(DEFAULT_CONFIG).expect("default config should be valid");

        assert_eq!(config.team.name, "MSST");
        assert_eq!(config.paths.raw_dir, PathBuf::from("data/raw"));
        assert_eq!(
            config.paths.db_path.as_deref(),
            Some(Path::new("data/processed/college_baseball.db"))
        );
        assert_eq!(config.leaderboard.default_top_n, 20);
        assert!((config.qualification.min_ab_ratio - 0.40).abs() < f64::EPSILON);
        assert!((config.qualification.min_ip_ratio - 0.30).abs() < f64::EPSILON);
        assert!(!config.qualification.enforce_min_ip);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let text = r#"
[team]
name = "MSST"

[paths]
raw_dir = "raw"
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.leaderboard.default_top_n, 20);
        assert!((config.qualification.min_ab_ratio - 0.40).abs() < f64::EPSILON);
        assert!(config.paths.db_path.is_none());
        assert!(config.db_path().ends_with("college_baseball.db"));
    }

    #[test]
    fn aliases_section_is_read() {
        let text = r#"
[team]
name = "MSST"

[paths]
raw_dir = "raw"

[aliases]
obp = ["on_base_avg", "obavg"]
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(
            config.aliases.get("obp"),
            Some(&vec!["on_base_avg".to_string(), "obavg".to_string()])
        );
    }

    #[test]
    fn rejects_empty_team_name() {
        let modified = DEFAULT_CONFIG.replace("name = \"MSST\"", "name = \"  \"");
        match parse_config(&modified).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "team.name"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_zero_top_n() {
        let modified = DEFAULT_CONFIG.replace("default_top_n = 20", "default_top_n = 0");
        match parse_config(&modified).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "leaderboard.default_top_n")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_ratio_out_of_range() {
        let modified = DEFAULT_CONFIG.replace("min_ab_ratio = 0.40", "min_ab_ratio = 1.5");
        match parse_config(&modified).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "qualification.min_ab_ratio")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let modified = DEFAULT_CONFIG.replace("min_ip_ratio = 0.30", "min_ip_ratio = -0.1");
        match parse_config(&modified).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "qualification.min_ip_ratio")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn file_not_found_when_config_missing() {
        let tmp = scratch_dir("boxscore_config_missing");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_names_the_file() {
        let tmp = scratch_dir("boxscore_config_invalid");
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE_NAME), "not [[[ toml").unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_file_writes_default_once() {
        let tmp = scratch_dir("boxscore_config_ensure");

        let written = ensure_config_file(&tmp).unwrap();
        assert!(written.is_some());
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.team.name, "MSST");

        // A second call leaves the existing file alone.
        fs::write(tmp.join("config").join(CONFIG_FILE_NAME), "# custom\n").unwrap();
        assert!(ensure_config_file(&tmp).unwrap().is_none());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }
}
