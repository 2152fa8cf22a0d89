//! File-based configuration for cohort tooling.
//!
//! # Responsibility
//! - Load `CohortConfig` from JSON with defaults for every field.
//! - Validate settings before anything opens a database or a log file.
//!
//! # Invariants
//! - A validated config always yields valid `PromotionRules`.
//! - `log_level` is one the logger accepts.
//! - `log_dir`, when present, is an absolute path.

use crate::logging::{default_log_level, normalize_level};
use crate::service::promotion::{PromotionRules, PromotionRulesError, DEFAULT_TRACK};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_PATH: &str = "cohort.sqlite3";

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    InvalidTrack(PromotionRulesError),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::InvalidTrack(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidTrack(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings shared by the CLI and embedding callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CohortConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Ordered governed program codes; the last one graduates.
    pub track: Vec<String>,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            track: DEFAULT_TRACK.iter().map(|code| (*code).to_string()).collect(),
        }
    }
}

impl CohortConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parses and validates config JSON. Missing fields take defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".to_string()));
        }
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        self.promotion_rules()?;
        Ok(())
    }

    /// Builds promotion rules from `track`.
    pub fn promotion_rules(&self) -> Result<PromotionRules, ConfigError> {
        PromotionRules::from_track(&self.track).map_err(ConfigError::InvalidTrack)
    }
}

#[cfg(test)]
mod tests {
    use super::{CohortConfig, ConfigError};
    use crate::service::promotion::PromotionRulesError;
    use std::path::PathBuf;

    #[test]
    fn empty_object_uses_defaults() {
        let config = CohortConfig::from_json_str("{}").expect("defaults should validate");
        assert_eq!(config, CohortConfig::default());
        assert_eq!(config.database_path, PathBuf::from("cohort.sqlite3"));
        assert_eq!(config.track, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn custom_track_becomes_promotion_rules() {
        let config = CohortConfig::from_json_str(r#"{"track": ["I1", "I2", "I3"]}"#).unwrap();
        let rules = config.promotion_rules().unwrap();
        assert_eq!(rules.track().to_vec(), vec!["I1", "I2", "I3"]);
    }

    #[test]
    fn duplicate_track_codes_are_rejected() {
        let err = CohortConfig::from_json_str(r#"{"track": ["L1", "L1"]}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTrack(PromotionRulesError::DuplicateCode(ref code)) if code == "L1"
        ));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CohortConfig::from_json_str(r#"{"log_dir": "logs"}"#).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn unsupported_log_level_is_rejected() {
        let err = CohortConfig::from_json_str(r#"{"log_level": "verbose"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("verbose")));

        let config = CohortConfig::from_json_str(r#"{"log_level": " Warning "}"#).unwrap();
        assert_eq!(config.log_level, " Warning ");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = CohortConfig::from_json_str(r#"{"trak": ["P1"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = CohortConfig::load("/definitely/not/here/cohort.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
