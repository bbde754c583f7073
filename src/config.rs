use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::gemini::DEFAULT_MODEL;
use crate::board::svg::DEFAULT_SIZE;

pub const MIN_TURNS: u32 = 1;
pub const MAX_TURNS: u32 = 100;
pub const DEFAULT_TURNS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_turns must be between {min} and {max}, got {0}", min = MIN_TURNS, max = MAX_TURNS)]
    MaxTurnsOutOfRange(u32),
    #[error("max_turns must be a whole number between {min} and {max}, got {0:?}", min = MIN_TURNS, max = MAX_TURNS)]
    MaxTurnsNotANumber(String),
    #[error("max_attempts must be at least max_turns ({max_turns}), got {max_attempts}")]
    AttemptsBelowTurns { max_turns: u32, max_attempts: u32 },
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What to do when the completion service itself fails (network, HTTP status, empty body).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServiceErrorPolicy {
    /// Stop the game and report the failure.
    #[default]
    Abort,
    /// Count it as a failed turn and keep playing.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub max_turns: u32,
    pub max_attempts: Option<u32>,
    pub model: String,
    pub service_errors: ServiceErrorPolicy,
    pub board_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_TURNS,
            max_attempts: None,
            model: DEFAULT_MODEL.to_string(),
            service_errors: ServiceErrorPolicy::default(),
            board_size: DEFAULT_SIZE,
            request_timeout_secs: 60,
        }
    }
}

impl GameConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        let cfg: GameConfig = serde_json::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_max_turns(self.max_turns)?;
        if let Some(max_attempts) = self.max_attempts {
            if max_attempts < self.max_turns {
                return Err(ConfigError::AttemptsBelowTurns { max_turns: self.max_turns, max_attempts });
            }
        }
        Ok(())
    }

    /// Turn attempts allowed before giving up, successful or not.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.unwrap_or(self.max_turns.saturating_mul(3))
    }

    pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs.max(1)) }
}

pub fn check_max_turns(max_turns: u32) -> Result<u32, ConfigError> {
    if (MIN_TURNS..=MAX_TURNS).contains(&max_turns) {
        Ok(max_turns)
    } else {
        Err(ConfigError::MaxTurnsOutOfRange(max_turns))
    }
}

/// Form and flag input: surrounding whitespace is ignored.
pub fn parse_max_turns(raw: &str) -> Result<u32, ConfigError> {
    let n = raw.trim().parse::<u32>().map_err(|_| ConfigError::MaxTurnsNotANumber(raw.to_string()))?;
    check_max_turns(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_ui_defaults() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.max_turns, 10);
        assert_eq!(cfg.attempt_budget(), 30);
        assert_eq!(cfg.service_errors, ServiceErrorPolicy::Abort);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn max_turns_range_is_inclusive() {
        assert!(check_max_turns(1).is_ok());
        assert!(check_max_turns(100).is_ok());
        assert!(matches!(check_max_turns(0), Err(ConfigError::MaxTurnsOutOfRange(0))));
        assert!(matches!(check_max_turns(101), Err(ConfigError::MaxTurnsOutOfRange(101))));
    }

    #[test]
    fn max_turns_text_is_parsed_then_range_checked() {
        assert_eq!(parse_max_turns(" 42 ").unwrap(), 42);
        assert!(matches!(parse_max_turns("0"), Err(ConfigError::MaxTurnsOutOfRange(0))));
        assert!(matches!(parse_max_turns(""), Err(ConfigError::MaxTurnsNotANumber(_))));
        assert!(matches!(parse_max_turns("-3"), Err(ConfigError::MaxTurnsNotANumber(_))));
        assert_eq!(
            parse_max_turns("ten").unwrap_err().to_string(),
            "max_turns must be a whole number between 1 and 100, got \"ten\""
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: GameConfig = serde_json::from_str(r#"{"max_turns": 25, "service_errors": "skip"}"#).unwrap();
        assert_eq!(
            cfg,
            GameConfig { max_turns: 25, service_errors: ServiceErrorPolicy::Skip, ..GameConfig::default() }
        );
    }

    #[test]
    fn attempts_below_turns_is_rejected() {
        let cfg = GameConfig { max_turns: 10, max_attempts: Some(5), ..GameConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::AttemptsBelowTurns { .. })));
    }
}
