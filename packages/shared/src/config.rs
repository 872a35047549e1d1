use std::fmt;

pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 5;
pub const MAX_TIME_LIMIT_MINUTES: u32 = 60;
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} environment variable must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Tunables of the game rules that are not fixed by the ranking itself.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub default_time_limit_minutes: u32,
    pub max_time_limit_minutes: u32,
    /// Attempts at a conditional write before a contended update gives up.
    pub max_write_attempts: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            default_time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            max_time_limit_minutes: MAX_TIME_LIMIT_MINUTES,
            max_write_attempts: MAX_WRITE_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub games_table: String,
    pub game_codes_table: String,
    pub game: GameSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameSettings::default();
        let game = GameSettings {
            default_time_limit_minutes: optional_u32(
                &lookup,
                "DEFAULT_TIME_LIMIT_MINUTES",
                defaults.default_time_limit_minutes,
            )?,
            max_time_limit_minutes: optional_u32(
                &lookup,
                "MAX_TIME_LIMIT_MINUTES",
                defaults.max_time_limit_minutes,
            )?,
            max_write_attempts: optional_u32(
                &lookup,
                "MAX_WRITE_ATTEMPTS",
                defaults.max_write_attempts,
            )?,
        };

        if game.default_time_limit_minutes > game.max_time_limit_minutes {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_TIME_LIMIT_MINUTES",
                value: game.default_time_limit_minutes.to_string(),
            });
        }

        Ok(AppConfig {
            games_table: required(&lookup, "GAMES_TABLE")?,
            game_codes_table: required(&lookup, "GAME_CODES_TABLE")?,
            game,
        })
    }
}

pub fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn optional_u32<F>(lookup: &F, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}
