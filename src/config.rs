use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// BOT_TOKEN is not set.
    MissingToken,
    /// BOT_TOKEN does not look like a Telegram bot token.
    InvalidToken,
    /// TZ is not a known IANA timezone name.
    UnknownTimezone { name: String, reason: String },
    /// A boolean variable has an unrecognized value.
    InvalidFlag { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "BOT_TOKEN is not set"),
            Self::InvalidToken => write!(
                f,
                "BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)"
            ),
            Self::UnknownTimezone { name, reason } => {
                write!(f, "TZ '{}' is not a known timezone: {}", name, reason)
            }
            Self::InvalidFlag { var, value } => {
                write!(f, "{} must be a boolean, got '{}'", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Default meeting room link embedded in announcements.
const DEFAULT_DAILY_LINK: &str = "https://x5group.ktalk.ru/23a64c1ee4e4443cbe66c80fd7326727";
const DEFAULT_TZ: &str = "Europe/Moscow";
const DEFAULT_STATE_FILE: &str = "state.json";

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token. Required.
    pub bot_token: String,
    /// Zone the weekday 10:00 schedule is evaluated in.
    pub timezone: Tz,
    /// Path of the persisted state document.
    pub state_file: PathBuf,
    /// Meeting link embedded in every announcement.
    pub meeting_link: String,
    /// Whether /today in an unbound chat binds that chat as a side effect.
    pub bind_on_today: bool,
}

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Lets tests avoid touching
    /// the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = var("BOT_TOKEN").ok_or(ConfigError::MissingToken)?;
        if bot_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = bot_token.split(':').collect();
        if token_parts.len() != 2
            || token_parts[0].parse::<u64>().is_err()
            || token_parts[1].is_empty()
        {
            return Err(ConfigError::InvalidToken);
        }

        let tz_name = var("TZ").unwrap_or_else(|| DEFAULT_TZ.to_string());
        let timezone = Tz::from_str(&tz_name).map_err(|e| ConfigError::UnknownTimezone {
            name: tz_name,
            reason: e.to_string(),
        })?;

        let state_file = var("STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        let meeting_link = var("DAILY_LINK").unwrap_or_else(|| DEFAULT_DAILY_LINK.to_string());

        let bind_on_today = match var("TODAY_BINDS_CHAT") {
            None => false,
            Some(value) => match value.trim().to_lowercase().as_str() {
                "" | "0" | "false" | "no" => false,
                "1" | "true" | "yes" => true,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        var: "TODAY_BINDS_CHAT",
                        value,
                    });
                }
            },
        };

        Ok(Self {
            bot_token,
            timezone,
            state_file,
            meeting_link,
            bind_on_today,
        })
    }
}
