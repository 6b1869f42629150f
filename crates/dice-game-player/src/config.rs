//! Player configuration, read from environment variables.

use dice_game_core::{Role, SessionConfig};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NAME: &str = "Alice";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_PEER_URL: &str = "http://localhost:50052";
const DEFAULT_ROUNDS: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Player and peer are both named {0:?}; set STARTS to pick the first mover")]
    AmbiguousFirstMover(String),
}

/// Everything one peer process needs to play a session
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Our player name (`PLAYER_NAME`)
    pub name: String,
    /// The opponent's name (`PEER_NAME`)
    pub peer_name: String,
    /// Port our listener binds (`PORT`)
    pub port: u16,
    /// Base URL of the peer's listener (`PEER_URL`)
    pub peer_url: String,
    /// Rounds to play (`ROUNDS`)
    pub rounds: u32,
    /// Explicit first mover (`STARTS`); otherwise the smaller name starts
    pub starts: Option<bool>,
    /// Upper bound on each send to and wait for the peer (`TIMEOUT_SECS`)
    pub timeout: Duration,
    /// How long to wait for the peer's listener to come up (`READY_TIMEOUT_SECS`)
    pub ready_timeout: Duration,
    /// Pre-shared token both peers must present (`PEER_TOKEN`)
    pub peer_token: Option<String>,
}

impl PlayerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let name = lookup("PLAYER_NAME").unwrap_or_else(|| DEFAULT_NAME.to_string());
        let peer_name = lookup("PEER_NAME").unwrap_or_else(|| {
            let other = if name == "Alice" { "Bob" } else { "Alice" };
            other.to_string()
        });

        let config = Self {
            port: parse(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
            peer_url: lookup("PEER_URL").unwrap_or_else(|| DEFAULT_PEER_URL.to_string()),
            rounds: parse(&lookup, "ROUNDS")?.unwrap_or(DEFAULT_ROUNDS),
            starts: parse(&lookup, "STARTS")?,
            timeout: Duration::from_secs(
                parse(&lookup, "TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            ready_timeout: Duration::from_secs(
                parse(&lookup, "READY_TIMEOUT_SECS")?.unwrap_or(DEFAULT_READY_TIMEOUT_SECS),
            ),
            peer_token: lookup("PEER_TOKEN").filter(|t| !t.is_empty()),
            name,
            peer_name,
        };
        config.first_mover()?;
        Ok(config)
    }

    /// Our role in round one
    pub fn first_mover(&self) -> Result<Role, ConfigError> {
        let starts = match self.starts {
            Some(starts) => starts,
            None if self.name == self.peer_name => {
                return Err(ConfigError::AmbiguousFirstMover(self.name.clone()))
            }
            None => self.name < self.peer_name,
        };
        Ok(if starts {
            Role::Committer
        } else {
            Role::Verifier
        })
    }

    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig::new(self.rounds, self.first_mover()?)
            .with_name(self.name.clone())
            .with_timeout(self.timeout))
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
