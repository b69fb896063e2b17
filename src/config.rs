//! Relay configuration loaded from the environment.
//!
//! [`RelayConfig`] carries the Discord credentials and targets, the liveness
//! port, the state file location, and the API base URLs. The polling cadence
//! and request timeout are fixed constants.

use crate::error::{RelayError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default PaperMC API base.
pub const DEFAULT_PAPER_API_URL: &str = "https://api.papermc.io/v2";

/// Default Discord REST base.
pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Default liveness port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_PATH: &str = "data.json";

/// Time between poll cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Delay before the first poll cycle after startup.
pub const INITIAL_POLL_DELAY: Duration = Duration::from_secs(2);

/// Per-request timeout for upstream and Discord REST calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration for the relay.
#[derive(Clone)]
pub struct RelayConfig {
    /// Discord bot token.
    pub discord_token: String,
    /// Channel that receives build announcements.
    pub channel_id: String,
    /// Discord application ID (for command registration).
    pub application_id: String,
    /// Guild the slash commands are registered in.
    pub guild_id: String,
    /// Port of the liveness endpoint.
    pub port: u16,
    /// Location of the persisted state file.
    pub state_path: PathBuf,
    /// PaperMC API base URL, without trailing slash.
    pub paper_api_url: String,
    /// Discord REST base URL, without trailing slash.
    pub discord_api_url: String,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("discord_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("port", &self.port)
            .field("state_path", &self.state_path)
            .field("paper_api_url", &self.paper_api_url)
            .field("discord_api_url", &self.discord_api_url)
            .finish()
    }
}

impl RelayConfig {
    /// Build configuration from process environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if a required variable is missing or a
    /// value is malformed.
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            tracing::debug!("loaded environment overrides from .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`RelayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            value(key).ok_or_else(|| RelayError::Config(format!("{key} is not set")))
        };

        let port = match value("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| RelayError::Config(format!("PORT `{raw}` is invalid: {e}")))?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            discord_token: required("DISCORD_TOKEN")?,
            channel_id: required("CHANNEL_ID")?,
            application_id: required("CLIENT_ID")?,
            guild_id: required("GUILD_ID")?,
            port,
            state_path: value("STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            paper_api_url: strip_trailing_slash(
                value("PAPER_API_URL").unwrap_or_else(|| DEFAULT_PAPER_API_URL.to_owned()),
            ),
            discord_api_url: strip_trailing_slash(
                value("DISCORD_API_URL").unwrap_or_else(|| DEFAULT_DISCORD_API_URL.to_owned()),
            ),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - Discord identifiers are non-empty
    /// - `port` is non-zero
    /// - both API base URLs parse as absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("DISCORD_TOKEN", &self.discord_token),
            ("CHANNEL_ID", &self.channel_id),
            ("CLIENT_ID", &self.application_id),
            ("GUILD_ID", &self.guild_id),
        ] {
            if v.trim().is_empty() {
                return Err(RelayError::Config(format!("{name} must not be empty")));
            }
        }
        if self.port == 0 {
            return Err(RelayError::Config("PORT must be greater than 0".into()));
        }
        for (name, raw) in [
            ("PAPER_API_URL", &self.paper_api_url),
            ("DISCORD_API_URL", &self.discord_api_url),
        ] {
            let parsed = url::Url::parse(raw)
                .map_err(|e| RelayError::Config(format!("{name} `{raw}` is invalid: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(RelayError::Config(format!(
                    "{name} must use http or https, got `{}`",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }
}

fn strip_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
