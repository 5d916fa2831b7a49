//! Plugin configuration: TOML file with per-key defaults.

use gamecode_core::{GamecodeError, GamecodeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Upper bound for `reservation.ttl_secs` and `reservation.sweep_interval_secs`.
pub const MAX_RESERVATION_SECS: u64 = 86_400;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub reservation: ReservationSection,
    #[serde(default)]
    pub messages: MessagesSection,
}

/// `[reservation]` section of the config TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSection {
    /// How long a reservation stays valid, in seconds. Defaults to 60 and
    /// must lie in `1..=86400`; the store keeps it fixed for its lifetime.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Period of the expired-reservation sweep, in seconds. Same bounds
    /// as `ttl_secs`.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ReservationSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// `[messages]` section: disconnect reasons shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesSection {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_canceled")]
    pub canceled: String,
    #[serde(default = "default_code_in_use")]
    pub code_in_use: String,
    #[serde(default = "default_creation_failed")]
    pub creation_failed: String,
}

impl Default for MessagesSection {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            canceled: default_canceled(),
            code_in_use: default_code_in_use(),
            creation_failed: default_creation_failed(),
        }
    }
}

fn default_ttl() -> u64 {
    60
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_prompt() -> String {
    "Enter a custom game code in the join game section, or enter 'CANCEL' to stop.".to_string()
}
fn default_canceled() -> String {
    "Canceled game creation".to_string()
}
fn default_code_in_use() -> String {
    "A room already exists with that game code, try another, or enter 'CANCEL' to stop."
        .to_string()
}
fn default_creation_failed() -> String {
    "Failed to create a room with that game code, try again, or enter 'CANCEL' to stop."
        .to_string()
}

impl PluginConfig {
    /// Load config from a TOML file, falling back to defaults if it is missing.
    pub fn load(path: Option<&Path>) -> GamecodeResult<Self> {
        let config = match path.map(expand_tilde) {
            Some(expanded) if expanded.exists() => {
                info!(path = %expanded.display(), "loading config file");
                let content = std::fs::read_to_string(&expanded)?;
                Self::from_toml(&content)?
            }
            Some(expanded) => {
                info!(path = %expanded.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> GamecodeResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GamecodeError::Config(format!("config parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> GamecodeResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GamecodeError::Config(format!("config serialize error: {e}")))
    }

    pub fn validate(&self) -> GamecodeResult<()> {
        check_secs("reservation.ttl_secs", self.reservation.ttl_secs)?;
        check_secs(
            "reservation.sweep_interval_secs",
            self.reservation.sweep_interval_secs,
        )
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.reservation.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.reservation.sweep_interval_secs)
    }
}

fn check_secs(key: &str, secs: u64) -> GamecodeResult<()> {
    if secs == 0 {
        return Err(GamecodeError::Config(format!("{key} must be greater than zero")));
    }
    if secs > MAX_RESERVATION_SECS {
        return Err(GamecodeError::Config(format!(
            "{key} must be at most {MAX_RESERVATION_SECS}"
        )));
    }
    Ok(())
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
