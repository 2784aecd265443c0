//! TOML-based application configuration.
//!
//! Stores the full pre-session option surface:
//! - Session length, penalty multiplier, warm-up timing
//! - Pulse duration and cooldown
//! - Per-channel intensity policy (min/max/step/window, enable flags)
//! - Tease and challenge scheduler settings
//! - HUD message list and degraded-signal horizon
//!
//! Configuration is stored at `~/.config/smilekeeper/config.toml`. It is
//! read freely before a session starts and frozen into the session
//! aggregate at calibration time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Session countdown and warm-up configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Total countdown length in seconds.
    #[serde(default = "default_session_length")]
    pub length_secs: f64,
    /// Countdown growth multiplier while not smiling. Floored at 1.0.
    #[serde(default = "default_penalty_rate")]
    pub penalty_rate: f64,
    /// Warm-up countdown duration (seconds).
    #[serde(default = "default_warmup_duration")]
    pub warmup_duration_secs: f64,
    /// Extra hold on the final warm-up phase before the session goes live.
    #[serde(default = "default_warmup_hold")]
    pub warmup_hold_secs: f64,
}

/// Punishment pulse timing shared by both channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// How long an "on" pulse is held before its paired "off".
    #[serde(default = "default_pulse_duration")]
    pub duration_secs: f64,
    /// Minimum gap between consecutive ordinary punishments.
    #[serde(default = "default_pulse_timeout")]
    pub timeout_secs: f64,
}

/// Per-channel intensity policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Intensity floor (also the tease intensity for this channel).
    #[serde(default = "default_intensity_min")]
    pub min: u32,
    /// Intensity ceiling; every draw is clamped to it.
    #[serde(default = "default_intensity_max")]
    pub max: u32,
    /// Escalation added per recorded failure.
    #[serde(default = "default_intensity_step")]
    pub step: u32,
    /// Width of the random draw band above the escalated base.
    #[serde(default = "default_intensity_window")]
    pub window: u32,
}

/// Tease scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeaseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_tease_interval_min")]
    pub interval_min_secs: f64,
    #[serde(default = "default_tease_interval_max")]
    pub interval_max_secs: f64,
    #[serde(default = "default_tease_duration")]
    pub duration_secs: f64,
}

/// Challenge (super) scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Fixed warning window before the challenge goes live.
    #[serde(default = "default_challenge_warning")]
    pub warning_secs: f64,
    #[serde(default = "default_challenge_duration_min")]
    pub duration_min_secs: f64,
    #[serde(default = "default_challenge_duration_max")]
    pub duration_max_secs: f64,
    #[serde(default = "default_challenge_cooldown_min")]
    pub cooldown_min_secs: f64,
    #[serde(default = "default_challenge_cooldown_max")]
    pub cooldown_max_secs: f64,
    /// Raised smiling threshold offset while challenge mode is enabled.
    #[serde(default = "default_super_on_offset")]
    pub super_on_offset: f64,
    /// Flat intensity bonus on a challenge-failure punishment.
    #[serde(default = "default_super_extra")]
    pub super_extra: u32,
}

/// HUD / presentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Messages rotated into the HUD while smiling.
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
    /// Seconds without a landmark sample before the degraded flag raises.
    #[serde(default = "default_degraded_after")]
    pub degraded_after_secs: f64,
    /// Wire commands kept in the on-screen history ring.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/smilekeeper/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub pulse: PulseConfig,
    #[serde(default)]
    pub channel_a: ChannelConfig,
    #[serde(default)]
    pub channel_b: ChannelConfig,
    #[serde(default)]
    pub tease: TeaseConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Fixed RNG seed for reproducible sessions (None = entropy).
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default functions
fn default_session_length() -> f64 {
    300.0
}
fn default_penalty_rate() -> f64 {
    2.0
}
fn default_warmup_duration() -> f64 {
    5.0
}
fn default_warmup_hold() -> f64 {
    1.0
}
fn default_pulse_duration() -> f64 {
    2.0
}
fn default_pulse_timeout() -> f64 {
    15.0
}
fn default_true() -> bool {
    true
}
fn default_intensity_min() -> u32 {
    20
}
fn default_intensity_max() -> u32 {
    80
}
fn default_intensity_step() -> u32 {
    2
}
fn default_intensity_window() -> u32 {
    5
}
fn default_tease_interval_min() -> f64 {
    20.0
}
fn default_tease_interval_max() -> f64 {
    45.0
}
fn default_tease_duration() -> f64 {
    1.0
}
fn default_challenge_warning() -> f64 {
    3.0
}
fn default_challenge_duration_min() -> f64 {
    5.0
}
fn default_challenge_duration_max() -> f64 {
    12.0
}
fn default_challenge_cooldown_min() -> f64 {
    45.0
}
fn default_challenge_cooldown_max() -> f64 {
    120.0
}
fn default_super_on_offset() -> f64 {
    0.15
}
fn default_super_extra() -> u32 {
    10
}
fn default_messages() -> Vec<String> {
    vec![
        "Keep smiling".into(),
        "Hold it".into(),
        "Looking good".into(),
        "Don't stop now".into(),
    ]
}
fn default_degraded_after() -> f64 {
    10.0
}
fn default_history_len() -> usize {
    6
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            length_secs: default_session_length(),
            penalty_rate: default_penalty_rate(),
            warmup_duration_secs: default_warmup_duration(),
            warmup_hold_secs: default_warmup_hold(),
        }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_pulse_duration(),
            timeout_secs: default_pulse_timeout(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min: default_intensity_min(),
            max: default_intensity_max(),
            step: default_intensity_step(),
            window: default_intensity_window(),
        }
    }
}

impl Default for TeaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_min_secs: default_tease_interval_min(),
            interval_max_secs: default_tease_interval_max(),
            duration_secs: default_tease_duration(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            warning_secs: default_challenge_warning(),
            duration_min_secs: default_challenge_duration_min(),
            duration_max_secs: default_challenge_duration_max(),
            cooldown_min_secs: default_challenge_cooldown_min(),
            cooldown_max_secs: default_challenge_cooldown_max(),
            super_on_offset: default_super_on_offset(),
            super_extra: default_super_extra(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            messages: default_messages(),
            degraded_after_secs: default_degraded_after(),
            history_len: default_history_len(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            pulse: PulseConfig::default(),
            channel_a: ChannelConfig::default(),
            channel_b: ChannelConfig::default(),
            tease: TeaseConfig::default(),
            challenge: ChallengeConfig::default(),
            display: DisplayConfig::default(),
            seed: None,
        }
    }
}

/// Returns `~/.config/smilekeeper[-dev]/` based on SMILEKEEPER_ENV.
///
/// Set SMILEKEEPER_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SMILEKEEPER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("smilekeeper-dev")
    } else {
        base_dir.join("smilekeeper")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let invalid = |message: String| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message,
                };
                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) | serde_json::Value::Null => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default config file path.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    /// Load from an explicit path, writing defaults if absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.normalize();
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default config path.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a value by dotted key path, e.g. `channel_a.max`.
    pub fn get(&self, key: &str) -> Option<String> {
        let root = serde_json::to_value(self).ok()?;
        let value = Self::get_json_value_by_path(&root, key)?;
        Some(match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a value by dotted key path, preserving the existing type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut root = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut root, key, value)?;
        let mut updated: Config =
            serde_json::from_value(root).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.normalize();
        *self = updated;
        self.save()
    }

    /// Clamp invalid values instead of rejecting them.
    ///
    /// Applied on every load and set: `max < min` pulls max up to min,
    /// the penalty multiplier never drops below 1.0, and interval pairs
    /// keep min <= max.
    pub fn normalize(&mut self) {
        if self.channel_a.max < self.channel_a.min {
            self.channel_a.max = self.channel_a.min;
        }
        if self.channel_b.max < self.channel_b.min {
            self.channel_b.max = self.channel_b.min;
        }
        if self.session.penalty_rate < 1.0 {
            self.session.penalty_rate = 1.0;
        }
        if self.tease.interval_max_secs < self.tease.interval_min_secs {
            self.tease.interval_max_secs = self.tease.interval_min_secs;
        }
        if self.challenge.duration_max_secs < self.challenge.duration_min_secs {
            self.challenge.duration_max_secs = self.challenge.duration_min_secs;
        }
        if self.challenge.cooldown_max_secs < self.challenge.cooldown_min_secs {
            self.challenge.cooldown_max_secs = self.challenge.cooldown_min_secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_max_below_min() {
        let mut cfg = Config::default();
        cfg.channel_a.min = 50;
        cfg.channel_a.max = 30;
        cfg.normalize();
        assert_eq!(cfg.channel_a.max, 50);
    }

    #[test]
    fn normalize_floors_penalty_rate() {
        let mut cfg = Config::default();
        cfg.session.penalty_rate = 0.25;
        cfg.normalize();
        assert_eq!(cfg.session.penalty_rate, 1.0);
    }

    #[test]
    fn get_by_dotted_path() {
        let cfg = Config::default();
        assert_eq!(cfg.get("channel_a.min").as_deref(), Some("20"));
        assert_eq!(cfg.get("tease.enabled").as_deref(), Some("false"));
        assert!(cfg.get("nope.nothing").is_none());
    }

    #[test]
    fn toml_round_trip_with_tempfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.channel_b.max = 95;
        cfg.challenge.enabled = true;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.channel_b.max, 95);
        assert!(loaded.challenge.enabled);
    }

    #[test]
    fn load_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.session.length_secs, 300.0);
        assert!(path.exists());
    }
}
