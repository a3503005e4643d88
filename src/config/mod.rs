//! Shell configuration.
//!
//! `ShellConfig` has working defaults, loads from JSON, and accepts
//! `ZONE_BRIDGE_*` environment overrides on top.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::ThemeContext;
use crate::error::ConfigError;
use crate::geometry::{Insets, Size};
use crate::logging::LogLevel;
use crate::validation::{HydrationSource, ValidatorOptions, ZoneModel};
use crate::zone::Zone;

pub const ENV_PREFIX: &str = "ZONE_BRIDGE_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Quiet period before a requested validation runs.
    pub debounce_ms: u64,
    /// How long a bridge may wait for its renderer before the watchdog warns.
    pub handoff_timeout_ms: u64,
    pub zone_model: ZoneModel,
    /// Number of validation results retained for display.
    pub history_limit: usize,
    pub enable_context_bridge: bool,
    pub screen: Size,
    pub safe_area: Insets,
    pub hydration_source: HydrationSource,
    pub validator: ValidatorOptions,
    pub theme: Option<ThemeContext>,
    /// Initial content per zone, injected when the shell mounts.
    pub slot_overrides: BTreeMap<Zone, String>,
    pub log_level: LogLevel,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            handoff_timeout_ms: 100,
            zone_model: ZoneModel::default(),
            history_limit: 5,
            enable_context_bridge: false,
            screen: Size::new(375, 812),
            safe_area: Insets::zero(),
            hydration_source: HydrationSource::Optimistic,
            validator: ValidatorOptions::default(),
            theme: None,
            slot_overrides: BTreeMap::new(),
            log_level: LogLevel::Info,
        }
    }
}

impl ShellConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::vars())
    }

    /// Apply `ZONE_BRIDGE_*` overrides from any key/value source. Unrelated keys are ignored.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "DEBOUNCE_MS" => self.debounce_ms = parse_value(key.as_ref(), value)?,
                "HANDOFF_TIMEOUT_MS" => self.handoff_timeout_ms = parse_value(key.as_ref(), value)?,
                "HISTORY_LIMIT" => self.history_limit = parse_value(key.as_ref(), value)?,
                "CONTEXT_BRIDGE" => self.enable_context_bridge = parse_flag(key.as_ref(), value)?,
                "SCREEN" => self.screen = parse_size(key.as_ref(), value)?,
                "HYDRATION" => {
                    self.hydration_source = match value.to_ascii_lowercase().as_str() {
                        "optimistic" => HydrationSource::Optimistic,
                        "measured" => HydrationSource::Measured,
                        _ => return Err(invalid(key.as_ref(), value)),
                    }
                }
                "LOG_LEVEL" => {
                    self.log_level = value
                        .parse::<LogLevel>()
                        .map_err(|_| invalid(key.as_ref(), value))?
                }
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn handoff_timeout(&self) -> Duration {
        Duration::from_millis(self.handoff_timeout_ms)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

/// `WIDTHxHEIGHT`, e.g. `375x812`.
fn parse_size(key: &str, value: &str) -> Result<Size, ConfigError> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid(key, value))?;
    Ok(Size::new(
        parse_value(key, width.trim())?,
        parse_value(key, height.trim())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_zone_model() {
        let config = ShellConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert_eq!(config.handoff_timeout(), Duration::from_millis(100));
        assert_eq!(config.zone_model.top_height, 50);
        assert_eq!(config.zone_model.bottom_height, 50);
        assert_eq!(config.history_limit, 5);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ShellConfig::from_json_str(
            r##"{
                "screen": {"width": 320, "height": 90},
                "enable_context_bridge": true,
                "hydration_source": "measured",
                "slot_overrides": {"top": "Header"},
                "theme": {"background_color": "#f8f9fa", "border_color": "#dee2e6"}
            }"##,
        )
        .unwrap();
        assert_eq!(config.screen, Size::new(320, 90));
        assert!(config.enable_context_bridge);
        assert_eq!(config.hydration_source, HydrationSource::Measured);
        assert_eq!(config.slot_overrides.get(&Zone::Top).map(String::as_str), Some("Header"));
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn unknown_zone_in_overrides_fails_to_parse() {
        let err = ShellConfig::from_json_str(r#"{"slot_overrides": {"sidebar": "x"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_apply_on_top() {
        let config = ShellConfig::default()
            .with_overrides([
                ("ZONE_BRIDGE_DEBOUNCE_MS", "250"),
                ("ZONE_BRIDGE_SCREEN", "80x24"),
                ("ZONE_BRIDGE_CONTEXT_BRIDGE", "yes"),
                ("ZONE_BRIDGE_LOG_LEVEL", "debug"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.screen, Size::new(80, 24));
        assert!(config.enable_context_bridge);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn bad_env_value_names_the_key() {
        let err = ShellConfig::default()
            .with_overrides([("ZONE_BRIDGE_SCREEN", "wide")])
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "ZONE_BRIDGE_SCREEN");
                assert_eq!(value, "wide");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
