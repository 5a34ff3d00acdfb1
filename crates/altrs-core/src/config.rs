// Altrs Application Config
// Flat key/value settings with typed accessors, plus command security rules

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::security::{CommandDecision, CommandRule};

/// Documented config keys
pub mod keys {
    pub const POLLING_INTERVAL_MS: &str = "PollingIntervalMs";
    pub const AUTO_STOP_PRESS_ACTIONS: &str = "AutoStopPressActions";
    pub const AUTO_STOP_INSIDE_ACTIONS: &str = "AutoStopInsideActions";
    pub const DWELL_TIME_MS: &str = "DwellTimeMs";
    pub const DWELL_RADIUS: &str = "DwellRadius";
    pub const REPEAT_INTERVAL_MS: &str = "RepeatIntervalMs";
    pub const SHOW_DIAGNOSTICS: &str = "ShowDiagnostics";
    pub const DEFAULT_COMMAND_DECISION: &str = "DefaultCommandDecision";
    pub const PROFILE_FILE: &str = "ProfileFile";
}

/// Default value of every documented key
const DEFAULTS: &[(&str, &str)] = &[
    (keys::POLLING_INTERVAL_MS, "20"),
    (keys::AUTO_STOP_PRESS_ACTIONS, "true"),
    (keys::AUTO_STOP_INSIDE_ACTIONS, "true"),
    (keys::DWELL_TIME_MS, "1000"),
    (keys::DWELL_RADIUS, "0.01"),
    (keys::REPEAT_INTERVAL_MS, "100"),
    (keys::SHOW_DIAGNOSTICS, "false"),
    (keys::DEFAULT_COMMAND_DECISION, "Ask"),
    (keys::PROFILE_FILE, ""),
];

/// Shortest polling interval the loop will run at
pub const MIN_POLLING_INTERVAL_MS: i64 = 5;

/// Errors that can occur when loading or checking the config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML write error: {0}")]
    TomlWrite(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid command rule {id}: {reason}")]
    InvalidRule { id: i64, reason: String },
}

/// TOML representation; scalar values of any type are accepted
#[derive(Debug, Deserialize, Default)]
struct ConfigToml {
    #[serde(default)]
    settings: HashMap<String, toml::Value>,

    #[serde(default)]
    command_rules: Vec<CommandRule>,
}

#[derive(Serialize)]
struct ConfigTomlOut<'a> {
    settings: &'a BTreeMap<String, String>,
    command_rules: &'a [CommandRule],
}

/// Application settings.
///
/// Each thread works on its own copy; the UI hands a fresh copy to the
/// poller through the thread manager.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    values: BTreeMap<String, String>,
    command_rules: Vec<CommandRule>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    /// Load config from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let mut config = Self::new();
        for (key, value) in parsed.settings {
            let text = scalar_to_string(&key, &value)?;
            config.values.insert(key, text);
        }
        config.command_rules = parsed.command_rules;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let out = ConfigTomlOut {
            settings: &self.values,
            command_rules: &self.command_rules,
        };
        toml::to_string_pretty(&out).map_err(|e| ConfigError::TomlWrite(e.to_string()))
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path (~/.config/altrs/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("altrs").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// Raw value, or the documented default for known keys
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .or_else(|| default_value(key))
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.typed(key, parse_bool).unwrap_or(false)
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.typed(key, |s| s.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }

    pub fn get_double(&self, key: &str) -> f64 {
        self.typed(key, |s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Parse a stored value, falling back to the default when it is malformed
    fn typed<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        if let Some(raw) = self.values.get(key) {
            if let Some(value) = parse(raw) {
                return Some(value);
            }
            log::warn!("Ignoring malformed config value {} = {:?}", key, raw);
        }
        default_value(key).and_then(parse)
    }

    /// Loop sleep between ticks, never below the floor
    pub fn polling_interval(&self) -> Duration {
        let ms = self
            .get_int(keys::POLLING_INTERVAL_MS)
            .max(MIN_POLLING_INTERVAL_MS);
        Duration::from_millis(ms as u64)
    }

    pub fn dwell_time(&self) -> Duration {
        Duration::from_millis(self.get_int(keys::DWELL_TIME_MS).max(0) as u64)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.get_int(keys::REPEAT_INTERVAL_MS).max(1) as u64)
    }

    pub fn default_command_decision(&self) -> CommandDecision {
        self.typed(keys::DEFAULT_COMMAND_DECISION, |s| s.trim().parse().ok())
            .unwrap_or(CommandDecision::Ask)
    }

    pub fn command_rules(&self) -> &[CommandRule] {
        &self.command_rules
    }

    pub fn command_rules_mut(&mut self) -> &mut Vec<CommandRule> {
        &mut self.command_rules
    }

    /// Check typed keys parse and every command rule compiles
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in &self.values {
            let ok = match key.as_str() {
                keys::POLLING_INTERVAL_MS | keys::DWELL_TIME_MS | keys::REPEAT_INTERVAL_MS => {
                    value.trim().parse::<i64>().is_ok()
                }
                keys::AUTO_STOP_PRESS_ACTIONS
                | keys::AUTO_STOP_INSIDE_ACTIONS
                | keys::SHOW_DIAGNOSTICS => parse_bool(value).is_some(),
                keys::DWELL_RADIUS => value.trim().parse::<f64>().is_ok(),
                keys::DEFAULT_COMMAND_DECISION => value.trim().parse::<CommandDecision>().is_ok(),
                _ => true,
            };
            if !ok {
                return Err(ConfigError::InvalidValue {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }

        for rule in &self.command_rules {
            rule.compile().map_err(|e| ConfigError::InvalidRule {
                id: rule.id,
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

fn default_value(key: &str) -> Option<&'static str> {
    DEFAULTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn scalar_to_string(key: &str, value: &toml::Value) -> Result<String, ConfigError> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}
