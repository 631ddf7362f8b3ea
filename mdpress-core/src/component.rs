//! Enable state, configuration and UI metadata shared by extensions and process plugins
//!
//! Every component carries a [`ComponentState`]: an immutable name, a config map that always
//! holds `enabled`, and a declarative meta schema whose keys are a subset of the config keys.
//! The builder methods add config and meta entries together so the subset rule holds by
//! construction.

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ENABLED_KEY: &str = "enabled";

/// A scalar configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ConfigValue {
    /// Booleans, plus the strings `true`/`false` produced by CLI overrides
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            ConfigValue::Text(text) => match text.trim() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            ConfigValue::Number(n) => Some(*n != 0.0),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            ConfigValue::Text(text) => text.trim().parse().ok(),
            ConfigValue::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            ConfigValue::Bool(value) => value.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::Text(text) => text.clone(),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Kind of settings control a host renders for a config key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaKind {
    Switch,
    Select,
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaField {
    #[serde(rename = "type")]
    pub kind: MetaKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<MetaOption>,
}

impl MetaField {
    pub fn switch(title: &str) -> Self {
        MetaField {
            kind: MetaKind::Switch,
            title: title.to_string(),
            options: Vec::new(),
        }
    }

    pub fn text(title: &str) -> Self {
        MetaField {
            kind: MetaKind::Text,
            title: title.to_string(),
            options: Vec::new(),
        }
    }

    pub fn number(title: &str) -> Self {
        MetaField {
            kind: MetaKind::Number,
            title: title.to_string(),
            options: Vec::new(),
        }
    }

    pub fn select(title: &str, options: &[(&str, &str)]) -> Self {
        MetaField {
            kind: MetaKind::Select,
            title: title.to_string(),
            options: options
                .iter()
                .map(|(value, text)| MetaOption {
                    value: value.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        }
    }
}

pub type MetaConfig = BTreeMap<String, MetaField>;

/// Name, config and meta schema of one extension or process plugin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentState {
    name: String,
    config: ConfigMap,
    meta: MetaConfig,
}

impl ComponentState {
    /// New state, enabled by default
    pub fn new(name: &str) -> Self {
        let mut config = ConfigMap::new();
        config.insert(ENABLED_KEY.to_string(), ConfigValue::Bool(true));
        let mut meta = MetaConfig::new();
        meta.insert(ENABLED_KEY.to_string(), MetaField::switch("Enabled"));
        ComponentState {
            name: name.to_string(),
            config,
            meta,
        }
    }

    /// Add a user-facing option with its control description
    pub fn with_option(mut self, key: &str, value: impl Into<ConfigValue>, meta: MetaField) -> Self {
        self.config.insert(key.to_string(), value.into());
        self.meta.insert(key.to_string(), meta);
        self
    }

    /// Add a config key with no control
    pub fn with_value(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.set_enabled(false);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    pub fn meta(&self) -> &MetaConfig {
        &self.meta
    }

    pub fn is_enabled(&self) -> bool {
        self.bool_value(ENABLED_KEY, true)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config
            .insert(ENABLED_KEY.to_string(), ConfigValue::Bool(enabled));
    }

    /// Merge `updates` into the config; `enabled` can be changed but never removed
    ///
    /// Text values are coerced to the kind of the value they replace when they parse as it,
    /// so `"32"` from a command-line override stays a number.
    pub fn update_config(&mut self, updates: &ConfigMap) {
        for (key, value) in updates {
            let value = match (self.config.get(key), value) {
                (Some(ConfigValue::Bool(_)), ConfigValue::Text(_)) => value
                    .as_bool()
                    .map(ConfigValue::Bool)
                    .unwrap_or_else(|| value.clone()),
                (Some(ConfigValue::Number(_)), ConfigValue::Text(_)) => value
                    .as_number()
                    .map(ConfigValue::Number)
                    .unwrap_or_else(|| value.clone()),
                _ => value.clone(),
            };
            self.config.insert(key.clone(), value);
        }
    }

    pub fn value(&self, key: &str) -> Option<&ConfigValue> {
        self.config.get(key)
    }

    pub fn bool_value(&self, key: &str, default: bool) -> bool {
        self.config
            .get(key)
            .and_then(ConfigValue::as_bool)
            .unwrap_or(default)
    }

    pub fn number_value(&self, key: &str, default: f64) -> f64 {
        self.config
            .get(key)
            .and_then(ConfigValue::as_number)
            .unwrap_or(default)
    }

    pub fn text_value(&self, key: &str, default: &str) -> String {
        self.config
            .get(key)
            .map(ConfigValue::as_text)
            .unwrap_or_else(|| default.to_string())
    }

    /// Apply the slice stored under this component's name, if any
    pub fn load_from(&mut self, settings: &Settings) {
        if let Some(slice) = settings.component_config(&self.name) {
            self.update_config(slice);
        }
    }

    pub fn save_into(&self, settings: &mut Settings) {
        settings
            .plugins_config
            .insert(self.name.clone(), self.config.clone());
    }
}
