//! Host settings shared by every extension and plugin call
//!
//! The settings object is owned by the host (CLI, editor integration) and passed by reference
//! into each render. Components persist their own configuration slices into
//! [`Settings::plugins_config`], keyed by component name.

use crate::component::ConfigMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accent used when no theme color is configured
pub const DEFAULT_THEME_COLOR: &str = "#7852ee";
/// Body text color used when nothing else applies
pub const DEFAULT_TEXT_COLOR: &str = "#222222";

/// Which external links are turned into numbered footnotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LinkFootnoteMode {
    /// Leave links as anchors
    #[default]
    None,
    /// Every http(s) link becomes a footnote
    All,
    /// Links outside mp.weixin.qq.com become footnotes
    NonWx,
}

/// How a link footnote entry describes its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LinkDescriptionMode {
    /// Only the URL
    #[default]
    Empty,
    /// Link text followed by the URL
    Raw,
}

/// Math source dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MathDialect {
    #[default]
    Latex,
    Asciimath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub link_footnote_mode: LinkFootnoteMode,
    pub link_description_mode: LinkDescriptionMode,
    pub line_number: bool,
    pub enable_weixin_code_format: bool,
    pub enable_theme_color: bool,
    pub theme_color: String,
    pub enable_heading_number: bool,
    pub enable_heading_delimiter_break: bool,
    pub math: MathDialect,
    pub theme: String,
    pub highlight: String,
    /// Local image source → URL returned by the upload collaborator
    pub uploaded_images: BTreeMap<String, String>,
    pub plugins_config: BTreeMap<String, ConfigMap>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            link_footnote_mode: LinkFootnoteMode::None,
            link_description_mode: LinkDescriptionMode::Empty,
            line_number: false,
            enable_weixin_code_format: false,
            enable_theme_color: false,
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            enable_heading_number: false,
            enable_heading_delimiter_break: false,
            math: MathDialect::Latex,
            theme: "default".to_string(),
            highlight: "github".to_string(),
            uploaded_images: BTreeMap::new(),
            plugins_config: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Color used for list markers, heading numbers and other accents
    pub fn accent_color(&self) -> &str {
        if self.enable_theme_color && !self.theme_color.trim().is_empty() {
            self.theme_color.trim()
        } else {
            DEFAULT_THEME_COLOR
        }
    }

    pub fn component_config(&self, name: &str) -> Option<&ConfigMap> {
        self.plugins_config.get(name)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
