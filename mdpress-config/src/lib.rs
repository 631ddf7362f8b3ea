//! Shared configuration loader for mdpress.
//!
//! `defaults/mdpress.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. [`Loader`] layers, lowest precedence first:
//!
//! 1. the embedded defaults
//! 2. files added with [`Loader::with_file`] / [`Loader::with_optional_file`]
//! 3. the `[platforms.<key>]` profile of the platform being rendered
//! 4. programmatic overrides ([`Loader::set_setting`], [`Loader::set_plugin_option`])
//!
//! Extension and plugin options are written as `[plugins.<name>]` tables and end up in
//! [`Settings::plugins_config`]. Uploaded images are `[[uploads]]` entries with `local` and
//! `url` fields: the `config` crate lowercases table keys, so file paths cannot be keys.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, Value, ValueKind};
use mdpress_core::{ConfigMap, Settings};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/mdpress.default.toml");

/// Sections a `[platforms.<key>]` profile may contain
const PROFILE_SECTIONS: &[&str] = &["settings", "plugins"];

/// Top-level configuration consumed by mdpress applications.
#[derive(Debug, Clone)]
pub struct PressConfig {
    pub render: RenderConfig,
    /// Rendering settings for `render.platform`, profile and plugin options merged in.
    pub settings: Settings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Platform adapter key used when the command line does not name one.
    pub platform: String,
}

/// A local image that was uploaded to the platform's CDN.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub local: String,
    pub url: String,
}

/// The file shape, before plugin tables and uploads are folded into `settings`.
#[derive(Deserialize)]
struct RawConfig {
    render: RenderConfig,
    settings: Settings,
    #[serde(default)]
    plugins: BTreeMap<String, ConfigMap>,
    #[serde(default)]
    uploads: Vec<UploadedImage>,
}

impl RawConfig {
    fn into_press_config(self, extra_uploads: Vec<UploadedImage>) -> PressConfig {
        let mut settings = self.settings;
        for (name, options) in self.plugins {
            settings.plugins_config.entry(name).or_default().extend(options);
        }
        for image in self.uploads.into_iter().chain(extra_uploads) {
            settings.uploaded_images.insert(image.local, image.url);
        }
        PressConfig {
            render: self.render,
            settings,
        }
    }
}

/// Builds a [`PressConfig`] for one render.
#[derive(Debug, Clone)]
pub struct Loader {
    files: ConfigBuilder<DefaultState>,
    platform: Option<String>,
    overrides: Vec<(String, Value)>,
    uploads: Vec<UploadedImage>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        Self {
            files: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
            platform: None,
            overrides: Vec::new(),
            uploads: Vec::new(),
        }
    }

    /// Layer a configuration file. Missing files fail the build.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer a configuration file if it exists.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.files = self.files.add_source(source);
        self
    }

    /// Render for `platform` instead of `render.platform`; its profile applies either way.
    pub fn for_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }

    /// Override one [`Settings`] field, e.g. `set_setting("line_number", "true")`.
    pub fn set_setting(mut self, field: &str, value: impl Into<ValueKind>) -> Self {
        self.overrides
            .push((format!("settings.{field}"), Value::new(None, value)));
        self
    }

    /// Override one option of an extension or process plugin.
    pub fn set_plugin_option(mut self, plugin: &str, key: &str, value: impl Into<ValueKind>) -> Self {
        self.overrides
            .push((format!("plugins.{plugin}.{key}"), Value::new(None, value)));
        self
    }

    /// Record an upload; the images plugin swaps `local` for `url`.
    pub fn with_upload(mut self, local: &str, url: &str) -> Self {
        self.uploads.push(UploadedImage {
            local: local.to_string(),
            url: url.to_string(),
        });
        self
    }

    /// Resolve the platform, apply its profile and overrides, then deserialize.
    pub fn build(self) -> Result<PressConfig, ConfigError> {
        let files = self.files.build()?;
        let platform = match self.platform {
            Some(platform) => platform,
            None => files.get_string("render.platform")?,
        };
        let profile = profile_overrides(&files, &platform)?;

        let mut builder = Config::builder()
            .add_source(files)
            .set_override("render.platform", platform)?;
        for (key, value) in profile.into_iter().chain(self.overrides) {
            builder = builder.set_override(key, value)?;
        }
        let raw: RawConfig = builder.build()?.try_deserialize()?;
        Ok(raw.into_press_config(self.uploads))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// `[platforms.<platform>]` as override paths, or nothing when the platform has no profile.
fn profile_overrides(files: &Config, platform: &str) -> Result<Vec<(String, Value)>, ConfigError> {
    let profile = match files.get_table(&format!("platforms.{platform}")) {
        Ok(profile) => profile,
        Err(ConfigError::NotFound(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut overrides = Vec::new();
    for (section, value) in profile {
        if !PROFILE_SECTIONS.contains(&section.as_str()) {
            return Err(ConfigError::Message(format!(
                "unknown section `{section}` in [platforms.{platform}], expected `settings` or `plugins`"
            )));
        }
        flatten(section, value, &mut overrides);
    }
    // Table iteration order is unspecified.
    overrides.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(overrides)
}

fn flatten(path: String, value: Value, out: &mut Vec<(String, Value)>) {
    match value.kind {
        ValueKind::Table(table) => {
            for (key, child) in table {
                flatten(format!("{path}.{key}"), child, out);
            }
        }
        leaf => out.push((path, Value::from(leaf))),
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<PressConfig, ConfigError> {
    Loader::new().build()
}
