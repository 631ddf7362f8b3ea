//! Platform adapters
//!
//! An adapter is a named, fixed ordering over the process plugins owned by the
//! [`PluginManager`]. The order encodes real dependencies between plugins: `styles` reads
//! the final DOM, so on platforms that use it, it always comes last.

use crate::error::{PressError, Result};
use crate::plugins::PluginManager;
use crate::settings::Settings;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Adapter used when a requested platform is unknown
pub const FALLBACK_PLATFORM: &str = "preview";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAdapter {
    key: String,
    description: String,
    chain: Vec<String>,
}

impl PlatformAdapter {
    pub fn new(key: &str, description: &str, chain: &[&str]) -> Self {
        PlatformAdapter {
            key: key.to_string(),
            description: description.to_string(),
            chain: chain.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// In-app preview: keeps classes and the stylesheet
    pub fn preview() -> Self {
        Self::new(FALLBACK_PLATFORM, "Local preview", &["headings", "code-blocks"])
    }

    /// WeChat official accounts: strips `<style>`, so everything ends up inline
    pub fn wechat() -> Self {
        Self::new(
            "wechat",
            "WeChat official account editor",
            &["images", "links", "headings", "lists", "code-blocks", "tables", "styles"],
        )
    }

    pub fn zhihu() -> Self {
        Self::new(
            "zhihu",
            "Zhihu article editor",
            &["images", "links", "headings", "blockquotes", "tables"],
        )
    }

    pub fn twitter() -> Self {
        Self::new(
            "twitter",
            "Twitter/X long-form editor",
            &["links", "headings", "lists", "blockquotes"],
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn chain(&self) -> Vec<&str> {
        self.chain.iter().map(String::as_str).collect()
    }

    /// Run this platform's chain; failed stages pass their input through
    pub fn adapt(&self, html: &str, settings: &Settings, plugins: &PluginManager) -> String {
        debug!(platform = self.key.as_str(), "adapting content");
        let report = plugins.process_chain(&self.chain(), html, settings);
        for failure in &report.failures {
            warn!(
                platform = self.key.as_str(),
                plugin = failure.plugin.as_str(),
                error = %failure.error,
                "stage skipped"
            );
        }
        report.html
    }
}

/// Registry of platform adapters
///
/// ```ignore
/// let registry = AdapterRegistry::default();
/// let adapter = registry.resolve("wechat");
/// let html = adapter.adapt(&html, &settings, &plugins);
/// ```
pub struct AdapterRegistry {
    adapters: HashMap<String, PlatformAdapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter; a later adapter with the same key replaces the earlier one
    pub fn register(&mut self, adapter: PlatformAdapter) {
        self.adapters.insert(adapter.key().to_string(), adapter);
    }

    pub fn get(&self, key: &str) -> Result<&PlatformAdapter> {
        self.adapters.get(key).ok_or_else(|| PressError::NotFound {
            kind: "platform",
            name: key.to_string(),
        })
    }

    pub fn has(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    /// All adapter keys (sorted)
    pub fn list(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.adapters.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// The adapter for `key`, or the preview adapter when the key is unknown
    pub fn resolve(&self, key: &str) -> PlatformAdapter {
        if let Some(adapter) = self.adapters.get(key) {
            return adapter.clone();
        }
        warn!(platform = key, fallback = FALLBACK_PLATFORM, "unknown platform");
        self.adapters
            .get(FALLBACK_PLATFORM)
            .cloned()
            .unwrap_or_else(PlatformAdapter::preview)
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PlatformAdapter::preview());
        registry.register(PlatformAdapter::wechat());
        registry.register(PlatformAdapter::zhihu());
        registry.register(PlatformAdapter::twitter());
        registry
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
