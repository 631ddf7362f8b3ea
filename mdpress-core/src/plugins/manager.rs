//! Ordered registry of process plugins

use super::{default_plugins, ProcessPlugin};
use crate::error::{PressError, Result};
use crate::settings::Settings;
use tracing::{debug, error, warn};

/// A plugin that failed during a chain run; its stage passed the input through
#[derive(Debug, Clone, PartialEq)]
pub struct PluginFailure {
    pub plugin: String,
    pub error: PressError,
}

/// Output of a chain run plus the stages that failed
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub html: String,
    pub failures: Vec<PluginFailure>,
}

impl ProcessReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn ProcessPlugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        for plugin in default_plugins() {
            // Built-in names are distinct.
            let _ = manager.register(plugin);
        }
        manager
    }

    /// Append a plugin; names must be unique
    pub fn register(&mut self, plugin: Box<dyn ProcessPlugin>) -> Result<()> {
        if self.plugin(plugin.name()).is_some() {
            return Err(PressError::DuplicateName {
                kind: "plugin",
                name: plugin.name().to_string(),
            });
        }
        debug!(name = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn ProcessPlugin>> {
        let index = self.plugins.iter().position(|p| p.name() == name)?;
        Some(self.plugins.remove(index))
    }

    pub fn plugin(&self, name: &str) -> Option<&dyn ProcessPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn plugin_mut(&mut self, name: &str) -> Option<&mut Box<dyn ProcessPlugin>> {
        self.plugins.iter_mut().find(|p| p.name() == name)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &dyn ProcessPlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let plugin = self.plugin_mut(name).ok_or_else(|| PressError::NotFound {
            kind: "plugin",
            name: name.to_string(),
        })?;
        plugin.state_mut().set_enabled(enabled);
        Ok(())
    }

    pub fn load_settings(&mut self, settings: &Settings) {
        for plugin in &mut self.plugins {
            plugin.state_mut().load_from(settings);
        }
    }

    pub fn save_settings(&self, settings: &mut Settings) {
        for plugin in &self.plugins {
            plugin.state().save_into(settings);
        }
    }

    /// Apply every enabled plugin in registration order
    pub fn process_content(&self, html: &str, settings: &Settings) -> ProcessReport {
        self.run((0..self.plugins.len()).collect(), html, settings)
    }

    /// Apply the named plugins in the given order, skipping disabled ones
    pub fn process_chain(&self, names: &[&str], html: &str, settings: &Settings) -> ProcessReport {
        let indices = names
            .iter()
            .filter_map(|name| {
                let index = self.plugins.iter().position(|p| p.name() == *name);
                if index.is_none() {
                    warn!(plugin = *name, "unknown plugin in chain, skipping");
                }
                index
            })
            .collect();
        self.run(indices, html, settings)
    }

    fn run(&self, indices: Vec<usize>, html: &str, settings: &Settings) -> ProcessReport {
        let mut failures = Vec::new();
        let mut current = html.to_string();
        for plugin in indices.into_iter().map(|index| &self.plugins[index]) {
            if !plugin.is_enabled() {
                continue;
            }
            match plugin.try_process(&current, settings) {
                Ok(output) => current = output,
                Err(err) => {
                    error!(plugin = plugin.name(), %err, "plugin failed, passing input through");
                    failures.push(PluginFailure {
                        plugin: plugin.name().to_string(),
                        error: err,
                    });
                }
            }
        }
        ProcessReport {
            html: current,
            failures,
        }
    }
}
