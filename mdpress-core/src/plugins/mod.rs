//! DOM post-processing plugins
//!
//! A process plugin is a pure function of (html, settings, own config) → html. Plugins are
//! owned by the [`PluginManager`] and referenced by name from platform adapters.
//!
//! Failure isolation lives in [`ProcessPlugin::try_process`]: an `Err` or a panic inside
//! [`ProcessPlugin::transform`] is reported as a [`PressError::Plugin`] and the stage's output
//! is its unchanged input, so the rest of the chain keeps running.

pub mod blockquotes;
pub mod code_blocks;
pub mod headings;
pub mod images;
pub mod links;
pub mod lists;
pub mod manager;
pub mod styles;
pub mod tables;

pub use blockquotes::BlockquotesPlugin;
pub use code_blocks::CodeBlocksPlugin;
pub use headings::HeadingsPlugin;
pub use images::ImagesPlugin;
pub use links::LinksPlugin;
pub use lists::ListsPlugin;
pub use manager::{PluginFailure, PluginManager, ProcessReport};
pub use styles::StylesPlugin;
pub use tables::TablesPlugin;

use crate::component::ComponentState;
use crate::dom::Fragment;
use crate::error::{PressError, Result};
use crate::settings::Settings;
use markup5ever_rcdom::Handle;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

pub trait ProcessPlugin {
    fn state(&self) -> &ComponentState;
    fn state_mut(&mut self) -> &mut ComponentState;

    fn name(&self) -> &str {
        self.state().name()
    }

    fn description(&self) -> &str;

    fn is_enabled(&self) -> bool {
        self.state().is_enabled()
    }

    /// The rewrite itself; may fail
    fn transform(&self, html: &str, settings: &Settings) -> Result<String>;

    /// Run [`ProcessPlugin::transform`], turning errors and panics into a plugin error
    fn try_process(&self, html: &str, settings: &Settings) -> Result<String> {
        match catch_unwind(AssertUnwindSafe(|| self.transform(html, settings))) {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(PressError::Plugin { name, message })) => Err(PressError::Plugin { name, message }),
            Ok(Err(err)) => Err(PressError::plugin(self.name(), err.to_string())),
            Err(panic) => Err(PressError::plugin(self.name(), panic_message(panic.as_ref()))),
        }
    }

    /// Never fails: on error the input comes back unchanged
    fn process(&self, html: &str, settings: &Settings) -> String {
        self.try_process(html, settings).unwrap_or_else(|err| {
            warn!(plugin = self.name(), %err, "plugin failed, passing input through");
            html.to_string()
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Parse `html`, let `rewrite` mutate the tree, serialize the result
pub fn rewrite_fragment<F>(html: &str, rewrite: F) -> Result<String>
where
    F: FnOnce(&Handle) -> Result<()>,
{
    let fragment = Fragment::parse(html)?;
    rewrite(fragment.root())?;
    fragment.to_html()
}

/// Built-in plugins in registration order
pub fn default_plugins() -> Vec<Box<dyn ProcessPlugin>> {
    vec![
        Box::new(ImagesPlugin::default()),
        Box::new(LinksPlugin::default()),
        Box::new(HeadingsPlugin::default()),
        Box::new(ListsPlugin::default()),
        Box::new(CodeBlocksPlugin::default()),
        Box::new(TablesPlugin::default()),
        Box::new(BlockquotesPlugin::default()),
        Box::new(StylesPlugin::default()),
    ]
}
