//! End-to-end rendering: Markdown → themed HTML → platform HTML

use crate::assets::{AssetProvider, BuiltinAssets};
use crate::cards::CardDataManager;
use crate::dom::{self, html_escape};
use crate::error::{render_error_html, Result};
use crate::markdown::{MarkdownParser, RenderSession};
use crate::platform::AdapterRegistry;
use crate::plugins::PluginManager;
use crate::settings::Settings;
use tracing::{error, info, warn};

/// Id of the wrapper every rendered document lives in
pub const ROOT_ID: &str = "mdpress";

/// Owns the long-lived registries and per-document card storage
pub struct Publisher {
    parser: MarkdownParser,
    plugins: PluginManager,
    adapters: AdapterRegistry,
    cards: CardDataManager,
    assets: Box<dyn AssetProvider>,
}

impl Publisher {
    pub fn new(
        parser: MarkdownParser,
        plugins: PluginManager,
        adapters: AdapterRegistry,
        assets: Box<dyn AssetProvider>,
    ) -> Self {
        Publisher {
            parser,
            plugins,
            adapters,
            cards: CardDataManager::new(),
            assets,
        }
    }

    pub fn with_defaults() -> Self {
        Self::with_assets(Box::new(BuiltinAssets))
    }

    pub fn with_assets(assets: Box<dyn AssetProvider>) -> Self {
        Self::new(
            MarkdownParser::with_defaults(),
            PluginManager::with_defaults(),
            AdapterRegistry::with_defaults(),
            assets,
        )
    }

    /// Apply every component's persisted config slice
    pub fn load_settings(&mut self, settings: &Settings) {
        self.parser.load_settings(settings);
        self.plugins.load_settings(settings);
    }

    /// Write every component's current config back into `settings`
    pub fn save_settings(&self, settings: &mut Settings) {
        self.parser.save_settings(settings);
        self.plugins.save_settings(settings);
    }

    pub fn parser(&self) -> &MarkdownParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut MarkdownParser {
        &mut self.parser
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginManager {
        &mut self.plugins
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterRegistry {
        &mut self.adapters
    }

    pub fn cards(&self) -> &CardDataManager {
        &self.cards
    }

    /// Theme and highlight CSS for the current settings
    fn stylesheet(&self, settings: &Settings) -> String {
        let mut css = String::new();
        match self.assets.theme_css(&settings.theme) {
            Some(theme) => css.push_str(&theme),
            None => warn!(theme = settings.theme.as_str(), "unknown theme, rendering unstyled"),
        }
        match self.assets.highlight_css(&settings.highlight) {
            Some(highlight) => {
                css.push('\n');
                css.push_str(&highlight);
            }
            None => warn!(highlight = settings.highlight.as_str(), "unknown highlight theme"),
        }
        css
    }

    /// Render `markdown` for `platform`
    ///
    /// Never fails: a fatal parse error becomes a visible error fragment, and failing plugin
    /// stages are skipped by the adapter.
    pub fn render(&mut self, markdown: &str, settings: &Settings, platform: &str) -> String {
        self.cards.cleanup();

        let body = {
            let mut session = RenderSession::new(settings, &mut self.cards, self.assets.as_ref());
            match self.parser.parse(markdown, &mut session) {
                Ok(html) => html,
                Err(err) => {
                    error!(%err, "markdown rendering failed");
                    render_error_html(&err)
                }
            }
        };

        let wrapped = format!(
            r#"<section id="{ROOT_ID}" class="mdpress theme-{}"><style>{}</style>{body}</section>"#,
            html_escape(&settings.theme),
            self.stylesheet(settings)
        );
        let adapter = self.adapters.resolve(platform);
        info!(platform = adapter.key(), "rendering document");
        let adapted = adapter.adapt(&wrapped, settings, &self.plugins);
        self.cards.restore_card(&adapted)
    }

    /// Patch one element of already rendered output, e.g. when a deferred formula resolves
    pub fn update_element_by_id(&self, html: &str, id: &str, content: &str) -> Result<String> {
        dom::update_element_by_id(html, id, content)
    }

    /// Drop per-document state
    pub fn cleanup(&mut self) {
        self.cards.cleanup();
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::with_defaults()
    }
}
