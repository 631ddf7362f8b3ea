//! `==marked text==`

use crate::component::{ComponentState, MetaField};
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{Extension, RenderContext};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const NAME: &str = "highlight";

static MARKED: Lazy<Regex> = Lazy::new(|| Regex::new(r"==([^=\s](?:[^=\n]*[^=\s])?)==").unwrap());

pub struct HighlightExtension {
    state: ComponentState,
}

impl Default for HighlightExtension {
    fn default() -> Self {
        HighlightExtension {
            state: ComponentState::new(NAME).with_option(
                "tag",
                "mark",
                MetaField::select("Render as", &[("mark", "Highlight"), ("strong", "Bold")]),
            ),
        }
    }
}

impl Extension for HighlightExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn inline_pattern(&self) -> Option<Regex> {
        Some(MARKED.clone())
    }

    fn render_inline(&mut self, captures: &Captures, _ctx: &mut RenderContext) -> Result<Option<String>> {
        let tag = match self.state.text_value("tag", "mark").as_str() {
            "strong" => "strong",
            _ => "mark",
        };
        Ok(Some(format!("<{tag}>{}</{tag}>", html_escape(&captures[1]))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BuiltinAssets;
    use crate::cards::CardDataManager;
    use crate::component::{ConfigMap, ConfigValue};
    use crate::markdown::{MarkdownParser, RenderSession};
    use crate::settings::Settings;

    fn render(parser: &mut MarkdownParser, markdown: &str) -> String {
        let settings = Settings::default();
        let mut cards = CardDataManager::new();
        let assets = BuiltinAssets;
        let mut session = RenderSession::new(&settings, &mut cards, &assets);
        parser.parse(markdown, &mut session).unwrap()
    }

    #[test]
    fn marks_text() {
        let mut parser = MarkdownParser::new();
        parser.register(Box::new(HighlightExtension::default())).unwrap();
        assert_eq!(
            render(&mut parser, "a ==b c== d == e"),
            "<p>a <mark>b c</mark> d == e</p>\n"
        );

        let mut updates = ConfigMap::new();
        updates.insert("tag".to_string(), ConfigValue::from("strong"));
        parser
            .extension_mut(NAME)
            .unwrap()
            .state_mut()
            .update_config(&updates);
        assert_eq!(render(&mut parser, "==x=="), "<p><strong>x</strong></p>\n");
    }
}
