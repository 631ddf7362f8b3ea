//! Callout blocks: a block quote whose first line is `[!type] Optional title`

use crate::component::{ComponentState, MetaField};
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{plain_text, Extension, RenderContext, Rendered};
use comrak::nodes::{AstNode, NodeValue};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NAME: &str = "callouts";

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[!([A-Za-z0-9_-]+)\]([+-]?)[ \t]*(.*)$").unwrap());

pub struct CalloutExtension {
    state: ComponentState,
}

impl Default for CalloutExtension {
    fn default() -> Self {
        CalloutExtension {
            state: ComponentState::new(NAME).with_option(
                "show_icon",
                true,
                MetaField::switch("Show callout icons"),
            ),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strip the marker line from the quote and return `(kind, title)`
fn take_marker<'a>(quote: &'a AstNode<'a>) -> Option<(String, String)> {
    let paragraph = quote.first_child()?;
    if !matches!(paragraph.data.borrow().value, NodeValue::Paragraph) {
        return None;
    }
    let first = paragraph.first_child()?;
    let (kind, mut title) = {
        let data = first.data.borrow();
        let NodeValue::Text(text) = &data.value else {
            return None;
        };
        let captures = MARKER.captures(text)?;
        (captures[1].to_ascii_lowercase(), captures[3].to_string())
    };

    // The rest of the first line belongs to the title.
    let mut current = first.next_sibling();
    first.detach();
    while let Some(node) = current {
        current = node.next_sibling();
        let is_break = matches!(
            node.data.borrow().value,
            NodeValue::SoftBreak | NodeValue::LineBreak
        );
        if !is_break {
            title.push_str(&plain_text(node));
        }
        node.detach();
        if is_break {
            break;
        }
    }
    if paragraph.first_child().is_none() {
        paragraph.detach();
    }

    let title = title.trim();
    let title = if title.is_empty() {
        capitalize(&kind)
    } else {
        title.to_string()
    };
    Some((kind, title))
}

impl Extension for CalloutExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn render_node<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        ctx: &mut RenderContext<'a, '_>,
    ) -> Result<Rendered> {
        if !matches!(node.data.borrow().value, NodeValue::BlockQuote) {
            return Ok(Rendered::Skipped);
        }
        let Some((kind, title)) = take_marker(node) else {
            return Ok(Rendered::Skipped);
        };

        let style = ctx.assets.callout_style(&kind);
        let icon = if self.state.bool_value("show_icon", true) {
            format!(r#"<span class="callout-icon">{}</span>"#, style.icon)
        } else {
            String::new()
        };
        let open = format!(
            concat!(
                r#"<section class="callout callout-{kind}" data-callout="{kind}" style="border-left: 4px solid {color};">"#,
                r#"<section class="callout-title" style="color: {color};">{icon}<span class="callout-title-text">{title}</span></section>"#,
                r#"<section class="callout-content">"#
            ),
            kind = html_escape(&kind),
            color = style.color,
            icon = icon,
            title = html_escape(&title),
        );
        let open = ctx.raw_block(open);
        let close = ctx.raw_block("</section></section>");
        ctx.unwrap_between(node, open, close);
        Ok(Rendered::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::BuiltinAssets;
    use crate::cards::CardDataManager;
    use crate::markdown::{MarkdownParser, RenderSession};
    use crate::settings::Settings;

    fn render(markdown: &str) -> String {
        let mut parser = MarkdownParser::new();
        parser.register(Box::new(CalloutExtension::default())).unwrap();
        let settings = Settings::default();
        let mut cards = CardDataManager::new();
        let assets = BuiltinAssets;
        let mut session = RenderSession::new(&settings, &mut cards, &assets);
        parser.parse(markdown, &mut session).unwrap()
    }

    #[test]
    fn callout_with_title_and_body() {
        let html = render("> [!warning] Mind the gap\n> Body text\n");
        assert!(html.contains(r#"<section class="callout callout-warning" data-callout="warning""#));
        assert!(html.contains(r#"<span class="callout-title-text">Mind the gap</span>"#));
        assert!(html.contains("<p>Body text</p>"));
        assert!(!html.contains("<blockquote>"));
        assert!(!html.contains("[!warning]"));
    }

    #[test]
    fn callout_title_defaults_to_kind() {
        let html = render("> [!note]\n> Body\n");
        assert!(html.contains(r#"<span class="callout-title-text">Note</span>"#));
    }

    #[test]
    fn plain_quotes_are_untouched() {
        let html = render("> just a quote\n");
        assert!(html.contains("<blockquote>"));
        assert!(!html.contains("callout"));
    }
}
