//! `mpcard` fences and `![[file|size]]` embeds

use crate::component::{ComponentState, MetaField};
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{Extension, RenderContext, Rendered};
use crate::settings::Settings;
use comrak::nodes::{AstNode, NodeValue};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const NAME: &str = "embeds";

static EMBED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[\[([^\]|\n]+)(?:\|([^\]\n]*))?\]\]").unwrap());

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

pub struct EmbedExtension {
    state: ComponentState,
    card_index: usize,
}

impl Default for EmbedExtension {
    fn default() -> Self {
        EmbedExtension {
            state: ComponentState::new(NAME).with_option(
                "cards",
                true,
                MetaField::switch("Render mpcard blocks"),
            ),
            card_index: 0,
        }
    }
}

fn is_image(target: &str) -> bool {
    target
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// `300` → width only, `300x200` → width and height
fn parse_size(size: &str) -> (Option<u32>, Option<u32>) {
    let size = size.trim();
    match size.split_once('x') {
        Some((w, h)) => (w.trim().parse().ok(), h.trim().parse().ok()),
        None => (size.parse().ok(), None),
    }
}

impl Extension for EmbedExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn prepare(&mut self, _settings: &Settings) {
        self.card_index = 0;
    }

    fn inline_pattern(&self) -> Option<Regex> {
        Some(EMBED.clone())
    }

    fn render_inline(&mut self, captures: &Captures, _ctx: &mut RenderContext) -> Result<Option<String>> {
        let target = captures[1].trim();
        let size = captures.get(2).map(|m| m.as_str()).unwrap_or("");
        if is_image(target) {
            let alt = target.rsplit('/').next().unwrap_or(target);
            let mut html = format!(
                r#"<img src="{}" alt="{}""#,
                html_escape(target),
                html_escape(alt)
            );
            let (width, height) = parse_size(size);
            if let Some(width) = width {
                html.push_str(&format!(r#" width="{width}""#));
            }
            if let Some(height) = height {
                html.push_str(&format!(r#" height="{height}""#));
            }
            html.push('>');
            return Ok(Some(html));
        }
        Ok(Some(format!(
            r#"<span class="internal-embed" data-src="{0}">{0}</span>"#,
            html_escape(target)
        )))
    }

    fn render_node<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        ctx: &mut RenderContext<'a, '_>,
    ) -> Result<Rendered> {
        if !self.state.bool_value("cards", true) {
            return Ok(Rendered::Skipped);
        }
        let payload = match &node.data.borrow().value {
            NodeValue::CodeBlock(block)
                if block.info.split_whitespace().next() == Some("mpcard") =>
            {
                block.literal.trim_end().to_string()
            }
            _ => return Ok(Rendered::Skipped),
        };

        let id = format!("mpcard-{}", self.card_index);
        self.card_index += 1;
        ctx.cards.set_card_data(&id, &payload);
        let placeholder = ctx.raw_block(format!(
            r#"<section class="mp-card" data-id="{id}"></section>"#
        ));
        ctx.replace(node, placeholder);
        Ok(Rendered::Handled)
    }
}
