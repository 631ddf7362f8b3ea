//! Code blocks and mermaid diagram placeholders

use crate::component::{ComponentState, MetaField};
use crate::dom::html_escape;
use crate::error::Result;
use crate::markdown::extension::{Extension, RenderContext, Rendered};
use crate::settings::Settings;
use comrak::nodes::{AstNode, NodeValue};

pub const NAME: &str = "fenced-code";

pub struct FencedCodeExtension {
    state: ComponentState,
    mermaid_index: usize,
}

impl Default for FencedCodeExtension {
    fn default() -> Self {
        FencedCodeExtension {
            state: ComponentState::new(NAME).with_option(
                "mermaid",
                true,
                MetaField::switch("Render mermaid diagrams"),
            ),
            mermaid_index: 0,
        }
    }
}

impl Extension for FencedCodeExtension {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn prepare(&mut self, _settings: &Settings) {
        self.mermaid_index = 0;
    }

    fn render_node<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        ctx: &mut RenderContext<'a, '_>,
    ) -> Result<Rendered> {
        let (language, literal) = match &node.data.borrow().value {
            NodeValue::CodeBlock(block) => (
                block
                    .info
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase(),
                block.literal.clone(),
            ),
            _ => return Ok(Rendered::Skipped),
        };
        let body = literal.strip_suffix('\n').unwrap_or(&literal);

        let html = if language == "mermaid" && self.state.bool_value("mermaid", true) {
            let id = format!("mermaid-{}", self.mermaid_index);
            self.mermaid_index += 1;
            format!(
                r#"<section class="mermaid" id="{id}">{}</section>"#,
                html_escape(body)
            )
        } else if language.is_empty() {
            format!("<pre><code>{}</code></pre>", html_escape(body))
        } else {
            format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(&language),
                html_escape(body)
            )
        };

        let replacement = ctx.raw_block(html);
        ctx.replace(node, replacement);
        Ok(Rendered::Handled)
    }
}
